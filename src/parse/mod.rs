//! Free-text extraction: field parsers and row-level record building.

pub mod fields;
pub mod row;

pub use fields::UNKNOWN_SELLER;
pub use row::{build_listing, build_sold_record};
