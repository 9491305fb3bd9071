// src/parse/row.rs

//! Row-level record building.
//!
//! Turns one column-aligned [`RawRow`] into exactly one typed record, or
//! signals "unparseable row" with `None`. A row is skipped only when its
//! price is unparseable; every other field degrades to its documented
//! default. Identity is computed last, from the final field values, so
//! parse order can never influence the key.

use chrono::{DateTime, Utc};

use crate::models::{Condition, Listing, RawRow, SoldRecord};
use crate::parse::fields;

/// Sentinel date text for history rows with no recognizable date.
pub const UNKNOWN_DATE: &str = "Unknown Date";

/// Build a [`Listing`] from a scraped listing row.
///
/// Returns `None` when the price fragment holds no numeric value.
pub fn build_listing(row: &RawRow) -> Option<Listing> {
    let price = fields::parse_price(&row.price)?;

    let condition = Condition::parse(&row.condition);
    let shipping_price = fields::parse_shipping(&row.shipping);
    let seller_name = fields::parse_seller(&row.seller);
    let quantity_available = fields::parse_quantity(&row.quantity);
    let additional_info = row
        .note
        .as_deref()
        .map(str::trim)
        .filter(|note| !note.is_empty())
        .map(str::to_string);

    let identity = Listing::derive_identity(&seller_name, condition, additional_info.as_deref());

    Some(Listing {
        identity,
        condition,
        price,
        shipping_price,
        seller_name,
        quantity_available,
        additional_info,
    })
}

/// Build a [`SoldRecord`] from a sold-history row.
///
/// History rows carry their date text in the note column. Same skip rule as
/// listings: no price, no record.
pub fn build_sold_record(row: &RawRow, now: DateTime<Utc>) -> Option<SoldRecord> {
    let price = fields::parse_price(&row.price)?;

    let raw_date = row
        .note
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(UNKNOWN_DATE)
        .to_string();

    Some(SoldRecord {
        price,
        condition: Condition::parse(&row.condition),
        sold_date: fields::parse_sold_date(&raw_date, now),
        raw_date,
        quantity: fields::parse_quantity(&row.quantity),
    })
}
