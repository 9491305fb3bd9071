//! Raw page data as supplied by the fetch collaborator.
//!
//! The fetcher returns text fragments already aligned to the known listing
//! columns; everything downstream of it is plain text processing with no
//! knowledge of HTML or the browser driver.

use serde::{Deserialize, Serialize};

/// One scraped listing row, as column-aligned text fragments.
///
/// Fragments are raw and untrusted: any of them may be empty or malformed.
/// The record builder decides what survives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRow {
    /// Condition column text, e.g. "Near Mint Foil"
    pub condition: String,

    /// Price column text, e.g. "$12.50"
    pub price: String,

    /// Shipping column text, e.g. "+ $1.27 Shipping" or "Free Shipping"
    pub shipping: String,

    /// Seller column text
    pub seller: String,

    /// Quantity column text, e.g. "5 available" or a bare "3"
    pub quantity: String,

    /// Optional annotation column (language, foil treatment, a sold date
    /// on history rows)
    pub note: Option<String>,
}

/// One fetched page of listing rows.
#[derive(Debug, Clone, Default)]
pub struct RawPage {
    /// Rows in page order
    pub rows: Vec<RawRow>,

    /// Whether the page reported a further page of results
    pub has_next_page: bool,
}
