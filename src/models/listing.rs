//! Listing and sold-record data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::Condition;

/// Sub-cent tolerance for price comparisons on parsed decimal values.
const PRICE_TOLERANCE: f64 = 0.005;

/// Compare two parsed prices for equality.
pub fn price_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < PRICE_TOLERANCE
}

/// A single active sale offer observed on a product page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    /// Stable key distinguishing this offer within a snapshot
    pub identity: String,

    /// Physical condition grade
    pub condition: Condition,

    /// Item price, currency-stripped
    pub price: f64,

    /// Shipping price; 0.0 when absent from source text
    pub shipping_price: f64,

    /// Seller display name, "Unknown Seller" when unparseable
    pub seller_name: String,

    /// Number of copies available; 1 when unparseable
    pub quantity_available: u32,

    /// Optional free-text annotation from the listing row
    pub additional_info: Option<String>,
}

impl Listing {
    /// Derive the stable identity for an offer.
    ///
    /// Computed from the seller, the canonical condition name and the
    /// free-text annotation, so the key survives re-scrapes regardless of
    /// row position. Price, shipping and quantity are deliberately excluded:
    /// those are the fields whose changes the differ must observe on the
    /// same offer.
    pub fn derive_identity(
        seller_name: &str,
        condition: Condition,
        additional_info: Option<&str>,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(seller_name.as_bytes());
        hasher.update(b"|");
        hasher.update(condition.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(additional_info.unwrap_or("").as_bytes());
        let digest = hasher.finalize();
        hex::encode(&digest[..8])
    }

    /// Total cost to the buyer, item price plus shipping.
    pub fn total_price(&self) -> f64 {
        self.price + self.shipping_price
    }
}

/// A completed sale from the sales-history view.
///
/// Immutable once parsed: it represents a historical fact, not live state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoldRecord {
    /// Sale price, currency-stripped
    pub price: f64,

    /// Condition grade of the sold copy
    pub condition: Condition,

    /// Normalized sale timestamp; `None` when the source text was
    /// unparseable (never defaulted to "now")
    pub sold_date: Option<DateTime<Utc>>,

    /// Raw date text as scraped, kept for display and sale identity
    pub raw_date: String,

    /// Number of copies sold
    pub quantity: u32,
}

impl SoldRecord {
    /// Key used to recognize a sale across cycles.
    ///
    /// Sales have no seller column, so price plus the raw date text is the
    /// best stable handle the page offers.
    pub fn sale_key(&self) -> String {
        format!("{:.2}|{}", self.price, self.raw_date)
    }
}
