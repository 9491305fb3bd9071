//! Diff calculation between consecutive snapshots.
//!
//! Pure function of (previous snapshot | absent, current snapshot): no side
//! effects, no I/O. Classifies every current listing as new, changed or
//! unchanged, and computes removals from the previous set. The three
//! current-side classes exactly partition the current identity set.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{Listing, Snapshot, SoldRecord, price_eq};

/// A single observed field change on a matched listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldDelta {
    Price { old: f64, new: f64 },
    ShippingPrice { old: f64, new: f64 },
    Quantity { old: u32, new: u32 },
}

/// A matched listing whose tracked fields differ between snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingChange {
    pub identity: String,
    pub old: Listing,
    pub new: Listing,
    pub deltas: Vec<FieldDelta>,
}

impl ListingChange {
    /// Old and new price when this change includes a price delta.
    pub fn price_delta(&self) -> Option<(f64, f64)> {
        self.deltas.iter().find_map(|delta| match delta {
            FieldDelta::Price { old, new } => Some((*old, *new)),
            _ => None,
        })
    }
}

/// Classified difference between two snapshots of one product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffResult {
    /// Current listings absent from the previous snapshot, by identity order
    pub new: Vec<Listing>,

    /// Matched listings with field changes, by identity order
    pub changed: Vec<ListingChange>,

    /// Matched identities with no field changes, sorted
    pub unchanged: Vec<String>,

    /// Previous identities absent from the current snapshot, sorted
    pub removed: Vec<String>,

    /// Sold records not present in the previous snapshot's history
    pub new_sales: Vec<SoldRecord>,
}

impl DiffResult {
    /// Check if there are any changes worth acting on.
    pub fn has_changes(&self) -> bool {
        !self.new.is_empty()
            || !self.changed.is_empty()
            || !self.removed.is_empty()
            || !self.new_sales.is_empty()
    }

    /// Get the total number of changes.
    pub fn change_count(&self) -> usize {
        self.new.len() + self.changed.len() + self.removed.len() + self.new_sales.len()
    }
}

/// Calculate the diff between the previous and current snapshots.
///
/// With no previous snapshot (first-ever run) every listing is `new`; any
/// suppression of first-run notification storms is the caller's call, not
/// the differ's.
pub fn calculate_diff(previous: Option<&Snapshot>, current: &Snapshot) -> DiffResult {
    let mut result = DiffResult::default();

    let Some(previous) = previous else {
        result.new = current.listings.values().cloned().collect();
        result.new_sales = current.sold.clone();
        return result;
    };

    for (identity, listing) in &current.listings {
        let Some(old) = previous.listings.get(identity) else {
            result.new.push(listing.clone());
            continue;
        };

        // Identity encodes seller and condition, so a matched key with
        // either differing means the identity function is broken. Surface
        // it loudly and refuse to report phantom changes.
        if old.seller_name != listing.seller_name || old.condition != listing.condition {
            log::error!(
                "Identity collision for {}: seller/condition drift ({} {} -> {} {})",
                identity,
                old.seller_name,
                old.condition,
                listing.seller_name,
                listing.condition
            );
            result.unchanged.push(identity.clone());
            continue;
        }

        let deltas = field_deltas(old, listing);
        if deltas.is_empty() {
            result.unchanged.push(identity.clone());
        } else {
            result.changed.push(ListingChange {
                identity: identity.clone(),
                old: old.clone(),
                new: listing.clone(),
                deltas,
            });
        }
    }

    result.removed = previous
        .listings
        .keys()
        .filter(|identity| !current.listings.contains_key(*identity))
        .cloned()
        .collect();

    let seen_sales: HashSet<String> = previous.sold.iter().map(SoldRecord::sale_key).collect();
    result.new_sales = current
        .sold
        .iter()
        .filter(|record| !seen_sales.contains(&record.sale_key()))
        .cloned()
        .collect();

    result
}

/// Compare the tracked (non-identity-bearing) fields of a matched pair.
fn field_deltas(old: &Listing, new: &Listing) -> Vec<FieldDelta> {
    let mut deltas = Vec::new();

    if !price_eq(old.price, new.price) {
        deltas.push(FieldDelta::Price {
            old: old.price,
            new: new.price,
        });
    }
    if !price_eq(old.shipping_price, new.shipping_price) {
        deltas.push(FieldDelta::ShippingPrice {
            old: old.shipping_price,
            new: new.shipping_price,
        });
    }
    if old.quantity_available != new.quantity_available {
        deltas.push(FieldDelta::Quantity {
            old: old.quantity_available,
            new: new.quantity_available,
        });
    }

    deltas
}
