//! Per-product snapshot of observed listings.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Listing, SoldRecord};

/// Complete set of listings observed for one product during one cycle.
///
/// Built fresh every cycle, never mutated incrementally. Identities are
/// unique within a snapshot: a later duplicate merges into the
/// earliest-seen entry instead of being appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Monitored product this snapshot belongs to
    pub product_id: String,

    /// When aggregation ran
    pub taken_at: DateTime<Utc>,

    /// Listings keyed by identity; BTreeMap for deterministic iteration
    pub listings: BTreeMap<String, Listing>,

    /// Sold-history records observed this cycle
    #[serde(default)]
    pub sold: Vec<SoldRecord>,
}

impl Snapshot {
    /// Create an empty snapshot stamped with the current time.
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            taken_at: Utc::now(),
            listings: BTreeMap::new(),
            sold: Vec::new(),
        }
    }

    /// Insert a listing, keeping the first-seen instance on duplicate
    /// identity. Returns whether the listing was actually added.
    pub fn insert(&mut self, listing: Listing) -> bool {
        if self.listings.contains_key(&listing.identity) {
            return false;
        }
        self.listings.insert(listing.identity.clone(), listing);
        true
    }

    /// Number of distinct listings.
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    /// Whether the snapshot holds no listings.
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Identity set, sorted.
    pub fn identities(&self) -> BTreeSet<String> {
        self.listings.keys().cloned().collect()
    }
}

/// Persisted state for one product: the last snapshot plus the
/// below-threshold suppression set carried between cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductState {
    pub snapshot: Snapshot,

    /// Identities that already fired BELOW_THRESHOLD and are still below
    /// the threshold; cleared per identity once the condition lifts
    #[serde(default)]
    pub alerted: BTreeSet<String>,
}

impl ProductState {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            alerted: BTreeSet::new(),
        }
    }
}
