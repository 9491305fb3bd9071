//! Alert policy: maps a diff plus static thresholds to notification events.
//!
//! Pure policy logic. Produces event values only; dispatch belongs to the
//! notifier collaborator so this can be tested without any network mocking.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{Snapshot, Thresholds};
use crate::pipeline::diff::DiffResult;

/// Event category, declared in emission order: highest urgency first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    BelowThreshold,
    PriceDrop,
    NewListing,
    PriceRise,
    SoldRecord,
}

/// One notification event ready for dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: EventKind,
    /// Listing identity, or the sale key for sold records
    pub identity: String,
    /// Preformatted human-readable message
    pub message: String,
}

/// Evaluate the alert policy for one cycle.
///
/// `previously_alerted` is the set of identities whose BELOW_THRESHOLD
/// already fired and whose price has stayed below the threshold since;
/// the returned set replaces it for the next cycle. An identity re-fires
/// only after its price clears the threshold and later drops back under.
///
/// Events are ordered by category urgency, then by identity within each
/// category.
pub fn evaluate(
    product_name: &str,
    diff: &DiffResult,
    current: &Snapshot,
    thresholds: &Thresholds,
    previously_alerted: &BTreeSet<String>,
) -> (Vec<NotificationEvent>, BTreeSet<String>) {
    let mut events = Vec::new();

    // Below-threshold: any current listing at or under the price cap,
    // at most once per identity while the condition persists.
    let below_now: BTreeSet<String> = current
        .listings
        .values()
        .filter(|listing| listing.price <= thresholds.max_price_alert)
        .map(|listing| listing.identity.clone())
        .collect();

    for identity in below_now.difference(previously_alerted) {
        let listing = &current.listings[identity];
        events.push(NotificationEvent {
            kind: EventKind::BelowThreshold,
            identity: identity.clone(),
            message: format!(
                "Price Alert: {} at ${:.2} ({}) from {} is below ${:.2}",
                product_name,
                listing.price,
                listing.condition,
                listing.seller_name,
                thresholds.max_price_alert
            ),
        });
    }

    // Price movement on any tracked listing is always surfaced, with no
    // condition filter.
    for change in &diff.changed {
        if let Some((old, new)) = change.price_delta() {
            let (kind, verb) = if new < old {
                (EventKind::PriceDrop, "dropped")
            } else {
                (EventKind::PriceRise, "rose")
            };
            events.push(NotificationEvent {
                kind,
                identity: change.identity.clone(),
                message: format!(
                    "{}: {} ({}) from {} {} ${:.2} -> ${:.2}",
                    if kind == EventKind::PriceDrop {
                        "Price Drop"
                    } else {
                        "Price Rise"
                    },
                    product_name,
                    change.new.condition,
                    change.new.seller_name,
                    verb,
                    old,
                    new
                ),
            });
        }
    }

    // New listings, filtered to acceptable grades.
    for listing in &diff.new {
        if listing.condition.at_least(thresholds.min_condition) {
            events.push(NotificationEvent {
                kind: EventKind::NewListing,
                identity: listing.identity.clone(),
                message: format!(
                    "New Listing: {} at ${:.2} ({}) from {}, {} available",
                    product_name,
                    listing.price,
                    listing.condition,
                    listing.seller_name,
                    listing.quantity_available
                ),
            });
        }
    }

    for record in &diff.new_sales {
        events.push(NotificationEvent {
            kind: EventKind::SoldRecord,
            identity: record.sale_key(),
            message: format!(
                "New Sale: {} - ${:.2} ({}) - {}",
                product_name, record.price, record.condition, record.raw_date
            ),
        });
    }

    events.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.identity.cmp(&b.identity)));

    (events, below_now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Condition, Listing, SoldRecord};
    use crate::pipeline::diff::calculate_diff;

    fn make_listing(seller: &str, condition: Condition, price: f64) -> Listing {
        Listing {
            identity: Listing::derive_identity(seller, condition, None),
            condition,
            price,
            shipping_price: 0.0,
            seller_name: seller.to_string(),
            quantity_available: 1,
            additional_info: None,
        }
    }

    fn make_snapshot(listings: Vec<Listing>) -> Snapshot {
        let mut snapshot = Snapshot::new("product-1");
        for listing in listings {
            snapshot.insert(listing);
        }
        snapshot
    }

    fn thresholds() -> Thresholds {
        Thresholds {
            max_price_alert: 100.0,
            min_condition: Condition::LightlyPlayed,
        }
    }

    #[test]
    fn test_first_listing_below_threshold_fires_both_events() {
        let current = make_snapshot(vec![make_listing(
            "SellerA",
            Condition::LightlyPlayed,
            45.0,
        )]);
        let diff = calculate_diff(None, &current);

        let (events, alerted) =
            evaluate("Test Card", &diff, &current, &thresholds(), &BTreeSet::new());

        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::BelowThreshold, EventKind::NewListing]);
        assert_eq!(alerted.len(), 1);
    }

    #[test]
    fn test_below_threshold_not_refired_while_condition_holds() {
        let current = make_snapshot(vec![make_listing("SellerA", Condition::NearMint, 45.0)]);
        let diff = calculate_diff(Some(&current.clone()), &current);

        let (first_events, alerted) =
            evaluate("Test Card", &diff, &current, &thresholds(), &BTreeSet::new());
        assert!(
            first_events
                .iter()
                .any(|e| e.kind == EventKind::BelowThreshold)
        );

        let (second_events, alerted_again) =
            evaluate("Test Card", &diff, &current, &thresholds(), &alerted);
        assert!(
            !second_events
                .iter()
                .any(|e| e.kind == EventKind::BelowThreshold)
        );
        assert_eq!(alerted, alerted_again);
    }

    #[test]
    fn test_below_threshold_rearms_after_clearing() {
        let listing = make_listing("SellerA", Condition::NearMint, 45.0);
        let identity = listing.identity.clone();
        let cheap = make_snapshot(vec![listing]);
        let pricey = make_snapshot(vec![make_listing("SellerA", Condition::NearMint, 150.0)]);

        // Cycle 1: fires and records the identity.
        let diff = calculate_diff(None, &cheap);
        let (_, alerted) = evaluate("Card", &diff, &cheap, &thresholds(), &BTreeSet::new());
        assert!(alerted.contains(&identity));

        // Cycle 2: price rose above the cap; identity drops out of the set.
        let diff = calculate_diff(Some(&cheap), &pricey);
        let (events, alerted) = evaluate("Card", &diff, &pricey, &thresholds(), &alerted);
        assert!(!alerted.contains(&identity));
        assert!(events.iter().any(|e| e.kind == EventKind::PriceRise));

        // Cycle 3: price back under the cap; fires again.
        let diff = calculate_diff(Some(&pricey), &cheap);
        let (events, _) = evaluate("Card", &diff, &cheap, &thresholds(), &alerted);
        assert!(events.iter().any(|e| e.kind == EventKind::BelowThreshold));
    }

    #[test]
    fn test_price_drop_event() {
        let prev = make_snapshot(vec![make_listing("SellerA", Condition::NearMint, 8500.0)]);
        let curr = make_snapshot(vec![make_listing("SellerA", Condition::NearMint, 8200.0)]);
        let diff = calculate_diff(Some(&prev), &curr);

        let (events, _) = evaluate("Card", &diff, &curr, &thresholds(), &BTreeSet::new());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::PriceDrop);
        assert!(events[0].message.contains("$8500.00 -> $8200.00"));
    }

    #[test]
    fn test_price_changes_ignore_condition_filter() {
        // Heavily Played fails the condition filter, but price moves on any
        // tracked item are always surfaced.
        let prev = make_snapshot(vec![make_listing("SellerA", Condition::HeavilyPlayed, 500.0)]);
        let curr = make_snapshot(vec![make_listing("SellerA", Condition::HeavilyPlayed, 400.0)]);
        let diff = calculate_diff(Some(&prev), &curr);

        let (events, _) = evaluate("Card", &diff, &curr, &thresholds(), &BTreeSet::new());
        assert!(events.iter().any(|e| e.kind == EventKind::PriceDrop));
    }

    #[test]
    fn test_new_listing_below_condition_threshold_suppressed() {
        let current = make_snapshot(vec![make_listing(
            "SellerA",
            Condition::ModeratelyPlayed,
            250.0,
        )]);
        let diff = calculate_diff(None, &current);

        let (events, _) = evaluate("Card", &diff, &current, &thresholds(), &BTreeSet::new());
        assert!(events.is_empty());
    }

    #[test]
    fn test_sold_record_event_last_in_order() {
        let mut current = make_snapshot(vec![make_listing(
            "SellerA",
            Condition::LightlyPlayed,
            45.0,
        )]);
        current.sold = vec![SoldRecord {
            price: 48.0,
            condition: Condition::NearMint,
            sold_date: None,
            raw_date: "8/24/2026".to_string(),
            quantity: 1,
        }];
        let diff = calculate_diff(None, &current);

        let (events, _) = evaluate("Card", &diff, &current, &thresholds(), &BTreeSet::new());
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::BelowThreshold,
                EventKind::NewListing,
                EventKind::SoldRecord
            ]
        );
    }

    #[test]
    fn test_events_sorted_by_identity_within_category() {
        let current = make_snapshot(vec![
            make_listing("SellerA", Condition::NearMint, 30.0),
            make_listing("SellerB", Condition::Mint, 40.0),
            make_listing("SellerC", Condition::LightlyPlayed, 50.0),
        ]);
        let diff = calculate_diff(None, &current);

        let (events, _) = evaluate("Card", &diff, &current, &thresholds(), &BTreeSet::new());

        let below: Vec<&String> = events
            .iter()
            .filter(|e| e.kind == EventKind::BelowThreshold)
            .map(|e| &e.identity)
            .collect();
        let mut sorted = below.clone();
        sorted.sort();
        assert_eq!(below, sorted);
    }
}
