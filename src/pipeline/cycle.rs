// src/pipeline/cycle.rs

//! One monitoring cycle for one product: aggregate, diff, alert, persist.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::models::{Config, ProductPage, ProductState};
use crate::pipeline::aggregate::aggregate;
use crate::pipeline::alerts::{EventKind, NotificationEvent, evaluate};
use crate::pipeline::diff::{DiffResult, calculate_diff};
use crate::services::{Notifier, PageFetcher};
use crate::storage::SnapshotStore;

/// Outcome of one monitoring cycle.
#[derive(Debug)]
pub struct CycleResult {
    pub diff: DiffResult,
    pub events: Vec<NotificationEvent>,
    pub pages_scanned: u32,
    pub rows_skipped: u32,
    /// Snapshot is partial due to a page-fetch failure
    pub degraded: bool,
    /// The cycle computed fine but the snapshot could not be persisted;
    /// the caller decides whether to retry the save
    pub persist_failed: bool,
}

/// Run one monitoring cycle for a product.
///
/// A degraded aggregation still produces a full cycle result; only a
/// failure to read the previous baseline aborts the cycle, since diffing
/// against nothing would misreport every listing as new.
pub async fn run_cycle(
    product: &ProductPage,
    config: &Config,
    fetcher: &dyn PageFetcher,
    store: &dyn SnapshotStore,
    notifier: &dyn Notifier,
) -> Result<CycleResult> {
    let key = product.storage_key();
    let previous = store.load(&key).await?;

    let aggregation = aggregate(fetcher, product, config.monitor.max_pages).await;

    let diff = calculate_diff(
        previous.as_ref().map(|state| &state.snapshot),
        &aggregation.snapshot,
    );

    let no_alerts = BTreeSet::new();
    let previously_alerted = previous
        .as_ref()
        .map_or(&no_alerts, |state| &state.alerted);

    let thresholds = config.thresholds();
    let (mut events, alerted) = evaluate(
        &product.display_name(),
        &diff,
        &aggregation.snapshot,
        &thresholds,
        previously_alerted,
    );

    if !config.thresholds.alert_all_new_sales {
        events.retain(|event| event.kind != EventKind::SoldRecord);
    }

    if !events.is_empty() {
        // Fire-and-forget: the transport logs its own failures, the cycle
        // does not retry them.
        if let Err(error) = notifier.send_events(&product.display_name(), &events).await {
            log::warn!(
                "Notification dispatch failed for {}: {}",
                product.display_name(),
                error
            );
        }
    }

    let state = ProductState {
        snapshot: aggregation.snapshot,
        alerted,
    };

    let mut persist_failed = false;
    if let Err(error) = store.save(&key, &state).await {
        log::error!(
            "Failed to persist snapshot for {}: {}",
            product.display_name(),
            error
        );
        persist_failed = true;
    }

    Ok(CycleResult {
        diff,
        events,
        pages_scanned: aggregation.pages_scanned,
        rows_skipped: aggregation.rows_skipped,
        degraded: aggregation.degraded,
        persist_failed,
    })
}

/// Aggregate and persist a product's current state without dispatching any
/// notifications. Used to seed a baseline so the first monitored cycle does
/// not report every existing listing as new.
pub async fn run_seed(
    product: &ProductPage,
    config: &Config,
    fetcher: &dyn PageFetcher,
    store: &dyn SnapshotStore,
) -> Result<CycleResult> {
    let key = product.storage_key();
    let aggregation = aggregate(fetcher, product, config.monitor.max_pages).await;
    let diff = calculate_diff(None, &aggregation.snapshot);

    let state = ProductState::new(aggregation.snapshot);
    store.save(&key, &state).await?;

    Ok(CycleResult {
        diff,
        events: Vec::new(),
        pages_scanned: aggregation.pages_scanned,
        rows_skipped: aggregation.rows_skipped,
        degraded: aggregation.degraded,
        persist_failed: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{RawPage, RawRow};
    use crate::services::NullNotifier;
    use crate::storage::LocalStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FixedFetcher {
        pages: Mutex<Vec<Vec<RawPage>>>,
    }

    impl FixedFetcher {
        /// Each call to a cycle consumes one scripted set of pages.
        fn new(cycles: Vec<Vec<RawPage>>) -> Self {
            Self {
                pages: Mutex::new(cycles),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for FixedFetcher {
        async fn fetch_page(
            &self,
            _product: &ProductPage,
            page_index: u32,
        ) -> crate::error::Result<RawPage> {
            let pages = self.pages.lock().unwrap();
            let current = pages.first().ok_or_else(|| {
                AppError::fetch("fixed", "no cycles scripted")
            })?;
            current
                .get((page_index - 1) as usize)
                .cloned()
                .ok_or_else(|| AppError::fetch("fixed", format!("no page {page_index}")))
        }

        async fn fetch_sold_history(
            &self,
            _product: &ProductPage,
        ) -> crate::error::Result<Vec<RawRow>> {
            Ok(Vec::new())
        }
    }

    impl FixedFetcher {
        fn advance(&self) {
            self.pages.lock().unwrap().remove(0);
        }
    }

    fn product() -> ProductPage {
        ProductPage {
            url: "https://example.com/product/1/test-card".to_string(),
            name: Some("Test Card".to_string()),
        }
    }

    fn config() -> Config {
        Config {
            products: vec![product()],
            ..Config::default()
        }
    }

    fn listing_page(price: &str) -> RawPage {
        RawPage {
            rows: vec![RawRow {
                condition: "Near Mint".to_string(),
                price: price.to_string(),
                seller: "SellerA".to_string(),
                ..RawRow::default()
            }],
            has_next_page: false,
        }
    }

    #[tokio::test]
    async fn test_first_cycle_everything_new_and_persisted() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        let fetcher = FixedFetcher::new(vec![vec![listing_page("$45.00")]]);

        let result = run_cycle(&product(), &config(), &fetcher, &store, &NullNotifier)
            .await
            .unwrap();

        assert_eq!(result.diff.new.len(), 1);
        assert!(!result.degraded);
        assert!(!result.persist_failed);

        let saved = store.load(&product().storage_key()).await.unwrap().unwrap();
        assert_eq!(saved.snapshot.len(), 1);
    }

    #[tokio::test]
    async fn test_second_cycle_sees_price_change() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        let fetcher = FixedFetcher::new(vec![
            vec![listing_page("$8500.00")],
            vec![listing_page("$8200.00")],
        ]);
        let cfg = config();

        run_cycle(&product(), &cfg, &fetcher, &store, &NullNotifier)
            .await
            .unwrap();
        fetcher.advance();

        let result = run_cycle(&product(), &cfg, &fetcher, &store, &NullNotifier)
            .await
            .unwrap();
        assert_eq!(result.diff.changed.len(), 1);
        assert_eq!(
            result.diff.changed[0].price_delta(),
            Some((8500.0, 8200.0))
        );
        assert!(
            result
                .events
                .iter()
                .any(|e| e.kind == EventKind::PriceDrop)
        );
    }

    #[tokio::test]
    async fn test_below_threshold_suppressed_on_second_cycle() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        let fetcher = FixedFetcher::new(vec![
            vec![listing_page("$45.00")],
            vec![listing_page("$45.00")],
        ]);
        let cfg = config();

        let first = run_cycle(&product(), &cfg, &fetcher, &store, &NullNotifier)
            .await
            .unwrap();
        assert!(
            first
                .events
                .iter()
                .any(|e| e.kind == EventKind::BelowThreshold)
        );
        fetcher.advance();

        let second = run_cycle(&product(), &cfg, &fetcher, &store, &NullNotifier)
            .await
            .unwrap();
        assert!(
            !second
                .events
                .iter()
                .any(|e| e.kind == EventKind::BelowThreshold)
        );
    }

    #[tokio::test]
    async fn test_storage_save_failure_flags_but_returns_result() {
        struct BrokenStore;

        #[async_trait]
        impl SnapshotStore for BrokenStore {
            async fn load(&self, _key: &str) -> crate::error::Result<Option<ProductState>> {
                Ok(None)
            }

            async fn save(
                &self,
                _key: &str,
                _state: &ProductState,
            ) -> crate::error::Result<()> {
                Err(AppError::storage("disk full"))
            }
        }

        let fetcher = FixedFetcher::new(vec![vec![listing_page("$45.00")]]);
        let result = run_cycle(&product(), &config(), &fetcher, &BrokenStore, &NullNotifier)
            .await
            .unwrap();

        assert!(result.persist_failed);
        assert_eq!(result.diff.new.len(), 1);
    }

    #[tokio::test]
    async fn test_seed_persists_without_events() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        let fetcher = FixedFetcher::new(vec![vec![listing_page("$45.00")]]);

        let result = run_seed(&product(), &config(), &fetcher, &store)
            .await
            .unwrap();
        assert!(result.events.is_empty());
        assert_eq!(result.diff.new.len(), 1);

        let saved = store.load(&product().storage_key()).await.unwrap().unwrap();
        assert_eq!(saved.snapshot.len(), 1);
        assert!(saved.alerted.is_empty());
    }

    #[tokio::test]
    async fn test_degraded_cycle_still_returns_result() {
        // Page 1 succeeds, page 2 is scripted missing: has_next_page on
        // page 1 forces the aggregator to try it and degrade.
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        let mut page = listing_page("$45.00");
        page.has_next_page = true;
        let fetcher = FixedFetcher::new(vec![vec![page]]);

        let result = run_cycle(&product(), &config(), &fetcher, &store, &NullNotifier)
            .await
            .unwrap();
        assert!(result.degraded);
        assert_eq!(result.pages_scanned, 1);
        assert_eq!(result.diff.new.len(), 1);
    }
}
