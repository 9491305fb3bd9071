// src/pipeline/watch.rs

//! Multi-product monitoring passes and the periodic watch loop.

use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::cycle::{run_cycle, run_seed};
use crate::services::{Notifier, PageFetcher};
use crate::storage::SnapshotStore;

/// Run one monitoring pass over every configured product.
///
/// Products are processed with bounded concurrency, each owning its own
/// snapshot pair exclusively. A failed product cycle is logged and never
/// aborts the pass for the others.
pub async fn run_tick(
    config: &Config,
    fetcher: &dyn PageFetcher,
    store: &dyn SnapshotStore,
    notifier: &dyn Notifier,
) {
    let concurrency = config.monitor.max_concurrent.max(1);

    let mut cycles = stream::iter(config.products.iter())
        .map(|product| async move {
            let outcome = run_cycle(product, config, fetcher, store, notifier).await;
            (product, outcome)
        })
        .buffer_unordered(concurrency);

    while let Some((product, outcome)) = cycles.next().await {
        match outcome {
            Ok(result) => {
                log::info!(
                    "{}: {} new, {} changed, {} removed, {} event(s), {} page(s){}{}",
                    product.display_name(),
                    result.diff.new.len(),
                    result.diff.changed.len(),
                    result.diff.removed.len(),
                    result.events.len(),
                    result.pages_scanned,
                    if result.degraded { ", DEGRADED" } else { "" },
                    if result.persist_failed {
                        ", PERSIST FAILED"
                    } else {
                        ""
                    },
                );
            }
            Err(error) => {
                log::error!("Cycle failed for {}: {}", product.display_name(), error);
            }
        }
    }
}

/// Run the periodic monitoring loop until the process is stopped.
pub async fn run_watch(
    config: &Config,
    fetcher: &dyn PageFetcher,
    store: &dyn SnapshotStore,
    notifier: &dyn Notifier,
) -> Result<()> {
    let interval = Duration::from_secs(config.monitor.interval_secs);
    log::info!(
        "Watching {} product(s), checking every {}s",
        config.products.len(),
        config.monitor.interval_secs
    );

    if let Err(error) = notifier
        .send_startup(&config.products, config.monitor.interval_secs)
        .await
    {
        log::warn!("Startup notification failed: {}", error);
    }

    loop {
        let started = Instant::now();
        run_tick(config, fetcher, store, notifier).await;

        let elapsed = started.elapsed();
        let sleep_for = interval.saturating_sub(elapsed);
        log::info!(
            "Monitoring pass complete in {:.1}s. Next check in {:.1}s",
            elapsed.as_secs_f64(),
            sleep_for.as_secs_f64()
        );
        tokio::time::sleep(sleep_for).await;
    }
}

/// Seed baselines for every configured product, sequentially.
pub async fn run_seed_all(
    config: &Config,
    fetcher: &dyn PageFetcher,
    store: &dyn SnapshotStore,
) -> Result<()> {
    for product in &config.products {
        let result = run_seed(product, config, fetcher, store).await?;
        log::info!(
            "Seeded {}: {} listing(s) from {} page(s){}",
            product.display_name(),
            result.diff.new.len(),
            result.pages_scanned,
            if result.degraded { ", DEGRADED" } else { "" },
        );
    }
    Ok(())
}
