//! Pagination-aware aggregation of listing pages into one snapshot.

use chrono::Utc;

use crate::models::{ProductPage, Snapshot};
use crate::parse::{build_listing, build_sold_record};
use crate::services::PageFetcher;

/// Outcome of aggregating one product's pages for one cycle.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub snapshot: Snapshot,

    /// Pages actually processed
    pub pages_scanned: u32,

    /// Rows skipped because no price could be extracted
    pub rows_skipped: u32,

    /// Whether a page fetch failed and the snapshot is partial
    pub degraded: bool,
}

/// Aggregate up to `max_pages` listing pages into a fresh snapshot.
///
/// Listings are keyed by identity with first-seen-wins merging, so rows
/// repeated across pagination boundaries never count twice. A non-first
/// page contributing zero new identities stops the walk early (repeat-page
/// guard against mis-detected "has next page" signals).
///
/// A malformed row never aborts its page. A failed page fetch (after the
/// fetcher's own bounded retries) ends aggregation with whatever was
/// gathered and marks the result degraded; it never fails the cycle.
pub async fn aggregate(
    fetcher: &dyn PageFetcher,
    product: &ProductPage,
    max_pages: u32,
) -> Aggregation {
    let mut snapshot = Snapshot::new(product.url.clone());
    let mut pages_scanned = 0u32;
    let mut rows_skipped = 0u32;
    let mut degraded = false;

    for page_index in 1..=max_pages {
        let page = match fetcher.fetch_page(product, page_index).await {
            Ok(page) => page,
            Err(error) => {
                log::warn!(
                    "Page {} fetch failed for {}: {} - keeping partial result",
                    page_index,
                    product.display_name(),
                    error
                );
                degraded = true;
                break;
            }
        };

        pages_scanned += 1;
        let mut new_on_page = 0usize;

        for row in &page.rows {
            match build_listing(row) {
                Some(listing) => {
                    if snapshot.insert(listing) {
                        new_on_page += 1;
                    }
                }
                None => {
                    rows_skipped += 1;
                    log::warn!(
                        "Skipping row with unparseable price on {} page {}: {:?}",
                        product.display_name(),
                        page_index,
                        row.price
                    );
                }
            }
        }

        if page_index > 1 && new_on_page == 0 {
            log::debug!(
                "Repeat-page guard: page {} of {} yielded no new listings",
                page_index,
                product.display_name()
            );
            break;
        }

        if !page.has_next_page {
            break;
        }
    }

    // Sold history is best-effort: a failure here logs and moves on, it
    // never degrades the cycle.
    match fetcher.fetch_sold_history(product).await {
        Ok(rows) => {
            let now = Utc::now();
            for row in &rows {
                match build_sold_record(row, now) {
                    Some(record) => snapshot.sold.push(record),
                    None => rows_skipped += 1,
                }
            }
        }
        Err(error) => {
            log::warn!(
                "Sold-history fetch failed for {}: {}",
                product.display_name(),
                error
            );
        }
    }

    snapshot.taken_at = Utc::now();

    Aggregation {
        snapshot,
        pages_scanned,
        rows_skipped,
        degraded,
    }
}
