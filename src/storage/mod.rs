//! Storage abstractions for snapshot persistence.
//!
//! One JSON document per monitored product holds its last snapshot plus
//! the alert suppression set. Snapshots are written whole at the end of a
//! cycle and read back at the start of the next as the "previous" baseline;
//! nothing is ever mutated in place.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ProductState;

// Re-export for convenience
pub use local::LocalStore;

/// Trait for product-state storage backends.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the persisted state for a product, `None` on first run.
    async fn load(&self, product_key: &str) -> Result<Option<ProductState>>;

    /// Persist the state for a product, replacing any previous state.
    async fn save(&self, product_key: &str, state: &ProductState) -> Result<()>;
}
