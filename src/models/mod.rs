// src/models/mod.rs

//! Domain models for the monitor application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod condition;
mod config;
mod listing;
mod raw;
mod snapshot;

// Re-export all public types
pub use condition::Condition;
pub use config::{
    AlertConfig, Config, LoggingConfig, MonitorConfig, ProductPage, ScraperConfig, SelectorConfig,
    StorageConfig, ThresholdConfig, Thresholds,
};
pub use listing::{Listing, SoldRecord, price_eq};
pub use raw::{RawPage, RawRow};
pub use snapshot::{ProductState, Snapshot};
