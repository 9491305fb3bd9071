//! External collaborator services: page fetching and notification dispatch.

pub mod fetcher;
pub mod notifier;

pub use fetcher::{HttpPageFetcher, PageFetcher};
pub use notifier::{DiscordNotifier, Notifier, NullNotifier};
