//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::models::Condition;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Monitoring cadence and aggregation limits
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Alerting thresholds
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// HTTP client behavior
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// CSS selectors for the marketplace listing tables
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Notification transport settings
    #[serde(default)]
    pub alerts: AlertConfig,

    /// Snapshot persistence settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Product pages to monitor
    #[serde(default)]
    pub products: Vec<ProductPage>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.scraper.user_agent.trim().is_empty() {
            return Err(AppError::validation("scraper.user_agent is empty"));
        }
        if self.scraper.timeout_secs == 0 {
            return Err(AppError::validation("scraper.timeout_secs must be > 0"));
        }
        if self.monitor.max_pages == 0 {
            return Err(AppError::validation("monitor.max_pages must be > 0"));
        }
        if self.monitor.max_concurrent == 0 {
            return Err(AppError::validation("monitor.max_concurrent must be > 0"));
        }
        if self.thresholds.max_price_alert < 0.0 {
            return Err(AppError::validation(
                "thresholds.max_price_alert must be non-negative",
            ));
        }
        if Condition::parse(&self.thresholds.min_condition) == Condition::Unknown {
            return Err(AppError::validation(format!(
                "thresholds.min_condition '{}' is not a known grade",
                self.thresholds.min_condition
            )));
        }
        if self.products.is_empty() {
            return Err(AppError::validation("No products configured"));
        }
        for product in &self.products {
            url::Url::parse(&product.url)
                .map_err(|e| AppError::validation(format!("Bad product url {}: {e}", product.url)))?;
        }
        Ok(())
    }

    /// Resolve the runtime thresholds from the configured strings.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            max_price_alert: self.thresholds.max_price_alert,
            min_condition: Condition::parse(&self.thresholds.min_condition),
        }
    }
}

/// Monitoring cadence and aggregation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between monitoring ticks
    #[serde(default = "defaults::interval_secs")]
    pub interval_secs: u64,

    /// Maximum listing pages aggregated per product per cycle
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,

    /// Maximum products processed concurrently
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Delay between page fetches in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval_secs(),
            max_pages: defaults::max_pages(),
            max_concurrent: defaults::max_concurrent(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// Static alerting thresholds as configured (string condition form).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Alert when any acceptable listing is at or below this price
    #[serde(default = "defaults::max_price_alert")]
    pub max_price_alert: f64,

    /// Minimum acceptable condition grade ("Lightly Played" or better)
    #[serde(default = "defaults::min_condition")]
    pub min_condition: String,

    /// Alert for every new sold record regardless of price
    #[serde(default = "defaults::alert_all_new_sales")]
    pub alert_all_new_sales: bool,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            max_price_alert: defaults::max_price_alert(),
            min_condition: defaults::min_condition(),
            alert_all_new_sales: defaults::alert_all_new_sales(),
        }
    }
}

/// Resolved runtime thresholds passed into the alert policy.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub max_price_alert: f64,
    pub min_condition: Condition,
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Attempts per page fetch before giving up (includes the first try)
    #[serde(default = "defaults::retry_attempts")]
    pub retry_attempts: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            retry_attempts: defaults::retry_attempts(),
        }
    }
}

/// CSS selectors aligning listing table columns to row fragments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// One listing row
    #[serde(default = "defaults::listing_row")]
    pub listing_row: String,

    /// Condition column within a row
    #[serde(default = "defaults::condition_sel")]
    pub condition: String,

    /// Price column within a row
    #[serde(default = "defaults::price_sel")]
    pub price: String,

    /// Shipping column within a row
    #[serde(default = "defaults::shipping_sel")]
    pub shipping: String,

    /// Seller column within a row
    #[serde(default = "defaults::seller_sel")]
    pub seller: String,

    /// Quantity column within a row
    #[serde(default = "defaults::quantity_sel")]
    pub quantity: String,

    /// Optional annotation column within a row
    #[serde(default = "defaults::note_sel")]
    pub note: String,

    /// Element present only when a further page exists
    #[serde(default = "defaults::next_page_sel")]
    pub next_page: String,

    /// One sold-history row in the sales dialog
    #[serde(default = "defaults::sold_row")]
    pub sold_row: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing_row: defaults::listing_row(),
            condition: defaults::condition_sel(),
            price: defaults::price_sel(),
            shipping: defaults::shipping_sel(),
            seller: defaults::seller_sel(),
            quantity: defaults::quantity_sel(),
            note: defaults::note_sel(),
            next_page: defaults::next_page_sel(),
            sold_row: defaults::sold_row(),
        }
    }
}

/// Notification transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Discord webhook URL; empty disables dispatch
    #[serde(default)]
    pub discord_webhook_url: String,

    /// Webhook display name
    #[serde(default = "defaults::webhook_username")]
    pub username: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            discord_webhook_url: String::new(),
            username: defaults::webhook_username(),
        }
    }
}

/// Snapshot persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for persisted product state
    #[serde(default = "defaults::data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter: debug, info, warn, error
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

/// One monitored product page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    /// Full product page URL
    pub url: String,

    /// Optional display name; derived from the URL slug when absent
    #[serde(default)]
    pub name: Option<String>,
}

impl ProductPage {
    /// Human-readable name for logs and notifications.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }

        // Product URLs look like /product/{id}/{slug}; title-case the slug.
        let slug = self
            .url
            .split('/')
            .skip_while(|part| *part != "product")
            .nth(2)
            .map(|part| part.split('?').next().unwrap_or(part))
            .unwrap_or("");

        if slug.is_empty() {
            return "Unknown Card".to_string();
        }

        slug.split('-')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Stable filesystem-safe key for persistence, derived from the URL.
    pub fn storage_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.url.as_bytes());
        hex::encode(&hasher.finalize()[..8])
    }
}

/// Default values for configuration.
mod defaults {
    pub fn interval_secs() -> u64 {
        60
    }

    pub fn max_pages() -> u32 {
        5
    }

    pub fn max_concurrent() -> usize {
        3
    }

    pub fn request_delay() -> u64 {
        2000
    }

    pub fn max_price_alert() -> f64 {
        100.0
    }

    pub fn min_condition() -> String {
        "Lightly Played".to_string()
    }

    pub fn alert_all_new_sales() -> bool {
        true
    }

    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36".to_string()
    }

    pub fn timeout() -> u64 {
        30
    }

    pub fn retry_attempts() -> u32 {
        2
    }

    pub fn listing_row() -> String {
        ".listing-item".to_string()
    }

    pub fn condition_sel() -> String {
        ".listing-item__listing-data__info__condition".to_string()
    }

    pub fn price_sel() -> String {
        ".listing-item__listing-data__info__price".to_string()
    }

    pub fn shipping_sel() -> String {
        ".shipping-messages__price".to_string()
    }

    pub fn seller_sel() -> String {
        ".seller-info__name".to_string()
    }

    pub fn quantity_sel() -> String {
        ".add-to-cart__available".to_string()
    }

    pub fn note_sel() -> String {
        ".listing-item__listing-data__listo".to_string()
    }

    pub fn next_page_sel() -> String {
        "a[aria-label=\"Next page\"]:not([aria-disabled=\"true\"])".to_string()
    }

    pub fn sold_row() -> String {
        ".modal__activator + .modal table tr".to_string()
    }

    pub fn webhook_username() -> String {
        "TCGplayer Last Sold Monitor".to_string()
    }

    pub fn data_dir() -> String {
        "data".to_string()
    }

    pub fn log_level() -> String {
        "info".to_string()
    }
}
