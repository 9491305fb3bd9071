// src/services/notifier.rs

//! Notification dispatch service.
//!
//! The alert policy only produces event values; this module owns the side
//! effects. Dispatch is fire-and-forget from the cycle's perspective:
//! transport failures are logged, never retried here.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::ProductPage;
use crate::pipeline::NotificationEvent;

/// Dispatches notification events to an external transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send the events for one product.
    async fn send_events(&self, product_name: &str, events: &[NotificationEvent]) -> Result<()>;

    /// Announce that monitoring has started.
    async fn send_startup(&self, products: &[ProductPage], interval_secs: u64) -> Result<()>;
}

/// Discord webhook notifier.
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
    username: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            webhook_url: webhook_url.into(),
            username: username.into(),
        }
    }

    async fn post(&self, content: &str) -> Result<()> {
        let payload = json!({
            "content": content,
            "username": self.username,
        });

        self.client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::notify(e))?
            .error_for_status()
            .map_err(|e| AppError::notify(e))?;

        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send_events(&self, product_name: &str, events: &[NotificationEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        // One webhook post per product per cycle; Discord caps content at
        // 2000 characters, so chunk when a busy cycle overflows it.
        let mut chunk = String::new();
        for event in events {
            if chunk.len() + event.message.len() + 1 > 1900 {
                self.post(&chunk).await?;
                chunk.clear();
            }
            if !chunk.is_empty() {
                chunk.push('\n');
            }
            chunk.push_str(&event.message);
        }
        if !chunk.is_empty() {
            self.post(&chunk).await?;
        }

        log::info!("Sent {} alert(s) for {}", events.len(), product_name);
        Ok(())
    }

    async fn send_startup(&self, products: &[ProductPage], interval_secs: u64) -> Result<()> {
        let names: Vec<String> = products
            .iter()
            .map(|p| format!("- {}", p.display_name()))
            .collect();

        let message = format!(
            "Monitor started. Watching {} product(s), checking every {} seconds.\n{}",
            products.len(),
            interval_secs,
            names.join("\n")
        );

        self.post(&message).await
    }
}

/// No-op notifier for tests and webhook-less configurations.
#[derive(Debug, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send_events(&self, product_name: &str, events: &[NotificationEvent]) -> Result<()> {
        for event in events {
            log::info!("[{}] {}", product_name, event.message);
        }
        Ok(())
    }

    async fn send_startup(&self, products: &[ProductPage], _interval_secs: u64) -> Result<()> {
        log::debug!("Startup (no webhook): {} product(s)", products.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::EventKind;

    #[tokio::test]
    async fn test_null_notifier_accepts_events() {
        let notifier = NullNotifier;
        let events = vec![NotificationEvent {
            kind: EventKind::NewListing,
            identity: "abc".to_string(),
            message: "New Listing: Test".to_string(),
        }];
        assert!(notifier.send_events("Test Card", &events).await.is_ok());
    }
}
