// src/services/fetcher.rs

//! Page fetching service.
//!
//! The [`PageFetcher`] trait is the boundary between the extraction core
//! and the rendered marketplace pages: the core only ever sees
//! column-aligned text fragments. [`HttpPageFetcher`] implements it with a
//! plain HTTP client and configured CSS selectors; a browser-automation
//! driver can slot in behind the same trait.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Condition, ProductPage, RawPage, RawRow, ScraperConfig, SelectorConfig};
use crate::parse::fields;

/// Supplies raw listing pages and sold-history rows for a product.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one listing page (1-based index) as raw rows plus a
    /// has-next-page signal.
    async fn fetch_page(&self, product: &ProductPage, page_index: u32) -> Result<RawPage>;

    /// Fetch the sold-history rows for a product. Callers treat failures
    /// as best-effort.
    async fn fetch_sold_history(&self, product: &ProductPage) -> Result<Vec<RawRow>>;
}

/// HTTP-backed fetcher using reqwest and configured CSS selectors.
pub struct HttpPageFetcher {
    client: Client,
    selectors: SelectorConfig,
    retry_attempts: u32,
    request_delay: Duration,
}

impl HttpPageFetcher {
    /// Create a fetcher from the scraper and selector configuration.
    pub fn new(
        scraper: &ScraperConfig,
        selectors: SelectorConfig,
        request_delay_ms: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&scraper.user_agent)
            .timeout(Duration::from_secs(scraper.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            selectors,
            retry_attempts: scraper.retry_attempts.max(1),
            request_delay: Duration::from_millis(request_delay_ms),
        })
    }

    /// Build the URL for a specific page of a product's listings.
    fn page_url(product: &ProductPage, page_index: u32) -> Result<Url> {
        let mut url = Url::parse(&product.url)?;
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "page")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (key, value) in &kept {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("page", &page_index.to_string());
        }

        Ok(url)
    }

    async fn get_text(&self, url: &Url, context: &str) -> Result<String> {
        let mut last_error: Option<AppError> = None;

        for attempt in 1..=self.retry_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.request_delay).await;
            }
            match self.try_get(url).await {
                Ok(text) => return Ok(text),
                Err(error) => {
                    log::warn!(
                        "Fetch attempt {}/{} failed for {}: {}",
                        attempt,
                        self.retry_attempts,
                        url,
                        error
                    );
                    last_error = Some(error);
                }
            }
        }

        Err(AppError::fetch(
            context,
            last_error.map_or_else(|| "unknown".to_string(), |e| e.to_string()),
        ))
    }

    async fn try_get(&self, url: &Url) -> Result<String> {
        let response = self.client.get(url.clone()).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }

    fn select_text(scope: &ElementRef, selector: &Selector) -> String {
        scope
            .select(selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default()
    }

    /// Extract column-aligned rows and the pagination signal from a
    /// rendered listing page.
    fn parse_listing_page(&self, html: &str) -> Result<RawPage> {
        let document = Html::parse_document(html);

        let row_sel = Self::parse_selector(&self.selectors.listing_row)?;
        let condition_sel = Self::parse_selector(&self.selectors.condition)?;
        let price_sel = Self::parse_selector(&self.selectors.price)?;
        let shipping_sel = Self::parse_selector(&self.selectors.shipping)?;
        let seller_sel = Self::parse_selector(&self.selectors.seller)?;
        let quantity_sel = Self::parse_selector(&self.selectors.quantity)?;
        let note_sel = Self::parse_selector(&self.selectors.note)?;
        let next_sel = Self::parse_selector(&self.selectors.next_page)?;

        let rows = document
            .select(&row_sel)
            .map(|row| {
                let note = Self::select_text(&row, &note_sel);
                RawRow {
                    condition: Self::select_text(&row, &condition_sel),
                    price: Self::select_text(&row, &price_sel),
                    shipping: Self::select_text(&row, &shipping_sel),
                    seller: Self::select_text(&row, &seller_sel),
                    quantity: Self::select_text(&row, &quantity_sel),
                    note: if note.is_empty() { None } else { Some(note) },
                }
            })
            .collect();

        Ok(RawPage {
            rows,
            has_next_page: document.select(&next_sel).next().is_some(),
        })
    }

    /// Extract sold-history rows from a rendered page.
    ///
    /// History tables do not label their cells, so each cell is classified
    /// by shape: money token means price, a known grade means condition, a
    /// date token goes to the note column, a bare integer is the quantity.
    fn parse_sold_rows(&self, html: &str) -> Result<Vec<RawRow>> {
        let document = Html::parse_document(html);
        let row_sel = Self::parse_selector(&self.selectors.sold_row)?;
        let cell_sel = Self::parse_selector("td")?;

        let mut rows = Vec::new();
        for element in document.select(&row_sel) {
            let mut row = RawRow::default();
            for cell in element.select(&cell_sel) {
                let text = cell.text().collect::<String>().trim().to_string();
                if text.is_empty() {
                    continue;
                }
                if text.contains('$') && row.price.is_empty() {
                    row.price = text;
                } else if Condition::parse(&text) != Condition::Unknown && row.condition.is_empty()
                {
                    row.condition = text;
                } else if fields::has_date_token(&text) && row.note.is_none() {
                    row.note = Some(text);
                } else if text.parse::<u32>().is_ok() && row.quantity.is_empty() {
                    row.quantity = text;
                }
            }
            if !row.price.is_empty() {
                rows.push(row);
            }
        }

        Ok(rows)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, product: &ProductPage, page_index: u32) -> Result<RawPage> {
        if page_index > 1 && !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        let url = Self::page_url(product, page_index)?;
        let context = format!("{} page {}", product.display_name(), page_index);
        let html = self.get_text(&url, &context).await?;
        self.parse_listing_page(&html)
    }

    async fn fetch_sold_history(&self, product: &ProductPage) -> Result<Vec<RawRow>> {
        let url = Url::parse(&product.url)?;
        let context = format!("{} sold history", product.display_name());
        let html = self.get_text(&url, &context).await?;
        self.parse_sold_rows(&html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> HttpPageFetcher {
        HttpPageFetcher::new(&ScraperConfig::default(), SelectorConfig::default(), 0).unwrap()
    }

    #[test]
    fn test_parse_selector_valid() {
        assert!(HttpPageFetcher::parse_selector("div.class").is_ok());
        assert!(HttpPageFetcher::parse_selector("tr:has(a)").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(HttpPageFetcher::parse_selector("[[invalid").is_err());
    }

    #[test]
    fn test_page_url_replaces_page_param() {
        let product = ProductPage {
            url: "https://example.com/product/1/card?page=4&Language=English".to_string(),
            name: None,
        };
        let url = HttpPageFetcher::page_url(&product, 2).unwrap();
        let query = url.query().unwrap();
        assert!(query.contains("page=2"));
        assert!(query.contains("Language=English"));
        assert!(!query.contains("page=4"));
    }

    #[test]
    fn test_parse_listing_page_extracts_fragments() {
        let fetcher = HttpPageFetcher::new(
            &ScraperConfig::default(),
            SelectorConfig {
                listing_row: ".row".to_string(),
                condition: ".cond".to_string(),
                price: ".price".to_string(),
                shipping: ".ship".to_string(),
                seller: ".seller".to_string(),
                quantity: ".qty".to_string(),
                note: ".note".to_string(),
                next_page: ".next".to_string(),
                sold_row: "table.sold tr".to_string(),
            },
            0,
        )
        .unwrap();

        let html = r#"
            <div class="row">
                <span class="cond">Near Mint</span>
                <span class="price">$12.50</span>
                <span class="ship">Free Shipping</span>
                <span class="seller">CardHaven</span>
                <span class="qty">3 available</span>
            </div>
            <a class="next" href="?page=2">Next</a>
        "#;

        let page = fetcher.parse_listing_page(html).unwrap();
        assert_eq!(page.rows.len(), 1);
        assert!(page.has_next_page);

        let row = &page.rows[0];
        assert_eq!(row.condition, "Near Mint");
        assert_eq!(row.price, "$12.50");
        assert_eq!(row.seller, "CardHaven");
        assert!(row.note.is_none());
    }

    #[test]
    fn test_parse_listing_page_no_next() {
        let fetcher = HttpPageFetcher::new(
            &ScraperConfig::default(),
            SelectorConfig {
                listing_row: ".row".to_string(),
                next_page: ".next".to_string(),
                ..SelectorConfig::default()
            },
            0,
        )
        .unwrap();

        let page = fetcher.parse_listing_page("<div class=\"row\"></div>").unwrap();
        assert!(!page.has_next_page);
    }

    #[test]
    fn test_parse_sold_rows_classifies_cells() {
        let fetcher = HttpPageFetcher::new(
            &ScraperConfig::default(),
            SelectorConfig {
                sold_row: "table.sold tr".to_string(),
                ..SelectorConfig::default()
            },
            0,
        )
        .unwrap();

        let html = r#"
            <table class="sold">
                <tr><td>8/20/2026</td><td>Near Mint</td><td>1</td><td>$45.00</td></tr>
                <tr><td>8/19/2026</td><td>Lightly Played</td><td>2</td><td>no price here</td></tr>
            </table>
        "#;

        let rows = fetcher.parse_sold_rows(html).unwrap();
        // The second row has no money token and is dropped.
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].price, "$45.00");
        assert_eq!(rows[0].condition, "Near Mint");
        assert_eq!(rows[0].note.as_deref(), Some("8/20/2026"));
        assert_eq!(rows[0].quantity, "1");
    }

    #[test]
    fn test_fetcher_builds_with_defaults() {
        // Default selectors must all be valid CSS.
        let f = fetcher();
        let defaults = SelectorConfig::default();
        for sel in [
            &defaults.listing_row,
            &defaults.condition,
            &defaults.price,
            &defaults.shipping,
            &defaults.seller,
            &defaults.quantity,
            &defaults.note,
            &defaults.next_page,
            &defaults.sold_row,
        ] {
            assert!(HttpPageFetcher::parse_selector(sel).is_ok(), "bad: {sel}");
        }
        drop(f);
    }
}
