// src/parse/fields.rs

//! Field-level extraction from free-text fragments.
//!
//! Every parser here is total over arbitrary input: malformed text yields a
//! documented default or an explicit `None`, never a panic. Price is the one
//! field with no default — an absent price means the caller must skip the
//! row rather than treat it as free.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;

/// Sentinel seller name for unparseable seller fragments.
pub const UNKNOWN_SELLER: &str = "Unknown Seller";

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9][0-9,]*(?:\.[0-9]+)?)").unwrap());

static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

static RELATIVE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+|an?)\s+(minute|hour|day|week|month|year)s?\s+ago\b").unwrap()
});

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());

static SLASH_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{2}|\d{4})\b").unwrap());

/// Extract a non-negative decimal price from text.
///
/// Currency symbols and thousands separators are stripped. Returns `None`
/// when no numeric substring is present; callers must treat that as "skip
/// this row", never as zero.
pub fn parse_price(text: &str) -> Option<f64> {
    let m = PRICE_RE.find(text)?;
    m.as_str().replace(',', "").parse::<f64>().ok()
}

/// Extract a shipping price, defaulting to 0.0 when absent.
///
/// "Free Shipping" and empty fragments both mean no shipping cost.
pub fn parse_shipping(text: &str) -> f64 {
    if text.to_lowercase().contains("free") {
        return 0.0;
    }
    parse_price(text).unwrap_or(0.0)
}

/// Extract a quantity: the first integer substring, default 1.
pub fn parse_quantity(text: &str) -> u32 {
    INTEGER_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(1)
}

/// Extract a trimmed seller name, falling back to [`UNKNOWN_SELLER`].
pub fn parse_seller(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        UNKNOWN_SELLER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Normalize a sold-date fragment to an absolute timestamp.
///
/// Relative forms ("3 days ago", "an hour ago") are resolved against the
/// supplied `now`. ISO dates and M/D/YYYY forms are taken as midnight UTC.
/// Unparseable input yields `None` — "sold date unknown" must never default
/// to the current time, or stale sales would look fresh.
pub fn parse_sold_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Some(caps) = RELATIVE_DATE_RE.captures(text) {
        let amount: i64 = match &caps[1] {
            a if a.eq_ignore_ascii_case("a") || a.eq_ignore_ascii_case("an") => 1,
            digits => digits.parse().ok()?,
        };
        let duration = match caps[2].to_lowercase().as_str() {
            "minute" => Duration::minutes(amount),
            "hour" => Duration::hours(amount),
            "day" => Duration::days(amount),
            "week" => Duration::weeks(amount),
            "month" => Duration::days(30 * amount),
            "year" => Duration::days(365 * amount),
            _ => return None,
        };
        return Some(now - duration);
    }

    if let Some(caps) = ISO_DATE_RE.captures(text) {
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )?;
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    if let Some(caps) = SLASH_DATE_RE.captures(text) {
        let year: i32 = {
            let raw: i32 = caps[3].parse().ok()?;
            if caps[3].len() == 2 { 2000 + raw } else { raw }
        };
        let date = NaiveDate::from_ymd_opt(year, caps[1].parse().ok()?, caps[2].parse().ok()?)?;
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    None
}

/// Whether the text contains any recognizable date token (relative, ISO or
/// slash form). Used to classify unlabeled table cells.
pub fn has_date_token(text: &str) -> bool {
    RELATIVE_DATE_RE.is_match(text) || ISO_DATE_RE.is_match(text) || SLASH_DATE_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_price_dollar() {
        assert_eq!(parse_price("$12.50"), Some(12.50));
    }

    #[test]
    fn test_parse_price_thousands_separator() {
        assert_eq!(parse_price("12,500.00"), Some(12500.00));
        assert_eq!(parse_price("$1,234.56"), Some(1234.56));
    }

    #[test]
    fn test_parse_price_euro_with_space() {
        assert_eq!(parse_price("€ 3.00"), Some(3.00));
    }

    #[test]
    fn test_parse_price_bare_integer() {
        assert_eq!(parse_price("$123"), Some(123.0));
    }

    #[test]
    fn test_parse_price_non_numeric_is_absent() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("Sold Out"), None);
        assert_eq!(parse_price("$"), None);
    }

    #[test]
    fn test_parse_shipping_free_and_absent() {
        assert_eq!(parse_shipping("Free Shipping"), 0.0);
        assert_eq!(parse_shipping(""), 0.0);
        assert_eq!(parse_shipping("+ $1.27 Shipping"), 1.27);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("5 available"), 5);
        assert_eq!(parse_quantity("of 12"), 12);
        assert_eq!(parse_quantity(""), 1);
        assert_eq!(parse_quantity("available"), 1);
    }

    #[test]
    fn test_parse_seller() {
        assert_eq!(parse_seller("  CardKingdom  "), "CardKingdom");
        assert_eq!(parse_seller("   "), UNKNOWN_SELLER);
        assert_eq!(parse_seller(""), UNKNOWN_SELLER);
    }

    #[test]
    fn test_parse_sold_date_relative_days() {
        let parsed = parse_sold_date("3 days ago", fixed_now()).unwrap();
        assert_eq!(parsed, fixed_now() - Duration::days(3));
    }

    #[test]
    fn test_parse_sold_date_relative_articles() {
        let parsed = parse_sold_date("an hour ago", fixed_now()).unwrap();
        assert_eq!(parsed, fixed_now() - Duration::hours(1));

        let parsed = parse_sold_date("a week ago", fixed_now()).unwrap();
        assert_eq!(parsed, fixed_now() - Duration::weeks(1));
    }

    #[test]
    fn test_parse_sold_date_iso() {
        let parsed = parse_sold_date("Sold 2026-08-20", fixed_now()).unwrap();
        assert_eq!(
            parsed,
            Utc.with_ymd_and_hms(2026, 8, 20, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_sold_date_slash_forms() {
        let parsed = parse_sold_date("8/20/2026", fixed_now()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 8, 20, 0, 0, 0).unwrap());

        let parsed = parse_sold_date("8/20/26", fixed_now()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 8, 20, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_sold_date_unknown_is_none() {
        assert_eq!(parse_sold_date("Recent", fixed_now()), None);
        assert_eq!(parse_sold_date("", fixed_now()), None);
    }

    #[test]
    fn test_has_date_token() {
        assert!(has_date_token("3 days ago"));
        assert!(has_date_token("2026-08-20"));
        assert!(has_date_token("8/20/26"));
        assert!(!has_date_token("Near Mint"));
        assert!(!has_date_token("$12.50"));
    }
}
