// src/services/yahoo.rs
use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::RawQuote;

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Quote service returned status {status} for {symbol}")]
    Status { symbol: String, status: u16 },

    #[error("No data found for symbol {0}")]
    NoData(String),

    #[error("Invalid data structure for {symbol}: {reason}")]
    Malformed { symbol: String, reason: String },
}

/// Source of live price quotes.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, QuoteError>;
}

pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, QuoteError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .timeout(timeout)
            .build()?;
        Ok(YahooClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, symbol)
    }
}

#[async_trait]
impl QuoteSource for YahooClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, QuoteError> {
        let url = self.chart_url(symbol);
        info!("Fetching quote for {} from {}", symbol, url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(QuoteError::Status {
                symbol: symbol.to_string(),
                status: response.status().as_u16(),
            });
        }
        let body = response.text().await?;
        let quote = parse_chart_response(symbol, &body)?;
        info!("Found price for {}: {}", quote.symbol, quote.price);
        Ok(quote)
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
    shares_outstanding: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteIndicator {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse a Yahoo chart API payload into a quote.
pub fn parse_chart_response(symbol: &str, body: &str) -> Result<RawQuote, QuoteError> {
    let malformed = |reason: String| QuoteError::Malformed {
        symbol: symbol.to_string(),
        reason,
    };

    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| QuoteError::NoData(symbol.to_string()))?;

    let meta = result.meta;
    let indicator = result.indicators.quote.into_iter().next().unwrap_or_default();

    // Latest non-null close, remembering its index for volume and prior close
    let latest = indicator
        .close
        .iter()
        .enumerate()
        .rev()
        .find_map(|(idx, close)| close.map(|c| (idx, c)));

    let (price, latest_idx) = match (latest, meta.regular_market_price) {
        (Some((idx, close)), _) => (close, Some(idx)),
        (None, Some(price)) => (price, None),
        (None, None) => return Err(malformed("no closing prices".to_string())),
    };
    // Checked after rounding so a sub-cent close never reaches the engine as zero
    let rounded_price = round2(price);
    if !rounded_price.is_finite() || rounded_price <= 0.0 {
        return Err(malformed(format!("non-positive price {}", price)));
    }

    let prior_close = latest_idx
        .and_then(|idx| idx.checked_sub(1))
        .and_then(|idx| indicator.close.get(idx).copied().flatten());
    let previous_close = meta
        .previous_close
        .or(meta.chart_previous_close)
        .or(prior_close)
        .filter(|p| *p > 0.0);

    let change = previous_close.map(|prev| price - prev);
    let change_percent = match (change, previous_close) {
        (Some(change), Some(prev)) => Some(round2(change / prev * 100.0)),
        _ => None,
    };

    let volume = latest_idx.and_then(|idx| indicator.volume.get(idx).copied().flatten());
    let market_cap = meta
        .shares_outstanding
        .filter(|shares| *shares > 0.0)
        .map(|shares| (shares * price).round());

    // Keep the requested ticker so stored companies are never renamed by the feed
    let symbol = symbol.trim().to_uppercase();
    let company_name = meta.long_name.or(meta.short_name);

    Ok(RawQuote {
        symbol,
        company_name,
        price: rounded_price,
        change: change.map(round2),
        change_percent,
        volume,
        market_cap,
        synthetic: false,
    })
}

/// Placeholder quote used when no live quote is available.
///
/// The price is derived from the symbol so repeated placeholders for the same
/// ticker are stable.
pub fn synthetic_quote(symbol: &str) -> RawQuote {
    let symbol = symbol.trim().to_uppercase();
    let seed = symbol
        .bytes()
        .fold(2166136261u32, |hash, byte| (hash ^ byte as u32).wrapping_mul(16777619));
    let cents = 5_000 + seed % 20_000;

    RawQuote {
        company_name: Some(format!("{} Corp", symbol)),
        symbol,
        price: cents as f64 / 100.0,
        change: None,
        change_percent: None,
        volume: None,
        market_cap: None,
        synthetic: true,
    }
}

/// Fetch a live quote, substituting a synthetic placeholder on failure.
pub async fn quote_or_placeholder(source: &dyn QuoteSource, symbol: &str) -> RawQuote {
    match source.fetch_quote(symbol).await {
        Ok(quote) => quote,
        Err(e) => {
            warn!("Falling back to synthetic quote for {}: {}", symbol, e);
            synthetic_quote(symbol)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "symbol": "AAPL",
                    "longName": "Apple Inc.",
                    "regularMarketPrice": 190.0,
                    "chartPreviousClose": 185.0,
                    "sharesOutstanding": 1000
                },
                "indicators": {
                    "quote": [{
                        "close": [184.5, 188.123, null],
                        "volume": [100, 250, null]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_latest_close_and_derived_fields() {
        let quote = parse_chart_response("aapl", SAMPLE).unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.company_name.as_deref(), Some("Apple Inc."));
        assert_eq!(quote.price, 188.12);
        assert_eq!(quote.volume, Some(250));
        assert_eq!(quote.change, Some(3.12));
        assert_eq!(quote.market_cap, Some(188123.0));
        assert!(!quote.synthetic);
    }

    #[test]
    fn sub_cent_close_is_malformed() {
        let body = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{"close":[0.004]}]}}]}}"#;
        assert!(matches!(
            parse_chart_response("PNY", body),
            Err(QuoteError::Malformed { .. })
        ));
    }

    #[test]
    fn keeps_requested_symbol_over_feed_symbol() {
        let body = r#"{"chart":{"result":[{"meta":{"symbol":"BRK-B","regularMarketPrice":410.0}}]}}"#;
        let quote = parse_chart_response(" brk.b ", body).unwrap();
        assert_eq!(quote.symbol, "BRK.B");
    }

    #[tokio::test]
    async fn sub_cent_quote_falls_back_to_placeholder() {
        struct SubCent;

        #[async_trait]
        impl QuoteSource for SubCent {
            async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, QuoteError> {
                let body = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{"close":[0.004]}]}}]}}"#;
                parse_chart_response(symbol, body)
            }
        }

        let quote = quote_or_placeholder(&SubCent, "PNY").await;
        assert!(quote.synthetic);
        assert!(quote.price > 0.0);
    }

    #[test]
    fn falls_back_to_regular_market_price() {
        let body = r#"{"chart":{"result":[{"meta":{"regularMarketPrice":42.5},"indicators":{"quote":[{"close":[null]}]}}]}}"#;
        let quote = parse_chart_response("xyz", body).unwrap();
        assert_eq!(quote.symbol, "XYZ");
        assert_eq!(quote.price, 42.5);
        assert_eq!(quote.company_name, None);
        assert_eq!(quote.change, None);
        assert_eq!(quote.volume, None);
    }

    #[test]
    fn empty_result_is_no_data() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found"}}}"#;
        assert!(matches!(
            parse_chart_response("NOPE", body),
            Err(QuoteError::NoData(_))
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            parse_chart_response("X", "<html>"),
            Err(QuoteError::Malformed { .. })
        ));
        let body = r#"{"chart":{"result":[{"meta":{}}]}}"#;
        assert!(matches!(
            parse_chart_response("X", body),
            Err(QuoteError::Malformed { .. })
        ));
    }

    #[test]
    fn synthetic_quotes_are_marked_and_stable() {
        let a = synthetic_quote("tsla");
        let b = synthetic_quote("TSLA");
        assert_eq!(a, b);
        assert!(a.synthetic);
        assert_eq!(a.company_name.as_deref(), Some("TSLA Corp"));
        assert!(a.price >= 50.0 && a.price < 250.0);
    }

    struct Failing;

    #[async_trait]
    impl QuoteSource for Failing {
        async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, QuoteError> {
            Err(QuoteError::NoData(symbol.to_string()))
        }
    }

    #[tokio::test]
    async fn placeholder_used_when_source_fails() {
        let quote = quote_or_placeholder(&Failing, "nvda").await;
        assert!(quote.synthetic);
        assert_eq!(quote.symbol, "NVDA");
    }
}
