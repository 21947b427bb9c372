// src/models.rs
use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A price quote as handed to the valuation engine.
///
/// `synthetic` marks placeholder quotes produced when the market-data
/// source could not be reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuote {
    pub symbol: String,
    pub company_name: Option<String>,
    pub price: f64,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub volume: Option<u64>,
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub synthetic: bool,
}

impl RawQuote {
    pub fn new(symbol: impl Into<String>, price: f64) -> Self {
        RawQuote {
            symbol: symbol.into(),
            company_name: None,
            price,
            change: None,
            change_percent: None,
            volume: None,
            market_cap: None,
            synthetic: false,
        }
    }
}

/// Full valuation snapshot for one symbol.
///
/// Every ratio is optional: `None` means the value is undefined (a zero or
/// near-zero divisor), which is distinct from a computed zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationRecord {
    pub symbol: String,
    pub company_name: String,
    pub price: f64,
    pub pe: f64,
    pub py_eps: f64,

    // Current Year Fields
    pub cy_eps_low: Option<f64>,
    pub cy_eps_avg: Option<f64>,
    pub cy_eps_high: Option<f64>,
    pub cy_eps_change_percent_low: Option<f64>,
    pub cy_eps_change_percent_avg: Option<f64>,
    pub cy_eps_change_percent_high: Option<f64>,
    pub cy_pe_low: Option<f64>,
    pub cy_pe_avg: Option<f64>,
    pub cy_pe_high: Option<f64>,
    pub cy_peg_low: Option<f64>,
    pub cy_peg_avg: Option<f64>,
    pub cy_peg_high: Option<f64>,

    // Next Year Fields
    pub ny_eps_low: Option<f64>,
    pub ny_eps_avg: Option<f64>,
    pub ny_eps_high: Option<f64>,
    pub ny_eps_change_percent_low: Option<f64>,
    pub ny_eps_change_percent_avg: Option<f64>,
    pub ny_eps_change_percent_high: Option<f64>,
    pub ny_pe_low: Option<f64>,
    pub ny_pe_avg: Option<f64>,
    pub ny_pe_high: Option<f64>,
    pub ny_peg_low: Option<f64>,
    pub ny_peg_avg: Option<f64>,
    pub ny_peg_high: Option<f64>,
}

/// A stored watchlist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    #[serde(flatten)]
    pub record: ValuationRecord,
    pub synthetic: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub show_low_high: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub show_low_high: bool,
}

#[derive(Debug, Deserialize)]
pub struct SymbolRequest {
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
