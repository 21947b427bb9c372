// src/services/watchlist.rs
use futures::future::join_all;
use log::{error, info, warn};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Company, SymbolValidation, ValuationRecord};
use super::store::{CompanyStore, StoreError};
use super::valuation::{ValuationEngine, ValuationError};
use super::yahoo::{quote_or_placeholder, QuoteError, QuoteSource};

const MAX_SYMBOL_LEN: usize = 10;

#[derive(Error, Debug)]
pub enum WatchlistError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Company not found")]
    NotFound,

    #[error("Company with symbol {0} already exists")]
    Duplicate(String),

    #[error("Failed to fetch quote: {0}")]
    Quote(#[from] QuoteError),

    #[error("{0}")]
    Valuation(#[from] ValuationError),
}

impl From<StoreError> for WatchlistError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateSymbol(symbol) => WatchlistError::Duplicate(symbol),
            StoreError::NotFound(_) => WatchlistError::NotFound,
        }
    }
}

/// Shared state handed to every request handler.
pub struct AppState {
    pub store: Arc<CompanyStore>,
    pub quotes: Arc<dyn QuoteSource>,
    pub engine: ValuationEngine,
}

impl AppState {
    pub fn new(store: Arc<CompanyStore>, quotes: Arc<dyn QuoteSource>, engine: ValuationEngine) -> Self {
        AppState { store, quotes, engine }
    }
}

fn symbol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9.\-^=]+$").expect("symbol pattern is valid"))
}

/// Trim, check and upper-case a ticker symbol.
pub fn normalize_symbol(raw: &str) -> Result<String, WatchlistError> {
    let symbol = raw.trim();
    if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LEN {
        return Err(WatchlistError::InvalidSymbol(format!(
            "symbol must be 1-{} characters",
            MAX_SYMBOL_LEN
        )));
    }
    if !symbol_pattern().is_match(symbol) {
        return Err(WatchlistError::InvalidSymbol(format!(
            "'{}' contains unsupported characters",
            symbol
        )));
    }
    Ok(symbol.to_uppercase())
}

fn check_manual_record(mut record: ValuationRecord) -> Result<ValuationRecord, WatchlistError> {
    record.symbol = normalize_symbol(&record.symbol)?;
    if !record.price.is_finite() || record.price <= 0.0 {
        return Err(ValuationError::InvalidInput(format!(
            "price for {} must be positive, got {}",
            record.symbol, record.price
        ))
        .into());
    }
    if record.company_name.trim().is_empty() {
        record.company_name = record.symbol.clone();
    }
    Ok(record)
}

/// Add a symbol to the watchlist, using a synthetic quote if the live fetch fails.
pub async fn add_symbol(state: &AppState, raw_symbol: &str) -> Result<Company, WatchlistError> {
    let symbol = normalize_symbol(raw_symbol)?;
    if state.store.find_by_symbol(&symbol).await.is_some() {
        return Err(WatchlistError::Duplicate(symbol));
    }

    let quote = quote_or_placeholder(state.quotes.as_ref(), &symbol).await;
    let record = state.engine.derive(&quote)?;
    let company = state.store.insert(record, quote.synthetic).await?;
    info!("Added {} to watchlist (synthetic: {})", company.record.symbol, company.synthetic);
    Ok(company)
}

/// Recompute one company from a live quote. On any failure the stored record is left as it was.
pub async fn refresh_company(state: &AppState, id: Uuid) -> Result<Company, WatchlistError> {
    let existing = state.store.get(id).await.ok_or(WatchlistError::NotFound)?;
    let quote = state.quotes.fetch_quote(&existing.record.symbol).await?;
    let record = state.engine.derive(&quote)?;
    let company = state.store.replace(id, record, false).await?;
    info!("Refreshed {} at price {}", company.record.symbol, company.record.price);
    Ok(company)
}

/// Refresh every company concurrently, keeping the prior record for any that fail.
pub async fn refresh_all(state: &AppState) -> Vec<Company> {
    let companies = state.store.list().await;
    info!("Refreshing {} companies", companies.len());

    let refreshes = companies.into_iter().map(|company| async move {
        match refresh_company(state, company.id).await {
            Ok(updated) => updated,
            Err(e) => {
                warn!("Failed to refresh {}: {}", company.record.symbol, e);
                company
            }
        }
    });
    let refreshed = join_all(refreshes).await;

    // Drop anything deleted while the refresh was in flight
    let mut current = Vec::with_capacity(refreshed.len());
    for company in refreshed {
        if state.store.get(company.id).await.is_some() {
            current.push(company);
        }
    }
    current
}

/// Check a symbol against the live quote source only.
pub async fn validate_symbol(state: &AppState, raw_symbol: &str) -> SymbolValidation {
    let symbol = match normalize_symbol(raw_symbol) {
        Ok(symbol) => symbol,
        Err(e) => return invalid(e.to_string()),
    };

    match state.quotes.fetch_quote(&symbol).await {
        Ok(quote) if quote.price > 0.0 => SymbolValidation {
            valid: true,
            company_name: Some(quote.company_name.unwrap_or_else(|| quote.symbol.clone())),
            symbol: Some(quote.symbol),
            price: Some(quote.price),
            message: None,
        },
        Ok(_) => invalid("Invalid symbol or data unavailable".to_string()),
        Err(e) => {
            error!("Validation fetch failed for {}: {}", symbol, e);
            invalid("Invalid symbol or data unavailable".to_string())
        }
    }
}

fn invalid(message: String) -> SymbolValidation {
    SymbolValidation {
        valid: false,
        symbol: None,
        company_name: None,
        price: None,
        message: Some(message),
    }
}

/// Store a caller-supplied record as-is.
pub async fn create_manual(state: &AppState, record: ValuationRecord) -> Result<Company, WatchlistError> {
    let record = check_manual_record(record)?;
    Ok(state.store.insert(record, false).await?)
}

/// Replace a stored record with a caller-supplied one.
pub async fn update_manual(state: &AppState, id: Uuid, record: ValuationRecord) -> Result<Company, WatchlistError> {
    let record = check_manual_record(record)?;
    Ok(state.store.replace(id, record, false).await?)
}
