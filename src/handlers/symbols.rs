// src/handlers/symbols.rs
use log::info;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::models::SymbolRequest;
use crate::services::watchlist::{validate_symbol as validate, AppState};

pub async fn validate_symbol(request: SymbolRequest, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Validating symbol {}", request.symbol);
    let result = validate(&state, &request.symbol).await;
    Ok(warp::reply::json(&result))
}
