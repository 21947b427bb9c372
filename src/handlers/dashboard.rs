// src/handlers/dashboard.rs
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::services::calculations::{market_trends, portfolio_insights, portfolio_stats};
use crate::services::watchlist::AppState;

pub async fn get_stats(state: Arc<AppState>) -> Result<Json, Rejection> {
    let companies = state.store.list().await;
    Ok(warp::reply::json(&portfolio_stats(&companies)))
}

pub async fn get_trends(state: Arc<AppState>) -> Result<Json, Rejection> {
    let companies = state.store.list().await;
    Ok(warp::reply::json(&market_trends(&companies)))
}

pub async fn get_insights(state: Arc<AppState>) -> Result<Json, Rejection> {
    let companies = state.store.list().await;
    Ok(warp::reply::json(&portfolio_insights(&companies)))
}
