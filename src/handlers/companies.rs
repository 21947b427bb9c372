// src/handlers/companies.rs
use log::{error, info};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use warp::reply::Json;
use warp::Rejection;

use crate::models::{SymbolRequest, ValuationRecord};
use crate::services::calculations::company_metrics;
use crate::services::export::watchlist_csv;
use crate::services::watchlist::{self, AppState};
use super::error::{reject, ApiError};

pub async fn list_companies(state: Arc<AppState>) -> Result<Json, Rejection> {
    let companies = state.store.list().await;
    info!("Returning {} companies", companies.len());
    Ok(warp::reply::json(&companies))
}

pub async fn get_company(id: Uuid, state: Arc<AppState>) -> Result<Json, Rejection> {
    match state.store.get(id).await {
        Some(company) => Ok(warp::reply::json(&company)),
        None => Err(reject(ApiError::not_found("Company not found"))),
    }
}

pub async fn get_company_metrics(id: Uuid, state: Arc<AppState>) -> Result<Json, Rejection> {
    let company = state
        .store
        .get(id)
        .await
        .ok_or_else(|| reject(ApiError::not_found("Company not found")))?;
    Ok(warp::reply::json(&company_metrics(&company.record)))
}

pub async fn add_symbol(request: SymbolRequest, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request to add symbol {}", request.symbol);
    let company = watchlist::add_symbol(&state, &request.symbol).await.map_err(|e| {
        error!("Error adding company {}: {}", request.symbol, e);
        reject(e)
    })?;
    Ok(warp::reply::json(&company))
}

pub async fn create_company(record: ValuationRecord, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request to create company {}", record.symbol);
    let company = watchlist::create_manual(&state, record).await.map_err(|e| {
        error!("Error creating company: {}", e);
        reject(e)
    })?;
    Ok(warp::reply::json(&company))
}

pub async fn update_company(id: Uuid, record: ValuationRecord, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request to update company {}", id);
    let company = watchlist::update_manual(&state, id, record).await.map_err(|e| {
        error!("Error updating company {}: {}", id, e);
        reject(e)
    })?;
    Ok(warp::reply::json(&company))
}

pub async fn delete_company(id: Uuid, state: Arc<AppState>) -> Result<Json, Rejection> {
    if !state.store.remove(id).await {
        return Err(reject(ApiError::not_found("Company not found")));
    }
    Ok(warp::reply::json(&json!({
        "message": "Company deleted successfully"
    })))
}

pub async fn refresh_company(id: Uuid, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request to refresh company {}", id);
    let company = watchlist::refresh_company(&state, id).await.map_err(|e| {
        error!("Error refreshing company {}: {}", id, e);
        reject(e)
    })?;
    Ok(warp::reply::json(&company))
}

pub async fn refresh_all(state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request to refresh all companies");
    let companies = watchlist::refresh_all(&state).await;
    Ok(warp::reply::json(&companies))
}

pub async fn export_companies(state: Arc<AppState>) -> Result<impl warp::Reply, Rejection> {
    let companies = state.store.list().await;
    let csv = watchlist_csv(&companies).map_err(|e| {
        error!("Failed to export watchlist: {}", e);
        reject(ApiError::internal("Failed to export watchlist"))
    })?;
    Ok(warp::reply::with_header(csv, "content-type", "text/csv; charset=utf-8"))
}
