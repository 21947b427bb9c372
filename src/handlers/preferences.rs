// src/handlers/preferences.rs
use log::info;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::models::PreferencesUpdate;
use crate::services::watchlist::AppState;

pub async fn get_preferences(state: Arc<AppState>) -> Result<Json, Rejection> {
    Ok(warp::reply::json(&state.store.preferences().await))
}

pub async fn update_preferences(update: PreferencesUpdate, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Updating preferences: show_low_high={}", update.show_low_high);
    let prefs = state.store.update_preferences(update.show_low_high).await;
    Ok(warp::reply::json(&prefs))
}
