// src/routes.rs
use std::sync::Arc;
use uuid::Uuid;
use warp::reject::Rejection;
use crate::handlers::{companies, dashboard, preferences, symbols};
use crate::models::{PreferencesUpdate, SymbolRequest, ValuationRecord};
use crate::services::watchlist::AppState;
use log::{debug, info};

use std::convert::Infallible;
use warp::http::StatusCode;
use warp::{Filter, Reply};
use crate::handlers::error::ApiError;

const MAX_BODY_BYTES: u64 = 16 * 1024;

// Map rejections to JSON error bodies
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        code = StatusCode::BAD_REQUEST;
        message = format!("Invalid request body: {}", e);
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        code = StatusCode::PAYLOAD_TOO_LARGE;
        message = "Request body too large".to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        debug!("Unhandled rejection: {:?}", err);
        code = StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "message": message,
        })),
        code,
    ))
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    let list_route = warp::path!("api" / "companies")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(companies::list_companies);

    let export_route = warp::path!("api" / "companies" / "export")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(companies::export_companies);

    let get_route = warp::path!("api" / "companies" / Uuid)
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(companies::get_company);

    let metrics_route = warp::path!("api" / "companies" / Uuid / "metrics")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(companies::get_company_metrics);

    let add_symbol_route = warp::path!("api" / "companies" / "add-symbol")
        .and(warp::post())
        .and(json_body::<SymbolRequest>())
        .and(state_filter.clone())
        .and_then(companies::add_symbol);

    let refresh_all_route = warp::path!("api" / "companies" / "refresh-all")
        .and(warp::post())
        .and(state_filter.clone())
        .and_then(companies::refresh_all);

    let create_route = warp::path!("api" / "companies")
        .and(warp::post())
        .and(json_body::<ValuationRecord>())
        .and(state_filter.clone())
        .and_then(companies::create_company);

    let update_route = warp::path!("api" / "companies" / Uuid)
        .and(warp::put())
        .and(json_body::<ValuationRecord>())
        .and(state_filter.clone())
        .and_then(companies::update_company);

    let delete_route = warp::path!("api" / "companies" / Uuid)
        .and(warp::delete())
        .and(state_filter.clone())
        .and_then(companies::delete_company);

    let refresh_route = warp::path!("api" / "companies" / Uuid / "refresh")
        .and(warp::post())
        .and(state_filter.clone())
        .and_then(companies::refresh_company);

    let get_prefs_route = warp::path!("api" / "preferences")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(preferences::get_preferences);

    let put_prefs_route = warp::path!("api" / "preferences")
        .and(warp::put())
        .and(json_body::<PreferencesUpdate>())
        .and(state_filter.clone())
        .and_then(preferences::update_preferences);

    let validate_route = warp::path!("api" / "validate-symbol")
        .and(warp::post())
        .and(json_body::<SymbolRequest>())
        .and(state_filter.clone())
        .and_then(symbols::validate_symbol);

    let stats_route = warp::path!("api" / "dashboard" / "stats")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(dashboard::get_stats);

    let trends_route = warp::path!("api" / "dashboard" / "trends")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(dashboard::get_trends);

    let insights_route = warp::path!("api" / "dashboard" / "insights")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(dashboard::get_insights);

    info!("All routes configured successfully.");

    let company_routes = list_route
        .or(export_route)
        .or(get_route)
        .or(metrics_route)
        .or(add_symbol_route)
        .or(refresh_all_route)
        .or(create_route)
        .or(update_route)
        .or(delete_route)
        .or(refresh_route);

    let other_routes = get_prefs_route
        .or(put_prefs_route)
        .or(validate_route)
        .or(stats_route)
        .or(trends_route)
        .or(insights_route);

    company_routes
        .or(other_routes)
        .recover(handle_rejection)
}
