use anyhow::Result;
use dotenv::dotenv;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use peg_watchlist::config::AppConfig;
use peg_watchlist::routes;
use peg_watchlist::services::scheduler::start_refresh_job;
use peg_watchlist::services::store::CompanyStore;
use peg_watchlist::services::valuation::ValuationEngine;
use peg_watchlist::services::watchlist::AppState;
use peg_watchlist::services::yahoo::YahooClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    // Initialize the logger
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let config = AppConfig::from_env()?;
    info!("Using PORT: {}", config.port);

    let quotes = YahooClient::new(config.yahoo_base_url.clone(), config.fetch_timeout)?;
    let state = Arc::new(AppState::new(
        Arc::new(CompanyStore::new()),
        Arc::new(quotes),
        ValuationEngine::with_trailing_pe(config.assumed_pe),
    ));

    // Keep the scheduler alive for the lifetime of the server
    let _scheduler = match &config.refresh_schedule {
        Some(schedule) => Some(start_refresh_job(state.clone(), schedule).await?),
        None => None,
    };

    // Bind to 0.0.0.0 so the server is reachable from containers
    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Will bind to: {}", addr);

    // Set up CORS
    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE"]);

    // Set up routes
    let api = routes::routes(state)
        .with(cors)
        .with(warp::log("peg_watchlist::http"));
    info!("Routes configured successfully with CORS.");

    // Start the server
    info!("Starting server on {}", addr);
    warp::serve(api)
        .run(addr)
        .await;

    Ok(())
}
