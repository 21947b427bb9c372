use peg_watchlist::config::AppConfig;
use peg_watchlist::services::valuation::ValuationEngine;
use peg_watchlist::services::yahoo::{QuoteSource, YahooClient};
use log::{info, error};
use dotenv::dotenv;
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let symbol = env::args().nth(1).unwrap_or_else(|| "AAPL".to_string());
    let config = AppConfig::from_env()?;

    info!("Testing Yahoo Finance quote fetching for {}...", symbol);
    let client = YahooClient::new(config.yahoo_base_url, config.fetch_timeout)?;

    let quote = match client.fetch_quote(&symbol).await {
        Ok(quote) => {
            info!("SUCCESS: {} price: {}", quote.symbol, quote.price);
            quote
        }
        Err(e) => {
            error!("ERROR: Failed to fetch Yahoo Finance quote: {}", e);
            return Err(e.into());
        }
    };

    let record = ValuationEngine::with_trailing_pe(config.assumed_pe).derive(&quote)?;
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}
