use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use warp::http::StatusCode;

use peg_watchlist::models::RawQuote;
use peg_watchlist::routes::routes;
use peg_watchlist::services::store::CompanyStore;
use peg_watchlist::services::valuation::ValuationEngine;
use peg_watchlist::services::watchlist::AppState;
use peg_watchlist::services::yahoo::{QuoteError, QuoteSource};

#[derive(Default)]
struct StubQuotes {
    prices: Mutex<HashMap<String, f64>>,
}

impl StubQuotes {
    fn set(&self, symbol: &str, price: f64) {
        self.prices.lock().unwrap().insert(symbol.to_string(), price);
    }

    fn remove(&self, symbol: &str) {
        self.prices.lock().unwrap().remove(symbol);
    }
}

#[async_trait]
impl QuoteSource for StubQuotes {
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, QuoteError> {
        let price = self.prices.lock().unwrap().get(symbol).copied();
        price
            .map(|p| RawQuote::new(symbol, p))
            .ok_or_else(|| QuoteError::NoData(symbol.to_string()))
    }
}

fn setup() -> (Arc<StubQuotes>, Arc<AppState>) {
    let quotes = Arc::new(StubQuotes::default());
    let state = Arc::new(AppState::new(
        Arc::new(CompanyStore::new()),
        quotes.clone(),
        ValuationEngine::default(),
    ));
    (quotes, state)
}

fn body_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("response should be JSON")
}

async fn add(state: &Arc<AppState>, symbol: &str) -> Value {
    let res = warp::test::request()
        .method("POST")
        .path("/api/companies/add-symbol")
        .json(&json!({ "symbol": symbol }))
        .reply(&routes(state.clone()))
        .await;
    assert_eq!(res.status(), StatusCode::OK, "{:?}", res.body());
    body_json(res.body())
}

#[tokio::test]
async fn add_symbol_returns_derived_record() {
    let (quotes, state) = setup();
    quotes.set("ACME", 100.0);

    let company = add(&state, "acme").await;
    assert_eq!(company["symbol"], "ACME");
    assert_eq!(company["pe"], 20.0);
    assert_eq!(company["synthetic"], false);
    let cy_peg = company["cyPegAvg"].as_f64().unwrap();
    assert!((cy_peg - 1.142857).abs() < 1e-5);
    assert!(company["id"].is_string());
}

#[tokio::test]
async fn duplicate_and_invalid_symbols_are_bad_requests() {
    let (quotes, state) = setup();
    quotes.set("ACME", 100.0);
    add(&state, "ACME").await;

    let filter = routes(state.clone());
    let dup = warp::test::request()
        .method("POST")
        .path("/api/companies/add-symbol")
        .json(&json!({ "symbol": "acme" }))
        .reply(&filter)
        .await;
    assert_eq!(dup.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(dup.body())["message"]
        .as_str()
        .unwrap()
        .contains("already exists"));

    let bad = warp::test::request()
        .method("POST")
        .path("/api/companies/add-symbol")
        .json(&json!({ "symbol": "WAY/TOO/LONG" }))
        .reply(&filter)
        .await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let malformed = warp::test::request()
        .method("POST")
        .path("/api/companies/add-symbol")
        .header("content-type", "application/json")
        .body("{not json")
        .reply(&filter)
        .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreachable_quotes_produce_marked_placeholder() {
    let (_quotes, state) = setup();
    let company = add(&state, "ghost").await;
    assert_eq!(company["synthetic"], true);
    assert_eq!(company["companyName"], "GHOST Corp");
}

#[tokio::test]
async fn get_delete_and_missing_company() {
    let (quotes, state) = setup();
    quotes.set("ACME", 100.0);
    let company = add(&state, "ACME").await;
    let id = company["id"].as_str().unwrap().to_string();
    let filter = routes(state.clone());

    let res = warp::test::request()
        .path(&format!("/api/companies/{}", id))
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res.body())["symbol"], "ACME");

    let res = warp::test::request()
        .method("DELETE")
        .path(&format!("/api/companies/{}", id))
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = warp::test::request()
        .path(&format!("/api/companies/{}", id))
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = warp::test::request()
        .path("/api/companies/not-a-uuid")
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn refresh_updates_or_keeps_prior_record() {
    let (quotes, state) = setup();
    quotes.set("ACME", 100.0);
    let company = add(&state, "ACME").await;
    let id = company["id"].as_str().unwrap().to_string();
    let filter = routes(state.clone());

    quotes.set("ACME", 110.0);
    let res = warp::test::request()
        .method("POST")
        .path(&format!("/api/companies/{}/refresh", id))
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res.body())["price"], 110.0);

    quotes.remove("ACME");
    let res = warp::test::request()
        .method("POST")
        .path(&format!("/api/companies/{}/refresh", id))
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    let res = warp::test::request().path("/api/companies").reply(&filter).await;
    let list = body_json(res.body());
    assert_eq!(list[0]["price"], 110.0);
}

#[tokio::test]
async fn refresh_all_is_best_effort() {
    let (quotes, state) = setup();
    quotes.set("AAA", 10.0);
    quotes.set("BBB", 20.0);
    add(&state, "AAA").await;
    add(&state, "BBB").await;

    quotes.set("AAA", 12.0);
    quotes.remove("BBB");
    let res = warp::test::request()
        .method("POST")
        .path("/api/companies/refresh-all")
        .reply(&routes(state.clone()))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let list = body_json(res.body());
    let prices: HashMap<String, f64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|c| (c["symbol"].as_str().unwrap().to_string(), c["price"].as_f64().unwrap()))
        .collect();
    assert_eq!(prices["AAA"], 12.0);
    assert_eq!(prices["BBB"], 20.0);
}

#[tokio::test]
async fn manual_create_and_replace() {
    let (quotes, state) = setup();
    quotes.set("ACME", 100.0);
    let mut company = add(&state, "ACME").await;
    let id = company["id"].as_str().unwrap().to_string();
    let filter = routes(state.clone());

    company["price"] = json!(150.0);
    company["cyPegAvg"] = Value::Null;
    let res = warp::test::request()
        .method("PUT")
        .path(&format!("/api/companies/{}", id))
        .json(&company)
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = body_json(res.body());
    assert_eq!(updated["price"], 150.0);
    assert!(updated["cyPegAvg"].is_null());

    company["symbol"] = json!("NEWCO");
    company["price"] = json!(0.0);
    let res = warp::test::request()
        .method("POST")
        .path("/api/companies")
        .json(&company)
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    company["price"] = json!(42.0);
    let res = warp::test::request()
        .method("POST")
        .path("/api/companies")
        .json(&company)
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res.body())["symbol"], "NEWCO");
}

#[tokio::test]
async fn validate_symbol_reports_live_availability() {
    let (quotes, state) = setup();
    quotes.set("ACME", 100.0);
    let filter = routes(state.clone());

    let res = warp::test::request()
        .method("POST")
        .path("/api/validate-symbol")
        .json(&json!({ "symbol": "acme" }))
        .reply(&filter)
        .await;
    let body = body_json(res.body());
    assert_eq!(body["valid"], true);
    assert_eq!(body["price"], 100.0);

    let res = warp::test::request()
        .method("POST")
        .path("/api/validate-symbol")
        .json(&json!({ "symbol": "NOPE" }))
        .reply(&filter)
        .await;
    let body = body_json(res.body());
    assert_eq!(body["valid"], false);
    assert!(body.get("price").is_none());
}

#[tokio::test]
async fn preferences_can_be_toggled() {
    let (_quotes, state) = setup();
    let filter = routes(state.clone());

    let res = warp::test::request().path("/api/preferences").reply(&filter).await;
    assert_eq!(body_json(res.body())["showLowHigh"], false);

    let res = warp::test::request()
        .method("PUT")
        .path("/api/preferences")
        .json(&json!({ "showLowHigh": true }))
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res.body())["showLowHigh"], true);
}

#[tokio::test]
async fn dashboard_and_metrics_endpoints() {
    let (quotes, state) = setup();
    quotes.set("ACME", 100.0);
    let company = add(&state, "ACME").await;
    let id = company["id"].as_str().unwrap().to_string();
    let filter = routes(state.clone());

    let stats = body_json(
        warp::test::request().path("/api/dashboard/stats").reply(&filter).await.body(),
    );
    assert_eq!(stats["totalCompanies"], 1);
    assert_eq!(stats["topPerformer"], "ACME");

    let trends = body_json(
        warp::test::request().path("/api/dashboard/trends").reply(&filter).await.body(),
    );
    assert_eq!(trends["averagePe"], 20.0);

    let insights = body_json(
        warp::test::request().path("/api/dashboard/insights").reply(&filter).await.body(),
    );
    assert_eq!(insights[0]["kind"], "growth");

    let metrics = body_json(
        warp::test::request()
            .path(&format!("/api/companies/{}/metrics", id))
            .reply(&filter)
            .await
            .body(),
    );
    let fair = metrics["fairValue"].as_f64().unwrap();
    assert!((fair - 85.05).abs() < 1e-6);
}

#[tokio::test]
async fn export_returns_csv() {
    let (quotes, state) = setup();
    quotes.set("ACME", 100.0);
    add(&state, "ACME").await;

    let res = warp::test::request()
        .path("/api/companies/export")
        .reply(&routes(state.clone()))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    let text = String::from_utf8(res.body().to_vec()).unwrap();
    assert!(text.starts_with("symbol,company_name,price"));
    assert!(text.lines().nth(1).unwrap().starts_with("ACME,ACME,100.00"));
}
