mod common;

use axum::extract::Query as Params;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use common::day;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use ticker_dashboard::models::geo::{Address, GeoPoint};
use ticker_dashboard::providers::opencage::OpenCage;
use ticker_dashboard::providers::yahoo::YahooFinance;
use ticker_dashboard::providers::{Geocoder, MarketData};
use ticker_dashboard::{Config, DashboardError};

/// Serve `router` on an ephemeral local port and return its base URL.
async fn stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{}", addr)
}

fn yahoo_config(base: &str) -> Config {
    Config::new()
        .with_yahoo_chart_url(&format!("{}/chart", base))
        .with_yahoo_summary_url(&format!("{}/summary", base))
        .with_yahoo_auth_urls(&format!("{}/cookie", base), &format!("{}/crumb", base))
}

fn status_only(status: StatusCode) -> Router {
    Router::new()
        .route("/chart/:symbol", get(move || async move { status }))
        .route("/summary/:symbol", get(move || async move { status }))
        .route("/cookie", get(|| async { StatusCode::NOT_FOUND }))
        .route("/crumb", get(|| async { "crumb-1" }))
}

/// Hands out `crumb-1`, `crumb-2`, ... and only accepts the crumb numbered
/// `accepted` on quoteSummary.
fn crumb_rotation(accepted: Option<usize>) -> (Router, Arc<AtomicUsize>) {
    let issued = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&issued);
    let router = Router::new()
        .route("/cookie", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/crumb",
            get(move || {
                let counter = Arc::clone(&counter);
                async move { format!("crumb-{}", counter.fetch_add(1, Ordering::SeqCst) + 1) }
            }),
        )
        .route(
            "/summary/:symbol",
            get(move |Params(params): Params<HashMap<String, String>>| async move {
                let expected = accepted.map(|n| format!("crumb-{}", n));
                if params.get("crumb") != expected.as_ref() {
                    return StatusCode::UNAUTHORIZED.into_response();
                }
                Json(json!({"quoteSummary": {"result": [{
                    "price": {"shortName": "Acme Corp", "currency": "USD"},
                    "financialData": {"currentPrice": {"raw": 101.5, "fmt": "101.50"}}
                }], "error": null}}))
                .into_response()
            }),
        );
    (router, issued)
}

fn address() -> Address {
    Address {
        line: "1 Main Street".to_string(),
        zip: Some("10001".to_string()),
        city: "New York".to_string(),
        country: "United States".to_string(),
    }
}

async fn opencage(router: Router) -> OpenCage {
    let base = stub(router).await;
    let config = Config::new()
        .with_opencage_url(&format!("{}/geocode", base))
        .with_opencage_api_key(Some("test-key".to_string()));
    OpenCage::new(&config).unwrap()
}

#[tokio::test]
async fn chart_keeps_only_the_requested_days() {
    let router = Router::new().route(
        "/chart/:symbol",
        get(|| async {
            Json(json!({"chart": {"result": [{
                "meta": {"gmtoffset": 0},
                "timestamp": [1709251200, 1709510400, 1709596800],
                "indicators": {
                    "quote": [{
                        "open": [1.0, 2.0, 3.0],
                        "high": [1.5, 2.5, 3.5],
                        "low": [0.5, 1.5, 2.5],
                        "close": [1.2, 2.2, 3.2],
                        "volume": [10, 20, 30]
                    }],
                    "adjclose": [{"adjclose": [1.1, 2.1, 3.1]}]
                }
            }], "error": null}}))
        }),
    );
    let yahoo = YahooFinance::new(&yahoo_config(&stub(router).await)).unwrap();

    let series = yahoo.quote_series("ACME", day(2024, 3, 4), day(2024, 3, 5)).await.unwrap();
    assert_eq!(series.trading_days(), vec![day(2024, 3, 4), day(2024, 3, 5)]);
    assert_eq!(series.adj_closes(), vec![2.1, 3.1]);
}

#[tokio::test]
async fn chart_not_found_is_an_empty_series() {
    let yahoo = YahooFinance::new(&yahoo_config(&stub(status_only(StatusCode::NOT_FOUND)).await)).unwrap();
    let series = yahoo.quote_series("ZZZZ", day(2024, 3, 1), day(2024, 3, 8)).await.unwrap();
    assert!(series.is_empty());
}

#[tokio::test]
async fn other_failures_are_provider_errors() {
    let base = stub(status_only(StatusCode::INTERNAL_SERVER_ERROR)).await;
    let yahoo = YahooFinance::new(&yahoo_config(&base)).unwrap();

    let chart = yahoo.quote_series("ACME", day(2024, 3, 1), day(2024, 3, 8)).await;
    assert!(matches!(chart, Err(DashboardError::ProviderError(ref m)) if m.contains("500")));

    let profile = yahoo.profile("ACME").await;
    assert!(matches!(profile, Err(DashboardError::ProviderError(ref m)) if m.contains("500")));
}

#[tokio::test]
async fn summary_not_found_is_an_empty_profile() {
    let yahoo = YahooFinance::new(&yahoo_config(&stub(status_only(StatusCode::NOT_FOUND)).await)).unwrap();
    let profile = yahoo.profile("ZZZZ").await.unwrap();
    assert_eq!(profile.short_name, None);
}

#[tokio::test]
async fn rejected_crumb_is_refreshed_once() {
    let (router, issued) = crumb_rotation(Some(2));
    let yahoo = YahooFinance::new(&yahoo_config(&stub(router).await)).unwrap();

    let profile = yahoo.profile("ACME").await.unwrap();
    assert_eq!(profile.short_name.as_deref(), Some("Acme Corp"));
    assert_eq!(issued.load(Ordering::SeqCst), 2);

    // the refreshed crumb is cached
    yahoo.profile("ACME").await.unwrap();
    assert_eq!(issued.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn second_rejection_is_a_provider_error() {
    let (router, issued) = crumb_rotation(None);
    let yahoo = YahooFinance::new(&yahoo_config(&stub(router).await)).unwrap();

    match yahoo.profile("ACME").await {
        Err(DashboardError::ProviderError(message)) => assert!(message.contains("rejected"), "{}", message),
        other => panic!("expected a provider error, got {:?}", other.map(|p| p.short_name)),
    }
    assert_eq!(issued.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn geocoder_resolves_the_first_result() {
    let router = Router::new().route(
        "/geocode",
        get(|Params(params): Params<HashMap<String, String>>| async move {
            assert_eq!(params["q"], "1 Main Street, New York, United States");
            assert_eq!(params["key"], "test-key");
            Json(json!({"results": [{"geometry": {"lat": 40.7128, "lng": -74.006}}]}))
        }),
    );
    let geocoder = opencage(router).await;
    assert_eq!(
        geocoder.locate(&address()).await.unwrap(),
        Some(GeoPoint { latitude: 40.7128, longitude: -74.006 })
    );
}

#[tokio::test]
async fn geocoder_status_failure_is_unresolved() {
    for status in [StatusCode::PAYMENT_REQUIRED, StatusCode::TOO_MANY_REQUESTS, StatusCode::BAD_GATEWAY] {
        let router = Router::new().route("/geocode", get(move || async move { status }));
        let geocoder = opencage(router).await;
        assert_eq!(geocoder.locate(&address()).await.unwrap(), None, "status {}", status);
    }
}

#[tokio::test]
async fn geocoder_malformed_body_is_unresolved() {
    let router = Router::new().route("/geocode", get(|| async { "<html>not json</html>" }));
    let geocoder = opencage(router).await;
    assert_eq!(geocoder.locate(&address()).await.unwrap(), None);
}
