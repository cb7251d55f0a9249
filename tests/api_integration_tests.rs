//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint, then drives a real
//! server over TCP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, StatusCode},
    Router,
};
use futures_util::StreamExt;
use market_gateway::{
    api::create_router, upstream::UpstreamError, AppState, Config, SimulatedConnector,
};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn test_config() -> Config {
    Config {
        rate_limit_requests: 5,
        rate_limit_period: 10,
        ..Config::default()
    }
}

fn create_test_app_with(config: Config, connector: &SimulatedConnector) -> Router {
    let state = AppState::from_config(&config, Arc::new(connector.clone()));
    create_router(state)
}

fn create_test_app() -> Router {
    create_test_app_with(test_config(), &SimulatedConnector::default())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get_from(uri: &str, ip: &str) -> Request<Body> {
    let addr: SocketAddr = format!("{}:40000", ip).parse().unwrap();
    Request::builder()
        .uri(uri)
        .extension(ConnectInfo(addr))
        .body(Body::empty())
        .unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// == Info Endpoint Tests ==

#[tokio::test]
async fn test_root_endpoint() {
    let app = create_test_app();

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["message"], "Market Gateway is running");
    assert_eq!(json["health"], "/health");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
    assert_eq!(json["cache_stats"]["size"], 0);
    assert_eq!(json["cache_stats"]["hit_rate"], "0.00%");
}

#[tokio::test]
async fn test_exchanges_endpoint() {
    let app = create_test_app();

    let response = app.oneshot(get("/exchanges")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|ex| ex["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["binance", "kraken", "coinbase"]);
}

// == Price Endpoint Tests ==

#[tokio::test]
async fn test_price_endpoint_success() {
    let app = create_test_app();

    let response = app.oneshot(get("/price/binance/BTC%2FUSDT")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["symbol"], "BTC/USDT");
    assert!(json["last"].as_f64().unwrap() > 0.0);
    assert!(json["timestamp"].is_i64());
}

#[tokio::test]
async fn test_price_endpoint_served_from_cache() {
    let connector = SimulatedConnector::default();
    let app = create_test_app_with(test_config(), &connector);

    let first = app
        .clone()
        .oneshot(get("/price/kraken/ETH%2FUSD"))
        .await
        .unwrap();
    let first = body_to_json(first.into_body()).await;
    let second = app
        .clone()
        .oneshot(get("/price/kraken/ETH%2FUSD"))
        .await
        .unwrap();
    let second = body_to_json(second.into_body()).await;

    assert_eq!(first, second);
    assert_eq!(connector.fetch_count(), 1);

    let stats = app.oneshot(get("/admin/cache-stats")).await.unwrap();
    let stats = body_to_json(stats.into_body()).await;
    assert_eq!(stats["hits"], 1);
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["hit_rate"], "50.00%");
}

#[tokio::test]
async fn test_price_endpoint_unknown_exchange() {
    let app = create_test_app();

    let response = app.oneshot(get("/price/mtgox/BTC%2FUSD")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "NotFound");
    assert_eq!(json["detail"], "Exchange 'mtgox' not found.");
    assert_eq!(json["retryable"], false);
}

#[tokio::test]
async fn test_price_endpoint_exchange_id_case_mismatch() {
    let app = create_test_app();

    let response = app.oneshot(get("/price/Binance/BTC%2FUSDT")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "NotFound");
    assert_eq!(json["detail"], "Exchange 'Binance' not found.");
}

#[tokio::test]
async fn test_price_endpoint_invalid_symbol() {
    let app = create_test_app();

    let response = app.oneshot(get("/price/binance/BTC%7CUSDT")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "InvalidRequest");
}

#[tokio::test]
async fn test_price_endpoint_upstream_outage() {
    let connector = SimulatedConnector::default();
    connector.set_failure(
        "binance",
        Some(UpstreamError::Network("connection refused".into())),
    );
    let app = create_test_app_with(test_config(), &connector);

    let response = app
        .clone()
        .oneshot(get("/price/binance/BTC%2FUSDT"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "Transient");
    assert_eq!(json["retryable"], true);

    // The failure was not cached
    connector.set_failure("binance", None);
    let response = app.oneshot(get("/price/binance/BTC%2FUSDT")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// == Historical Endpoint Tests ==

#[tokio::test]
async fn test_historical_endpoint_defaults() {
    let app = create_test_app();

    let response = app
        .oneshot(get("/historical/binance/BTC%2FUSDT"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    let candles = json.as_array().unwrap();
    assert_eq!(candles.len(), 100);
    assert!(candles[0]["timestamp"].as_i64().unwrap() < candles[1]["timestamp"].as_i64().unwrap());
}

#[tokio::test]
async fn test_historical_endpoint_with_query() {
    let app = create_test_app();

    let response = app
        .oneshot(get("/historical/kraken/BTC%2FUSD?timeframe=1h&limit=24"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    let candles = json.as_array().unwrap();
    assert_eq!(candles.len(), 24);
    let step = candles[1]["timestamp"].as_i64().unwrap() - candles[0]["timestamp"].as_i64().unwrap();
    assert_eq!(step, 3_600_000);
}

#[tokio::test]
async fn test_historical_endpoint_unsupported() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(get("/historical/coinbase/BTC%2FUSD"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "Unsupported");

    let response = app
        .oneshot(get("/historical/binance/BTC%2FUSDT?timeframe=7m"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["detail"].as_str().unwrap().contains("Timeframe '7m'"));
}

#[tokio::test]
async fn test_historical_endpoint_limit_out_of_range() {
    let app = create_test_app();

    let response = app
        .oneshot(get("/historical/binance/BTC%2FUSDT?limit=1001"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == Rate Limit Tests ==

#[tokio::test]
async fn test_rate_limit_sixth_request_rejected() {
    let app = create_test_app();

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(get_from("/price/binance/BTC%2FUSDT", "10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(get_from("/price/binance/BTC%2FUSDT", "10.0.0.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()[header::RETRY_AFTER], "10");

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "RateLimited");
    assert_eq!(json["detail"], "Rate limit exceeded. Please try again later.");
    assert_eq!(json["retry_after"], 10);

    // Other clients keep their own quota
    let response = app
        .oneshot(get_from("/price/binance/BTC%2FUSDT", "10.0.0.2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_shared_across_market_routes() {
    let app = create_test_app();

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(get_from("/price/kraken/BTC%2FUSD", "10.0.0.3"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get_from("/historical/kraken/BTC%2FUSD?limit=5", "10.0.0.3"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(get_from("/historical/kraken/BTC%2FUSD?limit=5", "10.0.0.3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_reset_rate_limit_endpoint() {
    let app = create_test_app();

    for _ in 0..5 {
        app.clone()
            .oneshot(get_from("/price/binance/BTC%2FUSDT", "10.0.0.4"))
            .await
            .unwrap();
    }
    let response = app
        .clone()
        .oneshot(get_from("/price/binance/BTC%2FUSDT", "10.0.0.4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = app
        .clone()
        .oneshot(post("/admin/reset-rate-limit?client_id=10.0.0.4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["buckets_cleared"], 1);

    let response = app
        .oneshot(get_from("/price/binance/BTC%2FUSDT", "10.0.0.4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// == Admin Endpoint Tests ==

#[tokio::test]
async fn test_clear_cache_endpoint() {
    let connector = SimulatedConnector::default();
    let app = create_test_app_with(test_config(), &connector);

    app.clone()
        .oneshot(get("/price/binance/SOL%2FUSDT"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post("/admin/clear-cache"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["message"], "All caches cleared successfully");

    let stats = app
        .clone()
        .oneshot(get("/admin/cache-stats"))
        .await
        .unwrap();
    let stats = body_to_json(stats.into_body()).await;
    assert_eq!(stats["size"], 0);
    assert_eq!(stats["hits"], 0);

    app.oneshot(get("/price/binance/SOL%2FUSDT")).await.unwrap();
    assert_eq!(connector.fetch_count(), 2);
}

#[tokio::test]
async fn test_cache_stats_endpoint_shape() {
    let app = create_test_app();

    let response = app.oneshot(get("/admin/cache-stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["max_size"], 1000);
    assert_eq!(json["ttl"], 10.0);
    assert_eq!(json["evictions"], 0);
}

#[tokio::test]
async fn test_admin_wrong_method() {
    let app = create_test_app();

    let response = app.oneshot(get("/admin/clear-cache")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// == End-to-End Tests ==

async fn spawn_server(config: Config) -> SocketAddr {
    let state = AppState::from_config(&config, Arc::new(SimulatedConnector::default()));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

#[tokio::test]
async fn test_end_to_end_price_and_rate_limit() {
    let addr = spawn_server(Config {
        rate_limit_requests: 2,
        rate_limit_period: 10,
        ..Config::default()
    })
    .await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/price/binance/BTC%2FUSDT", addr);

    for _ in 0..2 {
        let response = client.get(&url).send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let json: Value = response.json().await.unwrap();
        assert_eq!(json["symbol"], "BTC/USDT");
    }

    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["retry-after"], "10");

    // Rate limiting keys on the peer address, so resetting it restores access
    let response = client
        .post(format!(
            "http://{}/admin/reset-rate-limit?client_id=127.0.0.1",
            addr
        ))
        .send()
        .await
        .unwrap();
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["buckets_cleared"], 1);

    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn test_end_to_end_ticker_stream() {
    let addr = spawn_server(Config::default()).await;
    let url = format!("ws://{}/ws/binance/ETH%2FUSDT?poll_interval=1", addr);

    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    for _ in 0..2 {
        let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let json: Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();
        assert_eq!(json["symbol"], "ETH/USDT");
    }
}

#[tokio::test]
async fn test_end_to_end_stream_error_closes() {
    let addr = spawn_server(Config::default()).await;
    let url = format!("ws://{}/ws/mtgox/BTC%2FUSD", addr);

    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let json: Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();
    assert_eq!(json["status_code"], 404);
    assert_eq!(json["error"], "Exchange 'mtgox' not found.");

    let next = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .unwrap();
    assert!(matches!(
        next,
        Some(Ok(tokio_tungstenite::tungstenite::Message::Close(_))) | None
    ));
}
