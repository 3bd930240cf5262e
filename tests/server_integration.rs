//! Integration tests for the REST API
//!
//! Drives the router with `oneshot` requests over an in-memory repository and
//! a scripted price lookup.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use cryptoserver::{
    core::{LookupError, PriceLookup},
    server::{AppState, create_router},
    store::MemoryCryptoRepo,
};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tracing::info;

// ============================================================================
// Test Fixtures
// ============================================================================

/// Answers names for btc and eth; prices count up from 100.
struct ScriptedLookup {
    next_price: AtomicU64,
    price_error: Mutex<Option<LookupError>>,
}

impl ScriptedLookup {
    fn new() -> Self {
        ScriptedLookup {
            next_price: AtomicU64::new(100),
            price_error: Mutex::new(None),
        }
    }

    fn fail_prices_with(&self, err: LookupError) {
        *self.price_error.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl PriceLookup for ScriptedLookup {
    async fn lookup_name(&self, symbol: &str) -> Result<String, LookupError> {
        match symbol {
            "btc" => Ok("Bitcoin".to_string()),
            "eth" => Ok("Ethereum".to_string()),
            "down" => Err(LookupError::ServiceUnavailable("connection refused".into())),
            _ => Err(LookupError::NotFound(format!("name not found for {symbol}"))),
        }
    }

    async fn lookup_price(&self, _symbol: &str) -> Result<f64, LookupError> {
        if let Some(err) = self.price_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.next_price.fetch_add(1, Ordering::SeqCst) as f64)
    }
}

fn create_test_app() -> (Arc<ScriptedLookup>, axum::Router) {
    let lookup = Arc::new(ScriptedLookup::new());
    let repo = Arc::new(MemoryCryptoRepo::new(lookup.clone()));
    (lookup, create_router(Arc::new(AppState::new(repo))))
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<&str>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn create(app: &axum::Router, symbol: &str) -> Response {
    let body = json!({ "symbol": symbol }).to_string();
    send(app, "POST", "/crypto", Some(&body)).await
}

fn assert_json_content_type(response: &Response) {
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(
        content_type.starts_with("application/json"),
        "unexpected content type {content_type}"
    );
}

// ============================================================================
// Success paths
// ============================================================================

#[test_log::test(tokio::test)]
async fn test_create_returns_envelope() {
    let (_, app) = create_test_app();

    let response = create(&app, " BTC ").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_json_content_type(&response);

    let json = body_json(response).await;
    info!(%json, "Created crypto");
    let crypto = &json["crypto"];
    assert_eq!(crypto["symbol"], "btc");
    assert_eq!(crypto["name"], "Bitcoin");
    assert_eq!(crypto["current_price"], 100.0);
    assert!(crypto["last_updated"].is_string());
    assert!(crypto.get("history").is_none());
}

#[test_log::test(tokio::test)]
async fn test_get_returns_bare_view() {
    let (_, app) = create_test_app();
    create(&app, "eth").await;

    let response = send(&app, "GET", "/crypto/ETH", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["symbol"], "eth");
    assert_eq!(json["name"], "Ethereum");
    assert_eq!(json["current_price"], 100.0);
    assert!(json.get("crypto").is_none());
    assert!(json.get("history").is_none());
}

#[test_log::test(tokio::test)]
async fn test_list_cryptos() {
    let (_, app) = create_test_app();

    let json = body_json(send(&app, "GET", "/crypto", None).await).await;
    assert_eq!(json, json!({ "cryptos": [] }));

    create(&app, "btc").await;
    create(&app, "eth").await;

    let response = send(&app, "GET", "/crypto", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let mut symbols: Vec<&str> = json["cryptos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["symbol"].as_str().unwrap())
        .collect();
    symbols.sort_unstable();
    assert_eq!(symbols, vec!["btc", "eth"]);
}

#[test_log::test(tokio::test)]
async fn test_refresh_history_and_stats() {
    let (_, app) = create_test_app();
    create(&app, "btc").await;

    let response = send(&app, "PUT", "/crypto/btc/refresh", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["crypto"]["current_price"], 101.0);

    send(&app, "PUT", "/crypto/btc/refresh", None).await;

    let response = send(&app, "GET", "/crypto/BTC/history", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["symbol"], "btc");
    let prices: Vec<f64> = json["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["price"].as_f64().unwrap())
        .collect();
    assert_eq!(prices, vec![100.0, 101.0, 102.0]);
    assert!(json["history"][0]["timestamp"].is_string());

    let response = send(&app, "GET", "/crypto/btc/stats", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["symbol"], "btc");
    assert_eq!(json["current_price"], 102.0);
    let stats = &json["stats"];
    assert_eq!(stats["min_price"], 100.0);
    assert_eq!(stats["max_price"], 102.0);
    assert_eq!(stats["avg_price"], 101.0);
    assert_eq!(stats["price_change"], 2.0);
    assert_eq!(stats["price_change_percent"], 2.0);
    assert_eq!(stats["records_count"], 3);
}

#[test_log::test(tokio::test)]
async fn test_delete_removes_crypto() {
    let (_, app) = create_test_app();
    create(&app, "btc").await;

    let response = send(&app, "DELETE", "/crypto/btc", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({}));

    let response = send(&app, "GET", "/crypto/btc", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "DELETE", "/crypto/btc", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({ "error": "not found" }));
}

// ============================================================================
// Request validation
// ============================================================================

#[test_log::test(tokio::test)]
async fn test_create_rejects_invalid_json() {
    let (_, app) = create_test_app();

    let response = send(&app, "POST", "/crypto", Some("{not json")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_json_content_type(&response);
    assert_eq!(body_json(response).await, json!({ "error": "invalid json" }));
}

#[test_log::test(tokio::test)]
async fn test_create_requires_symbol() {
    let (_, app) = create_test_app();

    for body in [r#"{}"#, r#"{"symbol": ""}"#, r#"{"symbol": "   "}"#] {
        let response = send(&app, "POST", "/crypto", Some(body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(
            body_json(response).await,
            json!({ "error": "symbol required" })
        );
    }
}

#[test_log::test(tokio::test)]
async fn test_blank_path_symbol() {
    let (lookup, app) = create_test_app();

    for uri in ["/crypto/%20", "/crypto/%20/history", "/crypto/%20%20/stats"] {
        let response = send(&app, "GET", uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {uri}");
        assert_eq!(body_json(response).await, json!({ "error": "not found" }));
    }

    let response = send(&app, "PUT", "/crypto/%20/refresh", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "symbol required" })
    );
    assert_eq!(lookup.next_price.load(Ordering::SeqCst), 100);
}

// ============================================================================
// Error mapping
// ============================================================================

#[test_log::test(tokio::test)]
async fn test_create_duplicate_conflicts() {
    let (_, app) = create_test_app();
    create(&app, "btc").await;

    let response = create(&app, "BTC").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "crypto already exists" })
    );
}

#[test_log::test(tokio::test)]
async fn test_create_unknown_symbol_is_bad_request() {
    let (_, app) = create_test_app();

    let response = create(&app, "nope").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "invalid symbol: not found: name not found for nope" })
    );
}

#[test_log::test(tokio::test)]
async fn test_lookup_outage_is_service_unavailable() {
    let (_, app) = create_test_app();

    let response = create(&app, "down").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .starts_with("service unavailable")
    );
}

#[test_log::test(tokio::test)]
async fn test_refresh_price_errors() {
    let (lookup, app) = create_test_app();
    create(&app, "btc").await;

    lookup.fail_prices_with(LookupError::NotFound("price not found for btc".into()));
    let response = send(&app, "PUT", "/crypto/btc/refresh", None).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().starts_with("price unavailable"));

    lookup.fail_prices_with(LookupError::BadResponse("garbage".into()));
    let response = send(&app, "PUT", "/crypto/btc/refresh", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_json(send(&app, "GET", "/crypto/btc/history", None).await).await;
    assert_eq!(json["history"].as_array().unwrap().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_missing_symbol_routes_are_not_found() {
    let (_, app) = create_test_app();

    for (method, uri) in [
        ("GET", "/crypto/btc"),
        ("PUT", "/crypto/btc/refresh"),
        ("GET", "/crypto/btc/history"),
        ("GET", "/crypto/btc/stats"),
        ("DELETE", "/crypto/btc"),
    ] {
        let response = send(&app, method, uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(body_json(response).await, json!({ "error": "not found" }));
    }
}

#[test_log::test(tokio::test)]
async fn test_unknown_routes_and_methods_fall_back() {
    let (_, app) = create_test_app();

    for (method, uri) in [
        ("GET", "/"),
        ("GET", "/cryptos"),
        ("GET", "/crypto/btc/unknown"),
        ("PATCH", "/crypto"),
        ("POST", "/crypto/btc/refresh"),
        ("GET", "/crypto/btc/refresh"),
    ] {
        let response = send(&app, method, uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
        assert_json_content_type(&response);
        assert_eq!(body_json(response).await, json!({ "error": "not found" }));
    }
}
