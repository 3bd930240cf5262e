use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::core::crypto::normalize_symbol;
use crate::server::{ApiError, dto::*};

use super::AppState;

/// GET /crypto
pub async fn list_cryptos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CryptoListResponse>, ApiError> {
    let cryptos = state.repo.list()?;
    Ok(Json(CryptoListResponse {
        cryptos: cryptos.into_iter().map(CryptoView::from).collect(),
    }))
}

/// POST /crypto
///
/// The body is decoded by hand so malformed JSON gets the API's own error shape.
pub async fn create_crypto(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<CryptoEnvelope>), ApiError> {
    let request: CreateCryptoRequest =
        serde_json::from_slice(&body).map_err(|_| ApiError::bad_request("invalid json"))?;
    if request.symbol.trim().is_empty() {
        return Err(ApiError::bad_request("symbol required"));
    }

    let crypto = state.repo.create(&request.symbol).await?;
    Ok((
        StatusCode::CREATED,
        Json(CryptoEnvelope {
            crypto: crypto.into(),
        }),
    ))
}

/// GET /crypto/{symbol}
pub async fn get_crypto(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<CryptoView>, ApiError> {
    require_symbol(&symbol, ApiError::not_found)?;
    let crypto = state.repo.get(&symbol)?;
    Ok(Json(crypto.into()))
}

/// DELETE /crypto/{symbol}
pub async fn delete_crypto(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.repo.delete(&symbol)?;
    Ok(Json(json!({})))
}

/// PUT /crypto/{symbol}/refresh
pub async fn refresh_crypto(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<CryptoEnvelope>, ApiError> {
    require_symbol(&symbol, || ApiError::bad_request("symbol required"))?;
    let crypto = state.repo.refresh_price(&symbol).await?;
    Ok(Json(CryptoEnvelope {
        crypto: crypto.into(),
    }))
}

/// GET /crypto/{symbol}/history
pub async fn crypto_history(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    require_symbol(&symbol, ApiError::not_found)?;
    let history = state.repo.history(&symbol)?;
    Ok(Json(HistoryResponse {
        symbol: normalize_symbol(&symbol),
        history,
    }))
}

/// GET /crypto/{symbol}/stats
pub async fn crypto_stats(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<StatsResponse>, ApiError> {
    require_symbol(&symbol, ApiError::not_found)?;
    let crypto = state.repo.get(&symbol)?;
    let stats = state.repo.stats(&symbol)?;
    Ok(Json(StatsResponse {
        symbol: crypto.symbol,
        current_price: crypto.current_price,
        stats,
    }))
}

/// Rejects a path symbol that is blank once trimmed with the route's own error.
fn require_symbol(symbol: &str, blank: impl FnOnce() -> ApiError) -> Result<(), ApiError> {
    if symbol.trim().is_empty() {
        return Err(blank());
    }
    Ok(())
}

/// Fallback for unknown paths and unsupported methods.
pub async fn not_found() -> ApiError {
    ApiError::not_found()
}
