//! HTTP API over a [`CryptoRepository`]

pub mod dto;
pub mod error;
pub mod handlers;

pub use error::ApiError;

use crate::core::repository::CryptoRepository;
use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, put},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    pub repo: Arc<dyn CryptoRepository>,
}

impl AppState {
    pub fn new(repo: Arc<dyn CryptoRepository>) -> Self {
        AppState { repo }
    }
}

/// Create the REST API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/crypto",
            get(handlers::list_cryptos).post(handlers::create_crypto),
        )
        .route(
            "/crypto/{symbol}",
            get(handlers::get_crypto).delete(handlers::delete_crypto),
        )
        .route("/crypto/{symbol}/refresh", put(handlers::refresh_crypto))
        .route("/crypto/{symbol}/history", get(handlers::crypto_history))
        .route("/crypto/{symbol}/stats", get(handlers::crypto_stats))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the API on `addr` until Ctrl-C.
pub async fn serve(addr: SocketAddr, repo: Arc<dyn CryptoRepository>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("listening on {}", listener.local_addr()?);

    let app = create_router(Arc::new(AppState::new(repo)));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

pub(crate) async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
