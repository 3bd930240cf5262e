//! Local stand-in for the CoinGecko endpoints the lookup client consumes.
//!
//! `/coins/list` returns the configured coin list verbatim; `/simple/price`
//! quotes a random price for every known id.

use crate::providers::coingecko::CoinInfo;
use crate::server::dto::ErrorResponse;
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use rand::Rng;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

pub const DEFAULT_ADDR: &str = "127.0.0.1:5050";

const MIN_PRICE: f64 = 0.000001;
const MAX_PRICE: f64 = 1_000_000.0;

pub struct FakeGecko {
    coins: Bytes,
    ids: HashSet<String>,
}

impl FakeGecko {
    /// Loads a CoinGecko-style coin list from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let coins = std::fs::read(path)
            .with_context(|| format!("Failed to read coins list: {}", path.display()))?;
        Self::from_json(coins)
            .with_context(|| format!("Failed to load coins list: {}", path.display()))
    }

    pub fn from_json(coins: impl Into<Bytes>) -> Result<Self> {
        let coins = coins.into();
        let parsed: Vec<CoinInfo> =
            serde_json::from_slice(&coins).context("Failed to parse coins list JSON")?;
        let ids = parsed
            .iter()
            .map(|coin| coin.id.trim().to_lowercase())
            .filter(|id| !id.is_empty())
            .collect();
        Ok(FakeGecko { coins, ids })
    }

    pub fn known_ids(&self) -> usize {
        self.ids.len()
    }

    /// Quotes every known id in every requested currency; unknown ids are omitted.
    pub fn quote(
        &self,
        ids: &[String],
        currencies: &[String],
    ) -> HashMap<String, HashMap<String, f64>> {
        let mut rng = rand::thread_rng();
        ids.iter()
            .filter(|id| self.ids.contains(*id))
            .map(|id| {
                let quotes = currencies
                    .iter()
                    .map(|currency| (currency.clone(), random_price(&mut rng)))
                    .collect();
                (id.clone(), quotes)
            })
            .collect()
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/coins/list", get(coins_list))
            .route("/simple/price", get(simple_price))
            .with_state(Arc::new(self))
    }
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub ids: Option<String>,
    pub vs_currencies: Option<String>,
}

async fn coins_list(State(fake): State<Arc<FakeGecko>>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        fake.coins.clone(),
    )
        .into_response()
}

async fn simple_price(
    State(fake): State<Arc<FakeGecko>>,
    Query(query): Query<PriceQuery>,
) -> Response {
    let ids = split_csv(query.ids.as_deref());
    let currencies = split_csv(query.vs_currencies.as_deref());
    if ids.is_empty() {
        return error_response("missing ids");
    }
    if currencies.is_empty() {
        return error_response("missing vs_currencies");
    }

    debug!(?ids, ?currencies, "Quoting prices");
    Json(fake.quote(&ids, &currencies)).into_response()
}

fn error_response(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}

/// Splits a comma separated list, dropping blanks and lower-casing entries.
pub fn split_csv(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Uniform random price in `[MIN_PRICE, MAX_PRICE]`, rounded to 6 decimals.
fn random_price<R: Rng>(rng: &mut R) -> f64 {
    let price = rng.gen_range(MIN_PRICE..=MAX_PRICE);
    (price * 1e6).round() / 1e6
}

/// Serves the fake API on `addr` until Ctrl-C.
pub async fn serve(addr: SocketAddr, fake: FakeGecko) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(
        coins = fake.known_ids(),
        "Fake CoinGecko server: http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, fake.router())
        .with_graceful_shutdown(crate::server::shutdown_signal())
        .await
        .context("Fake CoinGecko server error")
}
