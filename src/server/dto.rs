use crate::core::crypto::{Crypto, PriceRecord};
use crate::core::stats::PriceStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /crypto`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCryptoRequest {
    #[serde(default)]
    pub symbol: String,
}

/// Transport shape of a crypto, without its history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CryptoView {
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub last_updated: DateTime<Utc>,
}

impl From<Crypto> for CryptoView {
    fn from(c: Crypto) -> Self {
        CryptoView {
            symbol: c.symbol,
            name: c.name,
            current_price: c.current_price,
            last_updated: c.last_updated,
        }
    }
}

/// `{"crypto": ...}` envelope used by create and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct CryptoEnvelope {
    pub crypto: CryptoView,
}

#[derive(Debug, Clone, Serialize)]
pub struct CryptoListResponse {
    pub cryptos: Vec<CryptoView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub symbol: String,
    pub history: Vec<PriceRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub symbol: String,
    pub current_price: f64,
    pub stats: PriceStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
        }
    }
}
