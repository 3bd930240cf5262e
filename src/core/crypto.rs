//! Tracked assets and their price history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of price observations retained per asset.
pub const MAX_HISTORY: usize = 100;

/// A single price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// A tracked crypto asset.
///
/// `current_price` and `last_updated` always mirror the last entry of `history`,
/// which is never empty and holds at most [`MAX_HISTORY`] records in
/// non-decreasing timestamp order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crypto {
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub last_updated: DateTime<Utc>,
    pub history: Vec<PriceRecord>,
}

impl Crypto {
    /// Creates an asset whose history holds the single initial observation.
    pub fn new(symbol: String, name: String, price: f64, now: DateTime<Utc>) -> Self {
        Crypto {
            symbol,
            name,
            current_price: price,
            last_updated: now,
            history: vec![PriceRecord {
                price,
                timestamp: now,
            }],
        }
    }

    /// Appends an observation and drops the oldest records beyond [`MAX_HISTORY`].
    ///
    /// The timestamp is clamped to the previous record's so a wall clock stepping
    /// backwards cannot reorder the history.
    pub fn push_price(&mut self, price: f64, now: DateTime<Utc>) {
        let timestamp = match self.history.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };
        self.history.push(PriceRecord { price, timestamp });

        if self.history.len() > MAX_HISTORY {
            // Reallocate so the dropped prefix is released with the old buffer.
            let start = self.history.len() - MAX_HISTORY;
            self.history = self.history[start..].to_vec();
        }

        self.current_price = price;
        self.last_updated = timestamp;
    }
}

/// Normalizes a caller-supplied symbol into its repository key.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_lowercase()
}
