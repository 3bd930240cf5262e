//! Aggregate statistics over a price history.
use crate::core::crypto::PriceRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub min_price: f64,
    pub max_price: f64,
    pub avg_price: f64,
    /// Last price minus first price.
    pub price_change: f64,
    /// `price_change` relative to the first price, zero when the first price is zero.
    #[serde(rename = "price_change_percent")]
    pub price_change_pct: f64,
    pub records_count: usize,
}

impl PriceStats {
    /// Computes the statistics over `history`, returning zeroed stats for an empty history.
    pub fn from_history(history: &[PriceRecord]) -> Self {
        let (Some(first), Some(last)) = (history.first(), history.last()) else {
            return PriceStats::default();
        };

        let (min_price, max_price, sum) = history.iter().fold(
            (first.price, first.price, 0.0),
            |(min, max, sum), record| {
                (min.min(record.price), max.max(record.price), sum + record.price)
            },
        );

        let price_change = last.price - first.price;
        let price_change_pct = if first.price != 0.0 {
            price_change / first.price * 100.0
        } else {
            0.0
        };

        PriceStats {
            min_price,
            max_price,
            avg_price: sum / history.len() as f64,
            price_change,
            price_change_pct,
            records_count: history.len(),
        }
    }
}
