//! Price lookup abstraction consumed by the repository

use crate::core::error::LookupError;
use async_trait::async_trait;

/// Supplies the display name and current USD price for a symbol.
///
/// Implementations own their timeouts; callers never abandon an in-flight lookup.
#[async_trait]
pub trait PriceLookup: Send + Sync {
    async fn lookup_name(&self, symbol: &str) -> Result<String, LookupError>;
    async fn lookup_price(&self, symbol: &str) -> Result<f64, LookupError>;
}
