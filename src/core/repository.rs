//! Repository abstraction over tracked assets

use crate::core::crypto::{Crypto, PriceRecord};
use crate::core::error::RepoError;
use crate::core::stats::PriceStats;
use async_trait::async_trait;

/// Storage for tracked assets.
///
/// Every returned value is an independent copy; mutating it never affects the
/// repository. Symbols are trimmed and lower-cased before use.
#[async_trait]
pub trait CryptoRepository: Send + Sync {
    async fn create(&self, symbol: &str) -> Result<Crypto, RepoError>;
    fn get(&self, symbol: &str) -> Result<Crypto, RepoError>;
    fn list(&self) -> Result<Vec<Crypto>, RepoError>;
    fn delete(&self, symbol: &str) -> Result<(), RepoError>;
    async fn refresh_price(&self, symbol: &str) -> Result<Crypto, RepoError>;
    fn history(&self, symbol: &str) -> Result<Vec<PriceRecord>, RepoError>;
    fn stats(&self, symbol: &str) -> Result<PriceStats, RepoError>;
}
