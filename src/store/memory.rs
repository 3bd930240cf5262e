use crate::core::crypto::{Crypto, PriceRecord, normalize_symbol};
use crate::core::error::RepoError;
use crate::core::lookup::PriceLookup;
use crate::core::repository::CryptoRepository;
use crate::core::stats::PriceStats;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, instrument};

/// In-memory repository using a HashMap behind a single Mutex.
///
/// The lock is only taken for map access and is never held across a price
/// lookup. Operations that straddle a lookup check existence again once the
/// lock is re-acquired, and that second check decides the outcome.
pub struct MemoryCryptoRepo {
    entries: Mutex<HashMap<String, Crypto>>,
    lookup: Arc<dyn PriceLookup>,
}

impl MemoryCryptoRepo {
    /// Creates an empty repository backed by `lookup` for names and prices.
    pub fn new(lookup: Arc<dyn PriceLookup>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            lookup,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Crypto>> {
        // Critical sections never panic midway through a mutation, so the map is
        // consistent even if another thread panicked while holding the guard.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn contains(&self, symbol: &str) -> bool {
        self.entries().contains_key(symbol)
    }
}

fn normalized(symbol: &str) -> Result<String, RepoError> {
    let symbol = normalize_symbol(symbol);
    if symbol.is_empty() {
        return Err(RepoError::InvalidSymbol(None));
    }
    Ok(symbol)
}

#[async_trait]
impl CryptoRepository for MemoryCryptoRepo {
    #[instrument(name = "CryptoCreate", skip(self))]
    async fn create(&self, symbol: &str) -> Result<Crypto, RepoError> {
        let symbol = normalized(symbol)?;

        // Cheap rejection before paying for the lookups.
        if self.contains(&symbol) {
            return Err(RepoError::AlreadyExists);
        }

        let name = self
            .lookup
            .lookup_name(&symbol)
            .await
            .map_err(RepoError::from_name_lookup)?;
        let price = self
            .lookup
            .lookup_price(&symbol)
            .await
            .map_err(RepoError::from_price_lookup)?;

        let crypto = Crypto::new(symbol.clone(), name, price, Utc::now());

        let mut entries = self.entries();
        if entries.contains_key(&symbol) {
            return Err(RepoError::AlreadyExists);
        }
        entries.insert(symbol, crypto.clone());
        debug!(price, "Created crypto");

        Ok(crypto)
    }

    fn get(&self, symbol: &str) -> Result<Crypto, RepoError> {
        let symbol = normalized(symbol)?;
        self.entries()
            .get(&symbol)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    fn list(&self) -> Result<Vec<Crypto>, RepoError> {
        Ok(self.entries().values().cloned().collect())
    }

    fn delete(&self, symbol: &str) -> Result<(), RepoError> {
        let symbol = normalized(symbol)?;
        if self.entries().remove(&symbol).is_none() {
            return Err(RepoError::NotFound);
        }
        debug!(%symbol, "Deleted crypto");
        Ok(())
    }

    #[instrument(name = "CryptoRefresh", skip(self))]
    async fn refresh_price(&self, symbol: &str) -> Result<Crypto, RepoError> {
        let symbol = normalized(symbol)?;

        if !self.contains(&symbol) {
            return Err(RepoError::NotFound);
        }

        let price = self
            .lookup
            .lookup_price(&symbol)
            .await
            .map_err(RepoError::from_price_lookup)?;

        let mut entries = self.entries();
        // May have been deleted while the lookup was in flight.
        let crypto = entries.get_mut(&symbol).ok_or(RepoError::NotFound)?;
        // Stamped under the lock so appends stay in commit order.
        crypto.push_price(price, Utc::now());
        debug!(
            price,
            records = crypto.history.len(),
            "Refreshed crypto price"
        );

        Ok(crypto.clone())
    }

    fn history(&self, symbol: &str) -> Result<Vec<PriceRecord>, RepoError> {
        let symbol = normalized(symbol)?;
        self.entries()
            .get(&symbol)
            .map(|crypto| crypto.history.clone())
            .ok_or(RepoError::NotFound)
    }

    fn stats(&self, symbol: &str) -> Result<PriceStats, RepoError> {
        let symbol = normalized(symbol)?;
        let crypto = self
            .entries()
            .get(&symbol)
            .cloned()
            .ok_or(RepoError::NotFound)?;

        Ok(PriceStats::from_history(&crypto.history))
    }
}
