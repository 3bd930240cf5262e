//! Core domain types and abstractions

pub mod config;
pub mod crypto;
pub mod error;
pub mod log;
pub mod lookup;
pub mod repository;
pub mod stats;

// Re-export main types for cleaner imports
pub use crypto::{Crypto, MAX_HISTORY, PriceRecord};
pub use error::{LookupError, RepoError};
pub use lookup::PriceLookup;
pub use repository::CryptoRepository;
pub use stats::PriceStats;
