//! Error kinds surfaced by the repository and its price lookup.

use thiserror::Error;

/// Failure reported by a [`PriceLookup`](crate::core::lookup::PriceLookup).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("bad response: {0}")]
    BadResponse(String),
}

#[derive(Debug, Error)]
pub enum RepoError {
    /// Blank input carries no detail; an unknown name carries the lookup failure.
    #[error("invalid symbol{}", .0.as_ref().map(|e| format!(": {e}")).unwrap_or_default())]
    InvalidSymbol(#[source] Option<LookupError>),
    #[error("crypto already exists")]
    AlreadyExists,
    #[error("crypto not found")]
    NotFound,
    #[error("price unavailable: {0}")]
    PriceUnavailable(#[source] LookupError),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(#[source] LookupError),
}

impl RepoError {
    /// Maps a failed name lookup. An unknown name means the symbol itself is invalid.
    pub fn from_name_lookup(err: LookupError) -> Self {
        match err {
            LookupError::NotFound(_) => RepoError::InvalidSymbol(Some(err)),
            LookupError::ServiceUnavailable(_) | LookupError::BadResponse(_) => {
                RepoError::ServiceUnavailable(err)
            }
        }
    }

    /// Maps a failed price lookup.
    pub fn from_price_lookup(err: LookupError) -> Self {
        match err {
            LookupError::NotFound(_) => RepoError::PriceUnavailable(err),
            LookupError::ServiceUnavailable(_) | LookupError::BadResponse(_) => {
                RepoError::ServiceUnavailable(err)
            }
        }
    }
}
