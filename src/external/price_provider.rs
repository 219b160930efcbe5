use async_trait::async_trait;
use thiserror::Error;

use crate::models::PricePoint;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited: {0}")]
    RateLimited(String),
}

impl PriceProviderError {
    /// Provider-supplied (or transport) diagnostic without the category prefix.
    pub fn diagnostic(&self) -> &str {
        match self {
            PriceProviderError::Network(msg)
            | PriceProviderError::BadResponse(msg)
            | PriceProviderError::Parse(msg)
            | PriceProviderError::RateLimited(msg) => msg,
        }
    }
}

/// Source of daily bars for a single symbol.
///
/// An `Ok` with an empty vector means the provider answered but had no rows;
/// any payload without a time series must come back as an `Err`.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_daily_series(
        &self,
        symbol: &str,
    ) -> Result<Vec<PricePoint>, PriceProviderError>;
}
