use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::PricePoint;
use crate::services::rate_limiter::RateLimiter;

/// Result of asking the provider for one symbol. Never an `Err`: a failed
/// fetch only skips that symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(Vec<PricePoint>),
    NoData,
    Failed(PriceProviderError),
}

/// Retry policy for throttled provider responses. Zero retries means one call
/// per symbol per run.
#[derive(Debug, Clone, Copy)]
pub struct FetchPolicy {
    pub max_retries: u32,
    pub backoff_step: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff_step: Duration::from_secs(5),
        }
    }
}

pub async fn fetch_symbol(
    provider: &dyn PriceProvider,
    rate_limiter: Option<&RateLimiter>,
    symbol: &str,
    policy: FetchPolicy,
) -> FetchOutcome {
    let mut retry_count = 0;

    loop {
        let guard = match rate_limiter {
            Some(limiter) => match limiter.acquire().await {
                Some(guard) => Some(guard),
                None => {
                    return FetchOutcome::Failed(PriceProviderError::Network(
                        "rate limiter closed".to_string(),
                    ))
                }
            },
            None => None,
        };

        match provider.fetch_daily_series(symbol).await {
            Ok(points) if points.is_empty() => {
                warn!("⚠️ Provider returned no rows for {}", symbol);
                return FetchOutcome::NoData;
            }
            Ok(points) => {
                info!("📥 Fetched {} daily bars for {}", points.len(), symbol);
                return FetchOutcome::Fetched(points);
            }
            Err(PriceProviderError::RateLimited(note)) if retry_count < policy.max_retries => {
                retry_count += 1;
                let delay = policy.backoff_step * retry_count;
                warn!(
                    "Rate limited for {} ({}), retrying in {:?} (attempt {}/{})",
                    symbol, note, delay, retry_count, policy.max_retries
                );
                drop(guard);
                sleep(delay).await;
            }
            Err(e) => {
                error!("❌ Error fetching data for {}: {}", symbol, e);
                return FetchOutcome::Failed(e);
            }
        }
    }
}
