use std::sync::Arc;

use chrono::NaiveDate;
use tokio::time::Duration;

use crate::config::PipelineConfig;
use crate::external::price_provider::PriceProvider;
use crate::services::price_service::FetchPolicy;
use crate::services::rate_limiter::RateLimiter;
use crate::store::PipelineStore;

/// Settings fixed for the duration of one run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub as_of: NaiveDate,
    pub model_version: String,
    pub horizon_days: i64,
    pub forecast_timeout: Duration,
    pub fetch_concurrency: usize,
    pub fetch_policy: FetchPolicy,
}

// Handles passed to the pipeline job
#[derive(Clone)]
pub struct PipelineContext {
    pub store: Arc<dyn PipelineStore>,
    pub price_provider: Arc<dyn PriceProvider>,
    pub rate_limiter: Option<Arc<RateLimiter>>,
    pub settings: RunSettings,
}

impl PipelineContext {
    pub fn from_config(
        config: &PipelineConfig,
        store: Arc<dyn PipelineStore>,
        price_provider: Arc<dyn PriceProvider>,
    ) -> Self {
        let rate_limiter = config
            .provider
            .requests_per_minute
            .map(|rpm| Arc::new(RateLimiter::new(config.fetch_concurrency, rpm)));

        Self {
            store,
            price_provider,
            rate_limiter,
            settings: RunSettings {
                as_of: config.as_of(),
                model_version: config.model_version.clone(),
                horizon_days: config.horizon_days,
                forecast_timeout: config.forecast_timeout,
                fetch_concurrency: config.fetch_concurrency,
                fetch_policy: FetchPolicy {
                    max_retries: config.provider.max_retries,
                    ..FetchPolicy::default()
                },
            },
        }
    }
}
