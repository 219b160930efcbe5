use chrono::NaiveDate;
use tokio::time::{timeout, Duration};
use tracing::{error, info};

use crate::models::ForecastStatus;
use crate::store::PipelineStore;

/// Run the forecast routine for one index. Failures and timeouts are
/// recorded, never propagated, and never retried.
pub async fn invoke(
    store: &dyn PipelineStore,
    index_id: i32,
    symbol: &str,
    as_of: NaiveDate,
    limit: Duration,
) -> ForecastStatus {
    match timeout(limit, store.run_forecast(index_id, as_of)).await {
        Ok(Ok(())) => {
            info!("🔮 Forecast generated for {} as of {}", symbol, as_of);
            ForecastStatus::Generated
        }
        Ok(Err(e)) => {
            error!("❌ Forecast procedure failed for {}: {}", symbol, e);
            ForecastStatus::ForecastFailed {
                reason: e.to_string(),
            }
        }
        Err(_) => {
            error!("❌ Forecast procedure for {} timed out after {:?}", symbol, limit);
            ForecastStatus::ForecastFailed {
                reason: format!("timed out after {:?}", limit),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::models::{AlertSummary, ForecastRecord, PricePoint, Symbol};
    use crate::store::memory::MemoryStore;
    use crate::store::MergeCounts;
    use async_trait::async_trait;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[tokio::test]
    async fn test_success_is_generated() {
        let store = MemoryStore::new(vec![Symbol::new(1, "AAA")]);
        let status = invoke(&store, 1, "AAA", as_of(), Duration::from_secs(1)).await;

        assert_eq!(status, ForecastStatus::Generated);
        assert_eq!(store.forecast_calls(), vec![(1, as_of())]);
    }

    #[tokio::test]
    async fn test_routine_error_is_recorded() {
        let store = MemoryStore::new(vec![Symbol::new(1, "AAA")])
            .fail_forecast_for(1, "insufficient price history");
        let status = invoke(&store, 1, "AAA", as_of(), Duration::from_secs(1)).await;

        match status {
            ForecastStatus::ForecastFailed { reason } => {
                assert!(reason.contains("insufficient price history"))
            }
            other => panic!("unexpected status {:?}", other),
        }
    }

    struct HangingStore;

    #[async_trait]
    impl PipelineStore for HangingStore {
        async fn load_symbols(&self) -> Result<Vec<Symbol>, AppError> {
            Ok(vec![])
        }
        async fn stage_and_merge(&self, _: &str, _: &[PricePoint]) -> Result<MergeCounts, AppError> {
            Ok(MergeCounts { staged: 0, merged: 0 })
        }
        async fn clear_staging(&self) -> Result<(), AppError> {
            Ok(())
        }
        async fn run_forecast(&self, _: i32, _: NaiveDate) -> Result<(), AppError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
        async fn count_forecasts(&self, _: i32, _: NaiveDate, _: &str) -> Result<i64, AppError> {
            Ok(0)
        }
        async fn upcoming_forecasts(
            &self,
            _: i32,
            _: NaiveDate,
            _: &str,
        ) -> Result<Vec<ForecastRecord>, AppError> {
            Ok(vec![])
        }
        async fn alerts_between(&self, _: NaiveDate, _: NaiveDate) -> Result<Vec<AlertSummary>, AppError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_timeout_is_a_failure() {
        let status = invoke(&HangingStore, 1, "AAA", as_of(), Duration::from_millis(20)).await;
        assert!(matches!(status, ForecastStatus::ForecastFailed { .. }));
    }
}
