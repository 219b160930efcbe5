use chrono::NaiveDate;
use tracing::{info, warn};

use crate::models::VerificationStatus;
use crate::store::PipelineStore;

/// Count forecast rows after `as_of` and compare against the horizon.
/// Read-only; a failed count is reported as unverified.
pub async fn check(
    store: &dyn PipelineStore,
    index_id: i32,
    symbol: &str,
    as_of: NaiveDate,
    model_version: &str,
    expected: i64,
) -> VerificationStatus {
    let status = match store.count_forecasts(index_id, as_of, model_version).await {
        Ok(count) => VerificationStatus::from_count(count, expected),
        Err(e) => VerificationStatus::Unverified {
            reason: e.to_string(),
        },
    };

    match &status {
        VerificationStatus::Complete { .. } => {
            info!("{}: ✅ {}-day forecast present", symbol, expected)
        }
        VerificationStatus::Incomplete { count, .. } => {
            warn!("{}: ⚠️ Only {} of {} forecast(s) present", symbol, count, expected)
        }
        VerificationStatus::Surplus { count, .. } => warn!(
            "{}: ⚠️ {} forecast rows for {} found, expected {} (stale rows?)",
            symbol, count, model_version, expected
        ),
        VerificationStatus::Unverified { reason } => {
            warn!("{}: ⚠️ Could not verify forecasts: {}", symbol, reason)
        }
    }

    status
}
