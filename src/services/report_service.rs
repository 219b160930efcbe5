use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use crate::models::{AlertSummary, ForecastOutlook, RunReport, Symbol, SymbolOutlook};
use crate::store::PipelineStore;

/// Days after the run date covered by the alert summary.
pub const ALERT_WINDOW_DAYS: i64 = 7;

/// Alerts dated from `as_of` through `as_of + 7 days`. Empty on error.
pub async fn collect_alerts(store: &dyn PipelineStore, as_of: NaiveDate) -> Vec<AlertSummary> {
    let until = as_of + Duration::days(ALERT_WINDOW_DAYS);

    match store.alerts_between(as_of, until).await {
        Ok(alerts) => {
            if alerts.is_empty() {
                info!("📊 No alerts generated between {} and {}", as_of, until);
            }
            for a in &alerts {
                info!(
                    "📊 {} | {} | {} | {} | Severity: {}",
                    a.trading_date, a.symbol, a.alert_type, a.message, a.severity
                );
            }
            alerts
        }
        Err(e) => {
            warn!("Failed to load alerts for the run report: {}", e);
            Vec::new()
        }
    }
}

/// Per-symbol direction summary of the upcoming forecast days.
pub async fn collect_outlook(
    store: &dyn PipelineStore,
    symbols: &[Symbol],
    as_of: NaiveDate,
    model_version: &str,
) -> Vec<SymbolOutlook> {
    let mut outlook = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        let records = match store
            .upcoming_forecasts(symbol.index_id, as_of, model_version)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to load forecasts for {}: {}", symbol.symbol, e);
                Vec::new()
            }
        };

        let summary = SymbolOutlook::from_records(&symbol.symbol, &records);
        match summary.outlook {
            ForecastOutlook::Strong => info!(
                "📈 {} is predicted to stay strong over the next {} days",
                symbol.symbol,
                summary.days.len()
            ),
            ForecastOutlook::DownsideWarning => warn!(
                "📉 {} is expected to go down on one or more of the next {} days",
                symbol.symbol,
                summary.days.len()
            ),
            ForecastOutlook::NoData => warn!("{}: No forecast data available", symbol.symbol),
        }
        outlook.push(summary);
    }

    outlook
}

/// One log line per symbol plus the overall tally.
pub fn log_summary(report: &RunReport) {
    for s in &report.symbols {
        info!(
            symbol = %s.symbol,
            rows_fetched = s.rows_fetched(),
            fetch = ?s.fetch,
            merge = ?s.merge,
            forecast = ?s.forecast,
            verification = ?s.verification,
            "run summary"
        );
    }

    info!(
        "🎉 Run as of {} finished with status {:?}: {} symbols, {} with failures, {} without a complete forecast",
        report.as_of,
        report.status,
        report.symbols.len(),
        report.failed_count(),
        report.incomplete_count()
    );
}
