//! Ingest & Forecast Job
//!
//! One invocation processes every tracked index once and exits. There is no
//! schedule; an external scheduler (cron, CI) decides when to run it.
//!
//! # Processing Strategy
//!
//! 1. Load the tracked indices from `indices` (fatal if unavailable)
//! 2. For each index, in load order:
//!    - Fetch daily bars from the price provider
//!    - Skip the index when the provider had no data or returned an error
//!    - Stage the bars and merge them into `index_prices` in one transaction
//!    - Call `predict_trend_7days` for the index and run date
//! 3. Truncate `staging_index_prices` once, whatever happened above
//! 4. Count the forecast rows written for each index against the horizon
//! 5. Attach upcoming alerts and the forecast outlook, then return the report
//!
//! # Error Handling
//!
//! - A failure at any step for one index only stops that index
//! - Nothing is retried except throttled provider calls, when configured
//! - Only a missing symbol list aborts the run
//!
//! # Concurrency
//!
//! With `FETCH_CONCURRENCY > 1`, provider requests for up to that many
//! indices are outstanding at once. Each request runs on its own task, so a
//! response is read to completion while the current index is still being
//! merged or forecast. Results are consumed in load order and the stage,
//! merge and forecast steps never overlap.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{FuturesOrdered, StreamExt};
use tracing::{error, info, info_span, warn, Instrument};

use crate::errors::AppError;
use crate::external::price_provider::PriceProviderError;
use crate::models::{FetchStatus, MergeStatus, RunReport, Symbol, SymbolReport};
use crate::services::price_service::{self, FetchOutcome};
use crate::services::{forecast_service, report_service, staging_service, verification_service};
use crate::state::PipelineContext;

/// Run the full pipeline once.
///
/// # Returns
///
/// * `Ok(RunReport)` - The run reached a terminal state; see `RunReport::status`
/// * `Err(AppError)` - The symbol list could not be loaded
pub async fn run(ctx: &PipelineContext) -> Result<RunReport, AppError> {
    let started_at = Utc::now();
    let settings = &ctx.settings;
    info!(
        "🚀 Starting ingest/forecast run as of {} (model {})",
        settings.as_of, settings.model_version
    );

    let symbols = ctx.store.load_symbols().await.map_err(|e| {
        error!("Cannot load tracked indices: {}", e);
        AppError::Connection(format!("cannot load symbol list: {}", e))
    })?;

    if symbols.is_empty() {
        warn!("⚠️ No symbols found in `indices` table");
    } else {
        info!("Found {} symbols to process", symbols.len());
    }

    let mut reports: Vec<SymbolReport> = symbols
        .iter()
        .map(|s| SymbolReport::new(s.index_id, &s.symbol))
        .collect();

    let mut queued = symbols.iter().enumerate();
    let mut fetches = FuturesOrdered::new();
    for (position, symbol) in queued.by_ref().take(settings.fetch_concurrency.max(1)) {
        fetches.push_back(spawn_fetch(ctx, position, symbol));
    }

    while let Some((position, outcome)) = fetches.next().await {
        let symbol = &symbols[position];
        let span = info_span!("symbol", symbol = %symbol.symbol, index_id = symbol.index_id);
        process_symbol(ctx, symbol, outcome, &mut reports[position])
            .instrument(span)
            .await;

        if let Some((position, symbol)) = queued.next() {
            fetches.push_back(spawn_fetch(ctx, position, symbol));
        }
    }

    let staging_cleared = staging_service::clear(ctx.store.as_ref()).await;

    for (symbol, report) in symbols.iter().zip(reports.iter_mut()) {
        report.verification = verification_service::check(
            ctx.store.as_ref(),
            symbol.index_id,
            &symbol.symbol,
            settings.as_of,
            &settings.model_version,
            settings.horizon_days,
        )
        .await;
    }

    let alerts = report_service::collect_alerts(ctx.store.as_ref(), settings.as_of).await;
    let outlook = report_service::collect_outlook(
        ctx.store.as_ref(),
        &symbols,
        settings.as_of,
        &settings.model_version,
    )
    .await;

    let report = RunReport {
        as_of: settings.as_of,
        model_version: settings.model_version.clone(),
        status: RunReport::resolve_status(staging_cleared, &reports),
        staging_cleared,
        symbols: reports,
        alerts,
        outlook,
        started_at,
        finished_at: Utc::now(),
    };

    report_service::log_summary(&report);
    Ok(report)
}

/// Start the provider call for `symbol` on its own task and return a future
/// resolving to its load position and outcome.
fn spawn_fetch(
    ctx: &PipelineContext,
    position: usize,
    symbol: &Symbol,
) -> impl Future<Output = (usize, FetchOutcome)> {
    let provider = Arc::clone(&ctx.price_provider);
    let limiter = ctx.rate_limiter.clone();
    let policy = ctx.settings.fetch_policy;
    let name = symbol.symbol.clone();
    let span = info_span!("fetch", symbol = %name);

    let handle = tokio::spawn(
        async move {
            price_service::fetch_symbol(provider.as_ref(), limiter.as_deref(), &name, policy).await
        }
        .instrument(span),
    );

    async move {
        let outcome = handle.await.unwrap_or_else(|e| {
            error!("Fetch task failed: {}", e);
            FetchOutcome::Failed(PriceProviderError::Network(format!("fetch task failed: {}", e)))
        });
        (position, outcome)
    }
}

/// Fetch outcome → stage/merge → forecast for one symbol.
async fn process_symbol(
    ctx: &PipelineContext,
    symbol: &Symbol,
    outcome: FetchOutcome,
    report: &mut SymbolReport,
) {
    let points = match outcome {
        FetchOutcome::Fetched(points) => {
            report.fetch = FetchStatus::Fetched { rows: points.len() };
            points
        }
        FetchOutcome::NoData => {
            report.fetch = FetchStatus::NoData;
            info!("Skipping {}: no data available", symbol.symbol);
            return;
        }
        FetchOutcome::Failed(e) => {
            report.fetch = FetchStatus::FetchFailed {
                reason: e.to_string(),
            };
            warn!("Skipping {}: fetch failed ({})", symbol.symbol, e.diagnostic());
            return;
        }
    };

    report.merge = staging_service::stage_and_merge(ctx.store.as_ref(), symbol, points).await;
    if !matches!(report.merge, MergeStatus::Merged { .. }) {
        // Forecasting on stale history would hide the failed merge.
        return;
    }

    report.forecast = forecast_service::invoke(
        ctx.store.as_ref(),
        symbol.index_id,
        &symbol.symbol,
        ctx.settings.as_of,
        ctx.settings.forecast_timeout,
    )
    .await;
}
