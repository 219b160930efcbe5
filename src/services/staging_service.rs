//! Stage-and-merge of fetched bars, plus the end-of-run staging cleanup.
//!
//! Staging is scoped to a whole run: every symbol's batch is staged and merged
//! inside one transaction, and the staging table is emptied exactly once after
//! the last symbol regardless of what failed.

use std::collections::BTreeMap;

use tracing::{error, info, warn};

use crate::models::{MergeStatus, PricePoint, Symbol};
use crate::store::PipelineStore;

/// Sort a fetched batch by date and keep only the last bar seen per date.
pub fn normalize(symbol: &str, points: Vec<PricePoint>) -> Vec<PricePoint> {
    let mut by_date: BTreeMap<_, PricePoint> = BTreeMap::new();
    for mut p in points {
        p.symbol = symbol.to_string();
        by_date.insert(p.trading_date, p);
    }
    by_date.into_values().collect()
}

pub async fn stage_and_merge(
    store: &dyn PipelineStore,
    symbol: &Symbol,
    points: Vec<PricePoint>,
) -> MergeStatus {
    let batch = normalize(&symbol.symbol, points);

    match store.stage_and_merge(&symbol.symbol, &batch).await {
        Ok(counts) => {
            if counts.merged < counts.staged {
                warn!(
                    "⚠️ Only {} of {} staged rows for {} resolved to index {}",
                    counts.merged, counts.staged, symbol.symbol, symbol.index_id
                );
            }
            info!(
                "💾 Merged {} rows for {} into index_prices",
                counts.merged, symbol.symbol
            );
            MergeStatus::Merged {
                staged: counts.staged,
                merged: counts.merged,
            }
        }
        Err(e) => {
            error!("❌ Stage/merge failed for {}: {}", symbol.symbol, e);
            MergeStatus::MergeFailed {
                reason: e.to_string(),
            }
        }
    }
}

/// Empty the staging table. Returns whether it was cleared.
pub async fn clear(store: &dyn PipelineStore) -> bool {
    match store.clear_staging().await {
        Ok(()) => {
            info!("🧹 Staging table cleared");
            true
        }
        Err(e) => {
            error!("❌ Failed to clear staging table: {}", e);
            false
        }
    }
}
