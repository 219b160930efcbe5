//! Persistence boundary of the pipeline.
//!
//! The pipeline only needs a handful of operations from the relational store;
//! they are collected in [`PipelineStore`] so the services take one explicit
//! handle instead of reaching for a shared connection.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::AppError;
use crate::models::{AlertSummary, ForecastRecord, PricePoint, Symbol};

pub mod postgres;
#[cfg(test)]
pub mod memory;

pub use postgres::PgStore;

/// Row counts reported by a stage+merge of one symbol's batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeCounts {
    pub staged: u64,
    pub merged: u64,
}

#[async_trait]
pub trait PipelineStore: Send + Sync {
    async fn load_symbols(&self) -> Result<Vec<Symbol>, AppError>;

    /// Stage `points` for `symbol` and merge them into the permanent price
    /// table. Either both phases commit or neither does.
    async fn stage_and_merge(
        &self,
        symbol: &str,
        points: &[PricePoint],
    ) -> Result<MergeCounts, AppError>;

    async fn clear_staging(&self) -> Result<(), AppError>;

    async fn run_forecast(&self, index_id: i32, as_of: NaiveDate) -> Result<(), AppError>;

    async fn count_forecasts(
        &self,
        index_id: i32,
        as_of: NaiveDate,
        model_version: &str,
    ) -> Result<i64, AppError>;

    async fn upcoming_forecasts(
        &self,
        index_id: i32,
        as_of: NaiveDate,
        model_version: &str,
    ) -> Result<Vec<ForecastRecord>, AppError>;

    async fn alerts_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AlertSummary>, AppError>;
}
