//! Run report returned by the ingest/forecast job.
//!
//! One [`SymbolReport`] per tracked symbol records which stage succeeded,
//! which failed and which never ran, so consumers can tell "no data available"
//! apart from an actual error.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{AlertSummary, SymbolOutlook};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchStatus {
    Fetched { rows: usize },
    /// The provider answered with an empty series.
    NoData,
    FetchFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MergeStatus {
    Merged { staged: u64, merged: u64 },
    MergeFailed { reason: String },
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastStatus {
    Generated,
    ForecastFailed { reason: String },
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationStatus {
    Complete { count: i64 },
    Incomplete { count: i64, expected: i64 },
    /// More rows than the horizon, usually stale rows left by an earlier run.
    Surplus { count: i64, expected: i64 },
    Unverified { reason: String },
}

impl VerificationStatus {
    pub fn from_count(count: i64, expected: i64) -> Self {
        use std::cmp::Ordering;

        match count.cmp(&expected) {
            Ordering::Equal => VerificationStatus::Complete { count },
            Ordering::Less => VerificationStatus::Incomplete { count, expected },
            Ordering::Greater => VerificationStatus::Surplus { count, expected },
        }
    }

    pub fn actual_count(&self) -> Option<i64> {
        match self {
            VerificationStatus::Complete { count }
            | VerificationStatus::Incomplete { count, .. }
            | VerificationStatus::Surplus { count, .. } => Some(*count),
            VerificationStatus::Unverified { .. } => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, VerificationStatus::Complete { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolReport {
    pub index_id: i32,
    pub symbol: String,
    pub fetch: FetchStatus,
    pub merge: MergeStatus,
    pub forecast: ForecastStatus,
    pub verification: VerificationStatus,
}

impl SymbolReport {
    pub fn new(index_id: i32, symbol: &str) -> Self {
        Self {
            index_id,
            symbol: symbol.to_string(),
            fetch: FetchStatus::NoData,
            merge: MergeStatus::Skipped,
            forecast: ForecastStatus::NotAttempted,
            verification: VerificationStatus::Unverified {
                reason: "not checked".to_string(),
            },
        }
    }

    pub fn rows_fetched(&self) -> usize {
        match self.fetch {
            FetchStatus::Fetched { rows } => rows,
            _ => 0,
        }
    }

    pub fn has_failure(&self) -> bool {
        matches!(self.fetch, FetchStatus::FetchFailed { .. })
            || matches!(self.merge, MergeStatus::MergeFailed { .. })
            || matches!(self.forecast, ForecastStatus::ForecastFailed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Done,
    DoneWithFailures,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub as_of: NaiveDate,
    pub model_version: String,
    pub status: RunStatus,
    pub staging_cleared: bool,
    pub symbols: Vec<SymbolReport>,
    pub alerts: Vec<AlertSummary>,
    pub outlook: Vec<SymbolOutlook>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn symbol(&self, symbol: &str) -> Option<&SymbolReport> {
        self.symbols.iter().find(|s| s.symbol == symbol)
    }

    pub fn failed_count(&self) -> usize {
        self.symbols.iter().filter(|s| s.has_failure()).count()
    }

    pub fn incomplete_count(&self) -> usize {
        self.symbols
            .iter()
            .filter(|s| !s.verification.is_complete())
            .count()
    }

    pub fn resolve_status(staging_cleared: bool, symbols: &[SymbolReport]) -> RunStatus {
        if staging_cleared && !symbols.iter().any(SymbolReport::has_failure) {
            RunStatus::Done
        } else {
            RunStatus::DoneWithFailures
        }
    }
}
