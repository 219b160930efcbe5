use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Alert joined to its symbol name for the run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AlertSummary {
    pub symbol: String,
    pub trading_date: NaiveDate,
    pub alert_type: String,
    pub message: String,
    pub severity: String,
}
