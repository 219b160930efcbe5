use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Confidence assumed when the forecast routine leaves `probability_up` empty.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// A row of the `predictions` table, written by `predict_trend_7days`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ForecastRecord {
    pub index_id: i32,
    pub trading_date: NaiveDate,
    pub model_version: String,
    pub predicted_up: bool,
    pub probability_up: Option<f64>,
}

impl ForecastRecord {
    pub fn confidence(&self) -> f64 {
        self.probability_up.unwrap_or(DEFAULT_CONFIDENCE)
    }
}

/// Direction summary over a symbol's upcoming forecast days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastOutlook {
    /// Every forecast day predicts an up move.
    Strong,
    /// At least one forecast day predicts a down move.
    DownsideWarning,
    NoData,
}

impl ForecastOutlook {
    pub fn from_records(records: &[ForecastRecord]) -> Self {
        if records.is_empty() {
            ForecastOutlook::NoData
        } else if records.iter().any(|r| !r.predicted_up) {
            ForecastOutlook::DownsideWarning
        } else {
            ForecastOutlook::Strong
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDay {
    pub trading_date: NaiveDate,
    pub predicted_up: bool,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolOutlook {
    pub symbol: String,
    pub outlook: ForecastOutlook,
    pub days: Vec<ForecastDay>,
}

impl SymbolOutlook {
    pub fn from_records(symbol: &str, records: &[ForecastRecord]) -> Self {
        Self {
            symbol: symbol.to_string(),
            outlook: ForecastOutlook::from_records(records),
            days: records
                .iter()
                .map(|r| ForecastDay {
                    trading_date: r.trading_date,
                    predicted_up: r.predicted_up,
                    confidence: r.confidence(),
                })
                .collect(),
        }
    }
}
