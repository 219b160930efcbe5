use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use parking_lot::Mutex;

use crate::errors::AppError;
use crate::models::{AlertSummary, ForecastRecord, PricePoint, Symbol};
use crate::store::{MergeCounts, PipelineStore};

/// A row of the `alerts` table. Alerts are written outside the pipeline, so
/// tests seed them directly.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRecord {
    pub index_id: i32,
    pub trading_date: NaiveDate,
    pub alert_type: String,
    pub message: String,
    pub severity: String,
}

/// In-process store with the same upsert and join rules as the Postgres schema.
pub struct MemoryStore {
    model_version: String,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    symbols: Vec<Symbol>,
    staging: BTreeMap<(String, NaiveDate), (f64, i64)>,
    index_prices: BTreeMap<(i32, NaiveDate), (f64, i64)>,
    predictions: Vec<ForecastRecord>,
    alerts: Vec<AlertRecord>,
    forecast_calls: Vec<(i32, NaiveDate)>,
    forecast_rows: HashMap<i32, usize>,
    failing_merges: HashSet<String>,
    failing_forecasts: HashMap<i32, String>,
    symbols_unavailable: bool,
    clear_fails: bool,
    forecast_delay: Option<std::time::Duration>,
}

impl MemoryStore {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self {
            model_version: "v7".to_string(),
            state: Mutex::new(State {
                symbols,
                ..State::default()
            }),
        }
    }

    pub fn fail_merge_for(self, symbol: &str) -> Self {
        self.state.lock().failing_merges.insert(symbol.to_string());
        self
    }

    pub fn fail_forecast_for(self, index_id: i32, reason: &str) -> Self {
        self.state
            .lock()
            .failing_forecasts
            .insert(index_id, reason.to_string());
        self
    }

    /// Number of rows the fake routine writes for `index_id` (default 7).
    pub fn forecast_rows_for(self, index_id: i32, rows: usize) -> Self {
        self.state.lock().forecast_rows.insert(index_id, rows);
        self
    }

    /// Make the fake routine take `delay` before writing its rows.
    pub fn forecast_delay(self, delay: std::time::Duration) -> Self {
        self.state.lock().forecast_delay = Some(delay);
        self
    }

    pub fn symbols_unavailable(self) -> Self {
        self.state.lock().symbols_unavailable = true;
        self
    }

    pub fn clear_fails(self) -> Self {
        self.state.lock().clear_fails = true;
        self
    }

    pub fn insert_prediction(&self, record: ForecastRecord) {
        self.state.lock().predictions.push(record);
    }

    pub fn insert_alert(&self, alert: AlertRecord) {
        self.state.lock().alerts.push(alert);
    }

    pub fn staging_len(&self) -> usize {
        self.state.lock().staging.len()
    }

    pub fn staging_row(&self, symbol: &str, date: NaiveDate) -> Option<(f64, i64)> {
        self.state
            .lock()
            .staging
            .get(&(symbol.to_string(), date))
            .copied()
    }

    /// `(trading_date, close_price, volume)` rows of `index_prices` for one index.
    pub fn index_prices(&self, index_id: i32) -> Vec<(NaiveDate, f64, i64)> {
        self.state
            .lock()
            .index_prices
            .iter()
            .filter(|((id, _), _)| *id == index_id)
            .map(|((_, date), (close, volume))| (*date, *close, *volume))
            .collect()
    }

    pub fn forecast_calls(&self) -> Vec<(i32, NaiveDate)> {
        self.state.lock().forecast_calls.clone()
    }

    fn stage(state: &mut State, symbol: &str, points: &[PricePoint]) -> u64 {
        for p in points {
            state
                .staging
                .insert((symbol.to_string(), p.trading_date), (p.close_price, p.volume));
        }
        points.len() as u64
    }

    fn merge(state: &mut State, symbol: &str) -> u64 {
        let index_ids: Vec<i32> = state
            .symbols
            .iter()
            .filter(|s| s.symbol == symbol)
            .map(|s| s.index_id)
            .collect();

        let rows: Vec<(NaiveDate, (f64, i64))> = state
            .staging
            .iter()
            .filter(|((sym, _), _)| sym == symbol)
            .map(|((_, date), values)| (*date, *values))
            .collect();

        let mut merged = 0;
        for index_id in index_ids {
            for (date, values) in &rows {
                state.index_prices.insert((index_id, *date), *values);
                merged += 1;
            }
        }
        merged
    }
}

#[async_trait]
impl PipelineStore for MemoryStore {
    async fn load_symbols(&self) -> Result<Vec<Symbol>, AppError> {
        let state = self.state.lock();
        if state.symbols_unavailable {
            return Err(AppError::Connection("indices table unavailable".to_string()));
        }
        Ok(state.symbols.clone())
    }

    async fn stage_and_merge(
        &self,
        symbol: &str,
        points: &[PricePoint],
    ) -> Result<MergeCounts, AppError> {
        let mut state = self.state.lock();
        // Nothing is applied on failure, mirroring a rolled-back transaction.
        if state.failing_merges.contains(symbol) {
            return Err(AppError::Persistence(format!(
                "unique constraint violation while merging {}",
                symbol
            )));
        }

        let staged = Self::stage(&mut state, symbol, points);
        let merged = Self::merge(&mut state, symbol);
        Ok(MergeCounts { staged, merged })
    }

    async fn clear_staging(&self) -> Result<(), AppError> {
        let mut state = self.state.lock();
        if state.clear_fails {
            return Err(AppError::Persistence("lock timeout on staging table".to_string()));
        }
        state.staging.clear();
        Ok(())
    }

    async fn run_forecast(&self, index_id: i32, as_of: NaiveDate) -> Result<(), AppError> {
        let delay = self.state.lock().forecast_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        state.forecast_calls.push((index_id, as_of));

        if let Some(reason) = state.failing_forecasts.get(&index_id) {
            return Err(AppError::Forecast(reason.clone()));
        }

        let rows = state.forecast_rows.get(&index_id).copied().unwrap_or(7);
        let model_version = self.model_version.clone();
        state.predictions.retain(|p| {
            !(p.index_id == index_id && p.model_version == model_version && p.trading_date > as_of)
        });
        for day in 1..=rows as i64 {
            state.predictions.push(ForecastRecord {
                index_id,
                trading_date: as_of + Duration::days(day),
                model_version: model_version.clone(),
                predicted_up: day % 3 != 0,
                probability_up: Some(0.6),
            });
        }
        Ok(())
    }

    async fn count_forecasts(
        &self,
        index_id: i32,
        as_of: NaiveDate,
        model_version: &str,
    ) -> Result<i64, AppError> {
        let state = self.state.lock();
        Ok(state
            .predictions
            .iter()
            .filter(|p| {
                p.index_id == index_id && p.trading_date > as_of && p.model_version == model_version
            })
            .count() as i64)
    }

    async fn upcoming_forecasts(
        &self,
        index_id: i32,
        as_of: NaiveDate,
        model_version: &str,
    ) -> Result<Vec<ForecastRecord>, AppError> {
        let state = self.state.lock();
        let mut records: Vec<ForecastRecord> = state
            .predictions
            .iter()
            .filter(|p| {
                p.index_id == index_id && p.trading_date > as_of && p.model_version == model_version
            })
            .cloned()
            .collect();
        records.sort_by_key(|r| r.trading_date);
        Ok(records)
    }

    async fn alerts_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AlertSummary>, AppError> {
        let guard = self.state.lock();
        let state: &State = &guard;
        let mut alerts: Vec<AlertSummary> = state
            .alerts
            .iter()
            .filter(|a| a.trading_date >= from && a.trading_date <= to)
            .flat_map(|a| {
                state
                    .symbols
                    .iter()
                    .filter(move |s| s.index_id == a.index_id)
                    .map(move |s| AlertSummary {
                        symbol: s.symbol.clone(),
                        trading_date: a.trading_date,
                        alert_type: a.alert_type.clone(),
                        message: a.message.clone(),
                        severity: a.severity.clone(),
                    })
            })
            .collect();
        alerts.sort_by(|a, b| {
            a.trading_date
                .cmp(&b.trading_date)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        Ok(alerts)
    }
}
