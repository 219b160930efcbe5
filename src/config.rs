use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;

use crate::errors::AppError;

pub const DEFAULT_ALPHAVANTAGE_BASE_URL: &str = "https://www.alphavantage.co";
pub const DEFAULT_MODEL_VERSION: &str = "v7";
pub const DEFAULT_HORIZON_DAYS: i64 = 7;

/// Runtime settings for one pipeline run, read from the environment.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub run_migrations: bool,
    pub provider: ProviderConfig,
    pub fetch_concurrency: usize,
    pub model_version: String,
    pub horizon_days: i64,
    pub forecast_timeout: Duration,
    /// Overrides the run date, otherwise today in local time.
    pub as_of_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub requests_per_minute: Option<u32>,
    pub max_retries: u32,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::Config(format!("{} not set", key)))
        };

        let provider = ProviderConfig {
            api_key: required("ALPHAVANTAGE_API_KEY")?,
            base_url: lookup("ALPHAVANTAGE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ALPHAVANTAGE_BASE_URL.to_string()),
            timeout: Duration::from_secs(parse_or(&lookup, "PROVIDER_TIMEOUT_SECS", 30)?),
            requests_per_minute: parse_opt(&lookup, "PROVIDER_REQUESTS_PER_MINUTE")?
                .filter(|rpm: &u32| *rpm > 0),
            max_retries: parse_or(&lookup, "PROVIDER_MAX_RETRIES", 0)?,
        };

        let as_of_date = match lookup("AS_OF_DATE") {
            Some(raw) => Some(NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
                AppError::Config(format!("AS_OF_DATE '{}' is not YYYY-MM-DD: {}", raw, e))
            })?),
            None => None,
        };

        let fetch_concurrency: usize = parse_or(&lookup, "FETCH_CONCURRENCY", 1)?;
        let horizon_days: i64 = parse_or(&lookup, "FORECAST_HORIZON_DAYS", DEFAULT_HORIZON_DAYS)?;
        if horizon_days <= 0 {
            return Err(AppError::Config("FORECAST_HORIZON_DAYS must be positive".into()));
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout: Duration::from_secs(parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 30)?),
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", false)?,
            provider,
            fetch_concurrency: fetch_concurrency.max(1),
            model_version: lookup("FORECAST_MODEL_VERSION")
                .unwrap_or_else(|| DEFAULT_MODEL_VERSION.to_string()),
            horizon_days,
            forecast_timeout: Duration::from_secs(parse_or(&lookup, "FORECAST_TIMEOUT_SECS", 120)?),
            as_of_date,
        })
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

fn parse_opt<F, T>(lookup: &F, key: &str) -> Result<Option<T>, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::Config(format!("invalid {} '{}': {}", key, raw, e))),
        None => Ok(None),
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}
