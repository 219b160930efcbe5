use crate::config::ProviderConfig;
use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::PricePoint;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

const TIME_SERIES_KEY: &str = "Time Series (Daily)";
// Longest raw body echoed back as a diagnostic
const MAX_DIAGNOSTIC_LEN: usize = 300;

pub struct AlphaVantageProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Result<Self, PriceProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, PriceProviderError> {
        Self::new(config.api_key.clone(), config.base_url.clone(), config.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Deserialize)]
struct AvDailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<BTreeMap<String, AvDailyBar>>,

    // Throttle response:
    // { "Note": "Thank you for using Alpha Vantage! ... 5 calls per minute ..." }
    #[serde(rename = "Note")]
    note: Option<String>,

    // Newer throttle / premium-endpoint response
    #[serde(rename = "Information")]
    information: Option<String>,

    // { "Error Message": "Invalid API call. ..." }
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvDailyBar {
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    async fn fetch_daily_series(
        &self,
        symbol: &str,
    ) -> Result<Vec<PricePoint>, PriceProviderError> {
        let url = format!("{}/query", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
                ("outputsize", "compact"),
            ])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(PriceProviderError::BadResponse(format!(
                "HTTP {}: {}",
                status,
                truncate(&body)
            )));
        }

        parse_daily_response(symbol, &body)
    }
}

/// Turn a raw TIME_SERIES_DAILY body into price points for `symbol`.
pub fn parse_daily_response(symbol: &str, body: &str) -> Result<Vec<PricePoint>, PriceProviderError> {
    let parsed: AvDailyResponse = serde_json::from_str(body)
        .map_err(|e| PriceProviderError::Parse(format!("{} (body: {})", e, truncate(body))))?;

    let series = match parsed.time_series {
        Some(series) => series,
        None => {
            if let Some(note) = parsed.note {
                return Err(PriceProviderError::RateLimited(note));
            }
            if let Some(info) = parsed.information {
                return Err(PriceProviderError::RateLimited(info));
            }
            if let Some(msg) = parsed.error_message {
                return Err(PriceProviderError::BadResponse(msg));
            }
            return Err(PriceProviderError::BadResponse(format!(
                "missing '{}': {}",
                TIME_SERIES_KEY,
                truncate(body)
            )));
        }
    };

    // BTreeMap iterates dates ascending
    series
        .into_iter()
        .map(|(date_str, bar)| {
            let trading_date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .map_err(|e| PriceProviderError::Parse(format!("date '{}': {}", date_str, e)))?;

            Ok(PricePoint {
                symbol: symbol.to_string(),
                trading_date,
                close_price: coerce_price(&bar.close)?,
                volume: coerce_volume(&bar.volume)?,
            })
        })
        .collect()
}

pub fn coerce_price(raw: &str) -> Result<f64, PriceProviderError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| PriceProviderError::Parse(format!("close '{}': {}", raw, e)))?;

    if !value.is_finite() {
        return Err(PriceProviderError::Parse(format!("close '{}' is not finite", raw)));
    }
    Ok(value)
}

/// Volumes may arrive as string-typed reals ("1234567.0"); go through f64 and truncate.
pub fn coerce_volume(raw: &str) -> Result<i64, PriceProviderError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| PriceProviderError::Parse(format!("volume '{}': {}", raw, e)))?;

    if !value.is_finite() || value.abs() > i64::MAX as f64 {
        return Err(PriceProviderError::Parse(format!("volume '{}' out of range", raw)));
    }
    Ok(value.trunc() as i64)
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_DIAGNOSTIC_LEN {
        return body.to_string();
    }
    let mut end = MAX_DIAGNOSTIC_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
