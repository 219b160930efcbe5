mod config;
mod db;
mod errors;
mod external;
mod jobs;
mod logging;
mod models;
mod services;
mod state;
mod store;

use std::process::ExitCode;
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::external::alphavantage::AlphaVantageProvider;
use crate::jobs::ingest_forecast_job;
use crate::logging::LoggingConfig;
use crate::models::RunStatus;
use crate::state::PipelineContext;
use crate::store::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let config = PipelineConfig::from_env()?;

    let store = PgStore::connect(&config).await?;
    let provider = AlphaVantageProvider::from_config(&config.provider)?;

    let ctx = PipelineContext::from_config(&config, Arc::new(store), Arc::new(provider));
    let report = match ingest_forecast_job::run(&ctx).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(fatal = e.is_fatal(), "❌ Run aborted: {}", e);
            return Err(e.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(match report.status {
        RunStatus::Done => ExitCode::SUCCESS,
        RunStatus::DoneWithFailures => ExitCode::from(2),
    })
}
