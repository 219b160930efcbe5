use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::db;
use crate::errors::AppError;
use crate::models::{AlertSummary, ForecastRecord, PricePoint, Symbol};
use crate::store::{MergeCounts, PipelineStore};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &PipelineConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| AppError::Connection(format!("cannot reach database: {}", e)))?;

        if config.run_migrations {
            info!("Applying database migrations");
            sqlx::migrate!("./migrations").run(&pool).await?;
        }

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl PipelineStore for PgStore {
    async fn load_symbols(&self) -> Result<Vec<Symbol>, AppError> {
        db::index_queries::fetch_symbols(&self.pool)
            .await
            .map_err(AppError::Db)
    }

    async fn stage_and_merge(
        &self,
        symbol: &str,
        points: &[PricePoint],
    ) -> Result<MergeCounts, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to begin transaction for {}: {}", symbol, e);
            AppError::Persistence(e.to_string())
        })?;

        let staged = db::staging_queries::stage_points(&mut *tx, symbol, points)
            .await
            .map_err(|e| AppError::Persistence(format!("staging failed: {}", e)))?;
        let merged = db::staging_queries::merge_staged(&mut *tx, symbol)
            .await
            .map_err(|e| AppError::Persistence(format!("merge failed: {}", e)))?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit staged prices for {}: {}", symbol, e);
            AppError::Persistence(e.to_string())
        })?;

        Ok(MergeCounts { staged, merged })
    }

    async fn clear_staging(&self) -> Result<(), AppError> {
        db::staging_queries::clear_staging(&self.pool)
            .await
            .map_err(AppError::Db)
    }

    async fn run_forecast(&self, index_id: i32, as_of: NaiveDate) -> Result<(), AppError> {
        db::prediction_queries::call_predict_trend(&self.pool, index_id, as_of)
            .await
            .map_err(|e| AppError::Forecast(e.to_string()))
    }

    async fn count_forecasts(
        &self,
        index_id: i32,
        as_of: NaiveDate,
        model_version: &str,
    ) -> Result<i64, AppError> {
        db::prediction_queries::count_upcoming(&self.pool, index_id, as_of, model_version)
            .await
            .map_err(AppError::Db)
    }

    async fn upcoming_forecasts(
        &self,
        index_id: i32,
        as_of: NaiveDate,
        model_version: &str,
    ) -> Result<Vec<ForecastRecord>, AppError> {
        db::prediction_queries::fetch_upcoming(&self.pool, index_id, as_of, model_version)
            .await
            .map_err(AppError::Db)
    }

    async fn alerts_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AlertSummary>, AppError> {
        db::alert_queries::fetch_between(&self.pool, from, to)
            .await
            .map_err(AppError::Db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_ID: i32 = 990_001;
    const SYMBOL: &str = "ZZMERGE";
    const OTHER: &str = "ZZOTHER";

    // Run with: DATABASE_URL=postgres://... cargo test -- --ignored
    async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPool::connect(&url).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    async fn reset(pool: &PgPool) {
        sqlx::query("DELETE FROM index_prices WHERE index_id = $1")
            .bind(INDEX_ID)
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("DELETE FROM staging_index_prices WHERE symbol IN ($1, $2)")
            .bind(SYMBOL)
            .bind(OTHER)
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("DELETE FROM indices WHERE index_id = $1")
            .bind(INDEX_ID)
            .execute(pool)
            .await
            .unwrap();
    }

    fn point(symbol: &str, day: u32, close_price: f64, volume: i64) -> PricePoint {
        PricePoint {
            symbol: symbol.to_string(),
            trading_date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
            close_price,
            volume,
        }
    }

    async fn merged_rows(pool: &PgPool) -> Vec<(NaiveDate, f64, i64)> {
        sqlx::query_as::<_, (NaiveDate, f64, i64)>(
            "SELECT trading_date, close_price::FLOAT8, volume FROM index_prices \
             WHERE index_id = $1 ORDER BY trading_date",
        )
        .bind(INDEX_ID)
        .fetch_all(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_stage_and_merge_twice_is_idempotent() {
        let pool = test_pool().await;
        reset(&pool).await;
        sqlx::query("INSERT INTO indices (index_id, symbol) VALUES ($1, $2)")
            .bind(INDEX_ID)
            .bind(SYMBOL)
            .execute(&pool)
            .await
            .unwrap();

        // A staged row for an untracked symbol must stay out of index_prices.
        sqlx::query(
            "INSERT INTO staging_index_prices (symbol, trading_date, close_price, volume) \
             VALUES ($1, '2026-10-16', 1, 1)",
        )
        .bind(OTHER)
        .execute(&pool)
        .await
        .unwrap();

        let store = PgStore::new(pool.clone());
        let batch = vec![point(SYMBOL, 15, 99.5, 2_000), point(SYMBOL, 16, 101.25, 1_234_567)];

        let first = store.stage_and_merge(SYMBOL, &batch).await.unwrap();
        let after_first = merged_rows(&pool).await;
        let second = store.stage_and_merge(SYMBOL, &batch).await.unwrap();
        let after_second = merged_rows(&pool).await;

        assert_eq!(first, MergeCounts { staged: 2, merged: 2 });
        assert_eq!(second, first);
        assert_eq!(after_second, after_first);
        assert_eq!(
            after_second,
            vec![
                (NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(), 99.5, 2_000),
                (NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(), 101.25, 1_234_567),
            ]
        );

        // Same key, new values: both tables are overwritten in place.
        store
            .stage_and_merge(SYMBOL, &[point(SYMBOL, 16, 102.0, 3_000)])
            .await
            .unwrap();
        let rows = merged_rows(&pool).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], (NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(), 102.0, 3_000));

        let staged: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM staging_index_prices WHERE symbol = $1",
        )
        .bind(SYMBOL)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(staged, 2);

        reset(&pool).await;
    }
}
