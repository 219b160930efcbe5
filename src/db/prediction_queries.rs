use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::ForecastRecord;

/// Run the server-side routine that writes `predictions` for the next horizon.
pub async fn call_predict_trend(
    pool: &PgPool,
    index_id: i32,
    as_of: NaiveDate,
) -> Result<(), sqlx::Error> {
    sqlx::query("CALL predict_trend_7days($1, $2)")
        .bind(index_id)
        .bind(as_of)
        .execute(pool)
        .await?;
    Ok(())
}

/// Number of forecast rows strictly after `as_of` for one index and model version.
pub async fn count_upcoming(
    pool: &PgPool,
    index_id: i32,
    as_of: NaiveDate,
    model_version: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM predictions
        WHERE index_id = $1
          AND trading_date > $2
          AND model_version = $3
        "#,
    )
    .bind(index_id)
    .bind(as_of)
    .bind(model_version)
    .fetch_one(pool)
    .await
}

pub async fn fetch_upcoming(
    pool: &PgPool,
    index_id: i32,
    as_of: NaiveDate,
    model_version: &str,
) -> Result<Vec<ForecastRecord>, sqlx::Error> {
    sqlx::query_as::<_, ForecastRecord>(
        r#"
        SELECT index_id, trading_date, model_version, predicted_up,
               probability_up::FLOAT8 AS probability_up
        FROM predictions
        WHERE index_id = $1
          AND trading_date > $2
          AND model_version = $3
        ORDER BY trading_date ASC
        "#,
    )
    .bind(index_id)
    .bind(as_of)
    .bind(model_version)
    .fetch_all(pool)
    .await
}
