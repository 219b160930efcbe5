use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::AlertSummary;

/// Alerts dated within `[from, to]` for every tracked index, oldest first.
pub async fn fetch_between(
    pool: &PgPool,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<AlertSummary>, sqlx::Error> {
    sqlx::query_as::<_, AlertSummary>(
        r#"
        SELECT i.symbol, a.trading_date, a.alert_type, a.message, a.severity
        FROM alerts a
        JOIN indices i ON a.index_id = i.index_id
        WHERE a.trading_date BETWEEN $1 AND $2
        ORDER BY a.trading_date, i.symbol
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}
