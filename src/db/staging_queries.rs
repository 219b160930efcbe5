//! Two-phase write of fetched bars.
//!
//! `staging_index_prices` is a per-run scratch table keyed by
//! `(symbol, trading_date)`. Rows are merged into `index_prices` right after
//! they are staged, and the merge only looks at the current symbol's rows, so
//! leftovers from another symbol can never be attributed to the wrong index.
//! The whole table is truncated once at the end of a run.

use sqlx::{PgConnection, PgPool};
use tracing::error;

use crate::models::PricePoint;

/// Upsert a batch into staging. Callers wrap this in the symbol's transaction.
pub async fn stage_points(
    conn: &mut PgConnection,
    symbol: &str,
    points: &[PricePoint],
) -> Result<u64, sqlx::Error> {
    let mut staged = 0;

    for (i, p) in points.iter().enumerate() {
        let result = sqlx::query(
            r#"
            INSERT INTO staging_index_prices (symbol, trading_date, close_price, volume)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (symbol, trading_date)
            DO UPDATE SET close_price = EXCLUDED.close_price, volume = EXCLUDED.volume
            "#,
        )
        .bind(symbol)
        .bind(p.trading_date)
        .bind(p.close_price)
        .bind(p.volume)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            error!(
                "Failed to stage price point {} for {} (date: {}, close: {}): {}",
                i, symbol, p.trading_date, p.close_price, e
            );
            e
        })?;

        staged += result.rows_affected();
    }

    Ok(staged)
}

/// Move one symbol's staged rows into `index_prices`, resolving `index_id`
/// through `indices`. Rows whose symbol is not tracked are left behind.
pub async fn merge_staged(conn: &mut PgConnection, symbol: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO index_prices (index_id, trading_date, close_price, volume)
        SELECT i.index_id, s.trading_date, s.close_price, s.volume
        FROM staging_index_prices s
        JOIN indices i ON s.symbol = i.symbol
        WHERE s.symbol = $1
        ON CONFLICT (index_id, trading_date)
        DO UPDATE SET close_price = EXCLUDED.close_price, volume = EXCLUDED.volume
        "#,
    )
    .bind(symbol)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn clear_staging(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("TRUNCATE TABLE staging_index_prices")
        .execute(pool)
        .await?;
    Ok(())
}
