use sqlx::PgPool;

use crate::models::Symbol;

/// All tracked indices in load order.
pub async fn fetch_symbols(pool: &PgPool) -> Result<Vec<Symbol>, sqlx::Error> {
    sqlx::query_as::<_, Symbol>(
        r#"
        SELECT index_id, symbol
        FROM indices
        ORDER BY index_id
        "#,
    )
    .fetch_all(pool)
    .await
}
