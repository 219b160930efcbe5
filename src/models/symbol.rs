use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// A tracked index, as listed in the `indices` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Symbol {
    pub index_id: i32,
    pub symbol: String,
}

impl Symbol {
    pub fn new(index_id: i32, symbol: impl Into<String>) -> Self {
        Self {
            index_id,
            symbol: symbol.into(),
        }
    }
}
