use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(sqlx::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Forecast routine failed: {0}")]
    Forecast(String),
}

impl AppError {
    /// Errors that end the whole run instead of a single symbol.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Config(_) | AppError::Connection(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        AppError::Db(value)
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(value: sqlx::migrate::MigrateError) -> Self {
        AppError::Connection(format!("migration failed: {}", value))
    }
}
