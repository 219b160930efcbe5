pub mod alert_queries;
pub mod index_queries;
pub mod prediction_queries;
pub mod staging_queries;
