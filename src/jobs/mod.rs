//! Jobs run by the binary. There is a single one: the daily ingest, merge,
//! forecast and verify pass over every tracked index.

pub mod ingest_forecast_job;
