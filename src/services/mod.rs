pub mod forecast_service;
pub mod price_service;
pub mod rate_limiter;
pub mod report_service;
pub mod staging_service;
pub mod verification_service;
