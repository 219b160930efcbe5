mod symbol;
mod price_point;
mod forecast;
mod alert;
pub mod run_report;

pub use symbol::Symbol;
pub use price_point::PricePoint;
pub use forecast::{ForecastOutlook, ForecastRecord, SymbolOutlook};
pub use alert::AlertSummary;
pub use run_report::{
    FetchStatus, ForecastStatus, MergeStatus, RunReport, RunStatus, SymbolReport,
    VerificationStatus,
};
