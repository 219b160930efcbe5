use chrono::NaiveDate;

// One daily bar for a symbol. Unique by (symbol, trading_date).
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub symbol: String,
    pub trading_date: NaiveDate,
    pub close_price: f64,
    pub volume: i64,
}
