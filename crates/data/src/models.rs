use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One observed closing price for a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub close: Decimal,
}

impl PriceRecord {
    /// Creates a new price record.
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, symbol: impl Into<String>, close: Decimal) -> Self {
        Self {
            timestamp,
            symbol: symbol.into(),
            close,
        }
    }
}

/// Wire shape of the market-chart endpoint: each entry is a
/// `[unix_millis, price]` pair.
#[derive(Debug, Deserialize)]
pub struct MarketChartResponse {
    pub prices: Vec<(f64, f64)>,
}
