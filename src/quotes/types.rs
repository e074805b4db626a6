//! Quote data types

use serde::{Deserialize, Serialize};

/// Latest quote for one code as reported by the provider.
///
/// Numeric fields are `None` when the provider left the position empty or
/// sent something that is not a number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub code: String,
    pub name: String,
    pub price: Option<f64>,
    pub yesterday_close: Option<f64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<f64>,
    pub amount: Option<f64>,
    pub quote_time: Option<String>,
}

impl QuoteSnapshot {
    /// Returned price, only when strictly positive
    pub fn positive_price(&self) -> Option<f64> {
        self.price.filter(|p| *p > 0.0)
    }

    /// Returned previous close, only when strictly positive
    pub fn positive_yesterday_close(&self) -> Option<f64> {
        self.yesterday_close.filter(|p| *p > 0.0)
    }
}

/// Percentage change from `base` to `current`; `None` when `base` is not positive
pub fn percent_change(base: f64, current: f64) -> Option<f64> {
    if base > 0.0 {
        Some((current - base) / base * 100.0)
    } else {
        None
    }
}
