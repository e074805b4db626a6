//! SQLite database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order index value carried by rows that were never placed in the display order
pub const UNORDERED_INDEX: i64 = 0;

/// One tracked stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub price: f64,
    pub open: f64,
    pub yesterday_close: f64,
    pub high: f64,
    pub low: f64,
    pub today_change_percent: f64,
    pub added_at: DateTime<Utc>,
    pub added_price: f64,
    pub total_change_percent: f64,
    pub order_index: i64,
}

/// Row to insert; `id` and `order_index` are assigned by the store
#[derive(Debug, Clone)]
pub struct NewWatchlistEntry {
    pub code: String,
    pub name: String,
    pub price: f64,
    pub open: f64,
    pub yesterday_close: f64,
    pub high: f64,
    pub low: f64,
    pub today_change_percent: f64,
    pub added_at: DateTime<Utc>,
    pub added_price: f64,
    pub total_change_percent: f64,
}
