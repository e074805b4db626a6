//! Scheduled background work
//!
//! - Price refresh every few seconds during trading hours

mod active_window;
mod price_refresh;

pub use active_window::ActiveWindow;
pub use price_refresh::{
    apply_quote, refresh_prices, PriceRefreshScheduler, RefreshReport, SchedulerHandle,
};
