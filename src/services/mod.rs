//! Services Layer
//!
//! Business logic shared by the HTTP handlers and the startup sequence.
//!
//! # Services
//!
//! - `WatchlistService` - List, add and delete tracked stocks
//! - `OrderingService` - Move up, move down, move to top, order index repair

pub mod ordering_service;
pub mod watchlist_service;

pub use ordering_service::{MoveOutcome, OrderingService};
pub use watchlist_service::WatchlistService;

use crate::error::Result;

/// Run blocking store work on the blocking thread pool
pub async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
