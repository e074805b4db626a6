//! Periodic price refresh
//!
//! Every tick inside the active window loads the watchlist, fetches all
//! codes in one batch request and writes back the new snapshot and derived
//! fields. Codes the provider did not answer for are left untouched. A
//! failed cycle is logged and the next tick runs as usual.

use crate::db::sqlite::{watchlist, SqliteDb, WatchlistEntry};
use crate::error::{AppError, Result};
use crate::quotes::{percent_change, QuoteSnapshot, QuoteSource};
use crate::scheduler::ActiveWindow;
use crate::services::run_blocking;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Outcome of one refresh cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    /// Entries on the watchlist
    pub tracked: usize,
    /// Entries the provider returned data for
    pub fetched: usize,
    /// Entries written back
    pub updated: usize,
}

/// Merge a fetched quote into an entry and recompute the derived fields
pub fn apply_quote(entry: &mut WatchlistEntry, quote: &QuoteSnapshot) {
    let new_price = quote.positive_price();
    if let Some(price) = new_price {
        entry.price = price;
    }

    if let Some(open) = quote.open.filter(|v| *v > 0.0) {
        entry.open = open;
    }
    if let Some(high) = quote.high.filter(|v| *v > 0.0) {
        entry.high = high;
    }
    if let Some(low) = quote.low.filter(|v| *v > 0.0) {
        entry.low = low;
    }

    // Previous close and today's change are only written as a pair
    if let (Some(yesterday_close), Some(price)) = (quote.positive_yesterday_close(), new_price) {
        if let Some(change) = percent_change(yesterday_close, price) {
            entry.yesterday_close = yesterday_close;
            entry.today_change_percent = change;
        }
    }

    if let Some(change) = percent_change(entry.added_price, entry.price) {
        entry.total_change_percent = change;
    }
}

/// Run one refresh cycle against the store.
///
/// A batch fetch failure returns the error before anything is written.
pub async fn refresh_prices(db: Arc<SqliteDb>, source: &dyn QuoteSource) -> Result<RefreshReport> {
    let entries = {
        let db = db.clone();
        run_blocking(move || db.list_ordered()).await?
    };

    if entries.is_empty() {
        return Ok(RefreshReport::default());
    }

    let codes: Vec<String> = entries.iter().map(|e| e.code.clone()).collect();
    let quotes = source.fetch_batch(&codes).await?;

    let tracked = entries.len();
    let changed: Vec<WatchlistEntry> = entries
        .into_iter()
        .filter_map(|mut entry| {
            let quote = quotes.get(&entry.code)?;
            apply_quote(&mut entry, quote);
            Some(entry)
        })
        .collect();
    let fetched = changed.len();

    let updated = run_blocking(move || {
        db.transaction(|conn| {
            let mut written = 0;
            for entry in &changed {
                match watchlist::update_quote(conn, entry) {
                    Ok(()) => written += 1,
                    Err(AppError::NotFound(_)) => {
                        debug!(id = entry.id, code = %entry.code, "Stock removed during refresh");
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(written)
        })
    })
    .await?;

    Ok(RefreshReport {
        tracked,
        fetched,
        updated,
    })
}

/// Background task that refreshes prices on a fixed interval
pub struct PriceRefreshScheduler {
    state: AppState,
    window: ActiveWindow,
    interval: Duration,
}

/// Handle to a running [`PriceRefreshScheduler`]
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PriceRefreshScheduler {
    pub fn new(state: AppState) -> Self {
        let window = ActiveWindow::new(&state.config.refresh.window);
        let interval = state.config.refresh.interval;

        Self {
            state,
            window,
            interval,
        }
    }

    /// Spawn the refresh loop on the tokio runtime
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            info!(
                "Price refresh scheduler started (every {}s via {})",
                self.interval.as_secs_f64(),
                self.state.quotes.id()
            );

            let mut ticker = tokio::time::interval(self.interval);
            // A slow cycle pushes the next tick back instead of bursting
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.tick_at(Utc::now()).await;
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }

            info!("Price refresh scheduler stopped");
        });

        SchedulerHandle { shutdown_tx, task }
    }

    /// Run one gated cycle as of `now`. Never fails; errors are logged.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> Option<RefreshReport> {
        if !self.window.contains(now) {
            debug!("Outside trading hours, skipping price refresh");
            return None;
        }

        match refresh_prices(self.state.sqlite.clone(), self.state.quotes.as_ref()).await {
            Ok(report) => {
                if report.tracked > 0 {
                    info!(
                        tracked = report.tracked,
                        fetched = report.fetched,
                        updated = report.updated,
                        "Refreshed stock prices"
                    );
                }
                if report.fetched < report.tracked {
                    warn!(
                        missing = report.tracked - report.fetched,
                        "No quote data for some stocks this cycle"
                    );
                }
                Some(report)
            }
            Err(e) => {
                error!(error = %e, "Price refresh failed");
                None
            }
        }
    }
}

impl SchedulerHandle {
    /// Stop the loop, letting an in-flight cycle finish first
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        if let Err(e) = self.task.await {
            error!("Price refresh task ended abnormally: {}", e);
        }
    }
}
