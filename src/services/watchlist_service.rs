//! Watchlist Service
//!
//! List, add and remove tracked stocks.

use crate::db::sqlite::{NewWatchlistEntry, SqliteDb, WatchlistEntry};
use crate::error::{AppError, Result};
use crate::quotes::{percent_change, QuoteSnapshot};
use crate::services::run_blocking;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use tracing::info;

const MAX_CODE_LEN: usize = 16;

/// Watchlist service for add/delete/list
pub struct WatchlistService;

impl WatchlistService {
    /// All tracked stocks in display order
    pub fn list(db: &SqliteDb) -> Result<Vec<WatchlistEntry>> {
        db.list_ordered()
    }

    /// Normalize and validate a user-supplied stock code
    pub fn validate_code(raw: &str) -> Result<String> {
        let code = raw.trim();

        if code.is_empty() {
            return Err(AppError::InvalidInput("Stock code must not be empty".to_string()));
        }
        if code.len() > MAX_CODE_LEN
            || !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
        {
            return Err(AppError::InvalidInput(format!("Invalid stock code: {}", code)));
        }

        Ok(code.to_string())
    }

    /// Fetch the current quote for `code` and append it to the watchlist.
    ///
    /// The quote price becomes the baseline for the total change.
    pub async fn add(state: &AppState, raw_code: &str) -> Result<WatchlistEntry> {
        let code = Self::validate_code(raw_code)?;

        // Skip the quote request for codes already tracked
        let db = state.sqlite.clone();
        let lookup = code.clone();
        run_blocking(move || db.ensure_code_absent(&lookup)).await?;

        let quote = state.quotes.fetch_one(&code).await?;
        let entry = Self::entry_from_quote(&code, &quote, Utc::now())?;

        let db = state.sqlite.clone();
        let created = run_blocking(move || db.create(&entry)).await?;

        info!(
            id = created.id,
            code = %created.code,
            price = created.price,
            today_change = created.today_change_percent,
            "Added stock to watchlist"
        );

        Ok(created)
    }

    /// Remove a stock; other entries keep their order indices
    pub fn delete(db: &SqliteDb, id: i64) -> Result<()> {
        db.delete_by_id(id)?;
        info!(id, "Removed stock from watchlist");
        Ok(())
    }

    /// Build the row for a newly added stock from its first quote
    pub fn entry_from_quote(
        code: &str,
        quote: &QuoteSnapshot,
        now: DateTime<Utc>,
    ) -> Result<NewWatchlistEntry> {
        let price = quote
            .price
            .ok_or_else(|| AppError::MalformedResponse(format!("{}: no price in quote", code)))?;
        let yesterday_close = quote.yesterday_close.unwrap_or(0.0);

        let name = if quote.name.is_empty() {
            code.to_string()
        } else {
            quote.name.clone()
        };

        Ok(NewWatchlistEntry {
            code: code.to_string(),
            name,
            price,
            open: quote.open.unwrap_or(0.0),
            yesterday_close,
            high: quote.high.unwrap_or(0.0),
            low: quote.low.unwrap_or(0.0),
            today_change_percent: percent_change(yesterday_close, price).unwrap_or(0.0),
            added_at: now,
            added_price: price,
            total_change_percent: 0.0,
        })
    }
}
