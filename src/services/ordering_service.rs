//! Ordering Service
//!
//! Maintains the manual display order of the watchlist. Every operation
//! runs inside a single store transaction, so readers never observe a
//! half-applied swap or shift and two moves never interleave.

use crate::db::sqlite::{watchlist, SqliteDb, WatchlistEntry};
use crate::error::Result;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

/// Result of a reorder request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOutcome {
    /// Order indices were changed
    Moved,
    /// Entry is already first (or last, for move-down); nothing changed
    AlreadyAtBoundary,
}

/// Ordering service for reorder operations
pub struct OrderingService;

impl OrderingService {
    /// Swap the entry with its predecessor in display order
    pub fn move_up(db: &SqliteDb, id: i64) -> Result<MoveOutcome> {
        db.transaction(|conn| {
            let current = watchlist::get_by_id(conn, id)?;

            match watchlist::find_previous(conn, current.order_index)? {
                Some(previous) => {
                    Self::swap(conn, &current, &previous)?;
                    Ok(MoveOutcome::Moved)
                }
                None => {
                    debug!(id, "Stock is already first");
                    Ok(MoveOutcome::AlreadyAtBoundary)
                }
            }
        })
    }

    /// Swap the entry with its successor in display order
    pub fn move_down(db: &SqliteDb, id: i64) -> Result<MoveOutcome> {
        db.transaction(|conn| {
            let current = watchlist::get_by_id(conn, id)?;

            match watchlist::find_next(conn, current.order_index)? {
                Some(next) => {
                    Self::swap(conn, &current, &next)?;
                    Ok(MoveOutcome::Moved)
                }
                None => {
                    debug!(id, "Stock is already last");
                    Ok(MoveOutcome::AlreadyAtBoundary)
                }
            }
        })
    }

    /// Move the entry to the front.
    ///
    /// Every entry ordered before it shifts back by one and the entry takes
    /// the previous global minimum. Entries after it are untouched.
    pub fn move_to_top(db: &SqliteDb, id: i64) -> Result<MoveOutcome> {
        db.transaction(|conn| {
            let current = watchlist::get_by_id(conn, id)?;
            let min = watchlist::min_order_index(conn)?;

            if current.order_index == min {
                debug!(id, "Stock is already at the top");
                return Ok(MoveOutcome::AlreadyAtBoundary);
            }

            let shifted = watchlist::bulk_increment_order_index(conn, current.order_index)?;
            watchlist::set_order_index(conn, current.id, min)?;

            info!(id, from = current.order_index, to = min, shifted, "Moved stock to top");
            Ok(MoveOutcome::Moved)
        })
    }

    /// Give every never-ordered entry (order index 0) a place at the end of
    /// the list, oldest first. Already ordered entries keep their index.
    ///
    /// Returns the number of entries repaired; 0 when there is nothing to do.
    pub fn initialize_order_indices(db: &SqliteDb) -> Result<usize> {
        let repaired = db.transaction(|conn| {
            let ids = watchlist::unordered_ids(conn)?;
            if ids.is_empty() {
                return Ok(0);
            }

            let base = watchlist::max_order_index(conn)?.max(0);
            for (offset, id) in ids.iter().enumerate() {
                watchlist::set_order_index(conn, *id, base + offset as i64 + 1)?;
            }

            Ok(ids.len())
        })?;

        info!("Initialized order index for {} stocks", repaired);
        Ok(repaired)
    }

    fn swap(conn: &Connection, a: &WatchlistEntry, b: &WatchlistEntry) -> Result<()> {
        watchlist::set_order_index(conn, a.id, b.order_index)?;
        watchlist::set_order_index(conn, b.id, a.order_index)?;

        info!(
            id = a.id,
            other = b.id,
            from = a.order_index,
            to = b.order_index,
            "Swapped stock order"
        );
        Ok(())
    }
}
