//! Watchlist table access

use crate::db::sqlite::models::{NewWatchlistEntry, WatchlistEntry, UNORDERED_INDEX};
use crate::error::{AppError, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

const SELECT_COLUMNS: &str = "SELECT id, code, name, price, open, yesterday_close, high, low,
        today_change_percent, added_at, added_price, total_change_percent, order_index
     FROM watchlist";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<WatchlistEntry> {
    Ok(WatchlistEntry {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        price: row.get(3)?,
        open: row.get(4)?,
        yesterday_close: row.get(5)?,
        high: row.get(6)?,
        low: row.get(7)?,
        today_change_percent: row.get(8)?,
        added_at: row.get(9)?,
        added_price: row.get(10)?,
        total_change_percent: row.get(11)?,
        order_index: row.get(12)?,
    })
}

/// All entries in display order
pub fn list_ordered(conn: &Connection) -> Result<Vec<WatchlistEntry>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY order_index ASC, id ASC", SELECT_COLUMNS))?;

    let entries = stmt
        .query_map([], entry_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(entries)
}

/// Get entry by ID
pub fn get_by_id(conn: &Connection, id: i64) -> Result<WatchlistEntry> {
    conn.query_row(&format!("{} WHERE id = ?1", SELECT_COLUMNS), [id], entry_from_row)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                AppError::NotFound(format!("Stock not found: {}", id))
            }
            _ => e.into(),
        })
}

/// Look up an entry by its exchange code (case-insensitive)
pub fn find_by_code(conn: &Connection, code: &str) -> Result<Option<WatchlistEntry>> {
    let entry = conn
        .query_row(
            &format!("{} WHERE code = ?1 COLLATE NOCASE", SELECT_COLUMNS),
            [code],
            entry_from_row,
        )
        .optional()?;

    Ok(entry)
}

/// Fail with `InvalidInput` when `code` is already tracked (case-insensitive)
pub fn ensure_code_absent(conn: &Connection, code: &str) -> Result<()> {
    if find_by_code(conn, code)?.is_some() {
        return Err(AppError::InvalidInput(format!("{} is already on the watchlist", code)));
    }
    Ok(())
}

/// Insert a new entry at the given order index
pub fn create(conn: &Connection, entry: &NewWatchlistEntry, order_index: i64) -> Result<WatchlistEntry> {
    conn.execute(
        "INSERT INTO watchlist (code, name, price, open, yesterday_close, high, low,
            today_change_percent, added_at, added_price, total_change_percent, order_index)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            entry.code,
            entry.name,
            entry.price,
            entry.open,
            entry.yesterday_close,
            entry.high,
            entry.low,
            entry.today_change_percent,
            entry.added_at,
            entry.added_price,
            entry.total_change_percent,
            order_index,
        ],
    )?;

    let id = conn.last_insert_rowid();

    get_by_id(conn, id)
}

/// Delete an entry; siblings keep their order indices
pub fn delete_by_id(conn: &Connection, id: i64) -> Result<()> {
    let rows = conn.execute("DELETE FROM watchlist WHERE id = ?1", [id])?;

    if rows == 0 {
        return Err(AppError::NotFound(format!("Stock not found: {}", id)));
    }

    Ok(())
}

/// Persist the quote snapshot and derived columns of an entry.
///
/// `order_index`, `code`, `added_at` and `added_price` are never written here,
/// so a refresh cannot undo a concurrent reorder.
pub fn update_quote(conn: &Connection, entry: &WatchlistEntry) -> Result<()> {
    let rows = conn.execute(
        "UPDATE watchlist SET price = ?1, open = ?2, yesterday_close = ?3, high = ?4, low = ?5,
            today_change_percent = ?6, total_change_percent = ?7
         WHERE id = ?8",
        params![
            entry.price,
            entry.open,
            entry.yesterday_close,
            entry.high,
            entry.low,
            entry.today_change_percent,
            entry.total_change_percent,
            entry.id,
        ],
    )?;

    if rows == 0 {
        return Err(AppError::NotFound(format!("Stock not found: {}", entry.id)));
    }

    Ok(())
}

/// Set the order index of a single entry
pub fn set_order_index(conn: &Connection, id: i64, order_index: i64) -> Result<()> {
    let rows = conn.execute(
        "UPDATE watchlist SET order_index = ?1 WHERE id = ?2",
        params![order_index, id],
    )?;

    if rows == 0 {
        return Err(AppError::NotFound(format!("Stock not found: {}", id)));
    }

    Ok(())
}

/// Largest order index, 0 when the table is empty
pub fn max_order_index(conn: &Connection) -> Result<i64> {
    let max = conn.query_row(
        "SELECT COALESCE(MAX(order_index), 0) FROM watchlist",
        [],
        |row| row.get(0),
    )?;
    Ok(max)
}

/// Smallest order index, 0 when the table is empty
pub fn min_order_index(conn: &Connection) -> Result<i64> {
    let min = conn.query_row(
        "SELECT COALESCE(MIN(order_index), 0) FROM watchlist",
        [],
        |row| row.get(0),
    )?;
    Ok(min)
}

/// Entry with the greatest order index strictly below `order_index`
pub fn find_previous(conn: &Connection, order_index: i64) -> Result<Option<WatchlistEntry>> {
    let entry = conn
        .query_row(
            &format!(
                "{} WHERE order_index < ?1 ORDER BY order_index DESC, id DESC LIMIT 1",
                SELECT_COLUMNS
            ),
            [order_index],
            entry_from_row,
        )
        .optional()?;
    Ok(entry)
}

/// Entry with the smallest order index strictly above `order_index`
pub fn find_next(conn: &Connection, order_index: i64) -> Result<Option<WatchlistEntry>> {
    let entry = conn
        .query_row(
            &format!(
                "{} WHERE order_index > ?1 ORDER BY order_index ASC, id ASC LIMIT 1",
                SELECT_COLUMNS
            ),
            [order_index],
            entry_from_row,
        )
        .optional()?;
    Ok(entry)
}

/// Increment the order index of every entry strictly below `threshold`.
///
/// Returns the number of rows shifted.
pub fn bulk_increment_order_index(conn: &Connection, threshold: i64) -> Result<usize> {
    let rows = conn.execute(
        "UPDATE watchlist SET order_index = order_index + 1 WHERE order_index < ?1",
        [threshold],
    )?;
    Ok(rows)
}

/// IDs of entries that were never given an order, oldest first
pub fn unordered_ids(conn: &Connection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM watchlist WHERE order_index = ?1 ORDER BY id ASC")?;

    let ids = stmt
        .query_map([UNORDERED_INDEX], |row| row.get(0))?
        .collect::<std::result::Result<Vec<i64>, _>>()?;

    Ok(ids)
}
