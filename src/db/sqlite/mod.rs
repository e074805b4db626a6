//! SQLite database module
//!
//! `SqliteDb` is the watchlist store. A single connection sits behind a
//! mutex, so every call observes the effects of every earlier call and no
//! two writers interleave. Multi-row changes go through [`SqliteDb::transaction`].

pub mod models;
mod connection;
mod migrations;
pub mod watchlist;

use crate::error::Result;
pub use models::{NewWatchlistEntry, WatchlistEntry, UNORDERED_INDEX};
use parking_lot::Mutex;
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;

/// SQLite database wrapper
pub struct SqliteDb {
    conn: Mutex<Connection>,
}

impl SqliteDb {
    /// Open (or create) the database file and run migrations
    pub fn open(path: &Path) -> Result<Self> {
        let conn = connection::create_connection(path)?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::from_connection(conn)
    }

    /// Private in-memory database, used by tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();
        migrations::run_migrations(&conn)
    }

    /// Run `f` inside one IMMEDIATE transaction while holding the connection.
    ///
    /// Commits when `f` returns `Ok`, rolls back otherwise. Nothing `f` writes
    /// is visible to any other caller until the commit.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let value = f(&tx)?;
        tx.commit()?;

        Ok(value)
    }

    // ========== Watchlist Methods ==========

    /// All entries sorted ascending by order index
    pub fn list_ordered(&self) -> Result<Vec<WatchlistEntry>> {
        let conn = self.conn.lock();
        watchlist::list_ordered(&conn)
    }

    /// Get entry by ID
    pub fn get_by_id(&self, id: i64) -> Result<WatchlistEntry> {
        let conn = self.conn.lock();
        watchlist::get_by_id(&conn, id)
    }

    /// Find entry by code
    pub fn find_by_code(&self, code: &str) -> Result<Option<WatchlistEntry>> {
        let conn = self.conn.lock();
        watchlist::find_by_code(&conn, code)
    }

    /// Fail with `InvalidInput` when `code` is already tracked
    pub fn ensure_code_absent(&self, code: &str) -> Result<()> {
        let conn = self.conn.lock();
        watchlist::ensure_code_absent(&conn, code)
    }

    /// Append a new entry after the current last one.
    ///
    /// The duplicate check, max lookup and insert share one transaction.
    pub fn create(&self, entry: &NewWatchlistEntry) -> Result<WatchlistEntry> {
        self.transaction(|conn| {
            watchlist::ensure_code_absent(conn, &entry.code)?;
            let order_index = watchlist::max_order_index(conn)? + 1;
            watchlist::create(conn, entry, order_index)
        })
    }

    /// Delete entry by ID
    pub fn delete_by_id(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock();
        watchlist::delete_by_id(&conn, id)
    }

    /// Write the quote snapshot and derived fields of an entry
    pub fn update_quote(&self, entry: &WatchlistEntry) -> Result<()> {
        let conn = self.conn.lock();
        watchlist::update_quote(&conn, entry)
    }

    /// Largest order index (0 if empty)
    pub fn max_order_index(&self) -> Result<i64> {
        let conn = self.conn.lock();
        watchlist::max_order_index(&conn)
    }

    /// Smallest order index (0 if empty)
    pub fn min_order_index(&self) -> Result<i64> {
        let conn = self.conn.lock();
        watchlist::min_order_index(&conn)
    }

    /// Increment every order index strictly below `threshold`
    pub fn bulk_increment_order_index(&self, threshold: i64) -> Result<usize> {
        let conn = self.conn.lock();
        watchlist::bulk_increment_order_index(&conn, threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use chrono::Utc;
    use tempfile::tempdir;

    fn new_entry(code: &str, price: f64) -> NewWatchlistEntry {
        NewWatchlistEntry {
            code: code.to_string(),
            name: format!("{} Corp", code),
            price,
            open: 0.0,
            yesterday_close: 0.0,
            high: 0.0,
            low: 0.0,
            today_change_percent: 0.0,
            added_at: Utc::now(),
            added_price: price,
            total_change_percent: 0.0,
        }
    }

    #[test]
    fn test_create_appends_in_order() {
        let db = SqliteDb::open_in_memory().unwrap();
        assert_eq!(db.max_order_index().unwrap(), 0);
        assert_eq!(db.min_order_index().unwrap(), 0);

        let a = db.create(&new_entry("sh600000", 10.0)).unwrap();
        let b = db.create(&new_entry("sz000001", 12.5)).unwrap();
        let c = db.create(&new_entry("hk00700", 300.0)).unwrap();

        assert_eq!((a.order_index, b.order_index, c.order_index), (1, 2, 3));
        assert_eq!(db.max_order_index().unwrap(), 3);
        assert_eq!(db.min_order_index().unwrap(), 1);

        let codes: Vec<String> = db.list_ordered().unwrap().into_iter().map(|e| e.code).collect();
        assert_eq!(codes, vec!["sh600000", "sz000001", "hk00700"]);
    }

    #[test]
    fn test_create_rejects_duplicate_code() {
        let db = SqliteDb::open_in_memory().unwrap();
        db.create(&new_entry("sh600000", 10.0)).unwrap();

        let err = db.create(&new_entry("SH600000", 11.0)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(matches!(db.ensure_code_absent("Sh600000"), Err(AppError::InvalidInput(_))));
        assert!(db.ensure_code_absent("sz000001").is_ok());

        let entries = db.list_ordered().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].price, 10.0);
        assert_eq!(db.max_order_index().unwrap(), 1);
    }

    #[test]
    fn test_delete_leaves_gaps() {
        let db = SqliteDb::open_in_memory().unwrap();
        let a = db.create(&new_entry("a1", 1.0)).unwrap();
        let b = db.create(&new_entry("b2", 1.0)).unwrap();
        let c = db.create(&new_entry("c3", 1.0)).unwrap();

        db.delete_by_id(b.id).unwrap();

        let indices: Vec<i64> = db.list_ordered().unwrap().iter().map(|e| e.order_index).collect();
        assert_eq!(indices, vec![1, 3]);
        assert!(matches!(db.delete_by_id(b.id), Err(AppError::NotFound(_))));

        // Ids are never reused
        let d = db.create(&new_entry("d4", 1.0)).unwrap();
        assert!(d.id > c.id && d.id != b.id && d.id != a.id);
        assert_eq!(d.order_index, 4);
    }

    #[test]
    fn test_get_by_id_not_found() {
        let db = SqliteDb::open_in_memory().unwrap();
        assert!(matches!(db.get_by_id(42), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_find_by_code_is_case_insensitive() {
        let db = SqliteDb::open_in_memory().unwrap();
        db.create(&new_entry("SH600000", 10.0)).unwrap();

        assert!(db.find_by_code("sh600000").unwrap().is_some());
        assert!(db.find_by_code("sz000001").unwrap().is_none());
    }

    #[test]
    fn test_update_quote_does_not_touch_order() {
        let db = SqliteDb::open_in_memory().unwrap();
        let mut entry = db.create(&new_entry("sh600000", 10.0)).unwrap();

        entry.price = 11.0;
        entry.total_change_percent = 10.0;
        entry.order_index = 99;
        db.update_quote(&entry).unwrap();

        let stored = db.get_by_id(entry.id).unwrap();
        assert_eq!(stored.price, 11.0);
        assert_eq!(stored.total_change_percent, 10.0);
        assert_eq!(stored.order_index, 1);
        assert_eq!(stored.added_price, 10.0);
    }

    #[test]
    fn test_bulk_increment_below_threshold() {
        let db = SqliteDb::open_in_memory().unwrap();
        for code in ["a", "b", "c", "d"] {
            db.create(&new_entry(code, 1.0)).unwrap();
        }

        let shifted = db.bulk_increment_order_index(3).unwrap();
        assert_eq!(shifted, 2);

        let indices: Vec<(String, i64)> = db
            .list_ordered()
            .unwrap()
            .into_iter()
            .map(|e| (e.code, e.order_index))
            .collect();
        assert_eq!(
            indices,
            vec![
                ("a".to_string(), 2),
                ("b".to_string(), 3),
                ("c".to_string(), 3),
                ("d".to_string(), 4),
            ]
        );
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = SqliteDb::open_in_memory().unwrap();
        let entry = db.create(&new_entry("sh600000", 10.0)).unwrap();

        let result: Result<()> = db.transaction(|conn| {
            watchlist::set_order_index(conn, entry.id, 50)?;
            Err(AppError::Internal("abort".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(db.get_by_id(entry.id).unwrap().order_index, 1);
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("watchlist.db");

        {
            let db = SqliteDb::open(&path).unwrap();
            db.create(&new_entry("sh600000", 10.0)).unwrap();
        }

        let db = SqliteDb::open(&path).unwrap();
        let entries = db.list_ordered().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].code, "sh600000");
        assert_eq!(entries[0].added_price, 10.0);
    }
}
