//! SQLite connection utilities

use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Open a SQLite connection, creating the parent directory when needed
pub fn create_connection(path: &Path) -> crate::error::Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    conn.busy_timeout(Duration::from_secs(5))?;

    tracing::info!("Opened watchlist database at {:?}", path);
    Ok(conn)
}
