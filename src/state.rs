//! Application state management

use crate::config::AppConfig;
use crate::db::sqlite::SqliteDb;
use crate::error::Result;
use crate::quotes::{QuoteSource, TencentQuoteSource};
use std::sync::Arc;

/// Shared services handed to request handlers and the refresh scheduler.
///
/// Cloning is cheap; all clones share the same store and quote source.
#[derive(Clone)]
pub struct AppState {
    /// Watchlist store
    pub sqlite: Arc<SqliteDb>,

    /// Quote provider
    pub quotes: Arc<dyn QuoteSource>,

    /// Startup configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Open the database and build the quote client described by `config`
    pub fn new(config: AppConfig) -> Result<Self> {
        tracing::info!("Database path: {:?}", config.database.path);

        let sqlite = Arc::new(SqliteDb::open(&config.database.path)?);
        let quotes: Arc<dyn QuoteSource> = Arc::new(TencentQuoteSource::new(&config.quotes)?);

        Ok(Self::from_parts(sqlite, quotes, config))
    }

    /// Assemble state from already-built components
    pub fn from_parts(sqlite: Arc<SqliteDb>, quotes: Arc<dyn QuoteSource>, config: AppConfig) -> Self {
        Self {
            sqlite,
            quotes,
            config: Arc::new(config),
        }
    }
}
