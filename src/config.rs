//! Process configuration
//!
//! Built once at startup from environment variables (an optional `.env`
//! file is loaded first). Every setting has a default; a variable that is
//! set but cannot be parsed is a startup error.

use crate::error::{AppError, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Top-level configuration handed to every component at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub quotes: QuoteConfig,
    pub refresh: RefreshConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

/// Quote provider endpoint
#[derive(Debug, Clone)]
pub struct QuoteConfig {
    pub base_url: String,
    pub timeout: Duration,
}

/// Recurring price refresh
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub interval: Duration,
    pub window: WindowConfig,
}

/// Active trading window bounds (local wall-clock time in `timezone`)
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub timezone: Tz,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                path: PathBuf::from("stock.db"),
            },
            quotes: QuoteConfig {
                base_url: "https://qt.gtimg.cn".to_string(),
                timeout: Duration::from_secs(10),
            },
            refresh: RefreshConfig {
                interval: Duration::from_secs(5),
                window: WindowConfig::default(),
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                cors_origins: vec![
                    "http://localhost:5173".to_string(),
                    "http://localhost:8099".to_string(),
                ],
            },
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(16, 30, 0).unwrap_or_default(),
            timezone: chrono_tz::Asia::Shanghai,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("WATCHLIST_DB_PATH") {
            config.database.path = PathBuf::from(path);
        }

        if let Some(url) = lookup("WATCHLIST_QUOTE_URL") {
            config.quotes.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "WATCHLIST_QUOTE_TIMEOUT_SECS")? {
            config.quotes.timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_var::<u64>(&lookup, "WATCHLIST_REFRESH_INTERVAL_SECS")? {
            if secs == 0 {
                return Err(AppError::Config(
                    "WATCHLIST_REFRESH_INTERVAL_SECS must be greater than zero".to_string(),
                ));
            }
            config.refresh.interval = Duration::from_secs(secs);
        }
        if let Some(open) = lookup("WATCHLIST_MARKET_OPEN") {
            config.refresh.window.open = parse_hhmm("WATCHLIST_MARKET_OPEN", &open)?;
        }
        if let Some(close) = lookup("WATCHLIST_MARKET_CLOSE") {
            config.refresh.window.close = parse_hhmm("WATCHLIST_MARKET_CLOSE", &close)?;
        }
        if let Some(tz) = lookup("WATCHLIST_TIMEZONE") {
            config.refresh.window.timezone = tz
                .parse::<Tz>()
                .map_err(|e| AppError::Config(format!("Invalid WATCHLIST_TIMEZONE '{}': {}", tz, e)))?;
        }
        if config.refresh.window.open > config.refresh.window.close {
            return Err(AppError::Config(format!(
                "Market open {} is after market close {}",
                config.refresh.window.open.format("%H:%M"),
                config.refresh.window.close.format("%H:%M")
            )));
        }

        if let Some(host) = lookup("WATCHLIST_HOST") {
            config.server.host = host;
        }
        if let Some(port) = parse_var::<u16>(&lookup, "WATCHLIST_PORT")? {
            config.server.port = port;
        }
        if let Some(origins) = lookup("WATCHLIST_CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(config)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::Config(format!("Invalid {} '{}': {}", key, raw, e))),
        None => Ok(None),
    }
}

fn parse_hhmm(key: &str, raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|e| AppError::Config(format!("Invalid {} '{}': {}", key, raw, e)))
}
