//! Market-hours gate for the price refresh
//!
//! Refreshing only makes sense while the exchange is trading: Monday to
//! Friday, between the configured open and close (both inclusive, minute
//! resolution) in the exchange's timezone.

use crate::config::WindowConfig;
use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;

/// Active trading window
#[derive(Debug, Clone)]
pub struct ActiveWindow {
    open: NaiveTime,
    close: NaiveTime,
    timezone: Tz,
}

impl ActiveWindow {
    pub fn new(config: &WindowConfig) -> Self {
        Self {
            open: config.open,
            close: config.close,
            timezone: config.timezone,
        }
    }

    /// Whether `now` falls inside the window
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.timezone);

        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }

        // Compare at minute resolution so the whole closing minute counts
        let minute = match NaiveTime::from_hms_opt(local.hour(), local.minute(), 0) {
            Some(t) => t,
            None => return false,
        };

        minute >= self.open && minute <= self.close
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window() -> ActiveWindow {
        ActiveWindow::new(&WindowConfig::default())
    }

    /// Shanghai wall-clock time on the given day, as UTC
    fn shanghai(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        chrono_tz::Asia::Shanghai
            .with_ymd_and_hms(y, m, d, h, min, s)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_weekday_bounds() {
        // 2024-01-03 is a Wednesday
        let w = window();
        assert!(!w.contains(shanghai(2024, 1, 3, 8, 59, 59)));
        assert!(w.contains(shanghai(2024, 1, 3, 9, 0, 0)));
        assert!(w.contains(shanghai(2024, 1, 3, 12, 0, 0)));
        assert!(w.contains(shanghai(2024, 1, 3, 16, 30, 0)));
        assert!(w.contains(shanghai(2024, 1, 3, 16, 30, 59)));
        assert!(!w.contains(shanghai(2024, 1, 3, 16, 31, 0)));
        assert!(!w.contains(shanghai(2024, 1, 3, 23, 0, 0)));
    }

    #[test]
    fn test_weekend_is_inactive() {
        let w = window();
        assert!(!w.contains(shanghai(2024, 1, 6, 10, 0, 0)));
        assert!(!w.contains(shanghai(2024, 1, 7, 10, 0, 0)));
        assert!(w.contains(shanghai(2024, 1, 8, 10, 0, 0)));
    }

    #[test]
    fn test_uses_configured_timezone() {
        // 02:00 UTC on a Wednesday is 10:00 in Shanghai but 21:00 (Tuesday) in New York
        let now = Utc.with_ymd_and_hms(2024, 1, 3, 2, 0, 0).unwrap();
        assert!(window().contains(now));

        let new_york = ActiveWindow::new(&WindowConfig {
            timezone: chrono_tz::America::New_York,
            ..WindowConfig::default()
        });
        assert!(!new_york.contains(now));
    }
}
