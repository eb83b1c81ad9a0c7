//! Timezone utilities for day bucketing
//!
//! Logs are stored in UTC but grouped into calendar days as the viewer sees
//! them. This module resolves which timezone "a day" means.

use crate::error::{AilogsError, Result};
use crate::types::DailyDate;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::str::FromStr;
use tracing::debug;

/// Configuration for timezone handling
#[derive(Debug, Clone)]
pub struct TimezoneConfig {
    /// The timezone to use for date operations
    pub tz: Tz,
    /// Whether the timezone is UTC
    pub is_utc: bool,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        let tz = get_local_timezone();
        Self {
            is_utc: tz == Tz::UTC,
            tz,
        }
    }
}

impl TimezoneConfig {
    /// Always UTC, independent of the host
    pub fn utc() -> Self {
        Self {
            tz: Tz::UTC,
            is_utc: true,
        }
    }

    /// Resolve from CLI flags; `--utc` wins over `--timezone`
    pub fn from_cli(timezone_str: Option<&str>, use_utc: bool) -> Result<Self> {
        if use_utc {
            return Ok(Self::utc());
        }

        match timezone_str {
            Some(tz_str) => {
                let tz = Tz::from_str(tz_str).map_err(|_| {
                    AilogsError::InvalidTimezone(format!(
                        "'{tz_str}'. Use format like 'Europe/Berlin', 'America/New_York', or 'UTC'"
                    ))
                })?;
                Ok(Self {
                    tz,
                    is_utc: tz == Tz::UTC,
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Get the display name for the configured timezone
    pub fn display_name(&self) -> &str {
        if self.is_utc { "UTC" } else { self.tz.name() }
    }

    /// Calendar day of `now` in this timezone
    pub fn today(&self, now: DateTime<Utc>) -> DailyDate {
        DailyDate::new(now.with_timezone(&self.tz).date_naive())
    }
}

/// Detect the system's local timezone, falling back to UTC
pub fn get_local_timezone() -> Tz {
    if let Ok(tz_str) = std::env::var("TZ") {
        if let Ok(tz) = Tz::from_str(&tz_str) {
            debug!("Using timezone from TZ environment variable: {}", tz_str);
            return tz;
        }
    }

    match iana_time_zone::get_timezone() {
        Ok(tz_str) => Tz::from_str(&tz_str).unwrap_or_else(|_| {
            debug!("Unrecognised system timezone '{}', falling back to UTC", tz_str);
            Tz::UTC
        }),
        Err(e) => {
            debug!("Could not detect local timezone: {:?}, falling back to UTC", e);
            Tz::UTC
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timezone_config_utc() {
        let config = TimezoneConfig::from_cli(Some("Asia/Tokyo"), true).unwrap();
        assert!(config.is_utc);
        assert_eq!(config.display_name(), "UTC");
    }

    #[test]
    fn test_timezone_config_explicit() {
        let config = TimezoneConfig::from_cli(Some("Europe/Berlin"), false).unwrap();
        assert!(!config.is_utc);
        assert_eq!(config.display_name(), "Europe/Berlin");
    }

    #[test]
    fn test_timezone_config_invalid() {
        let result = TimezoneConfig::from_cli(Some("Mars/Olympus"), false);
        assert!(matches!(result, Err(AilogsError::InvalidTimezone(_))));
    }

    #[test]
    fn test_today_respects_timezone() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 22, 0, 0).unwrap();
        let tokyo = TimezoneConfig::from_cli(Some("Asia/Tokyo"), false).unwrap();
        assert_eq!(tokyo.today(now).format("%Y-%m-%d"), "2024-07-01");
        assert_eq!(TimezoneConfig::utc().today(now).format("%Y-%m-%d"), "2024-06-30");
    }
}
