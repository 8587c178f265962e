//! Application configuration

use crate::{Error, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimerConfig {
    /// A running session older than this at load is treated as abandoned
    pub stale_after_secs: u64,
    /// Sessions longer than this get the `long_duration` flag
    pub long_session_secs: u64,
    /// Display refresh cadence
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetentionConfig {
    /// Maximum number of session records kept; `None` keeps everything
    pub max_records: Option<usize>,
}

/// Largest accepted stale/long-session threshold
pub const MAX_THRESHOLD_SECS: u64 = 366 * 24 * 60 * 60;

/// Seconds as a chrono duration, clamped to the accepted range
fn threshold(secs: u64) -> Duration {
    Duration::try_seconds(secs.min(MAX_THRESHOLD_SECS) as i64).unwrap_or(Duration::MAX)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.timer.validate()?;
        self.retention.validate()?;

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(Error::Validation(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if let Some(ref dir) = self.data_dir
            && dir.as_os_str().is_empty()
        {
            return Err(Error::Validation("Data directory cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Apply a `key = value` update from the command line
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let parse_u64 = |v: &str| {
            v.parse::<u64>()
                .map_err(|_| Error::Validation(format!("'{}' expects a whole number, got '{}'", key, v)))
        };

        let mut next = self.clone();
        match key {
            "data_dir" => {
                next.data_dir = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "log_level" => next.log_level = value.to_lowercase(),
            "timer.stale_after_secs" => next.timer.stale_after_secs = parse_u64(value)?,
            "timer.long_session_secs" => next.timer.long_session_secs = parse_u64(value)?,
            "timer.tick_interval_ms" => next.timer.tick_interval_ms = parse_u64(value)?,
            "retention.max_records" => {
                next.retention.max_records = match value {
                    "" | "none" | "unlimited" => None,
                    v => Some(parse_u64(v)? as usize),
                };
            }
            _ => return Err(Error::Validation(format!("Unknown config key '{}'", key))),
        }

        next.validate()?;
        *self = next;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            data_dir: None,
            timer: TimerConfig::default(),
            retention: RetentionConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl TimerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stale_after_secs == 0 {
            return Err(Error::Validation(
                "Stale threshold must be greater than 0".to_string(),
            ));
        }

        if self.long_session_secs == 0 {
            return Err(Error::Validation(
                "Long session threshold must be greater than 0".to_string(),
            ));
        }

        for (name, secs) in [
            ("Stale threshold", self.stale_after_secs),
            ("Long session threshold", self.long_session_secs),
        ] {
            if secs > MAX_THRESHOLD_SECS {
                return Err(Error::Validation(format!(
                    "{} must be at most {} seconds (one year), got {}",
                    name, MAX_THRESHOLD_SECS, secs
                )));
            }
        }

        if !(100..=60_000).contains(&self.tick_interval_ms) {
            return Err(Error::Validation(format!(
                "Tick interval must be between 100 and 60000 ms, got {}",
                self.tick_interval_ms
            )));
        }

        Ok(())
    }

    pub fn stale_after(&self) -> Duration {
        threshold(self.stale_after_secs)
    }

    pub fn long_session(&self) -> Duration {
        threshold(self.long_session_secs)
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: 24 * 60 * 60,
            long_session_secs: 24 * 60 * 60,
            tick_interval_ms: 1000,
        }
    }
}

impl RetentionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_records == Some(0) {
            return Err(Error::Validation(
                "Record cap must be greater than 0 (use none for unlimited)".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_records: Some(10_000),
        }
    }
}
