//! Engine configuration
//!
//! Loaded from a JSON file:
//!
//! ```json
//! {
//!   "data_dir": "./forms-data",
//!   "timezone": "+02:00",
//!   "submission_list_limit": 100,
//!   "mail": { "smtp_host": "localhost", "smtp_port": 1025, "from_email": "forms@example.com" }
//! }
//! ```
//!
//! Only `data_dir` is required. Without a `mail` block notifications are
//! kept in memory instead of being sent.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::notification::MailConfig;

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormsConfig {
    /// Directory holding form records and the submissions log
    pub data_dir: String,

    /// Offset used to present submission dates, `UTC` or `±HH:MM`
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// SMTP settings; absent means in-memory delivery
    #[serde(default)]
    pub mail: Option<MailConfig>,

    /// Upper bound on listed submissions
    #[serde(default = "default_submission_list_limit")]
    pub submission_list_limit: usize,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_submission_list_limit() -> usize {
    100
}

impl FormsConfig {
    /// Config with defaults for everything but the data directory
    pub fn new(data_dir: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            timezone: default_timezone(),
            mail: None,
            submission_list_limit: default_submission_list_limit(),
        }
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        let config: FormsConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }

        if self.submission_list_limit == 0 {
            return Err(ConfigError::Invalid("submission_list_limit must be > 0".into()));
        }

        self.timezone_offset()?;

        if let Some(mail) = &self.mail {
            if mail.smtp_host.trim().is_empty() {
                return Err(ConfigError::Invalid("mail.smtp_host must not be empty".into()));
            }
            if mail.from_email.trim().is_empty() {
                return Err(ConfigError::Invalid("mail.from_email must not be empty".into()));
            }
        }

        Ok(())
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// Parses `timezone` into a fixed offset.
    pub fn timezone_offset(&self) -> ConfigResult<FixedOffset> {
        parse_offset(&self.timezone).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "Invalid timezone: '{}'. Expected 'UTC' or '+HH:MM'.",
                self.timezone
            ))
        })
    }
}

fn parse_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("utc") || value == "Z" {
        return FixedOffset::east_opt(0);
    }

    let sign = match value.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };

    let (hours, minutes) = value[1..].split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
