//! Bot configuration.
//!
//! Everything is sourced from environment variables (a `.env` file is loaded
//! by the binary before this runs):
//!
//! | Variable            | Required | Default                    |
//! |---------------------|----------|----------------------------|
//! | `BOT_TOKEN`         | yes      |                            |
//! | `GROUP_ID`          | yes      |                            |
//! | `ADMIN_IDS`         | yes      | comma-separated user ids   |
//! | `CSV_FILE`          | no       | `username.csv`             |
//! | `DELAY_SECONDS`     | no       | `5`                        |
//! | `TELEGRAM_API_URL`  | no       | `https://api.telegram.org` |
//! | `POLL_TIMEOUT_SECS` | no       | `30`                       |

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_CSV_FILE: &str = "username.csv";
pub const DEFAULT_DELAY_SECS: u64 = 5;
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("invalid value for {var} ({value:?}): {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration for the bot.
#[derive(Clone)]
pub struct BotConfig {
    pub bot_token: String,
    /// Destination group every identity is added to
    pub group_id: i64,
    /// Operators allowed to issue commands; they also receive every broadcast
    pub admin_ids: Vec<i64>,
    pub csv_file: PathBuf,
    /// Pause between two consecutive adds in a batch
    pub delay: Duration,
    pub api_url: String,
    pub poll_timeout_secs: u64,
}

// Hand-written so the token never ends up in logs.
impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token", &"<redacted>")
            .field("group_id", &self.group_id)
            .field("admin_ids", &self.admin_ids)
            .field("csv_file", &self.csv_file)
            .field("delay", &self.delay)
            .field("api_url", &self.api_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            group_id: 0,
            admin_ids: Vec::new(),
            csv_file: PathBuf::from(DEFAULT_CSV_FILE),
            delay: Duration::from_secs(DEFAULT_DELAY_SECS),
            api_url: DEFAULT_API_URL.to_string(),
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
        }
    }
}

impl BotConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (environment, map in tests, ...)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("BOT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let group_id = parse_required(&lookup, "GROUP_ID")?;

        let raw_admins = lookup("ADMIN_IDS").ok_or(ConfigError::Missing("ADMIN_IDS"))?;
        let admin_ids = parse_admin_ids(&raw_admins)?;

        let defaults = Self::default();

        let csv_file = lookup("CSV_FILE")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.csv_file);

        let delay_secs = parse_optional(&lookup, "DELAY_SECONDS", defaults.delay.as_secs())?;
        let poll_timeout_secs =
            parse_optional(&lookup, "POLL_TIMEOUT_SECS", defaults.poll_timeout_secs)?;

        let api_url = lookup("TELEGRAM_API_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or(defaults.api_url);

        Ok(Self {
            bot_token,
            group_id,
            admin_ids,
            csv_file,
            delay: Duration::from_secs(delay_secs),
            api_url,
            poll_timeout_secs,
        })
    }

    /// Set the bot token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.bot_token = token.into();
        self
    }

    /// Set the destination group.
    pub fn with_group_id(mut self, group_id: i64) -> Self {
        self.group_id = group_id;
        self
    }

    /// Set the admin allow-list. Duplicates are dropped, order is kept.
    pub fn with_admins(mut self, admins: impl IntoIterator<Item = i64>) -> Self {
        self.admin_ids.clear();
        for id in admins {
            if !self.admin_ids.contains(&id) {
                self.admin_ids.push(id);
            }
        }
        self
    }

    /// Set the source list path.
    pub fn with_csv_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.csv_file = path.into();
        self
    }

    /// Set the pause between adds.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the Bot API root.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_timeout_secs(mut self, secs: u64) -> Self {
        self.poll_timeout_secs = secs;
        self
    }
}

fn parse_required<F>(lookup: &F, var: &'static str) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(var).ok_or(ConfigError::Missing(var))?;
    value.trim().parse().map_err(|e: std::num::ParseIntError| {
        ConfigError::Invalid {
            var,
            value: value.clone(),
            reason: e.to_string(),
        }
    })
}

fn parse_optional<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) if value.trim().is_empty() => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                var,
                value: value.clone(),
                reason: e.to_string(),
            }),
    }
}

fn parse_admin_ids(raw: &str) -> Result<Vec<i64>, ConfigError> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id = part.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
            var: "ADMIN_IDS",
            value: raw.to_string(),
            reason: format!("{part:?}: {e}"),
        })?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        return Err(ConfigError::Invalid {
            var: "ADMIN_IDS",
            value: raw.to_string(),
            reason: "at least one admin id is required".to_string(),
        });
    }
    Ok(ids)
}
