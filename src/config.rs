//! Bot configuration from environment variables

use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_DB_PATH: &str = "visitor_management.db";
pub const DEFAULT_IMAGE_DIR: &str = "visitor_images";
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TELEGRAM_BOT_TOKEN is not set")]
    MissingToken,
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Runtime configuration for the visitor bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    /// Telegram Bot API base URL (overridable for a local Bot API server)
    pub api_base: String,
    /// Long-poll timeout passed to `getUpdates`
    pub poll_timeout_secs: u64,
    pub db_path: PathBuf,
    pub image_dir: PathBuf,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let poll_timeout_secs = match lookup("TELEGRAM_POLL_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "TELEGRAM_POLL_TIMEOUT_SECS",
                    value: raw.clone(),
                })?,
            None => DEFAULT_POLL_TIMEOUT_SECS,
        };

        Ok(Self {
            bot_token,
            api_base: lookup("TELEGRAM_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            poll_timeout_secs,
            db_path: lookup("VISITOR_DB_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from),
            image_dir: lookup("VISITOR_IMAGE_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_IMAGE_DIR), PathBuf::from),
        })
    }
}
