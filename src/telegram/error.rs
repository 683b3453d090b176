//! Telegram error types

use std::time::Duration;
use thiserror::Error;

/// Telegram Bot API error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TelegramError {
    pub kind: TelegramErrorKind,
    pub message: String,
    pub retry_after: Option<Duration>,
}

impl TelegramError {
    pub fn new(kind: TelegramErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TelegramErrorKind::Network, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(TelegramErrorKind::Auth, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(TelegramErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(TelegramErrorKind::ServerError, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(TelegramErrorKind::BadRequest, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(TelegramErrorKind::Decode, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(TelegramErrorKind::Io, message)
    }

    /// Classify an API failure from its error code (HTTP status) and description
    pub fn from_api(code: u16, description: &str, retry_after: Option<u64>) -> Self {
        match code {
            401 | 404 => Self::auth(format!("Bot token rejected: {description}")),
            429 => {
                let err = Self::rate_limit(format!("Rate limited: {description}"));
                match retry_after {
                    Some(secs) => err.with_retry_after(Duration::from_secs(secs)),
                    None => err,
                }
            }
            400 | 403 => Self::bad_request(format!("Request rejected: {description}")),
            500..=599 => Self::server_error(format!("Server error: {description}")),
            _ => Self::new(
                TelegramErrorKind::Unknown,
                format!("HTTP {code}: {description}"),
            ),
        }
    }
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL embeds the bot token; keep it out of messages and logs
        let e = e.without_url();
        if e.is_timeout() {
            Self::network(format!("Request timeout: {e}"))
        } else if e.is_connect() {
            Self::network(format!("Connection failed: {e}"))
        } else if e.is_decode() {
            Self::decode(format!("Failed to read response: {e}"))
        } else {
            Self::network(format!("Request failed: {e}"))
        }
    }
}

/// Error classification for polling decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelegramErrorKind {
    /// Network issues, timeouts
    Network,
    /// Too many requests (429), honour `retry_after`
    RateLimit,
    /// Telegram-side failure (5xx)
    ServerError,
    /// Token invalid or revoked (401, 404)
    Auth,
    /// Request refused (400, 403), e.g. bot blocked by the user
    BadRequest,
    /// Response body did not match the expected shape
    Decode,
    /// Local file system failure while storing a download
    Io,
    Unknown,
}

impl TelegramErrorKind {
    /// Errors after which polling cannot succeed without operator action
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::Auth)
    }
}
