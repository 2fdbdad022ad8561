//! Error types for the application.

use thiserror::Error;

use crate::common::types::ChannelRef;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Settings persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to write settings to '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure to deliver a message to a channel or user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// Worth nothing more than a log line; the next message may well succeed.
    #[error("transient delivery failure: {0}")]
    Transient(String),

    /// The target is missing, inaccessible or invalid. Retrying cannot help.
    #[error("permanent delivery failure: {0}")]
    Permanent(String),
}

impl DeliveryError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, DeliveryError::Permanent(_))
    }
}

/// Errors from the privileged command surface.
///
/// The `Display` form is what the invoking user sees, so it never carries
/// internal error detail.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("🚫 You are not authorized to use this command.")]
    Unauthorized,

    #[error("🚫 Only the bot owner can add admins.")]
    OwnerOnly,

    #[error("⚠️ {0}")]
    InvalidChannel(String),

    #[error("{0} is already in source channels.")]
    Duplicate(ChannelRef),

    #[error("{0} is not in source channels.")]
    NotFound(ChannelRef),

    #[error("{0} is already the destination channel.")]
    AlreadySet(ChannelRef),

    #[error(
        "⚠️ Adding @{0} as admin requires their user ID. \
         Please ask them to send /start to me privately first so their ID becomes known."
    )]
    AdminResolution(String),

    #[error("⚠️ Failed to save settings. Please try again later.")]
    Storage(#[from] StoreError),
}

/// Telegram Bot API errors.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bot API error {code}: {description}")]
    Api { code: u16, description: String },

    #[error("Failed to decode Bot API response: {0}")]
    Decode(String),
}
