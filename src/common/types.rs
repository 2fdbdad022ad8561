//! Shared types used across the application.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Platform identifier of a user (owner, admins, command actors).
pub type UserId = i64;

/// A channel reference in canonical form.
///
/// Usernames are lowercased and displayed with a leading `@`; numeric channel ids
/// are kept as-is (Telegram channel ids are negative, e.g. `-1001234567890`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelRef {
    /// Public username, without the leading `@`, lowercased.
    Username(String),
    /// Numeric channel id.
    Id(i64),
}

/// Why a channel reference could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRefError {
    Empty,
    InvalidUsername(String),
}

impl fmt::Display for ChannelRefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelRefError::Empty => write!(f, "channel reference is empty"),
            ChannelRefError::InvalidUsername(name) => {
                write!(f, "'{}' is not a valid channel username", name)
            }
        }
    }
}

impl std::error::Error for ChannelRefError {}

impl ChannelRef {
    /// Normalize user input into a channel reference.
    ///
    /// `@Foo`, `foo` and ` FOO ` all become `@foo`. A bare number (optionally
    /// negative) is a channel id; anything prefixed with `@` is a username.
    pub fn parse(input: &str) -> Result<Self, ChannelRefError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ChannelRefError::Empty);
        }

        if let Some(name) = trimmed.strip_prefix('@') {
            return Self::username(name);
        }

        if let Ok(id) = trimmed.parse::<i64>() {
            return Ok(ChannelRef::Id(id));
        }

        Self::username(trimmed)
    }

    /// Build a username reference from a platform-reported name (no `@`).
    pub fn username(name: &str) -> Result<Self, ChannelRefError> {
        if name.is_empty() {
            return Err(ChannelRefError::Empty);
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ChannelRefError::InvalidUsername(name.to_string()));
        }
        Ok(ChannelRef::Username(name.to_ascii_lowercase()))
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelRef::Username(name) => write!(f, "@{}", name),
            ChannelRef::Id(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for ChannelRef {
    type Err = ChannelRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ChannelRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChannelRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ChannelRef::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Kind of media payload attached to an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    VideoNote,
    Document,
    Audio,
    Voice,
    Animation,
    Sticker,
    /// Any other non-text payload (poll, location, contact, ...).
    Other,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::VideoNote => "video note",
            MediaKind::Document => "document",
            MediaKind::Audio => "audio",
            MediaKind::Voice => "voice",
            MediaKind::Animation => "animation",
            MediaKind::Sticker => "sticker",
            MediaKind::Other => "media",
        };
        f.write_str(name)
    }
}
