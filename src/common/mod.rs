//! Common utilities and types shared across the application.

pub mod error;
pub mod messages;
pub mod types;

pub use messages::{ChannelPost, CommandEvent, RelayEvent};
pub use types::{ChannelRef, MediaKind, UserId};
