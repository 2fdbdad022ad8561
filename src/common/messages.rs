//! Canonical inbound event types.
//!
//! Platform adapters translate their native updates into these types so the
//! relay engine and command dispatcher never see vendor structures.

use crate::common::types::{ChannelRef, MediaKind, UserId};

/// An inbound event delivered by the platform adapter.
#[derive(Debug, Clone)]
pub enum RelayEvent {
    /// A text command from a user.
    Command(CommandEvent),
    /// A new post in a channel the bot can read.
    ChannelPost(ChannelPost),
}

/// A command invocation.
#[derive(Debug, Clone)]
pub struct CommandEvent {
    /// Who sent the command.
    pub actor_id: UserId,
    /// Chat the reply goes back to.
    pub reply_chat_id: i64,
    /// Raw message text, including the leading `/command` token.
    pub raw_text: String,
}

/// A post published in a channel.
#[derive(Debug, Clone)]
pub struct ChannelPost {
    /// Numeric channel id (always present).
    pub chat_id: i64,
    /// Public username without `@` (absent for private channels).
    pub username: Option<String>,
    /// Message text. Captions of media posts are not text.
    pub text: Option<String>,
    /// Attached media, if any.
    pub media: Option<MediaKind>,
}

impl ChannelPost {
    /// Every identifier form the origin channel can be matched by.
    ///
    /// The username form comes first since that is what admins usually configure.
    pub fn origin_refs(&self) -> Vec<ChannelRef> {
        let mut refs = Vec::with_capacity(2);
        if let Some(username) = self.username.as_deref() {
            if let Ok(channel) = ChannelRef::username(username) {
                refs.push(channel);
            }
        }
        refs.push(ChannelRef::Id(self.chat_id));
        refs
    }
}
