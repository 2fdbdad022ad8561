//! Bot API wire types.
//!
//! Only the fields the relay needs are modelled; unknown fields are ignored.

use serde::Deserialize;
use serde_json::Value;

use crate::common::messages::{ChannelPost, CommandEvent, RelayEvent};
use crate::common::types::MediaKind;

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<u16>,
}

/// An update body. The poller reads `update_id` before decoding.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub message: Option<Message>,
    pub channel_post: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub username: Option<String>,
}

/// A message or channel post.
///
/// Media payloads are kept opaque; only their presence matters.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub from: Option<User>,
    pub chat: Chat,
    /// Text of a plain message. Media captions arrive separately and are ignored.
    pub text: Option<String>,
    pub photo: Option<Value>,
    pub video: Option<Value>,
    pub video_note: Option<Value>,
    pub animation: Option<Value>,
    pub document: Option<Value>,
    pub audio: Option<Value>,
    pub voice: Option<Value>,
    pub sticker: Option<Value>,
    pub poll: Option<Value>,
    pub location: Option<Value>,
    pub venue: Option<Value>,
    pub contact: Option<Value>,
    pub dice: Option<Value>,
    pub game: Option<Value>,
}

impl Message {
    /// The kind of media attached, if any.
    pub fn media_kind(&self) -> Option<MediaKind> {
        // Animations also carry a `document` field, so check them first.
        let kinds = [
            (self.photo.is_some(), MediaKind::Photo),
            (self.video.is_some(), MediaKind::Video),
            (self.video_note.is_some(), MediaKind::VideoNote),
            (self.animation.is_some(), MediaKind::Animation),
            (self.document.is_some(), MediaKind::Document),
            (self.audio.is_some(), MediaKind::Audio),
            (self.voice.is_some(), MediaKind::Voice),
            (self.sticker.is_some(), MediaKind::Sticker),
        ];
        if let Some((_, kind)) = kinds.iter().find(|(present, _)| *present) {
            return Some(*kind);
        }

        let other = self.poll.is_some()
            || self.location.is_some()
            || self.venue.is_some()
            || self.contact.is_some()
            || self.dice.is_some()
            || self.game.is_some();
        other.then_some(MediaKind::Other)
    }

    fn into_channel_post(self) -> ChannelPost {
        let media = self.media_kind();
        ChannelPost {
            chat_id: self.chat.id,
            username: self.chat.username,
            text: self.text,
            media,
        }
    }

    fn into_command(self) -> Option<CommandEvent> {
        let from = self.from?;
        let text = self.text?;
        if !text.trim_start().starts_with('/') {
            return None;
        }
        Some(CommandEvent {
            actor_id: from.id,
            reply_chat_id: self.chat.id,
            raw_text: text,
        })
    }
}

impl Update {
    /// Translate into a platform-neutral event.
    ///
    /// Returns `None` for updates the relay does not care about.
    pub fn into_event(self) -> Option<RelayEvent> {
        if let Some(post) = self.channel_post {
            return Some(RelayEvent::ChannelPost(post.into_channel_post()));
        }
        self.message
            .and_then(Message::into_command)
            .map(RelayEvent::Command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(json: &str) -> Update {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_text_channel_post() {
        let event = update(
            r#"{"update_id": 10, "channel_post": {
                "message_id": 5,
                "chat": {"id": -100123, "type": "channel", "username": "News", "title": "News"},
                "date": 1700000000,
                "text": "Hello world"
            }}"#,
        )
        .into_event();

        match event {
            Some(RelayEvent::ChannelPost(post)) => {
                assert_eq!(post.chat_id, -100123);
                assert_eq!(post.username.as_deref(), Some("News"));
                assert_eq!(post.text.as_deref(), Some("Hello world"));
                assert!(post.media.is_none());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_photo_post_with_caption_is_media() {
        let event = update(
            r#"{"update_id": 11, "channel_post": {
                "message_id": 6,
                "chat": {"id": -100123, "type": "channel"},
                "photo": [{"file_id": "a", "width": 1, "height": 1}],
                "caption": "look at this"
            }}"#,
        )
        .into_event();

        match event {
            Some(RelayEvent::ChannelPost(post)) => {
                assert_eq!(post.media, Some(MediaKind::Photo));
                assert!(post.text.is_none());
                assert!(post.username.is_none());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_animation_wins_over_document() {
        let update = update(
            r#"{"update_id": 12, "channel_post": {
                "message_id": 7,
                "chat": {"id": -1, "type": "channel"},
                "animation": {"file_id": "g"},
                "document": {"file_id": "g"}
            }}"#,
        );
        let post = update.channel_post.unwrap();
        assert_eq!(post.media_kind(), Some(MediaKind::Animation));
    }

    #[test]
    fn test_poll_is_other_media() {
        let update = update(
            r#"{"update_id": 13, "channel_post": {
                "message_id": 8,
                "chat": {"id": -1, "type": "channel"},
                "poll": {"id": "p", "question": "?"}
            }}"#,
        );
        assert_eq!(update.channel_post.unwrap().media_kind(), Some(MediaKind::Other));
    }

    #[test]
    fn test_private_command_message() {
        let event = update(
            r#"{"update_id": 14, "message": {
                "message_id": 9,
                "from": {"id": 42, "is_bot": false, "first_name": "Ann", "username": "ann"},
                "chat": {"id": 42, "type": "private"},
                "text": "/addsource @news"
            }}"#,
        )
        .into_event();

        match event {
            Some(RelayEvent::Command(command)) => {
                assert_eq!(command.actor_id, 42);
                assert_eq!(command.reply_chat_id, 42);
                assert_eq!(command.raw_text, "/addsource @news");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_plain_private_message_ignored() {
        let event = update(
            r#"{"update_id": 15, "message": {
                "message_id": 10,
                "from": {"id": 42, "first_name": "Ann"},
                "chat": {"id": 42, "type": "private"},
                "text": "hello bot"
            }}"#,
        )
        .into_event();
        assert!(event.is_none());
    }

    #[test]
    fn test_empty_update_ignored() {
        assert!(update(r#"{"update_id": 16}"#).into_event().is_none());
    }

    #[test]
    fn test_error_envelope() {
        let response: ApiResponse<Vec<Update>> = serde_json::from_str(
            r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#,
        )
        .unwrap();
        assert!(!response.ok);
        assert_eq!(response.error_code, Some(400));
        assert!(response.result.is_none());
    }
}
