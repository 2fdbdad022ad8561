//! Bot API HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::bridge::relay::{MessageSender, OwnerNotifier};
use crate::common::error::{DeliveryError, TelegramError};
use crate::common::types::{ChannelRef, UserId};
use crate::config::TelegramConfig;

use super::api::{ApiResponse, User};

/// Maximum message length for Telegram's sendMessage API.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

/// Timeout for every request except long polls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Slack added on top of the long-poll timeout before the HTTP request gives up.
const POLL_SLACK: Duration = Duration::from_secs(10);

/// 400 descriptions that mean the target chat itself is unusable.
const PERMANENT_BAD_REQUESTS: [&str; 3] = ["chat not found", "chat_id is empty", "chat_id_invalid"];

/// Thin client over the Telegram Bot API.
pub struct TelegramClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self, TelegramError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TelegramError::Http(e.without_url()))?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// Call a Bot API method and unwrap the response envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<T, TelegramError> {
        let mut request = self.http.post(self.method_url(method)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        // Strip the URL from transport errors, it contains the token.
        let response = request
            .send()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;
        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;

        match serde_json::from_str::<ApiResponse<T>>(&raw) {
            Ok(ApiResponse {
                ok: true,
                result: Some(result),
                ..
            }) => Ok(result),
            Ok(envelope) => Err(TelegramError::Api {
                code: envelope.error_code.unwrap_or_else(|| status.as_u16()),
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            }),
            Err(_) if !status.is_success() => Err(TelegramError::Api {
                code: status.as_u16(),
                description: status
                    .canonical_reason()
                    .unwrap_or("unexpected response")
                    .to_string(),
            }),
            Err(e) => Err(TelegramError::Decode(format!("{}: {}", method, e))),
        }
    }

    /// Identify the bot.
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &json!({}), None).await
    }

    /// Long-poll for updates after `offset`.
    ///
    /// Updates come back undecoded so one malformed entry cannot fail the batch.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Value>, TelegramError> {
        let body = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "channel_post"],
        });
        let timeout = Duration::from_secs(timeout_secs) + POLL_SLACK;
        self.call("getUpdates", &body, Some(timeout)).await
    }

    /// Send plain text, split into chunks that fit the API limit.
    pub async fn send_message(&self, chat_id: Value, text: &str) -> Result<(), TelegramError> {
        for chunk in split_message(text, MAX_MESSAGE_LENGTH) {
            let body = json!({
                "chat_id": chat_id,
                "text": chunk,
                "disable_web_page_preview": true,
            });
            let _: Value = self.call("sendMessage", &body, None).await?;
        }
        debug!(chat = %chat_id, "Message sent");
        Ok(())
    }

    /// Reply to a command in the chat it came from.
    pub async fn reply(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        self.send_message(json!(chat_id), text).await
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send_text(&self, destination: &ChannelRef, text: &str) -> Result<(), DeliveryError> {
        self.send_message(chat_id_value(destination), text)
            .await
            .map_err(classify)
    }
}

#[async_trait]
impl OwnerNotifier for TelegramClient {
    async fn notify(&self, owner: UserId, text: &str) -> Result<(), DeliveryError> {
        self.send_message(json!(owner), text).await.map_err(classify)
    }
}

/// The `chat_id` parameter for a channel: `"@name"` or the numeric id.
pub fn chat_id_value(channel: &ChannelRef) -> Value {
    match channel {
        ChannelRef::Username(name) => json!(format!("@{}", name)),
        ChannelRef::Id(id) => json!(id),
    }
}

/// Decide whether a failed send could succeed later.
pub fn classify(error: TelegramError) -> DeliveryError {
    match error {
        TelegramError::Api { code, description } => {
            let permanent = match code {
                401 | 403 => true,
                400 => {
                    let lowered = description.to_ascii_lowercase();
                    PERMANENT_BAD_REQUESTS.iter().any(|m| lowered.contains(m))
                }
                _ => false,
            };
            let reason = format!("{} {}", code, description);
            if permanent {
                DeliveryError::Permanent(reason)
            } else {
                DeliveryError::Transient(reason)
            }
        }
        TelegramError::Http(e) => DeliveryError::Transient(e.to_string()),
        TelegramError::Decode(e) => {
            warn!("Undecodable sendMessage response: {}", e);
            DeliveryError::Transient(e)
        }
    }
}

/// Split a message into chunks that fit Telegram's character limit.
/// Tries to split on newlines, then spaces, then hard-cuts.
fn split_message(text: &str, max_chars: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut remaining = text;

    while remaining.chars().count() > max_chars {
        let limit = remaining
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(remaining.len());
        let window = &remaining[..limit];
        let split_at = match window.rfind('\n').or_else(|| window.rfind(' ')) {
            Some(0) | None => limit,
            Some(i) => i,
        };

        chunks.push(&remaining[..split_at]);
        remaining = remaining[split_at..].trim_start();
    }

    if !remaining.is_empty() || chunks.is_empty() {
        chunks.push(remaining);
    }
    chunks
}
