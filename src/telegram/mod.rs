//! Telegram Bot API adapter.
//!
//! ## Module Structure
//!
//! - `api`: wire types and their translation into `RelayEvent`s
//! - `client`: `TelegramClient`, the HTTP client; implements the relay's
//!   `MessageSender` and `OwnerNotifier`
//! - `poller`: `UpdatePoller`, the long-poll loop

pub mod api;
pub mod client;
pub mod poller;

pub use client::TelegramClient;
pub use poller::UpdatePoller;
