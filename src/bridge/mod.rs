//! Relay core: who may configure the bot, which posts qualify, and how
//! qualifying posts reach the destination.
//!
//! ## Module Structure
//!
//! - `auth`: authorization tiers (`Tier`, `authorize`)
//! - `channels`: channel bundle between the poller and the event loop
//! - `commands`: privileged command surface (`CommandDispatcher`)
//! - `filter`: text-only eligibility rules (`MessageFilter`)
//! - `relay`: copy pipeline and delivery failure handling (`RelayEngine`)

pub mod auth;
pub mod channels;
pub mod commands;
pub mod filter;
pub mod relay;

pub use channels::ChannelBundle;
pub use commands::CommandDispatcher;
pub use filter::MessageFilter;
pub use relay::{MessageSender, OwnerNotifier, RelayEngine, RelayOutcome};
