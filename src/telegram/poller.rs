//! Long-polling update loop.

use std::sync::Arc;
use std::time::Duration;

use backon::BackoffBuilder;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::bridge::channels::SourceChannels;
use crate::common::messages::RelayEvent;

use super::api::Update;
use super::client::TelegramClient;

const MAX_POLL_DELAY: Duration = Duration::from_secs(60);

/// Create an exponential backoff iterator for failed polls.
/// 1s initial, 60s max, factor 2, with jitter, unlimited retries.
fn poll_backoff() -> impl Iterator<Item = Duration> {
    backon::ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(MAX_POLL_DELAY)
        .with_factor(2.0)
        .with_jitter()
        .without_max_times()
        .build()
}

/// Decode a batch of updates and compute the next offset.
///
/// Every update is acknowledged, including those that produce no event and
/// those that fail to decode.
fn absorb(offset: i64, updates: Vec<Value>) -> (i64, Vec<RelayEvent>) {
    let mut next = offset;
    let mut events = Vec::new();

    for raw in updates {
        if let Some(id) = raw.get("update_id").and_then(Value::as_i64) {
            next = next.max(id + 1);
        }
        match serde_json::from_value::<Update>(raw) {
            Ok(update) => events.extend(update.into_event()),
            Err(e) => warn!("Skipping undecodable update: {}", e),
        }
    }

    (next, events)
}

/// Fetches updates and forwards them to the event loop until shutdown.
pub struct UpdatePoller {
    client: Arc<TelegramClient>,
    timeout_secs: u64,
    channels: SourceChannels,
}

impl UpdatePoller {
    pub fn new(client: Arc<TelegramClient>, timeout_secs: u64, channels: SourceChannels) -> Self {
        Self {
            client,
            timeout_secs,
            channels,
        }
    }

    pub async fn run(self) {
        let UpdatePoller {
            client,
            timeout_secs,
            channels:
                SourceChannels {
                    event_tx,
                    mut shutdown_rx,
                },
        } = self;

        let mut offset = 0;
        let mut backoff = poll_backoff();
        info!("Polling for updates...");

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let result = tokio::select! {
                result = client.get_updates(offset, timeout_secs) => result,
                _ = shutdown_rx.changed() => break,
            };

            match result {
                Ok(updates) => {
                    backoff = poll_backoff();
                    let (next, events) = absorb(offset, updates);
                    offset = next;
                    for event in events {
                        if event_tx.send(event).is_err() {
                            info!("Event channel closed, stopping poller");
                            return;
                        }
                    }
                }
                Err(e) => {
                    let delay = backoff.next().unwrap_or(MAX_POLL_DELAY);
                    warn!(
                        "Failed to fetch updates: {}. Retrying in {:.1}s...",
                        e,
                        delay.as_secs_f64()
                    );
                    tokio::select! {
                        _ = sleep(delay) => {}
                        _ = shutdown_rx.changed() => break,
                    }
                }
            }
        }

        debug!(offset, "Poll loop exited");
        info!("Update poller stopped");
    }
}
