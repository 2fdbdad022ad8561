//! Relay engine that copies accepted channel posts to the destination.
//!
//! Each post walks a fixed sequence of checks and stops at the first one
//! that fails: working flag, source membership, text-only filter, destination
//! set. Only then is a single send attempted. Delivery is at-most-once; a
//! failed send is never retried.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::common::error::DeliveryError;
use crate::common::messages::ChannelPost;
use crate::common::types::{ChannelRef, UserId};
use crate::store::{ConfigStore, Mutation};

use super::filter::{MessageFilter, Rejection};

/// Publishes text to a channel.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_text(&self, destination: &ChannelRef, text: &str) -> Result<(), DeliveryError>;
}

/// Delivers out-of-band alerts to the owner.
#[async_trait]
pub trait OwnerNotifier: Send + Sync {
    async fn notify(&self, owner: UserId, text: &str) -> Result<(), DeliveryError>;
}

/// What happened to a channel post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Relay is stopped.
    Paused,
    /// The origin channel is not a configured source.
    NotSource,
    /// The post is not plain text.
    Filtered(Rejection),
    /// No destination configured.
    NoDestination,
    /// Copied to the destination.
    Delivered(ChannelRef),
    /// Transient failure, post dropped.
    Dropped(DeliveryError),
    /// Permanent failure, relay switched off.
    Disabled(DeliveryError),
}

/// Result of an auto-disable attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disable {
    Flipped,
    AlreadyStopped,
    /// The failed destination is no longer the configured one.
    Superseded,
}

/// The main relay engine.
pub struct RelayEngine {
    store: Arc<ConfigStore>,
    sender: Arc<dyn MessageSender>,
    notifier: Arc<dyn OwnerNotifier>,
    filter: MessageFilter,
    /// Upper bound for one send (and one owner alert).
    send_timeout: Duration,
}

impl RelayEngine {
    pub fn new(
        store: Arc<ConfigStore>,
        sender: Arc<dyn MessageSender>,
        notifier: Arc<dyn OwnerNotifier>,
        filter: MessageFilter,
        send_timeout: Duration,
    ) -> Self {
        Self {
            store,
            sender,
            notifier,
            filter,
            send_timeout,
        }
    }

    /// Handle a post on its own task so a slow send cannot hold up other events.
    pub fn spawn_relay(self: &Arc<Self>, post: ChannelPost) -> JoinHandle<RelayOutcome> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.relay(&post).await })
    }

    /// Run one post through the relay checks and deliver it if accepted.
    pub async fn relay(&self, post: &ChannelPost) -> RelayOutcome {
        let settings = self.store.snapshot().await;

        if !settings.working {
            return RelayOutcome::Paused;
        }

        let origin = post.origin_refs();
        if !settings.is_source(&origin) {
            return RelayOutcome::NotSource;
        }
        let Some(source) = origin.first() else {
            return RelayOutcome::NotSource;
        };

        if let Err(rejection) = self.filter.check(post) {
            debug!(source = %source, "Skipping post: {}", rejection);
            return RelayOutcome::Filtered(rejection);
        }

        let destination = match settings.destination_channel {
            Some(destination) => destination,
            None => {
                info!(source = %source, "Destination channel not set. Cannot copy post.");
                return RelayOutcome::NoDestination;
            }
        };

        let text = post.text.as_deref().unwrap_or_default();
        match self.deliver(&destination, text).await {
            Ok(()) => {
                info!(source = %source, destination = %destination, "Copied post");
                RelayOutcome::Delivered(destination)
            }
            Err(e) if e.is_permanent() => {
                error!(destination = %destination, "Failed to copy post: {}", e);
                match self.disable(settings.owner_id, &destination).await {
                    Disable::Superseded => RelayOutcome::Dropped(e),
                    Disable::Flipped | Disable::AlreadyStopped => RelayOutcome::Disabled(e),
                }
            }
            Err(e) => {
                warn!(destination = %destination, "Failed to copy post, dropping it: {}", e);
                RelayOutcome::Dropped(e)
            }
        }
    }

    /// Send with the configured timeout. A timeout counts as transient.
    async fn deliver(&self, destination: &ChannelRef, text: &str) -> Result<(), DeliveryError> {
        match tokio::time::timeout(self.send_timeout, self.sender.send_text(destination, text)).await
        {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Transient(format!(
                "send timed out after {}s",
                self.send_timeout.as_secs_f64()
            ))),
        }
    }

    /// Switch relay off after a permanent failure and tell the owner.
    ///
    /// Only the call that actually flips the flag alerts the owner, so a burst
    /// of failing in-flight sends produces a single alert. A failure against a
    /// destination that has since been replaced changes nothing.
    async fn disable(&self, owner: UserId, destination: &ChannelRef) -> Disable {
        let result = self
            .store
            .update(|settings| {
                if settings.destination_channel.as_ref() != Some(destination) {
                    Mutation::Skip(Disable::Superseded)
                } else if settings.working {
                    settings.working = false;
                    Mutation::Commit(Disable::Flipped)
                } else {
                    Mutation::Skip(Disable::AlreadyStopped)
                }
            })
            .await;

        match result {
            Ok(Disable::Flipped) => warn!(destination = %destination, "Relay auto-disabled"),
            Ok(Disable::AlreadyStopped) => {
                debug!("Relay already stopped, not alerting owner again");
                return Disable::AlreadyStopped;
            }
            Ok(Disable::Superseded) => {
                info!(
                    destination = %destination,
                    "Destination changed while sending, keeping relay on"
                );
                return Disable::Superseded;
            }
            // Still alert: the destination is broken either way.
            Err(e) => error!("Failed to persist auto-disable: {}", e),
        }

        let alert = format!(
            "⚠️ Copying has been stopped automatically: messages cannot be delivered to {}.\n\
             Check that the channel exists and that I can post there, \
             then use /setdest and /startwork to resume.",
            destination
        );
        self.alert_owner(owner, &alert).await;
        Disable::Flipped
    }

    /// Best-effort owner alert; failures are logged and swallowed.
    async fn alert_owner(&self, owner: UserId, text: &str) {
        match tokio::time::timeout(self.send_timeout, self.notifier.notify(owner, text)).await {
            Ok(Ok(())) => debug!(owner, "Owner notified"),
            Ok(Err(e)) => warn!(owner, "Failed to notify owner: {}", e),
            Err(_) => warn!(owner, "Timed out notifying owner"),
        }
    }
}
