//! Bridge channel management.
//!
//! Groups the channels that connect the update poller to the event loop,
//! plus the shutdown signal every long-running task listens to.

use tokio::sync::{mpsc, watch};

use crate::common::messages::RelayEvent;

/// Channels for the update source (the poller).
pub struct SourceChannels {
    /// Sender for inbound events.
    pub event_tx: mpsc::UnboundedSender<RelayEvent>,
    /// Receiver for shutdown signal.
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Channels for the event loop.
pub struct LoopChannels {
    /// Receiver for inbound events.
    pub event_rx: mpsc::UnboundedReceiver<RelayEvent>,
}

/// Control channels for shutdown coordination.
pub struct ControlChannels {
    /// Sender to trigger shutdown.
    pub shutdown_tx: watch::Sender<bool>,
}

impl ControlChannels {
    /// Ask every listener to stop. Safe to call more than once.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Bundle of all channels created at startup.
pub struct ChannelBundle {
    pub source: SourceChannels,
    pub events: LoopChannels,
    pub control: ControlChannels,
}

impl ChannelBundle {
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            source: SourceChannels {
                event_tx,
                shutdown_rx,
            },
            events: LoopChannels { event_rx },
            control: ControlChannels { shutdown_tx },
        }
    }
}

impl Default for ChannelBundle {
    fn default() -> Self {
        Self::new()
    }
}
