//! Textrelay - text-only Telegram channel relay
//!
//! A bot that watches configured public channels and copies every new
//! plain-text post (no links, no media) into one destination channel.
//! Admins configure it through private-chat commands.

mod bridge;
mod common;
mod config;
mod store;
mod telegram;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use bridge::relay::RelayOutcome;
use bridge::{ChannelBundle, CommandDispatcher, MessageFilter, RelayEngine};
use common::messages::RelayEvent;
use config::{env::get_config_path, load_and_validate};
use store::{ConfigStore, JsonFileStore};
use telegram::{TelegramClient, UpdatePoller};

/// How long in-flight relays get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Textrelay v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!(
            "Please ensure {} exists or TEXTRELAY_BOT_TOKEN and TEXTRELAY_OWNER_ID are set.",
            config_path
        );
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  API: {}", config.telegram.api_url);
    info!("  Owner ID: {}", config.owner.id);
    info!("  Send timeout: {}s", config.relay.send_timeout_secs);

    // ============================================================
    // Settings store
    // ============================================================
    let backend = Arc::new(JsonFileStore::new(
        &config.storage.settings_path,
        config.owner.id,
    ));
    info!("Settings file: {}", backend.path().display());
    let store = Arc::new(ConfigStore::new(backend));

    let settings = store.snapshot().await;
    info!(
        "Settings: {} source channel(s), destination {}, relay {}",
        settings.source_channels.len(),
        settings
            .destination_channel
            .as_ref()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "not set".to_string()),
        if settings.working { "ON" } else { "OFF" }
    );

    // ============================================================
    // Telegram client
    // ============================================================
    let client = Arc::new(
        TelegramClient::new(&config.telegram).context("Failed to build HTTP client")?,
    );
    let me = client
        .get_me()
        .await
        .context("Failed to reach the Bot API (is the token valid?)")?;
    info!(
        "Logged in as @{} ({})",
        me.username.as_deref().unwrap_or("?"),
        me.id
    );

    // ============================================================
    // Relay core
    // ============================================================
    let filter = MessageFilter::new(config.block_patterns());
    if filter.has_patterns() {
        info!("Extra block patterns enabled");
    }

    let engine = Arc::new(RelayEngine::new(
        store.clone(),
        client.clone(),
        client.clone(),
        filter,
        Duration::from_secs(config.relay.send_timeout_secs),
    ));
    let dispatcher = CommandDispatcher::new(store, me.username);

    let channels = ChannelBundle::new();
    let poller = UpdatePoller::new(
        client.clone(),
        config.telegram.poll_timeout_secs,
        channels.source,
    );
    let mut poll_task = tokio::spawn(poller.run());

    let mut event_loop = tokio::spawn(run_event_loop(
        channels.events.event_rx,
        dispatcher,
        engine,
        client,
    ));

    // ============================================================
    // Run until a signal or a task exits
    // ============================================================
    tokio::select! {
        biased;
        _ = shutdown_signal() => info!("Shutdown signal received, stopping..."),
        _ = &mut poll_task => warn!("Update poller exited unexpectedly"),
        _ = &mut event_loop => warn!("Event loop exited unexpectedly"),
    }

    channels.control.shutdown();

    // The poller drops its event sender on exit, which ends the event loop.
    match tokio::time::timeout(SHUTDOWN_GRACE, poll_task).await {
        Ok(Ok(())) => debug!("Update poller stopped"),
        Ok(Err(e)) => warn!("Update poller task panicked: {}", e),
        Err(_) => warn!("Update poller did not stop in time"),
    }

    match tokio::time::timeout(SHUTDOWN_GRACE, event_loop).await {
        Ok(Ok(in_flight)) => drain(in_flight).await,
        Ok(Err(e)) => warn!("Event loop task panicked: {}", e),
        Err(_) => warn!("Event loop did not stop in time"),
    }

    info!("Exiting...");
    Ok(())
}

/// Route inbound events until the event channel closes.
///
/// Commands are handled one at a time in arrival order; posts are relayed on
/// their own tasks. Returns the relays still in flight.
async fn run_event_loop(
    mut event_rx: mpsc::UnboundedReceiver<RelayEvent>,
    dispatcher: CommandDispatcher,
    engine: Arc<RelayEngine>,
    client: Arc<TelegramClient>,
) -> Vec<JoinHandle<RelayOutcome>> {
    let mut in_flight: Vec<JoinHandle<RelayOutcome>> = Vec::new();

    while let Some(event) = event_rx.recv().await {
        in_flight.retain(|handle| !handle.is_finished());

        match event {
            RelayEvent::Command(command) => {
                let Some(reply) = dispatcher.dispatch(&command).await else {
                    continue;
                };
                let client = client.clone();
                tokio::spawn(async move {
                    if let Err(e) = client.reply(command.reply_chat_id, &reply).await {
                        warn!(chat = command.reply_chat_id, "Failed to send reply: {}", e);
                    }
                });
            }
            RelayEvent::ChannelPost(post) => {
                in_flight.push(engine.spawn_relay(post));
            }
        }
    }

    info!("Event channel closed");
    in_flight
}

/// Wait briefly for relays that were already sending when shutdown began.
async fn drain(in_flight: Vec<JoinHandle<RelayOutcome>>) {
    let pending: Vec<_> = in_flight
        .into_iter()
        .filter(|handle| !handle.is_finished())
        .collect();
    if pending.is_empty() {
        return;
    }

    info!("Waiting for {} in-flight relay(s)...", pending.len());
    let all = async {
        for handle in pending {
            if let Err(e) = handle.await {
                warn!("Relay task panicked: {}", e);
            }
        }
    };
    if tokio::time::timeout(SHUTDOWN_GRACE, all).await.is_err() {
        warn!("In-flight relays did not finish in time");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
