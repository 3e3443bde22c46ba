//! Session bootstrap: join the server through the bridge, wait for spawn,
//! configure movement, then keep logging session events.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use super::bridge::{BridgeClient, BridgeEvent};
use super::wire::SpawnParams;
use super::{GameClient, GameError};

pub const READY_MESSAGE: &str = "MCP-powered bot ready to receive instructions!";

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub bridge_addr: String,
    pub spawn_timeout: Duration,
}

/// Establishes the game session. Any error here is fatal for the process.
pub async fn connect(opts: &SessionOptions) -> Result<Arc<BridgeClient>, GameError> {
    tracing::info!(
        bridge = %opts.bridge_addr,
        "Connecting to Minecraft server at {}:{} as {}",
        opts.host,
        opts.port,
        opts.username
    );
    let (client, events) = BridgeClient::connect(&opts.bridge_addr, opts.username.clone()).await?;
    start(client, events, opts).await
}

/// Runs the handshake over an already opened bridge connection.
pub async fn start(
    client: BridgeClient,
    mut events: mpsc::UnboundedReceiver<BridgeEvent>,
    opts: &SessionOptions,
) -> Result<Arc<BridgeClient>, GameError> {
    client
        .call::<()>(
            "connect",
            json!({ "host": opts.host, "port": opts.port, "username": opts.username }),
        )
        .await?;

    let spawn = tokio::time::timeout(opts.spawn_timeout, wait_for_spawn(&mut events, &opts.username))
        .await
        .map_err(|_| GameError::Timeout("spawn"))??;
    tracing::info!(version = %spawn.version, "Bot has spawned in the world");

    client.configure_movements(&spawn).await?;

    if let Err(e) = client.chat(READY_MESSAGE).await {
        tracing::warn!(error = %e, "failed to announce readiness in chat");
    }

    let client = Arc::new(client);
    tokio::spawn(log_events(events, opts.username.clone()));
    Ok(client)
}

async fn wait_for_spawn(
    events: &mut mpsc::UnboundedReceiver<BridgeEvent>,
    username: &str,
) -> Result<SpawnParams, GameError> {
    while let Some(event) = events.recv().await {
        match event {
            BridgeEvent::Spawn(spawn) => return Ok(spawn),
            BridgeEvent::Kicked(reason) => {
                tracing::error!("Bot was kicked: {reason}");
                return Err(GameError::Disconnected(format!("kicked: {reason}")));
            }
            BridgeEvent::End(reason) => {
                return Err(GameError::Disconnected(format!("session ended: {reason}")));
            }
            other => log_event(other, username),
        }
    }
    Err(GameError::Disconnected(
        "bridge closed before the bot spawned".into(),
    ))
}

async fn log_events(mut events: mpsc::UnboundedReceiver<BridgeEvent>, username: String) {
    while let Some(event) = events.recv().await {
        log_event(event, &username);
    }
    tracing::debug!("bridge event stream finished");
}

fn log_event(event: BridgeEvent, username: &str) {
    match event {
        BridgeEvent::Chat(chat) if chat.username == username => {}
        BridgeEvent::Chat(chat) => tracing::info!("[CHAT] {}: {}", chat.username, chat.message),
        BridgeEvent::Kicked(reason) => tracing::warn!("Bot was kicked: {reason}"),
        BridgeEvent::Error(message) => tracing::error!("Bot error: {message}"),
        BridgeEvent::End(reason) => tracing::warn!("Bot session ended: {reason}"),
        BridgeEvent::Spawn(spawn) => tracing::info!(version = %spawn.version, "Bot respawned"),
        BridgeEvent::Unknown(method) => {
            tracing::debug!(method = %method, "ignoring bridge notification")
        }
    }
}
