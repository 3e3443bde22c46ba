//! TCP client for the game-client bridge.
//!
//! The bridge hosts the actual Minecraft client library and speaks
//! newline-delimited JSON-RPC 2.0. Requests are multiplexed by id: one task owns
//! the write half, one task owns the read half and routes responses back to the
//! waiting caller. Notifications (spawn, chat, kicked, ...) are forwarded as
//! [`BridgeEvent`]s.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value as J};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};

use super::types::{
    Block, BlockMatcher, BlockPos, Control, Entity, EntityFilter, EquipDestination, Face, Goal,
    InventoryItem, ItemDef, Recipe, SessionEnd, Vec3,
};
use super::wire::{self, ChatParams, Incoming, Message, ReasonParams, SpawnParams};
use super::{GameClient, GameError};

type Reply = oneshot::Sender<Result<J, GameError>>;

/// Upper bound on waiting for the `quit` line to reach the socket.
const QUIT_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// One line for the writer task. `flushed` fires once the line is on the wire.
struct Outgoing {
    line: String,
    flushed: Option<oneshot::Sender<()>>,
}

/// Notification pushed by the bridge.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    Spawn(SpawnParams),
    Chat(ChatParams),
    Kicked(String),
    Error(String),
    End(String),
    Unknown(String),
}

impl BridgeEvent {
    fn parse(method: &str, params: J) -> Self {
        fn reason(params: J) -> String {
            serde_json::from_value::<ReasonParams>(params)
                .map(|p| p.reason)
                .unwrap_or_default()
        }
        match method {
            "spawn" => BridgeEvent::Spawn(serde_json::from_value(params).unwrap_or_default()),
            "chat" => match serde_json::from_value(params) {
                Ok(chat) => BridgeEvent::Chat(chat),
                Err(_) => BridgeEvent::Unknown(method.to_owned()),
            },
            "kicked" => BridgeEvent::Kicked(reason(params)),
            "error" => BridgeEvent::Error(reason(params)),
            "end" => BridgeEvent::End(reason(params)),
            other => BridgeEvent::Unknown(other.to_owned()),
        }
    }

    fn session_end(&self) -> Option<SessionEnd> {
        match self {
            BridgeEvent::Kicked(reason) => Some(SessionEnd::Kicked(reason.clone())),
            BridgeEvent::End(reason) => Some(SessionEnd::Ended(reason.clone())),
            _ => None,
        }
    }
}

#[derive(Default)]
struct State {
    pending: HashMap<u64, Reply>,
    ended: Option<SessionEnd>,
}

struct Shared {
    state: Mutex<State>,
    ended_tx: watch::Sender<Option<SessionEnd>>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, id: u64, outcome: Result<J, GameError>) {
        match self.state().pending.remove(&id) {
            Some(reply) => {
                let _ = reply.send(outcome);
            }
            None => tracing::warn!(id, "bridge answered an unknown request id"),
        }
    }

    /// Marks the session over and fails every in-flight request. The first
    /// reason recorded wins.
    fn close(&self, end: SessionEnd) {
        let drained: Vec<Reply> = {
            let mut state = self.state();
            if state.ended.is_some() {
                return;
            }
            state.ended = Some(end.clone());
            state.pending.drain().map(|(_, reply)| reply).collect()
        };
        for reply in drained {
            let _ = reply.send(Err(GameError::Disconnected(end.to_string())));
        }
        self.ended_tx.send_replace(Some(end));
    }
}

pub struct BridgeClient {
    username: String,
    outbound: mpsc::UnboundedSender<Outgoing>,
    next_id: AtomicU64,
    shared: Arc<Shared>,
    ended_rx: watch::Receiver<Option<SessionEnd>>,
}

impl BridgeClient {
    /// Opens the TCP connection to the bridge. No game session exists yet;
    /// see [`super::session::connect`].
    pub async fn connect(
        addr: &str,
        username: impl Into<String>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<BridgeEvent>), GameError> {
        let stream = TcpStream::connect(addr).await?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::warn!(error = %e, "failed to set TCP_NODELAY on bridge socket");
        }
        let (reader, writer) = stream.into_split();
        Ok(Self::from_halves(reader, writer, username))
    }

    /// Wires the client onto any byte stream halves. Must run inside a tokio runtime.
    pub fn from_halves<R, W>(
        reader: R,
        writer: W,
        username: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<BridgeEvent>)
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (ended_tx, ended_rx) = watch::channel(None);
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            ended_tx,
        });
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        tokio::spawn(write_loop(writer, outbound_rx, shared.clone()));
        tokio::spawn(read_loop(reader, events_tx, shared.clone()));

        let client = Self {
            username: username.into(),
            outbound,
            next_id: AtomicU64::new(1),
            shared,
            ended_rx,
        };
        (client, events_rx)
    }

    /// Sends one request and waits for its response.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: J,
    ) -> Result<T, GameError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let line = serde_json::to_string(&wire::request(id, method, params))
            .map_err(|e| GameError::Protocol(e.to_string()))?;
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.shared.state();
            if let Some(end) = &state.ended {
                return Err(GameError::Disconnected(end.to_string()));
            }
            state.pending.insert(id, tx);
        }
        tracing::trace!(id, method, "bridge request");
        let queued = Outgoing {
            line,
            flushed: None,
        };
        if self.outbound.send(queued).is_err() {
            self.shared.state().pending.remove(&id);
            return Err(GameError::Disconnected("bridge writer stopped".into()));
        }
        let value = rx
            .await
            .map_err(|_| GameError::Disconnected("bridge dropped the request".into()))??;
        serde_json::from_value(value).map_err(|e| GameError::Protocol(format!("{method}: {e}")))
    }

    /// Sends a notification without waiting for any answer.
    pub fn notify(&self, method: &'static str, params: J) -> Result<(), GameError> {
        self.enqueue_notification(method, params, None)
    }

    fn enqueue_notification(
        &self,
        method: &'static str,
        params: J,
        flushed: Option<oneshot::Sender<()>>,
    ) -> Result<(), GameError> {
        if let Some(end) = &self.shared.state().ended {
            return Err(GameError::Disconnected(end.to_string()));
        }
        let line = serde_json::to_string(&wire::notification(method, params))
            .map_err(|e| GameError::Protocol(e.to_string()))?;
        self.outbound
            .send(Outgoing { line, flushed })
            .map_err(|_| GameError::Disconnected("bridge writer stopped".into()))
    }

    pub async fn configure_movements(&self, spawn: &SpawnParams) -> Result<(), GameError> {
        self.call(
            "configureMovements",
            json!({ "version": spawn.version, "gameRules": spawn.game_rules }),
        )
        .await
    }
}

async fn write_loop<W>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<Outgoing>,
    shared: Arc<Shared>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(Outgoing { line, flushed }) = rx.recv().await {
        let sent = async {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await
        }
        .await;
        if let Err(e) = sent {
            tracing::error!(error = %e, "bridge write failed");
            shared.close(SessionEnd::ConnectionLost(e.to_string()));
            return;
        }
        if let Some(flushed) = flushed {
            let _ = flushed.send(());
        }
    }
}

async fn read_loop<R>(reader: R, events: mpsc::UnboundedSender<BridgeEvent>, shared: Arc<Shared>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let end = loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break SessionEnd::ConnectionLost("bridge closed the connection".into()),
            Err(e) => break SessionEnd::ConnectionLost(e.to_string()),
        };
        if line.trim().is_empty() {
            continue;
        }
        let incoming: Incoming = match serde_json::from_str(&line) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, raw = %line, "invalid JSON from bridge");
                continue;
            }
        };
        match incoming.classify() {
            Some(Message::Response { id, outcome }) => {
                let outcome = outcome.map_err(|e| GameError::Remote {
                    code: e.code,
                    message: e.message,
                });
                shared.resolve(id, outcome);
            }
            Some(Message::Notification { method, params }) => {
                let event = BridgeEvent::parse(&method, params);
                let end = event.session_end();
                let _ = events.send(event);
                if let Some(end) = end {
                    break end;
                }
            }
            None => tracing::warn!(raw = %line, "unrecognised bridge message"),
        }
    };
    shared.close(end);
}

#[async_trait]
impl GameClient for BridgeClient {
    fn username(&self) -> &str {
        &self.username
    }

    async fn position(&self) -> Result<Vec3, GameError> {
        self.call("position", json!({})).await
    }

    async fn goto(&self, goal: Goal) -> Result<(), GameError> {
        self.call("goto", json!({ "goal": goal })).await
    }

    async fn look_at(&self, target: Vec3, force: bool) -> Result<(), GameError> {
        self.call(
            "lookAt",
            json!({ "x": target.x, "y": target.y, "z": target.z, "force": force }),
        )
        .await
    }

    fn set_control_state(&self, control: Control, state: bool) -> Result<(), GameError> {
        self.notify("setControlState", json!({ "control": control, "state": state }))
    }

    async fn block_at(&self, pos: BlockPos) -> Result<Option<Block>, GameError> {
        self.call("blockAt", json!(pos)).await
    }

    async fn can_see_block(&self, pos: BlockPos) -> Result<bool, GameError> {
        self.call("canSeeBlock", json!(pos)).await
    }

    async fn can_dig_block(&self, pos: BlockPos) -> Result<bool, GameError> {
        self.call("canDigBlock", json!(pos)).await
    }

    async fn place_block(&self, reference: BlockPos, side: Face) -> Result<(), GameError> {
        self.call(
            "placeBlock",
            json!({ "reference": reference, "face": side.opposite_vector() }),
        )
        .await
    }

    async fn dig(&self, pos: BlockPos) -> Result<(), GameError> {
        self.call("dig", json!(pos)).await
    }

    async fn block_by_name(&self, name: &str) -> Result<Option<ItemDef>, GameError> {
        self.call("blockByName", json!({ "name": name })).await
    }

    async fn find_block(
        &self,
        matching: BlockMatcher,
        max_distance: f64,
    ) -> Result<Option<Block>, GameError> {
        self.call(
            "findBlock",
            json!({ "matching": matching, "maxDistance": max_distance }),
        )
        .await
    }

    async fn find_blocks(
        &self,
        matching: BlockMatcher,
        max_distance: f64,
        count: u32,
    ) -> Result<Vec<BlockPos>, GameError> {
        self.call(
            "findBlocks",
            json!({ "matching": matching, "maxDistance": max_distance, "count": count }),
        )
        .await
    }

    async fn inventory(&self) -> Result<Vec<InventoryItem>, GameError> {
        self.call("inventory", json!({})).await
    }

    async fn equip(
        &self,
        item: &InventoryItem,
        destination: EquipDestination,
    ) -> Result<(), GameError> {
        self.call(
            "equip",
            json!({ "slot": item.slot, "destination": destination }),
        )
        .await
    }

    async fn item_by_name(&self, name: &str) -> Result<Option<ItemDef>, GameError> {
        self.call("itemByName", json!({ "name": name })).await
    }

    async fn recipes_for(
        &self,
        item_id: u32,
        count: u32,
        crafting_table: Option<BlockPos>,
    ) -> Result<Vec<Recipe>, GameError> {
        self.call(
            "recipesFor",
            json!({ "itemId": item_id, "count": count, "craftingTable": crafting_table }),
        )
        .await
    }

    async fn craft(
        &self,
        recipe: &Recipe,
        count: u32,
        crafting_table: Option<BlockPos>,
    ) -> Result<(), GameError> {
        self.call(
            "craft",
            json!({ "recipeId": recipe.id, "count": count, "craftingTable": crafting_table }),
        )
        .await
    }

    async fn nearest_entity(&self, filter: &EntityFilter) -> Result<Option<Entity>, GameError> {
        self.call("nearestEntity", json!({ "filter": filter })).await
    }

    async fn chat(&self, message: &str) -> Result<(), GameError> {
        self.call("chat", json!({ "message": message })).await
    }

    async fn quit(&self) {
        let (tx, rx) = oneshot::channel();
        match self.enqueue_notification("quit", json!({}), Some(tx)) {
            Ok(()) => match tokio::time::timeout(QUIT_FLUSH_TIMEOUT, rx).await {
                Ok(Ok(())) => tracing::debug!("quit delivered to the bridge"),
                Ok(Err(_)) => tracing::debug!("bridge writer stopped before sending quit"),
                Err(_) => tracing::warn!("timed out delivering quit to the bridge"),
            },
            Err(e) => tracing::debug!(error = %e, "quit on a closed session"),
        }
        self.shared.close(SessionEnd::Quit);
    }

    async fn closed(&self) -> SessionEnd {
        let mut rx = self.ended_rx.clone();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(end) = current {
                return end;
            }
            if rx.changed().await.is_err() {
                return SessionEnd::ConnectionLost("session state dropped".into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, split, DuplexStream, ReadHalf, WriteHalf};

    type Lines = tokio::io::Lines<BufReader<ReadHalf<DuplexStream>>>;

    fn pair() -> (BridgeClient, mpsc::UnboundedReceiver<BridgeEvent>, Lines, WriteHalf<DuplexStream>) {
        let (ours, theirs) = duplex(64 * 1024);
        let (r, w) = split(ours);
        let (client, events) = BridgeClient::from_halves(r, w, "LLMBot");
        let (tr, tw) = split(theirs);
        (client, events, BufReader::new(tr).lines(), tw)
    }

    async fn reply(w: &mut WriteHalf<DuplexStream>, msg: J) {
        let mut s = msg.to_string();
        s.push('\n');
        w.write_all(s.as_bytes()).await.unwrap();
    }

    #[tokio::test]
    async fn request_round_trips_through_the_bridge() {
        let (client, _events, mut lines, mut w) = pair();
        let server = tokio::spawn(async move {
            let line = lines.next_line().await.unwrap().unwrap();
            let req: J = serde_json::from_str(&line).unwrap();
            assert_eq!(req["method"], "blockAt");
            assert_eq!(req["params"], json!({"x": 1, "y": 64, "z": -2}));
            reply(
                &mut w,
                json!({"jsonrpc":"2.0","id":req["id"],"result":{"name":"stone","type":1,"position":{"x":1,"y":64,"z":-2}}}),
            )
            .await;
            (lines, w)
        });
        let block = client.block_at(BlockPos::new(1, 64, -2)).await.unwrap().unwrap();
        assert_eq!(block.name, "stone");
        let _keep = server.await.unwrap();
    }

    #[tokio::test]
    async fn remote_error_is_surfaced_with_message() {
        let (client, _events, mut lines, mut w) = pair();
        let server = tokio::spawn(async move {
            let line = lines.next_line().await.unwrap().unwrap();
            let req: J = serde_json::from_str(&line).unwrap();
            reply(
                &mut w,
                json!({"jsonrpc":"2.0","id":req["id"],"error":{"code":-32000,"message":"No path to the goal!"}}),
            )
            .await;
            (lines, w)
        });
        let err = client
            .goto(Goal::near(Vec3::new(0.0, 0.0, 0.0), 1.0))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No path to the goal!");
        let _keep = server.await.unwrap();
    }

    #[tokio::test]
    async fn control_state_is_a_notification() {
        let (client, _events, mut lines, _w) = pair();
        client.set_control_state(Control::Forward, true).unwrap();
        let line = lines.next_line().await.unwrap().unwrap();
        let msg: J = serde_json::from_str(&line).unwrap();
        assert!(msg.get("id").is_none());
        assert_eq!(msg["params"], json!({"control": "forward", "state": true}));
    }

    #[tokio::test]
    async fn kick_fails_pending_and_later_calls() {
        let (client, mut events, mut lines, mut w) = pair();
        let server = tokio::spawn(async move {
            let _ = lines.next_line().await.unwrap().unwrap();
            reply(&mut w, json!({"jsonrpc":"2.0","method":"kicked","params":{"reason":"flying"}})).await;
            (lines, w)
        });
        let err = client.position().await.unwrap_err();
        assert!(matches!(err, GameError::Disconnected(_)));
        assert_eq!(client.closed().await, SessionEnd::Kicked("flying".into()));
        assert!(matches!(events.recv().await, Some(BridgeEvent::Kicked(_))));
        assert!(client.chat("hi").await.is_err());
        let _keep = server.await.unwrap();
    }

    #[tokio::test]
    async fn eof_ends_session_as_connection_lost() {
        let (client, _events, lines, w) = pair();
        drop(lines);
        drop(w);
        assert!(matches!(client.closed().await, SessionEnd::ConnectionLost(_)));
    }

    #[tokio::test]
    async fn quit_is_local_and_sticky() {
        let (client, _events, mut lines, _w) = pair();
        client.quit().await;
        let line = lines.next_line().await.unwrap().unwrap();
        assert!(line.contains("\"quit\""));
        assert!(client.closed().await.is_local());
    }

    #[tokio::test(start_paused = true)]
    async fn quit_gives_up_on_a_stalled_writer() {
        // a 1-byte pipe nobody reads from never drains the quit line
        let (ours, _theirs) = duplex(1);
        let (r, w) = split(ours);
        let (client, _events) = BridgeClient::from_halves(r, w, "LLMBot");
        client.quit().await;
        assert!(client.closed().await.is_local());
    }
}
