//! JSON-RPC 2.0 envelopes spoken with the game-client bridge, one message per line.

use serde::{Deserialize, Serialize};
use serde_json::Value as J;

#[derive(Serialize, Debug, Clone)]
pub struct RpcReq {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub method: &'static str,
    pub params: J,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcErr {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<J>,
}

/// Anything the bridge may send: a response to one of our ids, or a notification.
#[derive(Deserialize, Debug, Clone)]
pub struct Incoming {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<J>,
    #[serde(default)]
    pub error: Option<RpcErr>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: J,
}

pub enum Message {
    Response { id: u64, outcome: Result<J, RpcErr> },
    Notification { method: String, params: J },
}

impl Incoming {
    pub fn classify(self) -> Option<Message> {
        match (self.id, self.method) {
            (Some(id), None) => {
                let outcome = match self.error {
                    Some(e) => Err(e),
                    None => Ok(self.result.unwrap_or(J::Null)),
                };
                Some(Message::Response { id, outcome })
            }
            (None, Some(method)) => Some(Message::Notification {
                method,
                params: self.params,
            }),
            _ => None,
        }
    }
}

pub fn request(id: u64, method: &'static str, params: J) -> RpcReq {
    RpcReq { jsonrpc: "2.0", id: Some(id), method, params }
}

pub fn notification(method: &'static str, params: J) -> RpcReq {
    RpcReq { jsonrpc: "2.0", id: None, method, params }
}

// --- notification payloads ---

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SpawnParams {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub game_rules: J,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ChatParams {
    pub username: String,
    pub message: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ReasonParams {
    #[serde(default, alias = "message")]
    pub reason: String,
}
