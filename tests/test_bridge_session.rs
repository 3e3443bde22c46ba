use std::io::{BufRead, Write};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use minecraft_mcp_bot::game::session::{self, SessionOptions, READY_MESSAGE};
use minecraft_mcp_bot::game::types::SessionEnd;
use minecraft_mcp_bot::game::GameClient;
use minecraft_mcp_bot::infra::boot::{finish, Stop};
use minecraft_mcp_bot::infra::mcp::BotSvc;

/// Minimal bridge: acknowledges the handshake, answers `position`, and kicks
/// the bot once it has answered `kick_after` position queries.
async fn fake_bridge(listener: TcpListener, kick_after: usize) -> Vec<String> {
    let (stream, _) = listener.accept().await.unwrap();
    let (r, mut w) = stream.into_split();
    let mut lines = BufReader::new(r).lines();
    let mut methods = Vec::new();
    let mut positions = 0;

    while let Ok(Some(line)) = lines.next_line().await {
        let req: Value = serde_json::from_str(&line).unwrap();
        let method = req["method"].as_str().unwrap_or_default().to_owned();
        methods.push(method.clone());

        let result = match method.as_str() {
            "position" => json!({"x": -7.5, "y": 70.0, "z": 3.9}),
            _ => Value::Null,
        };
        if req.get("id").is_some() {
            let resp = json!({"jsonrpc":"2.0","id":req["id"],"result":result});
            w.write_all(format!("{resp}\n").as_bytes()).await.unwrap();
        }
        if method == "connect" {
            let spawn = json!({"jsonrpc":"2.0","method":"spawn","params":{"version":"1.20.4","gameRules":{}}});
            w.write_all(format!("{spawn}\n").as_bytes()).await.unwrap();
        }
        if method == "position" {
            positions += 1;
            if positions == kick_after {
                let kick = json!({"jsonrpc":"2.0","method":"kicked","params":{"reason":"server closed"}});
                w.write_all(format!("{kick}\n").as_bytes()).await.unwrap();
            }
        }
    }
    methods
}

fn options(addr: std::net::SocketAddr) -> SessionOptions {
    SessionOptions {
        host: "localhost".into(),
        port: 25565,
        username: "LLMBot".into(),
        bridge_addr: addr.to_string(),
        spawn_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn session_serves_tools_until_kicked() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let bridge = tokio::spawn(fake_bridge(listener, 1));

    let game = session::connect(&options(addr)).await.unwrap();
    let svc = BotSvc::new(game.clone());

    let res = svc.invoke("get-position", None).await.unwrap();
    let v = serde_json::to_value(&res).unwrap();
    assert_eq!(v["content"][0]["text"], "Current position: (-8, 70, 3)");

    let end = game.closed().await;
    assert_eq!(end, SessionEnd::Kicked("server closed".into()));

    // later calls fail fast and surface as error results
    let res = svc.invoke("get-position", None).await.unwrap();
    let v = serde_json::to_value(&res).unwrap();
    assert_eq!(v["isError"], true);

    assert!(finish(Stop::Session(end), game.as_ref()).await.is_err());

    drop(svc);
    drop(game);
    let methods = bridge.await.unwrap();
    assert_eq!(&methods[..4], ["connect", "configureMovements", "chat", "position"]);
}

#[tokio::test]
async fn ready_message_and_quit_on_local_shutdown() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let bridge = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (r, mut w) = stream.into_split();
        let mut lines = BufReader::new(r).lines();
        let mut seen = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            let req: Value = serde_json::from_str(&line).unwrap();
            if req.get("id").is_some() {
                let resp = json!({"jsonrpc":"2.0","id":req["id"],"result":null});
                w.write_all(format!("{resp}\n").as_bytes()).await.unwrap();
            }
            if req["method"] == "connect" {
                let spawn = json!({"jsonrpc":"2.0","method":"spawn","params":{"version":"1.20.4"}});
                w.write_all(format!("{spawn}\n").as_bytes()).await.unwrap();
            }
            let done = req["method"] == "quit";
            seen.push(req);
            if done {
                break;
            }
        }
        seen
    });

    let game = session::connect(&options(addr)).await.unwrap();
    finish(Stop::ControlClosed, game.as_ref()).await.unwrap();
    assert!(game.closed().await.is_local());

    let seen = bridge.await.unwrap();
    let chat = seen.iter().find(|r| r["method"] == "chat").unwrap();
    assert_eq!(chat["params"]["message"], READY_MESSAGE);
    assert_eq!(seen.last().unwrap()["method"], "quit");
}

#[tokio::test]
async fn unreachable_bridge_fails_bootstrap() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let result = session::connect(&options(addr)).await;
    assert!(result.is_err());
}

/// Blocking bridge on a plain thread so it outlives the client's runtime.
/// Reports every method it saw once the client hangs up.
fn threaded_bridge() -> (std::net::SocketAddr, std::thread::JoinHandle<Vec<String>>) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut w = stream.try_clone().unwrap();
        let mut methods = Vec::new();
        for line in std::io::BufReader::new(stream).lines() {
            let Ok(line) = line else { break };
            let req: Value = serde_json::from_str(&line).unwrap();
            let method = req["method"].as_str().unwrap_or_default().to_owned();
            if req.get("id").is_some() {
                let resp = json!({"jsonrpc":"2.0","id":req["id"],"result":null});
                writeln!(w, "{resp}").unwrap();
            }
            if method == "connect" {
                let spawn = json!({"jsonrpc":"2.0","method":"spawn","params":{"version":"1.20.4"}});
                writeln!(w, "{spawn}").unwrap();
            }
            methods.push(method);
        }
        methods
    });
    (addr, handle)
}

#[test]
fn quit_reaches_the_bridge_before_the_runtime_goes_away() {
    for _ in 0..10 {
        let (addr, bridge) = threaded_bridge();
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let game = session::connect(&options(addr)).await.unwrap();
            finish(Stop::Interrupted, game.as_ref()).await.unwrap();
        });
        // same as returning from main: pending tasks are discarded
        drop(rt);

        let methods = bridge.join().unwrap();
        assert_eq!(methods.last().map(String::as_str), Some("quit"));
    }
}
