use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::game::types::SessionEnd;
use crate::game::{session, GameClient};
use crate::infra::config::{Config, Mode};
use crate::infra::mcp::BotSvc;

/// How long open MCP HTTP connections (SSE streams in particular) get to wind
/// down once the server is told to stop.
const HTTP_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Why the server loop returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stop {
    /// The MCP peer went away (stdin EOF) or the HTTP server shut down.
    ControlClosed,
    Interrupted,
    Session(SessionEnd),
}

pub async fn run_server(cfg: Config) -> anyhow::Result<()> {
    tracing::info!(
        mode = %cfg.mcp.mode,
        http_port = cfg.mcp.http_port,
        bridge = %cfg.bridge.addr,
        "BOOT minecraft-mcp-bot"
    );

    let game: Arc<dyn GameClient> = session::connect(&cfg.session_options())
        .await
        .context("failed to establish the game session")?;

    let stop = serve(&cfg, game.clone()).await?;
    finish(stop, game.as_ref()).await
}

/// Runs the MCP surface for `game` until the control channel closes, the
/// process is interrupted or the game session ends.
pub async fn serve(cfg: &Config, game: Arc<dyn GameClient>) -> anyhow::Result<Stop> {
    let svc = BotSvc::new(game.clone());
    match cfg.mcp.mode {
        Mode::Stdio => serve_stdio(svc, game.as_ref()).await,
        Mode::Http => serve_http(svc, game, cfg.mcp.http_port).await,
    }
}

async fn serve_stdio(svc: BotSvc, game: &dyn GameClient) -> anyhow::Result<Stop> {
    let running = crate::infra::runtime::mcp_transport::serve_stdio(svc)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to open the MCP stdio channel")?;

    let stop = tokio::select! {
        quit = running.waiting() => {
            tracing::debug!(reason = ?quit, "stdio service finished");
            Stop::ControlClosed
        }
        end = game.closed() => Stop::Session(end),
        _ = tokio::signal::ctrl_c() => Stop::Interrupted,
    };
    Ok(stop)
}

async fn serve_http(svc: BotSvc, game: Arc<dyn GameClient>, port: u16) -> anyhow::Result<Stop> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind MCP HTTP listener on {addr}"))?;
    tracing::info!(%addr, "MCP streamable HTTP listening at /mcp");
    run_http(listener, svc, game, HTTP_DRAIN_TIMEOUT).await
}

/// Serves until the session ends or the process is interrupted, then gives
/// open connections at most `drain` to finish before returning.
async fn run_http(
    listener: tokio::net::TcpListener,
    svc: BotSvc,
    game: Arc<dyn GameClient>,
    drain: Duration,
) -> anyhow::Result<Stop> {
    let app = crate::infra::http_app::build_app(svc);
    let (drain_tx, drain_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = drain_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    let stop = tokio::select! {
        res = &mut server => {
            res.context("MCP HTTP server failed")?;
            return Ok(Stop::ControlClosed);
        }
        end = game.closed() => Stop::Session(end),
        _ = tokio::signal::ctrl_c() => Stop::Interrupted,
    };

    let _ = drain_tx.send(());
    match tokio::time::timeout(drain, server).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "MCP HTTP server failed while draining"),
        Err(_) => tracing::warn!(
            timeout_ms = drain.as_millis() as u64,
            "open MCP HTTP connections did not close in time, dropping them"
        ),
    }
    Ok(stop)
}

/// Releases the session and maps the stop reason to the process outcome.
pub async fn finish(stop: Stop, game: &dyn GameClient) -> anyhow::Result<()> {
    match stop {
        Stop::ControlClosed | Stop::Interrupted => {
            tracing::info!("Control channel closed. Shutting down...");
            game.quit().await;
            Ok(())
        }
        Stop::Session(end) if end.is_local() => Ok(()),
        Stop::Session(end) => {
            tracing::error!(reason = %end, "Game session terminated");
            Err(anyhow::anyhow!("game session terminated: {end}"))
        }
    }
}
