//! WebSocket server: accept loop and per-connection entry point.
//!
//! For every accepted connection this module:
//!
//! 1. Upgrades it to a WebSocket (any path, any origin).
//! 2. Waits for the browser's JSON session descriptor.
//! 3. Dials the engine server named in the descriptor.
//! 4. Writes the room handshake.
//! 5. Hands both transports to a [`Session`] for relaying.
//!
//! A failure in any step is logged with the phase it happened in and closes
//! the browser connection.  Nothing is sent back to the browser besides the
//! close.
//!
//! # Scalability
//!
//! Each browser session runs in its own Tokio task and shares nothing with
//! the others.  The accept loop spawns and moves on immediately.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::handshake_for;
use crate::domain::{ClientMessage, ProxyConfig, SessionDescriptor, SessionPhase};
use crate::infrastructure::backend_conn::{send_handshake, BackendConnection};
use crate::infrastructure::session::{
    from_ws_message, RelayError, Session, CLIENT_CLOSE_TIMEOUT,
};

/// How long a new connection may take to complete the WebSocket upgrade.
pub const UPGRADE_TIMEOUT: Duration = Duration::from_secs(10);

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `config.listen_addr` and serves until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound (e.g., the port is
/// already in use or the process lacks permission to bind).
pub async fn run_server(config: ProxyConfig, shutdown: CancellationToken) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {}", config.listen_addr))?;

    info!("WebSocket proxy listening on {}", config.listen_addr);

    serve(listener, config, shutdown).await;
    Ok(())
}

/// Accepts connections on an already bound listener until `shutdown` is
/// cancelled, then cancels and waits for every live session.
pub async fn serve(listener: TcpListener, config: ProxyConfig, shutdown: CancellationToken) {
    let config = Arc::new(config);
    let sessions = TaskTracker::new();

    loop {
        let accepted = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("shutdown requested; stopping accept loop");
                break;
            }
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, peer_addr)) => {
                debug!("new browser connection from {peer_addr}");
                let cfg = Arc::clone(&config);
                let cancel = shutdown.child_token();
                sessions.spawn(handle_browser_session(stream, peer_addr, cfg, cancel));
            }
            Err(e) => {
                // Transient (e.g., too many open file descriptors); keep serving.
                error!("accept error: {e}");
            }
        }
    }

    sessions.close();
    if !sessions.is_empty() {
        info!("waiting for {} session(s) to close", sessions.len());
    }
    sessions.wait().await;
}

// ── Per-session handler ───────────────────────────────────────────────────────

/// Runs one session and logs how it ended.
async fn handle_browser_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<ProxyConfig>,
    cancel: CancellationToken,
) {
    let session_id = Uuid::new_v4().to_string();
    match run_session(raw_stream, peer_addr, &session_id, &config, cancel).await {
        Ok(()) => info!("session {session_id} ({peer_addr}) closed"),
        Err(e) => warn!("session {session_id} ({peer_addr}) closed with error: {e:#}"),
    }
}

/// Runs the complete lifecycle of a single browser session.
///
/// # Errors
///
/// Returns the first failure, with the [`SessionPhase`] it happened in as
/// context.  A close frame from the browser is not an error.
async fn run_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    session_id: &str,
    config: &ProxyConfig,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let upgraded = tokio::select! {
        _ = cancel.cancelled() => return Ok(()),
        upgraded = timeout(UPGRADE_TIMEOUT, accept_async(raw_stream)) => upgraded,
    };
    let mut ws = upgraded
        .with_context(|| format!("WebSocket upgrade with {peer_addr} timed out"))?
        .with_context(|| format!("WebSocket upgrade failed with {peer_addr}"))?;

    debug!("session {session_id}: WebSocket established with {peer_addr}");

    // ── Descriptor ────────────────────────────────────────────────────────────
    let descriptor = tokio::select! {
        _ = cancel.cancelled() => return Ok(()),
        descriptor = read_descriptor(&mut ws) => descriptor,
    };
    let descriptor = match descriptor.context(SessionPhase::Descriptor) {
        Ok(d) => d,
        Err(e) => {
            close_browser(&mut ws, session_id).await;
            return Err(e);
        }
    };

    info!(
        "session {session_id}: room {} on {} ({} {})",
        descriptor.room_id, descriptor.server, descriptor.application_name, descriptor.version
    );

    // ── Dial ──────────────────────────────────────────────────────────────────
    let dialed = tokio::select! {
        _ = cancel.cancelled() => {
            close_browser(&mut ws, session_id).await;
            return Ok(());
        }
        dialed = dial(&descriptor) => dialed,
    };
    let backend = match dialed.context(SessionPhase::Dial) {
        Ok(b) => b,
        Err(e) => {
            close_browser(&mut ws, session_id).await;
            return Err(e);
        }
    };
    let (reader, mut writer) = backend.into_split();

    // ── Handshake ─────────────────────────────────────────────────────────────
    let handshake = handshake_for(&descriptor);
    let sent = tokio::select! {
        _ = cancel.cancelled() => None,
        sent = send_handshake(&mut writer, &handshake) => Some(sent),
    };
    match sent {
        Some(Ok(frames)) => {
            info!("session {session_id}: handshake sent ({frames} frames); relaying")
        }
        unfinished => {
            if let Err(e) = writer.shutdown().await {
                debug!("session {session_id}: engine shutdown: {e}");
            }
            close_browser(&mut ws, session_id).await;
            return match unfinished {
                Some(Err(e)) => Err(e).context(SessionPhase::Handshake),
                _ => Ok(()),
            };
        }
    }

    // ── Relay ─────────────────────────────────────────────────────────────────
    let session = Session::new(
        session_id,
        ws,
        reader,
        writer,
        config.keepalive_interval,
        cancel,
    );
    match session.run().await {
        Ok(()) | Err(RelayError::ClientClosed) => Ok(()),
        Err(RelayError::BackendRead(e)) if e.is_eof() => {
            info!("session {session_id}: engine closed the connection");
            Ok(())
        }
        Err(e) => Err(e).context(SessionPhase::Relay),
    }
}

/// Waits for the first data message and parses it as a descriptor.
///
/// Pings and pongs that arrive first are skipped.
async fn read_descriptor<S>(ws: &mut WebSocketStream<S>) -> anyhow::Result<SessionDescriptor>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(msg) = ws.next().await {
        let msg = msg.context("failed to read from browser")?;
        match from_ws_message(msg) {
            Some(ClientMessage::Text(text)) => {
                return Ok(SessionDescriptor::from_json(text.as_bytes())?)
            }
            Some(ClientMessage::Binary(data)) => return Ok(SessionDescriptor::from_json(&data)?),
            Some(ClientMessage::Close) => {
                bail!("browser closed the connection before sending a descriptor")
            }
            Some(other) => debug!("skipping {} frame before descriptor", other.kind()),
            None => {}
        }
    }
    bail!("browser disconnected before sending a descriptor")
}

/// Opens the engine connection named in the descriptor.
async fn dial(descriptor: &SessionDescriptor) -> anyhow::Result<BackendConnection> {
    let (host, port) = descriptor.server.dial_target()?;
    BackendConnection::connect(host, port)
        .await
        .with_context(|| format!("failed to connect to engine at {}", descriptor.server))
}

async fn close_browser<S>(ws: &mut WebSocketStream<S>, session_id: &str)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match timeout(CLIENT_CLOSE_TIMEOUT, ws.close(None)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("session {session_id}: closing browser: {e}"),
        Err(_) => debug!("session {session_id}: browser did not accept the close frame in time"),
    }
}
