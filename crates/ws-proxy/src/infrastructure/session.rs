//! The relay half of a session: moving frames between browser and engine.
//!
//! A [`Session`] starts once the handshake has been written and runs three
//! loops concurrently:
//!
//! - **Downstream** (engine → browser): read a frame, send it as a WebSocket
//!   message.
//! - **Upstream** (browser → engine): read a WebSocket message; data goes to
//!   the engine as a frame, pings are answered with pongs, a close ends the
//!   session.
//! - **Keepalive**: send an empty pong to the browser every interval.
//!
//! # Single writer
//!
//! All three loops write to the browser.  The WebSocket write half therefore
//! lives in a [`ClientSink`] behind a `tokio::sync::Mutex`, so whole messages
//! are written one at a time.  The engine write half is only used by the
//! upstream loop and needs no lock.
//!
//! # Termination
//!
//! The loops share a [`CancellationToken`].  Whichever loop stops first
//! records why and cancels the token; the others are dropped at their next
//! await point, even if that is a pending read.  Only after all three have
//! returned are the transports closed, once, by [`Session::run`].  The engine
//! side is shut down first; the browser gets [`CLIENT_CLOSE_TIMEOUT`] to take
//! the close frame before its socket is dropped.

use std::convert::Infallible;
use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::application::{backend_payload_to_client, upstream_action, UpstreamAction};
use crate::domain::ClientMessage;
use crate::infrastructure::backend_conn::{BackendError, FrameReader, FrameWriter};

/// How long closing the browser side may take before the socket is dropped.
pub const CLIENT_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Why a relaying session stopped.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("reading from engine failed: {0}")]
    BackendRead(BackendError),

    #[error("writing to engine failed: {0}")]
    BackendWrite(BackendError),

    #[error("reading from browser failed: {0}")]
    ClientRead(WsError),

    #[error("writing to browser failed: {0}")]
    ClientWrite(WsError),

    #[error("browser connection ended without a close frame")]
    ClientGone,

    /// The browser sent a close frame.  This is the normal way to leave.
    #[error("websocket connection closed")]
    ClientClosed,
}

// ── Message conversion ────────────────────────────────────────────────────────

pub(crate) fn to_ws_message(msg: ClientMessage) -> WsMessage {
    match msg {
        ClientMessage::Text(text) => WsMessage::Text(text),
        ClientMessage::Binary(data) => WsMessage::Binary(data),
        ClientMessage::Ping(data) => WsMessage::Ping(data),
        ClientMessage::Pong(data) => WsMessage::Pong(data),
        ClientMessage::Close => WsMessage::Close(None),
    }
}

/// Raw frames only appear when writing, so they map to `None`.
pub(crate) fn from_ws_message(msg: WsMessage) -> Option<ClientMessage> {
    match msg {
        WsMessage::Text(text) => Some(ClientMessage::Text(text)),
        WsMessage::Binary(data) => Some(ClientMessage::Binary(data)),
        WsMessage::Ping(data) => Some(ClientMessage::Ping(data)),
        WsMessage::Pong(data) => Some(ClientMessage::Pong(data)),
        WsMessage::Close(_) => Some(ClientMessage::Close),
        WsMessage::Frame(_) => None,
    }
}

// ── Serialized browser writer ─────────────────────────────────────────────────

/// The only path for writing to the browser during relay.
pub struct ClientSink<S> {
    sink: Mutex<SplitSink<WebSocketStream<S>, WsMessage>>,
}

impl<S> ClientSink<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(sink: SplitSink<WebSocketStream<S>, WsMessage>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Sends one message while holding the lock for the whole write.
    pub async fn send(&self, msg: ClientMessage) -> Result<(), WsError> {
        let mut sink = self.sink.lock().await;
        sink.send(to_ws_message(msg)).await
    }

    /// Starts the closing handshake and flushes anything still buffered.
    ///
    /// Gives up after [`CLIENT_CLOSE_TIMEOUT`] if the browser stopped
    /// reading.  Errors are expected when the browser is already gone, so
    /// they are only logged.
    pub async fn close(&self) {
        let mut sink = self.sink.lock().await;
        match timeout(CLIENT_CLOSE_TIMEOUT, sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("closing browser sink: {e}"),
            Err(_) => debug!("browser did not accept the close frame in time"),
        }
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// A browser connection paired with an authorised engine connection.
pub struct Session<S, R, W> {
    id: String,
    client: WebSocketStream<S>,
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    keepalive_interval: Duration,
    cancel: CancellationToken,
}

impl<S, R, W> Session<S, R, W>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Pairs the transports.  `cancel` ends the session from outside, e.g.
    /// on server shutdown.
    pub fn new(
        id: impl Into<String>,
        client: WebSocketStream<S>,
        reader: FrameReader<R>,
        writer: FrameWriter<W>,
        keepalive_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id: id.into(),
            client,
            reader,
            writer,
            keepalive_interval,
            cancel,
        }
    }

    /// Relays until either side stops, then closes both transports.
    ///
    /// Returns `Ok(())` when cancelled from outside.
    ///
    /// # Errors
    ///
    /// Returns the first [`RelayError`] any loop hit.  A browser close is
    /// reported as [`RelayError::ClientClosed`].
    pub async fn run(self) -> Result<(), RelayError> {
        let Self {
            id,
            client,
            mut reader,
            mut writer,
            keepalive_interval,
            cancel,
        } = self;
        let id = id.as_str();

        let (sink, mut stream) = client.split();
        let sink = ClientSink::new(sink);
        let cause = OnceLock::new();

        tokio::join!(
            supervise(
                id,
                "downstream",
                &cancel,
                &cause,
                pump_downstream(&mut reader, &sink)
            ),
            supervise(
                id,
                "upstream",
                &cancel,
                &cause,
                pump_upstream(&mut stream, &mut writer, &sink)
            ),
            supervise(
                id,
                "keepalive",
                &cancel,
                &cause,
                keepalive(&sink, keepalive_interval)
            ),
        );

        if let Err(e) = writer.shutdown().await {
            debug!("session {id}: engine shutdown: {e}");
        }
        sink.close().await;
        drop(stream);
        drop(sink);
        debug!("session {id}: transports closed");

        match cause.into_inner() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Runs one loop until it fails or the session is cancelled, then cancels
/// the session.  Only the first failure is kept.
async fn supervise<F>(
    session_id: &str,
    name: &str,
    cancel: &CancellationToken,
    cause: &OnceLock<RelayError>,
    work: F,
) where
    F: Future<Output = Result<Infallible, RelayError>>,
{
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        result = work => Some(result),
    };
    if let Some(Err(e)) = outcome {
        debug!("session {session_id}: {name} stopped: {e}");
        let _ = cause.set(e);
    }
    cancel.cancel();
}

async fn pump_downstream<R, S>(
    reader: &mut FrameReader<R>,
    sink: &ClientSink<S>,
) -> Result<Infallible, RelayError>
where
    R: AsyncRead + Unpin,
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let payload = reader.read_frame().await.map_err(RelayError::BackendRead)?;
        trace!(len = payload.len(), "engine → browser");
        sink.send(backend_payload_to_client(payload))
            .await
            .map_err(RelayError::ClientWrite)?;
    }
}

async fn pump_upstream<S, W>(
    stream: &mut SplitStream<WebSocketStream<S>>,
    writer: &mut FrameWriter<W>,
    sink: &ClientSink<S>,
) -> Result<Infallible, RelayError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let msg = match stream.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => return Err(RelayError::ClientRead(e)),
            None => return Err(RelayError::ClientGone),
        };
        let Some(msg) = from_ws_message(msg) else {
            continue;
        };
        trace!(kind = msg.kind(), "browser → engine");

        match upstream_action(msg) {
            UpstreamAction::Forward(bytes) => writer
                .write_frame(&bytes)
                .await
                .map_err(RelayError::BackendWrite)?,
            UpstreamAction::ReplyPong(payload) => sink
                .send(ClientMessage::Pong(payload))
                .await
                .map_err(RelayError::ClientWrite)?,
            UpstreamAction::Ignore => {}
            UpstreamAction::Close => return Err(RelayError::ClientClosed),
        }
    }
}

/// Sends an empty pong every `period`, starting one period from now.
async fn keepalive<S>(sink: &ClientSink<S>, period: Duration) -> Result<Infallible, RelayError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        sink.send(ClientMessage::Pong(Vec::new()))
            .await
            .map_err(RelayError::ClientWrite)?;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
