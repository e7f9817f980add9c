//! Relay rules for the two directions of a session.
//!
//! ```text
//! Browser → Engine:  ClientMessage → UpstreamAction   (upstream_action)
//! Engine  → Browser: frame payload → ClientMessage    (backend_payload_to_client)
//! ```
//!
//! These functions have no I/O side effects, so every rule is unit tested
//! here and the infrastructure layer only carries the results out.

use proxy_core::Handshake;

use crate::domain::{ClientMessage, SessionDescriptor};

/// What the upstream relay must do with one browser message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamAction {
    /// Write the bytes to the engine as one frame.
    Forward(Vec<u8>),
    /// Answer the browser with a pong carrying this payload.
    ReplyPong(Vec<u8>),
    /// Nothing to do.
    Ignore,
    /// The browser closed the session.
    Close,
}

/// Decides how to handle a message received from the browser.
///
/// Text and binary messages are forwarded verbatim (text as its UTF-8
/// bytes).  A ping is answered locally without involving the engine.  A
/// close ends the session.  Unsolicited pongs are ignored.
///
/// # Example
///
/// ```rust
/// use ws_proxy::application::{upstream_action, UpstreamAction};
/// use ws_proxy::domain::ClientMessage;
///
/// let action = upstream_action(ClientMessage::Text("hello".to_string()));
/// assert_eq!(action, UpstreamAction::Forward(b"hello".to_vec()));
/// ```
pub fn upstream_action(msg: ClientMessage) -> UpstreamAction {
    match msg {
        ClientMessage::Text(text) => UpstreamAction::Forward(text.into_bytes()),
        ClientMessage::Binary(data) => UpstreamAction::Forward(data),
        ClientMessage::Ping(payload) => UpstreamAction::ReplyPong(payload),
        ClientMessage::Pong(_) => UpstreamAction::Ignore,
        ClientMessage::Close => UpstreamAction::Close,
    }
}

/// Wraps an engine frame payload as a browser message.
///
/// Payloads that are valid UTF-8 become text messages, which is what
/// browser clients expect.  A text message cannot carry anything else, so
/// other payloads are delivered as binary instead of being mangled.
pub fn backend_payload_to_client(payload: Vec<u8>) -> ClientMessage {
    match String::from_utf8(payload) {
        Ok(text) => ClientMessage::Text(text),
        Err(e) => ClientMessage::Binary(e.into_bytes()),
    }
}

/// Borrows the handshake credentials out of a descriptor.
///
/// The free-form `information` map is not part of the handshake.
pub fn handshake_for(descriptor: &SessionDescriptor) -> Handshake<'_> {
    Handshake {
        room_id: descriptor.room_id,
        application_name: &descriptor.application_name,
        version: &descriptor.version,
        password: descriptor.password.as_deref(),
        token: descriptor.token.as_deref(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
