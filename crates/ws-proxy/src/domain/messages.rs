//! Transport-neutral view of the messages exchanged with the browser.
//!
//! The infrastructure layer converts WebSocket frames to and from
//! [`ClientMessage`], so the relay rules in the application layer can be
//! tested without a socket.

/// One message on the browser side of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// UTF-8 data message.
    Text(String),
    /// Binary data message.
    Binary(Vec<u8>),
    /// Ping control frame and its application payload.
    Ping(Vec<u8>),
    /// Pong control frame and its application payload.
    Pong(Vec<u8>),
    /// Close control frame.
    Close,
}

impl ClientMessage {
    /// Short name for log lines.  Never includes the payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
            Self::Ping(_) => "ping",
            Self::Pong(_) => "pong",
            Self::Close => "close",
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
