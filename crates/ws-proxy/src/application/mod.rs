//! Application layer for ws-proxy.
//!
//! Decides what to do with each message crossing the proxy, but never
//! touches a socket.
//!
//! # Responsibilities
//!
//! - Mapping a browser message to an action on the engine connection
//! - Mapping an engine payload to a browser message
//! - Deriving the room handshake from a session descriptor
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or listening for connections (that is infrastructure)
//! - Tokio task spawning and cancellation
//! - WebSocket framing (handled by tokio-tungstenite)

pub mod relay_service;

pub use relay_service::{backend_payload_to_client, handshake_for, upstream_action, UpstreamAction};
