//! ws-proxy library crate.
//!
//! Lets browsers join rooms on an engine server that only speaks a
//! length-prefixed binary protocol over raw TCP.  Each WebSocket connection
//! gets its own engine connection; after a one-time handshake, messages are
//! relayed in both directions until either side goes away.
//!
//! # Architecture
//!
//! ```text
//! Browser (WebSocket)
//!         ↕
//! [ws-proxy]
//!   ├── domain/           Pure types: SessionDescriptor, ClientMessage, ProxyConfig
//!   ├── application/      Relay rules: what to do with each message
//!   └── infrastructure/
//!         ├── ws_server/    Accept loop and per-connection entry point
//!         ├── session/      Bidirectional relay with shared cancellation
//!         └── backend_conn/ Framed TCP connection to the engine (proxy-core codec)
//!         ↕
//! Engine (2-byte length-prefixed frames over TCP)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `proxy-core` only.
//! - `infrastructure` depends on all other layers plus `tokio` and `tungstenite`.

/// Domain layer: pure types (no I/O).
pub mod domain;

/// Application layer: relay decisions.
pub mod application;

/// Infrastructure layer: WebSocket server, relay session, engine connection.
pub mod infrastructure;
