//! Infrastructure layer for ws-proxy.
//!
//! Handles all I/O: accepting WebSocket connections from browsers, opening
//! TCP connections to the engine, and relaying between them.
//!
//! # Responsibilities
//!
//! - Binding the listener and performing the WebSocket upgrade
//! - Reading and writing length-prefixed frames on the engine connection
//! - Spawning per-session Tokio tasks and cancelling them on shutdown
//! - Serializing every write to the browser through one sink
//!
//! # What does NOT belong here?
//!
//! - Relay rules (that is the application layer)
//! - Descriptor and configuration types (that is the domain layer)
//! - Reading CLI arguments or environment variables (that is `main.rs`)

pub mod backend_conn;
pub mod session;
pub mod ws_server;

pub use ws_server::{run_server, serve};
