//! Domain layer for ws-proxy.
//!
//! Pure types with no dependencies on I/O or an async runtime.
//!
//! # What belongs in the domain layer?
//!
//! - The session descriptor the browser sends first
//! - The transport-neutral client message type
//! - Configuration structures and their validation
//! - Session lifecycle phases
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpStream`, or `WebSocket` types
//! - Environment variable reading

pub mod config;
pub mod descriptor;
pub mod messages;
pub mod session;

pub use config::{ConfigError, ProxyConfig};
pub use descriptor::{BackendServer, DescriptorError, SessionDescriptor};
pub use messages::ClientMessage;
pub use session::SessionPhase;
