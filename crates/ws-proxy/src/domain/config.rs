//! Proxy configuration types.
//!
//! [`ProxyConfig`] is the single source of truth for all runtime settings.
//! The binary fills it from CLI arguments and environment variables; tests
//! build it directly.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Listen address used when nothing is configured: every interface, port 80.
pub const DEFAULT_LISTEN: &str = ":80";

/// Interval between keepalive frames sent to the browser.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(10);

/// Errors produced while validating configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The listen address is neither `host:port` nor `:port`.
    #[error("invalid listen address '{0}': expected 'ip:port' or ':port'")]
    InvalidListenAddr(String),

    /// A zero keepalive interval would spin the keepalive loop.
    #[error("keepalive interval must be at least one second")]
    ZeroKeepaliveInterval,
}

/// All runtime configuration for the proxy.
///
/// # Example
///
/// ```rust
/// use ws_proxy::domain::ProxyConfig;
///
/// let cfg = ProxyConfig::default();
/// assert_eq!(cfg.listen_addr.port(), 80);
/// ```
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Address the WebSocket listener binds to.
    pub listen_addr: SocketAddr,

    /// How often an empty pong control frame is written to each browser.
    pub keepalive_interval: Duration,
}

impl ProxyConfig {
    /// Builds a config from raw values, validating both.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the listen address cannot be parsed or the
    /// keepalive interval is zero.
    pub fn new(listen: &str, keepalive_interval: Duration) -> Result<Self, ConfigError> {
        if keepalive_interval.is_zero() {
            return Err(ConfigError::ZeroKeepaliveInterval);
        }
        Ok(Self {
            listen_addr: parse_listen_addr(listen)?,
            keepalive_interval,
        })
    }
}

impl Default for ProxyConfig {
    /// | Field              | Default        |
    /// |--------------------|----------------|
    /// | listen_addr        | `0.0.0.0:80`   |
    /// | keepalive_interval | 10 seconds     |
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 80)),
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
        }
    }
}

/// Parses a listen address.
///
/// Accepts a full socket address (`127.0.0.1:8080`, `[::1]:8080`) or a bare
/// `:port`, which binds every IPv4 interface.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidListenAddr`] for anything else.
pub fn parse_listen_addr(raw: &str) -> Result<SocketAddr, ConfigError> {
    let raw = raw.trim();
    let candidate = match raw.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => raw.to_string(),
    };
    candidate
        .parse()
        .map_err(|_| ConfigError::InvalidListenAddr(raw.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
