//! WebSocket proxy for the room engine — entry point.
//!
//! Accepts WebSocket connections from browsers and relays each one to the
//! engine server named in its session descriptor, over the engine's
//! length-prefixed TCP protocol.
//!
//! # Usage
//!
//! ```text
//! ws-proxy [OPTIONS]
//!
//! Options:
//!   --listen             <ADDR>  Listen address, 'ip:port' or ':port' [default: :80]
//!   --keepalive-interval <SECS>  Keepalive interval in seconds [default: 10]
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable                    | Default | Description                  |
//! |-----------------------------|---------|------------------------------|
//! | `PROXY_HOST`                | `:80`   | Listen address               |
//! | `PROXY_KEEPALIVE_INTERVAL`  | `10`    | Keepalive interval (secs)    |
//! | `RUST_LOG`                  | `info`  | Log filter                   |

use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ws_proxy::domain::config::DEFAULT_LISTEN;
use ws_proxy::domain::ProxyConfig;
use ws_proxy::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// WebSocket proxy for browser clients of the room engine.
#[derive(Debug, Parser)]
#[command(
    name = "ws-proxy",
    about = "Relays browser WebSocket sessions to the room engine over TCP",
    version
)]
struct Cli {
    /// Address to listen on.
    ///
    /// Either a full socket address (`127.0.0.1:8080`) or `:PORT` to listen
    /// on every interface.
    #[arg(long, default_value = DEFAULT_LISTEN, env = "PROXY_HOST")]
    listen: String,

    /// Seconds between keepalive frames sent to each browser.
    #[arg(long, default_value_t = 10, env = "PROXY_KEEPALIVE_INTERVAL")]
    keepalive_interval: u64,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`ProxyConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--listen` is not a valid address or the
    /// keepalive interval is zero.
    fn into_proxy_config(self) -> anyhow::Result<ProxyConfig> {
        Ok(ProxyConfig::new(
            &self.listen,
            Duration::from_secs(self.keepalive_interval),
        )?)
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Cancels `shutdown` on Ctrl+C, or SIGTERM on Unix.
fn spawn_shutdown_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for Ctrl+C signal: {e}");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    error!("failed to listen for SIGTERM: {e}");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("received Ctrl+C — initiating graceful shutdown"),
            _ = terminate => info!("received SIGTERM — initiating graceful shutdown"),
        }
        shutdown.cancel();
    });
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `RUST_LOG` controls the filter; `info` when absent or invalid.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_proxy_config()?;

    info!(
        "ws-proxy starting — listen={}, keepalive={}s",
        config.listen_addr,
        config.keepalive_interval.as_secs()
    );

    let shutdown = CancellationToken::new();
    spawn_shutdown_listener(shutdown.clone());

    if let Err(e) = run_server(config, shutdown).await {
        error!("{e:#}");
        return Err(e);
    }

    info!("ws-proxy stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
