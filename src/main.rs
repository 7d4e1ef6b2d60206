//! robot-mock: a single-connection TCP test double for robot clients
//!
//! Accepts one client, answers each received frame with a deterministic,
//! protocol-shaped response, and exits once the session ends.
//!
//! Protocols:
//! - Marker echo fixture (`exit`, `fail_me`), the default
//! - TCS robot command emulation
//!
//! Configuration via CLI arguments or TOML file.

mod config;
mod error;
mod protocols;
mod server;
mod session;

use config::Config;
use server::Responder;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        listen = %config.listen,
        protocol = ?config.protocol,
        empty_read = ?config.empty_read,
        buffer_size = config.buffer_size,
        "Starting robot-mock"
    );

    let reason = Responder::start(config, shutdown_signal()).await?;
    info!(%reason, "Done");
    Ok(())
}

/// Wait for Ctrl+C. If the handler cannot be installed, never resolve.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
