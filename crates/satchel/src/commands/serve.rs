//! Serve command - run the session server.

use std::net::SocketAddr;

use anyhow::Result;
use clap::Args;
use satchel_server::{Server, ServerConfig};
use satchel_session::{SessionRegistry, Sweeper};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::Context;

/// Arguments for the serve command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the HTTP API to
    #[arg(short, long, default_value = "127.0.0.1:8080", env = "SATCHEL_BIND")]
    pub bind: SocketAddr,

    /// Disable per-request HTTP tracing
    #[arg(long)]
    pub no_request_log: bool,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let session_config = ctx.session_config()?;
    debug!(config = ?session_config, "Session configuration loaded");

    let registry = SessionRegistry::new(session_config);
    let shutdown = CancellationToken::new();

    let sweeper = Sweeper::new(registry.clone()).spawn_with_token(shutdown.child_token());

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
        }
        ctrl_c.cancel();
    });

    let server_config = ServerConfig::new()
        .with_bind_address(args.bind)
        .with_request_logging(!args.no_request_log);
    let result = Server::new(registry.clone(), server_config)
        .run(shutdown.clone())
        .await;

    // Stop the sweeper even if the server failed to start
    shutdown.cancel();
    sweeper.shutdown().await;
    let dropped = registry.clear();
    info!(dropped, "Session registry drained");

    result?;
    Ok(())
}
