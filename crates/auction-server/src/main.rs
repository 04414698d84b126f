//! Binary TCP server for the auction backend.

use anyhow::Result;
use auction_server::config::Config;
use auction_server::server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        max_clients = config.max_clients,
        idle_timeout = ?config.idle_timeout,
        session_ttl = ?config.session_ttl,
        data_path = ?config.data_path,
        require_running_room = config.require_running_room,
        "starting auction-server"
    );

    server::run(config).await
}
