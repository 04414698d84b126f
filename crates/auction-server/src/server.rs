//! Backend entry point: builds the auction house from `Config`, binds the
//! listener and hands every accepted gateway connection its own worker
//! task. One extra task drains the auction event bus into the log.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use auction_core::{AuctionHouse, AuctionRules, AuctionStore, MemoryStore, SessionStore};
use tokio::net::TcpListener;
use tracing::{error, info, info_span, warn, Instrument};

use crate::client;
use crate::config::Config;
use crate::event_task;
use crate::types::{ClientId, ServerState};

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

fn next_client_id() -> ClientId {
    ClientId(NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Assemble the auction house described by `config`.
pub fn build_house(config: &Config) -> Result<Arc<AuctionHouse>> {
    let store: Arc<dyn AuctionStore> = match &config.data_path {
        Some(path) => Arc::new(
            MemoryStore::open(path).with_context(|| format!("opening store {}", path.display()))?,
        ),
        None => Arc::new(MemoryStore::new()),
    };
    let rules = AuctionRules {
        require_running_room: config.require_running_room,
    };
    Ok(Arc::new(AuctionHouse::new(
        store,
        SessionStore::new(config.session_ttl),
        rules,
    )))
}

/// Build the house, bind `bind_addr:port` and serve until accept fails.
pub async fn run(config: Config) -> Result<()> {
    let house = build_house(&config)?;
    let addr = config.socket_addr_string();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");

    serve(listener, ServerState::new(house, config.max_clients, config.idle_timeout)).await
}

/// Accept loop on an already-bound listener.
pub async fn serve(listener: TcpListener, state: ServerState) -> Result<()> {
    tokio::spawn(event_task::run_event_loop(state.house.events().subscribe()));

    loop {
        let (stream, peer_addr) = listener.accept().await.context("accepting connection")?;

        let Some(slot) = state.try_acquire_slot() else {
            warn!(
                %peer_addr,
                max_clients = state.max_clients,
                "rejecting connection: max_clients reached"
            );
            // Dropping the stream closes it; the gateway sees a failed transaction.
            continue;
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!(%peer_addr, error = %e, "could not set TCP_NODELAY");
        }

        let client_id = next_client_id();
        let span = info_span!("conn", id = client_id.0, peer = %peer_addr);
        let state = state.clone();

        tokio::spawn(
            async move {
                info!(active = state.active_clients(), "accepted");
                match client::run_client(stream, state).await {
                    Ok(()) => info!("disconnected"),
                    Err(e) => error!(error = %e, "connection error"),
                }
                drop(slot);
            }
            .instrument(span),
        );
    }
}
