//! Domain event loop.
//!
//! Subscribes to the auction house's event bus and logs every event as the
//! JSON envelope a real-time fan-out would broadcast. Runs until the bus
//! is dropped.

use auction_core::AuctionEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

pub async fn run_event_loop(mut events: broadcast::Receiver<AuctionEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                info!(room_id = event.room_id(), event = %event.to_json(), "auction event");
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "event logger fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }

    info!("event loop shutting down (bus closed)");
}
