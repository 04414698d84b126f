//! State shared between the acceptor and the per-connection workers,
//! plus the connection-count guard that enforces `max_clients`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use auction_core::AuctionHouse;

/// Sequence number of an accepted backend connection, used to tag its
/// log span. Never reused while the process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub u64);

/// Handles shared by the acceptor and every connection task.
#[derive(Clone)]
pub struct ServerState {
    pub house: Arc<AuctionHouse>,
    pub max_clients: usize,
    pub idle_timeout: Option<Duration>,
    active: Arc<AtomicUsize>,
}

impl ServerState {
    pub fn new(house: Arc<AuctionHouse>, max_clients: usize, idle_timeout: Option<Duration>) -> Self {
        ServerState {
            house,
            max_clients,
            idle_timeout,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of connections currently being served.
    pub fn active_clients(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Reserve a connection slot, or `None` when the server is full.
    pub fn try_acquire_slot(&self) -> Option<ConnectionSlot> {
        let max = self.max_clients;
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < max).then_some(n + 1))
            .ok()
            .map(|_| ConnectionSlot {
                active: self.active.clone(),
            })
    }
}

/// Releases its slot when dropped.
#[derive(Debug)]
pub struct ConnectionSlot {
    active: Arc<AtomicUsize>,
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}
