//! auction-client
//!
//! Transacting client for the auction backend: a one-shot [`transact`], a
//! [`ConnectionPool`] of persistent connections and the typed
//! [`AuctionClient`] used by gateways and `auction-cli`.

pub mod error;
pub mod transact;
pub mod pool;
pub mod api;

pub use api::{AuctionClient, Session};
pub use error::ClientError;
pub use pool::{ConnectionPool, DEFAULT_MAX_IDLE};
pub use transact::transact;
