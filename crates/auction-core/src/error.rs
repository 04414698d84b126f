//! Error types for the auction core.
//!
//! - [`StoreError`]: the persistence layer failed or refused a write.
//! - [`AuctionError`]: a business rule rejected a request. Its `Display`
//!   text is the human-readable message carried back on the wire.

use thiserror::Error;

use crate::models::{RoomId, RoomStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already taken: {0}")]
    UsernameTaken(String),

    /// The row does not exist or is not owned by the caller.
    #[error("record not found")]
    NotFound,

    /// The product is missing, owned by someone else, or not `available`.
    #[error("product not available")]
    ProductUnavailable,

    #[error("room {room_id} cannot move from {from} to {to}")]
    InvalidTransition {
        room_id: RoomId,
        from: RoomStatus,
        to: RoomStatus,
    },

    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// A thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum AuctionError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("user exists")]
    UserExists,

    #[error("registration failed")]
    RegistrationFailed,

    #[error("room not found")]
    RoomNotFound,

    #[error("not found")]
    NotFound,

    #[error("bid too low")]
    BidTooLow { current: u32 },

    #[error("room not running")]
    RoomNotRunning,

    #[error("already sold")]
    AlreadySold,

    #[error("invalid product")]
    InvalidProduct,

    #[error("invalid status")]
    InvalidStatus,

    #[error("product not available")]
    ProductNotAvailable,

    #[error("invalid room")]
    InvalidRoom,

    #[error("invalid transition")]
    InvalidTransition,

    #[error("storage failure")]
    Store(#[from] StoreError),
}

pub type AuctionResult<T> = Result<T, AuctionError>;
