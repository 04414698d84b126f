//! auction-core
//!
//! Pure auction logic:
//! - domain records (users, products, rooms, bids)
//! - session store
//! - persistence gateway trait + in-memory store
//! - auction state machine and its domain events

pub mod models;
pub mod error;
pub mod session;
pub mod store;
pub mod memory_store;
pub mod events;
pub mod auction_house;

pub use models::{
    current_price,
    Bid,
    NewProduct,
    NewRoom,
    Product,
    ProductId,
    ProductPatch,
    ProductStatus,
    Role,
    Room,
    RoomId,
    RoomStatus,
    UnknownStatus,
    User,
    UserId,
};

pub use error::{AuctionError, AuctionResult, StoreError, StoreResult};
pub use session::{SessionId, SessionStore, FIRST_SESSION_ID};
pub use store::{AuctionStore, BidOutcome, SaleOutcome};
pub use memory_store::MemoryStore;
pub use events::{AuctionEvent, EventBus};
pub use auction_house::{AuctionHouse, AuctionRules, LoginOutcome, RoomScope, RoomSummary};
