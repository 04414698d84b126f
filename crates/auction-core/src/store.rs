//! Persistence gateway consumed by the auction service.
//!
//! Every mutating method is atomic with respect to the rows it touches.
//! The conditional operations (`place_bid`, `finalize_sale`,
//! `insert_room`, `insert_user`) perform their check and their write as
//! one step, so two callers racing on the same room or username cannot
//! both pass the check.

use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::models::{
    Bid, NewProduct, NewRoom, Product, ProductId, ProductPatch, ProductStatus, Role, Room,
    RoomId, RoomStatus, User, UserId,
};

/// Result of a conditional bid insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BidOutcome {
    /// The bid was recorded and is now the highest.
    Accepted(Bid),
    /// The bid did not beat `current`; nothing was written.
    TooLow { current: u32 },
    /// The room exists but is not `running` (only with `require_running`).
    NotRunning(RoomStatus),
}

/// Result of a buy-now compare-and-swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleOutcome {
    /// This call moved the room to `sold`.
    Sold(Room),
    /// A previous call already sold the room; nothing was written.
    AlreadySold,
}

pub trait AuctionStore: Send + Sync {
    // --- users -----------------------------------------------------------

    fn user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    fn user_by_id(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Fails with `UsernameTaken` if the name exists.
    fn insert_user(&self, username: &str, password: &str, role: Role) -> StoreResult<User>;

    fn update_last_login(&self, id: UserId, at: DateTime<Utc>) -> StoreResult<()>;

    // --- products --------------------------------------------------------

    fn insert_product(&self, owner: UserId, product: NewProduct) -> StoreResult<Product>;

    /// All products, or only those owned by `owner`.
    fn products(&self, owner: Option<UserId>) -> StoreResult<Vec<Product>>;

    fn product_by_id(&self, id: ProductId) -> StoreResult<Option<Product>>;

    /// Fails with `NotFound` unless `owner` owns the product.
    fn update_product(
        &self,
        id: ProductId,
        owner: UserId,
        patch: ProductPatch,
    ) -> StoreResult<Product>;

    /// Fails with `NotFound` unless `owner` owns the product.
    fn delete_product(&self, id: ProductId, owner: UserId) -> StoreResult<()>;

    /// Scoped to `owner` when given, unconditional otherwise.
    fn update_product_status(
        &self,
        id: ProductId,
        status: ProductStatus,
        owner: Option<UserId>,
    ) -> StoreResult<()>;

    // --- rooms -----------------------------------------------------------

    /// Opens a `waiting` room on a product the host owns and that is
    /// `available`, moving the product to `pending` in the same step.
    fn insert_room(&self, host: UserId, room: NewRoom) -> StoreResult<Room>;

    /// All rooms, or only those hosted by `host`.
    fn rooms(&self, host: Option<UserId>) -> StoreResult<Vec<Room>>;

    fn room_by_id(&self, id: RoomId) -> StoreResult<Option<Room>>;

    /// Removes the host's room, returning it. A product still `pending`
    /// on it goes back to `available`.
    fn delete_room(&self, id: RoomId, host: UserId) -> StoreResult<Room>;

    /// Raw status write scoped to `id + host`. Timestamps left as `None`
    /// keep their stored value. Returns whether a row matched.
    fn update_room_status(
        &self,
        id: RoomId,
        host: UserId,
        status: RoomStatus,
        started_at: Option<DateTime<Utc>>,
        ended_at: Option<DateTime<Utc>>,
    ) -> StoreResult<bool>;

    /// Checked lifecycle move (start or cancel) scoped to `id + host`,
    /// coupling the product status to the room.
    fn transition_room(
        &self,
        id: RoomId,
        host: UserId,
        to: RoomStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Room>;

    // --- bids ------------------------------------------------------------

    /// Unconditional append.
    fn record_bid(&self, room_id: RoomId, user_id: UserId, amount: u32) -> StoreResult<Bid>;

    /// Highest recorded amount for the room, `0` if none.
    fn highest_bid(&self, room_id: RoomId) -> StoreResult<u32>;

    /// Records the bid only if `amount > max(base_price, highest_bid)`.
    /// Fails with `NotFound` if the room is missing.
    fn place_bid(
        &self,
        room_id: RoomId,
        user_id: UserId,
        amount: u32,
        require_running: bool,
    ) -> StoreResult<BidOutcome>;

    /// Moves the room to `sold` unless it already is, recording buyer and
    /// price and marking the product `sold`. Fails with `NotFound` if the
    /// room is missing.
    fn finalize_sale(
        &self,
        room_id: RoomId,
        buyer: UserId,
        price: u32,
        at: DateTime<Utc>,
    ) -> StoreResult<SaleOutcome>;
}
