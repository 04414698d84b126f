//! Auction state machine.
//!
//! [`AuctionHouse`] owns the session store, a handle to the persistence
//! layer and the event bus. It implements the business rules:
//! - login / register,
//! - bid acceptance (`amount > max(base, highest)`),
//! - buy-now finalization (at most one winner per room),
//! - product and room CRUD scoped to the caller's ownership,
//! - the room lifecycle and its coupling to the product status.
//!
//! It is transport-agnostic: the server crate decodes wire requests,
//! calls in here, and encodes whatever comes back.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{AuctionError, AuctionResult, StoreError};
use crate::events::{AuctionEvent, EventBus};
use crate::models::{
    current_price, Bid, NewProduct, NewRoom, Product, ProductId, ProductPatch, Role, Room,
    RoomId, RoomStatus, User, UserId,
};
use crate::session::{SessionId, SessionStore};
use crate::store::{AuctionStore, BidOutcome, SaleOutcome};

/// Switches for rules that are deliberately left open by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuctionRules {
    /// Reject bids on rooms that are not `running`.
    pub require_running_room: bool,
}

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub session_id: SessionId,
    pub user: User,
}

/// A room plus its price as of the read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub room: Room,
    pub current_price: u32,
}

/// Which rooms a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomScope {
    Public,
    HostedBy(UserId),
}

pub struct AuctionHouse {
    store: Arc<dyn AuctionStore>,
    sessions: SessionStore,
    events: EventBus,
    rules: AuctionRules,
}

impl AuctionHouse {
    pub fn new(store: Arc<dyn AuctionStore>, sessions: SessionStore, rules: AuctionRules) -> Self {
        AuctionHouse {
            store,
            sessions,
            events: EventBus::default(),
            rules,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn store(&self) -> &dyn AuctionStore {
        self.store.as_ref()
    }

    pub fn rules(&self) -> AuctionRules {
        self.rules
    }

    /// User bound to `session_id`, if any.
    pub fn authenticate(&self, session_id: SessionId) -> Option<UserId> {
        self.sessions.lookup(session_id)
    }

    fn require_user(&self, session_id: SessionId) -> AuctionResult<UserId> {
        self.authenticate(session_id).ok_or(AuctionError::Unauthorized)
    }

    // -------------------------------------------------------------------------
    // Accounts
    // -------------------------------------------------------------------------

    /// Create an account. Does not open a session.
    pub fn register(&self, username: &str, password: &str) -> AuctionResult<User> {
        match self.store.insert_user(username, password, Role::User) {
            Ok(user) => {
                info!(user_id = user.id, username, "registered user");
                Ok(user)
            }
            Err(StoreError::UsernameTaken(_)) => Err(AuctionError::UserExists),
            Err(e) => {
                warn!(username, error = %e, "registration failed");
                Err(AuctionError::RegistrationFailed)
            }
        }
    }

    /// Check credentials and open a new session bound to the user.
    pub fn login(&self, username: &str, password: &str) -> AuctionResult<LoginOutcome> {
        let user = self
            .store
            .user_by_username(username)?
            .filter(|u| u.is_active && u.password == password)
            .ok_or(AuctionError::Unauthorized)?;

        if let Err(e) = self.store.update_last_login(user.id, Utc::now()) {
            warn!(user_id = user.id, error = %e, "could not record last login");
        }

        let session_id = self.sessions.create(user.id);
        info!(user_id = user.id, session_id, "login");
        Ok(LoginOutcome { session_id, user })
    }

    pub fn logout(&self, session_id: SessionId) {
        self.sessions.invalidate(session_id);
    }

    // -------------------------------------------------------------------------
    // Rooms: reads
    // -------------------------------------------------------------------------

    fn summarize(&self, room: Room) -> AuctionResult<RoomSummary> {
        let highest = self.store.highest_bid(room.id)?;
        Ok(RoomSummary {
            current_price: current_price(room.base_price, highest),
            room,
        })
    }

    pub fn rooms(&self, scope: RoomScope) -> AuctionResult<Vec<RoomSummary>> {
        let host = match scope {
            RoomScope::Public => None,
            RoomScope::HostedBy(user) => Some(user),
        };
        self.store
            .rooms(host)?
            .into_iter()
            .map(|room| self.summarize(room))
            .collect()
    }

    /// Publicly readable: no ownership check.
    pub fn room(&self, room_id: RoomId) -> AuctionResult<Option<RoomSummary>> {
        self.store
            .room_by_id(room_id)?
            .map(|room| self.summarize(room))
            .transpose()
    }

    // -------------------------------------------------------------------------
    // Bidding
    // -------------------------------------------------------------------------

    /// Accept `amount` if it beats the room's current price.
    pub fn place_bid(&self, session_id: SessionId, room_id: RoomId, amount: u32) -> AuctionResult<Bid> {
        let user = self.require_user(session_id)?;

        let outcome = self
            .store
            .place_bid(room_id, user, amount, self.rules.require_running_room)
            .map_err(|e| match e {
                StoreError::NotFound => AuctionError::RoomNotFound,
                other => AuctionError::Store(other),
            })?;

        match outcome {
            BidOutcome::Accepted(bid) => {
                debug!(room_id, user_id = user, amount, "bid accepted");
                self.events.publish(AuctionEvent::Bid {
                    room_id,
                    user_id: user,
                    amount,
                });
                Ok(bid)
            }
            BidOutcome::TooLow { current } => Err(AuctionError::BidTooLow { current }),
            BidOutcome::NotRunning(_) => Err(AuctionError::RoomNotRunning),
        }
    }

    /// Sell the room to the caller at the supplied price.
    ///
    /// The price is taken verbatim and the host may buy their own room;
    /// only the `sold` status is checked, as one atomic swap.
    pub fn buy_now(&self, session_id: SessionId, room_id: RoomId, price: u32) -> AuctionResult<Room> {
        let buyer = self.require_user(session_id)?;

        let outcome = self
            .store
            .finalize_sale(room_id, buyer, price, Utc::now())
            .map_err(|e| match e {
                StoreError::NotFound => AuctionError::RoomNotFound,
                other => AuctionError::Store(other),
            })?;

        match outcome {
            SaleOutcome::Sold(room) => {
                info!(room_id, buyer, price, "room sold");
                self.events.publish(AuctionEvent::BuyNow {
                    room_id,
                    buyer_id: buyer,
                    final_price: price,
                });
                Ok(room)
            }
            SaleOutcome::AlreadySold => Err(AuctionError::AlreadySold),
        }
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    pub fn products(&self) -> AuctionResult<Vec<Product>> {
        Ok(self.store.products(None)?)
    }

    pub fn own_products(&self, session_id: SessionId) -> AuctionResult<Vec<Product>> {
        let owner = self.require_user(session_id)?;
        Ok(self.store.products(Some(owner))?)
    }

    pub fn product(&self, id: ProductId) -> AuctionResult<Product> {
        self.store.product_by_id(id)?.ok_or(AuctionError::NotFound)
    }

    pub fn create_product(&self, session_id: SessionId, product: NewProduct) -> AuctionResult<Product> {
        let owner = self.require_user(session_id)?;
        if product.name.is_empty() || product.start_price == 0 {
            return Err(AuctionError::InvalidProduct);
        }
        let product = self.store.insert_product(owner, product)?;
        debug!(product_id = product.id, owner, "product created");
        Ok(product)
    }

    pub fn update_product(
        &self,
        session_id: SessionId,
        id: ProductId,
        patch: ProductPatch,
    ) -> AuctionResult<Product> {
        let owner = self.require_user(session_id)?;
        self.store
            .update_product(id, owner, patch)
            .map_err(not_found_as(AuctionError::NotFound))
    }

    pub fn delete_product(&self, session_id: SessionId, id: ProductId) -> AuctionResult<()> {
        let owner = self.require_user(session_id)?;
        self.store
            .delete_product(id, owner)
            .map_err(not_found_as(AuctionError::NotFound))
    }

    // -------------------------------------------------------------------------
    // Rooms: lifecycle
    // -------------------------------------------------------------------------

    /// Open a room on one of the caller's `available` products.
    pub fn create_room(&self, session_id: SessionId, mut room: NewRoom) -> AuctionResult<Room> {
        let host = self.require_user(session_id)?;
        if room.room_name.is_empty() || room.product_id == 0 {
            return Err(AuctionError::InvalidRoom);
        }
        room.duration_seconds = room.duration_seconds.max(1);

        let room = self.store.insert_room(host, room).map_err(|e| match e {
            StoreError::ProductUnavailable => AuctionError::ProductNotAvailable,
            other => AuctionError::Store(other),
        })?;

        info!(room_id = room.id, product_id = room.product_id, host, "room created");
        self.events.publish(AuctionEvent::RoomCreated {
            room_id: room.id,
            product_id: room.product_id,
            host_user_id: host,
            base_price: room.base_price,
        });
        Ok(room)
    }

    pub fn delete_room(&self, session_id: SessionId, room_id: RoomId) -> AuctionResult<Room> {
        let host = self.require_user(session_id)?;
        let room = self
            .store
            .delete_room(room_id, host)
            .map_err(not_found_as(AuctionError::RoomNotFound))?;
        self.events.publish(AuctionEvent::RoomDeleted { room_id });
        Ok(room)
    }

    pub fn start_room(&self, session_id: SessionId, room_id: RoomId) -> AuctionResult<Room> {
        let room = self.transition(session_id, room_id, RoomStatus::Running)?;
        self.events.publish(AuctionEvent::RoomStarted { room_id });
        Ok(room)
    }

    pub fn cancel_room(&self, session_id: SessionId, room_id: RoomId) -> AuctionResult<Room> {
        let room = self.transition(session_id, room_id, RoomStatus::Cancelled)?;
        self.events.publish(AuctionEvent::RoomCancelled { room_id });
        Ok(room)
    }

    fn transition(&self, session_id: SessionId, room_id: RoomId, to: RoomStatus) -> AuctionResult<Room> {
        let host = self.require_user(session_id)?;
        let room = self
            .store
            .transition_room(room_id, host, to, Utc::now())
            .map_err(|e| match e {
                StoreError::NotFound => AuctionError::RoomNotFound,
                StoreError::InvalidTransition { .. } => AuctionError::InvalidTransition,
                other => AuctionError::Store(other),
            })?;
        info!(room_id, host, status = %room.status, "room status changed");
        Ok(room)
    }
}

fn not_found_as(err: AuctionError) -> impl FnOnce(StoreError) -> AuctionError {
    move |e| match e {
        StoreError::NotFound => err,
        other => AuctionError::Store(other),
    }
}
