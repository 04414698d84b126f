//! In-memory [`AuctionStore`] with an optional JSON snapshot file.
//!
//! All tables sit behind one mutex, so every trait method, including
//! the check-then-write ones, runs as a single critical section. When a
//! snapshot path is configured the whole state is rewritten after each
//! successful mutation (temp file + rename) and reloaded on open.
//!
//! Each snapshot write serializes the whole state under the lock, and
//! `highest_bid` scans every bid.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::models::{
    current_price, Bid, NewProduct, NewRoom, Product, ProductId, ProductPatch, ProductStatus,
    Role, Room, RoomId, RoomStatus, User, UserId,
};
use crate::store::{AuctionStore, BidOutcome, SaleOutcome};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Tables {
    next_user_id: UserId,
    next_product_id: ProductId,
    next_room_id: RoomId,
    users: BTreeMap<UserId, User>,
    products: BTreeMap<ProductId, Product>,
    rooms: BTreeMap<RoomId, Room>,
    bids: Vec<Bid>,
}

impl Default for Tables {
    fn default() -> Self {
        Tables {
            next_user_id: 1,
            next_product_id: 1,
            next_room_id: 1,
            users: BTreeMap::new(),
            products: BTreeMap::new(),
            rooms: BTreeMap::new(),
            bids: Vec::new(),
        }
    }
}

impl Tables {
    fn highest_bid(&self, room_id: RoomId) -> u32 {
        self.bids
            .iter()
            .filter(|b| b.room_id == room_id)
            .map(|b| b.amount)
            .max()
            .unwrap_or(0)
    }

    fn owned_room_mut(&mut self, id: RoomId, host: UserId) -> StoreResult<&mut Room> {
        self.rooms
            .get_mut(&id)
            .filter(|r| r.host_user_id == host)
            .ok_or(StoreError::NotFound)
    }

    fn set_product_status(&mut self, id: ProductId, status: ProductStatus, at: DateTime<Utc>) {
        if let Some(product) = self.products.get_mut(&id) {
            product.status = status;
            product.updated_at = at;
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    /// Purely in-memory store; state is lost on drop.
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Store backed by a snapshot file. A missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let tables = if path.exists() {
            let raw = fs::read(&path)?;
            let tables: Tables = serde_json::from_slice(&raw)?;
            info!(
                path = %path.display(),
                users = tables.users.len(),
                products = tables.products.len(),
                rooms = tables.rooms.len(),
                "loaded store snapshot"
            );
            tables
        } else {
            Tables::default()
        };

        Ok(MemoryStore {
            tables: Mutex::new(tables),
            snapshot_path: Some(path),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }

    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> StoreResult<R> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }

    /// Run a mutation under the lock. With a snapshot configured the
    /// mutation is staged on a copy and only committed once the snapshot
    /// is on disk, so a failed write leaves the tables untouched.
    fn write<R>(&self, f: impl FnOnce(&mut Tables) -> StoreResult<R>) -> StoreResult<R> {
        let mut guard = self.lock()?;
        if self.snapshot_path.is_none() {
            return f(&mut guard);
        }

        let mut staged = guard.clone();
        let out = f(&mut staged)?;
        self.persist(&staged)?;
        *guard = staged;
        Ok(out)
    }

    fn persist(&self, tables: &Tables) -> StoreResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec(tables)?)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "store snapshot written");
        Ok(())
    }
}

impl AuctionStore for MemoryStore {
    fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.read(|t| t.users.values().find(|u| u.username == username).cloned())
    }

    fn user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        self.read(|t| t.users.get(&id).cloned())
    }

    fn insert_user(&self, username: &str, password: &str, role: Role) -> StoreResult<User> {
        self.write(|t| {
            if t.users.values().any(|u| u.username == username) {
                return Err(StoreError::UsernameTaken(username.to_string()));
            }
            let id = t.next_user_id;
            t.next_user_id += 1;
            let user = User {
                id,
                username: username.to_string(),
                password: password.to_string(),
                role,
                is_active: true,
                created_at: Utc::now(),
                last_login: None,
            };
            t.users.insert(id, user.clone());
            Ok(user)
        })
    }

    fn update_last_login(&self, id: UserId, at: DateTime<Utc>) -> StoreResult<()> {
        self.write(|t| {
            let user = t.users.get_mut(&id).ok_or(StoreError::NotFound)?;
            user.last_login = Some(at);
            Ok(())
        })
    }

    fn insert_product(&self, owner: UserId, product: NewProduct) -> StoreResult<Product> {
        self.write(|t| {
            let id = t.next_product_id;
            t.next_product_id += 1;
            let now = Utc::now();
            let product = Product {
                id,
                name: product.name,
                description: product.description,
                start_price: product.start_price,
                status: ProductStatus::Available,
                owner_user_id: owner,
                image_url: product.image_url,
                category: product.category,
                created_at: now,
                updated_at: now,
            };
            t.products.insert(id, product.clone());
            Ok(product)
        })
    }

    fn products(&self, owner: Option<UserId>) -> StoreResult<Vec<Product>> {
        self.read(|t| {
            t.products
                .values()
                .filter(|p| owner.map_or(true, |o| p.owner_user_id == o))
                .cloned()
                .collect()
        })
    }

    fn product_by_id(&self, id: ProductId) -> StoreResult<Option<Product>> {
        self.read(|t| t.products.get(&id).cloned())
    }

    fn update_product(
        &self,
        id: ProductId,
        owner: UserId,
        patch: ProductPatch,
    ) -> StoreResult<Product> {
        self.write(|t| {
            let product = t
                .products
                .get_mut(&id)
                .filter(|p| p.owner_user_id == owner)
                .ok_or(StoreError::NotFound)?;

            if let Some(name) = patch.name {
                product.name = name;
            }
            if let Some(description) = patch.description {
                product.description = Some(description);
            }
            if let Some(price) = patch.start_price {
                product.start_price = price;
            }
            if let Some(status) = patch.status {
                product.status = status;
            }
            if let Some(url) = patch.image_url {
                product.image_url = Some(url);
            }
            if let Some(category) = patch.category {
                product.category = Some(category);
            }
            product.updated_at = Utc::now();
            Ok(product.clone())
        })
    }

    fn delete_product(&self, id: ProductId, owner: UserId) -> StoreResult<()> {
        self.write(|t| {
            let owned = t.products.get(&id).map_or(false, |p| p.owner_user_id == owner);
            if !owned {
                return Err(StoreError::NotFound);
            }
            t.products.remove(&id);
            Ok(())
        })
    }

    fn update_product_status(
        &self,
        id: ProductId,
        status: ProductStatus,
        owner: Option<UserId>,
    ) -> StoreResult<()> {
        self.write(|t| {
            let product = t
                .products
                .get_mut(&id)
                .filter(|p| owner.map_or(true, |o| p.owner_user_id == o))
                .ok_or(StoreError::NotFound)?;
            product.status = status;
            product.updated_at = Utc::now();
            Ok(())
        })
    }

    fn insert_room(&self, host: UserId, room: NewRoom) -> StoreResult<Room> {
        self.write(|t| {
            let available = t.products.get(&room.product_id).map_or(false, |p| {
                p.owner_user_id == host && p.status == ProductStatus::Available
            });
            if !available {
                return Err(StoreError::ProductUnavailable);
            }

            let id = t.next_room_id;
            t.next_room_id += 1;
            let now = Utc::now();
            let room = Room {
                id,
                room_name: room.room_name,
                product_id: room.product_id,
                duration_seconds: room.duration_seconds,
                status: RoomStatus::Waiting,
                host_user_id: host,
                base_price: room.base_price,
                created_at: now,
                updated_at: now,
                started_at: None,
                ended_at: None,
                buyer_user_id: None,
                final_price: None,
            };
            t.rooms.insert(id, room.clone());
            t.set_product_status(room.product_id, ProductStatus::Pending, now);
            Ok(room)
        })
    }

    fn rooms(&self, host: Option<UserId>) -> StoreResult<Vec<Room>> {
        self.read(|t| {
            t.rooms
                .values()
                .filter(|r| host.map_or(true, |h| r.host_user_id == h))
                .cloned()
                .collect()
        })
    }

    fn room_by_id(&self, id: RoomId) -> StoreResult<Option<Room>> {
        self.read(|t| t.rooms.get(&id).cloned())
    }

    fn delete_room(&self, id: RoomId, host: UserId) -> StoreResult<Room> {
        self.write(|t| {
            t.owned_room_mut(id, host)?;
            let room = t.rooms.remove(&id).ok_or(StoreError::NotFound)?;
            let pending = t
                .products
                .get(&room.product_id)
                .map_or(false, |p| p.status == ProductStatus::Pending);
            if pending {
                t.set_product_status(room.product_id, ProductStatus::Available, Utc::now());
            }
            Ok(room)
        })
    }

    fn update_room_status(
        &self,
        id: RoomId,
        host: UserId,
        status: RoomStatus,
        started_at: Option<DateTime<Utc>>,
        ended_at: Option<DateTime<Utc>>,
    ) -> StoreResult<bool> {
        self.write(|t| {
            let Ok(room) = t.owned_room_mut(id, host) else {
                return Ok(false);
            };
            room.status = status;
            if started_at.is_some() {
                room.started_at = started_at;
            }
            if ended_at.is_some() {
                room.ended_at = ended_at;
            }
            room.updated_at = Utc::now();
            Ok(true)
        })
    }

    fn transition_room(
        &self,
        id: RoomId,
        host: UserId,
        to: RoomStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Room> {
        self.write(|t| {
            let room = t.owned_room_mut(id, host)?;
            let from = room.status;
            let allowed = matches!(to, RoomStatus::Running | RoomStatus::Cancelled)
                && from.can_become(to);
            if !allowed {
                return Err(StoreError::InvalidTransition { room_id: id, from, to });
            }

            room.status = to;
            room.updated_at = at;
            let product_status = match to {
                RoomStatus::Running => {
                    room.started_at = Some(at);
                    ProductStatus::Running
                }
                _ => {
                    room.ended_at = Some(at);
                    if from.is_open() {
                        ProductStatus::Available
                    } else {
                        ProductStatus::Cancelled
                    }
                }
            };
            let room = room.clone();
            t.set_product_status(room.product_id, product_status, at);
            Ok(room)
        })
    }

    fn record_bid(&self, room_id: RoomId, user_id: UserId, amount: u32) -> StoreResult<Bid> {
        self.write(|t| {
            let bid = Bid {
                room_id,
                user_id,
                amount,
                placed_at: Utc::now(),
            };
            t.bids.push(bid.clone());
            Ok(bid)
        })
    }

    fn highest_bid(&self, room_id: RoomId) -> StoreResult<u32> {
        self.read(|t| t.highest_bid(room_id))
    }

    fn place_bid(
        &self,
        room_id: RoomId,
        user_id: UserId,
        amount: u32,
        require_running: bool,
    ) -> StoreResult<BidOutcome> {
        self.write(|t| {
            let room = t.rooms.get(&room_id).ok_or(StoreError::NotFound)?;
            if require_running && room.status != RoomStatus::Running {
                return Ok(BidOutcome::NotRunning(room.status));
            }

            let current = current_price(room.base_price, t.highest_bid(room_id));
            if amount <= current {
                return Ok(BidOutcome::TooLow { current });
            }

            let bid = Bid {
                room_id,
                user_id,
                amount,
                placed_at: Utc::now(),
            };
            t.bids.push(bid.clone());
            Ok(BidOutcome::Accepted(bid))
        })
    }

    fn finalize_sale(
        &self,
        room_id: RoomId,
        buyer: UserId,
        price: u32,
        at: DateTime<Utc>,
    ) -> StoreResult<SaleOutcome> {
        self.write(|t| {
            let room = t.rooms.get_mut(&room_id).ok_or(StoreError::NotFound)?;
            if room.status == RoomStatus::Sold {
                return Ok(SaleOutcome::AlreadySold);
            }

            room.status = RoomStatus::Sold;
            room.ended_at = Some(at);
            room.updated_at = at;
            room.buyer_user_id = Some(buyer);
            room.final_price = Some(price);
            let room = room.clone();
            t.set_product_status(room.product_id, ProductStatus::Sold, at);
            Ok(SaleOutcome::Sold(room))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn setup() -> (MemoryStore, UserId, Room) {
        let store = MemoryStore::new();
        let host = store.insert_user("host", "pw", Role::User).unwrap().id;
        let product = store
            .insert_product(
                host,
                NewProduct {
                    name: "Lamp".into(),
                    start_price: 50,
                    ..Default::default()
                },
            )
            .unwrap();
        let room = store
            .insert_room(
                host,
                NewRoom {
                    room_name: "Lamp Auction".into(),
                    product_id: product.id,
                    duration_seconds: 60,
                    base_price: 100,
                },
            )
            .unwrap();
        (store, host, room)
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let store = MemoryStore::new();
        store.insert_user("alice", "a", Role::User).unwrap();
        let err = store.insert_user("alice", "b", Role::User).unwrap_err();
        assert!(matches!(err, StoreError::UsernameTaken(name) if name == "alice"));
    }

    #[test]
    fn room_creation_moves_product_to_pending() {
        let (store, _, room) = setup();
        let product = store.product_by_id(room.product_id).unwrap().unwrap();
        assert_eq!(product.status, ProductStatus::Pending);
        assert_eq!(room.status, RoomStatus::Waiting);
    }

    #[test]
    fn room_requires_owned_available_product() {
        let (store, host, room) = setup();
        let other = store.insert_user("other", "pw", Role::User).unwrap().id;

        let again = NewRoom {
            room_name: "again".into(),
            product_id: room.product_id,
            ..Default::default()
        };
        assert!(matches!(
            store.insert_room(host, again.clone()),
            Err(StoreError::ProductUnavailable)
        ));
        assert!(matches!(
            store.insert_room(other, again),
            Err(StoreError::ProductUnavailable)
        ));
    }

    #[test]
    fn bids_must_beat_current_price() {
        let (store, host, room) = setup();
        assert_eq!(
            store.place_bid(room.id, host, 100, false).unwrap(),
            BidOutcome::TooLow { current: 100 }
        );
        assert!(matches!(
            store.place_bid(room.id, host, 150, false).unwrap(),
            BidOutcome::Accepted(_)
        ));
        assert_eq!(
            store.place_bid(room.id, host, 120, false).unwrap(),
            BidOutcome::TooLow { current: 150 }
        );
        assert_eq!(store.highest_bid(room.id).unwrap(), 150);
        assert!(matches!(
            store.place_bid(999, host, 500, false),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn running_requirement_is_optional() {
        let (store, host, room) = setup();
        assert_eq!(
            store.place_bid(room.id, host, 200, true).unwrap(),
            BidOutcome::NotRunning(RoomStatus::Waiting)
        );
        store
            .transition_room(room.id, host, RoomStatus::Running, Utc::now())
            .unwrap();
        assert!(matches!(
            store.place_bid(room.id, host, 200, true).unwrap(),
            BidOutcome::Accepted(_)
        ));
    }

    #[test]
    fn start_and_cancel_couple_product_status() {
        let (store, host, room) = setup();
        let started = store
            .transition_room(room.id, host, RoomStatus::Running, Utc::now())
            .unwrap();
        assert!(started.started_at.is_some());
        let product = store.product_by_id(room.product_id).unwrap().unwrap();
        assert_eq!(product.status, ProductStatus::Running);

        store
            .transition_room(room.id, host, RoomStatus::Cancelled, Utc::now())
            .unwrap();
        let product = store.product_by_id(room.product_id).unwrap().unwrap();
        assert_eq!(product.status, ProductStatus::Cancelled);

        assert!(matches!(
            store.transition_room(room.id, host, RoomStatus::Running, Utc::now()),
            Err(StoreError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn cancelling_unstarted_room_releases_product() {
        let (store, host, room) = setup();
        store
            .transition_room(room.id, host, RoomStatus::Cancelled, Utc::now())
            .unwrap();
        let product = store.product_by_id(room.product_id).unwrap().unwrap();
        assert_eq!(product.status, ProductStatus::Available);
    }

    #[test]
    fn mutations_are_scoped_to_the_host() {
        let (store, _, room) = setup();
        let other = store.insert_user("other", "pw", Role::User).unwrap().id;
        assert!(matches!(
            store.delete_room(room.id, other),
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.transition_room(room.id, other, RoomStatus::Running, Utc::now()),
            Err(StoreError::NotFound)
        ));
        assert!(!store
            .update_room_status(room.id, other, RoomStatus::Running, None, None)
            .unwrap());
        assert!(matches!(
            store.delete_product(room.product_id, other),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn deleting_pending_room_releases_product() {
        let (store, host, room) = setup();
        store.delete_room(room.id, host).unwrap();
        assert!(store.room_by_id(room.id).unwrap().is_none());
        let product = store.product_by_id(room.product_id).unwrap().unwrap();
        assert_eq!(product.status, ProductStatus::Available);
    }

    #[test]
    fn sale_is_compare_and_swap() {
        let (store, host, room) = setup();
        let sold = store.finalize_sale(room.id, host, 500, Utc::now()).unwrap();
        match sold {
            SaleOutcome::Sold(r) => {
                assert_eq!(r.status, RoomStatus::Sold);
                assert_eq!(r.buyer_user_id, Some(host));
                assert_eq!(r.final_price, Some(500));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            store.finalize_sale(room.id, host, 900, Utc::now()).unwrap(),
            SaleOutcome::AlreadySold
        );
        let product = store.product_by_id(room.product_id).unwrap().unwrap();
        assert_eq!(product.status, ProductStatus::Sold);
    }

    #[test]
    fn concurrent_sales_have_one_winner() {
        let (store, _, room) = setup();
        let store = Arc::new(store);
        let handles: Vec<_> = (0..16)
            .map(|buyer| {
                let store = store.clone();
                std::thread::spawn(move || store.finalize_sale(room.id, buyer, 500, Utc::now()))
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .filter(|o| matches!(o, SaleOutcome::Sold(_)))
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn owner_scoped_product_status_checks_the_owner() {
        let (store, host, room) = setup();
        let other = store.insert_user("other", "pw", Role::User).unwrap().id;

        assert!(matches!(
            store.update_product_status(room.product_id, ProductStatus::Sold, Some(other)),
            Err(StoreError::NotFound)
        ));
        let product = store.product_by_id(room.product_id).unwrap().unwrap();
        assert_eq!(product.status, ProductStatus::Pending);

        store
            .update_product_status(room.product_id, ProductStatus::Available, Some(host))
            .unwrap();
        let product = store.product_by_id(room.product_id).unwrap().unwrap();
        assert_eq!(product.status, ProductStatus::Available);
    }

    #[test]
    fn unconditional_product_status_ignores_owner() {
        let (store, _, room) = setup();
        store
            .update_product_status(room.product_id, ProductStatus::Cancelled, None)
            .unwrap();
        let product = store.product_by_id(room.product_id).unwrap().unwrap();
        assert_eq!(product.status, ProductStatus::Cancelled);

        assert!(matches!(
            store.update_product_status(999, ProductStatus::Sold, None),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn record_bid_appends_without_price_check() {
        let (store, host, room) = setup();
        store.record_bid(room.id, host, 300).unwrap();
        let low = store.record_bid(room.id, host, 5).unwrap();
        assert_eq!(low.amount, 5);
        assert_eq!(store.highest_bid(room.id).unwrap(), 300);
        assert_eq!(
            store.place_bid(room.id, host, 250, false).unwrap(),
            BidOutcome::TooLow { current: 300 }
        );
    }

    #[test]
    fn update_room_status_is_host_scoped() {
        let (store, host, room) = setup();
        let other = store.insert_user("other", "pw", Role::User).unwrap().id;

        assert!(!store
            .update_room_status(room.id, other, RoomStatus::Running, Some(Utc::now()), None)
            .unwrap());
        assert_eq!(
            store.room_by_id(room.id).unwrap().unwrap().status,
            RoomStatus::Waiting
        );

        assert!(store
            .update_room_status(room.id, host, RoomStatus::Running, Some(Utc::now()), None)
            .unwrap());
        let updated = store.room_by_id(room.id).unwrap().unwrap();
        assert_eq!(updated.status, RoomStatus::Running);
        assert!(updated.started_at.is_some());
    }

    #[test]
    fn failed_snapshot_write_leaves_state_unchanged() {
        let dir = std::env::temp_dir().join(format!("auction-store-fail-{}", std::process::id()));
        let sub = dir.join("sub");
        let _ = fs::remove_dir_all(&dir);

        let store = MemoryStore::open(sub.join("snapshot.json")).unwrap();
        let host = store.insert_user("host", "pw", Role::User).unwrap().id;
        let product = store
            .insert_product(
                host,
                NewProduct {
                    name: "Lamp".into(),
                    start_price: 50,
                    ..Default::default()
                },
            )
            .unwrap();
        let room = store
            .insert_room(
                host,
                NewRoom {
                    room_name: "Lamp Auction".into(),
                    product_id: product.id,
                    duration_seconds: 60,
                    base_price: 100,
                },
            )
            .unwrap();

        // A file where the snapshot directory should be makes every write fail.
        fs::remove_dir_all(&sub).unwrap();
        fs::write(&sub, b"blocked").unwrap();

        assert!(store.finalize_sale(room.id, host, 500, Utc::now()).is_err());
        assert!(store.place_bid(room.id, host, 150, false).is_err());
        assert!(store.insert_user("late", "pw", Role::User).is_err());

        let unchanged = store.room_by_id(room.id).unwrap().unwrap();
        assert_eq!(unchanged.status, RoomStatus::Waiting);
        assert_eq!(unchanged.buyer_user_id, None);
        assert_eq!(store.highest_bid(room.id).unwrap(), 0);
        assert!(store.user_by_username("late").unwrap().is_none());
        assert_eq!(
            store.product_by_id(product.id).unwrap().unwrap().status,
            ProductStatus::Pending
        );

        fs::remove_file(&sub).unwrap();
        assert!(matches!(
            store.finalize_sale(room.id, host, 500, Utc::now()).unwrap(),
            SaleOutcome::Sold(_)
        ));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn snapshot_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("auction-store-{}", std::process::id()));
        let path = dir.join("snapshot.json");
        let _ = fs::remove_file(&path);

        {
            let store = MemoryStore::open(&path).unwrap();
            let user = store.insert_user("bob", "pw", Role::User).unwrap();
            store
                .insert_product(
                    user.id,
                    NewProduct {
                        name: "Clock".into(),
                        start_price: 10,
                        ..Default::default()
                    },
                )
                .unwrap();
        }

        let reopened = MemoryStore::open(&path).unwrap();
        let user = reopened.user_by_username("bob").unwrap().unwrap();
        assert_eq!(reopened.products(Some(user.id)).unwrap().len(), 1);
        let next = reopened.insert_user("carol", "pw", Role::User).unwrap();
        assert_eq!(next.id, user.id + 1);

        let _ = fs::remove_dir_all(&dir);
    }
}
