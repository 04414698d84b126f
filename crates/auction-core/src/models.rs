//! Persistent auction records.
//!
//! These are **storage-agnostic** domain types:
//! - [`User`]: an identity that can log in and own things.
//! - [`Product`]: an auctionable item owned by one user.
//! - [`Room`]: one live auction instance wrapping exactly one product.
//! - [`Bid`]: an append-only record of an offer on a room.
//!
//! Wire encodings live in the `auction-protocol` crate; this module is
//! purely logical.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = u32;
pub type ProductId = u32;
pub type RoomId = u32;

/// Role attached to a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Compared verbatim at login.
    pub password: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Lifecycle of a product.
///
/// `available → pending → running → sold`, with `cancelled` and a reset
/// to `available` reachable while a hosting room has not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Available,
    Pending,
    Running,
    Sold,
    Cancelled,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Available => "available",
            ProductStatus::Pending => "pending",
            ProductStatus::Running => "running",
            ProductStatus::Sold => "sold",
            ProductStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status string does not name a known status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for ProductStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ProductStatus::Available),
            "pending" => Ok(ProductStatus::Pending),
            "running" => Ok(ProductStatus::Running),
            "sold" => Ok(ProductStatus::Sold),
            "cancelled" => Ok(ProductStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// An auctionable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub start_price: u32,
    pub status: ProductStatus,
    pub owner_user_id: UserId,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub start_price: u32,
    pub image_url: Option<String>,
    pub category: Option<String>,
}

/// Partial update of a product. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_price: Option<u32>,
    pub status: Option<ProductStatus>,
    pub image_url: Option<String>,
    pub category: Option<String>,
}

/// Lifecycle of an auction room.
///
/// `waiting/pending → running → {sold | cancelled}`; both end states are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    #[default]
    Waiting,
    Pending,
    Running,
    Sold,
    Cancelled,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Pending => "pending",
            RoomStatus::Running => "running",
            RoomStatus::Sold => "sold",
            RoomStatus::Cancelled => "cancelled",
        }
    }

    /// True for `waiting` and `pending`: the room exists but has not started.
    pub fn is_open(&self) -> bool {
        matches!(self, RoomStatus::Waiting | RoomStatus::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RoomStatus::Sold | RoomStatus::Cancelled)
    }

    /// Whether the room lifecycle allows moving from `self` to `next`.
    pub fn can_become(&self, next: RoomStatus) -> bool {
        match next {
            RoomStatus::Waiting | RoomStatus::Pending => false,
            RoomStatus::Running => self.is_open(),
            RoomStatus::Sold | RoomStatus::Cancelled => !self.is_terminal(),
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(RoomStatus::Waiting),
            "pending" => Ok(RoomStatus::Pending),
            "running" => Ok(RoomStatus::Running),
            "sold" => Ok(RoomStatus::Sold),
            "cancelled" => Ok(RoomStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One auction instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub room_name: String,
    pub product_id: ProductId,
    pub duration_seconds: u32,
    pub status: RoomStatus,
    pub host_user_id: UserId,
    pub base_price: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Set once a buy-now finalizes the room.
    pub buyer_user_id: Option<UserId>,
    pub final_price: Option<u32>,
}

/// Fields supplied when opening a room.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewRoom {
    pub room_name: String,
    pub product_id: ProductId,
    pub duration_seconds: u32,
    pub base_price: u32,
}

/// An accepted offer. Ordering is insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub amount: u32,
    pub placed_at: DateTime<Utc>,
}

/// Current price of a room: the base price or the highest recorded bid,
/// whichever is larger.
pub fn current_price(base_price: u32, highest_bid: u32) -> u32 {
    base_price.max(highest_bid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        for status in [
            ProductStatus::Available,
            ProductStatus::Pending,
            ProductStatus::Running,
            ProductStatus::Sold,
            ProductStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<ProductStatus>(), Ok(status));
        }
        assert!("archived".parse::<ProductStatus>().is_err());
        assert_eq!("running".parse::<RoomStatus>(), Ok(RoomStatus::Running));
    }

    #[test]
    fn room_lifecycle_transitions() {
        assert!(RoomStatus::Waiting.can_become(RoomStatus::Running));
        assert!(RoomStatus::Pending.can_become(RoomStatus::Cancelled));
        assert!(RoomStatus::Running.can_become(RoomStatus::Sold));
        assert!(!RoomStatus::Running.can_become(RoomStatus::Running));
        assert!(!RoomStatus::Sold.can_become(RoomStatus::Cancelled));
        assert!(!RoomStatus::Cancelled.can_become(RoomStatus::Running));
    }

    #[test]
    fn current_price_takes_maximum() {
        assert_eq!(current_price(100, 0), 100);
        assert_eq!(current_price(100, 150), 150);
    }
}
