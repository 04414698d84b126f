//! JSON bodies carried inside NOTIFY_MESSAGE.
//!
//! A request is the pair `(code, body)`; [`NotifyCommand::parse`] turns it
//! into one variant per operation so handlers never look at the raw code
//! again. Replies are rendered by [`NotifyReply::to_json`]; the client reads
//! them back with [`ProductView`] / [`RoomView`] and [`ErrorBody`].

use auction_core::{
    NewProduct, NewRoom, Product, ProductId, ProductPatch, ProductStatus, RoomId, RoomSummary,
    UnknownStatus, UserId,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::wire_types::NotifyCode;

// ============================================================================
// Request bodies
// ============================================================================

/// `PRODUCT_CREATE` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_price: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ProductDraft {
    /// Prices that are not positive or do not fit a `u32` become 0, which the
    /// auction house rejects.
    pub fn into_new_product(self) -> NewProduct {
        NewProduct {
            name: self.name,
            description: non_empty(self.description),
            start_price: positive_u32(self.start_price).unwrap_or(0),
            image_url: non_empty(self.image_url),
            category: non_empty(self.category),
        }
    }
}

/// `PRODUCT_UPDATE` body. Empty strings and non-positive prices keep the
/// stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductUpdate {
    pub id: ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ProductUpdate {
    pub fn to_patch(&self) -> Result<ProductPatch, UnknownStatus> {
        let status = match non_empty(self.status.clone()) {
            Some(s) => Some(s.parse::<ProductStatus>()?),
            None => None,
        };
        Ok(ProductPatch {
            name: non_empty(self.name.clone()),
            description: non_empty(self.description.clone()),
            start_price: self.start_price.and_then(positive_u32),
            status,
            image_url: non_empty(self.image_url.clone()),
            category: non_empty(self.category.clone()),
        })
    }
}

/// `ROOM_CREATE` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomDraft {
    pub room_name: String,
    pub product_id: ProductId,
    /// Seconds; clamped to at least 1.
    pub duration: i64,
    /// Clamped to at least 0.
    pub base_price: i64,
}

impl RoomDraft {
    pub fn into_new_room(self) -> NewRoom {
        NewRoom {
            room_name: self.room_name,
            product_id: self.product_id,
            duration_seconds: clamp_u32(self.duration.max(1)),
            base_price: clamp_u32(self.base_price.max(0)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductRef {
    pub id: ProductId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomRef {
    pub room_id: RoomId,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn positive_u32(value: i64) -> Option<u32> {
    u32::try_from(value).ok().filter(|v| *v > 0)
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

// ============================================================================
// Commands
// ============================================================================

/// A decoded NOTIFY_MESSAGE request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyCommand {
    ListProducts,
    GetProduct(ProductRef),
    CreateProduct(ProductDraft),
    UpdateProduct(ProductUpdate),
    DeleteProduct(ProductRef),
    ListOwnProducts,
    ListPublicRooms,
    ListOwnRooms,
    CreateRoom(RoomDraft),
    DeleteRoom(RoomRef),
    StartRoom(RoomRef),
    CancelRoom(RoomRef),
    /// A code with no operation behind it, `NONE` included.
    Unsupported(u32),
    /// A known operation whose body is not the JSON it expects.
    Invalid(NotifyCode),
}

impl NotifyCommand {
    /// Decode `(code, body)`. An empty body reads as `{}`.
    pub fn parse(code: u32, body: &str) -> Self {
        let Some(known) = NotifyCode::from_u32(code) else {
            return NotifyCommand::Unsupported(code);
        };
        let body = if body.trim().is_empty() { "{}" } else { body };

        fn with<T: DeserializeOwned>(
            code: NotifyCode,
            body: &str,
            f: impl FnOnce(T) -> NotifyCommand,
        ) -> NotifyCommand {
            serde_json::from_str(body).map_or(NotifyCommand::Invalid(code), f)
        }

        match known {
            NotifyCode::None => NotifyCommand::Unsupported(code),
            NotifyCode::ProductList => NotifyCommand::ListProducts,
            NotifyCode::ProductListOwn => NotifyCommand::ListOwnProducts,
            NotifyCode::RoomListPublic => NotifyCommand::ListPublicRooms,
            NotifyCode::RoomListOwn => NotifyCommand::ListOwnRooms,
            NotifyCode::ProductGet => with(known, body, NotifyCommand::GetProduct),
            NotifyCode::ProductCreate => with(known, body, NotifyCommand::CreateProduct),
            NotifyCode::ProductUpdate => with(known, body, NotifyCommand::UpdateProduct),
            NotifyCode::ProductDelete => with(known, body, NotifyCommand::DeleteProduct),
            NotifyCode::RoomCreate => with(known, body, NotifyCommand::CreateRoom),
            NotifyCode::RoomDelete => with(known, body, NotifyCommand::DeleteRoom),
            NotifyCode::RoomStart => with(known, body, NotifyCommand::StartRoom),
            NotifyCode::RoomCancel => with(known, body, NotifyCommand::CancelRoom),
        }
    }

    /// Raw code for the envelope.
    pub fn code(&self) -> u32 {
        let known = match self {
            NotifyCommand::ListProducts => NotifyCode::ProductList,
            NotifyCommand::GetProduct(_) => NotifyCode::ProductGet,
            NotifyCommand::CreateProduct(_) => NotifyCode::ProductCreate,
            NotifyCommand::UpdateProduct(_) => NotifyCode::ProductUpdate,
            NotifyCommand::DeleteProduct(_) => NotifyCode::ProductDelete,
            NotifyCommand::ListOwnProducts => NotifyCode::ProductListOwn,
            NotifyCommand::ListPublicRooms => NotifyCode::RoomListPublic,
            NotifyCommand::ListOwnRooms => NotifyCode::RoomListOwn,
            NotifyCommand::CreateRoom(_) => NotifyCode::RoomCreate,
            NotifyCommand::DeleteRoom(_) => NotifyCode::RoomDelete,
            NotifyCommand::StartRoom(_) => NotifyCode::RoomStart,
            NotifyCommand::CancelRoom(_) => NotifyCode::RoomCancel,
            NotifyCommand::Unsupported(raw) => return *raw,
            NotifyCommand::Invalid(code) => *code,
        };
        known.as_u32()
    }

    /// JSON body for the envelope.
    pub fn body(&self) -> String {
        let encoded = match self {
            NotifyCommand::GetProduct(r) | NotifyCommand::DeleteProduct(r) => serde_json::to_string(r),
            NotifyCommand::CreateProduct(d) => serde_json::to_string(d),
            NotifyCommand::UpdateProduct(u) => serde_json::to_string(u),
            NotifyCommand::CreateRoom(d) => serde_json::to_string(d),
            NotifyCommand::DeleteRoom(r) | NotifyCommand::StartRoom(r) | NotifyCommand::CancelRoom(r) => {
                serde_json::to_string(r)
            }
            _ => return "{}".to_string(),
        };
        encoded.unwrap_or_else(|_| "{}".to_string())
    }

    /// Whether the operation needs a logged-in caller.
    pub fn requires_session(&self) -> bool {
        !matches!(
            self,
            NotifyCommand::ListProducts
                | NotifyCommand::GetProduct(_)
                | NotifyCommand::ListPublicRooms
                | NotifyCommand::Unsupported(_)
                | NotifyCommand::Invalid(_)
        )
    }
}

// ============================================================================
// Replies
// ============================================================================

/// Public JSON view of a product. Missing optional text renders as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub start_price: u32,
    pub status: String,
    pub owner_user_id: UserId,
    pub image_url: String,
    pub category: String,
    pub created_at: String,
}

impl From<&Product> for ProductView {
    fn from(p: &Product) -> Self {
        ProductView {
            id: p.id,
            name: p.name.clone(),
            description: p.description.clone().unwrap_or_default(),
            start_price: p.start_price,
            status: p.status.to_string(),
            owner_user_id: p.owner_user_id,
            image_url: p.image_url.clone().unwrap_or_default(),
            category: p.category.clone().unwrap_or_default(),
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// Public JSON view of a room, price resolved at read time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomView {
    pub id: RoomId,
    pub room_name: String,
    pub product_id: ProductId,
    pub status: String,
    pub host_user_id: UserId,
    pub base_price: u32,
    pub current_price: u32,
    pub duration: u32,
}

impl From<&RoomSummary> for RoomView {
    fn from(s: &RoomSummary) -> Self {
        RoomView {
            id: s.room.id,
            room_name: s.room.room_name.clone(),
            product_id: s.room.product_id,
            status: s.room.status.to_string(),
            host_user_id: s.room.host_user_id,
            base_price: s.room.base_price,
            current_price: s.current_price,
            duration: s.room.duration_seconds,
        }
    }
}

/// `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// `{"id": N}` (plus `"status"` for products).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedBody {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Every reply shape the server sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyReply {
    Products(Vec<ProductView>),
    Product(ProductView),
    Rooms(Vec<RoomView>),
    Created(CreatedBody),
    Updated,
    Deleted,
    Started,
    Cancelled,
    Error(&'static str),
}

pub const ERR_UNAUTHORIZED: &str = "unauthorized";
pub const ERR_NOT_FOUND: &str = "not found";
pub const ERR_INVALID_PRODUCT: &str = "invalid product";
pub const ERR_INVALID_STATUS: &str = "invalid status";
pub const ERR_PRODUCT_NOT_AVAILABLE: &str = "product not available";
pub const ERR_CREATE_FAILED: &str = "create failed";
pub const ERR_UPDATE_FAILED: &str = "update failed";
pub const ERR_DELETE_FAILED: &str = "delete failed";
pub const ERR_START_FAILED: &str = "start failed";
pub const ERR_CANCEL_FAILED: &str = "cancel failed";
pub const ERR_UNSUPPORTED: &str = "unsupported";
pub const ERR_INVALID_REQUEST: &str = "invalid request";
pub const ERR_RESPONSE_TOO_LARGE: &str = "response too large";
pub const ERR_INTERNAL: &str = "internal error";

impl NotifyReply {
    pub fn to_json(&self) -> String {
        let rendered = match self {
            NotifyReply::Products(list) => serde_json::to_string(list),
            NotifyReply::Product(p) => serde_json::to_string(p),
            NotifyReply::Rooms(list) => serde_json::to_string(list),
            NotifyReply::Created(c) => serde_json::to_string(c),
            NotifyReply::Updated => Ok(json!({ "updated": true }).to_string()),
            NotifyReply::Deleted => Ok(json!({ "deleted": true }).to_string()),
            NotifyReply::Started => Ok(json!({ "started": true }).to_string()),
            NotifyReply::Cancelled => Ok(json!({ "cancelled": true }).to_string()),
            NotifyReply::Error(msg) => Ok(json!({ "error": msg }).to_string()),
        };
        or_internal_error(rendered)
    }
}

fn or_internal_error(rendered: serde_json::Result<String>) -> String {
    rendered.unwrap_or_else(|_| json!({ "error": ERR_INTERNAL }).to_string())
}

/// Read a reply body: an `{"error":..}` object becomes `Err(message)`,
/// anything else is decoded as `T`.
pub fn parse_reply<T: DeserializeOwned>(body: &str) -> Result<Result<T, String>, serde_json::Error> {
    if let Ok(err) = serde_json::from_str::<ErrorBody>(body) {
        return Ok(Err(err.error));
    }
    serde_json::from_str(body).map(Ok)
}
