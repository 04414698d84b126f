//! NOTIFY_MESSAGE sub-operations: product and room CRUD carried as JSON.

use auction_core::{AuctionError, AuctionHouse, RoomScope, SessionId};
use auction_protocol::binary_codec::NotifyMessage;
use auction_protocol::notify::{
    CreatedBody, NotifyCommand, NotifyReply, ProductView, RoomView, ERR_CANCEL_FAILED,
    ERR_CREATE_FAILED, ERR_DELETE_FAILED, ERR_INVALID_PRODUCT, ERR_INVALID_REQUEST,
    ERR_INVALID_STATUS, ERR_NOT_FOUND, ERR_PRODUCT_NOT_AVAILABLE, ERR_RESPONSE_TOO_LARGE,
    ERR_START_FAILED, ERR_UNAUTHORIZED, ERR_UNSUPPORTED, ERR_UPDATE_FAILED,
};
use auction_protocol::wire_types::NOTIFY_BODY_CAP;
use tracing::{debug, error, warn};

/// Run one command and wrap the JSON reply in an envelope echoing the
/// request's room id and code.
pub fn handle(house: &AuctionHouse, session_id: SessionId, room_id: u32, command: NotifyCommand) -> NotifyMessage {
    let code = command.code();
    let reply = if command.requires_session() && house.authenticate(session_id).is_none() {
        NotifyReply::Error(ERR_UNAUTHORIZED)
    } else {
        dispatch(house, session_id, command)
    };

    let mut body = reply.to_json();
    if body.len() >= NOTIFY_BODY_CAP {
        warn!(code, len = body.len(), "notify reply does not fit");
        body = NotifyReply::Error(ERR_RESPONSE_TOO_LARGE).to_json();
    }
    NotifyMessage { room_id, code, body }
}

fn dispatch(house: &AuctionHouse, session: SessionId, command: NotifyCommand) -> NotifyReply {
    match command {
        NotifyCommand::ListProducts => {
            products_reply(house.products()).unwrap_or_else(|e| failed("product list", e, ERR_NOT_FOUND))
        }
        NotifyCommand::ListOwnProducts => products_reply(house.own_products(session))
            .unwrap_or_else(|e| failed("own product list", e, ERR_NOT_FOUND)),
        NotifyCommand::GetProduct(r) => match house.product(r.id) {
            Ok(p) => NotifyReply::Product(ProductView::from(&p)),
            Err(AuctionError::NotFound) => NotifyReply::Error(ERR_NOT_FOUND),
            Err(e) => failed("product get", e, ERR_NOT_FOUND),
        },
        NotifyCommand::CreateProduct(draft) => match house.create_product(session, draft.into_new_product()) {
            Ok(p) => NotifyReply::Created(CreatedBody {
                id: p.id,
                status: Some(p.status.to_string()),
            }),
            Err(AuctionError::InvalidProduct) => NotifyReply::Error(ERR_INVALID_PRODUCT),
            Err(e) => failed("product create", e, ERR_INVALID_PRODUCT),
        },
        NotifyCommand::UpdateProduct(update) => {
            let patch = match update.to_patch() {
                Ok(patch) => patch,
                Err(e) => {
                    debug!(error = %e, "product update with unknown status");
                    return NotifyReply::Error(ERR_INVALID_STATUS);
                }
            };
            match house.update_product(session, update.id, patch) {
                Ok(_) => NotifyReply::Updated,
                Err(AuctionError::NotFound) => NotifyReply::Error(ERR_NOT_FOUND),
                Err(e) => failed("product update", e, ERR_UPDATE_FAILED),
            }
        }
        NotifyCommand::DeleteProduct(r) => match house.delete_product(session, r.id) {
            Ok(()) => NotifyReply::Deleted,
            Err(AuctionError::NotFound) => NotifyReply::Error(ERR_NOT_FOUND),
            Err(e) => failed("product delete", e, ERR_DELETE_FAILED),
        },
        NotifyCommand::ListPublicRooms => {
            rooms_reply(house.rooms(RoomScope::Public)).unwrap_or_else(|e| failed("room list", e, ERR_NOT_FOUND))
        }
        NotifyCommand::ListOwnRooms => match house.authenticate(session) {
            Some(host) => rooms_reply(house.rooms(RoomScope::HostedBy(host)))
                .unwrap_or_else(|e| failed("own room list", e, ERR_NOT_FOUND)),
            None => NotifyReply::Error(ERR_UNAUTHORIZED),
        },
        NotifyCommand::CreateRoom(draft) => match house.create_room(session, draft.into_new_room()) {
            Ok(room) => NotifyReply::Created(CreatedBody {
                id: room.id,
                status: None,
            }),
            Err(AuctionError::ProductNotAvailable) => NotifyReply::Error(ERR_PRODUCT_NOT_AVAILABLE),
            Err(AuctionError::InvalidRoom) => NotifyReply::Error(ERR_CREATE_FAILED),
            Err(e) => failed("room create", e, ERR_CREATE_FAILED),
        },
        NotifyCommand::DeleteRoom(r) => match house.delete_room(session, r.room_id) {
            Ok(_) => NotifyReply::Deleted,
            Err(e) => failed("room delete", e, ERR_DELETE_FAILED),
        },
        NotifyCommand::StartRoom(r) => match house.start_room(session, r.room_id) {
            Ok(_) => NotifyReply::Started,
            Err(e) => failed("room start", e, ERR_START_FAILED),
        },
        NotifyCommand::CancelRoom(r) => match house.cancel_room(session, r.room_id) {
            Ok(_) => NotifyReply::Cancelled,
            Err(e) => failed("room cancel", e, ERR_CANCEL_FAILED),
        },
        NotifyCommand::Invalid(code) => {
            debug!(?code, "notify body is not valid json");
            NotifyReply::Error(ERR_INVALID_REQUEST)
        }
        NotifyCommand::Unsupported(code) => {
            debug!(code, "unsupported notify code");
            NotifyReply::Error(ERR_UNSUPPORTED)
        }
    }
}

fn products_reply(result: Result<Vec<auction_core::Product>, AuctionError>) -> Result<NotifyReply, AuctionError> {
    Ok(NotifyReply::Products(result?.iter().map(ProductView::from).collect()))
}

fn rooms_reply(result: Result<Vec<auction_core::RoomSummary>, AuctionError>) -> Result<NotifyReply, AuctionError> {
    Ok(NotifyReply::Rooms(result?.iter().map(RoomView::from).collect()))
}

/// Storage failures get logged; everything maps to `fallback`.
fn failed(op: &'static str, e: AuctionError, fallback: &'static str) -> NotifyReply {
    match e {
        AuctionError::Unauthorized => NotifyReply::Error(ERR_UNAUTHORIZED),
        AuctionError::Store(inner) => {
            error!(op, error = %inner, "storage failure");
            NotifyReply::Error(fallback)
        }
        other => {
            debug!(op, error = %other, "rejected");
            NotifyReply::Error(fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use auction_core::{AuctionRules, MemoryStore, ProductStatus, RoomStatus, SessionStore};
    use auction_protocol::notify::{ProductDraft, ProductRef, ProductUpdate, RoomDraft, RoomRef};

    use super::*;

    fn setup() -> (AuctionHouse, SessionId) {
        let house = AuctionHouse::new(
            Arc::new(MemoryStore::new()),
            SessionStore::default(),
            AuctionRules::default(),
        );
        house.register("seller", "pw").unwrap();
        let session = house.login("seller", "pw").unwrap().session_id;
        (house, session)
    }

    fn run(house: &AuctionHouse, session: SessionId, command: NotifyCommand) -> serde_json::Value {
        let msg = handle(house, session, 7, command);
        assert_eq!(msg.room_id, 7);
        serde_json::from_str(&msg.body).unwrap()
    }

    fn vase() -> NotifyCommand {
        NotifyCommand::CreateProduct(ProductDraft {
            name: "Vase".into(),
            start_price: 100,
            ..Default::default()
        })
    }

    #[test]
    fn product_crud_scoped_to_owner() {
        let (house, s) = setup();
        let created = run(&house, s, vase());
        assert_eq!(created["status"], "available");
        let id = created["id"].as_u64().unwrap() as u32;

        let got = run(&house, 0, NotifyCommand::GetProduct(ProductRef { id }));
        assert_eq!(got["name"], "Vase");
        assert_eq!(got["startPrice"], 100);
        assert_eq!(got["description"], "");

        house.register("other", "pw").unwrap();
        let other = house.login("other", "pw").unwrap().session_id;
        let update = NotifyCommand::UpdateProduct(ProductUpdate {
            id,
            name: Some("Urn".into()),
            ..Default::default()
        });
        assert_eq!(run(&house, other, update.clone())["error"], "not found");
        assert_eq!(run(&house, s, update)["updated"], true);
        assert_eq!(house.product(id).unwrap().name, "Urn");

        let bad_status = NotifyCommand::UpdateProduct(ProductUpdate {
            id,
            status: Some("archived".into()),
            ..Default::default()
        });
        assert_eq!(run(&house, s, bad_status)["error"], "invalid status");

        assert_eq!(
            run(&house, other, NotifyCommand::DeleteProduct(ProductRef { id }))["error"],
            "not found"
        );
        assert_eq!(run(&house, s, NotifyCommand::DeleteProduct(ProductRef { id }))["deleted"], true);
        assert_eq!(
            run(&house, 0, NotifyCommand::GetProduct(ProductRef { id }))["error"],
            "not found"
        );
    }

    #[test]
    fn invalid_product_and_missing_session() {
        let (house, s) = setup();
        let free = NotifyCommand::CreateProduct(ProductDraft {
            name: "Free".into(),
            start_price: 0,
            ..Default::default()
        });
        assert_eq!(run(&house, s, free)["error"], "invalid product");
        assert_eq!(run(&house, 0, vase())["error"], "unauthorized");
        assert_eq!(run(&house, 0, NotifyCommand::ListOwnRooms)["error"], "unauthorized");
        assert!(run(&house, 0, NotifyCommand::ListProducts).as_array().unwrap().is_empty());
    }

    #[test]
    fn room_lifecycle_over_notify() {
        let (house, s) = setup();
        let product_id = run(&house, s, vase())["id"].as_u64().unwrap() as u32;

        let create = |name: &str| {
            NotifyCommand::CreateRoom(RoomDraft {
                room_name: name.into(),
                product_id,
                duration: 60,
                base_price: 100,
            })
        };
        assert_eq!(run(&house, s, create(""))["error"], "create failed");
        let room_id = run(&house, s, create("Vase Auction"))["id"].as_u64().unwrap() as u32;
        assert_eq!(house.product(product_id).unwrap().status, ProductStatus::Pending);
        assert_eq!(run(&house, s, create("Again"))["error"], "product not available");

        let listed = run(&house, 0, NotifyCommand::ListPublicRooms);
        assert_eq!(listed[0]["roomName"], "Vase Auction");
        assert_eq!(listed[0]["currentPrice"], 100);
        assert_eq!(listed[0]["status"], "waiting");

        let start = NotifyCommand::StartRoom(RoomRef { room_id });
        assert_eq!(run(&house, s, start.clone())["started"], true);
        assert_eq!(run(&house, s, start)["error"], "start failed");
        assert_eq!(house.room(room_id).unwrap().unwrap().room.status, RoomStatus::Running);

        let cancel = NotifyCommand::CancelRoom(RoomRef { room_id });
        assert_eq!(run(&house, s, cancel.clone())["cancelled"], true);
        assert_eq!(run(&house, s, cancel)["error"], "cancel failed");

        assert_eq!(
            run(&house, s, NotifyCommand::DeleteRoom(RoomRef { room_id: 999 }))["error"],
            "delete failed"
        );
        assert_eq!(run(&house, s, NotifyCommand::DeleteRoom(RoomRef { room_id }))["deleted"], true);
    }

    #[test]
    fn unsupported_and_invalid_bodies() {
        let (house, s) = setup();
        let msg = handle(&house, s, 0, NotifyCommand::parse(77, "{}"));
        assert_eq!(msg.code, 77);
        assert_eq!(msg.body, r#"{"error":"unsupported"}"#);

        let msg = handle(&house, s, 0, NotifyCommand::parse(22, "not json"));
        assert_eq!(msg.code, 22);
        assert_eq!(msg.body, r#"{"error":"invalid request"}"#);
    }

    #[test]
    fn oversized_listing_is_replaced() {
        let (house, s) = setup();
        for i in 0..200 {
            house
                .create_product(
                    s,
                    auction_core::NewProduct {
                        name: format!("product-{i}"),
                        description: Some("d".repeat(100)),
                        start_price: 10,
                        ..Default::default()
                    },
                )
                .unwrap();
        }
        let msg = handle(&house, 0, 0, NotifyCommand::ListProducts);
        assert_eq!(msg.body, r#"{"error":"response too large"}"#);
    }
}
