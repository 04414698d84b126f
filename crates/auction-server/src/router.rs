//! Opcode router.
//!
//! Decodes one request frame into a typed [`Request`], runs it against the
//! [`AuctionHouse`] and builds exactly one reply frame. Business failures
//! become well-formed responses; only a malformed frame or an opcode with
//! no handler comes back as `Err`, which closes the connection.

use auction_core::{AuctionError, AuctionHouse, RoomScope, RoomSummary};
use auction_protocol::binary_codec::{
    BidRes, BuyNowRes, JoinRoomRes, LoginRes, ProtocolError, RoomInfo,
};
use auction_protocol::{decode_request, PacketHeader, Request, Response, RoomQuery};
use tracing::{debug, error, warn};

use crate::notify;

/// A reply frame ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub header: PacketHeader,
    pub payload: Vec<u8>,
}

pub const MSG_OK: &str = "ok";
pub const MSG_REGISTERED: &str = "registered";
pub const MSG_REGISTRATION_FAILED: &str = "registration failed";
pub const MSG_LOGIN_FAILED: &str = "login failed";
pub const MSG_ACCEPTED: &str = "accepted";
pub const MSG_SOLD: &str = "sold";
pub const MSG_DB_ERROR: &str = "db error";

/// Route one frame.
pub fn route(house: &AuctionHouse, header: &PacketHeader, payload: &[u8]) -> Result<Reply, ProtocolError> {
    let request = decode_request(header, payload)?;
    debug!(opcode = request.opcode().name(), "request");

    let (response, session_id) = match request {
        Request::Register { username, password } => (register(house, &username, &password), 0),
        Request::Login { username, password } => login(house, &username, &password),
        Request::Rooms { session_id, query } => {
            (Response::Rooms(rooms(house, session_id, query)), header.session_id)
        }
        Request::Bid {
            session_id,
            room_id,
            amount,
        } => (Response::Bid(bid(house, session_id, room_id, amount)), header.session_id),
        Request::BuyNow {
            session_id,
            room_id,
            price,
        } => (Response::BuyNow(buy_now(house, session_id, room_id, price)), header.session_id),
        Request::Notify {
            session_id,
            room_id,
            command,
        } => (
            Response::Notify(notify::handle(house, session_id, room_id, command)),
            header.session_id,
        ),
    };

    let payload = response.encode_payload()?;
    let header = header
        .reply(response.opcode(), payload.len())
        .with_session(session_id);
    Ok(Reply { header, payload })
}

fn register(house: &AuctionHouse, username: &str, password: &str) -> Response {
    let res = match house.register(username, password) {
        Ok(user) => LoginRes {
            user_id: user.id,
            success: true,
            role: user.role.to_string(),
            message: MSG_REGISTERED.to_string(),
        },
        Err(AuctionError::UserExists) => login_failure(AuctionError::UserExists.to_string()),
        Err(_) => login_failure(MSG_REGISTRATION_FAILED.to_string()),
    };
    Response::Login(res)
}

/// Returns the response and the session id for the reply header.
fn login(house: &AuctionHouse, username: &str, password: &str) -> (Response, u32) {
    match house.login(username, password) {
        Ok(outcome) => (
            Response::Login(LoginRes {
                user_id: outcome.user.id,
                success: true,
                role: outcome.user.role.to_string(),
                message: MSG_OK.to_string(),
            }),
            outcome.session_id,
        ),
        Err(AuctionError::Unauthorized) => (
            Response::Login(login_failure(AuctionError::Unauthorized.to_string())),
            0,
        ),
        Err(e) => {
            error!(username, error = %e, "login failed");
            (Response::Login(login_failure(MSG_LOGIN_FAILED.to_string())), 0)
        }
    }
}

fn login_failure(message: String) -> LoginRes {
    LoginRes {
        message,
        ..Default::default()
    }
}

fn room_info(summary: &RoomSummary) -> RoomInfo {
    let room = &summary.room;
    RoomInfo {
        room_id: room.id,
        product_id: room.product_id,
        host_user_id: room.host_user_id,
        current_price: summary.current_price,
        base_price: room.base_price,
        duration_seconds: room.duration_seconds,
        room_name: room.room_name.clone(),
        status: room.status.to_string(),
    }
}

fn rooms(house: &AuctionHouse, session_id: u32, query: RoomQuery) -> JoinRoomRes {
    let listed = match query {
        RoomQuery::ListPublic => house.rooms(RoomScope::Public),
        RoomQuery::ListOwn => match house.authenticate(session_id) {
            Some(user) => house.rooms(RoomScope::HostedBy(user)),
            None => return JoinRoomRes::failure(),
        },
        RoomQuery::Detail { room_id } | RoomQuery::Join { room_id } => match house.room(room_id) {
            Ok(Some(summary)) => Ok(vec![summary]),
            Ok(None) => return JoinRoomRes::failure(),
            Err(e) => Err(e),
        },
        RoomQuery::Unsupported(action) => {
            debug!(action, "unsupported join-room action");
            return JoinRoomRes::failure();
        }
    };

    match listed {
        Ok(summaries) => JoinRoomRes {
            result: 0,
            rooms: summaries.iter().map(room_info).collect(),
        },
        Err(e) => {
            error!(error = %e, "room listing failed");
            JoinRoomRes::failure()
        }
    }
}

fn bid(house: &AuctionHouse, session_id: u32, room_id: u32, amount: u32) -> BidRes {
    match house.place_bid(session_id, room_id, amount) {
        Ok(bid) => BidRes {
            room_id,
            highest_bid: bid.amount,
            highest_bidder_id: bid.user_id,
            success: true,
            message: MSG_ACCEPTED.to_string(),
        },
        Err(AuctionError::BidTooLow { current }) => {
            debug!(room_id, amount, current, "bid too low");
            BidRes::rejected(room_id, &AuctionError::BidTooLow { current }.to_string())
        }
        Err(AuctionError::Store(e)) => {
            error!(room_id, error = %e, "bid storage failure");
            BidRes::rejected(room_id, MSG_DB_ERROR)
        }
        Err(e) => BidRes::rejected(room_id, &e.to_string()),
    }
}

fn buy_now(house: &AuctionHouse, session_id: u32, room_id: u32, price: u32) -> BuyNowRes {
    match house.buy_now(session_id, room_id, price) {
        Ok(room) => BuyNowRes {
            room_id,
            buyer_id: room.buyer_user_id.unwrap_or_default(),
            final_price: room.final_price.unwrap_or(price),
            success: true,
            message: MSG_SOLD.to_string(),
        },
        Err(AuctionError::Store(e)) => {
            error!(room_id, error = %e, "buy-now storage failure");
            BuyNowRes::rejected(room_id, MSG_DB_ERROR)
        }
        Err(e) => {
            if matches!(e, AuctionError::AlreadySold) {
                warn!(room_id, "buy-now on a sold room");
            }
            BuyNowRes::rejected(room_id, &e.to_string())
        }
    }
}
