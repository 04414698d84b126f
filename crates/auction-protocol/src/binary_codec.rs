//! Fixed-layout payload structures.
//!
//! Every payload is a packed structure with no padding. Integers are
//! little-endian; string fields are zero-padded and NUL-terminated.
//!
//! ```text
//! LoginReq (68)       username[32] password[32] registerFlag:u8 reserved[3]
//! LoginRes (85)       userId:u32 success:u8 role[16] message[64]
//! JoinRoomReq (12)    roomId:u32 sessionId:u32 action:u8 reserved[3]
//! RoomInfo (104)      roomId productId hostUserId currentPrice basePrice
//!                     durationSeconds (u32 each) roomName[64] status[16]
//! JoinRoomRes (1668)  result:u8 roomCount:u8 reserved:u16 rooms[16]
//! BidReq (12)         sessionId roomId amount
//! BidRes (77)         roomId highestBid highestBidderId success:u8 message[64]
//! BuyNowReq (12)      sessionId roomId price
//! BuyNowRes (77)      roomId buyerId finalPrice success:u8 message[64]
//! NotifyMessage       roomId:u32 code:u32 message[16384]
//! TimerTick (8)       roomId secondsRemaining
//! ItemStart (12)      roomId productId startPrice
//! ItemEnd (16)        roomId productId winningPrice winnerUserId
//! ```
//!
//! Decoding requires at least the structure's size and ignores anything
//! after it. String fields written from client input are checked against
//! their capacity; text the server echoes back (room names, statuses) is
//! truncated to fit.

use bytes::{Buf, BufMut};
use thiserror::Error;

use crate::wire_types::*;

/// Errors that can arise when encoding/decoding a payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("{structure} payload truncated: need {expected} bytes, got {actual}")]
    Truncated {
        structure: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("field {field} is {len} bytes, capacity is {capacity} including terminator")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        capacity: usize,
    },

    #[error("unknown opcode: {0:#06x}")]
    UnknownOpcode(u16),

    #[error("unexpected opcode: wanted {expected:#06x}, got {actual:#06x}")]
    UnexpectedOpcode { expected: u16, actual: u16 },

    #[error("opcode {0:#06x} is not a request")]
    NotARequest(u16),

    #[error("opcode {0:#06x} is not a response")]
    NotAResponse(u16),
}

/// A packed payload structure with a fixed wire size.
pub trait WireStruct: Sized {
    const NAME: &'static str;
    const LEN: usize;

    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), ProtocolError>;

    /// Decode from the first `LEN` bytes of `buf`.
    fn decode_fields(buf: &mut &[u8]) -> Self;

    fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < Self::LEN {
            return Err(ProtocolError::Truncated {
                structure: Self::NAME,
                expected: Self::LEN,
                actual: buf.len(),
            });
        }
        let mut fields = &buf[..Self::LEN];
        Ok(Self::decode_fields(&mut fields))
    }

    fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut out = Vec::with_capacity(Self::LEN);
        self.encode(&mut out)?;
        Ok(out)
    }
}

fn take_str(buf: &mut &[u8], capacity: usize) -> String {
    let value = get_fixed_str(&buf[..capacity]);
    buf.advance(capacity);
    value
}

fn flag(b: bool) -> u8 {
    u8::from(b)
}

// ============================================================================
// LOGIN
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginReq {
    pub username: String,
    pub password: String,
    pub register: bool,
}

impl WireStruct for LoginReq {
    const NAME: &'static str = "LoginReq";
    const LEN: usize = LOGIN_REQ_LEN;

    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), ProtocolError> {
        // Validate both before writing anything.
        for (value, cap, field) in [
            (&self.username, USERNAME_CAP, "username"),
            (&self.password, PASSWORD_CAP, "password"),
        ] {
            if value.len() >= cap {
                return Err(ProtocolError::FieldTooLong {
                    field,
                    len: value.len(),
                    capacity: cap,
                });
            }
        }
        put_fixed_str(out, &self.username, USERNAME_CAP, "username")?;
        put_fixed_str(out, &self.password, PASSWORD_CAP, "password")?;
        out.put_u8(flag(self.register));
        out.put_bytes(0, 3);
        Ok(())
    }

    fn decode_fields(buf: &mut &[u8]) -> Self {
        let username = take_str(buf, USERNAME_CAP);
        let password = take_str(buf, PASSWORD_CAP);
        let register = buf.get_u8() != 0;
        LoginReq {
            username,
            password,
            register,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginRes {
    pub user_id: u32,
    pub success: bool,
    pub role: String,
    pub message: String,
}

impl WireStruct for LoginRes {
    const NAME: &'static str = "LoginRes";
    const LEN: usize = LOGIN_RES_LEN;

    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), ProtocolError> {
        out.put_u32_le(self.user_id);
        out.put_u8(flag(self.success));
        put_fixed_str_truncated(out, &self.role, ROLE_CAP);
        put_fixed_str_truncated(out, &self.message, MESSAGE_CAP);
        Ok(())
    }

    fn decode_fields(buf: &mut &[u8]) -> Self {
        LoginRes {
            user_id: buf.get_u32_le(),
            success: buf.get_u8() != 0,
            role: take_str(buf, ROLE_CAP),
            message: take_str(buf, MESSAGE_CAP),
        }
    }
}

// ============================================================================
// JOIN ROOM
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinRoomReq {
    pub room_id: u32,
    pub session_id: u32,
    pub action: u8,
}

impl WireStruct for JoinRoomReq {
    const NAME: &'static str = "JoinRoomReq";
    const LEN: usize = JOIN_ROOM_REQ_LEN;

    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), ProtocolError> {
        out.put_u32_le(self.room_id);
        out.put_u32_le(self.session_id);
        out.put_u8(self.action);
        out.put_bytes(0, 3);
        Ok(())
    }

    fn decode_fields(buf: &mut &[u8]) -> Self {
        JoinRoomReq {
            room_id: buf.get_u32_le(),
            session_id: buf.get_u32_le(),
            action: buf.get_u8(),
        }
    }
}

/// One room summary inside a [`JoinRoomRes`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_id: u32,
    pub product_id: u32,
    pub host_user_id: u32,
    pub current_price: u32,
    pub base_price: u32,
    pub duration_seconds: u32,
    pub room_name: String,
    pub status: String,
}

impl WireStruct for RoomInfo {
    const NAME: &'static str = "RoomInfo";
    const LEN: usize = ROOM_INFO_LEN;

    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), ProtocolError> {
        out.put_u32_le(self.room_id);
        out.put_u32_le(self.product_id);
        out.put_u32_le(self.host_user_id);
        out.put_u32_le(self.current_price);
        out.put_u32_le(self.base_price);
        out.put_u32_le(self.duration_seconds);
        put_fixed_str_truncated(out, &self.room_name, ROOM_NAME_CAP);
        put_fixed_str_truncated(out, &self.status, STATUS_CAP);
        Ok(())
    }

    fn decode_fields(buf: &mut &[u8]) -> Self {
        RoomInfo {
            room_id: buf.get_u32_le(),
            product_id: buf.get_u32_le(),
            host_user_id: buf.get_u32_le(),
            current_price: buf.get_u32_le(),
            base_price: buf.get_u32_le(),
            duration_seconds: buf.get_u32_le(),
            room_name: take_str(buf, ROOM_NAME_CAP),
            status: take_str(buf, STATUS_CAP),
        }
    }
}

/// `result` is 0 on success. At most [`MAX_ROOMS`] entries go on the wire;
/// extra entries are dropped at encode time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinRoomRes {
    pub result: u8,
    pub rooms: Vec<RoomInfo>,
}

impl JoinRoomRes {
    pub fn failure() -> Self {
        JoinRoomRes {
            result: 1,
            rooms: Vec::new(),
        }
    }
}

impl WireStruct for JoinRoomRes {
    const NAME: &'static str = "JoinRoomRes";
    const LEN: usize = JOIN_ROOM_RES_LEN;

    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), ProtocolError> {
        let count = self.rooms.len().min(MAX_ROOMS);
        out.put_u8(self.result);
        out.put_u8(count as u8);
        out.put_u16_le(0);
        for room in &self.rooms[..count] {
            room.encode(out)?;
        }
        out.put_bytes(0, (MAX_ROOMS - count) * ROOM_INFO_LEN);
        Ok(())
    }

    fn decode_fields(buf: &mut &[u8]) -> Self {
        let result = buf.get_u8();
        let count = (buf.get_u8() as usize).min(MAX_ROOMS);
        buf.advance(2);
        let rooms = (0..count).map(|_| RoomInfo::decode_fields(buf)).collect();
        JoinRoomRes { result, rooms }
    }
}

// ============================================================================
// BID / BUY NOW
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BidReq {
    pub session_id: u32,
    pub room_id: u32,
    pub amount: u32,
}

impl WireStruct for BidReq {
    const NAME: &'static str = "BidReq";
    const LEN: usize = BID_REQ_LEN;

    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), ProtocolError> {
        out.put_u32_le(self.session_id);
        out.put_u32_le(self.room_id);
        out.put_u32_le(self.amount);
        Ok(())
    }

    fn decode_fields(buf: &mut &[u8]) -> Self {
        BidReq {
            session_id: buf.get_u32_le(),
            room_id: buf.get_u32_le(),
            amount: buf.get_u32_le(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BidRes {
    pub room_id: u32,
    pub highest_bid: u32,
    pub highest_bidder_id: u32,
    pub success: bool,
    pub message: String,
}

impl BidRes {
    /// A rejection: only the room and the message are filled in.
    pub fn rejected(room_id: u32, message: &str) -> Self {
        BidRes {
            room_id,
            message: message.to_string(),
            ..Default::default()
        }
    }
}

impl WireStruct for BidRes {
    const NAME: &'static str = "BidRes";
    const LEN: usize = BID_RES_LEN;

    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), ProtocolError> {
        out.put_u32_le(self.room_id);
        out.put_u32_le(self.highest_bid);
        out.put_u32_le(self.highest_bidder_id);
        out.put_u8(flag(self.success));
        put_fixed_str_truncated(out, &self.message, MESSAGE_CAP);
        Ok(())
    }

    fn decode_fields(buf: &mut &[u8]) -> Self {
        BidRes {
            room_id: buf.get_u32_le(),
            highest_bid: buf.get_u32_le(),
            highest_bidder_id: buf.get_u32_le(),
            success: buf.get_u8() != 0,
            message: take_str(buf, MESSAGE_CAP),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuyNowReq {
    pub session_id: u32,
    pub room_id: u32,
    pub price: u32,
}

impl WireStruct for BuyNowReq {
    const NAME: &'static str = "BuyNowReq";
    const LEN: usize = BUY_NOW_REQ_LEN;

    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), ProtocolError> {
        out.put_u32_le(self.session_id);
        out.put_u32_le(self.room_id);
        out.put_u32_le(self.price);
        Ok(())
    }

    fn decode_fields(buf: &mut &[u8]) -> Self {
        BuyNowReq {
            session_id: buf.get_u32_le(),
            room_id: buf.get_u32_le(),
            price: buf.get_u32_le(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuyNowRes {
    pub room_id: u32,
    pub buyer_id: u32,
    pub final_price: u32,
    pub success: bool,
    pub message: String,
}

impl BuyNowRes {
    pub fn rejected(room_id: u32, message: &str) -> Self {
        BuyNowRes {
            room_id,
            message: message.to_string(),
            ..Default::default()
        }
    }
}

impl WireStruct for BuyNowRes {
    const NAME: &'static str = "BuyNowRes";
    const LEN: usize = BUY_NOW_RES_LEN;

    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), ProtocolError> {
        out.put_u32_le(self.room_id);
        out.put_u32_le(self.buyer_id);
        out.put_u32_le(self.final_price);
        out.put_u8(flag(self.success));
        put_fixed_str_truncated(out, &self.message, MESSAGE_CAP);
        Ok(())
    }

    fn decode_fields(buf: &mut &[u8]) -> Self {
        BuyNowRes {
            room_id: buf.get_u32_le(),
            buyer_id: buf.get_u32_le(),
            final_price: buf.get_u32_le(),
            success: buf.get_u8() != 0,
            message: take_str(buf, MESSAGE_CAP),
        }
    }
}

// ============================================================================
// NOTIFY
// ============================================================================

/// Generic envelope: `code` picks the sub-operation, `body` carries JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyMessage {
    pub room_id: u32,
    pub code: u32,
    pub body: String,
}

impl WireStruct for NotifyMessage {
    const NAME: &'static str = "NotifyMessage";
    const LEN: usize = NOTIFY_MESSAGE_LEN;

    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), ProtocolError> {
        if self.body.len() >= NOTIFY_BODY_CAP {
            return Err(ProtocolError::FieldTooLong {
                field: "message",
                len: self.body.len(),
                capacity: NOTIFY_BODY_CAP,
            });
        }
        out.put_u32_le(self.room_id);
        out.put_u32_le(self.code);
        put_fixed_str(out, &self.body, NOTIFY_BODY_CAP, "message")
    }

    fn decode_fields(buf: &mut &[u8]) -> Self {
        NotifyMessage {
            room_id: buf.get_u32_le(),
            code: buf.get_u32_le(),
            body: take_str(buf, NOTIFY_BODY_CAP),
        }
    }
}

// ============================================================================
// SERVER PUSH (reserved)
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerTick {
    pub room_id: u32,
    pub seconds_remaining: u32,
}

impl WireStruct for TimerTick {
    const NAME: &'static str = "TimerTick";
    const LEN: usize = TIMER_TICK_LEN;

    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), ProtocolError> {
        out.put_u32_le(self.room_id);
        out.put_u32_le(self.seconds_remaining);
        Ok(())
    }

    fn decode_fields(buf: &mut &[u8]) -> Self {
        TimerTick {
            room_id: buf.get_u32_le(),
            seconds_remaining: buf.get_u32_le(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemStart {
    pub room_id: u32,
    pub product_id: u32,
    pub start_price: u32,
}

impl WireStruct for ItemStart {
    const NAME: &'static str = "ItemStart";
    const LEN: usize = ITEM_START_LEN;

    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), ProtocolError> {
        out.put_u32_le(self.room_id);
        out.put_u32_le(self.product_id);
        out.put_u32_le(self.start_price);
        Ok(())
    }

    fn decode_fields(buf: &mut &[u8]) -> Self {
        ItemStart {
            room_id: buf.get_u32_le(),
            product_id: buf.get_u32_le(),
            start_price: buf.get_u32_le(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemEnd {
    pub room_id: u32,
    pub product_id: u32,
    pub winning_price: u32,
    pub winner_user_id: u32,
}

impl WireStruct for ItemEnd {
    const NAME: &'static str = "ItemEnd";
    const LEN: usize = ITEM_END_LEN;

    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), ProtocolError> {
        out.put_u32_le(self.room_id);
        out.put_u32_le(self.product_id);
        out.put_u32_le(self.winning_price);
        out.put_u32_le(self.winner_user_id);
        Ok(())
    }

    fn decode_fields(buf: &mut &[u8]) -> Self {
        ItemEnd {
            room_id: buf.get_u32_le(),
            product_id: buf.get_u32_le(),
            winning_price: buf.get_u32_le(),
            winner_user_id: buf.get_u32_le(),
        }
    }
}
