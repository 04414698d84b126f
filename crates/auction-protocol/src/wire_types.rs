//! Low-level wire types and constants.
//!
//! This module defines:
//! - Opcodes carried in the packet header.
//! - Notify codes selecting a NOTIFY_MESSAGE sub-operation.
//! - Field capacities and structure sizes.
//! - Bounded encode/decode helpers for fixed-capacity string fields.
//!
//! The per-structure encode/decode logic lives in `binary_codec`.

use bytes::BufMut;

use crate::binary_codec::ProtocolError;

/// Operation codes (header `opcode` field).
#[repr(u16)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Opcode {
    LoginReq = 0x01,
    LoginRes = 0x02,
    JoinRoomReq = 0x03,
    JoinRoomRes = 0x04,
    BidReq = 0x05,
    BidRes = 0x06,
    /// Same code in both directions.
    NotifyMessage = 0x07,
    /// Reserved for server push; no handler.
    TimerTick = 0x08,
    /// Reserved for server push; no handler.
    ItemStart = 0x09,
    /// Reserved for server push; no handler.
    ItemEnd = 0x0A,
    BuyNowReq = 0x0B,
    BuyNowRes = 0x0C,
}

impl Opcode {
    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            0x01 => Some(Opcode::LoginReq),
            0x02 => Some(Opcode::LoginRes),
            0x03 => Some(Opcode::JoinRoomReq),
            0x04 => Some(Opcode::JoinRoomRes),
            0x05 => Some(Opcode::BidReq),
            0x06 => Some(Opcode::BidRes),
            0x07 => Some(Opcode::NotifyMessage),
            0x08 => Some(Opcode::TimerTick),
            0x09 => Some(Opcode::ItemStart),
            0x0A => Some(Opcode::ItemEnd),
            0x0B => Some(Opcode::BuyNowReq),
            0x0C => Some(Opcode::BuyNowRes),
            _ => None,
        }
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            Opcode::LoginReq => "LOGIN_REQ",
            Opcode::LoginRes => "LOGIN_RES",
            Opcode::JoinRoomReq => "JOIN_ROOM_REQ",
            Opcode::JoinRoomRes => "JOIN_ROOM_RES",
            Opcode::BidReq => "BID_REQ",
            Opcode::BidRes => "BID_RES",
            Opcode::NotifyMessage => "NOTIFY_MESSAGE",
            Opcode::TimerTick => "TIMER_TICK",
            Opcode::ItemStart => "ITEM_START",
            Opcode::ItemEnd => "ITEM_END",
            Opcode::BuyNowReq => "BUY_NOW_REQ",
            Opcode::BuyNowRes => "BUY_NOW_RES",
        }
    }
}

/// Human-readable name for any raw opcode, for logging.
pub fn opcode_name(raw: u16) -> &'static str {
    Opcode::from_u16(raw).map_or("UNKNOWN", Opcode::name)
}

/// Sub-operation selector inside a NOTIFY_MESSAGE (`code` field).
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NotifyCode {
    None = 0,
    ProductList = 1,
    ProductGet = 2,
    ProductCreate = 3,
    ProductUpdate = 4,
    ProductDelete = 5,
    ProductListOwn = 6,
    RoomListPublic = 20,
    RoomListOwn = 21,
    RoomCreate = 22,
    RoomDelete = 23,
    RoomStart = 24,
    RoomCancel = 25,
}

impl NotifyCode {
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(NotifyCode::None),
            1 => Some(NotifyCode::ProductList),
            2 => Some(NotifyCode::ProductGet),
            3 => Some(NotifyCode::ProductCreate),
            4 => Some(NotifyCode::ProductUpdate),
            5 => Some(NotifyCode::ProductDelete),
            6 => Some(NotifyCode::ProductListOwn),
            20 => Some(NotifyCode::RoomListPublic),
            21 => Some(NotifyCode::RoomListOwn),
            22 => Some(NotifyCode::RoomCreate),
            23 => Some(NotifyCode::RoomDelete),
            24 => Some(NotifyCode::RoomStart),
            25 => Some(NotifyCode::RoomCancel),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Size of the packet header on the wire.
pub const HEADER_LEN: usize = 14;

// Field capacities, in bytes, terminator included.
pub const USERNAME_CAP: usize = 32;
pub const PASSWORD_CAP: usize = 32;
pub const ROLE_CAP: usize = 16;
pub const MESSAGE_CAP: usize = 64;
pub const ROOM_NAME_CAP: usize = 64;
pub const STATUS_CAP: usize = 16;
pub const NOTIFY_BODY_CAP: usize = 16384;

/// Room summaries carried by one JOIN_ROOM_RES.
pub const MAX_ROOMS: usize = 16;

// Structure sizes (packed).
pub const LOGIN_REQ_LEN: usize = USERNAME_CAP + PASSWORD_CAP + 1 + 3;
pub const LOGIN_RES_LEN: usize = 4 + 1 + ROLE_CAP + MESSAGE_CAP;
pub const JOIN_ROOM_REQ_LEN: usize = 4 + 4 + 1 + 3;
pub const ROOM_INFO_LEN: usize = 6 * 4 + ROOM_NAME_CAP + STATUS_CAP;
pub const JOIN_ROOM_RES_LEN: usize = 1 + 1 + 2 + MAX_ROOMS * ROOM_INFO_LEN;
pub const BID_REQ_LEN: usize = 12;
pub const BID_RES_LEN: usize = 4 + 4 + 4 + 1 + MESSAGE_CAP;
pub const BUY_NOW_REQ_LEN: usize = 12;
pub const BUY_NOW_RES_LEN: usize = 4 + 4 + 4 + 1 + MESSAGE_CAP;
pub const NOTIFY_MESSAGE_LEN: usize = 4 + 4 + NOTIFY_BODY_CAP;
pub const TIMER_TICK_LEN: usize = 8;
pub const ITEM_START_LEN: usize = 12;
pub const ITEM_END_LEN: usize = 16;

/// Largest payload any peer should ever send.
pub const MAX_PAYLOAD_LEN: usize = NOTIFY_MESSAGE_LEN;

// -----------------------------------------------------------------------------
// Fixed-capacity string fields
// -----------------------------------------------------------------------------

/// Write `value` into a zero-padded field of `capacity` bytes.
///
/// The value plus its terminator must fit; anything longer is rejected.
pub fn put_fixed_str<B: BufMut>(
    out: &mut B,
    value: &str,
    capacity: usize,
    field: &'static str,
) -> Result<(), ProtocolError> {
    let bytes = value.as_bytes();
    if bytes.len() >= capacity {
        return Err(ProtocolError::FieldTooLong {
            field,
            len: bytes.len(),
            capacity,
        });
    }
    out.put_slice(bytes);
    out.put_bytes(0, capacity - bytes.len());
    Ok(())
}

/// Like [`put_fixed_str`], but cuts an over-long value at the last UTF-8
/// boundary that fits.
pub fn put_fixed_str_truncated<B: BufMut>(out: &mut B, value: &str, capacity: usize) {
    let fitted = truncate_to_fit(value, capacity);
    out.put_slice(fitted.as_bytes());
    out.put_bytes(0, capacity - fitted.len());
}

/// Longest prefix of `value` that leaves room for a terminator.
pub fn truncate_to_fit(value: &str, capacity: usize) -> &str {
    let max = capacity.saturating_sub(1);
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// Read a fixed-capacity field: bytes up to the first NUL, or the whole
/// field when no NUL is present. Invalid UTF-8 is replaced, not rejected.
pub fn get_fixed_str(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_sizes_match_packed_layouts() {
        assert_eq!(LOGIN_REQ_LEN, 68);
        assert_eq!(LOGIN_RES_LEN, 85);
        assert_eq!(JOIN_ROOM_REQ_LEN, 12);
        assert_eq!(ROOM_INFO_LEN, 104);
        assert_eq!(JOIN_ROOM_RES_LEN, 1668);
        assert_eq!(BID_RES_LEN, 77);
        assert_eq!(BUY_NOW_RES_LEN, 77);
        assert_eq!(NOTIFY_MESSAGE_LEN, 16392);
    }

    #[test]
    fn opcodes_and_codes_map_both_ways() {
        for raw in 0x01..=0x0C {
            assert_eq!(Opcode::from_u16(raw).map(Opcode::as_u16), Some(raw));
        }
        assert_eq!(Opcode::from_u16(0x0D), None);
        assert_eq!(opcode_name(0x05), "BID_REQ");
        assert_eq!(opcode_name(0xFFFF), "UNKNOWN");
        assert_eq!(NotifyCode::from_u32(22), Some(NotifyCode::RoomCreate));
        assert_eq!(NotifyCode::from_u32(7), None);
    }

    #[test]
    fn fixed_str_pads_and_rejects_overflow() {
        let mut out = Vec::new();
        put_fixed_str(&mut out, "alice", 8, "username").unwrap();
        assert_eq!(out, b"alice\0\0\0");

        let mut out = Vec::new();
        let err = put_fixed_str(&mut out, "12345678", 8, "username").unwrap_err();
        assert!(matches!(err, ProtocolError::FieldTooLong { capacity: 8, len: 8, .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn fixed_str_decode_stops_at_null_or_capacity() {
        assert_eq!(get_fixed_str(b"ok\0garbage"), "ok");
        assert_eq!(get_fixed_str(b"full"), "full");
        assert_eq!(get_fixed_str(b"\0\0\0"), "");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_to_fit("abcdef", 4), "abc");
        // 'é' is two bytes; cutting inside it must back off.
        assert_eq!(truncate_to_fit("aé", 3), "a");
        let mut out = Vec::new();
        put_fixed_str_truncated(&mut out, "abcdef", 4);
        assert_eq!(out, b"abc\0");
    }
}
