//! auction-protocol
//!
//! Wire-level encoding/decoding for the auction backend.
//!
//! - [`wire_types`]   : opcodes, notify codes, capacities, string fields
//! - [`header`]       : the 14-byte big-endian packet header
//! - [`binary_codec`] : fixed-layout payload structures
//! - [`notify`]       : JSON bodies carried by NOTIFY_MESSAGE
//! - [`messages`]     : typed requests / responses, decoded once
//! - [`framing`]      : exact-length frame reads/writes on async streams

pub mod wire_types;
pub mod header;
pub mod binary_codec;
pub mod notify;
pub mod messages;
pub mod framing;

pub use binary_codec::{
    BidReq, BidRes, BuyNowReq, BuyNowRes, ItemEnd, ItemStart, JoinRoomReq, JoinRoomRes, LoginReq,
    LoginRes, NotifyMessage, ProtocolError, RoomInfo, TimerTick, WireStruct,
};
pub use framing::{read_frame, write_frame, Frame, FrameError};
pub use header::PacketHeader;
pub use messages::{decode_request, decode_response, Request, Response, RoomQuery};
pub use notify::{NotifyCommand, NotifyReply, ProductView, RoomView};
pub use wire_types::{NotifyCode, Opcode, MAX_PAYLOAD_LEN};
