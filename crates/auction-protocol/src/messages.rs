//! Typed request / response model.
//!
//! A frame is decoded exactly once into a [`Request`] (server side) or a
//! [`Response`] (client side). Multiplexed integer discriminants
//! (JOIN_ROOM `action`, NOTIFY `code`) are resolved here into variants.

use crate::binary_codec::{
    BidReq, BidRes, BuyNowReq, BuyNowRes, JoinRoomReq, JoinRoomRes, LoginReq, LoginRes,
    NotifyMessage, ProtocolError, WireStruct,
};
use crate::header::PacketHeader;
use crate::notify::NotifyCommand;
use crate::wire_types::Opcode;

/// JOIN_ROOM `action` values.
pub const ACTION_LIST_PUBLIC: u8 = 0;
pub const ACTION_DETAIL: u8 = 1;
pub const ACTION_JOIN: u8 = 2;
pub const ACTION_LIST_OWN: u8 = 3;

/// What a JOIN_ROOM request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomQuery {
    ListPublic,
    Detail { room_id: u32 },
    /// Reserved; answered like `Detail`.
    Join { room_id: u32 },
    ListOwn,
    Unsupported(u8),
}

impl RoomQuery {
    pub fn from_wire(action: u8, room_id: u32) -> Self {
        match action {
            ACTION_LIST_PUBLIC => RoomQuery::ListPublic,
            ACTION_DETAIL => RoomQuery::Detail { room_id },
            ACTION_JOIN => RoomQuery::Join { room_id },
            ACTION_LIST_OWN => RoomQuery::ListOwn,
            other => RoomQuery::Unsupported(other),
        }
    }

    /// `(action, room_id)` for the wire.
    pub fn to_wire(self) -> (u8, u32) {
        match self {
            RoomQuery::ListPublic => (ACTION_LIST_PUBLIC, 0),
            RoomQuery::Detail { room_id } => (ACTION_DETAIL, room_id),
            RoomQuery::Join { room_id } => (ACTION_JOIN, room_id),
            RoomQuery::ListOwn => (ACTION_LIST_OWN, 0),
            RoomQuery::Unsupported(action) => (action, 0),
        }
    }
}

/// A decoded client request. `session_id` is already resolved: the header
/// value when nonzero, otherwise whatever the payload carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Login {
        username: String,
        password: String,
    },
    Register {
        username: String,
        password: String,
    },
    Rooms {
        session_id: u32,
        query: RoomQuery,
    },
    Bid {
        session_id: u32,
        room_id: u32,
        amount: u32,
    },
    BuyNow {
        session_id: u32,
        room_id: u32,
        price: u32,
    },
    Notify {
        session_id: u32,
        room_id: u32,
        command: NotifyCommand,
    },
}

impl Request {
    pub fn opcode(&self) -> Opcode {
        match self {
            Request::Login { .. } | Request::Register { .. } => Opcode::LoginReq,
            Request::Rooms { .. } => Opcode::JoinRoomReq,
            Request::Bid { .. } => Opcode::BidReq,
            Request::BuyNow { .. } => Opcode::BuyNowReq,
            Request::Notify { .. } => Opcode::NotifyMessage,
        }
    }

    /// Encode the payload. Session ids are written into the payload where
    /// the layout has a slot; callers also put them in the header.
    pub fn encode_payload(&self) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Request::Login { username, password } | Request::Register { username, password } => {
                LoginReq {
                    username: username.clone(),
                    password: password.clone(),
                    register: matches!(self, Request::Register { .. }),
                }
                .to_bytes()
            }
            Request::Rooms { session_id, query } => {
                let (action, room_id) = query.to_wire();
                JoinRoomReq {
                    room_id,
                    session_id: *session_id,
                    action,
                }
                .to_bytes()
            }
            Request::Bid {
                session_id,
                room_id,
                amount,
            } => BidReq {
                session_id: *session_id,
                room_id: *room_id,
                amount: *amount,
            }
            .to_bytes(),
            Request::BuyNow {
                session_id,
                room_id,
                price,
            } => BuyNowReq {
                session_id: *session_id,
                room_id: *room_id,
                price: *price,
            }
            .to_bytes(),
            Request::Notify {
                room_id, command, ..
            } => NotifyMessage {
                room_id: *room_id,
                code: command.code(),
                body: command.body(),
            }
            .to_bytes(),
        }
    }

    /// Session id to carry in the request header.
    pub fn session_id(&self) -> u32 {
        match self {
            Request::Login { .. } | Request::Register { .. } => 0,
            Request::Rooms { session_id, .. }
            | Request::Bid { session_id, .. }
            | Request::BuyNow { session_id, .. }
            | Request::Notify { session_id, .. } => *session_id,
        }
    }
}

fn effective_session(header: &PacketHeader, payload_session: u32) -> u32 {
    if header.session_id != 0 {
        header.session_id
    } else {
        payload_session
    }
}

/// Decode one request frame.
///
/// Unknown opcodes and opcodes that are not requests are errors; the
/// server treats both as protocol violations.
pub fn decode_request(header: &PacketHeader, payload: &[u8]) -> Result<Request, ProtocolError> {
    let opcode = header
        .opcode()
        .ok_or(ProtocolError::UnknownOpcode(header.opcode))?;

    let request = match opcode {
        Opcode::LoginReq => {
            let req = LoginReq::decode(payload)?;
            if req.register {
                Request::Register {
                    username: req.username,
                    password: req.password,
                }
            } else {
                Request::Login {
                    username: req.username,
                    password: req.password,
                }
            }
        }
        Opcode::JoinRoomReq => {
            let req = JoinRoomReq::decode(payload)?;
            Request::Rooms {
                session_id: effective_session(header, req.session_id),
                query: RoomQuery::from_wire(req.action, req.room_id),
            }
        }
        Opcode::BidReq => {
            let req = BidReq::decode(payload)?;
            Request::Bid {
                session_id: effective_session(header, req.session_id),
                room_id: req.room_id,
                amount: req.amount,
            }
        }
        Opcode::BuyNowReq => {
            let req = BuyNowReq::decode(payload)?;
            Request::BuyNow {
                session_id: effective_session(header, req.session_id),
                room_id: req.room_id,
                price: req.price,
            }
        }
        Opcode::NotifyMessage => {
            let msg = NotifyMessage::decode(payload)?;
            Request::Notify {
                session_id: header.session_id,
                room_id: msg.room_id,
                command: NotifyCommand::parse(msg.code, &msg.body),
            }
        }
        Opcode::LoginRes
        | Opcode::JoinRoomRes
        | Opcode::BidRes
        | Opcode::BuyNowRes
        | Opcode::TimerTick
        | Opcode::ItemStart
        | Opcode::ItemEnd => return Err(ProtocolError::NotARequest(header.opcode)),
    };
    Ok(request)
}

/// A server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Login(LoginRes),
    Rooms(JoinRoomRes),
    Bid(BidRes),
    BuyNow(BuyNowRes),
    Notify(NotifyMessage),
}

impl Response {
    pub fn opcode(&self) -> Opcode {
        match self {
            Response::Login(_) => Opcode::LoginRes,
            Response::Rooms(_) => Opcode::JoinRoomRes,
            Response::Bid(_) => Opcode::BidRes,
            Response::BuyNow(_) => Opcode::BuyNowRes,
            Response::Notify(_) => Opcode::NotifyMessage,
        }
    }

    pub fn encode_payload(&self) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Response::Login(r) => r.to_bytes(),
            Response::Rooms(r) => r.to_bytes(),
            Response::Bid(r) => r.to_bytes(),
            Response::BuyNow(r) => r.to_bytes(),
            Response::Notify(r) => r.to_bytes(),
        }
    }
}

/// Decode one reply frame (client side).
pub fn decode_response(header: &PacketHeader, payload: &[u8]) -> Result<Response, ProtocolError> {
    let opcode = header
        .opcode()
        .ok_or(ProtocolError::UnknownOpcode(header.opcode))?;
    let response = match opcode {
        Opcode::LoginRes => Response::Login(LoginRes::decode(payload)?),
        Opcode::JoinRoomRes => Response::Rooms(JoinRoomRes::decode(payload)?),
        Opcode::BidRes => Response::Bid(BidRes::decode(payload)?),
        Opcode::BuyNowRes => Response::BuyNow(BuyNowRes::decode(payload)?),
        Opcode::NotifyMessage => Response::Notify(NotifyMessage::decode(payload)?),
        other => return Err(ProtocolError::NotAResponse(other.as_u16())),
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{ProductRef, RoomRef};

    fn header(opcode: Opcode, session_id: u32) -> PacketHeader {
        PacketHeader {
            opcode: opcode.as_u16(),
            session_id,
            ..Default::default()
        }
    }

    #[test]
    fn header_session_wins_over_payload() {
        let payload = BidReq {
            session_id: 1001,
            room_id: 3,
            amount: 150,
        }
        .to_bytes()
        .unwrap();

        let from_header = decode_request(&header(Opcode::BidReq, 1005), &payload).unwrap();
        assert_eq!(from_header.session_id(), 1005);

        let from_payload = decode_request(&header(Opcode::BidReq, 0), &payload).unwrap();
        assert_eq!(
            from_payload,
            Request::Bid {
                session_id: 1001,
                room_id: 3,
                amount: 150
            }
        );
    }

    #[test]
    fn notify_uses_header_session_only() {
        let req = Request::Notify {
            session_id: 1000,
            room_id: 0,
            command: NotifyCommand::StartRoom(RoomRef { room_id: 4 }),
        };
        let payload = req.encode_payload().unwrap();
        let decoded = decode_request(&header(Opcode::NotifyMessage, 0), &payload).unwrap();
        assert_eq!(decoded.session_id(), 0);
        let decoded = decode_request(&header(Opcode::NotifyMessage, 1000), &payload).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn register_flag_selects_variant() {
        let reg = Request::Register {
            username: "alice".into(),
            password: "secret1".into(),
        };
        let payload = reg.encode_payload().unwrap();
        assert_eq!(decode_request(&header(Opcode::LoginReq, 0), &payload).unwrap(), reg);
    }

    #[test]
    fn join_room_actions_map_to_queries() {
        assert_eq!(RoomQuery::from_wire(0, 9), RoomQuery::ListPublic);
        assert_eq!(RoomQuery::from_wire(1, 9), RoomQuery::Detail { room_id: 9 });
        assert_eq!(RoomQuery::from_wire(2, 9), RoomQuery::Join { room_id: 9 });
        assert_eq!(RoomQuery::from_wire(3, 9), RoomQuery::ListOwn);
        assert_eq!(RoomQuery::from_wire(7, 9), RoomQuery::Unsupported(7));
    }

    #[test]
    fn non_request_opcodes_are_rejected() {
        assert_eq!(
            decode_request(&header(Opcode::TimerTick, 0), &[0; 8]),
            Err(ProtocolError::NotARequest(0x08))
        );
        let unknown = PacketHeader {
            opcode: 0x42,
            ..Default::default()
        };
        assert_eq!(
            decode_request(&unknown, &[]),
            Err(ProtocolError::UnknownOpcode(0x42))
        );
    }

    #[test]
    fn short_payload_is_rejected() {
        let err = decode_request(&header(Opcode::LoginReq, 0), &[0; 10]).unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated { expected: 68, .. }));
    }

    #[test]
    fn responses_decode_by_opcode() {
        let res = Response::Notify(NotifyMessage {
            room_id: 0,
            code: 2,
            body: serde_json::to_string(&ProductRef { id: 1 }).unwrap(),
        });
        let payload = res.encode_payload().unwrap();
        let decoded = decode_response(&header(res.opcode(), 0), &payload).unwrap();
        assert_eq!(decoded, res);
    }
}
