//! Typed facade over the wire protocol.
//!
//! Every call encodes one [`Request`], exchanges it (one-shot or pooled),
//! checks the reply opcode and turns failure flags and `{"error":..}`
//! bodies into [`ClientError::Rejected`].

use auction_core::{ProductId, RoomId, SessionId, UserId};
use auction_protocol::notify::{
    parse_reply, CreatedBody, ProductDraft, ProductRef, ProductUpdate, RoomDraft, RoomRef,
};
use auction_protocol::wire_types::opcode_name;
use auction_protocol::{
    decode_response, BidRes, BuyNowRes, NotifyCommand, Opcode, PacketHeader, ProductView, Request,
    Response, RoomInfo, RoomQuery, RoomView,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ClientError;
use crate::pool::ConnectionPool;
use crate::transact::transact;

#[derive(Debug)]
enum Transport {
    OneShot(String),
    Pooled(ConnectionPool),
}

/// Logged-in identity returned by [`AuctionClient::login`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub role: String,
}

#[derive(Debug)]
pub struct AuctionClient {
    transport: Transport,
}

impl AuctionClient {
    /// A new connection per request.
    pub fn connect_per_request(addr: impl Into<String>) -> Self {
        Self {
            transport: Transport::OneShot(addr.into()),
        }
    }

    /// Requests reuse up to `max_idle` parked connections.
    pub fn pooled(addr: impl Into<String>, max_idle: usize) -> Self {
        Self {
            transport: Transport::Pooled(ConnectionPool::new(addr, max_idle)),
        }
    }

    /// Send one request and return the reply header with its decoded body.
    pub async fn send(&self, request: &Request) -> Result<(PacketHeader, Response), ClientError> {
        let opcode = request.opcode();
        let payload = request.encode_payload()?;
        let frame = match &self.transport {
            Transport::OneShot(addr) => transact(addr, opcode, request.session_id(), &payload).await?,
            Transport::Pooled(pool) => pool.transact(opcode, request.session_id(), &payload).await?,
        };

        let expected = reply_opcode(opcode);
        if frame.header.opcode != expected.as_u16() {
            return Err(ClientError::UnexpectedReply {
                expected: expected.name(),
                actual: opcode_name(frame.header.opcode),
            });
        }
        let response = decode_response(&frame.header, &frame.payload)?;
        Ok((frame.header, response))
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Returns the new user id.
    pub async fn register(&self, username: &str, password: &str) -> Result<UserId, ClientError> {
        let request = Request::Register {
            username: username.to_string(),
            password: password.to_string(),
        };
        match self.send(&request).await? {
            (_, Response::Login(res)) if res.success => Ok(res.user_id),
            (_, Response::Login(res)) => Err(ClientError::Rejected(res.message)),
            (_, other) => Err(unexpected(Opcode::LoginRes, &other)),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        let request = Request::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        match self.send(&request).await? {
            (header, Response::Login(res)) if res.success => {
                debug!(session_id = header.session_id, user_id = res.user_id, "logged in");
                Ok(Session {
                    session_id: header.session_id,
                    user_id: res.user_id,
                    role: res.role,
                })
            }
            (_, Response::Login(res)) => Err(ClientError::Rejected(res.message)),
            (_, other) => Err(unexpected(Opcode::LoginRes, &other)),
        }
    }

    // ------------------------------------------------------------------
    // JOIN_ROOM
    // ------------------------------------------------------------------

    async fn rooms_query(
        &self,
        session_id: SessionId,
        query: RoomQuery,
    ) -> Result<Option<Vec<RoomInfo>>, ClientError> {
        match self.send(&Request::Rooms { session_id, query }).await? {
            (_, Response::Rooms(res)) if res.result == 0 => Ok(Some(res.rooms)),
            (_, Response::Rooms(_)) => Ok(None),
            (_, other) => Err(unexpected(Opcode::JoinRoomRes, &other)),
        }
    }

    /// At most 16 rooms, the wire array's capacity.
    pub async fn rooms(&self, session_id: SessionId) -> Result<Vec<RoomInfo>, ClientError> {
        self.rooms_query(session_id, RoomQuery::ListPublic)
            .await?
            .ok_or_else(|| ClientError::Rejected("request failed".to_string()))
    }

    /// `None` when the room does not exist.
    pub async fn room(&self, session_id: SessionId, room_id: RoomId) -> Result<Option<RoomInfo>, ClientError> {
        let rooms = self.rooms_query(session_id, RoomQuery::Detail { room_id }).await?;
        Ok(rooms.and_then(|list| list.into_iter().next()))
    }

    pub async fn join(&self, session_id: SessionId, room_id: RoomId) -> Result<Option<RoomInfo>, ClientError> {
        let rooms = self.rooms_query(session_id, RoomQuery::Join { room_id }).await?;
        Ok(rooms.and_then(|list| list.into_iter().next()))
    }

    pub async fn own_rooms(&self, session_id: SessionId) -> Result<Vec<RoomInfo>, ClientError> {
        self.rooms_query(session_id, RoomQuery::ListOwn)
            .await?
            .ok_or_else(|| ClientError::Rejected("unauthorized".to_string()))
    }

    // ------------------------------------------------------------------
    // Bidding
    // ------------------------------------------------------------------

    pub async fn bid(&self, session_id: SessionId, room_id: RoomId, amount: u32) -> Result<BidRes, ClientError> {
        let request = Request::Bid {
            session_id,
            room_id,
            amount,
        };
        match self.send(&request).await? {
            (_, Response::Bid(res)) if res.success => Ok(res),
            (_, Response::Bid(res)) => Err(ClientError::Rejected(res.message)),
            (_, other) => Err(unexpected(Opcode::BidRes, &other)),
        }
    }

    pub async fn buy_now(&self, session_id: SessionId, room_id: RoomId, price: u32) -> Result<BuyNowRes, ClientError> {
        let request = Request::BuyNow {
            session_id,
            room_id,
            price,
        };
        match self.send(&request).await? {
            (_, Response::BuyNow(res)) if res.success => Ok(res),
            (_, Response::BuyNow(res)) => Err(ClientError::Rejected(res.message)),
            (_, other) => Err(unexpected(Opcode::BuyNowRes, &other)),
        }
    }

    // ------------------------------------------------------------------
    // NOTIFY_MESSAGE
    // ------------------------------------------------------------------

    /// Run one notify operation and decode its JSON reply as `T`.
    pub async fn notify<T: DeserializeOwned>(
        &self,
        session_id: SessionId,
        room_id: RoomId,
        command: NotifyCommand,
    ) -> Result<T, ClientError> {
        let request = Request::Notify {
            session_id,
            room_id,
            command,
        };
        match self.send(&request).await? {
            (_, Response::Notify(msg)) => parse_reply::<T>(&msg.body)?.map_err(ClientError::Rejected),
            (_, other) => Err(unexpected(Opcode::NotifyMessage, &other)),
        }
    }

    async fn ack(&self, session_id: SessionId, command: NotifyCommand) -> Result<(), ClientError> {
        self.notify::<serde_json::Value>(session_id, 0, command).await.map(|_| ())
    }

    pub async fn products(&self) -> Result<Vec<ProductView>, ClientError> {
        self.notify(0, 0, NotifyCommand::ListProducts).await
    }

    pub async fn own_products(&self, session_id: SessionId) -> Result<Vec<ProductView>, ClientError> {
        self.notify(session_id, 0, NotifyCommand::ListOwnProducts).await
    }

    pub async fn product(&self, id: ProductId) -> Result<ProductView, ClientError> {
        self.notify(0, 0, NotifyCommand::GetProduct(ProductRef { id })).await
    }

    pub async fn create_product(&self, session_id: SessionId, draft: ProductDraft) -> Result<CreatedBody, ClientError> {
        self.notify(session_id, 0, NotifyCommand::CreateProduct(draft)).await
    }

    pub async fn update_product(&self, session_id: SessionId, update: ProductUpdate) -> Result<(), ClientError> {
        self.ack(session_id, NotifyCommand::UpdateProduct(update)).await
    }

    pub async fn delete_product(&self, session_id: SessionId, id: ProductId) -> Result<(), ClientError> {
        self.ack(session_id, NotifyCommand::DeleteProduct(ProductRef { id })).await
    }

    /// Full public room list as JSON, not capped at 16 entries.
    pub async fn room_views(&self) -> Result<Vec<RoomView>, ClientError> {
        self.notify(0, 0, NotifyCommand::ListPublicRooms).await
    }

    pub async fn own_room_views(&self, session_id: SessionId) -> Result<Vec<RoomView>, ClientError> {
        self.notify(session_id, 0, NotifyCommand::ListOwnRooms).await
    }

    pub async fn create_room(&self, session_id: SessionId, draft: RoomDraft) -> Result<RoomId, ClientError> {
        let created: CreatedBody = self.notify(session_id, 0, NotifyCommand::CreateRoom(draft)).await?;
        Ok(created.id)
    }

    pub async fn start_room(&self, session_id: SessionId, room_id: RoomId) -> Result<(), ClientError> {
        self.ack(session_id, NotifyCommand::StartRoom(RoomRef { room_id })).await
    }

    pub async fn cancel_room(&self, session_id: SessionId, room_id: RoomId) -> Result<(), ClientError> {
        self.ack(session_id, NotifyCommand::CancelRoom(RoomRef { room_id })).await
    }

    pub async fn delete_room(&self, session_id: SessionId, room_id: RoomId) -> Result<(), ClientError> {
        self.ack(session_id, NotifyCommand::DeleteRoom(RoomRef { room_id })).await
    }
}

fn reply_opcode(request: Opcode) -> Opcode {
    match request {
        Opcode::LoginReq => Opcode::LoginRes,
        Opcode::JoinRoomReq => Opcode::JoinRoomRes,
        Opcode::BidReq => Opcode::BidRes,
        Opcode::BuyNowReq => Opcode::BuyNowRes,
        other => other,
    }
}

fn unexpected(expected: Opcode, got: &Response) -> ClientError {
    ClientError::UnexpectedReply {
        expected: expected.name(),
        actual: got.opcode().name(),
    }
}
