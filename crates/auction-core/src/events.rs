//! Domain events emitted after successful auction mutations.
//!
//! The core only publishes; whoever wants to fan them out (a WebSocket
//! layer, a log, a test) subscribes to the [`EventBus`]. Each event
//! serializes to the JSON envelope real-time clients consume, e.g.
//! `{"type":"bid","roomId":3,"userId":2,"amount":150}`.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{ProductId, RoomId, UserId};

/// Events buffered per subscriber before the slowest one starts lagging.
pub const EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AuctionEvent {
    RoomCreated {
        room_id: RoomId,
        product_id: ProductId,
        host_user_id: UserId,
        base_price: u32,
    },
    RoomStarted {
        room_id: RoomId,
    },
    RoomCancelled {
        room_id: RoomId,
    },
    RoomDeleted {
        room_id: RoomId,
    },
    Bid {
        room_id: RoomId,
        user_id: UserId,
        amount: u32,
    },
    BuyNow {
        room_id: RoomId,
        buyer_id: UserId,
        final_price: u32,
    },
}

impl AuctionEvent {
    pub fn room_id(&self) -> RoomId {
        match self {
            AuctionEvent::RoomCreated { room_id, .. }
            | AuctionEvent::RoomStarted { room_id }
            | AuctionEvent::RoomCancelled { room_id }
            | AuctionEvent::RoomDeleted { room_id }
            | AuctionEvent::Bid { room_id, .. }
            | AuctionEvent::BuyNow { room_id, .. } => *room_id,
        }
    }

    pub fn to_json(&self) -> String {
        // Plain integers and tags only; serializing cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Broadcast bus for [`AuctionEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AuctionEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        EventBus { tx }
    }

    /// Publish to all current subscribers. No subscribers is not an error.
    pub fn publish(&self, event: AuctionEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuctionEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_render_as_typed_envelopes() {
        let bid = AuctionEvent::Bid {
            room_id: 3,
            user_id: 2,
            amount: 150,
        };
        assert_eq!(
            bid.to_json(),
            r#"{"type":"bid","roomId":3,"userId":2,"amount":150}"#
        );

        let started = AuctionEvent::RoomStarted { room_id: 9 };
        assert_eq!(started.to_json(), r#"{"type":"room_started","roomId":9}"#);

        let sale = AuctionEvent::BuyNow {
            room_id: 1,
            buyer_id: 4,
            final_price: 500,
        };
        assert_eq!(
            sale.to_json(),
            r#"{"type":"buy_now","roomId":1,"buyerId":4,"finalPrice":500}"#
        );
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.publish(AuctionEvent::RoomCancelled { room_id: 5 });
        assert_eq!(rx.recv().await.unwrap(), AuctionEvent::RoomCancelled { room_id: 5 });
    }
}
