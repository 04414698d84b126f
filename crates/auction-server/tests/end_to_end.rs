// crates/auction-server/tests/end_to_end.rs
use std::sync::Arc;

use auction_client::{AuctionClient, ClientError};
use auction_protocol::notify::{ProductDraft, RoomDraft};
use auction_protocol::{read_frame, FrameError, Opcode, PacketHeader, MAX_PAYLOAD_LEN};
use auction_server::config::Config;
use auction_server::server::{build_house, serve};
use auction_server::types::ServerState;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

async fn start_server() -> String {
    let house = build_house(&Config::default()).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(serve(listener, ServerState::new(house, 64, None)));
    addr
}

async fn logged_in(client: &AuctionClient, name: &str) -> u32 {
    client.register(name, "secret1").await.unwrap();
    client.login(name, "secret1").await.unwrap().session_id
}

async fn create_listing(client: &AuctionClient, session: u32, base_price: i64) -> (u32, u32) {
    let product = client
        .create_product(
            session,
            ProductDraft {
                name: "Vase".into(),
                start_price: 100,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let room = client
        .create_room(
            session,
            RoomDraft {
                room_name: "Vase Auction".into(),
                product_id: product.id,
                duration: 60,
                base_price,
            },
        )
        .await
        .unwrap();
    (product.id, room)
}

#[tokio::test]
async fn register_then_login() {
    let addr = start_server().await;
    let client = AuctionClient::connect_per_request(&addr);

    client.register("alice", "secret1").await.unwrap();
    match client.register("alice", "secret1").await {
        Err(ClientError::Rejected(msg)) => assert_eq!(msg, "user exists"),
        other => panic!("expected user exists, got {other:?}"),
    }

    let session = client.login("alice", "secret1").await.unwrap();
    assert_ne!(session.session_id, 0);

    match client.login("alice", "wrong").await {
        Err(ClientError::Rejected(msg)) => assert_eq!(msg, "unauthorized"),
        other => panic!("expected unauthorized, got {other:?}"),
    }
}

#[tokio::test]
async fn listing_and_bidding() {
    let addr = start_server().await;
    let client = AuctionClient::pooled(&addr, 4);
    let session = logged_in(&client, "alice").await;

    let created = client
        .create_product(
            session,
            ProductDraft {
                name: "Vase".into(),
                start_price: 100,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(created.status.as_deref(), Some("available"));
    assert_eq!(client.product(created.id).await.unwrap().status, "available");

    let room_id = client
        .create_room(
            session,
            RoomDraft {
                room_name: "Vase Auction".into(),
                product_id: created.id,
                duration: 60,
                base_price: 100,
            },
        )
        .await
        .unwrap();
    assert_eq!(client.product(created.id).await.unwrap().status, "pending");

    match client.bid(session, room_id, 90).await {
        Err(ClientError::Rejected(msg)) => assert_eq!(msg, "bid too low"),
        other => panic!("expected bid too low, got {other:?}"),
    }

    let accepted = client.bid(session, room_id, 150).await.unwrap();
    assert_eq!(accepted.highest_bid, 150);
    assert_eq!(accepted.message, "accepted");

    let room = client.room(session, room_id).await.unwrap().unwrap();
    assert_eq!(room.current_price, 150);
    assert_eq!(room.room_name, "Vase Auction");
}

#[tokio::test]
async fn concurrent_buy_now_sells_once() {
    let addr = start_server().await;
    let client = Arc::new(AuctionClient::connect_per_request(&addr));
    let owner = logged_in(&client, "owner").await;
    let bidder = logged_in(&client, "bidder").await;

    let (product_id, room_id) = create_listing(&client, owner, 100).await;
    client.start_room(owner, room_id).await.unwrap();

    let attempts = [owner, bidder].map(|session| {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.buy_now(session, room_id, 500).await })
    });
    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let sold: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(sold.len(), 1);
    assert_eq!(sold[0].message, "sold");
    assert_eq!(sold[0].final_price, 500);

    let refused: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(refused.len(), 1);
    assert!(matches!(refused[0], ClientError::Rejected(msg) if msg == "already sold"));

    assert_eq!(client.product(product_id).await.unwrap().status, "sold");
}

#[tokio::test]
async fn one_connection_serves_many_requests() {
    let addr = start_server().await;
    let client = AuctionClient::pooled(&addr, 1);
    let session = logged_in(&client, "carol").await;

    for _ in 0..3 {
        create_listing(&client, session, 10).await;
    }
    assert_eq!(client.own_rooms(session).await.unwrap().len(), 3);
    assert_eq!(client.own_products(session).await.unwrap().len(), 3);
}

#[tokio::test]
async fn notify_errors_keep_the_connection_usable() {
    let addr = start_server().await;
    let client = AuctionClient::pooled(&addr, 1);

    match client.create_room(0, RoomDraft::default()).await {
        Err(ClientError::Rejected(msg)) => assert_eq!(msg, "unauthorized"),
        other => panic!("expected unauthorized, got {other:?}"),
    }
    match client.product(4242).await {
        Err(e) => assert_eq!(e.http_status(), 404),
        Ok(p) => panic!("unexpected product {p:?}"),
    }
    assert!(client.products().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_opcode_closes_connection() {
    let addr = start_server().await;
    let mut stream = TcpStream::connect(&addr).await.unwrap();

    let header = PacketHeader {
        opcode: 0x42,
        ..Default::default()
    };
    stream.write_all(&header.to_bytes()).await.unwrap();

    assert!(matches!(
        read_frame(&mut stream, MAX_PAYLOAD_LEN).await,
        Err(FrameError::Closed)
    ));
}

#[tokio::test]
async fn server_push_opcode_from_client_closes_connection() {
    let addr = start_server().await;
    let mut stream = TcpStream::connect(&addr).await.unwrap();

    let header = PacketHeader::request(Opcode::TimerTick, 8, 0);
    stream.write_all(&header.to_bytes()).await.unwrap();
    stream.write_all(&[0u8; 8]).await.unwrap();

    assert!(matches!(
        read_frame(&mut stream, MAX_PAYLOAD_LEN).await,
        Err(FrameError::Closed)
    ));
}

#[tokio::test]
async fn oversized_length_closes_connection() {
    let addr = start_server().await;
    let mut stream = TcpStream::connect(&addr).await.unwrap();

    let header = PacketHeader {
        opcode: Opcode::NotifyMessage.as_u16(),
        length: 1 << 30,
        ..Default::default()
    };
    stream.write_all(&header.to_bytes()).await.unwrap();

    assert!(matches!(
        read_frame(&mut stream, MAX_PAYLOAD_LEN).await,
        Err(FrameError::Closed)
    ));
}
