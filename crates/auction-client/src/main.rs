// crates/auction-client/src/main.rs

use anyhow::{Context, Result};
use auction_client::{AuctionClient, DEFAULT_MAX_IDLE};
use auction_protocol::notify::{ProductDraft, RoomDraft};
use auction_protocol::RoomInfo;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(name = "auction-cli")]
#[clap(about = "Drive the auction backend from a shell")]
struct Cli {
    /// Server address
    #[clap(short, long, default_value = "127.0.0.1:9000")]
    server: String,

    /// Session id from a previous `login`
    #[clap(short = 'S', long, default_value = "0")]
    session: u32,

    /// Reuse connections instead of opening one per request
    #[clap(short, long)]
    persistent: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Register { username: String, password: String },
    Login { username: String, password: String },
    /// Public rooms (binary listing, at most 16)
    Rooms,
    Room { room_id: u32 },
    MyRooms,
    Bid { room_id: u32, amount: u32 },
    BuyNow { room_id: u32, price: u32 },
    Products,
    Product { id: u32 },
    CreateProduct {
        name: String,
        start_price: i64,
        #[clap(long)]
        description: Option<String>,
        #[clap(long)]
        category: Option<String>,
        #[clap(long)]
        image_url: Option<String>,
    },
    CreateRoom {
        product_id: u32,
        room_name: String,
        #[clap(long, default_value = "60")]
        duration: i64,
        #[clap(long, default_value = "0")]
        base_price: i64,
    },
    StartRoom { room_id: u32 },
    CancelRoom { room_id: u32 },
    DeleteRoom { room_id: u32 },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoomLine<'a> {
    room_id: u32,
    product_id: u32,
    host_user_id: u32,
    current_price: u32,
    base_price: u32,
    duration_seconds: u32,
    room_name: &'a str,
    status: &'a str,
}

impl<'a> From<&'a RoomInfo> for RoomLine<'a> {
    fn from(r: &'a RoomInfo) -> Self {
        RoomLine {
            room_id: r.room_id,
            product_id: r.product_id,
            host_user_id: r.host_user_id,
            current_price: r.current_price,
            base_price: r.base_price,
            duration_seconds: r.duration_seconds,
            room_name: &r.room_name,
            status: &r.status,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_rooms(rooms: &[RoomInfo]) -> Result<()> {
    let lines: Vec<RoomLine<'_>> = rooms.iter().map(RoomLine::from).collect();
    print_json(&lines)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = if cli.persistent {
        AuctionClient::pooled(&cli.server, DEFAULT_MAX_IDLE)
    } else {
        AuctionClient::connect_per_request(&cli.server)
    };
    let sid = cli.session;

    match cli.command {
        Command::Register { username, password } => {
            let user_id = client.register(&username, &password).await?;
            println!("registered user {user_id}");
        }
        Command::Login { username, password } => {
            let session = client.login(&username, &password).await?;
            println!(
                "session {} (user {}, role {})",
                session.session_id, session.user_id, session.role
            );
        }
        Command::Rooms => print_rooms(&client.rooms(sid).await?)?,
        Command::Room { room_id } => {
            let room = client
                .room(sid, room_id)
                .await?
                .with_context(|| format!("room {room_id} not found"))?;
            print_json(&RoomLine::from(&room))?;
        }
        Command::MyRooms => print_rooms(&client.own_rooms(sid).await?)?,
        Command::Bid { room_id, amount } => {
            let res = client.bid(sid, room_id, amount).await?;
            println!(
                "{}: highest bid {} by user {}",
                res.message, res.highest_bid, res.highest_bidder_id
            );
        }
        Command::BuyNow { room_id, price } => {
            let res = client.buy_now(sid, room_id, price).await?;
            println!("{}: user {} paid {}", res.message, res.buyer_id, res.final_price);
        }
        Command::Products => print_json(&client.products().await?)?,
        Command::Product { id } => print_json(&client.product(id).await?)?,
        Command::CreateProduct {
            name,
            start_price,
            description,
            category,
            image_url,
        } => {
            let draft = ProductDraft {
                name,
                description,
                start_price,
                image_url,
                category,
            };
            let created = client.create_product(sid, draft).await?;
            println!("product {} created", created.id);
        }
        Command::CreateRoom {
            product_id,
            room_name,
            duration,
            base_price,
        } => {
            let draft = RoomDraft {
                room_name,
                product_id,
                duration,
                base_price,
            };
            let room_id = client.create_room(sid, draft).await?;
            println!("room {room_id} created");
        }
        Command::StartRoom { room_id } => {
            client.start_room(sid, room_id).await?;
            println!("room {room_id} started");
        }
        Command::CancelRoom { room_id } => {
            client.cancel_room(sid, room_id).await?;
            println!("room {room_id} cancelled");
        }
        Command::DeleteRoom { room_id } => {
            client.delete_room(sid, room_id).await?;
            println!("room {room_id} deleted");
        }
    }

    Ok(())
}
