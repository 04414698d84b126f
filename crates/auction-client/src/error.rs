use auction_protocol::{FrameError, ProtocolError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connecting to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transport: {0}")]
    Frame(#[from] FrameError),

    #[error("protocol: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("expected {expected} reply, got {actual}")]
    UnexpectedReply {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("malformed reply body: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered with a business failure.
    #[error("{0}")]
    Rejected(String),
}

impl ClientError {
    /// Failed exchange, as opposed to a well-formed refusal.
    pub fn is_transport(&self) -> bool {
        !matches!(self, ClientError::Rejected(_))
    }

    /// HTTP status a gateway should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            ClientError::Rejected(msg) => match msg.as_str() {
                "unauthorized" | "login failed" => 401,
                "not found" | "room not found" => 404,
                "user exists" | "already sold" | "bid too low" | "product not available"
                | "room not running" => 409,
                _ => 400,
            },
            _ => 500,
        }
    }
}
