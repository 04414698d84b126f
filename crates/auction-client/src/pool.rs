//! Persistent connections to the backend.
//!
//! The backend serves any number of sequential requests per connection, so
//! idle streams are parked here and reused instead of paying a handshake per
//! request. A stream is only ever used by one exchange at a time, which keeps
//! request/response pairing exact without correlation ids.

use std::sync::{Mutex, PoisonError};

use auction_protocol::{Frame, Opcode};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use crate::error::ClientError;
use crate::transact::{connect, exchange};

pub const DEFAULT_MAX_IDLE: usize = 8;

#[derive(Debug)]
pub struct ConnectionPool {
    addr: String,
    max_idle: usize,
    idle: Mutex<Vec<TcpStream>>,
}

impl ConnectionPool {
    pub fn new(addr: impl Into<String>, max_idle: usize) -> Self {
        Self {
            addr: addr.into(),
            max_idle,
            idle: Mutex::new(Vec::new()),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Exchange one request/response pair on a pooled connection.
    ///
    /// A request that was written is never resent: if the exchange fails the
    /// connection is discarded and the error returned.
    pub async fn transact(
        &self,
        opcode: Opcode,
        session_id: u32,
        payload: &[u8],
    ) -> Result<Frame, ClientError> {
        let mut stream = match self.checkout() {
            Some(stream) => stream,
            None => connect(&self.addr).await?,
        };

        let frame = exchange(&mut stream, opcode, session_id, payload).await?;
        self.checkin(stream);
        Ok(frame)
    }

    fn checkout(&self) -> Option<TcpStream> {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        while let Some(stream) = idle.pop() {
            if is_reusable(&stream) {
                trace!(remaining = idle.len(), "reusing pooled connection");
                return Some(stream);
            }
            debug!("dropping stale pooled connection");
        }
        None
    }

    fn checkin(&self, stream: TcpStream) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(stream);
        }
    }
}

/// An idle stream must have nothing to read: EOF means the server closed it
/// (idle timeout, restart) and unsolicited bytes would desynchronize the next
/// reply.
fn is_reusable(stream: &TcpStream) -> bool {
    let mut probe = [0u8; 1];
    match stream.try_read(&mut probe) {
        Err(e) => e.kind() == std::io::ErrorKind::WouldBlock,
        Ok(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use auction_protocol::{read_frame, write_frame, MAX_PAYLOAD_LEN};
    use tokio::net::TcpListener;

    use super::*;

    /// Echo server that answers every frame with an empty BID_RES and counts
    /// accepted connections.
    async fn echo_server() -> (String, tokio::sync::mpsc::UnboundedReceiver<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let (accepted_tx, accepted_rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                let (mut stream, _) = listener.accept().await.unwrap();
                accepted_tx.send(()).unwrap();
                tokio::spawn(async move {
                    while let Ok(frame) = read_frame(&mut stream, MAX_PAYLOAD_LEN).await {
                        let header = frame.header.reply(Opcode::BidRes, 0);
                        if write_frame(&mut stream, &header, &[]).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        (addr, accepted_rx)
    }

    #[tokio::test]
    async fn sequential_requests_share_one_connection() {
        let (addr, mut accepted) = echo_server().await;
        let pool = ConnectionPool::new(addr, DEFAULT_MAX_IDLE);

        for _ in 0..5 {
            let frame = pool.transact(Opcode::BidReq, 1000, &[]).await.unwrap();
            assert_eq!(frame.header.opcode, Opcode::BidRes.as_u16());
        }

        assert_eq!(pool.idle_count(), 1);
        accepted.recv().await.unwrap();
        assert!(accepted.try_recv().is_err());
    }

    #[tokio::test]
    async fn concurrent_requests_open_separate_connections() {
        let (addr, _accepted) = echo_server().await;
        let pool = ConnectionPool::new(addr, 2);

        let (a, b, c) = tokio::join!(
            pool.transact(Opcode::BidReq, 1, &[]),
            pool.transact(Opcode::BidReq, 2, &[]),
            pool.transact(Opcode::BidReq, 3, &[]),
        );
        assert_eq!(a.unwrap().header.session_id, 1);
        assert_eq!(b.unwrap().header.session_id, 2);
        assert_eq!(c.unwrap().header.session_id, 3);
        assert_eq!(pool.idle_count(), 2);
    }
}
