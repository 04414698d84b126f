//! One frame out, one frame back.

use auction_protocol::{
    read_frame, write_frame, Frame, FrameError, Opcode, PacketHeader, MAX_PAYLOAD_LEN,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::ClientError;

/// Open a fresh connection, exchange exactly one request/response pair and
/// close it again.
pub async fn transact(
    addr: &str,
    opcode: Opcode,
    session_id: u32,
    payload: &[u8],
) -> Result<Frame, ClientError> {
    let mut stream = connect(addr).await?;
    exchange(&mut stream, opcode, session_id, payload).await
}

pub(crate) async fn connect(addr: &str) -> Result<TcpStream, ClientError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|source| ClientError::Connect {
            addr: addr.to_string(),
            source,
        })?;
    stream.set_nodelay(true).map_err(FrameError::from)?;
    debug!(%addr, "connected");
    Ok(stream)
}

pub(crate) async fn exchange<S>(
    stream: &mut S,
    opcode: Opcode,
    session_id: u32,
    payload: &[u8],
) -> Result<Frame, ClientError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let header = PacketHeader::request(opcode, payload.len(), session_id);
    write_frame(stream, &header, payload).await?;
    let frame = read_frame(stream, MAX_PAYLOAD_LEN).await?;
    debug!(
        opcode = opcode.name(),
        reply = frame.header.opcode,
        length = frame.header.length,
        "exchange complete"
    );
    Ok(frame)
}
