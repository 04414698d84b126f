//! Frame I/O over a byte stream: `[14-byte header][length bytes of payload]`.
//!
//! Reads are exact: a read either yields a whole frame or fails. The
//! declared length is checked against `max_len` before any payload buffer
//! is allocated.

use bytes::{BufMut, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::header::PacketHeader;
use crate::wire_types::HEADER_LEN;

#[derive(Debug, Error)]
pub enum FrameError {
    /// The peer closed the stream between frames.
    #[error("connection closed")]
    Closed,

    /// The peer closed the stream partway through a payload.
    #[error("connection closed mid-frame: expected {expected} payload bytes")]
    Incomplete { expected: usize },

    #[error("declared payload of {len} bytes exceeds limit of {max}")]
    Oversized { len: usize, max: usize },

    #[error("frame io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: PacketHeader,
    pub payload: Vec<u8>,
}

/// Read one frame, refusing payloads longer than `max_len`.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Frame, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut raw = [0u8; HEADER_LEN];
    match reader.read_exact(&mut raw).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(FrameError::Closed),
        Err(e) => return Err(e.into()),
    }
    let header = PacketHeader::from_bytes(&raw);

    let len = header.length as usize;
    if len > max_len {
        return Err(FrameError::Oversized { len, max: max_len });
    }

    let mut payload = vec![0u8; len];
    match reader.read_exact(&mut payload).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(FrameError::Incomplete { expected: len })
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Frame { header, payload })
}

/// Write one frame and flush. The header's `length` is taken from
/// `payload`, whatever the caller put there.
pub async fn write_frame<W>(
    writer: &mut W,
    header: &PacketHeader,
    payload: &[u8],
) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let header = PacketHeader {
        length: payload.len() as u32,
        ..*header
    };

    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    header.encode(&mut buf);
    buf.put_slice(payload);

    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}
