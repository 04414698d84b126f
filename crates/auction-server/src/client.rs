//! Per-connection worker loop.
//!
//! Strictly sequential: read one frame, route it, write one reply, repeat.
//! The loop ends on EOF, on any framing or protocol error, or when the
//! optional idle timeout passes without a complete frame.

use std::fmt::Write as _;

use auction_protocol::wire_types::opcode_name;
use auction_protocol::{read_frame, write_frame, Frame, FrameError, MAX_PAYLOAD_LEN};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::router;
use crate::types::ServerState;

/// Bytes of payload shown in trace-level hex dumps.
const HEX_PREVIEW_LEN: usize = 256;

/// Run the request/response loop for one connection.
///
/// Returns `Ok` for every orderly end (EOF, idle timeout, protocol
/// violation) and `Err` only for transport failures.
pub async fn run_client<S>(mut stream: S, state: ServerState) -> Result<(), FrameError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let frame = match next_frame(&mut stream, &state).await {
            Some(Ok(frame)) => frame,
            Some(Err(FrameError::Closed)) => {
                debug!("peer closed connection");
                return Ok(());
            }
            Some(Err(FrameError::Oversized { len, max })) => {
                warn!(len, max, "declared payload too large, closing");
                return Ok(());
            }
            Some(Err(e)) => return Err(e),
            None => {
                info!("idle timeout, closing");
                return Ok(());
            }
        };

        debug!(
            opcode = opcode_name(frame.header.opcode),
            length = frame.header.length,
            session_id = frame.header.session_id,
            "frame received"
        );
        trace!(payload = %hex_preview(&frame.payload), "payload");

        let reply = match router::route(&state.house, &frame.header, &frame.payload) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(opcode = frame.header.opcode, error = %e, "protocol violation, closing");
                return Ok(());
            }
        };

        write_frame(&mut stream, &reply.header, &reply.payload).await?;
        debug!(
            opcode = opcode_name(reply.header.opcode),
            length = reply.header.length,
            "reply sent"
        );
    }
}

/// `None` when the idle timeout fired.
async fn next_frame<S>(stream: &mut S, state: &ServerState) -> Option<Result<Frame, FrameError>>
where
    S: AsyncRead + Unpin,
{
    match state.idle_timeout {
        Some(limit) => timeout(limit, read_frame(stream, MAX_PAYLOAD_LEN)).await.ok(),
        None => Some(read_frame(stream, MAX_PAYLOAD_LEN).await),
    }
}

fn hex_preview(bytes: &[u8]) -> String {
    let shown = &bytes[..bytes.len().min(HEX_PREVIEW_LEN)];
    let mut out = String::with_capacity(shown.len() * 3 + 8);
    for (i, b) in shown.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{b:02x}");
    }
    if bytes.len() > shown.len() {
        let _ = write!(out, " ... (+{} bytes)", bytes.len() - shown.len());
    }
    out
}
