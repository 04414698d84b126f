//! The 14-byte packet header.
//!
//! ```text
//! [0..2]   opcode     (u16 BE)
//! [2..6]   length     (u32 BE, payload bytes that follow)
//! [6..10]  session_id (u32 BE, 0 = none)
//! [10..12] timestamp  (u16 BE, unix seconds truncated)
//! [12..14] reserved   (u16 BE)
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut};

use crate::wire_types::{Opcode, HEADER_LEN};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketHeader {
    pub opcode: u16,
    pub length: u32,
    pub session_id: u32,
    pub timestamp: u16,
    pub reserved: u16,
}

impl PacketHeader {
    /// Header for a fresh request.
    pub fn request(opcode: Opcode, length: usize, session_id: u32) -> Self {
        PacketHeader {
            opcode: opcode.as_u16(),
            length: length as u32,
            session_id,
            timestamp: now_timestamp(),
            reserved: 0,
        }
    }

    /// Header for the reply to `self`: everything is echoed except the
    /// opcode, the length and the timestamp.
    pub fn reply(&self, opcode: Opcode, length: usize) -> Self {
        PacketHeader {
            opcode: opcode.as_u16(),
            length: length as u32,
            timestamp: now_timestamp(),
            ..*self
        }
    }

    pub fn with_session(mut self, session_id: u32) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_u16(self.opcode)
    }

    pub fn encode<B: BufMut>(&self, out: &mut B) {
        out.put_u16(self.opcode);
        out.put_u32(self.length);
        out.put_u32(self.session_id);
        out.put_u16(self.timestamp);
        out.put_u16(self.reserved);
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut raw = [0u8; HEADER_LEN];
        let mut dst = &mut raw[..];
        self.encode(&mut dst);
        raw
    }

    pub fn from_bytes(raw: &[u8; HEADER_LEN]) -> Self {
        let mut buf = &raw[..];
        PacketHeader {
            opcode: buf.get_u16(),
            length: buf.get_u32(),
            session_id: buf.get_u32(),
            timestamp: buf.get_u16(),
            reserved: buf.get_u16(),
        }
    }
}

/// Current unix time in seconds, truncated to 16 bits.
pub fn now_timestamp() -> u16 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u16)
        .unwrap_or(0)
}
