//! Traits and errors shared by every packet record.

use std::io::{self, Cursor};

use thiserror::Error;
use warden_utils::serial::remaining;

/// An error raised while turning raw bytes into a packet record.
#[derive(Error, Debug)]
pub enum PacketError {
    /// The payload ended early or contained an invalid value.
    #[error("malformed packet 0x{id:02x}: {source}")]
    Malformed {
        /// The packet id being decoded.
        id: i32,
        /// The underlying read error.
        #[source]
        source: io::Error,
    },
    /// The payload was longer than the packet's layout.
    #[error("packet 0x{id:02x} has {count} trailing byte(s)")]
    TrailingBytes {
        /// The packet id being decoded.
        id: i32,
        /// How many bytes were left over.
        count: usize,
    },
}

/// Runs `read` over a complete payload, rejecting leftover bytes.
pub fn decode_with<T>(
    id: i32,
    payload: &[u8],
    read: impl FnOnce(&mut Cursor<&[u8]>) -> io::Result<T>,
) -> Result<T, PacketError> {
    let mut cursor = Cursor::new(payload);
    let packet = read(&mut cursor).map_err(|source| PacketError::Malformed { id, source })?;
    match remaining(&cursor) {
        0 => Ok(packet),
        count => Err(PacketError::TrailingBytes { id, count }),
    }
}
