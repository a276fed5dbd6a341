//! Variable-length integer codec used by the Minecraft protocol.

use std::io::{Cursor, Error, ErrorKind, Result, Write};

use crate::serial::{ReadFrom, WriteTo};

/// A protocol `VarInt`: a 32-bit integer encoded in 1 to 5 bytes, 7 bits per byte,
/// least significant group first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VarInt(pub i32);

impl VarInt {
    /// Maximum encoded length in bytes.
    pub const MAX_SIZE: usize = 5;

    /// Number of bytes `self` occupies once encoded.
    #[must_use]
    pub const fn written_size(self) -> usize {
        let value = self.0 as u32;
        match value {
            0..=0x7f => 1,
            0x80..=0x3fff => 2,
            0x4000..=0x1f_ffff => 3,
            0x20_0000..=0x0fff_ffff => 4,
            _ => 5,
        }
    }
}

impl ReadFrom for VarInt {
    fn read(data: &mut Cursor<&[u8]>) -> Result<Self> {
        let mut value: u32 = 0;
        for i in 0..Self::MAX_SIZE {
            let byte = u8::read(data)?;
            value |= u32::from(byte & 0x7f) << (i * 7);
            if byte & 0x80 == 0 {
                return Ok(VarInt(value as i32));
            }
        }
        Err(Error::new(ErrorKind::InvalidData, "VarInt is too long"))
    }
}

impl WriteTo for VarInt {
    fn write(&self, writer: &mut impl Write) -> Result<()> {
        let mut value = self.0 as u32;
        loop {
            if value & !0x7f == 0 {
                return (value as u8).write(writer);
            }
            ((value & 0x7f) as u8 | 0x80).write(writer)?;
            value >>= 7;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: i32) -> Vec<u8> {
        let mut buf = Vec::new();
        VarInt(value).write(&mut buf).unwrap();
        buf
    }

    #[test]
    fn known_encodings() {
        assert_eq!(encode(0), [0x00]);
        assert_eq!(encode(127), [0x7f]);
        assert_eq!(encode(128), [0x80, 0x01]);
        assert_eq!(encode(25565), [0xdd, 0xc7, 0x01]);
        assert_eq!(encode(-1), [0xff, 0xff, 0xff, 0xff, 0x0f]);
    }

    #[test]
    fn written_size_matches_encoding() {
        for value in [0, 1, 127, 128, 16_383, 16_384, 2_097_151, i32::MAX, -1] {
            assert_eq!(VarInt(value).written_size(), encode(value).len(), "{value}");
        }
    }

    #[test]
    fn rejects_overlong() {
        let bytes = [0xff; 6];
        let mut cursor = Cursor::new(&bytes[..]);
        assert!(VarInt::read(&mut cursor).is_err());
    }

    #[test]
    fn decodes_negative() {
        let bytes = encode(-42);
        let mut cursor = Cursor::new(&bytes[..]);
        assert_eq!(VarInt::read(&mut cursor).unwrap(), VarInt(-42));
    }
}
