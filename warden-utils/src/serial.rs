//! Big-endian primitive (de)serialization for protocol records.

use std::io::{Cursor, Error, ErrorKind, Read, Result, Write};

/// A value that can be decoded from a byte cursor.
pub trait ReadFrom: Sized {
    /// Reads one value, advancing the cursor.
    fn read(data: &mut Cursor<&[u8]>) -> Result<Self>;
}

/// A value that can be encoded into a writer.
pub trait WriteTo {
    /// Writes the value.
    fn write(&self, writer: &mut impl Write) -> Result<()>;
}

macro_rules! impl_be_number {
    ($($ty:ty),*) => {
        $(
            impl ReadFrom for $ty {
                fn read(data: &mut Cursor<&[u8]>) -> Result<Self> {
                    let mut buf = [0; size_of::<$ty>()];
                    data.read_exact(&mut buf)?;
                    Ok(<$ty>::from_be_bytes(buf))
                }
            }

            impl WriteTo for $ty {
                fn write(&self, writer: &mut impl Write) -> Result<()> {
                    writer.write_all(&self.to_be_bytes())
                }
            }
        )*
    };
}

impl_be_number!(u8, i8, i16, i32, i64, f32, f64);

impl ReadFrom for bool {
    fn read(data: &mut Cursor<&[u8]>) -> Result<Self> {
        match u8::read(data)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::new(
                ErrorKind::InvalidData,
                format!("invalid boolean byte {other:#04x}"),
            )),
        }
    }
}

impl WriteTo for bool {
    fn write(&self, writer: &mut impl Write) -> Result<()> {
        u8::from(*self).write(writer)
    }
}

/// Number of bytes left to read in the cursor.
#[must_use]
pub fn remaining(data: &Cursor<&[u8]>) -> usize {
    let len = data.get_ref().len();
    len.saturating_sub(data.position() as usize)
}
