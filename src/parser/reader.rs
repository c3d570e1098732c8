use crate::parser::errors::{OpError, OpResult};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Write};

///
/// Readers for the packed storage format.
///
/// Integers are Bitcoin Core `VARINT`s (MSB base-128 with the +1 offset
/// per continuation byte), the same encoding Core uses in its block and
/// tx indexes.
///
pub trait PackedRead: std::io::Read {
    fn read_varint(&mut self) -> OpResult<u64> {
        let mut n: u64 = 0;
        loop {
            let ch_data = ReadBytesExt::read_u8(self)?;
            if n > (u64::MAX >> 7) {
                return Err(OpError::from("varint overflow"));
            }
            n = (n << 7) | (ch_data & 0x7F) as u64;
            if ch_data & 0x80 > 0 {
                n = n
                    .checked_add(1)
                    .ok_or_else(|| OpError::from("varint overflow"))?;
            } else {
                break;
            }
        }
        Ok(n)
    }

    #[inline]
    fn read_varint_i64(&mut self) -> OpResult<i64> {
        Ok(zigzag_decode(self.read_varint()?))
    }

    #[inline]
    fn read_u8(&mut self) -> OpResult<u8> {
        Ok(ReadBytesExt::read_u8(self)?)
    }

    #[inline]
    fn read_u8_vec(&mut self, count: usize) -> OpResult<Vec<u8>> {
        let mut arr = vec![0u8; count];
        self.read_exact(&mut arr)?;
        Ok(arr)
    }
}

impl PackedRead for Cursor<&[u8]> {}
impl PackedRead for Cursor<Vec<u8>> {}

///
/// Writers mirroring `PackedRead`.
///
pub trait PackedWrite: Write {
    fn write_varint(&mut self, mut n: u64) -> OpResult<()> {
        let mut tmp = [0u8; 10];
        let mut len = 0;
        loop {
            tmp[len] = (n & 0x7F) as u8 | if len > 0 { 0x80 } else { 0x00 };
            if n <= 0x7F {
                break;
            }
            n = (n >> 7) - 1;
            len += 1;
        }
        for b in tmp[..=len].iter().rev() {
            WriteBytesExt::write_u8(self, *b)?;
        }
        Ok(())
    }

    #[inline]
    fn write_varint_i64(&mut self, n: i64) -> OpResult<()> {
        self.write_varint(zigzag_encode(n))
    }

    #[inline]
    fn write_u8(&mut self, n: u8) -> OpResult<()> {
        Ok(WriteBytesExt::write_u8(self, n)?)
    }

    ///
    /// Length-prefixed byte string.
    ///
    #[inline]
    fn write_var_bytes(&mut self, data: &[u8]) -> OpResult<()> {
        self.write_varint(data.len() as u64)?;
        self.write_all(data)?;
        Ok(())
    }
}

impl PackedWrite for Vec<u8> {}

#[inline]
fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

#[inline]
fn zigzag_decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}
