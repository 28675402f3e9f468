//! LEB128 variable-length integers and zigzag signed encoding, as used by TWKB.

use crate::error::{GeoArrowError, Result};

/// Decode a LEB128 unsigned integer from `buf` starting at `*pos`, advancing `*pos` past it.
pub fn decode_varint(buf: &[u8], pos: &mut usize) -> Result<u64> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        let byte = *buf
            .get(*pos)
            .ok_or_else(|| GeoArrowError::Twkb("unexpected end of buffer".into()))?;
        *pos += 1;

        let payload = (byte & 0x7F) as u64;
        // Checked before shifting: bits past 63 would be lost
        if shift >= 64 || (shift == 63 && payload > 1) {
            return Err(GeoArrowError::Twkb("varint overflow".into()));
        }
        result |= payload << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}

/// Zigzag-decode an unsigned value back to a signed one.
#[inline]
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ (-((value & 1) as i64))
}

/// Decode a zigzag-encoded signed varint.
pub fn decode_signed(buf: &[u8], pos: &mut usize) -> Result<i64> {
    decode_varint(buf, pos).map(zigzag_decode)
}
