//! Variable-length unsigned integers.
//!
//! The count of leading one bits in the first byte says how many bytes follow it. The rest of the
//! first byte and all following bytes hold the value, big-endian. Nine bytes cover all of `u64`.

use crate::error::{Error, Result};

/// Largest encoded size of a [`VarUInt`].
pub const MAX_VARUINT_LEN: usize = 9;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VarUInt {
    n: [u8; MAX_VARUINT_LEN],
    len: u8,
}

impl VarUInt {
    pub fn from_u64(i: u64) -> VarUInt {
        let len = measure_u64(i);
        let mut n = [0u8; MAX_VARUINT_LEN];
        let mut v = i;
        for b in n[1..len].iter_mut().rev() {
            *b = (v & 0xFF) as u8;
            v >>= 8;
        }
        // 0xFF << 8 would drop every bit, which is exactly right for the 9-byte form's prefix
        // being all ones with no value bits.
        n[0] = ((0xFF00u16 >> (len - 1)) as u8) | (v as u8);
        VarUInt { n, len: len as u8 }
    }

    pub fn to_u64(self) -> u64 {
        let len = self.len as usize;
        let mut v = (self.n[0] & first_byte_mask(len)) as u64;
        for b in &self.n[1..len] {
            v = (v << 8) | (*b as u64);
        }
        v
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.n[..self.len as usize]
    }

    pub fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.as_bytes());
    }

    /// Read a value off the front of `buf`, advancing it past the encoded bytes.
    pub fn read(buf: &mut &[u8]) -> Result<VarUInt> {
        let first = *buf.first().ok_or(Error::LengthTooShort {
            step: "decode VarUInt prefix",
            actual: 0,
            expected: 1,
        })?;
        let len = measure(first);
        if buf.len() < len {
            return Err(Error::LengthTooShort {
                step: "decode VarUInt",
                actual: buf.len(),
                expected: len,
            });
        }
        let mut n = [0u8; MAX_VARUINT_LEN];
        let (raw, rest) = buf.split_at(len);
        n[..len].copy_from_slice(raw);
        *buf = rest;
        Ok(VarUInt { n, len: len as u8 })
    }
}

impl From<u64> for VarUInt {
    fn from(n: u64) -> Self {
        VarUInt::from_u64(n)
    }
}

impl From<VarUInt> for u64 {
    fn from(v: VarUInt) -> Self {
        v.to_u64()
    }
}

/// Encoded size of a varint, given only its first byte.
pub fn measure(first: u8) -> usize {
    first.leading_ones() as usize + 1
}

/// Encoded size of `v` as a varint.
pub fn measure_u64(v: u64) -> usize {
    match 64 - v.leading_zeros() {
        0..=7 => 1,
        8..=14 => 2,
        15..=21 => 3,
        22..=28 => 4,
        29..=35 => 5,
        36..=42 => 6,
        43..=49 => 7,
        50..=56 => 8,
        _ => 9,
    }
}

fn first_byte_mask(len: usize) -> u8 {
    (0xFFu16 >> len) as u8
}

/// Append `v` to `buf` in varint form.
pub fn write_u64(buf: &mut Vec<u8>, v: u64) {
    VarUInt::from_u64(v).write(buf)
}

/// Read a varint off the front of `buf`, advancing it.
pub fn read_u64(buf: &mut &[u8]) -> Result<u64> {
    VarUInt::read(buf).map(VarUInt::to_u64)
}
