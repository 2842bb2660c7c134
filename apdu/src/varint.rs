// Copyright (c) 2022-2023 The MobileCoin Foundation

//! LEB128 variable length integers and length-prefixed fields
//!
//! Values are split into 7-bit groups, least significant group first, with the
//! high bit of each byte set while more groups follow. A `u64` needs at most
//! [`MAX_VARINT_LEN`] bytes, the last of which may only carry a single bit.
//!
//! Encodings are canonical: a redundant trailing zero group is rejected on
//! decode so every accepted input re-encodes to the same bytes.

use core::ops::Deref;

use encdec::{DecodeOwned, Encode};

use crate::{cursor::ByteCursor, CodecError};

/// Maximum encoded length of a `u64` varint
pub const MAX_VARINT_LEN: usize = 10;

/// Unsigned varint value
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct VarInt(pub u64);

impl VarInt {
    /// Encode to bytes
    pub fn to_bytes(self) -> VarIntBytes {
        encode_varint(self.0)
    }
}

impl From<u64> for VarInt {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl From<u32> for VarInt {
    fn from(v: u32) -> Self {
        Self(v as u64)
    }
}

impl TryFrom<u128> for VarInt {
    type Error = CodecError;

    fn try_from(v: u128) -> Result<Self, Self::Error> {
        u64::try_from(v).map(Self).map_err(|_| CodecError::Range)
    }
}

impl Encode for VarInt {
    type Error = CodecError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(varint_len(self.0))
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        write_varint(self.0, buff)
    }
}

impl DecodeOwned for VarInt {
    type Output = Self;

    type Error = CodecError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let mut c = ByteCursor::new(buff);
        let v = read_varint(&mut c)?;
        Ok((Self(v), c.position()))
    }
}

/// Encoded varint, stored inline
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct VarIntBytes {
    buff: [u8; MAX_VARINT_LEN],
    len: usize,
}

impl Deref for VarIntBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buff[..self.len]
    }
}

impl AsRef<[u8]> for VarIntBytes {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

/// Compute the encoded length of a varint
pub fn varint_len(mut v: u64) -> usize {
    let mut n = 1;
    while v >= 0x80 {
        v >>= 7;
        n += 1;
    }
    n
}

/// Encode a varint into an inline buffer
pub fn encode_varint(v: u64) -> VarIntBytes {
    let mut buff = [0u8; MAX_VARINT_LEN];
    let len = varint_len(v);

    put_varint(v, &mut buff[..len]);

    VarIntBytes { buff, len }
}

/// Encode a varint from a `u128`, rejecting values above `u64::MAX`
pub fn try_encode_varint_u128(v: u128) -> Result<VarIntBytes, CodecError> {
    VarInt::try_from(v).map(|v| v.to_bytes())
}

/// Write a varint into the provided buffer, returning the encoded length
pub fn write_varint(v: u64, buff: &mut [u8]) -> Result<usize, CodecError> {
    let n = varint_len(v);
    if buff.len() < n {
        return Err(CodecError::underflow(n, buff.len()));
    }

    put_varint(v, &mut buff[..n]);

    Ok(n)
}

// `buff` must be exactly `varint_len(v)` bytes
fn put_varint(mut v: u64, buff: &mut [u8]) {
    let last = buff.len() - 1;

    for b in &mut buff[..last] {
        *b = (v as u8 & 0x7f) | 0x80;
        v >>= 7;
    }
    buff[last] = v as u8;
}

/// Read a varint from the cursor
pub fn read_varint(c: &mut ByteCursor) -> Result<u64, CodecError> {
    let mut v = 0u64;

    for i in 0..MAX_VARINT_LEN {
        let b = c.read_u8()?;

        // The tenth group only has room for the top bit of a u64
        if i == MAX_VARINT_LEN - 1 && b > 0x01 {
            return Err(CodecError::Overflow);
        }

        // Reject redundant zero groups
        if i > 0 && b == 0x00 {
            return Err(CodecError::InvalidEncoding);
        }

        v |= ((b & 0x7f) as u64) << (7 * i);

        if b & 0x80 == 0 {
            return Ok(v);
        }
    }

    Err(CodecError::Overflow)
}

/// Compute the encoded length of a length-prefixed field
pub fn prefixed_len(data: &[u8]) -> usize {
    varint_len(data.len() as u64) + data.len()
}

/// Write a varint length prefix followed by `data`
pub fn write_prefixed(data: &[u8], buff: &mut [u8]) -> Result<usize, CodecError> {
    let n = prefixed_len(data);
    if buff.len() < n {
        return Err(CodecError::underflow(n, buff.len()));
    }

    let index = write_varint(data.len() as u64, buff)?;
    buff[index..][..data.len()].copy_from_slice(data);

    Ok(n)
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn known_encodings() {
        let tests: &[(u64, &[u8])] = &[
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7f]),
            (128, &[0x80, 0x01]),
            (300, &[0xac, 0x02]),
            (16_384, &[0x80, 0x80, 0x01]),
            (
                u64::MAX,
                &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01],
            ),
        ];

        for (v, b) in tests {
            assert_eq!(&*encode_varint(*v), *b, "encode {v}");
            assert_eq!(varint_len(*v), b.len());
            assert_eq!(read_varint(&mut ByteCursor::new(b)), Ok(*v), "decode {v}");
        }
    }

    #[test]
    fn u128_range() {
        assert_eq!(
            &*try_encode_varint_u128(u64::MAX as u128).unwrap(),
            &*encode_varint(u64::MAX)
        );
        assert_eq!(
            try_encode_varint_u128(u64::MAX as u128 + 1),
            Err(CodecError::Range)
        );
    }

    #[test]
    fn overflow() {
        // Eleven continuation bytes
        let b = [0xff; 11];
        assert_eq!(read_varint(&mut ByteCursor::new(&b)), Err(CodecError::Overflow));

        // Tenth byte carries more than one bit
        let b = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x02];
        assert_eq!(read_varint(&mut ByteCursor::new(&b)), Err(CodecError::Overflow));
    }

    #[test]
    fn underflow() {
        let b = [0x80, 0x80];
        assert_eq!(
            read_varint(&mut ByteCursor::new(&b)),
            Err(CodecError::underflow(1, 0))
        );
        assert_eq!(
            read_varint(&mut ByteCursor::new(&[])),
            Err(CodecError::underflow(1, 0))
        );
    }

    #[test]
    fn non_canonical() {
        let b = [0x81, 0x00];
        assert_eq!(
            read_varint(&mut ByteCursor::new(&b)),
            Err(CodecError::InvalidEncoding)
        );
    }

    #[test]
    fn write_into_short_buffer() {
        let mut buff = [0u8; 1];
        assert_eq!(write_varint(300, &mut buff), Err(CodecError::underflow(2, 1)));
    }

    #[test]
    fn prefixed() {
        let mut buff = [0u8; 16];
        let n = write_prefixed(b"hello", &mut buff).unwrap();

        assert_eq!(n, prefixed_len(b"hello"));
        assert_eq!(&buff[..n], b"\x05hello");

        let mut c = ByteCursor::new(&buff[..n]);
        assert_eq!(c.read_prefixed(), Ok(&b"hello"[..]));
    }

    #[test]
    fn varint_apdu() {
        let mut buff = [0u8; 16];
        crate::test::encode_decode_apdu(&mut buff, &VarInt(624_485));
    }

    proptest! {
        #[test]
        fn round_trip(v in any::<u64>()) {
            let b = encode_varint(v);
            prop_assert_eq!(b.len(), varint_len(v));

            let mut c = ByteCursor::new(&b);
            prop_assert_eq!(read_varint(&mut c), Ok(v));
            prop_assert!(c.is_empty());
        }

        #[test]
        fn truncated(v in 128u64..=u64::MAX) {
            let b = encode_varint(v);
            let mut c = ByteCursor::new(&b[..b.len() - 1]);
            prop_assert_eq!(read_varint(&mut c), Err(CodecError::underflow(1, 0)));
        }
    }
}
