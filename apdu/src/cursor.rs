// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Byte cursor for decoding APDU payloads
//!
//! All decoders in this crate read through a [`ByteCursor`], which tracks the
//! read position over a borrowed buffer and never moves past the end of it.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::{varint, CodecError};

/// Byte order for fixed-width integer fields
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Endian {
    Big,
    Little,
}

/// Read cursor over a borrowed byte buffer
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ByteCursor<'a> {
    buff: &'a [u8],
    index: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a new cursor positioned at the start of `buff`
    pub fn new(buff: &'a [u8]) -> Self {
        Self { buff, index: 0 }
    }

    /// Current read position
    pub fn position(&self) -> usize {
        self.index
    }

    /// Number of unread bytes
    pub fn remaining(&self) -> usize {
        self.buff.len() - self.index
    }

    /// Check whether all bytes have been consumed
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Fetch the next byte without advancing
    pub fn peek_u8(&self) -> Result<u8, CodecError> {
        self.buff
            .get(self.index)
            .copied()
            .ok_or(CodecError::underflow(1, 0))
    }

    /// Read the next `n` bytes
    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(CodecError::underflow(n, remaining));
        }

        let b = &self.buff[self.index..][..n];
        self.index += n;

        Ok(b)
    }

    /// Read a fixed size array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut a = [0u8; N];
        a.copy_from_slice(self.read_exact(N)?);
        Ok(a)
    }

    /// Read all remaining bytes
    pub fn read_rest(&mut self) -> &'a [u8] {
        let b = &self.buff[self.index..];
        self.index = self.buff.len();
        b
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.read_exact(1)?[0])
    }

    pub fn read_u16_be(&mut self) -> Result<u16, CodecError> {
        self.read_exact(2).map(BigEndian::read_u16)
    }

    pub fn read_u16_le(&mut self) -> Result<u16, CodecError> {
        self.read_exact(2).map(LittleEndian::read_u16)
    }

    pub fn read_u32_be(&mut self) -> Result<u32, CodecError> {
        self.read_exact(4).map(BigEndian::read_u32)
    }

    pub fn read_u32_le(&mut self) -> Result<u32, CodecError> {
        self.read_exact(4).map(LittleEndian::read_u32)
    }

    pub fn read_u64_be(&mut self) -> Result<u64, CodecError> {
        self.read_exact(8).map(BigEndian::read_u64)
    }

    pub fn read_u64_le(&mut self) -> Result<u64, CodecError> {
        self.read_exact(8).map(LittleEndian::read_u64)
    }

    /// Read an unsigned integer of `width` bytes (1..=8)
    pub fn read_uint(&mut self, width: usize, endian: Endian) -> Result<u64, CodecError> {
        if !(1..=8).contains(&width) {
            return Err(CodecError::Range);
        }

        let b = self.read_exact(width)?;
        let v = match endian {
            Endian::Big => BigEndian::read_uint(b, width),
            Endian::Little => LittleEndian::read_uint(b, width),
        };

        Ok(v)
    }

    /// Read a LEB128 varint
    pub fn read_varint(&mut self) -> Result<u64, CodecError> {
        varint::read_varint(self)
    }

    /// Read a varint length prefix followed by that many bytes
    pub fn read_prefixed(&mut self) -> Result<&'a [u8], CodecError> {
        // Restore position if the prefix overruns the buffer
        let start = self.index;

        let len = self.read_varint()?;
        let remaining = self.remaining();

        match usize::try_from(len) {
            Ok(n) if n <= remaining => self.read_exact(n),
            _ => {
                self.index = start;
                Err(CodecError::underflow(
                    usize::try_from(len).unwrap_or(usize::MAX),
                    remaining,
                ))
            }
        }
    }

    /// Complete decoding, failing if unread bytes remain
    pub fn finish(self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}
