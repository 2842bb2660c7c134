// Copyright (c) 2022-2023 The MobileCoin Foundation

use crate::ApduError;

/// Codec error type for primitive fields, paths and signable payloads
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
pub enum CodecError {
    /// Not enough bytes remaining to decode a field
    #[cfg_attr(
        feature = "thiserror",
        error("buffer underflow (needed {needed} bytes, {remaining} remaining)")
    )]
    Underflow { needed: usize, remaining: usize },

    /// Varint value exceeds 64 bits
    #[cfg_attr(feature = "thiserror", error("varint overflow"))]
    Overflow,

    /// Value outside the representable range
    #[cfg_attr(feature = "thiserror", error("value out of range"))]
    Range,

    /// Bytes left over after decoding completed
    #[cfg_attr(feature = "thiserror", error("{0} trailing bytes after decode"))]
    TrailingBytes(usize),

    /// Field length does not match the expected length
    #[cfg_attr(feature = "thiserror", error("invalid length"))]
    InvalidLength,

    /// Malformed encoding
    #[cfg_attr(feature = "thiserror", error("invalid encoding"))]
    InvalidEncoding,

    /// Text field is not valid UTF-8
    #[cfg_attr(feature = "thiserror", error("invalid utf8"))]
    Utf8,
}

impl CodecError {
    /// Build an underflow error for a read of `needed` bytes
    pub(crate) fn underflow(needed: usize, remaining: usize) -> Self {
        Self::Underflow { needed, remaining }
    }
}

impl From<encdec::Error> for CodecError {
    fn from(e: encdec::Error) -> Self {
        match e {
            encdec::Error::Length => CodecError::InvalidLength,
            #[allow(unreachable_patterns)]
            _ => CodecError::InvalidEncoding,
        }
    }
}

/// Collapse codec errors for request / response objects
impl From<CodecError> for ApduError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Underflow { .. }
            | CodecError::TrailingBytes(_)
            | CodecError::InvalidLength => ApduError::InvalidLength,
            CodecError::Overflow
            | CodecError::Range
            | CodecError::InvalidEncoding
            | CodecError::Utf8 => ApduError::InvalidEncoding,
        }
    }
}
