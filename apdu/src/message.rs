// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Personal (off-chain) messages for signing
//!
//! Messages exist in two wire forms, selected by [`MsgFormat`]:
//!
//! - [`MsgFormat::Legacy`]: raw UTF-8 bytes filling the remainder of the buffer
//! - [`MsgFormat::Prefixed`]: varint length followed by the UTF-8 bytes
//!
//! The format is carried with the message and must be supplied explicitly on
//! decode, it is never inferred from the bytes.
//!
//! The device prepends [`SIGN_MAGIC`] before hashing, callers send the bare
//! message.

use alloc::{string::String, vec::Vec};

use encdec::Encode;

use crate::{
    cursor::ByteCursor,
    varint::{prefixed_len, write_prefixed},
    CodecError,
};

/// Maximum message length accepted by the device
pub const MAX_MESSAGE_LEN: usize = 1024;

/// Prefix applied by the device to messages before signing
pub const SIGN_MAGIC: &[u8] = b"\x19Ontology Signed Message:\n";

/// Personal message wire format
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MsgFormat {
    /// Raw bytes to the end of the buffer
    #[default]
    Legacy,
    /// Varint length prefixed
    Prefixed,
}

/// Personal message errors
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
pub enum PersonalMsgError {
    #[cfg_attr(feature = "thiserror", error("message is {0} bytes (max 1024)"))]
    TooLong(usize),

    #[cfg_attr(feature = "thiserror", error("message is not valid utf8"))]
    Utf8,

    #[cfg_attr(feature = "thiserror", error("message codec error: {0}"))]
    Codec(CodecError),
}

impl From<CodecError> for PersonalMsgError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

/// UTF-8 message for personal signing
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PersonalMsg {
    message: String,
    format: MsgFormat,
}

impl PersonalMsg {
    /// Create a message in the given wire format
    pub fn new(message: impl Into<String>, format: MsgFormat) -> Result<Self, PersonalMsgError> {
        let message = message.into();

        if message.len() > MAX_MESSAGE_LEN {
            return Err(PersonalMsgError::TooLong(message.len()));
        }

        Ok(Self { message, format })
    }

    /// Create a message in the legacy (unprefixed) format
    pub fn legacy(message: impl Into<String>) -> Result<Self, PersonalMsgError> {
        Self::new(message, MsgFormat::Legacy)
    }

    /// Create a message in the length-prefixed format
    pub fn prefixed(message: impl Into<String>) -> Result<Self, PersonalMsgError> {
        Self::new(message, MsgFormat::Prefixed)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn format(&self) -> MsgFormat {
        self.format
    }

    /// Serialize to wire form
    pub fn serialize(&self) -> Vec<u8> {
        let mut b = alloc::vec![0u8; self.wire_len()];

        // Buffer is sized by `wire_len` so writes always fit
        let r = self.write(&mut b);
        debug_assert_eq!(r, Ok(b.len()));

        b
    }

    /// Decode a message in the provided format from the cursor
    pub fn from_cursor(c: &mut ByteCursor, format: MsgFormat) -> Result<Self, PersonalMsgError> {
        let b = match format {
            MsgFormat::Legacy => c.read_rest(),
            MsgFormat::Prefixed => c.read_prefixed()?,
        };

        let s = core::str::from_utf8(b).map_err(|_| PersonalMsgError::Utf8)?;

        Self::new(s, format)
    }

    /// Decode a message, requiring all bytes to be consumed
    pub fn from_bytes(b: &[u8], format: MsgFormat) -> Result<Self, PersonalMsgError> {
        let mut c = ByteCursor::new(b);
        let m = Self::from_cursor(&mut c, format)?;
        c.finish()?;
        Ok(m)
    }

    fn wire_len(&self) -> usize {
        match self.format {
            MsgFormat::Legacy => self.message.len(),
            MsgFormat::Prefixed => prefixed_len(self.message.as_bytes()),
        }
    }

    fn write(&self, buff: &mut [u8]) -> Result<usize, CodecError> {
        let m = self.message.as_bytes();

        match self.format {
            MsgFormat::Legacy => {
                if buff.len() < m.len() {
                    return Err(CodecError::underflow(m.len(), buff.len()));
                }
                buff[..m.len()].copy_from_slice(m);
                Ok(m.len())
            }
            MsgFormat::Prefixed => write_prefixed(m, buff),
        }
    }
}

impl Encode for PersonalMsg {
    type Error = CodecError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.wire_len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        self.write(buff)
    }
}
