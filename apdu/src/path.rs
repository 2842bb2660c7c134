// Copyright (c) 2022-2023 The MobileCoin Foundation

//! BIP32 derivation paths
//!
//! Paths are sent ahead of every key or signing request.
//!
//! ## Encoding
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     COUNT     |          COMPONENT[0] (u32 big-endian)        /
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! /               |                     ...                       /
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use alloc::vec::Vec;
use core::{fmt::Display, str::FromStr};

use encdec::{DecodeOwned, Encode};

use crate::{cursor::ByteCursor, CodecError};

/// Maximum number of path components accepted by the device
pub const MAX_BIP32_PATH: usize = 10;

/// Hardened derivation flag
pub const HARDENED: u32 = 0x8000_0000;

/// BIP44 purpose component
pub const PURPOSE_BIP44: u32 = 44 | HARDENED;

/// SLIP-0044 coin types accepted by the Ontology app
pub const ONT_COIN_TYPES: [u32; 2] = [1024 | HARDENED, 888 | HARDENED];

/// Default Ontology account path
pub const DEFAULT_PATH: &str = "m/44'/1024'/0'/0/0";

/// Path parse / decode errors
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
pub enum PathError {
    #[cfg_attr(feature = "thiserror", error("path must start with 'm'"))]
    MissingRoot,

    #[cfg_attr(feature = "thiserror", error("invalid path component at index {0}"))]
    InvalidComponent(usize),

    #[cfg_attr(
        feature = "thiserror",
        error("path has {0} components (max 10)")
    )]
    TooLong(usize),

    #[cfg_attr(feature = "thiserror", error("path codec error: {0}"))]
    Codec(CodecError),
}

impl From<CodecError> for PathError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

/// BIP32 derivation path
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Bip32Path(heapless::Vec<u32, MAX_BIP32_PATH>);

impl Bip32Path {
    /// Create a path from raw components (hardened bits included)
    pub fn new(components: &[u32]) -> Result<Self, PathError> {
        heapless::Vec::from_slice(components)
            .map(Self)
            .map_err(|_| PathError::TooLong(components.len()))
    }

    /// Path components
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Check for a `44'/1024'` or `44'/888'` prefix
    pub fn is_ontology(&self) -> bool {
        matches!(self.components(), [PURPOSE_BIP44, coin, ..] if ONT_COIN_TYPES.contains(coin))
    }

    /// Serialize to wire form
    pub fn serialize(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(1 + 4 * self.0.len());

        b.push(self.0.len() as u8);
        for c in &self.0 {
            b.extend_from_slice(&c.to_be_bytes());
        }

        b
    }

    /// Decode a path from the cursor
    pub fn from_cursor(c: &mut ByteCursor) -> Result<Self, PathError> {
        let n = c.read_u8()? as usize;
        if n > MAX_BIP32_PATH {
            return Err(PathError::TooLong(n));
        }

        let mut p = heapless::Vec::new();
        for _ in 0..n {
            p.push(c.read_u32_be()?).map_err(|_| PathError::TooLong(n))?;
        }

        Ok(Self(p))
    }

    /// Decode a path, requiring all bytes to be consumed
    pub fn from_bytes(b: &[u8]) -> Result<Self, PathError> {
        let mut c = ByteCursor::new(b);
        let p = Self::from_cursor(&mut c)?;
        c.finish()?;
        Ok(p)
    }
}

impl FromStr for Bip32Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');

        if parts.next() != Some("m") {
            return Err(PathError::MissingRoot);
        }

        let mut p = heapless::Vec::new();
        for (i, part) in parts.enumerate() {
            let (digits, hardened) = match part.strip_suffix(|c: char| c == '\'' || c == 'h') {
                Some(d) => (d, true),
                None => (part, false),
            };

            let v: u32 = digits.parse().map_err(|_| PathError::InvalidComponent(i))?;
            if v & HARDENED != 0 {
                return Err(PathError::InvalidComponent(i));
            }

            let v = if hardened { v | HARDENED } else { v };
            p.push(v).map_err(|_| PathError::TooLong(i + 1))?;
        }

        Ok(Self(p))
    }
}

impl Display for Bip32Path {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "m")?;
        for c in &self.0 {
            match c & HARDENED != 0 {
                true => write!(f, "/{}'", c & !HARDENED)?,
                false => write!(f, "/{c}")?,
            }
        }
        Ok(())
    }
}

impl Encode for Bip32Path {
    type Error = CodecError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(1 + 4 * self.0.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let n = self.encode_len()?;
        if buff.len() < n {
            return Err(CodecError::InvalidLength);
        }

        // Write component count
        buff[0] = self.0.len() as u8;
        let mut index = 1;

        // Write components
        for c in &self.0 {
            buff[index..][..4].copy_from_slice(&c.to_be_bytes());
            index += 4;
        }

        Ok(index)
    }
}

impl DecodeOwned for Bip32Path {
    type Output = Self;

    type Error = CodecError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let mut c = ByteCursor::new(buff);

        let p = match Self::from_cursor(&mut c) {
            Ok(p) => p,
            Err(PathError::Codec(e)) => return Err(e),
            Err(_) => return Err(CodecError::InvalidLength),
        };

        Ok((p, c.position()))
    }
}
