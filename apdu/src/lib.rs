// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Protocol / APDU definitions for Ontology app communication
//!
//! This module provides the wire-level encoding used to talk to the Ontology
//! hardware wallet application: primitive codecs (fixed-width integers,
//! varints, length-prefixed fields), the signable message types, command /
//! response frames with chunking for oversized payloads, status words and
//! typed response objects.
//!
//! Encodings follow the device application: request paths and status words
//! are big-endian, transaction header fields are little-endian, and variable
//! length fields carry a LEB128 varint length prefix.
//!

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod app_info;
pub mod chunk;
pub mod cursor;
mod error;
pub mod frame;
pub mod message;
pub mod path;
pub mod prelude;
pub mod public_key;
pub mod sign;
pub mod status;
pub mod transaction;
pub mod unpack;
pub mod varint;

pub use error::CodecError;
pub use ledger_proto::{ApduBase, ApduError, ApduHeader, ApduReq, ApduStatic};

/// Ontology APDU Class
pub const ONT_APDU_CLA: u8 = 0x80;

/// Maximum data length for a single short APDU
pub const MAX_APDU_DATA: usize = 255;

/// Ontology APDU instruction codes
#[derive(Copy, Clone, Debug, PartialEq, Eq, num_enum::TryFromPrimitive, strum::Display)]
#[repr(u8)]
pub enum Instruction {
    /// Sign a transaction (chunked)
    SignTx = 0x02,

    /// Fetch application version
    GetVersion = 0x03,

    /// Fetch application name
    GetAppName = 0x04,

    /// Fetch a public key for a BIP32 path
    GetPublicKey = 0x05,

    /// Sign a personal message (chunked)
    SignMessage = 0x07,
}
