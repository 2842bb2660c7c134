// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Ontology account addresses
//!
//! Addresses are derived from the public key returned by the device:
//!
//! ```text
//! script      = 0x21 || compressed_key (33 bytes) || 0xac
//! script_hash = RIPEMD160(SHA256(script))
//! address     = base58(0x17 || script_hash || SHA256(SHA256(0x17 || script_hash))[..4])
//! ```

use p256::ecdsa::VerifyingKey;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use ledger_ont_apdu::transaction::SCRIPT_HASH_LEN;

use crate::Error;

/// Address version byte
pub const ADDRESS_VERSION: u8 = 0x17;

const OP_PUSHBYTES33: u8 = 0x21;
const OP_CHECKSIG: u8 = 0xac;

/// Compute the script hash for an uncompressed (65 byte, `0x04` prefixed)
/// public key
pub fn script_hash_from_public_key(public_key: &[u8]) -> Result<[u8; SCRIPT_HASH_LEN], Error> {
    if public_key.len() != 65 || public_key[0] != 0x04 {
        return Err(Error::InvalidKey);
    }

    let key = VerifyingKey::from_sec1_bytes(public_key).map_err(|_| Error::InvalidKey)?;
    let compressed = key.to_encoded_point(true);

    let mut script = Vec::with_capacity(35);
    script.push(OP_PUSHBYTES33);
    script.extend_from_slice(compressed.as_bytes());
    script.push(OP_CHECKSIG);

    let h = Ripemd160::digest(Sha256::digest(&script));

    Ok(h.into())
}

/// Encode a script hash as a base58 address
pub fn address_from_script_hash(script_hash: &[u8; SCRIPT_HASH_LEN]) -> String {
    let mut b = Vec::with_capacity(1 + SCRIPT_HASH_LEN + 4);
    b.push(ADDRESS_VERSION);
    b.extend_from_slice(script_hash);

    let checksum = Sha256::digest(Sha256::digest(&b));
    b.extend_from_slice(&checksum[..4]);

    bs58::encode(b).into_string()
}

/// Derive the base58 address for an uncompressed public key
pub fn address_from_public_key(public_key: &[u8]) -> Result<String, Error> {
    let h = script_hash_from_public_key(public_key)?;
    Ok(address_from_script_hash(&h))
}
