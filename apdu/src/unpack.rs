// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Response unpackers
//!
//! Each unpacker takes a response payload (status word already removed) and
//! returns its fields in wire order. Unpackers are strict: truncated input
//! fails with [`CodecError::Underflow`] and unread bytes with
//! [`CodecError::TrailingBytes`].

use crate::{cursor::ByteCursor, CodecError};

/// Uncompressed SEC1 public key length
pub const PUBLIC_KEY_LEN: usize = 65;

/// BIP32 chain code length
pub const CHAIN_CODE_LEN: usize = 32;

/// Maximum DER encoded ECDSA signature length
pub const MAX_DER_SIG_LEN: usize = 72;

/// Version response length
pub const VERSION_LEN: usize = 3;

/// Unpack a GET_PUBLIC_KEY response
///
/// Returns `(pub_key_len, pub_key, chain_code_len, chain_code)`.
pub fn unpack_get_public_key_response(
    buff: &[u8],
) -> Result<(usize, &[u8], usize, &[u8]), CodecError> {
    let mut c = ByteCursor::new(buff);

    let pub_key = c.read_prefixed()?;
    if pub_key.len() != PUBLIC_KEY_LEN {
        return Err(CodecError::InvalidLength);
    }

    let chain_code = c.read_prefixed()?;
    if chain_code.len() != CHAIN_CODE_LEN {
        return Err(CodecError::InvalidLength);
    }

    c.finish()?;

    Ok((pub_key.len(), pub_key, chain_code.len(), chain_code))
}

/// Unpack a SIGN_TX / SIGN_MESSAGE response
///
/// Returns `(der_sig_len, der_sig, v)`.
pub fn unpack_sign_tx_response(buff: &[u8]) -> Result<(usize, &[u8], u8), CodecError> {
    let mut c = ByteCursor::new(buff);

    let der_sig = c.read_prefixed()?;
    if der_sig.is_empty() || der_sig.len() > MAX_DER_SIG_LEN {
        return Err(CodecError::InvalidLength);
    }

    let v = c.read_u8()?;

    c.finish()?;

    Ok((der_sig.len(), der_sig, v))
}

/// Unpack a GET_VERSION response
///
/// Returns `(major, minor, patch)`.
pub fn unpack_get_version_response(buff: &[u8]) -> Result<(u8, u8, u8), CodecError> {
    let mut c = ByteCursor::new(buff);

    let [major, minor, patch] = c.read_array::<VERSION_LEN>()?;

    c.finish()?;

    Ok((major, minor, patch))
}

/// Unpack a GET_APP_NAME response
pub fn unpack_get_app_name_response(buff: &[u8]) -> Result<&str, CodecError> {
    core::str::from_utf8(buff).map_err(|_| CodecError::Utf8)
}
