// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Signature verification for device responses

use p256::ecdsa::{signature::Verifier, Signature, VerifyingKey};

use ledger_ont_apdu::{prelude::PublicKeyResp, sign::SignResp, transaction::Transaction};

/// Check a DER encoded ECDSA (P-256, SHA-256) signature over `message`
///
/// Returns false for malformed keys or signatures.
pub fn check_signature_validity(public_key: &[u8], der_sig: &[u8], message: &[u8]) -> bool {
    let key = match VerifyingKey::from_sec1_bytes(public_key) {
        Ok(k) => k,
        Err(_) => return false,
    };

    let sig = match Signature::from_der(der_sig) {
        Ok(s) => s,
        Err(_) => return false,
    };

    key.verify(message, &sig).is_ok()
}

/// Check a transaction signature, signed over [`Transaction::hash`]
pub fn check_tx_signature(key: &PublicKeyResp, tx: &Transaction, resp: &SignResp) -> bool {
    check_signature_validity(&key.public_key, resp.signature(), &tx.hash())
}
