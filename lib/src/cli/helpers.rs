// Copyright (c) 2022-2023 The MobileCoin Foundation

use serde::Serialize;

use ledger_ont::apdu::transaction::{Transaction, TransactionError};

/// Hex encoded transaction argument
#[derive(Clone, PartialEq, Debug)]
pub struct TxHex(pub Transaction);

impl std::str::FromStr for TxHex {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);

        Transaction::from_hex(s).map(TxHex)
    }
}

impl AsRef<Transaction> for TxHex {
    fn as_ref(&self) -> &Transaction {
        &self.0
    }
}

/// Public key output
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct KeyOutput {
    pub path: String,
    pub public_key: String,
    pub chain_code: String,
    pub address: String,
}

/// Signature output
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct SignOutput {
    pub path: String,
    pub public_key: String,
    pub signature: String,
    pub v: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}
