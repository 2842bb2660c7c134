// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Ontology transactions
//!
//! Transactions are opaque to the signing protocol: they are constructed from
//! raw (or hex encoded) bytes, transmitted unchanged in chunks, and signed by
//! the device over [`Transaction::hash`].
//!
//! The fixed header may be inspected with [`Transaction::header`].
//!
//! ## Layout
//!
//! ```text
//! | header   | payload size | payload  | 0x00   |
//! | 42 bytes | 1..9 bytes   | variable | 1 byte |
//!
//! | version | tx_type | nonce    | gas_price | gas_limit | payer    |
//! | 1 byte  | 1 byte  | u32 (LE) | u64 (LE)  | u64 (LE)  | 20 bytes |
//! ```

use alloc::vec::Vec;

use encdec::{DecodeOwned, Encode};
use sha2::{Digest, Sha256};

use crate::{cursor::ByteCursor, CodecError};

/// Maximum transaction length for Nano S / S+ / X
pub const MAX_TRANSACTION_LEN: usize = 1024 * 4;

/// Maximum transaction length for Stax / Flex
pub const MAX_TRANSACTION_LEN_LARGE: usize = 1024 * 6 + 700;

/// Minimum accepted gas price
pub const GAS_PRICE_MIN: u64 = 2500;

/// Minimum accepted gas limit
pub const GAS_LIMIT_MIN: u64 = 20_000;

/// Total supply of ONT / ONG, bounds `gas_price * gas_limit`
pub const TOKEN_AMOUNT: u64 = 1_000_000_000_000_000_000;

/// Script hash (address) length
pub const SCRIPT_HASH_LEN: usize = 20;

/// Fixed header length
pub const TX_HEADER_LEN: usize = 42;

// Trailing bytes of native / neovm contract invocations
const NATIVE_TAIL_LEN: usize = 47;
const NEOVM_TAIL_LEN: usize = 22;
const OPCODE_APPCALL: u8 = 0x67;
const NATIVE_INVOKE: &[u8] = b"\x00\x68\x16Ontology.Native.Invoke\x00";

/// Transaction errors
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
pub enum TransactionError {
    #[cfg_attr(feature = "thiserror", error("empty transaction"))]
    Empty,

    #[cfg_attr(feature = "thiserror", error("transaction length {0} exceeds limit {1}"))]
    TooLong(usize, usize),

    #[cfg_attr(feature = "thiserror", error("invalid hex encoding"))]
    Hex,

    #[cfg_attr(feature = "thiserror", error("unsupported transaction version {0}"))]
    Version(u8),

    #[cfg_attr(feature = "thiserror", error("unsupported transaction type 0x{0:02x}"))]
    TxType(u8),

    #[cfg_attr(feature = "thiserror", error("gas price {0} below minimum"))]
    GasPrice(u64),

    #[cfg_attr(feature = "thiserror", error("gas limit {0} out of range"))]
    GasLimit(u64),

    #[cfg_attr(feature = "thiserror", error("payload size does not match transaction length"))]
    PayloadLength,

    #[cfg_attr(feature = "thiserror", error("malformed contract invocation"))]
    Contract,

    #[cfg_attr(feature = "thiserror", error("transaction codec error: {0}"))]
    Codec(CodecError),
}

impl From<CodecError> for TransactionError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

/// Transaction type byte
#[derive(Copy, Clone, PartialEq, Eq, Debug, num_enum::TryFromPrimitive, strum::Display)]
#[repr(u8)]
pub enum TxType {
    /// Native or NeoVM contract invocation
    Invoke = 0xd1,
    /// WasmVM contract invocation
    InvokeWasm = 0xd2,
}

/// Contract runtime targeted by a transaction
#[derive(Copy, Clone, PartialEq, Eq, Debug, strum::Display)]
pub enum ContractKind {
    Native,
    NeoVm,
    WasmVm,
}

/// Decoded transaction header
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TxHeader {
    pub version: u8,
    pub tx_type: TxType,
    pub nonce: u32,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub payer: [u8; SCRIPT_HASH_LEN],
    pub payload_len: u64,
}

impl TxHeader {
    /// Decode and check a header, leaving the cursor at the start of the payload
    pub fn from_cursor(c: &mut ByteCursor) -> Result<Self, TransactionError> {
        let version = c.read_u8()?;
        if version != 0 {
            return Err(TransactionError::Version(version));
        }

        let t = c.read_u8()?;
        let tx_type = TxType::try_from(t).map_err(|_| TransactionError::TxType(t))?;

        let nonce = c.read_u32_le()?;

        let gas_price = c.read_u64_le()?;
        if gas_price < GAS_PRICE_MIN {
            return Err(TransactionError::GasPrice(gas_price));
        }

        let gas_limit = c.read_u64_le()?;
        if gas_limit < GAS_LIMIT_MIN || gas_limit > TOKEN_AMOUNT / gas_price {
            return Err(TransactionError::GasLimit(gas_limit));
        }

        let payer = c.read_array()?;

        let payload_len = read_compact_size(c)?;
        if payload_len == 0 {
            return Err(TransactionError::PayloadLength);
        }

        Ok(Self {
            version,
            tx_type,
            nonce,
            gas_price,
            gas_limit,
            payer,
            payload_len,
        })
    }
}

/// Invoked contract, located from the fixed payload tail
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Contract {
    pub kind: ContractKind,
    pub address: [u8; SCRIPT_HASH_LEN],
}

/// Read an Ontology compact-size integer (`0xfd` / `0xfe` / `0xff` markers)
pub fn read_compact_size(c: &mut ByteCursor) -> Result<u64, CodecError> {
    let v = match c.read_u8()? {
        0xfd => c.read_u16_le()? as u64,
        0xfe => c.read_u32_le()? as u64,
        0xff => c.read_u64_le()?,
        n => n as u64,
    };
    Ok(v)
}

/// Signable Ontology transaction
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Transaction {
    raw: Vec<u8>,
}

impl Transaction {
    /// Create a transaction from raw bytes
    pub fn new(raw: Vec<u8>) -> Result<Self, TransactionError> {
        if raw.is_empty() {
            return Err(TransactionError::Empty);
        }
        Ok(Self { raw })
    }

    /// Create a transaction from a hex string
    pub fn from_hex(s: &str) -> Result<Self, TransactionError> {
        let raw = hex::decode(s.trim()).map_err(|_| TransactionError::Hex)?;
        Self::new(raw)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Always false, empty transactions are rejected on construction
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Serialize to wire form (the raw bytes)
    pub fn serialize(&self) -> Vec<u8> {
        self.raw.clone()
    }

    /// Decode a transaction from the remainder of the cursor
    pub fn from_cursor(c: &mut ByteCursor) -> Result<Self, TransactionError> {
        Self::new(c.read_rest().to_vec())
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self, TransactionError> {
        let mut c = ByteCursor::new(b);
        let t = Self::from_cursor(&mut c)?;
        c.finish()?;
        Ok(t)
    }

    /// Check the transaction fits the device buffer
    pub fn check_len(&self, max: usize) -> Result<(), TransactionError> {
        match self.raw.len() > max {
            true => Err(TransactionError::TooLong(self.raw.len(), max)),
            false => Ok(()),
        }
    }

    /// Digest signed by the device, `SHA256(SHA256(tx))`
    pub fn hash(&self) -> [u8; 32] {
        let h = Sha256::digest(Sha256::digest(&self.raw));
        h.into()
    }

    /// Decode the fixed header and check the payload size matches the transaction length
    pub fn header(&self) -> Result<TxHeader, TransactionError> {
        let mut c = ByteCursor::new(&self.raw);
        let h = TxHeader::from_cursor(&mut c)?;

        // Payload plus trailing 0x00 must fill the rest of the buffer
        let expected = h.payload_len.checked_add(1);
        if expected != Some(c.remaining() as u64) {
            return Err(TransactionError::PayloadLength);
        }

        Ok(h)
    }

    /// Locate the invoked contract
    pub fn contract(&self) -> Result<Contract, TransactionError> {
        let h = self.header()?;
        let raw = &self.raw[..];
        let n = raw.len();

        match h.tx_type {
            TxType::Invoke if n >= TX_HEADER_LEN + NATIVE_TAIL_LEN
                && raw[n - 1 - SCRIPT_HASH_LEN - 1] != OPCODE_APPCALL =>
            {
                // <0x14> <address> 00 68 <len> Ontology.Native.Invoke 00
                let mut c = ByteCursor::new(&raw[n - NATIVE_TAIL_LEN..]);
                if c.read_u8()? as usize != SCRIPT_HASH_LEN {
                    return Err(TransactionError::Contract);
                }
                let address = c.read_array()?;
                if c.read_rest() != NATIVE_INVOKE {
                    return Err(TransactionError::Contract);
                }

                Ok(Contract {
                    kind: ContractKind::Native,
                    address,
                })
            }
            TxType::Invoke if n >= TX_HEADER_LEN + NEOVM_TAIL_LEN => {
                // 67 <address> 00
                let mut c = ByteCursor::new(&raw[n - NEOVM_TAIL_LEN..]);
                if c.read_u8()? != OPCODE_APPCALL {
                    return Err(TransactionError::Contract);
                }
                let address = c.read_array()?;
                if c.read_u8()? != 0x00 {
                    return Err(TransactionError::Contract);
                }

                Ok(Contract {
                    kind: ContractKind::NeoVm,
                    address,
                })
            }
            TxType::Invoke => Err(TransactionError::Contract),
            TxType::InvokeWasm => {
                // Contract address leads the payload
                let mut c = ByteCursor::new(raw);
                TxHeader::from_cursor(&mut c)?;
                let address = c.read_array()?;

                Ok(Contract {
                    kind: ContractKind::WasmVm,
                    address,
                })
            }
        }
    }
}

impl Encode for Transaction {
    type Error = CodecError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.raw.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let n = self.raw.len();
        if buff.len() < n {
            return Err(CodecError::underflow(n, buff.len()));
        }

        buff[..n].copy_from_slice(&self.raw);

        Ok(n)
    }
}

impl DecodeOwned for Transaction {
    type Output = Self;

    type Error = CodecError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let t = Self::new(buff.to_vec()).map_err(|_| CodecError::InvalidLength)?;
        Ok((t, buff.len()))
    }
}
