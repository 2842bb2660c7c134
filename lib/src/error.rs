// Copyright (c) 2022-2023 The MobileCoin Foundation

use ledger_ont_apdu::{
    message::PersonalMsgError,
    path::PathError,
    status::{StatusCode, SW_DENY},
    transaction::TransactionError,
    ApduError, CodecError,
};
use tokio::time::error::Elapsed;

/// Ledger Ontology API Error Type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport error
    #[error("Transport error: {0}")]
    Transport(#[from] ledger_lib::Error),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No device available
    #[error("No devices found")]
    NoDevice,

    /// Request timeout
    #[error("Timeout waiting for device response")]
    RequestTimeout,

    /// Timeout waiting for user
    #[error("Timeout waiting for user interaction")]
    UserTimeout,

    /// APDU object encode / decode error
    #[error("APDU error: {0:?}")]
    Apdu(ApduError),

    /// Frame or field codec error
    #[error("APDU codec error: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Message(#[from] PersonalMsgError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Device returned a non-OK status word
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// Empty signing payload
    #[error("Signing payload is empty")]
    EmptyPayload,

    /// Payload needs more chunks than P1 can index
    #[error("Payload requires {0} chunks (max 255)")]
    TooManyChunks(usize),

    /// Signing session ended without a response
    #[error("Signing session closed before the device responded")]
    SessionClosed,

    /// Invalid key in response
    #[error("Invalid key object")]
    InvalidKey,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Check whether the user rejected the request on the device
    pub fn is_denied(&self) -> bool {
        matches!(self, Error::Exchange(e) if e.is_denied())
    }
}

impl From<ApduError> for Error {
    fn from(e: ApduError) -> Self {
        Error::Apdu(e)
    }
}

impl From<Elapsed> for Error {
    fn from(_: Elapsed) -> Self {
        Error::RequestTimeout
    }
}

/// Non-OK response from the device
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
#[error("Device returned status 0x{status:04x} ({})", .name.as_deref().unwrap_or("UNKNOWN"))]
pub struct ExchangeError {
    /// Raw status word
    pub status: u16,

    /// Status name from the configured status table
    pub name: Option<String>,

    /// Response payload accompanying the status word
    pub data: Vec<u8>,
}

impl ExchangeError {
    /// User rejected the request (`0x6985`)
    pub fn is_denied(&self) -> bool {
        self.status == SW_DENY
    }

    /// Known status code, if any
    pub fn status_code(&self) -> Option<StatusCode> {
        StatusCode::try_from(self.status).ok()
    }
}
