// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Response status words

/// Success
pub const SW_OK: u16 = 0x9000;

/// User rejected the request on the device
pub const SW_DENY: u16 = 0x6985;

/// Status words returned by the Ontology app
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Debug,
    num_enum::TryFromPrimitive,
    strum::Display,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[repr(u16)]
pub enum StatusCode {
    #[strum(serialize = "OK")]
    Ok = 0x9000,

    #[strum(serialize = "DENY")]
    Deny = 0x6985,

    #[strum(serialize = "WRONG_P1P2")]
    WrongP1P2 = 0x6A86,

    #[strum(serialize = "WRONG_DATA_LENGTH")]
    WrongDataLength = 0x6A87,

    #[strum(serialize = "INS_NOT_SUPPORTED")]
    InsNotSupported = 0x6D00,

    #[strum(serialize = "CLA_NOT_SUPPORTED")]
    ClaNotSupported = 0x6E00,

    #[strum(serialize = "WRONG_RESPONSE_LENGTH")]
    WrongResponseLength = 0xB000,

    #[strum(serialize = "DISPLAY_BIP32_PATH_FAIL")]
    DisplayBip32PathFail = 0xB001,

    #[strum(serialize = "DISPLAY_ADDRESS_FAIL")]
    DisplayAddressFail = 0xB002,

    #[strum(serialize = "DISPLAY_AMOUNT_FAIL")]
    DisplayAmountFail = 0xB003,

    #[strum(serialize = "WRONG_TX_LENGTH")]
    WrongTxLength = 0xB004,

    #[strum(serialize = "TX_PARSING_FAIL")]
    TxParsingFail = 0xB005,

    #[strum(serialize = "TX_HASH_FAIL")]
    TxHashFail = 0xB006,

    #[strum(serialize = "BAD_STATE")]
    BadState = 0xB007,

    #[strum(serialize = "SIGNATURE_FAIL")]
    SignatureFail = 0xB008,
}

impl StatusCode {
    /// Name for a raw status word, if known
    pub fn name_of(status: u16) -> Option<&'static str> {
        StatusCode::try_from(status).ok().map(|s| s.into())
    }
}
