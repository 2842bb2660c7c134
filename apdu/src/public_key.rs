// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Public key APDUs
//!
//! Keys are secp256r1 (P-256), derived on the device for the requested BIP32
//! path. With [`PublicKeyReq::confirm`] set the device displays the derived
//! address and only responds once the user approves.

use encdec::{DecodeOwned, Encode};

use super::{ApduError, ApduHeader, ApduReq, Instruction, ONT_APDU_CLA};
use crate::{
    chunk::{P1_CONFIRM, P1_START},
    frame::header,
    path::Bip32Path,
    unpack::{unpack_get_public_key_response, CHAIN_CODE_LEN, PUBLIC_KEY_LEN},
    varint::write_prefixed,
};

/// Public key request APDU
///
/// ## Encoding
///
/// Data is the packed BIP32 path, see [`crate::path`]. P1 is `0x00` for a
/// silent request or `0x01` to display and confirm the address. P1 is not
/// part of the data so decoded requests are always silent.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PublicKeyReq {
    pub path: Bip32Path,
    pub confirm: bool,
}

impl PublicKeyReq {
    pub fn new(path: Bip32Path, confirm: bool) -> Self {
        Self { path, confirm }
    }
}

/// Public key GET APDU is instruction `0x05`, P1 selects confirmation
impl<'a> ApduReq<'a> for PublicKeyReq {
    fn header(&self) -> ApduHeader {
        let p1 = match self.confirm {
            true => P1_CONFIRM,
            false => P1_START,
        };

        header(ONT_APDU_CLA, Instruction::GetPublicKey as u8, p1, 0x00)
    }
}

impl Encode for PublicKeyReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.path.encode_len()?)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(self.path.encode(buff)?)
    }
}

impl DecodeOwned for PublicKeyReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let (path, n) = Bip32Path::decode_owned(buff)?;
        Ok((Self::new(path, false), n))
    }
}

/// Public key response APDU
///
/// ## Encoding
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   KEY_LEN=65  |       PUBLIC_KEY (65 bytes, 0x04 || X || Y)   /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /               |  CC_LEN=32    |     CHAIN_CODE (32 bytes)     /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct PublicKeyResp {
    /// Uncompressed SEC1 public key
    pub public_key: [u8; PUBLIC_KEY_LEN],

    /// BIP32 chain code
    pub chain_code: [u8; CHAIN_CODE_LEN],
}

impl PublicKeyResp {
    pub fn new(public_key: [u8; PUBLIC_KEY_LEN], chain_code: [u8; CHAIN_CODE_LEN]) -> Self {
        Self {
            public_key,
            chain_code,
        }
    }
}

impl Encode for PublicKeyResp {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(2 + PUBLIC_KEY_LEN + CHAIN_CODE_LEN)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let mut index = 0;

        // Write public key
        index += write_prefixed(&self.public_key, &mut buff[index..])?;

        // Write chain code
        index += write_prefixed(&self.chain_code, &mut buff[index..])?;

        Ok(index)
    }
}

impl DecodeOwned for PublicKeyResp {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let (_, pk, _, cc) = unpack_get_public_key_response(buff)?;

        let mut public_key = [0u8; PUBLIC_KEY_LEN];
        public_key.copy_from_slice(pk);

        let mut chain_code = [0u8; CHAIN_CODE_LEN];
        chain_code.copy_from_slice(cc);

        Ok((Self::new(public_key, chain_code), buff.len()))
    }
}
