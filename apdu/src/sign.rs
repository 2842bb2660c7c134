// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Signature response APDU
//!
//! Returned by both SIGN_TX and SIGN_MESSAGE once the user approves the
//! request. Requests themselves are chunked, see [`crate::chunk`].

use encdec::{DecodeOwned, Encode};

use crate::{
    unpack::{unpack_sign_tx_response, MAX_DER_SIG_LEN},
    varint::{prefixed_len, write_prefixed},
    ApduError,
};

/// Signature response APDU
///
/// ## Encoding
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |    SIG_LEN    |            DER_SIGNATURE (<= 72 bytes)        /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /               |       V       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// `V` is the parity of the `R` point's y coordinate.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SignResp {
    signature: heapless::Vec<u8, MAX_DER_SIG_LEN>,
    pub v: u8,
}

impl SignResp {
    /// Create a new response from a DER signature
    pub fn new(der_sig: &[u8], v: u8) -> Result<Self, ApduError> {
        let signature = heapless::Vec::from_slice(der_sig).map_err(|_| ApduError::InvalidLength)?;
        Ok(Self { signature, v })
    }

    /// DER encoded ECDSA signature
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

impl Encode for SignResp {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(prefixed_len(&self.signature) + 1)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let n = self.encode_len()?;
        if buff.len() < n {
            return Err(ApduError::InvalidLength);
        }

        // Write signature
        let index = write_prefixed(&self.signature, buff)?;

        // Write parity
        buff[index] = self.v;

        Ok(index + 1)
    }
}

impl DecodeOwned for SignResp {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let (_, der_sig, v) = unpack_sign_tx_response(buff)?;
        Ok((Self::new(der_sig, v)?, buff.len()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::encode_decode_apdu;

    #[test]
    fn sign_resp_apdu() {
        let apdu = SignResp::new(&[0x30; 71], 1).unwrap();

        let mut buff = [0u8; 128];
        let n = encode_decode_apdu(&mut buff, &apdu);

        assert_eq!(n, 73);
        assert_eq!(buff[0], 71);
        assert_eq!(buff[72], 1);
    }

    #[test]
    fn signature_too_long() {
        assert!(matches!(
            SignResp::new(&[0x30; 73], 0),
            Err(ApduError::InvalidLength)
        ));
    }
}
