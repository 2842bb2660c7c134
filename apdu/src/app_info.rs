// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Application Information APDUs

use alloc::string::{String, ToString};
use core::fmt::Display;

use encdec::{DecodeOwned, Encode};

use super::{ApduError, ApduStatic, Instruction, ONT_APDU_CLA};
use crate::unpack::{unpack_get_app_name_response, unpack_get_version_response, VERSION_LEN};

/// Fetch application version APDU
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct VersionReq {}

impl ApduStatic for VersionReq {
    /// Application commands are class `0x80`
    const CLA: u8 = ONT_APDU_CLA;

    /// Version GET APDU is instruction `0x03`
    const INS: u8 = Instruction::GetVersion as u8;
}

/// Fetch application name APDU
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct AppNameReq {}

impl ApduStatic for AppNameReq {
    const CLA: u8 = ONT_APDU_CLA;

    /// App name GET APDU is instruction `0x04`
    const INS: u8 = Instruction::GetAppName as u8;
}

/// Implement empty request encoding
macro_rules! encdec_empty {
    ($t:ty) => {
        impl Encode for $t {
            type Error = ApduError;

            fn encode_len(&self) -> Result<usize, Self::Error> {
                Ok(0)
            }

            fn encode(&self, _buff: &mut [u8]) -> Result<usize, Self::Error> {
                Ok(0)
            }
        }

        impl DecodeOwned for $t {
            type Output = Self;

            type Error = ApduError;

            fn decode_owned(_buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
                Ok((Self {}, 0))
            }
        }
    };
}

encdec_empty!(VersionReq);
encdec_empty!(AppNameReq);

/// Application version response APDU
///
/// ## Encoding
///
/// ```text
///  0                   1                   2
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     MAJOR     |     MINOR     |     PATCH     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct VersionResp {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl VersionResp {
    pub fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Display for VersionResp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Encode for VersionResp {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(VERSION_LEN)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        if buff.len() < VERSION_LEN {
            return Err(ApduError::InvalidLength);
        }

        buff[..VERSION_LEN].copy_from_slice(&[self.major, self.minor, self.patch]);

        Ok(VERSION_LEN)
    }
}

impl DecodeOwned for VersionResp {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let (major, minor, patch) = unpack_get_version_response(buff)?;
        Ok((Self::new(major, minor, patch), VERSION_LEN))
    }
}

/// Application name response APDU, ASCII text filling the payload
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AppNameResp {
    pub name: String,
}

impl AppNameResp {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Encode for AppNameResp {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.name.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let b = self.name.as_bytes();
        if buff.len() < b.len() {
            return Err(ApduError::InvalidLength);
        }

        buff[..b.len()].copy_from_slice(b);

        Ok(b.len())
    }
}

impl DecodeOwned for AppNameResp {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let name = unpack_get_app_name_response(buff)?;
        Ok((Self::new(name), buff.len()))
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::{frame::header, test::encode_decode_apdu, ApduReq};

    #[test]
    fn version_req_apdu() {
        let apdu = VersionReq::default();

        let mut buff = [0u8; 128];
        encode_decode_apdu(&mut buff, &apdu);

        assert_eq!(ApduReq::header(&apdu), header(0x80, 0x03, 0x00, 0x00));
    }

    #[test]
    fn app_name_req_apdu() {
        let apdu = AppNameReq::default();

        let mut buff = [0u8; 128];
        encode_decode_apdu(&mut buff, &apdu);

        assert_eq!(ApduReq::header(&apdu), header(0x80, 0x04, 0x00, 0x00));
    }

    #[test]
    fn version_resp_apdu() {
        let apdu = VersionResp::new(1, 0, 3);

        let mut buff = [0u8; 128];
        let n = encode_decode_apdu(&mut buff, &apdu);

        assert_eq!(&buff[..n], &[1, 0, 3]);
        assert_eq!(apdu.to_string(), "1.0.3");
    }

    #[test]
    fn app_name_resp_apdu() {
        let apdu = AppNameResp::new("Ontology");

        let mut buff = [0u8; 128];
        encode_decode_apdu(&mut buff, &apdu);
    }
}
