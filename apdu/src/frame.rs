// Copyright (c) 2022-2023 The MobileCoin Foundation

//! APDU command and response frames
//!
//! Commands are short APDUs, `CLA INS P1 P2 Lc DATA` with at most
//! [`MAX_APDU_DATA`] data bytes. Responses carry a payload followed by a
//! big-endian status word.

use alloc::vec::Vec;

use encdec::{Decode, Encode};

use crate::{
    status::{StatusCode, SW_OK},
    ApduHeader, CodecError, MAX_APDU_DATA,
};

/// Build a command header
pub const fn header(cla: u8, ins: u8, p1: u8, p2: u8) -> ApduHeader {
    ApduHeader { cla, ins, p1, p2 }
}

/// Command frame, borrowing its data
///
/// Fields are private so data always fits the single-byte `Lc`.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct CommandFrame<'a> {
    header: ApduHeader,
    data: &'a [u8],
}

impl<'a> CommandFrame<'a> {
    /// Create a new frame, data must fit a short APDU
    pub fn new(header: ApduHeader, data: &'a [u8]) -> Result<Self, CodecError> {
        if data.len() > MAX_APDU_DATA {
            return Err(CodecError::InvalidLength);
        }
        Ok(Self { header, data })
    }

    pub fn header(&self) -> &ApduHeader {
        &self.header
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    fn prefix(&self) -> [u8; 5] {
        let h = &self.header;
        [h.cla, h.ins, h.p1, h.p2, self.data.len() as u8]
    }

    /// Encode frame to a new buffer
    pub fn to_vec(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(5 + self.data.len());

        b.extend_from_slice(&self.prefix());
        b.extend_from_slice(self.data);

        b
    }
}

impl<'a> Encode for CommandFrame<'a> {
    type Error = CodecError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(5 + self.data.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let n = self.encode_len()?;
        if buff.len() < n {
            return Err(CodecError::InvalidLength);
        }

        buff[..5].copy_from_slice(&self.prefix());
        buff[5..n].copy_from_slice(self.data);

        Ok(n)
    }
}

impl<'a> Decode<'a> for CommandFrame<'a> {
    type Output = Self;
    type Error = CodecError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), CodecError> {
        if buff.len() < 5 {
            return Err(CodecError::underflow(5, buff.len()));
        }

        let header = header(buff[0], buff[1], buff[2], buff[3]);
        let lc = buff[4] as usize;

        let data = buff[5..]
            .get(..lc)
            .ok_or(CodecError::underflow(lc, buff.len() - 5))?;

        Ok((Self { header, data }, 5 + lc))
    }
}

/// Response frame, payload and status word
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ResponseFrame<'a> {
    pub data: &'a [u8],
    pub status: u16,
}

impl<'a> ResponseFrame<'a> {
    pub fn new(data: &'a [u8], status: u16) -> Self {
        Self { data, status }
    }

    /// Split a raw response into payload and status word
    pub fn parse(buff: &'a [u8]) -> Result<Self, CodecError> {
        let n = buff.len();
        if n < 2 {
            return Err(CodecError::underflow(2, n));
        }

        let status = u16::from_be_bytes([buff[n - 2], buff[n - 1]]);

        Ok(Self {
            data: &buff[..n - 2],
            status,
        })
    }

    pub fn is_ok(&self) -> bool {
        self.status == SW_OK
    }

    /// Known status code, if any
    pub fn status_code(&self) -> Option<StatusCode> {
        StatusCode::try_from(self.status).ok()
    }

    /// Encode frame to a new buffer
    pub fn to_vec(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(self.data.len() + 2);
        b.extend_from_slice(self.data);
        b.extend_from_slice(&self.status.to_be_bytes());
        b
    }
}
