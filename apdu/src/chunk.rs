// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Chunked signing requests
//!
//! Signing payloads may exceed a single APDU, so they are sent as a sequence
//! of frames sharing an instruction:
//!
//! | frame      | P1               | P2             | data       |
//! |------------|------------------|----------------|------------|
//! | path       | `0` (start)      | `0x80` (more)  | BIP32 path |
//! | chunk      | `1, 2, ...`      | `0x80` (more)  | payload    |
//! | last chunk | `n`              | `0x00` (last)  | payload    |
//!
//! The response to the last chunk is only returned once the user has
//! approved or rejected the request on the device.

use alloc::vec::Vec;

use crate::{
    frame::{header, CommandFrame},
    CodecError, MAX_APDU_DATA,
};

/// P1 for the first (path) frame of a request
pub const P1_START: u8 = 0x00;

/// P1 requesting on-device confirmation for key requests
pub const P1_CONFIRM: u8 = 0x01;

/// Maximum number of payload chunks, indices are a single byte
pub const MAX_CHUNKS: usize = u8::MAX as usize;

bitflags::bitflags! {
    /// P2 chunk flags
    pub struct ChunkFlags: u8 {
        /// More frames follow this one
        const MORE = 0x80;
    }
}

impl ChunkFlags {
    /// Flags for the final frame
    pub const LAST: ChunkFlags = ChunkFlags::empty();
}

/// Number of chunks required for a payload
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    match chunk_size {
        0 => 0,
        _ => (len + chunk_size - 1) / chunk_size,
    }
}

/// Payload chunk with its P1 index and P2 flags
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Chunk<'a> {
    pub index: u8,
    pub flags: ChunkFlags,
    pub data: &'a [u8],
}

/// Iterator over payload chunks, indexed from 1
#[derive(Clone, Debug)]
pub struct Chunks<'a> {
    inner: core::iter::Enumerate<core::slice::Chunks<'a, u8>>,
    count: usize,
}

impl<'a> Chunks<'a> {
    /// Split a payload into chunks of at most `chunk_size` bytes
    pub fn new(payload: &'a [u8], chunk_size: usize) -> Result<Self, CodecError> {
        if chunk_size == 0 || chunk_size > MAX_APDU_DATA {
            return Err(CodecError::Range);
        }

        let count = chunk_count(payload.len(), chunk_size);
        if count > MAX_CHUNKS {
            return Err(CodecError::Range);
        }

        Ok(Self {
            inner: payload.chunks(chunk_size).enumerate(),
            count,
        })
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (i, data) = self.inner.next()?;

        let flags = match i + 1 == self.count {
            true => ChunkFlags::LAST,
            false => ChunkFlags::MORE,
        };

        Some(Chunk {
            index: (i + 1) as u8,
            flags,
            data,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Build the full frame sequence for a chunked signing request
pub fn sign_frames<'a>(
    cla: u8,
    ins: u8,
    path: &'a [u8],
    payload: &'a [u8],
    chunk_size: usize,
) -> Result<Vec<CommandFrame<'a>>, CodecError> {
    if payload.is_empty() {
        return Err(CodecError::InvalidLength);
    }

    let chunks = Chunks::new(payload, chunk_size)?;
    let mut frames = Vec::with_capacity(1 + chunks.count);

    // Path frame
    frames.push(CommandFrame::new(
        header(cla, ins, P1_START, ChunkFlags::MORE.bits()),
        path,
    )?);

    // Payload frames
    for c in chunks {
        frames.push(CommandFrame::new(
            header(cla, ins, c.index, c.flags.bits()),
            c.data,
        )?);
    }

    Ok(frames)
}
