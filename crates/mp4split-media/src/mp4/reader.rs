//! In-memory box reader.

use super::{BoxHeader, BoxType, Mp4Box};
use crate::{Error, Result};
use bytes::Bytes;

/// Sequential reader over the boxes of one nesting level.
///
/// The reader distinguishes a clean end of stream (`Ok(None)`) from a
/// box that cannot be decoded (`Err`). After an error the reader is fused
/// and yields nothing more.
#[derive(Debug, Clone)]
pub struct BoxReader {
    data: Bytes,
    pos: usize,
    base_offset: u64,
}

impl BoxReader {
    /// Create a reader over a top-level buffer.
    pub fn new(data: Bytes) -> Self {
        Self::with_base_offset(data, 0)
    }

    /// Create a reader whose reported offsets start at `base_offset`.
    pub fn with_base_offset(data: Bytes, base_offset: u64) -> Self {
        Self {
            data,
            pos: 0,
            base_offset,
        }
    }

    /// Absolute offset of the cursor.
    pub fn offset(&self) -> u64 {
        self.base_offset + self.pos as u64
    }

    /// Bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Decode the header at the cursor without consuming anything.
    ///
    /// The declared size is not checked against the remaining bytes.
    pub fn peek_header(&self) -> Result<Option<BoxHeader>> {
        if self.remaining() == 0 {
            return Ok(None);
        }
        parse_header(&self.data[self.pos..], self.offset()).map(Some)
    }

    /// Decode the next box and advance past it.
    pub fn next_box(&mut self) -> Result<Option<Mp4Box>> {
        let header = match self.peek_header() {
            Ok(Some(header)) => header,
            Ok(None) => return Ok(None),
            Err(e) => {
                self.pos = self.data.len();
                return Err(e);
            }
        };

        let offset = self.offset();
        let size = match usize::try_from(header.size) {
            Ok(size) if size <= self.remaining() => size,
            _ => {
                let have = self.remaining();
                self.pos = self.data.len();
                return Err(Error::BufferUnderflow {
                    offset,
                    need: usize::try_from(header.size).unwrap_or(usize::MAX),
                    have,
                });
            }
        };

        let data = self.data.slice(self.pos..self.pos + size);
        self.pos += size;

        tracing::trace!(
            box_type = %header.box_type,
            offset,
            size,
            "decoded box"
        );

        Ok(Some(Mp4Box::new(header, offset, data)))
    }
}

impl Iterator for BoxReader {
    type Item = Result<Mp4Box>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_box().transpose()
    }
}

/// Parse a box header from the start of `data`.
///
/// Handles 32-bit size, 64-bit extended size (`size == 1`),
/// and box-extends-to-end (`size == 0`).
pub fn parse_header(data: &[u8], offset: u64) -> Result<BoxHeader> {
    if data.len() < 8 {
        return Err(Error::BufferUnderflow {
            offset,
            need: 8,
            have: data.len(),
        });
    }

    let size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as u64;
    let box_type = BoxType::from_bytes([data[4], data[5], data[6], data[7]]);

    let (size, header_size) = match size {
        1 => {
            if data.len() < 16 {
                return Err(Error::BufferUnderflow {
                    offset,
                    need: 16,
                    have: data.len(),
                });
            }
            let ext = u64::from_be_bytes([
                data[8], data[9], data[10], data[11], data[12], data[13], data[14], data[15],
            ]);
            (ext, 16u8)
        }
        0 => (data.len() as u64, 8u8),
        _ => (size, 8u8),
    };

    if size < header_size as u64 {
        return Err(Error::invalid_mp4(
            offset,
            format!("box {} size {} is smaller than its header", box_type, size),
        ));
    }

    Ok(BoxHeader {
        box_type,
        size,
        header_size,
    })
}

/// Read the track ID from a tfhd box.
///
/// Returns `None` when the box is too short to hold one.
pub fn read_tfhd_track_id(tfhd: &Mp4Box) -> Option<u32> {
    let payload = tfhd.payload();
    // version(1) + flags(3) + track_ID(4)
    let bytes = payload.get(4..8)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
