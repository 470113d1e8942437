//! Segment accumulation and flushing.

use super::FragmentTrack;
use crate::Result;
use bytes::BytesMut;
use std::io;

/// One emitted segment.
///
/// `data` borrows the writer's buffer and is only valid for the duration
/// of the sink call.
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    /// Emission order, starting at 0.
    pub index: u32,
    /// Track of the moof that opened this segment; `None` for the first
    /// segment, which opens with the init boxes.
    pub track: Option<FragmentTrack>,
    /// Segment bytes.
    pub data: &'a [u8],
}

impl Segment<'_> {
    /// Whether this is the first segment, holding ftyp and moov.
    pub fn is_init(&self) -> bool {
        self.index == 0
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Accumulates box bytes into a single live buffer and hands it to a sink.
pub struct SegmentWriter<F> {
    buf: BytesMut,
    sink: F,
    index: u32,
    track: Option<FragmentTrack>,
    bytes_flushed: u64,
}

impl<F> SegmentWriter<F>
where
    F: FnMut(Segment<'_>) -> io::Result<()>,
{
    /// Create a writer with an open, empty buffer.
    pub fn new(sink: F) -> Self {
        Self {
            buf: BytesMut::with_capacity(64 * 1024),
            sink,
            index: 0,
            track: None,
            bytes_flushed: 0,
        }
    }

    /// Append verbatim bytes to the open buffer.
    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes accumulated since the last flush.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Total bytes handed to the sink so far.
    pub fn bytes_flushed(&self) -> u64 {
        self.bytes_flushed
    }

    /// Emit the open buffer and start a fresh one opened by `next_track`.
    pub fn flush_and_reset(&mut self, next_track: FragmentTrack) -> Result<()> {
        self.emit()?;
        self.buf.clear();
        self.index += 1;
        self.track = Some(next_track);
        Ok(())
    }

    /// Emit the open buffer as the final segment.
    ///
    /// Returns the number of segments emitted.
    pub fn finish(mut self) -> Result<u32> {
        self.emit()?;
        Ok(self.index + 1)
    }

    fn emit(&mut self) -> Result<()> {
        tracing::debug!(
            index = self.index,
            size = self.buf.len(),
            track = ?self.track,
            "flushing segment"
        );

        (self.sink)(Segment {
            index: self.index,
            track: self.track,
            data: &self.buf,
        })?;
        self.bytes_flushed += self.buf.len() as u64;
        Ok(())
    }
}
