//! Fragmented MP4 splitting.
//!
//! Walks the top-level boxes of a fragmented MP4 buffer and emits:
//! - the init content (ftyp + moov) at the head of the first segment
//! - one segment per boundary moof, copied verbatim
//!
//! A moof starts a new segment when no track filter is configured, or when
//! it belongs to the first configured track. Every box, the moof included,
//! is kept when the filter matches the track of the most recent moof. The
//! mfra index is never kept.

mod classify;
mod filter;
mod segmenter;
mod writer;

pub use classify::{classify, Classification, FragmentTrack, RESERVED_TRACK_ID};
pub use filter::{TrackFilter, MAX_TRACK_IDS};
pub use writer::{Segment, SegmentWriter};

use crate::mp4::MovieInfo;
use crate::Result;
use bytes::Bytes;
use segmenter::{InitBoxes, Segmenter};
use std::io;

/// Per-call split configuration.
#[derive(Debug, Clone, Default)]
pub struct SplitOptions {
    /// Tracks to keep; empty keeps everything.
    pub track_filter: TrackFilter,
    /// Fail on undecodable trailing data instead of stopping there.
    pub strict: bool,
}

impl SplitOptions {
    /// Options with no filtering.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a track to the filter.
    pub fn track_id(mut self, track_id: u32) -> Self {
        self.track_filter.insert(track_id);
        self
    }

    /// Set the track filter.
    pub fn track_filter(mut self, filter: TrackFilter) -> Self {
        self.track_filter = filter;
        self
    }

    /// Enable or disable strict trailing-data handling.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// How the box stream ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Termination {
    /// All bytes were consumed as whole boxes.
    #[default]
    EndOfStream,
    /// Decoding stopped at bytes that do not form a box.
    TrailingData { offset: u64, reason: String },
}

/// Statistics for one split.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitSummary {
    /// Segments handed to the sink, the init-bearing first one included.
    pub segments: u32,
    /// moof boxes seen after moov.
    pub fragments: u32,
    /// Top-level boxes after moov copied into a segment.
    pub boxes_written: u32,
    /// Top-level boxes after moov left out by the filter or as mfra.
    pub boxes_dropped: u32,
    /// Bytes handed to the sink, init boxes included.
    pub bytes_written: u64,
    /// trak boxes in the moov.
    pub tracks: usize,
    /// How the box stream ended.
    pub termination: Termination,
}

/// Split `data` into segments, handing each to `sink` in order.
///
/// The sink must copy or consume the slice before returning; the buffer
/// is reused for the next segment.
pub fn split<F>(data: Bytes, options: &SplitOptions, sink: F) -> Result<SplitSummary>
where
    F: FnMut(Segment<'_>) -> io::Result<()>,
{
    Segmenter::new(options).run(data, sink)
}

/// Split `data` and collect the segments.
pub fn split_to_vec(data: Bytes, options: &SplitOptions) -> Result<Vec<Bytes>> {
    let mut segments = Vec::new();
    split(data, options, |segment| {
        segments.push(Bytes::copy_from_slice(segment.data));
        Ok(())
    })?;
    Ok(segments)
}

/// Extract only the init segment: ftyp (if present) followed by moov.
pub fn init_segment(data: Bytes) -> Result<Bytes> {
    let (init, _) = InitBoxes::locate(data)?;
    Ok(init.to_bytes())
}

/// Parse the movie metadata of a fragmented MP4 buffer.
pub fn movie_info(data: Bytes) -> Result<MovieInfo> {
    let (init, _) = InitBoxes::locate(data)?;
    Ok(init.movie)
}
