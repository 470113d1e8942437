//! Error types for mp4split-media.

use crate::mp4::BoxType;
use std::io;
use thiserror::Error;

/// Result type for mp4split-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for mp4split-media operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The segment sink failed to consume a segment.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid MP4 box structure.
    #[error("Invalid MP4 at offset {offset}: {reason}")]
    InvalidMp4 { offset: u64, reason: String },

    /// Box header truncated by the end of the buffer.
    #[error("Buffer underflow at offset {offset}: need {need} bytes, have {have}")]
    BufferUnderflow { offset: u64, need: usize, have: usize },

    /// No parsable moov box in the input.
    #[error("No movie metadata (moov) found")]
    NoMovieMetadata,

    /// An ftyp or moov box could not be copied into the init segment.
    #[error("Failed to write {box_type} into the init segment: {reason}")]
    InitWrite { box_type: BoxType, reason: String },

    /// A traf box inside a moof has no usable tfhd.
    #[error("Malformed fragment at offset {offset}: traf #{traf_index} has no track fragment header")]
    MalformedFragment { offset: u64, traf_index: usize },
}

impl Error {
    /// Create an invalid MP4 error.
    pub fn invalid_mp4(offset: u64, reason: impl Into<String>) -> Self {
        Self::InvalidMp4 {
            offset,
            reason: reason.into(),
        }
    }

    /// Whether this error came from the box decoder rather than the splitter.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::InvalidMp4 { .. } | Self::BufferUnderflow { .. })
    }

    /// Integer status code for callers that speak the C-style taxonomy.
    ///
    /// Success is 0 and is never produced here.
    pub fn status_code(&self) -> i32 {
        match self {
            Self::NoMovieMetadata => 100,
            Self::InitWrite { box_type, .. } if *box_type == BoxType::FTYP => 101,
            Self::InitWrite { .. } => 102,
            Self::MalformedFragment { .. } => 103,
            Self::InvalidMp4 { .. } | Self::BufferUnderflow { .. } => 104,
            Self::Io(_) => 105,
        }
    }
}
