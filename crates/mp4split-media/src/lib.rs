//! mp4split-media: ISO-BMFF box decoding and fragmented MP4 splitting
//!
//! This crate turns a fragmented MP4 held in memory into an init segment
//! followed by media segments, optionally keeping only some tracks. Box
//! payloads are never rewritten: every emitted byte is a copy of the input.
//!
//! # Modules
//!
//! - `mp4` - Lazy box decoding over `Bytes`, moov track metadata
//! - `split` - Fragment classification, track filtering, segment emission
//! - `fmp4` - Synthesis of fragmented MP4 buffers for tests and benchmarks
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use mp4split_media::fmp4::{FileBuilder, TrackSpec};
//! use mp4split_media::split::{split_to_vec, SplitOptions};
//!
//! let data = FileBuilder::new()
//!     .track(TrackSpec::video(1))
//!     .fragment(&[1], b"frame")
//!     .build();
//!
//! let segments = split_to_vec(Bytes::from(data), &SplitOptions::new()).unwrap();
//! assert_eq!(segments.len(), 2);
//! ```

pub mod error;
pub mod fmp4;
pub mod mp4;
pub mod split;

pub use error::{Error, Result};
pub use mp4::{BoxReader, BoxType, MovieInfo, Mp4Box};
pub use split::{split, split_to_vec, Segment, SplitOptions, SplitSummary, TrackFilter};
