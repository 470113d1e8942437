//! ISO-BMFF box decoding.
//!
//! Boxes are decoded lazily from an in-memory buffer. Each decoded box keeps
//! a zero-copy slice of its original bytes so it can be written back out
//! verbatim.

mod atoms;
mod movie;
mod reader;

pub use atoms::{BoxHeader, BoxType, HandlerType, Mp4Box, TrackInfo};
pub use movie::MovieInfo;
pub use reader::{parse_header, read_tfhd_track_id, BoxReader};
