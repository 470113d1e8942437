//! Movie metadata extracted from a moov box.

use super::{BoxType, HandlerType, Mp4Box, TrackInfo};
use crate::{Error, Result};

/// Summary of the moov box: timing plus one entry per trak.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct MovieInfo {
    /// Duration in movie timescale units.
    pub duration: u64,
    /// Movie timescale (time units per second).
    pub timescale: u32,
    /// Tracks in moov order.
    pub tracks: Vec<TrackInfo>,
    /// Whether moov carries an mvex box, i.e. the movie is fragmented.
    pub fragmented: bool,
}

impl MovieInfo {
    /// Parse a moov box.
    pub fn parse(moov: &Mp4Box) -> Result<Self> {
        if moov.box_type != BoxType::MOOV {
            return Err(Error::invalid_mp4(
                moov.offset,
                format!("expected moov, found {}", moov.box_type),
            ));
        }

        let mut info = MovieInfo {
            duration: 0,
            timescale: 1000,
            tracks: Vec::new(),
            fragmented: false,
        };

        // Children are read up to the first one that does not decode.
        for child in moov.children().map_while(|child| child.ok()) {
            match child.box_type {
                BoxType::MVHD => parse_mvhd(&child.payload(), &mut info),
                BoxType::TRAK => info.tracks.push(parse_trak(&child)),
                BoxType::MVEX => info.fragmented = true,
                _ => {}
            }
        }

        Ok(info)
    }

    /// Get the duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.timescale == 0 {
            0.0
        } else {
            self.duration as f64 / self.timescale as f64
        }
    }

    /// Look up a track by ID.
    pub fn track(&self, track_id: u32) -> Option<&TrackInfo> {
        self.tracks.iter().find(|t| t.track_id == track_id)
    }

    /// First video track, if any.
    pub fn first_video_track(&self) -> Option<&TrackInfo> {
        self.tracks.iter().find(|t| t.handler_type.is_video())
    }

    /// First audio track, if any.
    pub fn first_audio_track(&self) -> Option<&TrackInfo> {
        self.tracks.iter().find(|t| t.handler_type.is_audio())
    }
}

fn be_u32(data: &[u8], at: usize) -> Option<u32> {
    let b = data.get(at..at + 4)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn be_u64(data: &[u8], at: usize) -> Option<u64> {
    let b = data.get(at..at + 8)?;
    Some(u64::from_be_bytes([
        b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
    ]))
}

/// Parse mvhd (movie header). Short boxes leave the defaults in place.
fn parse_mvhd(data: &[u8], info: &mut MovieInfo) {
    let Some(&version) = data.first() else {
        return;
    };

    let timing = if version == 0 {
        // 32-bit timestamps
        be_u32(data, 12).zip(be_u32(data, 16).map(u64::from))
    } else {
        // 64-bit timestamps
        be_u32(data, 20).zip(be_u64(data, 24))
    };

    if let Some((timescale, duration)) = timing {
        info.timescale = timescale;
        info.duration = duration;
    }
}

/// Parse trak (track) box.
fn parse_trak(trak: &Mp4Box) -> TrackInfo {
    let mut track = TrackInfo::new(0);

    for child in trak.children().map_while(|child| child.ok()) {
        match child.box_type {
            BoxType::TKHD => parse_tkhd(&child.payload(), &mut track),
            BoxType::MDIA => parse_mdia(&child, &mut track),
            _ => {}
        }
    }

    track
}

/// Parse tkhd (track header).
fn parse_tkhd(data: &[u8], track: &mut TrackInfo) {
    let Some(&version) = data.first() else {
        return;
    };

    let track_id = if version == 0 {
        be_u32(data, 12)
    } else {
        be_u32(data, 20)
    };

    if let Some(track_id) = track_id {
        track.track_id = track_id;
    }
}

/// Parse mdia (media) box.
fn parse_mdia(mdia: &Mp4Box, track: &mut TrackInfo) {
    for child in mdia.children().map_while(|child| child.ok()) {
        match child.box_type {
            BoxType::MDHD => parse_mdhd(&child.payload(), track),
            BoxType::HDLR => {
                let data = child.payload();
                if data.len() >= 12 {
                    track.handler_type =
                        HandlerType::from_bytes([data[8], data[9], data[10], data[11]]);
                }
            }
            _ => {}
        }
    }
}

/// Parse mdhd (media header).
fn parse_mdhd(data: &[u8], track: &mut TrackInfo) {
    let Some(&version) = data.first() else {
        return;
    };

    let timing = if version == 0 {
        be_u32(data, 12).zip(be_u32(data, 16).map(u64::from))
    } else {
        be_u32(data, 20).zip(be_u64(data, 24))
    };

    if let Some((timescale, duration)) = timing {
        track.timescale = timescale;
        track.duration = duration;
    }
}
