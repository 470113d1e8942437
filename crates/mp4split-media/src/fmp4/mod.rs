//! Fragmented MP4 (fMP4) synthesis.
//!
//! Builds small but structurally valid fragmented MP4 buffers:
//! - ftyp + moov (mvhd, trak/tkhd/mdia, mvex/trex)
//! - moof/mdat fragments with any number of traf boxes
//! - trailing housekeeping boxes such as mfra
//!
//! Used to drive the splitter from tests and benchmarks without shipping
//! media fixtures.

mod moof;

pub use moof::FragmentBuilder;

use bytes::{BufMut, BytesMut};

use crate::mp4::HandlerType;

/// Start a box with a placeholder size. Returns the box start for [`end_box`].
pub(crate) fn begin_box(buf: &mut BytesMut, box_type: &[u8; 4]) -> usize {
    let start = buf.len();
    buf.put_u32(0); // placeholder size
    buf.put_slice(box_type);
    start
}

/// Patch the size of the box started at `start`.
pub(crate) fn end_box(buf: &mut BytesMut, start: usize) {
    let size = (buf.len() - start) as u32;
    buf[start..start + 4].copy_from_slice(&size.to_be_bytes());
}

/// Serialize a leaf box with the given payload.
pub fn leaf_box(box_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(payload.len() + 8);
    let start = begin_box(&mut buf, box_type);
    buf.put_slice(payload);
    end_box(&mut buf, start);
    buf.to_vec()
}

/// Serialize an mdat box holding `payload`.
pub fn mdat(payload: &[u8]) -> Vec<u8> {
    leaf_box(b"mdat", payload)
}

/// Serialize an mfra box with an mfro trailer.
pub fn mfra() -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(24);
    let start = begin_box(&mut buf, b"mfra");
    // mfro: version/flags + size of the enclosing mfra
    buf.put_u32(16);
    buf.put_slice(b"mfro");
    buf.put_u32(0);
    buf.put_u32(24);
    end_box(&mut buf, start);
    buf.to_vec()
}

/// Description of one trak in the synthesized moov.
#[derive(Debug, Clone)]
pub struct TrackSpec {
    track_id: u32,
    handler: [u8; 4],
    timescale: u32,
}

impl TrackSpec {
    /// A video track.
    pub fn video(track_id: u32) -> Self {
        Self {
            track_id,
            handler: *b"vide",
            timescale: 90000,
        }
    }

    /// An audio track.
    pub fn audio(track_id: u32) -> Self {
        Self {
            track_id,
            handler: *b"soun",
            timescale: 48000,
        }
    }

    /// Set the media timescale.
    pub fn timescale(mut self, timescale: u32) -> Self {
        self.timescale = timescale;
        self
    }

    /// Handler type of this track.
    pub fn handler_type(&self) -> HandlerType {
        HandlerType::from_bytes(self.handler)
    }
}

/// Builder for a whole fragmented MP4 buffer.
pub struct FileBuilder {
    timescale: u32,
    duration: u64,
    with_ftyp: bool,
    tracks: Vec<TrackSpec>,
    before_moov: BytesMut,
    body: BytesMut,
    sequence_number: u32,
}

impl FileBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            timescale: 1000,
            duration: 0,
            with_ftyp: true,
            tracks: Vec::new(),
            before_moov: BytesMut::new(),
            body: BytesMut::new(),
            sequence_number: 1,
        }
    }

    /// Set the movie timescale.
    pub fn timescale(mut self, ts: u32) -> Self {
        self.timescale = ts;
        self
    }

    /// Set the movie duration.
    pub fn duration(mut self, d: u64) -> Self {
        self.duration = d;
        self
    }

    /// Add a trak to the moov.
    pub fn track(mut self, track: TrackSpec) -> Self {
        self.tracks.push(track);
        self
    }

    /// Omit the ftyp box.
    pub fn without_ftyp(mut self) -> Self {
        self.with_ftyp = false;
        self
    }

    /// Insert a box between ftyp and moov.
    pub fn before_moov(mut self, box_type: &[u8; 4], payload: &[u8]) -> Self {
        self.before_moov.put_slice(&leaf_box(box_type, payload));
        self
    }

    /// Append a moof covering `track_ids` (one traf each) and an mdat.
    pub fn fragment(mut self, track_ids: &[u32], payload: &[u8]) -> Self {
        let mut moof = FragmentBuilder::new(self.sequence_number);
        for &track_id in track_ids {
            moof = moof.traf(track_id);
        }
        self.sequence_number += 1;
        self.body.put_slice(&moof.build());
        self.body.put_slice(&mdat(payload));
        self
    }

    /// Append a prebuilt moof.
    pub fn moof(mut self, moof: FragmentBuilder) -> Self {
        self.sequence_number += 1;
        self.body.put_slice(&moof.build());
        self
    }

    /// Append an arbitrary top-level box.
    pub fn top_level_box(mut self, box_type: &[u8; 4], payload: &[u8]) -> Self {
        self.body.put_slice(&leaf_box(box_type, payload));
        self
    }

    /// Append an mfra box.
    pub fn mfra(mut self) -> Self {
        self.body.put_slice(&mfra());
        self
    }

    /// Append raw bytes, e.g. trailing garbage.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.body.put_slice(bytes);
        self
    }

    /// The ftyp and moov boxes alone.
    pub fn init_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(1024);
        if self.with_ftyp {
            self.write_ftyp(&mut buf);
        }
        self.write_moov(&mut buf);
        buf.to_vec()
    }

    /// Build the whole buffer.
    pub fn build(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(1024 + self.body.len());
        if self.with_ftyp {
            self.write_ftyp(&mut buf);
        }
        buf.put_slice(&self.before_moov);
        self.write_moov(&mut buf);
        buf.put_slice(&self.body);
        buf.to_vec()
    }

    fn write_ftyp(&self, buf: &mut BytesMut) {
        // ftyp: iso6, dash, msdh
        let brands = [b"iso6", b"dash", b"msdh"];
        let start = begin_box(buf, b"ftyp");
        buf.put_slice(b"iso6"); // major brand
        buf.put_u32(0); // minor version
        for brand in &brands {
            buf.put_slice(*brand);
        }
        end_box(buf, start);
    }

    fn write_moov(&self, buf: &mut BytesMut) {
        let start = begin_box(buf, b"moov");

        self.write_mvhd(buf);
        for track in &self.tracks {
            self.write_trak(buf, track);
        }
        self.write_mvex(buf);

        end_box(buf, start);
    }

    fn write_mvhd(&self, buf: &mut BytesMut) {
        let start = begin_box(buf, b"mvhd");
        buf.put_u8(1); // version 1
        buf.put_slice(&[0, 0, 0]); // flags
        buf.put_u64(0); // creation time
        buf.put_u64(0); // modification time
        buf.put_u32(self.timescale);
        buf.put_u64(self.duration);
        buf.put_u32(0x00010000); // rate = 1.0
        buf.put_u16(0x0100); // volume = 1.0
        buf.put_u16(0); // reserved
        buf.put_u64(0); // reserved
        put_identity_matrix(buf);
        // Pre-defined (6 * 4 bytes)
        for _ in 0..6 {
            buf.put_u32(0);
        }
        let next_track_id = self.tracks.iter().map(|t| t.track_id).max().unwrap_or(0) + 1;
        buf.put_u32(next_track_id);
        end_box(buf, start);
    }

    fn write_trak(&self, buf: &mut BytesMut, track: &TrackSpec) {
        let start = begin_box(buf, b"trak");
        self.write_tkhd(buf, track);

        let mdia = begin_box(buf, b"mdia");
        self.write_mdhd(buf, track.timescale);
        write_hdlr(buf, &track.handler);
        end_box(buf, mdia);

        end_box(buf, start);
    }

    fn write_tkhd(&self, buf: &mut BytesMut, track: &TrackSpec) {
        let start = begin_box(buf, b"tkhd");
        buf.put_u8(1); // version 1
        buf.put_slice(&[0, 0, 7]); // flags: enabled, in_movie, in_preview
        buf.put_u64(0); // creation time
        buf.put_u64(0); // modification time
        buf.put_u32(track.track_id);
        buf.put_u32(0); // reserved
        buf.put_u64(self.duration);
        buf.put_u64(0); // reserved
        buf.put_u16(0); // layer
        buf.put_u16(0); // alternate group
        buf.put_u16(if track.handler_type().is_audio() { 0x0100 } else { 0 });
        buf.put_u16(0); // reserved
        put_identity_matrix(buf);
        buf.put_u32(0); // width
        buf.put_u32(0); // height
        end_box(buf, start);
    }

    fn write_mdhd(&self, buf: &mut BytesMut, timescale: u32) {
        let start = begin_box(buf, b"mdhd");
        buf.put_u8(1); // version 1
        buf.put_slice(&[0, 0, 0]); // flags
        buf.put_u64(0); // creation time
        buf.put_u64(0); // modification time
        buf.put_u32(timescale);
        buf.put_u64(0); // duration lives in the fragments
        buf.put_u16(0x55C4); // language: und
        buf.put_u16(0); // pre_defined
        end_box(buf, start);
    }

    fn write_mvex(&self, buf: &mut BytesMut) {
        let start = begin_box(buf, b"mvex");
        for track in &self.tracks {
            buf.put_u32(32);
            buf.put_slice(b"trex");
            buf.put_u32(0); // version/flags
            buf.put_u32(track.track_id);
            buf.put_u32(1); // default sample description index
            buf.put_u32(0); // default sample duration
            buf.put_u32(0); // default sample size
            buf.put_u32(0); // default sample flags
        }
        end_box(buf, start);
    }
}

impl Default for FileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn put_identity_matrix(buf: &mut BytesMut) {
    for value in [0x00010000, 0, 0, 0, 0x00010000, 0, 0, 0, 0x40000000u32] {
        buf.put_u32(value);
    }
}

fn write_hdlr(buf: &mut BytesMut, handler: &[u8; 4]) {
    let start = begin_box(buf, b"hdlr");
    buf.put_u32(0); // version/flags
    buf.put_u32(0); // pre_defined
    buf.put_slice(handler);
    buf.put_u32(0); // reserved
    buf.put_u32(0);
    buf.put_u32(0);
    buf.put_u8(0); // empty name
    end_box(buf, start);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp4::{BoxReader, BoxType};
    use bytes::Bytes;

    fn top_level_types(data: Vec<u8>) -> Vec<BoxType> {
        BoxReader::new(Bytes::from(data))
            .map(|b| b.unwrap().box_type)
            .collect()
    }

    #[test]
    fn test_file_layout() {
        let data = FileBuilder::new()
            .track(TrackSpec::video(1))
            .before_moov(b"free", &[0; 4])
            .fragment(&[1], &[1, 2, 3])
            .mfra()
            .build();

        assert_eq!(
            top_level_types(data),
            vec![
                BoxType::FTYP,
                BoxType::FREE,
                BoxType::MOOV,
                BoxType::MOOF,
                BoxType::MDAT,
                BoxType::MFRA
            ]
        );
    }

    #[test]
    fn test_init_bytes_prefix() {
        let builder = FileBuilder::new().track(TrackSpec::audio(2)).fragment(&[2], &[0]);
        let init = builder.init_bytes();
        assert!(builder.build().starts_with(&init));
        assert_eq!(&init[4..8], b"ftyp");
    }

    #[test]
    fn test_without_ftyp() {
        let data = FileBuilder::new().without_ftyp().build();
        assert_eq!(top_level_types(data), vec![BoxType::MOOV]);
    }

    #[test]
    fn test_mfra_size() {
        let data = mfra();
        assert_eq!(data.len(), 24);
        assert_eq!(&data[0..4], &24u32.to_be_bytes());
    }
}
