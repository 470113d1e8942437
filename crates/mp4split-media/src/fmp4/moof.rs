//! Movie fragment (moof) box builder.

use super::{begin_box, end_box};
use bytes::{BufMut, BytesMut};

#[derive(Debug, Clone, Copy)]
enum Traf {
    Track(u32),
    MissingHeader,
    ShortHeader,
}

/// Builder for moof boxes with one traf per requested track.
#[derive(Debug, Clone)]
pub struct FragmentBuilder {
    sequence_number: u32,
    base_media_decode_time: u64,
    trafs: Vec<Traf>,
}

impl FragmentBuilder {
    /// Create a new moof builder.
    pub fn new(sequence_number: u32) -> Self {
        Self {
            sequence_number,
            base_media_decode_time: 0,
            trafs: Vec::new(),
        }
    }

    /// Set base media decode time written to every tfdt.
    pub fn base_media_decode_time(mut self, time: u64) -> Self {
        self.base_media_decode_time = time;
        self
    }

    /// Add a traf for `track_id`.
    pub fn traf(mut self, track_id: u32) -> Self {
        self.trafs.push(Traf::Track(track_id));
        self
    }

    /// Add a traf that has no tfhd.
    pub fn traf_without_tfhd(mut self) -> Self {
        self.trafs.push(Traf::MissingHeader);
        self
    }

    /// Add a traf whose tfhd stops before the track ID.
    pub fn traf_with_short_tfhd(mut self) -> Self {
        self.trafs.push(Traf::ShortHeader);
        self
    }

    /// Build the moof box.
    pub fn build(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(64 + self.trafs.len() * 64);
        let moof_start = begin_box(&mut buf, b"moof");

        self.write_mfhd(&mut buf);
        for traf in &self.trafs {
            self.write_traf(&mut buf, *traf);
        }

        end_box(&mut buf, moof_start);
        buf.to_vec()
    }

    fn write_mfhd(&self, buf: &mut BytesMut) {
        buf.put_u32(16);
        buf.put_slice(b"mfhd");
        buf.put_u32(0); // version/flags
        buf.put_u32(self.sequence_number);
    }

    fn write_traf(&self, buf: &mut BytesMut, traf: Traf) {
        let traf_start = begin_box(buf, b"traf");

        match traf {
            Traf::Track(track_id) => {
                // Flags: default-base-is-moof (0x020000)
                buf.put_u32(16);
                buf.put_slice(b"tfhd");
                buf.put_u32(0x020000); // version 0, flags
                buf.put_u32(track_id);
            }
            Traf::ShortHeader => {
                buf.put_u32(12);
                buf.put_slice(b"tfhd");
                buf.put_u32(0x020000);
            }
            Traf::MissingHeader => {}
        }

        // tfdt, version 1 for 64-bit decode time
        buf.put_u32(20);
        buf.put_slice(b"tfdt");
        buf.put_u32(0x01000000);
        buf.put_u64(self.base_media_decode_time);

        // trun with no samples
        buf.put_u32(16);
        buf.put_slice(b"trun");
        buf.put_u32(0); // version/flags
        buf.put_u32(0); // sample count

        end_box(buf, traf_start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp4::{read_tfhd_track_id, BoxReader, BoxType};
    use bytes::Bytes;

    #[test]
    fn test_moof_builder() {
        let data = FragmentBuilder::new(7).traf(1).traf(2).build();
        assert_eq!(&data[4..8], b"moof");

        let moof = BoxReader::new(Bytes::from(data)).next_box().unwrap().unwrap();
        let ids: Vec<Option<u32>> = (0..2)
            .map(|i| {
                let traf = moof.child(BoxType::TRAF, i).unwrap();
                read_tfhd_track_id(&traf.first_child(BoxType::TFHD).unwrap())
            })
            .collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_traf_without_tfhd() {
        let data = FragmentBuilder::new(1).traf_without_tfhd().build();
        let moof = BoxReader::new(Bytes::from(data)).next_box().unwrap().unwrap();
        let traf = moof.first_child(BoxType::TRAF).unwrap();
        assert!(traf.first_child(BoxType::TFHD).is_none());
        assert!(traf.first_child(BoxType::TRUN).is_some());
    }
}
