//! MP4 box definitions.

use bytes::Bytes;

use super::BoxReader;

/// Four-character box type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxType(pub [u8; 4]);

impl BoxType {
    pub const FTYP: Self = Self(*b"ftyp");
    pub const STYP: Self = Self(*b"styp");
    pub const MOOV: Self = Self(*b"moov");
    pub const MVHD: Self = Self(*b"mvhd");
    pub const MVEX: Self = Self(*b"mvex");
    pub const TRAK: Self = Self(*b"trak");
    pub const TKHD: Self = Self(*b"tkhd");
    pub const MDIA: Self = Self(*b"mdia");
    pub const MDHD: Self = Self(*b"mdhd");
    pub const HDLR: Self = Self(*b"hdlr");
    pub const MOOF: Self = Self(*b"moof");
    pub const MFHD: Self = Self(*b"mfhd");
    pub const TRAF: Self = Self(*b"traf");
    pub const TFHD: Self = Self(*b"tfhd");
    pub const TFDT: Self = Self(*b"tfdt");
    pub const TRUN: Self = Self(*b"trun");
    pub const MDAT: Self = Self(*b"mdat");
    pub const MFRA: Self = Self(*b"mfra");
    pub const SIDX: Self = Self(*b"sidx");
    pub const FREE: Self = Self(*b"free");
    pub const SKIP: Self = Self(*b"skip");

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Get the 4-char code as a string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }

    /// Whether boxes of this type hold child boxes the splitter navigates.
    pub fn is_container(&self) -> bool {
        matches!(
            *self,
            Self::MOOV | Self::TRAK | Self::MDIA | Self::MVEX | Self::MOOF | Self::TRAF | Self::MFRA
        )
    }
}

impl std::fmt::Display for BoxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(feature = "serialize")]
impl serde::Serialize for BoxType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Parsed box header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    /// Box type code.
    pub box_type: BoxType,
    /// Box size including header.
    pub size: u64,
    /// Size of the header (8 or 16 bytes).
    pub header_size: u8,
}

impl BoxHeader {
    /// Get the payload size (size - header).
    pub fn data_size(&self) -> u64 {
        self.size.saturating_sub(self.header_size as u64)
    }
}

/// A decoded box backed by a zero-copy slice of the input buffer.
///
/// `data` covers the whole box, header included, so writing it out
/// reproduces the input bytes exactly.
#[derive(Debug, Clone)]
pub struct Mp4Box {
    /// Box type code.
    pub box_type: BoxType,
    /// Absolute offset of the box header in the top-level buffer.
    pub offset: u64,
    /// Size of the header (8 or 16 bytes).
    pub header_size: u8,
    data: Bytes,
}

impl Mp4Box {
    pub(crate) fn new(header: BoxHeader, offset: u64, data: Bytes) -> Self {
        Self {
            box_type: header.box_type,
            offset,
            header_size: header.header_size,
            data,
        }
    }

    /// Total box size including header.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// The exact original bytes of the box.
    pub fn as_bytes(&self) -> &Bytes {
        &self.data
    }

    /// The box payload, without its header.
    pub fn payload(&self) -> Bytes {
        self.data.slice(self.header_size as usize..)
    }

    /// Iterate the child boxes of a container.
    pub fn children(&self) -> BoxReader {
        BoxReader::with_base_offset(self.payload(), self.offset + self.header_size as u64)
    }

    /// Find the `index`-th child box of the given type.
    ///
    /// Iteration stops at the first undecodable child.
    pub fn child(&self, box_type: BoxType, index: usize) -> Option<Mp4Box> {
        self.children()
            .map_while(|child| child.ok())
            .filter(|child| child.box_type == box_type)
            .nth(index)
    }

    /// Find the first child box of the given type.
    pub fn first_child(&self, box_type: BoxType) -> Option<Mp4Box> {
        self.child(box_type, 0)
    }
}

/// Handler type for a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerType {
    Video,
    Audio,
    Hint,
    Meta,
    Text,
    Subtitle,
    Unknown([u8; 4]),
}

impl HandlerType {
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        match &bytes {
            b"vide" => Self::Video,
            b"soun" => Self::Audio,
            b"hint" => Self::Hint,
            b"meta" => Self::Meta,
            b"text" => Self::Text,
            b"subt" => Self::Subtitle,
            _ => Self::Unknown(bytes),
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video)
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, Self::Audio)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Hint => "hint",
            Self::Meta => "meta",
            Self::Text => "text",
            Self::Subtitle => "subtitle",
            Self::Unknown(bytes) => std::str::from_utf8(bytes).unwrap_or("????"),
        }
    }
}

impl std::fmt::Display for HandlerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "serialize")]
impl serde::Serialize for HandlerType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Track information extracted from a trak box.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct TrackInfo {
    /// Track ID.
    pub track_id: u32,
    /// Handler type (video/audio/etc).
    pub handler_type: HandlerType,
    /// Track duration in media timescale.
    pub duration: u64,
    /// Media timescale (units per second for this track).
    pub timescale: u32,
}

impl TrackInfo {
    /// Create empty track info.
    pub fn new(track_id: u32) -> Self {
        Self {
            track_id,
            handler_type: HandlerType::Unknown([0; 4]),
            duration: 0,
            timescale: 1,
        }
    }

    /// Get duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.timescale == 0 {
            0.0
        } else {
            self.duration as f64 / self.timescale as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_type_display() {
        assert_eq!(BoxType::MOOF.to_string(), "moof");
        assert_eq!(BoxType([0xff, 0, 0, 0]).as_str(), "????");
    }

    #[test]
    fn test_container_types() {
        assert!(BoxType::MOOF.is_container());
        assert!(BoxType::TRAF.is_container());
        assert!(!BoxType::MDAT.is_container());
        assert!(!BoxType::TFHD.is_container());
    }

    #[test]
    fn test_handler_type() {
        assert!(HandlerType::from_bytes(*b"vide").is_video());
        assert!(HandlerType::from_bytes(*b"soun").is_audio());
        assert_eq!(HandlerType::from_bytes(*b"abcd").as_str(), "abcd");
    }

    #[test]
    fn test_track_duration() {
        let mut track = TrackInfo::new(1);
        track.timescale = 1000;
        track.duration = 2500;
        assert!((track.duration_secs() - 2.5).abs() < 0.001);

        track.timescale = 0;
        assert_eq!(track.duration_secs(), 0.0);
    }
}
