//! Fragment classification: which track a moof belongs to.

use crate::mp4::{read_tfhd_track_id, BoxType, Mp4Box};
use crate::{Error, Result};

/// Track ID reserved by ISO/IEC 14496-12; no real track uses it.
///
/// Ambiguous fragments are filtered as if they carried this ID.
pub const RESERVED_TRACK_ID: u32 = 0;

/// Track ownership of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentTrack {
    /// The fragment holds exactly one traf for this track.
    Track(u32),
    /// The fragment holds zero or several trafs.
    Ambiguous,
}

impl FragmentTrack {
    /// The owning track ID, if there is exactly one.
    pub fn track_id(&self) -> Option<u32> {
        match self {
            Self::Track(id) => Some(*id),
            Self::Ambiguous => None,
        }
    }

    /// The ID used when comparing against a track filter.
    pub(crate) fn filter_id(&self) -> u32 {
        self.track_id().unwrap_or(RESERVED_TRACK_ID)
    }
}

impl std::fmt::Display for FragmentTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Track(id) => write!(f, "track {}", id),
            Self::Ambiguous => f.write_str("ambiguous"),
        }
    }
}

/// Result of classifying one moof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Resolved owner of the fragment.
    pub track: FragmentTrack,
    /// Number of traf boxes in the moof.
    pub traf_count: usize,
}

/// Resolve the owning track of a moof from its traf/tfhd children.
///
/// Every traf must carry a tfhd with a track ID, otherwise the fragment is
/// malformed. A moof with a single traf belongs to that track; any other
/// count is ambiguous.
pub fn classify(moof: &Mp4Box) -> Result<Classification> {
    let mut traf_count = 0;
    let mut last_track_id = None;

    let trafs = moof
        .children()
        .map_while(|child| child.ok())
        .filter(|child| child.box_type == BoxType::TRAF);

    for (traf_index, traf) in trafs.enumerate() {
        let track_id = traf
            .first_child(BoxType::TFHD)
            .as_ref()
            .and_then(read_tfhd_track_id)
            .ok_or(Error::MalformedFragment {
                offset: moof.offset,
                traf_index,
            })?;

        last_track_id = Some(track_id);
        traf_count += 1;
    }

    let track = match (traf_count, last_track_id) {
        (1, Some(track_id)) => FragmentTrack::Track(track_id),
        _ => FragmentTrack::Ambiguous,
    };

    Ok(Classification { track, traf_count })
}
