//! Track filter.

use super::FragmentTrack;

/// Nominal number of track IDs a filter is expected to hold.
///
/// Exceeding it only logs a warning.
pub const MAX_TRACK_IDS: usize = 32;

/// Ordered set of track IDs selecting which fragments are kept.
///
/// An empty filter keeps everything. The first configured ID is the only
/// one that starts new segments; the others only select boxes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(transparent))]
pub struct TrackFilter {
    ids: Vec<u32>,
}

impl TrackFilter {
    /// Create an empty (pass-through) filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a track ID. Returns `false` if it was already present.
    pub fn insert(&mut self, track_id: u32) -> bool {
        if self.ids.contains(&track_id) {
            return false;
        }
        self.ids.push(track_id);
        if self.ids.len() == MAX_TRACK_IDS + 1 {
            tracing::warn!(
                limit = MAX_TRACK_IDS,
                "track filter holds more IDs than the nominal limit"
            );
        }
        true
    }

    /// Whether no IDs are configured.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of configured IDs.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Configured IDs in insertion order.
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// The ID whose fragments start new segments.
    pub fn boundary_track(&self) -> Option<u32> {
        self.ids.first().copied()
    }

    /// Whether boxes belonging to `track` are kept.
    pub fn matches(&self, track: FragmentTrack) -> bool {
        self.is_empty() || self.ids.contains(&track.filter_id())
    }

    /// Whether a moof belonging to `track` starts a new segment.
    pub fn is_boundary(&self, track: FragmentTrack) -> bool {
        match self.boundary_track() {
            None => true,
            Some(first) => first == track.filter_id(),
        }
    }
}

impl FromIterator<u32> for TrackFilter {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut filter = Self::new();
        for track_id in iter {
            filter.insert(track_id);
        }
        filter
    }
}

impl From<Vec<u32>> for TrackFilter {
    fn from(ids: Vec<u32>) -> Self {
        ids.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = TrackFilter::new();
        assert!(filter.matches(FragmentTrack::Track(1)));
        assert!(filter.matches(FragmentTrack::Ambiguous));
        assert!(filter.is_boundary(FragmentTrack::Track(7)));
        assert!(filter.is_boundary(FragmentTrack::Ambiguous));
    }

    #[test]
    fn test_membership() {
        let filter = TrackFilter::from(vec![2, 3]);
        assert!(filter.matches(FragmentTrack::Track(2)));
        assert!(filter.matches(FragmentTrack::Track(3)));
        assert!(!filter.matches(FragmentTrack::Track(1)));
        assert!(!filter.matches(FragmentTrack::Ambiguous));
    }

    #[test]
    fn test_only_first_id_is_boundary() {
        let filter = TrackFilter::from(vec![2, 3]);
        assert!(filter.is_boundary(FragmentTrack::Track(2)));
        assert!(!filter.is_boundary(FragmentTrack::Track(3)));
        assert!(!filter.is_boundary(FragmentTrack::Ambiguous));
    }

    #[test]
    fn test_reserved_id_selects_ambiguous_fragments() {
        let filter = TrackFilter::from(vec![0]);
        assert!(filter.matches(FragmentTrack::Ambiguous));
        assert!(filter.is_boundary(FragmentTrack::Ambiguous));
        assert!(!filter.matches(FragmentTrack::Track(1)));
    }

    #[test]
    fn test_duplicates_ignored_and_limit_is_soft() {
        let mut filter = TrackFilter::new();
        assert!(filter.insert(4));
        assert!(!filter.insert(4));
        assert_eq!(filter.ids(), &[4]);

        let big: TrackFilter = (1..=40).collect();
        assert_eq!(big.len(), 40);
        assert_eq!(big.boundary_track(), Some(1));
        assert!(big.matches(FragmentTrack::Track(40)));
    }
}
