//! Segment file naming.

use crate::config::SplitConfig;
use anyhow::{bail, Result};
use mp4split_media::Segment;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Track,
    Number { width: usize },
}

/// Maps emitted segments to file names.
///
/// The first segment carries the init boxes and takes the init name.
/// Media segments are named from a pattern with `{track}` and `{number}`
/// (or zero padded `{number:0N}`) placeholders.
#[derive(Debug, Clone)]
pub struct SegmentNamer {
    init_name: String,
    pattern: Vec<Piece>,
    start_number: u32,
}

impl SegmentNamer {
    pub fn new(init_name: &str, media_pattern: &str, start_number: u32) -> Result<Self> {
        if init_name.is_empty() {
            bail!("Init segment name cannot be empty");
        }
        if start_number == 0 {
            bail!("Start number must be at least 1");
        }

        let pattern = parse_pattern(media_pattern)?;
        if !pattern.iter().any(|p| matches!(p, Piece::Number { .. })) {
            bail!(
                "Media segment pattern '{}' has no {{number}} placeholder",
                media_pattern
            );
        }

        Ok(Self {
            init_name: init_name.to_string(),
            pattern,
            start_number,
        })
    }

    pub fn from_config(config: &SplitConfig) -> Result<Self> {
        Self::new(
            &config.init_segment,
            &config.media_segment,
            config.start_number,
        )
    }

    pub fn init_name(&self) -> &str {
        &self.init_name
    }

    /// Name of a media segment opened by `track` with the given number.
    pub fn media_name(&self, track: u32, number: u32) -> String {
        let mut name = String::new();
        for piece in &self.pattern {
            match piece {
                Piece::Literal(text) => name.push_str(text),
                Piece::Track => {
                    let _ = write!(name, "{}", track);
                }
                Piece::Number { width } => {
                    let _ = write!(name, "{:0width$}", number, width = *width);
                }
            }
        }
        name
    }

    pub fn file_name(&self, segment: &Segment<'_>) -> String {
        if segment.is_init() {
            return self.init_name.clone();
        }

        let track = segment
            .track
            .and_then(|t| t.track_id())
            .unwrap_or_default();
        let number = self.start_number.saturating_add(segment.index - 1);
        self.media_name(track, number)
    }
}

fn parse_pattern(pattern: &str) -> Result<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            bail!("Unclosed placeholder in pattern '{}'", pattern);
        };

        let piece = match &after[..close] {
            "track" => Piece::Track,
            "number" => Piece::Number { width: 0 },
            spec => match spec.strip_prefix("number:0") {
                Some(width) if !width.is_empty() && width.bytes().all(|b| b.is_ascii_digit()) => {
                    Piece::Number {
                        width: width.parse()?,
                    }
                }
                _ => bail!("Unknown placeholder '{{{}}}' in pattern '{}'", spec, pattern),
            },
        };

        if !literal.is_empty() {
            pieces.push(Piece::Literal(std::mem::take(&mut literal)));
        }
        pieces.push(piece);
        rest = &after[close + 1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }

    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp4split_media::split::FragmentTrack;

    fn segment(index: u32, track: Option<FragmentTrack>) -> Segment<'static> {
        Segment {
            index,
            track,
            data: &[],
        }
    }

    #[test]
    fn test_default_pattern() {
        let namer = SegmentNamer::from_config(&SplitConfig::default()).unwrap();
        assert_eq!(namer.file_name(&segment(0, None)), "init.mp4");
        assert_eq!(
            namer.file_name(&segment(1, Some(FragmentTrack::Track(1)))),
            "segment-1.0001.m4s"
        );
        assert_eq!(
            namer.file_name(&segment(190, Some(FragmentTrack::Track(2)))),
            "segment-2.0190.m4s"
        );
    }

    #[test]
    fn test_ambiguous_track_is_zero() {
        let namer = SegmentNamer::new("init.mp4", "seg-{track}-{number}.m4s", 1).unwrap();
        assert_eq!(
            namer.file_name(&segment(3, Some(FragmentTrack::Ambiguous))),
            "seg-0-3.m4s"
        );
    }

    #[test]
    fn test_start_number() {
        let namer = SegmentNamer::new("i.mp4", "{number}.m4s", 10).unwrap();
        assert_eq!(namer.file_name(&segment(1, None)), "10.m4s");
        assert_eq!(namer.file_name(&segment(2, None)), "11.m4s");
    }

    #[test]
    fn test_padding_wider_than_number() {
        let namer = SegmentNamer::new("i.mp4", "{number:02}", 1).unwrap();
        assert_eq!(namer.media_name(1, 123), "123");
        assert_eq!(namer.media_name(1, 7), "07");
    }

    #[test]
    fn test_missing_number_rejected() {
        assert!(SegmentNamer::new("init.mp4", "segment-{track}.m4s", 1).is_err());
    }

    #[test]
    fn test_bad_placeholders_rejected() {
        assert!(SegmentNamer::new("init.mp4", "seg-{number", 1).is_err());
        assert!(SegmentNamer::new("init.mp4", "seg-{index}-{number}", 1).is_err());
        assert!(SegmentNamer::new("init.mp4", "seg-{number:4}", 1).is_err());
        assert!(SegmentNamer::new("init.mp4", "seg-{number:0}", 1).is_err());
    }

    #[test]
    fn test_empty_init_and_zero_start_rejected() {
        assert!(SegmentNamer::new("", "{number}", 1).is_err());
        assert!(SegmentNamer::new("init.mp4", "{number}", 0).is_err());
    }
}
