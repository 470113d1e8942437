//! The splitting pass over the top-level box stream.

use super::{
    classify, FragmentTrack, Segment, SegmentWriter, SplitOptions, SplitSummary, Termination,
};
use crate::mp4::{BoxReader, BoxType, MovieInfo, Mp4Box};
use crate::{Error, Result};
use bytes::{Bytes, BytesMut};
use std::io;

/// The ftyp/moov prefix of a file.
pub(crate) struct InitBoxes {
    pub ftyp: Option<Mp4Box>,
    pub moov: Mp4Box,
    pub movie: MovieInfo,
}

impl InitBoxes {
    /// Walk top-level boxes up to and including moov.
    ///
    /// The first ftyp is kept; anything else before moov is skipped.
    /// The returned reader is positioned right after moov.
    pub fn locate(data: Bytes) -> Result<(Self, BoxReader)> {
        let mut reader = BoxReader::new(data);
        let mut ftyp: Option<Mp4Box> = None;

        loop {
            let header = match reader.peek_header() {
                Ok(Some(header)) => header,
                Ok(None) => return Err(Error::NoMovieMetadata),
                Err(e) => {
                    tracing::debug!(error = %e, "stream undecodable before moov");
                    return Err(Error::NoMovieMetadata);
                }
            };

            let wanted = header.box_type == BoxType::MOOV
                || (header.box_type == BoxType::FTYP && ftyp.is_none());

            let mp4_box = match reader.next_box() {
                Ok(Some(mp4_box)) => mp4_box,
                Ok(None) => return Err(Error::NoMovieMetadata),
                // The header was found but the body runs past the input, so
                // the box cannot be copied verbatim. Reported as a write
                // failure (101/102) rather than as missing metadata (100).
                Err(e) if wanted => {
                    return Err(Error::InitWrite {
                        box_type: header.box_type,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::debug!(error = %e, "stream undecodable before moov");
                    return Err(Error::NoMovieMetadata);
                }
            };

            match mp4_box.box_type {
                BoxType::MOOV => {
                    let movie = MovieInfo::parse(&mp4_box).map_err(|e| {
                        tracing::debug!(error = %e, "moov is not parsable");
                        Error::NoMovieMetadata
                    })?;
                    tracing::debug!(
                        tracks = movie.tracks.len(),
                        fragmented = movie.fragmented,
                        "found movie metadata"
                    );
                    let init = Self {
                        ftyp,
                        moov: mp4_box,
                        movie,
                    };
                    return Ok((init, reader));
                }
                BoxType::FTYP if ftyp.is_none() => ftyp = Some(mp4_box),
                other => tracing::trace!(box_type = %other, "skipping box before moov"),
            }
        }
    }

    /// Append ftyp (if present) then moov.
    fn write_to<F>(&self, writer: &mut SegmentWriter<F>)
    where
        F: FnMut(Segment<'_>) -> io::Result<()>,
    {
        if let Some(ftyp) = &self.ftyp {
            writer.append(ftyp.as_bytes());
        }
        writer.append(self.moov.as_bytes());
    }

    /// ftyp (if present) and moov as one buffer.
    pub fn to_bytes(&self) -> Bytes {
        let ftyp_len = self.ftyp.as_ref().map_or(0, |b| b.as_bytes().len());
        let mut buf = BytesMut::with_capacity(ftyp_len + self.moov.as_bytes().len());
        if let Some(ftyp) = &self.ftyp {
            buf.extend_from_slice(ftyp.as_bytes());
        }
        buf.extend_from_slice(self.moov.as_bytes());
        buf.freeze()
    }
}

/// Runs one split over one input buffer.
///
/// All state lives here for the duration of a single call.
pub(crate) struct Segmenter<'o> {
    options: &'o SplitOptions,
    context: FragmentTrack,
    summary: SplitSummary,
}

impl<'o> Segmenter<'o> {
    pub fn new(options: &'o SplitOptions) -> Self {
        Self {
            options,
            // Boxes before the first moof are filtered like an ambiguous fragment.
            context: FragmentTrack::Ambiguous,
            summary: SplitSummary::default(),
        }
    }

    pub fn run<F>(mut self, data: Bytes, sink: F) -> Result<SplitSummary>
    where
        F: FnMut(Segment<'_>) -> io::Result<()>,
    {
        let (init, mut reader) = InitBoxes::locate(data)?;
        self.summary.tracks = init.movie.tracks.len();

        let mut writer = SegmentWriter::new(sink);
        init.write_to(&mut writer);
        drop(init);

        self.summary.termination = loop {
            let offset = reader.offset();
            let mp4_box = match reader.next_box() {
                Ok(Some(mp4_box)) => mp4_box,
                Ok(None) => break Termination::EndOfStream,
                Err(e) if self.options.strict => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        offset,
                        error = %e,
                        "stopping at undecodable data; flushing what was read"
                    );
                    break Termination::TrailingData {
                        offset,
                        reason: e.to_string(),
                    };
                }
            };

            self.process(&mp4_box, &mut writer)?;
        };

        self.summary.bytes_written = writer.bytes_flushed() + writer.buffered() as u64;
        self.summary.segments = writer.finish()?;

        tracing::debug!(
            segments = self.summary.segments,
            fragments = self.summary.fragments,
            bytes = self.summary.bytes_written,
            "split complete"
        );

        Ok(self.summary)
    }

    fn process<F>(&mut self, mp4_box: &Mp4Box, writer: &mut SegmentWriter<F>) -> Result<()>
    where
        F: FnMut(Segment<'_>) -> io::Result<()>,
    {
        let filter = &self.options.track_filter;

        if mp4_box.box_type == BoxType::MOOF {
            let classification = classify(mp4_box)?;
            self.summary.fragments += 1;
            self.context = classification.track;

            tracing::trace!(
                offset = mp4_box.offset,
                track = %self.context,
                trafs = classification.traf_count,
                "fragment"
            );

            if filter.is_boundary(self.context) {
                writer.flush_and_reset(self.context)?;
            }
        }

        if mp4_box.box_type != BoxType::MFRA && filter.matches(self.context) {
            writer.append(mp4_box.as_bytes());
            self.summary.boxes_written += 1;
        } else {
            self.summary.boxes_dropped += 1;
        }

        Ok(())
    }
}
