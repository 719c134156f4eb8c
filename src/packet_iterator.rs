//! Raw packet-level iteration.
//!
//! [`PacketIterator`] walks the demuxed packets of the selected video stream
//! without decoding. Packets of other streams are skipped, as are isolated
//! read errors. A long run of read errors ends the walk with one `Err`.
//!
//! # Example
//!
//! ```no_run
//! use frameproof::MediaFile;
//!
//! let mut media = MediaFile::open("input.mp4")?;
//! for info in media.packet_iter()? {
//!     let packet = info?;
//!     if packet.is_keyframe {
//!         println!("Keyframe at PTS {:?}", packet.pts);
//!     }
//! }
//! # Ok::<(), frameproof::FrameproofError>(())
//! ```

use ffmpeg_next::{Error as FfmpegError, Packet, Rational};

use crate::error::FrameproofError;
use crate::media::{MediaFile, ReadErrorBudget};

/// Metadata for a single demuxed packet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacketInfo {
    /// Presentation timestamp (if available).
    pub pts: Option<i64>,
    /// Decoding timestamp (if available).
    pub dts: Option<i64>,
    /// Packet duration in stream ticks (0 when unknown).
    pub duration: i64,
    /// Whether this packet is a keyframe / sync point.
    pub is_keyframe: bool,
    /// The stream's time base.
    pub time_base: Rational,
}

/// A lazy iterator over the video stream's demuxed packets.
pub struct PacketIterator<'a> {
    media: &'a mut MediaFile,
    video_stream_index: usize,
    time_base: Rational,
    read_errors: ReadErrorBudget,
    done: bool,
}

impl<'a> PacketIterator<'a> {
    pub(crate) fn new(media: &'a mut MediaFile) -> Result<Self, FrameproofError> {
        let video = media
            .video_stream
            .as_ref()
            .ok_or(FrameproofError::NoVideoStream)?;
        let video_stream_index = video.stream_index;
        let time_base = video.time_base;
        log::debug!("Creating PacketIterator (stream={video_stream_index})");

        Ok(Self {
            media,
            video_stream_index,
            time_base,
            read_errors: ReadErrorBudget::default(),
            done: false,
        })
    }
}

impl Iterator for PacketIterator<'_> {
    type Item = Result<PacketInfo, FrameproofError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let mut packet = Packet::empty();
            match packet.read(&mut self.media.input_context) {
                Ok(()) => {
                    self.read_errors.record_success();
                    if packet.stream() != self.video_stream_index {
                        continue;
                    }
                    return Some(Ok(PacketInfo {
                        pts: packet.pts(),
                        dts: packet.dts(),
                        duration: packet.duration(),
                        is_keyframe: packet.is_key(),
                        time_base: self.time_base,
                    }));
                }
                Err(FfmpegError::Eof) => {
                    self.done = true;
                    return None;
                }
                Err(error) => {
                    if !self.read_errors.record_failure() {
                        log::debug!(
                            "Skipping unreadable packet in {}: {error}",
                            self.media.path().display()
                        );
                        continue;
                    }
                    self.done = true;
                    return Some(Err(FrameproofError::FfmpegError(format!(
                        "gave up after {} consecutive read errors: {error}",
                        self.read_errors.consecutive()
                    ))));
                }
            }
        }
    }
}
