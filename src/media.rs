//! Core [`MediaFile`] implementation.
//!
//! `MediaFile` opens a container through FFmpeg, selects the first video
//! stream, and caches the stream facts the pipeline reports (codec identity,
//! pixel format, time base, declared duration). Frames and packets are then
//! pulled through [`FrameIterator`] and [`PacketIterator`].

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Rational,
    codec::{Id as CodecId, context::Context as CodecContext},
    format::context::Input,
    media::Type,
};

use crate::{
    conversion, error::FrameproofError, frame_iterator::FrameIterator,
    packet_iterator::PacketIterator, records::CodecIdentity,
};

/// Demuxers that render arbitrary text files as pictures. FFmpeg falls back
/// to them for almost any `.txt` or `.nfo` file.
const TEXT_DEMUXERS: &[&str] = &["tty"];

/// Demux read errors tolerated in a row before a stream is treated as ended.
pub(crate) const MAX_CONSECUTIVE_READ_ERRORS: u32 = 64;

/// Counts consecutive demux read errors for one iteration over a file.
#[derive(Debug, Default)]
pub(crate) struct ReadErrorBudget {
    consecutive: u32,
}

impl ReadErrorBudget {
    /// A successful read clears the count.
    pub(crate) fn record_success(&mut self) {
        self.consecutive = 0;
    }

    /// Count a failed read. Returns `true` once the budget is spent.
    pub(crate) fn record_failure(&mut self) -> bool {
        self.consecutive += 1;
        self.consecutive >= MAX_CONSECUTIVE_READ_ERRORS
    }

    pub(crate) fn consecutive(&self) -> u32 {
        self.consecutive
    }
}

/// Facts about the selected video stream, read once at open time.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoStreamInfo {
    /// Container index of the stream.
    pub stream_index: usize,
    /// Decoder name and long name.
    pub codec: CodecIdentity,
    /// Decoder pixel format name, e.g. `yuv420p`.
    pub pixel_format: Option<String>,
    /// Stream time base.
    pub time_base: Rational,
    /// Duration declared by the container for this stream, in seconds.
    pub declared_duration: Option<f64>,
    pub width: u32,
    pub height: u32,
}

/// An opened media file.
pub struct MediaFile {
    /// The opened FFmpeg input (demuxer) context.
    pub(crate) input_context: Input,
    /// The first video stream, if the container has one.
    pub(crate) video_stream: Option<VideoStreamInfo>,
    /// Path to the opened media file (kept for log messages).
    pub(crate) file_path: PathBuf,
}

impl Debug for MediaFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaFile")
            .field("video_stream", &self.video_stream)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl MediaFile {
    /// Open a media file.
    ///
    /// Initializes FFmpeg (idempotent), opens the file and reads the first
    /// video stream's codec parameters.
    ///
    /// # Errors
    ///
    /// Returns [`FrameproofError::FileOpen`] if the demuxer rejects the file
    /// or the video stream's decoder cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FrameproofError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening media file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| FrameproofError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| FrameproofError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let text_demuxer = is_text_demuxer(input_context.format().name());
        let video_stream = match input_context.streams().find(|stream| {
            let parameters = stream.parameters();
            !text_demuxer && is_picture_stream(parameters.medium(), parameters.id())
        }) {
            Some(stream) => {
                let index = stream.index();
                let decoder_context = CodecContext::from_parameters(stream.parameters())
                    .map_err(|error| FrameproofError::FileOpen {
                        path: file_path.clone(),
                        reason: format!(
                            "Failed to read video codec parameters for stream {index}: {error}"
                        ),
                    })?;
                let decoder = decoder_context.decoder().video().map_err(|error| {
                    FrameproofError::FileOpen {
                        path: file_path.clone(),
                        reason: format!("Failed to create video decoder for stream {index}: {error}"),
                    }
                })?;

                let codec = match decoder.codec() {
                    Some(codec) => CodecIdentity {
                        codec: codec.name().to_string(),
                        codec_long: codec.description().to_string(),
                    },
                    None => CodecIdentity {
                        codec: decoder.id().name().to_string(),
                        codec_long: "unknown".to_string(),
                    },
                };

                let pixel_format = decoder
                    .format()
                    .descriptor()
                    .map(|descriptor| descriptor.name().to_string());

                let time_base = stream.time_base();
                let declared_duration = if stream.duration() > 0 {
                    conversion::pts_to_seconds(stream.duration(), time_base)
                } else {
                    None
                };

                Some(VideoStreamInfo {
                    stream_index: index,
                    codec,
                    pixel_format,
                    time_base,
                    declared_duration,
                    width: decoder.width(),
                    height: decoder.height(),
                })
            }
            None => None,
        };

        if let Some(video) = &video_stream {
            log::debug!(
                "Opened {} (format={}): video stream {} {}x{} codec={} pix_fmt={}",
                file_path.display(),
                input_context.format().name(),
                video.stream_index,
                video.width,
                video.height,
                video.codec.codec,
                video.pixel_format.as_deref().unwrap_or("none"),
            );
        }

        Ok(Self {
            input_context,
            video_stream,
            file_path,
        })
    }

    /// Check whether `path` is a video the pipeline can process.
    ///
    /// Opens and immediately closes the container, and requires a video
    /// stream. Text files picked up by FFmpeg's text-art demuxer do not
    /// count. Used when scanning a directory for candidate videos.
    pub fn probe<P: AsRef<Path>>(path: P) -> bool {
        match Self::open(path) {
            Ok(media) => media.video_stream.is_some(),
            Err(_) => false,
        }
    }

    /// The selected video stream, if any.
    pub fn video_stream(&self) -> Option<&VideoStreamInfo> {
        self.video_stream.as_ref()
    }

    /// Path this file was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Lazily decode every frame of the selected video stream.
    ///
    /// # Errors
    ///
    /// Returns [`FrameproofError::NoVideoStream`] if there is no video
    /// stream, or an FFmpeg error if the decoder cannot be created.
    pub fn frame_iter(&mut self) -> Result<FrameIterator<'_>, FrameproofError> {
        FrameIterator::new(self)
    }

    /// Lazily enumerate demuxed packets of the selected video stream.
    ///
    /// # Errors
    ///
    /// Returns [`FrameproofError::NoVideoStream`] if there is no video stream.
    pub fn packet_iter(&mut self) -> Result<PacketIterator<'_>, FrameproofError> {
        PacketIterator::new(self)
    }
}

fn is_text_demuxer(name: &str) -> bool {
    name.split(',').any(|alias| TEXT_DEMUXERS.contains(&alias))
}

/// A video stream carrying pictures, not ANSI art.
fn is_picture_stream(medium: Type, codec: CodecId) -> bool {
    medium == Type::Video && codec != CodecId::ANSI
}
