//! Lazy, pull-based decoded-frame iterator.
//!
//! [`FrameIterator`] reads and decodes just enough packets to produce the
//! next frame of the selected video stream, converting it to RGB24. Every
//! frame the decoder yields consumes one index, whether or not its
//! conversion succeeds, so indices always reflect decoder order.
//!
//! # Example
//!
//! ```no_run
//! use frameproof::MediaFile;
//!
//! let mut media = MediaFile::open("input.mp4")?;
//! for result in media.frame_iter()? {
//!     match result {
//!         Ok(frame) => println!("frame {} pts={:?}", frame.index, frame.pts),
//!         Err(error) => eprintln!("skipped: {error}"),
//!     }
//! }
//! # Ok::<(), frameproof::FrameproofError>(())
//! ```

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::conversion::{self, is_valid_time_base};
use crate::error::FrameproofError;
use crate::media::{MediaFile, ReadErrorBudget};

/// A decoded frame converted to RGB24.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Zero-based decoder-order index.
    pub index: u64,
    /// Presentation timestamp in stream ticks.
    pub pts: Option<i64>,
    /// Stream time base, when it has a non-zero denominator.
    pub time_base: Option<Rational>,
    pub key_frame: bool,
    /// Tightly packed RGB24 pixels.
    pub image: RgbImage,
}

/// Converter keyed on the source geometry it was built for.
struct Converter {
    scaler: ScalingContext,
    format: Pixel,
    width: u32,
    height: u32,
}

/// A lazy iterator over every decoded frame of a video stream.
///
/// Yields `Err(FrameproofError::FrameConversion)` for a frame that the
/// decoder produced but that could not be converted; iteration continues
/// after it.
pub struct FrameIterator<'a> {
    media: &'a mut MediaFile,
    decoder: VideoDecoder,
    converter: Option<Converter>,
    video_stream_index: usize,
    time_base: Option<Rational>,
    next_index: u64,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    read_errors: ReadErrorBudget,
    eof_sent: bool,
    done: bool,
}

impl<'a> FrameIterator<'a> {
    pub(crate) fn new(media: &'a mut MediaFile) -> Result<Self, FrameproofError> {
        let video_stream_index = media
            .video_stream
            .as_ref()
            .ok_or(FrameproofError::NoVideoStream)?
            .stream_index;

        let stream = media
            .input_context
            .stream(video_stream_index)
            .ok_or(FrameproofError::NoVideoStream)?;
        let time_base = Some(stream.time_base()).filter(|tb| is_valid_time_base(*tb));
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let decoder = decoder_context.decoder().video()?;

        log::debug!(
            "Creating FrameIterator (stream={video_stream_index}, file={})",
            media.path().display()
        );

        Ok(Self {
            media,
            decoder,
            converter: None,
            video_stream_index,
            time_base,
            next_index: 0,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            read_errors: ReadErrorBudget::default(),
            eof_sent: false,
            done: false,
        })
    }

    /// Convert the current `decoded_frame` to a packed RGB24 image.
    ///
    /// The converter is rebuilt whenever the source format or size changes
    /// mid-stream.
    fn convert_current_frame(&mut self) -> Result<RgbImage, String> {
        let format = self.decoded_frame.format();
        let width = self.decoded_frame.width();
        let height = self.decoded_frame.height();

        if width == 0 || height == 0 {
            return Err(format!("frame has empty geometry {width}x{height}"));
        }

        let stale = match &self.converter {
            Some(converter) => {
                converter.format != format || converter.width != width || converter.height != height
            }
            None => true,
        };
        if stale {
            let scaler = ScalingContext::get(
                format,
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )
            .map_err(|error| format!("cannot convert {format:?} to rgb24: {error}"))?;
            self.converter = Some(Converter {
                scaler,
                format,
                width,
                height,
            });
        }

        let Some(converter) = self.converter.as_mut() else {
            return Err("converter unavailable".to_string());
        };
        converter
            .scaler
            .run(&self.decoded_frame, &mut self.rgb_frame)
            .map_err(|error| error.to_string())?;

        let buffer = conversion::frame_to_buffer(&self.rgb_frame, width, height)
            .ok_or_else(|| "converted plane is shorter than the frame geometry".to_string())?;
        RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| "failed to construct RGB image from converted data".to_string())
    }

    /// Package the frame currently held by the decoder.
    fn take_current_frame(&mut self) -> Result<DecodedFrame, FrameproofError> {
        let index = self.next_index;
        self.next_index += 1;

        let image = self
            .convert_current_frame()
            .map_err(|reason| FrameproofError::FrameConversion {
                frame_index: index,
                reason,
            })?;

        Ok(DecodedFrame {
            index,
            pts: self.decoded_frame.pts(),
            time_base: self.time_base,
            key_frame: self.decoded_frame.is_key(),
            image,
        })
    }
}

impl Iterator for FrameIterator<'_> {
    type Item = Result<DecodedFrame, FrameproofError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                return Some(self.take_current_frame());
            }

            if self.eof_sent {
                self.done = true;
                return None;
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.media.input_context) {
                Ok(()) => {
                    self.read_errors.record_success();
                    if packet.stream() != self.video_stream_index {
                        continue;
                    }
                    if let Err(error) = self.decoder.send_packet(&packet) {
                        log::warn!(
                            "Decoder rejected packet (pts={:?}) in {}: {error}",
                            packet.pts(),
                            self.media.path().display()
                        );
                    }
                }
                Err(FfmpegError::Eof) => {
                    if let Err(error) = self.decoder.send_eof() {
                        log::warn!(
                            "Failed to flush decoder for {}: {error}",
                            self.media.path().display()
                        );
                        self.done = true;
                        return None;
                    }
                    self.eof_sent = true;
                }
                Err(error) => {
                    if !self.read_errors.record_failure() {
                        log::debug!(
                            "Skipping unreadable packet in {}: {error}",
                            self.media.path().display()
                        );
                        continue;
                    }
                    log::warn!(
                        "Giving up on {} after {} read errors: {error}",
                        self.media.path().display(),
                        self.read_errors.consecutive()
                    );
                    if self.decoder.send_eof().is_err() {
                        self.done = true;
                        return None;
                    }
                    self.eof_sent = true;
                }
            }
        }
    }
}
