//! Error types for the `frameproof` crate.
//!
//! [`FrameproofError`] is the single error type returned by every fallible
//! operation. Variants carry the path or frame index involved so that a log
//! line built from the error is enough to locate the problem.

use std::{io::Error as IoError, path::PathBuf};

use csv::Error as CsvError;
use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use serde_json::Error as JsonError;
use thiserror::Error;

/// The unified error type for all `frameproof` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameproofError {
    /// The media file could not be opened by the demuxer.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::MediaFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A decoded frame could not be converted to an RGB24 buffer.
    #[error("Failed to convert frame {frame_index}: {reason}")]
    FrameConversion {
        /// Decoder-order index of the frame that failed.
        frame_index: u64,
        /// Why the conversion failed.
        reason: String,
    },

    /// Input resolution produced no openable video files.
    #[error("No supported video files found in {path}")]
    NoVideoFiles {
        /// The input path that was scanned.
        path: PathBuf,
    },

    /// The case output directory could not be created.
    #[error("Failed to create case directory at {path}: {source}")]
    CaseDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: IoError,
    },

    /// The case log funnel could not be started.
    #[error("Logging error: {0}")]
    Logging(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while saving or reloading a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// A frame or packet table could not be written.
    #[error("CSV error: {0}")]
    CsvError(#[from] CsvError),

    /// The provenance manifest could not be serialized.
    #[error("JSON error: {0}")]
    JsonError(#[from] JsonError),
}

impl From<FfmpegError> for FrameproofError {
    fn from(error: FfmpegError) -> Self {
        FrameproofError::FfmpegError(error.to_string())
    }
}
