//! Per-unit and per-video records.
//!
//! [`FrameRecord`] and [`PacketRecord`] are the rows of a video's CSV table;
//! their field declaration order is the column order. [`VideoRecord`] is the
//! per-video summary that lands in the provenance manifest.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::configuration::ProcessingMode;
use crate::error::FrameproofError;

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
    /// Zero-based decoder-order index. Frames that failed conversion leave a
    /// gap rather than being renumbered.
    pub frame_index: u64,
    /// Presentation timestamp in stream ticks.
    pub pts: Option<i64>,
    /// Stream time base as `num/den`.
    pub time_base: Option<String>,
    /// `pts * time_base`.
    pub timestamp_seconds: Option<f64>,
    /// Seconds until the next frame, when both timestamps are valid and increasing.
    pub frame_duration: Option<f64>,
    /// `1 / frame_duration`.
    pub fps: Option<f64>,
    /// Whether the decoder flagged the frame as a keyframe.
    pub key_frame: bool,
    /// SHA-256 of the decoded RGB24 buffer.
    pub decoded_sha256: String,
    /// SHA-256 of the buffer reloaded from the saved image.
    pub image_sha256: Option<String>,
    /// `decoded_sha256 == image_sha256`; absent when frames are not persisted.
    pub hash_verified: Option<bool>,
    /// File name of the saved image inside `frames/`.
    pub image_file: Option<String>,
    /// How the frame was decoded; `cpu` for software decoding.
    pub decode_method: String,
    /// Hardware decoder in use. Always empty; decoding is software only.
    pub decode_hwaccel: Option<String>,
}

/// One demuxed packet with a PTS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacketRecord {
    /// Contiguous index over packets that carried a PTS.
    pub packet_index: u64,
    /// Presentation timestamp in stream ticks.
    pub pts: i64,
    /// Decoding timestamp in stream ticks, when the container has one.
    pub dts: Option<i64>,
    /// Packet duration in stream ticks.
    pub duration: i64,
    /// Stream time base as `num/den`.
    pub time_base: String,
    /// `pts * time_base`.
    pub timestamp_seconds: Option<f64>,
    /// Whether the demuxer flagged the packet as a sync point.
    pub is_keyframe: bool,
}

/// Codec identity reported by the decoder for the selected stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodecIdentity {
    /// Short codec name, e.g. `h264`.
    pub codec: String,
    /// Descriptive codec name, e.g. `H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10`.
    pub codec_long: String,
}

/// Mode-specific counts and timing of a [`VideoRecord`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UnitSummary {
    /// Decode mode.
    Frames {
        frames: usize,
        pixel_format: Option<String>,
        total_duration: f64,
        average_fps: f64,
    },
    /// PTS-only mode.
    Packets {
        packets: usize,
        time_base: String,
        /// Duration declared by the container for the stream, if any.
        duration: Option<f64>,
    },
}

/// Summary of one successfully processed video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoRecord {
    /// Source path as supplied or discovered.
    pub video: PathBuf,
    /// Mode the video was processed in.
    pub mode: ProcessingMode,
    #[serde(flatten)]
    pub codec: CodecIdentity,
    #[serde(flatten)]
    pub summary: UnitSummary,
    /// Directory holding this video's table and frames.
    pub output_directory: PathBuf,
}

impl VideoRecord {
    /// Number of frames or packets recorded.
    pub fn unit_count(&self) -> usize {
        match &self.summary {
            UnitSummary::Frames { frames, .. } => *frames,
            UnitSummary::Packets { packets, .. } => *packets,
        }
    }
}

/// Write `rows` to `path` as CSV with a header row.
///
/// Missing values are written as empty cells.
pub fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), FrameproofError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
