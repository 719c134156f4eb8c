//! End-to-end processing of a single video.
//!
//! A [`VideoUnit`] opens one video, walks its frames (decode mode) or packets
//! (PTS-only mode), fingerprints and times them, writes the per-video CSV
//! table, and returns a [`VideoRecord`]. Every failure here is confined to
//! the one video: it is logged and `None` is returned so the rest of the
//! case carries on.

use std::{fs, path::Path};

use crate::{
    configuration::{ProcessingMode, RunConfiguration},
    conversion::{format_time_base, pts_to_seconds},
    error::FrameproofError,
    frame_iterator::DecodedFrame,
    hashing::{self, FrameStore},
    media::MediaFile,
    packet_iterator::PacketInfo,
    records::{FrameRecord, PacketRecord, UnitSummary, VideoRecord, write_table},
    timing::{self, TimingAnalysis},
};

/// Name of the per-video directory that holds persisted frames.
pub const FRAMES_DIRECTORY: &str = "frames";

/// Label used in a frame file name when the frame has no PTS.
const NO_PTS_LABEL: &str = "no_pts";

/// Processes one video with a fixed configuration and frame store.
pub struct VideoUnit<'a> {
    config: &'a RunConfiguration,
    store: &'a dyn FrameStore,
}

impl<'a> VideoUnit<'a> {
    pub fn new(config: &'a RunConfiguration, store: &'a dyn FrameStore) -> Self {
        Self { config, store }
    }

    /// Process `video` into `output_directory`.
    ///
    /// Returns `None` when the video cannot be opened, has no video stream,
    /// yields no frames or packets, or its outputs cannot be written. The
    /// reason is logged.
    pub fn process(&self, video: &Path, output_directory: &Path) -> Option<VideoRecord> {
        let label = video_label(video, output_directory);
        log::info!("[{label}] Processing video: {}", video.display());

        match self.try_process(video, output_directory, &label) {
            Ok(record) => record,
            Err(error) => {
                log::error!("[{label}] {error}");
                None
            }
        }
    }

    fn try_process(
        &self,
        video: &Path,
        output_directory: &Path,
        label: &str,
    ) -> Result<Option<VideoRecord>, FrameproofError> {
        fs::create_dir_all(output_directory)?;

        let mut media = match MediaFile::open(video) {
            Ok(media) => media,
            Err(error) => {
                log::error!("[{label}] Failed to open: {error}");
                return Ok(None);
            }
        };

        if media.video_stream().is_none() {
            log::warn!("[{label}] No video stream found");
            return Ok(None);
        }

        match self.config.mode() {
            ProcessingMode::Decode => self.process_frames(&mut media, video, output_directory, label),
            ProcessingMode::PtsOnly => self.process_packets(&mut media, video, output_directory, label),
        }
    }

    fn process_frames(
        &self,
        media: &mut MediaFile,
        video: &Path,
        output_directory: &Path,
        label: &str,
    ) -> Result<Option<VideoRecord>, FrameproofError> {
        let Some(stream) = media.video_stream().cloned() else {
            return Err(FrameproofError::NoVideoStream);
        };

        let frames_directory = if self.config.persist_frames() {
            let directory = output_directory.join(FRAMES_DIRECTORY);
            fs::create_dir_all(&directory)?;
            Some(directory)
        } else {
            None
        };

        let frames = media.frame_iter()?.filter_map(|result| match result {
            Ok(frame) => Some(frame),
            Err(error) => {
                log::debug!("[{label}] Skipping frame: {error}");
                None
            }
        });
        let mut records = collect_frame_records(
            frames,
            frames_directory.as_deref(),
            self.store,
            self.config.decode_method(),
        )?;

        if records.is_empty() {
            log::warn!("[{label}] No frames decoded");
            return Ok(None);
        }

        let analysis = apply_timing(&mut records);
        if !analysis.has_aggregate() {
            log::warn!(
                "[{label}] Too few increasing timestamps to derive duration and average FPS"
            );
        }
        write_table(&output_directory.join(format!("{label}_frames.csv")), &records)?;

        let unverified = records
            .iter()
            .filter(|record| record.hash_verified == Some(false))
            .count();
        if unverified > 0 {
            log::warn!("[{label}] {unverified} frame(s) failed hash round-trip verification");
        }

        log::info!(
            "[{label}] Completed | Frames: {} | Duration: {:.6} sec | Average FPS: {:.6}",
            records.len(),
            analysis.total_duration,
            analysis.average_fps,
        );

        Ok(Some(VideoRecord {
            video: video.to_path_buf(),
            mode: ProcessingMode::Decode,
            codec: stream.codec,
            summary: UnitSummary::Frames {
                frames: records.len(),
                pixel_format: stream.pixel_format,
                total_duration: analysis.total_duration,
                average_fps: analysis.average_fps,
            },
            output_directory: output_directory.to_path_buf(),
        }))
    }

    fn process_packets(
        &self,
        media: &mut MediaFile,
        video: &Path,
        output_directory: &Path,
        label: &str,
    ) -> Result<Option<VideoRecord>, FrameproofError> {
        let Some(stream) = media.video_stream().cloned() else {
            return Err(FrameproofError::NoVideoStream);
        };

        let records = collect_packet_records(readable_packets(media.packet_iter()?, label));

        if records.is_empty() {
            log::warn!("[{label}] No packets with PTS found");
            return Ok(None);
        }

        write_table(&output_directory.join(format!("{label}_pts_only.csv")), &records)?;
        log::info!("[{label}] PTS-only mode complete | Packets: {}", records.len());

        Ok(Some(VideoRecord {
            video: video.to_path_buf(),
            mode: ProcessingMode::PtsOnly,
            codec: stream.codec,
            summary: UnitSummary::Packets {
                packets: records.len(),
                time_base: format_time_base(stream.time_base),
                duration: stream.declared_duration,
            },
            output_directory: output_directory.to_path_buf(),
        }))
    }
}

/// Build frame rows from decoded frames, in the order given.
///
/// When `frames_directory` is set each frame is saved there through `store`,
/// reloaded, and its round-trip result recorded. Timing columns are left
/// empty; see [`apply_timing`].
///
/// # Errors
///
/// Fails if a frame cannot be saved or reloaded.
pub fn collect_frame_records<I>(
    frames: I,
    frames_directory: Option<&Path>,
    store: &dyn FrameStore,
    decode_method: &str,
) -> Result<Vec<FrameRecord>, FrameproofError>
where
    I: IntoIterator<Item = DecodedFrame>,
{
    let mut records = Vec::new();

    for frame in frames {
        let (pts, time_base, timestamp_seconds) = match (frame.pts, frame.time_base) {
            (Some(pts), Some(time_base)) => match pts_to_seconds(pts, time_base) {
                Some(seconds) => (Some(pts), Some(format_time_base(time_base)), Some(seconds)),
                None => (None, None, None),
            },
            _ => (None, None, None),
        };

        let (decoded_sha256, image_sha256, hash_verified, image_file) = match frames_directory {
            Some(directory) => {
                let file_name = frame_file_name(frame.index, pts, store.extension());
                let verification =
                    hashing::verify_round_trip(store, &frame.image, &directory.join(&file_name))?;
                (
                    verification.decoded_hash,
                    Some(verification.image_hash),
                    Some(verification.verified),
                    Some(file_name),
                )
            }
            None => (hashing::sha256_hex(frame.image.as_raw()), None, None, None),
        };

        records.push(FrameRecord {
            frame_index: frame.index,
            pts,
            time_base,
            timestamp_seconds,
            frame_duration: None,
            fps: None,
            key_frame: frame.key_frame,
            decoded_sha256,
            image_sha256,
            hash_verified,
            image_file,
            decode_method: decode_method.to_string(),
            decode_hwaccel: None,
        });
    }

    Ok(records)
}

/// Fill `frame_duration` and `fps` on `records` and return the aggregates.
pub fn apply_timing(records: &mut [FrameRecord]) -> TimingAnalysis {
    let timestamps: Vec<Option<f64>> = records
        .iter()
        .map(|record| record.timestamp_seconds)
        .collect();
    let analysis = timing::analyze_timestamps(&timestamps);

    for (record, interval) in records.iter_mut().zip(&analysis.intervals) {
        record.frame_duration = interval.map(|interval| interval.duration);
        record.fps = interval.map(|interval| interval.fps);
    }
    analysis
}

/// Build packet rows, dropping packets without a PTS.
///
/// Survivors are numbered contiguously from zero.
pub fn collect_packet_records<I>(packets: I) -> Vec<PacketRecord>
where
    I: IntoIterator<Item = PacketInfo>,
{
    packets
        .into_iter()
        .filter_map(|packet| packet.pts.map(|pts| (pts, packet)))
        .enumerate()
        .map(|(index, (pts, packet))| PacketRecord {
            packet_index: index as u64,
            pts,
            dts: packet.dts,
            duration: packet.duration,
            time_base: format_time_base(packet.time_base),
            timestamp_seconds: pts_to_seconds(pts, packet.time_base),
            is_keyframe: packet.is_keyframe,
        })
        .collect()
}

/// Drop packet read failures with a warning and keep walking.
fn readable_packets<'a, I>(packets: I, label: &'a str) -> impl Iterator<Item = PacketInfo> + 'a
where
    I: IntoIterator<Item = Result<PacketInfo, FrameproofError>>,
    I::IntoIter: 'a,
{
    packets.into_iter().filter_map(move |result| match result {
        Ok(packet) => Some(packet),
        Err(error) => {
            log::warn!("[{label}] Skipping packet read failure: {error}");
            None
        }
    })
}

/// `frame_<index>_pts_<pts>.<ext>`, with `no_pts` standing in for a missing PTS.
pub fn frame_file_name(index: u64, pts: Option<i64>, extension: &str) -> String {
    match pts {
        Some(pts) => format!("frame_{index:06}_pts_{pts}.{extension}"),
        None => format!("frame_{index:06}_pts_{NO_PTS_LABEL}.{extension}"),
    }
}

/// Name used for log prefixes and table file names.
fn video_label(video: &Path, output_directory: &Path) -> String {
    output_directory
        .file_name()
        .or_else(|| video.file_stem())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| video.display().to_string())
}
