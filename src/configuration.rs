//! Run configuration.
//!
//! [`RunConfiguration`] is an immutable value built once per case and handed
//! to every component. It carries the processing-mode flags together with the
//! fixed provenance constants (hash algorithm, decode method) that end up in
//! every frame table and in the manifest.
//!
//! # Example
//!
//! ```
//! use frameproof::{ProcessingMode, RunConfiguration};
//!
//! let config = RunConfiguration::new().with_no_frames(true).with_workers(2);
//! assert_eq!(config.mode(), ProcessingMode::Decode);
//! assert!(!config.persist_frames());
//! assert_eq!(config.workers(), 2);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use log::LevelFilter;
use serde::Serialize;

/// Digest algorithm applied to decoded and reloaded pixel buffers.
pub const HASH_ALGORITHM: &str = "sha256";

/// Decoder path used for every frame. Only software decoding is performed.
pub const DECODE_METHOD: &str = "cpu";

/// Which kind of unit a video is broken into.
///
/// The mode is chosen once for the whole case, never per video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProcessingMode {
    /// Decode every frame, hash it, and optionally persist it as PNG.
    #[serde(rename = "decode")]
    Decode,
    /// Enumerate demuxed packets without decoding.
    #[serde(rename = "pts-only")]
    PtsOnly,
}

impl Display for ProcessingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ProcessingMode::Decode => write!(f, "decode"),
            ProcessingMode::PtsOnly => write!(f, "pts-only"),
        }
    }
}

/// The mode flags exactly as the operator supplied them.
///
/// Serialized verbatim into the manifest's `processing_modes` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProcessingModes {
    /// `--pts-only` was given.
    pub pts_only: bool,
    /// `--no-frames` was given.
    pub no_frames: bool,
}

/// Immutable settings for one case.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    pub(crate) modes: ProcessingModes,
    pub(crate) workers: usize,
    pub(crate) log_level: LevelFilter,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

impl RunConfiguration {
    /// Create a configuration for full decode mode with frame persistence.
    ///
    /// The worker bound defaults to [`default_worker_count`].
    pub fn new() -> Self {
        Self {
            modes: ProcessingModes::default(),
            workers: default_worker_count(),
            log_level: LevelFilter::Info,
        }
    }

    /// Skip PNG persistence (and therefore round-trip verification).
    pub fn with_no_frames(mut self, no_frames: bool) -> Self {
        self.modes.no_frames = no_frames;
        self
    }

    /// Switch to packet-level processing.
    pub fn with_pts_only(mut self, pts_only: bool) -> Self {
        self.modes.pts_only = pts_only;
        self
    }

    /// Override the worker bound. Zero is raised to one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Most verbose level written to the case log.
    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    /// The mode every video in this case is processed with.
    pub fn mode(&self) -> ProcessingMode {
        if self.modes.pts_only {
            ProcessingMode::PtsOnly
        } else {
            ProcessingMode::Decode
        }
    }

    /// The raw mode flags.
    pub fn modes(&self) -> ProcessingModes {
        self.modes
    }

    /// Whether decoded frames are written to disk and reloaded.
    pub fn persist_frames(&self) -> bool {
        !self.modes.no_frames
    }

    /// Maximum number of videos processed at once.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Most verbose level written to the case log.
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    /// Digest algorithm name recorded in the manifest.
    pub fn hash_algorithm(&self) -> &'static str {
        HASH_ALGORITHM
    }

    /// Decode method tag recorded on every frame row.
    pub fn decode_method(&self) -> &'static str {
        DECODE_METHOD
    }
}

/// Available parallelism minus one, never below one.
///
/// One core is left for the log listener and the orchestrating thread.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_decode_with_persistence() {
        let config = RunConfiguration::new();
        assert_eq!(config.mode(), ProcessingMode::Decode);
        assert!(config.persist_frames());
        assert!(config.workers() >= 1);
        assert_eq!(config.hash_algorithm(), "sha256");
        assert_eq!(config.decode_method(), "cpu");
    }

    #[test]
    fn pts_only_wins_over_decode() {
        let config = RunConfiguration::new()
            .with_pts_only(true)
            .with_no_frames(true);
        assert_eq!(config.mode(), ProcessingMode::PtsOnly);
        assert_eq!(
            config.modes(),
            ProcessingModes {
                pts_only: true,
                no_frames: true
            }
        );
    }

    #[test]
    fn zero_workers_is_raised_to_one() {
        assert_eq!(RunConfiguration::new().with_workers(0).workers(), 1);
    }

    #[test]
    fn mode_serializes_with_hyphen() {
        let json = serde_json::to_string(&ProcessingMode::PtsOnly).unwrap();
        assert_eq!(json, "\"pts-only\"");
        assert_eq!(ProcessingMode::Decode.to_string(), "decode");
    }
}
