//! # frameproof
//!
//! Forensic frame extraction for video evidence. Every decodable frame is
//! fingerprinted, optionally persisted as a lossless image whose fingerprint
//! is re-derived after reload, and timed with variable-frame-rate-aware
//! arithmetic. Each run ("case") produces an isolated output tree, a
//! centralized log, and a provenance manifest describing exactly what was
//! processed and how.
//!
//! ## Quick Start
//!
//! ```no_run
//! use frameproof::{CaseManager, RunConfiguration};
//!
//! let manager = CaseManager::new(RunConfiguration::new());
//! let outcome = manager.run("evidence/clip.mp4".as_ref(), "cases".as_ref())?;
//! for video in &outcome.manifest.videos_processed {
//!     println!("{}: {} frames", video.video.display(), video.unit_count());
//! }
//! # Ok::<(), frameproof::FrameproofError>(())
//! ```
//!
//! ## Case layout
//!
//! ```text
//! <output>/case_<UTC timestamp>/
//!     case_processing.log
//!     case_provenance_manifest.json
//!     <video-name>/
//!         <video-name>_frames.csv     (decode mode)
//!         <video-name>_pts_only.csv   (PTS-only mode)
//!         frames/frame_<index>_pts_<pts>.png
//! ```
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed for `ffmpeg-next` to link.

pub mod case;
pub mod configuration;
mod conversion;
pub mod error;
pub mod ffmpeg;
pub mod frame_iterator;
pub mod hashing;
pub mod logging;
pub mod manifest;
pub mod media;
pub mod packet_iterator;
pub mod records;
pub mod timing;
pub mod video_unit;
pub mod worker_pool;

pub use case::{CaseManager, CaseOutcome};
pub use configuration::{ProcessingMode, ProcessingModes, RunConfiguration};
pub use conversion::{format_time_base, pts_to_seconds};
pub use error::FrameproofError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use frame_iterator::{DecodedFrame, FrameIterator};
pub use hashing::{FrameStore, PngFrameStore, Verification};
pub use manifest::{Environment, Manifest};
pub use media::{MediaFile, VideoStreamInfo};
pub use packet_iterator::{PacketInfo, PacketIterator};
pub use records::{CodecIdentity, FrameRecord, PacketRecord, UnitSummary, VideoRecord};
pub use timing::{FrameInterval, TimingAnalysis};
pub use video_unit::VideoUnit;
pub use worker_pool::VideoJob;
