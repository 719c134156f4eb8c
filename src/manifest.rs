//! Case provenance manifest.
//!
//! The manifest is the single structured record of a case: what was
//! processed, in which mode, with which tool and FFmpeg build, and what each
//! video yielded. It is written once, after every worker has finished.

use std::{collections::BTreeMap, ffi::CStr, fs, path::Path, path::PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::{
    configuration::{ProcessingModes, RunConfiguration},
    error::FrameproofError,
    records::VideoRecord,
};

/// File name of the manifest inside the case directory.
pub const MANIFEST_FILE_NAME: &str = "case_provenance_manifest.json";

/// Tool and library versions in effect for the case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Environment {
    /// `<os>-<arch>`, e.g. `linux-x86_64`.
    pub platform: String,
    pub tool_name: String,
    pub tool_version: String,
    /// FFmpeg build string as reported by libavutil.
    pub ffmpeg_version: String,
    /// `major.minor.micro` of each linked FFmpeg library.
    pub ffmpeg_libraries: BTreeMap<String, String>,
}

impl Environment {
    /// Describe the running process.
    pub fn capture() -> Self {
        let mut ffmpeg_libraries = BTreeMap::new();
        ffmpeg_libraries.insert(
            "libavutil".to_string(),
            format_library_version(ffmpeg_next::util::version()),
        );
        ffmpeg_libraries.insert(
            "libavcodec".to_string(),
            format_library_version(ffmpeg_next::codec::version()),
        );
        ffmpeg_libraries.insert(
            "libavformat".to_string(),
            format_library_version(ffmpeg_next::format::version()),
        );
        ffmpeg_libraries.insert(
            "libswscale".to_string(),
            format_library_version(ffmpeg_next::software::scaling::version()),
        );

        Self {
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            tool_name: env!("CARGO_PKG_NAME").to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            ffmpeg_version: ffmpeg_build_version(),
            ffmpeg_libraries,
        }
    }
}

/// The case-level provenance record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    pub case_id: String,
    pub case_start_utc: String,
    pub case_end_utc: String,
    pub environment: Environment,
    pub processing_modes: ProcessingModes,
    pub hash_algorithm: String,
    pub decode_method: String,
    pub input_path: PathBuf,
    /// Successfully processed videos, in input order.
    pub videos_processed: Vec<VideoRecord>,
    pub log_file: PathBuf,
}

impl Manifest {
    /// Assemble a manifest from the finished case.
    pub fn new(
        case_id: &str,
        started: DateTime<Utc>,
        finished: DateTime<Utc>,
        config: &RunConfiguration,
        input_path: &Path,
        videos_processed: Vec<VideoRecord>,
        log_file: &Path,
    ) -> Self {
        Self {
            case_id: case_id.to_string(),
            case_start_utc: format_utc(started),
            case_end_utc: format_utc(finished),
            environment: Environment::capture(),
            processing_modes: config.modes(),
            hash_algorithm: config.hash_algorithm().to_string(),
            decode_method: config.decode_method().to_string(),
            input_path: input_path.to_path_buf(),
            videos_processed,
            log_file: log_file.to_path_buf(),
        }
    }

    /// Write the manifest as pretty-printed JSON to `path`.
    pub fn write(&self, path: &Path) -> Result<(), FrameproofError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// RFC 3339 with microseconds and an explicit `+00:00` offset.
pub fn format_utc(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// FFmpeg packs library versions as `major << 16 | minor << 8 | micro`.
fn format_library_version(packed: u32) -> String {
    format!("{}.{}.{}", packed >> 16, (packed >> 8) & 0xff, packed & 0xff)
}

fn ffmpeg_build_version() -> String {
    // SAFETY: av_version_info returns a pointer to a static NUL-terminated string.
    let raw = unsafe { ffmpeg_sys_next::av_version_info() };
    if raw.is_null() {
        return "unknown".to_string();
    }
    unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned()
}
