//! Case orchestration.
//!
//! A case is one end-to-end run: a fresh timestamped directory under the
//! output root, a case log, one [`VideoJob`] per input video, and finally the
//! provenance manifest. [`CaseManager::run`] drives those steps in order and
//! guarantees the log listener is drained before it returns.
//!
//! # Example
//!
//! ```no_run
//! use frameproof::{CaseManager, RunConfiguration};
//!
//! let manager = CaseManager::new(RunConfiguration::new().with_no_frames(true));
//! let outcome = manager.run("evidence/".as_ref(), "cases/".as_ref())?;
//! println!("{} video(s) recorded in {}", outcome.manifest.videos_processed.len(),
//!     outcome.manifest_path.display());
//! # Ok::<(), frameproof::FrameproofError>(())
//! ```

use std::{
    collections::HashSet,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};

use crate::{
    configuration::RunConfiguration,
    error::FrameproofError,
    hashing::{FrameStore, PngFrameStore},
    logging::CaseLog,
    manifest::{MANIFEST_FILE_NAME, Manifest},
    media::MediaFile,
    worker_pool::{self, VideoJob},
};

/// File name of the case log inside the case directory.
pub const LOG_FILE_NAME: &str = "case_processing.log";

/// What a completed case produced.
#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub case_id: String,
    pub case_directory: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
}

/// Runs cases with a fixed configuration.
pub struct CaseManager {
    config: RunConfiguration,
    store: Box<dyn FrameStore>,
}

impl CaseManager {
    /// A manager that persists frames as PNG.
    pub fn new(config: RunConfiguration) -> Self {
        Self {
            config,
            store: Box::new(PngFrameStore),
        }
    }

    /// Replace the frame persistence path.
    pub fn with_store(mut self, store: Box<dyn FrameStore>) -> Self {
        self.store = store;
        self
    }

    pub fn config(&self) -> &RunConfiguration {
        &self.config
    }

    /// Process everything under `input` into a new case below `output_root`.
    ///
    /// # Errors
    ///
    /// - [`FrameproofError::NoVideoFiles`] if `input` resolves to no videos.
    ///   The case directory and log exist but no manifest is written.
    /// - [`FrameproofError::CaseDirectory`], [`FrameproofError::Logging`] or
    ///   an I/O error if the case outputs cannot be created.
    pub fn run(&self, input: &Path, output_root: &Path) -> Result<CaseOutcome, FrameproofError> {
        let started = Utc::now();
        let (case_id, case_directory) = create_case_directory(output_root, started)?;
        let log_path = case_directory.join(LOG_FILE_NAME);
        let case_log = CaseLog::start(&log_path, self.config.log_level())?;

        let result = self.run_logged(input, started, &case_id, &case_directory, &log_path);
        if let Err(error) = &result {
            log::error!("{error}");
        }

        case_log.stop()?;
        result
    }

    fn run_logged(
        &self,
        input: &Path,
        started: DateTime<Utc>,
        case_id: &str,
        case_directory: &Path,
        log_path: &Path,
    ) -> Result<CaseOutcome, FrameproofError> {
        log::info!("Case ID: {case_id}");
        log::info!("Input: {}", input.display());
        log::debug!("Configuration: {:?}", self.config);

        let videos = resolve_inputs(input);
        if videos.is_empty() {
            return Err(FrameproofError::NoVideoFiles {
                path: input.to_path_buf(),
            });
        }
        log::info!("Found {} video file(s)", videos.len());

        let jobs = plan_jobs(&videos, case_directory);
        let results = worker_pool::run_jobs(&jobs, &self.config, self.store.as_ref())?;
        let videos_processed: Vec<_> = results.into_iter().flatten().collect();

        log::info!(
            "All videos processed ({} of {} recorded)",
            videos_processed.len(),
            jobs.len()
        );

        let manifest = Manifest::new(
            case_id,
            started,
            Utc::now(),
            &self.config,
            input,
            videos_processed,
            log_path,
        );
        let manifest_path = case_directory.join(MANIFEST_FILE_NAME);
        manifest.write(&manifest_path)?;
        log::info!(
            "Case provenance manifest written to: {}",
            manifest_path.display()
        );

        Ok(CaseOutcome {
            case_id: case_id.to_string(),
            case_directory: case_directory.to_path_buf(),
            manifest_path,
            manifest,
        })
    }
}

/// Resolve `input` to the videos to process.
///
/// A file resolves to itself. A directory resolves to every regular file in
/// it that [`MediaFile::probe`] accepts, sorted by path; anything else is
/// silently left out. A path that is neither resolves to nothing.
pub fn resolve_inputs(input: &Path) -> Vec<PathBuf> {
    if input.is_file() {
        return vec![input.to_path_buf()];
    }
    if !input.is_dir() {
        log::debug!("Input {} is neither a file nor a directory", input.display());
        return Vec::new();
    }

    let entries = match fs::read_dir(input) {
        Ok(entries) => entries,
        Err(error) => {
            log::warn!("Cannot read input directory {}: {error}", input.display());
            return Vec::new();
        }
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    candidates.sort();

    candidates
        .into_iter()
        .filter(|path| {
            let openable = MediaFile::probe(path);
            if !openable {
                log::debug!("Not a readable media file: {}", path.display());
            }
            openable
        })
        .collect()
}

/// Create `case_<YYYYMMDDTHHMMSSZ>` under `output_root`.
///
/// If that directory already exists, `_1`, `_2`, … are appended until an
/// unused name is found. Returns the case id and the directory.
pub fn create_case_directory(
    output_root: &Path,
    now: DateTime<Utc>,
) -> Result<(String, PathBuf), FrameproofError> {
    fs::create_dir_all(output_root).map_err(|source| FrameproofError::CaseDirectory {
        path: output_root.to_path_buf(),
        source,
    })?;

    let base = format!("case_{}", now.format("%Y%m%dT%H%M%SZ"));
    let mut attempt = 0_u32;
    loop {
        let case_id = if attempt == 0 {
            base.clone()
        } else {
            format!("{base}_{attempt}")
        };
        let directory = output_root.join(&case_id);
        match fs::create_dir(&directory) {
            Ok(()) => return Ok((case_id, directory)),
            Err(error) if error.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(source) => {
                return Err(FrameproofError::CaseDirectory {
                    path: directory,
                    source,
                });
            }
        }
    }
}

/// Assign each video its own output directory under `case_directory`.
///
/// Directories are named after the file stem. A stem already taken gets the
/// extension appended (`clip_mkv`), then a numeric suffix, so no two jobs
/// ever write to the same place.
pub fn plan_jobs(videos: &[PathBuf], case_directory: &Path) -> Vec<VideoJob> {
    let mut taken: HashSet<String> = HashSet::new();

    videos
        .iter()
        .map(|video| {
            let stem = video
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .filter(|stem| !stem.is_empty())
                .unwrap_or_else(|| "video".to_string());

            let mut name = stem.clone();
            if taken.contains(&name) {
                if let Some(extension) = video.extension() {
                    name = format!("{stem}_{}", extension.to_string_lossy());
                }
            }
            let mut suffix = 1_u32;
            let base = name.clone();
            while taken.contains(&name) {
                name = format!("{base}_{suffix}");
                suffix += 1;
            }
            taken.insert(name.clone());

            VideoJob {
                video: video.clone(),
                output_directory: case_directory.join(name),
            }
        })
        .collect()
}
