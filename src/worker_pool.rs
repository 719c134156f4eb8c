//! Bounded parallel execution of video units.
//!
//! [`run_jobs`] distributes [`VideoJob`]s across a dedicated [`rayon`] pool.
//! Each worker opens its own demuxer and decoder, so there is no shared
//! mutable state between units; only log records leave a worker, through the
//! case log channel. Results come back in submission order regardless of
//! which video finishes first.

use std::{
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
};

use rayon::{
    ThreadPoolBuilder,
    iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator},
};

use crate::{
    configuration::RunConfiguration, error::FrameproofError, hashing::FrameStore,
    records::VideoRecord, video_unit::VideoUnit,
};

/// A self-contained unit of work: one video and where its outputs go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoJob {
    pub video: PathBuf,
    pub output_directory: PathBuf,
}

/// Process every job with at most `config.workers()` running at once.
///
/// The returned vector is aligned with `jobs`: entry `i` is the outcome of
/// `jobs[i]`, `None` if that video failed. A unit that panics is logged and
/// reported as `None`; its siblings are unaffected.
///
/// # Errors
///
/// Fails only if the worker threads cannot be spawned.
pub fn run_jobs(
    jobs: &[VideoJob],
    config: &RunConfiguration,
    store: &dyn FrameStore,
) -> Result<Vec<Option<VideoRecord>>, FrameproofError> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(config.workers())
        .thread_name(|index| format!("worker-{}", index + 1))
        .build()
        .map_err(|error| FrameproofError::IoError(std::io::Error::other(error)))?;

    log::info!(
        "Dispatching {} video(s) across {} worker(s)",
        jobs.len(),
        config.workers()
    );

    let unit = VideoUnit::new(config, store);
    let results: Vec<Option<VideoRecord>> = pool.install(|| {
        jobs.par_iter()
            .with_max_len(1)
            .map(|job| run_job(&unit, job))
            .collect()
    });
    Ok(results)
}

fn run_job(unit: &VideoUnit<'_>, job: &VideoJob) -> Option<VideoRecord> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        unit.process(&job.video, &job.output_directory)
    }));
    match outcome {
        Ok(record) => record,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|message| message.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!("Worker panicked on {}: {reason}", job.video.display());
            None
        }
    }
}
