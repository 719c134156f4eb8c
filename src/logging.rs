//! Centralized case logging.
//!
//! Every `log` record emitted anywhere in the process, from any worker
//! thread, is formatted on the emitting thread and pushed onto one channel.
//! A single listener thread drains that channel and writes each line, in
//! arrival order, to the case log file and to stdout. Writers never touch the
//! file directly, so concurrent workers cannot interleave partial lines.
//!
//! [`CaseLog::stop`] is a barrier: it disconnects the channel, waits for the
//! listener to write everything still queued, and flushes the file.
//!
//! # Example
//!
//! ```no_run
//! use frameproof::logging::CaseLog;
//! use log::LevelFilter;
//!
//! let case_log = CaseLog::start("case_processing.log".as_ref(), LevelFilter::Info)?;
//! log::info!("Case started");
//! case_log.stop()?;
//! # Ok::<(), frameproof::FrameproofError>(())
//! ```

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::{OnceLock, RwLock},
    thread::{self, JoinHandle},
};

use chrono::Utc;
use colored::Colorize;
use crossbeam_channel::{Receiver, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::error::FrameproofError;

/// Name of the listener thread.
const LISTENER_THREAD_NAME: &str = "log-listener";

/// The sending half of the active case's channel. `None` between cases.
static ACTIVE_SENDER: RwLock<Option<Sender<LogEntry>>> = RwLock::new(None);

/// Whether [`FUNNEL`] became the process logger.
static INSTALLED: OnceLock<bool> = OnceLock::new();

static FUNNEL: FunnelLogger = FunnelLogger;

/// One formatted log record in transit to the listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// `YYYY-MM-DD HH:MM:SS,mmm` in UTC.
    pub timestamp: String,
    /// Name of the emitting thread.
    pub worker: String,
    pub level: Level,
    pub message: String,
}

impl LogEntry {
    /// The line written to the log file.
    pub fn to_line(&self) -> String {
        format!(
            "{} [{}] {}: {}",
            self.timestamp,
            self.worker,
            level_name(self.level),
            self.message
        )
    }

    fn to_console_line(&self) -> String {
        let level = level_name(self.level);
        let level = match self.level {
            Level::Error => level.red().bold(),
            Level::Warn => level.yellow().bold(),
            Level::Info => level.green(),
            Level::Debug | Level::Trace => level.dimmed(),
        };
        format!(
            "{} [{}] {}: {}",
            self.timestamp.dimmed(),
            self.worker.cyan(),
            level,
            self.message
        )
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

/// The process-wide `log` implementation. Forwards to the active case.
struct FunnelLogger;

impl Log for FunnelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let Ok(slot) = ACTIVE_SENDER.read() else {
            return;
        };
        let Some(sender) = slot.as_ref() else {
            return;
        };

        let current = thread::current();
        let entry = LogEntry {
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S,%3f").to_string(),
            worker: current.name().unwrap_or("unnamed").to_string(),
            level: record.level(),
            message: record.args().to_string(),
        };
        // The listener only disappears after the sender is withdrawn.
        let _ = sender.send(entry);
    }

    fn flush(&self) {}
}

/// Handle to a running listener. Dropping it stops the listener too, but
/// only [`CaseLog::stop`] reports write failures.
#[derive(Debug)]
pub struct CaseLog {
    path: PathBuf,
    listener: Option<JoinHandle<std::io::Result<()>>>,
}

impl CaseLog {
    /// Create the log file, start the listener and route `log` output to it.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be created, if another `log` implementation
    /// already owns the process, or if a case log is already running.
    pub fn start(path: &Path, level: LevelFilter) -> Result<Self, FrameproofError> {
        let installed = *INSTALLED.get_or_init(|| log::set_logger(&FUNNEL).is_ok());
        if !installed {
            return Err(FrameproofError::Logging(
                "another logger is already installed for this process".to_string(),
            ));
        }

        let file = File::create(path)?;
        let (sender, receiver) = crossbeam_channel::unbounded();

        {
            let mut slot = ACTIVE_SENDER
                .write()
                .map_err(|_| FrameproofError::Logging("log channel lock poisoned".to_string()))?;
            if slot.is_some() {
                return Err(FrameproofError::Logging(
                    "a case log is already active".to_string(),
                ));
            }
            *slot = Some(sender);
        }

        let spawned = thread::Builder::new()
            .name(LISTENER_THREAD_NAME.to_string())
            .spawn(move || listen(receiver, BufWriter::new(file)));
        let listener = match spawned {
            Ok(handle) => handle,
            Err(error) => {
                withdraw_sender();
                return Err(error.into());
            }
        };

        log::set_max_level(level);

        Ok(Self {
            path: path.to_path_buf(),
            listener: Some(listener),
        })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disconnect producers, drain every queued entry, and join the listener.
    ///
    /// # Errors
    ///
    /// Returns the first error the listener hit while writing the file.
    pub fn stop(mut self) -> Result<(), FrameproofError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), FrameproofError> {
        withdraw_sender();
        match self.listener.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| FrameproofError::Logging("log listener panicked".to_string()))?
                .map_err(FrameproofError::from),
            None => Ok(()),
        }
    }
}

impl Drop for CaseLog {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

/// Drop the active sender so the listener's receive loop ends once drained.
fn withdraw_sender() {
    let sender = match ACTIVE_SENDER.write() {
        Ok(mut slot) => slot.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    };
    drop(sender);
}

fn listen(receiver: Receiver<LogEntry>, mut file: BufWriter<File>) -> std::io::Result<()> {
    let mut first_error = None;

    for entry in receiver {
        if let Err(error) = writeln!(file, "{}", entry.to_line()) {
            first_error.get_or_insert(error);
        }
        let stdout = std::io::stdout();
        let _ = writeln!(stdout.lock(), "{}", entry.to_console_line());
    }

    if let Err(error) = file.flush() {
        first_error.get_or_insert(error);
    }
    match first_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
