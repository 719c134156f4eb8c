use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use frameproof::{CaseManager, FfmpegLogLevel, RunConfiguration};
use log::LevelFilter;

const CLI_AFTER_HELP: &str = "Examples:\n  frameproof -i evidence/clip.mp4 -o cases\n  frameproof -i evidence/ -o cases --no-frames\n  frameproof -i evidence/ -o cases --pts-only --workers 2";

#[derive(Debug, Parser)]
#[command(
    name = "frameproof",
    version,
    about = "Forensic video processor: extract, hash, verify and time every frame",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Video file, or directory of videos, to process.
    #[arg(short, long)]
    input: PathBuf,

    /// Root directory under which the case directory is created.
    #[arg(short, long)]
    output: PathBuf,

    /// Decode and hash frames but do not save them as images.
    #[arg(long)]
    no_frames: bool,

    /// Record demuxed packet timestamps only, without decoding.
    #[arg(long)]
    pts_only: bool,

    /// Maximum number of videos processed at once.
    #[arg(long)]
    workers: Option<usize>,

    /// Include debug records in the case log.
    #[arg(long)]
    verbose: bool,

    /// FFmpeg's own stderr verbosity (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, default_value = "error")]
    ffmpeg_log_level: String,
}

fn build_configuration(cli: &Cli) -> RunConfiguration {
    let mut config = RunConfiguration::new()
        .with_no_frames(cli.no_frames)
        .with_pts_only(cli.pts_only)
        .with_log_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        });
    if let Some(workers) = cli.workers {
        config = config.with_workers(workers);
    }
    config
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let ffmpeg_level: FfmpegLogLevel = cli.ffmpeg_log_level.parse()?;
    frameproof::set_ffmpeg_log_level(ffmpeg_level);

    if cli.pts_only && cli.no_frames {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            "--no-frames has no effect together with --pts-only".yellow()
        );
    }

    let manager = CaseManager::new(build_configuration(&cli));
    let outcome = manager.run(&cli.input, &cli.output)?;

    println!(
        "{} {}",
        "success:".green().bold(),
        format!(
            "{} video(s) recorded in {} mode: {}",
            outcome.manifest.videos_processed.len(),
            manager.config().mode(),
            outcome.manifest_path.display()
        )
        .green()
    );
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
