//! Benchmarks for hashing, timing, and whole-video processing.
//!
//! Run with: cargo bench
//!
//! Video benchmarks require `tests/fixtures/sample_video.mp4`
//! (see `tests/fixtures/generate_fixtures.sh`).

use std::{hint::black_box, path::Path};

use criterion::{BenchmarkId, Criterion};
use frameproof::{
    FfmpegLogLevel, PngFrameStore, RunConfiguration, VideoUnit, hashing::sha256_hex,
    set_ffmpeg_log_level, timing::analyze_timestamps,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn benchmark_frame_hashing(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("sha256 of RGB24 frame");
    for (width, height) in [(320_usize, 240_usize), (1280, 720), (1920, 1080)] {
        let buffer = vec![0x5a_u8; width * height * 3];
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &buffer,
            |bencher, buffer| bencher.iter(|| sha256_hex(black_box(buffer))),
        );
    }
    group.finish();
}

fn benchmark_timing_analysis(criterion: &mut Criterion) {
    let timestamps: Vec<Option<f64>> = (0..100_000)
        .map(|frame| {
            if frame % 97 == 0 {
                None
            } else {
                Some(frame as f64 / 29.97)
            }
        })
        .collect();

    criterion.bench_function("analyze 100k timestamps", |bencher| {
        bencher.iter(|| analyze_timestamps(black_box(&timestamps)));
    });
}

fn benchmark_video_processing(criterion: &mut Criterion) {
    set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let output = tempfile::tempdir().unwrap();
    let mut group = criterion.benchmark_group("process sample video");
    group.sample_size(10);

    for (name, config) in [
        ("decode + persist", RunConfiguration::new()),
        ("decode, no frames", RunConfiguration::new().with_no_frames(true)),
        ("pts only", RunConfiguration::new().with_pts_only(true)),
    ] {
        group.bench_function(name, |bencher| {
            let unit = VideoUnit::new(&config, &PngFrameStore);
            bencher.iter(|| {
                unit.process(Path::new(SAMPLE_VIDEO), &output.path().join("sample_video"))
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_frame_hashing,
    benchmark_timing_analysis,
    benchmark_video_processing,
);
criterion::criterion_main!(benches);
