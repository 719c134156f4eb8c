//! Single-video processing integration tests.

mod common;

use std::fs;
use std::path::Path;

use frameproof::hashing::sha256_hex;
use frameproof::video_unit::FRAMES_DIRECTORY;
use frameproof::{MediaFile, PngFrameStore, ProcessingMode, RunConfiguration, UnitSummary, VideoUnit};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn read_rows(path: &Path) -> Vec<csv::StringRecord> {
    let mut reader = csv::Reader::from_path(path).expect("open table");
    reader.records().map(|row| row.expect("row")).collect()
}

fn column(path: &Path, name: &str) -> Vec<String> {
    let mut reader = csv::Reader::from_path(path).expect("open table");
    let index = reader
        .headers()
        .unwrap()
        .iter()
        .position(|header| header == name)
        .expect("column present");
    reader
        .records()
        .map(|row| row.expect("row")[index].to_string())
        .collect()
}

#[test]
fn generated_clip_decodes_with_exact_timing() {
    let directory = tempfile::tempdir().unwrap();
    let clip = directory.path().join("clip.y4m");
    common::write_y4m(&clip, 5);
    let output = directory.path().join("clip");

    let config = RunConfiguration::new();
    let record = VideoUnit::new(&config, &PngFrameStore)
        .process(&clip, &output)
        .expect("record");

    assert_eq!(record.unit_count(), 5);
    match &record.summary {
        UnitSummary::Frames {
            total_duration,
            average_fps,
            ..
        } => {
            assert!((total_duration - 0.16).abs() < 1e-9);
            assert!((average_fps - f64::from(common::Y4M_FPS)).abs() < 1e-9);
        }
        other => panic!("unexpected summary: {other:?}"),
    }

    let table = output.join("clip_frames.csv");
    assert_eq!(column(&table, "frame_index"), vec!["0", "1", "2", "3", "4"]);
    assert_eq!(column(&table, "time_base"), vec!["1/25"; 5]);
    assert!(column(&table, "hash_verified").iter().all(|value| value == "true"));
    let fps = column(&table, "fps");
    assert_eq!(fps[4], "");
    for value in &fps[..4] {
        assert!((value.parse::<f64>().unwrap() - 25.0).abs() < 1e-9);
    }

    let hashes = column(&table, "decoded_sha256");
    let mut distinct = hashes.clone();
    distinct.sort();
    distinct.dedup();
    assert_eq!(distinct.len(), hashes.len());
    assert!(output.join(FRAMES_DIRECTORY).join("frame_000004_pts_4.png").is_file());
}

#[test]
fn generated_clip_in_pts_only_mode() {
    let directory = tempfile::tempdir().unwrap();
    let clip = directory.path().join("clip.y4m");
    common::write_y4m(&clip, 3);
    let output = directory.path().join("clip");

    let config = RunConfiguration::new().with_pts_only(true);
    let record = VideoUnit::new(&config, &PngFrameStore)
        .process(&clip, &output)
        .expect("record");

    assert_eq!(record.mode, ProcessingMode::PtsOnly);
    let table = output.join("clip_pts_only.csv");
    assert_eq!(column(&table, "packet_index"), vec!["0", "1", "2"]);
    assert_eq!(column(&table, "pts"), vec!["0", "1", "2"]);
    assert!(!output.join(FRAMES_DIRECTORY).exists());
}

#[test]
fn audio_only_input_yields_no_record() {
    let directory = tempfile::tempdir().unwrap();
    let track = directory.path().join("track.wav");
    common::write_wav(&track, 800);
    let output = directory.path().join("track");

    let config = RunConfiguration::new();
    let record = VideoUnit::new(&config, &PngFrameStore).process(&track, &output);

    assert!(record.is_none());
    assert!(!output.join("track_frames.csv").exists());
}

#[test]
fn text_file_is_not_treated_as_video() {
    let directory = tempfile::tempdir().unwrap();
    let notes = directory.path().join("notes.txt");
    fs::write(&notes, "Exhibit 4: recovered from the lobby DVR.\n").unwrap();

    assert!(!MediaFile::probe(&notes));
    let config = RunConfiguration::new();
    assert!(
        VideoUnit::new(&config, &PngFrameStore)
            .process(&notes, &directory.path().join("notes"))
            .is_none()
    );
}

#[test]
fn decode_mode_writes_verified_frames() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let output = tempfile::tempdir().unwrap();
    let directory = output.path().join("sample_video");
    let config = RunConfiguration::new();
    let unit = VideoUnit::new(&config, &PngFrameStore);

    let record = unit.process(Path::new(path), &directory).expect("record");

    assert_eq!(record.mode, ProcessingMode::Decode);
    assert!(!record.codec.codec.is_empty());
    let table = directory.join("sample_video_frames.csv");
    let rows = read_rows(&table);
    assert_eq!(rows.len(), record.unit_count());

    let headers = csv::Reader::from_path(&table).unwrap().headers().unwrap().clone();
    let position = |name: &str| headers.iter().position(|header| header == name).unwrap();
    for row in &rows {
        assert_eq!(&row[position("hash_verified")], "true");
        assert_eq!(row[position("decoded_sha256")], row[position("image_sha256")]);
        let image_file = &row[position("image_file")];
        let saved = directory.join(FRAMES_DIRECTORY).join(image_file);
        let reloaded = image::open(&saved).expect("saved frame").into_rgb8();
        assert_eq!(sha256_hex(reloaded.as_raw()), row[position("image_sha256")]);
    }

    match record.summary {
        UnitSummary::Frames {
            total_duration,
            average_fps,
            ..
        } => {
            assert!(total_duration > 0.0);
            assert!(average_fps > 0.0);
        }
        other => panic!("unexpected summary: {other:?}"),
    }
}

#[test]
fn no_frames_mode_saves_nothing() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let output = tempfile::tempdir().unwrap();
    let directory = output.path().join("sample_video");
    let config = RunConfiguration::new().with_no_frames(true);
    let unit = VideoUnit::new(&config, &PngFrameStore);

    let record = unit.process(Path::new(path), &directory).expect("record");

    assert!(record.unit_count() > 0);
    assert!(!directory.join(FRAMES_DIRECTORY).exists());
    let rows = read_rows(&directory.join("sample_video_frames.csv"));
    assert_eq!(rows.len(), record.unit_count());
}

#[test]
fn pts_only_mode_matches_demuxed_packets() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let output = tempfile::tempdir().unwrap();
    let directory = output.path().join("sample_video");
    let config = RunConfiguration::new().with_pts_only(true);
    let unit = VideoUnit::new(&config, &PngFrameStore);

    let record = unit.process(Path::new(path), &directory).expect("record");

    let mut media = MediaFile::open(path).expect("open");
    let with_pts = media
        .packet_iter()
        .expect("packet_iter")
        .filter_map(|packet| packet.ok())
        .filter(|packet| packet.pts.is_some())
        .count();

    assert_eq!(record.mode, ProcessingMode::PtsOnly);
    assert_eq!(record.unit_count(), with_pts);
    assert!(!directory.join(FRAMES_DIRECTORY).exists());
    let rows = read_rows(&directory.join("sample_video_pts_only.csv"));
    assert_eq!(rows.len(), with_pts);
}

#[test]
fn repeated_runs_produce_identical_tables() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let output = tempfile::tempdir().unwrap();
    let config = RunConfiguration::new().with_no_frames(true);
    let unit = VideoUnit::new(&config, &PngFrameStore);

    let first = output.path().join("first").join("sample_video");
    let second = output.path().join("second").join("sample_video");
    unit.process(Path::new(path), &first).expect("first run");
    unit.process(Path::new(path), &second).expect("second run");

    let first_table = fs::read(first.join("sample_video_frames.csv")).unwrap();
    let second_table = fs::read(second.join("sample_video_frames.csv")).unwrap();
    assert_eq!(first_table, second_table);
}

#[test]
fn unreadable_video_yields_no_record() {
    let output = tempfile::tempdir().unwrap();
    let fake = output.path().join("fake.mp4");
    fs::write(&fake, b"definitely not a video").unwrap();

    let config = RunConfiguration::new();
    let unit = VideoUnit::new(&config, &PngFrameStore);

    assert!(unit.process(&fake, &output.path().join("fake")).is_none());
}
