//! VFR timing integration tests.

use ffmpeg_next::Rational;
use frameproof::pts_to_seconds;
use frameproof::timing::analyze_timestamps;

#[test]
fn uneven_spacing_yields_per_frame_rates() {
    let analysis = analyze_timestamps(&[Some(0.0), Some(1.0), Some(2.5)]);

    let durations: Vec<Option<f64>> = analysis
        .intervals
        .iter()
        .map(|interval| interval.map(|interval| interval.duration))
        .collect();
    assert_eq!(durations, vec![Some(1.0), Some(1.5), None]);

    let fps = analysis.intervals[1].expect("second interval").fps;
    assert!((fps - 1.0 / 1.5).abs() < 1e-12);
    assert_eq!(analysis.total_duration, 2.5);
    assert_eq!(analysis.average_fps, 0.8);
}

#[test]
fn uniform_ticks_match_nominal_rate() {
    let time_base = Rational::new(1, 15360);
    let timestamps: Vec<Option<f64>> = (0..300)
        .map(|frame| pts_to_seconds(frame * 512, time_base))
        .collect();

    let analysis = analyze_timestamps(&timestamps);

    assert_eq!(analysis.valid_timestamps, 300);
    for interval in analysis.intervals.iter().take(299) {
        let interval = interval.expect("every pair is increasing");
        assert!((interval.fps - 30.0).abs() < 1e-9, "got {}", interval.fps);
    }
    assert!((analysis.average_fps - 30.0).abs() < 1e-9);
}

#[test]
fn disordered_timestamps_never_produce_non_finite_values() {
    let timestamps = [
        Some(0.0),
        Some(0.0),
        Some(0.04),
        Some(0.02),
        None,
        Some(0.08),
        Some(0.08),
        Some(0.12),
    ];

    let analysis = analyze_timestamps(&timestamps);

    for interval in analysis.intervals.iter().flatten() {
        assert!(interval.duration > 0.0);
        assert!(interval.fps.is_finite());
    }
    assert!(analysis.total_duration.is_finite());
    assert!(analysis.average_fps.is_finite());
    assert_eq!(analysis.valid_timestamps, 7);
}

#[test]
fn too_few_timestamps_report_no_aggregate() {
    for timestamps in [vec![], vec![Some(4.0)], vec![None, Some(1.0), None]] {
        let analysis = analyze_timestamps(&timestamps);
        assert_eq!(analysis.total_duration, 0.0);
        assert_eq!(analysis.average_fps, 0.0);
        assert!(!analysis.has_aggregate());
    }
}
