//! Variable frame rate (VFR) timing.
//!
//! Frame intervals are never assumed constant. Each frame's duration is the
//! gap to the *next* frame's timestamp, and the overall rate is derived from
//! the first and last valid timestamps in decode order.
//!
//! # Example
//!
//! ```
//! use frameproof::timing::analyze_timestamps;
//!
//! let analysis = analyze_timestamps(&[Some(0.0), Some(1.0), Some(2.5)]);
//! assert_eq!(analysis.intervals[0].map(|i| i.duration), Some(1.0));
//! assert_eq!(analysis.intervals[2], None);
//! assert_eq!(analysis.total_duration, 2.5);
//! assert_eq!(analysis.average_fps, 0.8);
//! ```

/// Duration and instantaneous rate attributed to one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInterval {
    /// Seconds until the next frame.
    pub duration: f64,
    /// `1 / duration`.
    pub fps: f64,
}

/// Timing derived from a sequence of frame timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingAnalysis {
    /// One entry per input timestamp. `None` when the frame or its successor
    /// has no timestamp, or the successor is not strictly later.
    pub intervals: Vec<Option<FrameInterval>>,
    /// Last valid timestamp minus first valid timestamp, or `0.0` when that
    /// span cannot be measured.
    pub total_duration: f64,
    /// `(valid timestamps - 1) / total_duration`, or `0.0` alongside a zero
    /// `total_duration`.
    pub average_fps: f64,
    /// Number of timestamps that were present.
    pub valid_timestamps: usize,
}

impl TimingAnalysis {
    /// Whether there was enough timing data for the aggregates.
    ///
    /// A zero average means "insufficient data", never "instantaneous".
    pub fn has_aggregate(&self) -> bool {
        self.total_duration > 0.0
    }
}

/// Compute per-frame intervals and aggregate duration/FPS.
///
/// `timestamps` must be in decode order; they are not sorted. Out-of-order
/// or duplicate timestamps leave that pair unset rather than producing a
/// negative or infinite rate.
pub fn analyze_timestamps(timestamps: &[Option<f64>]) -> TimingAnalysis {
    let mut intervals = vec![None; timestamps.len()];
    for (index, pair) in timestamps.windows(2).enumerate() {
        intervals[index] = interval_between(pair[0], pair[1]);
    }

    let valid: Vec<f64> = timestamps.iter().flatten().copied().collect();
    let (total_duration, average_fps) = aggregate(&valid);

    log::trace!(
        "Timing over {} timestamps ({} valid): duration={total_duration:.6}s average_fps={average_fps:.6}",
        timestamps.len(),
        valid.len(),
    );

    TimingAnalysis {
        intervals,
        total_duration,
        average_fps,
        valid_timestamps: valid.len(),
    }
}

fn interval_between(current: Option<f64>, next: Option<f64>) -> Option<FrameInterval> {
    let (current, next) = (current?, next?);
    if !(next > current) {
        return None;
    }
    let duration = next - current;
    let fps = 1.0 / duration;
    if !fps.is_finite() {
        return None;
    }
    Some(FrameInterval { duration, fps })
}

fn aggregate(valid: &[f64]) -> (f64, f64) {
    let (Some(first), Some(last)) = (valid.first(), valid.last()) else {
        return (0.0, 0.0);
    };
    if valid.len() < 2 {
        return (0.0, 0.0);
    }

    let total_duration = last - first;
    if !(total_duration > 0.0) {
        return (0.0, 0.0);
    }
    let average_fps = (valid.len() - 1) as f64 / total_duration;
    (total_duration, average_fps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_frame_variable_rate() {
        let analysis = analyze_timestamps(&[Some(0.0), Some(1.0), Some(2.5)]);

        let first = analysis.intervals[0].unwrap();
        assert_eq!(first.duration, 1.0);
        assert_eq!(first.fps, 1.0);

        let second = analysis.intervals[1].unwrap();
        assert_eq!(second.duration, 1.5);
        assert_eq!(second.fps, 1.0 / 1.5);

        assert_eq!(analysis.intervals[2], None);
        assert_eq!(analysis.total_duration, 2.5);
        assert_eq!(analysis.average_fps, 0.8);
        assert!(analysis.has_aggregate());
    }

    #[test]
    fn duplicate_timestamp_leaves_pair_unset() {
        let analysis = analyze_timestamps(&[Some(0.5), Some(0.5), Some(1.0)]);
        assert_eq!(analysis.intervals[0], None);
        assert_eq!(analysis.intervals[1].unwrap().duration, 0.5);
    }

    #[test]
    fn backwards_timestamp_leaves_pair_unset() {
        let analysis = analyze_timestamps(&[Some(2.0), Some(1.0), Some(3.0)]);
        assert_eq!(analysis.intervals[0], None);
        assert_eq!(analysis.intervals[1].unwrap().duration, 2.0);
        // Aggregates use decode order, not sorted order.
        assert_eq!(analysis.total_duration, 1.0);
        assert_eq!(analysis.average_fps, 2.0);
    }

    #[test]
    fn missing_timestamp_breaks_both_neighbouring_pairs() {
        let analysis = analyze_timestamps(&[Some(0.0), None, Some(2.0), Some(3.0)]);
        assert_eq!(analysis.intervals[0], None);
        assert_eq!(analysis.intervals[1], None);
        assert_eq!(analysis.intervals[2].unwrap().duration, 1.0);
        assert_eq!(analysis.valid_timestamps, 3);
        assert_eq!(analysis.total_duration, 3.0);
        assert!((analysis.average_fps - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn single_timestamp_reports_zero() {
        let analysis = analyze_timestamps(&[None, Some(4.0), None]);
        assert_eq!(analysis.total_duration, 0.0);
        assert_eq!(analysis.average_fps, 0.0);
        assert!(!analysis.has_aggregate());
        assert!(analysis.intervals.iter().all(Option::is_none));
    }

    #[test]
    fn non_positive_span_reports_zero() {
        let analysis = analyze_timestamps(&[Some(5.0), Some(6.0), Some(5.0)]);
        assert_eq!(analysis.total_duration, 0.0);
        assert_eq!(analysis.average_fps, 0.0);
        assert!(analysis.intervals[0].is_some());
    }

    #[test]
    fn empty_sequence() {
        let analysis = analyze_timestamps(&[]);
        assert!(analysis.intervals.is_empty());
        assert_eq!(analysis.average_fps, 0.0);
    }
}
