//! Internal conversion helpers.
//!
//! Pixel-buffer packing and rational timestamp arithmetic shared by the frame
//! and packet paths.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Bytes per pixel of the RGB24 buffers that get hashed.
pub(crate) const RGB24_BYTES_PER_PIXEL: usize = 3;

/// Copy plane 0 of an RGB24 frame into a tightly packed, row-major buffer.
///
/// FFmpeg pads rows to its own alignment; the padding is dropped so the
/// result hashes identically to the buffer an image decoder returns.
/// Returns `None` if the plane is shorter than `width * height` pixels.
pub(crate) fn frame_to_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Option<Vec<u8>> {
    let stride = video_frame.stride(0);
    let row_length = (width as usize) * RGB24_BYTES_PER_PIXEL;
    let rows = height as usize;
    let data = video_frame.data(0);

    if stride < row_length || rows == 0 {
        return None;
    }
    if data.len() < stride * (rows - 1) + row_length {
        return None;
    }

    if stride == row_length {
        return Some(data[..row_length * rows].to_vec());
    }

    let mut buffer = Vec::with_capacity(row_length * rows);
    for row in 0..rows {
        let row_start = row * stride;
        buffer.extend_from_slice(&data[row_start..row_start + row_length]);
    }
    Some(buffer)
}

/// Convert a PTS to seconds.
///
/// The tick product is formed in `i128` so the only rounding is the final
/// division. Returns `None` for a zero-denominator time base.
pub fn pts_to_seconds(pts: i64, time_base: Rational) -> Option<f64> {
    let denominator = time_base.denominator();
    if denominator == 0 {
        return None;
    }
    let ticks = i128::from(pts) * i128::from(time_base.numerator());
    Some(ticks as f64 / f64::from(denominator))
}

/// Render a time base as a reduced fraction, e.g. `1/1000`.
///
/// Whole numbers render without a denominator.
pub fn format_time_base(time_base: Rational) -> String {
    let numerator = i64::from(time_base.numerator());
    let denominator = i64::from(time_base.denominator());
    if denominator == 0 {
        return format!("{numerator}/0");
    }

    let divisor = greatest_common_divisor(numerator.abs(), denominator.abs()).max(1);
    let sign = if denominator < 0 { -1 } else { 1 };
    let (numerator, denominator) = (sign * numerator / divisor, sign * denominator / divisor);

    if denominator == 1 {
        numerator.to_string()
    } else {
        format!("{numerator}/{denominator}")
    }
}

/// A time base is usable when its denominator is non-zero.
pub(crate) fn is_valid_time_base(time_base: Rational) -> bool {
    time_base.denominator() != 0
}

fn greatest_common_divisor(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        let remainder = a % b;
        a = b;
        b = remainder;
    }
    a
}
