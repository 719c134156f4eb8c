//! Media files written byte by byte, so tests run without external fixtures.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

/// Frame rate of [`write_y4m`] clips.
pub const Y4M_FPS: u32 = 25;
pub const Y4M_WIDTH: usize = 16;
pub const Y4M_HEIGHT: usize = 16;

/// Write an uncompressed YUV 4:4:4 clip of `frames` frames at 25 fps.
///
/// Every frame has different content, so every decoded frame hashes
/// differently.
pub fn write_y4m(path: &Path, frames: usize) {
    let mut data = format!(
        "YUV4MPEG2 W{Y4M_WIDTH} H{Y4M_HEIGHT} F{Y4M_FPS}:1 Ip A1:1 C444\n"
    )
    .into_bytes();
    let plane = Y4M_WIDTH * Y4M_HEIGHT;
    for frame in 0..frames {
        data.extend_from_slice(b"FRAME\n");
        for position in 0..plane {
            data.push(((position * 3 + frame * 17) % 220 + 16) as u8);
        }
        for position in 0..plane {
            data.push(((position + frame * 29) % 200 + 28) as u8);
        }
        for position in 0..plane {
            data.push(((position * 7 + frame * 11) % 200 + 28) as u8);
        }
    }
    fs::write(path, data).unwrap();
}

/// Write a 16-bit mono PCM WAV file: audio only, no video stream.
pub fn write_wav(path: &Path, samples: usize) {
    let sample_rate: u32 = 8000;
    let data_length = (samples * 2) as u32;

    let mut data = Vec::with_capacity(44 + samples * 2);
    data.extend_from_slice(b"RIFF");
    data.extend_from_slice(&(36 + data_length).to_le_bytes());
    data.extend_from_slice(b"WAVE");
    data.extend_from_slice(b"fmt ");
    data.extend_from_slice(&16_u32.to_le_bytes());
    data.extend_from_slice(&1_u16.to_le_bytes());
    data.extend_from_slice(&1_u16.to_le_bytes());
    data.extend_from_slice(&sample_rate.to_le_bytes());
    data.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    data.extend_from_slice(&2_u16.to_le_bytes());
    data.extend_from_slice(&16_u16.to_le_bytes());
    data.extend_from_slice(b"data");
    data.extend_from_slice(&data_length.to_le_bytes());
    for sample in 0..samples {
        let value = ((sample % 40) as i16 - 20) * 800;
        data.extend_from_slice(&value.to_le_bytes());
    }
    fs::write(path, data).unwrap();
}
