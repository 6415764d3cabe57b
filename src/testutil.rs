// Copyright (C) 2026 Jonas Keller <jonas@xypack.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Audio test utilities: signal generators and WAV fixtures.

use std::path::Path;

/// Test signal generators.
pub mod signal {
    use std::f32::consts::PI;

    /// Generates a sine wave at the given frequency.
    pub fn sine(frequency: f64, sample_rate: u32, duration_seconds: f64) -> Vec<f32> {
        let sample_count = (f64::from(sample_rate) * duration_seconds) as usize;
        (0..sample_count)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * PI * frequency as f32 * t).sin()
            })
            .collect()
    }

    /// Generates a run of digital silence.
    pub fn silence(sample_count: usize) -> Vec<f32> {
        vec![0.0; sample_count]
    }

    /// Generates a constant-amplitude signal (useful for fade checks).
    pub fn constant(amplitude: f32, sample_count: usize) -> Vec<f32> {
        vec![amplitude; sample_count]
    }
}

/// Writes a 16-bit stereo WAV fixture to disk.
pub fn write_wav_16(path: &Path, left: &[f32], right: &[f32], sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav fixture");
    for (l, r) in left.iter().zip(right.iter()) {
        writer
            .write_sample((l * 32767.0) as i16)
            .expect("write sample");
        writer
            .write_sample((r * 32767.0) as i16)
            .expect("write sample");
    }
    writer.finalize().expect("finalize wav fixture");
}
