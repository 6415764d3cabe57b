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

//! Transparent peak limiting.
//!
//! A hard-knee compressor with a high ratio, run as a safety net behind
//! normalization: fades and resampling ripple can push isolated peaks
//! over full scale, and those must not survive into the PCM encode.

use crate::dsp::db_to_linear;

/// Limiting threshold, just below full scale.
const THRESHOLD_DB: f32 = -0.5;

/// Compression ratio above the threshold. High enough to behave as a
/// limiter rather than a compressor.
const RATIO: f32 = 20.0;

/// Envelope attack time in seconds (1 ms).
const ATTACK_SECS: f32 = 0.001;

/// Envelope release time in seconds (10 ms).
const RELEASE_SECS: f32 = 0.010;

/// Applies the limiter to a stereo buffer. Both channels share one
/// envelope so the stereo image does not shift under gain reduction.
pub fn limit(mut left: Vec<f32>, mut right: Vec<f32>, sample_rate: u32) -> (Vec<f32>, Vec<f32>) {
    let threshold = db_to_linear(THRESHOLD_DB);
    let attack = coefficient(ATTACK_SECS, sample_rate);
    let release = coefficient(RELEASE_SECS, sample_rate);

    let mut envelope = 0.0f32;
    for i in 0..left.len() {
        let peak = left[i].abs().max(right[i].abs());

        let smoothing = if peak > envelope { attack } else { release };
        envelope = smoothing * envelope + (1.0 - smoothing) * peak;

        if envelope > threshold {
            // Hard knee: gain brings the envelope onto the 20:1 slope.
            let gain = (envelope / threshold).powf(1.0 / RATIO - 1.0);
            left[i] *= gain;
            right[i] *= gain;
        }
    }

    (left, right)
}

// One-pole smoothing coefficient for the given time constant.
fn coefficient(seconds: f32, sample_rate: u32) -> f32 {
    (-1.0 / (seconds * sample_rate as f32)).exp()
}
