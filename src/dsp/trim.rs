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

//! Silence and transient trimming.
//!
//! The start point prefers a windowed-RMS transient onset (percussive and
//! plucked material); soft sustained sounds fall back to a plain
//! amplitude threshold. The end point always uses the amplitude
//! threshold plus a tail pad.

use crate::dsp::db_to_linear;

/// Amplitude threshold treated as silence.
const THRESHOLD_DB: f32 = -50.0;

/// RMS analysis window for transient detection, in seconds (~3 ms).
const TRANSIENT_WINDOW_SECS: f64 = 0.003;

/// Back-off ahead of the detected onset so the natural attack survives,
/// in seconds (~2 ms).
const PRE_ATTACK_SECS: f64 = 0.002;

/// Pad kept after the last audible sample, in seconds.
const TAIL_PAD_SECS: f64 = 0.5;

/// Minimum length of a trimmed result, in seconds.
const MIN_LENGTH_SECS: f64 = 0.5;

/// A transient must jump by this fraction of the peak window RMS.
const TRANSIENT_DELTA_FRACTION: f32 = 0.05;

/// Trims leading silence and trailing silence from a stereo buffer.
/// Pathological input (all-quiet, or a start point at or past the end
/// point) passes through unchanged.
pub fn trim_silence(left: Vec<f32>, right: Vec<f32>, sample_rate: u32) -> (Vec<f32>, Vec<f32>) {
    if left.is_empty() {
        return (left, right);
    }

    let threshold = db_to_linear(THRESHOLD_DB);
    let min_length = f64::from(sample_rate) * MIN_LENGTH_SECS;
    let tail_pad = (f64::from(sample_rate) * TAIL_PAD_SECS) as usize;
    let pre_attack = (f64::from(sample_rate) * PRE_ATTACK_SECS) as usize;

    let mut start = 0;
    let mut end = left.len() - 1;

    match detect_transient(&left, &right, sample_rate) {
        Some(onset) => start = onset.saturating_sub(pre_attack),
        None => {
            // Soft or sustained material without a clear attack: first
            // sample on either channel above the threshold.
            for i in 0..left.len() {
                if left[i].abs() > threshold || right[i].abs() > threshold {
                    start = i.saturating_sub(pre_attack);
                    break;
                }
            }
        }
    }

    for i in (0..left.len()).rev() {
        if left[i].abs() > threshold || right[i].abs() > threshold {
            end = (i + tail_pad).min(left.len() - 1);
            break;
        }
    }

    // Very short results stretch back out to the minimum, when the
    // source has that much material.
    let trimmed_length = (end - start + 1) as f64;
    if trimmed_length < min_length && left.len() as f64 >= min_length {
        end = (start + min_length as usize).min(left.len() - 1);
    }

    if start >= end {
        return (left, right);
    }

    (left[start..=end].to_vec(), right[start..=end].to_vec())
}

// Windowed-RMS transient onset: returns the start index of the window
// just before the first significant energy jump, or `None` when the
// material has no usable transient.
fn detect_transient(left: &[f32], right: &[f32], sample_rate: u32) -> Option<usize> {
    let window_size = (f64::from(sample_rate) * TRANSIENT_WINDOW_SECS) as usize;
    if window_size == 0 {
        return None;
    }
    let hop_size = (window_size / 2).max(1);

    // RMS per window over the max of |L| and |R|.
    let mut windows: Vec<(usize, f32)> = Vec::new();
    let mut index = 0;
    while index + window_size < left.len() {
        let mut sum = 0.0f32;
        for offset in 0..window_size {
            let sample = left[index + offset].abs().max(right[index + offset].abs());
            sum += sample * sample;
        }
        windows.push((index, (sum / window_size as f32).sqrt()));
        index += hop_size;
    }

    if windows.len() < 3 {
        return None;
    }

    let max_energy = windows.iter().map(|&(_, rms)| rms).fold(0.0f32, f32::max);
    if max_energy == 0.0 {
        return None;
    }

    let transient_threshold = max_energy * TRANSIENT_DELTA_FRACTION;
    let noise_floor = db_to_linear(THRESHOLD_DB);

    for i in 1..windows.len() {
        let delta = windows[i].1 - windows[i - 1].1;
        if delta > transient_threshold && windows[i].1 > noise_floor {
            // The previous window starts just before the attack.
            return Some(windows[i - 1].0);
        }
    }

    None
}
