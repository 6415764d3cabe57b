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

//! Fade shaping and hard truncation.

use std::f32::consts::PI;

/// Fade-in length in seconds (5 ms, click suppression only).
const FADE_IN_SECS: f64 = 0.005;

/// Fade-out span as a fraction of the buffer length.
const FADE_OUT_FRACTION: f64 = 0.10;

/// Fade-out applied after a hard truncation, in seconds (50 ms).
const TRUNCATE_FADE_SECS: f64 = 0.05;

/// Applies a short linear fade-in and an equal-power fade-out over the
/// final tenth of the buffer.
pub fn apply(mut left: Vec<f32>, mut right: Vec<f32>, sample_rate: u32) -> (Vec<f32>, Vec<f32>) {
    let len = left.len();
    let fade_in = (f64::from(sample_rate) * FADE_IN_SECS) as usize;
    let fade_out = (len as f64 * FADE_OUT_FRACTION) as usize;

    for i in 0..fade_in.min(len) {
        let gain = i as f32 / fade_in as f32;
        left[i] *= gain;
        right[i] *= gain;
    }

    // Equal-power curve (cos^2) sounds smoother than linear on long
    // tails.
    for i in 0..fade_out.min(len) {
        let index = len - 1 - i;
        let t = i as f32 / fade_out as f32;
        let gain = ((1.0 - t) * PI / 2.0).cos();
        left[index] *= gain;
        right[index] *= gain;
    }

    (left, right)
}

/// Hard-cuts the buffer to `max_frames` and smooths the new end with a
/// short linear fade-out. Callers guarantee `len > max_frames`.
pub fn truncate(
    mut left: Vec<f32>,
    mut right: Vec<f32>,
    sample_rate: u32,
    max_frames: usize,
) -> (Vec<f32>, Vec<f32>) {
    left.truncate(max_frames);
    right.truncate(max_frames);

    let len = left.len();
    let fade_out = (f64::from(sample_rate) * TRUNCATE_FADE_SECS) as usize;
    for i in 0..fade_out.min(len) {
        let index = len - 1 - i;
        let gain = i as f32 / fade_out as f32;
        left[index] *= gain;
        right[index] *= gain;
    }

    (left, right)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil::signal::constant;

    const RATE: u32 = 44100;

    #[test]
    fn test_fade_in_starts_at_zero() {
        let (left, _) = apply(constant(1.0, 44100), constant(1.0, 44100), RATE);
        assert_eq!(0.0, left[0]);
        // Past the 5 ms fade-in and before the fade-out, the signal is
        // untouched.
        assert_eq!(1.0, left[1000]);
    }

    #[test]
    fn test_fade_out_ends_at_zero() {
        let (left, _) = apply(constant(1.0, 44100), constant(1.0, 44100), RATE);
        let len = left.len();
        assert!(left[len - 1].abs() < 1e-6);
        // Monotonically rising back from the end through the fade.
        assert!(left[len - 100] < left[len - 2000]);
        // 10% fade span: 90% in is untouched.
        assert_eq!(1.0, left[len - (len / 10) - 100]);
    }

    #[test]
    fn test_fades_on_tiny_buffer() {
        let (left, right) = apply(vec![0.5; 3], vec![0.5; 3], RATE);
        assert_eq!(3, left.len());
        assert!(left.iter().chain(right.iter()).all(|s| s.is_finite()));
    }

    #[test]
    fn test_truncate_cuts_and_fades() {
        let (left, right) = truncate(constant(1.0, 10000), constant(1.0, 10000), RATE, 6000);
        assert_eq!(6000, left.len());
        assert_eq!(6000, right.len());
        assert_eq!(0.0, left[5999]);
        assert_eq!(1.0, left[1000]);
    }

    #[test]
    fn test_truncate_shorter_than_fade() {
        // Cut length under the 50 ms fade window must not underflow.
        let (left, _) = truncate(constant(1.0, 4000), constant(1.0, 4000), RATE, 1000);
        assert_eq!(1000, left.len());
        assert!(left.iter().all(|s| s.is_finite()));
    }
}
