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

//! The per-sample conditioning chain.
//!
//! Five stages run in a fixed, non-reorderable sequence: silence/transient
//! trim, peak normalization, limiting, fade shaping, and pitch-aware
//! truncation. The chain is a pure function of its inputs and safe to run
//! concurrently across samples.

pub mod fades;
pub mod limiter;
pub mod trim;

use tracing::debug;

/// Peak normalization target. Slightly below full scale so the sampler
/// has headroom when stacking voices.
const NORMALIZE_TARGET_DB: f32 = -3.5;

/// Truncation cap for the highest supported note (C8), in seconds.
const MIN_MAX_DURATION: f64 = 3.0;

/// Truncation cap for the lowest supported note (A0), in seconds.
const MAX_MAX_DURATION: f64 = 10.0;

/// A stereo sample that has been through the conditioning chain.
#[derive(Debug, Clone)]
pub struct ConditionedSample {
    /// Left channel at the target sample rate, amplitudes in [-1, 1].
    pub left: Vec<f32>,
    /// Right channel, same length as `left`.
    pub right: Vec<f32>,
    /// Whether the duration cap cut the sample short.
    pub truncated: bool,
    /// The duration cap that applied, in seconds.
    pub max_duration: f64,
}

/// Runs the full conditioning chain over a stereo buffer. `root_note`
/// only affects the duration cap; `None` caps at the middle-C value.
pub fn condition(
    left: Vec<f32>,
    right: Vec<f32>,
    sample_rate: u32,
    root_note: Option<u8>,
) -> ConditionedSample {
    let in_frames = left.len();

    let (left, right) = trim::trim_silence(left, right, sample_rate);
    let (left, right) = normalize(left, right, NORMALIZE_TARGET_DB);
    let (left, right) = limiter::limit(left, right, sample_rate);
    let (left, right) = fades::apply(left, right, sample_rate);

    let max_duration = max_duration_for_note(root_note);
    let max_frames = (f64::from(sample_rate) * max_duration) as usize;
    let (left, right, truncated) = if left.len() > max_frames {
        let (left, right) = fades::truncate(left, right, sample_rate, max_frames);
        (left, right, true)
    } else {
        (left, right, false)
    };

    debug!(
        in_frames,
        out_frames = left.len(),
        truncated,
        "Conditioned sample"
    );

    ConditionedSample {
        left,
        right,
        truncated,
        max_duration,
    }
}

/// Maximum allowed duration for a note, interpolating from 10 s at A0
/// down to 3 s at C8. Low notes ring longer and deserve the space; high
/// notes decay quickly anyway.
pub fn max_duration_for_note(root_note: Option<u8>) -> f64 {
    let low = f64::from(crate::note::MIN_DETECTED_NOTE);
    let high = f64::from(crate::note::MAX_DETECTED_NOTE);
    let note = f64::from(root_note.unwrap_or(60)).clamp(low, high);
    let t = (note - low) / (high - low);
    MAX_MAX_DURATION - t * (MAX_MAX_DURATION - MIN_MAX_DURATION)
}

/// Scales both channels uniformly so the peak lands at `target_db`.
/// Silent input passes through unchanged.
fn normalize(mut left: Vec<f32>, mut right: Vec<f32>, target_db: f32) -> (Vec<f32>, Vec<f32>) {
    let peak = left
        .iter()
        .chain(right.iter())
        .fold(0.0f32, |max, &sample| max.max(sample.abs()));
    if peak == 0.0 {
        return (left, right);
    }

    let gain = db_to_linear(target_db) / peak;
    for sample in left.iter_mut().chain(right.iter_mut()) {
        *sample *= gain;
    }
    (left, right)
}

pub(crate) fn db_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil::signal::{silence, sine};

    #[test]
    fn test_normalize_peak_lands_on_target() {
        let samples: Vec<f32> = sine(440.0, 44100, 0.1).iter().map(|s| s * 0.25).collect();
        let (left, _) = normalize(samples.clone(), samples, -3.5);
        let peak = left.iter().fold(0.0f32, |max, &s| max.max(s.abs()));
        assert!((peak - db_to_linear(-3.5)).abs() < 1e-3, "peak {peak}");
    }

    #[test]
    fn test_normalize_silence_unchanged() {
        let (left, right) = normalize(silence(1000), silence(1000), -3.5);
        assert!(left.iter().chain(right.iter()).all(|s| *s == 0.0));
    }

    #[test]
    fn test_condition_silent_buffer_is_safe() {
        let conditioned = condition(silence(44100), silence(44100), 44100, None);
        assert!(!conditioned.truncated);
        assert!(!conditioned.left.is_empty());
        assert!(conditioned
            .left
            .iter()
            .chain(conditioned.right.iter())
            .all(|s| s.is_finite()));
    }

    #[test]
    fn test_condition_truncates_long_samples() {
        // 12 seconds at C8 must be cut to the 3 second cap.
        let samples = sine(880.0, 8000, 12.0);
        let conditioned = condition(samples.clone(), samples, 8000, Some(108));
        assert!(conditioned.truncated);
        assert_eq!(3.0, conditioned.max_duration);
        assert_eq!(8000 * 3, conditioned.left.len());
    }

    #[test]
    fn test_condition_short_samples_untouched_by_cap() {
        let samples = sine(440.0, 8000, 1.0);
        let conditioned = condition(samples.clone(), samples, 8000, Some(60));
        assert!(!conditioned.truncated);
    }

    #[test]
    fn test_max_duration_for_note() {
        assert_eq!(10.0, max_duration_for_note(Some(21)));
        assert_eq!(3.0, max_duration_for_note(Some(108)));
        // Out-of-range notes clamp to the supported span.
        assert_eq!(10.0, max_duration_for_note(Some(0)));
        assert_eq!(3.0, max_duration_for_note(Some(127)));
        // Unknown pitch gets the middle-C value.
        let unknown = max_duration_for_note(None);
        assert!((unknown - max_duration_for_note(Some(60))).abs() < 1e-12);
        assert!(unknown > 6.0 && unknown < 7.5, "cap {unknown}");
    }
}
