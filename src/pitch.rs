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

//! Waveform-based pitch detection.
//!
//! Two independent time-domain trackers run in a fixed order: the McLeod
//! normalized-square-difference method first (most accurate on tonal
//! material, gated on its clarity score), then YIN as a fallback. Both
//! return `None` on degenerate input instead of failing, so an
//! inconclusive analysis simply leaves a sample unpitched.

pub mod mcleod;
pub mod yin;

use tracing::debug;

use crate::note::{MAX_DETECTED_NOTE, MIN_DETECTED_NOTE};

/// Analysis window length in seconds. Only the head of the sample is
/// inspected; the attack and early sustain carry the pitch.
const ANALYSIS_WINDOW_SECS: usize = 1;

/// Minimum clarity for accepting a McLeod estimate.
const MIN_CLARITY: f32 = 0.8;

/// Plausible fundamental range in Hz. Estimates outside are discarded.
const MIN_FREQUENCY: f32 = 20.0;
const MAX_FREQUENCY: f32 = 5000.0;

/// A pitch estimate produced by waveform analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Estimated fundamental frequency in Hz.
    pub frequency: f32,
    /// The semitone-quantized MIDI note number.
    pub midi_note: u8,
    /// Clarity score in [0, 1] when the primary tracker produced the
    /// estimate; `None` for the fallback tracker.
    pub clarity: Option<f32>,
}

/// Estimates the root note of a stereo sample, or `None` when neither
/// tracker finds a plausible fundamental.
pub fn detect(left: &[f32], right: &[f32], sample_rate: u32) -> Option<PitchEstimate> {
    let mono = fold_to_mono(left, right);
    let window_len = mono
        .len()
        .min(sample_rate as usize * ANALYSIS_WINDOW_SECS);
    let window = &mono[..window_len];

    if let Some((frequency, clarity)) = mcleod::detect(window, sample_rate) {
        if clarity > MIN_CLARITY {
            if let Some(midi_note) = note_for_frequency(frequency) {
                debug!(frequency, clarity, midi_note, "McLeod pitch estimate");
                return Some(PitchEstimate {
                    frequency,
                    midi_note,
                    clarity: Some(clarity),
                });
            }
        }
    }

    if let Some(frequency) = yin::detect(window, sample_rate) {
        if let Some(midi_note) = note_for_frequency(frequency) {
            debug!(frequency, midi_note, "YIN pitch estimate");
            return Some(PitchEstimate {
                frequency,
                midi_note,
                clarity: None,
            });
        }
    }

    None
}

/// Quantizes a frequency to a MIDI note, accepting only plausible
/// fundamentals that land in the 88-key piano range.
fn note_for_frequency(frequency: f32) -> Option<u8> {
    if !(frequency > MIN_FREQUENCY && frequency < MAX_FREQUENCY) {
        return None;
    }
    let note = (12.0 * (frequency / 440.0).log2() + 69.0).round();
    if note < f32::from(MIN_DETECTED_NOTE) || note > f32::from(MAX_DETECTED_NOTE) {
        return None;
    }
    Some(note as u8)
}

// Averages the two channels sample-by-sample. Mono sources arrive with the
// channel duplicated, which averages to itself.
fn fold_to_mono(left: &[f32], right: &[f32]) -> Vec<f32> {
    left.iter()
        .zip(right.iter())
        .map(|(l, r)| (l + r) / 2.0)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil::signal::{silence, sine};

    #[test]
    fn test_detects_sine_a4() {
        let samples = sine(440.0, 44100, 0.2);
        let estimate = detect(&samples, &samples, 44100).expect("pitch");
        assert_eq!(69, estimate.midi_note);
        assert!((estimate.frequency - 440.0).abs() < 2.0);
    }

    #[test]
    fn test_detects_low_sine() {
        let samples = sine(110.0, 44100, 0.3);
        let estimate = detect(&samples, &samples, 44100).expect("pitch");
        assert_eq!(45, estimate.midi_note);
    }

    #[test]
    fn test_silence_has_no_pitch() {
        let samples = silence(44100 / 2);
        assert_eq!(None, detect(&samples, &samples, 44100));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(None, detect(&[], &[], 44100));
    }

    #[test]
    fn test_note_for_frequency_bounds() {
        assert_eq!(Some(69), note_for_frequency(440.0));
        assert_eq!(Some(70), note_for_frequency(466.16));
        // Outside the plausible fundamental range.
        assert_eq!(None, note_for_frequency(10.0));
        assert_eq!(None, note_for_frequency(6000.0));
        // In range but quantizes outside the piano keyboard.
        assert_eq!(None, note_for_frequency(21.0));
    }
}
