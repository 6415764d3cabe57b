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

//! Musical note naming and filename-based note detection.
//!
//! Notes are MIDI note numbers in [0, 127] with 60 = middle C (C4).

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Pitch class names in chromatic order starting at C. Sharps only; flat
/// spellings are normalized before lookup.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// The lowest note accepted from detection (A0 on an 88-key piano).
pub const MIN_DETECTED_NOTE: u8 = 21;

/// The highest note accepted from detection (C8 on an 88-key piano).
pub const MAX_DETECTED_NOTE: u8 = 108;

/// How a sample's root note was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteSource {
    /// Assigned by the caller, taking precedence over detection.
    Manual,
    /// Parsed out of the file name.
    Filename,
    /// Estimated from the decoded waveform.
    Waveform,
    /// Filled in chromatically because nothing else produced a note.
    GapFilled,
}

impl fmt::Display for NoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteSource::Manual => write!(f, "manual"),
            NoteSource::Filename => write!(f, "filename"),
            NoteSource::Waveform => write!(f, "audio analysis"),
            NoteSource::GapFilled => write!(f, "gap-filled"),
        }
    }
}

// Matches a note name anywhere in a string: letter, optional accidental,
// optional sign, single octave digit (C4, F#3, Bb-1, ...).
static NOTE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([A-G][#b]?)(-?\d)").expect("static regex"));

// Matches a strict, whole-string note name.
static NOTE_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([A-G][#b]?)(-?\d)$").expect("static regex"));

// Matches a standalone 1-3 digit number, used as a direct MIDI note fallback.
static MIDI_NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,3})\b").expect("static regex"));

/// Derives a MIDI note number from a file name, or `None` if the name
/// carries no recognizable note tag.
///
/// The extension-stripped name is scanned for note-name patterns and the
/// last occurrence wins, since file names commonly prefix unrelated numbers
/// before a trailing note tag (`pianotest3-A3.wav` is A3, not 3). When no
/// note name is present, a standalone number in the 88-key piano range
/// [21, 108] is accepted as a direct note number.
pub fn parse_note_from_filename(filename: &str) -> Option<u8> {
    let stem = strip_extension(filename);

    if let Some(caps) = NOTE_PATTERN.captures_iter(stem).last() {
        if let Some(note) = note_from_parts(&caps[1], &caps[2]) {
            return Some(note);
        }
    }

    if let Some(caps) = MIDI_NUMBER_PATTERN.captures(stem) {
        if let Ok(midi) = caps[1].parse::<u16>() {
            if (MIN_DETECTED_NOTE as u16..=MAX_DETECTED_NOTE as u16).contains(&midi) {
                return Some(midi as u8);
            }
        }
    }

    None
}

/// Formats a MIDI note number as a note name, e.g. 60 -> "C4".
pub fn midi_to_note_name(midi: u8) -> String {
    let octave = (midi / 12) as i32 - 1;
    format!("{}{}", NOTE_NAMES[(midi % 12) as usize], octave)
}

/// Parses a strict note name ("C4", "f#3", "Bb-1") into a MIDI note number.
pub fn note_name_to_midi(name: &str) -> Option<u8> {
    let caps = NOTE_NAME_PATTERN.captures(name)?;
    note_from_parts(&caps[1], &caps[2])
}

/// Converts a MIDI note number to its frequency in Hz (A4 = 440 Hz).
pub fn midi_to_frequency(midi: u8) -> f64 {
    440.0 * 2.0_f64.powf((f64::from(midi) - 69.0) / 12.0)
}

fn note_from_parts(spelling: &str, octave: &str) -> Option<u8> {
    let class = pitch_class_index(spelling)?;
    let octave: i32 = octave.parse().ok()?;
    if !(-1..=9).contains(&octave) {
        return None;
    }
    let note = (octave + 1) * 12 + class as i32;
    u8::try_from(note).ok().filter(|n| *n <= 127)
}

// Normalizes case and flat aliases (Db -> C#, ..., Cb -> B), then resolves
// the chromatic index.
fn pitch_class_index(spelling: &str) -> Option<usize> {
    let mut chars = spelling.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let name = match chars.next() {
        Some('#') => format!("{letter}#"),
        Some(a) if a.eq_ignore_ascii_case(&'b') => match letter {
            'D' => "C#".to_string(),
            'E' => "D#".to_string(),
            'F' => "E".to_string(),
            'G' => "F#".to_string(),
            'A' => "G#".to_string(),
            'B' => "A#".to_string(),
            'C' => "B".to_string(),
            _ => return None,
        },
        None => letter.to_string(),
        Some(_) => return None,
    };
    NOTE_NAMES.iter().position(|n| *n == name)
}

// Strips a trailing extension, leaving names without one untouched.
fn strip_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    }
}
