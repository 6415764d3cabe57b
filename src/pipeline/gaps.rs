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

//! Chromatic gap filling for samples whose pitch stayed undetermined.

use tracing::warn;

use crate::note::NoteSource;
use crate::pipeline::ProcessedSample;

/// First note handed out to an unpitched sample (C3).
const FIRST_FILL_NOTE: u8 = 48;

/// Assigns placeholder notes to unpitched samples, walking up
/// chromatically from C3 and skipping notes already taken by pitched
/// samples or earlier fills. The search stops at 127; a sample that
/// cannot be placed (every remaining note taken, which a budget-limited
/// batch never actually reaches) is dropped with a warning.
pub fn assign_missing_notes(samples: Vec<ProcessedSample>) -> Vec<ProcessedSample> {
    let mut used = vec![false; 128];
    for sample in samples.iter() {
        if let Some(note) = sample.root_note {
            used[note as usize] = true;
        }
    }

    let mut next_note = FIRST_FILL_NOTE as usize;
    let mut filled = Vec::with_capacity(samples.len());

    for mut sample in samples {
        if sample.root_note.is_some() {
            filled.push(sample);
            continue;
        }

        while next_note < used.len() && used[next_note] {
            next_note += 1;
        }
        if next_note >= used.len() {
            warn!(
                name = %sample.source_name,
                "No free note left for unpitched sample; dropping it"
            );
            continue;
        }

        used[next_note] = true;
        sample.root_note = Some(next_note as u8);
        sample.note_source = Some(NoteSource::GapFilled);
        filled.push(sample);
        next_note += 1;
    }

    filled
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pipeline::test_support::sample_with_note;

    #[test]
    fn test_fills_around_occupied_notes() {
        let samples = vec![
            sample_with_note("pitched", Some(48)),
            sample_with_note("gap-a", None),
            sample_with_note("gap-b", None),
        ];
        let filled = assign_missing_notes(samples);

        assert_eq!(3, filled.len());
        assert_eq!(Some(48), filled[0].root_note);
        // C3 is taken, so the gaps land on the next free notes, never
        // reusing one.
        assert_eq!(Some(49), filled[1].root_note);
        assert_eq!(Some(50), filled[2].root_note);
        assert_eq!(Some(NoteSource::GapFilled), filled[1].note_source);
    }

    #[test]
    fn test_no_gaps_is_identity() {
        let samples = vec![
            sample_with_note("a", Some(60)),
            sample_with_note("b", Some(72)),
        ];
        let filled = assign_missing_notes(samples);
        assert_eq!(2, filled.len());
        assert_eq!(Some(60), filled[0].root_note);
        assert_eq!(Some(72), filled[1].root_note);
    }

    #[test]
    fn test_fill_order_follows_input_order() {
        let samples = vec![
            sample_with_note("first-gap", None),
            sample_with_note("pitched", Some(49)),
            sample_with_note("second-gap", None),
        ];
        let filled = assign_missing_notes(samples);

        let first = filled.iter().find(|s| s.source_name == "first-gap").unwrap();
        let second = filled
            .iter()
            .find(|s| s.source_name == "second-gap")
            .unwrap();
        assert_eq!(Some(48), first.root_note);
        // 49 is occupied by the pitched sample.
        assert_eq!(Some(50), second.root_note);
    }

    #[test]
    fn test_scattered_occupied_notes_skipped() {
        let samples = vec![
            sample_with_note("a", Some(48)),
            sample_with_note("b", Some(50)),
            sample_with_note("gap-1", None),
            sample_with_note("gap-2", None),
        ];
        let filled = assign_missing_notes(samples);
        let notes: Vec<_> = filled.iter().filter_map(|s| s.root_note).collect();
        assert_eq!(vec![48, 50, 49, 51], notes);
    }
}
