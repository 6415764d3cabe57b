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

//! Density selection: reducing an oversized batch to a subset spread
//! evenly across its pitch range.

use crate::config::Density;
use crate::pipeline::ProcessedSample;

/// Reduces `samples` to at most the density tier's budget. Pitched
/// samples are spread at roughly the tier's semitone interval across
/// the batch's pitch span; unpitched samples only ride along when the
/// pitched ones leave budget to spare.
pub fn select_by_density(samples: Vec<ProcessedSample>, density: Density) -> Vec<ProcessedSample> {
    let max_samples = density.max_samples();
    let target_interval = f64::from(density.interval());

    let (mut pitched, unpitched): (Vec<_>, Vec<_>) = samples
        .into_iter()
        .partition(|sample| sample.root_note.is_some());
    pitched.sort_by_key(|sample| sample.root_note);

    // Under budget: everything pitched, then unpitched up to the cap.
    if pitched.len() <= max_samples {
        let spare = max_samples - pitched.len();
        pitched.extend(unpitched.into_iter().take(spare));
        return pitched;
    }

    let min_note = root_of(&pitched[0]);
    let max_note = root_of(&pitched[pitched.len() - 1]);
    let span = f64::from(max_note) - f64::from(min_note);

    if span == 0.0 {
        pitched.truncate(max_samples);
        return pitched;
    }

    // Walk evenly spaced target pitches across the span and greedily
    // take the nearest unclaimed sample for each.
    let ideal_count = (span / target_interval).ceil() as usize + 1;
    let target_count = ideal_count.min(max_samples);
    let step = span / (target_count - 1).max(1) as f64;

    let mut claimed = vec![false; pitched.len()];
    let mut selected_indices = Vec::with_capacity(target_count);
    for i in 0..target_count {
        let target_note = f64::from(min_note) + i as f64 * step;

        let mut closest: Option<(usize, f64)> = None;
        for (index, sample) in pitched.iter().enumerate() {
            if claimed[index] {
                continue;
            }
            let distance = (f64::from(root_of(sample)) - target_note).abs();
            match closest {
                Some((_, best)) if best <= distance => {}
                _ => closest = Some((index, distance)),
            }
        }

        if let Some((index, _)) = closest {
            claimed[index] = true;
            selected_indices.push(index);
        }
    }

    // Recover the samples in selection order.
    let mut slots: Vec<Option<ProcessedSample>> = pitched.into_iter().map(Some).collect();
    selected_indices
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect()
}

fn root_of(sample: &ProcessedSample) -> u8 {
    sample.root_note.expect("partitioned as pitched")
}
