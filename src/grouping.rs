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

//! Filename-suffix grouping for velocity layers and round-robins.
//!
//! Sample libraries commonly tag alternates with a trailing suffix
//! (`piano_C3_RR1.wav`, `cello-A2-mf.wav`). When one suffix pattern
//! splits the batch into several groups, each group becomes its own
//! preset instead of the alternates fighting over keyboard zones.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::util::filename_display;

/// What a grouping suffix encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    RoundRobin,
    Velocity,
    Layer,
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKind::RoundRobin => write!(f, "round robin"),
            GroupKind::Velocity => write!(f, "velocity layer"),
            GroupKind::Layer => write!(f, "layer"),
        }
    }
}

struct GroupPattern {
    regex: Regex,
    kind: GroupKind,
}

// Tried in order; a pattern earlier in the table wins ties. The
// dynamics markings are separate patterns on purpose: `(ff|f)$` style
// alternation would let a handful of `_f` files piggyback on `_ff`
// files and form one lopsided group.
static GROUP_PATTERNS: Lazy<Vec<GroupPattern>> = Lazy::new(|| {
    let patterns: &[(&str, GroupKind)] = &[
        (r"(?i)_RR(\d+)$", GroupKind::RoundRobin),
        (r"(?i)-RR(\d+)$", GroupKind::RoundRobin),
        (r"(?i)_R(\d+)$", GroupKind::RoundRobin),
        (r"(?i)[_-](fff)$", GroupKind::Velocity),
        (r"(?i)[_-](ff)$", GroupKind::Velocity),
        (r"(?i)[_-](f)$", GroupKind::Velocity),
        (r"(?i)[_-](mf)$", GroupKind::Velocity),
        (r"(?i)[_-](mp)$", GroupKind::Velocity),
        (r"(?i)[_-](p)$", GroupKind::Velocity),
        (r"(?i)[_-](pp)$", GroupKind::Velocity),
        (r"(?i)[_-](ppp)$", GroupKind::Velocity),
        (r"(?i)[_-](hard|medium|soft|light)$", GroupKind::Velocity),
        (r"(?i)_V(\d+)$", GroupKind::Velocity),
        (r"(?i)-V(\d+)$", GroupKind::Velocity),
        (r"(?i)_L(\d+)$", GroupKind::Layer),
        (r"(?i)-L(\d+)$", GroupKind::Layer),
    ];
    patterns
        .iter()
        .map(|(pattern, kind)| GroupPattern {
            regex: Regex::new(pattern).expect("static regex"),
            kind: *kind,
        })
        .collect()
});

/// A qualifying partition of the input files.
#[derive(Debug)]
pub struct GroupingDetection {
    /// What the suffix encodes.
    pub kind: GroupKind,
    /// Group key (upper-cased suffix capture) to member files, sorted
    /// by key.
    pub groups: BTreeMap<String, Vec<PathBuf>>,
}

/// Minimum groups for a pattern to qualify.
const MIN_GROUPS: usize = 2;

/// Minimum files a qualifying pattern must cover.
const MIN_MATCHED_FILES: usize = 4;

/// Looks for a suffix pattern that partitions `files` into multiple
/// groups. Returns `None` when no pattern matches enough files.
pub fn detect(files: &[PathBuf]) -> Option<GroupingDetection> {
    let mut best: Option<(usize, usize, GroupingDetection)> = None;

    for pattern in GROUP_PATTERNS.iter() {
        let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        let mut matched = 0;

        for file in files {
            let stem = file_stem(filename_display(file));
            if let Some(caps) = pattern.regex.captures(stem) {
                let key = caps[1].to_uppercase();
                groups.entry(key).or_default().push(file.clone());
                matched += 1;
            }
        }

        if groups.len() < MIN_GROUPS || matched < MIN_MATCHED_FILES {
            continue;
        }

        // Most files matched wins; group count breaks ties; table order
        // breaks the rest.
        let better = match &best {
            Some((best_matched, best_groups, _)) => {
                matched > *best_matched || (matched == *best_matched && groups.len() > *best_groups)
            }
            None => true,
        };
        if better {
            let group_count = groups.len();
            best = Some((
                matched,
                group_count,
                GroupingDetection {
                    kind: pattern.kind,
                    groups,
                },
            ));
        }
    }

    best.map(|(_, _, detection)| detection)
}

/// Returns the file name with the grouping suffix removed, so note
/// detection sees `piano_C3.wav` instead of `piano_C3_RR1.wav`. Names
/// that do not match any pattern of `kind` come back unchanged.
pub fn strip_group_suffix(filename: &str, kind: GroupKind) -> String {
    let stem = file_stem(filename);
    let extension = &filename[stem.len()..];

    for pattern in GROUP_PATTERNS.iter().filter(|p| p.kind == kind) {
        if pattern.regex.is_match(stem) {
            let stripped = pattern.regex.replace(stem, "");
            return format!("{stripped}{extension}");
        }
    }

    filename.to_string()
}

// The name up to a trailing extension.
fn file_stem(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    }
}

/// Display helper for the group list, used in logs and the inspect
/// output.
pub fn describe(detection: &GroupingDetection) -> String {
    let summary: Vec<String> = detection
        .groups
        .iter()
        .map(|(key, files)| format!("{} ({} samples)", key, files.len()))
        .collect();
    format!("{}: {}", detection.kind, summary.join(", "))
}

#[cfg(test)]
mod test {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_round_robin_detection() {
        let files = paths(&[
            "piano_C3_RR1.wav",
            "piano_C3_RR2.wav",
            "piano_G3_RR1.wav",
            "piano_G3_RR2.wav",
        ]);
        let detection = detect(&files).expect("detection");
        assert_eq!(GroupKind::RoundRobin, detection.kind);
        assert_eq!(2, detection.groups.len());
        assert_eq!(2, detection.groups["1"].len());
        assert_eq!(2, detection.groups["2"].len());
    }

    #[test]
    fn test_velocity_layer_detection() {
        let files = paths(&[
            "cello-A2-mf.wav",
            "cello-A2-ff.wav",
            "cello-E3-mf.wav",
            "cello-E3-ff.wav",
            "cello-B3-mf.wav",
        ]);
        // Each dynamics marking is its own pattern, so neither "mf" nor
        // "ff" alone covers four files.
        assert!(detect(&files).is_none());

        let files = paths(&[
            "cello-A2-mf.wav",
            "cello-E3-mf.wav",
            "cello-A2-ff.wav",
            "cello-E3-ff.wav",
            "cello-A2-pp.wav",
            "cello-E3-pp.wav",
        ]);
        assert!(detect(&files).is_none());
    }

    #[test]
    fn test_numeric_velocity_detection() {
        let files = paths(&[
            "key_C2_V1.wav",
            "key_C2_V2.wav",
            "key_F2_V1.wav",
            "key_F2_V2.wav",
            "key_A2_V1.wav",
            "key_A2_V2.wav",
        ]);
        let detection = detect(&files).expect("detection");
        assert_eq!(GroupKind::Velocity, detection.kind);
        assert_eq!(3, detection.groups["1"].len());
    }

    #[test]
    fn test_too_few_files() {
        let files = paths(&["a_RR1.wav", "a_RR2.wav", "b_RR1.wav"]);
        assert!(detect(&files).is_none());
    }

    #[test]
    fn test_single_group_does_not_qualify() {
        let files = paths(&["a_RR1.wav", "b_RR1.wav", "c_RR1.wav", "d_RR1.wav"]);
        assert!(detect(&files).is_none());
    }

    #[test]
    fn test_strip_group_suffix() {
        assert_eq!(
            "piano_C3.wav",
            strip_group_suffix("piano_C3_RR1.wav", GroupKind::RoundRobin)
        );
        assert_eq!(
            "cello-A2.wav",
            strip_group_suffix("cello-A2-mf.wav", GroupKind::Velocity)
        );
        assert_eq!(
            "plain.wav",
            strip_group_suffix("plain.wav", GroupKind::Velocity)
        );
    }

    #[test]
    fn test_case_insensitive_keys_merge() {
        let files = paths(&[
            "a_rr1.wav",
            "a_RR1.wav",
            "b_rr2.wav",
            "b_RR2.wav",
        ]);
        let detection = detect(&files).expect("detection");
        assert_eq!(2, detection.groups.len());
        assert!(detection.groups.contains_key("1"));
    }
}
