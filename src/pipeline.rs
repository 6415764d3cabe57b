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

//! The batch pipeline: every input file is decoded, pitched, conditioned
//! and encoded independently (in parallel), then the whole batch flows
//! through density selection, gap filling and zone assembly into one
//! preset bundle per instrument.

pub mod density;
pub mod gaps;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::audio::{decode_file, resample, DecodeError, DecodedAudio, ResampleError};
use crate::bundle::PresetBundle;
use crate::config::{BitDepth, Density, Quality};
use crate::grouping::{self, GroupKind};
use crate::note::{parse_note_from_filename, NoteSource};
use crate::preset::{self, ZoneSample};
use crate::util::filename_display;
use crate::{dsp, pitch, wav};

/// Resolved settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub preset_name: String,
    pub quality: Quality,
    pub bit_depth: BitDepth,
    pub density: Density,
    /// Manual note assignments by file name, taking precedence over
    /// detection.
    pub manual_notes: HashMap<String, u8>,
    /// Whether to fan out per detected filename-suffix group.
    pub grouping: bool,
}

/// Fatal pipeline failures. Per-file problems become warnings instead;
/// only a batch with nothing usable in it fails outright.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("no samples could be processed")]
    NoUsableSamples,

    #[error("no preset could be assembled")]
    NothingAssembled,
}

// Per-file stage failures, folded into warnings by the driver.
#[derive(Debug, thiserror::Error)]
enum SampleError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Resample(#[from] ResampleError),
}

/// One input file that made it through per-file processing.
#[derive(Debug, Clone)]
pub struct ProcessedSample {
    /// The original file name, for reporting.
    pub source_name: String,
    /// Root note, if any stage determined one.
    pub root_note: Option<u8>,
    /// Which stage determined the root note.
    pub note_source: Option<NoteSource>,
    /// Frames per channel in the encoded audio.
    pub frames: usize,
    /// The encoded WAV bytes.
    pub wav: Vec<u8>,
    /// Whether the duration cap cut the sample short.
    pub truncated: bool,
    /// The duration cap that applied, in seconds.
    pub max_duration: f64,
}

/// The batch accumulator handed between stages by ownership: the
/// samples that survived per-file processing plus the warnings
/// collected along the way.
#[derive(Debug, Default)]
pub struct Batch {
    pub samples: Vec<ProcessedSample>,
    pub warnings: Vec<String>,
}

/// Everything a pipeline run produces, ready for the bundle writer.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub bundles: Vec<PresetBundle>,
    pub warnings: Vec<String>,
    /// Total samples across all bundles.
    pub sample_count: usize,
}

/// Runs the full pipeline over `files`. With grouping enabled and a
/// qualifying suffix pattern present, each group becomes its own
/// preset; otherwise the batch is one instrument.
pub fn run(
    files: &[PathBuf],
    settings: &PipelineSettings,
) -> Result<PipelineOutcome, PipelineError> {
    let detection = if settings.grouping {
        grouping::detect(files)
    } else {
        None
    };

    match detection {
        Some(detection) => {
            info!(
                groups = detection.groups.len(),
                kind = %detection.kind,
                "Using grouped processing"
            );
            run_grouped(detection.groups, detection.kind, settings)
        }
        None => {
            let batch = process_files(files, None, settings);
            let (bundle, warnings, count) =
                finish_instrument(&settings.preset_name, batch, settings)?;
            Ok(PipelineOutcome {
                bundles: vec![bundle],
                warnings,
                sample_count: count,
            })
        }
    }
}

// One preset per group. Groups that produce no usable samples are
// skipped with a warning; the run only fails when every group does.
fn run_grouped(
    groups: BTreeMap<String, Vec<PathBuf>>,
    kind: GroupKind,
    settings: &PipelineSettings,
) -> Result<PipelineOutcome, PipelineError> {
    let mut bundles = Vec::new();
    let mut warnings = Vec::new();
    let mut sample_count = 0;

    for (key, group_files) in groups {
        let name = format!("{}-{}", settings.preset_name, key);
        let batch = process_files(&group_files, Some(kind), settings);

        match finish_instrument(&name, batch, settings) {
            Ok((bundle, group_warnings, count)) => {
                bundles.push(bundle);
                warnings.extend(group_warnings);
                sample_count += count;
            }
            Err(PipelineError::NoUsableSamples) => {
                warnings.push(format!("Group \"{key}\" had no usable samples"));
            }
            Err(e) => return Err(e),
        }
    }

    if bundles.is_empty() {
        return Err(PipelineError::NothingAssembled);
    }

    Ok(PipelineOutcome {
        bundles,
        warnings,
        sample_count,
    })
}

// Decode/detect/condition/encode every file independently. Results come
// back in input order; failures turn into warnings.
fn process_files(
    files: &[PathBuf],
    group_kind: Option<GroupKind>,
    settings: &PipelineSettings,
) -> Batch {
    let results: Vec<Result<ProcessedSample, SampleError>> = files
        .par_iter()
        .map(|file| process_file(file, group_kind, settings))
        .collect();

    let mut batch = Batch::default();
    for (file, result) in files.iter().zip(results) {
        match result {
            Ok(sample) => {
                if sample.truncated {
                    batch.warnings.push(format!(
                        "\"{}\" was trimmed to {}s",
                        sample.source_name,
                        sample.max_duration.round()
                    ));
                }
                batch.samples.push(sample);
            }
            Err(e) => {
                warn!(file = %filename_display(file), error = %e, "Skipping file");
                batch.warnings.push(format!(
                    "Could not process \"{}\": {}",
                    filename_display(file),
                    e
                ));
            }
        }
    }

    let from_waveform = batch
        .samples
        .iter()
        .filter(|s| s.note_source == Some(NoteSource::Waveform))
        .count();
    if from_waveform > 0 {
        batch.warnings.push(format!(
            "{} sample{} detected via audio analysis",
            from_waveform,
            if from_waveform == 1 { "" } else { "s" }
        ));
    }

    batch
}

// The per-file journey. Pure apart from reading the file, so rayon can
// fan it out freely.
fn process_file(
    path: &Path,
    group_kind: Option<GroupKind>,
    settings: &PipelineSettings,
) -> Result<ProcessedSample, SampleError> {
    let source_name = filename_display(path).to_string();
    let audio = decode_file(path)?;

    // Note resolution order: manual entry, then the file name, then
    // waveform analysis on the native-rate audio.
    let detection_name = match group_kind {
        Some(kind) => grouping::strip_group_suffix(&source_name, kind),
        None => source_name.clone(),
    };
    let (root_note, note_source) = resolve_note(&source_name, &detection_name, &audio, settings);

    let target_rate = settings.quality.sample_rate();
    let audio = resample(audio, target_rate)?;

    let conditioned = dsp::condition(audio.left, audio.right, target_rate, root_note);
    let frames = conditioned.left.len();
    let wav = wav::encode_stereo(
        &conditioned.left,
        &conditioned.right,
        target_rate,
        settings.bit_depth,
    );

    info!(
        name = %source_name,
        note = ?root_note,
        source = ?note_source,
        frames,
        truncated = conditioned.truncated,
        "Processed sample"
    );

    Ok(ProcessedSample {
        source_name,
        root_note,
        note_source,
        frames,
        wav,
        truncated: conditioned.truncated,
        max_duration: conditioned.max_duration,
    })
}

fn resolve_note(
    source_name: &str,
    detection_name: &str,
    audio: &DecodedAudio,
    settings: &PipelineSettings,
) -> (Option<u8>, Option<NoteSource>) {
    if let Some(&note) = settings.manual_notes.get(source_name) {
        return (Some(note), Some(NoteSource::Manual));
    }
    if let Some(note) = parse_note_from_filename(detection_name) {
        return (Some(note), Some(NoteSource::Filename));
    }
    if let Some(estimate) = pitch::detect(&audio.left, &audio.right, audio.sample_rate) {
        return (Some(estimate.midi_note), Some(NoteSource::Waveform));
    }
    (None, None)
}

// The batch-wide stages: density selection, gap filling, sort, zone
// assembly. Consumes the batch and returns the finished bundle plus its
// warnings.
fn finish_instrument(
    display_name: &str,
    batch: Batch,
    settings: &PipelineSettings,
) -> Result<(PresetBundle, Vec<String>, usize), PipelineError> {
    let Batch {
        samples,
        mut warnings,
    } = batch;

    if samples.is_empty() {
        return Err(PipelineError::NoUsableSamples);
    }

    let original_count = samples.len();
    let mut samples = if samples.len() > settings.density.max_samples() {
        let selected = density::select_by_density(samples, settings.density);
        warnings.push(format!(
            "Using {} of {} samples ({})",
            selected.len(),
            original_count,
            settings.density.description()
        ));
        selected
    } else {
        samples
    };

    samples = gaps::assign_missing_notes(samples);
    if samples.is_empty() {
        return Err(PipelineError::NothingAssembled);
    }
    samples.sort_by_key(|sample| sample.root_note);

    let zone_samples: Vec<ZoneSample> = samples
        .iter()
        .map(|sample| ZoneSample {
            root_note: sample.root_note.expect("gap filler pitched every sample"),
            framecount: sample.frames,
        })
        .collect();
    let assembled = preset::assemble(display_name, &zone_samples);

    let assets: Vec<(String, Vec<u8>)> = assembled
        .filenames
        .iter()
        .cloned()
        .zip(samples.into_iter().map(|sample| sample.wav))
        .collect();

    let patch_json =
        serde_json::to_vec(&assembled.patch).expect("patch document serializes");

    let folder_name = format!("{}.preset", preset::sanitize_name(display_name));
    info!(
        folder = %folder_name,
        zones = assets.len(),
        "Assembled preset"
    );

    let count = assets.len();
    Ok((
        PresetBundle {
            folder_name,
            patch_json,
            assets,
        },
        warnings,
        count,
    ))
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil::signal::sine;
    use crate::testutil::write_wav_16;

    fn settings(name: &str) -> PipelineSettings {
        PipelineSettings {
            preset_name: name.to_string(),
            quality: Quality::Lofi,
            bit_depth: BitDepth::Sixteen,
            density: Density::Balanced,
            manual_notes: HashMap::new(),
            grouping: true,
        }
    }

    fn write_tone(dir: &Path, name: &str, frequency: f64) -> PathBuf {
        let path = dir.join(name);
        let samples = sine(frequency, 22050, 0.6);
        write_wav_16(&path, &samples, &samples, 22050);
        path
    }

    #[test]
    fn test_single_instrument_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let files = vec![
            write_tone(dir.path(), "piano-C3.wav", 130.81),
            write_tone(dir.path(), "piano-C4.wav", 261.63),
        ];

        let outcome = run(&files, &settings("Test Piano")).expect("outcome");
        assert_eq!(1, outcome.bundles.len());
        assert_eq!(2, outcome.sample_count);

        let bundle = &outcome.bundles[0];
        assert_eq!("Test-Piano.preset", bundle.folder_name);
        assert_eq!(2, bundle.assets.len());

        let patch: serde_json::Value =
            serde_json::from_slice(&bundle.patch_json).expect("patch json");
        assert_eq!(2, patch["regions"].as_array().unwrap().len());
        assert_eq!(48, patch["regions"][0]["pitch.keycenter"]);
        assert_eq!(127, patch["regions"][1]["hikey"]);
    }

    #[test]
    fn test_decode_failure_becomes_warning() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = write_tone(dir.path(), "good-A3.wav", 220.0);
        let bad = dir.path().join("bad.wav");
        std::fs::write(&bad, b"not audio").expect("write");

        let outcome = run(&[good, bad], &settings("Mixed")).expect("outcome");
        assert_eq!(1, outcome.sample_count);
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.contains("Could not process \"bad.wav\"")));
    }

    #[test]
    fn test_all_failures_are_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bad = dir.path().join("bad.wav");
        std::fs::write(&bad, b"not audio").expect("write");

        let result = run(&[bad], &settings("Broken"));
        assert!(matches!(result, Err(PipelineError::NoUsableSamples)));
    }

    #[test]
    fn test_empty_input_is_fatal() {
        let result = run(&[], &settings("Empty"));
        assert!(matches!(result, Err(PipelineError::NoUsableSamples)));
    }

    #[test]
    fn test_manual_note_precedes_filename() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = write_tone(dir.path(), "piano-C3.wav", 130.81);

        let mut s = settings("Manual");
        s.manual_notes.insert("piano-C3.wav".to_string(), 72);

        let outcome = run(&[file], &s).expect("outcome");
        let patch: serde_json::Value =
            serde_json::from_slice(&outcome.bundles[0].patch_json).expect("json");
        assert_eq!(72, patch["regions"][0]["pitch.keycenter"]);
    }

    #[test]
    fn test_unpitched_sample_gap_filled() {
        let dir = tempfile::tempdir().expect("tempdir");
        // Noise burst with no name hint: both trackers should pass on
        // it and the gap filler takes over.
        let path = dir.path().join("hit.wav");
        let samples: Vec<f32> = (0..11025)
            .map(|i| if i % 2 == 0 { 0.4 } else { -0.4 })
            .collect();
        write_wav_16(&path, &samples, &samples, 22050);

        let outcome = run(&[path], &settings("Perc")).expect("outcome");
        let patch: serde_json::Value =
            serde_json::from_slice(&outcome.bundles[0].patch_json).expect("json");
        // An 11 kHz square wave is outside the accepted range, so the
        // sample lands on the first gap-fill note.
        assert_eq!(48, patch["regions"][0]["pitch.keycenter"]);
    }

    #[test]
    fn test_grouped_run_builds_one_preset_per_group() {
        let dir = tempfile::tempdir().expect("tempdir");
        let files = vec![
            write_tone(dir.path(), "key-C3_RR1.wav", 130.81),
            write_tone(dir.path(), "key-C4_RR1.wav", 261.63),
            write_tone(dir.path(), "key-C3_RR2.wav", 130.81),
            write_tone(dir.path(), "key-C4_RR2.wav", 261.63),
        ];

        let outcome = run(&files, &settings("Keys")).expect("outcome");
        assert_eq!(2, outcome.bundles.len());
        assert_eq!(4, outcome.sample_count);
        assert_eq!("Keys-1.preset", outcome.bundles[0].folder_name);
        assert_eq!("Keys-2.preset", outcome.bundles[1].folder_name);

        // The group suffix must not confuse note detection.
        let patch: serde_json::Value =
            serde_json::from_slice(&outcome.bundles[0].patch_json).expect("json");
        assert_eq!(48, patch["regions"][0]["pitch.keycenter"]);
    }

    #[test]
    fn test_grouping_disabled_merges_everything() {
        let dir = tempfile::tempdir().expect("tempdir");
        let files = vec![
            write_tone(dir.path(), "key-C3_RR1.wav", 130.81),
            write_tone(dir.path(), "key-C4_RR1.wav", 261.63),
            write_tone(dir.path(), "key-G3_RR2.wav", 196.0),
            write_tone(dir.path(), "key-G4_RR2.wav", 392.0),
        ];

        let mut s = settings("Keys");
        s.grouping = false;
        let outcome = run(&files, &s).expect("outcome");
        assert_eq!(1, outcome.bundles.len());
        assert_eq!(4, outcome.sample_count);
    }
}
