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
mod audio;
mod bundle;
mod config;
mod dsp;
mod grouping;
mod note;
mod pipeline;
mod pitch;
mod preset;
#[cfg(test)]
mod testutil;
mod util;
mod wav;

use std::collections::HashMap;
use std::error::Error;
use std::path::PathBuf;

use clap::{crate_version, Parser, Subcommand};

use config::{BitDepth, Density, Quality};
use pipeline::PipelineSettings;
use util::{collect_audio_files, filename_display, format_size};

#[derive(Parser)]
#[clap(
    author = "Jonas Keller",
    version = crate_version!(),
    about = "Builds OP-XY multisample presets from batches of audio recordings."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Builds one or more presets from the given audio files.
    Create {
        /// Audio files or directories of audio files.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// The preset display name.
        #[arg(short, long)]
        name: String,
        /// Output sample rate tier.
        #[arg(long, value_enum, default_value_t = Quality::Standard)]
        quality: Quality,
        /// Output PCM bit depth.
        #[arg(long, value_enum, default_value_t = BitDepth::Sixteen)]
        bit_depth: BitDepth,
        /// How many samples to keep across the keyboard.
        #[arg(long, value_enum, default_value_t = Density::Balanced)]
        density: Density,
        /// Manual note assignments. Should be in the form <FILE>=<NOTE>,
        /// where the note is a name or number. For example,
        /// pad.wav=C3 or pad.wav=48.
        #[arg(long = "note", value_name = "FILE=NOTE")]
        notes: Vec<String>,
        /// Directory the .preset folders are written to.
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        /// Overwrite existing preset folders.
        #[arg(long)]
        force: bool,
        /// Disable velocity/round-robin grouping detection.
        #[arg(long)]
        no_grouping: bool,
    },
    /// Shows per-file note detection and grouping without building anything.
    Inspect {
        /// Audio files or directories of audio files.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Create {
            paths,
            name,
            quality,
            bit_depth,
            density,
            notes,
            output,
            force,
            no_grouping,
        } => {
            let files = collect_audio_files(&paths)?;
            if files.is_empty() {
                return Err("no audio files found in the given paths".into());
            }

            let settings = PipelineSettings {
                preset_name: name,
                quality,
                bit_depth,
                density,
                manual_notes: parse_manual_notes(&notes)?,
                grouping: !no_grouping,
            };

            let outcome = pipeline::run(&files, &settings)?;
            bundle::write_bundles(&outcome.bundles, &output, force)?;

            let total_bytes: usize = outcome
                .bundles
                .iter()
                .map(|b| {
                    b.patch_json.len()
                        + b.assets.iter().map(|(_, bytes)| bytes.len()).sum::<usize>()
                })
                .sum();

            if outcome.bundles.len() == 1 {
                println!(
                    "Wrote {} ({} samples, {}-bit, {} Hz, {})",
                    outcome.bundles[0].folder_name,
                    outcome.sample_count,
                    settings.bit_depth.bits(),
                    settings.quality.sample_rate(),
                    format_size(total_bytes),
                );
            } else {
                println!(
                    "Wrote {} presets ({} samples, {}-bit, {} Hz, {}):",
                    outcome.bundles.len(),
                    outcome.sample_count,
                    settings.bit_depth.bits(),
                    settings.quality.sample_rate(),
                    format_size(total_bytes),
                );
                for preset_bundle in &outcome.bundles {
                    println!("- {}", preset_bundle.folder_name);
                }
            }

            if !outcome.warnings.is_empty() {
                println!("\nWarnings:");
                for warning in &outcome.warnings {
                    println!("- {}", warning);
                }
            }
        }
        Commands::Inspect { paths } => {
            let files = collect_audio_files(&paths)?;
            if files.is_empty() {
                return Err("no audio files found in the given paths".into());
            }

            if let Some(detection) = grouping::detect(&files) {
                println!("Grouping: {}\n", grouping::describe(&detection));
            }

            println!("Samples (count: {}):", files.len());
            for file in &files {
                let name = filename_display(file);
                if let Some(midi) = note::parse_note_from_filename(name) {
                    println!(
                        "- {}: {} (note {}, filename, {:.1} Hz)",
                        name,
                        note::midi_to_note_name(midi),
                        midi,
                        note::midi_to_frequency(midi)
                    );
                    continue;
                }

                match audio::decode_file(file) {
                    Ok(decoded) => {
                        match pitch::detect(&decoded.left, &decoded.right, decoded.sample_rate) {
                            Some(estimate) => {
                                let clarity = estimate
                                    .clarity
                                    .map(|c| format!(", clarity {c:.2}"))
                                    .unwrap_or_default();
                                println!(
                                    "- {}: {} (note {}, audio analysis, {:.1} Hz{})",
                                    name,
                                    note::midi_to_note_name(estimate.midi_note),
                                    estimate.midi_note,
                                    estimate.frequency,
                                    clarity
                                );
                            }
                            None => println!("- {}: undetected", name),
                        }
                    }
                    Err(e) => println!("- {}: decode failed ({})", name, e),
                }
            }
        }
    }

    Ok(())
}

// Parses repeated --note FILE=NOTE arguments, accepting note names and
// bare note numbers.
fn parse_manual_notes(notes: &[String]) -> Result<HashMap<String, u8>, Box<dyn Error>> {
    let mut manual = HashMap::new();

    for entry in notes {
        let Some((file, note)) = entry.rsplit_once('=') else {
            return Err(format!("malformed note assignment: {entry}").into());
        };
        let midi = match note::note_name_to_midi(note) {
            Some(midi) => midi,
            None => note
                .parse::<u8>()
                .ok()
                .filter(|n| *n <= 127)
                .ok_or_else(|| format!("invalid note \"{note}\" in assignment: {entry}"))?,
        };
        manual.insert(file.to_string(), midi);
    }

    Ok(manual)
}
