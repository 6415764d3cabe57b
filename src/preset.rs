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

//! The OP-XY multisampler patch document and keyboard-zone assembly.
//!
//! Region semantics on the hardware: `lokey` is always 0 and the zone a
//! key falls into is decided by `hikey` boundaries alone, with
//! `pitch.keycenter` naming the root. Looping is never enabled by this
//! tool; the loop fields are emitted in their degenerate form because
//! the device expects them present.

use serde::{Deserialize, Serialize};

use crate::note::midi_to_note_name;

/// Maximum length of a sanitized preset file name component.
const MAX_NAME_LEN: usize = 14;

/// Fallback when sanitizing empties a name.
const FALLBACK_NAME: &str = "sample";

/// Fraction of a sample's frames stored as the loop crossfade.
const CROSSFADE_FRACTION: f64 = 0.10;

/// One keyboard zone, serialized in the patch's flat dotted-key layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub framecount: usize,
    pub gain: i32,
    pub hikey: u8,
    pub lokey: u8,
    #[serde(rename = "loop.crossfade")]
    pub loop_crossfade: usize,
    #[serde(rename = "loop.enabled")]
    pub loop_enabled: bool,
    #[serde(rename = "loop.end")]
    pub loop_end: usize,
    #[serde(rename = "loop.onrelease")]
    pub loop_onrelease: bool,
    #[serde(rename = "loop.start")]
    pub loop_start: usize,
    #[serde(rename = "pitch.keycenter")]
    pub pitch_keycenter: u8,
    pub reverse: bool,
    pub sample: String,
    #[serde(rename = "sample.end")]
    pub sample_end: usize,
    #[serde(rename = "sample.start")]
    pub sample_start: usize,
    pub tune: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModRoute {
    pub amount: u32,
    pub target: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Modulation {
    pub aftertouch: ModRoute,
    pub modwheel: ModRoute,
    pub pitchbend: ModRoute,
    pub velocity: ModRoute,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    pub bendrange: u32,
    pub highpass: u32,
    pub modulation: Modulation,
    pub params: [u32; 8],
    pub playmode: String,
    #[serde(rename = "portamento.amount")]
    pub portamento_amount: u32,
    #[serde(rename = "portamento.type")]
    pub portamento_type: u32,
    pub transpose: i32,
    #[serde(rename = "tuning.root")]
    pub tuning_root: u32,
    #[serde(rename = "tuning.scale")]
    pub tuning_scale: u32,
    #[serde(rename = "velocity.sensitivity")]
    pub velocity_sensitivity: u32,
    pub volume: u32,
    pub width: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdsrBlock {
    pub attack: u32,
    pub decay: u32,
    pub release: u32,
    pub sustain: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub amp: AdsrBlock,
    pub filter: AdsrBlock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fx {
    pub active: bool,
    pub params: [u32; 8],
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lfo {
    pub active: bool,
    pub params: [u32; 8],
    #[serde(rename = "type")]
    pub kind: String,
}

/// The complete patch document written as `patch.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    pub engine: Engine,
    pub envelope: Envelope,
    pub fx: Fx,
    pub lfo: Lfo,
    pub octave: i32,
    pub platform: String,
    pub regions: Vec<Region>,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
}

// Engine, envelope and effect blocks are fixed; they mirror a known-good
// factory preset and the pipeline never varies them.
fn default_engine() -> Engine {
    Engine {
        bendrange: 0,
        highpass: 0,
        modulation: Modulation {
            aftertouch: ModRoute {
                amount: 30719,
                target: 4096,
            },
            modwheel: ModRoute {
                amount: 32767,
                target: 10240,
            },
            pitchbend: ModRoute {
                amount: 16383,
                target: 0,
            },
            velocity: ModRoute {
                amount: 16383,
                target: 0,
            },
        },
        params: [16384; 8],
        playmode: "poly".to_string(),
        portamento_amount: 0,
        portamento_type: 32767,
        transpose: 0,
        tuning_root: 0,
        tuning_scale: 0,
        velocity_sensitivity: 10240,
        volume: 26214,
        width: 3072,
    }
}

fn default_envelope() -> Envelope {
    let block = AdsrBlock {
        attack: 655,
        decay: 5898,
        release: 10485,
        sustain: 21954,
    };
    Envelope {
        amp: block.clone(),
        filter: block,
    }
}

fn default_fx() -> Fx {
    Fx {
        active: true,
        params: [32767, 0, 9439, 0, 13107, 32767, 2948, 8847],
        kind: "svf".to_string(),
    }
}

fn default_lfo() -> Lfo {
    Lfo {
        active: false,
        params: [19024, 32255, 4048, 17408, 0, 0, 0, 0],
        kind: "element".to_string(),
    }
}

/// A fully-pitched sample ready for zone assignment.
#[derive(Debug, Clone, Copy)]
pub struct ZoneSample {
    /// Root note of the sample.
    pub root_note: u8,
    /// Frame count of the encoded audio.
    pub framecount: usize,
}

/// An assembled instrument: the patch plus the per-zone asset file
/// names, aligned with the input order.
#[derive(Debug)]
pub struct AssembledPreset {
    pub patch: Patch,
    pub filenames: Vec<String>,
}

/// Builds the zone map and patch document for samples already sorted
/// ascending by root note.
///
/// Zone `i` reaches from the bottom of the keyboard metadata-wise
/// (`lokey` 0) up to one key below the next sample's root; the last
/// zone always tops out at 127, so the union of zones covers the full
/// keyboard with no gaps.
pub fn assemble(display_name: &str, samples: &[ZoneSample]) -> AssembledPreset {
    let sanitized = sanitize_name(display_name);

    let mut regions = Vec::with_capacity(samples.len());
    let mut filenames = Vec::with_capacity(samples.len());

    for (index, sample) in samples.iter().enumerate() {
        let filename = format!(
            "{}-{}.wav",
            sanitized,
            midi_to_note_name(sample.root_note)
        );

        let hikey = match samples.get(index + 1) {
            Some(next) => next.root_note.saturating_sub(1),
            None => 127,
        };

        regions.push(Region {
            framecount: sample.framecount,
            gain: 0,
            hikey,
            lokey: 0,
            loop_crossfade: (sample.framecount as f64 * CROSSFADE_FRACTION) as usize,
            loop_enabled: false,
            loop_end: sample.framecount,
            loop_onrelease: false,
            loop_start: 0,
            pitch_keycenter: sample.root_note,
            reverse: false,
            sample: filename.clone(),
            sample_end: sample.framecount,
            sample_start: 0,
            tune: 0,
        });
        filenames.push(filename);
    }

    AssembledPreset {
        patch: Patch {
            engine: default_engine(),
            envelope: default_envelope(),
            fx: default_fx(),
            lfo: default_lfo(),
            octave: 0,
            platform: "OP-XY".to_string(),
            regions,
            kind: "multisampler".to_string(),
            version: 4,
        },
        filenames,
    }
}

/// Reduces a display name to the hardware's allowed character set
/// (letters, digits, space, `#`, `-`, `(`, `)`), collapsing runs to
/// single hyphens and capping the length. An empty result falls back to
/// a literal default.
pub fn sanitize_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '#' | '(' | ')') {
                c
            } else {
                // Whitespace and everything outside the allowed set.
                '-'
            }
        })
        .collect();

    let mut collapsed = String::with_capacity(replaced.len());
    for c in replaced.chars() {
        if c == '-' && collapsed.ends_with('-') {
            continue;
        }
        collapsed.push(c);
    }

    let trimmed: String = collapsed
        .trim_matches('-')
        .chars()
        .take(MAX_NAME_LEN)
        .collect();
    let trimmed = trimmed.trim_matches('-').to_string();

    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed
    }
}
