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

//! Whole-file decoding of audio files (WAV, AIFF, FLAC, MP3, ...) into
//! planar stereo f32 via symphonia.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::debug;

use super::DecodedAudio;

/// Error decoding one input file. Per-file decode failures are surfaced
/// as batch warnings, not batch aborts.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("'{path}': {source}")]
    Unsupported {
        path: String,
        source: SymphoniaError,
    },

    #[error("'{path}': no audio track found")]
    NoAudioTrack { path: String },

    #[error("'{path}': sample rate not specified")]
    MissingSampleRate { path: String },

    #[error("'{path}': file decoded to no audio")]
    Empty { path: String },
}

/// Decodes an entire audio file to planar stereo at its native sample
/// rate. Mono is duplicated into both channels; channels beyond the first
/// two are dropped.
pub fn decode_file(path: &Path) -> Result<DecodedAudio, DecodeError> {
    let display_path = path.to_string_lossy().to_string();

    let file = File::open(path).map_err(|e| DecodeError::Io {
        path: display_path.clone(),
        source: e,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // A hint from the extension helps the probe pick the right reader.
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();
    let probed = get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|e| DecodeError::Unsupported {
            path: display_path.clone(),
            source: e,
        })?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::NoAudioTrack {
            path: display_path.clone(),
        })?;
    let track_id = track.id;
    let params = &track.codec_params;

    let sample_rate = params
        .sample_rate
        .ok_or_else(|| DecodeError::MissingSampleRate {
            path: display_path.clone(),
        })?;

    let decoder_opts: DecoderOptions = Default::default();
    let mut decoder =
        get_codecs()
            .make(params, &decoder_opts)
            .map_err(|e| DecodeError::Unsupported {
                path: display_path.clone(),
                source: e,
            })?;

    let mut left: Vec<f32> = Vec::new();
    let mut right: Vec<f32> = Vec::new();

    loop {
        let packet = match read_next_packet(format_reader.as_mut()) {
            Ok(Some(packet)) => packet,
            Ok(None) => break,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => {
                return Err(DecodeError::Unsupported {
                    path: display_path,
                    source: e,
                })
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                match decoder.decode(&packet) {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        return Err(DecodeError::Unsupported {
                            path: display_path,
                            source: e,
                        })
                    }
                }
            }
            Err(e) => {
                return Err(DecodeError::Unsupported {
                    path: display_path,
                    source: e,
                })
            }
        };

        append_planar_stereo(decoded, &mut left, &mut right);
    }

    if left.is_empty() {
        return Err(DecodeError::Empty { path: display_path });
    }

    debug!(
        path = ?path,
        frames = left.len(),
        sample_rate,
        "Decoded audio file"
    );

    Ok(DecodedAudio {
        left,
        right,
        sample_rate,
    })
}

// Reads the next packet, mapping the EOF conventions of the various
// readers to `Ok(None)`. ResetRequired is propagated so the caller can
// reset the decoder.
fn read_next_packet(
    format_reader: &mut dyn FormatReader,
) -> Result<Option<symphonia::core::formats::Packet>, SymphoniaError> {
    match format_reader.next_packet() {
        Ok(packet) => Ok(Some(packet)),
        Err(SymphoniaError::ResetRequired) => Err(SymphoniaError::ResetRequired),
        Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Ok(None)
        }
        // Some decoders signal EOF with a decode error instead of an
        // I/O error.
        Err(SymphoniaError::DecodeError(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

// Appends a decoded buffer to the planar output, converting any sample
// format to f32. Mono planes are duplicated; planes beyond two dropped.
fn append_planar_stereo(decoded: AudioBufferRef, left: &mut Vec<f32>, right: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::F32(buf) => append_converted(&buf, left, right, |sample| sample),
        AudioBufferRef::F64(buf) => append_converted(&buf, left, right, |sample| sample as f32),
        AudioBufferRef::S8(buf) => {
            append_converted(&buf, left, right, |sample| {
                f32::from(sample) / (1i64 << 7) as f32
            });
        }
        AudioBufferRef::S16(buf) => {
            append_converted(&buf, left, right, |sample| {
                f32::from(sample) / (1i64 << 15) as f32
            });
        }
        AudioBufferRef::S24(buf) => {
            append_converted(&buf, left, right, |sample| {
                sample.inner() as f32 / (1i64 << 23) as f32
            });
        }
        AudioBufferRef::S32(buf) => {
            append_converted(&buf, left, right, |sample| {
                sample as f32 / (1i64 << 31) as f32
            });
        }
        AudioBufferRef::U8(buf) => {
            append_converted(&buf, left, right, |sample| {
                (f32::from(sample) / f32::from(u8::MAX)) * 2.0 - 1.0
            });
        }
        AudioBufferRef::U16(buf) => {
            append_converted(&buf, left, right, |sample| {
                (f32::from(sample) / f32::from(u16::MAX)) * 2.0 - 1.0
            });
        }
        AudioBufferRef::U24(buf) => {
            append_converted(&buf, left, right, |sample| {
                (sample.inner() as f32 / ((1u32 << 24) - 1) as f32) * 2.0 - 1.0
            });
        }
        AudioBufferRef::U32(buf) => {
            append_converted(&buf, left, right, |sample| {
                (sample as f32 / u32::MAX as f32) * 2.0 - 1.0
            });
        }
    }
}

fn append_converted<T, F>(
    buf: &AudioBuffer<T>,
    left: &mut Vec<f32>,
    right: &mut Vec<f32>,
    convert: F,
) where
    T: symphonia::core::sample::Sample,
    F: Fn(T) -> f32,
{
    let frames = buf.frames();
    let planes = buf.planes();
    let planes = planes.planes();
    if planes.is_empty() {
        return;
    }

    let left_plane = planes[0];
    let right_plane = planes.get(1).copied().unwrap_or(left_plane);

    left.reserve(frames);
    right.reserve(frames);
    for frame in 0..frames {
        left.push(convert(left_plane[frame]));
        right.push(convert(right_plane[frame]));
    }
}
