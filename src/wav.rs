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

//! Deterministic stereo WAV encoding.
//!
//! Writes a minimal RIFF/WAVE container (fmt and data chunks only, no
//! metadata) so identical input always yields identical bytes. Samples
//! are clamped, then rounded to the nearest code with the asymmetric
//! signed scale: negative amplitudes use the full negative range
//! (-32768 / -8388608) and positive amplitudes the positive one
//! (32767 / 8388607).

use crate::config::BitDepth;

const NUM_CHANNELS: u16 = 2;
const RIFF_HEADER_LEN: u32 = 44;

/// Encodes planar stereo samples into a complete WAV file.
pub fn encode_stereo(left: &[f32], right: &[f32], sample_rate: u32, bit_depth: BitDepth) -> Vec<u8> {
    let pcm = match bit_depth {
        BitDepth::Sixteen => stereo_to_pcm16(left, right),
        BitDepth::TwentyFour => stereo_to_pcm24(left, right),
    };

    let bits_per_sample = bit_depth.bits();
    let block_align = NUM_CHANNELS * (bits_per_sample / 8);
    let byte_rate = sample_rate * u32::from(block_align);
    let data_len = pcm.len() as u32;

    let mut wav = Vec::with_capacity(RIFF_HEADER_LEN as usize + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(RIFF_HEADER_LEN - 8 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // chunk size for plain PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // format tag: PCM
    wav.extend_from_slice(&NUM_CHANNELS.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(&pcm);

    wav
}

// Interleaves to L-R frames of little-endian i16.
fn stereo_to_pcm16(left: &[f32], right: &[f32]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(left.len() * 4);
    for (&l, &r) in left.iter().zip(right.iter()) {
        pcm.extend_from_slice(&quantize16(l).to_le_bytes());
        pcm.extend_from_slice(&quantize16(r).to_le_bytes());
    }
    pcm
}

// Interleaves to L-R frames of 3-byte little-endian two's complement.
fn stereo_to_pcm24(left: &[f32], right: &[f32]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(left.len() * 6);
    for (&l, &r) in left.iter().zip(right.iter()) {
        pcm.extend_from_slice(&quantize24(l).to_le_bytes()[..3]);
        pcm.extend_from_slice(&quantize24(r).to_le_bytes()[..3]);
    }
    pcm
}

fn quantize16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    let scaled = if clamped < 0.0 {
        clamped * 32768.0
    } else {
        clamped * 32767.0
    };
    scaled.round() as i16
}

fn quantize24(sample: f32) -> i32 {
    let clamped = sample.clamp(-1.0, 1.0);
    let scaled = if clamped < 0.0 {
        f64::from(clamped) * 8_388_608.0
    } else {
        f64::from(clamped) * 8_388_607.0
    };
    scaled.round() as i32
}
