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

//! Audio file intake: decoding to planar stereo and sample-rate
//! conversion.

pub mod decode;
pub mod resample;

pub use decode::{decode_file, DecodeError};
pub use resample::{resample, ResampleError};

/// Planar stereo audio at a known sample rate. Mono sources arrive with
/// the single channel duplicated into both buffers.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Left channel samples in [-1, 1].
    pub left: Vec<f32>,
    /// Right channel samples, same length as `left`.
    pub right: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Returns the number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.left.len()
    }
}
