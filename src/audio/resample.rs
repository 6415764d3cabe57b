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

//! Band-limited sample-rate conversion with rubato's sinc resampler.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

use super::DecodedAudio;

/// Input block size for the sinc resampler.
const INPUT_BLOCK_SIZE: usize = 1024;

/// Error converting a sample rate.
#[derive(Debug, thiserror::Error)]
pub enum ResampleError {
    #[error("Resampler construction failed: {0}")]
    Construction(#[from] rubato::ResamplerConstructionError),

    #[error("Resampling failed: {0}")]
    Process(#[from] rubato::ResampleError),
}

/// Resamples planar stereo audio to `target_rate`. Identity when the
/// rates already match.
pub fn resample(audio: DecodedAudio, target_rate: u32) -> Result<DecodedAudio, ResampleError> {
    if audio.sample_rate == target_rate {
        return Ok(audio);
    }

    let source_rate = audio.sample_rate;
    let ratio = f64::from(target_rate) / f64::from(source_rate);
    let expected_frames = (audio.frames() as f64 * ratio).ceil() as usize;

    let sinc_params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        oversampling_factor: 128,
        interpolation: SincInterpolationType::Linear,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, sinc_params, INPUT_BLOCK_SIZE, 2)?;
    let delay = resampler.output_delay();

    let mut out_left: Vec<f32> = Vec::with_capacity(expected_frames + delay);
    let mut out_right: Vec<f32> = Vec::with_capacity(expected_frames + delay);

    let frames = audio.frames();
    let mut position = 0;
    while position + INPUT_BLOCK_SIZE <= frames {
        let chunk: [&[f32]; 2] = [
            &audio.left[position..position + INPUT_BLOCK_SIZE],
            &audio.right[position..position + INPUT_BLOCK_SIZE],
        ];
        let chunks = resampler.process(&chunk[..], None)?;
        append_chunks(&mut out_left, &mut out_right, chunks);
        position += INPUT_BLOCK_SIZE;
    }
    if position < frames {
        let chunk: [&[f32]; 2] = [&audio.left[position..], &audio.right[position..]];
        let chunks = resampler.process_partial(Some(&chunk[..]), None)?;
        append_chunks(&mut out_left, &mut out_right, chunks);
    }

    // The sinc filter delays its output; keep draining zero input until
    // the tail has flushed through.
    while out_left.len() < delay + expected_frames {
        let empty: Option<&[Vec<f32>]> = None;
        let chunks = resampler.process_partial(empty, None)?;
        if chunks.first().map_or(true, |c| c.is_empty()) {
            break;
        }
        append_chunks(&mut out_left, &mut out_right, chunks);
    }

    let start = delay.min(out_left.len());
    let end = (delay + expected_frames).min(out_left.len());
    let left = out_left[start..end].to_vec();
    let right = out_right[start..end].to_vec();

    debug!(
        source_rate,
        target_rate,
        in_frames = frames,
        out_frames = left.len(),
        "Resampled audio"
    );

    Ok(DecodedAudio {
        left,
        right,
        sample_rate: target_rate,
    })
}

// Planar resampler output arrives as one Vec per channel.
fn append_chunks(out_left: &mut Vec<f32>, out_right: &mut Vec<f32>, mut chunks: Vec<Vec<f32>>) {
    let right = chunks.pop().unwrap_or_default();
    let left = chunks.pop().unwrap_or_default();
    out_left.extend_from_slice(&left);
    out_right.extend_from_slice(&right);
}
