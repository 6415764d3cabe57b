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

//! Output configuration tiers.
//!
//! Each tier is a closed enumeration with its constants attached, so
//! everything is resolved when the command line is parsed and nothing is
//! looked up by string at processing time.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output sample rate tier.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// 44.1 kHz, what the hardware's own presets use.
    Standard,
    /// 48 kHz.
    High,
    /// 22.05 kHz, for small presets.
    Lofi,
}

impl Quality {
    /// The output sample rate in Hz.
    pub fn sample_rate(self) -> u32 {
        match self {
            Quality::Standard => 44100,
            Quality::High => 48000,
            Quality::Lofi => 22050,
        }
    }
}

/// Output PCM bit depth.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitDepth {
    #[value(name = "16")]
    #[serde(rename = "16")]
    Sixteen,
    #[value(name = "24")]
    #[serde(rename = "24")]
    TwentyFour,
}

impl BitDepth {
    /// Bits per sample per channel.
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Sixteen => 16,
            BitDepth::TwentyFour => 24,
        }
    }
}

/// How many samples to keep and how far apart to aim them.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    /// Up to 24 samples, one per major third.
    Full,
    /// Up to 12 samples, one per perfect fifth.
    Balanced,
    /// Up to 5 samples, one per octave and change; leans on the
    /// hardware's pitch shifting.
    Lite,
}

impl Density {
    /// Maximum number of samples in the preset.
    pub fn max_samples(self) -> usize {
        match self {
            Density::Full => 24,
            Density::Balanced => 12,
            Density::Lite => 5,
        }
    }

    /// Target spacing between kept samples, in semitones.
    pub fn interval(self) -> u32 {
        match self {
            Density::Full => 4,
            Density::Balanced => 7,
            Density::Lite => 14,
        }
    }

    /// Short human-readable description of the spacing.
    pub fn description(self) -> &'static str {
        match self {
            Density::Full => "every major 3rd",
            Density::Balanced => "every perfect 5th",
            Density::Lite => "every octave+",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_quality_rates() {
        assert_eq!(44100, Quality::Standard.sample_rate());
        assert_eq!(48000, Quality::High.sample_rate());
        assert_eq!(22050, Quality::Lofi.sample_rate());
    }

    #[test]
    fn test_density_tiers() {
        assert_eq!(24, Density::Full.max_samples());
        assert_eq!(4, Density::Full.interval());
        assert_eq!(12, Density::Balanced.max_samples());
        assert_eq!(7, Density::Balanced.interval());
        assert_eq!(5, Density::Lite.max_samples());
        assert_eq!(14, Density::Lite.interval());
    }

    #[test]
    fn test_bit_depths() {
        assert_eq!(16, BitDepth::Sixteen.bits());
        assert_eq!(24, BitDepth::TwentyFour.bits());
    }
}
