//! Harmonic profiles, which define the timbre of each selectable instrument.

use crate::NUM_HARMONICS;

/// The relative weights of the partials making up a waveform.
///
/// Partial `h` sounds at `multipliers[h]` times the fundamental with a
/// weight of `weights[h]`.  Weights are expected to be non-negative; the
/// wavetable builder treats a negative weight as zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HarmonicProfile {
    /// The weight of each partial
    pub weights: [f32; NUM_HARMONICS],
    /// The multiple of the fundamental frequency of each partial
    pub multipliers: [u8; NUM_HARMONICS],
}

impl HarmonicProfile {
    /// The natural harmonic series (fundamental, octave, twelfth, ...)
    pub const HARMONIC_SERIES: [u8; NUM_HARMONICS] = [1, 2, 3, 4, 5, 6];
    /// Odd harmonics only
    pub const ODD_HARMONICS: [u8; NUM_HARMONICS] = [1, 3, 5, 7, 9, 11];

    /// A profile over the natural harmonic series
    pub const fn new(weights: [f32; NUM_HARMONICS]) -> Self {
        Self::with_multipliers(weights, Self::HARMONIC_SERIES)
    }
    /// A profile with explicitly chosen partials
    pub const fn with_multipliers(
        weights: [f32; NUM_HARMONICS],
        multipliers: [u8; NUM_HARMONICS],
    ) -> Self {
        Self {
            weights,
            multipliers,
        }
    }
    /// The sum of all (non-negative) weights
    pub fn weight_sum(&self) -> f64 {
        self.weights.iter().map(|w| f64::from(w.max(0.0))).sum()
    }
    /// Iterate over the `(multiplier, weight)` of each partial, skipping
    /// partials that contribute nothing
    pub fn partials(&self) -> impl Iterator<Item = (u8, f32)> + '_ {
        self.multipliers
            .iter()
            .zip(self.weights.iter())
            .filter(|(_, w)| **w > 0.0)
            .map(|(m, w)| (*m, *w))
    }
}

impl Default for HarmonicProfile {
    fn default() -> Self {
        Instrument::default().profile()
    }
}

/// The fixed set of instruments (timbres) selectable at runtime
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Instrument {
    /// A pure sine, the fundamental only
    #[default]
    Sine,
    /// Falling weights on the first four harmonics
    Piano,
    /// A strong fundamental with faint second and third harmonics
    Flute,
    /// Odd harmonics only, for a hollow reed tone
    Clarinet,
    /// Octave-spaced drawbars
    Organ,
}

impl Instrument {
    const ELEM: [Instrument; 5] = [
        Self::Sine,
        Self::Piano,
        Self::Flute,
        Self::Clarinet,
        Self::Organ,
    ];
    const PROFILES: [HarmonicProfile; 5] = [
        HarmonicProfile::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
        HarmonicProfile::new([1.0, 0.75, 0.5, 0.25, 0.0, 0.0]),
        HarmonicProfile::new([1.0, 0.1, 0.05, 0.0, 0.0, 0.0]),
        HarmonicProfile::with_multipliers(
            [1.0, 0.5, 0.3, 0.2, 0.1, 0.05],
            HarmonicProfile::ODD_HARMONICS,
        ),
        HarmonicProfile::new([1.0, 0.5, 0.0, 0.25, 0.0, 0.0]),
    ];
    /// Returns a slice to all of the available instruments
    pub const fn elements() -> &'static [Instrument] {
        &Self::ELEM
    }
    /// Create an instrument from its index, or `None` if out of range
    pub const fn new_from_u8(value: u8) -> Option<Self> {
        if (value as usize) < Self::ELEM.len() {
            Some(Self::ELEM[value as usize])
        } else {
            None
        }
    }
    /// The harmonic profile of this instrument
    pub const fn profile(self) -> HarmonicProfile {
        Self::PROFILES[self as usize]
    }
    /// A printable name
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::Sine => "Sine",
            Self::Piano => "Piano",
            Self::Flute => "Flute",
            Self::Clarinet => "Clarinet",
            Self::Organ => "Organ",
        }
    }
}

impl TryFrom<u8> for Instrument {
    type Error = &'static str;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new_from_u8(value).ok_or("Unknown instrument")
    }
}

impl core::fmt::Display for Instrument {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.to_str())
    }
}
