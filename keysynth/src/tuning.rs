//! Equal-tempered tuning for the instrument's keys, and the mapping from a
//! key to its pitch class.

use crate::NUM_NOTES;
use num_traits::Float;

/// The frequencies, in Hz, of every key on the instrument.
///
/// Key `i` sounds at `base * 2^(i/12)`, so the table is strictly increasing
/// for any positive base.  The table is dense and indexed by note id.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrequencyTable {
    freqs: [f64; NUM_NOTES],
}

impl FrequencyTable {
    /// Base frequency used when none (or a nonsensical one) is provided: A1
    pub const DEFAULT_BASE: f64 = 55.0;

    /// Build the table for the lowest key sounding at `base_freq` Hz.
    ///
    /// A base that is not a finite, positive frequency is replaced with
    /// [Self::DEFAULT_BASE].
    pub fn build(base_freq: f64) -> Self {
        let base = if base_freq.is_finite() && base_freq > 0.0 {
            base_freq
        } else {
            Self::DEFAULT_BASE
        };
        let mut freqs = [0f64; NUM_NOTES];
        for (i, freq) in freqs.iter_mut().enumerate() {
            *freq = base * Float::powf(2f64, i as f64 / 12.0);
        }
        Self { freqs }
    }
    /// The frequency of `note`, or `None` if there is no such key
    pub fn get(&self, note: u8) -> Option<f64> {
        self.freqs.get(note as usize).copied()
    }
    /// The frequency of the lowest key
    pub fn lowest(&self) -> f64 {
        self.freqs[0]
    }
    /// The frequency of the highest key
    pub fn highest(&self) -> f64 {
        self.freqs[NUM_NOTES - 1]
    }
    /// The whole table
    pub fn as_array(&self) -> &[f64; NUM_NOTES] {
        &self.freqs
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::build(Self::DEFAULT_BASE)
    }
}

/// One of the twelve pitch classes.
///
/// Like musical notation (and unlike the usual naming convention for
/// enum variants) flats use a lowercase `b`.  No sharps are provided - use
/// the enharmonic flat.  Sharps are accepted when parsing a label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum PitchClass {
    #[default]
    A,
    Bb,
    B,
    C,
    Db,
    D,
    Eb,
    E,
    F,
    Gb,
    G,
    Ab,
}

impl PitchClass {
    const ELEM: [PitchClass; 12] = [
        Self::A,
        Self::Bb,
        Self::B,
        Self::C,
        Self::Db,
        Self::D,
        Self::Eb,
        Self::E,
        Self::F,
        Self::Gb,
        Self::G,
        Self::Ab,
    ];
    const LABELS: [&'static str; 12] = [
        "A", "Bb", "B", "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab",
    ];
    /// All twelve pitch classes, starting at A
    pub const fn elements() -> &'static [PitchClass] {
        &Self::ELEM
    }
    /// The pitch class `semitones` above A, wrapping every octave
    pub const fn from_semitones(semitones: u8) -> Self {
        Self::ELEM[(semitones % 12) as usize]
    }
    /// The pitch class `semitones` above this one
    pub const fn transpose(self, semitones: u8) -> Self {
        Self::from_semitones((self as u8) + (semitones % 12))
    }
    /// The pitch class of key `note` when key 0 has pitch class `base`
    pub const fn of_note(base: PitchClass, note: u8) -> Self {
        base.transpose(note)
    }
    /// A printable label, using flats
    pub const fn label(self) -> &'static str {
        Self::LABELS[self as usize]
    }
}

impl core::fmt::Display for PitchClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<&str> for PitchClass {
    type Error = &'static str;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut chars = value.trim().chars();
        let natural: u8 = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('A') => 0,
            Some('B') => 2,
            Some('C') => 3,
            Some('D') => 5,
            Some('E') => 7,
            Some('F') => 8,
            Some('G') => 10,
            _ => return Err("Unknown pitch class"),
        };
        let semitones = match (chars.next(), chars.next()) {
            (None, _) => natural,
            (Some('#') | Some('\u{266F}'), None) => natural + 1,
            (Some('b') | Some('\u{266D}'), None) => natural + 11,
            _ => return Err("Unknown pitch class"),
        };
        Ok(Self::from_semitones(semitones))
    }
}

/// True if `note` is a key on the instrument and has pitch class `class`,
/// given that key 0 has pitch class `base`
pub fn note_in_pitch_class(base: PitchClass, note: u8, class: PitchClass) -> bool {
    (note as usize) < NUM_NOTES && PitchClass::of_note(base, note) == class
}
