//! This crate contains the real-time voice engine for a touch keyboard
//! instrument.  It is `no_std`, never allocates, and is designed so that the
//! per-sample path ([Engine::tick]) can run from a hardware timer interrupt
//! while the cooperative main loop drives note events through the mutator
//! methods on [Engine].
//!
//! The synthesis model is additive: a [HarmonicProfile] describes the
//! relative weight of up to [NUM_HARMONICS] partials, which is rendered once
//! into a single-cycle [Wavetable].  Every sounding note is a [Voice] that
//! walks this table at its own rate and decays under the control of the
//! [DecayScheduler].
//!
//! Most users want [Engine], [EngineConfig] and [Instrument].

#![no_std]
#![warn(missing_docs)]

pub mod context;
pub mod decay;
pub mod engine;
pub mod keys;
pub mod pool;
pub mod profile;
pub mod tuning;
pub mod wavetable;

mod util;

/// Number of keys on the instrument, and so the number of addressable notes
pub const NUM_NOTES: usize = 48;
/// Maximum number of simultaneously sounding voices
pub const VOICE_CAPACITY: usize = 48;
/// Length of one wavetable cycle.  Must be a power of two.
pub const WAVETABLE_LEN: usize = 256;
/// Number of partials in a [HarmonicProfile]
pub const NUM_HARMONICS: usize = 6;

/// Largest code the 12 bit DAC accepts
pub const DAC_MAX: u16 = 4095;
/// DAC code for silence (mid-scale)
pub const DAC_MID: u16 = 2048;
/// Peak signed excursion of a wavetable sample about [DAC_MID]
pub const FULL_SCALE: i32 = 2047;

pub use context::{Context, EngineConfig};
pub use decay::{ticks_to_silence, DecayCurve, DecayScheduler};
pub use engine::{Command, Dac, Engine};
pub use keys::{KeyScanner, NoteListener};
pub use pool::{Voice, VoicePool};
pub use profile::{HarmonicProfile, Instrument};
pub use tuning::{FrequencyTable, PitchClass};
pub use wavetable::{WaveBank, Wavetable};
