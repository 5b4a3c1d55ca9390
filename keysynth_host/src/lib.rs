//! Host-side driver for the keysynth voice engine.
//!
//! On the instrument the engine is ticked by a hardware timer interrupt and
//! fed by the touch keyboard.  This crate plays the same roles on a desktop
//! machine: MIDI messages stand in for the keyboard ([midi]), a dedicated
//! thread stands in for the timer interrupt ([player]), and the DAC codes
//! are written to a file or discarded ([dac]).

#![warn(missing_docs)]

pub mod config;
pub mod dac;
pub mod display;
pub mod midi;
pub mod player;
pub mod script;

/// The name of the program
pub const NAME: &str = "keysynth";
/// The version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
