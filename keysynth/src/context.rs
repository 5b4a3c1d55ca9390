//! This module provides the engine configuration and the processing context
//! derived from it (tuning and sample rate).

use crate::decay::{DecayCurve, DecayScheduler};
use crate::profile::Instrument;
use crate::tuning::{FrequencyTable, PitchClass};
use crate::util::round_u32_nonzero;
use crate::WAVETABLE_LEN;

/// Tunable constants for an [Engine](crate::Engine).
///
/// Every field has a sensible default; see [EngineConfig::new].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Frequency of the lowest key, in Hz
    pub base_freq: f64,
    /// Pitch class of the lowest key
    pub base_pitch_class: PitchClass,
    /// Sample (tick) rate in Hz.  When `None`, the rate is chosen so that the
    /// highest key walks the wavetable exactly once per waveform cycle.
    pub sample_rate: Option<u32>,
    /// Sample ticks between decay steps
    pub decay_interval: u32,
    /// Decay coefficients and eviction threshold
    pub decay: DecayCurve,
    /// Amplitude given to notes started from the touch keyboard
    pub onset_amplitude: f32,
    /// Instrument selected at startup
    pub instrument: Instrument,
}

impl EngineConfig {
    /// Default amplitude of a touch-keyboard onset
    pub const DEFAULT_ONSET_AMPLITUDE: f32 = 0.7;

    /// The default configuration: A1 (55 Hz) on the lowest key, the sample
    /// rate derived from the highest key, a decay step every 100 ticks.
    pub const fn new() -> Self {
        Self {
            base_freq: FrequencyTable::DEFAULT_BASE,
            base_pitch_class: PitchClass::A,
            sample_rate: None,
            decay_interval: DecayScheduler::DEFAULT_INTERVAL,
            decay: DecayCurve::new(),
            onset_amplitude: Self::DEFAULT_ONSET_AMPLITUDE,
            instrument: Instrument::Sine,
        }
    }
    /// A copy of this configuration with unusable values replaced by
    /// defaults.  Returns the copy and whether anything was replaced.
    pub fn sanitized(&self) -> (Self, bool) {
        let defaults = Self::new();
        let mut ret = *self;
        if !(ret.base_freq.is_finite() && ret.base_freq > 0.0) {
            ret.base_freq = defaults.base_freq;
        }
        if ret.sample_rate == Some(0) {
            ret.sample_rate = None;
        }
        if ret.decay_interval == 0 {
            ret.decay_interval = 1;
        }
        ret.decay = ret.decay.sanitized();
        if !(ret.onset_amplitude.is_finite() && ret.onset_amplitude > 0.0) {
            ret.onset_amplitude = defaults.onset_amplitude;
        }
        let changed = ret != *self;
        (ret, changed)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// The processing context: the tuning table and the sample rate it is
/// played back at.
#[derive(Clone, Copy, Debug)]
pub struct Context {
    freqs: FrequencyTable,
    sample_rate: u32,
}

impl Context {
    /// Resolve the context for `config`
    pub fn new(config: &EngineConfig) -> Self {
        let freqs = FrequencyTable::build(config.base_freq);
        let sample_rate = match config.sample_rate {
            Some(rate) if rate > 0 => rate,
            _ => round_u32_nonzero(freqs.highest() * WAVETABLE_LEN as f64),
        };
        Self { freqs, sample_rate }
    }
    /// The tuning table
    pub fn freqs(&self) -> &FrequencyTable {
        &self.freqs
    }
    /// The sample rate, in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
    /// The auto-reload value for a hardware timer clocked at `clock_hz`
    /// through a `prescaler` (dividing by `prescaler + 1`) so that it
    /// overflows once per sample.  Never less than 1.
    pub fn timer_period(&self, clock_hz: u32, prescaler: u32) -> u32 {
        let divided = u64::from(clock_hz) / (u64::from(prescaler) + 1);
        (divided / u64::from(self.sample_rate)).max(1) as u32
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Float;

    #[test]
    fn derived_sample_rate_covers_highest_key() {
        let ctx = Context::default();
        let expected = ctx.freqs().highest() * WAVETABLE_LEN as f64;
        assert!(Float::abs(f64::from(ctx.sample_rate()) - expected) <= 0.5);
    }
    #[test]
    fn explicit_sample_rate_wins() {
        let config = EngineConfig {
            sample_rate: Some(14080),
            ..EngineConfig::new()
        };
        assert_eq!(Context::new(&config).sample_rate(), 14080);
    }
    #[test]
    fn timer_period_from_clock() {
        let config = EngineConfig {
            sample_rate: Some(48000),
            ..EngineConfig::new()
        };
        let ctx = Context::new(&config);
        assert_eq!(ctx.timer_period(120_000_000, 1), 1250);
        assert_eq!(ctx.timer_period(1000, 0), 1);
    }
    #[test]
    fn sanitize_reports_changes() {
        let (config, changed) = EngineConfig::new().sanitized();
        assert!(!changed);
        assert_eq!(config, EngineConfig::new());
        let bad = EngineConfig {
            base_freq: -1.0,
            sample_rate: Some(0),
            decay_interval: 0,
            onset_amplitude: f32::NAN,
            ..EngineConfig::new()
        };
        let (config, changed) = bad.sanitized();
        assert!(changed);
        assert_eq!(config.base_freq, FrequencyTable::DEFAULT_BASE);
        assert_eq!(config.sample_rate, None);
        assert_eq!(config.decay_interval, 1);
        assert_eq!(config.onset_amplitude, EngineConfig::DEFAULT_ONSET_AMPLITUDE);
    }
}
