//! Amplitude decay: the per-step coefficients and the tick-driven scheduler
//! that decides when a decay step runs.

use num_traits::Float;

/// The decay applied to every voice on each decay step
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecayCurve {
    /// Multiplier for voices whose key is held (or while sustain is down)
    pub slow: f32,
    /// Multiplier for voices whose key has been released
    pub fast: f32,
    /// Voices at or below this amplitude are evicted
    pub threshold: f32,
}

impl DecayCurve {
    /// Held notes fade over a few seconds at the default sample rate
    pub const DEFAULT_SLOW: f32 = 0.999;
    /// Released notes are gone in a few tens of milliseconds
    pub const DEFAULT_FAST: f32 = 0.9;
    /// Eviction threshold
    pub const DEFAULT_THRESHOLD: f32 = 0.0001;

    /// The default curve
    pub const fn new() -> Self {
        Self {
            slow: Self::DEFAULT_SLOW,
            fast: Self::DEFAULT_FAST,
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }
    /// A copy of this curve with every field forced into a usable range:
    /// coefficients in `(0, 1]`, threshold non-negative.  Unusable values
    /// are replaced by the defaults.
    pub fn sanitized(&self) -> Self {
        fn coefficient(c: f32, default: f32) -> f32 {
            if c > 0.0 && c <= 1.0 {
                c
            } else {
                default
            }
        }
        Self {
            slow: coefficient(self.slow, Self::DEFAULT_SLOW),
            fast: coefficient(self.fast, Self::DEFAULT_FAST),
            threshold: if self.threshold >= 0.0 && self.threshold.is_finite() {
                self.threshold
            } else {
                Self::DEFAULT_THRESHOLD
            },
        }
    }
}

impl Default for DecayCurve {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts sample ticks and fires a decay step every `interval` ticks.
///
/// Envelope timing is therefore locked to the sample clock rather than to an
/// independent timer.
#[derive(Clone, Copy, Debug)]
pub struct DecayScheduler {
    interval: u32,
    counter: u32,
}

impl DecayScheduler {
    /// Default number of sample ticks between decay steps
    pub const DEFAULT_INTERVAL: u32 = 100;

    /// Create a scheduler firing every `interval` ticks (at least 1)
    pub const fn new(interval: u32) -> Self {
        Self {
            interval: if interval == 0 { 1 } else { interval },
            counter: 0,
        }
    }
    /// Ticks between decay steps
    pub const fn interval(&self) -> u32 {
        self.interval
    }
    /// Ticks counted since the last decay step
    pub const fn counter(&self) -> u32 {
        self.counter
    }
    /// Count one sample tick.  Returns true (and resets the count) when a
    /// decay step is due.
    pub fn tick(&mut self) -> bool {
        self.counter += 1;
        if self.counter >= self.interval {
            self.counter = 0;
            true
        } else {
            false
        }
    }
}

impl Default for DecayScheduler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}

/// The number of decay steps by which a voice starting at `amplitude` and
/// multiplied by `coefficient` each step falls to `threshold`:
/// `ceil(log(threshold / amplitude) / log(coefficient))`.
///
/// Returns `Some(0)` if the voice is already at or below the threshold, and
/// `None` if it never gets there (a coefficient of 1 or more).
pub fn ticks_to_silence(amplitude: f32, coefficient: f32, threshold: f32) -> Option<u32> {
    if amplitude <= threshold {
        return Some(0);
    }
    if !(coefficient > 0.0 && coefficient < 1.0) || !(threshold > 0.0) {
        return None;
    }
    let steps = Float::ln(f64::from(threshold) / f64::from(amplitude))
        / Float::ln(f64::from(coefficient));
    Some(Float::ceil(steps) as u32)
}
