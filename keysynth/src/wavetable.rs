//! Single-cycle wavetables rendered from a [HarmonicProfile].

use crate::profile::HarmonicProfile;
use crate::util::round_i32;
use crate::{FULL_SCALE, WAVETABLE_LEN};
use core::f64::consts::TAU;
use num_traits::Float;

const _: () = assert!(WAVETABLE_LEN.is_power_of_two());

/// One full cycle of a waveform, as signed offsets about the DAC mid-scale.
///
/// Samples are normalized by the profile's weight sum, so no sample exceeds
/// [FULL_SCALE] in magnitude whatever the profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wavetable {
    samples: [i32; WAVETABLE_LEN],
}

impl Wavetable {
    /// A table of silence
    pub const fn silent() -> Self {
        Self {
            samples: [0; WAVETABLE_LEN],
        }
    }
    /// Render one cycle of `profile`.
    ///
    /// This is deterministic: building twice from the same profile yields a
    /// bit-identical table.  It is far too slow to run once per sample and
    /// must not be called from the tick context.
    pub fn build(profile: &HarmonicProfile) -> Self {
        let mut ret = Self::silent();
        let weight_sum = profile.weight_sum();
        if !(weight_sum > 0.0) {
            return ret;
        }
        let scale = f64::from(FULL_SCALE) / weight_sum;
        for (i, smp) in ret.samples.iter_mut().enumerate() {
            let acc: f64 = profile
                .partials()
                .map(|(mult, weight)| {
                    let phase = TAU * (i * mult as usize) as f64 / WAVETABLE_LEN as f64;
                    f64::from(weight) * Float::sin(phase)
                })
                .sum();
            *smp = round_i32(acc * scale).clamp(-FULL_SCALE, FULL_SCALE);
        }
        ret
    }
    /// The sample at `index`, wrapping every [WAVETABLE_LEN] samples
    pub fn get(&self, index: usize) -> i32 {
        self.samples[index & (WAVETABLE_LEN - 1)]
    }
    /// The whole cycle
    pub fn as_slice(&self) -> &[i32] {
        &self.samples
    }
}

impl Default for Wavetable {
    fn default() -> Self {
        Self::build(&HarmonicProfile::default())
    }
}

/// A pair of wavetables, one of which is active.
///
/// A new table is always written into the inactive slot and then published
/// by flipping the active index, so a reader never sees a half-written
/// table.
#[derive(Clone, Debug)]
pub struct WaveBank {
    tables: [Wavetable; 2],
    active: usize,
}

impl WaveBank {
    /// Create a bank whose active table is `initial`
    pub fn new(initial: Wavetable) -> Self {
        Self {
            tables: [initial, Wavetable::silent()],
            active: 0,
        }
    }
    /// The table the mixer should read
    pub fn active(&self) -> &Wavetable {
        &self.tables[self.active]
    }
    /// Write `table` into the inactive slot, then make it active
    pub fn install(&mut self, table: Wavetable) {
        let next = self.active ^ 1;
        self.tables[next] = table;
        self.active = next;
    }
    /// Render `profile` directly into the inactive slot, then make it active
    pub fn rebuild(&mut self, profile: &HarmonicProfile) {
        let next = self.active ^ 1;
        self.tables[next] = Wavetable::build(profile);
        self.active = next;
    }
}

impl Default for WaveBank {
    fn default() -> Self {
        Self::new(Wavetable::default())
    }
}
