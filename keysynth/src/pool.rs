//! The fixed-capacity pool of sounding voices.

use arrayvec::ArrayVec;

use crate::decay::DecayCurve;
use crate::tuning::FrequencyTable;
use crate::util::round_u32_nonzero;
use crate::wavetable::Wavetable;
use crate::{DAC_MAX, DAC_MID, NUM_NOTES, VOICE_CAPACITY, WAVETABLE_LEN};

/// The largest amplitude a voice may be given
pub const MAX_AMPLITUDE: f32 = 1.0;

const _: () = assert!(VOICE_CAPACITY >= NUM_NOTES);

/// The synthesis state of one sounding note.
///
/// All of a voice's state lives in this one record, so moving a voice
/// within the pool moves its note, phase, amplitude and decay class
/// together.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Voice {
    note: u8,
    phase: u32,
    cycles_per_wave: u32,
    // Decay compounds over thousands of steps, so it is tracked in f64
    amplitude: f64,
    fast_decay: bool,
}

impl Voice {
    fn new(note: u8, cycles_per_wave: u32, amplitude: f64) -> Self {
        Self {
            note,
            phase: 0,
            cycles_per_wave,
            amplitude,
            fast_decay: false,
        }
    }
    /// The note (key) this voice is sounding
    pub fn note(&self) -> u8 {
        self.note
    }
    /// Position within the current waveform cycle, in ticks
    pub fn phase(&self) -> u32 {
        self.phase
    }
    /// Length of one waveform cycle, in ticks
    pub fn cycles_per_wave(&self) -> u32 {
        self.cycles_per_wave
    }
    /// Current amplitude, between 0 and [MAX_AMPLITUDE]
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }
    /// True if this voice uses the fast (key released) decay rate
    pub fn fast_decay(&self) -> bool {
        self.fast_decay
    }
    /// Step forward one tick and return this voice's contribution to the mix
    fn advance(&mut self, table: &Wavetable) -> f32 {
        self.phase += 1;
        if self.phase >= self.cycles_per_wave {
            self.phase = 0;
        }
        let index = (u64::from(self.phase) * WAVETABLE_LEN as u64
            / u64::from(self.cycles_per_wave)) as usize;
        self.amplitude as f32 * table.get(index) as f32
    }
}

/// Sanitize a requested onset amplitude, or `None` if it is meaningless
fn clamp_amplitude(amplitude: f32) -> Option<f64> {
    if amplitude.is_finite() {
        Some(f64::from(amplitude.clamp(0.0, MAX_AMPLITUDE)))
    } else {
        None
    }
}

/// Every sounding [Voice], stored contiguously.
///
/// Invariants: at most [VOICE_CAPACITY] voices, and no two voices share a
/// note.  There is no voice stealing - when the pool is full, new notes are
/// dropped until an existing voice decays away.
#[derive(Clone, Debug)]
pub struct VoicePool {
    voices: ArrayVec<Voice, VOICE_CAPACITY>,
    cycles_per_wave: [u32; NUM_NOTES],
    sustain: bool,
}

impl VoicePool {
    /// Create an empty pool for notes tuned to `freqs`, ticking at
    /// `sample_rate` Hz
    pub fn new(freqs: &FrequencyTable, sample_rate: u32) -> Self {
        let mut cycles_per_wave = [1u32; NUM_NOTES];
        for (cycles, freq) in cycles_per_wave.iter_mut().zip(freqs.as_array()) {
            *cycles = round_u32_nonzero(f64::from(sample_rate) / *freq);
        }
        Self {
            voices: ArrayVec::new(),
            cycles_per_wave,
            sustain: false,
        }
    }
    /// Number of sounding voices
    pub fn len(&self) -> usize {
        self.voices.len()
    }
    /// True if nothing is sounding
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
    /// True if no more voices can be added
    pub fn is_full(&self) -> bool {
        self.voices.is_full()
    }
    /// Iterate over the sounding voices, in pool order
    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }
    /// The voice sounding `note`, if any
    pub fn get(&self, note: u8) -> Option<&Voice> {
        self.voices.iter().find(|v| v.note == note)
    }
    /// The waveform length, in ticks, that a voice for `note` would use
    pub fn cycles_per_wave(&self, note: u8) -> Option<u32> {
        self.cycles_per_wave.get(note as usize).copied()
    }
    /// Is the sustain pedal down?
    pub fn sustain(&self) -> bool {
        self.sustain
    }
    /// Press (true) or release (false) the sustain pedal.  While held, all
    /// voices decay at the slow rate whatever their decay class.
    pub fn set_sustain(&mut self, on: bool) {
        self.sustain = on;
    }
    /// Start (or re-articulate) `note` at `amplitude`.
    ///
    /// An already sounding note keeps its place and phase, but its amplitude
    /// is reset and it returns to the slow decay class.  A new note is
    /// dropped if the pool is full.  Returns true if the note is sounding
    /// after the call.
    pub fn onset(&mut self, note: u8, amplitude: f32) -> bool {
        let Some(cycles_per_wave) = self.cycles_per_wave(note) else {
            return false;
        };
        let Some(amplitude) = clamp_amplitude(amplitude) else {
            return false;
        };
        if let Some(voice) = self.voices.iter_mut().find(|v| v.note == note) {
            voice.amplitude = amplitude;
            voice.fast_decay = false;
            return true;
        }
        // The voice is fully written before the length is bumped
        self.voices
            .try_push(Voice::new(note, cycles_per_wave, amplitude))
            .is_ok()
    }
    /// Choose the fast (key released) or slow (key held) decay rate for
    /// `note`.  Returns false if `note` is not sounding.
    pub fn set_decay_class(&mut self, note: u8, fast: bool) -> bool {
        match self.voices.iter_mut().find(|v| v.note == note) {
            Some(voice) => {
                voice.fast_decay = fast;
                true
            }
            None => false,
        }
    }
    /// Attenuate every voice once, then evict every voice at or below the
    /// death threshold.
    ///
    /// Eviction walks from the back of the pool and swaps the last live
    /// voice into the freed slot, so the surviving voices keep all of their
    /// own state.
    pub fn decay_tick(&mut self, curve: &DecayCurve) {
        let (slow, fast) = (f64::from(curve.slow), f64::from(curve.fast));
        let threshold = f64::from(curve.threshold);
        for voice in self.voices.iter_mut() {
            voice.amplitude *= if voice.fast_decay && !self.sustain {
                fast
            } else {
                slow
            };
        }
        for i in (0..self.voices.len()).rev() {
            if self.voices[i].amplitude <= threshold {
                self.voices.swap_remove(i);
            }
        }
    }
    /// Advance every voice one tick and mix them into a single DAC code.
    ///
    /// The mix is the mean of the voices (so loudness is normalized by
    /// polyphony) about [DAC_MID], saturated to the DAC's range.  An empty
    /// pool yields [DAC_MID].
    pub fn mix_sample(&mut self, table: &Wavetable) -> u16 {
        if self.voices.is_empty() {
            return DAC_MID;
        }
        let mut acc = 0f32;
        for voice in self.voices.iter_mut() {
            acc += voice.advance(table);
        }
        let out = f32::from(DAC_MID) + acc / self.voices.len() as f32;
        out.clamp(0.0, f32::from(DAC_MAX)) as u16
    }
}
