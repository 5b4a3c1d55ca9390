//! The voice engine: the single owner of the voice pool, the wavetables and
//! the decay scheduler, and the per-sample [Engine::tick] that mixes them.

use crate::context::{Context, EngineConfig};
use crate::decay::DecayScheduler;
use crate::pool::VoicePool;
use crate::profile::Instrument;
use crate::tuning::{note_in_pitch_class, PitchClass};
use crate::wavetable::{WaveBank, Wavetable};
use crate::NUM_NOTES;

/// The output stage: receives one 12 bit, mid-scale centred code per tick
pub trait Dac {
    /// Output `code` (between 0 and [DAC_MAX](crate::DAC_MAX))
    fn write(&mut self, code: u16);
}

impl<F: FnMut(u16)> Dac for F {
    fn write(&mut self, code: u16) {
        self(code)
    }
}

/// One mutation requested by the main loop.
///
/// Commands let the main loop hand its requests to whichever context owns
/// the engine; they take effect at the next [Engine::apply].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Start or re-articulate a note
    Onset {
        /// The key
        note: u8,
        /// Amplitude, from 0 to 1
        amplitude: f32,
    },
    /// Select the fast (released) or slow (held) decay for a note
    Damp {
        /// The key
        note: u8,
        /// True for the fast decay rate
        fast: bool,
    },
    /// Press or release the sustain pedal
    Sustain(bool),
    /// Switch instrument, rebuilding the wavetable
    SelectProfile(Instrument),
}

/// The real-time voice engine.
///
/// All state lives in this value; callers own it and pass it by reference
/// to every operation.  The main-loop operations ([Engine::onset],
/// [Engine::damp], [Engine::sustain], [Engine::select_profile]) and the
/// per-sample [Engine::tick] all take `&mut self`, so whichever context
/// holds the engine has exclusive access for the duration of each call.
#[derive(Clone, Debug)]
pub struct Engine {
    config: EngineConfig,
    context: Context,
    instrument: Instrument,
    bank: WaveBank,
    pool: VoicePool,
    scheduler: DecayScheduler,
    ticks: u64,
}

impl Engine {
    /// Create a silent engine.  Unusable configuration values are replaced
    /// by defaults (and a warning is logged).
    pub fn new(config: EngineConfig) -> Self {
        let (config, changed) = config.sanitized();
        if changed {
            log::warn!("Engine configuration contained unusable values, using defaults for them");
        }
        let context = Context::new(&config);
        let instrument = config.instrument;
        Self {
            bank: WaveBank::new(Wavetable::build(&instrument.profile())),
            pool: VoicePool::new(context.freqs(), context.sample_rate()),
            scheduler: DecayScheduler::new(config.decay_interval),
            config,
            context,
            instrument,
            ticks: 0,
        }
    }
    /// The (sanitized) configuration in use
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
    /// The processing context (tuning and sample rate)
    pub fn context(&self) -> &Context {
        &self.context
    }
    /// The rate at which [Engine::tick] must be called, in Hz
    pub fn sample_rate(&self) -> u32 {
        self.context.sample_rate()
    }
    /// The active instrument
    pub fn instrument(&self) -> Instrument {
        self.instrument
    }
    /// The active wavetable
    pub fn wavetable(&self) -> &Wavetable {
        self.bank.active()
    }
    /// The sounding voices
    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }
    /// The number of ticks run since the engine was created
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
    /// Start (or re-articulate) `note` at `amplitude`.  Returns true if the
    /// note is sounding afterwards; out-of-range notes and onsets arriving
    /// while the pool is full are dropped.
    pub fn onset(&mut self, note: u8, amplitude: f32) -> bool {
        let sounding = self.pool.onset(note, amplitude);
        if !sounding {
            log::debug!(
                "Dropped onset of note {} ({} of {} voices in use)",
                note,
                self.pool.len(),
                crate::VOICE_CAPACITY
            );
        }
        sounding
    }
    /// Select the fast (`fast == true`, key released) or slow decay for
    /// `note`.  Returns false if the note is not sounding.
    pub fn damp(&mut self, note: u8, fast: bool) -> bool {
        self.pool.set_decay_class(note, fast)
    }
    /// Press or release the sustain pedal
    pub fn sustain(&mut self, on: bool) {
        self.pool.set_sustain(on);
    }
    /// Switch to `instrument`, rebuilding the wavetable.
    ///
    /// The rebuild writes the inactive table and then flips to it, so the
    /// mixer only ever reads a complete table.  This is slow; call it from
    /// the main loop, never from the tick context.
    pub fn select_profile(&mut self, instrument: Instrument) {
        self.bank.rebuild(&instrument.profile());
        self.instrument = instrument;
        log::info!("Selected instrument {}", instrument);
    }
    /// Switch to the instrument with index `index`.  Returns false (leaving
    /// the instrument unchanged) if there is no such instrument.
    pub fn select_profile_index(&mut self, index: u8) -> bool {
        match Instrument::try_from(index) {
            Ok(instrument) => {
                self.select_profile(instrument);
                true
            }
            Err(e) => {
                log::warn!("Ignoring instrument index {}: {}", index, e);
                false
            }
        }
    }
    /// Switch to `instrument` using a `table` rendered elsewhere (usually
    /// with [Wavetable::build] on another thread).  Cheap: one table copy.
    pub fn install_wavetable(&mut self, instrument: Instrument, table: Wavetable) {
        self.bank.install(table);
        self.instrument = instrument;
    }
    /// Carry out `command`.  Returns false if it was rejected or had no
    /// effect (see the individual operations).
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Onset { note, amplitude } => self.onset(note, amplitude),
            Command::Damp { note, fast } => self.damp(note, fast),
            Command::Sustain(on) => {
                self.sustain(on);
                true
            }
            Command::SelectProfile(instrument) => {
                self.select_profile(instrument);
                true
            }
        }
    }
    /// Run one decay step over every voice, evicting the ones that have
    /// died away.  Normally driven by [Engine::tick].
    pub fn decay_tick(&mut self) {
        self.pool.decay_tick(&self.config.decay);
    }
    /// Advance every voice and mix one sample, without counting a tick
    pub fn mix_sample(&mut self) -> u16 {
        self.pool.mix_sample(self.bank.active())
    }
    /// Run one sample period and return the DAC code.
    ///
    /// The sample is mixed first and the decay step (if due) runs after it,
    /// so a voice evicted by this tick's decay step still contributes to
    /// this tick's sample.
    pub fn next_sample(&mut self) -> u16 {
        let code = self.mix_sample();
        self.ticks += 1;
        if self.scheduler.tick() {
            self.decay_tick();
        }
        code
    }
    /// Run one sample period and write the result to `dac`.  This is the
    /// timer interrupt's entire job: it is O(voices), never allocates and
    /// never blocks.
    pub fn tick<D: Dac + ?Sized>(&mut self, dac: &mut D) {
        let code = self.next_sample();
        dac.write(code);
    }
    /// The pitch class of `note`, or `None` if there is no such key
    pub fn pitch_class(&self, note: u8) -> Option<PitchClass> {
        if (note as usize) < NUM_NOTES {
            Some(PitchClass::of_note(self.config.base_pitch_class, note))
        } else {
            None
        }
    }
    /// True if `note` is a key with pitch class `class`
    pub fn is_note_in_pitch_class(&self, note: u8, class: PitchClass) -> bool {
        note_in_pitch_class(self.config.base_pitch_class, note, class)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
