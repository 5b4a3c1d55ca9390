//! Turns raw touch-sensor status words into note onsets and releases.
//!
//! The keyboard is made of [NUM_SENSORS] capacitive sensors with
//! [ELECTRODES_PER_SENSOR] electrodes each; electrode `e` of sensor `s` is
//! note `s * ELECTRODES_PER_SENSOR + e`.  Talking to the sensors is somebody
//! else's job - this module only sees the 16 bit touch status they report.

use crate::engine::Engine;
use crate::tuning::PitchClass;
use crate::NUM_NOTES;

/// Number of touch sensors on the keyboard
pub const NUM_SENSORS: usize = 4;
/// Number of electrodes (keys) per sensor
pub const ELECTRODES_PER_SENSOR: usize = 12;
/// The status a sensor reports when it could not be read
pub const READ_FAILURE: u16 = 0xFFFF;

const ELECTRODE_MASK: u16 = (1 << ELECTRODES_PER_SENSOR) - 1;

const _: () = assert!(NUM_SENSORS * ELECTRODES_PER_SENSOR == NUM_NOTES);

/// Receives a notification for every note that starts sounding, e.g. to
/// draw it on the display.
pub trait NoteListener {
    /// `note`, with pitch class `pitch_class`, has just been struck
    fn note_onset(&mut self, note: u8, pitch_class: PitchClass);
}

impl NoteListener for () {
    fn note_onset(&mut self, _note: u8, _pitch_class: PitchClass) {}
}

/// Remembers which keys are touched and reports the changes to an [Engine]
#[derive(Clone, Debug, Default)]
pub struct KeyScanner {
    touched: [u16; NUM_SENSORS],
}

impl KeyScanner {
    /// A scanner with no keys touched
    pub const fn new() -> Self {
        Self {
            touched: [0; NUM_SENSORS],
        }
    }
    /// Is `note` currently touched?
    pub fn is_touched(&self, note: u8) -> bool {
        let note = note as usize;
        match self.touched.get(note / ELECTRODES_PER_SENSOR) {
            Some(bits) => bits & (1 << (note % ELECTRODES_PER_SENSOR)) != 0,
            None => false,
        }
    }
    /// Process the touch `status` read from `sensor`.
    ///
    /// Newly touched keys start a note at the configured onset amplitude
    /// (slow decay) and are reported to `listener`; newly released keys
    /// switch to the fast decay.  A failed read ([READ_FAILURE]) or an
    /// unknown sensor is ignored.  Returns the number of keys that changed.
    pub fn scan<L: NoteListener + ?Sized>(
        &mut self,
        engine: &mut Engine,
        sensor: usize,
        status: u16,
        listener: &mut L,
    ) -> usize {
        if status == READ_FAILURE {
            return 0;
        }
        let Some(previous) = self.touched.get_mut(sensor) else {
            return 0;
        };
        let status = status & ELECTRODE_MASK;
        let changed = *previous ^ status;
        *previous = status;
        let amplitude = engine.config().onset_amplitude;
        for electrode in 0..ELECTRODES_PER_SENSOR {
            let bit = 1u16 << electrode;
            if changed & bit == 0 {
                continue;
            }
            let note = (sensor * ELECTRODES_PER_SENSOR + electrode) as u8;
            if status & bit != 0 {
                if engine.onset(note, amplitude) {
                    if let Some(pitch_class) = engine.pitch_class(note) {
                        listener.note_onset(note, pitch_class);
                    }
                }
            } else {
                engine.damp(note, true);
            }
        }
        changed.count_ones() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EngineConfig;
    use arrayvec::ArrayVec;

    #[derive(Default)]
    struct Recorder {
        notes: ArrayVec<(u8, PitchClass), 16>,
    }

    impl NoteListener for Recorder {
        fn note_onset(&mut self, note: u8, pitch_class: PitchClass) {
            self.notes.push((note, pitch_class));
        }
    }

    #[test]
    fn touches_start_notes() {
        let mut engine = Engine::default();
        let mut keys = KeyScanner::new();
        let mut rec = Recorder::default();
        assert_eq!(keys.scan(&mut engine, 1, 0b1000_0000_0101, &mut rec), 3);
        assert_eq!(engine.pool().len(), 3);
        assert!(keys.is_touched(12));
        assert!(keys.is_touched(14));
        assert!(keys.is_touched(23));
        assert!(!keys.is_touched(13));
        assert_eq!(
            rec.notes.as_slice(),
            &[(12, PitchClass::A), (14, PitchClass::B), (23, PitchClass::Ab)]
        );
        let voice = engine.pool().get(12).unwrap();
        assert_eq!(
            voice.amplitude(),
            f64::from(EngineConfig::DEFAULT_ONSET_AMPLITUDE)
        );
        assert!(!voice.fast_decay());
    }
    #[test]
    fn releases_switch_to_fast_decay() {
        let mut engine = Engine::default();
        let mut keys = KeyScanner::new();
        keys.scan(&mut engine, 0, 0b11, &mut ());
        assert_eq!(keys.scan(&mut engine, 0, 0b10, &mut ()), 1);
        assert!(engine.pool().get(0).unwrap().fast_decay());
        assert!(!engine.pool().get(1).unwrap().fast_decay());
        // Holding a key is not a new onset
        assert_eq!(keys.scan(&mut engine, 0, 0b10, &mut ()), 0);
    }
    #[test]
    fn failed_reads_and_bad_sensors_are_ignored() {
        let mut engine = Engine::default();
        let mut keys = KeyScanner::new();
        keys.scan(&mut engine, 2, 0b1, &mut ());
        assert_eq!(keys.scan(&mut engine, 2, READ_FAILURE, &mut ()), 0);
        assert!(keys.is_touched(24));
        assert!(!engine.pool().get(24).unwrap().fast_decay());
        assert_eq!(keys.scan(&mut engine, NUM_SENSORS, 0b1, &mut ()), 0);
        assert_eq!(engine.pool().len(), 1);
    }
    #[test]
    fn status_bits_above_the_electrodes_are_masked() {
        let mut engine = Engine::default();
        let mut keys = KeyScanner::new();
        assert_eq!(keys.scan(&mut engine, 3, 0xF001, &mut ()), 1);
        assert_eq!(engine.pool().len(), 1);
        assert!(keys.is_touched(36));
        assert!(!keys.is_touched(48));
    }
}
