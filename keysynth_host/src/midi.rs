//! Translates MIDI messages into engine [Command]s, standing in for the
//! touch keyboard when running on a host.

use keysynth::{Command, Instrument, NoteListener, PitchClass, NUM_NOTES};
use serde::{Deserialize, Serialize};
use wmidi::{ControlFunction, MidiMessage};

/// Which MIDI messages to listen to, and how keys map to notes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// MIDI channel, from 1 to 16
    pub channel: u8,
    /// The MIDI note number of the instrument's lowest key
    pub lowest_note: u8,
}

impl Default for MidiConfig {
    /// Channel 1, with A1 (MIDI note 33) on the lowest key
    fn default() -> Self {
        Self {
            channel: 1,
            lowest_note: u8::from(wmidi::Note::A1),
        }
    }
}

/// Converts MIDI messages on one channel into [Command]s.
///
/// - Note On starts a note with amplitude `velocity / 127`
/// - Note Off (or Note On with zero velocity) releases it to the fast decay
/// - The damper pedal (CC 64) drives sustain
/// - Program Change selects an instrument
pub struct MidiTranslator {
    channel: wmidi::Channel,
    lowest_note: u8,
    base_pitch_class: PitchClass,
}

impl MidiTranslator {
    /// Create a translator.  `base_pitch_class` is the pitch class of the
    /// instrument's lowest key, and is only used to notify listeners.  An
    /// invalid channel number falls back to channel 1.
    pub fn new(config: &MidiConfig, base_pitch_class: PitchClass) -> Self {
        let channel = config
            .channel
            .checked_sub(1)
            .and_then(|idx| wmidi::Channel::from_index(idx).ok())
            .unwrap_or_else(|| {
                log::warn!("Invalid MIDI channel {}, using channel 1", config.channel);
                wmidi::Channel::Ch1
            });
        Self {
            channel,
            lowest_note: config.lowest_note,
            base_pitch_class,
        }
    }
    /// The instrument key for a MIDI note, if the instrument has one
    pub fn key(&self, note: wmidi::Note) -> Option<u8> {
        let key = u8::from(note).checked_sub(self.lowest_note)?;
        ((key as usize) < NUM_NOTES).then_some(key)
    }
    /// Translate `msg`.  Returns `None` for messages on other channels,
    /// for notes outside the keyboard, and for anything the engine has no
    /// use for.  Onsets are reported to `listener`.
    pub fn translate<L: NoteListener + ?Sized>(
        &self,
        msg: &MidiMessage<'_>,
        listener: &mut L,
    ) -> Option<Command> {
        match msg {
            MidiMessage::NoteOn(ch, note, vel) if *ch == self.channel => {
                let key = self.key(*note)?;
                let vel = u8::from(*vel);
                if vel == 0 {
                    return Some(Command::Damp {
                        note: key,
                        fast: true,
                    });
                }
                listener.note_onset(key, PitchClass::of_note(self.base_pitch_class, key));
                Some(Command::Onset {
                    note: key,
                    amplitude: f32::from(vel) / 127f32,
                })
            }
            MidiMessage::NoteOff(ch, note, _) if *ch == self.channel => {
                Some(Command::Damp {
                    note: self.key(*note)?,
                    fast: true,
                })
            }
            MidiMessage::ControlChange(ch, ControlFunction::DAMPER_PEDAL, value)
                if *ch == self.channel =>
            {
                Some(Command::Sustain(u8::from(*value) >= 64))
            }
            MidiMessage::ProgramChange(ch, program) if *ch == self.channel => {
                match Instrument::try_from(u8::from(*program)) {
                    Ok(instrument) => Some(Command::SelectProfile(instrument)),
                    Err(e) => {
                        log::warn!("Ignoring program change to {}: {}", u8::from(*program), e);
                        None
                    }
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wmidi::{Channel, Note, U7};

    fn translator() -> MidiTranslator {
        MidiTranslator::new(&MidiConfig::default(), PitchClass::A)
    }

    struct Count(usize);
    impl NoteListener for Count {
        fn note_onset(&mut self, _note: u8, _pitch_class: PitchClass) {
            self.0 += 1;
        }
    }

    #[test]
    fn note_on_and_off() {
        let t = translator();
        let mut count = Count(0);
        let on = MidiMessage::NoteOn(Channel::Ch1, Note::C2, U7::from_u8_lossy(127));
        assert_eq!(
            t.translate(&on, &mut count),
            Some(Command::Onset {
                note: 3,
                amplitude: 1.0
            })
        );
        assert_eq!(count.0, 1);
        let off = MidiMessage::NoteOff(Channel::Ch1, Note::C2, U7::from_u8_lossy(0));
        assert_eq!(
            t.translate(&off, &mut count),
            Some(Command::Damp {
                note: 3,
                fast: true
            })
        );
        let silent_on = MidiMessage::NoteOn(Channel::Ch1, Note::C2, U7::from_u8_lossy(0));
        assert_eq!(
            t.translate(&silent_on, &mut count),
            Some(Command::Damp {
                note: 3,
                fast: true
            })
        );
        assert_eq!(count.0, 1);
    }
    #[test]
    fn keyboard_range() {
        let t = translator();
        assert_eq!(t.key(Note::A1), Some(0));
        assert_eq!(t.key(Note::Ab5), Some(47));
        assert_eq!(t.key(Note::A5), None);
        assert_eq!(t.key(Note::Ab1), None);
        let low = MidiMessage::NoteOn(Channel::Ch1, Note::C1, U7::from_u8_lossy(100));
        assert_eq!(t.translate(&low, &mut ()), None);
    }
    #[test]
    fn other_channels_are_ignored() {
        let t = translator();
        let on = MidiMessage::NoteOn(Channel::Ch2, Note::C2, U7::from_u8_lossy(100));
        assert_eq!(t.translate(&on, &mut ()), None);
    }
    #[test]
    fn pedal_and_program() {
        let t = translator();
        let down = MidiMessage::ControlChange(
            Channel::Ch1,
            ControlFunction::DAMPER_PEDAL,
            U7::from_u8_lossy(127),
        );
        let up = MidiMessage::ControlChange(
            Channel::Ch1,
            ControlFunction::DAMPER_PEDAL,
            U7::from_u8_lossy(0),
        );
        assert_eq!(t.translate(&down, &mut ()), Some(Command::Sustain(true)));
        assert_eq!(t.translate(&up, &mut ()), Some(Command::Sustain(false)));
        let piano = MidiMessage::ProgramChange(Channel::Ch1, U7::from_u8_lossy(1));
        assert_eq!(
            t.translate(&piano, &mut ()),
            Some(Command::SelectProfile(Instrument::Piano))
        );
        let bogus = MidiMessage::ProgramChange(Channel::Ch1, U7::from_u8_lossy(100));
        assert_eq!(t.translate(&bogus, &mut ()), None);
    }
    #[test]
    fn bad_channel_falls_back() {
        let t = MidiTranslator::new(
            &MidiConfig {
                channel: 0,
                lowest_note: 33,
            },
            PitchClass::A,
        );
        let on = MidiMessage::NoteOn(Channel::Ch1, Note::A1, U7::from_u8_lossy(100));
        assert!(t.translate(&on, &mut ()).is_some());
    }
}
