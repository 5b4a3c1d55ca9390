//! A stand-in for the instrument's display: logs every note onset.

use keysynth::{NoteListener, PitchClass};

/// Logs note onsets at info level, and counts them
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDisplay {
    onsets: u64,
}

impl LogDisplay {
    /// A display that has shown nothing yet
    pub fn new() -> Self {
        Self::default()
    }
    /// How many onsets have been shown
    pub fn onsets(&self) -> u64 {
        self.onsets
    }
}

impl NoteListener for LogDisplay {
    fn note_onset(&mut self, note: u8, pitch_class: PitchClass) {
        self.onsets += 1;
        log::info!("Note {:2} ({})", note, pitch_class);
    }
}
