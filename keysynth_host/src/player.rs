//! Runs the engine the way the timer interrupt does on the instrument.
//!
//! The [Player] owns the [Engine] exclusively.  Everybody else talks to it
//! through a [Controller], which queues [Request]s on a bounded channel that
//! the player drains before every tick.  Instrument changes are rendered on
//! the sending thread, so the player only ever copies a finished table in.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use keysynth::{Command, Dac, Engine, Instrument, NoteListener, Wavetable};

use crate::midi::MidiTranslator;
use crate::script::Script;

/// Something for the [Player] to do before its next tick
#[derive(Clone, Debug)]
pub enum Request {
    /// Apply a command (never [Command::SelectProfile], see [Request::from])
    Command(Command),
    /// Switch instrument using a table rendered by the sender
    Wavetable(Instrument, Box<Wavetable>),
}

impl From<Command> for Request {
    /// Wrap `command`.  Instrument selections are turned into
    /// [Request::Wavetable], rendering the table on the calling thread.
    fn from(command: Command) -> Self {
        match command {
            Command::SelectProfile(instrument) => Self::Wavetable(
                instrument,
                Box::new(Wavetable::build(&instrument.profile())),
            ),
            other => Self::Command(other),
        }
    }
}

/// The [Player] has gone away
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Disconnected;

impl std::fmt::Display for Disconnected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "The player thread has stopped")
    }
}

impl std::error::Error for Disconnected {}

/// The sending half: queues requests for a [Player]
#[derive(Clone)]
pub struct Controller {
    requests: mpsc::SyncSender<Request>,
}

impl Controller {
    /// Queue `command`, blocking while the queue is full
    pub fn send(&self, command: Command) -> Result<(), Disconnected> {
        self.requests.send(command.into()).map_err(|e| {
            log::error!("Failed to send {:?}: {}", command, e);
            Disconnected
        })
    }
    /// Queue `request` if there is room.  A full queue hands the request
    /// back so the caller can retry it.
    pub fn try_send(&self, request: Request) -> Result<(), mpsc::TrySendError<Request>> {
        self.requests.try_send(request)
    }
}

/// Owns an [Engine] and a [Dac] and ticks the one into the other
pub struct Player<D: Dac> {
    engine: Engine,
    requests: mpsc::Receiver<Request>,
    dac: D,
    rejected: u64,
}

/// Create a [Player] for `engine` writing to `dac`, and a [Controller]
/// feeding it through a queue of `depth` requests.
pub fn new_pair<D: Dac>(engine: Engine, dac: D, depth: usize) -> (Controller, Player<D>) {
    let (tx, rx) = mpsc::sync_channel(depth);
    let player = Player {
        engine,
        requests: rx,
        dac,
        rejected: 0,
    };
    (Controller { requests: tx }, player)
}

impl<D: Dac> Player<D> {
    /// The engine being played
    pub fn engine(&self) -> &Engine {
        &self.engine
    }
    /// The output sink
    pub fn dac(&self) -> &D {
        &self.dac
    }
    /// Number of commands the engine rejected (e.g. onsets with the pool
    /// full, or releases of notes that had already died away)
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
    /// Stop playing and take back the output sink
    pub fn into_dac(self) -> D {
        self.dac
    }
    /// Apply every queued request.  Returns the number applied.
    pub fn service(&mut self) -> usize {
        let mut count = 0;
        while let Ok(request) = self.requests.try_recv() {
            match request {
                Request::Command(command) => {
                    if !self.engine.apply(command) {
                        self.rejected += 1;
                    }
                }
                Request::Wavetable(instrument, table) => {
                    self.engine.install_wavetable(instrument, *table);
                }
            }
            count += 1;
        }
        count
    }
    /// Run `ticks` sample periods, servicing the queue before each
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.service();
            self.engine.tick(&mut self.dac);
        }
    }
    /// Run at the engine's sample rate until `stop` is set, pacing the
    /// ticks against the wall clock one millisecond block at a time.
    pub fn run_realtime(&mut self, stop: &AtomicBool) {
        let rate = self.engine.sample_rate();
        let block = u64::from((rate / 1000).max(1));
        let start = Instant::now();
        let mut done = 0u64;
        while !stop.load(Ordering::Relaxed) {
            self.run(block);
            done += block;
            let due = start + Duration::from_secs_f64(done as f64 / f64::from(rate));
            let now = Instant::now();
            if due > now {
                std::thread::sleep(due - now);
            }
        }
        log::info!("Timer thread stopped after {} ticks", self.engine.ticks());
    }
}

impl<D: Dac + Send + 'static> Player<D> {
    /// Move the player onto its own thread, running in real time until
    /// `stop` is set.  Joining the thread gives the player back.
    pub fn spawn(mut self, stop: Arc<AtomicBool>) -> std::io::Result<JoinHandle<Self>> {
        std::thread::Builder::new()
            .name("keysynth-timer".to_owned())
            .spawn(move || {
                self.run_realtime(&stop);
                self
            })
    }
}

/// Play `script` through `controller` into `player` as fast as possible,
/// then run `tail` more ticks so released notes can ring out.
///
/// Both halves stay on the calling thread: whenever the queue is full the
/// player is serviced to make room.
pub fn render<D: Dac, L: NoteListener + ?Sized>(
    script: &Script,
    translator: &MidiTranslator,
    listener: &mut L,
    controller: &Controller,
    player: &mut Player<D>,
    tail: u64,
) -> Result<(), Disconnected> {
    for event in script.events() {
        let now = player.engine().ticks();
        player.run(event.offset.saturating_sub(now));
        let Some(msg) = event.message() else {
            continue;
        };
        let Some(command) = translator.translate(&msg, listener) else {
            log::debug!("Ignoring {:?} at {}", msg, event.offset);
            continue;
        };
        let mut request = Request::from(command);
        loop {
            match controller.try_send(request) {
                Ok(()) => break,
                Err(mpsc::TrySendError::Full(back)) => {
                    player.service();
                    request = back;
                }
                Err(mpsc::TrySendError::Disconnected(_)) => return Err(Disconnected),
            }
        }
    }
    player.run(tail);
    player.service();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dac::NullDac;
    use keysynth::DAC_MID;

    #[test]
    fn requests_apply_before_the_next_tick() {
        let (ctl, mut player) = new_pair(Engine::default(), NullDac, 4);
        ctl.send(Command::Onset {
            note: 10,
            amplitude: 0.5,
        })
        .unwrap();
        assert!(player.engine().pool().is_empty());
        player.run(1);
        assert_eq!(player.engine().pool().len(), 1);
        assert_eq!(player.engine().ticks(), 1);
    }
    #[test]
    fn profile_requests_carry_a_table() {
        let request = Request::from(Command::SelectProfile(Instrument::Organ));
        let Request::Wavetable(instrument, table) = request else {
            panic!("expected a wavetable request");
        };
        assert_eq!(instrument, Instrument::Organ);
        assert_eq!(*table, Wavetable::build(&Instrument::Organ.profile()));
        let (ctl, mut player) = new_pair(Engine::default(), NullDac, 4);
        ctl.send(Command::SelectProfile(Instrument::Flute)).unwrap();
        assert_eq!(player.service(), 1);
        assert_eq!(player.engine().instrument(), Instrument::Flute);
    }
    #[test]
    fn rejected_commands_are_counted() {
        let (ctl, mut player) = new_pair(Engine::default(), NullDac, 4);
        ctl.send(Command::Damp {
            note: 3,
            fast: true,
        })
        .unwrap();
        player.service();
        assert_eq!(player.rejected(), 1);
    }
    #[test]
    fn full_queue_hands_back_the_request() {
        let (ctl, mut player) = new_pair(Engine::default(), NullDac, 1);
        assert!(ctl.try_send(Request::Command(Command::Sustain(true))).is_ok());
        assert!(matches!(
            ctl.try_send(Request::Command(Command::Sustain(false))),
            Err(mpsc::TrySendError::Full(Request::Command(Command::Sustain(false))))
        ));
        player.service();
        assert!(player.engine().pool().sustain());
    }
    #[test]
    fn send_fails_once_the_player_is_gone() {
        let (ctl, player) = new_pair(Engine::default(), NullDac, 1);
        drop(player);
        assert_eq!(ctl.send(Command::Sustain(true)), Err(Disconnected));
    }
    #[test]
    fn realtime_thread_stops_on_request() {
        let (ctl, player) = new_pair(Engine::default(), |_code: u16| {}, 8);
        let stop = Arc::new(AtomicBool::new(false));
        let handle = player.spawn(stop.clone()).unwrap();
        ctl.send(Command::Onset {
            note: 0,
            amplitude: 0.7,
        })
        .unwrap();
        std::thread::sleep(Duration::from_millis(50));
        stop.store(true, Ordering::Relaxed);
        let player = handle.join().unwrap();
        assert!(player.engine().ticks() > 0);
        assert_eq!(player.engine().pool().len(), 1);
    }
    #[test]
    fn render_plays_the_script() {
        let script = Script::parse("0 90 21 7f\n0 90 22 7f\n0 90 23 7f\n50 80 21 00\n").unwrap();
        let translator = MidiTranslator::new(&Default::default(), Default::default());
        let mut last = 0u16;
        // A queue of one forces the renderer to service the player mid-event
        let (ctl, mut player) = new_pair(Engine::default(), |code: u16| last = code, 1);
        render(&script, &translator, &mut (), &ctl, &mut player, 10).unwrap();
        assert_eq!(player.engine().ticks(), 60);
        assert_eq!(player.engine().pool().len(), 3);
        assert!(player.engine().pool().get(0).unwrap().fast_decay());
        assert!(!player.engine().pool().get(1).unwrap().fast_decay());
        drop(player);
        assert_ne!(last, DAC_MID);
    }
}
