use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;

use keysynth::Engine;
use keysynth_host::config::HostConfig;
use keysynth_host::dac::{MeteredDac, WriterDac};
use keysynth_host::display::LogDisplay;
use keysynth_host::midi::MidiTranslator;
use keysynth_host::player::{self, Controller, Player};
use keysynth_host::script::Script;

/// Play a MIDI performance script through the keysynth voice engine
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Performance script (`<sample offset> <hex MIDI bytes>` per line)
    script: PathBuf,
    /// Write the DAC codes here, as little-endian 16 bit words
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Pace the engine against the wall clock instead of rendering as fast
    /// as possible
    #[arg(long)]
    realtime: bool,
    /// Ticks to keep running after the last event (default: one second)
    #[arg(long)]
    tail: Option<u64>,
}

type Sink = MeteredDac<WriterDac<Box<dyn Write + Send>>>;

fn open_sink(output: Option<&PathBuf>) -> std::io::Result<Sink> {
    let writer: Box<dyn Write + Send> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::sink()),
    };
    Ok(MeteredDac::new(WriterDac::new(writer)))
}

fn play_realtime(
    script: &Script,
    translator: &MidiTranslator,
    display: &mut LogDisplay,
    controller: &Controller,
    player: Player<Sink>,
    tail: u64,
) -> Result<Player<Sink>, Box<dyn Error>> {
    let rate = f64::from(player.engine().sample_rate());
    let stop = Arc::new(AtomicBool::new(false));
    let start = Instant::now();
    let handle = player.spawn(stop.clone())?;
    let at = |ticks: u64| start + Duration::from_secs_f64(ticks as f64 / rate);
    for event in script.events() {
        let due = at(event.offset);
        let now = Instant::now();
        if due > now {
            std::thread::sleep(due - now);
        }
        let Some(msg) = event.message() else {
            continue;
        };
        if let Some(command) = translator.translate(&msg, display) {
            controller.send(command)?;
        }
    }
    let end = at(script.duration() + tail);
    let now = Instant::now();
    if end > now {
        std::thread::sleep(end - now);
    }
    stop.store(true, Ordering::Relaxed);
    handle
        .join()
        .map_err(|_| Box::<dyn Error>::from("Timer thread panicked"))
}

fn main() -> Result<(), Box<dyn Error>> {
    colog::init();
    let args = Args::parse();
    log::info!("{} v{}", keysynth_host::NAME, keysynth_host::VERSION);

    let config = match &args.config {
        Some(path) => HostConfig::load(path).inspect_err(|e| log::error!("{}", e))?,
        None => HostConfig::default(),
    };
    let script = Script::load(&args.script).inspect_err(|e| log::error!("{}", e))?;

    let engine = Engine::new(config.engine);
    let rate = engine.sample_rate();
    log::info!(
        "Sample rate {} Hz, instrument {}",
        rate,
        engine.instrument()
    );
    let tail = args.tail.unwrap_or(u64::from(rate));
    let translator = MidiTranslator::new(&config.midi, engine.config().base_pitch_class);
    let mut display = LogDisplay::new();

    let sink = open_sink(args.output.as_ref())?;
    let (controller, mut player) = player::new_pair(engine, sink, config.queue_depth.max(1));

    if args.realtime {
        player = play_realtime(&script, &translator, &mut display, &controller, player, tail)?;
    } else {
        player::render(&script, &translator, &mut display, &controller, &mut player, tail)?;
    }

    log::info!(
        "Played {} ticks, {} notes struck, {} commands rejected",
        player.engine().ticks(),
        display.onsets(),
        player.rejected()
    );
    let meter = player.into_dac();
    if let Some((min, max)) = meter.range() {
        log::info!(
            "DAC codes {}..={}, {} of {} away from mid-scale",
            min,
            max,
            meter.active(),
            meter.count()
        );
    }
    meter.into_inner().finish().inspect_err(|e| log::error!("{}", e))?;
    if let Some(path) = &args.output {
        log::info!("Wrote {}", path.display());
    }
    Ok(())
}
