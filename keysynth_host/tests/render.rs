use std::io::Write;

use keysynth::{Engine, Instrument, DAC_MAX, DAC_MID};
use keysynth_host::config::HostConfig;
use keysynth_host::dac::WriterDac;
use keysynth_host::display::LogDisplay;
use keysynth_host::midi::MidiTranslator;
use keysynth_host::player::{new_pair, render};
use keysynth_host::script::{Script, ScriptError};

const CONFIG: &str = r#"
queue_depth = 4

[engine]
sample_rate = 14080
instrument = "Flute"
"#;

const SCRIPT: &str = "\
# two notes, a program change, then release
100 90 21 7f
100 90 2d 40
150 c0 01
200 80 21 00
200 90 2d 00
";

fn write_file(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
    path
}

fn codes(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

#[test]
fn renders_a_script_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = HostConfig::load(&write_file(&dir, "keysynth.toml", CONFIG)).unwrap();
    let script = Script::load(&write_file(&dir, "song.txt", SCRIPT)).unwrap();
    assert_eq!(config.queue_depth, 4);
    assert_eq!(script.events().len(), 5);

    let engine = Engine::new(config.engine);
    assert_eq!(engine.sample_rate(), 14080);
    assert_eq!(engine.instrument(), Instrument::Flute);
    let translator = MidiTranslator::new(&config.midi, engine.config().base_pitch_class);
    let mut display = LogDisplay::new();
    let (ctl, mut player) = new_pair(engine, WriterDac::new(Vec::new()), config.queue_depth);
    render(&script, &translator, &mut display, &ctl, &mut player, 10_000).unwrap();

    assert_eq!(display.onsets(), 2);
    assert_eq!(player.engine().ticks(), 10_200);
    assert_eq!(player.engine().instrument(), Instrument::Piano);
    // Released notes have died away and been evicted
    assert!(player.engine().pool().is_empty());

    let out = codes(&player.into_dac().finish().unwrap());
    assert_eq!(out.len(), 10_200);
    assert!(out[..100].iter().all(|&code| code == DAC_MID));
    assert!(out[100..200].iter().any(|&code| code != DAC_MID));
    assert!(out.iter().all(|&code| code <= DAC_MAX));
    assert_eq!(out.last(), Some(&DAC_MID));
}

#[test]
fn held_notes_keep_sounding() {
    let script = Script::parse("0 90 30 7f\n").unwrap();
    let engine = Engine::default();
    let translator = MidiTranslator::new(&Default::default(), engine.config().base_pitch_class);
    let (ctl, mut player) = new_pair(engine, WriterDac::new(Vec::new()), 32);
    render(&script, &translator, &mut (), &ctl, &mut player, 5_000).unwrap();
    let voice = player.engine().pool().get(0x30 - 33).unwrap();
    assert!(!voice.fast_decay());
    assert!(voice.amplitude() > 0.9);
}

#[test]
fn pedal_holds_released_notes() {
    let script = Script::parse("0 b0 40 7f\n0 90 21 7f\n10 80 21 00\n").unwrap();
    let engine = Engine::default();
    let translator = MidiTranslator::new(&Default::default(), engine.config().base_pitch_class);
    let (ctl, mut player) = new_pair(engine, WriterDac::new(Vec::new()), 32);
    render(&script, &translator, &mut (), &ctl, &mut player, 9_000).unwrap();
    assert!(player.engine().pool().sustain());
    let voice = player.engine().pool().get(0).unwrap();
    assert!(voice.fast_decay());
    // 90 slow decay steps
    assert!(voice.amplitude() > 0.9);
}

#[test]
fn script_errors_name_the_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "bad.txt", "0 90 21 7f\n\n12 90 zz 7f\n");
    match Script::load(&path) {
        Err(ScriptError::Parse { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected a parse error, got {:?}", other),
    }
    assert!(matches!(
        Script::load(&dir.path().join("missing.txt")),
        Err(ScriptError::Io(_))
    ));
}
