// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use loopseq::config::SongFile;
use loopseq::midi::{self, print_destinations, MemoryOutput, MidiOutput, MidirOutput};
use loopseq::Scheduler;
use tracing::Level;

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

fn print_usage() {
    println!("loopseq - Tick-accurate MIDI loop sequencer");
    println!();
    println!("Usage: loopseq [-v] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  --list-midi                        List available MIDI destinations");
    println!("  --test-note <N>                    Send a test note to MIDI destination N");
    println!("  --play <SONG> <N> [--seconds S]    Play a song file on destination N");
    println!("  --dry-run <SONG> [--bars B]        Play a song into memory and print the messages");
    println!("  --help                             Show this help message");
    println!();
    println!("Options:");
    println!("  -v                                 Debug logging");
}

fn send_test_note(destination: usize) -> Result<()> {
    println!("Connecting to MIDI destination {}...", destination);
    let mut output = MidirOutput::new(destination)?;

    let channel = 0; // MIDI channel 1
    let note = 60; // Middle C
    let velocity = 100;

    println!("Sending test note (Middle C, velocity {})...", velocity);
    output.send(&midi::note_on(channel, note, velocity))?;
    thread::sleep(Duration::from_millis(500));
    output.send(&midi::note_off(channel, note))?;

    println!("Test complete!");
    Ok(())
}

/// Register a song's sequences and play it, returning after it finishes
fn play_song(
    song: &SongFile,
    output: impl MidiOutput + 'static,
    bars: Option<u32>,
    seconds: Option<f64>,
) -> Result<()> {
    let mut scheduler = Scheduler::new(output, song.scheduler_config()?)?;
    for (id, sequence) in song.build_sequences()? {
        scheduler.set_sequence(sequence, id);
    }

    println!("Playing '{}' at {} BPM", song.song.name, song.song.bpm);
    println!("{}", scheduler.handle().describe_sequences());

    scheduler.start(bars)?;

    match seconds {
        Some(seconds) => {
            let handle = scheduler.handle();
            handle.wait_until_finished(Duration::from_secs_f64(seconds));
        }
        None if bars.is_some() => {
            // Bounded run: wait for the loop to end on its own
            while !scheduler.is_finished() {
                thread::sleep(Duration::from_millis(50));
            }
        }
        None => {
            return Err(anyhow!(
                "Refusing to play forever: give --seconds or set song.bars"
            ))
        }
    }

    scheduler.stop(STOP_TIMEOUT)?;
    println!("Stopped at tick {}", scheduler.current_tick());
    Ok(())
}

fn play(path: &Path, destination: usize, seconds: Option<f64>) -> Result<()> {
    let song = SongFile::load(path)?;
    let output = MidirOutput::new(destination)?;
    println!("Connected to {}", output.port_name());
    play_song(&song, output, song.song.bars, seconds)
}

fn dry_run(path: &Path, bars: Option<u32>) -> Result<()> {
    let song = SongFile::load(path)?;
    let output = MemoryOutput::new();
    let bars = bars.or(song.song.bars).or(Some(1));

    play_song(&song, output.clone(), bars, None)?;

    for message in output.messages() {
        println!("{:02X?}", message);
    }
    println!("{} messages", output.len());
    Ok(())
}

fn flag_value<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>> {
    match args.iter().position(|a| a == flag) {
        Some(i) => {
            let raw = args
                .get(i + 1)
                .ok_or_else(|| anyhow!("{} requires a value", flag))?;
            let value = raw
                .parse()
                .map_err(|_| anyhow!("Invalid value for {}: {}", flag, raw))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Accept a playback length that `Duration` can represent
fn play_seconds(seconds: f64) -> Result<f64> {
    if !seconds.is_finite() || seconds < 0.0 || seconds > u32::MAX as f64 {
        return Err(anyhow!("Invalid value for --seconds: {}", seconds));
    }
    Ok(seconds)
}

fn parse_destination(args: &[String], index: usize, command: &str) -> Result<usize> {
    let raw = args
        .get(index)
        .ok_or_else(|| anyhow!("{} requires a destination number (see --list-midi)", command))?;
    raw.parse()
        .with_context(|| format!("Invalid destination number: {}", raw))
}

fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().collect();

    let verbose = args.iter().any(|a| a == "-v");
    args.retain(|a| a != "-v");
    tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .init();

    if args.len() < 2 {
        println!("loopseq - Tick-accurate MIDI loop sequencer");
        println!("Run with --help for usage information");
        return Ok(());
    }

    match args[1].as_str() {
        "--list-midi" => {
            print_destinations()?;
        }
        "--test-note" => {
            let destination = parse_destination(&args, 2, "--test-note")?;
            send_test_note(destination)?;
        }
        "--play" => {
            let path = args
                .get(2)
                .ok_or_else(|| anyhow!("--play requires a song file"))?;
            let destination = parse_destination(&args, 3, "--play")?;
            let seconds = flag_value::<f64>(&args, "--seconds")?
                .map(play_seconds)
                .transpose()?;
            play(Path::new(path), destination, seconds)?;
        }
        "--dry-run" => {
            let path = args
                .get(2)
                .ok_or_else(|| anyhow!("--dry-run requires a song file"))?;
            let bars = flag_value::<u32>(&args, "--bars")?;
            dry_run(Path::new(path), bars)?;
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
