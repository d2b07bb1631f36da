//! pitchback - headless MIDI replay driver.
//!
//! Loads a Standard MIDI File, runs it through the playback simulator in
//! real time on a fixed tick, and prints every play/release command as it is
//! dispatched. Useful for checking what a file will do to the trainer before
//! wiring it to a synthesizer.
//!
//! # Usage
//!
//! ```bash
//! pitchback song.mid              # replay at the default 50 ticks/second
//! pitchback song.mid --rate 100   # finer tick granularity
//! pitchback song.mid --quiet      # progress only, no per-note output
//! ```

use anyhow::{Context, Result};
use pitchback::midi::{import_from_midi, note_to_name};
use pitchback::session::{NoteSink, PlaybackSession};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Command-line options for the driver.
struct CliOptions {
    /// MIDI file to replay.
    midi_file: PathBuf,
    /// Simulator ticks per second.
    rate: u32,
    /// Suppress per-note output.
    quiet: bool,
}

impl CliOptions {
    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - `<file.mid>`: the file to replay (required)
    /// - `--rate <n>` or `-r <n>`: ticks per second (default 50)
    /// - `--quiet` or `-q`: suppress per-note output
    /// - `--help` or `-h`: print help and exit
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut midi_file: Option<PathBuf> = None;
        let mut rate: u32 = 50;
        let mut quiet = false;
        let mut i = 1;

        while i < args.len() {
            match args[i].as_str() {
                "--rate" | "-r" => {
                    i += 1;
                    if i >= args.len() {
                        eprintln!("Error: --rate requires a number");
                        std::process::exit(1);
                    }
                    rate = args[i].parse().context("invalid --rate value")?;
                    if rate == 0 {
                        eprintln!("Error: --rate must be at least 1");
                        std::process::exit(1);
                    }
                }
                "--quiet" | "-q" => quiet = true,
                "--help" | "-h" => {
                    eprintln!("pitchback - headless MIDI replay driver");
                    eprintln!();
                    eprintln!(
                        "Usage: {} <file.mid> [OPTIONS]",
                        args.first().map(String::as_str).unwrap_or("pitchback")
                    );
                    eprintln!();
                    eprintln!("Options:");
                    eprintln!("  -r, --rate N   Simulator ticks per second (default 50)");
                    eprintln!("  -q, --quiet    Suppress per-note output");
                    eprintln!("  -h, --help     Print this help message");
                    std::process::exit(0);
                }
                other => {
                    if midi_file.is_some() {
                        eprintln!("Unknown option: {}", other);
                        eprintln!("Use --help for usage information");
                        std::process::exit(1);
                    }
                    midi_file = Some(PathBuf::from(other));
                }
            }
            i += 1;
        }

        let Some(midi_file) = midi_file else {
            eprintln!("Error: no MIDI file given");
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        };

        Ok(Self {
            midi_file,
            rate,
            quiet,
        })
    }
}

/// Sink that prints dispatched commands with their playback timestamp.
struct ConsoleSink {
    started: Instant,
    quiet: bool,
}

impl NoteSink for ConsoleSink {
    fn note_on(&mut self, pitch: u8, velocity: u8) {
        if !self.quiet {
            println!(
                "{:8.3}  play    {:<4} vel {}",
                self.started.elapsed().as_secs_f64(),
                note_to_name(pitch),
                velocity
            );
        }
    }

    fn note_off(&mut self, pitch: u8) {
        if !self.quiet {
            println!(
                "{:8.3}  release {}",
                self.started.elapsed().as_secs_f64(),
                note_to_name(pitch)
            );
        }
    }
}

/// Main entry point.
fn main() -> Result<()> {
    let cli = CliOptions::parse()?;

    // Initialize logging (optional, for debugging)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let performance = import_from_midi(&cli.midi_file)
        .with_context(|| format!("failed to load {}", cli.midi_file.display()))?;

    let total = performance.note_count();
    if total == 0 {
        println!("{}: no playable notes", cli.midi_file.display());
        return Ok(());
    }
    println!(
        "{}: {} notes, {} pedal events",
        cli.midi_file.display(),
        total,
        performance.pedals.len()
    );

    let started = Instant::now();
    let mut sink = ConsoleSink {
        started,
        quiet: cli.quiet,
    };
    let mut session = PlaybackSession::new(performance, 0.0);
    let tick = Duration::from_secs(1) / cli.rate;
    let mut last_reported = 0;

    while !session.is_finished() {
        session.tick(started.elapsed().as_secs_f64(), &mut sink);

        let played = session.simulator().notes_played();
        if cli.quiet && played != last_reported {
            println!("{}/{} notes", played, total);
            last_reported = played;
        }

        std::thread::sleep(tick);
    }

    println!(
        "done: {} notes in {:.1}s",
        total,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
