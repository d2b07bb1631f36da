//! Standard MIDI File (SMF) import for the playback simulator.
//!
//! Converts .mid/.midi data into the simulator's [`Performance`] contract.
//! Supports SMF Format 0 (single track) and Format 1 (multi-track) files.
//!
//! # Limitations
//!
//! - Only note on/off and sustain (CC 64) events are imported
//! - Tempo changes are honored via a tempo map; all other meta events are
//!   ignored
//! - Notes outside the playable window [36, 84] are dropped
//! - Pitch bend, aftertouch, program changes etc. are ignored
//!
//! A parse that yields zero playable notes is not an error: the result is an
//! empty performance, which the simulator reports as immediately finished.
//! An unreadable or malformed file is an error.

use super::{NoteEvent, PedalEvent, Performance, DEFAULT_VELOCITY, PITCH_MAX, PITCH_MIN};
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// MIDI controller number for the sustain (damper) pedal.
const SUSTAIN_CONTROLLER: u8 = 64;

/// Tempo assumed before the first Set Tempo event (120 BPM).
const DEFAULT_USEC_PER_BEAT: u32 = 500_000;

/// Errors that can occur during MIDI import.
#[derive(Debug, Error)]
pub enum MidiImportError {
    /// File could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// MIDI parsing failed
    #[error("MIDI parse error: {0}")]
    Parse(String),

    /// Unsupported MIDI format or timing
    #[error("unsupported format: {0}")]
    Unsupported(String),
}

/// State for tracking sounding notes during import.
/// Key is (channel, pitch), value is (start_tick, velocity).
type OpenNotes = HashMap<(u8, u8), (u64, u8)>;

/// Absolute-tick tempo changes, used to convert ticks to seconds.
struct TempoMap {
    ticks_per_beat: u32,
    /// (absolute tick, microseconds per beat), sorted ascending by tick.
    changes: Vec<(u64, u32)>,
}

impl TempoMap {
    /// Collects Set Tempo events from every track. Format 1 files usually
    /// keep them on track 0, but scanning all tracks also covers Format 0.
    fn from_smf(smf: &Smf, ticks_per_beat: u32) -> Self {
        let mut changes = Vec::new();
        for track in &smf.tracks {
            let mut tick = 0u64;
            for event in track {
                tick += u64::from(event.delta.as_int());
                if let TrackEventKind::Meta(MetaMessage::Tempo(usec)) = event.kind {
                    changes.push((tick, usec.as_int()));
                }
            }
        }
        changes.sort_by_key(|&(tick, _)| tick);
        Self {
            ticks_per_beat,
            changes,
        }
    }

    /// Converts an absolute tick position to seconds, accumulating across
    /// tempo segments.
    fn seconds_at(&self, tick: u64) -> f64 {
        let per_tick = |usec_per_beat: u32| {
            usec_per_beat as f64 / (self.ticks_per_beat as f64 * 1_000_000.0)
        };

        let mut seconds = 0.0;
        let mut last_tick = 0u64;
        let mut usec_per_beat = DEFAULT_USEC_PER_BEAT;
        for &(change_tick, next_usec) in &self.changes {
            if change_tick >= tick {
                break;
            }
            seconds += (change_tick - last_tick) as f64 * per_tick(usec_per_beat);
            last_tick = change_tick;
            usec_per_beat = next_usec;
        }
        seconds + (tick - last_tick) as f64 * per_tick(usec_per_beat)
    }
}

/// Scales a normalized velocity (0.0-1.0) to the 0-127 MIDI range.
///
/// Values that round to zero fall back to [`DEFAULT_VELOCITY`]: a note that
/// made it into the file was meant to sound. This also means genuinely very
/// quiet notes come out at the default level.
fn scale_velocity(normalized: f32) -> u8 {
    let scaled = (normalized * 127.0).round() as u8;
    if scaled == 0 {
        DEFAULT_VELOCITY
    } else {
        scaled
    }
}

/// Imports a MIDI file into a [`Performance`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed; see
/// [`parse_performance`] for the format restrictions.
pub fn import_from_midi<P: AsRef<Path>>(path: P) -> Result<Performance, MidiImportError> {
    let path = path.as_ref();
    let data = fs::read(path)?;
    let performance = parse_performance(&data)?;
    tracing::info!(
        notes = performance.note_count(),
        pedal_events = performance.pedals.len(),
        "imported {}",
        path.display()
    );
    Ok(performance)
}

/// Parses raw SMF bytes into a [`Performance`].
///
/// Notes are paired from on/off events per (channel, pitch), filtered to the
/// playable pitch window, converted to seconds through the tempo map, and
/// re-zeroed so the earliest surviving note starts at time 0. Sustain pedal
/// events are binarized and shifted by the same offset (which can leave them
/// at negative times; the simulator consumes those on its first tick).
///
/// # Errors
///
/// Returns [`MidiImportError::Parse`] for malformed data and
/// [`MidiImportError::Unsupported`] for SMPTE timecode timing or Format 2
/// (sequential) files.
pub fn parse_performance(data: &[u8]) -> Result<Performance, MidiImportError> {
    let smf = Smf::parse(data).map_err(|e| MidiImportError::Parse(e.to_string()))?;

    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(tpb) => u32::from(tpb.as_int()),
        Timing::Timecode(_, _) => {
            return Err(MidiImportError::Unsupported(
                "SMPTE timecode timing not supported".to_string(),
            ))
        }
    };

    if smf.header.format == Format::Sequential {
        return Err(MidiImportError::Unsupported(
            "Format 2 (sequential) MIDI files not supported".to_string(),
        ));
    }

    let tempo_map = TempoMap::from_smf(&smf, ticks_per_beat);
    let mut notes: Vec<NoteEvent> = Vec::new();
    let mut pedals: Vec<PedalEvent> = Vec::new();

    for track in &smf.tracks {
        let mut open: OpenNotes = HashMap::new();
        let mut tick = 0u64;

        for event in track {
            tick += u64::from(event.delta.as_int());

            if let TrackEventKind::Midi { channel, message } = event.kind {
                let ch = channel.as_int();
                match message {
                    MidiMessage::NoteOn { key, vel } => {
                        let pitch = key.as_int();
                        let velocity = vel.as_int();
                        if velocity > 0 {
                            open.insert((ch, pitch), (tick, velocity));
                        } else if let Some((start, v)) = open.remove(&(ch, pitch)) {
                            // Note on with velocity 0 = note off
                            push_note(&mut notes, &tempo_map, pitch, start, tick, v);
                        }
                    }
                    MidiMessage::NoteOff { key, vel: _ } => {
                        let pitch = key.as_int();
                        if let Some((start, v)) = open.remove(&(ch, pitch)) {
                            push_note(&mut notes, &tempo_map, pitch, start, tick, v);
                        }
                    }
                    MidiMessage::Controller { controller, value } => {
                        if controller.as_int() == SUSTAIN_CONTROLLER {
                            pedals.push(PedalEvent::from_controller(
                                tempo_map.seconds_at(tick),
                                value.as_int(),
                            ));
                        }
                    }
                    _ => {} // Ignore other MIDI messages
                }
            }
        }

        // Close any notes left hanging at the end of the track.
        for ((_, pitch), (start, velocity)) in open {
            push_note(&mut notes, &tempo_map, pitch, start, tick, velocity);
        }
    }

    notes.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.pitch.cmp(&b.pitch)));
    pedals.sort_by(|a, b| a.time.total_cmp(&b.time));

    // Re-zero on the earliest surviving note so playback starts immediately.
    if let Some(t0) = notes.first().map(|n| n.time) {
        for note in &mut notes {
            note.time -= t0;
        }
        for pedal in &mut pedals {
            pedal.time -= t0;
        }
    }

    Ok(Performance { notes, pedals })
}

/// Converts one paired note to seconds and appends it if it falls inside the
/// playable pitch window.
fn push_note(
    notes: &mut Vec<NoteEvent>,
    tempo_map: &TempoMap,
    pitch: u8,
    start_tick: u64,
    end_tick: u64,
    velocity: u8,
) {
    if !(PITCH_MIN..=PITCH_MAX).contains(&pitch) {
        return;
    }
    let time = tempo_map.seconds_at(start_tick);
    let duration = tempo_map.seconds_at(end_tick) - time;
    let velocity = scale_velocity(f32::from(velocity) / 127.0);
    notes.push(NoteEvent::new(pitch, time, duration, velocity));
}
