//! Timed note and pedal events for the playback simulator.
//!
//! These are the simulator's input contract: immutable, sorted ascending by
//! time, with the earliest note event at time 0. The import adapter produces
//! them in that shape; the simulator treats the shape as a precondition and
//! does not re-sort or validate.

use serde::{Deserialize, Serialize};

/// Minimum note duration in seconds.
///
/// Source data can contain zero-length or near-zero notes (a note-off on the
/// same tick as its note-on). Flooring the duration guarantees every admitted
/// note stays audible for at least one simulator tick.
pub const MIN_NOTE_DURATION: f64 = 0.1;

/// A single note with absolute timing.
///
/// Times are in seconds relative to the start of the performance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI note number (0-127). 60 = Middle C (C4).
    pub pitch: u8,

    /// Start time in seconds from the beginning of the performance.
    pub time: f64,

    /// Duration in seconds. Never below [`MIN_NOTE_DURATION`].
    pub duration: f64,

    /// Note velocity (0-127).
    pub velocity: u8,
}

impl NoteEvent {
    /// Creates a note event, clamping pitch/velocity to the MIDI range and
    /// flooring the duration to [`MIN_NOTE_DURATION`].
    pub fn new(pitch: u8, time: f64, duration: f64, velocity: u8) -> Self {
        Self {
            pitch: pitch.min(127),
            time,
            duration: duration.max(MIN_NOTE_DURATION),
            velocity: velocity.min(127),
        }
    }

    /// Returns the time at which this note's nominal duration expires.
    pub fn end_time(&self) -> f64 {
        self.time + self.duration
    }
}

/// A sustain pedal transition.
///
/// The value is binarized at import time: 1 = pedal down, 0 = pedal up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PedalEvent {
    /// Time in seconds, on the same zero-point as the note events. Pedal
    /// events that preceded the first note keep their (negative) offset.
    pub time: f64,

    /// Binarized pedal state: 0 = off, 1 = on.
    pub value: u8,
}

impl PedalEvent {
    /// Builds a pedal event from a raw controller value (0-127), binarized
    /// at the half-scale threshold: 64 and above means pedal down.
    pub fn from_controller(time: f64, value: u8) -> Self {
        Self {
            time,
            value: if value >= 64 { 1 } else { 0 },
        }
    }

    /// Whether this event engages the pedal.
    pub fn is_down(&self) -> bool {
        self.value > 0
    }
}

/// A complete parsed performance: the playback simulator's input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    /// Note events, sorted ascending by time, first at time 0.
    pub notes: Vec<NoteEvent>,

    /// Sustain pedal events, sorted ascending by time.
    pub pedals: Vec<PedalEvent>,
}

impl Performance {
    /// Number of note events.
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// True when the performance contains no notes. Pedal-only data still
    /// counts as empty; there is nothing to play.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
