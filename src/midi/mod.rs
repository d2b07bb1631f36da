//! MIDI pitch math and performance data.
//!
//! This module provides the pitch projections used throughout the trainer
//! (pitch class and octave band), display helpers for the 12 chromatic
//! notes, and the timed event types consumed by the playback simulator.

mod event;
mod import;

pub use event::{NoteEvent, PedalEvent, Performance, MIN_NOTE_DURATION};
pub use import::{import_from_midi, parse_performance, MidiImportError};

/// Standard MIDI note names for display purposes.
/// Maps pitch class (0-11) to note name within an octave.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Display colors for the 12 pitch classes, C through B.
///
/// Each stimulus is presented as a colored circle; the mapping runs warm to
/// cool around the chromatic circle so adjacent semitones stay visually
/// distinct.
pub const STIMULUS_COLORS: [(u8, u8, u8); 12] = [
    (255, 0, 0),    // C - red
    (255, 69, 0),   // C# - dark orange
    (255, 165, 0),  // D - orange
    (255, 215, 0),  // D# - gold
    (255, 255, 0),  // E - yellow
    (0, 255, 0),    // F - green
    (0, 128, 128),  // F# - teal
    (0, 0, 255),    // G - blue
    (0, 0, 139),    // G# - dark blue
    (75, 0, 130),   // A - indigo
    (148, 0, 211),  // A# - violet
    (255, 20, 147), // B - pink
];

/// Lowest playable pitch. Stimuli and imported notes are restricted to the
/// [PITCH_MIN, PITCH_MAX] window; anything outside is not playable on the
/// trainer's keyboard range.
pub const PITCH_MIN: u8 = 36;

/// Highest playable pitch (inclusive).
pub const PITCH_MAX: u8 = 84;

/// Velocity used when source data carries no usable velocity.
pub const DEFAULT_VELOCITY: u8 = 64;

/// Returns the pitch class (0-11) of a pitch: its chromatic identity
/// independent of octave.
#[inline]
pub fn pitch_class(pitch: u8) -> u8 {
    pitch % 12
}

/// Returns the octave band of a pitch: which octave it falls in.
#[inline]
pub fn octave_band(pitch: u8) -> u8 {
    pitch / 12
}

/// Returns the display color for a pitch's class.
#[inline]
pub fn stimulus_color(pitch: u8) -> (u8, u8, u8) {
    STIMULUS_COLORS[pitch_class(pitch) as usize]
}

/// Converts a MIDI note number to a human-readable note name with octave.
///
/// # Arguments
///
/// * `note` - MIDI note number (0-127)
///
/// # Returns
///
/// String representation like "C4" or "F#5"
///
/// # Examples
///
/// ```
/// use pitchback::midi::note_to_name;
///
/// let name = note_to_name(60); // Middle C
/// assert_eq!(name, "C4");
/// ```
pub fn note_to_name(note: u8) -> String {
    let octave = (note / 12) as i8 - 1; // MIDI octave convention
    let note_index = (note % 12) as usize;
    format!("{}{}", NOTE_NAMES[note_index], octave)
}
