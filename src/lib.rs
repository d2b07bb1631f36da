//! pitchback - engines for a musical working-memory trainer.
//!
//! This library provides the stimulus-generation and timing/scoring layer of
//! a pitch-training game: an n-back sequence engine, a Stroop stimulus
//! engine, a deterministic MIDI playback simulator with sustain-pedal
//! semantics, the session controllers that drive them on a fixed tick, and
//! the score history with adaptive difficulty.

pub mod engine;
pub mod midi;
pub mod scores;
pub mod session;

// Re-export commonly used types
pub use engine::{MidiSimulator, NBackEngine, StroopEngine};
pub use midi::{import_from_midi, NoteEvent, PedalEvent, Performance};
pub use scores::{GameKind, LevelChange, ScoreRecord, ScoreStore};
pub use session::{
    DualSession, NoteSink, PlaybackSession, StroopPolicy, StroopSession,
};
