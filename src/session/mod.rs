//! Session controllers for the game modes.
//!
//! Each session owns one engine instance and is driven by the caller on a
//! fixed tick with caller-supplied monotone time; sessions never read the
//! wall clock. All state lives in the session value itself and changes only
//! through `tick` and the explicit input methods, so there is no ordering
//! ambiguity between timer-driven and input-driven updates.
//!
//! Audio goes through the [`NoteSink`] boundary: sessions emit play/release
//! commands into whatever the caller provides (a synthesizer, a logger, a
//! test recorder) and never touch an audio primitive themselves.

mod dual;
mod playback;
mod stroop;

pub use dual::{DualOutcome, DualSession, DualTally, STIMULUS_INTERVAL, STIMULUS_LIMIT};
pub use playback::PlaybackSession;
pub use stroop::{
    FeedbackSound, StroopOutcome, StroopPhase, StroopPolicy, StroopSession, StroopUpdate,
    STIMULUS_BASE_PITCH,
};

/// Velocity used for session-generated stimulus and feedback notes.
pub const STIMULUS_VELOCITY: u8 = 100;

/// Command boundary toward the audio collaborator.
///
/// Implementations dispatch to a real synthesizer; tests record the calls.
pub trait NoteSink {
    /// Starts a note sounding.
    fn note_on(&mut self, pitch: u8, velocity: u8);

    /// Releases a sounding note.
    fn note_off(&mut self, pitch: u8);
}
