//! Playback session: a simulator bound to a clock origin.
//!
//! The simulator itself only understands elapsed time. This wrapper owns the
//! origin (when playback started on the caller's clock), converts caller
//! time to elapsed time, dispatches the simulator's commands to the
//! [`NoteSink`], and reports progress.

use super::NoteSink;
use crate::engine::MidiSimulator;
use crate::midi::Performance;

/// A replay of one performance against the caller's clock.
#[derive(Debug)]
pub struct PlaybackSession {
    simulator: MidiSimulator,
    origin: f64,
}

impl PlaybackSession {
    /// Starts a session; playback time zero is `now` on the caller's clock.
    pub fn new(performance: Performance, now: f64) -> Self {
        Self {
            simulator: MidiSimulator::new(performance),
            origin: now,
        }
    }

    /// Advances playback to `now`, dispatching any due play/release
    /// commands.
    pub fn tick(&mut self, now: f64, sink: &mut dyn NoteSink) {
        let (to_play, to_release) = self.simulator.get_next_notes(now - self.origin);
        for (pitch, velocity) in to_play {
            sink.note_on(pitch, velocity);
        }
        for (pitch, _) in to_release {
            sink.note_off(pitch);
        }
    }

    /// Rewinds the performance and restarts the clock at `now`. The
    /// simulator reset and the origin reset belong together; splitting them
    /// is how replays drift.
    pub fn restart(&mut self, now: f64) {
        self.simulator.reset();
        self.origin = now;
    }

    /// Seconds of playback at caller time `now`.
    pub fn elapsed(&self, now: f64) -> f64 {
        now - self.origin
    }

    /// Fraction of note events admitted so far, in [0, 1]. An empty
    /// performance reads as complete.
    pub fn progress(&self) -> f64 {
        let total = self.simulator.get_total_notes();
        if total == 0 {
            1.0
        } else {
            self.simulator.notes_played() as f64 / total as f64
        }
    }

    pub fn is_finished(&self) -> bool {
        self.simulator.is_finished()
    }

    /// The underlying simulator, for introspection (pressed/active notes,
    /// next note time).
    pub fn simulator(&self) -> &MidiSimulator {
        &self.simulator
    }
}
