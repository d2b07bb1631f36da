//! Dual n-back session controller.
//!
//! Drives an [`NBackEngine`] on a fixed stimulus interval and scores two
//! independent channels per stimulus: pitch class and octave band. The
//! player responds to the *current* stimulus; the response is held until the
//! interval elapses, and scoring happens when the next stimulus is drawn.

use super::{NoteSink, STIMULUS_VELOCITY};
use crate::engine::NBackEngine;

/// Seconds between stimuli.
pub const STIMULUS_INTERVAL: f64 = 1.5;

/// Stimuli per run at the standard length.
pub const STIMULUS_LIMIT: u32 = 80;

/// Extra seconds after the last stimulus before the run ends.
const END_GRACE: f64 = 2.0;

/// Per-channel hit and miss counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DualTally {
    pub pitch_class_hits: u32,
    pub pitch_class_misses: u32,
    pub octave_hits: u32,
    pub octave_misses: u32,
}

impl DualTally {
    /// Overall accuracy in percent across both channels. Only scored
    /// responses count toward the denominator (floored at one so an
    /// all-silent run reads as 0 rather than dividing by zero).
    pub fn accuracy(&self) -> f64 {
        let scored = self.pitch_class_hits
            + self.pitch_class_misses
            + self.octave_hits
            + self.octave_misses;
        let hits = self.pitch_class_hits + self.octave_hits;
        f64::from(hits) / f64::from(scored.max(1)) * 100.0
    }
}

/// Result of a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualOutcome {
    pub accuracy: f64,
    pub tally: DualTally,
}

/// Tick-driven dual n-back run.
///
/// Scoring per channel when a stimulus expires: a response on a real match
/// is a hit; a response without a match, or a match without a response, is a
/// miss; no match and no response leaves the channel unscored.
#[derive(Debug)]
pub struct DualSession {
    engine: NBackEngine,
    limit: u32,
    count: u32,
    current: Option<u8>,
    responded_pitch_class: bool,
    responded_octave: bool,
    next_at: f64,
    end_at: Option<f64>,
    tally: DualTally,
    finished: bool,
}

impl DualSession {
    /// Starts a run of the standard length. `now` is the caller's current
    /// clock reading; the first stimulus plays one interval later.
    pub fn new(engine: NBackEngine, now: f64) -> Self {
        Self::with_limit(engine, STIMULUS_LIMIT, now)
    }

    /// Starts a run with a custom stimulus count.
    pub fn with_limit(mut engine: NBackEngine, limit: u32, now: f64) -> Self {
        engine.reset();
        Self {
            engine,
            limit,
            count: 0,
            current: None,
            responded_pitch_class: false,
            responded_octave: false,
            next_at: now + STIMULUS_INTERVAL,
            end_at: None,
            tally: DualTally::default(),
            finished: false,
        }
    }

    /// Advances the run to `now`. Returns the outcome on the tick that ends
    /// the run, None otherwise.
    pub fn tick(&mut self, now: f64, sink: &mut dyn NoteSink) -> Option<DualOutcome> {
        if self.finished {
            return None;
        }

        if now >= self.next_at && self.count < self.limit {
            self.score_expiring_stimulus();
            if let Some(prev) = self.current.take() {
                sink.note_off(prev);
            }

            let pitch = self.engine.next_stimulus();
            sink.note_on(pitch, STIMULUS_VELOCITY);
            self.current = Some(pitch);
            self.count += 1;
            self.responded_pitch_class = false;
            self.responded_octave = false;
            self.next_at += STIMULUS_INTERVAL;

            if self.count == self.limit {
                self.end_at = Some(self.next_at + END_GRACE);
            }
            None
        } else if self.count >= self.limit && self.end_at.is_none_or(|end| now >= end) {
            if let Some(prev) = self.current.take() {
                sink.note_off(prev);
            }
            self.finished = true;
            let outcome = DualOutcome {
                accuracy: self.tally.accuracy(),
                tally: self.tally,
            };
            tracing::info!(
                accuracy = outcome.accuracy,
                n = self.engine.n(),
                "dual n-back run finished"
            );
            Some(outcome)
        } else {
            None
        }
    }

    /// Registers a "same pitch class" response for the current stimulus and
    /// returns whether it matches, for immediate feedback. At most one
    /// response per channel per stimulus; further calls return None.
    pub fn respond_pitch_class(&mut self) -> Option<bool> {
        if self.finished || self.responded_pitch_class {
            return None;
        }
        let current = self.current?;
        self.responded_pitch_class = true;
        Some(self.engine.evaluate(current).0)
    }

    /// Registers a "same octave" response for the current stimulus. See
    /// [`respond_pitch_class`](Self::respond_pitch_class).
    pub fn respond_octave(&mut self) -> Option<bool> {
        if self.finished || self.responded_octave {
            return None;
        }
        let current = self.current?;
        self.responded_octave = true;
        Some(self.engine.evaluate(current).1)
    }

    /// Scores the stimulus whose response window just closed. The final
    /// stimulus of a run is never scored this way: the run ends before
    /// another draw happens.
    fn score_expiring_stimulus(&mut self) {
        let Some(current) = self.current else {
            return;
        };
        let (class_match, octave_match) = self.engine.evaluate(current);

        match (class_match, self.responded_pitch_class) {
            (true, true) => self.tally.pitch_class_hits += 1,
            (true, false) | (false, true) => self.tally.pitch_class_misses += 1,
            (false, false) => {}
        }
        match (octave_match, self.responded_octave) {
            (true, true) => self.tally.octave_hits += 1,
            (true, false) | (false, true) => self.tally.octave_misses += 1,
            (false, false) => {}
        }
    }

    /// The stimulus currently sounding, if any.
    pub fn current_stimulus(&self) -> Option<u8> {
        self.current
    }

    /// Stimuli drawn so far.
    pub fn stimulus_count(&self) -> u32 {
        self.count
    }

    /// Stimuli in the full run.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Running score.
    pub fn tally(&self) -> DualTally {
        self.tally
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        ons: Vec<(u8, u8)>,
        offs: Vec<u8>,
    }

    impl NoteSink for RecordingSink {
        fn note_on(&mut self, pitch: u8, velocity: u8) {
            self.ons.push((pitch, velocity));
        }
        fn note_off(&mut self, pitch: u8) {
            self.offs.push(pitch);
        }
    }

    /// A single-pitch range makes every evaluated stimulus a match on both
    /// channels, so the scoring table can be exercised deterministically.
    fn single_pitch_engine() -> NBackEngine {
        NBackEngine::with_seed(1, 60, 60, 1)
    }

    #[test]
    fn test_stimuli_follow_the_interval() {
        let mut sink = RecordingSink::default();
        let mut session = DualSession::with_limit(single_pitch_engine(), 3, 0.0);

        assert!(session.tick(1.0, &mut sink).is_none());
        assert_eq!(session.stimulus_count(), 0);

        session.tick(1.5, &mut sink);
        assert_eq!(session.stimulus_count(), 1);
        assert_eq!(session.current_stimulus(), Some(60));
        assert_eq!(sink.ons, vec![(60, STIMULUS_VELOCITY)]);

        // Nothing new until the next interval boundary.
        session.tick(2.9, &mut sink);
        assert_eq!(session.stimulus_count(), 1);

        session.tick(3.0, &mut sink);
        assert_eq!(session.stimulus_count(), 2);
        assert_eq!(sink.offs, vec![60]);
    }

    #[test]
    fn test_scoring_hits_and_misses() {
        let mut sink = RecordingSink::default();
        let mut session = DualSession::with_limit(single_pitch_engine(), 3, 0.0);

        // Stimulus 1: no comparison target yet, responding is a miss.
        session.tick(1.5, &mut sink);
        assert_eq!(session.respond_pitch_class(), Some(false));
        assert_eq!(session.respond_octave(), Some(false));

        // Stimulus 2: matches stimulus 1 on both channels; responding is a
        // hit.
        session.tick(3.0, &mut sink);
        assert_eq!(session.respond_pitch_class(), Some(true));
        assert_eq!(session.respond_octave(), Some(true));

        // Stimulus 3 drawn; stimulus 2 scored as hits.
        session.tick(4.5, &mut sink);
        let tally = session.tally();
        assert_eq!(tally.pitch_class_hits, 1);
        assert_eq!(tally.pitch_class_misses, 1);
        assert_eq!(tally.octave_hits, 1);
        assert_eq!(tally.octave_misses, 1);

        // Run ends after the grace period; the final stimulus stops.
        let outcome = session.tick(8.0, &mut sink).expect("run should finish");
        assert!(session.is_finished());
        assert!((outcome.accuracy - 50.0).abs() < 1e-9);
        assert_eq!(sink.offs.len(), 3);
    }

    #[test]
    fn test_unanswered_match_is_a_miss() {
        let mut sink = RecordingSink::default();
        let mut session = DualSession::with_limit(single_pitch_engine(), 3, 0.0);

        session.tick(1.5, &mut sink);
        session.tick(3.0, &mut sink);
        // Stimulus 2 matches but the player stays silent.
        session.tick(4.5, &mut sink);

        let tally = session.tally();
        assert_eq!(tally.pitch_class_hits, 0);
        assert_eq!(tally.pitch_class_misses, 1);
        assert_eq!(tally.octave_misses, 1);
    }

    #[test]
    fn test_responses_latch_once_per_stimulus() {
        let mut sink = RecordingSink::default();
        let mut session = DualSession::with_limit(single_pitch_engine(), 3, 0.0);

        assert_eq!(session.respond_pitch_class(), None); // no stimulus yet

        session.tick(1.5, &mut sink);
        assert!(session.respond_pitch_class().is_some());
        assert_eq!(session.respond_pitch_class(), None);
        assert!(session.respond_octave().is_some());
        assert_eq!(session.respond_octave(), None);
    }

    #[test]
    fn test_empty_tally_accuracy_is_zero() {
        assert_eq!(DualTally::default().accuracy(), 0.0);
    }

    #[test]
    fn test_tick_after_finish_is_inert() {
        let mut sink = RecordingSink::default();
        let mut session = DualSession::with_limit(single_pitch_engine(), 1, 0.0);

        session.tick(1.5, &mut sink);
        assert!(session.tick(10.0, &mut sink).is_some());
        assert!(session.tick(20.0, &mut sink).is_none());
        assert_eq!(session.stimulus_count(), 1);
    }
}
