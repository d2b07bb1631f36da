//! Pitch n-back sequence engine.
//!
//! Produces pseudo-random pitch stimuli within a range and evaluates the
//! current stimulus against the one produced N draws earlier, on two
//! independent channels: pitch class (the chromatic identity) and octave
//! band. The dual n-back session scores both channels per stimulus.

use super::StimulusRng;
use crate::midi::{octave_band, pitch_class, PITCH_MAX, PITCH_MIN};
use std::collections::VecDeque;
use std::time::Instant;

/// One drawn stimulus: the pitch and when it was emitted, in seconds since
/// the engine was constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    pub pitch: u8,
    pub at: f64,
}

/// N-back stimulus generator and match evaluator.
///
/// The history is bounded to the most recent N+1 draws (oldest evicted), just
/// enough to look back exactly N positions without unbounded growth.
#[derive(Debug)]
pub struct NBackEngine {
    n: usize,
    pitch_min: u8,
    pitch_max: u8,
    history: VecDeque<HistoryEntry>,
    rng: StimulusRng,
    epoch: Instant,
}

impl NBackEngine {
    /// Creates an engine with lookback depth `n` (floored at 1) drawing from
    /// the inclusive range [pitch_min, pitch_max].
    ///
    /// The range is a caller-validated precondition: `pitch_min <= pitch_max`.
    pub fn new(n: usize, pitch_min: u8, pitch_max: u8) -> Self {
        Self::build(n, pitch_min, pitch_max, None)
    }

    /// Creates a deterministic engine: the same seed always produces the
    /// same draw sequence.
    pub fn with_seed(n: usize, pitch_min: u8, pitch_max: u8, seed: u64) -> Self {
        Self::build(n, pitch_min, pitch_max, Some(seed))
    }

    fn build(n: usize, pitch_min: u8, pitch_max: u8, seed: Option<u64>) -> Self {
        let n = n.max(1);
        Self {
            n,
            pitch_min,
            pitch_max,
            history: VecDeque::with_capacity(n + 1),
            rng: StimulusRng::new(seed),
            epoch: Instant::now(),
        }
    }

    /// The lookback depth.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Draws the next stimulus, records it in the history, and returns it.
    /// Always succeeds.
    pub fn next_stimulus(&mut self) -> u8 {
        let pitch = self.rng.draw(self.pitch_min, self.pitch_max);
        self.history.push_back(HistoryEntry {
            pitch,
            at: self.epoch.elapsed().as_secs_f64(),
        });
        while self.history.len() > self.n + 1 {
            self.history.pop_front();
        }
        pitch
    }

    /// Evaluates `current` against the stimulus drawn exactly N positions
    /// back.
    ///
    /// Returns `(pitch_class_match, octave_match)`. While fewer than N+1
    /// stimuli have been drawn there is no comparison target yet and the
    /// result is `(false, false)`.
    ///
    /// Evaluation is pure: it does not mutate history and may be called any
    /// number of times per draw. Scoring each stimulus at most once is the
    /// caller's contract.
    pub fn evaluate(&self, current: u8) -> (bool, bool) {
        if self.history.len() <= self.n {
            return (false, false);
        }
        let past = self.history[self.history.len() - 1 - self.n].pitch;
        (
            pitch_class(current) == pitch_class(past),
            octave_band(current) == octave_band(past),
        )
    }

    /// The retained draws, oldest first. At most N+1 entries.
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    /// Clears the history. The depth and pitch range are unchanged; used to
    /// start a fresh run without reconstructing the engine.
    pub fn reset(&mut self) {
        self.history.clear();
    }
}

impl Default for NBackEngine {
    /// An engine at the starting difficulty over the playable pitch window.
    fn default() -> Self {
        Self::new(2, PITCH_MIN, PITCH_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_with_insufficient_history() {
        let mut engine = NBackEngine::with_seed(2, 36, 84, 1);
        assert_eq!(engine.evaluate(60), (false, false));

        // With n=2 the first two draws still have no comparison target.
        for _ in 0..2 {
            let p = engine.next_stimulus();
            assert_eq!(engine.evaluate(p), (false, false));
        }
    }

    #[test]
    fn test_matches_exactly_n_back() {
        let mut engine = NBackEngine::with_seed(2, 36, 84, 7);
        let first = engine.next_stimulus();
        engine.next_stimulus();
        engine.next_stimulus();

        // The comparison target is now the first draw.
        assert_eq!(engine.evaluate(first), (true, true));
        assert_eq!(engine.evaluate(first + 12), (true, false));

        let other_class = first + 1;
        let (class_match, _) = engine.evaluate(other_class);
        assert!(!class_match);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut engine = NBackEngine::with_seed(1, 36, 84, 3);
        let mut draws = Vec::new();
        for _ in 0..5 {
            draws.push(engine.next_stimulus());
        }
        // After 5 draws with n=1, only the last two survive and the target
        // is the fourth draw, not any evicted entry.
        assert_eq!(engine.history().count(), 2);
        assert_eq!(engine.evaluate(draws[3]), (true, true));
    }

    #[test]
    fn test_seeded_engines_are_deterministic() {
        let mut a = NBackEngine::with_seed(2, 36, 84, 42);
        let mut b = NBackEngine::with_seed(2, 36, 84, 42);
        let draws_a: Vec<u8> = (0..50).map(|_| a.next_stimulus()).collect();
        let draws_b: Vec<u8> = (0..50).map(|_| b.next_stimulus()).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn test_draws_stay_in_range() {
        let mut engine = NBackEngine::with_seed(2, 60, 62, 11);
        for _ in 0..100 {
            let p = engine.next_stimulus();
            assert!((60..=62).contains(&p));
        }
    }

    #[test]
    fn test_reset_clears_history_only() {
        let mut engine = NBackEngine::with_seed(2, 36, 84, 9);
        let first = engine.next_stimulus();
        engine.next_stimulus();
        engine.next_stimulus();
        assert_eq!(engine.evaluate(first), (true, true));

        engine.reset();
        assert_eq!(engine.n(), 2);
        assert_eq!(engine.evaluate(first), (false, false));
    }

    #[test]
    fn test_depth_floor() {
        let engine = NBackEngine::new(0, 36, 84);
        assert_eq!(engine.n(), 1);
    }
}
