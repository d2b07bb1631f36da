//! Stroop stimulus engine.
//!
//! Draws uniform pitch classes (0-11). The three Stroop game variants share
//! this one source and differ only in how the session sequences response,
//! timeout, and feedback; the engine itself is stateless beyond its RNG.

use super::StimulusRng;

/// Uniform pitch-class stimulus source.
#[derive(Debug)]
pub struct StroopEngine {
    rng: StimulusRng,
}

impl StroopEngine {
    /// Creates an engine drawing from the thread RNG.
    pub fn new() -> Self {
        Self {
            rng: StimulusRng::new(None),
        }
    }

    /// Creates a deterministic engine: the same seed always produces the
    /// same draw sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StimulusRng::new(Some(seed)),
        }
    }

    /// Draws the next stimulus: a pitch class in [0, 11].
    pub fn next_stimulus(&mut self) -> u8 {
        self.rng.draw(0, 11)
    }
}

impl Default for StroopEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draws_are_pitch_classes() {
        let mut engine = StroopEngine::new();
        for _ in 0..200 {
            assert!(engine.next_stimulus() < 12);
        }
    }

    #[test]
    fn test_seeded_engines_are_deterministic() {
        let mut a = StroopEngine::with_seed(17);
        let mut b = StroopEngine::with_seed(17);
        let draws_a: Vec<u8> = (0..50).map(|_| a.next_stimulus()).collect();
        let draws_b: Vec<u8> = (0..50).map(|_| b.next_stimulus()).collect();
        assert_eq!(draws_a, draws_b);
    }
}
