//! Stimulus-generation and playback engines.
//!
//! Three independent, leaf-level engines, each driven by one session
//! controller on a fixed tick: the n-back sequence engine, the Stroop
//! stimulus engine, and the MIDI playback simulator. Engines are synchronous
//! and non-blocking; they hold no references to audio, UI, or persistence.

mod nback;
mod simulator;
mod stroop;

pub use nback::{HistoryEntry, NBackEngine};
pub use simulator::{MidiSimulator, TIME_EPSILON};
pub use stroop::StroopEngine;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform pitch source shared by the stimulus engines.
///
/// Seeded instances are fully deterministic (same seed, same sequence),
/// which is what the tests rely on; unseeded instances draw from the thread
/// RNG.
#[derive(Debug)]
pub(crate) enum StimulusRng {
    Seeded(StdRng),
    System,
}

impl StimulusRng {
    pub(crate) fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::Seeded(StdRng::seed_from_u64(seed)),
            None => Self::System,
        }
    }

    /// Draws a pitch uniformly from the inclusive range [min, max].
    pub(crate) fn draw(&mut self, min: u8, max: u8) -> u8 {
        match self {
            Self::Seeded(rng) => rng.gen_range(min..=max),
            Self::System => rand::thread_rng().gen_range(min..=max),
        }
    }
}
