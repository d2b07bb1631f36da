//! Stroop session state machine.
//!
//! The three Stroop variants (standard color-to-note, advanced multi-note,
//! and inverse sound-to-key) share one round structure: present a stimulus,
//! collect key input, show feedback, move on. They differ only in policy:
//! whether the stimulus is audible, how many notes make up a round, whether
//! the response window times out, and how long feedback lasts. One machine
//! parameterized by [`StroopPolicy`] covers all three.

use super::{NoteSink, STIMULUS_VELOCITY};
use crate::engine::StroopEngine;
use crate::midi::pitch_class;

/// Pitch that presents pitch class 0; a stimulus class `c` sounds as
/// `STIMULUS_BASE_PITCH + c`.
pub const STIMULUS_BASE_PITCH: u8 = 60;

/// What sounds during the feedback phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackSound {
    /// Play the round's correct note (standard: the player hears what the
    /// color meant).
    CorrectNote,
    /// Stop everything (inverse: the stimulus note ends with the response).
    Silence,
    /// Leave the stimulus notes ringing until feedback ends (advanced).
    KeepStimulus,
}

/// Per-variant timing and structure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StroopPolicy {
    /// Seconds the player has to answer, or None for no limit.
    pub response_timeout: Option<f64>,
    /// Seconds the feedback phase lasts.
    pub feedback_secs: f64,
    /// Notes per round; the player answers them in order.
    pub sequence_len: usize,
    /// Rounds per run.
    pub round_limit: u32,
    /// Whether the stimulus is played at round start (and on replay).
    pub audible_stimulus: bool,
    pub feedback_sound: FeedbackSound,
}

impl StroopPolicy {
    /// Color to note, one at a time, under time pressure.
    pub fn standard() -> Self {
        Self {
            response_timeout: Some(1.5),
            feedback_secs: 0.8,
            sequence_len: 1,
            round_limit: 80,
            audible_stimulus: false,
            feedback_sound: FeedbackSound::CorrectNote,
        }
    }

    /// Three colors per round, answered in order, no timeout.
    pub fn advanced() -> Self {
        Self {
            response_timeout: None,
            feedback_secs: 1.5,
            sequence_len: 3,
            round_limit: 40,
            audible_stimulus: true,
            feedback_sound: FeedbackSound::KeepStimulus,
        }
    }

    /// Sound to key: the stimulus is heard, not seen.
    pub fn inverse() -> Self {
        Self {
            response_timeout: None,
            feedback_secs: 1.0,
            sequence_len: 1,
            round_limit: 40,
            audible_stimulus: true,
            feedback_sound: FeedbackSound::Silence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StroopPhase {
    /// Waiting for the player's input.
    Stimulus,
    /// Showing the round's result.
    Feedback,
}

/// What a key press did to the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StroopUpdate {
    /// The press arrived outside the response window.
    Ignored,
    /// Recorded mid-sequence; more positions remain.
    Recorded { position: usize, matched: bool },
    /// The round resolved.
    Resolved { correct: bool },
}

/// Result of a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StroopOutcome {
    pub hits: u32,
    pub misses: u32,
    /// Percent of rounds answered fully correctly.
    pub accuracy: f64,
}

/// One Stroop run: {Stimulus -> Feedback -> (next Stimulus | finished)}.
#[derive(Debug)]
pub struct StroopSession {
    engine: StroopEngine,
    policy: StroopPolicy,
    /// This round's pitch classes, in answer order.
    targets: Vec<u8>,
    /// Per-position match results collected so far this round.
    matched: Vec<bool>,
    /// Completed rounds.
    round: u32,
    phase: StroopPhase,
    stimulus_at: f64,
    feedback_until: f64,
    last_feedback: Option<bool>,
    /// Pitches this session has turned on and not yet released.
    sounding: Vec<u8>,
    hits: u32,
    misses: u32,
    finished: bool,
}

impl StroopSession {
    /// Starts a run and presents the first round.
    pub fn new(
        engine: StroopEngine,
        policy: StroopPolicy,
        now: f64,
        sink: &mut dyn NoteSink,
    ) -> Self {
        let mut session = Self {
            engine,
            policy,
            targets: Vec::new(),
            matched: Vec::new(),
            round: 0,
            phase: StroopPhase::Stimulus,
            stimulus_at: now,
            feedback_until: 0.0,
            last_feedback: None,
            sounding: Vec::new(),
            hits: 0,
            misses: 0,
            finished: false,
        };
        session.start_round(now, sink);
        session
    }

    fn start_round(&mut self, now: f64, sink: &mut dyn NoteSink) {
        self.stop_sounding(sink);
        self.targets = (0..self.policy.sequence_len)
            .map(|_| self.engine.next_stimulus())
            .collect();
        self.matched.clear();
        self.phase = StroopPhase::Stimulus;
        self.stimulus_at = now;
        self.last_feedback = None;
        if self.policy.audible_stimulus {
            self.play_targets(sink);
        }
    }

    fn play_targets(&mut self, sink: &mut dyn NoteSink) {
        let pitches: Vec<u8> = self
            .targets
            .iter()
            .map(|&class| STIMULUS_BASE_PITCH + class)
            .collect();
        for pitch in pitches {
            sink.note_on(pitch, STIMULUS_VELOCITY);
            self.sounding.push(pitch);
        }
    }

    fn stop_sounding(&mut self, sink: &mut dyn NoteSink) {
        for pitch in self.sounding.drain(..) {
            sink.note_off(pitch);
        }
    }

    /// Feeds one key press (any octave; only the pitch class counts) into
    /// the current round.
    pub fn note_on(&mut self, pitch: u8, now: f64, sink: &mut dyn NoteSink) -> StroopUpdate {
        if self.finished || self.phase != StroopPhase::Stimulus {
            return StroopUpdate::Ignored;
        }

        let position = self.matched.len();
        let matched = pitch_class(pitch) == self.targets[position];
        self.matched.push(matched);

        if self.matched.len() == self.policy.sequence_len {
            let correct = self.matched.iter().all(|&m| m);
            self.resolve(correct, now, sink);
            StroopUpdate::Resolved { correct }
        } else {
            StroopUpdate::Recorded { position, matched }
        }
    }

    /// Plays the stimulus again. Only meaningful while answering an audible
    /// stimulus; otherwise a no-op.
    pub fn replay(&mut self, sink: &mut dyn NoteSink) {
        if self.finished || self.phase != StroopPhase::Stimulus || !self.policy.audible_stimulus {
            return;
        }
        self.stop_sounding(sink);
        self.play_targets(sink);
    }

    fn resolve(&mut self, correct: bool, now: f64, sink: &mut dyn NoteSink) {
        if correct {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        self.last_feedback = Some(correct);
        self.phase = StroopPhase::Feedback;
        self.feedback_until = now + self.policy.feedback_secs;

        match self.policy.feedback_sound {
            FeedbackSound::CorrectNote => {
                self.stop_sounding(sink);
                let pitch = STIMULUS_BASE_PITCH + self.targets[0];
                sink.note_on(pitch, STIMULUS_VELOCITY);
                self.sounding.push(pitch);
            }
            FeedbackSound::Silence => self.stop_sounding(sink),
            FeedbackSound::KeepStimulus => {}
        }
        tracing::debug!(round = self.round, correct, "stroop round resolved");
    }

    /// Advances the machine to `now`: applies the response timeout and ends
    /// the feedback phase. Returns the outcome on the tick that ends the
    /// run, None otherwise.
    pub fn tick(&mut self, now: f64, sink: &mut dyn NoteSink) -> Option<StroopOutcome> {
        if self.finished {
            return None;
        }

        match self.phase {
            StroopPhase::Stimulus => {
                if let Some(timeout) = self.policy.response_timeout {
                    if now > self.stimulus_at + timeout {
                        self.resolve(false, now, sink);
                    }
                }
                None
            }
            StroopPhase::Feedback => {
                if now < self.feedback_until {
                    return None;
                }
                self.stop_sounding(sink);
                self.round += 1;
                if self.round < self.policy.round_limit {
                    self.start_round(now, sink);
                    None
                } else {
                    self.finished = true;
                    let outcome = StroopOutcome {
                        hits: self.hits,
                        misses: self.misses,
                        accuracy: f64::from(self.hits) / f64::from(self.policy.round_limit) * 100.0,
                    };
                    tracing::info!(
                        hits = self.hits,
                        misses = self.misses,
                        accuracy = outcome.accuracy,
                        "stroop run finished"
                    );
                    Some(outcome)
                }
            }
        }
    }

    /// This round's pitch classes, in answer order.
    pub fn targets(&self) -> &[u8] {
        &self.targets
    }

    /// How many positions have been answered this round.
    pub fn answered(&self) -> usize {
        self.matched.len()
    }

    /// Completed rounds.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn phase(&self) -> StroopPhase {
        self.phase
    }

    /// Whether the round being shown resolved correctly, while in feedback.
    pub fn last_feedback(&self) -> Option<bool> {
        self.last_feedback
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
