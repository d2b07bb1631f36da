//! MIDI playback simulator.
//!
//! Deterministically replays a fixed, time-ordered performance against a
//! caller-supplied elapsed-time clock, producing play/release commands and
//! tracking sustain-extended note lifetime. The simulator never reads the
//! wall clock and never calls an audio primitive: each tick returns command
//! lists for the caller to dispatch, which makes it trivially testable with
//! synthetic timestamps.

use crate::midi::{NoteEvent, PedalEvent, Performance};
use std::collections::{BTreeMap, BTreeSet};

/// Tolerance applied to pedal and note admission so that events landing on a
/// tick boundary are not missed to floating-point error.
pub const TIME_EPSILON: f64 = 1e-6;

/// Runtime state for one currently-pressed pitch.
#[derive(Debug, Clone, Copy)]
struct ActiveNote {
    /// Time at which the note's nominal duration expires.
    end: f64,
    #[allow(dead_code)]
    velocity: u8,
}

/// Tick-driven replay of a [`Performance`].
///
/// Input events must already be normalized (earliest note at time 0) and
/// sorted ascending by time, as the import adapter produces them. The
/// simulator does not sort or validate; unsorted input yields undefined
/// command ordering.
///
/// The active and sustained sets are ordered containers so that identical
/// tick sequences always produce identical command lists, including after
/// [`reset`](Self::reset).
#[derive(Debug)]
pub struct MidiSimulator {
    notes: Vec<NoteEvent>,
    pedals: Vec<PedalEvent>,
    /// Admission cursor into `notes`. Monotone; never re-scans.
    cursor: usize,
    /// Consumption cursor into `pedals`.
    pedal_cursor: usize,
    /// Currently-pressed pitches and their scheduled end times.
    active: BTreeMap<u8, ActiveNote>,
    pedal_active: bool,
    /// Pitches whose sound the pedal is extending past their nominal end.
    sustained: BTreeSet<u8>,
}

impl MidiSimulator {
    /// Creates a simulator over a parsed performance.
    pub fn new(performance: Performance) -> Self {
        Self {
            notes: performance.notes,
            pedals: performance.pedals,
            cursor: 0,
            pedal_cursor: 0,
            active: BTreeMap::new(),
            pedal_active: false,
            sustained: BTreeSet::new(),
        }
    }

    /// Advances the replay to `elapsed` seconds and returns the commands due
    /// on this tick: `(notes_to_play, notes_to_release)` as (pitch, velocity)
    /// pairs, releases with velocity 0.
    ///
    /// The three phases run in a fixed order that callers must not assume
    /// away: pedal state first, so note expiry sees the pedal state in
    /// effect; then expiry; then admission of new notes.
    pub fn get_next_notes(&mut self, elapsed: f64) -> (Vec<(u8, u8)>, Vec<(u8, u8)>) {
        let mut to_play = Vec::new();
        let mut to_release = Vec::new();

        self.advance_pedal(elapsed, &mut to_release);

        // Expire notes whose nominal duration has run out. With the pedal
        // down they keep sounding from the sustained-hold set instead of
        // releasing.
        let expired: Vec<u8> = self
            .active
            .iter()
            .filter(|(_, note)| elapsed >= note.end)
            .map(|(&pitch, _)| pitch)
            .collect();
        for pitch in expired {
            self.active.remove(&pitch);
            if self.pedal_active {
                self.sustained.insert(pitch);
            } else {
                to_release.push((pitch, 0));
            }
        }

        // Admit events that have come due, in time order.
        while let Some(event) = self.notes.get(self.cursor) {
            if elapsed + TIME_EPSILON < event.time {
                break;
            }
            to_play.push((event.pitch, event.velocity));
            self.active.insert(
                event.pitch,
                ActiveNote {
                    end: event.end_time(),
                    velocity: event.velocity,
                },
            );
            // A fresh re-attack overrides a pending sustained tail.
            self.sustained.remove(&event.pitch);
            self.cursor += 1;
        }

        (to_play, to_release)
    }

    /// Consumes every pedal event due at `elapsed`. A pedal-up transition
    /// releases everything the pedal was holding, all at once.
    fn advance_pedal(&mut self, elapsed: f64, to_release: &mut Vec<(u8, u8)>) {
        while let Some(event) = self.pedals.get(self.pedal_cursor) {
            if elapsed + TIME_EPSILON < event.time {
                break;
            }
            let down = event.is_down();
            if self.pedal_active && !down {
                for &pitch in &self.sustained {
                    to_release.push((pitch, 0));
                }
                self.sustained.clear();
            }
            self.pedal_active = down;
            self.pedal_cursor += 1;
        }
    }

    /// Pitches currently pressed: inside their nominal duration. Does not
    /// include pitches only sounding through the sustain pedal.
    pub fn get_pressed_notes(&self) -> Vec<u8> {
        self.active.keys().copied().collect()
    }

    /// Everything currently audible: pressed pitches plus the pedal-held
    /// tails. Pressed and sustained sets are disjoint by construction, and
    /// both iterate in pitch order, so the result is sorted.
    pub fn get_active_notes(&self) -> Vec<u8> {
        let mut notes: Vec<u8> = self.active.keys().copied().collect();
        if self.pedal_active {
            notes.extend(self.sustained.iter().copied());
            notes.sort_unstable();
        }
        notes
    }

    /// Whether the sustain pedal is currently down.
    pub fn is_pedal_active(&self) -> bool {
        self.pedal_active
    }

    /// True once every event has been admitted and no note is pressed.
    ///
    /// Pedal-held tails do not block completion: a long pedal hold after the
    /// final note can leave something audible past this point.
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.notes.len() && self.active.is_empty()
    }

    /// Total number of note events in the performance.
    pub fn get_total_notes(&self) -> usize {
        self.notes.len()
    }

    /// Number of note events admitted so far.
    pub fn notes_played(&self) -> usize {
        self.cursor
    }

    /// Start time of the next unadmitted note, or None once the event list
    /// is exhausted.
    pub fn get_next_note_time(&self) -> Option<f64> {
        self.notes.get(self.cursor).map(|event| event.time)
    }

    /// Rewinds both cursors and clears all runtime state. The caller must
    /// independently reset its elapsed-time origin.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.pedal_cursor = 0;
        self.active.clear();
        self.pedal_active = false;
        self.sustained.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: u8, time: f64, duration: f64, velocity: u8) -> NoteEvent {
        NoteEvent::new(pitch, time, duration, velocity)
    }

    fn pedal(time: f64, value: u8) -> PedalEvent {
        PedalEvent { time, value }
    }

    fn simulator(notes: Vec<NoteEvent>, pedals: Vec<PedalEvent>) -> MidiSimulator {
        MidiSimulator::new(Performance { notes, pedals })
    }

    #[test]
    fn test_play_and_release_single_note() {
        let mut sim = simulator(vec![note(60, 0.0, 1.0, 100)], vec![]);

        let (play, release) = sim.get_next_notes(0.0);
        assert_eq!(play, vec![(60, 100)]);
        assert!(release.is_empty());
        assert_eq!(sim.get_pressed_notes(), vec![60]);
        assert!(!sim.is_finished());

        let (play, release) = sim.get_next_notes(0.5);
        assert!(play.is_empty());
        assert!(release.is_empty());

        let (play, release) = sim.get_next_notes(1.0);
        assert!(play.is_empty());
        assert_eq!(release, vec![(60, 0)]);
        assert!(sim.get_pressed_notes().is_empty());
        assert!(sim.is_finished());
    }

    #[test]
    fn test_admission_tolerates_boundary_error() {
        let mut sim = simulator(vec![note(60, 0.5, 1.0, 100)], vec![]);

        // Just below the boundary, inside the epsilon window.
        let (play, _) = sim.get_next_notes(0.4999999);
        assert_eq!(play, vec![(60, 100)]);
    }

    #[test]
    fn test_empty_performance_is_finished_immediately() {
        let mut sim = simulator(vec![], vec![]);
        assert!(sim.is_finished());
        assert_eq!(sim.get_next_note_time(), None);
        assert_eq!(sim.get_total_notes(), 0);

        let (play, release) = sim.get_next_notes(0.0);
        assert!(play.is_empty());
        assert!(release.is_empty());
    }

    #[test]
    fn test_sustain_holds_expired_note() {
        // Note ends at 1.0; pedal goes down at 0.5 and stays down.
        let mut sim = simulator(vec![note(60, 0.0, 1.0, 100)], vec![pedal(0.5, 1)]);

        sim.get_next_notes(0.0);
        sim.get_next_notes(0.6);
        assert!(sim.is_pedal_active());

        let (play, release) = sim.get_next_notes(1.1);
        assert!(play.is_empty());
        // No release: the pedal is holding the note.
        assert!(release.is_empty());
        assert_eq!(sim.get_active_notes(), vec![60]);
        assert!(sim.get_pressed_notes().is_empty());

        // The event list is exhausted and nothing is pressed, so playback
        // reports finished even though the tail is still audible.
        assert!(sim.is_finished());
    }

    #[test]
    fn test_pedal_release_frees_all_held_notes_at_once() {
        let notes = vec![note(60, 0.0, 0.5, 100), note(64, 0.0, 0.5, 90)];
        let mut sim = simulator(notes, vec![pedal(0.2, 1), pedal(2.0, 0)]);

        sim.get_next_notes(0.0);
        let (_, release) = sim.get_next_notes(0.6);
        assert!(release.is_empty());
        assert_eq!(sim.get_active_notes(), vec![60, 64]);

        // The tick that observes the pedal-up releases both together.
        let (play, release) = sim.get_next_notes(2.0);
        assert!(play.is_empty());
        assert_eq!(release, vec![(60, 0), (64, 0)]);
        assert!(sim.get_active_notes().is_empty());
        assert!(!sim.is_pedal_active());
        assert!(sim.is_finished());
    }

    #[test]
    fn test_reattack_overrides_sustained_tail() {
        let notes = vec![note(60, 0.0, 0.5, 100), note(60, 1.0, 0.5, 80)];
        let mut sim = simulator(notes, vec![pedal(0.2, 1)]);

        sim.get_next_notes(0.0);
        sim.get_next_notes(0.6); // 60 moves to the sustained-hold set
        assert_eq!(sim.get_active_notes(), vec![60]);
        assert!(sim.get_pressed_notes().is_empty());

        let (play, release) = sim.get_next_notes(1.0);
        assert_eq!(play, vec![(60, 80)]);
        assert!(release.is_empty());
        // Pressed again, and no longer carried by the pedal.
        assert_eq!(sim.get_pressed_notes(), vec![60]);
        assert_eq!(sim.get_active_notes(), vec![60]);
    }

    #[test]
    fn test_pedal_event_before_first_note() {
        // Import re-zeroing can leave pedal events at negative times; the
        // first tick must still apply them.
        let mut sim = simulator(vec![note(60, 0.0, 0.5, 100)], vec![pedal(-0.1, 1)]);

        sim.get_next_notes(0.0);
        assert!(sim.is_pedal_active());
    }

    #[test]
    fn test_round_trip_one_play_one_release_per_event() {
        let notes = vec![
            note(60, 0.0, 0.4, 100),
            note(64, 0.3, 0.4, 90),
            note(67, 0.8, 0.2, 80),
            note(60, 1.2, 0.3, 70),
        ];
        let mut sim = simulator(notes.clone(), vec![]);

        let mut plays = Vec::new();
        let mut releases = Vec::new();
        let mut open: Vec<u8> = Vec::new();
        let mut t = 0.0;
        while t < 2.0 {
            let (play, release) = sim.get_next_notes(t);
            for &(pitch, _) in &play {
                // No pitch plays twice without an intervening release.
                assert!(!open.contains(&pitch), "double play of {}", pitch);
                open.push(pitch);
            }
            for &(pitch, _) in &release {
                let pos = open.iter().position(|&p| p == pitch);
                assert!(pos.is_some(), "release of {} without play", pitch);
                open.remove(pos.unwrap());
            }
            plays.extend(play);
            releases.extend(release);
            t += 0.05;
        }

        assert_eq!(plays.len(), notes.len());
        assert_eq!(releases.len(), notes.len());
        assert!(open.is_empty());
        assert!(sim.is_finished());
    }

    #[test]
    fn test_reset_replays_identically() {
        let notes = vec![
            note(60, 0.0, 0.4, 100),
            note(64, 0.3, 0.6, 90),
            note(60, 1.0, 0.2, 80),
        ];
        let pedals = vec![pedal(0.2, 1), pedal(0.9, 0), pedal(1.1, 1)];
        let mut sim = simulator(notes, pedals);

        let ticks: Vec<f64> = (0..40).map(|i| i as f64 * 0.05).collect();
        let first: Vec<_> = ticks.iter().map(|&t| sim.get_next_notes(t)).collect();

        sim.reset();
        assert!(!sim.is_pedal_active());
        assert_eq!(sim.notes_played(), 0);

        let second: Vec<_> = ticks.iter().map(|&t| sim.get_next_notes(t)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_progress_introspection() {
        let notes = vec![note(60, 0.0, 0.2, 100), note(64, 1.0, 0.2, 90)];
        let mut sim = simulator(notes, vec![]);

        assert_eq!(sim.get_total_notes(), 2);
        assert_eq!(sim.get_next_note_time(), Some(0.0));

        sim.get_next_notes(0.0);
        assert_eq!(sim.notes_played(), 1);
        assert_eq!(sim.get_next_note_time(), Some(1.0));

        sim.get_next_notes(1.0);
        assert_eq!(sim.notes_played(), 2);
        assert_eq!(sim.get_next_note_time(), None);
    }
}
