//! Score history and adaptive difficulty.
//!
//! Append-only per-game-mode score records plus the stored n-back level,
//! kept in one JSON file. Only dual n-back runs move the level; the Stroop
//! modes read it for their records but never change it.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Lowest reachable difficulty level.
pub const LEVEL_FLOOR: u32 = 2;

/// Accuracy at or above this moves the level up.
const LEVEL_UP_THRESHOLD: f64 = 90.0;

/// Two consecutive runs at or below this move the level down.
const LEVEL_DOWN_THRESHOLD: f64 = 70.0;

/// Errors from loading or saving the score file.
#[derive(Debug, Error)]
pub enum ScoreStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("score data error: {0}")]
    Format(#[from] serde_json::Error),
}

/// The game mode a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Dual,
    Stroop,
    AdvancedStroop,
    Inverse,
}

/// One finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Local time the run ended, "YYYY-MM-DD HH:MM:SS".
    pub datetime: String,
    /// Difficulty level the run was played at.
    pub level: u32,
    /// Overall accuracy in percent, rounded to two decimals.
    pub overall: f64,
    pub hits: u32,
    pub misses: u32,
}

impl ScoreRecord {
    /// Builds a record stamped with the current local time.
    pub fn now(level: u32, accuracy: f64, hits: u32, misses: u32) -> Self {
        Self {
            datetime: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            level,
            overall: (accuracy * 100.0).round() / 100.0,
            hits,
            misses,
        }
    }
}

/// How a run changed the difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelChange {
    Up,
    /// The policy voted down. At the floor the level value stays put, but
    /// the change is still reported as Down.
    Down,
    Unchanged,
}

fn default_level() -> u32 {
    LEVEL_FLOOR
}

/// On-disk payload.
#[derive(Debug, Serialize, Deserialize)]
struct ScoreData {
    #[serde(default = "default_level")]
    level: u32,
    #[serde(default)]
    dual: Vec<ScoreRecord>,
    #[serde(default)]
    stroop: Vec<ScoreRecord>,
    #[serde(default)]
    advanced_stroop: Vec<ScoreRecord>,
    #[serde(default)]
    inverse: Vec<ScoreRecord>,
}

impl Default for ScoreData {
    fn default() -> Self {
        Self {
            level: LEVEL_FLOOR,
            dual: Vec::new(),
            stroop: Vec::new(),
            advanced_stroop: Vec::new(),
            inverse: Vec::new(),
        }
    }
}

/// JSON-backed score history.
///
/// A missing file means a fresh player (level 2, no records); an unreadable
/// or corrupt file is an error, kept distinct so the caller can tell "new"
/// from "broken".
#[derive(Debug)]
pub struct ScoreStore {
    path: PathBuf,
    data: ScoreData,
}

impl ScoreStore {
    /// Opens the store at `path`, loading existing data if present.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ScoreStoreError> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let json = fs::read_to_string(&path)?;
            serde_json::from_str(&json)?
        } else {
            ScoreData::default()
        };
        Ok(Self { path, data })
    }

    /// The stored difficulty level.
    pub fn level(&self) -> u32 {
        self.data.level
    }

    /// Records a finished run and persists the store.
    pub fn record(&mut self, kind: GameKind, record: ScoreRecord) -> Result<(), ScoreStoreError> {
        self.records_mut(kind).push(record);
        self.save()
    }

    /// Records a finished dual run and applies the adaptive difficulty
    /// policy: accuracy at or above 90 moves the level up; otherwise, two
    /// consecutive runs at this level at or below 70 (including this one)
    /// move it down, floored at 2.
    pub fn record_dual_run(
        &mut self,
        accuracy: f64,
        hits: u32,
        misses: u32,
    ) -> Result<LevelChange, ScoreStoreError> {
        let level = self.data.level;
        self.data
            .dual
            .push(ScoreRecord::now(level, accuracy, hits, misses));

        let change = if accuracy >= LEVEL_UP_THRESHOLD {
            self.data.level = level + 1;
            LevelChange::Up
        } else {
            let last_two = self.last_two(GameKind::Dual, level);
            if last_two.len() >= 2 && last_two.iter().all(|&a| a <= LEVEL_DOWN_THRESHOLD) {
                self.data.level = level.saturating_sub(1).max(LEVEL_FLOOR);
                LevelChange::Down
            } else {
                LevelChange::Unchanged
            }
        };

        if change != LevelChange::Unchanged {
            tracing::info!(level = self.data.level, "difficulty level changed");
        }
        self.save()?;
        Ok(change)
    }

    /// Accuracies of the most recent (up to) two runs of `kind` played at
    /// `level`, oldest first.
    pub fn last_two(&self, kind: GameKind, level: u32) -> Vec<f64> {
        let records = self.records(kind);
        let mut accuracies: Vec<f64> = records
            .iter()
            .filter(|r| r.level == level)
            .map(|r| r.overall)
            .collect();
        let keep = accuracies.len().saturating_sub(2);
        accuracies.split_off(keep)
    }

    /// All records of one game mode, oldest first.
    pub fn records(&self, kind: GameKind) -> &[ScoreRecord] {
        match kind {
            GameKind::Dual => &self.data.dual,
            GameKind::Stroop => &self.data.stroop,
            GameKind::AdvancedStroop => &self.data.advanced_stroop,
            GameKind::Inverse => &self.data.inverse,
        }
    }

    fn records_mut(&mut self, kind: GameKind) -> &mut Vec<ScoreRecord> {
        match kind {
            GameKind::Dual => &mut self.data.dual,
            GameKind::Stroop => &mut self.data.stroop,
            GameKind::AdvancedStroop => &mut self.data.advanced_stroop,
            GameKind::Inverse => &mut self.data.inverse,
        }
    }

    fn save(&self) -> Result<(), ScoreStoreError> {
        let json = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
