//! Run results, leaderboard and personal bests
//!
//! The leaderboard is one JSON array under `leaderboard`, sorted by score
//! (highest first). Each player's best score sits under `<name>_bestScore`
//! as a plain integer string.

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::persistence::KeyValueStore;

/// Storage key of the shared leaderboard
pub const LEADERBOARD_KEY: &str = "leaderboard";

/// Entries shown by default
pub const DEFAULT_TOP: usize = 10;

/// Games listed in a profile's recent history
pub const RECENT_GAMES: usize = 10;

/// Personal best key for a player
pub fn best_score_key(username: &str) -> String {
    format!("{}_bestScore", username)
}

/// Final stats of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub username: String,
    #[serde(rename = "score")]
    pub final_score: u64,
    #[serde(rename = "wave")]
    pub wave_reached: u32,
    #[serde(rename = "kills", default)]
    pub total_kills: u32,
    /// Rounded percent, 0-100
    #[serde(rename = "accuracy", default)]
    pub accuracy_percent: u32,
    /// Unix time (ms) the run ended; 0 for old entries
    #[serde(default)]
    pub timestamp: f64,
}

/// What recording a run changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Position on the leaderboard (1-indexed)
    pub rank: usize,
    /// The run beat the player's stored best
    pub personal_best: bool,
}

/// Where finished runs go
pub trait LeaderboardSink {
    fn record(&mut self, result: &RunResult) -> Result<RecordOutcome, PersistenceError>;
}

/// Aggregates for a player's profile page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileStats {
    pub games_played: usize,
    pub total_kills: u64,
    /// Stored personal best when present, else the best listed run
    pub highest_score: u64,
    pub highest_wave: u32,
    pub total_score: u64,
    pub average_accuracy: u32,
    /// Newest first
    pub recent: Vec<RunResult>,
}

/// Leaderboard over a key-value store
#[derive(Debug, Clone)]
pub struct Leaderboard<S> {
    store: S,
}

impl<S: KeyValueStore> Leaderboard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn read_entries(&self) -> Result<Vec<RunResult>, PersistenceError> {
        match self.store.get(LEADERBOARD_KEY)? {
            None => Ok(Vec::new()),
            Some(json) => serde_json::from_str(&json).map_err(|source| PersistenceError::Corrupt {
                key: LEADERBOARD_KEY.to_string(),
                source,
            }),
        }
    }

    /// All entries, best first; unreadable data reads as empty
    pub fn entries(&self) -> Vec<RunResult> {
        self.read_entries().unwrap_or_else(|e| {
            log::warn!("Leaderboard unreadable: {}", e);
            Vec::new()
        })
    }

    /// Best `n` runs
    pub fn top(&self, n: usize) -> Vec<RunResult> {
        let mut entries = self.entries();
        entries.truncate(n);
        entries
    }

    /// Stored best score for a player
    pub fn personal_best(&self, username: &str) -> Result<Option<u64>, PersistenceError> {
        let key = best_score_key(username);
        match self.store.get(&key)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(raw.trim())
                .map(Some)
                .map_err(|source| PersistenceError::Corrupt { key, source }),
        }
    }

    pub fn profile(&self, username: &str) -> ProfileStats {
        let mut games: Vec<RunResult> = self
            .entries()
            .into_iter()
            .filter(|r| r.username == username)
            .collect();
        if games.is_empty() {
            return ProfileStats::default();
        }

        let listed_best = games.iter().map(|r| r.final_score).max().unwrap_or(0);
        let highest_score = match self.personal_best(username) {
            Ok(Some(best)) => best,
            Ok(None) => listed_best,
            Err(e) => {
                log::warn!("Ignoring personal best: {}", e);
                listed_best
            }
        };
        let accuracy_sum: u64 = games.iter().map(|r| u64::from(r.accuracy_percent)).sum();

        let mut stats = ProfileStats {
            games_played: games.len(),
            total_kills: games.iter().map(|r| u64::from(r.total_kills)).sum(),
            highest_score,
            highest_wave: games.iter().map(|r| r.wave_reached).max().unwrap_or(0),
            total_score: games.iter().map(|r| r.final_score).sum(),
            average_accuracy: (accuracy_sum as f64 / games.len() as f64).round() as u32,
            recent: Vec::new(),
        };

        games.sort_by(|a, b| b.timestamp.total_cmp(&a.timestamp));
        games.truncate(RECENT_GAMES);
        stats.recent = games;
        stats
    }

    /// Forget a player's runs and personal best
    pub fn clear_user(&mut self, username: &str) -> Result<(), PersistenceError> {
        let mut entries = self.read_entries()?;
        let before = entries.len();
        entries.retain(|r| r.username != username);
        if entries.len() != before {
            self.store
                .set(LEADERBOARD_KEY, &serde_json::to_string(&entries)?)?;
        }
        self.store.remove(&best_score_key(username))?;
        log::info!("Cleared {} runs for {}", before - entries.len(), username);
        Ok(())
    }
}

impl<S: KeyValueStore> LeaderboardSink for Leaderboard<S> {
    fn record(&mut self, result: &RunResult) -> Result<RecordOutcome, PersistenceError> {
        let previous_best = match self.personal_best(&result.username) {
            Ok(best) => best,
            Err(PersistenceError::Corrupt { key, .. }) => {
                log::warn!("Replacing unreadable personal best under `{}`", key);
                None
            }
            Err(e) => return Err(e),
        };
        let personal_best = previous_best.is_none_or(|best| result.final_score > best);

        // Corrupt data is left for a human to look at; nothing is written
        let mut entries = self.read_entries()?;
        let idx = entries
            .iter()
            .take_while(|r| r.final_score >= result.final_score)
            .count();
        entries.insert(idx, result.clone());
        let encoded = serde_json::to_string(&entries)?;

        if personal_best {
            self.store.set(
                &best_score_key(&result.username),
                &result.final_score.to_string(),
            )?;
        }
        self.store.set(LEADERBOARD_KEY, &encoded)?;

        log::info!(
            "Recorded {} for {} at rank {}{}",
            result.final_score,
            result.username,
            idx + 1,
            if personal_best { " (personal best)" } else { "" }
        );
        Ok(RecordOutcome {
            rank: idx + 1,
            personal_best,
        })
    }
}
