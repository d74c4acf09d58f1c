//! High score leaderboard system
//!
//! Tracks the top 10 runs, persisted through [`Persisted`].

use serde::{Deserialize, Serialize};

use crate::persistence::Persisted;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Player's score
    pub score: u64,
    /// Metres run
    #[serde(default)]
    pub distance_m: f32,
    /// Level reached
    #[serde(default)]
    pub level: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// High score leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a run to the leaderboard (if it qualifies).
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(
        &mut self,
        score: u64,
        distance_m: f32,
        level: u32,
        timestamp: f64,
    ) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            score,
            distance_m,
            level,
            timestamp,
        };

        // Find insertion point (sorted descending by score)
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        // Trim to max size
        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}

impl Persisted for HighScores {
    type Record = HighScores;

    const STORAGE_KEY: &'static str = "sneak_dog_highscores";

    fn to_record(&self) -> Self::Record {
        self.clone()
    }

    fn apply_record(&mut self, mut record: Self::Record) {
        record.entries.sort_by(|a, b| b.score.cmp(&a.score));
        record.entries.truncate(MAX_HIGH_SCORES);
        *self = record;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;

    #[test]
    fn test_zero_never_qualifies() {
        let scores = HighScores::new();
        assert!(!scores.qualifies(0));
        assert!(scores.qualifies(1));
    }

    #[test]
    fn test_ranking_and_trim() {
        let mut scores = HighScores::new();
        for s in 1..=12u64 {
            scores.add_score(s * 10, s as f32 * 50.0, 1, 0.0);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.top_score(), Some(120));
        assert!(!scores.qualifies(20));
        assert_eq!(scores.potential_rank(125), Some(1));
        assert_eq!(scores.add_score(55, 0.0, 1, 0.0), Some(8));
    }

    #[test]
    fn test_persist_roundtrip() {
        let mut storage = MemoryStorage::new();
        let mut scores = HighScores::new();
        scores.add_score(42, 300.0, 1, 1_700_000_000_000.0);
        scores.add_score(7, 60.0, 1, 1_700_000_100_000.0);
        scores.save(&mut storage).unwrap();

        let mut loaded = HighScores::new();
        assert!(loaded.load(&storage));
        assert_eq!(loaded, scores);

        let mut empty = HighScores::new();
        assert!(!empty.load(&MemoryStorage::new()));
        assert!(empty.is_empty());
    }
}
