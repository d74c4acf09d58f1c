//! Timed personal challenges: beat a target before the clock runs out

use serde::{Deserialize, Serialize};

use super::rewards::RewardSink;
use super::{Notification, Rejection};
use crate::persistence::Persisted;
use crate::sim::RunStats;

const HOUR_MS: f64 = 60.0 * 60.0 * 1000.0;
/// Finished challenges are kept this long past their deadline, then dropped
const RETENTION_MS: f64 = 7.0 * 24.0 * HOUR_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    Score,
    Coins,
    Distance,
}

impl ChallengeKind {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "score" => Some(ChallengeKind::Score),
            "coins" => Some(ChallengeKind::Coins),
            "distance" => Some(ChallengeKind::Distance),
            _ => None,
        }
    }

    pub fn target(&self) -> f64 {
        match self {
            ChallengeKind::Score => 10_000.0,
            ChallengeKind::Coins => 1_000.0,
            ChallengeKind::Distance => 5_000.0,
        }
    }

    /// Best single-run value
    fn measure(&self, run: &RunStats) -> f64 {
        match self {
            ChallengeKind::Score => run.score as f64,
            ChallengeKind::Coins => run.coins as f64,
            ChallengeKind::Distance => run.distance_m as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Active,
    Completed,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: u32,
    pub kind: ChallengeKind,
    pub started_at_ms: f64,
    pub duration_ms: f64,
    pub reward: u64,
    pub target: f64,
    /// Best value reached so far
    pub progress: f64,
    pub status: ChallengeStatus,
}

impl Challenge {
    pub fn ends_at_ms(&self) -> f64 {
        self.started_at_ms + self.duration_ms
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Challenges {
    pub challenges: Vec<Challenge>,
    pub next_id: u32,
}

impl Default for Challenges {
    fn default() -> Self {
        Self {
            challenges: Vec::new(),
            next_id: 1,
        }
    }
}

impl Challenges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new challenge lasting `duration_hours`
    pub fn create(
        &mut self,
        kind: ChallengeKind,
        duration_hours: f64,
        reward: u64,
        now_ms: f64,
    ) -> Result<u32, Rejection> {
        if !(duration_hours > 0.0) {
            return Err(Rejection::NotActivatable(format!(
                "challenge lasting {} hours",
                duration_hours
            )));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.challenges.push(Challenge {
            id,
            kind,
            started_at_ms: now_ms,
            duration_ms: duration_hours * HOUR_MS,
            reward,
            target: kind.target(),
            progress: 0.0,
            status: ChallengeStatus::Active,
        });
        log::info!("Challenge {} created ({:?})", id, kind);
        Ok(id)
    }

    pub fn get(&self, id: u32) -> Option<&Challenge> {
        self.challenges.iter().find(|c| c.id == id)
    }

    pub fn active(&self) -> impl Iterator<Item = &Challenge> {
        self.challenges
            .iter()
            .filter(|c| c.status == ChallengeStatus::Active)
    }

    /// Mark challenges past their deadline as expired and forget finished
    /// ones whose deadline is over a week old
    pub fn expire(&mut self, now_ms: f64) {
        for c in &mut self.challenges {
            if c.status == ChallengeStatus::Active && now_ms >= c.ends_at_ms() {
                c.status = ChallengeStatus::Expired;
                log::info!("Challenge {} expired", c.id);
            }
        }
        self.challenges.retain(|c| {
            c.status == ChallengeStatus::Active || now_ms < c.ends_at_ms() + RETENTION_MS
        });
    }

    /// Apply a finished run; rewards are paid once per completed challenge
    pub fn record_run(
        &mut self,
        run: &RunStats,
        now_ms: f64,
        sink: &mut dyn RewardSink,
    ) -> Vec<Notification> {
        self.expire(now_ms);
        let mut notes = Vec::new();
        for c in self
            .challenges
            .iter_mut()
            .filter(|c| c.status == ChallengeStatus::Active)
        {
            c.progress = c.progress.max(c.kind.measure(run));
            if c.progress >= c.target {
                c.status = ChallengeStatus::Completed;
                sink.add_coins(c.reward);
                log::info!("Challenge {} completed", c.id);
                notes.push(Notification::ChallengeCompleted {
                    id: c.id,
                    reward: c.reward,
                });
            }
        }
        notes
    }
}

impl Persisted for Challenges {
    type Record = Challenges;

    const STORAGE_KEY: &'static str = "sneak_dog_challenges";

    fn to_record(&self) -> Self::Record {
        self.clone()
    }

    fn apply_record(&mut self, record: Self::Record) {
        let max_id = record.challenges.iter().map(|c| c.id).max().unwrap_or(0);
        *self = record;
        self.next_id = self.next_id.max(max_id + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;
    use crate::progression::RewardTally;

    #[test]
    fn test_progress_is_best_run() {
        let mut challenges = Challenges::new();
        let mut tally = RewardTally::default();
        let id = challenges.create(ChallengeKind::Distance, 24.0, 500, 0.0).unwrap();

        let short = RunStats {
            distance_m: 3000.0,
            ..RunStats::default()
        };
        let shorter = RunStats {
            distance_m: 1000.0,
            ..RunStats::default()
        };
        challenges.record_run(&short, 1000.0, &mut tally);
        challenges.record_run(&shorter, 2000.0, &mut tally);
        assert_eq!(challenges.get(id).map(|c| c.progress), Some(3000.0));

        let long = RunStats {
            distance_m: 5200.0,
            ..RunStats::default()
        };
        let notes = challenges.record_run(&long, 3000.0, &mut tally);
        assert_eq!(notes, vec![Notification::ChallengeCompleted { id, reward: 500 }]);
        assert!(challenges.record_run(&long, 4000.0, &mut tally).is_empty());
        assert_eq!(tally.coins, 500);
    }

    #[test]
    fn test_expired_challenge_pays_nothing() {
        let mut challenges = Challenges::new();
        let mut tally = RewardTally::default();
        let id = challenges.create(ChallengeKind::Coins, 1.0, 100, 0.0).unwrap();
        let run = RunStats {
            coins: 5000,
            ..RunStats::default()
        };
        challenges.record_run(&run, HOUR_MS, &mut tally);
        assert_eq!(challenges.get(id).map(|c| c.status), Some(ChallengeStatus::Expired));
        assert_eq!(tally.coins, 0);
        assert_eq!(challenges.active().count(), 0);
    }

    #[test]
    fn test_finished_challenges_pruned_after_a_week() {
        let mut challenges = Challenges::new();
        let mut tally = RewardTally::default();
        let expired = challenges.create(ChallengeKind::Coins, 1.0, 100, 0.0).unwrap();
        let won = challenges.create(ChallengeKind::Score, 2.0, 50, 0.0).unwrap();
        let open = challenges.create(ChallengeKind::Distance, 24.0 * 30.0, 10, 0.0).unwrap();
        let run = RunStats {
            score: 20_000,
            ..RunStats::default()
        };
        challenges.record_run(&run, 1.5 * HOUR_MS, &mut tally);
        assert_eq!(challenges.get(won).map(|c| c.status), Some(ChallengeStatus::Completed));

        challenges.expire(HOUR_MS + RETENTION_MS);
        assert!(challenges.get(expired).is_none());
        assert!(challenges.get(won).is_some());

        challenges.expire(2.0 * HOUR_MS + RETENTION_MS);
        assert!(challenges.get(won).is_none());
        assert!(challenges.get(open).is_some());
        // Ids keep counting up
        assert_eq!(challenges.next_id, 4);
    }

    #[test]
    fn test_bad_duration_rejected() {
        let mut challenges = Challenges::new();
        assert!(challenges.create(ChallengeKind::Score, 0.0, 10, 0.0).is_err());
        assert!(challenges.challenges.is_empty());
        assert_eq!(challenges.next_id, 1);
    }

    #[test]
    fn test_roundtrip() {
        let mut storage = MemoryStorage::new();
        let mut challenges = Challenges::new();
        challenges.create(ChallengeKind::Score, 48.0, 250, 10.0).unwrap();
        challenges.create(ChallengeKind::Coins, 2.0, 75, 10.0).unwrap();
        challenges.save(&mut storage).unwrap();

        let mut loaded = Challenges::new();
        assert!(loaded.load(&storage));
        assert_eq!(loaded, challenges);
        assert_eq!(loaded.next_id, 3);
    }
}
