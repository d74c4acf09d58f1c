//! Achievements and the lifetime statistics they are judged on

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::rewards::RewardSink;
use super::{Notification, Progress};
use crate::persistence::Persisted;
use crate::sim::{EffectKind, RunStats};

/// A run without a shield hit counts as perfect past this distance
pub const PERFECT_RUN_MIN_DISTANCE_M: f32 = 1000.0;

pub fn is_perfect_run(run: &RunStats) -> bool {
    run.hits_taken == 0 && run.distance_m > PERFECT_RUN_MIN_DISTANCE_M
}

/// Totals across every run ever played
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifetimeStats {
    pub runs: u32,
    pub total_coins: u64,
    pub total_distance_m: f64,
    pub high_score: u64,
    pub total_jumps: u64,
    pub levels_completed: u32,
    pub perfect_runs: u32,
    pub powerups_used: BTreeMap<EffectKind, u32>,
}

impl LifetimeStats {
    pub fn record_run(&mut self, run: &RunStats) {
        self.runs += 1;
        self.total_coins += run.coins;
        self.total_distance_m += run.distance_m as f64;
        self.high_score = self.high_score.max(run.score);
        self.total_jumps += run.jumps as u64;
        self.levels_completed += run.levels_completed;
        if is_perfect_run(run) {
            self.perfect_runs += 1;
        }
        for (kind, n) in &run.powerups_used {
            *self.powerups_used.entry(*kind).or_insert(0) += n;
        }
    }

    pub fn total_powerups(&self) -> u32 {
        self.powerups_used.values().sum()
    }

    /// Every effect kind was used at least once
    pub fn used_every_powerup(&self) -> bool {
        EffectKind::ALL
            .iter()
            .all(|k| self.powerups_used.get(k).is_some_and(|n| *n > 0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    Runs(u32),
    LifetimeCoins(u64),
    ReachMaxSpeed,
    AnyUpgradeMaxed,
    AllCharactersOwned,
    LifetimeDistance(f64),
    EveryPowerup,
}

impl Condition {
    fn holds(&self, progress: &Progress<'_>) -> bool {
        let life = progress.lifetime;
        match *self {
            Condition::Runs(n) => life.runs >= n,
            Condition::LifetimeCoins(n) => life.total_coins >= n,
            Condition::ReachMaxSpeed => progress.run.reached_max_speed,
            Condition::AnyUpgradeMaxed => progress.any_upgrade_maxed,
            Condition::AllCharactersOwned => progress.all_characters_owned,
            Condition::LifetimeDistance(m) => life.total_distance_m >= m,
            Condition::EveryPowerup => life.used_every_powerup(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub condition: Condition,
    pub reward: u64,
}

pub static ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "firstHeist",
        name: "First Heist",
        description: "Complete your first heist",
        condition: Condition::Runs(1),
        reward: 100,
    },
    AchievementDef {
        id: "coinCollector",
        name: "Coin Collector",
        description: "Collect 1000 coins in total",
        condition: Condition::LifetimeCoins(1000),
        reward: 200,
    },
    AchievementDef {
        id: "speedDemon",
        name: "Speed Demon",
        description: "Reach maximum speed in a single run",
        condition: Condition::ReachMaxSpeed,
        reward: 300,
    },
    AchievementDef {
        id: "upgradeMaster",
        name: "Upgrade Master",
        description: "Max out any upgrade",
        condition: Condition::AnyUpgradeMaxed,
        reward: 500,
    },
    AchievementDef {
        id: "characterCollector",
        name: "Character Collector",
        description: "Unlock all characters",
        condition: Condition::AllCharactersOwned,
        reward: 1000,
    },
    AchievementDef {
        id: "distanceRunner",
        name: "Distance Runner",
        description: "Travel 10000 meters in total",
        condition: Condition::LifetimeDistance(10_000.0),
        reward: 400,
    },
    AchievementDef {
        id: "powerupPro",
        name: "Powerup Pro",
        description: "Use each type of powerup at least once",
        condition: Condition::EveryPowerup,
        reward: 300,
    },
];

pub fn achievement(id: &str) -> Option<&'static AchievementDef> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AchievementsRecord {
    pub stats: LifetimeStats,
    pub unlocked: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Achievements {
    pub stats: LifetimeStats,
    unlocked: BTreeSet<&'static str>,
}

impl Achievements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains(id)
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocked.len()
    }

    /// Unlock every achievement whose condition now holds, paying each
    /// reward exactly once
    pub fn evaluate(&mut self, progress: &Progress<'_>, sink: &mut dyn RewardSink) -> Vec<Notification> {
        let mut notes = Vec::new();
        for def in ACHIEVEMENTS {
            if self.unlocked.contains(def.id) || !def.condition.holds(progress) {
                continue;
            }
            self.unlocked.insert(def.id);
            sink.add_coins(def.reward);
            log::info!("Achievement unlocked: {}", def.name);
            notes.push(Notification::AchievementUnlocked {
                id: def.id,
                reward: def.reward,
            });
        }
        notes
    }
}

impl Persisted for Achievements {
    type Record = AchievementsRecord;

    const STORAGE_KEY: &'static str = "sneak_dog_achievements";

    fn to_record(&self) -> Self::Record {
        AchievementsRecord {
            stats: self.stats.clone(),
            unlocked: self.unlocked.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn apply_record(&mut self, record: Self::Record) {
        self.stats = record.stats;
        self.unlocked = record
            .unlocked
            .iter()
            .filter_map(|id| achievement(id).map(|a| a.id))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;
    use crate::progression::RewardTally;

    fn run(coins: u64, distance_m: f32) -> RunStats {
        RunStats {
            coins,
            distance_m,
            score: 10,
            ..RunStats::default()
        }
    }

    fn progress<'a>(run: &'a RunStats, lifetime: &'a LifetimeStats) -> Progress<'a> {
        Progress {
            run,
            lifetime,
            any_upgrade_maxed: false,
            all_characters_owned: false,
        }
    }

    #[test]
    fn test_first_heist_pays_once() {
        let mut achievements = Achievements::new();
        let mut tally = RewardTally::default();
        let r = run(5, 50.0);
        achievements.stats.record_run(&r);
        let stats = achievements.stats.clone();

        let notes = achievements.evaluate(&progress(&r, &stats), &mut tally);
        assert_eq!(
            notes,
            vec![Notification::AchievementUnlocked {
                id: "firstHeist",
                reward: 100
            }]
        );
        assert!(achievements.evaluate(&progress(&r, &stats), &mut tally).is_empty());
        assert_eq!(tally.coins, 100);
    }

    #[test]
    fn test_lifetime_thresholds() {
        let mut achievements = Achievements::new();
        let mut tally = RewardTally::default();
        let r = run(600, 6000.0);
        achievements.stats.record_run(&r);
        achievements.stats.record_run(&r);
        let stats = achievements.stats.clone();
        achievements.evaluate(&progress(&r, &stats), &mut tally);
        assert!(achievements.is_unlocked("coinCollector"));
        assert!(achievements.is_unlocked("distanceRunner"));
        assert!(!achievements.is_unlocked("speedDemon"));
        assert_eq!(tally.coins, 100 + 200 + 400);
    }

    #[test]
    fn test_powerup_pro_needs_every_kind() {
        let mut stats = LifetimeStats::default();
        let mut r = run(0, 0.0);
        for kind in &EffectKind::ALL[1..] {
            r.powerups_used.insert(*kind, 2);
        }
        stats.record_run(&r);
        assert!(!stats.used_every_powerup());
        r.powerups_used.insert(EffectKind::ALL[0], 1);
        stats.record_run(&r);
        assert!(stats.used_every_powerup());
        assert_eq!(stats.total_powerups(), 2 * 2 * 5 + 1);
    }

    #[test]
    fn test_store_conditions() {
        let mut achievements = Achievements::new();
        let mut tally = RewardTally::default();
        let r = RunStats {
            reached_max_speed: true,
            ..RunStats::default()
        };
        let stats = LifetimeStats::default();
        let snapshot = Progress {
            run: &r,
            lifetime: &stats,
            any_upgrade_maxed: true,
            all_characters_owned: true,
        };
        achievements.evaluate(&snapshot, &mut tally);
        assert!(achievements.is_unlocked("speedDemon"));
        assert!(achievements.is_unlocked("upgradeMaster"));
        assert!(achievements.is_unlocked("characterCollector"));
        assert!(!achievements.is_unlocked("firstHeist"));
    }

    #[test]
    fn test_perfect_run() {
        assert!(is_perfect_run(&run(0, 1500.0)));
        assert!(!is_perfect_run(&run(0, 900.0)));
        let mut hit = run(0, 1500.0);
        hit.hits_taken = 1;
        assert!(!is_perfect_run(&hit));
    }

    #[test]
    fn test_roundtrip() {
        let mut storage = MemoryStorage::new();
        let mut achievements = Achievements::new();
        let r = run(40, 120.0);
        achievements.stats.record_run(&r);
        let stats = achievements.stats.clone();
        achievements.evaluate(&progress(&r, &stats), &mut RewardTally::default());
        achievements.save(&mut storage).unwrap();

        let mut loaded = Achievements::new();
        assert!(loaded.load(&storage));
        assert_eq!(loaded, achievements);
    }
}
