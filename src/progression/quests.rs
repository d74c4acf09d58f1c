//! Quests: started by the player, advanced by run totals, rewarded once

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::daily::DAY_MS;
use super::rewards::{Reward, RewardSink};
use super::{Notification, Rejection};
use crate::persistence::Persisted;
use crate::sim::RunStats;

/// Levels finished within this time count as fast
pub const FAST_LEVEL_MS: f64 = 60_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestKind {
    Tutorial,
    Story,
    Daily,
    Challenge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Objective {
    Distance,
    Jumps,
    LevelsCompleted,
    Coins,
    FastLevel,
    PerfectLevel,
}

impl Objective {
    /// How much one run contributes
    pub fn run_amount(&self, run: &RunStats) -> f64 {
        match self {
            Objective::Distance => run.distance_m as f64,
            Objective::Jumps => run.jumps as f64,
            Objective::LevelsCompleted => run.levels_completed as f64,
            Objective::Coins => run.coins as f64,
            Objective::FastLevel => {
                if run.fastest_level_ms.is_some_and(|t| t <= FAST_LEVEL_MS) {
                    1.0
                } else {
                    0.0
                }
            }
            Objective::PerfectLevel => run.perfect_levels as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuestDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub kind: QuestKind,
    pub objective: Objective,
    pub target: f64,
    pub rewards: &'static [Reward],
}

impl QuestDef {
    pub fn resets_daily(&self) -> bool {
        self.kind == QuestKind::Daily
    }
}

const fn item(id: &'static str, count: u32) -> Reward {
    Reward::Item { id, count }
}

pub static QUESTS: &[QuestDef] = &[
    QuestDef {
        id: "tutorial_move",
        name: "First Steps",
        description: "Learn basic movement controls",
        kind: QuestKind::Tutorial,
        objective: Objective::Distance,
        target: 100.0,
        rewards: &[Reward::Coins(50), item("energy_crystal", 1)],
    },
    QuestDef {
        id: "tutorial_jump",
        name: "Getting Higher",
        description: "Master jumping mechanics",
        kind: QuestKind::Tutorial,
        objective: Objective::Jumps,
        target: 10.0,
        rewards: &[Reward::Coins(75), item("swift_feather", 1)],
    },
    QuestDef {
        id: "story_ch1_start",
        name: "A New Adventure",
        description: "Begin your journey as a sneaky dog",
        kind: QuestKind::Story,
        objective: Objective::LevelsCompleted,
        target: 1.0,
        rewards: &[Reward::Coins(200), Reward::SkillPoints(1), item("magic_essence", 2)],
    },
    QuestDef {
        id: "story_ch1_collect",
        name: "Treasure Hunter",
        description: "Collect valuable items in the neighborhood",
        kind: QuestKind::Story,
        objective: Objective::Coins,
        target: 50.0,
        rewards: &[Reward::Coins(300), item("fortune_crystal", 1)],
    },
    QuestDef {
        id: "daily_distance",
        name: "Daily Runner",
        description: "Cover a set distance in one day",
        kind: QuestKind::Daily,
        objective: Objective::Distance,
        target: 1000.0,
        rewards: &[Reward::Coins(150), item("energy_crystal", 1)],
    },
    QuestDef {
        id: "daily_coins",
        name: "Coin Collector",
        description: "Collect coins throughout the day",
        kind: QuestKind::Daily,
        objective: Objective::Coins,
        target: 100.0,
        rewards: &[Reward::Coins(200), item("magnetic_ore", 1)],
    },
    QuestDef {
        id: "challenge_speed",
        name: "Speed Demon",
        description: "Complete a level within the time limit",
        kind: QuestKind::Challenge,
        objective: Objective::FastLevel,
        target: 1.0,
        rewards: &[Reward::Coins(500), Reward::SkillPoints(1), item("rainbow_shard", 1)],
    },
    QuestDef {
        id: "challenge_perfect",
        name: "Perfect Run",
        description: "Complete a level without taking damage",
        kind: QuestKind::Challenge,
        objective: Objective::PerfectLevel,
        target: 1.0,
        rewards: &[Reward::Coins(750), Reward::SkillPoints(2), item("protection_gem", 2)],
    },
];

pub fn quest(id: &str) -> Option<&'static QuestDef> {
    QUESTS.iter().find(|q| q.id == id)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestsRecord {
    pub active: Vec<String>,
    pub completed: Vec<String>,
    pub progress: BTreeMap<String, f64>,
    pub last_daily_reset_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quests {
    active: BTreeSet<&'static str>,
    completed: BTreeSet<&'static str>,
    progress: BTreeMap<&'static str, f64>,
    pub last_daily_reset_ms: f64,
}

impl Quests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains(id)
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.completed.contains(id)
    }

    pub fn progress(&self, id: &str) -> f64 {
        self.progress.get(id).copied().unwrap_or(0.0)
    }

    pub fn active(&self) -> impl Iterator<Item = &'static QuestDef> + '_ {
        self.active.iter().filter_map(|id| quest(id))
    }

    pub fn start(&mut self, id: &str) -> Result<(), Rejection> {
        let def = quest(id).ok_or_else(|| Rejection::UnknownId(id.to_string()))?;
        if self.is_active(id) || self.is_completed(id) {
            return Err(Rejection::AlreadyStarted(def.name.to_string()));
        }
        self.active.insert(def.id);
        self.progress.insert(def.id, 0.0);
        log::info!("Quest started: {}", def.name);
        Ok(())
    }

    /// Add to every active quest tracking `objective`
    pub fn add_progress(
        &mut self,
        objective: Objective,
        amount: f64,
        sink: &mut dyn RewardSink,
    ) -> Vec<Notification> {
        if amount <= 0.0 {
            return Vec::new();
        }
        let touched: Vec<&'static QuestDef> = self
            .active()
            .filter(|q| q.objective == objective)
            .collect();

        let mut notes = Vec::new();
        for def in touched {
            let value = (self.progress(def.id) + amount).min(def.target);
            self.progress.insert(def.id, value);
            if value >= def.target {
                notes.push(self.complete(def, sink));
            }
        }
        notes
    }

    /// Feed a finished run's totals into every objective
    pub fn record_run(&mut self, run: &RunStats, sink: &mut dyn RewardSink) -> Vec<Notification> {
        let objectives = [
            Objective::Distance,
            Objective::Jumps,
            Objective::LevelsCompleted,
            Objective::Coins,
            Objective::FastLevel,
            Objective::PerfectLevel,
        ];
        objectives
            .into_iter()
            .flat_map(|o| self.add_progress(o, o.run_amount(run), sink))
            .collect()
    }

    fn complete(&mut self, def: &'static QuestDef, sink: &mut dyn RewardSink) -> Notification {
        sink.grant(def.rewards);
        self.active.remove(def.id);
        self.completed.insert(def.id);
        log::info!("Quest complete: {}", def.name);
        Notification::QuestCompleted { id: def.id }
    }

    /// Clear daily quests once a day has passed since the last reset
    pub fn reset_daily(&mut self, now_ms: f64) -> bool {
        if now_ms - self.last_daily_reset_ms < DAY_MS {
            return false;
        }
        for def in QUESTS.iter().filter(|q| q.resets_daily()) {
            self.active.remove(def.id);
            self.completed.remove(def.id);
            self.progress.remove(def.id);
        }
        self.last_daily_reset_ms = now_ms;
        true
    }
}

fn known(ids: &[String]) -> BTreeSet<&'static str> {
    ids.iter().filter_map(|id| quest(id).map(|q| q.id)).collect()
}

impl Persisted for Quests {
    type Record = QuestsRecord;

    const STORAGE_KEY: &'static str = "sneak_dog_quests";

    fn to_record(&self) -> Self::Record {
        QuestsRecord {
            active: self.active.iter().map(|s| s.to_string()).collect(),
            completed: self.completed.iter().map(|s| s.to_string()).collect(),
            progress: self
                .progress
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            last_daily_reset_ms: self.last_daily_reset_ms,
        }
    }

    fn apply_record(&mut self, record: Self::Record) {
        self.active = known(&record.active);
        self.completed = known(&record.completed);
        self.progress = record
            .progress
            .iter()
            .filter_map(|(id, p)| quest(id).map(|q| (q.id, p.clamp(0.0, q.target))))
            .collect();
        self.last_daily_reset_ms = record.last_daily_reset_ms;
    }
}
