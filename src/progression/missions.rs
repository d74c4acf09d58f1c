//! Story, daily and weekly missions
//!
//! Story missions are fixed. Daily and weekly sets are sampled from a pool
//! and replaced once their period has elapsed; whatever was in progress is
//! discarded, the count of completed missions is kept.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::achievements::is_perfect_run;
use super::daily::DAY_MS;
use super::rewards::RewardSink;
use super::{Notification, Progress};
use crate::persistence::Persisted;
use crate::sim::RunStats;

pub const WEEK_MS: f64 = 7.0 * DAY_MS;
pub const DAILY_MISSION_COUNT: usize = 3;
pub const WEEKLY_MISSION_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Goal {
    /// Finish a level within this many milliseconds
    FastLevel { max_ms: f64 },
    /// Coins credited in one run
    RunCoins(u64),
    /// No shield hits over a long run
    PerfectRun,
    /// Jumps in one run
    RunJumps(u32),
    /// Metres in one run
    RunDistance(f32),
    /// Metres summed over the week
    WeeklyDistance(f64),
    WeeklyCoins(u64),
    WeeklyPowerups(u32),
    WeeklyLevels(u32),
    LifetimeRuns(u32),
    LifetimePerfectRuns(u32),
}

impl Goal {
    pub fn target(&self) -> f64 {
        match *self {
            Goal::WeeklyDistance(m) => m,
            Goal::WeeklyCoins(n) => n as f64,
            Goal::WeeklyPowerups(n) | Goal::WeeklyLevels(n) => n as f64,
            Goal::LifetimeRuns(n) | Goal::LifetimePerfectRuns(n) => n as f64,
            _ => 1.0,
        }
    }

    /// New progress value given the previous one
    fn advance(&self, previous: f64, progress: &Progress<'_>) -> f64 {
        let run: &RunStats = progress.run;
        let met = |ok: bool| if ok { 1.0 } else { 0.0 };
        let value = match *self {
            Goal::FastLevel { max_ms } => met(run.fastest_level_ms.is_some_and(|t| t <= max_ms)),
            Goal::RunCoins(n) => met(run.coins >= n),
            Goal::PerfectRun => met(is_perfect_run(run)),
            Goal::RunJumps(n) => met(run.jumps >= n),
            Goal::RunDistance(m) => met(run.distance_m >= m),
            Goal::WeeklyDistance(_) => previous + run.distance_m as f64,
            Goal::WeeklyCoins(_) => previous + run.coins as f64,
            Goal::WeeklyPowerups(_) => previous + run.powerups_used.values().sum::<u32>() as f64,
            Goal::WeeklyLevels(_) => previous + run.levels_completed as f64,
            Goal::LifetimeRuns(_) => progress.lifetime.runs as f64,
            Goal::LifetimePerfectRuns(_) => progress.lifetime.perfect_runs as f64,
        };
        value.max(previous).min(self.target())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissionDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub goal: Goal,
    pub reward: u64,
}

pub static DAILY_POOL: &[MissionDef] = &[
    MissionDef {
        id: "quick_heist",
        name: "Quick Heist",
        description: "Complete a heist in under 60 seconds",
        goal: Goal::FastLevel { max_ms: 60_000.0 },
        reward: 50,
    },
    MissionDef {
        id: "coin_rush",
        name: "Coin Rush",
        description: "Collect 100 coins in a single run",
        goal: Goal::RunCoins(100),
        reward: 75,
    },
    MissionDef {
        id: "perfect_run",
        name: "Perfect Run",
        description: "Complete a run without getting hit",
        goal: Goal::PerfectRun,
        reward: 100,
    },
    MissionDef {
        id: "high_jumper",
        name: "High Jumper",
        description: "Jump 50 times in a single run",
        goal: Goal::RunJumps(50),
        reward: 60,
    },
    MissionDef {
        id: "long_haul",
        name: "Long Haul",
        description: "Run 3000 meters in a single run",
        goal: Goal::RunDistance(3000.0),
        reward: 120,
    },
];

pub static WEEKLY_POOL: &[MissionDef] = &[
    MissionDef {
        id: "marathon_runner",
        name: "Marathon Runner",
        description: "Travel a total of 10000 meters",
        goal: Goal::WeeklyDistance(10_000.0),
        reward: 300,
    },
    MissionDef {
        id: "treasure_hunter",
        name: "Treasure Hunter",
        description: "Collect 1000 coins total",
        goal: Goal::WeeklyCoins(1000),
        reward: 250,
    },
    MissionDef {
        id: "powerup_master",
        name: "Powerup Master",
        description: "Use 50 powerups",
        goal: Goal::WeeklyPowerups(50),
        reward: 400,
    },
    MissionDef {
        id: "level_climber",
        name: "Level Climber",
        description: "Complete 20 levels",
        goal: Goal::WeeklyLevels(20),
        reward: 350,
    },
];

pub static STORY: &[MissionDef] = &[
    MissionDef {
        id: "rookie_thief",
        name: "Rookie Thief",
        description: "Complete your first successful heist",
        goal: Goal::LifetimeRuns(1),
        reward: 100,
    },
    MissionDef {
        id: "master_thief",
        name: "Master Thief",
        description: "Complete 10 heists with perfect runs",
        goal: Goal::LifetimePerfectRuns(10),
        reward: 500,
    },
];

fn find(pool: &'static [MissionDef], id: &str) -> Option<&'static MissionDef> {
    pool.iter().find(|m| m.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mission {
    pub def: &'static MissionDef,
    pub progress: f64,
    pub completed: bool,
}

impl Mission {
    fn fresh(def: &'static MissionDef) -> Self {
        Self {
            def,
            progress: 0.0,
            completed: false,
        }
    }
}

/// Stored form of a mission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionEntry {
    pub id: String,
    pub progress: f64,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionsRecord {
    pub story: Vec<MissionEntry>,
    pub daily: Vec<MissionEntry>,
    pub weekly: Vec<MissionEntry>,
    pub last_daily_refresh_ms: f64,
    pub last_weekly_refresh_ms: f64,
    pub completed_total: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Missions {
    pub story: Vec<Mission>,
    pub daily: Vec<Mission>,
    pub weekly: Vec<Mission>,
    pub last_daily_refresh_ms: f64,
    pub last_weekly_refresh_ms: f64,
    /// Missions ever completed
    pub completed_total: u32,
}

impl Default for Missions {
    fn default() -> Self {
        Self {
            story: STORY.iter().map(Mission::fresh).collect(),
            daily: Vec::new(),
            weekly: Vec::new(),
            last_daily_refresh_ms: 0.0,
            last_weekly_refresh_ms: 0.0,
            completed_total: 0,
        }
    }
}

fn sample<R: Rng + ?Sized>(pool: &'static [MissionDef], count: usize, rng: &mut R) -> Vec<Mission> {
    pool.choose_multiple(rng, count).map(Mission::fresh).collect()
}

impl Missions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the daily and weekly sets whose period has elapsed.
    /// Returns true if anything was replaced.
    pub fn refresh<R: Rng + ?Sized>(&mut self, now_ms: f64, rng: &mut R) -> bool {
        let mut changed = false;
        if self.daily.is_empty() || now_ms - self.last_daily_refresh_ms >= DAY_MS {
            self.daily = sample(DAILY_POOL, DAILY_MISSION_COUNT, rng);
            self.last_daily_refresh_ms = now_ms;
            changed = true;
            log::debug!("Daily missions refreshed");
        }
        if self.weekly.is_empty() || now_ms - self.last_weekly_refresh_ms >= WEEK_MS {
            self.weekly = sample(WEEKLY_POOL, WEEKLY_MISSION_COUNT, rng);
            self.last_weekly_refresh_ms = now_ms;
            changed = true;
            log::debug!("Weekly missions refreshed");
        }
        changed
    }

    /// Advance every open mission and pay out the ones that complete
    pub fn evaluate(&mut self, progress: &Progress<'_>, sink: &mut dyn RewardSink) -> Vec<Notification> {
        let mut notes = Vec::new();
        let mut completed = 0;
        for mission in self
            .daily
            .iter_mut()
            .chain(self.weekly.iter_mut())
            .chain(self.story.iter_mut())
            .filter(|m| !m.completed)
        {
            mission.progress = mission.def.goal.advance(mission.progress, progress);
            if mission.progress >= mission.def.goal.target() {
                mission.completed = true;
                completed += 1;
                sink.add_coins(mission.def.reward);
                log::info!("Mission complete: {}", mission.def.name);
                notes.push(Notification::MissionCompleted {
                    id: mission.def.id,
                    reward: mission.def.reward,
                });
            }
        }
        self.completed_total += completed;
        notes
    }
}

fn to_entries(missions: &[Mission]) -> Vec<MissionEntry> {
    missions
        .iter()
        .map(|m| MissionEntry {
            id: m.def.id.to_string(),
            progress: m.progress,
            completed: m.completed,
        })
        .collect()
}

fn from_entries(pool: &'static [MissionDef], entries: &[MissionEntry]) -> Vec<Mission> {
    entries
        .iter()
        .filter_map(|e| {
            find(pool, &e.id).map(|def| Mission {
                def,
                progress: e.progress.clamp(0.0, def.goal.target()),
                completed: e.completed,
            })
        })
        .collect()
}

impl Persisted for Missions {
    type Record = MissionsRecord;

    const STORAGE_KEY: &'static str = "sneak_dog_missions";

    fn to_record(&self) -> Self::Record {
        MissionsRecord {
            story: to_entries(&self.story),
            daily: to_entries(&self.daily),
            weekly: to_entries(&self.weekly),
            last_daily_refresh_ms: self.last_daily_refresh_ms,
            last_weekly_refresh_ms: self.last_weekly_refresh_ms,
            completed_total: self.completed_total,
        }
    }

    fn apply_record(&mut self, record: Self::Record) {
        let stored = from_entries(STORY, &record.story);
        // Story missions missing from the record start fresh
        self.story = STORY
            .iter()
            .map(|def| {
                stored
                    .iter()
                    .find(|m| m.def.id == def.id)
                    .copied()
                    .unwrap_or_else(|| Mission::fresh(def))
            })
            .collect();
        self.daily = from_entries(DAILY_POOL, &record.daily);
        self.weekly = from_entries(WEEKLY_POOL, &record.weekly);
        self.last_daily_refresh_ms = record.last_daily_refresh_ms;
        self.last_weekly_refresh_ms = record.last_weekly_refresh_ms;
        self.completed_total = record.completed_total;
    }
}
