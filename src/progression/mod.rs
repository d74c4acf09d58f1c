//! Meta-progression ledgers
//!
//! Every ledger follows the same shape: a static definition table built from
//! code, a small mutable state persisted as one record, gated operations that
//! either fully succeed or return a [`Rejection`] without touching anything,
//! and an evaluation step fed by a [`Progress`] snapshot at the end of a run.

pub mod achievements;
pub mod challenges;
pub mod crafting;
pub mod customization;
pub mod daily;
pub mod items;
pub mod missions;
pub mod pets;
pub mod quests;
pub mod rewards;
pub mod skills;
pub mod store;

use serde::Serialize;
use thiserror::Error;

use crate::audio::SoundCue;
use crate::sim::RunStats;

pub use achievements::{Achievements, LifetimeStats};
pub use challenges::{ChallengeKind, Challenges};
pub use crafting::{Crafting, Equipment};
pub use customization::{Customization, Slot};
pub use daily::DailyRewards;
pub use missions::Missions;
pub use pets::Pets;
pub use quests::Quests;
pub use rewards::{Grants, Reward, RewardSink, RewardTally, Wallet};
pub use skills::SkillTree;
pub use store::Store;

/// Why a gated operation refused to run. A rejection never mutates state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("unknown id {0}")]
    UnknownId(String),

    #[error("need {needed} coins, have {available}")]
    InsufficientCoins { needed: u64, available: u64 },

    #[error("need {needed} skill points, have {available}")]
    InsufficientSkillPoints { needed: u32, available: u32 },

    #[error("need {needed} {item}, have {available}")]
    MissingIngredient {
        item: String,
        needed: u32,
        available: u32,
    },

    #[error("requires {0}")]
    PrerequisiteUnmet(String),

    #[error("{0} is already owned")]
    AlreadyOwned(String),

    #[error("{0} is at max level")]
    MaxLevel(String),

    #[error("{0} is not unlocked")]
    NotUnlocked(String),

    #[error("reward already claimed today")]
    AlreadyClaimed,

    #[error("{0} is already started or finished")]
    AlreadyStarted(String),

    #[error("no {0} charges left")]
    NoCharges(String),

    #[error("{0} cannot be activated right now")]
    NotActivatable(String),
}

/// Something worth telling the player about
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    AchievementUnlocked { id: &'static str, reward: u64 },
    MissionCompleted { id: &'static str, reward: u64 },
    QuestCompleted { id: &'static str },
    ChallengeCompleted { id: u32, reward: u64 },
    PetLevelUp { pet: &'static str, level: u32 },
    DailyRewardClaimed { day: u32 },
    NewHighScore { rank: usize },
}

impl Notification {
    /// Sound to play when shown
    pub fn cue(&self) -> SoundCue {
        match self {
            Notification::AchievementUnlocked { .. }
            | Notification::MissionCompleted { .. }
            | Notification::QuestCompleted { .. }
            | Notification::ChallengeCompleted { .. } => SoundCue::Unlock,
            Notification::PetLevelUp { .. } => SoundCue::LevelUp,
            Notification::DailyRewardClaimed { .. } => SoundCue::Coin,
            Notification::NewHighScore { .. } => SoundCue::HighScore,
        }
    }
}

/// Statistics snapshot handed to every ledger after a run
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    /// The run that just ended
    pub run: &'a RunStats,
    /// Lifetime totals, already including `run`
    pub lifetime: &'a LifetimeStats,
    /// Some store upgrade is at its max level
    pub any_upgrade_maxed: bool,
    /// Every store character is owned
    pub all_characters_owned: bool,
}

/// Coin cost check shared by the purchase paths
pub(crate) fn ensure_coins(wallet: &Wallet, price: u64) -> Result<(), Rejection> {
    if wallet.coins < price {
        return Err(Rejection::InsufficientCoins {
            needed: price,
            available: wallet.coins,
        });
    }
    Ok(())
}
