//! Pet companions: one active pet gains experience from runs

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::rewards::Wallet;
use super::{Notification, Rejection};
use crate::persistence::Persisted;

pub const PET_MAX_LEVEL: u32 = 10;
/// Owned from the start
pub const STARTER_PET: &str = "basic_puppy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetAbility {
    /// Collectible spawn rate, percent
    CoinFinder,
    /// Movement speed, percent
    SpeedBoost,
    /// Damage reduction, percent
    DamageShield,
    /// Rare item rate, percent
    LuckBoost,
    /// Power-up duration, percent
    PowerupBoost,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PetDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub cost: u64,
    pub ability: PetAbility,
    pub base_value: f32,
    pub level_multiplier: f32,
}

pub static PETS: &[PetDef] = &[
    PetDef {
        id: "basic_puppy",
        name: "Basic Puppy",
        description: "A loyal companion who helps find coins",
        cost: 0,
        ability: PetAbility::CoinFinder,
        base_value: 10.0,
        level_multiplier: 5.0,
    },
    PetDef {
        id: "speed_cat",
        name: "Speed Cat",
        description: "A quick feline that boosts your running speed",
        cost: 1000,
        ability: PetAbility::SpeedBoost,
        base_value: 5.0,
        level_multiplier: 3.0,
    },
    PetDef {
        id: "shield_turtle",
        name: "Shield Turtle",
        description: "A protective turtle that helps avoid damage",
        cost: 2000,
        ability: PetAbility::DamageShield,
        base_value: 10.0,
        level_multiplier: 4.0,
    },
    PetDef {
        id: "lucky_rabbit",
        name: "Lucky Rabbit",
        description: "A fortunate rabbit that brings better rewards",
        cost: 3000,
        ability: PetAbility::LuckBoost,
        base_value: 5.0,
        level_multiplier: 3.0,
    },
    PetDef {
        id: "power_hamster",
        name: "Power Hamster",
        description: "A strong hamster that enhances power-ups",
        cost: 4000,
        ability: PetAbility::PowerupBoost,
        base_value: 10.0,
        level_multiplier: 5.0,
    },
];

pub fn pet(id: &str) -> Option<&'static PetDef> {
    PETS.iter().find(|p| p.id == id)
}

/// Total experience needed to reach `level`
pub fn experience_for_level(level: u32) -> u64 {
    (100.0 * (level as f64).powf(1.5)).floor() as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PetProgress {
    pub level: u32,
    /// Cumulative
    pub experience: u64,
}

impl Default for PetProgress {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PetsRecord {
    pub active: Option<String>,
    pub unlocked: Vec<String>,
    pub progress: BTreeMap<String, PetProgress>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pets {
    active: Option<&'static str>,
    unlocked: BTreeSet<&'static str>,
    progress: BTreeMap<&'static str, PetProgress>,
}

impl Default for Pets {
    fn default() -> Self {
        Self {
            active: Some(STARTER_PET),
            unlocked: BTreeSet::from([STARTER_PET]),
            progress: BTreeMap::new(),
        }
    }
}

impl Pets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains(id)
    }

    pub fn progress(&self, id: &str) -> PetProgress {
        self.progress.get(id).copied().unwrap_or_default()
    }

    pub fn active(&self) -> Option<&'static PetDef> {
        self.active.and_then(pet)
    }

    pub fn unlock(&mut self, id: &str, wallet: &mut Wallet) -> Result<(), Rejection> {
        let def = pet(id).ok_or_else(|| Rejection::UnknownId(id.to_string()))?;
        if self.is_unlocked(id) {
            return Err(Rejection::AlreadyOwned(def.name.to_string()));
        }
        wallet.spend(def.cost)?;
        self.unlocked.insert(def.id);
        log::info!("Unlocked pet {}", def.name);
        Ok(())
    }

    pub fn select(&mut self, id: &str) -> Result<(), Rejection> {
        let def = pet(id).ok_or_else(|| Rejection::UnknownId(id.to_string()))?;
        if !self.is_unlocked(id) {
            return Err(Rejection::NotUnlocked(def.name.to_string()));
        }
        self.active = Some(def.id);
        Ok(())
    }

    /// Feed experience to the active pet, levelling it as far as it goes
    pub fn gain_experience(&mut self, amount: u64) -> Vec<Notification> {
        let Some(id) = self.active else {
            return Vec::new();
        };
        let entry = self.progress.entry(id).or_default();
        if entry.level >= PET_MAX_LEVEL {
            return Vec::new();
        }
        entry.experience += amount;

        let mut notes = Vec::new();
        while entry.level < PET_MAX_LEVEL && entry.experience >= experience_for_level(entry.level + 1) {
            entry.level += 1;
            log::info!("Pet {} reached level {}", id, entry.level);
            notes.push(Notification::PetLevelUp {
                pet: id,
                level: entry.level,
            });
        }
        notes
    }

    /// Ability value of a pet: `base + (level - 1) * multiplier`
    pub fn ability_value(&self, id: &str) -> f32 {
        let Some(def) = pet(id) else {
            return 0.0;
        };
        def.base_value + (self.progress(id).level - 1) as f32 * def.level_multiplier
    }

    /// Value of `ability` if the active pet has it, else 0
    pub fn active_bonus(&self, ability: PetAbility) -> f32 {
        match self.active() {
            Some(def) if def.ability == ability => self.ability_value(def.id),
            _ => 0.0,
        }
    }
}

impl Persisted for Pets {
    type Record = PetsRecord;

    const STORAGE_KEY: &'static str = "sneak_dog_pets";

    fn to_record(&self) -> Self::Record {
        PetsRecord {
            active: self.active.map(str::to_string),
            unlocked: self.unlocked.iter().map(|s| s.to_string()).collect(),
            progress: self
                .progress
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    fn apply_record(&mut self, record: Self::Record) {
        let mut unlocked: BTreeSet<&'static str> = record
            .unlocked
            .iter()
            .filter_map(|id| pet(id).map(|p| p.id))
            .collect();
        unlocked.insert(STARTER_PET);
        self.active = record
            .active
            .as_deref()
            .and_then(pet)
            .map(|p| p.id)
            .filter(|id| unlocked.contains(id))
            .or(Some(STARTER_PET));
        self.unlocked = unlocked;
        self.progress = record
            .progress
            .iter()
            .filter_map(|(id, p)| {
                pet(id).map(|def| {
                    (
                        def.id,
                        PetProgress {
                            level: p.level.clamp(1, PET_MAX_LEVEL),
                            experience: p.experience,
                        },
                    )
                })
            })
            .collect();
    }
}
