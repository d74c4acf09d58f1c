//! Skill tree bought with skill points

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::Rejection;
use crate::persistence::Persisted;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Movement,
    Combat,
    Collection,
    Survival,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: SkillCategory,
    pub max_level: u32,
    pub base_value: f32,
    pub level_multiplier: f32,
    /// Skill points per level
    pub cost: u32,
    /// Skills that must be unlocked first
    pub requires: &'static [&'static str],
}

#[allow(clippy::too_many_arguments)]
const fn skill(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: SkillCategory,
    max_level: u32,
    base_value: f32,
    level_multiplier: f32,
    cost: u32,
    requires: &'static [&'static str],
) -> SkillDef {
    SkillDef {
        id,
        name,
        description,
        category,
        max_level,
        base_value,
        level_multiplier,
        cost,
        requires,
    }
}

use SkillCategory::{Collection, Combat, Movement, Survival};

pub static SKILLS: &[SkillDef] = &[
    skill("agility", "Agility", "Increase movement speed by {value}%", Movement, 5, 5.0, 3.0, 1, &[]),
    skill("double_jump", "Double Jump", "Perform a second jump in mid-air", Movement, 1, 1.0, 0.0, 2, &["agility"]),
    skill("wall_slide", "Wall Slide", "Slide down walls slowly", Movement, 1, 1.0, 0.0, 2, &["double_jump"]),
    skill("strength", "Strength", "Increase damage dealt by {value}%", Combat, 5, 10.0, 5.0, 1, &[]),
    skill("dash_attack", "Dash Attack", "Perform a quick dash attack", Combat, 3, 20.0, 10.0, 2, &["strength"]),
    skill("counter", "Counter", "Counter enemy attacks with perfect timing", Combat, 1, 1.0, 0.0, 3, &["dash_attack"]),
    skill("treasure_hunter", "Treasure Hunter", "Increase coin collection range by {value}%", Collection, 5, 10.0, 5.0, 1, &[]),
    skill("magnet_field", "Magnet Field", "Automatically attract nearby coins", Collection, 3, 50.0, 25.0, 2, &["treasure_hunter"]),
    skill("lucky_find", "Lucky Find", "Chance to find rare items", Collection, 3, 5.0, 5.0, 2, &["magnet_field"]),
    skill("vitality", "Vitality", "Increase max health by {value}%", Survival, 5, 10.0, 5.0, 1, &[]),
    skill("regeneration", "Regeneration", "Slowly regenerate health over time", Survival, 3, 1.0, 0.5, 2, &["vitality"]),
    skill("shield_master", "Shield Master", "Chance to block incoming damage", Survival, 3, 10.0, 5.0, 2, &["regeneration"]),
];

pub fn skill_def(id: &str) -> Option<&'static SkillDef> {
    SKILLS.iter().find(|s| s.id == id)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillRecord {
    pub skill_points: u32,
    pub unlocked: Vec<String>,
    pub levels: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillTree {
    pub skill_points: u32,
    unlocked: BTreeSet<&'static str>,
    levels: BTreeMap<&'static str, u32>,
}

impl SkillTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_skill_points(&mut self, amount: u32) {
        self.skill_points = self.skill_points.saturating_add(amount);
    }

    pub fn level(&self, id: &str) -> u32 {
        self.levels.get(id).copied().unwrap_or(0)
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains(id)
    }

    /// Every prerequisite is unlocked
    pub fn is_available(&self, id: &str) -> bool {
        skill_def(id).is_some_and(|s| s.requires.iter().all(|r| self.is_unlocked(r)))
    }

    /// Spend points for the next level of a skill
    pub fn upgrade(&mut self, id: &str) -> Result<u32, Rejection> {
        let def = skill_def(id).ok_or_else(|| Rejection::UnknownId(id.to_string()))?;
        let level = self.level(id);
        if level >= def.max_level {
            return Err(Rejection::MaxLevel(def.name.to_string()));
        }
        if let Some(missing) = def.requires.iter().find(|r| !self.is_unlocked(r)) {
            return Err(Rejection::PrerequisiteUnmet(missing.to_string()));
        }
        if self.skill_points < def.cost {
            return Err(Rejection::InsufficientSkillPoints {
                needed: def.cost,
                available: self.skill_points,
            });
        }

        self.skill_points -= def.cost;
        self.unlocked.insert(def.id);
        self.levels.insert(def.id, level + 1);
        log::info!("Skill {} upgraded to level {}", def.name, level + 1);
        Ok(level + 1)
    }

    /// Effective value: `base + (level - 1) * multiplier`, 0 while locked
    pub fn value(&self, id: &str) -> f32 {
        let Some(def) = skill_def(id) else {
            return 0.0;
        };
        let level = self.level(id);
        if !self.is_unlocked(id) || level == 0 {
            return 0.0;
        }
        def.base_value + (level - 1) as f32 * def.level_multiplier
    }
}

impl Persisted for SkillTree {
    type Record = SkillRecord;

    const STORAGE_KEY: &'static str = "sneak_dog_skills";

    fn to_record(&self) -> Self::Record {
        SkillRecord {
            skill_points: self.skill_points,
            unlocked: self.unlocked.iter().map(|s| s.to_string()).collect(),
            levels: self
                .levels
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    fn apply_record(&mut self, record: Self::Record) {
        self.skill_points = record.skill_points;
        self.unlocked = record
            .unlocked
            .iter()
            .filter_map(|id| skill_def(id).map(|s| s.id))
            .collect();
        self.levels = record
            .levels
            .iter()
            .filter_map(|(id, lvl)| skill_def(id).map(|s| (s.id, (*lvl).min(s.max_level))))
            .collect();
    }
}
