//! Crafting: ingredient inventory, recipes, power-up charges and equipment

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::Rejection;
use super::items;
use crate::persistence::Persisted;
use crate::sim::EffectKind;

/// Permanent crafted gear
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    /// Boots slot: one extra jump in the air
    DoubleJumpBoots,
    /// Accessory slot: more luck
    LuckyCharm,
}

/// Luck multiplier granted by the lucky charm
pub const LUCKY_CHARM_LUCK: f32 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeOutput {
    /// One stored activation of a power-up
    Charge(EffectKind),
    Equip(Equipment),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ingredient {
    pub item: &'static str,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipe {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub ingredients: &'static [Ingredient],
    pub output: RecipeOutput,
}

const fn ing(item: &'static str, count: u32) -> Ingredient {
    Ingredient { item, count }
}

pub static RECIPES: &[Recipe] = &[
    Recipe {
        id: "speed_boost",
        name: "Speed Boost",
        description: "Temporarily increases movement speed",
        ingredients: &[ing("energy_crystal", 2), ing("swift_feather", 1)],
        output: RecipeOutput::Charge(EffectKind::SpeedBoost),
    },
    Recipe {
        id: "shield_potion",
        name: "Shield Potion",
        description: "Provides temporary invincibility",
        ingredients: &[ing("protection_gem", 2), ing("magic_essence", 1)],
        output: RecipeOutput::Charge(EffectKind::Shield),
    },
    Recipe {
        id: "coin_magnet",
        name: "Coin Magnet",
        description: "Attracts nearby coins",
        ingredients: &[ing("magnetic_ore", 2), ing("gold_dust", 1)],
        output: RecipeOutput::Charge(EffectKind::Magnet),
    },
    Recipe {
        id: "double_jump",
        name: "Double Jump Boots",
        description: "Allows performing a double jump",
        ingredients: &[ing("cloud_essence", 2), ing("spring_core", 1)],
        output: RecipeOutput::Equip(Equipment::DoubleJumpBoots),
    },
    Recipe {
        id: "lucky_charm",
        name: "Lucky Charm",
        description: "Increases rare item drop rate",
        ingredients: &[ing("fortune_crystal", 2), ing("rainbow_shard", 1)],
        output: RecipeOutput::Equip(Equipment::LuckyCharm),
    },
];

pub fn recipe(id: &str) -> Option<&'static Recipe> {
    RECIPES.iter().find(|r| r.id == id)
}

/// Persisted crafting state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CraftingRecord {
    pub inventory: BTreeMap<String, u32>,
    pub charges: BTreeMap<EffectKind, u32>,
    pub equipment: Vec<Equipment>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Crafting {
    inventory: BTreeMap<String, u32>,
    charges: BTreeMap<EffectKind, u32>,
    equipment: BTreeSet<Equipment>,
}

impl Crafting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, item: &str) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    pub fn inventory(&self) -> impl Iterator<Item = (&str, u32)> {
        self.inventory.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Add catalog items. Returns false (and adds nothing) for unknown ids.
    pub fn add_item(&mut self, item: &str, count: u32) -> bool {
        if !items::is_known(item) {
            return false;
        }
        if count > 0 {
            *self.inventory.entry(item.to_string()).or_insert(0) += count;
        }
        true
    }

    /// Remove `count` of an item, or nothing if there are fewer
    pub fn remove_item(&mut self, item: &str, count: u32) -> Result<(), Rejection> {
        let available = self.count(item);
        if available < count {
            return Err(Rejection::MissingIngredient {
                item: item.to_string(),
                needed: count,
                available,
            });
        }
        let left = available - count;
        if left == 0 {
            self.inventory.remove(item);
        } else {
            self.inventory.insert(item.to_string(), left);
        }
        Ok(())
    }

    /// First ingredient that is short, if any
    fn missing(&self, recipe: &Recipe) -> Option<Rejection> {
        recipe.ingredients.iter().find_map(|ing| {
            let available = self.count(ing.item);
            (available < ing.count).then(|| Rejection::MissingIngredient {
                item: ing.item.to_string(),
                needed: ing.count,
                available,
            })
        })
    }

    pub fn can_craft(&self, id: &str) -> bool {
        self.check(id).is_ok()
    }

    fn check(&self, id: &str) -> Result<&'static Recipe, Rejection> {
        let recipe = recipe(id).ok_or_else(|| Rejection::UnknownId(id.to_string()))?;
        if matches!(recipe.output, RecipeOutput::Equip(gear) if self.equipment.contains(&gear)) {
            return Err(Rejection::AlreadyOwned(recipe.name.to_string()));
        }
        match self.missing(recipe) {
            Some(rejection) => Err(rejection),
            None => Ok(recipe),
        }
    }

    /// Consume every ingredient and produce the output, or change nothing
    pub fn craft(&mut self, id: &str) -> Result<RecipeOutput, Rejection> {
        let recipe = self.check(id)?;
        for ing in recipe.ingredients {
            self.remove_item(ing.item, ing.count)?;
        }
        match recipe.output {
            RecipeOutput::Charge(kind) => *self.charges.entry(kind).or_insert(0) += 1,
            RecipeOutput::Equip(gear) => {
                self.equipment.insert(gear);
            }
        }
        log::info!("Crafted {}", recipe.name);
        Ok(recipe.output)
    }

    pub fn charges(&self, kind: EffectKind) -> u32 {
        self.charges.get(&kind).copied().unwrap_or(0)
    }

    /// Spend one stored activation
    pub fn consume_charge(&mut self, kind: EffectKind) -> Result<(), Rejection> {
        match self.charges.get_mut(&kind) {
            Some(n) if *n > 0 => {
                *n -= 1;
                if *n == 0 {
                    self.charges.remove(&kind);
                }
                Ok(())
            }
            _ => Err(Rejection::NoCharges(kind.name().to_string())),
        }
    }

    pub fn has_equipment(&self, gear: Equipment) -> bool {
        self.equipment.contains(&gear)
    }

    /// Luck multiplier from equipment
    pub fn luck_multiplier(&self) -> f32 {
        if self.has_equipment(Equipment::LuckyCharm) {
            LUCKY_CHARM_LUCK
        } else {
            1.0
        }
    }
}

impl Persisted for Crafting {
    type Record = CraftingRecord;

    const STORAGE_KEY: &'static str = "sneak_dog_crafting";

    fn to_record(&self) -> Self::Record {
        CraftingRecord {
            inventory: self.inventory.clone(),
            charges: self.charges.clone(),
            equipment: self.equipment.iter().copied().collect(),
        }
    }

    fn apply_record(&mut self, record: Self::Record) {
        self.inventory = record
            .inventory
            .into_iter()
            .filter(|(id, n)| {
                let known = items::is_known(id);
                if !known {
                    log::warn!("Dropping unknown stored item {}", id);
                }
                known && *n > 0
            })
            .collect();
        self.charges = record.charges.into_iter().filter(|(_, n)| *n > 0).collect();
        self.equipment = record.equipment.into_iter().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;

    fn stocked() -> Crafting {
        let mut c = Crafting::new();
        c.add_item("energy_crystal", 2);
        c.add_item("swift_feather", 1);
        c
    }

    #[test]
    fn test_craft_consumes_exact_ingredients() {
        let mut c = stocked();
        c.add_item("energy_crystal", 1);
        assert_eq!(c.craft("speed_boost"), Ok(RecipeOutput::Charge(EffectKind::SpeedBoost)));
        assert_eq!(c.count("energy_crystal"), 1);
        assert_eq!(c.count("swift_feather"), 0);
        assert_eq!(c.charges(EffectKind::SpeedBoost), 1);
    }

    #[test]
    fn test_craft_short_changes_nothing() {
        let mut c = Crafting::new();
        c.add_item("energy_crystal", 2);
        let before = c.clone();
        assert!(matches!(
            c.craft("speed_boost"),
            Err(Rejection::MissingIngredient { needed: 1, available: 0, .. })
        ));
        assert_eq!(c, before);
        assert_eq!(c.craft("nope"), Err(Rejection::UnknownId("nope".into())));
    }

    #[test]
    fn test_equipment_crafted_once() {
        let mut c = Crafting::new();
        c.add_item("cloud_essence", 4);
        c.add_item("spring_core", 2);
        assert!(c.craft("double_jump").is_ok());
        assert!(c.has_equipment(Equipment::DoubleJumpBoots));
        assert!(matches!(c.craft("double_jump"), Err(Rejection::AlreadyOwned(_))));
        assert_eq!(c.count("cloud_essence"), 2);
    }

    #[test]
    fn test_consume_charge() {
        let mut c = stocked();
        assert!(c.consume_charge(EffectKind::SpeedBoost).is_err());
        c.craft("speed_boost").unwrap();
        assert!(c.consume_charge(EffectKind::SpeedBoost).is_ok());
        assert_eq!(c.charges(EffectKind::SpeedBoost), 0);
    }

    #[test]
    fn test_unknown_items_rejected() {
        let mut c = Crafting::new();
        assert!(!c.add_item("bone", 3));
        assert_eq!(c.count("bone"), 0);
        assert!(c.remove_item("gold_dust", 1).is_err());
    }

    #[test]
    fn test_roundtrip() {
        let mut storage = MemoryStorage::new();
        let mut c = stocked();
        c.add_item("fortune_crystal", 2);
        c.add_item("rainbow_shard", 1);
        c.craft("lucky_charm").unwrap();
        c.save(&mut storage).unwrap();

        let mut loaded = Crafting::new();
        assert!(loaded.load(&storage));
        assert_eq!(loaded, c);
        assert_eq!(loaded.luck_multiplier(), LUCKY_CHARM_LUCK);
    }
}
