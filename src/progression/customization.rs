//! Cosmetics: unlocked with coins, one equipped per slot

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::Rejection;
use super::rewards::Wallet;
use crate::persistence::Persisted;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Hat,
    Accessory,
    Outfit,
    Effect,
}

/// Stat bonuses in percent
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CosmeticStats {
    pub coin_bonus: f32,
    pub exp_bonus: f32,
    pub charm: f32,
    pub style: f32,
    pub stealth: f32,
    pub speed: f32,
    pub jump_height: f32,
    pub luck: f32,
}

impl CosmeticStats {
    const NONE: Self = Self {
        coin_bonus: 0.0,
        exp_bonus: 0.0,
        charm: 0.0,
        style: 0.0,
        stealth: 0.0,
        speed: 0.0,
        jump_height: 0.0,
        luck: 0.0,
    };

    fn add(&mut self, other: &Self) {
        self.coin_bonus += other.coin_bonus;
        self.exp_bonus += other.exp_bonus;
        self.charm += other.charm;
        self.style += other.style;
        self.stealth += other.stealth;
        self.speed += other.speed;
        self.jump_height += other.jump_height;
        self.luck += other.luck;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosmeticDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub slot: Slot,
    pub cost: u64,
    pub stats: CosmeticStats,
}

const NONE: CosmeticStats = CosmeticStats::NONE;

pub static COSMETICS: &[CosmeticDef] = &[
    CosmeticDef {
        id: "party_hat",
        name: "Party Hat",
        description: "A festive party hat",
        slot: Slot::Hat,
        cost: 500,
        stats: CosmeticStats {
            coin_bonus: 5.0,
            ..NONE
        },
    },
    CosmeticDef {
        id: "crown",
        name: "Royal Crown",
        description: "A majestic golden crown",
        slot: Slot::Hat,
        cost: 2000,
        stats: CosmeticStats {
            exp_bonus: 10.0,
            ..NONE
        },
    },
    CosmeticDef {
        id: "bowtie",
        name: "Fancy Bowtie",
        description: "A stylish bowtie",
        slot: Slot::Accessory,
        cost: 300,
        stats: CosmeticStats {
            charm: 5.0,
            ..NONE
        },
    },
    CosmeticDef {
        id: "glasses",
        name: "Cool Shades",
        description: "Trendy sunglasses",
        slot: Slot::Accessory,
        cost: 800,
        stats: CosmeticStats {
            style: 10.0,
            ..NONE
        },
    },
    CosmeticDef {
        id: "ninja_suit",
        name: "Ninja Suit",
        description: "Stealthy ninja outfit",
        slot: Slot::Outfit,
        cost: 1500,
        stats: CosmeticStats {
            stealth: 15.0,
            speed: 10.0,
            ..NONE
        },
    },
    CosmeticDef {
        id: "space_suit",
        name: "Space Suit",
        description: "Cosmic space explorer suit",
        slot: Slot::Outfit,
        cost: 2500,
        stats: CosmeticStats {
            jump_height: 20.0,
            style: 15.0,
            ..NONE
        },
    },
    CosmeticDef {
        id: "sparkles",
        name: "Sparkle Trail",
        description: "Leave a trail of sparkles",
        slot: Slot::Effect,
        cost: 1000,
        stats: CosmeticStats {
            charm: 10.0,
            ..NONE
        },
    },
    CosmeticDef {
        id: "rainbow",
        name: "Rainbow Aura",
        description: "Emit a rainbow aura",
        slot: Slot::Effect,
        cost: 3000,
        stats: CosmeticStats {
            luck: 20.0,
            charm: 15.0,
            ..NONE
        },
    },
];

pub fn cosmetic(id: &str) -> Option<&'static CosmeticDef> {
    COSMETICS.iter().find(|c| c.id == id)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomizationRecord {
    pub equipped: BTreeMap<Slot, String>,
    pub unlocked: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Customization {
    equipped: BTreeMap<Slot, &'static str>,
    unlocked: BTreeSet<&'static str>,
}

impl Customization {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains(id)
    }

    pub fn equipped(&self, slot: Slot) -> Option<&'static CosmeticDef> {
        self.equipped.get(&slot).and_then(|id| cosmetic(id))
    }

    pub fn unlock(&mut self, id: &str, wallet: &mut Wallet) -> Result<(), Rejection> {
        let def = cosmetic(id).ok_or_else(|| Rejection::UnknownId(id.to_string()))?;
        if self.is_unlocked(id) {
            return Err(Rejection::AlreadyOwned(def.name.to_string()));
        }
        wallet.spend(def.cost)?;
        self.unlocked.insert(def.id);
        log::info!("Unlocked cosmetic {}", def.name);
        Ok(())
    }

    /// Equip an unlocked item in its slot, or take it off if it is already on.
    /// Returns whether the item is now equipped.
    pub fn toggle(&mut self, id: &str) -> Result<bool, Rejection> {
        let def = cosmetic(id).ok_or_else(|| Rejection::UnknownId(id.to_string()))?;
        if !self.is_unlocked(id) {
            return Err(Rejection::NotUnlocked(def.name.to_string()));
        }
        if self.equipped.get(&def.slot) == Some(&def.id) {
            self.equipped.remove(&def.slot);
            Ok(false)
        } else {
            self.equipped.insert(def.slot, def.id);
            Ok(true)
        }
    }

    /// Sum of the equipped items' stats
    pub fn total_stats(&self) -> CosmeticStats {
        let mut total = CosmeticStats::default();
        for def in self.equipped.values().filter_map(|id| cosmetic(id)) {
            total.add(&def.stats);
        }
        total
    }
}

impl Persisted for Customization {
    type Record = CustomizationRecord;

    const STORAGE_KEY: &'static str = "sneak_dog_customization";

    fn to_record(&self) -> Self::Record {
        CustomizationRecord {
            equipped: self
                .equipped
                .iter()
                .map(|(slot, id)| (*slot, id.to_string()))
                .collect(),
            unlocked: self.unlocked.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn apply_record(&mut self, record: Self::Record) {
        self.unlocked = record
            .unlocked
            .iter()
            .filter_map(|id| cosmetic(id).map(|c| c.id))
            .collect();
        // Equipped items must be unlocked and sit in their own slot
        self.equipped = record
            .equipped
            .iter()
            .filter_map(|(slot, id)| cosmetic(id).filter(|c| c.slot == *slot))
            .filter(|c| self.unlocked.contains(c.id))
            .map(|c| (c.slot, c.id))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{MemoryStorage, Storage};

    #[test]
    fn test_unlock_costs_coins_once() {
        let mut custom = Customization::new();
        let mut wallet = Wallet { coins: 600 };
        custom.unlock("party_hat", &mut wallet).unwrap();
        assert_eq!(wallet.coins, 100);
        assert!(matches!(
            custom.unlock("party_hat", &mut wallet),
            Err(Rejection::AlreadyOwned(_))
        ));
        assert!(matches!(
            custom.unlock("bowtie", &mut wallet),
            Err(Rejection::InsufficientCoins { .. })
        ));
        assert!(!custom.is_unlocked("bowtie"));
        assert_eq!(wallet.coins, 100);
    }

    #[test]
    fn test_toggle_one_per_slot() {
        let mut custom = Customization::new();
        let mut wallet = Wallet { coins: 10_000 };
        assert!(matches!(custom.toggle("crown"), Err(Rejection::NotUnlocked(_))));
        custom.unlock("party_hat", &mut wallet).unwrap();
        custom.unlock("crown", &mut wallet).unwrap();

        assert_eq!(custom.toggle("party_hat"), Ok(true));
        assert_eq!(custom.toggle("crown"), Ok(true));
        assert_eq!(custom.equipped(Slot::Hat).map(|c| c.id), Some("crown"));
        assert_eq!(custom.toggle("crown"), Ok(false));
        assert!(custom.equipped(Slot::Hat).is_none());
    }

    #[test]
    fn test_total_stats() {
        let mut custom = Customization::new();
        let mut wallet = Wallet { coins: 10_000 };
        for id in ["ninja_suit", "rainbow", "bowtie"] {
            custom.unlock(id, &mut wallet).unwrap();
            custom.toggle(id).unwrap();
        }
        let stats = custom.total_stats();
        assert_eq!(stats.speed, 10.0);
        assert_eq!(stats.luck, 20.0);
        assert_eq!(stats.charm, 20.0);
        assert_eq!(stats.coin_bonus, 0.0);
    }

    #[test]
    fn test_roundtrip() {
        let mut storage = MemoryStorage::new();
        let mut custom = Customization::new();
        let mut wallet = Wallet { coins: 10_000 };
        custom.unlock("glasses", &mut wallet).unwrap();
        custom.unlock("sparkles", &mut wallet).unwrap();
        custom.toggle("glasses").unwrap();
        custom.save(&mut storage).unwrap();

        let mut loaded = Customization::new();
        assert!(loaded.load(&storage));
        assert_eq!(loaded, custom);
    }

    #[test]
    fn test_equipped_but_locked_is_dropped() {
        let mut storage = MemoryStorage::new();
        storage.set_item(
            Customization::STORAGE_KEY,
            r#"{"version":1,"data":{"equipped":{"hat":"crown"},"unlocked":[]}}"#,
        );
        let mut custom = Customization::new();
        custom.load(&storage);
        assert!(custom.equipped(Slot::Hat).is_none());
    }
}
