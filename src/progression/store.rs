//! Coin store: levelled power-ups and upgrades, one-off characters

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::rewards::Wallet;
use super::Rejection;
use crate::persistence::Persisted;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSection {
    /// Raise power-up potency
    PowerUp,
    /// Permanent run upgrades
    Upgrade,
}

/// A store entry bought level by level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelledItem {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub section: StoreSection,
    pub base_price: f64,
    pub growth: f64,
    pub max_level: u32,
}

impl LevelledItem {
    /// Price of buying the level after `level`
    pub fn price_at(&self, level: u32) -> u64 {
        (self.base_price * self.growth.powi(level.saturating_sub(1) as i32)).floor() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price: u64,
    pub jump_multiplier: f32,
    pub speed_multiplier: f32,
    pub coin_multiplier: f32,
    pub shield_multiplier: f32,
}

pub static LEVELLED_ITEMS: &[LevelledItem] = &[
    LevelledItem {
        id: "magnet",
        name: "Coin Magnet",
        description: "Automatically attracts nearby coins",
        section: StoreSection::PowerUp,
        base_price: 100.0,
        growth: 1.5,
        max_level: 5,
    },
    LevelledItem {
        id: "shield",
        name: "Shield",
        description: "Protects from one hit",
        section: StoreSection::PowerUp,
        base_price: 150.0,
        growth: 1.8,
        max_level: 3,
    },
    LevelledItem {
        id: "slowTime",
        name: "Time Slow",
        description: "Slows down obstacles",
        section: StoreSection::PowerUp,
        base_price: 200.0,
        growth: 1.6,
        max_level: 4,
    },
    LevelledItem {
        id: "jumpBoost",
        name: "Jump Boost",
        description: "Increases jump height",
        section: StoreSection::Upgrade,
        base_price: 300.0,
        growth: 1.7,
        max_level: 5,
    },
    LevelledItem {
        id: "coinValue",
        name: "Coin Value",
        description: "Increases coins value",
        section: StoreSection::Upgrade,
        base_price: 250.0,
        growth: 1.6,
        max_level: 5,
    },
    LevelledItem {
        id: "speedMaster",
        name: "Speed Master",
        description: "Better control at high speeds",
        section: StoreSection::Upgrade,
        base_price: 400.0,
        growth: 2.0,
        max_level: 3,
    },
];

pub static CHARACTERS: &[CharacterDef] = &[
    CharacterDef {
        id: "ninja",
        name: "Ninja Dog",
        description: "Stealthy and quick",
        price: 1000,
        jump_multiplier: 1.2,
        speed_multiplier: 1.1,
        coin_multiplier: 1.0,
        shield_multiplier: 1.0,
    },
    CharacterDef {
        id: "spy",
        name: "Spy Dog",
        description: "Better at collecting coins",
        price: 1500,
        jump_multiplier: 1.0,
        speed_multiplier: 1.0,
        coin_multiplier: 1.3,
        shield_multiplier: 1.0,
    },
    CharacterDef {
        id: "robot",
        name: "Robo Dog",
        description: "More durable",
        price: 2000,
        jump_multiplier: 1.0,
        speed_multiplier: 1.0,
        coin_multiplier: 1.0,
        shield_multiplier: 1.5,
    },
];

pub fn levelled_item(id: &str) -> Option<&'static LevelledItem> {
    LEVELLED_ITEMS.iter().find(|i| i.id == id)
}

pub fn character(id: &str) -> Option<&'static CharacterDef> {
    CHARACTERS.iter().find(|c| c.id == id)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreRecord {
    pub levels: BTreeMap<String, u32>,
    pub characters: Vec<String>,
    pub selected: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    /// Only levels above 1 are stored
    levels: BTreeMap<&'static str, u32>,
    owned: BTreeSet<&'static str>,
    selected: Option<&'static str>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level; every item starts at 1
    pub fn level(&self, id: &str) -> u32 {
        self.levels.get(id).copied().unwrap_or(1)
    }

    /// Price of the next level, `None` at max level or for unknown ids
    pub fn next_price(&self, id: &str) -> Option<u64> {
        let item = levelled_item(id)?;
        let level = self.level(id);
        (level < item.max_level).then(|| item.price_at(level))
    }

    /// Buy the next level of a power-up or upgrade
    pub fn buy_level(&mut self, id: &str, wallet: &mut Wallet) -> Result<u32, Rejection> {
        let item = levelled_item(id).ok_or_else(|| Rejection::UnknownId(id.to_string()))?;
        let level = self.level(id);
        if level >= item.max_level {
            return Err(Rejection::MaxLevel(item.name.to_string()));
        }
        let price = item.price_at(level);
        wallet.spend(price)?;
        self.levels.insert(item.id, level + 1);
        log::info!("Bought {} level {} for {}", item.name, level + 1, price);
        Ok(level + 1)
    }

    pub fn owns(&self, id: &str) -> bool {
        self.owned.contains(id)
    }

    pub fn buy_character(&mut self, id: &str, wallet: &mut Wallet) -> Result<(), Rejection> {
        let def = character(id).ok_or_else(|| Rejection::UnknownId(id.to_string()))?;
        if self.owns(id) {
            return Err(Rejection::AlreadyOwned(def.name.to_string()));
        }
        wallet.spend(def.price)?;
        self.owned.insert(def.id);
        log::info!("Bought character {}", def.name);
        Ok(())
    }

    /// Pick an owned character, or `None` for the default dog
    pub fn select_character(&mut self, id: Option<&str>) -> Result<(), Rejection> {
        match id {
            None => self.selected = None,
            Some(id) => {
                let def = character(id).ok_or_else(|| Rejection::UnknownId(id.to_string()))?;
                if !self.owns(id) {
                    return Err(Rejection::NotUnlocked(def.name.to_string()));
                }
                self.selected = Some(def.id);
            }
        }
        Ok(())
    }

    pub fn selected_character(&self) -> Option<&'static CharacterDef> {
        self.selected.and_then(character)
    }

    pub fn any_upgrade_maxed(&self) -> bool {
        LEVELLED_ITEMS
            .iter()
            .filter(|i| i.section == StoreSection::Upgrade)
            .any(|i| self.level(i.id) >= i.max_level)
    }

    pub fn all_characters_owned(&self) -> bool {
        CHARACTERS.iter().all(|c| self.owns(c.id))
    }

    // === Potency ===

    /// Magnet effect radius
    pub fn magnet_radius(&self) -> f32 {
        100.0 + (self.level("magnet") - 1) as f32 * 20.0
    }

    /// Hits the shield effect absorbs
    pub fn shield_hits(&self) -> u8 {
        self.level("shield").min(u8::MAX as u32) as u8
    }

    /// Time scale while the time-slow effect runs
    pub fn slow_time_scale(&self) -> f32 {
        (0.5 - (self.level("slowTime") - 1) as f32 * 0.05).max(0.3)
    }

    /// Jump force with the jump boost upgrade
    pub fn jump_force(&self, base: f32) -> f32 {
        match self.level("jumpBoost") {
            1 => base,
            level => 15.0 + level as f32 * 2.0,
        }
    }

    pub fn coin_multiplier(&self) -> f32 {
        match self.level("coinValue") {
            1 => 1.0,
            level => 1.0 + level as f32 * 0.2,
        }
    }

    /// Share of level-event obstacle speed cancelled
    pub fn control_bonus(&self) -> f32 {
        match self.level("speedMaster") {
            1 => 0.0,
            level => level as f32 * 0.2,
        }
    }
}

impl Persisted for Store {
    type Record = StoreRecord;

    const STORAGE_KEY: &'static str = "sneak_dog_store";

    fn to_record(&self) -> Self::Record {
        StoreRecord {
            levels: self
                .levels
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            characters: self.owned.iter().map(|s| s.to_string()).collect(),
            selected: self.selected.map(str::to_string),
        }
    }

    fn apply_record(&mut self, record: Self::Record) {
        self.levels = record
            .levels
            .iter()
            .filter_map(|(id, lvl)| {
                levelled_item(id).map(|i| (i.id, (*lvl).clamp(1, i.max_level)))
            })
            .collect();
        self.owned = record
            .characters
            .iter()
            .filter_map(|id| character(id).map(|c| c.id))
            .collect();
        self.selected = record
            .selected
            .as_deref()
            .filter(|id| self.owns(id))
            .and_then(|id| character(id).map(|c| c.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;

    #[test]
    fn test_exponential_prices() {
        let store = Store::new();
        assert_eq!(store.next_price("magnet"), Some(100));
        let magnet = levelled_item("magnet").unwrap();
        assert_eq!(magnet.price_at(2), 150);
        assert_eq!(magnet.price_at(3), 225);
        assert_eq!(levelled_item("shield").unwrap().price_at(2), 270);
        assert_eq!(store.next_price("nothing"), None);
    }

    #[test]
    fn test_buy_level_deducts_and_levels() {
        let mut store = Store::new();
        let mut wallet = Wallet { coins: 150 };
        assert_eq!(store.buy_level("magnet", &mut wallet), Ok(2));
        assert_eq!(wallet.coins, 50);
        assert_eq!(store.magnet_radius(), 120.0);

        let before = store.clone();
        assert!(matches!(
            store.buy_level("magnet", &mut wallet),
            Err(Rejection::InsufficientCoins { needed: 150, available: 50 })
        ));
        assert_eq!(store, before);
        assert_eq!(wallet.coins, 50);
    }

    #[test]
    fn test_max_level_rejected() {
        let mut store = Store::new();
        let mut wallet = Wallet { coins: 100_000 };
        store.buy_level("shield", &mut wallet).unwrap();
        store.buy_level("shield", &mut wallet).unwrap();
        assert_eq!(store.shield_hits(), 3);
        let coins = wallet.coins;
        assert!(matches!(store.buy_level("shield", &mut wallet), Err(Rejection::MaxLevel(_))));
        assert_eq!(wallet.coins, coins);
        assert_eq!(store.next_price("shield"), None);
    }

    #[test]
    fn test_upgrade_effects() {
        let mut store = Store::new();
        let mut wallet = Wallet { coins: 100_000 };
        assert_eq!(store.jump_force(15.0), 15.0);
        assert_eq!(store.coin_multiplier(), 1.0);
        store.buy_level("jumpBoost", &mut wallet).unwrap();
        store.buy_level("coinValue", &mut wallet).unwrap();
        store.buy_level("speedMaster", &mut wallet).unwrap();
        assert_eq!(store.jump_force(15.0), 19.0);
        assert!((store.coin_multiplier() - 1.4).abs() < 1e-6);
        assert!((store.control_bonus() - 0.4).abs() < 1e-6);
        assert!(!store.any_upgrade_maxed());
        store.buy_level("speedMaster", &mut wallet).unwrap();
        assert!(store.any_upgrade_maxed());
    }

    #[test]
    fn test_slow_time_floor() {
        let mut store = Store::new();
        let mut wallet = Wallet { coins: 100_000 };
        for _ in 0..3 {
            store.buy_level("slowTime", &mut wallet).unwrap();
        }
        assert!((store.slow_time_scale() - 0.35).abs() < 1e-6);
    }

    #[test]
    fn test_characters() {
        let mut store = Store::new();
        let mut wallet = Wallet { coins: 1200 };
        assert!(matches!(store.select_character(Some("ninja")), Err(Rejection::NotUnlocked(_))));
        store.buy_character("ninja", &mut wallet).unwrap();
        assert_eq!(wallet.coins, 200);
        assert!(matches!(
            store.buy_character("ninja", &mut wallet),
            Err(Rejection::AlreadyOwned(_))
        ));
        assert!(store.buy_character("spy", &mut wallet).is_err());
        assert_eq!(wallet.coins, 200);
        store.select_character(Some("ninja")).unwrap();
        assert_eq!(store.selected_character().map(|c| c.id), Some("ninja"));
        assert!(!store.all_characters_owned());
    }

    #[test]
    fn test_roundtrip() {
        let mut storage = MemoryStorage::new();
        let mut store = Store::new();
        let mut wallet = Wallet { coins: 10_000 };
        store.buy_level("magnet", &mut wallet).unwrap();
        store.buy_character("robot", &mut wallet).unwrap();
        store.select_character(Some("robot")).unwrap();
        store.save(&mut storage).unwrap();

        let mut loaded = Store::new();
        assert!(loaded.load(&storage));
        assert_eq!(loaded, store);
    }
}
