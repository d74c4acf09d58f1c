//! Coins and the reward-granting surface every ledger pays out through

use serde::{Deserialize, Serialize};

use super::Rejection;
use super::crafting::Crafting;
use super::skills::SkillTree;
use crate::persistence::Persisted;

/// One piece of a reward bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reward {
    Coins(u64),
    SkillPoints(u32),
    Item { id: &'static str, count: u32 },
}

/// Receives rewards from ledgers
pub trait RewardSink {
    fn add_coins(&mut self, amount: u64);
    fn add_skill_points(&mut self, amount: u32);
    fn add_item(&mut self, id: &str, count: u32);

    /// Pay out a whole bundle
    fn grant(&mut self, rewards: &[Reward]) {
        for reward in rewards {
            match *reward {
                Reward::Coins(n) => self.add_coins(n),
                Reward::SkillPoints(n) => self.add_skill_points(n),
                Reward::Item { id, count } => self.add_item(id, count),
            }
        }
    }
}

/// The player's coin balance. Never negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wallet {
    pub coins: u64,
}

impl Wallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_afford(&self, price: u64) -> bool {
        self.coins >= price
    }

    pub fn add(&mut self, amount: u64) {
        self.coins = self.coins.saturating_add(amount);
    }

    /// Deduct `price`, or reject and leave the balance alone
    pub fn spend(&mut self, price: u64) -> Result<(), Rejection> {
        super::ensure_coins(self, price)?;
        self.coins -= price;
        Ok(())
    }
}

impl Persisted for Wallet {
    type Record = Wallet;

    const STORAGE_KEY: &'static str = "sneak_dog_wallet";

    fn to_record(&self) -> Self::Record {
        self.clone()
    }

    fn apply_record(&mut self, record: Self::Record) {
        *self = record;
    }
}

/// Routes rewards into the wallet, the skill tree and the crafting inventory
pub struct Grants<'a> {
    pub wallet: &'a mut Wallet,
    pub skills: &'a mut SkillTree,
    pub crafting: &'a mut Crafting,
}

impl RewardSink for Grants<'_> {
    fn add_coins(&mut self, amount: u64) {
        self.wallet.add(amount);
    }

    fn add_skill_points(&mut self, amount: u32) {
        self.skills.add_skill_points(amount);
    }

    fn add_item(&mut self, id: &str, count: u32) {
        if !self.crafting.add_item(id, count) {
            log::warn!("Dropping reward for unknown item {}", id);
        }
    }
}

/// Sink that only adds up what it was given
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardTally {
    pub coins: u64,
    pub skill_points: u32,
    pub items: Vec<(String, u32)>,
}

impl RewardSink for RewardTally {
    fn add_coins(&mut self, amount: u64) {
        self.coins += amount;
    }

    fn add_skill_points(&mut self, amount: u32) {
        self.skill_points += amount;
    }

    fn add_item(&mut self, id: &str, count: u32) {
        self.items.push((id.to_string(), count));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;

    #[test]
    fn test_spend_rejects_without_mutation() {
        let mut wallet = Wallet { coins: 40 };
        assert_eq!(
            wallet.spend(100),
            Err(Rejection::InsufficientCoins {
                needed: 100,
                available: 40
            })
        );
        assert_eq!(wallet.coins, 40);
        assert!(wallet.spend(40).is_ok());
        assert_eq!(wallet.coins, 0);
    }

    #[test]
    fn test_grants_route_rewards() {
        let mut wallet = Wallet::new();
        let mut skills = SkillTree::new();
        let mut crafting = Crafting::new();
        let mut grants = Grants {
            wallet: &mut wallet,
            skills: &mut skills,
            crafting: &mut crafting,
        };
        grants.grant(&[
            Reward::Coins(200),
            Reward::SkillPoints(1),
            Reward::Item {
                id: "magic_essence",
                count: 2,
            },
            Reward::Item {
                id: "mystery_box",
                count: 1,
            },
        ]);
        assert_eq!(wallet.coins, 200);
        assert_eq!(skills.skill_points, 1);
        assert_eq!(crafting.count("magic_essence"), 2);
        assert_eq!(crafting.count("mystery_box"), 0);
    }

    #[test]
    fn test_wallet_roundtrip() {
        let mut storage = MemoryStorage::new();
        Wallet { coins: 1234 }.save(&mut storage).unwrap();
        let mut wallet = Wallet::new();
        assert!(wallet.load(&storage));
        assert_eq!(wallet.coins, 1234);
    }
}
