//! Daily login rewards on a seven-day cycle

use serde::{Deserialize, Serialize};

use super::rewards::{Reward, RewardSink};
use super::{Notification, Rejection};
use crate::persistence::Persisted;

pub const DAY_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

const fn item(id: &'static str, count: u32) -> Reward {
    Reward::Item { id, count }
}

/// Reward bundle for each day of the streak cycle
pub static DAILY_REWARDS: [&[Reward]; 7] = [
    &[Reward::Coins(100), item("energy_crystal", 1)],
    &[Reward::Coins(200), item("swift_feather", 1)],
    &[Reward::Coins(300), item("protection_gem", 1)],
    &[Reward::Coins(400), item("magic_essence", 2)],
    &[Reward::Coins(500), Reward::SkillPoints(1), item("rainbow_shard", 1)],
    &[Reward::Coins(600), item("fortune_crystal", 1), item("magnetic_ore", 2)],
    &[
        Reward::Coins(1000),
        Reward::SkillPoints(2),
        item("rainbow_shard", 2),
        item("magic_essence", 3),
    ],
];

/// UTC day index of a Unix-epoch timestamp
fn day_index(ms: f64) -> i64 {
    (ms / DAY_MS).floor() as i64
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyRewards {
    pub streak: u32,
    /// Unix ms of the last claim
    pub last_claim_ms: Option<f64>,
    pub claimed_today: bool,
}

impl DailyRewards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roll the streak and claim flag forward to `now_ms`.
    /// Missing a whole day resets the streak.
    pub fn refresh(&mut self, now_ms: f64) {
        let Some(last) = self.last_claim_ms else {
            self.claimed_today = false;
            return;
        };
        let days = day_index(now_ms) - day_index(last);
        if days > 1 {
            if self.streak > 0 {
                log::info!("Daily streak of {} lost", self.streak);
            }
            self.streak = 0;
        }
        if days >= 1 {
            self.claimed_today = false;
        }
    }

    /// Day of the cycle (1-7) the next claim pays out
    pub fn current_day(&self) -> u32 {
        self.streak % 7 + 1
    }

    pub fn can_claim(&self, now_ms: f64) -> bool {
        let mut rolled = self.clone();
        rolled.refresh(now_ms);
        !rolled.claimed_today
    }

    /// Pay out today's reward
    pub fn claim(&mut self, now_ms: f64, sink: &mut dyn RewardSink) -> Result<Notification, Rejection> {
        self.refresh(now_ms);
        if self.claimed_today {
            return Err(Rejection::AlreadyClaimed);
        }
        let day = self.current_day();
        sink.grant(DAILY_REWARDS[(day - 1) as usize]);
        self.streak += 1;
        self.claimed_today = true;
        self.last_claim_ms = Some(now_ms);
        log::info!("Daily reward day {} claimed, streak {}", day, self.streak);
        Ok(Notification::DailyRewardClaimed { day })
    }

    /// Milliseconds until the next claim opens; 0 if one is available
    pub fn time_until_next_claim(&self, now_ms: f64) -> f64 {
        if self.can_claim(now_ms) {
            0.0
        } else {
            (day_index(now_ms) + 1) as f64 * DAY_MS - now_ms
        }
    }
}

impl Persisted for DailyRewards {
    type Record = DailyRewards;

    const STORAGE_KEY: &'static str = "sneak_dog_daily";

    fn to_record(&self) -> Self::Record {
        self.clone()
    }

    fn apply_record(&mut self, record: Self::Record) {
        *self = record;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;
    use crate::progression::RewardTally;

    // Noon UTC on some day
    const NOON: f64 = 20_000.0 * DAY_MS + DAY_MS / 2.0;

    #[test]
    fn test_claim_once_per_day() {
        let mut daily = DailyRewards::new();
        let mut tally = RewardTally::default();
        assert_eq!(
            daily.claim(NOON, &mut tally),
            Ok(Notification::DailyRewardClaimed { day: 1 })
        );
        assert_eq!(tally.coins, 100);
        assert_eq!(tally.items, vec![("energy_crystal".to_string(), 1)]);

        assert_eq!(daily.claim(NOON + 3_600_000.0, &mut tally), Err(Rejection::AlreadyClaimed));
        assert_eq!(tally.coins, 100);
        assert_eq!(daily.time_until_next_claim(NOON), DAY_MS / 2.0);
    }

    #[test]
    fn test_streak_advances_and_wraps() {
        let mut daily = DailyRewards::new();
        let mut tally = RewardTally::default();
        for d in 0..8 {
            daily.claim(NOON + d as f64 * DAY_MS, &mut tally).unwrap();
        }
        assert_eq!(daily.streak, 8);
        assert_eq!(daily.current_day(), 2);
        // Days 1-7 plus day 1 again
        assert_eq!(tally.coins, 100 + 200 + 300 + 400 + 500 + 600 + 1000 + 100);
        assert_eq!(tally.skill_points, 3);
    }

    #[test]
    fn test_missed_day_resets_streak() {
        let mut daily = DailyRewards::new();
        let mut tally = RewardTally::default();
        daily.claim(NOON, &mut tally).unwrap();
        daily.claim(NOON + DAY_MS, &mut tally).unwrap();
        assert_eq!(daily.current_day(), 3);

        let notification = daily.claim(NOON + 3.0 * DAY_MS, &mut tally).unwrap();
        assert_eq!(notification, Notification::DailyRewardClaimed { day: 1 });
        assert_eq!(daily.streak, 1);
    }

    #[test]
    fn test_new_day_at_utc_midnight() {
        let mut daily = DailyRewards::new();
        let mut tally = RewardTally::default();
        let late = NOON + DAY_MS / 2.0 - 1_000.0;
        daily.claim(late, &mut tally).unwrap();
        assert!(!daily.can_claim(late + 500.0));
        assert!(daily.can_claim(late + 2_000.0));
    }

    #[test]
    fn test_roundtrip() {
        let mut storage = MemoryStorage::new();
        let mut daily = DailyRewards::new();
        daily.claim(NOON, &mut RewardTally::default()).unwrap();
        daily.save(&mut storage).unwrap();
        let mut loaded = DailyRewards::new();
        assert!(loaded.load(&storage));
        assert_eq!(loaded, daily);
    }
}
