//! Timed power-up effects and per-kind cooldowns
//!
//! Each kind can be active at most once. Activation records the exact
//! mutation it applied so expiry can undo that mutation and nothing else:
//! multipliers are divided back out, absolute values are reset to the
//! player's baseline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::state::PlayerBody;

/// Power-up kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    SpeedBoost,
    DoubleJump,
    Magnet,
    Shield,
    TimeSlow,
    Ghost,
}

impl EffectKind {
    pub const ALL: [EffectKind; 6] = [
        EffectKind::SpeedBoost,
        EffectKind::DoubleJump,
        EffectKind::Magnet,
        EffectKind::Shield,
        EffectKind::TimeSlow,
        EffectKind::Ghost,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            EffectKind::SpeedBoost => "speed_boost",
            EffectKind::DoubleJump => "double_jump",
            EffectKind::Magnet => "magnet",
            EffectKind::Shield => "shield",
            EffectKind::TimeSlow => "time_slow",
            EffectKind::Ghost => "ghost",
        }
    }

    /// Lookup by id; unknown ids are a miss, not an error
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::SpeedBoost => "Speed Boost",
            EffectKind::DoubleJump => "Double Jump",
            EffectKind::Magnet => "Coin Magnet",
            EffectKind::Shield => "Shield",
            EffectKind::TimeSlow => "Time Slow",
            EffectKind::Ghost => "Ghost Mode",
        }
    }
}

/// The gameplay parameter change an effect makes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectMutation {
    /// `speed_multiplier *= m`, undone with `/= m`
    SpeedMultiplier(f32),
    /// `max_jumps = n`, undone by restoring the baseline budget
    JumpBudget(u8),
    /// `magnet_radius = r`, undone by restoring the baseline radius
    MagnetRadius(f32),
    /// `shield_hits = n`, undone by dropping any hits left
    ShieldHits(u8),
    /// Global `time_scale = s`, undone by restoring 1.0
    TimeScale(f32),
    /// Obstacle collision disabled
    Phase,
}

/// What an effect may touch
pub struct EffectTargets<'a> {
    pub player: &'a mut PlayerBody,
    pub time_scale: &'a mut f32,
}

impl EffectMutation {
    pub fn apply(&self, targets: &mut EffectTargets<'_>) {
        let player = &mut *targets.player;
        match *self {
            EffectMutation::SpeedMultiplier(m) => player.speed_multiplier *= m,
            EffectMutation::JumpBudget(n) => player.max_jumps = n,
            EffectMutation::MagnetRadius(r) => player.magnet_radius = r,
            EffectMutation::ShieldHits(n) => player.shield_hits = n,
            EffectMutation::TimeScale(s) => *targets.time_scale = s,
            EffectMutation::Phase => player.collision_enabled = false,
        }
    }

    pub fn reverse(&self, targets: &mut EffectTargets<'_>) {
        let player = &mut *targets.player;
        match *self {
            EffectMutation::SpeedMultiplier(m) => player.speed_multiplier /= m,
            EffectMutation::JumpBudget(_) => {
                player.max_jumps = player.base_jumps;
                player.jumps_remaining = player.jumps_remaining.min(player.max_jumps);
            }
            EffectMutation::MagnetRadius(_) => player.magnet_radius = player.base_magnet_radius,
            EffectMutation::ShieldHits(_) => player.shield_hits = 0,
            EffectMutation::TimeScale(_) => *targets.time_scale = 1.0,
            EffectMutation::Phase => player.collision_enabled = true,
        }
    }
}

/// Static definition of a power-up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    pub duration_ms: f64,
    pub cooldown_ms: f64,
    pub mutation: EffectMutation,
}

impl EffectSpec {
    pub fn default_for(kind: EffectKind) -> Self {
        let (duration_ms, cooldown_ms, mutation) = match kind {
            EffectKind::SpeedBoost => (10_000.0, 30_000.0, EffectMutation::SpeedMultiplier(1.5)),
            EffectKind::DoubleJump => (15_000.0, 45_000.0, EffectMutation::JumpBudget(2)),
            EffectKind::Magnet => (8_000.0, 25_000.0, EffectMutation::MagnetRadius(100.0)),
            EffectKind::Shield => (12_000.0, 40_000.0, EffectMutation::ShieldHits(1)),
            EffectKind::TimeSlow => (5_000.0, 35_000.0, EffectMutation::TimeScale(0.5)),
            EffectKind::Ghost => (6_000.0, 50_000.0, EffectMutation::Phase),
        };
        Self {
            duration_ms,
            cooldown_ms,
            mutation,
        }
    }
}

/// One running effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: EffectKind,
    pub start_ms: f64,
    pub end_ms: f64,
    /// The mutation in force, reversed on expiry
    pub applied: EffectMutation,
}

/// Tracks active effects and cooldowns against game time.
#[derive(Debug, Clone, Serialize)]
pub struct EffectScheduler {
    specs: BTreeMap<EffectKind, EffectSpec>,
    active: BTreeMap<EffectKind, ActiveEffect>,
    /// kind -> game time at which it may be activated again
    cooldowns: BTreeMap<EffectKind, f64>,
    /// Percentage added to every duration (pet ability)
    duration_bonus_pct: f32,
}

impl Default for EffectScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectScheduler {
    pub fn new() -> Self {
        Self {
            specs: EffectKind::ALL
                .into_iter()
                .map(|k| (k, EffectSpec::default_for(k)))
                .collect(),
            active: BTreeMap::new(),
            cooldowns: BTreeMap::new(),
            duration_bonus_pct: 0.0,
        }
    }

    pub fn spec(&self, kind: EffectKind) -> EffectSpec {
        self.specs
            .get(&kind)
            .copied()
            .unwrap_or_else(|| EffectSpec::default_for(kind))
    }

    /// Replace a kind's definition. Already-active instances keep the
    /// mutation they applied.
    pub fn set_spec(&mut self, kind: EffectKind, spec: EffectSpec) {
        self.specs.insert(kind, spec);
    }

    pub fn set_duration_bonus_pct(&mut self, pct: f32) {
        self.duration_bonus_pct = pct.max(0.0);
    }

    /// Effective duration after bonuses
    pub fn duration_ms(&self, kind: EffectKind) -> f64 {
        self.spec(kind).duration_ms * (1.0 + self.duration_bonus_pct as f64 / 100.0)
    }

    /// Start (or restart) an effect. Silently ignored while on cooldown.
    ///
    /// Returns whether the effect was activated.
    pub fn activate(&mut self, kind: EffectKind, now_ms: f64, targets: &mut EffectTargets<'_>) -> bool {
        if self.cooldowns.get(&kind).is_some_and(|&ready_at| now_ms < ready_at) {
            return false;
        }

        let spec = self.spec(kind);

        // Restarting: undo the old instance so the new one is applied exactly once
        if let Some(previous) = self.active.remove(&kind) {
            previous.applied.reverse(targets);
        }

        spec.mutation.apply(targets);
        self.active.insert(
            kind,
            ActiveEffect {
                kind,
                start_ms: now_ms,
                end_ms: now_ms + self.duration_ms(kind),
                applied: spec.mutation,
            },
        );
        self.cooldowns.insert(kind, now_ms + spec.cooldown_ms);

        log::debug!("Effect {} active until {}", kind.id(), now_ms + self.duration_ms(kind));
        true
    }

    /// Expire every effect whose end time has been reached.
    ///
    /// Returns the kinds that expired, in kind order.
    pub fn tick(&mut self, now_ms: f64, targets: &mut EffectTargets<'_>) -> Vec<EffectKind> {
        let expired: Vec<EffectKind> = self
            .active
            .values()
            .filter(|e| e.end_ms <= now_ms)
            .map(|e| e.kind)
            .collect();

        for kind in &expired {
            if let Some(effect) = self.active.remove(kind) {
                effect.applied.reverse(targets);
            }
        }
        expired
    }

    /// Reverse and drop every active effect (run ended). Cooldowns are kept.
    pub fn cancel_all(&mut self, targets: &mut EffectTargets<'_>) {
        for (_, effect) in std::mem::take(&mut self.active) {
            effect.applied.reverse(targets);
        }
    }

    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.active.contains_key(&kind)
    }

    pub fn remaining_duration(&self, kind: EffectKind, now_ms: f64) -> f64 {
        self.active
            .get(&kind)
            .map(|e| (e.end_ms - now_ms).max(0.0))
            .unwrap_or(0.0)
    }

    pub fn remaining_cooldown(&self, kind: EffectKind, now_ms: f64) -> f64 {
        self.cooldowns
            .get(&kind)
            .map(|&ready_at| (ready_at - now_ms).max(0.0))
            .unwrap_or(0.0)
    }

    pub fn active(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.active.values()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{PlayerBody, RunModifiers};
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    fn player() -> PlayerBody {
        PlayerBody::spawn(&Tuning::default(), &RunModifiers::default())
    }

    #[test]
    fn test_activate_applies_and_expiry_reverses() {
        let mut scheduler = EffectScheduler::new();
        let mut body = player();
        let mut time_scale = 1.0;
        let mut targets = EffectTargets {
            player: &mut body,
            time_scale: &mut time_scale,
        };

        assert!(scheduler.activate(EffectKind::SpeedBoost, 0.0, &mut targets));
        assert_eq!(targets.player.speed_multiplier, 1.5);
        assert!(scheduler.is_active(EffectKind::SpeedBoost));

        assert!(scheduler.tick(9_999.0, &mut targets).is_empty());
        assert_eq!(scheduler.tick(10_000.0, &mut targets), vec![EffectKind::SpeedBoost]);
        assert_eq!(targets.player.speed_multiplier, 1.0);
        assert!(!scheduler.is_active(EffectKind::SpeedBoost));
    }

    #[test]
    fn test_multiplier_reversal_is_relative() {
        // A multiplier in force from elsewhere must survive the boost expiring
        let mut scheduler = EffectScheduler::new();
        let mut body = player();
        body.speed_multiplier = 1.2;
        let mut time_scale = 1.0;
        let mut targets = EffectTargets {
            player: &mut body,
            time_scale: &mut time_scale,
        };
        scheduler.activate(EffectKind::SpeedBoost, 0.0, &mut targets);
        scheduler.tick(20_000.0, &mut targets);
        assert!((targets.player.speed_multiplier - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_every_kind_reverses_to_baseline() {
        let mut scheduler = EffectScheduler::new();
        let mut body = player();
        let baseline = body.clone();
        let mut time_scale = 1.0;
        let mut targets = EffectTargets {
            player: &mut body,
            time_scale: &mut time_scale,
        };
        for kind in EffectKind::ALL {
            assert!(scheduler.activate(kind, 0.0, &mut targets));
        }
        assert_eq!(scheduler.active_count(), EffectKind::ALL.len());
        assert!(!targets.player.collision_enabled);
        assert_eq!(targets.player.shield_hits, 1);
        assert_eq!(targets.player.max_jumps, 2);
        assert_eq!(*targets.time_scale, 0.5);

        scheduler.tick(60_000.0, &mut targets);
        assert_eq!(scheduler.active_count(), 0);
        assert_eq!(*targets.player, baseline);
        assert_eq!(time_scale, 1.0);
    }

    #[test]
    fn test_cooldown_rejects_without_side_effects() {
        let mut scheduler = EffectScheduler::new();
        let mut body = player();
        let mut time_scale = 1.0;
        let mut targets = EffectTargets {
            player: &mut body,
            time_scale: &mut time_scale,
        };
        scheduler.activate(EffectKind::Magnet, 0.0, &mut targets);
        scheduler.tick(8_000.0, &mut targets);

        assert!(!scheduler.activate(EffectKind::Magnet, 10_000.0, &mut targets));
        assert!(!scheduler.is_active(EffectKind::Magnet));
        assert_eq!(targets.player.magnet_radius, 0.0);
        assert_eq!(scheduler.remaining_cooldown(EffectKind::Magnet, 10_000.0), 15_000.0);

        assert!(scheduler.activate(EffectKind::Magnet, 25_000.0, &mut targets));
    }

    #[test]
    fn test_reactivation_restarts_instead_of_stacking() {
        let mut scheduler = EffectScheduler::new();
        let mut spec = EffectSpec::default_for(EffectKind::SpeedBoost);
        spec.cooldown_ms = 0.0;
        scheduler.set_spec(EffectKind::SpeedBoost, spec);

        let mut body = player();
        let mut time_scale = 1.0;
        let mut targets = EffectTargets {
            player: &mut body,
            time_scale: &mut time_scale,
        };

        assert!(scheduler.activate(EffectKind::SpeedBoost, 100.0, &mut targets));
        assert!(scheduler.activate(EffectKind::SpeedBoost, 101.0, &mut targets));
        assert_eq!(scheduler.active_count(), 1);
        assert_eq!(scheduler.remaining_duration(EffectKind::SpeedBoost, 101.0), spec.duration_ms);
        // Applied once, not twice
        assert!((targets.player.speed_multiplier - 1.5).abs() < 1e-6);

        scheduler.tick(101.0 + spec.duration_ms, &mut targets);
        assert!((targets.player.speed_multiplier - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cooldown_outlasts_duration() {
        let mut scheduler = EffectScheduler::new();
        let mut body = player();
        let mut time_scale = 1.0;
        let mut targets = EffectTargets {
            player: &mut body,
            time_scale: &mut time_scale,
        };
        scheduler.activate(EffectKind::TimeSlow, 0.0, &mut targets);
        scheduler.tick(5_000.0, &mut targets);
        assert_eq!(scheduler.remaining_duration(EffectKind::TimeSlow, 5_000.0), 0.0);
        assert!(scheduler.remaining_cooldown(EffectKind::TimeSlow, 5_000.0) > 0.0);
        assert_eq!(scheduler.remaining_cooldown(EffectKind::TimeSlow, 35_000.0), 0.0);
    }

    #[test]
    fn test_duration_bonus() {
        let mut scheduler = EffectScheduler::new();
        scheduler.set_duration_bonus_pct(50.0);
        assert_eq!(scheduler.duration_ms(EffectKind::Ghost), 9_000.0);
    }

    #[test]
    fn test_cancel_all_keeps_cooldowns() {
        let mut scheduler = EffectScheduler::new();
        let mut body = player();
        let mut time_scale = 1.0;
        let mut targets = EffectTargets {
            player: &mut body,
            time_scale: &mut time_scale,
        };
        scheduler.activate(EffectKind::Ghost, 0.0, &mut targets);
        scheduler.cancel_all(&mut targets);
        assert!(targets.player.collision_enabled);
        assert!(scheduler.remaining_cooldown(EffectKind::Ghost, 1.0) > 0.0);
    }

    #[test]
    fn test_ids_roundtrip() {
        for kind in EffectKind::ALL {
            assert_eq!(EffectKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(EffectKind::from_id("jetpack"), None);
    }

    proptest! {
        #[test]
        fn prop_rejected_activation_changes_nothing(kind_idx in 0usize..6, offset in 0.0f64..20_000.0) {
            let kind = EffectKind::ALL[kind_idx];
            let mut scheduler = EffectScheduler::new();
            let mut body = player();
            let mut time_scale = 1.0;
            let mut targets = EffectTargets { player: &mut body, time_scale: &mut time_scale };
            scheduler.activate(kind, 0.0, &mut targets);

            let now = offset.min(scheduler.spec(kind).cooldown_ms - 1.0);
            let before_player = targets.player.clone();
            let before_scale = *targets.time_scale;
            let before_active: Vec<ActiveEffect> = scheduler.active().copied().collect();
            let before_cooldown = scheduler.remaining_cooldown(kind, 0.0);

            prop_assert!(!scheduler.activate(kind, now, &mut targets));
            prop_assert_eq!(targets.player.clone(), before_player);
            prop_assert_eq!(*targets.time_scale, before_scale);
            prop_assert_eq!(scheduler.active().copied().collect::<Vec<_>>(), before_active);
            prop_assert_eq!(scheduler.remaining_cooldown(kind, 0.0), before_cooldown);
        }
    }
}
