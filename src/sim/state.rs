//! Game state and core simulation types
//!
//! Everything a run needs lives in [`GameState`]; the root context only feeds
//! it inputs and drains its events.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::effects::{EffectKind, EffectScheduler, EffectTargets};
use super::geometry::Rect;
use super::levels::{CollectibleKind, Elevation, LevelManager};
use super::spawner::Spawner;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the player to start a run
    Menu,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Run ended
    GameOver,
}

/// What a tap does on the game-over screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RestartMode {
    /// Back to the menu, another tap starts the next run
    #[default]
    ToMenu,
    /// Straight into a new run
    Instant,
}

/// Per-run values derived from progression (skills, store, pets, outfits).
///
/// Recomputed by the root context whenever a ledger changes and read when a
/// run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunModifiers {
    pub jump_force: f32,
    /// Jumps available before landing
    pub base_jumps: u8,
    /// Collectible capture distance without the magnet effect
    pub base_magnet_radius: f32,
    pub coin_multiplier: f32,
    /// Added to the player speed multiplier, in percent
    pub speed_bonus_pct: f32,
    /// Faster collectible spawns, in percent
    pub collectible_rate_bonus_pct: f32,
    /// Magnet effect radius before store upgrades
    pub magnet_effect_radius: f32,
    /// Shield effect hits
    pub shield_effect_hits: u8,
    /// Time scale set by the time-slow effect
    pub slow_time_scale: f32,
    /// Longer effects, in percent
    pub effect_duration_bonus_pct: f32,
    /// Share (0..1) of a level event's extra obstacle speed that is cancelled
    pub control_bonus: f32,
}

impl Default for RunModifiers {
    fn default() -> Self {
        Self {
            jump_force: Tuning::default().jump_force,
            base_jumps: 1,
            base_magnet_radius: 0.0,
            coin_multiplier: 1.0,
            speed_bonus_pct: 0.0,
            collectible_rate_bonus_pct: 0.0,
            magnet_effect_radius: 100.0,
            shield_effect_hits: 1,
            slow_time_scale: 0.5,
            effect_duration_bonus_pct: 0.0,
            control_bonus: 0.0,
        }
    }
}

/// The player character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerBody {
    pub rect: Rect,
    pub velocity_y: f32,
    pub grounded: bool,
    pub jumps_remaining: u8,
    pub max_jumps: u8,
    /// Jump budget without effects
    pub base_jumps: u8,
    /// Cleared while ghosting
    pub collision_enabled: bool,
    pub shield_hits: u8,
    pub magnet_radius: f32,
    pub base_magnet_radius: f32,
    /// Scales horizontal motion
    pub speed_multiplier: f32,
}

impl PlayerBody {
    /// A player standing on the ground at the start position
    pub fn spawn(tuning: &Tuning, modifiers: &RunModifiers) -> Self {
        let jumps = modifiers.base_jumps.max(1);
        Self {
            rect: Rect::new(
                tuning.player_x(),
                tuning.ground_y() - tuning.player_height,
                tuning.player_width,
                tuning.player_height,
            ),
            velocity_y: 0.0,
            grounded: true,
            jumps_remaining: jumps,
            max_jumps: jumps,
            base_jumps: jumps,
            collision_enabled: true,
            shield_hits: 0,
            magnet_radius: modifiers.base_magnet_radius,
            base_magnet_radius: modifiers.base_magnet_radius,
            speed_multiplier: 1.0 + modifiers.speed_bonus_pct / 100.0,
        }
    }
}

/// An obstacle entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Obstacle {
    pub id: u32,
    /// Type tag, e.g. "hydrant"
    pub kind: &'static str,
    pub rect: Rect,
    pub moving: bool,
    pub elevation: Elevation,
    /// Fallback render colour
    pub color: &'static str,
    /// Already scored
    pub passed: bool,
}

/// A collectible entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collectible {
    pub id: u32,
    pub kind: CollectibleKind,
    pub tag: &'static str,
    pub rect: Rect,
    pub color: &'static str,
}

/// Statistics accumulated over one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunStats {
    pub score: u64,
    pub distance_m: f32,
    /// Coins credited (after multipliers)
    pub coins: u64,
    pub bones: u32,
    pub keys: u32,
    pub jumps: u32,
    pub hits_taken: u32,
    /// Run time in game milliseconds
    pub time_ms: f64,
    pub levels_completed: u32,
    /// Quickest level completion this run
    pub fastest_level_ms: Option<f64>,
    /// Levels finished without taking a hit
    pub perfect_levels: u32,
    pub reached_max_speed: bool,
    pub powerups_used: BTreeMap<EffectKind, u32>,
}

/// Transient state of the current run
#[derive(Debug, Clone, Serialize)]
pub struct RunSession {
    /// Scroll speed from the score curve
    pub game_speed: f32,
    /// Global simulation rate, lowered by time-slow
    pub time_scale: f32,
    pub started_at_ms: f64,
    pub level_started_at_ms: f64,
    /// `hits_taken` when the current level began
    pub level_start_hits: u32,
    pub stats: RunStats,
}

impl RunSession {
    pub fn new(now_ms: f64, tuning: &Tuning) -> Self {
        Self {
            game_speed: tuning.speed_for_score(0),
            time_scale: 1.0,
            started_at_ms: now_ms,
            level_started_at_ms: now_ms,
            level_start_hits: 0,
            stats: RunStats::default(),
        }
    }

    pub fn score(&self) -> u64 {
        self.stats.score
    }
}

/// Game events produced by a tick, drained by the root context
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    RunStarted,
    Jumped,
    ObstaclePassed { score: u64 },
    Collected { kind: CollectibleKind, coins: u64 },
    ShieldAbsorbed { remaining: u8 },
    EffectActivated(EffectKind),
    EffectExpired(EffectKind),
    LevelCompleted { level: u32 },
    LevelEventStarted { id: &'static str },
    LevelEventEnded { id: &'static str },
    Paused,
    Resumed,
    GameOver { stats: RunStats },
}

/// Complete simulation state
#[derive(Debug, Clone, Serialize)]
pub struct GameState {
    pub tuning: Tuning,
    pub phase: GamePhase,
    pub restart_mode: RestartMode,
    /// Game time in milliseconds; frozen while paused
    pub time_ms: f64,
    pub player: PlayerBody,
    /// Sorted by id
    pub obstacles: Vec<Obstacle>,
    /// Sorted by id
    pub collectibles: Vec<Collectible>,
    pub session: RunSession,
    pub effects: EffectScheduler,
    pub level: LevelManager,
    pub modifiers: RunModifiers,
    #[serde(skip)]
    pub spawner: Spawner,
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new game state in the menu phase
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let modifiers = RunModifiers {
            jump_force: tuning.jump_force,
            ..RunModifiers::default()
        };
        Self {
            phase: GamePhase::Menu,
            restart_mode: RestartMode::default(),
            time_ms: 0.0,
            player: PlayerBody::spawn(&tuning, &modifiers),
            obstacles: Vec::new(),
            collectibles: Vec::new(),
            session: RunSession::new(0.0, &tuning),
            effects: EffectScheduler::new(),
            level: LevelManager::default(),
            modifiers,
            spawner: Spawner::new(seed, 0.0, &tuning),
            events: Vec::new(),
            tuning,
        }
    }

    /// Reset the world and enter `Playing`
    pub fn start_run(&mut self) {
        let now = self.time_ms;
        self.cancel_effects();
        self.effects
            .set_duration_bonus_pct(self.modifiers.effect_duration_bonus_pct);
        self.player = PlayerBody::spawn(&self.tuning, &self.modifiers);
        self.obstacles.clear();
        self.collectibles.clear();
        self.session = RunSession::new(now, &self.tuning);
        self.level.reset();
        self.spawner.reset(now, &self.tuning);
        self.phase = GamePhase::Playing;
        self.events.push(GameEvent::RunStarted);
        log::info!("Run started at {:.0} ms", now);
    }

    /// Stop the run and report its statistics
    pub fn end_run(&mut self) {
        self.cancel_effects();
        self.session.stats.time_ms = self.time_ms - self.session.started_at_ms;
        self.phase = GamePhase::GameOver;
        log::info!(
            "Run over: score {} distance {:.0} m coins {}",
            self.session.stats.score,
            self.session.stats.distance_m,
            self.session.stats.coins
        );
        self.events.push(GameEvent::GameOver {
            stats: self.session.stats.clone(),
        });
    }

    /// Activate a power-up. Only possible while playing; otherwise, or while
    /// the kind is cooling down, nothing happens.
    pub fn activate_effect(&mut self, kind: EffectKind) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        self.tune_effect(kind);
        let now = self.time_ms;
        let activated = self.effects.activate(
            kind,
            now,
            &mut EffectTargets {
                player: &mut self.player,
                time_scale: &mut self.session.time_scale,
            },
        );
        if activated {
            *self.session.stats.powerups_used.entry(kind).or_insert(0) += 1;
            self.events.push(GameEvent::EffectActivated(kind));
        }
        activated
    }

    /// Expire finished effects
    pub fn expire_effects(&mut self) {
        let expired = self.effects.tick(
            self.time_ms,
            &mut EffectTargets {
                player: &mut self.player,
                time_scale: &mut self.session.time_scale,
            },
        );
        self.events
            .extend(expired.into_iter().map(GameEvent::EffectExpired));
    }

    fn cancel_effects(&mut self) {
        self.effects.cancel_all(&mut EffectTargets {
            player: &mut self.player,
            time_scale: &mut self.session.time_scale,
        });
    }

    /// Bake upgrade levels into the effect's mutation before it is applied
    fn tune_effect(&mut self, kind: EffectKind) {
        use super::effects::EffectMutation;

        let mutation = match kind {
            EffectKind::Magnet => EffectMutation::MagnetRadius(self.modifiers.magnet_effect_radius),
            EffectKind::Shield => EffectMutation::ShieldHits(self.modifiers.shield_effect_hits),
            EffectKind::TimeSlow => EffectMutation::TimeScale(self.modifiers.slow_time_scale),
            _ => return,
        };
        let mut spec = self.effects.spec(kind);
        spec.mutation = mutation;
        self.effects.set_spec(kind, spec);
    }

    /// Drain events produced since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_in_menu() {
        let state = GameState::new(Tuning::default(), 1);
        assert_eq!(state.phase, GamePhase::Menu);
        assert!(state.obstacles.is_empty());
        assert!(state.player.grounded);
        assert_eq!(state.player.rect.bottom(), state.tuning.ground_y());
    }

    #[test]
    fn test_effects_only_activate_while_playing() {
        let mut state = GameState::new(Tuning::default(), 1);
        assert!(!state.activate_effect(EffectKind::Shield));
        state.start_run();
        assert!(state.activate_effect(EffectKind::Shield));
        assert_eq!(state.player.shield_hits, 1);
        assert_eq!(state.session.stats.powerups_used.get(&EffectKind::Shield), Some(&1));
    }

    #[test]
    fn test_upgraded_effects_use_modifiers() {
        let mut state = GameState::new(Tuning::default(), 1);
        state.modifiers.shield_effect_hits = 3;
        state.modifiers.magnet_effect_radius = 140.0;
        state.start_run();
        state.activate_effect(EffectKind::Shield);
        state.activate_effect(EffectKind::Magnet);
        assert_eq!(state.player.shield_hits, 3);
        assert_eq!(state.player.magnet_radius, 140.0);
    }

    #[test]
    fn test_end_run_reverses_effects() {
        let mut state = GameState::new(Tuning::default(), 1);
        state.start_run();
        state.activate_effect(EffectKind::Ghost);
        state.activate_effect(EffectKind::TimeSlow);
        state.end_run();
        assert!(state.player.collision_enabled);
        assert_eq!(state.session.time_scale, 1.0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(matches!(state.take_events().last(), Some(GameEvent::GameOver { .. })));
    }

    #[test]
    fn test_modifiers_shape_the_player() {
        let modifiers = RunModifiers {
            base_jumps: 2,
            base_magnet_radius: 50.0,
            speed_bonus_pct: 10.0,
            ..RunModifiers::default()
        };
        let player = PlayerBody::spawn(&Tuning::default(), &modifiers);
        assert_eq!(player.max_jumps, 2);
        assert_eq!(player.magnet_radius, 50.0);
        assert!((player.speed_multiplier - 1.1).abs() < 1e-6);
    }
}
