//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Game time only, never the wall clock
//! - No rendering or platform dependencies

pub mod effects;
pub mod geometry;
pub mod levels;
pub mod physics;
pub mod spawner;
pub mod state;
pub mod tick;

pub use effects::{ActiveEffect, EffectKind, EffectMutation, EffectScheduler, EffectSpec};
pub use geometry::{Rect, collides};
pub use levels::{CollectibleKind, Elevation, Environment, LevelManager};
pub use spawner::Spawner;
pub use state::{
    Collectible, GameEvent, GamePhase, GameState, Obstacle, PlayerBody, RestartMode, RunModifiers,
    RunSession, RunStats,
};
pub use tick::{TickInput, tick};
