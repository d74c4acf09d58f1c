//! Sneak Dog - an endless-runner mini-game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, spawning, effects, run state)
//! - `progression`: Persisted meta-progression ledgers
//! - `game`: Root context wiring the simulation to the ledgers
//! - `platform`: Browser/native platform abstraction (clock, storage)
//! - `persistence`: Versioned save/load of every ledger
//! - `audio`: Sound cues and their sinks
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod game;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod progression;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use game::Game;
pub use highscores::HighScores;
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds (60 Hz, the tuning's tick rate)
    pub const SIM_DT_MS: f64 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest host frame gap fed to the accumulator
    pub const MAX_FRAME_DELTA_MS: f64 = 250.0;
}
