//! Data-driven game balance
//!
//! Every gameplay constant the simulation reads lives here so a balance pass
//! can ship as a JSON blob instead of a rebuild. Missing fields fall back to
//! the defaults below.

use serde::{Deserialize, Serialize};

/// Balance parameters for physics, spawning and the speed curve.
///
/// Physics values are per fixed tick (see [`crate::consts::SIM_DT_MS`]), not
/// per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Canvas ===
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Distance between the ground line and the bottom of the canvas
    pub ground_margin: f32,

    // === Player ===
    pub player_width: f32,
    pub player_height: f32,
    /// Downward acceleration added to velocity every tick
    pub gravity: f32,
    /// Upward launch speed (applied as a negative velocity)
    pub jump_force: f32,

    // === Speed curve ===
    pub base_speed: f32,
    pub speed_per_score: f32,
    pub max_speed: f32,

    // === Spawner ===
    pub obstacle_interval_ms: f64,
    pub obstacle_interval_per_score_ms: f64,
    pub obstacle_interval_floor_ms: f64,
    pub collectible_interval_ms: f64,
    pub collectible_interval_per_score_ms: f64,
    pub collectible_interval_floor_ms: f64,
    /// Chance that an obstacle spawns elevated
    pub air_obstacle_chance: f32,
    /// Gap between a standing player's head and an air obstacle's bottom edge
    pub air_obstacle_gap: f32,
    /// Extra horizontal speed of obstacles tagged as moving
    pub moving_obstacle_speed: f32,
    pub collectible_size: f32,
    /// Highest lift above the ground a collectible can spawn at
    pub collectible_max_lift: f32,

    // === Distance & levels ===
    pub pixels_per_meter: f32,
    pub level_length_m: f32,
    pub level_event_spacing_m: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            canvas_width: 400.0,
            canvas_height: 700.0,
            ground_margin: 100.0,

            player_width: 50.0,
            player_height: 50.0,
            gravity: 0.8,
            jump_force: 15.0,

            base_speed: 5.0,
            speed_per_score: 0.05,
            max_speed: 12.0,

            obstacle_interval_ms: 1500.0,
            obstacle_interval_per_score_ms: 10.0,
            obstacle_interval_floor_ms: 800.0,
            collectible_interval_ms: 1100.0,
            collectible_interval_per_score_ms: 4.0,
            collectible_interval_floor_ms: 600.0,
            air_obstacle_chance: 0.3,
            air_obstacle_gap: 20.0,
            moving_obstacle_speed: 1.5,
            collectible_size: 24.0,
            collectible_max_lift: 120.0,

            pixels_per_meter: 10.0,
            level_length_m: 500.0,
            level_event_spacing_m: 1000.0,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) tuning blob
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Y coordinate of the ground line
    pub fn ground_y(&self) -> f32 {
        self.canvas_height - self.ground_margin
    }

    /// Where the player stands horizontally
    pub fn player_x(&self) -> f32 {
        self.canvas_width / 4.0
    }

    /// Scroll speed for a given score: `min(max, base + score * increment)`
    pub fn speed_for_score(&self, score: u64) -> f32 {
        (self.base_speed + score as f32 * self.speed_per_score).min(self.max_speed)
    }

    /// Apex rise of a jump under fixed-step integration never exceeds this
    pub fn peak_jump_height(&self, jump_force: f32) -> f32 {
        jump_force * jump_force / (2.0 * self.gravity)
    }
}
