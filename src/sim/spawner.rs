//! Time-gated obstacle and collectible generation
//!
//! Obstacles and collectibles run on independent timers. Each interval starts
//! at its base value and shrinks with score toward a floor; the obstacle
//! interval is further divided by the level difficulty.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::geometry::Rect;
use super::levels::{CollectibleDef, Elevation, LevelManager, ObstacleDef};
use super::state::{Collectible, Obstacle};
use crate::tuning::Tuning;

#[derive(Debug, Clone)]
pub struct Spawner {
    rng: Pcg32,
    last_obstacle_ms: f64,
    last_collectible_ms: f64,
    obstacle_interval_ms: f64,
    collectible_interval_ms: f64,
    next_id: u32,
}

impl Default for Spawner {
    fn default() -> Self {
        Self::new(0, 0.0, &Tuning::default())
    }
}

impl Spawner {
    pub fn new(seed: u64, now_ms: f64, tuning: &Tuning) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            last_obstacle_ms: now_ms,
            last_collectible_ms: now_ms,
            obstacle_interval_ms: tuning.obstacle_interval_ms,
            collectible_interval_ms: tuning.collectible_interval_ms,
            next_id: 1,
        }
    }

    /// Restart both timers from `now_ms` at their base intervals. The RNG
    /// stream carries on.
    pub fn reset(&mut self, now_ms: f64, tuning: &Tuning) {
        self.last_obstacle_ms = now_ms;
        self.last_collectible_ms = now_ms;
        self.obstacle_interval_ms = tuning.obstacle_interval_ms;
        self.collectible_interval_ms = tuning.collectible_interval_ms;
    }

    pub fn obstacle_interval_ms(&self) -> f64 {
        self.obstacle_interval_ms
    }

    pub fn collectible_interval_ms(&self) -> f64 {
        self.collectible_interval_ms
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Spawn one obstacle at the right edge if its interval has elapsed
    pub fn maybe_spawn_obstacle(
        &mut self,
        now_ms: f64,
        score: u64,
        tuning: &Tuning,
        level: &LevelManager,
    ) -> Option<Obstacle> {
        if now_ms - self.last_obstacle_ms <= self.obstacle_interval_ms {
            return None;
        }

        let def = match level.forced_obstacle() {
            Some(def) => def,
            None => self.pick_obstacle(level.environment.def().obstacles, tuning)?,
        };

        let ground = tuning.ground_y();
        let y = match def.elevation {
            Elevation::Ground => ground - def.height,
            // Bottom edge sits just above a standing player's head
            Elevation::Air => ground - tuning.player_height - tuning.air_obstacle_gap - def.height,
        };

        let obstacle = Obstacle {
            id: self.next_entity_id(),
            kind: def.kind,
            rect: Rect::new(tuning.canvas_width, y, def.width, def.height),
            moving: def.moving,
            elevation: def.elevation,
            color: def.color,
            passed: false,
        };

        self.last_obstacle_ms = now_ms;
        let shrunk = (tuning.obstacle_interval_ms
            - score as f64 * tuning.obstacle_interval_per_score_ms)
            / level.difficulty.max(1.0) as f64;
        self.obstacle_interval_ms = shrunk.max(tuning.obstacle_interval_floor_ms);

        Some(obstacle)
    }

    /// Spawn one collectible at the right edge if its interval has elapsed
    pub fn maybe_spawn_collectible(
        &mut self,
        now_ms: f64,
        score: u64,
        tuning: &Tuning,
        level: &LevelManager,
        rate_bonus_pct: f32,
    ) -> Option<Collectible> {
        if now_ms - self.last_collectible_ms <= self.collectible_interval_ms {
            return None;
        }

        let def = self.pick_collectible(level.environment.def().collectibles)?;
        let size = tuning.collectible_size;
        let lift = self.rng.random_range(0.0..=tuning.collectible_max_lift);

        let collectible = Collectible {
            id: self.next_entity_id(),
            kind: def.kind,
            tag: def.tag,
            rect: Rect::new(tuning.canvas_width, tuning.ground_y() - size - lift, size, size),
            color: def.color,
        };

        self.last_collectible_ms = now_ms;
        let shrunk = (tuning.collectible_interval_ms
            - score as f64 * tuning.collectible_interval_per_score_ms)
            / (1.0 + rate_bonus_pct.max(0.0) as f64 / 100.0);
        self.collectible_interval_ms = shrunk.max(tuning.collectible_interval_floor_ms);

        Some(collectible)
    }

    /// Air or ground first, then a weighted pick within that class. Falls
    /// back to the other class if the table has none of the chosen one.
    fn pick_obstacle(&mut self, table: &[ObstacleDef], tuning: &Tuning) -> Option<ObstacleDef> {
        let want_air = self.rng.random::<f32>() < tuning.air_obstacle_chance;
        let preferred = if want_air { Elevation::Air } else { Elevation::Ground };

        let class: Vec<&ObstacleDef> = table.iter().filter(|o| o.elevation == preferred).collect();
        let class = if class.is_empty() {
            table.iter().collect()
        } else {
            class
        };
        self.weighted(&class, |o| o.weight).copied()
    }

    fn pick_collectible(&mut self, table: &[CollectibleDef]) -> Option<CollectibleDef> {
        let all: Vec<&CollectibleDef> = table.iter().collect();
        self.weighted(&all, |c| c.weight).copied()
    }

    fn weighted<'a, T>(&mut self, items: &[&'a T], weight: impl Fn(&T) -> f32) -> Option<&'a T> {
        let total: f32 = items.iter().map(|i| weight(i).max(0.0)).sum();
        if items.is_empty() {
            return None;
        }
        if total <= 0.0 {
            return items.first().copied();
        }
        let mut roll = self.rng.random::<f32>() * total;
        for item in items {
            roll -= weight(item).max(0.0);
            if roll < 0.0 {
                return Some(*item);
            }
        }
        items.last().copied()
    }
}
