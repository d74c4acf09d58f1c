//! Environments, level progression and timed level events

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// Where an obstacle sits vertically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Elevation {
    /// Resting on the ground, cleared by jumping
    Ground,
    /// Floating just above head height, cleared by staying down
    Air,
}

/// Static obstacle definition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleDef {
    pub kind: &'static str,
    pub width: f32,
    pub height: f32,
    /// Relative spawn frequency within its elevation class
    pub weight: f32,
    /// Fallback render colour when the sprite is unavailable
    pub color: &'static str,
    pub moving: bool,
    pub elevation: Elevation,
}

/// Collectible classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectibleKind {
    Coin,
    Bone,
    /// The environment's special item
    Key,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectibleDef {
    pub kind: CollectibleKind,
    /// Type tag (e.g. "hydrant_key")
    pub tag: &'static str,
    pub weight: f32,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    City,
    Park,
    Mall,
}

pub struct EnvironmentDef {
    pub name: &'static str,
    pub background: &'static str,
    pub ground_color: &'static str,
    pub obstacles: &'static [ObstacleDef],
    pub collectibles: &'static [CollectibleDef],
}

const fn obstacle(
    kind: &'static str,
    width: f32,
    height: f32,
    weight: f32,
    color: &'static str,
    moving: bool,
    elevation: Elevation,
) -> ObstacleDef {
    ObstacleDef {
        kind,
        width,
        height,
        weight,
        color,
        moving,
        elevation,
    }
}

const fn collectible(
    kind: CollectibleKind,
    tag: &'static str,
    weight: f32,
    color: &'static str,
) -> CollectibleDef {
    CollectibleDef {
        kind,
        tag,
        weight,
        color,
    }
}

static CITY: EnvironmentDef = EnvironmentDef {
    name: "City Streets",
    background: "#87CEEB",
    ground_color: "#808080",
    obstacles: &[
        obstacle("hydrant", 30.0, 40.0, 0.3, "#FF0000", false, Elevation::Ground),
        obstacle("trash", 40.0, 35.0, 0.4, "#8B4513", false, Elevation::Ground),
        obstacle("camera", 25.0, 25.0, 0.3, "#000000", false, Elevation::Air),
    ],
    collectibles: &[
        collectible(CollectibleKind::Coin, "coin", 0.7, "#FFD700"),
        collectible(CollectibleKind::Bone, "bone", 0.2, "#FFFFFF"),
        collectible(CollectibleKind::Key, "hydrant_key", 0.1, "#FF4500"),
    ],
};

static PARK: EnvironmentDef = EnvironmentDef {
    name: "City Park",
    background: "#90EE90",
    ground_color: "#228B22",
    obstacles: &[
        obstacle("bush", 45.0, 35.0, 0.4, "#228B22", false, Elevation::Ground),
        obstacle("bench", 60.0, 30.0, 0.3, "#8B4513", false, Elevation::Ground),
        obstacle("squirrel", 25.0, 25.0, 0.3, "#8B4513", true, Elevation::Ground),
        obstacle("bird", 35.0, 25.0, 0.3, "#696969", true, Elevation::Air),
    ],
    collectibles: &[
        collectible(CollectibleKind::Coin, "coin", 0.7, "#FFD700"),
        collectible(CollectibleKind::Bone, "bone", 0.2, "#FFFFFF"),
        collectible(CollectibleKind::Key, "tennis_ball", 0.1, "#CCFF00"),
    ],
};

static MALL: EnvironmentDef = EnvironmentDef {
    name: "Shopping Mall",
    background: "#F5F5F5",
    ground_color: "#D3D3D3",
    obstacles: &[
        obstacle("cart", 50.0, 40.0, 0.3, "#C0C0C0", false, Elevation::Ground),
        obstacle("guard", 30.0, 60.0, 0.3, "#000080", true, Elevation::Ground),
        obstacle("plant", 35.0, 45.0, 0.4, "#228B22", false, Elevation::Ground),
        obstacle("balloon", 30.0, 40.0, 0.3, "#FF69B4", false, Elevation::Air),
    ],
    collectibles: &[
        collectible(CollectibleKind::Coin, "coin", 0.7, "#FFD700"),
        collectible(CollectibleKind::Bone, "bone", 0.2, "#FFFFFF"),
        collectible(CollectibleKind::Key, "mall_key", 0.1, "#FF1493"),
    ],
};

impl Environment {
    pub const CYCLE: [Environment; 3] = [Environment::City, Environment::Park, Environment::Mall];

    /// Environment for a 1-based level index
    pub fn for_level(level: u32) -> Self {
        Self::CYCLE[(level.max(1) as usize - 1) % Self::CYCLE.len()]
    }

    pub fn def(&self) -> &'static EnvironmentDef {
        match self {
            Environment::City => &CITY,
            Environment::Park => &PARK,
            Environment::Mall => &MALL,
        }
    }
}

/// Static definition of a timed level event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelEventDef {
    pub id: &'static str,
    pub name: &'static str,
    pub environment: Environment,
    pub duration_ms: f64,
    pub coin_multiplier: f32,
    pub score_multiplier: f32,
    pub obstacle_speed: f32,
    /// Obstacle type forced while active
    pub extra_obstacle: Option<ObstacleDef>,
}

pub static LEVEL_EVENTS: &[LevelEventDef] = &[
    LevelEventDef {
        id: "sale_rush",
        name: "Mall Sale Rush",
        environment: Environment::Mall,
        duration_ms: 20_000.0,
        coin_multiplier: 2.0,
        score_multiplier: 1.0,
        obstacle_speed: 1.5,
        extra_obstacle: None,
    },
    LevelEventDef {
        id: "squirrel_party",
        name: "Squirrel Party",
        environment: Environment::Park,
        duration_ms: 15_000.0,
        coin_multiplier: 1.5,
        score_multiplier: 1.0,
        obstacle_speed: 1.0,
        extra_obstacle: Some(obstacle(
            "squirrel",
            25.0,
            25.0,
            1.0,
            "#8B4513",
            true,
            Elevation::Ground,
        )),
    },
    LevelEventDef {
        id: "police_chase",
        name: "Police Chase",
        environment: Environment::City,
        duration_ms: 25_000.0,
        coin_multiplier: 1.0,
        score_multiplier: 3.0,
        obstacle_speed: 2.0,
        extra_obstacle: None,
    },
];

pub fn level_event(id: &str) -> Option<&'static LevelEventDef> {
    LEVEL_EVENTS.iter().find(|e| e.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActiveLevelEvent {
    pub id: &'static str,
    pub ends_at_ms: f64,
}

/// Current level, environment and event for one run
#[derive(Debug, Clone, Serialize)]
pub struct LevelManager {
    pub level: u32,
    pub environment: Environment,
    /// Spawn-rate multiplier, grows 10% per level
    pub difficulty: f32,
    pub active_event: Option<ActiveLevelEvent>,
    last_event_distance_m: f32,
}

impl Default for LevelManager {
    fn default() -> Self {
        Self {
            level: 1,
            environment: Environment::City,
            difficulty: 1.0,
            active_event: None,
            last_event_distance_m: 0.0,
        }
    }
}

impl LevelManager {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Move to the next level. Returns the new level index.
    pub fn advance_level(&mut self) -> u32 {
        self.level += 1;
        self.environment = Environment::for_level(self.level);
        self.difficulty = 1.0 + (self.level - 1) as f32 * 0.1;
        log::info!(
            "Level {} ({}), difficulty {:.1}",
            self.level,
            self.environment.def().name,
            self.difficulty
        );
        self.level
    }

    /// Whether `distance_m` has reached the end of the current level
    pub fn level_finished(&self, distance_m: f32, level_length_m: f32) -> bool {
        distance_m >= self.level as f32 * level_length_m
    }

    /// Start an event for the current environment once `spacing_m` metres
    /// have passed since the last one. Never overlaps a running event.
    pub fn maybe_start_event<R: Rng>(
        &mut self,
        distance_m: f32,
        spacing_m: f32,
        now_ms: f64,
        rng: &mut R,
    ) -> Option<&'static LevelEventDef> {
        if self.active_event.is_some() || distance_m - self.last_event_distance_m < spacing_m {
            return None;
        }
        let candidates: Vec<&'static LevelEventDef> = LEVEL_EVENTS
            .iter()
            .filter(|e| e.environment == self.environment)
            .collect();
        let event = *candidates.choose(rng)?;

        self.active_event = Some(ActiveLevelEvent {
            id: event.id,
            ends_at_ms: now_ms + event.duration_ms,
        });
        self.last_event_distance_m = distance_m;
        log::info!("Level event started: {}", event.name);
        Some(event)
    }

    /// End the running event if its time is up. Returns its id.
    pub fn expire_event(&mut self, now_ms: f64) -> Option<&'static str> {
        match self.active_event {
            Some(active) if now_ms >= active.ends_at_ms => {
                self.active_event = None;
                Some(active.id)
            }
            _ => None,
        }
    }

    fn event_def(&self) -> Option<&'static LevelEventDef> {
        self.active_event.and_then(|a| level_event(a.id))
    }

    pub fn coin_multiplier(&self) -> f32 {
        self.event_def().map_or(1.0, |e| e.coin_multiplier)
    }

    pub fn score_multiplier(&self) -> f32 {
        self.event_def().map_or(1.0, |e| e.score_multiplier)
    }

    pub fn obstacle_speed_factor(&self) -> f32 {
        self.event_def().map_or(1.0, |e| e.obstacle_speed)
    }

    pub fn forced_obstacle(&self) -> Option<ObstacleDef> {
        self.event_def().and_then(|e| e.extra_obstacle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_environment_cycle() {
        assert_eq!(Environment::for_level(1), Environment::City);
        assert_eq!(Environment::for_level(2), Environment::Park);
        assert_eq!(Environment::for_level(3), Environment::Mall);
        assert_eq!(Environment::for_level(4), Environment::City);
        assert_eq!(Environment::for_level(0), Environment::City);
    }

    #[test]
    fn test_advance_raises_difficulty() {
        let mut levels = LevelManager::default();
        assert_eq!(levels.advance_level(), 2);
        assert_eq!(levels.environment, Environment::Park);
        assert!((levels.difficulty - 1.1).abs() < 1e-6);
        assert!(levels.level_finished(1000.0, 500.0));
        assert!(!levels.level_finished(999.0, 500.0));
    }

    #[test]
    fn test_every_environment_has_both_elevations() {
        for env in Environment::CYCLE {
            let def = env.def();
            assert!(def.obstacles.iter().any(|o| o.elevation == Elevation::Ground));
            assert!(def.obstacles.iter().any(|o| o.elevation == Elevation::Air));
            assert!(def.collectibles.iter().any(|c| c.kind == CollectibleKind::Coin));
        }
    }

    #[test]
    fn test_event_lifecycle() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut levels = LevelManager::default();

        assert!(levels.maybe_start_event(999.0, 1000.0, 0.0, &mut rng).is_none());
        let event = levels.maybe_start_event(1000.0, 1000.0, 5_000.0, &mut rng).unwrap();
        assert_eq!(event.id, "police_chase");
        assert_eq!(levels.score_multiplier(), 3.0);
        assert_eq!(levels.obstacle_speed_factor(), 2.0);
        assert!(levels.forced_obstacle().is_none());

        // No second event while one is running
        assert!(levels.maybe_start_event(5000.0, 1000.0, 6_000.0, &mut rng).is_none());

        assert_eq!(levels.expire_event(29_999.0), None);
        assert_eq!(levels.expire_event(30_000.0), Some("police_chase"));
        assert_eq!(levels.score_multiplier(), 1.0);
    }

    #[test]
    fn test_squirrel_party_forces_squirrels() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut levels = LevelManager::default();
        levels.advance_level();
        let event = levels.maybe_start_event(1000.0, 1000.0, 0.0, &mut rng).unwrap();
        assert_eq!(event.id, "squirrel_party");
        assert_eq!(levels.coin_multiplier(), 1.5);
        assert_eq!(levels.forced_obstacle().map(|o| o.kind), Some("squirrel"));
    }
}
