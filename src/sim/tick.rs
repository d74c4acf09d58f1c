//! Fixed timestep simulation tick
//!
//! One call advances the run by [`SIM_DT_MS`] of game time. Inside a playing
//! tick the order is fixed: inputs, physics, spawning, collisions, effect
//! expiry.

use super::geometry::collides;
use super::levels::CollectibleKind;
use super::physics;
use super::state::{GameEvent, GamePhase, GameState, RestartMode};
use crate::consts::SIM_DT_MS;

/// Experience a bone is worth to the active pet
pub const BONE_PET_EXPERIENCE: u32 = 10;
/// Coins credited for an environment key
pub const KEY_COIN_VALUE: u64 = 5;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Tap/click/space: start, jump or restart depending on phase
    pub tap: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                state.events.push(GameEvent::Paused);
                return;
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                state.events.push(GameEvent::Resumed);
            }
            _ => {}
        }
    }

    // Paused freezes everything, including game time
    if state.phase == GamePhase::Paused {
        return;
    }

    state.time_ms += SIM_DT_MS;

    match state.phase {
        GamePhase::Menu => {
            if input.tap {
                state.start_run();
            }
        }
        GamePhase::GameOver => {
            if input.tap {
                match state.restart_mode {
                    RestartMode::ToMenu => state.phase = GamePhase::Menu,
                    RestartMode::Instant => state.start_run(),
                }
            }
        }
        GamePhase::Playing => {
            if playing_tick(state, input) {
                return;
            }
        }
        GamePhase::Paused => {}
    }

    state.expire_effects();
    if let Some(id) = state.level.expire_event(state.time_ms) {
        state.events.push(GameEvent::LevelEventEnded { id });
    }
}

/// Returns true if the run ended this tick
fn playing_tick(state: &mut GameState, input: &TickInput) -> bool {
    let now = state.time_ms;

    // === Inputs ===
    if input.tap && physics::jump(&mut state.player, state.modifiers.jump_force) {
        state.session.stats.jumps += 1;
        state.events.push(GameEvent::Jumped);
    }

    // === Physics ===
    physics::step(&mut state.player, state.tuning.gravity, state.tuning.ground_y());
    scroll_world(state);
    score_passed_obstacles(state);
    advance_level(state, now);

    // === Spawning ===
    let score = state.session.score();
    if let Some(obstacle) =
        state
            .spawner
            .maybe_spawn_obstacle(now, score, &state.tuning, &state.level)
    {
        state.obstacles.push(obstacle);
    }
    if let Some(collectible) = state.spawner.maybe_spawn_collectible(
        now,
        score,
        &state.tuning,
        &state.level,
        state.modifiers.collectible_rate_bonus_pct,
    ) {
        state.collectibles.push(collectible);
    }

    // === Collisions ===
    if resolve_obstacle_collisions(state) {
        state.end_run();
        return true;
    }
    collect_collectibles(state);

    false
}

/// Level event obstacle speed, damped by the control upgrade
fn event_speed_factor(state: &GameState) -> f32 {
    let factor = state.level.obstacle_speed_factor();
    let control = state.modifiers.control_bonus.clamp(0.0, 1.0);
    1.0 + (factor - 1.0) * (1.0 - control)
}

/// Move every entity left, drop the ones past the edge, accumulate distance
fn scroll_world(state: &mut GameState) {
    let scroll = state.session.game_speed
        * state.player.speed_multiplier
        * state.session.time_scale
        * event_speed_factor(state);
    let moving_extra = state.tuning.moving_obstacle_speed * state.session.time_scale;

    for obstacle in &mut state.obstacles {
        obstacle.rect.pos.x -= scroll;
        if obstacle.moving {
            obstacle.rect.pos.x -= moving_extra;
        }
    }
    for collectible in &mut state.collectibles {
        collectible.rect.pos.x -= scroll;
    }
    state.obstacles.retain(|o| !o.rect.is_off_screen_left());
    state.collectibles.retain(|c| !c.rect.is_off_screen_left());

    state.session.stats.distance_m += scroll / state.tuning.pixels_per_meter;
}

/// +1 (scaled by the level event) for every obstacle fully behind the player
fn score_passed_obstacles(state: &mut GameState) {
    let player_left = state.player.rect.left();
    let per_obstacle = (state.level.score_multiplier().max(1.0)).round() as u64;

    for obstacle in state.obstacles.iter_mut().filter(|o| !o.passed) {
        if obstacle.rect.right() < player_left {
            obstacle.passed = true;
            state.session.stats.score += per_obstacle;
            state.events.push(GameEvent::ObstaclePassed {
                score: state.session.stats.score,
            });
        }
    }

    // Speed only ever grows because score only ever grows
    let speed = state.tuning.speed_for_score(state.session.stats.score);
    state.session.game_speed = speed;
    if speed >= state.tuning.max_speed {
        state.session.stats.reached_max_speed = true;
    }
}

fn advance_level(state: &mut GameState, now: f64) {
    let distance = state.session.stats.distance_m;
    if state.level.level_finished(distance, state.tuning.level_length_m) {
        let stats = &mut state.session.stats;
        let level_ms = now - state.session.level_started_at_ms;
        stats.levels_completed += 1;
        stats.fastest_level_ms = Some(stats.fastest_level_ms.map_or(level_ms, |f| f.min(level_ms)));
        if stats.hits_taken == state.session.level_start_hits {
            stats.perfect_levels += 1;
        }
        let completed = state.level.level;
        state.level.advance_level();
        state.session.level_started_at_ms = now;
        state.session.level_start_hits = stats.hits_taken;
        state.events.push(GameEvent::LevelCompleted { level: completed });
    }

    if let Some(event) = state.level.maybe_start_event(
        distance,
        state.tuning.level_event_spacing_m,
        now,
        state.spawner.rng(),
    ) {
        state.events.push(GameEvent::LevelEventStarted { id: event.id });
    }
}

/// Returns true if an unshielded hit ends the run
fn resolve_obstacle_collisions(state: &mut GameState) -> bool {
    if !state.player.collision_enabled {
        return false;
    }

    let player = state.player.rect;
    let mut fatal = false;
    let mut absorbed = Vec::new();
    for obstacle in &state.obstacles {
        if !collides(&player, &obstacle.rect, 0.0) {
            continue;
        }
        if state.player.shield_hits > 0 {
            state.player.shield_hits -= 1;
            state.session.stats.hits_taken += 1;
            absorbed.push(obstacle.id);
            state.events.push(GameEvent::ShieldAbsorbed {
                remaining: state.player.shield_hits,
            });
        } else {
            fatal = true;
            break;
        }
    }
    state.obstacles.retain(|o| !absorbed.contains(&o.id));
    fatal
}

/// Pick up everything within reach; removal and credit happen together
fn collect_collectibles(state: &mut GameState) {
    let player = state.player.rect;
    let reach = state.player.magnet_radius;
    let coin_multiplier = state.modifiers.coin_multiplier * state.level.coin_multiplier();

    let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.collectibles)
        .into_iter()
        .partition(|c| collides(&player, &c.rect, reach));
    state.collectibles = kept;

    let stats = &mut state.session.stats;
    for collectible in taken {
        let coins = match collectible.kind {
            CollectibleKind::Coin => (coin_multiplier.max(0.0)).round() as u64,
            CollectibleKind::Bone => {
                stats.bones += 1;
                1
            }
            CollectibleKind::Key => {
                stats.keys += 1;
                KEY_COIN_VALUE
            }
        };
        stats.coins += coins;
        state.events.push(GameEvent::Collected {
            kind: collectible.kind,
            coins,
        });
    }
}
