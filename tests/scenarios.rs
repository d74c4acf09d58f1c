//! End-to-end runs through the public API, driven by a manual clock and
//! in-memory storage

use sneak_dog::Game;
use sneak_dog::audio::{NullAudio, RecordingAudio};
use sneak_dog::platform::{ManualClock, MemoryStorage};
use sneak_dog::progression::Rejection;
use sneak_dog::sim::{
    EffectKind, Elevation, GameEvent, GamePhase, GameState, Obstacle, Rect, TickInput, tick,
};
use sneak_dog::tuning::Tuning;

const TAP: TickInput = TickInput {
    tap: true,
    pause: false,
};
const IDLE: TickInput = TickInput {
    tap: false,
    pause: false,
};

fn playing(seed: u64) -> GameState {
    let mut state = GameState::new(Tuning::default(), seed);
    tick(&mut state, &TAP);
    assert_eq!(state.phase, GamePhase::Playing);
    state.take_events();
    state
}

#[test]
fn obstacle_spawns_at_edge_and_scores_once_passed() {
    let mut state = playing(2024);
    let tuning = state.tuning.clone();
    // Let the obstacle through whatever its elevation
    assert!(state.activate_effect(EffectKind::Ghost));
    let started = state.time_ms;

    let mut ticks = 0;
    while state.obstacles.is_empty() {
        tick(&mut state, &IDLE);
        ticks += 1;
        assert!(ticks < 200, "no obstacle spawned");
    }
    assert!(state.time_ms - started > tuning.obstacle_interval_ms);
    assert_eq!(state.obstacles.len(), 1);
    assert_eq!(state.obstacles[0].rect.left(), tuning.canvas_width);
    assert_eq!(state.session.score(), 0);
    assert_eq!(state.session.game_speed, tuning.base_speed);

    while state.session.score() == 0 {
        tick(&mut state, &IDLE);
        ticks += 1;
        assert!(ticks < 400, "obstacle never passed");
    }
    assert_eq!(state.phase, GamePhase::Playing);
    assert_eq!(state.session.score(), 1);
    assert!(state.take_events().contains(&GameEvent::ObstaclePassed { score: 1 }));
    assert_eq!(
        state.session.game_speed,
        (tuning.base_speed + tuning.speed_per_score).min(tuning.max_speed)
    );
}

#[test]
fn purchase_deducts_exact_price_then_rejects_repeat() {
    let clock = ManualClock::new(1_700_000_000_000.0);
    let mut game = Game::new(
        &clock,
        Box::new(MemoryStorage::new()),
        Box::new(NullAudio),
        Tuning::default(),
        1,
    );

    // First magnet upgrade costs 100
    game.wallet.coins = 150;
    assert_eq!(game.buy_store_level("magnet"), Ok(2));
    assert_eq!(game.wallet.coins, 50);

    // A one-off unlock is refused the second time
    game.wallet.coins = 350;
    assert_eq!(game.unlock_cosmetic("bowtie"), Ok(()));
    assert_eq!(game.wallet.coins, 50);
    assert!(game.customization.is_unlocked("bowtie"));
    assert!(matches!(
        game.unlock_cosmetic("bowtie"),
        Err(Rejection::AlreadyOwned(_))
    ));
    assert_eq!(game.wallet.coins, 50);

    let saved = game.storage().get_item("sneak_dog_wallet");
    assert!(saved.is_some_and(|json| json.contains("50")));
}

#[test]
fn shield_absorbs_one_hit() {
    let mut state = playing(7);
    assert!(state.activate_effect(EffectKind::Shield));
    assert_eq!(state.player.shield_hits, 1);

    let p = state.player.rect;
    state.obstacles.push(Obstacle {
        id: 500,
        kind: "hydrant",
        rect: Rect::new(p.left() + 5.0, p.top() + 5.0, 30.0, 40.0),
        moving: false,
        elevation: Elevation::Ground,
        color: "#ff0000",
        passed: false,
    });
    tick(&mut state, &IDLE);

    assert_eq!(state.player.shield_hits, 0);
    assert_eq!(state.phase, GamePhase::Playing);
    assert!(state.obstacles.iter().all(|o| o.id != 500));
    assert!(
        state
            .take_events()
            .contains(&GameEvent::ShieldAbsorbed { remaining: 0 })
    );
}

#[test]
fn full_run_pays_out_and_persists() {
    let clock = ManualClock::new(1_700_000_000_000.0);
    let mut game = Game::new(
        &clock,
        Box::new(MemoryStorage::new()),
        Box::new(RecordingAudio::default()),
        Tuning::default(),
        99,
    );

    let mut now = 0.0;
    game.frame(now);
    game.tap();
    // Run until the first unshielded hit ends it
    for _ in 0..20_000 {
        now += 1000.0 / 60.0;
        game.frame(now);
        if game.state.phase == GamePhase::GameOver {
            break;
        }
    }
    assert_eq!(game.state.phase, GamePhase::GameOver);
    assert_eq!(game.achievements.stats.runs, 1);
    assert!(game.achievements.is_unlocked("firstHeist"));

    let storage = game.into_storage();
    let mut reloaded = Game::new(&clock, storage, Box::new(NullAudio), Tuning::default(), 5);
    assert_eq!(reloaded.achievements.stats.runs, 1);
    assert!(reloaded.wallet.coins >= 100);

    // Pausing freezes game time
    reloaded.tap();
    reloaded.step();
    reloaded.toggle_pause();
    reloaded.step();
    let frozen = reloaded.state.time_ms;
    reloaded.step();
    assert_eq!(reloaded.state.phase, GamePhase::Paused);
    assert_eq!(reloaded.state.time_ms, frozen);
}
