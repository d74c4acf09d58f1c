//! Root game context
//!
//! [`Game`] owns the simulation and every ledger and wires them together.
//! Nothing reaches anything through globals: the clock, the storage backend
//! and the audio sink are handed in at construction, so the same context runs
//! in the browser host and in tests.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::audio::{AudioSink, SoundCue};
use crate::highscores::HighScores;
use crate::persistence::Persisted;
use crate::platform::{Clock, FrameDriver, Storage};
use crate::progression::pets::PetAbility;
use crate::progression::{
    Achievements, ChallengeKind, Challenges, Crafting, Customization, DailyRewards, Equipment,
    Grants, Missions, Notification, Pets, Progress, Quests, Rejection, SkillTree, Store, Wallet,
};
use crate::settings::Settings;
use crate::sim::levels::Environment;
use crate::sim::{
    Collectible, EffectKind, GameEvent, GamePhase, GameState, Obstacle, PlayerBody, RunModifiers,
    RunStats, TickInput, tick,
};
use crate::tuning::Tuning;

/// Pet experience per metre run
const METRES_PER_PET_EXPERIENCE: f32 = 10.0;

/// Timers and charges of one power-up
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectStatus {
    pub kind: EffectKind,
    pub active: bool,
    pub remaining_ms: f64,
    pub cooldown_ms: f64,
    pub charges: u32,
}

/// Everything a host reads to draw one frame and its HUD
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub phase: GamePhase,
    pub time_ms: f64,
    pub player: &'a PlayerBody,
    pub obstacles: &'a [Obstacle],
    pub collectibles: &'a [Collectible],
    pub stats: &'a RunStats,
    pub game_speed: f32,
    pub level: u32,
    pub environment: Environment,
    pub level_event: Option<&'static str>,
    pub coins: u64,
    pub effects: Vec<EffectStatus>,
}

/// The whole game: simulation, progression ledgers and their wiring
pub struct Game<C: Clock> {
    clock: C,
    storage: Box<dyn Storage>,
    audio: Box<dyn AudioSink>,
    driver: FrameDriver,
    /// Inputs waiting for the next tick
    pending: TickInput,
    /// Mission sampling
    rng: Pcg32,
    notifications: Vec<Notification>,

    pub state: GameState,
    pub settings: Settings,
    pub highscores: HighScores,
    pub wallet: Wallet,
    pub skills: SkillTree,
    pub crafting: Crafting,
    pub store: Store,
    pub customization: Customization,
    pub pets: Pets,
    pub achievements: Achievements,
    pub quests: Quests,
    pub missions: Missions,
    pub daily: DailyRewards,
    pub challenges: Challenges,
}

impl<C: Clock> Game<C> {
    /// Build the context and load whatever progress `storage` holds
    pub fn new(
        clock: C,
        storage: Box<dyn Storage>,
        audio: Box<dyn AudioSink>,
        tuning: Tuning,
        seed: u64,
    ) -> Self {
        let mut game = Self {
            clock,
            storage,
            audio,
            driver: FrameDriver::new(),
            pending: TickInput::default(),
            rng: Pcg32::seed_from_u64(seed ^ 0x5eed_d06),
            notifications: Vec::new(),
            state: GameState::new(tuning, seed),
            settings: Settings::default(),
            highscores: HighScores::new(),
            wallet: Wallet::new(),
            skills: SkillTree::new(),
            crafting: Crafting::new(),
            store: Store::new(),
            customization: Customization::new(),
            pets: Pets::new(),
            achievements: Achievements::new(),
            quests: Quests::new(),
            missions: Missions::new(),
            daily: DailyRewards::new(),
            challenges: Challenges::new(),
        };
        game.load_all();
        game
    }

    // === Persistence ===

    /// Reload every record from storage. Missing or corrupt records leave
    /// that ledger at its defaults.
    pub fn load_all(&mut self) {
        let storage = self.storage.as_ref();
        let loaded = [
            self.settings.load(storage),
            self.highscores.load(storage),
            self.wallet.load(storage),
            self.skills.load(storage),
            self.crafting.load(storage),
            self.store.load(storage),
            self.customization.load(storage),
            self.pets.load(storage),
            self.achievements.load(storage),
            self.quests.load(storage),
            self.missions.load(storage),
            self.daily.load(storage),
            self.challenges.load(storage),
        ];
        log::info!(
            "Loaded {} of {} saved records",
            loaded.iter().filter(|l| **l).count(),
            loaded.len()
        );

        let now = self.clock.now_ms();
        self.missions.refresh(now, &mut self.rng);
        self.quests.reset_daily(now);
        self.daily.refresh(now);
        self.challenges.expire(now);

        let settings = self.settings.clone();
        self.apply_settings(settings);
        self.sync_modifiers();
    }

    /// Write every record. Failures are logged; the game keeps running.
    pub fn save_all(&mut self) {
        let storage = self.storage.as_mut();
        persist(&self.settings, storage);
        persist(&self.highscores, storage);
        persist(&self.wallet, storage);
        persist(&self.skills, storage);
        persist(&self.crafting, storage);
        persist(&self.store, storage);
        persist(&self.customization, storage);
        persist(&self.pets, storage);
        persist(&self.achievements, storage);
        persist(&self.quests, storage);
        persist(&self.missions, storage);
        persist(&self.daily, storage);
        persist(&self.challenges, storage);
    }

    // === Loop ===

    /// Tap/click/space: start, jump or restart depending on the phase
    pub fn tap(&mut self) {
        self.pending.tap = true;
    }

    pub fn toggle_pause(&mut self) {
        self.pending.pause = true;
    }

    /// Host frame callback. Runs every fixed tick that is due and returns
    /// how many ran.
    pub fn frame(&mut self, now_ms: f64) -> u32 {
        let steps = self.driver.advance(now_ms);
        for _ in 0..steps {
            self.step();
        }
        steps
    }

    /// Run exactly one fixed tick with the queued inputs
    pub fn step(&mut self) {
        let input = std::mem::take(&mut self.pending);
        tick(&mut self.state, &input);
        self.drain_events();
    }

    /// Host went to the background: pause a live run and forget the frame
    /// baseline so the return does not fast-forward
    pub fn suspend(&mut self) {
        self.driver.reset();
        if self.state.phase == GamePhase::Playing {
            tick(
                &mut self.state,
                &TickInput {
                    pause: true,
                    ..Default::default()
                },
            );
            self.drain_events();
        }
    }

    fn drain_events(&mut self) {
        for event in self.state.take_events() {
            match event {
                GameEvent::Jumped => self.audio.play(SoundCue::Jump),
                GameEvent::Collected { coins, .. } => {
                    self.wallet.add(coins);
                    persist(&self.wallet, self.storage.as_mut());
                    self.audio.play(SoundCue::Coin);
                }
                GameEvent::ShieldAbsorbed { .. } => self.audio.play(SoundCue::Hit),
                GameEvent::EffectActivated(_) => self.audio.play(SoundCue::PowerUp),
                GameEvent::LevelCompleted { level } => {
                    log::info!("Level {} complete", level);
                    self.audio.play(SoundCue::LevelUp);
                }
                GameEvent::LevelEventStarted { id } => log::info!("Level event {} started", id),
                GameEvent::GameOver { stats } => {
                    self.audio.play(SoundCue::GameOver);
                    self.finish_run(&stats);
                }
                GameEvent::RunStarted
                | GameEvent::ObstaclePassed { .. }
                | GameEvent::EffectExpired(_)
                | GameEvent::LevelEventEnded { .. }
                | GameEvent::Paused
                | GameEvent::Resumed => {}
            }
        }
    }

    /// Feed a finished run to every ledger, then persist everything
    fn finish_run(&mut self, run: &RunStats) {
        let now = self.clock.now_ms();
        let mut notes = Vec::new();

        if let Some(rank) =
            self.highscores
                .add_score(run.score, run.distance_m, self.state.level.level, now)
        {
            log::info!("Run placed #{} on the leaderboard", rank);
            if rank == 1 {
                notes.push(Notification::NewHighScore { rank });
            }
        }

        self.achievements.stats.record_run(run);
        let lifetime = self.achievements.stats.clone();
        let progress = Progress {
            run,
            lifetime: &lifetime,
            any_upgrade_maxed: self.store.any_upgrade_maxed(),
            all_characters_owned: self.store.all_characters_owned(),
        };

        let mut grants = Grants {
            wallet: &mut self.wallet,
            skills: &mut self.skills,
            crafting: &mut self.crafting,
        };
        notes.extend(self.achievements.evaluate(&progress, &mut grants));
        self.missions.refresh(now, &mut self.rng);
        notes.extend(self.missions.evaluate(&progress, &mut grants));
        self.quests.reset_daily(now);
        notes.extend(self.quests.record_run(run, &mut grants));
        notes.extend(self.challenges.record_run(run, now, &mut grants));

        let exp_bonus = self.customization.total_stats().exp_bonus;
        notes.extend(self.pets.gain_experience(pet_experience(run, exp_bonus)));

        self.save_all();
        self.notify(notes);
        self.sync_modifiers();
    }

    fn notify(&mut self, notes: Vec<Notification>) {
        for note in &notes {
            log::info!("{:?}", note);
            self.audio.play(note.cue());
        }
        self.notifications.extend(notes);
    }

    /// Notifications raised since the last call
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    // === Power-ups ===

    /// Activate a power-up for free. Ignored outside a run or during cooldown.
    pub fn activate_power_up(&mut self, kind: EffectKind) -> bool {
        let activated = self.state.activate_effect(kind);
        self.drain_events();
        activated
    }

    /// Spend a crafted charge on a power-up. The charge is only consumed if
    /// the effect actually starts.
    pub fn use_charge(&mut self, kind: EffectKind) -> Result<(), Rejection> {
        if self.crafting.charges(kind) == 0 {
            return Err(Rejection::NoCharges(kind.name().to_string()));
        }
        if !self.activate_power_up(kind) {
            return Err(Rejection::NotActivatable(kind.name().to_string()));
        }
        self.crafting.consume_charge(kind)?;
        persist(&self.crafting, self.storage.as_mut());
        Ok(())
    }

    // === Purchases and ledger operations ===

    pub fn buy_store_level(&mut self, id: &str) -> Result<u32, Rejection> {
        let level = self.store.buy_level(id, &mut self.wallet)?;
        self.committed(SoundCue::Purchase);
        Ok(level)
    }

    pub fn buy_character(&mut self, id: &str) -> Result<(), Rejection> {
        self.store.buy_character(id, &mut self.wallet)?;
        self.committed(SoundCue::Purchase);
        Ok(())
    }

    pub fn select_character(&mut self, id: Option<&str>) -> Result<(), Rejection> {
        self.store.select_character(id)?;
        self.committed(SoundCue::Click);
        Ok(())
    }

    pub fn unlock_cosmetic(&mut self, id: &str) -> Result<(), Rejection> {
        self.customization.unlock(id, &mut self.wallet)?;
        self.committed(SoundCue::Purchase);
        Ok(())
    }

    /// Equip or unequip; returns whether it is now equipped
    pub fn toggle_cosmetic(&mut self, id: &str) -> Result<bool, Rejection> {
        let equipped = self.customization.toggle(id)?;
        self.committed(SoundCue::Click);
        Ok(equipped)
    }

    pub fn unlock_pet(&mut self, id: &str) -> Result<(), Rejection> {
        self.pets.unlock(id, &mut self.wallet)?;
        self.committed(SoundCue::Purchase);
        Ok(())
    }

    pub fn select_pet(&mut self, id: &str) -> Result<(), Rejection> {
        self.pets.select(id)?;
        self.committed(SoundCue::Click);
        Ok(())
    }

    pub fn upgrade_skill(&mut self, id: &str) -> Result<u32, Rejection> {
        let level = self.skills.upgrade(id)?;
        self.committed(SoundCue::LevelUp);
        Ok(level)
    }

    pub fn craft(&mut self, recipe: &str) -> Result<(), Rejection> {
        self.crafting.craft(recipe)?;
        self.committed(SoundCue::Unlock);
        Ok(())
    }

    pub fn start_quest(&mut self, id: &str) -> Result<(), Rejection> {
        self.quests.start(id)?;
        self.committed(SoundCue::Click);
        Ok(())
    }

    pub fn claim_daily(&mut self) -> Result<(), Rejection> {
        let now = self.clock.now_ms();
        let mut grants = Grants {
            wallet: &mut self.wallet,
            skills: &mut self.skills,
            crafting: &mut self.crafting,
        };
        let note = self.daily.claim(now, &mut grants)?;
        self.save_all();
        self.notify(vec![note]);
        self.sync_modifiers();
        Ok(())
    }

    pub fn create_challenge(
        &mut self,
        kind: ChallengeKind,
        duration_hours: f64,
        reward: u64,
    ) -> Result<u32, Rejection> {
        let now = self.clock.now_ms();
        let id = self.challenges.create(kind, duration_hours, reward, now)?;
        self.committed(SoundCue::Click);
        Ok(id)
    }

    /// A ledger changed: play its cue, rederive modifiers, persist
    fn committed(&mut self, cue: SoundCue) {
        self.audio.play(cue);
        self.sync_modifiers();
        self.save_all();
    }

    // === Settings ===

    pub fn apply_settings(&mut self, mut settings: Settings) {
        settings.sanitize();
        self.state.restart_mode = settings.restart_mode;
        self.audio.set_volume(settings.effective_sfx_volume());
        self.settings = settings;
        persist(&self.settings, self.storage.as_mut());
    }

    // === Derived gameplay values ===

    /// Recompute the run modifiers from every ledger. They take effect when
    /// the next run starts.
    pub fn sync_modifiers(&mut self) {
        let modifiers = derive_modifiers(
            &self.state.tuning,
            &self.skills,
            &self.store,
            &self.crafting,
            &self.customization,
            &self.pets,
        );
        if modifiers != self.state.modifiers {
            log::debug!("Run modifiers now {:?}", modifiers);
            self.state.modifiers = modifiers;
        }
    }

    // === Host views ===

    pub fn snapshot(&self) -> Snapshot<'_> {
        let state = &self.state;
        let now = state.time_ms;
        let effects = EffectKind::ALL
            .into_iter()
            .map(|kind| EffectStatus {
                kind,
                active: state.effects.is_active(kind),
                remaining_ms: state.effects.remaining_duration(kind, now),
                cooldown_ms: state.effects.remaining_cooldown(kind, now),
                charges: self.crafting.charges(kind),
            })
            .collect();

        Snapshot {
            phase: state.phase,
            time_ms: now,
            player: &state.player,
            obstacles: &state.obstacles,
            collectibles: &state.collectibles,
            stats: &state.session.stats,
            game_speed: state.session.game_speed,
            level: state.level.level,
            environment: state.level.environment,
            level_event: state.level.active_event.map(|e| e.id),
            coins: self.wallet.coins,
            effects,
        }
    }

    /// Every ledger's persisted record as one JSON object, keyed by ledger
    pub fn ledgers_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        record_into(&mut map, &self.wallet);
        record_into(&mut map, &self.highscores);
        record_into(&mut map, &self.settings);
        record_into(&mut map, &self.skills);
        record_into(&mut map, &self.crafting);
        record_into(&mut map, &self.store);
        record_into(&mut map, &self.customization);
        record_into(&mut map, &self.pets);
        record_into(&mut map, &self.achievements);
        record_into(&mut map, &self.quests);
        record_into(&mut map, &self.missions);
        record_into(&mut map, &self.daily);
        record_into(&mut map, &self.challenges);
        serde_json::Value::Object(map)
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Tear down the context, keeping its storage backend
    pub fn into_storage(self) -> Box<dyn Storage> {
        self.storage
    }
}

fn persist<P: Persisted>(ledger: &P, storage: &mut dyn Storage) {
    if let Err(e) = ledger.save(storage) {
        log::warn!("Failed to save {}: {}", P::STORAGE_KEY, e);
    }
}

fn record_into<P: Persisted>(map: &mut serde_json::Map<String, serde_json::Value>, ledger: &P) {
    let key = P::STORAGE_KEY.trim_start_matches("sneak_dog_");
    match serde_json::to_value(ledger.to_record()) {
        Ok(value) => {
            map.insert(key.to_string(), value);
        }
        Err(e) => log::warn!("Cannot show {}: {}", key, e),
    }
}

/// `distance / 10 + bones * 10`, scaled by the outfit experience bonus
fn pet_experience(run: &RunStats, exp_bonus_pct: f32) -> u64 {
    let base = (run.distance_m / METRES_PER_PET_EXPERIENCE).floor()
        + (run.bones * crate::sim::tick::BONE_PET_EXPERIENCE) as f32;
    (base * (1.0 + exp_bonus_pct / 100.0)).floor().max(0.0) as u64
}

fn derive_modifiers(
    tuning: &Tuning,
    skills: &SkillTree,
    store: &Store,
    crafting: &Crafting,
    customization: &Customization,
    pets: &Pets,
) -> RunModifiers {
    let outfit = customization.total_stats();
    let character = store.selected_character();
    let jump_mult = character.map_or(1.0, |c| c.jump_multiplier);
    let speed_mult = character.map_or(1.0, |c| c.speed_multiplier);
    let coin_mult = character.map_or(1.0, |c| c.coin_multiplier);
    let shield_mult = character.map_or(1.0, |c| c.shield_multiplier);

    let double_jump =
        skills.is_unlocked("double_jump") || crafting.has_equipment(Equipment::DoubleJumpBoots);
    let magnet_field = skills.value("magnet_field");
    let treasure_hunter = skills.value("treasure_hunter");

    let shield_hits = (store.shield_hits() as f32 * shield_mult).ceil();

    RunModifiers {
        jump_force: store.jump_force(tuning.jump_force)
            * (1.0 + outfit.jump_height / 100.0)
            * jump_mult,
        base_jumps: if double_jump { 2 } else { 1 },
        base_magnet_radius: magnet_field * (1.0 + treasure_hunter / 100.0),
        coin_multiplier: store.coin_multiplier() * (1.0 + outfit.coin_bonus / 100.0) * coin_mult,
        speed_bonus_pct: skills.value("agility")
            + outfit.speed
            + pets.active_bonus(PetAbility::SpeedBoost)
            + (speed_mult - 1.0) * 100.0,
        collectible_rate_bonus_pct: pets.active_bonus(PetAbility::CoinFinder)
            + outfit.luck
            + (crafting.luck_multiplier() - 1.0) * 100.0,
        magnet_effect_radius: store.magnet_radius(),
        shield_effect_hits: shield_hits.clamp(1.0, u8::MAX as f32) as u8,
        slow_time_scale: store.slow_time_scale(),
        effect_duration_bonus_pct: pets.active_bonus(PetAbility::PowerupBoost),
        control_bonus: store.control_bonus(),
    }
}
