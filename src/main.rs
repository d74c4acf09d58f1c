//! Sneak Dog entry point
//!
//! Handles platform-specific initialization and runs the game loop. The page
//! draws the run itself from `GameHandle::snapshot` and drives the shop,
//! skill, crafting and quest panels through the other `GameHandle` methods;
//! this host feeds inputs and frame timestamps in and mirrors a few numbers
//! into the HUD.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use sneak_dog::Game;
    use sneak_dog::Tuning;
    use sneak_dog::audio::WebAudio;
    use sneak_dog::platform::{LocalStorage, WallClock};
    use sneak_dog::progression::{ChallengeKind, Rejection};
    use sneak_dog::sim::{EffectKind, GamePhase};

    type Shared = Rc<RefCell<Game<WallClock>>>;

    thread_local! {
        static GAME: RefCell<Option<Shared>> = const { RefCell::new(None) };
    }

    /// Page-side handle on the running game. Gated operations reject with
    /// the reason as a string.
    #[wasm_bindgen]
    pub struct GameHandle {
        game: Shared,
    }

    /// Handle on the game started by the module, once it is running
    #[wasm_bindgen]
    pub fn game_handle() -> Option<GameHandle> {
        GAME.with(|g| g.borrow().clone()).map(|game| GameHandle { game })
    }

    fn rejected(e: Rejection) -> JsValue {
        JsValue::from_str(&e.to_string())
    }

    fn effect(kind: &str) -> Result<EffectKind, JsValue> {
        EffectKind::from_id(kind).ok_or_else(|| rejected(Rejection::UnknownId(kind.to_string())))
    }

    fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
        serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen]
    impl GameHandle {
        pub fn tap(&self) {
            self.game.borrow_mut().tap();
        }

        pub fn toggle_pause(&self) {
            self.game.borrow_mut().toggle_pause();
        }

        /// Free activation; false outside a run, on cooldown or for an unknown kind
        pub fn activate_power_up(&self, kind: &str) -> bool {
            match EffectKind::from_id(kind) {
                Some(kind) => self.game.borrow_mut().activate_power_up(kind),
                None => false,
            }
        }

        pub fn use_charge(&self, kind: &str) -> Result<(), JsValue> {
            let kind = effect(kind)?;
            self.game.borrow_mut().use_charge(kind).map_err(rejected)
        }

        pub fn buy_store_level(&self, id: &str) -> Result<u32, JsValue> {
            self.game.borrow_mut().buy_store_level(id).map_err(rejected)
        }

        pub fn buy_character(&self, id: &str) -> Result<(), JsValue> {
            self.game.borrow_mut().buy_character(id).map_err(rejected)
        }

        /// Pass `undefined` to go back to the default runner
        pub fn select_character(&self, id: Option<String>) -> Result<(), JsValue> {
            self.game
                .borrow_mut()
                .select_character(id.as_deref())
                .map_err(rejected)
        }

        pub fn unlock_cosmetic(&self, id: &str) -> Result<(), JsValue> {
            self.game.borrow_mut().unlock_cosmetic(id).map_err(rejected)
        }

        pub fn toggle_cosmetic(&self, id: &str) -> Result<bool, JsValue> {
            self.game.borrow_mut().toggle_cosmetic(id).map_err(rejected)
        }

        pub fn unlock_pet(&self, id: &str) -> Result<(), JsValue> {
            self.game.borrow_mut().unlock_pet(id).map_err(rejected)
        }

        pub fn select_pet(&self, id: &str) -> Result<(), JsValue> {
            self.game.borrow_mut().select_pet(id).map_err(rejected)
        }

        pub fn upgrade_skill(&self, id: &str) -> Result<u32, JsValue> {
            self.game.borrow_mut().upgrade_skill(id).map_err(rejected)
        }

        pub fn craft(&self, recipe: &str) -> Result<(), JsValue> {
            self.game.borrow_mut().craft(recipe).map_err(rejected)
        }

        pub fn start_quest(&self, id: &str) -> Result<(), JsValue> {
            self.game.borrow_mut().start_quest(id).map_err(rejected)
        }

        pub fn claim_daily(&self) -> Result<(), JsValue> {
            self.game.borrow_mut().claim_daily().map_err(rejected)
        }

        /// `kind` is one of "score", "coins" or "distance"
        pub fn create_challenge(&self, kind: &str, hours: f64, reward: u64) -> Result<u32, JsValue> {
            let kind = ChallengeKind::from_id(kind)
                .ok_or_else(|| rejected(Rejection::UnknownId(kind.to_string())))?;
            self.game
                .borrow_mut()
                .create_challenge(kind, hours, reward)
                .map_err(rejected)
        }

        /// JSON view of the current frame: player, entities, run stats, effect timers
        pub fn snapshot(&self) -> Result<String, JsValue> {
            to_json(&self.game.borrow().snapshot())
        }

        /// JSON of every ledger's saved record
        pub fn ledgers(&self) -> Result<String, JsValue> {
            to_json(&self.game.borrow().ledgers_json())
        }

        /// JSON array of notifications raised since the last call
        pub fn take_notifications(&self) -> Result<String, JsValue> {
            to_json(&self.game.borrow_mut().take_notifications())
        }
    }

    /// Update HUD elements in DOM
    fn update_hud(game: &Game<WallClock>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let stats = &game.state.session.stats;

        if let Some(el) = document.query_selector("#hud-score .hud-value").ok().flatten() {
            el.set_text_content(Some(&stats.score.to_string()));
        }
        if let Some(el) = document.query_selector("#hud-coins .hud-value").ok().flatten() {
            el.set_text_content(Some(&game.wallet.coins.to_string()));
        }
        if let Some(el) = document.query_selector("#hud-distance .hud-value").ok().flatten() {
            el.set_text_content(Some(&format!("{:.0}m", stats.distance_m)));
        }
        if let Some(el) = document.query_selector("#hud-level .hud-value").ok().flatten() {
            el.set_text_content(Some(&game.state.level.level.to_string()));
        }

        for (id, phase) in [
            ("menu", GamePhase::Menu),
            ("pause-menu", GamePhase::Paused),
            ("game-over", GamePhase::GameOver),
        ] {
            if let Some(el) = document.get_element_by_id(id) {
                let class = if game.state.phase == phase { "" } else { "hidden" };
                let _ = el.set_attribute("class", class);
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            return;
        }

        log::info!("Sneak Dog starting...");

        let Some(window) = web_sys::window() else {
            log::error!("No window");
            return;
        };

        let tuning = Tuning::default();
        let seed = js_sys::Date::now() as u64;
        let game: Shared = Rc::new(RefCell::new(Game::new(
            WallClock,
            Box::new(LocalStorage::open()),
            Box::new(WebAudio::new()),
            tuning,
            seed,
        )));
        log::info!("Game initialized with seed: {}", seed);
        GAME.with(|g| *g.borrow_mut() = Some(game.clone()));

        if let Some(loading) = window.document().and_then(|d| d.get_element_by_id("loading")) {
            let _ = loading.set_attribute("class", "hidden");
        }

        setup_input_handlers(&window, game.clone());
        setup_auto_pause(&window, game.clone());

        request_animation_frame(game);

        log::info!("Sneak Dog running!");
    }

    fn setup_input_handlers(window: &web_sys::Window, game: Shared) {
        // Mouse click and touch both tap
        for event in ["mousedown", "touchstart"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                event.prevent_default();
                game.borrow_mut().tap();
            });
            let _ = window.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            let mut g = game.borrow_mut();
            match event.key().as_str() {
                " " | "Enter" | "ArrowUp" => g.tap(),
                "Escape" | "p" | "P" => g.toggle_pause(),
                _ => {}
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_auto_pause(window: &web_sys::Window, game: Shared) {
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().suspend();
                    log::info!("Auto-paused (tab hidden)");
                }
            });
            let _ = document
                .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur (click outside)
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
            let mut g = game.borrow_mut();
            if g.state.phase == GamePhase::Playing {
                log::info!("Auto-paused (window blur)");
            }
            g.suspend();
        });
        let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Shared) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Shared, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.frame(time);
            update_hud(&g);
        }

        // Keeps rescheduling while paused; the ticks are inert
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Sneak Dog (native) starting...");
    log::info!("Native mode has no host page - build for wasm32 and serve it for the playable game");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
