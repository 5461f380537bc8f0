//! Browser bindings
//!
//! A JavaScript host drives the game from `requestAnimationFrame`, feeding
//! the frame timestamp to `step` and drawing from `snapshot_json`.

use wasm_bindgen::prelude::*;

use crate::game::Game;
use crate::sim::GameOverHook;
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        // Another module already installed a logger
        return;
    }
    log::info!("Lane Runner wasm module loaded");
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Forwards the final score to a JS callback
struct JsGameOver(js_sys::Function);

impl GameOverHook for JsGameOver {
    fn on_game_over(&mut self, final_score: u64) {
        let score = JsValue::from_f64(final_score as f64);
        if let Err(err) = self.0.call1(&JsValue::NULL, &score) {
            log::error!("Game-over callback threw: {:?}", err);
        }
    }
}

#[wasm_bindgen]
pub struct WebGame {
    game: Game,
}

#[wasm_bindgen]
impl WebGame {
    /// Default tuning fitted to the canvas size
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u32, width: f32, height: f32) -> Result<WebGame, JsValue> {
        let game = Game::try_new(u64::from(seed), Tuning::for_viewport(width, height)).map_err(to_js_error)?;
        Ok(WebGame { game })
    }

    /// Build from a JSON tuning override
    #[wasm_bindgen(js_name = fromTuning)]
    pub fn from_tuning(seed: u32, tuning_json: &str) -> Result<WebGame, JsValue> {
        let tuning = Tuning::from_json(tuning_json).map_err(to_js_error)?;
        let game = Game::try_new(u64::from(seed), tuning).map_err(to_js_error)?;
        Ok(WebGame { game })
    }

    /// Register `callback(score)` to run when the last life is lost
    #[wasm_bindgen(js_name = onGameOver)]
    pub fn on_game_over(&mut self, callback: js_sys::Function) {
        self.game.set_game_over_hook(JsGameOver(callback));
    }

    pub fn start(&mut self) {
        self.game.start();
    }

    pub fn stop(&mut self) {
        self.game.stop();
    }

    pub fn restart(&mut self) {
        self.game.restart();
    }

    /// Advance one frame; `timestamp` is the rAF time in milliseconds
    pub fn step(&mut self, timestamp: f64) -> bool {
        self.game.step(timestamp)
    }

    #[wasm_bindgen(js_name = setJump)]
    pub fn set_jump(&mut self, pressed: bool) {
        self.game.set_jump(pressed);
    }

    #[wasm_bindgen(js_name = snapshotJson)]
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        self.game
            .snapshot()
            .to_json()
            .map_err(to_js_error)
    }

    pub fn score(&self) -> f64 {
        self.game.score() as f64
    }

    pub fn lives(&self) -> u8 {
        self.game.lives()
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.game.is_running()
    }

    #[wasm_bindgen(js_name = isGameOver)]
    pub fn is_game_over(&self) -> bool {
        self.game.is_game_over()
    }
}
