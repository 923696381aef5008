//! Browser bindings
//!
//! JavaScript owns the canvas, audio and key handling. It calls `frame` from
//! `requestAnimationFrame`, reads the snapshot and drained events back as
//! JSON, and forwards key presses. Stats and settings live in LocalStorage.

use wasm_bindgen::prelude::*;

use crate::Direction;
use crate::settings::Settings;
use crate::sim::{FrameInput, GameEvent, GameState, tick};
use crate::snapshot::Snapshot;
use crate::stats::{LocalStorage, MetaStats};

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("Logger already set: {e}").into());
    }
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct WebGame {
    state: GameState,
    /// Input collected since the last frame
    input: FrameInput,
    settings: Settings,
    store: LocalStorage,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> WebGame {
        let store = LocalStorage;
        let settings = Settings::load(&store);
        let mut state = GameState::new(seed);
        state.stats = MetaStats::load(&store);
        state.muted = settings.muted;
        log::info!("Snake Forest ready (seed {seed})");
        WebGame {
            state,
            input: FrameInput::default(),
            settings,
            store,
        }
    }

    /// New game seeded from `Math.random`
    pub fn random() -> WebGame {
        let seed = (js_sys::Math::random() * u32::MAX as f64) as u64;
        WebGame::new(seed)
    }

    /// Queue a direction: "up", "down", "left" or "right"
    pub fn steer(&mut self, dir: &str) {
        self.input.steer = match dir {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            other => {
                log::warn!("Unknown direction {other:?}");
                return;
            }
        };
    }

    pub fn start(&mut self) {
        self.input.start = true;
    }

    pub fn pause(&mut self) {
        self.input.pause = true;
    }

    pub fn quit(&mut self) {
        self.input.quit = true;
    }

    pub fn toggle_mute(&mut self) {
        self.input.toggle_mute = true;
    }

    pub fn set_autopilot(&mut self, on: bool) {
        self.input.autopilot = on;
    }

    /// Advance by `dt_ms` of real time and persist anything that changed
    pub fn frame(&mut self, dt_ms: f32) {
        let input = std::mem::take(&mut self.input);
        self.input.autopilot = input.autopilot;
        tick::frame(&mut self.state, &input, dt_ms);

        let mut stats_dirty = false;
        let mut settings_dirty = false;
        for event in self.state.unread_events() {
            match event {
                GameEvent::StatsUpdated => stats_dirty = true,
                GameEvent::MuteChanged(muted) => {
                    self.settings.muted = *muted;
                    settings_dirty = true;
                }
                _ => {}
            }
        }
        if stats_dirty {
            if let Err(e) = self.state.stats.save(&mut self.store) {
                log::warn!("Failed to save stats: {e}");
            }
        }
        if settings_dirty {
            if let Err(e) = self.settings.save(&mut self.store) {
                log::warn!("Failed to save settings: {e}");
            }
        }
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        Snapshot::capture(&self.state).to_json().map_err(js_error)
    }

    /// Events since the last call, as a JSON array
    pub fn drain_events_json(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state.drain_events()).map_err(js_error)
    }

    pub fn music_gain(&self) -> f32 {
        self.settings.music_gain()
    }

    pub fn sfx_gain(&self) -> f32 {
        self.settings.sfx_gain()
    }

    pub fn weather_enabled(&self) -> bool {
        self.settings.effective_weather()
    }

    pub fn set_volumes(&mut self, master: f32, sfx: f32, music: f32) {
        self.settings.master_volume = master.clamp(0.0, 1.0);
        self.settings.sfx_volume = sfx.clamp(0.0, 1.0);
        self.settings.music_volume = music.clamp(0.0, 1.0);
        if let Err(e) = self.settings.save(&mut self.store) {
            log::warn!("Failed to save settings: {e}");
        }
    }

    pub fn set_reduced_motion(&mut self, on: bool) {
        self.settings.reduced_motion = on;
        if let Err(e) = self.settings.save(&mut self.store) {
            log::warn!("Failed to save settings: {e}");
        }
    }
}
