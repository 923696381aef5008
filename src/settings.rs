//! Game settings and preferences
//!
//! Persisted separately from the meta stats, through the same key-value
//! store.

use serde::{Deserialize, Serialize};

use crate::stats::{KeyValueStore, StoreError, load_or_default};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Global mute (toggled in-game)
    pub muted: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,

    // === Visual Effects ===
    /// Weather particles (day leaves, night fireflies)
    pub weather: bool,
    /// Pickup and damage glows around the snake
    pub glows: bool,

    // === Accessibility ===
    /// Reduced motion (no weather particles)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            muted: false,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,

            weather: true,
            glows: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "snake_forest_settings";

    /// Effective weather (respects reduced_motion)
    pub fn effective_weather(&self) -> bool {
        self.weather && !self.reduced_motion
    }

    /// Music gain after mute and master volume
    pub fn music_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.music_volume).clamp(0.0, 1.0)
        }
    }

    /// Sound effect gain after mute and master volume
    pub fn sfx_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        load_or_default(store, Self::STORAGE_KEY)
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        let json = serde_json::to_string(self)?;
        store.write(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
