//! Game settings and preferences
//!
//! Persisted separately from progression under their own key.

use serde::{Deserialize, Serialize};

use crate::persistence::Persisted;
use crate::sim::RestartMode;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,
    /// Mute when window loses focus
    pub mute_on_blur: bool,

    // === Gameplay ===
    /// What a tap on the game-over screen does
    pub restart_mode: RestartMode,

    // === Accessibility ===
    /// Reduced motion (no screen shake or flashes in the presentation layer)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
            mute_on_blur: true,

            restart_mode: RestartMode::ToMenu,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Volume sound effects actually play at
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Clamp volumes into range after loading or editing
    pub fn sanitize(&mut self) {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
    }
}

impl Persisted for Settings {
    type Record = Settings;

    const STORAGE_KEY: &'static str = "sneak_dog_settings";

    fn to_record(&self) -> Self::Record {
        self.clone()
    }

    fn apply_record(&mut self, record: Self::Record) {
        *self = record;
        self.sanitize();
    }
}
