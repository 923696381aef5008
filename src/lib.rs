//! Snake Forest - a grid survival arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (day/night clock, forest, humans, snake, game state)
//! - `snapshot`: Read-only per-frame view handed to renderers and audio
//! - `tuning`: Data-driven game balance and the five-day level table
//! - `settings`: Player preferences
//! - `stats`: Persisted meta statistics (best time, max day, runs)

pub mod settings;
pub mod sim;
pub mod snapshot;
pub mod stats;
pub mod tuning;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use settings::Settings;
pub use snapshot::Snapshot;
pub use stats::{KeyValueStore, MetaStats, StoreError};
pub use tuning::{LevelConfig, Perception, Tuning};

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Arena dimensions in cells
    pub const GRID_COLS: i32 = 40;
    pub const GRID_ROWS: i32 = 25;

    /// Length of one day or night phase (ms)
    pub const PHASE_MS: f32 = 60_000.0;
    /// Offset inside a phase where the music cross-fade starts (ms)
    pub const PRE_FADE_MS: f32 = 57_000.0;
    /// Offset inside a phase where the darkness transition starts (ms)
    pub const DUSK_START_MS: f32 = 55_000.0;
    /// Darkness of a full night
    pub const MAX_DARKNESS: f32 = 0.88;

    /// Real frame delta clamp (ms), protects against tab-switch spikes
    pub const MAX_FRAME_MS: f32 = 100.0;
    /// Maximum simulation steps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Countdown before play resumes (one count per second)
    pub const COUNTDOWN_FROM: u32 = 3;
    pub const COUNTDOWN_STEP_MS: f32 = 1000.0;
    /// How long the death banner stays up before the countdown
    pub const DEATH_EVENT_MS: f32 = 1500.0;
    /// Input lock after a bounce (ms)
    pub const INPUT_LOCK_MS: f32 = 250.0;
}

/// One of the four grid directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    #[default]
    Right,
}

impl Direction {
    /// Candidate order used by agent pathing
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Cell offset (screen coordinates, y grows downward)
    #[inline]
    pub fn delta(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

/// Manhattan (taxicab) distance between two cells
#[inline]
pub fn manhattan(a: IVec2, b: IVec2) -> i32 {
    (a - b).abs().element_sum()
}

/// Chebyshev (king move) distance between two cells
#[inline]
pub fn chebyshev(a: IVec2, b: IVec2) -> i32 {
    (a - b).abs().max_element()
}

/// Center cell of the arena
#[inline]
pub fn arena_center(cols: i32, rows: i32) -> IVec2 {
    IVec2::new(cols / 2, rows / 2)
}
