//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only enters through `tick::frame` / `tick::step`
//! - Seeded RNG only (owned by `GameState`)
//! - Stable iteration order (plain `Vec`s, hash maps only for lookups)
//! - No rendering, audio or platform dependencies

pub mod endgame;
pub mod forest;
pub mod health;
pub mod human;
pub mod phase;
pub mod placement;
pub mod snake;
pub mod spawn;
pub mod state;
pub mod tick;

pub use endgame::{DissolveKind, Dissolving, Endgame, EndgamePhase};
pub use forest::{Forest, Obstacle, ObstacleKind, Orientation, Side};
pub use health::HealthPools;
pub use human::{Human, Intent};
pub use phase::{PhaseController, PhaseSignals};
pub use snake::{Glow, Snake, StepOutcome};
pub use spawn::{FruitKind, SpawnGate};
pub use state::{DeathReason, GameEvent, GameMode, GameState, Music, Sound, Visuals};
pub use tick::{FrameInput, frame, step};
