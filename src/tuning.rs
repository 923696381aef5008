//! Data-driven game balance
//!
//! `Tuning` holds the shipped balance values; `LEVELS` is the fixed five-day
//! progression table. Days past the end of the table reuse its last row.

use serde::{Deserialize, Serialize};

/// How far a human can sense the snake (Manhattan cells)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Perception {
    Radius(u32),
    Unlimited,
}

impl Perception {
    /// Night halves the radius (rounded down)
    pub fn at_night(self) -> Self {
        match self {
            Perception::Radius(r) => Perception::Radius(r / 2),
            Perception::Unlimited => Perception::Unlimited,
        }
    }

    /// Whether a target at `dist` is inside the radius
    pub fn reaches(self, dist: i32) -> bool {
        match self {
            Perception::Radius(r) => dist <= r as i32,
            Perception::Unlimited => true,
        }
    }

    /// Per-human step jitter so humans with different senses don't move in lockstep
    pub fn jitter(self) -> i32 {
        match self {
            Perception::Radius(r) if r % 3 == 0 => -1,
            Perception::Radius(r) if r % 4 == 0 => 1,
            _ => 0,
        }
    }
}

/// One row of the day progression table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelConfig {
    pub trees: u32,
    pub long_logs: u32,
    pub short_logs: u32,
    pub humans: u32,
    pub perception: Perception,
}

/// Day 1..=5
pub static LEVELS: [LevelConfig; 5] = [
    LevelConfig {
        trees: 8,
        long_logs: 4,
        short_logs: 4,
        humans: 2,
        perception: Perception::Radius(0),
    },
    LevelConfig {
        trees: 10,
        long_logs: 6,
        short_logs: 6,
        humans: 4,
        perception: Perception::Radius(15),
    },
    LevelConfig {
        trees: 12,
        long_logs: 7,
        short_logs: 7,
        humans: 6,
        perception: Perception::Radius(30),
    },
    LevelConfig {
        trees: 13,
        long_logs: 8,
        short_logs: 8,
        humans: 6,
        perception: Perception::Radius(45),
    },
    LevelConfig {
        trees: 15,
        long_logs: 10,
        short_logs: 10,
        humans: 8,
        perception: Perception::Unlimited,
    },
];

/// Level row for a 1-based day (clamped to the table)
pub fn level(day: u32) -> &'static LevelConfig {
    let idx = (day.max(1) as usize - 1).min(LEVELS.len() - 1);
    &LEVELS[idx]
}

/// Game balance values. All durations are in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    /// First health pool, drains before starvation
    pub hunger_ms: f32,
    /// Terminal health pool
    pub starvation_ms: f32,
    /// Health restored by one food
    pub food_heal_ms: f32,
    /// Hunger may be overfilled by food up to `hunger_ms + hunger_overfill_ms`
    pub hunger_overfill_ms: f32,

    /// Base movement rate (steps per second)
    pub base_speed: f32,
    /// Movement rate while the hunger pool is empty
    pub tired_speed: f32,
    pub max_speed: f32,
    pub speed_per_day: f32,

    pub bounce_penalty_ms: f32,
    pub shield_bounce_penalty_ms: f32,
    pub bounce_invincible_ticks: u32,
    pub damage_glow_ms: f32,

    pub starting_lives: u32,
    pub max_lives: u32,
    /// Days to survive before the endgame hunt
    pub max_days: u32,

    pub snake_base_length: usize,
    pub snake_max_length: usize,
    /// Delay between eating and shedding the extra segment
    pub digestion_ms: f32,

    pub respawn_safety_ms: f32,
    pub respawn_invincible_ticks: u32,
    pub phase_through_ms: f32,

    /// Minimum Manhattan spacing between humans at spawn
    pub human_spacing: i32,
    /// Chebyshev radius around the snake head kept free of new humans
    pub human_safe_radius: i32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            hunger_ms: 25_000.0,
            starvation_ms: 25_000.0,
            food_heal_ms: 10_000.0,
            hunger_overfill_ms: 10_000.0,

            base_speed: 12.18,
            tired_speed: 8.0,
            max_speed: 22.0,
            speed_per_day: 0.5,

            bounce_penalty_ms: 15_000.0,
            shield_bounce_penalty_ms: 3_000.0,
            bounce_invincible_ticks: 15,
            damage_glow_ms: 500.0,

            starting_lives: 1,
            max_lives: 3,
            max_days: 5,

            snake_base_length: 3,
            snake_max_length: 12,
            digestion_ms: 30_000.0,

            respawn_safety_ms: 3_000.0,
            respawn_invincible_ticks: 30,
            phase_through_ms: 90_000.0,

            human_spacing: 14,
            human_safe_radius: 6,
        }
    }
}

impl Tuning {
    /// Total health capacity (both pools)
    pub fn total_health_ms(&self) -> f32 {
        self.hunger_ms + self.starvation_ms
    }

    /// Movement rate on a given day
    pub fn speed_for_day(&self, day: u32) -> f32 {
        (self.base_speed + day as f32 * self.speed_per_day).min(self.max_speed)
    }
}
