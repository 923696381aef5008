//! Consumable spawn gating
//!
//! Special fruits unlock at fixed elapsed-play-time gates and have per-run
//! caps. Across all kinds a 30 s global cooldown and a random 10-20 s local
//! cooldown keep them from clustering. The mega apple is a separate
//! night-only item, at most one per night phase.

use glam::IVec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::forest::Forest;
use super::placement::{CellRect, find_cell};
use super::snake::Glow;

/// Attempts when placing a special fruit or mega apple
pub const PICKUP_ATTEMPTS: u32 = 10;
/// Attempts when placing regular food
pub const FOOD_ATTEMPTS: u32 = 100;
/// Fallback food cell when the arena is too crowded
pub const FOOD_FALLBACK: IVec2 = IVec2::new(1, 1);

const GLOBAL_COOLDOWN_MS: f32 = 30_000.0;
const START_CHANCE: f64 = 0.01;
const MEGA_CHANCE: f64 = 0.005;
const MEGA_MAX: u32 = 5;

/// Special fruit kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FruitKind {
    /// Banana: one extra life
    Life,
    /// Blueberry: permanent shield and full heal
    Shield,
    /// Orange: body trimmed to base length, full heal
    Reset,
    /// Litchee: temporary obstacle immunity
    PhaseThrough,
}

/// Eligibility rule for one fruit kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FruitRule {
    /// Elapsed play time that must be exceeded (ms)
    pub unlock_ms: f32,
    pub max_per_run: u32,
    /// Chance an eligible kind joins the candidate list on a given tick
    pub admission: f64,
}

impl FruitKind {
    pub const ALL: [FruitKind; 4] = [
        FruitKind::Life,
        FruitKind::Shield,
        FruitKind::Reset,
        FruitKind::PhaseThrough,
    ];

    pub fn rule(self) -> FruitRule {
        match self {
            FruitKind::Life => FruitRule {
                unlock_ms: 45_000.0,
                max_per_run: 2,
                admission: 1.0,
            },
            FruitKind::Shield => FruitRule {
                unlock_ms: 90_000.0,
                max_per_run: 1,
                admission: 0.9,
            },
            FruitKind::Reset => FruitRule {
                unlock_ms: 150_000.0,
                max_per_run: 3,
                admission: 0.9,
            },
            FruitKind::PhaseThrough => FruitRule {
                unlock_ms: 300_000.0,
                max_per_run: 1,
                admission: 1.0,
            },
        }
    }

    pub fn glow(self) -> Glow {
        match self {
            FruitKind::Life => Glow::Yellow,
            FruitKind::Shield => Glow::Blue,
            FruitKind::Reset => Glow::Orange,
            FruitKind::PhaseThrough => Glow::Silver,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Per-run spawn bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnGate {
    spawned: [u32; 4],
    last_special_ms: f32,
    local_cooldown_ms: f32,
    mega_spawned: u32,
    last_mega_phase: Option<u32>,
}

impl Default for SpawnGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SpawnGate {
    pub fn new() -> Self {
        Self {
            spawned: [0; 4],
            last_special_ms: -GLOBAL_COOLDOWN_MS,
            local_cooldown_ms: 0.0,
            mega_spawned: 0,
            last_mega_phase: None,
        }
    }

    pub fn spawned(&self, kind: FruitKind) -> u32 {
        self.spawned[kind.index()]
    }

    pub fn mega_spawned(&self) -> u32 {
        self.mega_spawned
    }

    /// Whether `kind` has passed its time gate and still has spawns left
    pub fn is_unlocked(&self, kind: FruitKind, elapsed_ms: f32) -> bool {
        let rule = kind.rule();
        elapsed_ms > rule.unlock_ms && self.spawned(kind) < rule.max_per_run
    }

    /// Decide whether a special fruit should appear this tick and which.
    ///
    /// Must be called only while no special fruit is on the board. The local
    /// cooldown only starts counting down once the global cooldown is over.
    pub fn roll_fruit<R: Rng + ?Sized>(
        &mut self,
        elapsed_ms: f32,
        dt: f32,
        rng: &mut R,
    ) -> Option<FruitKind> {
        if elapsed_ms < self.last_special_ms + GLOBAL_COOLDOWN_MS {
            return None;
        }
        if self.local_cooldown_ms > 0.0 {
            self.local_cooldown_ms -= dt;
            return None;
        }

        let candidates: Vec<FruitKind> = FruitKind::ALL
            .into_iter()
            .filter(|&k| self.is_unlocked(k, elapsed_ms))
            .filter(|&k| {
                let admission = k.rule().admission;
                admission >= 1.0 || rng.random_bool(admission)
            })
            .collect();
        if candidates.is_empty() || !rng.random_bool(START_CHANCE) {
            return None;
        }
        candidates.choose(rng).copied()
    }

    /// Book a successful fruit placement
    pub fn record_fruit<R: Rng + ?Sized>(&mut self, kind: FruitKind, elapsed_ms: f32, rng: &mut R) {
        self.spawned[kind.index()] += 1;
        self.last_special_ms = elapsed_ms;
        self.local_cooldown_ms = rng.random_range(10_000.0..20_000.0);
        log::debug!("Special fruit {:?} spawned at {:.1}s", kind, elapsed_ms / 1000.0);
    }

    /// Roll for a mega apple (caller ensures none is on the board)
    pub fn roll_mega<R: Rng + ?Sized>(&self, night: bool, phase_count: u32, rng: &mut R) -> bool {
        night
            && self.mega_spawned < MEGA_MAX
            && self.last_mega_phase != Some(phase_count)
            && rng.random_bool(MEGA_CHANCE)
    }

    pub fn record_mega(&mut self, phase_count: u32) {
        self.mega_spawned += 1;
        self.last_mega_phase = Some(phase_count);
        log::debug!("Mega apple spawned in phase {phase_count}");
    }
}

/// Pick a free interior cell for a pickup (no obstacle, no snake)
pub fn place_pickup<R: Rng + ?Sized>(
    rng: &mut R,
    forest: &Forest,
    snake_body: &[IVec2],
    attempts: u32,
) -> Option<IVec2> {
    let area = CellRect::inset(forest.cols, forest.rows, 1);
    find_cell(rng, area, attempts, |c| {
        !forest.is_obstacle(c) && !snake_body.contains(&c)
    })
}

/// Cell for the next regular food, falling back to a fixed corner cell
pub fn place_food<R: Rng + ?Sized>(rng: &mut R, forest: &Forest, snake_body: &[IVec2]) -> IVec2 {
    place_pickup(rng, forest, snake_body, FOOD_ATTEMPTS).unwrap_or_else(|| {
        log::warn!("No free cell for food, using fallback");
        FOOD_FALLBACK
    })
}
