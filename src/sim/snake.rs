//! The player snake
//!
//! Length is bounded by `[base_length, max_length]`. Eating queues a growth
//! segment and a digestion deadline that later sheds it again, so only
//! `permanent_grow` (once per survived day) raises the floor. Health maps to
//! a target length through `enforce_health_length`, which the game calls
//! explicitly.

use std::collections::VecDeque;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::forest::{Forest, ObstacleKind};
use super::placement::CellRect;
use crate::Direction;
use crate::tuning::Tuning;

/// Result of one movement step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Alive,
    /// Tried to leave the arena through `cell`
    BounceWall { cell: IVec2 },
    /// Tried to enter an obstacle at `cell`
    BounceObstacle { cell: IVec2, kind: ObstacleKind },
    /// Ran into its own body
    Dead,
}

/// How `enforce_health_length` converges on its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthSync {
    /// Shed a few segments per call
    Gradual,
    /// Snap straight to the target
    Immediate,
}

/// Tint of a timed pickup glow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Glow {
    Yellow,
    Blue,
    Orange,
    Silver,
    Crimson,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlowTimer {
    pub glow: Glow,
    pub remaining_ms: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snake {
    /// Head first
    pub segments: Vec<IVec2>,
    /// Segments before the last step (render interpolation)
    pub prev_segments: Vec<IVec2>,
    pub direction: Direction,
    queued: Direction,
    pub base_length: usize,
    pub max_length: usize,
    pub grow_pending: usize,
    /// Absolute game-time deadlines (ms), oldest first
    pub digestion: VecDeque<f32>,
    digestion_ms: f32,
    /// Derived from the health pools each tick
    pub health_factor: f32,

    /// Steps during which self-collision holds the snake in place instead of killing it
    pub invincible_ticks: u32,
    pub damage_glow_ms: f32,
    pub phase_through_ms: f32,
    pub respawn_safety_ms: f32,
    pub glow: Option<GlowTimer>,
    pub shield: bool,
    /// Endgame tint
    pub gold: bool,
}

impl Snake {
    /// New snake with its head at `head`, body trailing to the left
    pub fn new(head: IVec2, tuning: &Tuning) -> Self {
        let mut snake = Self {
            segments: Vec::with_capacity(tuning.snake_max_length + 1),
            prev_segments: Vec::with_capacity(tuning.snake_max_length + 1),
            direction: Direction::Right,
            queued: Direction::Right,
            base_length: tuning.snake_base_length,
            max_length: tuning.snake_max_length,
            grow_pending: 0,
            digestion: VecDeque::new(),
            digestion_ms: tuning.digestion_ms,
            health_factor: 1.0,
            invincible_ticks: 0,
            damage_glow_ms: 0.0,
            phase_through_ms: 0.0,
            respawn_safety_ms: 0.0,
            glow: None,
            shield: false,
            gold: false,
        };
        snake.reset(head);
        snake
    }

    /// Rebuild the body at `head` heading right. Keeps `base_length`; clears
    /// growth, digestion and every timed effect.
    pub fn reset(&mut self, head: IVec2) {
        self.segments.clear();
        self.segments
            .extend((0..self.base_length as i32).map(|i| head - IVec2::new(i, 0)));
        self.prev_segments.clone_from(&self.segments);
        self.direction = Direction::Right;
        self.queued = Direction::Right;
        self.grow_pending = 0;
        self.digestion.clear();
        self.health_factor = 1.0;
        self.invincible_ticks = 0;
        self.damage_glow_ms = 0.0;
        self.phase_through_ms = 0.0;
        self.respawn_safety_ms = 0.0;
        self.glow = None;
        self.shield = false;
        self.gold = false;
    }

    #[inline]
    pub fn head(&self) -> IVec2 {
        self.segments[0]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn occupies(&self, cell: IVec2) -> bool {
        self.segments.contains(&cell)
    }

    /// Queue a turn. Only turns onto the other axis are accepted, which rules
    /// out reversing into the neck.
    pub fn steer(&mut self, dir: Direction) -> bool {
        if dir.is_horizontal() == self.direction.is_horizontal() {
            return false;
        }
        self.queued = dir;
        true
    }

    /// Knockback: flip the heading, bypassing the axis rule
    pub fn reverse(&mut self) {
        self.direction = self.direction.opposite();
        self.queued = self.direction;
    }

    /// Force a heading (respawn, endgame)
    pub fn face(&mut self, dir: Direction) {
        self.direction = dir;
        self.queued = dir;
    }

    /// Cell the head would enter on the next step
    pub fn next_cell(&self) -> IVec2 {
        self.head() + self.queued.delta()
    }

    /// Obstacle immunity from phase-through or respawn safety
    pub fn is_phasing(&self) -> bool {
        self.phase_through_ms > 0.0 || self.respawn_safety_ms > 0.0
    }

    /// Move one cell.
    ///
    /// While phasing, the border clamps and obstacles are passed through;
    /// otherwise they report a bounce and the snake does not move. Hitting
    /// the body kills, unless invincible, in which case the snake holds.
    pub fn update(&mut self, cols: i32, rows: i32, game_time: f32, forest: &Forest) -> StepOutcome {
        self.invincible_ticks = self.invincible_ticks.saturating_sub(1);
        self.direction = self.queued;

        let arena = CellRect::inset(cols, rows, 0);
        let mut next = self.head() + self.direction.delta();
        if !arena.contains(next) {
            if !self.is_phasing() {
                return StepOutcome::BounceWall { cell: next };
            }
            next = arena.clamp(next);
        }
        if let Some(obstacle) = forest.obstacle_at(next) {
            if !self.is_phasing() {
                return StepOutcome::BounceObstacle {
                    cell: next,
                    kind: obstacle.kind,
                };
            }
        }

        // The tail cell only counts when growth keeps the tail in place
        let len = self.segments.len();
        let digest_due = self.digestion.front().is_some_and(|&t| game_time >= t);
        let tail_stays =
            self.grow_pending > 0 && len < self.max_length && !(digest_due && len > self.base_length);
        let body = if tail_stays { &self.segments[..] } else { &self.segments[..len - 1] };
        if next == self.head() || body.contains(&next) {
            if self.invincible_ticks > 0 || next == self.head() {
                self.prev_segments.clone_from(&self.segments);
                return StepOutcome::Alive;
            }
            return StepOutcome::Dead;
        }

        self.prev_segments.clone_from(&self.segments);

        if digest_due {
            self.digestion.pop_front();
            if self.segments.len() > self.base_length {
                self.segments.pop();
            }
        }

        self.segments.insert(0, next);
        if self.grow_pending > 0 {
            self.grow_pending -= 1;
            if self.segments.len() > self.max_length {
                self.segments.pop();
            }
        } else {
            self.segments.pop();
        }
        StepOutcome::Alive
    }

    /// Queue one growth segment and its digestion deadline
    pub fn eat(&mut self, game_time: f32) {
        if self.base_length + self.grow_pending < self.max_length
            && self.segments.len() + self.grow_pending < self.max_length
        {
            self.grow_pending += 1;
        }
        self.digestion.push_back(game_time + self.digestion_ms);
    }

    /// Raise the length floor by one (once per survived day)
    pub fn permanent_grow(&mut self) {
        if self.base_length < self.max_length {
            self.base_length += 1;
            self.grow_pending += 1;
        }
    }

    /// Drop the tail segment if above the floor. Pending growth is cancelled
    /// except what is still owed to reach `base_length`.
    pub fn shrink(&mut self) -> bool {
        if self.segments.len() <= self.base_length {
            return false;
        }
        self.segments.pop();
        self.prev_segments.truncate(self.segments.len());
        self.grow_pending = self.base_length.saturating_sub(self.segments.len());
        true
    }

    /// Cut back to `base_length` and forget pending digestion
    pub fn trim_to_base(&mut self) {
        while self.shrink() {}
        self.grow_pending = self.base_length.saturating_sub(self.segments.len());
        self.digestion.clear();
    }

    /// Length the current health calls for
    pub fn target_length(&self) -> usize {
        let factor = if self.shield {
            self.health_factor.max(0.5)
        } else {
            self.health_factor
        };
        let span = self.max_length.saturating_sub(self.base_length) as f32;
        (self.base_length + (factor.clamp(0.0, 1.0) * span).round() as usize)
            .clamp(self.base_length, self.max_length)
    }

    /// Shed segments toward `target_length`. Returns how many were shed.
    pub fn enforce_health_length(&mut self, sync: LengthSync) -> usize {
        let target = self.target_length();
        let deficit = self.segments.len().saturating_sub(target);
        let allowed = match sync {
            LengthSync::Immediate => deficit,
            LengthSync::Gradual if deficit >= 4 => 3,
            LengthSync::Gradual if deficit >= 2 => 2,
            LengthSync::Gradual => 1,
        };
        let mut shed = 0;
        while shed < allowed && self.segments.len() > target && self.shrink() {
            shed += 1;
        }
        shed
    }

    /// Movement slowdown from a full stomach
    pub fn fullness_penalty(&self) -> f32 {
        match self.digestion.len() {
            n if n > 10 => 0.25,
            n if n > 5 => 0.10,
            _ => 0.0,
        }
    }

    pub fn start_glow(&mut self, glow: Glow, ms: f32) {
        self.glow = Some(GlowTimer {
            glow,
            remaining_ms: ms,
        });
    }

    /// Decay millisecond timers
    pub fn tick_timers(&mut self, dt: f32) {
        self.damage_glow_ms = (self.damage_glow_ms - dt).max(0.0);
        self.phase_through_ms = (self.phase_through_ms - dt).max(0.0);
        self.respawn_safety_ms = (self.respawn_safety_ms - dt).max(0.0);
        if let Some(timer) = &mut self.glow {
            timer.remaining_ms -= dt;
            if timer.remaining_ms <= 0.0 {
                self.glow = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const COLS: i32 = 40;
    const ROWS: i32 = 25;

    fn snake() -> Snake {
        Snake::new(IVec2::new(20, 12), &Tuning::default())
    }

    fn step(s: &mut Snake, t: f32) -> StepOutcome {
        s.update(COLS, ROWS, t, &Forest::new(COLS, ROWS))
    }

    #[test]
    fn test_new_snake_layout() {
        let s = snake();
        assert_eq!(s.segments, vec![IVec2::new(20, 12), IVec2::new(19, 12), IVec2::new(18, 12)]);
        assert_eq!(s.prev_segments, s.segments);
        assert_eq!(s.direction, Direction::Right);
    }

    #[test]
    fn test_move_and_grow() {
        let mut s = snake();
        assert_eq!(step(&mut s, 0.0), StepOutcome::Alive);
        assert_eq!(s.head(), IVec2::new(21, 12));
        assert_eq!(s.prev_segments[0], IVec2::new(20, 12));
        assert_eq!(s.len(), 3);

        s.eat(0.0);
        step(&mut s, 0.0);
        assert_eq!(s.len(), 4);
        assert_eq!(s.grow_pending, 0);
    }

    #[test]
    fn test_steer_rejects_same_axis() {
        let mut s = snake();
        assert!(!s.steer(Direction::Left));
        assert!(!s.steer(Direction::Right));
        assert!(s.steer(Direction::Up));
        step(&mut s, 0.0);
        assert_eq!(s.head(), IVec2::new(20, 11));
    }

    #[test]
    fn test_wall_bounce_and_clamp() {
        let mut s = Snake::new(IVec2::new(39, 5), &Tuning::default());
        assert_eq!(step(&mut s, 0.0), StepOutcome::BounceWall { cell: IVec2::new(40, 5) });
        assert_eq!(s.head(), IVec2::new(39, 5));

        s.phase_through_ms = 1000.0;
        assert_eq!(step(&mut s, 0.0), StepOutcome::Alive);
        assert_eq!(s.head(), IVec2::new(39, 5));
    }

    #[test]
    fn test_obstacle_bounce_and_phase() {
        use crate::sim::forest::{Obstacle, Orientation};

        let mut forest = Forest::new(COLS, ROWS);
        forest.insert(Obstacle {
            kind: ObstacleKind::Tree,
            origin: IVec2::new(21, 12),
            length: 1,
            orientation: Orientation::Horizontal,
            scale: 1.4,
            flash_ms: 0.0,
        });
        let mut s = snake();
        assert_eq!(
            s.update(COLS, ROWS, 0.0, &forest),
            StepOutcome::BounceObstacle {
                cell: IVec2::new(21, 12),
                kind: ObstacleKind::Tree
            }
        );
        assert_eq!(s.head(), IVec2::new(20, 12));

        s.respawn_safety_ms = 500.0;
        assert_eq!(s.update(COLS, ROWS, 0.0, &forest), StepOutcome::Alive);
        assert_eq!(s.head(), IVec2::new(21, 12));
    }

    #[test]
    fn test_self_collision() {
        let mut s = snake();
        s.segments = vec![
            IVec2::new(10, 10),
            IVec2::new(11, 10),
            IVec2::new(11, 11),
            IVec2::new(10, 11),
            IVec2::new(9, 11),
        ];
        s.face(Direction::Down);
        assert_eq!(step(&mut s, 0.0), StepOutcome::Dead);

        s.invincible_ticks = 5;
        assert_eq!(step(&mut s, 0.0), StepOutcome::Alive);
        assert_eq!(s.head(), IVec2::new(10, 10));
    }

    #[test]
    fn test_tail_cell_is_free() {
        let mut s = snake();
        s.segments = vec![
            IVec2::new(10, 10),
            IVec2::new(11, 10),
            IVec2::new(11, 11),
            IVec2::new(10, 11),
        ];
        s.face(Direction::Down);
        assert_eq!(step(&mut s, 0.0), StepOutcome::Alive);
        assert_eq!(s.head(), IVec2::new(10, 11));
    }

    #[test]
    fn test_growing_tail_blocks_head() {
        let mut s = snake();
        s.segments = vec![
            IVec2::new(10, 10),
            IVec2::new(11, 10),
            IVec2::new(11, 11),
            IVec2::new(10, 11),
        ];
        s.grow_pending = 1;
        s.face(Direction::Down);
        assert_eq!(step(&mut s, 0.0), StepOutcome::Dead);

        // A due meal sheds the tail first, freeing the cell
        s.digestion.push_back(0.0);
        s.base_length = 3;
        assert_eq!(step(&mut s, 0.0), StepOutcome::Alive);
        assert_eq!(s.head(), IVec2::new(10, 11));
    }

    #[test]
    fn test_digestion_sheds_once_per_meal() {
        let mut s = snake();
        s.eat(0.0);
        s.eat(0.0);
        step(&mut s, 1.0);
        step(&mut s, 2.0);
        assert_eq!(s.len(), 5);
        assert_eq!(s.digestion.len(), 2);

        step(&mut s, 29_999.0);
        assert_eq!(s.len(), 5);
        step(&mut s, 30_000.0);
        assert_eq!(s.len(), 4);
        assert_eq!(s.digestion.len(), 1);
        step(&mut s, 30_001.0);
        assert_eq!(s.len(), 3);
        assert!(s.digestion.is_empty());
        step(&mut s, 90_000.0);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_eat_respects_cap() {
        let mut s = snake();
        for i in 0..30 {
            s.eat(i as f32);
        }
        assert_eq!(s.grow_pending, 9);
        assert_eq!(s.digestion.len(), 30);
        for _ in 0..20 {
            s.steer(if s.direction.is_horizontal() { Direction::Down } else { Direction::Left });
            step(&mut s, 0.0);
        }
        assert_eq!(s.len(), 12);
    }

    #[test]
    fn test_permanent_grow_raises_floor() {
        let mut s = snake();
        s.permanent_grow();
        assert_eq!(s.base_length, 4);
        step(&mut s, 0.0);
        assert_eq!(s.len(), 4);
        assert!(!s.shrink());
        s.base_length = 12;
        s.permanent_grow();
        assert_eq!(s.base_length, 12);
    }

    #[test]
    fn test_enforce_health_length() {
        let mut s = snake();
        for _ in 0..9 {
            s.eat(0.0);
            step(&mut s, 0.0);
            s.steer(if s.direction.is_horizontal() { Direction::Down } else { Direction::Right });
        }
        assert_eq!(s.len(), 12);

        s.health_factor = 0.0;
        assert_eq!(s.target_length(), 3);
        assert_eq!(s.enforce_health_length(LengthSync::Gradual), 3);
        assert_eq!(s.len(), 9);
        assert_eq!(s.enforce_health_length(LengthSync::Gradual), 3);
        assert_eq!(s.enforce_health_length(LengthSync::Gradual), 2);
        assert_eq!(s.enforce_health_length(LengthSync::Gradual), 1);
        assert_eq!(s.len(), 3);
        assert_eq!(s.enforce_health_length(LengthSync::Gradual), 0);
    }

    #[test]
    fn test_shield_floors_target() {
        let mut s = snake();
        s.health_factor = 0.1;
        assert_eq!(s.target_length(), 4);
        s.shield = true;
        assert_eq!(s.target_length(), 8);
    }

    #[test]
    fn test_immediate_sync_and_trim() {
        let mut s = snake();
        s.segments = (0..10).map(|i| IVec2::new(20 - i, 12)).collect();
        s.health_factor = 0.5;
        assert_eq!(s.enforce_health_length(LengthSync::Immediate), 2);
        assert_eq!(s.len(), 8);

        s.eat(0.0);
        s.trim_to_base();
        assert_eq!(s.len(), 3);
        assert_eq!(s.grow_pending, 0);
        assert!(s.digestion.is_empty());
    }

    #[test]
    fn test_fullness_and_timers() {
        let mut s = snake();
        for _ in 0..6 {
            s.digestion.push_back(1.0);
        }
        assert_eq!(s.fullness_penalty(), 0.10);
        for _ in 0..5 {
            s.digestion.push_back(1.0);
        }
        assert_eq!(s.fullness_penalty(), 0.25);

        s.start_glow(Glow::Blue, 100.0);
        s.phase_through_ms = 50.0;
        s.tick_timers(60.0);
        assert!(s.glow.is_some());
        assert!(!s.is_phasing());
        s.tick_timers(60.0);
        assert!(s.glow.is_none());
    }

    proptest! {
        #[test]
        fn prop_length_stays_in_bounds(
            ops in prop::collection::vec(0u8..6, 1..300),
        ) {
            let mut s = snake();
            let forest = Forest::new(COLS, ROWS);
            let mut time = 0.0f32;
            let mut base = s.base_length;
            for op in ops {
                time += 83.0;
                match op {
                    0 => s.eat(time),
                    1 => s.permanent_grow(),
                    2 => { s.shrink(); }
                    3 => {
                        s.health_factor = (time / 7_000.0).fract();
                        s.enforce_health_length(LengthSync::Gradual);
                    }
                    4 => {
                        let turn = if s.direction.is_horizontal() { Direction::Up } else { Direction::Left };
                        s.steer(turn);
                    }
                    _ => {}
                }
                // Keep the snake in the open so steps never bounce
                s.phase_through_ms = 1.0;
                s.invincible_ticks = 2;
                s.update(COLS, ROWS, time, &forest);

                prop_assert!(s.base_length >= base);
                base = s.base_length;
                prop_assert!(s.len() <= s.max_length);
                prop_assert!(s.len() + s.grow_pending >= s.base_length);
                if s.grow_pending == 0 {
                    prop_assert!(s.len() >= s.base_length);
                }
            }
        }
    }
}
