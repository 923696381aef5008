//! Roaming humans
//!
//! Humans step on their own cadence (a cooldown counter against a day/night
//! threshold). Inside their perception radius they walk greedily toward the
//! snake, or away from it during the endgame hunt; outside it they wander.

use std::cmp::Reverse;

use glam::IVec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::forest::Forest;
use super::placement::{CellRect, find_cell};
use crate::tuning::Perception;
use crate::{Direction, chebyshev, manhattan};

/// Attempts per human when spawning
pub const SPAWN_ATTEMPTS: u32 = 150;
/// Move threshold at night (ticks)
const NIGHT_STEP_TICKS: i32 = 12;

/// Greedy pathing goal relative to the snake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Chase,
    Flee,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Human {
    pub pos: IVec2,
    /// Position before the last step (render interpolation)
    pub prev: IVec2,
    pub perception: Perception,
    pub move_cooldown: i32,
}

/// World view a human reacts to
#[derive(Debug, Clone, Copy)]
pub struct Surroundings<'a> {
    pub forest: &'a Forest,
    pub target: IVec2,
    pub day: u32,
    pub night: bool,
    pub intent: Intent,
}

impl Human {
    pub fn new<R: Rng + ?Sized>(pos: IVec2, perception: Perception, rng: &mut R) -> Self {
        Self {
            pos,
            prev: pos,
            perception,
            move_cooldown: rng.random_range(0..8),
        }
    }

    /// Ticks between steps for the given time of day, including jitter
    pub fn step_threshold(&self, day: u32, night: bool) -> i32 {
        let base = if night {
            NIGHT_STEP_TICKS
        } else if day >= 5 {
            5
        } else if day >= 3 {
            6
        } else {
            8
        };
        base + self.perception.jitter()
    }

    /// Legal steps in candidate order (up, down, left, right)
    pub fn valid_moves(&self, forest: &Forest) -> Vec<IVec2> {
        let interior = CellRect::inset(forest.cols, forest.rows, 1);
        Direction::ALL
            .iter()
            .map(|d| self.pos + d.delta())
            .filter(|&c| interior.contains(c) && !forest.is_obstacle(c))
            .collect()
    }

    /// Advance one simulation tick. Returns true if the human stepped.
    pub fn update<R: Rng + ?Sized>(&mut self, view: &Surroundings<'_>, rng: &mut R) -> bool {
        self.prev = self.pos;
        self.move_cooldown += 1;
        if self.move_cooldown < self.step_threshold(view.day, view.night) {
            return false;
        }
        self.move_cooldown = rng.random_range(0..2);

        let mut moves = self.valid_moves(view.forest);
        if moves.is_empty() {
            return false;
        }

        let perception = if view.night {
            self.perception.at_night()
        } else {
            self.perception
        };
        let next = if perception.reaches(manhattan(self.pos, view.target)) {
            // Stable sort keeps candidate order on ties
            match view.intent {
                Intent::Chase => moves.sort_by_key(|&c| manhattan(c, view.target)),
                Intent::Flee => moves.sort_by_key(|&c| Reverse(manhattan(c, view.target))),
            }
            moves[0]
        } else {
            match moves.choose(rng) {
                Some(&c) => c,
                None => return false,
            }
        };
        self.pos = next;
        true
    }
}

/// Spawn constraints for a batch of humans
#[derive(Debug, Clone, Copy)]
pub struct SpawnRules {
    pub perception: Perception,
    /// Minimum Manhattan distance to every other human
    pub spacing: i32,
    /// Chebyshev radius around the snake head kept clear
    pub head_safe_radius: i32,
}

/// Try to add `count` humans; each gets `SPAWN_ATTEMPTS` tries and is
/// skipped on failure. Returns how many were placed.
pub fn spawn_humans<R: Rng + ?Sized>(
    humans: &mut Vec<Human>,
    count: u32,
    rules: SpawnRules,
    forest: &Forest,
    snake_body: &[IVec2],
    rng: &mut R,
) -> u32 {
    let area = CellRect::inset(forest.cols, forest.rows, 1);
    let head = snake_body.first().copied();
    let mut placed = 0;
    for _ in 0..count {
        let cell = find_cell(rng, area, SPAWN_ATTEMPTS, |c| {
            !forest.is_obstacle(c)
                && humans.iter().all(|h| manhattan(h.pos, c) >= rules.spacing)
                && head.is_none_or(|h| chebyshev(h, c) >= rules.head_safe_radius)
                && !snake_body.contains(&c)
        });
        match cell {
            Some(cell) => {
                humans.push(Human::new(cell, rules.perception, rng));
                placed += 1;
            }
            None => log::debug!("No room for another human ({} present)", humans.len()),
        }
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn view(forest: &Forest, target: IVec2, intent: Intent) -> Surroundings<'_> {
        Surroundings {
            forest,
            target,
            day: 1,
            night: false,
            intent,
        }
    }

    fn ready(pos: IVec2, perception: Perception) -> Human {
        Human {
            pos,
            prev: pos,
            perception,
            move_cooldown: 100,
        }
    }

    #[test]
    fn test_step_thresholds() {
        let h = ready(IVec2::ZERO, Perception::Radius(50));
        assert_eq!(h.step_threshold(1, false), 8);
        assert_eq!(h.step_threshold(3, false), 6);
        assert_eq!(h.step_threshold(5, false), 5);
        assert_eq!(h.step_threshold(5, true), 12);
        let jittery = ready(IVec2::ZERO, Perception::Radius(15));
        assert_eq!(jittery.step_threshold(1, false), 7);
    }

    #[test]
    fn test_waits_for_cooldown() {
        let forest = Forest::new(40, 25);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut h = ready(IVec2::new(10, 10), Perception::Unlimited);
        h.move_cooldown = 0;
        let v = view(&forest, IVec2::new(20, 10), Intent::Chase);
        for _ in 0..7 {
            assert!(!h.update(&v, &mut rng));
        }
        assert!(h.update(&v, &mut rng));
        assert_eq!(h.pos, IVec2::new(11, 10));
        assert_eq!(h.prev, IVec2::new(10, 10));
    }

    #[test]
    fn test_chase_and_flee() {
        let forest = Forest::new(40, 25);
        let mut rng = Pcg32::seed_from_u64(1);

        let mut chaser = ready(IVec2::new(10, 10), Perception::Unlimited);
        chaser.update(&view(&forest, IVec2::new(10, 3), Intent::Chase), &mut rng);
        assert_eq!(chaser.pos, IVec2::new(10, 9));

        let mut runner = ready(IVec2::new(10, 10), Perception::Unlimited);
        runner.update(&view(&forest, IVec2::new(10, 3), Intent::Flee), &mut rng);
        assert_eq!(runner.pos, IVec2::new(10, 11));
    }

    #[test]
    fn test_stays_in_interior() {
        let forest = Forest::new(40, 25);
        let mut rng = Pcg32::seed_from_u64(11);
        let mut h = ready(IVec2::new(1, 1), Perception::Radius(0));
        let v = view(&forest, IVec2::new(30, 20), Intent::Chase);
        for _ in 0..2000 {
            h.move_cooldown = 100;
            h.update(&v, &mut rng);
            assert!(CellRect::inset(40, 25, 1).contains(h.pos));
        }
    }

    #[test]
    fn test_night_halves_perception() {
        let forest = Forest::new(40, 25);
        let mut rng = Pcg32::seed_from_u64(2);
        // Target 10 cells away: seen by day (radius 15), out of range at night (7)
        let target = IVec2::new(20, 10);
        let mut seen = 0;
        for _ in 0..50 {
            let mut h = ready(IVec2::new(10, 10), Perception::Radius(15));
            let mut v = view(&forest, target, Intent::Chase);
            h.update(&v, &mut rng);
            assert_eq!(h.pos, IVec2::new(11, 10));

            let mut h = ready(IVec2::new(10, 10), Perception::Radius(15));
            v.night = true;
            h.update(&v, &mut rng);
            if h.pos == IVec2::new(11, 10) {
                seen += 1;
            }
        }
        // Random roaming only picks the chase step about a quarter of the time
        assert!(seen < 30);
    }

    #[test]
    fn test_spawn_rules() {
        let forest = Forest::new(40, 25);
        let mut rng = Pcg32::seed_from_u64(4);
        let body = [IVec2::new(20, 12), IVec2::new(19, 12), IVec2::new(18, 12)];
        let mut humans = Vec::new();
        let rules = SpawnRules {
            perception: Perception::Radius(15),
            spacing: 14,
            head_safe_radius: 6,
        };
        let placed = spawn_humans(&mut humans, 4, rules, &forest, &body, &mut rng);
        assert_eq!(placed as usize, humans.len());
        for (i, a) in humans.iter().enumerate() {
            assert!(chebyshev(a.pos, body[0]) >= 6);
            assert!(a.move_cooldown < 8);
            for b in &humans[i + 1..] {
                assert!(manhattan(a.pos, b.pos) >= 14);
            }
        }
    }
}
