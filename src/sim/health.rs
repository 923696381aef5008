//! Two-pool health model
//!
//! Hunger drains first; once it is empty the starvation pool drains, and an
//! empty starvation pool is lethal. Health factor is the combined remaining
//! capacity as a fraction of both pools.

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthPools {
    pub hunger_ms: f32,
    pub starvation_ms: f32,
    hunger_max: f32,
    starvation_max: f32,
    overfill: f32,
}

/// Outcome of draining the pools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    Ok,
    Starved,
}

impl HealthPools {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            hunger_ms: tuning.hunger_ms,
            starvation_ms: tuning.starvation_ms,
            hunger_max: tuning.hunger_ms,
            starvation_max: tuning.starvation_ms,
            overfill: tuning.hunger_overfill_ms,
        }
    }

    /// Remaining health in `[0, 1]`
    pub fn factor(&self) -> f32 {
        let current = if self.hunger_ms > 0.0 {
            self.starvation_max + self.hunger_ms
        } else {
            self.starvation_ms
        };
        (current / (self.hunger_max + self.starvation_max)).clamp(0.0, 1.0)
    }

    pub fn is_tired(&self) -> bool {
        self.hunger_ms <= 0.0
    }

    /// Passive drain: hunger only while it lasts, then starvation.
    pub fn drain(&mut self, dt: f32) -> Drain {
        if self.hunger_ms > 0.0 {
            self.hunger_ms = (self.hunger_ms - dt).max(0.0);
            Drain::Ok
        } else {
            self.starvation_ms = (self.starvation_ms - dt).max(0.0);
            if self.starvation_ms <= 0.0 {
                Drain::Starved
            } else {
                Drain::Ok
            }
        }
    }

    /// Collision damage: hunger first, overflow spills into starvation.
    pub fn damage(&mut self, amount: f32) -> Drain {
        if self.hunger_ms >= amount {
            self.hunger_ms -= amount;
        } else {
            let overflow = amount - self.hunger_ms;
            self.hunger_ms = 0.0;
            self.starvation_ms = (self.starvation_ms - overflow).max(0.0);
        }
        if self.starvation_ms <= 0.0 {
            Drain::Starved
        } else {
            Drain::Ok
        }
    }

    /// Food: refill starvation first, the rest goes to hunger (which may be
    /// overfilled up to its cap plus the overfill allowance).
    pub fn heal(&mut self, amount: f32) {
        let to_starvation = amount.min(self.starvation_max - self.starvation_ms).max(0.0);
        self.starvation_ms += to_starvation;
        let rest = amount - to_starvation;
        self.hunger_ms = (self.hunger_ms + rest).min(self.hunger_max + self.overfill);
    }

    pub fn fill(&mut self) {
        self.hunger_ms = self.hunger_max;
        self.starvation_ms = self.starvation_max;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pools() -> HealthPools {
        HealthPools::new(&Tuning::default())
    }

    #[test]
    fn test_full_and_empty() {
        let mut p = pools();
        assert_eq!(p.factor(), 1.0);
        p.hunger_ms = 0.0;
        assert_eq!(p.factor(), 0.5);
        p.starvation_ms = 0.0;
        assert_eq!(p.factor(), 0.0);
    }

    #[test]
    fn test_starve_in_one_update() {
        let mut p = pools();
        p.hunger_ms = 0.0;
        p.starvation_ms = 1.0;
        assert_eq!(p.drain(2.0), Drain::Starved);
        assert_eq!(p.starvation_ms, 0.0);
    }

    #[test]
    fn test_passive_drain_never_spills() {
        let mut p = pools();
        p.hunger_ms = 10.0;
        assert_eq!(p.drain(500.0), Drain::Ok);
        assert_eq!(p.hunger_ms, 0.0);
        assert_eq!(p.starvation_ms, 25_000.0);
    }

    #[test]
    fn test_damage_spills_into_starvation() {
        let mut p = pools();
        p.hunger_ms = 5_000.0;
        assert_eq!(p.damage(15_000.0), Drain::Ok);
        assert_eq!(p.hunger_ms, 0.0);
        assert_eq!(p.starvation_ms, 15_000.0);
        assert_eq!(p.damage(15_000.0), Drain::Starved);
        assert_eq!(p.starvation_ms, 0.0);
    }

    #[test]
    fn test_heal_order_and_overfill() {
        let mut p = pools();
        p.hunger_ms = 0.0;
        p.starvation_ms = 20_000.0;
        p.heal(10_000.0);
        assert_eq!(p.starvation_ms, 25_000.0);
        assert_eq!(p.hunger_ms, 5_000.0);

        for _ in 0..10 {
            p.heal(10_000.0);
        }
        assert_eq!(p.hunger_ms, 35_000.0);
        // Overfilled hunger still reads as full health
        assert_eq!(p.factor(), 1.0);
    }

    proptest! {
        #[test]
        fn prop_factor_in_unit_range(ops in prop::collection::vec((0u8..3, 0.0f32..40_000.0), 0..64)) {
            let mut p = pools();
            let mut last = p.factor();
            for (op, amount) in ops {
                match op {
                    0 => {
                        let draining = p.hunger_ms > 0.0 || p.starvation_ms > 0.0;
                        p.drain(amount);
                        if draining && amount > 0.0 {
                            prop_assert!(p.factor() <= last);
                        }
                    }
                    1 => { p.damage(amount); }
                    _ => p.heal(amount),
                }
                last = p.factor();
                prop_assert!((0.0..=1.0).contains(&last));
                prop_assert!(p.hunger_ms >= 0.0 && p.starvation_ms >= 0.0);
            }
        }
    }
}
