//! Day/night clock
//!
//! A run alternates 60-second phases: odd phase counts are days, even are
//! nights. The controller only keeps time and reports signals; the game state
//! decides what a new phase means (day advance, endgame).

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Signals raised by one `update`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseSignals {
    /// Phase rollovers crossed during this update (normally 0 or 1)
    pub next_day: u32,
    /// The pre-fade offset was crossed (music cross-fade cue)
    pub trigger_audio: bool,
}

/// Authoritative phase clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseController {
    /// Time into the current phase, always in `[0, PHASE_MS)`
    pub cycle_time: f32,
    /// Monotonic phase index, starts at 1 (first day)
    pub phase_count: u32,
    audio_triggered: bool,
}

impl Default for PhaseController {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseController {
    pub fn new() -> Self {
        Self {
            cycle_time: 0.0,
            phase_count: 1,
            audio_triggered: false,
        }
    }

    /// Advance the clock. Leftover time past a rollover is carried into the
    /// next phase, so the number of rollovers only depends on total `dt`.
    pub fn update(&mut self, dt: f32) -> PhaseSignals {
        let mut signals = PhaseSignals::default();
        self.cycle_time += dt.max(0.0);
        loop {
            if !self.audio_triggered && self.cycle_time >= PRE_FADE_MS {
                self.audio_triggered = true;
                signals.trigger_audio = true;
            }
            if self.cycle_time < PHASE_MS {
                break;
            }
            self.cycle_time -= PHASE_MS;
            self.audio_triggered = false;
            signals.next_day += 1;
        }
        signals
    }

    /// Step to the next phase, returns the new phase count
    pub fn advance_phase(&mut self) -> u32 {
        self.phase_count += 1;
        self.phase_count
    }

    /// Force the clock to the start of `day` (phase count `2 * day - 1`)
    pub fn set_day(&mut self, day: u32) {
        self.phase_count = (2 * day.max(1)) - 1;
        self.cycle_time = 0.0;
        self.audio_triggered = false;
    }

    /// Game day of the current phase (1-based)
    pub fn day(&self) -> u32 {
        self.phase_count.div_ceil(2)
    }

    pub fn is_night(&self) -> bool {
        is_night(self.phase_count)
    }

    pub fn darkness(&self) -> f32 {
        darkness(self.phase_count, self.cycle_time)
    }

    pub fn weather_intensity(&self) -> f32 {
        weather_intensity(self.is_night(), self.cycle_time)
    }
}

#[inline]
pub fn is_night(phase_count: u32) -> bool {
    phase_count % 2 == 0
}

/// Screen darkness for a phase at `cycle_time`.
///
/// Flat through the phase interior, then a linear ramp over the last five
/// seconds toward the value the next phase starts at.
pub fn darkness(phase_count: u32, cycle_time: f32) -> f32 {
    let night = is_night(phase_count);
    if cycle_time < DUSK_START_MS {
        return if night { MAX_DARKNESS } else { 0.0 };
    }
    let p = ((cycle_time - DUSK_START_MS) / (PHASE_MS - DUSK_START_MS)).clamp(0.0, 1.0);
    if night {
        MAX_DARKNESS * (1.0 - p)
    } else {
        MAX_DARKNESS * p
    }
}

/// Weather particle intensity in `[0, 1]`.
///
/// Night fireflies fade in over the first five seconds and out over the last
/// five; daytime weather runs at 0.75 until the pre-fade cue.
pub fn weather_intensity(night: bool, cycle_time: f32) -> f32 {
    const RAMP_MS: f32 = 5_000.0;
    if night {
        if cycle_time < RAMP_MS {
            cycle_time / RAMP_MS
        } else if cycle_time < DUSK_START_MS {
            1.0
        } else {
            (1.0 - (cycle_time - DUSK_START_MS) / RAMP_MS).max(0.0)
        }
    } else if cycle_time < PRE_FADE_MS {
        0.75
    } else {
        0.0
    }
}
