//! Read-only per-frame view of the game
//!
//! Captured after each frame and handed to renderers, audio and the HUD.
//! Moving things come with their previous positions plus `alpha` so the
//! renderer can interpolate between simulation steps. Nothing in here feeds
//! back into the simulation.

use glam::IVec2;
use serde::Serialize;

use crate::sim::endgame::{Dissolving, EndgamePhase};
use crate::sim::forest::{BorderFlash, Obstacle};
use crate::sim::snake::Glow;
use crate::sim::state::{DeathReason, Fruit, GameMode, GameState};
use crate::stats::MetaStats;

/// Health below which the snake counts as starving
const STARVING_BELOW: f32 = 0.2;

/// Coarse health state for the HUD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    Healthy,
    /// Hunger pool empty, moving at tired speed
    Tired,
    Starving,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthView {
    pub factor: f32,
    pub hunger_ms: f32,
    pub starvation_ms: f32,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnakeView {
    pub segments: Vec<IVec2>,
    pub prev_segments: Vec<IVec2>,
    /// Head colour (RGB, 0-1); the body is drawn at 80 %
    pub tint: [f32; 3],
    pub glow: Option<Glow>,
    pub damage_glow: bool,
    /// Drawn see-through while obstacles can't hurt it
    pub translucent: bool,
    pub shield: bool,
    pub gold: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HumanView {
    pub pos: IVec2,
    pub prev: IVec2,
}

/// Values driving the endgame overlays
#[derive(Debug, Clone, Serialize)]
pub struct EndgameView {
    pub phase: EndgamePhase,
    pub phase_ms: f32,
    pub hud_alpha: f32,
    pub announce_alpha: f32,
    pub countdown: u32,
    pub glow_alpha: f32,
    pub humans_eaten: u32,
    pub humans_left: usize,
    /// Fading world items (cleanup) or gold dust (victory)
    pub dissolve: Vec<Dissolving>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub cols: i32,
    pub rows: i32,
    pub mode: GameMode,
    pub day: u32,
    pub phase_count: u32,
    pub night: bool,
    pub darkness: f32,
    pub weather_intensity: f32,
    pub elapsed_ms: f32,
    pub lives: u32,
    pub muted: bool,
    /// Interpolation factor between `prev` and current positions
    pub alpha: f32,

    pub obstacles: Vec<Obstacle>,
    pub border_flashes: Vec<BorderFlash>,
    pub snake: SnakeView,
    pub humans: Vec<HumanView>,
    pub food: Option<IVec2>,
    pub fruit: Option<Fruit>,
    pub mega_apple: Option<IVec2>,
    pub health: HealthView,

    /// 3, 2, 1 or 0 ("GO") while counting down
    pub countdown: Option<u32>,
    pub death_message: Option<&'static str>,
    pub game_over_reason: Option<DeathReason>,
    pub endgame: Option<EndgameView>,
    pub stats: MetaStats,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        let visuals = state.visuals();
        let factor = state.health.factor();
        let endgame = state.endgame.as_ref();

        let status = if factor < STARVING_BELOW {
            HealthStatus::Starving
        } else if state.health.is_tired() {
            HealthStatus::Tired
        } else {
            HealthStatus::Healthy
        };

        let snake = &state.snake;
        let snake_view = SnakeView {
            segments: snake.segments.clone(),
            prev_segments: snake.prev_segments.clone(),
            tint: health_tint(snake.health_factor, snake.gold),
            glow: snake.glow.map(|g| g.glow),
            damage_glow: snake.damage_glow_ms > 0.0,
            translucent: snake.is_phasing(),
            shield: snake.shield,
            gold: snake.gold,
            visible: endgame.is_none_or(|e| e.snake_visible()),
        };

        let humans = if endgame.is_none_or(|e| e.humans_visible()) {
            state
                .humans
                .iter()
                .map(|h| HumanView {
                    pos: h.pos,
                    prev: h.prev,
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            cols: state.cols,
            rows: state.rows,
            mode: state.mode,
            day: state.day,
            phase_count: state.phase.phase_count,
            night: visuals.night,
            darkness: visuals.darkness,
            weather_intensity: visuals.weather_intensity,
            elapsed_ms: state.elapsed_ms,
            lives: state.lives,
            muted: state.muted,
            alpha: state.clock.alpha,
            obstacles: state.forest.obstacles().to_vec(),
            border_flashes: state.forest.border_flashes.clone(),
            snake: snake_view,
            humans,
            food: state.food,
            fruit: state.fruit,
            mega_apple: state.mega_apple,
            health: HealthView {
                factor,
                hunger_ms: state.health.hunger_ms,
                starvation_ms: state.health.starvation_ms,
                status,
            },
            countdown: (state.mode == GameMode::Countdown).then_some(state.countdown.value),
            death_message: state.death.map(|d| d.reason.banner()),
            game_over_reason: state.game_over_reason,
            endgame: endgame.map(|e| EndgameView {
                phase: e.phase,
                phase_ms: e.timer_ms,
                hud_alpha: e.hud_alpha,
                announce_alpha: e.announce_alpha,
                countdown: e.countdown_value,
                glow_alpha: e.glow_alpha,
                humans_eaten: e.humans_eaten,
                humans_left: state.humans.len(),
                dissolve: e.dissolve.clone(),
            }),
            stats: state.stats,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Snake colour by health: green when healthy, through yellow at half, to
/// red when empty. Gold overrides everything.
pub fn health_tint(health: f32, gold: bool) -> [f32; 3] {
    const GREEN: [f32; 3] = [0.0, 1.0, 136.0 / 255.0];
    const YELLOW: [f32; 3] = [1.0, 0.8, 0.0];
    const RED: [f32; 3] = [1.0, 0.2, 0.2];
    const GOLD: [f32; 3] = [1.0, 200.0 / 255.0, 0.0];

    if gold {
        return GOLD;
    }
    let h = health.clamp(0.0, 1.0);
    let (from, to, t) = if h > 0.5 {
        (GREEN, YELLOW, (1.0 - h) / 0.5)
    } else {
        (YELLOW, RED, (0.5 - h) / 0.5)
    };
    std::array::from_fn(|i| from[i] + (to[i] - from[i]) * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tint_endpoints() {
        assert_eq!(health_tint(1.0, false), [0.0, 1.0, 136.0 / 255.0]);
        assert_eq!(health_tint(0.5, false), [1.0, 0.8, 0.0]);
        let red = health_tint(0.0, false);
        assert!((red[1] - 0.2).abs() < 1e-6);
        assert_eq!(health_tint(0.0, true), health_tint(1.0, true));
    }

    #[test]
    fn test_health_status() {
        let mut state = GameState::new(1);
        state.start_run();
        assert_eq!(Snapshot::capture(&state).health.status, HealthStatus::Healthy);
        state.health.hunger_ms = 0.0;
        assert_eq!(Snapshot::capture(&state).health.status, HealthStatus::Tired);
        state.health.starvation_ms = 1_000.0;
        assert_eq!(Snapshot::capture(&state).health.status, HealthStatus::Starving);
    }

    #[test]
    fn test_overlays() {
        let mut state = GameState::new(1);
        state.start_run();
        let snap = Snapshot::capture(&state);
        assert_eq!(snap.countdown, Some(3));
        assert!(snap.death_message.is_none());
        assert!(snap.endgame.is_none());
        assert!(snap.snake.visible);
        assert_eq!(snap.obstacles.len(), state.forest.obstacles().len());

        let json = snap.to_json().unwrap();
        assert!(json.contains("\"mode\":\"Countdown\""));
        assert!(json.contains("\"countdown\":3"));
    }

    #[test]
    fn test_endgame_hides_snake_during_cleanup() {
        let mut state = GameState::new(1);
        state.start_run();
        state.mode = GameMode::Playing;
        crate::sim::endgame::start(&mut state);
        let snap = Snapshot::capture(&state);
        assert!(!snap.snake.visible);
        assert!(snap.humans.is_empty());
        let endgame = snap.endgame.unwrap();
        assert_eq!(endgame.phase, EndgamePhase::Cleanup);
        assert!(!endgame.dissolve.is_empty());
    }
}
