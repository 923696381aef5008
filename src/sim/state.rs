//! Game state and core simulation types
//!
//! `GameState` owns everything a run needs. The frame driver in `tick`
//! mutates it; renderers and audio only see `Snapshot`s and drained events.

use glam::IVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::endgame::Endgame;
use super::forest::Forest;
use super::health::HealthPools;
use super::human::{Human, SpawnRules, spawn_humans};
use super::phase::PhaseController;
use super::snake::Snake;
use super::spawn::{FruitKind, SpawnGate, place_food};
use crate::consts::*;
use crate::stats::MetaStats;
use crate::tuning::{self, Tuning};
use crate::{Direction, arena_center};

/// Top-level game mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Menu,
    /// 3-2-1 before play starts or resumes
    Countdown,
    Playing,
    Paused,
    /// Life lost, banner showing before the countdown
    DeathEvent,
    GameOver,
    /// Scripted finale after the last day
    EndgameHunt,
}

/// Why the snake died
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathReason {
    Starved,
    SelfHit,
    WallHit,
    TreeHit,
    LogHit,
    HumanCaught,
}

impl DeathReason {
    /// Banner shown while a life is lost
    pub fn banner(self) -> &'static str {
        match self {
            DeathReason::HumanCaught => "HUNTED!",
            _ => "CRASHED!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Music {
    Menu,
    Day,
    Night,
    Endgame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sound {
    Eat,
    PowerUp,
    Bounce,
    Die,
    Tick,
    Go,
}

/// Notifications for audio/UI collaborators, drained after each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    PlayMusic(Music),
    /// Start cross-fading toward the next phase's track
    CrossFade(Music),
    Sound(Sound),
    DayStarted(u32),
    LifeLost { reason: DeathReason, lives_left: u32 },
    GameOver { reason: DeathReason },
    EndgameStarted,
    Victory,
    /// Meta stats changed and should be persisted
    StatsUpdated,
    MuteChanged(bool),
}

/// Special fruit on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fruit {
    pub cell: IVec2,
    pub kind: FruitKind,
}

/// Phase-derived visuals, frozen while paused so they don't drift
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Visuals {
    pub darkness: f32,
    pub weather_intensity: f32,
    pub night: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    /// Count shown (3, 2, 1); 0 means "GO"
    pub value: u32,
    pub elapsed_ms: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeathEvent {
    pub reason: DeathReason,
    pub remaining_ms: f32,
}

/// Fixed-timestep accumulator state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameClock {
    pub accumulator_ms: f32,
    pub step_ms: f32,
    /// Interpolation factor between previous and current positions
    pub alpha: f32,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub cols: i32,
    pub rows: i32,
    pub mode: GameMode,
    pub phase: PhaseController,
    /// Current game day (1-based)
    pub day: u32,
    pub lives: u32,
    /// Play time of this run (ms), drives gates and digestion
    pub elapsed_ms: f32,
    /// Movement rate (steps per second) before health modifiers
    pub speed: f32,
    pub health: HealthPools,
    pub forest: Forest,
    pub snake: Snake,
    pub humans: Vec<Human>,
    /// Regular food; absent only during the endgame
    pub food: Option<IVec2>,
    pub fruit: Option<Fruit>,
    pub mega_apple: Option<IVec2>,
    pub spawn_gate: SpawnGate,
    pub foods_eaten: u32,
    pub countdown: Countdown,
    pub death: Option<DeathEvent>,
    pub game_over_reason: Option<DeathReason>,
    /// Visuals captured on pause, cleared when play resumes
    pub frozen: Option<Visuals>,
    /// Input ignored while positive (ms, real time)
    pub input_lock_ms: f32,
    pub endgame: Option<Endgame>,
    pub clock: FrameClock,
    pub stats: MetaStats,
    pub muted: bool,
    /// Pending notifications for collaborators
    pub events: Vec<GameEvent>,
    /// How many of `events` `unread_events` has already handed out
    events_read: usize,
}

impl GameState {
    /// Create a new game state with the given seed, sitting in the menu
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let center = arena_center(GRID_COLS, GRID_ROWS);
        let snake = Snake::new(center, &tuning);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            cols: GRID_COLS,
            rows: GRID_ROWS,
            mode: GameMode::Menu,
            phase: PhaseController::new(),
            day: 1,
            lives: tuning.starting_lives,
            elapsed_ms: 0.0,
            speed: tuning.base_speed,
            health: HealthPools::new(&tuning),
            forest: Forest::new(GRID_COLS, GRID_ROWS),
            snake,
            humans: Vec::new(),
            food: None,
            fruit: None,
            mega_apple: None,
            spawn_gate: SpawnGate::new(),
            foods_eaten: 0,
            countdown: Countdown {
                value: COUNTDOWN_FROM,
                elapsed_ms: 0.0,
            },
            death: None,
            game_over_reason: None,
            frozen: None,
            input_lock_ms: 0.0,
            endgame: None,
            clock: FrameClock::default(),
            stats: MetaStats::default(),
            muted: false,
            events: Vec::new(),
            events_read: 0,
            tuning,
        };
        state.food = Some(place_food(&mut state.rng, &state.forest, &state.snake.segments));
        state
    }

    pub fn center(&self) -> IVec2 {
        arena_center(self.cols, self.rows)
    }

    /// Take pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events_read = 0;
        std::mem::take(&mut self.events)
    }

    /// Events pushed since the last call, left in place for `drain_events`
    pub fn unread_events(&mut self) -> &[GameEvent] {
        let start = self.events_read.min(self.events.len());
        self.events_read = self.events.len();
        &self.events[start..]
    }

    /// Start a fresh run (from the menu or after game over)
    pub fn start_run(&mut self) {
        self.lives = self.tuning.starting_lives;
        self.elapsed_ms = 0.0;
        self.spawn_gate = SpawnGate::new();
        self.foods_eaten = 0;
        self.fruit = None;
        self.mega_apple = None;
        self.death = None;
        self.game_over_reason = None;
        self.frozen = None;
        self.endgame = None;
        self.input_lock_ms = 0.0;
        self.snake = Snake::new(self.center(), &self.tuning);
        self.reset_arena(1);
        log::info!("Run started (seed {})", self.seed);
        self.events.push(GameEvent::PlayMusic(Music::Day));
        self.begin_countdown();
    }

    /// Rebuild the arena for `day` from scratch
    fn reset_arena(&mut self, day: u32) {
        let level = tuning::level(day);
        self.day = day;
        self.forest.clear();
        self.forest.populate(
            &mut self.rng,
            level.trees,
            level.long_logs,
            level.short_logs,
        );
        let center = self.center();
        self.snake.reset(center);
        self.food = Some(place_food(&mut self.rng, &self.forest, &self.snake.segments));
        self.humans.clear();
        let rules = self.human_rules(level.perception);
        spawn_humans(
            &mut self.humans,
            level.humans,
            rules,
            &self.forest,
            &self.snake.segments,
            &mut self.rng,
        );
        self.phase.set_day(day);
        self.speed = self.tuning.base_speed;
        self.health = HealthPools::new(&self.tuning);
        self.clock = FrameClock::default();
        self.events.push(GameEvent::DayStarted(day));
    }

    pub(crate) fn human_rules(&self, perception: tuning::Perception) -> SpawnRules {
        SpawnRules {
            perception,
            spacing: self.tuning.human_spacing,
            head_safe_radius: self.tuning.human_safe_radius,
        }
    }

    pub fn begin_countdown(&mut self) {
        self.mode = GameMode::Countdown;
        self.countdown = Countdown {
            value: COUNTDOWN_FROM,
            elapsed_ms: 0.0,
        };
        self.clock.accumulator_ms = 0.0;
        self.events.push(GameEvent::Sound(Sound::Tick));
    }

    /// Pause from play/countdown, or resume through a fresh countdown
    pub fn toggle_pause(&mut self) {
        match self.mode {
            GameMode::Playing | GameMode::Countdown => {
                if self.frozen.is_none() {
                    self.frozen = Some(self.live_visuals());
                }
                self.mode = GameMode::Paused;
                log::info!("Paused");
            }
            GameMode::Paused => {
                log::info!("Resuming");
                self.begin_countdown();
            }
            _ => {}
        }
    }

    pub fn quit_to_menu(&mut self) {
        if matches!(
            self.mode,
            GameMode::Paused | GameMode::GameOver | GameMode::EndgameHunt
        ) {
            self.mode = GameMode::Menu;
            self.endgame = None;
            self.frozen = None;
            self.events.push(GameEvent::PlayMusic(Music::Menu));
        }
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        self.events.push(GameEvent::MuteChanged(self.muted));
    }

    /// Directional input. Ignored while input is locked or outside play.
    pub fn steer(&mut self, dir: Direction) -> bool {
        let active = match self.mode {
            GameMode::Playing => true,
            GameMode::EndgameHunt => self.endgame.as_ref().is_some_and(|e| e.accepts_input()),
            _ => false,
        };
        active && self.input_lock_ms <= 0.0 && self.snake.steer(dir)
    }

    /// Live phase visuals (ignores pause freeze)
    pub fn live_visuals(&self) -> Visuals {
        if let Some(endgame) = &self.endgame {
            return Visuals {
                darkness: endgame.darkness,
                weather_intensity: endgame.weather_intensity,
                night: false,
            };
        }
        Visuals {
            darkness: self.phase.darkness(),
            weather_intensity: self.phase.weather_intensity(),
            night: self.phase.is_night(),
        }
    }

    /// Visuals to render: the pause snapshot if one is held
    pub fn visuals(&self) -> Visuals {
        self.frozen.unwrap_or_else(|| self.live_visuals())
    }

    /// Record the finished run in the meta stats
    pub(crate) fn record_run(&mut self) {
        if self
            .stats
            .record_run(self.elapsed_ms as f64, self.day.min(self.tuning.max_days))
        {
            log::info!(
                "New record: {:.1}s, day {}",
                self.stats.best_time_ms / 1000.0,
                self.stats.max_day
            );
        }
        self.events.push(GameEvent::StatsUpdated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sits_in_menu() {
        let state = GameState::new(12345);
        assert_eq!(state.mode, GameMode::Menu);
        assert_eq!(state.snake.head(), IVec2::new(20, 12));
        assert!(state.food.is_some());
        assert!(state.forest.is_empty());
    }

    #[test]
    fn test_unread_events_hands_out_each_event_once() {
        let mut state = GameState::new(5);
        state.events.push(GameEvent::StatsUpdated);
        assert_eq!(state.unread_events(), &[GameEvent::StatsUpdated]);
        assert!(state.unread_events().is_empty());

        state.events.push(GameEvent::MuteChanged(true));
        assert_eq!(state.unread_events(), &[GameEvent::MuteChanged(true)]);
        assert_eq!(state.events.len(), 2);

        assert_eq!(state.drain_events().len(), 2);
        state.events.push(GameEvent::StatsUpdated);
        assert_eq!(state.unread_events(), &[GameEvent::StatsUpdated]);
    }

    #[test]
    fn test_start_run_builds_day_one() {
        let mut state = GameState::new(7);
        state.start_run();
        assert_eq!(state.mode, GameMode::Countdown);
        assert_eq!(state.countdown.value, 3);
        assert_eq!(state.day, 1);
        assert_eq!(state.phase.phase_count, 1);
        assert_eq!(state.lives, 1);
        assert!(!state.forest.is_empty());
        assert!(state.forest.tree_count() <= 8);
        assert!(state.humans.len() <= 2);
        let food = state.food.unwrap();
        assert!(!state.forest.is_obstacle(food));
        assert!(!state.forest.is_obstacle(state.snake.head()));
        assert!(state.drain_events().contains(&GameEvent::DayStarted(1)));
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_pause_freezes_visuals() {
        let mut state = GameState::new(7);
        state.start_run();
        state.mode = GameMode::Playing;
        state.phase.cycle_time = 56_000.0;
        state.toggle_pause();
        assert_eq!(state.mode, GameMode::Paused);
        let frozen = state.visuals();

        state.phase.cycle_time = 59_000.0;
        assert_eq!(state.visuals(), frozen);

        state.toggle_pause();
        assert_eq!(state.mode, GameMode::Countdown);
        assert_eq!(state.visuals(), frozen);
    }

    #[test]
    fn test_steer_gated_by_mode_and_lock() {
        let mut state = GameState::new(7);
        state.start_run();
        assert!(!state.steer(Direction::Up));
        state.mode = GameMode::Playing;
        state.input_lock_ms = 100.0;
        assert!(!state.steer(Direction::Up));
        state.input_lock_ms = 0.0;
        assert!(state.steer(Direction::Up));
    }

    #[test]
    fn test_banners() {
        assert_eq!(DeathReason::HumanCaught.banner(), "HUNTED!");
        assert_eq!(DeathReason::LogHit.banner(), "CRASHED!");
    }
}
