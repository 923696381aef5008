//! Endgame hunt sequencer
//!
//! After the last day the run turns into a scripted finale: the world
//! dissolves, a crowd of humans appears, and the snake (now gold) hunts them
//! down. Every phase is a row in `SEQUENCE` with its exit condition and
//! enter/tick/exit hooks; `update` runs exactly one phase per call.

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::forest::ObstacleKind;
use super::human::{Intent, Surroundings, spawn_humans};
use super::snake::{LengthSync, StepOutcome};
use super::state::{GameEvent, GameMode, GameState, Music, Sound};
use crate::Direction;
use crate::tuning::Perception;

const CLEANUP_MS: f32 = 13_000.0;
const FADE_MS: f32 = 1_500.0;
const DISSOLVE_GROUP_MS: f32 = 1_800.0;
const DISSOLVE_JITTER_MS: f32 = 1_000.0;
const BG_TRANSITION_MS: f32 = 2_000.0;
const HUNT_CROWD: u32 = 20;
const HUNT_SPAWN_INTERVAL_MS: f32 = 400.0;
const HUNT_PERCEPTION: Perception = Perception::Radius(50);
const HUNT_SPACING: i32 = 6;
const ANNOUNCE_MS: f32 = 3_000.0;
const ANNOUNCE_FADE_MS: f32 = 500.0;
const HUNT_COUNTDOWN_MS: f32 = 3_000.0;
const VICTORY_GLOW_MS: f32 = 1_500.0;
const VICTORY_GLOW_MAX: f32 = 0.75;
const VICTORY_TEXT_MS: f32 = 3_000.0;
const SURVIVOR_MSG_MS: f32 = 3_000.0;
const CONFETTI_MS: f32 = 8_000.0;
const THE_END_MS: f32 = 1_500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndgamePhase {
    Cleanup,
    BgTransition,
    HumanSpawn,
    SnakeSpawn,
    Announce,
    HuntCountdown,
    Hunt,
    VictoryGlow,
    VictoryText,
    SurvivorMsg,
    Confetti,
    TheEnd,
}

/// What fades out during cleanup (and the snake's gold dust after the hunt)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DissolveKind {
    Tree,
    Log,
    Human,
    Food,
    Fruit,
    MegaApple,
    SnakeSegment,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dissolving {
    pub kind: DissolveKind,
    pub cell: IVec2,
    /// Phase time at which the fade starts
    pub start_ms: f32,
    pub alpha: f32,
}

/// Sub-machine state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endgame {
    pub phase: EndgamePhase,
    /// Time spent in the current phase (ms)
    pub timer_ms: f32,
    start_darkness: f32,
    pub darkness: f32,
    start_weather: f32,
    pub weather_intensity: f32,
    pub hud_alpha: f32,
    pub dissolve: Vec<Dissolving>,
    spawn_queue: u32,
    spawn_timer_ms: f32,
    pub announce_alpha: f32,
    pub countdown_value: u32,
    pub glow_alpha: f32,
    pub humans_eaten: u32,
}

impl Endgame {
    pub fn accepts_input(&self) -> bool {
        matches!(self.phase, EndgamePhase::HuntCountdown | EndgamePhase::Hunt)
    }

    /// Whether live humans should be drawn
    pub fn humans_visible(&self) -> bool {
        matches!(
            self.phase,
            EndgamePhase::HumanSpawn
                | EndgamePhase::SnakeSpawn
                | EndgamePhase::Announce
                | EndgamePhase::HuntCountdown
                | EndgamePhase::Hunt
        )
    }

    /// Whether the live snake should be drawn
    pub fn snake_visible(&self) -> bool {
        matches!(
            self.phase,
            EndgamePhase::Announce | EndgamePhase::HuntCountdown | EndgamePhase::Hunt
        )
    }
}

enum Exit {
    After(f32),
    When(fn(&GameState) -> bool),
}

struct PhaseSpec {
    phase: EndgamePhase,
    exit: Exit,
    on_enter: fn(&mut GameState),
    on_tick: fn(&mut GameState, f32),
    on_exit: fn(&mut GameState),
}

fn nothing(_: &mut GameState) {}
fn idle(_: &mut GameState, _: f32) {}

static SEQUENCE: [PhaseSpec; 12] = [
    PhaseSpec {
        phase: EndgamePhase::Cleanup,
        exit: Exit::After(CLEANUP_MS),
        on_enter: nothing,
        on_tick: cleanup_tick,
        on_exit: cleanup_exit,
    },
    PhaseSpec {
        phase: EndgamePhase::BgTransition,
        exit: Exit::After(BG_TRANSITION_MS),
        on_enter: nothing,
        on_tick: bg_transition_tick,
        on_exit: bg_transition_exit,
    },
    PhaseSpec {
        phase: EndgamePhase::HumanSpawn,
        exit: Exit::When(spawn_queue_empty),
        on_enter: human_spawn_enter,
        on_tick: human_spawn_tick,
        on_exit: nothing,
    },
    PhaseSpec {
        phase: EndgamePhase::SnakeSpawn,
        exit: Exit::After(0.0),
        on_enter: snake_spawn_enter,
        on_tick: idle,
        on_exit: nothing,
    },
    PhaseSpec {
        phase: EndgamePhase::Announce,
        exit: Exit::After(ANNOUNCE_MS),
        on_enter: nothing,
        on_tick: announce_tick,
        on_exit: announce_exit,
    },
    PhaseSpec {
        phase: EndgamePhase::HuntCountdown,
        exit: Exit::After(HUNT_COUNTDOWN_MS),
        on_enter: nothing,
        on_tick: hunt_countdown_tick,
        on_exit: hunt_countdown_exit,
    },
    PhaseSpec {
        phase: EndgamePhase::Hunt,
        exit: Exit::When(no_humans_left),
        on_enter: nothing,
        on_tick: hunt_tick,
        on_exit: hunt_exit,
    },
    PhaseSpec {
        phase: EndgamePhase::VictoryGlow,
        exit: Exit::After(VICTORY_GLOW_MS),
        on_enter: nothing,
        on_tick: victory_glow_tick,
        on_exit: nothing,
    },
    PhaseSpec {
        phase: EndgamePhase::VictoryText,
        exit: Exit::After(VICTORY_TEXT_MS),
        on_enter: nothing,
        on_tick: idle,
        on_exit: nothing,
    },
    PhaseSpec {
        phase: EndgamePhase::SurvivorMsg,
        exit: Exit::After(SURVIVOR_MSG_MS),
        on_enter: nothing,
        on_tick: idle,
        on_exit: nothing,
    },
    PhaseSpec {
        phase: EndgamePhase::Confetti,
        exit: Exit::After(CONFETTI_MS),
        on_enter: nothing,
        on_tick: idle,
        on_exit: nothing,
    },
    PhaseSpec {
        phase: EndgamePhase::TheEnd,
        exit: Exit::After(THE_END_MS),
        on_enter: nothing,
        on_tick: idle,
        on_exit: nothing,
    },
];

fn position(phase: EndgamePhase) -> usize {
    SEQUENCE
        .iter()
        .position(|spec| spec.phase == phase)
        .unwrap_or(SEQUENCE.len() - 1)
}

/// Enter the endgame from normal play
pub fn start(state: &mut GameState) {
    let visuals = state.live_visuals();
    let dissolve = build_dissolve_list(state);

    state.snake.gold = false;
    state.snake.prev_segments.clone_from(&state.snake.segments);
    state.mode = GameMode::EndgameHunt;
    state.endgame = Some(Endgame {
        phase: EndgamePhase::Cleanup,
        timer_ms: 0.0,
        start_darkness: visuals.darkness,
        darkness: visuals.darkness,
        start_weather: visuals.weather_intensity,
        weather_intensity: visuals.weather_intensity,
        hud_alpha: 1.0,
        dissolve,
        spawn_queue: 0,
        spawn_timer_ms: 0.0,
        announce_alpha: 0.0,
        countdown_value: 0,
        glow_alpha: 0.0,
        humans_eaten: 0,
    });
    state.events.push(GameEvent::EndgameStarted);
    log::info!("Endgame hunt started after {:.1}s", state.elapsed_ms / 1000.0);
    (SEQUENCE[0].on_enter)(state);
}

/// Trees, then logs (short first), then humans, pickups and finally the
/// snake. Each group starts later than the previous one, with jitter.
fn build_dissolve_list(state: &mut GameState) -> Vec<Dissolving> {
    let mut groups: Vec<(DissolveKind, IVec2, u32)> = Vec::new();
    for tree in state
        .forest
        .obstacles()
        .iter()
        .filter(|o| o.kind == ObstacleKind::Tree)
    {
        groups.push((DissolveKind::Tree, tree.origin, 0));
    }
    let mut logs: Vec<_> = state
        .forest
        .obstacles()
        .iter()
        .filter(|o| o.kind == ObstacleKind::Log)
        .collect();
    logs.sort_by_key(|o| o.length);
    groups.extend(logs.iter().map(|o| (DissolveKind::Log, o.origin, 1)));
    groups.extend(state.humans.iter().map(|h| (DissolveKind::Human, h.pos, 2)));
    if let Some(food) = state.food {
        groups.push((DissolveKind::Food, food, 3));
    }
    if let Some(fruit) = state.fruit {
        groups.push((DissolveKind::Fruit, fruit.cell, 3));
    }
    if let Some(apple) = state.mega_apple {
        groups.push((DissolveKind::MegaApple, apple, 3));
    }
    groups.extend(
        state
            .snake
            .segments
            .iter()
            .map(|&c| (DissolveKind::SnakeSegment, c, 4)),
    );

    groups
        .into_iter()
        .map(|(kind, cell, group)| {
            let jitter = state.rng.random_range(0.0..DISSOLVE_JITTER_MS);
            Dissolving {
                kind,
                cell,
                start_ms: (group as f32 * DISSOLVE_GROUP_MS + jitter).min(CLEANUP_MS - FADE_MS),
                alpha: 1.0,
            }
        })
        .collect()
}

/// Advance the sequencer by one step
pub fn update(state: &mut GameState, dt: f32) {
    let Some(endgame) = state.endgame.as_mut() else {
        return;
    };
    endgame.timer_ms += dt;
    let idx = position(endgame.phase);
    let spec = &SEQUENCE[idx];

    (spec.on_tick)(state, dt);

    let done = match spec.exit {
        Exit::After(ms) => state.endgame.as_ref().is_some_and(|e| e.timer_ms >= ms),
        Exit::When(condition) => condition(state),
    };
    if !done {
        return;
    }
    (spec.on_exit)(state);

    match SEQUENCE.get(idx + 1) {
        Some(next) => {
            if let Some(endgame) = state.endgame.as_mut() {
                endgame.phase = next.phase;
                endgame.timer_ms = 0.0;
            }
            log::debug!("Endgame phase {:?}", next.phase);
            (next.on_enter)(state);
        }
        None => finish(state),
    }
}

fn finish(state: &mut GameState) {
    log::info!("Endgame complete, back to menu");
    state.endgame = None;
    state.mode = GameMode::Menu;
    state.events.push(GameEvent::PlayMusic(Music::Menu));
}

fn cleanup_tick(state: &mut GameState, _dt: f32) {
    let Some(endgame) = state.endgame.as_mut() else {
        return;
    };
    let t = endgame.timer_ms;
    let progress = (t / CLEANUP_MS).min(1.0);
    endgame.weather_intensity = endgame.start_weather * (1.0 - progress);
    endgame.hud_alpha = (1.0 - progress).max(0.0);
    state.snake.prev_segments.clone_from(&state.snake.segments);

    for item in &mut endgame.dissolve {
        if t < item.start_ms || item.alpha <= 0.0 {
            continue;
        }
        item.alpha = (1.0 - (t - item.start_ms) / FADE_MS).max(0.0);
        if item.alpha > 0.0 {
            continue;
        }
        match item.kind {
            DissolveKind::Tree | DissolveKind::Log => {
                state.forest.remove_at(item.cell);
            }
            DissolveKind::Human => state.humans.retain(|h| h.pos != item.cell),
            DissolveKind::Food => state.food = None,
            DissolveKind::Fruit => state.fruit = None,
            DissolveKind::MegaApple => state.mega_apple = None,
            DissolveKind::SnakeSegment => {}
        }
    }
}

fn cleanup_exit(state: &mut GameState) {
    state.forest.clear();
    state.humans.clear();
    state.food = None;
    state.fruit = None;
    state.mega_apple = None;
    if let Some(endgame) = state.endgame.as_mut() {
        endgame.dissolve.clear();
        endgame.weather_intensity = 0.0;
        endgame.hud_alpha = 0.0;
    }
}

fn bg_transition_tick(state: &mut GameState, _dt: f32) {
    state.snake.prev_segments.clone_from(&state.snake.segments);
    if let Some(endgame) = state.endgame.as_mut() {
        let progress = (endgame.timer_ms / BG_TRANSITION_MS).min(1.0);
        endgame.darkness = endgame.start_darkness * (1.0 - progress);
    }
}

fn bg_transition_exit(state: &mut GameState) {
    if let Some(endgame) = state.endgame.as_mut() {
        endgame.darkness = 0.0;
    }
    state.events.push(GameEvent::PlayMusic(Music::Endgame));
}

fn human_spawn_enter(state: &mut GameState) {
    state.humans.clear();
    if let Some(endgame) = state.endgame.as_mut() {
        endgame.spawn_queue = HUNT_CROWD;
        endgame.spawn_timer_ms = 0.0;
    }
}

fn human_spawn_tick(state: &mut GameState, dt: f32) {
    let Some(endgame) = state.endgame.as_mut() else {
        return;
    };
    endgame.spawn_timer_ms += dt;
    if endgame.spawn_timer_ms < HUNT_SPAWN_INTERVAL_MS || endgame.spawn_queue == 0 {
        return;
    }
    endgame.spawn_timer_ms = 0.0;
    endgame.spawn_queue -= 1;

    let mut rules = state.human_rules(HUNT_PERCEPTION);
    rules.spacing = HUNT_SPACING;
    spawn_humans(
        &mut state.humans,
        1,
        rules,
        &state.forest,
        &state.snake.segments,
        &mut state.rng,
    );
}

fn spawn_queue_empty(state: &GameState) -> bool {
    state.endgame.as_ref().is_none_or(|e| e.spawn_queue == 0)
}

fn snake_spawn_enter(state: &mut GameState) {
    let center = state.center();
    state.snake.reset(center);
    state.snake.gold = true;
    state.health.fill();
    state.snake.health_factor = 1.0;
    state.snake.enforce_health_length(LengthSync::Immediate);
    state.snake.face(Direction::Right);
}

fn announce_tick(state: &mut GameState, _dt: f32) {
    if let Some(endgame) = state.endgame.as_mut() {
        let t = endgame.timer_ms;
        endgame.announce_alpha = if t < ANNOUNCE_FADE_MS {
            t / ANNOUNCE_FADE_MS
        } else if t < ANNOUNCE_MS - ANNOUNCE_FADE_MS {
            1.0
        } else {
            (1.0 - (t - (ANNOUNCE_MS - ANNOUNCE_FADE_MS)) / ANNOUNCE_FADE_MS).max(0.0)
        };
    }
}

fn announce_exit(state: &mut GameState) {
    if let Some(endgame) = state.endgame.as_mut() {
        endgame.announce_alpha = 0.0;
    }
}

fn hunt_countdown_tick(state: &mut GameState, _dt: f32) {
    if let Some(endgame) = state.endgame.as_mut() {
        let elapsed_counts = (endgame.timer_ms / 1000.0).floor() as u32;
        endgame.countdown_value = 3u32.saturating_sub(elapsed_counts);
    }
}

fn hunt_countdown_exit(state: &mut GameState) {
    if let Some(endgame) = state.endgame.as_mut() {
        endgame.countdown_value = 0;
    }
    state.events.push(GameEvent::Sound(Sound::Go));
}

/// The snake can't be hurt: walls and logs just turn it around and running
/// into itself holds it in place. Any human it touches is eaten.
fn hunt_tick(state: &mut GameState, dt: f32) {
    state.elapsed_ms += dt;
    let (cols, rows) = (state.cols, state.rows);
    match state
        .snake
        .update(cols, rows, state.elapsed_ms, &state.forest)
    {
        StepOutcome::BounceWall { .. } | StepOutcome::BounceObstacle { .. } => state.snake.reverse(),
        StepOutcome::Alive | StepOutcome::Dead => {}
    }
    state.snake.tick_timers(dt);

    let view = Surroundings {
        forest: &state.forest,
        target: state.snake.head(),
        day: state.tuning.max_days,
        night: false,
        intent: Intent::Flee,
    };
    let mut eaten = 0;
    for human in &mut state.humans {
        human.update(&view, &mut state.rng);
    }
    state.humans.retain(|h| {
        let caught = state.snake.occupies(h.pos);
        if caught {
            eaten += 1;
        }
        !caught
    });
    for _ in 0..eaten {
        state.events.push(GameEvent::Sound(Sound::Eat));
    }
    if let Some(endgame) = state.endgame.as_mut() {
        endgame.humans_eaten += eaten;
    }
}

fn no_humans_left(state: &GameState) -> bool {
    state.humans.is_empty()
}

fn hunt_exit(state: &mut GameState) {
    let dust: Vec<Dissolving> = state
        .snake
        .segments
        .iter()
        .map(|&cell| Dissolving {
            kind: DissolveKind::SnakeSegment,
            cell,
            start_ms: 0.0,
            alpha: 1.0,
        })
        .collect();
    if let Some(endgame) = state.endgame.as_mut() {
        endgame.dissolve = dust;
    }
    log::info!("Hunt won");
    state.events.push(GameEvent::Victory);
    state.record_run();
}

fn victory_glow_tick(state: &mut GameState, _dt: f32) {
    if let Some(endgame) = state.endgame.as_mut() {
        let progress = (endgame.timer_ms / VICTORY_GLOW_MS).min(1.0);
        endgame.glow_alpha = (progress * VICTORY_GLOW_MAX).min(VICTORY_GLOW_MAX);
        for dust in &mut endgame.dissolve {
            dust.alpha = 1.0 - progress;
        }
    }
}
