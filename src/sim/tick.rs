//! Frame driver and fixed-step simulation
//!
//! `frame` is called once per rendered frame with real elapsed time. It
//! applies input, runs the real-time overlays (countdown, death banner) and
//! turns the rest into whole simulation steps. The step length follows the
//! snake's current speed, so a hungry or stuffed snake really is slower.

use glam::IVec2;

use super::endgame;
use super::forest::ObstacleKind;
use super::health::Drain;
use super::human::{Intent, Surroundings, spawn_humans};
use super::phase::is_night;
use super::placement::{CellRect, find_cell};
use super::snake::{Glow, LengthSync, StepOutcome};
use super::spawn::{FruitKind, PICKUP_ATTEMPTS, place_food, place_pickup};
use super::state::{DeathEvent, DeathReason, Fruit, GameEvent, GameMode, GameState, Music, Sound};
use crate::consts::*;
use crate::{Direction, manhattan, tuning};

const RESPAWN_ATTEMPTS: u32 = 150;
const RESPAWN_MARGIN: i32 = 2;
/// Minimum Manhattan distance between a respawned head and any human
const RESPAWN_HUMAN_CLEARANCE: i32 = 8;
const FRUIT_GLOW_MS: f32 = 3_000.0;
const MEGA_GLOW_MS: f32 = 4_000.0;
/// Below this health the fullness slowdown no longer applies
const FULLNESS_HEALTH_FLOOR: f32 = 0.3;

/// Input for a single frame
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    pub steer: Option<Direction>,
    /// Start a run from the menu or game over screen
    pub start: bool,
    pub pause: bool,
    pub quit: bool,
    pub toggle_mute: bool,
    /// Demo mode - the snake steers itself toward food (or prey)
    pub autopilot: bool,
}

/// Advance the game by one rendered frame of `real_dt_ms`
pub fn frame(state: &mut GameState, input: &FrameInput, real_dt_ms: f32) {
    let dt = real_dt_ms.clamp(0.0, MAX_FRAME_MS);

    if input.toggle_mute {
        state.toggle_mute();
    }
    if input.quit {
        state.quit_to_menu();
    }
    if input.pause {
        state.toggle_pause();
    }
    if input.start && matches!(state.mode, GameMode::Menu | GameMode::GameOver) {
        state.start_run();
    }

    let steer = if input.autopilot {
        autopilot(state)
    } else {
        input.steer
    };
    if let Some(dir) = steer {
        state.steer(dir);
    }

    match state.mode {
        GameMode::Countdown => update_countdown(state, dt),
        GameMode::DeathEvent => update_death_event(state, dt),
        GameMode::Playing | GameMode::EndgameHunt => run_steps(state, dt),
        GameMode::Menu | GameMode::Paused | GameMode::GameOver => {}
    }

    // Real-time decays
    state.input_lock_ms = (state.input_lock_ms - dt).max(0.0);
    if state.mode != GameMode::Paused {
        state.forest.update(dt);
    }
}

fn update_countdown(state: &mut GameState, dt: f32) {
    state.countdown.elapsed_ms += dt;
    while state.countdown.elapsed_ms >= COUNTDOWN_STEP_MS {
        state.countdown.elapsed_ms -= COUNTDOWN_STEP_MS;
        if state.countdown.value <= 1 {
            state.countdown.value = 0;
            state.mode = GameMode::Playing;
            state.frozen = None;
            state.clock.accumulator_ms = 0.0;
            state.events.push(GameEvent::Sound(Sound::Go));
            return;
        }
        state.countdown.value -= 1;
        state.events.push(GameEvent::Sound(Sound::Tick));
    }
}

fn update_death_event(state: &mut GameState, dt: f32) {
    let Some(death) = state.death.as_mut() else {
        state.begin_countdown();
        return;
    };
    death.remaining_ms -= dt;
    if death.remaining_ms <= 0.0 {
        state.death = None;
        state.begin_countdown();
    }
}

/// Length of one simulation step at the snake's current pace (ms)
pub fn step_ms(state: &GameState) -> f32 {
    if state.endgame.is_some() {
        return 1000.0 / state.speed;
    }
    let health = state.health.factor();
    let base = if state.health.is_tired() {
        state.tuning.tired_speed
    } else {
        state.speed
    };
    let fullness = if health < FULLNESS_HEALTH_FLOOR {
        0.0
    } else {
        state.snake.fullness_penalty()
    };
    let fps = base * (0.6 + 0.4 * health) * (1.0 - fullness);
    1000.0 / fps.max(1.0)
}

/// Fixed timestep accumulator
fn run_steps(state: &mut GameState, dt: f32) {
    let mode = state.mode;
    let step = step_ms(state);
    state.clock.step_ms = step;
    state.clock.accumulator_ms += dt;

    let mut steps = 0;
    while state.clock.accumulator_ms >= step && steps < MAX_SUBSTEPS {
        state.clock.accumulator_ms -= step;
        self::step(state, step);
        steps += 1;
        if state.mode != mode {
            state.clock.accumulator_ms = 0.0;
            break;
        }
    }
    // Drop backlog instead of spiralling
    if steps == MAX_SUBSTEPS {
        state.clock.accumulator_ms = state.clock.accumulator_ms.min(step);
    }
    state.clock.alpha = (state.clock.accumulator_ms / step).clamp(0.0, 1.0);
}

/// Advance the simulation by one step of `dt` ms
pub fn step(state: &mut GameState, dt: f32) {
    match state.mode {
        GameMode::Playing => play_step(state, dt),
        GameMode::EndgameHunt => endgame::update(state, dt),
        _ => {}
    }
}

fn play_step(state: &mut GameState, dt: f32) {
    state.elapsed_ms += dt;

    // Phase clock
    let signals = state.phase.update(dt);
    if signals.trigger_audio {
        let upcoming = state.phase.phase_count + 1;
        if upcoming.div_ceil(2) <= state.tuning.max_days {
            let music = if is_night(upcoming) {
                Music::Night
            } else {
                Music::Day
            };
            state.events.push(GameEvent::CrossFade(music));
        }
    }
    for _ in 0..signals.next_day {
        if advance_phase(state) {
            return;
        }
    }

    // Health
    state.snake.health_factor = state.health.factor();
    state.snake.enforce_health_length(LengthSync::Gradual);
    if state.health.drain(dt) == Drain::Starved {
        handle_death(state, DeathReason::Starved);
        return;
    }
    state.snake.health_factor = state.health.factor();

    // Snake
    let (cols, rows) = (state.cols, state.rows);
    let outcome = state
        .snake
        .update(cols, rows, state.elapsed_ms, &state.forest);
    let lethal = match outcome {
        StepOutcome::Alive => false,
        StepOutcome::BounceWall { cell } => bounce(state, Impact::Wall(cell)),
        StepOutcome::BounceObstacle { cell, kind } => bounce(state, Impact::Obstacle(cell, kind)),
        StepOutcome::Dead => {
            handle_death(state, DeathReason::SelfHit);
            true
        }
    };
    if lethal {
        return;
    }
    state.snake.tick_timers(dt);

    // Humans
    if step_humans(state) {
        handle_death(state, DeathReason::HumanCaught);
        return;
    }

    eat_pickups(state);
    roll_spawns(state, dt);
}

/// Move to the next phase. Returns true when the run left normal play.
fn advance_phase(state: &mut GameState) -> bool {
    let phase = state.phase.advance_phase();
    let new_day = state.phase.day();
    if new_day > state.tuning.max_days {
        endgame::start(state);
        return true;
    }

    let music = if is_night(phase) {
        Music::Night
    } else {
        Music::Day
    };
    state.events.push(GameEvent::PlayMusic(music));
    if new_day > state.day {
        next_day(state, new_day);
    } else {
        log::info!("Night {} falls", state.day);
    }
    false
}

/// Grow the world for a newly reached day, keeping what is already there
fn next_day(state: &mut GameState, day: u32) {
    let level = tuning::level(day);
    state.day = day;
    state.snake.permanent_grow();

    let report = state.forest.populate(
        &mut state.rng,
        level.trees,
        level.long_logs,
        level.short_logs,
    );
    let missing = level.humans.saturating_sub(state.humans.len() as u32);
    let rules = state.human_rules(level.perception);
    let spawned = spawn_humans(
        &mut state.humans,
        missing,
        rules,
        &state.forest,
        &state.snake.segments,
        &mut state.rng,
    );
    for human in &mut state.humans {
        human.perception = level.perception;
    }
    state.speed = state.tuning.speed_for_day(day);

    log::info!(
        "Day {day}: +{} obstacles, +{spawned} humans, speed {:.2}",
        report.placed,
        state.speed
    );
    state.events.push(GameEvent::DayStarted(day));
}

#[derive(Debug, Clone, Copy)]
enum Impact {
    Wall(IVec2),
    Obstacle(IVec2, ObstacleKind),
}

/// Knockback from a wall or obstacle. Returns true if the penalty was lethal.
fn bounce(state: &mut GameState, impact: Impact) -> bool {
    state.events.push(GameEvent::Sound(Sound::Bounce));
    let penalty = if state.snake.shield {
        state.tuning.shield_bounce_penalty_ms
    } else {
        state.tuning.bounce_penalty_ms
    };
    state.snake.invincible_ticks = state.tuning.bounce_invincible_ticks;
    state.snake.damage_glow_ms = state.tuning.damage_glow_ms;

    let drained = state.health.damage(penalty);
    state.snake.health_factor = state.health.factor();
    if state.snake.enforce_health_length(LengthSync::Gradual) == 0 {
        state.snake.shrink();
    }

    if drained == Drain::Starved {
        let reason = match impact {
            Impact::Wall(_) => DeathReason::WallHit,
            Impact::Obstacle(_, ObstacleKind::Tree) => DeathReason::TreeHit,
            Impact::Obstacle(_, ObstacleKind::Log) => DeathReason::LogHit,
        };
        handle_death(state, reason);
        return true;
    }

    match impact {
        Impact::Wall(cell) => state.forest.flash_border(cell),
        Impact::Obstacle(cell, _) => state.forest.flash_obstacle(cell),
    }
    state.snake.reverse();
    state.input_lock_ms = INPUT_LOCK_MS;
    false
}

/// Step every human; true if one of them ends up on the snake
fn step_humans(state: &mut GameState) -> bool {
    let view = Surroundings {
        forest: &state.forest,
        target: state.snake.head(),
        day: state.day,
        night: state.phase.is_night(),
        intent: Intent::Chase,
    };
    let mut caught = false;
    for human in &mut state.humans {
        human.update(&view, &mut state.rng);
        caught |= state.snake.occupies(human.pos);
    }
    // Respawn safety covers capture too
    caught && state.snake.respawn_safety_ms <= 0.0
}

fn handle_death(state: &mut GameState, reason: DeathReason) {
    state.events.push(GameEvent::Sound(Sound::Die));
    state.clock.accumulator_ms = 0.0;
    state.input_lock_ms = 0.0;

    if state.lives > 1 {
        state.lives -= 1;
        safe_respawn(state);
        state.death = Some(DeathEvent {
            reason,
            remaining_ms: DEATH_EVENT_MS,
        });
        state.mode = GameMode::DeathEvent;
        log::info!("Life lost ({reason:?}), {} left", state.lives);
        state.events.push(GameEvent::LifeLost {
            reason,
            lives_left: state.lives,
        });
        return;
    }

    state.lives = 0;
    state.mode = GameMode::GameOver;
    state.game_over_reason = Some(reason);
    log::info!(
        "Game over ({reason:?}) on day {} after {:.1}s",
        state.day,
        state.elapsed_ms / 1000.0
    );
    state.record_run();
    state.events.push(GameEvent::GameOver { reason });
}

/// Put the snake somewhere clear of obstacles and humans, or the centre
fn safe_respawn(state: &mut GameState) {
    let area = CellRect::inset(state.cols, state.rows, RESPAWN_MARGIN);
    let arena = CellRect::inset(state.cols, state.rows, 0);
    let body_len = state.snake.base_length as i32;
    let forest = &state.forest;
    let humans = &state.humans;

    let head = find_cell(&mut state.rng, area, RESPAWN_ATTEMPTS, |head| {
        (0..body_len).all(|i| {
            let cell = head - IVec2::new(i, 0);
            arena.contains(cell) && !forest.is_obstacle(cell)
        }) && humans
            .iter()
            .all(|h| manhattan(h.pos, head) >= RESPAWN_HUMAN_CLEARANCE)
    });
    let head = head.unwrap_or_else(|| {
        log::warn!("No safe respawn cell, using centre");
        state.center()
    });

    state.snake.reset(head);
    state.snake.respawn_safety_ms = state.tuning.respawn_safety_ms;
    state.snake.invincible_ticks = state.tuning.respawn_invincible_ticks;
    state.health.fill();
    state.snake.health_factor = 1.0;
}

fn eat_pickups(state: &mut GameState) {
    let head = state.snake.head();

    if state.food == Some(head) {
        state.health.heal(state.tuning.food_heal_ms);
        state.snake.eat(state.elapsed_ms);
        state.foods_eaten += 1;
        state.food = Some(place_food(
            &mut state.rng,
            &state.forest,
            &state.snake.segments,
        ));
        state.events.push(GameEvent::Sound(Sound::Eat));
    }

    if state.mega_apple == Some(head) {
        state.mega_apple = None;
        state.health.fill();
        state.snake.health_factor = 1.0;
        state.snake.start_glow(Glow::Crimson, MEGA_GLOW_MS);
        state.snake.eat(state.elapsed_ms);
        state.foods_eaten += 1;
        state.events.push(GameEvent::Sound(Sound::Eat));
    }

    if let Some(fruit) = state.fruit.filter(|f| f.cell == head) {
        state.fruit = None;
        apply_fruit(state, fruit.kind);
    }
}

fn apply_fruit(state: &mut GameState, kind: FruitKind) {
    match kind {
        FruitKind::Life => {
            if state.lives < state.tuning.max_lives {
                state.lives += 1;
            }
        }
        FruitKind::Shield => {
            state.snake.shield = true;
            state.health.fill();
            state.snake.health_factor = 1.0;
            state.snake.enforce_health_length(LengthSync::Immediate);
        }
        FruitKind::Reset => {
            state.snake.trim_to_base();
            state.health.fill();
            state.snake.health_factor = 1.0;
        }
        FruitKind::PhaseThrough => {
            state.snake.phase_through_ms = state.tuning.phase_through_ms;
        }
    }
    state.snake.start_glow(kind.glow(), FRUIT_GLOW_MS);
    log::debug!("Ate {kind:?}");
    state.events.push(GameEvent::Sound(Sound::PowerUp));
}

fn roll_spawns(state: &mut GameState, dt: f32) {
    if state.fruit.is_none() {
        if let Some(kind) = state
            .spawn_gate
            .roll_fruit(state.elapsed_ms, dt, &mut state.rng)
        {
            match place_pickup(
                &mut state.rng,
                &state.forest,
                &state.snake.segments,
                PICKUP_ATTEMPTS,
            ) {
                Some(cell) => {
                    state.fruit = Some(Fruit { cell, kind });
                    state
                        .spawn_gate
                        .record_fruit(kind, state.elapsed_ms, &mut state.rng);
                }
                None => log::debug!("No room for {kind:?}"),
            }
        }
    }

    if state.mega_apple.is_none()
        && state
            .spawn_gate
            .roll_mega(state.phase.is_night(), state.phase.phase_count, &mut state.rng)
    {
        match place_pickup(
            &mut state.rng,
            &state.forest,
            &state.snake.segments,
            PICKUP_ATTEMPTS,
        ) {
            Some(cell) => {
                state.mega_apple = Some(cell);
                state.spawn_gate.record_mega(state.phase.phase_count);
            }
            None => log::debug!("No room for a mega apple"),
        }
    }
}

/// Demo steering: head for the food (or the nearest human during the hunt)
/// by the safest greedy step.
pub fn autopilot(state: &GameState) -> Option<Direction> {
    let head = state.snake.head();
    let target = if state.endgame.is_some() {
        state
            .humans
            .iter()
            .map(|h| h.pos)
            .min_by_key(|&p| manhattan(p, head))?
    } else {
        state.food?
    };
    let arena = CellRect::inset(state.cols, state.rows, 0);
    let current = state.snake.direction;

    Direction::ALL
        .into_iter()
        .filter(|&d| d != current.opposite())
        .filter(|&d| {
            let cell = head + d.delta();
            arena.contains(cell) && !state.forest.is_obstacle(cell) && !state.snake.occupies(cell)
        })
        .min_by_key(|&d| manhattan(head + d.delta(), target))
        .filter(|&d| d != current)
}
