//! Snake Forest entry point
//!
//! The game itself runs in the browser (see `web.rs`). Natively this runs a
//! headless autopilot game so the simulation can be watched through the log:
//!
//! ```text
//! RUST_LOG=info cargo run -- [seed] [minutes]
//! ```

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use snake_forest::KeyValueStore;
    use snake_forest::sim::{FrameInput, GameEvent, GameMode, GameState, frame};
    use snake_forest::snapshot::Snapshot;
    use snake_forest::stats::MemoryStore;

    /// Simulated display refresh
    const FRAME_MS: f32 = 1000.0 / 60.0;

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let minutes: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(12.0);
    let max_frames = (minutes * 60_000.0 / FRAME_MS) as u32;

    log::info!("Snake Forest (native) starting, seed {seed}");

    let mut store = MemoryStore::new();
    let mut state = GameState::new(seed);
    let input = FrameInput {
        start: true,
        autopilot: true,
        ..Default::default()
    };
    let mut started = false;

    for _ in 0..max_frames {
        frame(&mut state, &input, FRAME_MS);
        for event in state.drain_events() {
            match event {
                GameEvent::StatsUpdated => {
                    if let Err(e) = state.stats.save(&mut store) {
                        log::warn!("Failed to save stats: {e}");
                    }
                }
                GameEvent::Sound(_) => {}
                other => log::debug!("{other:?}"),
            }
        }
        if state.mode != GameMode::Menu {
            started = true;
        }
        // One run only: stop at game over or when the endgame hands back the menu
        if started && matches!(state.mode, GameMode::GameOver | GameMode::Menu) {
            break;
        }
    }

    let snapshot = Snapshot::capture(&state);
    println!(
        "\nSeed {seed}: {:?} on day {} after {:.1}s, length {}, {} food eaten",
        snapshot.mode,
        snapshot.day,
        snapshot.elapsed_ms / 1000.0,
        snapshot.snake.segments.len(),
        state.foods_eaten,
    );
    if let Some(reason) = snapshot.game_over_reason {
        println!("Cause: {reason:?}");
    }
    match store.read(snake_forest::MetaStats::STORAGE_KEY) {
        Ok(Some(json)) => println!("Stats: {json}"),
        Ok(None) => println!("Stats: run still in progress"),
        Err(e) => log::warn!("Failed to read stats: {e}"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::init, this is just to satisfy the compiler
}
