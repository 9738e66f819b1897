//! Circuit runtime
//!
//! Runs one driving session headless: loads the runtime config, builds the
//! game, then paces frames against the wall clock while replaying the input
//! script. Ctrl+C or the configured duration ends the session.

mod config;
mod headless;

use crate::config::{RuntimeConfig, RuntimeError};
use crate::headless::{HeadlessRenderer, ScriptPlayer};
use circuit_game::{Game, GameLoop};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const OUTPUT_SIZE: (u32, u32) = (1280, 720);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("Startup failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), RuntimeError> {
    let config = RuntimeConfig::load()?;
    config.validate()?;
    config.print_summary();

    let mut game = Game::new(config.game_config(), HeadlessRenderer::new(config.show_fps))?;
    game.resize(OUTPUT_SIZE.0, OUTPUT_SIZE.1);
    let mut script = ScriptPlayer::new(config.script.clone());

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        log::info!("Received Ctrl+C, shutting down...");
        r.store(false, Ordering::SeqCst);
    }) {
        log::warn!("Failed to set Ctrl+C handler: {}", e);
    }

    let frame_budget = Duration::from_secs_f64(1.0 / config.target_fps as f64);
    let epoch = Instant::now();
    let mut game_loop = GameLoop::new();
    game_loop.start(epoch.elapsed());

    log::info!("Session running. Press Ctrl+C to exit.");

    while game_loop.is_pending() {
        let frame_start = Instant::now();

        if !running.load(Ordering::SeqCst) {
            game.exit();
        } else if config.duration_secs > 0.0 && game_loop.time().total >= config.duration_secs as f64 {
            log::info!("Reached {:.1}s, stopping", config.duration_secs);
            game.exit();
        }

        script.apply(game_loop.time().total as f32, game.input_mut());
        if !game_loop.frame(epoch.elapsed(), &mut game) {
            break;
        }

        let spent = frame_start.elapsed();
        if spent < frame_budget {
            std::thread::sleep(frame_budget - spent);
        }
    }

    let (width, height) = game.renderer().size();
    log::info!(
        "Ran {} frames at {}x{}: {} laps, {} barrier contacts, {} respawns",
        game.renderer().frames(),
        width,
        height,
        game.progress().laps(),
        game.barrier_hits(),
        game.respawns()
    );
    if script.remaining() > 0 {
        log::debug!("{} script events not played", script.remaining());
    }
    Ok(())
}
