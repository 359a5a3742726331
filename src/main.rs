//! Goat Climb entry point
//!
//! Headless runner: builds a scene, drives it with the autopilot through the
//! fixed timestep accumulator a frame loop would use, and reports the result.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use goat_climb::consts::*;
use goat_climb::leaderboard::{PendingRank, submit_in_background};
use goat_climb::sim::{Autopilot, GameEvent, Scene, TickInput, tick};
use goat_climb::{LocalLeaderboard, ScoreSubmission, Settings, format_clock};

/// A vertical charge-jump platformer, played by the autopilot
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Viewport width in pixels
    #[arg(long, default_value_t = 1920.0)]
    width: f32,
    /// Viewport height in pixels
    #[arg(long, default_value_t = 1080.0)]
    height: f32,
    /// Override the RNG seed from the settings file
    #[arg(long)]
    seed: Option<u64>,
    /// Maximum number of simulation ticks to run
    #[arg(long, default_value_t = 36_000)]
    ticks: u64,
    /// Host frame time in milliseconds
    #[arg(long, default_value_t = 16.0)]
    frame_ms: f32,
    /// Resize the viewport to WIDTHxHEIGHT halfway through the run
    #[arg(long, value_parser = parse_size)]
    resize: Option<(f32, f32)>,
    /// JSON settings file
    #[arg(long, default_value = "settings.json")]
    config: PathBuf,
    /// Nickname for the leaderboard
    #[arg(long, default_value = "goat")]
    nickname: String,
}

fn parse_size(s: &str) -> Result<(f32, f32), String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let h = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    Ok((w, h))
}

/// Game instance holding all state
struct Game {
    scene: Scene,
    pilot: Autopilot,
    accumulator: f32,
}

impl Game {
    fn new(scene: Scene) -> Self {
        Self {
            scene,
            pilot: Autopilot::new(),
            accumulator: 0.0,
        }
    }

    /// Run simulation ticks for one host frame
    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input: TickInput = self.pilot.next_input(&self.scene);
            tick(&mut self.scene, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
            events.extend(self.scene.drain_events());
        }
        // Drop the backlog rather than spiral
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        events
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut settings = Settings::load_or_default(&args.config);
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }

    let scene = match Scene::new(args.width, args.height, settings) {
        Ok(scene) => scene,
        Err(e) => {
            log::error!("Cannot build scene: {}", e);
            std::process::exit(2);
        }
    };
    log::info!("Goat Climb (headless) starting at {}x{}", args.width, args.height);

    let mut game = Game::new(scene);
    let frame_dt = (args.frame_ms / 1000.0).max(0.001);
    let mut jumps = 0u32;
    let mut pending_resize = args.resize;
    let mut frame = 0u64;

    while game.scene.time_ticks < args.ticks {
        if game.scene.time_ticks >= args.ticks / 2 {
            if let Some((w, h)) = pending_resize.take() {
                if let Err(e) = game.scene.resize(w, h) {
                    log::warn!("Resize to {}x{} rejected: {}", w, h, e);
                }
            }
        }

        for event in game.update(frame_dt) {
            match event {
                GameEvent::JumpExecuted => jumps += 1,
                GameEvent::ChaserAlerted(i) => log::debug!("Chaser {} alerted", i),
                GameEvent::LayoutRebuilt(variant) => log::info!("Switched to {:?} layout", variant),
                _ => {}
            }
        }

        if frame % 600 == 0 {
            let hud = game.scene.hud();
            log::info!("{} height {}m (best {}m)", hud.clock, hud.height_m, hud.max_height_m);
        }
        if game.scene.is_over() {
            break;
        }
        frame += 1;
    }

    let hud = game.scene.hud();
    match game.scene.result() {
        Some(result) if result.success => {
            println!(
                "Cleared in {} with {} jumps, max height {}m",
                format_clock(result.clear_time_secs),
                jumps,
                result.max_height
            );
            let board = Arc::new(LocalLeaderboard::new());
            let submission =
                ScoreSubmission::new(&args.nickname, result.clear_time_secs, result.max_height);
            let mut pending = submit_in_background(board, submission);
            match wait_for_rank(&mut pending) {
                Some(rank) => println!("Rank #{}", rank),
                None => println!("Rank unavailable"),
            }
        }
        Some(result) => println!(
            "Caught after {} at {}m ({} jumps)",
            format_clock(result.clear_time_secs),
            result.max_height,
            jumps
        ),
        None => println!(
            "Stopped after {}: best height {}m ({} jumps)",
            hud.clock, hud.max_height_m, jumps
        ),
    }
}

/// Poll the background submission like a result screen would
fn wait_for_rank(pending: &mut PendingRank) -> Option<u32> {
    for _ in 0..500 {
        if pending.is_settled() {
            return pending.try_rank();
        }
        std::thread::sleep(std::time::Duration::from_millis(2));
    }
    None
}
