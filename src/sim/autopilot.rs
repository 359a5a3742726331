//! Demo autopilot
//!
//! Plays the game from scene state alone, producing the same [`TickInput`]
//! a human would. Used by the headless runner and for soak tests.

use glam::Vec2;

use super::input::TickInput;
use super::player::PlayerState;
use super::state::Scene;
use crate::consts::*;

/// Clearance added above the target platform top
const HEADROOM: f32 = 40.0;
/// Targets closer than this horizontally are jumped straight up
const DEAD_ZONE: f32 = 12.0;

#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    /// Ticks spent charging the current jump
    charge_ticks: u32,
    /// Ticks to charge before releasing
    target_ticks: u32,
    direction: i8,
    /// Platform index aimed at, for logging
    target: Option<usize>,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide this tick's input
    pub fn next_input(&mut self, scene: &Scene) -> TickInput {
        let mut input = TickInput {
            keyboard_direction: self.direction,
            ..Default::default()
        };

        if scene.player.charging {
            self.charge_ticks += 1;
            if self.charge_ticks >= self.target_ticks {
                input.charge_release = true;
            }
            return input;
        }

        if !scene.player.grounded || scene.player.state != PlayerState::Idle {
            return input;
        }

        let position = scene.player_position();
        let Some((index, landing)) = next_platform(scene, position) else {
            return input;
        };

        let s = scene.scale.scale;
        let multiplier = scene.settings.jump_height_multiplier(s);
        let rise = (position.y - landing.y + HEADROOM).max(0.0);
        let vy = (2.0 * GRAVITY * rise).sqrt();
        let vertical_power = vy / multiplier;

        // Frames up and back down to the landing height
        let airtime = 2.0 * vy / GRAVITY;
        let dx = landing.x - position.x;
        let horizontal_power = if airtime > 0.0 {
            dx.abs() / (HORIZONTAL_JUMP_RATIO * s * airtime)
        } else {
            0.0
        };
        let power = vertical_power.max(horizontal_power).min(MAX_JUMP_POWER);

        // Vary the charge slightly so failed jumps are not repeated exactly
        let time_factor = scene.time_ticks as f32 * 0.01;
        let jitter = (time_factor.sin() * 2.0).round() as i32;
        let ticks = (power / CHARGE_RATE / SIM_DT).ceil() as i32 + jitter;

        self.target_ticks = ticks.max(1) as u32;
        self.charge_ticks = 0;
        self.direction = if dx.abs() < DEAD_ZONE {
            0
        } else if dx > 0.0 {
            1
        } else {
            -1
        };
        if self.target != Some(index) {
            log::debug!("Autopilot aiming at platform {} ({} ticks)", index, self.target_ticks);
            self.target = Some(index);
        }

        input.keyboard_direction = self.direction;
        input.charge_start = true;
        input
    }
}

/// Lowest platform above the player, as `(index, landing point)`
fn next_platform(scene: &Scene, position: Vec2) -> Option<(usize, Vec2)> {
    let s = scene.scale.scale;
    let feet = position.y + PLAYER_SIZE / 2.0;
    scene
        .layout
        .platforms
        .iter()
        .enumerate()
        .map(|(i, p)| (i, Vec2::new(p.x * s, p.y - PLATFORM_THICKNESS / 2.0)))
        .filter(|(_, top)| top.y < feet - PLAYER_SIZE)
        .max_by(|(_, a), (_, b)| {
            a.y.partial_cmp(&b.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    // Prefer the nearer of two equally high platforms
                    (b.x - position.x)
                        .abs()
                        .partial_cmp(&(a.x - position.x).abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        })
}
