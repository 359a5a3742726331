//! Player controller
//!
//! Charge/jump/fall/land state machine. The physics world owns the player's
//! position and velocity; this controller reads the velocity each tick and
//! returns velocity commands for the scene to apply.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::input::TickInput;
use super::physics::BodyHandle;
use super::state::GameEvent;
use crate::consts::*;

/// Discrete player state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerState {
    #[default]
    Idle,
    Charging,
    Jumping,
    Falling,
    /// Short hold after touching down
    Landed,
}

/// Per-tick context the controller needs from the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerContext {
    pub dt: f32,
    pub scale: f32,
    pub keyboard_available: bool,
    /// Vertical jump multiplier for the current viewport
    pub jump_multiplier: f32,
}

/// Jump power after charging for `elapsed` seconds
#[inline]
pub fn charge_power(elapsed: f32) -> f32 {
    (elapsed.max(0.0) * CHARGE_RATE).min(MAX_JUMP_POWER)
}

/// Launch velocity for a released charge
pub fn jump_velocity(power: f32, direction: f32, prev_vx: f32, scale: f32, jump_multiplier: f32) -> Vec2 {
    let vx = MOMENTUM_RETENTION * prev_vx + direction * HORIZONTAL_JUMP_RATIO * power * scale;
    Vec2::new(vx, -power * jump_multiplier)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerController {
    pub body: BodyHandle,
    pub state: PlayerState,
    pub grounded: bool,
    /// Set only while the goal sensor is touched
    pub on_goal: bool,
    pub charging: bool,
    /// Current jump power in [0, MAX_JUMP_POWER]
    pub power: f32,
    /// Horizontal input direction (-1, 0, 1)
    pub direction: f32,
    /// Friction the player body should currently have
    pub friction: f32,
    charge_time: f32,
    landed_timer: f32,
    /// Left the ground this tick; contacts still touching do not re-ground
    launched: bool,
}

impl PlayerController {
    pub fn new(body: BodyHandle) -> Self {
        Self {
            body,
            state: PlayerState::Idle,
            grounded: false,
            on_goal: false,
            charging: false,
            power: 0.0,
            direction: 0.0,
            friction: PLAYER_FRICTION,
            charge_time: 0.0,
            landed_timer: 0.0,
            launched: false,
        }
    }

    /// Normalised power for the gauge
    pub fn power_ratio(&self) -> f32 {
        self.power / MAX_JUMP_POWER
    }

    /// Advance one tick. Returns a velocity to apply when the player jumped.
    pub fn update(
        &mut self,
        input: &TickInput,
        velocity: Vec2,
        ctx: &PlayerContext,
        events: &mut Vec<GameEvent>,
    ) -> Option<Vec2> {
        self.direction = input.direction(ctx.keyboard_available);

        if input.charge_start && self.grounded && !self.charging {
            self.charging = true;
            self.charge_time = 0.0;
            self.power = 0.0;
            self.state = PlayerState::Charging;
            log::debug!("Player charging");
        }

        let mut command = None;
        if input.charge_release && self.charging {
            command = Some(self.jump(velocity, ctx, events));
        } else if self.charging {
            if self.grounded {
                self.charge_time += ctx.dt;
                self.power = charge_power(self.charge_time);
                events.push(GameEvent::PowerChanged(self.power_ratio()));
            } else {
                // Lost the ground mid-charge
                self.cancel_charge();
            }
        }

        if self.grounded {
            if self.state == PlayerState::Landed {
                self.landed_timer -= ctx.dt;
                if self.landed_timer <= 0.0 {
                    self.state = PlayerState::Idle;
                }
            }
        } else if command.is_none() {
            self.classify_airborne(velocity.y);
        }

        command
    }

    /// Jumping/Falling from vertical speed; inside the band the state is kept
    fn classify_airborne(&mut self, vy: f32) {
        if vy < -AIRBORNE_HYSTERESIS {
            self.state = PlayerState::Jumping;
        } else if vy > AIRBORNE_HYSTERESIS {
            self.state = PlayerState::Falling;
        }
    }

    fn jump(&mut self, velocity: Vec2, ctx: &PlayerContext, events: &mut Vec<GameEvent>) -> Vec2 {
        let launch = jump_velocity(
            self.power,
            self.direction,
            velocity.x,
            ctx.scale,
            ctx.jump_multiplier,
        );
        log::debug!("Jump power {:.1} -> ({:.2}, {:.2})", self.power, launch.x, launch.y);
        self.charging = false;
        self.charge_time = 0.0;
        self.power = 0.0;
        self.grounded = false;
        self.launched = true;
        self.state = PlayerState::Jumping;
        events.push(GameEvent::JumpExecuted);
        launch
    }

    fn cancel_charge(&mut self) {
        self.charging = false;
        self.charge_time = 0.0;
        self.power = 0.0;
    }

    /// Grounded flag from the collision resolver.
    ///
    /// An airborne to grounded transition starts the Landed hold.
    pub fn set_grounded(&mut self, grounded: bool, events: &mut Vec<GameEvent>) {
        if grounded && !self.grounded {
            if !self.charging {
                self.state = PlayerState::Landed;
                self.landed_timer = LANDED_DURATION;
                events.push(GameEvent::Landed);
            }
        } else if !grounded && self.grounded && self.charging {
            self.cancel_charge();
        }
        self.grounded = grounded;
    }

    /// Hit by a flier: returns the knockback velocity
    pub fn knockback(&mut self, direction: f32, force: f32, events: &mut Vec<GameEvent>) -> Vec2 {
        self.cancel_charge();
        self.grounded = false;
        self.launched = true;
        self.state = PlayerState::Falling;
        events.push(GameEvent::KnockedBack);
        Vec2::new(direction * force, -0.5 * force)
    }

    /// Whether a jump or knockback fired since the last call; clears the flag
    pub fn take_launch(&mut self) -> bool {
        std::mem::take(&mut self.launched)
    }

    pub fn set_ice_friction(&mut self) {
        self.friction = PLAYER_FRICTION_ON_ICE;
    }

    pub fn reset_friction(&mut self) {
        self.friction = PLAYER_FRICTION;
    }

    pub fn on_ice(&self) -> bool {
        self.friction == PLAYER_FRICTION_ON_ICE
    }
}
