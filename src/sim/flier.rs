//! Patrol flier
//!
//! Kinematic obstacle that sweeps left and right around its spawn point and
//! knocks the player back on contact. It ignores gravity and platforms.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::map::FlierDescriptor;
use super::physics::BodyHandle;
use crate::consts::{FLIER_RANGE, FLIER_SPEED};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlierController {
    pub body: BodyHandle,
    /// Spawn x at the reference width
    pub reference_x: f32,
    pub spawn_y: f32,
    /// Patrol half-range at the reference width
    pub reference_range: f32,
    /// Speed in px/frame before scaling
    pub base_speed: f32,
    /// -1 or 1
    pub direction: f32,
}

impl FlierController {
    /// Create a flier with a random initial heading
    pub fn new(body: BodyHandle, desc: &FlierDescriptor, rng: &mut Pcg32) -> Self {
        let direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        Self {
            body,
            reference_x: desc.x,
            spawn_y: desc.y,
            reference_range: desc.range.unwrap_or(FLIER_RANGE),
            base_speed: desc.speed.unwrap_or(FLIER_SPEED),
            direction,
        }
    }

    /// Spawn position at the given scale
    pub fn spawn(&self, scale: f32) -> Vec2 {
        Vec2::new(self.reference_x * scale, self.spawn_y)
    }

    pub fn speed(&self, scale: f32) -> f32 {
        self.base_speed * scale
    }

    /// Direction used for knockback
    pub fn knockback_direction(&self) -> f32 {
        self.direction
    }

    /// Turn around past the patrol edges and return the velocity to apply
    pub fn update(&mut self, x: f32, scale: f32) -> Vec2 {
        let center = self.reference_x * scale;
        let range = self.reference_range * scale;
        if x > center + range {
            self.direction = -1.0;
        } else if x < center - range {
            self.direction = 1.0;
        }
        Vec2::new(self.speed(scale) * self.direction, 0.0)
    }
}
