//! Oriented box geometry for platforms, walls and actors
//!
//! Every collision shape in the game is a rectangle:
//! - center: world position of the box center
//! - half_extents: half width / half height in the box's local frame
//! - angle: rotation in radians (positive = clockwise on screen, y grows down)

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An oriented bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obb {
    pub center: Vec2,
    pub half_extents: Vec2,
    pub angle: f32,
}

impl Obb {
    pub fn new(center: Vec2, half_extents: Vec2, angle: f32) -> Self {
        Self {
            center,
            half_extents,
            angle,
        }
    }

    /// Axis-aligned box from center and full size
    pub fn from_size(center: Vec2, size: Vec2) -> Self {
        Self::new(center, size * 0.5, 0.0)
    }

    /// Local x and y axes in world space
    #[inline]
    pub fn axes(&self) -> [Vec2; 2] {
        let (sin, cos) = self.angle.sin_cos();
        [Vec2::new(cos, sin), Vec2::new(-sin, cos)]
    }

    /// The four corners, clockwise from local top-left
    pub fn corners(&self) -> [Vec2; 4] {
        let [ax, ay] = self.axes();
        let ex = ax * self.half_extents.x;
        let ey = ay * self.half_extents.y;
        [
            self.center - ex - ey,
            self.center + ex - ey,
            self.center + ex + ey,
            self.center - ex + ey,
        ]
    }

    /// Project onto an axis, returning (min, max)
    #[inline]
    pub fn project(&self, axis: Vec2) -> (f32, f32) {
        let [ax, ay] = self.axes();
        let c = self.center.dot(axis);
        let r = self.half_extents.x * ax.dot(axis).abs() + self.half_extents.y * ay.dot(axis).abs();
        (c - r, c + r)
    }

    /// World-space axis-aligned bounds as (min, max)
    pub fn aabb(&self) -> (Vec2, Vec2) {
        let (min_x, max_x) = self.project(Vec2::X);
        let (min_y, max_y) = self.project(Vec2::Y);
        (Vec2::new(min_x, min_y), Vec2::new(max_x, max_y))
    }

    /// Endpoints of the top surface (smallest local y), left to right in local space
    pub fn top_edge(&self) -> (Vec2, Vec2) {
        let corners = self.corners();
        (corners[0], corners[1])
    }

    /// Check if a world point lies inside the box
    pub fn contains_point(&self, point: Vec2) -> bool {
        let [ax, ay] = self.axes();
        let d = point - self.center;
        d.dot(ax).abs() <= self.half_extents.x && d.dot(ay).abs() <= self.half_extents.y
    }
}

/// Whether two (min, max) bounds overlap
#[inline]
pub fn aabb_overlap(a: (Vec2, Vec2), b: (Vec2, Vec2)) -> bool {
    a.0.x <= b.1.x && b.0.x <= a.1.x && a.0.y <= b.1.y && b.0.y <= a.1.y
}
