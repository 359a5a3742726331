//! Vertical follow camera
//!
//! Horizontal scroll is fixed at zero; the viewport always spans the full
//! scaled map width. Vertical scroll eases toward the player and is clamped
//! to the map.

use serde::{Deserialize, Serialize};

use crate::consts::{CAMERA_LERP_Y, MAP_HEIGHT, REFERENCE_FRAME};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// World y at the top of the view
    pub scroll_y: f32,
    pub view_width: f32,
    pub view_height: f32,
    pub lerp_y: f32,
}

impl Camera {
    pub fn new(view_width: f32, view_height: f32) -> Self {
        Self {
            scroll_y: 0.0,
            view_width,
            view_height,
            lerp_y: CAMERA_LERP_Y,
        }
    }

    /// Scroll that centers `y`, clamped to the map
    pub fn target_for(&self, y: f32) -> f32 {
        let max = (MAP_HEIGHT - self.view_height).max(0.0);
        (y - self.view_height / 2.0).clamp(0.0, max)
    }

    /// Jump straight to `y` (scene start)
    pub fn snap_to(&mut self, y: f32) {
        self.scroll_y = self.target_for(y);
    }

    /// Ease toward `y`
    pub fn follow(&mut self, y: f32, dt: f32) {
        let target = self.target_for(y);
        let alpha = (self.lerp_y * dt / REFERENCE_FRAME).clamp(0.0, 1.0);
        self.scroll_y += (target - self.scroll_y) * alpha;
    }

    /// World y at the bottom edge of the view
    pub fn bottom(&self) -> f32 {
        self.scroll_y + self.view_height
    }

    pub fn resize(&mut self, view_width: f32, view_height: f32) {
        self.view_width = view_width;
        self.view_height = view_height;
        self.scroll_y = self.scroll_y.clamp(0.0, (MAP_HEIGHT - view_height).max(0.0));
    }
}
