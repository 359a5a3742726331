//! Platform builder
//!
//! Turns a declarative [`PlatformDescriptor`] into the static collision boxes
//! that make up one logical platform. Only x positions and the main floor or
//! ramp span follow the horizontal scale; lips, slope pads and thickness keep
//! their authored size.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Obb;
use crate::consts::*;

/// Outline of a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlatformShape {
    #[default]
    Flat,
    /// Floor with a lip on the left edge
    L,
    /// Floor with a lip on the right edge
    LMirrored,
    /// Floor with a lip on both edges
    T,
    /// Rises to the right: left pad, ramp, right pad
    SlopeUp,
    /// Falls to the right: left pad, ramp, right pad
    SlopeDown,
}

impl PlatformShape {
    pub fn is_slope(self) -> bool {
        matches!(self, Self::SlopeUp | Self::SlopeDown)
    }
}

/// Surface material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Surface {
    #[default]
    Normal,
    Ice,
}

impl Surface {
    pub fn friction(self) -> f32 {
        match self {
            Surface::Normal => PLATFORM_FRICTION,
            Surface::Ice => PLATFORM_FRICTION_ICE,
        }
    }
}

/// Authored platform, in reference-width coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformDescriptor {
    /// Center x at the reference width
    pub x: f32,
    /// Center y of the floor (never scaled)
    pub y: f32,
    /// Full width at the reference width (default 64)
    pub width: Option<f32>,
    pub shape: PlatformShape,
    pub surface: Surface,
    /// Fixed rotation in degrees, flat platforms only
    pub angle_deg: Option<f32>,
    pub goal: bool,
}

impl PlatformDescriptor {
    pub const fn new(x: f32, y: f32, width: f32, shape: PlatformShape) -> Self {
        Self {
            x,
            y,
            width: Some(width),
            shape,
            surface: Surface::Normal,
            angle_deg: None,
            goal: false,
        }
    }

    pub const fn flat(x: f32, y: f32, width: f32) -> Self {
        Self::new(x, y, width, PlatformShape::Flat)
    }

    pub const fn ice(mut self) -> Self {
        self.surface = Surface::Ice;
        self
    }

    pub const fn goal(mut self) -> Self {
        self.goal = true;
        self
    }

    pub const fn tilted(mut self, angle_deg: f32) -> Self {
        self.angle_deg = Some(angle_deg);
        self
    }

    /// Reference width, falling back to the default
    pub fn reference_width(&self) -> f32 {
        self.width.unwrap_or(PLATFORM_DEFAULT_WIDTH)
    }

    pub fn is_ice(&self) -> bool {
        self.surface == Surface::Ice
    }
}

/// Which piece of a platform a body is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformPart {
    Floor,
    Lip,
    Pad,
    Ramp,
}

/// One static box produced by the builder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySpec {
    pub part: PlatformPart,
    pub shape: Obb,
    pub friction: f32,
    pub is_ice: bool,
    pub is_goal: bool,
}

/// Build the collision boxes for a platform at the given horizontal scale.
///
/// Pure: the same descriptor and scale always give the same boxes in the
/// same order (floor or left pad first).
pub fn build_platform(desc: &PlatformDescriptor, scale: f32) -> Vec<BodySpec> {
    let x = desc.x * scale;
    let y = desc.y;
    let width = desc.reference_width() * scale;
    let friction = desc.surface.friction();

    let piece = |part: PlatformPart, shape: Obb, friction: f32| BodySpec {
        part,
        shape,
        friction,
        is_ice: desc.is_ice(),
        is_goal: desc.goal,
    };
    let floor = || {
        piece(
            PlatformPart::Floor,
            Obb::from_size(Vec2::new(x, y), Vec2::new(width, PLATFORM_THICKNESS)),
            friction,
        )
    };
    let lip = |side: f32| {
        let lip_x = x + side * (width / 2.0 - LIP_WIDTH / 2.0);
        let lip_y = y - (LIP_HEIGHT / 2.0 + PLATFORM_THICKNESS / 2.0);
        piece(
            PlatformPart::Lip,
            Obb::from_size(Vec2::new(lip_x, lip_y), Vec2::new(LIP_WIDTH, LIP_HEIGHT)),
            friction,
        )
    };

    match desc.shape {
        PlatformShape::Flat => {
            let mut body = floor();
            if let Some(angle) = desc.angle_deg {
                body.shape.angle = angle.to_radians();
            }
            vec![body]
        }
        PlatformShape::L => vec![floor(), lip(-1.0)],
        PlatformShape::LMirrored => vec![floor(), lip(1.0)],
        PlatformShape::T => vec![floor(), lip(-1.0), lip(1.0)],
        PlatformShape::SlopeUp | PlatformShape::SlopeDown => {
            let up = desc.shape == PlatformShape::SlopeUp;
            let ramp_width = (width - SLOPE_FLAT_LENGTH * 2.0).max(0.0);
            let angle = if up { -SLOPE_ANGLE_DEG } else { SLOPE_ANGLE_DEG }.to_radians();
            // Lift between the ramp center and either ramp end
            let offset = (ramp_width / 2.0) * SLOPE_ANGLE_DEG.to_radians().sin();
            let (left_dy, right_dy) = if up { (offset, -offset) } else { (-offset, offset) };

            let pad = |px: f32, dy: f32| {
                piece(
                    PlatformPart::Pad,
                    Obb::from_size(
                        Vec2::new(px, y + dy),
                        Vec2::new(SLOPE_FLAT_LENGTH, PLATFORM_THICKNESS),
                    ),
                    friction,
                )
            };
            let half_pad = SLOPE_FLAT_LENGTH / 2.0;
            vec![
                pad(x - width / 2.0 + half_pad, left_dy),
                piece(
                    PlatformPart::Ramp,
                    Obb::new(
                        Vec2::new(x, y),
                        Vec2::new(ramp_width / 2.0, PLATFORM_THICKNESS / 2.0),
                        angle,
                    ),
                    friction * RAMP_FRICTION_FACTOR,
                ),
                pad(x + width / 2.0 - half_pad, right_dy),
            ]
        }
    }
}

/// Smallest reference width a platform of this shape can be built at
pub fn min_width(shape: PlatformShape) -> f32 {
    match shape {
        PlatformShape::Flat => 0.0,
        PlatformShape::L | PlatformShape::LMirrored => LIP_WIDTH,
        PlatformShape::T => LIP_WIDTH * 2.0,
        PlatformShape::SlopeUp | PlatformShape::SlopeDown => SLOPE_FLAT_LENGTH * 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_flat_single_body() {
        let bodies = build_platform(&PlatformDescriptor::flat(300.0, 5350.0, 120.0), 1.0);
        assert_eq!(bodies.len(), 1);
        let b = bodies[0];
        assert_eq!(b.part, PlatformPart::Floor);
        assert_eq!(b.shape.center, Vec2::new(300.0, 5350.0));
        assert_eq!(b.shape.half_extents, Vec2::new(60.0, 8.0));
        assert!(!b.is_ice && !b.is_goal);
    }

    #[test]
    fn test_default_width_and_angle() {
        let desc = PlatformDescriptor {
            width: None,
            ..PlatformDescriptor::flat(100.0, 100.0, 0.0).tilted(10.0)
        };
        let b = build_platform(&desc, 1.0)[0];
        assert_eq!(b.shape.half_extents.x, PLATFORM_DEFAULT_WIDTH / 2.0);
        assert!(close(b.shape.angle, 10f32.to_radians()));
    }

    #[test]
    fn test_l_shapes_put_lip_on_one_edge() {
        let l = build_platform(&PlatformDescriptor::new(400.0, 1000.0, 120.0, PlatformShape::L), 1.0);
        let r = build_platform(
            &PlatformDescriptor::new(400.0, 1000.0, 120.0, PlatformShape::LMirrored),
            1.0,
        );
        assert_eq!(l.len(), 2);
        assert_eq!(l[1].part, PlatformPart::Lip);
        assert_eq!(l[1].shape.center, Vec2::new(348.0, 982.0));
        assert_eq!(r[1].shape.center, Vec2::new(452.0, 982.0));
        // Lip rests on the floor
        let lip_bottom = l[1].shape.center.y + LIP_HEIGHT / 2.0;
        let floor_top = l[0].shape.center.y - PLATFORM_THICKNESS / 2.0;
        assert!(close(lip_bottom, floor_top));
    }

    #[test]
    fn test_t_shape_has_two_lips() {
        let t = build_platform(&PlatformDescriptor::new(880.0, 4200.0, 110.0, PlatformShape::T), 1.0);
        assert_eq!(t.len(), 3);
        assert!(close(t[1].shape.center.x, 880.0 - 47.0));
        assert!(close(t[2].shape.center.x, 880.0 + 47.0));
    }

    #[test]
    fn test_slope_pads_meet_ramp_ends() {
        for shape in [PlatformShape::SlopeUp, PlatformShape::SlopeDown] {
            let bodies = build_platform(&PlatformDescriptor::new(100.0, 5050.0, 160.0, shape), 1.0);
            assert_eq!(bodies.len(), 3);
            let (left, ramp, right) = (bodies[0], bodies[1], bodies[2]);
            assert_eq!(ramp.part, PlatformPart::Ramp);

            // Ramp end centers line up with the pad centers vertically
            let [axis, _] = ramp.shape.axes();
            let left_end = ramp.shape.center - axis * ramp.shape.half_extents.x;
            let right_end = ramp.shape.center + axis * ramp.shape.half_extents.x;
            assert!(close(left_end.y, left.shape.center.y), "{:?}", shape);
            assert!(close(right_end.y, right.shape.center.y), "{:?}", shape);
        }
    }

    #[test]
    fn test_slope_up_rises_to_the_right() {
        let bodies = build_platform(
            &PlatformDescriptor::new(620.0, 4300.0, 150.0, PlatformShape::SlopeUp),
            1.0,
        );
        assert!(bodies[2].shape.center.y < bodies[0].shape.center.y);
        assert!(close(bodies[1].friction, PLATFORM_FRICTION * RAMP_FRICTION_FACTOR));
    }

    #[test]
    fn test_flags_propagate_to_every_body() {
        let desc = PlatformDescriptor::new(600.0, 3700.0, 140.0, PlatformShape::T).ice().goal();
        for b in build_platform(&desc, 1.5) {
            assert!(b.is_ice && b.is_goal);
            assert_eq!(b.friction, PLATFORM_FRICTION_ICE);
        }
    }

    proptest! {
        #[test]
        fn test_builder_is_pure_and_scales_x(
            x in 0.0f32..960.0,
            y in 0.0f32..5500.0,
            width in 60.0f32..300.0,
            scale in 0.3f32..3.0,
            shape_idx in 0usize..6,
        ) {
            let shape = [
                PlatformShape::Flat,
                PlatformShape::L,
                PlatformShape::LMirrored,
                PlatformShape::T,
                PlatformShape::SlopeUp,
                PlatformShape::SlopeDown,
            ][shape_idx];
            prop_assume!(width * scale >= min_width(shape) + 10.0);
            let desc = PlatformDescriptor::new(x, y, width, shape);
            let a = build_platform(&desc, scale);
            let b = build_platform(&desc, scale);
            prop_assert_eq!(&a, &b);

            // Main body sits at the scaled center, y untouched
            let main = if shape.is_slope() { a[1] } else { a[0] };
            prop_assert!((main.shape.center.x - x * scale).abs() < 1e-2);
            prop_assert_eq!(main.shape.center.y, y);

            // Every piece stays inside the scaled footprint
            for body in &a {
                let (min, max) = body.shape.aabb();
                prop_assert!(min.x >= x * scale - width * scale / 2.0 - 1e-2);
                prop_assert!(max.x <= x * scale + width * scale / 2.0 + 1e-2);
            }
        }
    }
}
