//! Collision detection and response for oriented boxes
//!
//! Separating-axis test between two boxes, then the velocity response used by
//! the physics world for solid contacts.

use glam::Vec2;

use super::geometry::Obb;

/// Result of an overlap test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal pointing from the first box toward the second
    pub normal: Vec2,
    /// Penetration depth along the normal
    pub depth: f32,
}

/// Separating-axis test between two oriented boxes.
///
/// Returns `None` when the boxes are separated (touching edges count as
/// separated). Otherwise the contact normal is the axis of least penetration,
/// oriented from `a` toward `b`.
pub fn obb_overlap(a: &Obb, b: &Obb) -> Option<Contact> {
    let [a0, a1] = a.axes();
    let [b0, b1] = b.axes();

    let mut best: Option<Contact> = None;
    for axis in [a0, a1, b0, b1] {
        let (a_min, a_max) = a.project(axis);
        let (b_min, b_max) = b.project(axis);
        let overlap = a_max.min(b_max) - a_min.max(b_min);
        if overlap <= 0.0 {
            return None;
        }
        if best.is_none_or(|c| overlap < c.depth) {
            best = Some(Contact {
                normal: axis,
                depth: overlap,
            });
        }
    }

    best.map(|mut contact| {
        if (b.center - a.center).dot(contact.normal) < 0.0 {
            contact.normal = -contact.normal;
        }
        contact
    })
}

/// Velocity after hitting an immovable surface.
///
/// `normal` points from the moving body into the surface. The approaching
/// normal component is bounced with `restitution` (or removed entirely below
/// `resting_speed`), and the tangential component is damped by `friction_damping`
/// in [0, 1].
pub fn surface_response(
    velocity: Vec2,
    normal: Vec2,
    restitution: f32,
    friction_damping: f32,
    resting_speed: f32,
) -> Vec2 {
    let vn = velocity.dot(normal);
    if vn <= 0.0 {
        // Already separating
        return velocity;
    }
    let tangential = velocity - vn * normal;
    let bounce = if vn > resting_speed { -restitution * vn } else { 0.0 };
    tangential * (1.0 - friction_damping.clamp(0.0, 1.0)) + bounce * normal
}
