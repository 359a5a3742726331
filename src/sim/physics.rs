//! Rigid-body world with contact events
//!
//! The world owns every body's position and velocity and is the only place
//! that integrates them. Controllers read body state and issue velocity or
//! friction commands; the collision resolver consumes the contact events
//! produced by [`World::step`].
//!
//! Determinism:
//! - Bodies live in a `BTreeMap` keyed by handle, so iteration order is stable
//! - Events are emitted grouped by phase, each group sorted by handle pair

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Contact, obb_overlap, surface_response};
use super::geometry::{Obb, aabb_overlap};
use crate::consts::{GRAVITY, REFERENCE_FRAME};

/// Approach speed (px/frame) below which contacts do not bounce
pub const RESTING_SPEED: f32 = 1.0;
/// Converts a friction coefficient into per-frame tangential damping
pub const FRICTION_RESPONSE: f32 = 2.5;

/// Collision filter categories
pub mod category {
    pub const PLAYER: u16 = 0x0001;
    pub const PLATFORM: u16 = 0x0002;
    pub const FLIER: u16 = 0x0004;
    pub const CHASER: u16 = 0x0008;
    pub const WALL: u16 = 0x0010;
}

/// Collision filter masks (which categories each collides with)
pub mod mask {
    use super::category;

    pub const PLAYER: u16 =
        category::PLATFORM | category::FLIER | category::CHASER | category::WALL;
    pub const PLATFORM: u16 = category::PLAYER | category::CHASER;
    pub const FLIER: u16 = category::PLAYER;
    pub const CHASER: u16 = category::PLAYER | category::PLATFORM | category::WALL;
    pub const WALL: u16 = category::PLAYER | category::CHASER;
}

/// Arena index of a body in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// How the world moves a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Never moves on its own
    Static,
    /// Moves by its velocity, ignores gravity, is never pushed
    Kinematic,
    /// Affected by gravity and contacts
    Dynamic,
}

/// Construction parameters for a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub shape: Obb,
    pub velocity: Vec2,
    /// Sensors report contacts but never push
    pub sensor: bool,
    pub friction: f32,
    /// Per-frame velocity damping while airborne
    pub friction_air: f32,
    pub restitution: f32,
    pub gravity_scale: f32,
    pub category: u16,
    pub mask: u16,
}

impl BodyDesc {
    /// A static, solid box
    pub fn fixed(shape: Obb, category: u16, mask: u16) -> Self {
        Self {
            kind: BodyKind::Static,
            shape,
            velocity: Vec2::ZERO,
            sensor: false,
            friction: 0.0,
            friction_air: 0.0,
            restitution: 0.0,
            gravity_scale: 0.0,
            category,
            mask,
        }
    }

    /// A gravity-driven box
    pub fn dynamic(shape: Obb, category: u16, mask: u16) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            gravity_scale: 1.0,
            ..Self::fixed(shape, category, mask)
        }
    }

    /// A velocity-driven box that ignores gravity
    pub fn kinematic(shape: Obb, category: u16, mask: u16) -> Self {
        Self {
            kind: BodyKind::Kinematic,
            ..Self::fixed(shape, category, mask)
        }
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_friction_air(mut self, friction_air: f32) -> Self {
        self.friction_air = friction_air;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn as_sensor(mut self) -> Self {
        self.sensor = true;
        self
    }
}

/// A body in the world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub kind: BodyKind,
    pub shape: Obb,
    pub velocity: Vec2,
    pub sensor: bool,
    pub friction: f32,
    pub friction_air: f32,
    pub restitution: f32,
    pub gravity_scale: f32,
    pub category: u16,
    pub mask: u16,
}

impl Body {
    fn from_desc(desc: BodyDesc) -> Self {
        Self {
            kind: desc.kind,
            shape: desc.shape,
            velocity: desc.velocity,
            sensor: desc.sensor,
            friction: desc.friction,
            friction_air: desc.friction_air,
            restitution: desc.restitution,
            gravity_scale: desc.gravity_scale,
            category: desc.category,
            mask: desc.mask,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.shape.center
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    /// Both filters must accept each other
    fn collides_with(&self, other: &Body) -> bool {
        (self.mask & other.category) != 0 && (other.mask & self.category) != 0
    }
}

/// Contact lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContactPhase {
    Begin,
    Persist,
    End,
}

/// A contact event between two bodies (`a < b` by handle)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub phase: ContactPhase,
    pub a: BodyHandle,
    pub b: BodyHandle,
    /// Unit normal from `a` toward `b` (last known for End events)
    pub normal: Vec2,
    /// Velocity of `a` relative to `b` before the contact was solved
    pub relative_velocity: Vec2,
}

impl ContactEvent {
    /// The other body of the pair, if `handle` is part of it
    pub fn other(&self, handle: BodyHandle) -> Option<BodyHandle> {
        if self.a == handle {
            Some(self.b)
        } else if self.b == handle {
            Some(self.a)
        } else {
            None
        }
    }

    /// Relative velocity seen from `handle` (its velocity minus the other's)
    pub fn relative_velocity_of(&self, handle: BodyHandle) -> Vec2 {
        if self.a == handle {
            self.relative_velocity
        } else {
            -self.relative_velocity
        }
    }
}

type PairKey = (BodyHandle, BodyHandle);

/// The physics world
#[derive(Debug, Clone)]
pub struct World {
    pub gravity: Vec2,
    bodies: BTreeMap<BodyHandle, Body>,
    next_handle: u32,
    /// Contacts alive after the last step, with their last normal
    contacts: BTreeMap<PairKey, Vec2>,
    /// End events produced by body removal, delivered with the next step
    pending_end: Vec<ContactEvent>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, GRAVITY))
    }
}

impl World {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            bodies: BTreeMap::new(),
            next_handle: 1,
            contacts: BTreeMap::new(),
            pending_end: Vec::new(),
        }
    }

    /// Insert a body and return its handle
    pub fn insert(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(handle, Body::from_desc(desc));
        handle
    }

    /// Remove a body. Its live contacts end with the next step.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<Body> {
        let body = self.bodies.remove(&handle)?;
        let ended: Vec<PairKey> = self
            .contacts
            .keys()
            .filter(|(a, b)| *a == handle || *b == handle)
            .copied()
            .collect();
        for key in ended {
            if let Some(normal) = self.contacts.remove(&key) {
                self.pending_end.push(ContactEvent {
                    phase: ContactPhase::End,
                    a: key.0,
                    b: key.1,
                    normal,
                    relative_velocity: Vec2::ZERO,
                });
            }
        }
        Some(body)
    }

    /// Remove every body and forget all contacts
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
        self.pending_end.clear();
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(&handle)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(&handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(&handle)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.bodies.keys().copied()
    }

    pub fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.body(handle).map(Body::position)
    }

    pub fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.body(handle).map(|b| b.velocity)
    }

    pub fn set_position(&mut self, handle: BodyHandle, position: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.shape.center = position;
        }
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.velocity = velocity;
        }
    }

    pub fn set_friction(&mut self, handle: BodyHandle, friction: f32) {
        if let Some(body) = self.body_mut(handle) {
            body.friction = friction;
        }
    }

    pub fn set_shape(&mut self, handle: BodyHandle, shape: Obb) {
        if let Some(body) = self.body_mut(handle) {
            body.shape = shape;
        }
    }

    /// Whether two bodies were touching after the last step
    pub fn in_contact(&self, a: BodyHandle, b: BodyHandle) -> bool {
        self.contacts.contains_key(&(a.min(b), a.max(b)))
    }

    /// Advance the world by `dt` seconds and return this step's contact events
    pub fn step(&mut self, dt: f32) -> Vec<ContactEvent> {
        let frames = dt / REFERENCE_FRAME;

        self.integrate(frames);

        let detected = self.detect();

        let mut begin = Vec::new();
        let mut persist = Vec::new();
        for (&(a, b), contact) in &detected {
            let relative_velocity = self.bodies[&a].velocity - self.bodies[&b].velocity;
            let event = ContactEvent {
                phase: ContactPhase::Persist,
                a,
                b,
                normal: contact.normal,
                relative_velocity,
            };
            if self.contacts.contains_key(&(a, b)) {
                persist.push(event);
            } else {
                begin.push(ContactEvent {
                    phase: ContactPhase::Begin,
                    ..event
                });
            }
        }

        let mut end = std::mem::take(&mut self.pending_end);
        for (&(a, b), &normal) in &self.contacts {
            if !detected.contains_key(&(a, b)) {
                end.push(ContactEvent {
                    phase: ContactPhase::End,
                    a,
                    b,
                    normal,
                    relative_velocity: Vec2::ZERO,
                });
            }
        }
        end.sort_by_key(|e| (e.a, e.b));

        self.solve(&detected, frames);

        self.contacts = detected.iter().map(|(&k, c)| (k, c.normal)).collect();

        let mut events = begin;
        events.extend(persist);
        events.extend(end);
        events
    }

    fn integrate(&mut self, frames: f32) {
        for body in self.bodies.values_mut() {
            match body.kind {
                BodyKind::Static => {}
                BodyKind::Kinematic => {
                    body.shape.center += body.velocity * frames;
                }
                BodyKind::Dynamic => {
                    body.velocity += self.gravity * body.gravity_scale * frames;
                    if body.friction_air > 0.0 {
                        body.velocity *= (1.0 - body.friction_air).powf(frames);
                    }
                    body.shape.center += body.velocity * frames;
                }
            }
        }
    }

    fn detect(&self) -> BTreeMap<PairKey, Contact> {
        let entries: Vec<(BodyHandle, &Body, (Vec2, Vec2))> = self
            .bodies
            .iter()
            .map(|(&h, b)| (h, b, b.shape.aabb()))
            .collect();

        let mut detected = BTreeMap::new();
        for (i, (ha, a, a_box)) in entries.iter().enumerate() {
            for (hb, b, b_box) in &entries[i + 1..] {
                if a.kind == BodyKind::Static && b.kind == BodyKind::Static {
                    continue;
                }
                if !a.collides_with(b) || !aabb_overlap(*a_box, *b_box) {
                    continue;
                }
                if let Some(contact) = obb_overlap(&a.shape, &b.shape) {
                    detected.insert((*ha, *hb), contact);
                }
            }
        }
        detected
    }

    fn solve(&mut self, detected: &BTreeMap<PairKey, Contact>, frames: f32) {
        for (&(ha, hb), contact) in detected {
            let (Some(a), Some(b)) = (self.bodies.get(&ha), self.bodies.get(&hb)) else {
                continue;
            };
            if a.sensor || b.sensor {
                continue;
            }
            let restitution = a.restitution.max(b.restitution);
            let damping = (a.friction.min(b.friction) * FRICTION_RESPONSE * frames).min(1.0);
            let (a_dyn, b_dyn) = (a.is_dynamic(), b.is_dynamic());
            let (va, vb) = (a.velocity, b.velocity);
            let n = contact.normal;

            match (a_dyn, b_dyn) {
                (true, false) => {
                    let v = surface_response(va - vb, n, restitution, damping, RESTING_SPEED) + vb;
                    if let Some(a) = self.bodies.get_mut(&ha) {
                        a.shape.center -= n * contact.depth;
                        a.velocity = v;
                    }
                }
                (false, true) => {
                    let v = surface_response(vb - va, -n, restitution, damping, RESTING_SPEED) + va;
                    if let Some(b) = self.bodies.get_mut(&hb) {
                        b.shape.center += n * contact.depth;
                        b.velocity = v;
                    }
                }
                (true, true) => {
                    // Equal masses: split the correction, exchange the normal impulse
                    let rel = va - vb;
                    let vn = rel.dot(n);
                    let impulse = if vn > 0.0 {
                        let e = if vn > RESTING_SPEED { restitution } else { 0.0 };
                        n * (vn * (1.0 + e) * 0.5)
                    } else {
                        Vec2::ZERO
                    };
                    let half = n * (contact.depth * 0.5);
                    if let Some(a) = self.bodies.get_mut(&ha) {
                        a.shape.center -= half;
                        a.velocity -= impulse;
                    }
                    if let Some(b) = self.bodies.get_mut(&hb) {
                        b.shape.center += half;
                        b.velocity += impulse;
                    }
                }
                (false, false) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn floor(world: &mut World) -> BodyHandle {
        world.insert(
            BodyDesc::fixed(
                Obb::from_size(Vec2::new(0.0, 100.0), Vec2::new(400.0, 16.0)),
                category::PLATFORM,
                mask::PLATFORM,
            )
            .with_friction(0.1),
        )
    }

    fn player_at(world: &mut World, pos: Vec2) -> BodyHandle {
        world.insert(
            BodyDesc::dynamic(
                Obb::from_size(pos, Vec2::splat(28.0)),
                category::PLAYER,
                mask::PLAYER,
            )
            .with_friction(0.1),
        )
    }

    #[test]
    fn test_masks_are_category_bits() {
        assert_eq!(mask::PLAYER, 0x0002 | 0x0004 | 0x0008 | 0x0010);
        assert_eq!(mask::PLATFORM, category::PLAYER | category::CHASER);
        assert_eq!(mask::FLIER, category::PLAYER);
        assert_eq!(mask::CHASER, 0x0001 | 0x0002 | 0x0010);
        assert_eq!(mask::WALL, category::PLAYER | category::CHASER);
        // Every pair the filters admit is admitted from both sides
        let pairs = [
            (category::PLAYER, mask::PLAYER),
            (category::PLATFORM, mask::PLATFORM),
            (category::FLIER, mask::FLIER),
            (category::CHASER, mask::CHASER),
            (category::WALL, mask::WALL),
        ];
        for (cat_a, mask_a) in pairs {
            for (cat_b, mask_b) in pairs {
                assert_eq!(mask_a & cat_b != 0, mask_b & cat_a != 0);
            }
        }
    }

    #[test]
    fn test_gravity_integrates_dynamic_only() {
        let mut world = World::default();
        let f = floor(&mut world);
        let p = player_at(&mut world, Vec2::new(0.0, -500.0));
        world.step(SIM_DT);
        assert!((world.velocity(p).unwrap().y - GRAVITY).abs() < 1e-5);
        assert_eq!(world.position(f).unwrap(), Vec2::new(0.0, 100.0));
    }

    #[test]
    fn test_falling_body_lands_and_persists() {
        let mut world = World::default();
        let f = floor(&mut world);
        let p = player_at(&mut world, Vec2::new(0.0, 60.0));

        let mut phases = Vec::new();
        for _ in 0..120 {
            for e in world.step(SIM_DT) {
                if e.other(p) == Some(f) {
                    phases.push(e.phase);
                }
            }
        }
        assert_eq!(phases.first(), Some(&ContactPhase::Begin));
        assert!(phases[1..].iter().all(|ph| *ph == ContactPhase::Persist));
        // Resting on top of the floor (floor top at 92, half player 14)
        let y = world.position(p).unwrap().y;
        assert!((y - 78.0).abs() < 0.5, "y = {}", y);
        assert!(world.velocity(p).unwrap().y.abs() < 0.5);
    }

    #[test]
    fn test_leaving_contact_emits_end() {
        let mut world = World::default();
        let f = floor(&mut world);
        let p = player_at(&mut world, Vec2::new(0.0, 78.5));
        let first = world.step(SIM_DT);
        assert!(first.iter().any(|e| e.phase == ContactPhase::Begin && e.other(p) == Some(f)));

        world.set_velocity(p, Vec2::new(0.0, -20.0));
        let events = world.step(SIM_DT);
        assert!(events.iter().any(|e| e.phase == ContactPhase::End && e.other(p) == Some(f)));
        assert!(!world.in_contact(p, f));
    }

    #[test]
    fn test_events_grouped_by_phase() {
        let mut world = World::default();
        let f = floor(&mut world);
        let p1 = player_at(&mut world, Vec2::new(-100.0, 78.5));
        world.step(SIM_DT);
        // p1 now persists; a new body begins; p1 leaves next
        let p2 = player_at(&mut world, Vec2::new(100.0, 78.5));
        world.set_velocity(p1, Vec2::new(0.0, -30.0));
        let events = world.step(SIM_DT);
        let phases: Vec<_> = events.iter().map(|e| e.phase).collect();
        let mut sorted = phases.clone();
        sorted.sort();
        assert_eq!(phases, sorted);
        assert!(events.iter().any(|e| e.phase == ContactPhase::Begin && e.other(p2) == Some(f)));
        assert!(events.iter().any(|e| e.phase == ContactPhase::End && e.other(p1) == Some(f)));
    }

    #[test]
    fn test_sensor_reports_without_pushing() {
        let mut world = World::new(Vec2::ZERO);
        let sensor = world.insert(
            BodyDesc::fixed(
                Obb::from_size(Vec2::ZERO, Vec2::splat(30.0)),
                category::PLATFORM,
                mask::PLATFORM,
            )
            .as_sensor(),
        );
        let p = player_at(&mut world, Vec2::new(5.0, 0.0));
        world.set_velocity(p, Vec2::new(1.0, 0.0));
        let events = world.step(SIM_DT);
        assert!(events.iter().any(|e| e.other(p) == Some(sensor)));
        assert!((world.position(p).unwrap().x - 6.0).abs() < 1e-4);
        assert_eq!(world.velocity(p).unwrap(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_filter_skips_flier_vs_platform() {
        let mut world = World::new(Vec2::ZERO);
        floor(&mut world);
        world.insert(BodyDesc::kinematic(
            Obb::from_size(Vec2::new(0.0, 100.0), Vec2::new(32.0, 24.0)),
            category::FLIER,
            mask::FLIER,
        ));
        assert!(world.step(SIM_DT).is_empty());
    }

    #[test]
    fn test_removal_queues_end_event() {
        let mut world = World::default();
        let f = floor(&mut world);
        let p = player_at(&mut world, Vec2::new(0.0, 78.5));
        world.step(SIM_DT);
        assert!(world.in_contact(p, f));
        world.remove(p);
        let events = world.step(SIM_DT);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].phase, ContactPhase::End);
        assert_eq!(events[0].other(f), Some(p));
    }

    #[test]
    fn test_relative_velocity_is_pre_solve() {
        let mut world = World::new(Vec2::ZERO);
        let wall = world.insert(BodyDesc::fixed(
            Obb::from_size(Vec2::new(50.0, 0.0), Vec2::new(50.0, 400.0)),
            category::WALL,
            mask::WALL,
        ));
        let p = player_at(&mut world, Vec2::new(8.0, 0.0));
        world.set_velocity(p, Vec2::new(6.0, 0.0));
        let events = world.step(SIM_DT);
        let hit = events.iter().find(|e| e.other(p) == Some(wall)).unwrap();
        assert_eq!(hit.phase, ContactPhase::Begin);
        assert!((hit.relative_velocity_of(p).x - 6.0).abs() < 1e-5);
        // Solver stopped the approach
        assert!(world.velocity(p).unwrap().x <= 0.0);
    }

    #[test]
    fn test_dynamic_pair_separates() {
        let mut world = World::new(Vec2::ZERO);
        let a = player_at(&mut world, Vec2::new(0.0, 0.0));
        let b = world.insert(BodyDesc::dynamic(
            Obb::from_size(Vec2::new(20.0, 0.0), Vec2::splat(28.0)),
            category::CHASER,
            mask::CHASER,
        ));
        world.step(SIM_DT);
        let gap = world.position(b).unwrap().x - world.position(a).unwrap().x;
        assert!(gap >= 28.0 - 1e-3);
    }
}
