//! Collision resolver
//!
//! Interprets the physics world's contact events against semantic body labels
//! and drives player and obstacle state. Grounding and ice friction derive
//! from the set of platform bodies the player currently touches, so standing
//! across two platforms never flickers.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::chaser::ChaserController;
use super::flier::FlierController;
use super::physics::{BodyHandle, ContactEvent, ContactPhase, World};
use super::player::PlayerController;
use super::state::GameEvent;
use crate::consts::{FLIER_KNOCKBACK, WALL_BOUNCE};

/// What a physics body represents in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyLabel {
    Player,
    /// A piece of an authored platform
    Platform {
        platform: usize,
        is_ice: bool,
        is_goal: bool,
    },
    Wall,
    GoalSensor,
    Flier(usize),
    Chaser(usize),
}

impl BodyLabel {
    pub fn is_platform(&self) -> bool {
        matches!(self, BodyLabel::Platform { .. })
    }
}

/// Everything the resolver may mutate while handling one step's contacts
pub struct Actors<'a> {
    pub world: &'a mut World,
    pub labels: &'a BTreeMap<BodyHandle, BodyLabel>,
    pub player: &'a mut PlayerController,
    pub fliers: &'a [FlierController],
    pub chasers: &'a mut [ChaserController],
    pub events: &'a mut Vec<GameEvent>,
}

/// Result of resolving one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolution {
    /// The player touched a live chaser
    pub caught: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollisionResolver {
    /// Platform bodies the player is touching
    touching: BTreeSet<BodyHandle>,
    /// Ice platform currently lowering the player's friction
    active_ice: Option<BodyHandle>,
}

impl CollisionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touching(&self) -> &BTreeSet<BodyHandle> {
        &self.touching
    }

    pub fn active_ice(&self) -> Option<BodyHandle> {
        self.active_ice
    }

    /// Forget all contacts (scene rebuild)
    pub fn reset(&mut self) {
        self.touching.clear();
        self.active_ice = None;
    }

    /// Handle one step's events, which arrive grouped Begin, Persist, End
    pub fn resolve(&mut self, contacts: &[ContactEvent], actors: &mut Actors<'_>) -> Resolution {
        let mut resolution = Resolution::default();
        let player = actors.player.body;

        for contact in contacts {
            let Some((a, b)) = labels_of(contact, actors.labels) else {
                continue;
            };
            if contact.a == player || contact.b == player {
                let (other, other_label) = if contact.a == player {
                    (contact.b, b)
                } else {
                    (contact.a, a)
                };
                self.player_contact(contact, other, other_label, actors, &mut resolution);
            }
            for (label, other_label) in [(a, b), (b, a)] {
                if let BodyLabel::Chaser(index) = label {
                    if contact.phase == ContactPhase::Begin {
                        chaser_contact(index, other_label, actors);
                    }
                }
            }
        }

        self.derive_surface(actors);
        resolution
    }

    fn player_contact(
        &mut self,
        contact: &ContactEvent,
        other: BodyHandle,
        label: BodyLabel,
        actors: &mut Actors<'_>,
        resolution: &mut Resolution,
    ) {
        let player = actors.player.body;
        match (contact.phase, label) {
            (ContactPhase::Begin | ContactPhase::Persist, BodyLabel::GoalSensor) => {
                actors.player.on_goal = true;
            }
            (ContactPhase::End, BodyLabel::GoalSensor) => {
                actors.player.on_goal = false;
            }
            (ContactPhase::Begin, BodyLabel::Flier(index)) => {
                if let Some(flier) = actors.fliers.get(index) {
                    let v = actors.player.knockback(
                        flier.knockback_direction(),
                        FLIER_KNOCKBACK,
                        actors.events,
                    );
                    actors.world.set_velocity(player, v);
                }
            }
            (ContactPhase::Begin, BodyLabel::Chaser(index)) => {
                if actors.chasers.get(index).is_some_and(ChaserController::is_alive) {
                    resolution.caught = true;
                }
            }
            (ContactPhase::Begin, BodyLabel::Wall) => {
                // Bounce off the approach speed; the solver has already
                // stopped the body
                let approach = contact.relative_velocity_of(player);
                let vy = actors.world.velocity(player).map_or(0.0, |v| v.y);
                actors
                    .world
                    .set_velocity(player, Vec2::new(-WALL_BOUNCE * approach.x, vy));
            }
            (ContactPhase::Begin, BodyLabel::Platform { is_ice, .. }) => {
                self.touching.insert(other);
                if is_ice {
                    self.active_ice = Some(other);
                    actors.player.set_ice_friction();
                }
            }
            (ContactPhase::Persist, BodyLabel::Platform { .. }) => {
                self.touching.insert(other);
            }
            (ContactPhase::End, BodyLabel::Platform { .. }) => {
                self.touching.remove(&other);
                if self.active_ice == Some(other) {
                    self.active_ice = None;
                    actors.player.reset_friction();
                }
            }
            _ => {}
        }
    }

    /// Grounded and ice state from the touching set
    fn derive_surface(&mut self, actors: &mut Actors<'_>) {
        let labels = actors.labels;
        let is_ice = |h: &BodyHandle| {
            matches!(labels.get(h), Some(BodyLabel::Platform { is_ice: true, .. }))
        };
        self.active_ice = match self.active_ice {
            Some(current) if self.touching.contains(&current) => Some(current),
            _ => self.touching.iter().copied().find(is_ice),
        };
        if self.active_ice.is_some() {
            actors.player.set_ice_friction();
        } else {
            actors.player.reset_friction();
        }
        actors
            .world
            .set_friction(actors.player.body, actors.player.friction);

        // A launch leaves the ground even if the floor is still in contact
        let launched = actors.player.take_launch();
        let grounded = !self.touching.is_empty() && !launched;
        actors.player.set_grounded(grounded, actors.events);
    }
}

fn labels_of(
    contact: &ContactEvent,
    labels: &BTreeMap<BodyHandle, BodyLabel>,
) -> Option<(BodyLabel, BodyLabel)> {
    Some((*labels.get(&contact.a)?, *labels.get(&contact.b)?))
}

fn chaser_contact(index: usize, other: BodyLabel, actors: &mut Actors<'_>) {
    let Some(chaser) = actors.chasers.get_mut(index) else {
        return;
    };
    match other {
        BodyLabel::Wall => chaser.on_wall_contact(),
        BodyLabel::Platform { .. } => {
            if chaser.on_platform_contact() {
                log::debug!("Chaser {} landed", index);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{PLAYER_FRICTION, PLAYER_FRICTION_ON_ICE};
    use crate::sim::chaser::ChaserState;
    use crate::sim::geometry::Obb;
    use crate::sim::map::{ChaserDescriptor, FlierDescriptor};
    use crate::sim::physics::{BodyDesc, category, mask};
    use crate::sim::player::PlayerState;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const PLAYER: BodyHandle = BodyHandle(1);
    const FLOOR_A: BodyHandle = BodyHandle(10);
    const FLOOR_B: BodyHandle = BodyHandle(11);
    const ICE_A: BodyHandle = BodyHandle(12);
    const ICE_B: BodyHandle = BodyHandle(13);
    const GOAL_FLOOR: BodyHandle = BodyHandle(14);
    const GOAL_SENSOR: BodyHandle = BodyHandle(15);
    const WALL: BodyHandle = BodyHandle(20);
    const FLIER: BodyHandle = BodyHandle(30);
    const CHASER: BodyHandle = BodyHandle(40);

    struct Fixture {
        world: World,
        labels: BTreeMap<BodyHandle, BodyLabel>,
        player: PlayerController,
        fliers: Vec<FlierController>,
        chasers: Vec<ChaserController>,
        events: Vec<GameEvent>,
        resolver: CollisionResolver,
    }

    impl Fixture {
        fn new() -> Self {
            let mut world = World::default();
            let player = world.insert(BodyDesc::dynamic(
                Obb::from_size(Vec2::ZERO, Vec2::splat(28.0)),
                category::PLAYER,
                mask::PLAYER,
            ));
            assert_eq!(player, PLAYER);

            let platform = |platform, is_ice, is_goal| BodyLabel::Platform {
                platform,
                is_ice,
                is_goal,
            };
            let labels = BTreeMap::from([
                (PLAYER, BodyLabel::Player),
                (FLOOR_A, platform(1, false, false)),
                (FLOOR_B, platform(2, false, false)),
                (ICE_A, platform(3, true, false)),
                (ICE_B, platform(4, true, false)),
                (GOAL_FLOOR, platform(5, false, true)),
                (GOAL_SENSOR, BodyLabel::GoalSensor),
                (WALL, BodyLabel::Wall),
                (FLIER, BodyLabel::Flier(0)),
                (CHASER, BodyLabel::Chaser(0)),
            ]);

            let mut rng = Pcg32::seed_from_u64(1);
            let mut flier = FlierController::new(
                FLIER,
                &FlierDescriptor {
                    x: 0.0,
                    y: 0.0,
                    speed: None,
                    range: None,
                },
                &mut rng,
            );
            flier.direction = -1.0;
            let chaser = ChaserController::new(
                CHASER,
                &ChaserDescriptor {
                    platform_index: 1,
                    x: 0.0,
                    y: 0.0,
                    detect_range: None,
                    speed: None,
                },
                false,
            );

            Self {
                world,
                labels,
                player: PlayerController::new(PLAYER),
                fliers: vec![flier],
                chasers: vec![chaser],
                events: Vec::new(),
                resolver: CollisionResolver::new(),
            }
        }

        fn resolve(&mut self, contacts: &[ContactEvent]) -> Resolution {
            let mut actors = Actors {
                world: &mut self.world,
                labels: &self.labels,
                player: &mut self.player,
                fliers: &self.fliers,
                chasers: &mut self.chasers,
                events: &mut self.events,
            };
            self.resolver.resolve(contacts, &mut actors)
        }
    }

    fn contact(phase: ContactPhase, a: BodyHandle, b: BodyHandle) -> ContactEvent {
        ContactEvent {
            phase,
            a: a.min(b),
            b: a.max(b),
            normal: Vec2::Y,
            relative_velocity: Vec2::ZERO,
        }
    }

    use ContactPhase::{Begin, End, Persist};

    #[test]
    fn test_goal_floor_alone_never_wins() {
        let mut f = Fixture::new();
        f.resolve(&[contact(Begin, PLAYER, GOAL_FLOOR)]);
        f.resolve(&[contact(Persist, PLAYER, GOAL_FLOOR)]);
        assert!(f.player.grounded);
        assert!(!f.player.on_goal);
    }

    #[test]
    fn test_goal_sensor_sets_and_clears_flag() {
        let mut f = Fixture::new();
        f.resolve(&[
            contact(Begin, PLAYER, GOAL_FLOOR),
            contact(Begin, PLAYER, GOAL_SENSOR),
        ]);
        assert!(f.player.on_goal);
        f.resolve(&[contact(End, PLAYER, GOAL_SENSOR)]);
        assert!(!f.player.on_goal);
        // Still standing on the goal floor
        assert!(f.player.grounded);
    }

    #[test]
    fn test_straddling_platforms_stays_grounded() {
        let mut f = Fixture::new();
        f.player.state = PlayerState::Falling;
        f.resolve(&[contact(Begin, PLAYER, FLOOR_A), contact(Begin, PLAYER, FLOOR_B)]);
        assert!(f.player.grounded);
        assert_eq!(f.resolver.touching().len(), 2);

        f.resolve(&[contact(Persist, PLAYER, FLOOR_B), contact(End, PLAYER, FLOOR_A)]);
        assert!(f.player.grounded);

        f.resolve(&[contact(End, PLAYER, FLOOR_B)]);
        assert!(!f.player.grounded);
        assert!(f.resolver.touching().is_empty());
        // Only one landing for the whole stay
        let landings = f.events.iter().filter(|e| **e == GameEvent::Landed).count();
        assert_eq!(landings, 1);
    }

    #[test]
    fn test_ice_active_iff_touching_ice() {
        let mut f = Fixture::new();
        f.resolve(&[contact(Begin, PLAYER, ICE_A), contact(Begin, PLAYER, FLOOR_A)]);
        assert_eq!(f.player.friction, PLAYER_FRICTION_ON_ICE);
        assert_eq!(f.world.body(PLAYER).unwrap().friction, PLAYER_FRICTION_ON_ICE);

        // Leaving the ice restores friction in the same step
        f.resolve(&[contact(Persist, PLAYER, FLOOR_A), contact(End, PLAYER, ICE_A)]);
        assert_eq!(f.player.friction, PLAYER_FRICTION);
        assert_eq!(f.world.body(PLAYER).unwrap().friction, PLAYER_FRICTION);
        assert_eq!(f.resolver.active_ice(), None);
    }

    #[test]
    fn test_ice_moves_to_other_touched_ice() {
        let mut f = Fixture::new();
        f.resolve(&[contact(Begin, PLAYER, ICE_A), contact(Begin, PLAYER, ICE_B)]);
        f.resolve(&[contact(Persist, PLAYER, ICE_B), contact(End, PLAYER, ICE_A)]);
        assert_eq!(f.resolver.active_ice(), Some(ICE_B));
        assert!(f.player.on_ice());
    }

    #[test]
    fn test_wall_reflects_approach_speed() {
        let mut f = Fixture::new();
        f.world.set_velocity(PLAYER, Vec2::new(0.0, 3.0));
        let mut hit = contact(Begin, PLAYER, WALL);
        // Player is `a`, moving right into the wall
        hit.relative_velocity = Vec2::new(6.0, 3.0);
        f.resolve(&[hit]);
        let v = f.world.velocity(PLAYER).unwrap();
        assert!((v.x + 4.8).abs() < 1e-5);
        assert_eq!(v.y, 3.0);
        assert!(!f.player.grounded);
    }

    #[test]
    fn test_flier_knockback() {
        let mut f = Fixture::new();
        f.resolve(&[contact(Begin, PLAYER, FLOOR_A)]);
        f.resolve(&[contact(Begin, PLAYER, FLIER), contact(End, PLAYER, FLOOR_A)]);
        assert_eq!(f.world.velocity(PLAYER), Some(Vec2::new(-15.0, -7.5)));
        assert_eq!(f.player.state, PlayerState::Falling);
        assert!(f.events.contains(&GameEvent::KnockedBack));
    }

    #[test]
    fn test_knockback_lifts_grounded_player() {
        let mut f = Fixture::new();
        f.player.state = PlayerState::Falling;
        f.resolve(&[contact(Begin, PLAYER, FLOOR_A)]);
        assert!(f.player.grounded);

        // The floor still persists on the tick the flier hits
        f.resolve(&[contact(Begin, PLAYER, FLIER), contact(Persist, PLAYER, FLOOR_A)]);
        assert!(!f.player.grounded);
        assert_eq!(f.player.state, PlayerState::Falling);
        assert_eq!(f.world.velocity(PLAYER), Some(Vec2::new(-15.0, -7.5)));

        f.resolve(&[contact(End, PLAYER, FLOOR_A)]);
        assert!(!f.player.grounded);
        let landings = f.events.iter().filter(|e| **e == GameEvent::Landed).count();
        assert_eq!(landings, 1);

        // Coming back down is a real landing
        f.resolve(&[contact(Begin, PLAYER, FLOOR_B)]);
        assert!(f.player.grounded);
        assert_eq!(f.player.state, PlayerState::Landed);
    }

    #[test]
    fn test_live_chaser_is_lethal() {
        let mut f = Fixture::new();
        assert!(f.resolve(&[contact(Begin, PLAYER, CHASER)]).caught);

        f.chasers[0].die();
        assert!(!f.resolve(&[contact(Begin, PLAYER, CHASER)]).caught);
    }

    #[test]
    fn test_chaser_wall_and_landing() {
        let mut f = Fixture::new();
        f.chasers[0].state = ChaserState::Falling;
        f.resolve(&[contact(Begin, FLOOR_A, CHASER)]);
        assert_eq!(f.chasers[0].state, ChaserState::Charging);

        f.resolve(&[contact(Begin, WALL, CHASER)]);
        assert!(f.chasers[0].halted);
        // Chaser contacts never touch the player's ground set
        assert!(f.resolver.touching().is_empty());
    }
}
