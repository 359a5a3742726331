//! Scene state and core simulation types
//!
//! The [`Scene`] owns the physics world, the label registry that gives each
//! body its meaning, every controller, the camera and the scale context. It
//! is built from a [`MapLayout`] and rescaled or rebuilt on viewport changes.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::camera::Camera;
use super::chaser::ChaserController;
use super::flier::FlierController;
use super::geometry::Obb;
use super::map::{LayoutVariant, MapLayout, ScaleContext};
use super::physics::{BodyDesc, BodyHandle, World, category, mask};
use super::platform::build_platform;
use super::player::PlayerController;
use super::resolver::{BodyLabel, CollisionResolver};
use crate::consts::*;
use crate::{BuildError, Settings, format_clock, height_meters};

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Playing,
    /// Reached the goal door
    Won,
    /// Caught by a chaser
    Lost,
}

/// What the result screen receives when a session ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub success: bool,
    pub clear_time_secs: u32,
    pub max_height: u32,
}

/// Outbound notifications, drained once per tick by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Charge gauge, normalised to 0..1
    PowerChanged(f32),
    JumpExecuted,
    Landed,
    KnockedBack,
    ChaserAlerted(usize),
    ChaserDied(usize),
    ChaserRespawned(usize),
    GoalReached(SessionResult),
    PlayerCaught(SessionResult),
    LayoutRebuilt(LayoutVariant),
}

/// Values the HUD displays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub elapsed_secs: u32,
    /// `MM:SS`
    pub clock: String,
    pub height_m: u32,
    pub max_height_m: u32,
    /// Charge gauge, 0..1
    pub power: f32,
    pub charging: bool,
}

/// A running session
#[derive(Debug, Clone)]
pub struct Scene {
    pub settings: Settings,
    pub scale: ScaleContext,
    pub layout: MapLayout,
    pub world: World,
    /// Semantic label of every live body
    pub labels: BTreeMap<BodyHandle, BodyLabel>,
    pub player: PlayerController,
    pub fliers: Vec<FlierController>,
    pub chasers: Vec<ChaserController>,
    pub resolver: CollisionResolver,
    pub camera: Camera,
    pub phase: SessionPhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Simulated seconds, frozen once the session ends
    pub elapsed: f64,
    pub max_height: u32,
    /// Platform bodies in build order
    platform_bodies: Vec<BodyHandle>,
    right_wall: BodyHandle,
    goal_sensor: BodyHandle,
    goal_reference_x: f32,
    result: Option<SessionResult>,
    pub(crate) events: Vec<GameEvent>,
}

impl Scene {
    /// Build the layout variant that matches the viewport
    pub fn new(width: f32, height: f32, settings: Settings) -> Result<Self, BuildError> {
        let scale = ScaleContext::from_viewport(width, height)?;
        Self::with_layout(MapLayout::for_variant(scale.variant()), width, height, settings)
    }

    /// Build a specific layout
    pub fn with_layout(
        layout: MapLayout,
        width: f32,
        height: f32,
        settings: Settings,
    ) -> Result<Self, BuildError> {
        let scale = ScaleContext::from_viewport(width, height)?;
        layout.validate(settings.start_platform_index)?;

        // Placeholder handles are replaced by populate()
        let mut scene = Self {
            settings,
            scale,
            layout,
            world: World::default(),
            labels: BTreeMap::new(),
            player: PlayerController::new(BodyHandle(0)),
            fliers: Vec::new(),
            chasers: Vec::new(),
            resolver: CollisionResolver::new(),
            camera: Camera::new(width, height),
            phase: SessionPhase::Playing,
            time_ticks: 0,
            elapsed: 0.0,
            max_height: 0,
            platform_bodies: Vec::new(),
            right_wall: BodyHandle(0),
            goal_sensor: BodyHandle(0),
            goal_reference_x: 0.0,
            result: None,
            events: Vec::new(),
        };
        scene.populate();
        Ok(scene)
    }

    /// Create every body and controller from the current layout and scale
    fn populate(&mut self) {
        let s = self.scale.scale;
        let width = self.scale.viewport_width;

        self.world = World::default();
        self.labels.clear();
        self.platform_bodies.clear();
        self.fliers.clear();
        self.chasers.clear();
        self.resolver.reset();
        self.result = None;
        self.phase = SessionPhase::Playing;
        self.time_ticks = 0;
        self.elapsed = 0.0;

        // Walls
        let wall = |x: f32| {
            BodyDesc::fixed(
                Obb::from_size(
                    Vec2::new(x, MAP_HEIGHT / 2.0),
                    Vec2::new(WALL_THICKNESS, MAP_HEIGHT),
                ),
                category::WALL,
                mask::WALL,
            )
        };
        let left = self.world.insert(wall(-WALL_THICKNESS / 2.0));
        self.right_wall = self.world.insert(wall(width + WALL_THICKNESS / 2.0));
        self.labels.insert(left, BodyLabel::Wall);
        self.labels.insert(self.right_wall, BodyLabel::Wall);

        // Platforms
        for (index, desc) in self.layout.platforms.iter().enumerate() {
            for spec in build_platform(desc, s) {
                let handle = self.world.insert(
                    BodyDesc::fixed(spec.shape, category::PLATFORM, mask::PLATFORM)
                        .with_friction(spec.friction),
                );
                self.labels.insert(
                    handle,
                    BodyLabel::Platform {
                        platform: index,
                        is_ice: spec.is_ice,
                        is_goal: spec.is_goal,
                    },
                );
                self.platform_bodies.push(handle);
            }
        }

        // Goal door sensor just above the goal platform
        let goal = self
            .layout
            .goal_index()
            .and_then(|i| self.layout.platforms.get(i))
            .copied();
        if let Some(goal) = goal {
            self.goal_reference_x = goal.x;
            let center = Vec2::new(
                goal.x * s,
                goal.y - GOAL_SENSOR_HEIGHT / 2.0 - GOAL_SENSOR_GAP,
            );
            self.goal_sensor = self.world.insert(
                BodyDesc::fixed(
                    Obb::from_size(center, Vec2::new(GOAL_SENSOR_WIDTH, GOAL_SENSOR_HEIGHT)),
                    category::PLATFORM,
                    mask::PLATFORM,
                )
                .as_sensor(),
            );
            self.labels.insert(self.goal_sensor, BodyLabel::GoalSensor);
        }

        // Player
        let start_index = self.layout.start_index(self.settings.start_platform_index);
        let start = self.layout.platforms.get(start_index).map_or(
            Vec2::new(width / 2.0, MAP_HEIGHT - PLAYER_SPAWN_OFFSET),
            |p| Vec2::new(p.x * s, p.y - PLAYER_SPAWN_OFFSET),
        );
        let player = self.world.insert(
            BodyDesc::dynamic(
                Obb::from_size(start, Vec2::splat(PLAYER_SIZE)),
                category::PLAYER,
                mask::PLAYER,
            )
            .with_friction(PLAYER_FRICTION)
            .with_restitution(PLAYER_BOUNCE),
        );
        self.labels.insert(player, BodyLabel::Player);
        self.player = PlayerController::new(player);

        // Obstacles
        let mut rng = Pcg32::seed_from_u64(self.settings.seed);
        let fliers: Vec<_> = self.layout.fliers().copied().collect();
        for (index, desc) in fliers.iter().enumerate() {
            let handle = self.world.insert(BodyDesc::kinematic(
                Obb::from_size(
                    Vec2::new(desc.x * s, desc.y),
                    Vec2::new(FLIER_WIDTH, FLIER_HEIGHT),
                ),
                category::FLIER,
                mask::FLIER,
            ));
            self.labels.insert(handle, BodyLabel::Flier(index));
            self.fliers.push(FlierController::new(handle, desc, &mut rng));
        }
        let chasers: Vec<_> = self.layout.chasers().copied().collect();
        for (index, desc) in chasers.iter().enumerate() {
            let handle = self.world.insert(chaser_body(Vec2::new(desc.x * s, desc.y)));
            self.labels.insert(handle, BodyLabel::Chaser(index));
            self.chasers.push(ChaserController::new(handle, desc, self.settings.respawn_chasers));
        }

        self.camera = Camera::new(width, self.scale.viewport_height);
        self.camera.snap_to(start.y);
        self.max_height = height_meters(start.y);

        log::info!(
            "Scene built: {:?} layout, {} platforms ({} bodies), {} fliers, {} chasers, scale {:.3}",
            self.layout.variant,
            self.layout.platforms.len(),
            self.platform_bodies.len(),
            self.fliers.len(),
            self.chasers.len(),
            s
        );
    }

    /// Handle a viewport change.
    ///
    /// Crossing the mobile breakpoint rebuilds the scene with the other
    /// layout. Otherwise every x is recomputed from the new scale and all
    /// discrete state is kept. Repeated calls with the same size are no-ops.
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), BuildError> {
        let next = ScaleContext::from_viewport(width, height)?;
        let variant = next.variant();
        if variant != self.scale.variant() {
            let layout = MapLayout::for_variant(variant);
            layout.validate(self.settings.start_platform_index)?;
            log::info!("Viewport {}x{} crosses breakpoint, rebuilding", width, height);
            self.scale = next;
            self.layout = layout;
            self.populate();
            self.events.push(GameEvent::LayoutRebuilt(variant));
            return Ok(());
        }

        let ratio = next.scale / self.scale.scale;
        self.scale = next;
        let s = next.scale;

        // Platform pieces are rebuilt from the layout at the new scale, so
        // slope pads follow their ramps and repeated resizes never drift
        let pieces = self
            .layout
            .platforms
            .iter()
            .flat_map(|desc| build_platform(desc, s));
        for (handle, spec) in self.platform_bodies.iter().zip(pieces) {
            self.world.set_shape(*handle, spec.shape);
        }
        set_x(&mut self.world, self.right_wall, width + WALL_THICKNESS / 2.0);
        set_x(&mut self.world, self.goal_sensor, self.goal_reference_x * s);

        let moving: Vec<BodyHandle> = std::iter::once(self.player.body)
            .chain(self.fliers.iter().map(|f| f.body))
            .chain(self.chasers.iter().filter_map(|c| c.body))
            .collect();
        for handle in moving {
            if let Some(x) = self.world.position(handle).map(|p| p.x) {
                set_x(&mut self.world, handle, x * ratio);
            }
        }

        self.camera.resize(width, height);
        log::info!("Viewport resized to {}x{} (scale {:.3})", width, height, s);
        Ok(())
    }

    pub fn player_position(&self) -> Vec2 {
        self.world.position(self.player.body).unwrap_or_default()
    }

    pub fn player_velocity(&self) -> Vec2 {
        self.world.velocity(self.player.body).unwrap_or_default()
    }

    /// Whole seconds of play
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed.floor() as u32
    }

    pub fn is_over(&self) -> bool {
        self.phase != SessionPhase::Playing
    }

    /// Final result once the session has ended
    pub fn result(&self) -> Option<SessionResult> {
        self.result
    }

    pub fn goal_sensor(&self) -> BodyHandle {
        self.goal_sensor
    }

    /// Take every event produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// End the session, freezing time and height
    pub(crate) fn finish(&mut self, success: bool) {
        if self.is_over() {
            return;
        }
        let result = SessionResult {
            success,
            clear_time_secs: self.elapsed_secs(),
            max_height: self.max_height,
        };
        self.phase = if success {
            SessionPhase::Won
        } else {
            SessionPhase::Lost
        };
        self.result = Some(result);
        self.events.push(if success {
            GameEvent::GoalReached(result)
        } else {
            GameEvent::PlayerCaught(result)
        });
        log::info!(
            "Session over: {} in {} at {}m",
            if success { "cleared" } else { "caught" },
            format_clock(result.clear_time_secs),
            result.max_height
        );
    }

    /// Put a dead chaser back at its spawn point
    pub(crate) fn respawn_chaser(&mut self, index: usize) {
        let s = self.scale.scale;
        let Some(spawn) = self.chasers.get(index).map(|c| c.spawn(s)) else {
            return;
        };
        let handle = self.world.insert(chaser_body(spawn));
        self.labels.insert(handle, BodyLabel::Chaser(index));
        if let Some(chaser) = self.chasers.get_mut(index) {
            chaser.respawn(handle);
        }
        self.events.push(GameEvent::ChaserRespawned(index));
        log::debug!("Chaser {} respawned", index);
    }

    /// Remove a chaser's body and mark it dead
    pub(crate) fn kill_chaser(&mut self, index: usize) {
        let Some(handle) = self.chasers.get_mut(index).and_then(|c| c.die()) else {
            return;
        };
        self.world.remove(handle);
        self.labels.remove(&handle);
        self.events.push(GameEvent::ChaserDied(index));
        log::debug!("Chaser {} fell out of view", index);
    }

    pub fn hud(&self) -> HudSnapshot {
        let elapsed_secs = self.elapsed_secs();
        HudSnapshot {
            elapsed_secs,
            clock: format_clock(elapsed_secs),
            height_m: height_meters(self.player_position().y),
            max_height_m: self.max_height,
            power: self.player.power_ratio(),
            charging: self.player.charging,
        }
    }
}

fn set_x(world: &mut World, handle: BodyHandle, x: f32) {
    if let Some(position) = world.position(handle) {
        world.set_position(handle, Vec2::new(x, position.y));
    }
}

fn chaser_body(position: Vec2) -> BodyDesc {
    BodyDesc::dynamic(
        Obb::from_size(position, Vec2::splat(CHASER_SIZE)),
        category::CHASER,
        mask::CHASER,
    )
    .with_friction(PLAYER_FRICTION)
    .with_restitution(PLAYER_BOUNCE)
    .with_friction_air(CHASER_FRICTION_AIR)
}
