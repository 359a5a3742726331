//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (ordered maps keyed by body handle)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod camera;
pub mod chaser;
pub mod collision;
pub mod flier;
pub mod geometry;
pub mod input;
pub mod map;
pub mod physics;
pub mod platform;
pub mod player;
pub mod resolver;
pub mod state;
pub mod tick;

pub use autopilot::Autopilot;
pub use camera::Camera;
pub use chaser::{ChaserController, ChaserState};
pub use flier::FlierController;
pub use input::{Key, KeyboardState, TickInput};
pub use map::{
    ChaserDescriptor, FlierDescriptor, LayoutVariant, MapLayout, ObstacleDescriptor, ScaleContext,
};
pub use physics::{BodyDesc, BodyHandle, BodyKind, ContactEvent, ContactPhase, World};
pub use platform::{PlatformDescriptor, PlatformShape, Surface, build_platform};
pub use player::{PlayerController, PlayerState};
pub use resolver::{BodyLabel, CollisionResolver};
pub use state::{GameEvent, HudSnapshot, Scene, SessionPhase, SessionResult};
pub use tick::tick;
