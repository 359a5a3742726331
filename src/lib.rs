//! Goat Climb - a vertical charge-jump platformer
//!
//! Core modules:
//! - `sim`: Deterministic gameplay simulation (physics world, controllers, scene)
//! - `settings`: Data-driven session configuration
//! - `leaderboard`: Score submission contract and local ranking board
//! - `error`: Build-time configuration errors

pub mod error;
pub mod leaderboard;
pub mod settings;
pub mod sim;

pub use error::BuildError;
pub use leaderboard::{LeaderboardService, LocalLeaderboard, ScoreSubmission};
pub use settings::Settings;

/// Game configuration constants
///
/// Velocities are in pixels per reference frame (1/60 s) and accelerations in
/// pixels per frame², the units the tuning table was authored in.
pub mod consts {
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Duration of one velocity unit frame
    pub const REFERENCE_FRAME: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Reference resolution; every x coordinate is authored against this width
    pub const GAME_WIDTH: f32 = 960.0;
    pub const GAME_HEIGHT: f32 = 540.0;
    /// Total map height (y grows downward, the start floor sits near the bottom)
    pub const MAP_HEIGHT: f32 = 5500.0;
    /// Viewports at or below this width use the mobile layout
    pub const MOBILE_BREAKPOINT: f32 = 960.0;

    /// Gravity (px/frame², downward)
    pub const GRAVITY: f32 = 0.28;

    /// Player body
    pub const PLAYER_SIZE: f32 = 28.0;
    pub const PLAYER_FRICTION: f32 = 0.1;
    pub const PLAYER_FRICTION_ON_ICE: f32 = 0.0005;
    pub const PLAYER_BOUNCE: f32 = 0.2;
    /// Spawn height above the start platform
    pub const PLAYER_SPAWN_OFFSET: f32 = 50.0;

    /// Charge jump
    pub const MAX_JUMP_POWER: f32 = 25.0;
    /// Power gained per second of charging
    pub const CHARGE_RATE: f32 = 50.0;
    pub const HORIZONTAL_JUMP_RATIO: f32 = 0.25;
    /// Fraction of pre-jump horizontal velocity carried into the jump
    pub const MOMENTUM_RETENTION: f32 = 0.7;
    /// How long the Landed state is held before returning to Idle (seconds)
    pub const LANDED_DURATION: f32 = 0.15;
    /// Vertical speed band inside which the airborne state is retained
    pub const AIRBORNE_HYSTERESIS: f32 = 0.5;

    /// Platform geometry
    pub const PLATFORM_THICKNESS: f32 = 16.0;
    pub const PLATFORM_DEFAULT_WIDTH: f32 = 64.0;
    pub const LIP_HEIGHT: f32 = 20.0;
    pub const LIP_WIDTH: f32 = 16.0;
    pub const SLOPE_FLAT_LENGTH: f32 = 25.0;
    pub const SLOPE_ANGLE_DEG: f32 = 12.0;
    pub const PLATFORM_FRICTION: f32 = 0.1;
    pub const PLATFORM_FRICTION_ICE: f32 = 0.0005;
    /// Ramps are slicker than the pads around them
    pub const RAMP_FRICTION_FACTOR: f32 = 0.5;

    /// Side walls
    pub const WALL_THICKNESS: f32 = 50.0;
    /// Horizontal restitution applied when the player hits a wall
    pub const WALL_BOUNCE: f32 = 0.8;

    /// Goal door sensor
    pub const GOAL_SENSOR_WIDTH: f32 = 30.0;
    pub const GOAL_SENSOR_HEIGHT: f32 = 20.0;
    pub const GOAL_SENSOR_GAP: f32 = 15.0;

    /// Patrol flier
    pub const FLIER_WIDTH: f32 = 32.0;
    pub const FLIER_HEIGHT: f32 = 24.0;
    pub const FLIER_SPEED: f32 = 5.0;
    pub const FLIER_RANGE: f32 = 200.0;
    pub const FLIER_KNOCKBACK: f32 = 15.0;

    /// Ambush chaser
    pub const CHASER_SIZE: f32 = 28.0;
    pub const CHASER_SPEED: f32 = 150.0;
    pub const CHASER_DETECT_RANGE: f32 = 300.0;
    /// Vertical window in which the player can be detected
    pub const CHASER_DETECT_HEIGHT: f32 = 100.0;
    /// Charging velocity = speed × scale × factor (px/frame)
    pub const CHASER_CHARGE_FACTOR: f32 = 0.02;
    /// Airborne drift is half the charging speed
    pub const CHASER_FALL_FACTOR: f32 = 0.01;
    /// Vertical speed at which a charging chaser counts as having left its platform
    pub const CHASER_FALL_THRESHOLD: f32 = 2.0;
    /// Distance below the camera view at which a chaser dies
    pub const CHASER_DESPAWN_MARGIN: f32 = 50.0;
    /// Camera must scroll this far past the spawn height before a respawn
    pub const CHASER_RESPAWN_DISTANCE: f32 = 200.0;
    pub const CHASER_FRICTION_AIR: f32 = 0.01;

    /// Camera vertical follow smoothing
    pub const CAMERA_LERP_Y: f32 = 0.1;

    /// Pixels per displayed meter of height
    pub const PIXELS_PER_METER: f32 = 10.0;
}

/// Format whole seconds as a `MM:SS` clock.
pub fn format_clock(total_secs: u32) -> String {
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}", minutes, seconds)
}

/// Displayed height in meters for a world y coordinate
#[inline]
pub fn height_meters(y: f32) -> u32 {
    let meters = ((consts::MAP_HEIGHT - y) / consts::PIXELS_PER_METER).round();
    meters.max(0.0) as u32
}
