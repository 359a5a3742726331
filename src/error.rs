//! Configuration errors surfaced while building a scene
//!
//! A bad map or obstacle descriptor is a configuration problem, so it is
//! reported once at build time and never becomes a runtime simulation fault.

use thiserror::Error;

/// Reasons a layout cannot be turned into a playable scene
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// Layout has no platforms at all
    #[error("layout contains no platforms")]
    EmptyLayout,
    /// Layout has no goal platform, so the session could never be won
    #[error("layout has no goal platform")]
    MissingGoal,
    /// A chaser references a platform that does not exist
    #[error("chaser {chaser} references platform {index}, but the layout has {count} platforms")]
    ChaserPlatformOutOfRange {
        chaser: usize,
        index: usize,
        count: usize,
    },
    /// Platform width must be positive
    #[error("platform {index} has non-positive width {width}")]
    InvalidWidth { index: usize, width: f32 },
    /// Debug start override points past the end of the layout
    #[error("start platform {index} is out of range ({count} platforms)")]
    StartPlatformOutOfRange { index: usize, count: usize },
    /// Viewport dimensions must be positive and finite
    #[error("invalid viewport {width}x{height}")]
    InvalidViewport { width: f32, height: f32 },
}
