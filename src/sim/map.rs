//! Map registry
//!
//! Authored platform and obstacle layouts for the two layout variants, the
//! viewport scale context, and build-time validation of a layout.
//!
//! Coordinates are in reference-width units: x is multiplied by the scale
//! factor when built, y is used as is.

use serde::{Deserialize, Serialize};

use super::platform::{PlatformDescriptor, PlatformShape, min_width};
use crate::BuildError;
use crate::consts::*;

use PlatformShape::{Flat, L, LMirrored, SlopeDown, SlopeUp, T};

/// Which authored layout a viewport plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutVariant {
    Desktop,
    Mobile,
}

impl LayoutVariant {
    /// Viewports at or below the breakpoint play the mobile layout
    pub fn for_width(width: f32) -> Self {
        if width <= MOBILE_BREAKPOINT {
            LayoutVariant::Mobile
        } else {
            LayoutVariant::Desktop
        }
    }
}

/// Horizontal scale derived from the viewport
///
/// Always recomputed from the current viewport, never accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleContext {
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// `viewport_width / GAME_WIDTH`
    pub scale: f32,
}

impl ScaleContext {
    pub fn from_viewport(width: f32, height: f32) -> Result<Self, BuildError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(BuildError::InvalidViewport { width, height });
        }
        Ok(Self {
            viewport_width: width,
            viewport_height: height,
            scale: width / GAME_WIDTH,
        })
    }

    pub fn variant(&self) -> LayoutVariant {
        LayoutVariant::for_width(self.viewport_width)
    }
}

/// Patrol flier placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlierDescriptor {
    pub x: f32,
    pub y: f32,
    /// Base speed in px/frame before scaling (default 5)
    pub speed: Option<f32>,
    /// Patrol half-range at the reference width (default 200)
    pub range: Option<f32>,
}

/// Ambush chaser placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChaserDescriptor {
    /// Platform the chaser waits on
    pub platform_index: usize,
    pub x: f32,
    pub y: f32,
    /// Horizontal detection range at the reference width (default 300)
    pub detect_range: Option<f32>,
    /// Base speed before scaling (default 150)
    pub speed: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObstacleDescriptor {
    Flier(FlierDescriptor),
    Chaser(ChaserDescriptor),
}

/// An authored map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLayout {
    pub variant: LayoutVariant,
    /// Bottom to top; index 0 is the start floor
    pub platforms: Vec<PlatformDescriptor>,
    pub obstacles: Vec<ObstacleDescriptor>,
}

impl MapLayout {
    pub fn for_variant(variant: LayoutVariant) -> Self {
        match variant {
            LayoutVariant::Desktop => Self::desktop(),
            LayoutVariant::Mobile => Self::mobile(),
        }
    }

    /// The full-width climb
    pub fn desktop() -> Self {
        let p = PlatformDescriptor::new;
        let platforms = vec![
            p(480.0, 5492.0, 960.0, Flat),
            p(300.0, 5350.0, 120.0, Flat),
            p(780.0, 5200.0, 130.0, Flat),
            p(100.0, 5050.0, 160.0, SlopeUp),
            p(880.0, 4850.0, 120.0, LMirrored),
            p(500.0, 4750.0, 150.0, Flat),
            p(220.0, 4450.0, 140.0, Flat),
            p(620.0, 4300.0, 150.0, SlopeUp),
            p(880.0, 4200.0, 110.0, T),
            p(280.0, 4150.0, 140.0, Flat),
            // 10
            p(700.0, 4000.0, 130.0, Flat),
            p(80.0, 3850.0, 130.0, Flat),
            p(600.0, 3700.0, 140.0, Flat).ice(),
            p(340.0, 3550.0, 130.0, SlopeDown),
            p(880.0, 3300.0, 100.0, Flat).ice(),
            p(200.0, 3250.0, 130.0, Flat),
            p(620.0, 3100.0, 120.0, Flat).ice(),
            p(280.0, 2950.0, 120.0, Flat),
            p(700.0, 2800.0, 120.0, SlopeUp),
            p(80.0, 2700.0, 100.0, T),
            // 20
            p(880.0, 2400.0, 100.0, LMirrored),
            p(280.0, 2350.0, 110.0, Flat),
            p(700.0, 2200.0, 100.0, SlopeDown),
            p(580.0, 1900.0, 100.0, Flat),
            p(80.0, 1800.0, 90.0, SlopeUp),
            p(220.0, 1750.0, 100.0, Flat).ice(),
            p(700.0, 1600.0, 90.0, Flat),
            p(280.0, 1450.0, 100.0, SlopeUp),
            p(700.0, 1300.0, 85.0, Flat),
            p(880.0, 1200.0, 90.0, SlopeDown),
            // 30
            p(160.0, 1150.0, 90.0, Flat).ice(),
            p(520.0, 1000.0, 100.0, Flat),
            p(280.0, 850.0, 110.0, Flat),
            p(700.0, 700.0, 120.0, SlopeUp),
            p(480.0, 600.0, 100.0, Flat).goal(),
        ];

        let obstacles = vec![
            flier(400.0, 3500.0, 10.0, 180.0),
            flier(600.0, 2900.0, 5.0, 200.0),
            flier(300.0, 2300.0, 8.0, 160.0),
            flier(500.0, 1700.0, 10.0, 220.0),
            flier(400.0, 1100.0, 12.0, 200.0),
            chaser_on(&platforms, 5),
            chaser_on(&platforms, 9),
            chaser_on(&platforms, 21),
            chaser_on(&platforms, 31),
        ];

        Self {
            variant: LayoutVariant::Desktop,
            platforms,
            obstacles,
        }
    }

    /// Narrow-screen climb: shorter hops, wider platforms, fewer fliers
    pub fn mobile() -> Self {
        let p = PlatformDescriptor::new;
        let platforms = vec![
            p(480.0, 5492.0, 960.0, Flat),
            p(300.0, 5330.0, 300.0, Flat),
            p(680.0, 5170.0, 300.0, Flat),
            p(400.0, 5010.0, 320.0, SlopeUp),
            p(760.0, 4850.0, 280.0, LMirrored),
            p(360.0, 4690.0, 300.0, Flat),
            p(160.0, 4530.0, 260.0, T),
            p(520.0, 4370.0, 320.0, Flat).ice(),
            p(820.0, 4210.0, 260.0, Flat),
            p(480.0, 4050.0, 340.0, SlopeDown),
            // 10
            p(160.0, 3890.0, 280.0, Flat),
            p(520.0, 3730.0, 300.0, Flat),
            p(820.0, 3570.0, 260.0, T),
            p(460.0, 3410.0, 300.0, Flat).ice(),
            p(140.0, 3250.0, 260.0, L),
            p(460.0, 3090.0, 320.0, SlopeUp),
            p(800.0, 2930.0, 280.0, Flat),
            p(480.0, 2770.0, 300.0, Flat),
            p(160.0, 2610.0, 260.0, Flat).ice(),
            p(500.0, 2450.0, 320.0, SlopeDown),
            // 20
            p(820.0, 2290.0, 260.0, LMirrored),
            p(480.0, 2130.0, 280.0, Flat),
            p(160.0, 1970.0, 260.0, T),
            p(500.0, 1810.0, 300.0, Flat).ice(),
            p(820.0, 1650.0, 260.0, Flat),
            p(480.0, 1490.0, 320.0, SlopeUp),
            p(160.0, 1330.0, 260.0, Flat),
            p(480.0, 1170.0, 280.0, Flat),
            p(800.0, 1010.0, 260.0, T),
            p(480.0, 850.0, 300.0, Flat),
            // 30
            p(480.0, 680.0, 240.0, Flat).goal(),
        ];

        let obstacles = vec![
            flier(480.0, 4130.0, 4.0, 300.0),
            flier(480.0, 2850.0, 5.0, 320.0),
            flier(480.0, 1570.0, 6.0, 320.0),
            chaser_on(&platforms, 11),
            chaser_on(&platforms, 21),
        ];

        Self {
            variant: LayoutVariant::Mobile,
            platforms,
            obstacles,
        }
    }

    /// Index of the first goal platform
    pub fn goal_index(&self) -> Option<usize> {
        self.platforms.iter().position(|p| p.goal)
    }

    pub fn fliers(&self) -> impl Iterator<Item = &FlierDescriptor> {
        self.obstacles.iter().filter_map(|o| match o {
            ObstacleDescriptor::Flier(f) => Some(f),
            ObstacleDescriptor::Chaser(_) => None,
        })
    }

    pub fn chasers(&self) -> impl Iterator<Item = &ChaserDescriptor> {
        self.obstacles.iter().filter_map(|o| match o {
            ObstacleDescriptor::Chaser(c) => Some(c),
            ObstacleDescriptor::Flier(_) => None,
        })
    }

    /// Platform the player starts on
    pub fn start_index(&self, start_override: Option<usize>) -> usize {
        start_override.unwrap_or(0)
    }

    /// Reject layouts that cannot produce a playable scene
    pub fn validate(&self, start_override: Option<usize>) -> Result<(), BuildError> {
        let count = self.platforms.len();
        if count == 0 {
            return Err(BuildError::EmptyLayout);
        }
        for (index, platform) in self.platforms.iter().enumerate() {
            if let Some(width) = platform.width {
                // Negated compare also rejects NaN
                if !(width > min_width(platform.shape)) {
                    return Err(BuildError::InvalidWidth { index, width });
                }
            }
        }
        if self.goal_index().is_none() {
            return Err(BuildError::MissingGoal);
        }
        for (chaser, desc) in self.chasers().enumerate() {
            if desc.platform_index >= count {
                return Err(BuildError::ChaserPlatformOutOfRange {
                    chaser,
                    index: desc.platform_index,
                    count,
                });
            }
        }
        if let Some(index) = start_override {
            if index >= count {
                return Err(BuildError::StartPlatformOutOfRange { index, count });
            }
        }
        Ok(())
    }
}

fn flier(x: f32, y: f32, speed: f32, range: f32) -> ObstacleDescriptor {
    ObstacleDescriptor::Flier(FlierDescriptor {
        x,
        y,
        speed: Some(speed),
        range: Some(range),
    })
}

/// A chaser standing on the center of an authored platform
fn chaser_on(platforms: &[PlatformDescriptor], index: usize) -> ObstacleDescriptor {
    let (x, y) = platforms
        .get(index)
        .map(|p| (p.x, p.y - (PLATFORM_THICKNESS + CHASER_SIZE) / 2.0 - 1.0))
        .unwrap_or_default();
    ObstacleDescriptor::Chaser(ChaserDescriptor {
        platform_index: index,
        x,
        y,
        detect_range: None,
        speed: None,
    })
}
