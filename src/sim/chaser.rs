//! Ambush chaser
//!
//! Waits on its platform until the player comes within range, then charges
//! in the direction it saw the player at that instant. The direction is never
//! re-aimed. A chaser that drops below the view dies and may respawn.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::map::ChaserDescriptor;
use super::physics::BodyHandle;
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChaserState {
    #[default]
    Idle,
    Charging,
    Falling,
    Dead,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaserController {
    /// Physics body, `None` while dead
    pub body: Option<BodyHandle>,
    pub platform_index: usize,
    /// Spawn x at the reference width
    pub reference_x: f32,
    pub spawn_y: f32,
    /// Detection range at the reference width
    pub reference_detect_range: f32,
    pub base_speed: f32,
    pub state: ChaserState,
    /// Locked on detection; 0 until then
    pub direction: f32,
    /// Stopped by a wall
    pub halted: bool,
    /// Whether a dead chaser may come back
    pub respawns: bool,
}

impl ChaserController {
    pub fn new(body: BodyHandle, desc: &ChaserDescriptor, respawns: bool) -> Self {
        Self {
            body: Some(body),
            platform_index: desc.platform_index,
            reference_x: desc.x,
            spawn_y: desc.y,
            reference_detect_range: desc.detect_range.unwrap_or(CHASER_DETECT_RANGE),
            base_speed: desc.speed.unwrap_or(CHASER_SPEED),
            state: ChaserState::Idle,
            direction: 0.0,
            halted: false,
            respawns,
        }
    }

    pub fn spawn(&self, scale: f32) -> Vec2 {
        Vec2::new(self.reference_x * scale, self.spawn_y)
    }

    pub fn detect_range(&self, scale: f32) -> f32 {
        self.reference_detect_range * scale
    }

    pub fn is_alive(&self) -> bool {
        self.state != ChaserState::Dead
    }

    /// Whether the player is inside the detection window
    pub fn detects(&self, position: Vec2, player: Vec2, scale: f32) -> bool {
        (player.x - position.x).abs() <= self.detect_range(scale)
            && (player.y - position.y).abs() <= CHASER_DETECT_HEIGHT
    }

    /// Advance the state machine.
    ///
    /// Returns `(velocity command, alerted this tick)`.
    pub fn update(&mut self, position: Vec2, velocity: Vec2, player: Vec2, scale: f32) -> (Option<Vec2>, bool) {
        match self.state {
            ChaserState::Idle => {
                if self.detects(position, player, scale) {
                    self.state = ChaserState::Charging;
                    self.direction = if player.x > position.x { 1.0 } else { -1.0 };
                    log::debug!("Chaser on platform {} charging {:+}", self.platform_index, self.direction);
                    return (None, true);
                }
                (None, false)
            }
            ChaserState::Charging => {
                let vx = self.drift(scale, CHASER_CHARGE_FACTOR);
                if velocity.y > CHASER_FALL_THRESHOLD {
                    self.state = ChaserState::Falling;
                }
                (Some(Vec2::new(vx, velocity.y)), false)
            }
            ChaserState::Falling => {
                let vx = self.drift(scale, CHASER_FALL_FACTOR);
                (Some(Vec2::new(vx, velocity.y)), false)
            }
            ChaserState::Dead => (None, false),
        }
    }

    fn drift(&self, scale: f32, factor: f32) -> f32 {
        if self.halted {
            0.0
        } else {
            self.base_speed * scale * self.direction * factor
        }
    }

    /// Touched a platform; a falling chaser lands and keeps charging
    pub fn on_platform_contact(&mut self) -> bool {
        if self.state == ChaserState::Falling {
            self.state = ChaserState::Charging;
            true
        } else {
            false
        }
    }

    pub fn on_wall_contact(&mut self) {
        self.halted = true;
    }

    /// Far enough below the view to be removed
    pub fn should_die(&self, y: f32, view_bottom: f32) -> bool {
        self.is_alive() && y > view_bottom + CHASER_DESPAWN_MARGIN
    }

    /// Mark dead and hand back the body for removal
    pub fn die(&mut self) -> Option<BodyHandle> {
        self.state = ChaserState::Dead;
        self.body.take()
    }

    /// Camera has scrolled far enough past the spawn height
    pub fn should_respawn(&self, camera_scroll_y: f32) -> bool {
        self.respawns
            && !self.is_alive()
            && camera_scroll_y > self.spawn_y + CHASER_RESPAWN_DISTANCE
    }

    pub fn respawn(&mut self, body: BodyHandle) {
        self.body = Some(body);
        self.state = ChaserState::Idle;
        self.direction = 0.0;
        self.halted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPAWN: Vec2 = Vec2::new(500.0, 4727.0);

    fn chaser() -> ChaserController {
        ChaserController::new(
            BodyHandle(1),
            &ChaserDescriptor {
                platform_index: 5,
                x: SPAWN.x,
                y: SPAWN.y,
                detect_range: Some(300.0),
                speed: None,
            },
            true,
        )
    }

    #[test]
    fn test_detect_window() {
        let mut c = chaser();
        // dy = 150: outside the vertical window
        let (_, alerted) = c.update(SPAWN, Vec2::ZERO, SPAWN + Vec2::new(250.0, 150.0), 1.0);
        assert!(!alerted);
        assert_eq!(c.state, ChaserState::Idle);

        let (_, alerted) = c.update(SPAWN, Vec2::ZERO, SPAWN + Vec2::new(250.0, 40.0), 1.0);
        assert!(alerted);
        assert_eq!(c.state, ChaserState::Charging);
        assert_eq!(c.direction, 1.0);
    }

    #[test]
    fn test_detect_range_scales() {
        let c = chaser();
        let player = SPAWN + Vec2::new(-350.0, 0.0);
        assert!(!c.detects(SPAWN, player, 1.0));
        assert!(c.detects(SPAWN, player, 1.5));
    }

    #[test]
    fn test_direction_locked_after_detection() {
        let mut c = chaser();
        c.update(SPAWN, Vec2::ZERO, SPAWN + Vec2::new(-100.0, 0.0), 1.0);
        assert_eq!(c.direction, -1.0);

        // Player jumps over to the other side
        for _ in 0..30 {
            let (cmd, _) = c.update(SPAWN, Vec2::ZERO, SPAWN + Vec2::new(200.0, 0.0), 1.0);
            assert!(cmd.unwrap().x < 0.0);
        }
        assert_eq!(c.direction, -1.0);
    }

    #[test]
    fn test_charge_speed_and_fall() {
        let mut c = chaser();
        c.update(SPAWN, Vec2::ZERO, SPAWN + Vec2::new(10.0, 0.0), 1.0);
        let (cmd, _) = c.update(SPAWN, Vec2::new(0.0, 0.5), SPAWN, 2.0);
        let cmd = cmd.unwrap();
        assert!((cmd.x - 6.0).abs() < 1e-4);
        assert_eq!(cmd.y, 0.5);

        c.update(SPAWN, Vec2::new(0.0, 2.5), SPAWN, 1.0);
        assert_eq!(c.state, ChaserState::Falling);
        let (cmd, _) = c.update(SPAWN, Vec2::new(0.0, 3.0), SPAWN, 1.0);
        let cmd = cmd.unwrap();
        assert!((cmd.x - 1.5).abs() < 1e-4);
        assert_eq!(cmd.y, 3.0);

        assert!(c.on_platform_contact());
        assert_eq!(c.state, ChaserState::Charging);
        // Landing again while charging changes nothing
        assert!(!c.on_platform_contact());
    }

    #[test]
    fn test_wall_halts_drift() {
        let mut c = chaser();
        c.update(SPAWN, Vec2::ZERO, SPAWN + Vec2::new(10.0, 0.0), 1.0);
        c.on_wall_contact();
        let (cmd, _) = c.update(SPAWN, Vec2::ZERO, SPAWN, 1.0);
        assert_eq!(cmd, Some(Vec2::ZERO));
        assert_eq!(c.direction, 1.0);
    }

    #[test]
    fn test_death_and_respawn() {
        let mut c = chaser();
        c.update(SPAWN, Vec2::ZERO, SPAWN + Vec2::new(10.0, 0.0), 1.0);
        assert!(!c.should_die(5000.0, 5000.0));
        assert!(c.should_die(5051.0, 5000.0));
        assert_eq!(c.die(), Some(BodyHandle(1)));
        assert_eq!(c.body, None);
        assert_eq!(c.update(SPAWN, Vec2::ZERO, SPAWN, 1.0), (None, false));

        assert!(!c.should_respawn(SPAWN.y + 200.0));
        assert!(c.should_respawn(SPAWN.y + 201.0));
        c.respawn(BodyHandle(9));
        assert_eq!(c.state, ChaserState::Idle);
        assert_eq!(c.direction, 0.0);
        assert!(!c.halted);
        assert!(!c.should_respawn(SPAWN.y + 500.0));
    }

    #[test]
    fn test_no_respawn_when_disabled() {
        let mut c = chaser();
        c.respawns = false;
        c.die();
        assert!(!c.should_respawn(SPAWN.y + 1000.0));
    }
}
