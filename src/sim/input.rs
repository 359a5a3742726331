//! Input commands
//!
//! The simulation consumes one [`TickInput`] per tick. Hosts build it from
//! keyboard events through [`KeyboardState`] and from the on-screen virtual
//! controller, whose direction wins whenever it is non-zero.

use serde::{Deserialize, Serialize};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    /// Keyboard direction (-1 left, 0 none, 1 right)
    pub keyboard_direction: i8,
    /// Virtual controller direction, takes priority when non-zero
    pub virtual_direction: i8,
    /// Jump button went down this tick
    pub charge_start: bool,
    /// Jump button went up this tick
    pub charge_release: bool,
}

impl TickInput {
    /// Effective horizontal direction.
    ///
    /// Without a keyboard the keyboard channel is treated as zero.
    pub fn direction(&self, keyboard_available: bool) -> f32 {
        let keyboard = if keyboard_available {
            self.keyboard_direction.signum()
        } else {
            0
        };
        let dir = if self.virtual_direction != 0 {
            self.virtual_direction.signum()
        } else {
            keyboard
        };
        dir as f32
    }
}

/// Keys the game listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    Jump,
}

/// Edge-triggered keyboard tracker
///
/// The last pressed arrow sets the direction; releasing an arrow clears the
/// direction only if it is the one currently set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardState {
    direction: i8,
    jump_held: bool,
    charge_start: bool,
    charge_release: bool,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        match key {
            Key::Left => self.direction = -1,
            Key::Right => self.direction = 1,
            Key::Jump => {
                // Ignore key repeat
                if !self.jump_held {
                    self.jump_held = true;
                    self.charge_start = true;
                }
            }
        }
    }

    pub fn key_up(&mut self, key: Key) {
        match key {
            Key::Left if self.direction == -1 => self.direction = 0,
            Key::Right if self.direction == 1 => self.direction = 0,
            Key::Jump if self.jump_held => {
                self.jump_held = false;
                self.charge_release = true;
            }
            _ => {}
        }
    }

    pub fn direction(&self) -> i8 {
        self.direction
    }

    /// Produce this tick's input and clear the edges
    pub fn take_input(&mut self, virtual_direction: i8) -> TickInput {
        let input = TickInput {
            keyboard_direction: self.direction,
            virtual_direction,
            charge_start: self.charge_start,
            charge_release: self.charge_release,
        };
        self.charge_start = false;
        self.charge_release = false;
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_direction_wins() {
        let input = TickInput {
            keyboard_direction: -1,
            virtual_direction: 1,
            ..Default::default()
        };
        assert_eq!(input.direction(true), 1.0);

        let input = TickInput {
            keyboard_direction: -1,
            ..Default::default()
        };
        assert_eq!(input.direction(true), -1.0);
    }

    #[test]
    fn test_missing_keyboard_reads_as_zero() {
        let input = TickInput {
            keyboard_direction: 1,
            ..Default::default()
        };
        assert_eq!(input.direction(false), 0.0);
        let input = TickInput {
            keyboard_direction: 1,
            virtual_direction: -1,
            ..Default::default()
        };
        assert_eq!(input.direction(false), -1.0);
    }

    #[test]
    fn test_release_only_clears_matching_direction() {
        let mut keys = KeyboardState::new();
        keys.key_down(Key::Left);
        keys.key_down(Key::Right);
        assert_eq!(keys.direction(), 1);
        // Left let go while right is the active direction
        keys.key_up(Key::Left);
        assert_eq!(keys.direction(), 1);
        keys.key_up(Key::Right);
        assert_eq!(keys.direction(), 0);
    }

    #[test]
    fn test_jump_edges_are_consumed() {
        let mut keys = KeyboardState::new();
        keys.key_down(Key::Jump);
        keys.key_down(Key::Jump);
        let first = keys.take_input(0);
        assert!(first.charge_start && !first.charge_release);
        assert_eq!(keys.take_input(0), TickInput::default());

        keys.key_up(Key::Jump);
        let released = keys.take_input(0);
        assert!(released.charge_release && !released.charge_start);
        // A stray release is not an edge
        keys.key_up(Key::Jump);
        assert!(!keys.take_input(0).charge_release);
    }
}
