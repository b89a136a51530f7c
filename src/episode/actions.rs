//! Discrete action decoding and application

use serde::{Deserialize, Serialize};

use crate::agent::Body;

/// Horizontal movement branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Movement {
    #[default]
    Idle,
    Left,
    Right,
}

impl Movement {
    /// -1, 0 or +1
    pub fn direction(self) -> f32 {
        match self {
            Movement::Idle => 0.0,
            Movement::Left => -1.0,
            Movement::Right => 1.0,
        }
    }
}

/// One decision: a movement branch and a jump branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentAction {
    pub movement: Movement,
    pub jump: bool,
}

impl AgentAction {
    pub const IDLE: AgentAction = AgentAction {
        movement: Movement::Idle,
        jump: false,
    };

    pub fn new(movement: Movement, jump: bool) -> Self {
        Self { movement, jump }
    }

    /// Decode the two discrete branches.
    ///
    /// Branch 0: 1 = left, 2 = right, anything else idle.
    /// Branch 1: 1 = jump. Missing branches read as 0.
    pub fn from_discrete(branches: &[i32]) -> Self {
        let movement = match branches.first() {
            Some(1) => Movement::Left,
            Some(2) => Movement::Right,
            _ => Movement::Idle,
        };
        let jump = branches.get(1) == Some(&1);
        Self { movement, jump }
    }

    /// Drive the body: horizontal velocity is replaced, a jump only fires
    /// while grounded.
    pub fn apply(self, body: &mut Body, move_speed: f32, jump_power: f32) {
        body.velocity.x = self.movement.direction() * move_speed;
        if self.jump && body.grounded {
            body.velocity.y = jump_power;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::Vec2;

    #[test]
    fn test_decode_branches() {
        assert_eq!(AgentAction::from_discrete(&[1, 0]).movement, Movement::Left);
        assert_eq!(AgentAction::from_discrete(&[2, 1]), AgentAction::new(Movement::Right, true));
        assert_eq!(AgentAction::from_discrete(&[7, 3]), AgentAction::IDLE);
        assert_eq!(AgentAction::from_discrete(&[]), AgentAction::IDLE);
        assert_eq!(AgentAction::from_discrete(&[1, 1]), AgentAction::new(Movement::Left, true));
    }

    #[test]
    fn test_jump_requires_ground() {
        let mut body = Body::at(Vec2::ZERO);
        body.grounded = false;
        body.velocity.y = -2.0;
        AgentAction::new(Movement::Right, true).apply(&mut body, 4.0, 9.0);
        assert_eq!(body.velocity, Vec2::new(4.0, -2.0));

        body.grounded = true;
        AgentAction::new(Movement::Idle, true).apply(&mut body, 4.0, 9.0);
        assert_eq!(body.velocity, Vec2::new(0.0, 9.0));
    }
}
