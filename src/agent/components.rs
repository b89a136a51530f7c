//! Agent components

use bevy::prelude::*;

use crate::constants::PLAYER_SIZE;

/// Marker for agent entities
#[derive(Component)]
pub struct Player;

/// Stable agent index (0-based), used in logs and records
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentId(pub u32);

/// Kinematic state of an agent
#[derive(Component, Debug, Clone)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Position at the previous sensing pass
    pub last_position: Vec2,
    /// Horizontal velocity estimated from the position delta
    pub velocity_x: f32,
    pub grounded: bool,
}

impl Body {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            last_position: position,
            velocity_x: 0.0,
            grounded: false,
        }
    }

    /// Move without carrying any motion over
    pub fn teleport(&mut self, position: Vec2) {
        self.position = position;
        self.last_position = position;
        self.velocity = Vec2::ZERO;
        self.velocity_x = 0.0;
    }

    pub fn aabb(&self) -> Rect {
        Rect::from_center_size(self.position, PLAYER_SIZE)
    }
}

/// Ray sensor readings, refreshed every step
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sensors {
    pub hazard_ahead: bool,
    pub ground_below: bool,
}

/// Walls and zones the agent currently overlaps
#[derive(Component, Debug, Clone, Default)]
pub struct Contacts {
    pub walls: Vec<Entity>,
    pub zones: Vec<Entity>,
}

impl Contacts {
    pub fn clear(&mut self) {
        self.walls.clear();
        self.zones.clear();
    }
}
