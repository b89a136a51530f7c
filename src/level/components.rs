//! Level element components

use bevy::prelude::*;

/// Axis-aligned collision rectangle in world units
#[derive(Component, Debug, Clone, Copy)]
pub struct Collider(pub Rect);

impl Collider {
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        Self(Rect::from_center_size(center, size))
    }

    pub fn center(&self) -> Vec2 {
        self.0.center()
    }
}

/// Solid geometry the body cannot pass through
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solid {
    /// Walkable ground (hit by the downward ray)
    Ground,
    /// Wall; touching it is penalized
    Wall,
}

/// Non-solid trigger area
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Goal,
    /// Kills on contact unless bugged
    Hazard { is_bug: bool },
    /// Moves the respawn point unless bugged
    Checkpoint { one_time: bool, is_bug: bool },
    /// Special trigger, optionally ending the episode
    Trigger { ends_episode: bool },
}

impl Zone {
    /// Hazards (bugged or not) are what the forward ray looks for
    pub fn is_hazard(&self) -> bool {
        matches!(self, Zone::Hazard { .. })
    }
}
