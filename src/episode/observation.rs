//! Observation vector handed to the policy

use crate::agent::{Body, Sensors};
use crate::constants::*;

/// Fixed-size observation vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation(pub [f32; OBSERVATION_SIZE]);

impl Observation {
    /// Build the observation for an agent.
    ///
    /// Layout: goal x, agent x, hazard ahead, ground below, horizontal
    /// velocity, goal direction sign. Positions and velocity are scaled into
    /// roughly [-1, 1].
    pub fn collect(goal_x: f32, body: &Body, sensors: &Sensors) -> Self {
        Self([
            goal_x / OBS_POSITION_SCALE,
            body.position.x / OBS_POSITION_SCALE,
            flag(sensors.hazard_ahead),
            flag(sensors.ground_below),
            body.velocity_x / OBS_VELOCITY_SCALE,
            goal_direction(goal_x, body.position.x),
        ])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn hazard_ahead(&self) -> bool {
        self.0[2] > 0.5
    }

    pub fn ground_below(&self) -> bool {
        self.0[3] > 0.5
    }

    /// +1 when the goal is to the right (or exactly level), -1 when left
    pub fn goal_direction(&self) -> f32 {
        self.0[5]
    }
}

/// Sign of the goal offset; an offset of exactly zero counts as +1
pub fn goal_direction(goal_x: f32, agent_x: f32) -> f32 {
    if goal_x - agent_x < 0.0 { -1.0 } else { 1.0 }
}

fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}
