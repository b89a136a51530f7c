//! Reward shaping

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use super::actions::{AgentAction, Movement};
use crate::constants::*;

/// Reward weights. Every field can be overridden from the settings file.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Scale for velocity toward the goal, applied every step
    pub progress_scale: f32,
    /// Jumping while a hazard is ahead
    pub jump_hazard: f32,
    /// Jumping with nothing ahead
    pub jump_no_hazard: f32,
    /// Choosing to move left
    pub move_left: f32,
    pub goal: f32,
    pub death: f32,
    pub fall: f32,
    /// Falling below this height ends the episode
    pub fall_threshold: f32,
    pub wall_hit: f32,
    /// Per second of continued wall contact
    pub wall_stay_rate: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            progress_scale: REWARD_PROGRESS_SCALE,
            jump_hazard: REWARD_JUMP_HAZARD,
            jump_no_hazard: REWARD_JUMP_NO_HAZARD,
            move_left: REWARD_MOVE_LEFT,
            goal: REWARD_GOAL,
            death: REWARD_DEATH,
            fall: REWARD_FALL,
            fall_threshold: FALL_THRESHOLD,
            wall_hit: REWARD_WALL_HIT,
            wall_stay_rate: REWARD_WALL_STAY_RATE,
        }
    }
}

impl RewardConfig {
    /// Shaped reward for acting once.
    ///
    /// `goal_dir` is the goal direction sign and `velocity_x` the body's
    /// horizontal velocity after the action was applied.
    pub fn step_reward(
        &self,
        action: AgentAction,
        goal_dir: f32,
        velocity_x: f32,
        hazard_ahead: bool,
    ) -> f32 {
        let mut reward = self.progress_scale * goal_dir * velocity_x;

        if action.jump {
            reward += if hazard_ahead {
                self.jump_hazard
            } else {
                self.jump_no_hazard
            };
        }

        if action.movement == Movement::Left {
            reward += self.move_left;
        }

        reward
    }

    /// True once the agent dropped below the level
    pub fn fell_off(&self, y: f32) -> bool {
        y < self.fall_threshold
    }

    /// Penalty for one step of continued wall contact
    pub fn wall_stay(&self, dt: f32) -> f32 {
        self.wall_stay_rate * dt
    }
}
