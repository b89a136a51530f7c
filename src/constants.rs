//! Tunable constants for the training level
//!
//! World units: one unit per tile, y up.

use bevy::prelude::*;

// =============================================================================
// SIMULATION
// =============================================================================

pub const FIXED_DT: f32 = 0.02; // 50 Hz physics step
pub const GRAVITY: f32 = 20.0;
pub const PLAYER_SIZE: Vec2 = Vec2::new(0.8, 0.9);

// =============================================================================
// AGENT
// =============================================================================

pub const MOVE_SPEED: f32 = 4.0;
pub const JUMP_POWER: f32 = 9.0;
pub const FORWARD_RAY_DIST: f32 = 2.0; // Hazard detection ray (to the right)
pub const DOWN_RAY_DIST: f32 = 0.5; // Ground detection ray
pub const DEFAULT_SPAWN: Vec2 = Vec2::new(-8.0, -3.35);

// =============================================================================
// OBSERVATIONS
// =============================================================================

pub const OBS_POSITION_SCALE: f32 = 25.0;
pub const OBS_VELOCITY_SCALE: f32 = 10.0;
pub const OBSERVATION_SIZE: usize = 6;

// =============================================================================
// REWARDS
// =============================================================================

pub const REWARD_PROGRESS_SCALE: f32 = 0.003;
pub const REWARD_JUMP_HAZARD: f32 = 0.2;
pub const REWARD_JUMP_NO_HAZARD: f32 = -0.05;
pub const REWARD_MOVE_LEFT: f32 = -0.02;
pub const REWARD_GOAL: f32 = 1.0;
pub const REWARD_DEATH: f32 = -1.0;
pub const REWARD_FALL: f32 = -1.0;
pub const REWARD_WALL_HIT: f32 = -0.05;
pub const REWARD_WALL_STAY_RATE: f32 = -0.01; // Per second of contact
pub const FALL_THRESHOLD: f32 = -10.0;

// =============================================================================
// TRACKING
// =============================================================================

pub const DEFAULT_OUTCOME_WINDOW: usize = 100;
