//! Action selection stand-ins
//!
//! Network-driven policies live outside this crate; these cover scripted
//! baselines, random exploration and fixed actions for tests.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::episode::{AgentAction, Movement, Observation};

/// Chooses an action from an observation
pub trait Policy: Send + Sync {
    fn act(&mut self, obs: &Observation) -> AgentAction;
}

/// Move toward the goal, jump whenever a hazard is ahead
#[derive(Debug, Default)]
pub struct ScriptedPolicy;

impl Policy for ScriptedPolicy {
    fn act(&mut self, obs: &Observation) -> AgentAction {
        let movement = if obs.goal_direction() > 0.0 {
            Movement::Right
        } else {
            Movement::Left
        };
        AgentAction::new(movement, obs.hazard_ahead())
    }
}

/// Uniform movement, jumps with a fixed probability
#[derive(Debug)]
pub struct RandomPolicy {
    rng: StdRng,
    jump_chance: f64,
}

impl RandomPolicy {
    pub fn new(seed: u64, jump_chance: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            jump_chance: jump_chance.clamp(0.0, 1.0),
        }
    }
}

impl Policy for RandomPolicy {
    fn act(&mut self, _obs: &Observation) -> AgentAction {
        let branch = self.rng.gen_range(0..3);
        let jump = self.rng.gen_bool(self.jump_chance);
        AgentAction::from_discrete(&[branch, i32::from(jump)])
    }
}

/// Always the same action
#[derive(Debug)]
pub struct ConstantPolicy(pub AgentAction);

impl Policy for ConstantPolicy {
    fn act(&mut self, _obs: &Observation) -> AgentAction {
        self.0
    }
}

/// Policy selector used by settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    Scripted,
    Random,
    /// Never moves
    Idle,
    /// Runs right without jumping
    RunRight,
}

impl PolicyKind {
    /// Parse a CLI value
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "scripted" | "heuristic" => Some(PolicyKind::Scripted),
            "random" => Some(PolicyKind::Random),
            "idle" => Some(PolicyKind::Idle),
            "run_right" | "run-right" | "right" => Some(PolicyKind::RunRight),
            _ => None,
        }
    }

    /// Build a policy instance; `seed` only matters for random policies
    pub fn build(self, seed: u64, jump_chance: f64) -> Box<dyn Policy> {
        match self {
            PolicyKind::Scripted => Box::new(ScriptedPolicy),
            PolicyKind::Random => Box::new(RandomPolicy::new(seed, jump_chance)),
            PolicyKind::Idle => Box::new(ConstantPolicy(AgentAction::IDLE)),
            PolicyKind::RunRight => Box::new(ConstantPolicy(AgentAction::new(Movement::Right, false))),
        }
    }
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyKind::Scripted => write!(f, "scripted"),
            PolicyKind::Random => write!(f, "random"),
            PolicyKind::Idle => write!(f, "idle"),
            PolicyKind::RunRight => write!(f, "run_right"),
        }
    }
}

/// Policy attached to an agent
#[derive(Component)]
pub struct Brain(pub Box<dyn Policy>);

impl Brain {
    pub fn new(policy: Box<dyn Policy>) -> Self {
        Self(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(goal_dir: f32, hazard: bool) -> Observation {
        Observation([0.4, 0.0, if hazard { 1.0 } else { 0.0 }, 1.0, 0.0, goal_dir])
    }

    #[test]
    fn test_scripted_heads_for_goal() {
        let mut policy = ScriptedPolicy;
        assert_eq!(policy.act(&obs(1.0, false)), AgentAction::new(Movement::Right, false));
        assert_eq!(policy.act(&obs(-1.0, true)), AgentAction::new(Movement::Left, true));
    }

    #[test]
    fn test_random_is_seeded() {
        let mut a = RandomPolicy::new(7, 0.3);
        let mut b = RandomPolicy::new(7, 0.3);
        let o = obs(1.0, false);
        for _ in 0..50 {
            assert_eq!(a.act(&o), b.act(&o));
        }
    }

    #[test]
    fn test_random_never_jumps_at_zero_chance() {
        let mut policy = RandomPolicy::new(1, 0.0);
        let o = obs(1.0, true);
        assert!((0..100).all(|_| !policy.act(&o).jump));
    }

    #[test]
    fn test_kind_parse_and_build() {
        assert_eq!(PolicyKind::parse("Random"), Some(PolicyKind::Random));
        assert_eq!(PolicyKind::parse("run-right"), Some(PolicyKind::RunRight));
        assert_eq!(PolicyKind::parse("ppo"), None);
        let o = obs(1.0, true);
        assert_eq!(PolicyKind::Idle.build(0, 0.1).act(&o), AgentAction::IDLE);
        assert_eq!(
            PolicyKind::Scripted.build(0, 0.1).act(&o),
            AgentAction::new(Movement::Right, true)
        );
        assert_eq!(
            PolicyKind::RunRight.build(0, 0.1).act(&o),
            AgentAction::new(Movement::Right, false)
        );
        assert_eq!(PolicyKind::RunRight.to_string(), "run_right");
    }
}
