//! Episode lifecycle, actions, observations and reward shaping

mod actions;
mod observation;
mod rewards;
mod state;

pub use actions::{AgentAction, Movement};
pub use observation::{Observation, goal_direction};
pub use rewards::RewardConfig;
pub use state::{EndReason, EpisodeLedger, EpisodeRecord, EpisodeSinks, EpisodeState, end_episode};
