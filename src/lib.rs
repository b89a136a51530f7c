//! Ledge Jump - headless platformer training with episode outcome tracking
//!
//! Agents run a small 2D course (ground, walls, a goal, hazards, checkpoints
//! and a trigger zone) inside a headless Bevy app. Every episode end is
//! recorded in a shared outcome tracker that exposes overall and trailing
//! window rates for goal, trigger and death outcomes.

// Core modules
pub mod constants;
pub mod events;
pub mod outcome;
pub mod storage;
pub mod training;

// Simulation modules
pub mod agent;
pub mod episode;
pub mod level;

// Re-export commonly used types for convenience
pub use agent::{AgentId, Body, Brain, Contacts, Player, Policy, PolicyKind, Sensors};
pub use constants::*;
pub use episode::{
    AgentAction, EndReason, EpisodeLedger, EpisodeRecord, EpisodeState, Movement, Observation,
    RewardConfig,
};
pub use events::{EventBus, LevelEvent, RunLogConfig, RunLogger};
pub use level::{
    ActiveCourse, CheckpointLatch, Collider, CourseDef, DEFAULT_COURSE_FILE, RespawnPoint, Solid,
    Zone,
};
pub use outcome::{
    EpisodeOutcome, MetricSample, MetricsHistory, MetricsSink, OutcomeKind, OutcomeReport,
    OutcomeTracker, RollingWindow,
};
pub use storage::{NewSession, RunDatabase};
pub use training::{
    OutcomeTotals, SessionSummary, TrainingAppBuilder, TrainingResult, TrainingSettings,
    run_parallel, run_sequential, run_training,
};
