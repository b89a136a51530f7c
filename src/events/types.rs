//! Level event definitions for the run log

use serde::{Deserialize, Serialize};

/// Everything the run log records about an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelEvent {
    /// Periodic position sample (every step)
    Position,
    Checkpoint,
    BuggedCheckpoint,
    Hazard,
    BuggedHazard,
    Goal,
    /// First contact with a wall
    Wall,
    /// Continued wall contact
    WallStay,
    /// Special trigger zone entered
    Trigger,
}

impl LevelEvent {
    /// Label written to the `event` column
    pub fn label(&self) -> &'static str {
        match self {
            LevelEvent::Position => "pos",
            LevelEvent::Checkpoint => "checkpoint",
            LevelEvent::BuggedCheckpoint => "bugged checkpoint",
            LevelEvent::Hazard => "hazard",
            LevelEvent::BuggedHazard => "bugged hazard",
            LevelEvent::Goal => "goal",
            LevelEvent::Wall => "wall",
            LevelEvent::WallStay => "wall stay",
            LevelEvent::Trigger => "trigger",
        }
    }

    /// Parse a label from the `event` column
    pub fn from_label(label: &str) -> Option<Self> {
        Some(match label {
            "pos" => LevelEvent::Position,
            "checkpoint" => LevelEvent::Checkpoint,
            "bugged checkpoint" => LevelEvent::BuggedCheckpoint,
            "hazard" => LevelEvent::Hazard,
            "bugged hazard" => LevelEvent::BuggedHazard,
            "goal" => LevelEvent::Goal,
            "wall" => LevelEvent::Wall,
            "wall stay" => LevelEvent::WallStay,
            "trigger" => LevelEvent::Trigger,
            _ => return None,
        })
    }
}

impl std::fmt::Display for LevelEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
