//! Per-agent episode lifecycle and the ledger of finished episodes

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::outcome::{
    EpisodeGuard, EpisodeOutcome, MetricsHistory, MetricsSink, OutcomeReport, OutcomeTracker,
};

/// Why an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Reached the goal
    Goal,
    /// Touched an episode-ending trigger zone
    Trigger,
    /// Killed by a hazard
    Hazard,
    /// Fell below the level
    FellOff,
    /// Hit the per-episode step limit
    StepLimit,
}

impl EndReason {
    pub fn outcome(self) -> EpisodeOutcome {
        match self {
            EndReason::Goal => EpisodeOutcome::Goal,
            EndReason::Trigger => EpisodeOutcome::Trigger,
            EndReason::Hazard | EndReason::FellOff => EpisodeOutcome::Death,
            EndReason::StepLimit => EpisodeOutcome::Other,
        }
    }
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndReason::Goal => write!(f, "goal"),
            EndReason::Trigger => write!(f, "trigger"),
            EndReason::Hazard => write!(f, "hazard"),
            EndReason::FellOff => write!(f, "fell_off"),
            EndReason::StepLimit => write!(f, "step_limit"),
        }
    }
}

/// Episode bookkeeping for one agent
#[derive(Component, Debug)]
pub struct EpisodeState {
    /// Episode number (1-based once the first episode began)
    pub current_episode: u32,
    /// Reward accumulated in the current episode
    pub cumulative_reward: f32,
    /// Steps taken in the current episode
    pub steps: u32,
    /// Reason the most recent episode ended
    pub last_reason: Option<EndReason>,
    guard: EpisodeGuard,
    needs_reset: bool,
}

impl Default for EpisodeState {
    fn default() -> Self {
        Self::new()
    }
}

impl EpisodeState {
    /// New state, waiting for its first episode to begin
    pub fn new() -> Self {
        Self {
            current_episode: 0,
            cumulative_reward: 0.0,
            steps: 0,
            last_reason: None,
            guard: EpisodeGuard::default(),
            needs_reset: true,
        }
    }

    /// Start the next episode
    pub fn begin(&mut self) {
        debug!(
            "Episode: {} cumulative reward: {:.3}",
            self.current_episode, self.cumulative_reward
        );
        self.current_episode += 1;
        self.cumulative_reward = 0.0;
        self.steps = 0;
        self.guard.begin(self.current_episode);
        self.needs_reset = false;
    }

    /// Add reward to the running episode. Ignored once the episode ended.
    pub fn add_reward(&mut self, reward: f32) -> bool {
        if self.guard.is_ended() {
            return false;
        }
        self.cumulative_reward += reward;
        true
    }

    /// End the episode and record its outcome.
    ///
    /// Returns `None` if the episode already ended.
    pub fn finish(
        &mut self,
        reason: EndReason,
        tracker: &mut OutcomeTracker,
    ) -> Option<OutcomeReport> {
        let report = tracker.record_outcome(&mut self.guard, reason.outcome())?;
        self.last_reason = Some(reason);
        self.needs_reset = true;
        Some(report)
    }

    /// True between `finish` and the next `begin`
    pub fn is_ended(&self) -> bool {
        self.guard.is_ended()
    }

    /// True when the agent is waiting for a new episode to begin
    pub fn needs_reset(&self) -> bool {
        self.needs_reset
    }
}

/// Finished episode, as persisted and summarized
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub agent: u32,
    pub episode: u32,
    pub reason: EndReason,
    pub outcome: EpisodeOutcome,
    pub reward: f32,
    pub steps: u32,
    /// Simulation time the episode ended (seconds)
    pub ended_at: f32,
}

/// Resource collecting every finished episode of a run
#[derive(Resource, Debug, Default)]
pub struct EpisodeLedger {
    records: Vec<EpisodeRecord>,
}

impl EpisodeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[EpisodeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<EpisodeRecord> {
        self.records
    }
}

/// Outcome sinks touched when an episode ends
pub struct EpisodeSinks<'a> {
    pub tracker: &'a mut OutcomeTracker,
    pub history: &'a mut MetricsHistory,
    pub ledger: &'a mut EpisodeLedger,
}

/// End the agent's episode: record the outcome, push the metrics and append
/// the ledger entry. Duplicate ends are ignored.
pub fn end_episode(
    agent: u32,
    state: &mut EpisodeState,
    reason: EndReason,
    time: f32,
    sinks: EpisodeSinks<'_>,
) -> Option<OutcomeReport> {
    let report = state.finish(reason, sinks.tracker)?;

    if let Err(e) = sinks
        .history
        .push(report.total_episodes, &sinks.tracker.metrics())
    {
        warn!("Failed to push outcome metrics: {}", e);
    }

    sinks.ledger.records.push(EpisodeRecord {
        agent,
        episode: state.current_episode,
        reason,
        outcome: reason.outcome(),
        reward: state.cumulative_reward,
        steps: state.steps,
        ended_at: time,
    });

    debug!(
        "Agent {} episode {} ended: {} (reward {:.3}, {} steps)",
        agent, state.current_episode, reason, state.cumulative_reward, state.steps
    );
    Some(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::OutcomeKind;

    #[test]
    fn test_new_state_needs_reset() {
        let state = EpisodeState::new();
        assert!(state.needs_reset());
        assert_eq!(state.current_episode, 0);
    }

    #[test]
    fn test_begin_resets_counters() {
        let mut state = EpisodeState::new();
        state.begin();
        state.add_reward(0.5);
        state.steps = 12;
        state.begin();
        assert_eq!(state.current_episode, 2);
        assert_eq!(state.cumulative_reward, 0.0);
        assert_eq!(state.steps, 0);
        assert!(!state.needs_reset());
    }

    #[test]
    fn test_finish_twice_records_once() {
        let mut tracker = OutcomeTracker::new(10);
        let mut state = EpisodeState::new();
        state.begin();

        assert!(state.finish(EndReason::Goal, &mut tracker).is_some());
        assert!(state.finish(EndReason::Hazard, &mut tracker).is_none());

        assert_eq!(tracker.total_episodes(), 1);
        assert_eq!(tracker.total(OutcomeKind::Goal), 1);
        assert_eq!(tracker.total(OutcomeKind::Death), 0);
        assert_eq!(state.last_reason, Some(EndReason::Goal));
    }

    #[test]
    fn test_reward_after_end_is_discarded() {
        let mut tracker = OutcomeTracker::new(10);
        let mut state = EpisodeState::new();
        state.begin();
        assert!(state.add_reward(1.0));
        state.finish(EndReason::Goal, &mut tracker);
        assert!(!state.add_reward(-1.0));
        assert_eq!(state.cumulative_reward, 1.0);
    }

    #[test]
    fn test_end_episode_fills_ledger_and_history() {
        let mut tracker = OutcomeTracker::new(4);
        let mut history = MetricsHistory::new();
        let mut ledger = EpisodeLedger::new();
        let mut state = EpisodeState::new();
        state.begin();
        state.add_reward(-1.0);

        let sinks = EpisodeSinks {
            tracker: &mut tracker,
            history: &mut history,
            ledger: &mut ledger,
        };
        let report = end_episode(0, &mut state, EndReason::FellOff, 3.5, sinks).unwrap();
        assert_eq!(report.death.overall, 1.0);

        let sinks = EpisodeSinks {
            tracker: &mut tracker,
            history: &mut history,
            ledger: &mut ledger,
        };
        assert!(end_episode(0, &mut state, EndReason::Goal, 3.5, sinks).is_none());

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.records()[0].outcome, EpisodeOutcome::Death);
        assert_eq!(ledger.records()[0].reward, -1.0);
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest("death_rate_last_4"), Some(1.0));
    }

    #[test]
    fn test_reason_outcome_mapping() {
        assert_eq!(EndReason::Goal.outcome(), EpisodeOutcome::Goal);
        assert_eq!(EndReason::Trigger.outcome(), EpisodeOutcome::Trigger);
        assert_eq!(EndReason::Hazard.outcome(), EpisodeOutcome::Death);
        assert_eq!(EndReason::FellOff.outcome(), EpisodeOutcome::Death);
        assert_eq!(EndReason::StepLimit.outcome(), EpisodeOutcome::Other);
    }
}
