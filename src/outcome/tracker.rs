//! Episode outcome tracker
//!
//! Counts how training episodes end and keeps a trailing window per tracked
//! outcome kind. One tracker is owned by each training app and shared by all
//! agents in it, so the rates are pooled across agents.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::metrics::MetricSample;
use super::window::RollingWindow;
use crate::constants::DEFAULT_OUTCOME_WINDOW;

/// How an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpisodeOutcome {
    Goal,
    Trigger,
    Death,
    Other,
}

impl EpisodeOutcome {
    /// Tracked kind for this outcome (`Other` has none)
    pub fn kind(self) -> Option<OutcomeKind> {
        match self {
            EpisodeOutcome::Goal => Some(OutcomeKind::Goal),
            EpisodeOutcome::Trigger => Some(OutcomeKind::Trigger),
            EpisodeOutcome::Death => Some(OutcomeKind::Death),
            EpisodeOutcome::Other => None,
        }
    }

    /// Parse the lowercase label written by `Display`
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "goal" => Some(EpisodeOutcome::Goal),
            "trigger" => Some(EpisodeOutcome::Trigger),
            "death" => Some(EpisodeOutcome::Death),
            "other" => Some(EpisodeOutcome::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for EpisodeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EpisodeOutcome::Goal => write!(f, "goal"),
            EpisodeOutcome::Trigger => write!(f, "trigger"),
            EpisodeOutcome::Death => write!(f, "death"),
            EpisodeOutcome::Other => write!(f, "other"),
        }
    }
}

/// Outcome kinds that get their own counter and rolling window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeKind {
    Goal,
    Trigger,
    Death,
}

impl OutcomeKind {
    pub const ALL: [OutcomeKind; 3] = [OutcomeKind::Goal, OutcomeKind::Trigger, OutcomeKind::Death];

    fn index(self) -> usize {
        match self {
            OutcomeKind::Goal => 0,
            OutcomeKind::Trigger => 1,
            OutcomeKind::Death => 2,
        }
    }

    /// Prefix used for exported metric names
    pub fn metric_prefix(self) -> &'static str {
        match self {
            OutcomeKind::Goal => "goal",
            OutcomeKind::Trigger => "trigger",
            OutcomeKind::Death => "death",
        }
    }
}

/// Per-episode "already ended" guard.
///
/// An outcome is only recorded while the guard is open; recording closes it
/// until the next episode begins.
#[derive(Debug, Clone, Default)]
pub struct EpisodeGuard {
    episode: u32,
    ended: bool,
}

impl EpisodeGuard {
    /// Open the guard for a new episode
    pub fn begin(&mut self, episode: u32) {
        self.episode = episode;
        self.ended = false;
    }

    pub fn episode(&self) -> u32 {
        self.episode
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

/// Overall and trailing-window rate for one kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KindRates {
    pub overall: f64,
    pub window: f64,
}

/// Rates for every tracked kind after a recorded episode
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeReport {
    /// Episodes recorded so far, including this one
    pub total_episodes: u64,
    pub goal: KindRates,
    pub trigger: KindRates,
    pub death: KindRates,
}

impl OutcomeReport {
    pub fn get(&self, kind: OutcomeKind) -> KindRates {
        match kind {
            OutcomeKind::Goal => self.goal,
            OutcomeKind::Trigger => self.trigger,
            OutcomeKind::Death => self.death,
        }
    }
}

#[derive(Debug, Clone)]
struct KindStats {
    total: u64,
    window: RollingWindow,
}

/// Process-lifetime accumulator of episode outcomes
#[derive(Resource, Debug, Clone)]
pub struct OutcomeTracker {
    total_episodes: u64,
    kinds: [KindStats; 3],
    window_capacity: usize,
}

impl Default for OutcomeTracker {
    fn default() -> Self {
        Self::new(DEFAULT_OUTCOME_WINDOW)
    }
}

impl OutcomeTracker {
    /// Create a tracker with a trailing window of `window_capacity` episodes
    pub fn new(window_capacity: usize) -> Self {
        let window = RollingWindow::new(window_capacity);
        let window_capacity = window.capacity();
        let stats = KindStats { total: 0, window };
        Self {
            total_episodes: 0,
            kinds: [stats.clone(), stats.clone(), stats],
            window_capacity,
        }
    }

    /// Record the outcome of the episode guarded by `guard`.
    ///
    /// Returns `None` without touching any counter if the episode was already
    /// recorded.
    pub fn record_outcome(
        &mut self,
        guard: &mut EpisodeGuard,
        outcome: EpisodeOutcome,
    ) -> Option<OutcomeReport> {
        if guard.ended {
            debug!(
                "Ignoring duplicate outcome {} for episode {}",
                outcome, guard.episode
            );
            return None;
        }
        guard.ended = true;

        self.total_episodes += 1;

        // `Other` counts as an episode but leaves the windows alone
        let Some(matched) = outcome.kind() else {
            return Some(self.report());
        };
        for kind in OutcomeKind::ALL {
            let stats = &mut self.kinds[kind.index()];
            let hit = matched == kind;
            if hit {
                stats.total += 1;
            }
            stats.window.push(hit);
        }

        Some(self.report())
    }

    /// Current rates for every tracked kind
    pub fn report(&self) -> OutcomeReport {
        let rates = |kind| KindRates {
            overall: self.overall_rate(kind),
            window: self.window_rate(kind),
        };
        OutcomeReport {
            total_episodes: self.total_episodes,
            goal: rates(OutcomeKind::Goal),
            trigger: rates(OutcomeKind::Trigger),
            death: rates(OutcomeKind::Death),
        }
    }

    pub fn total_episodes(&self) -> u64 {
        self.total_episodes
    }

    pub fn total(&self, kind: OutcomeKind) -> u64 {
        self.kinds[kind.index()].total
    }

    /// Episodes that ended as `Other`
    pub fn total_other(&self) -> u64 {
        let tracked: u64 = OutcomeKind::ALL.iter().map(|k| self.total(*k)).sum();
        self.total_episodes - tracked
    }

    /// total_k / total_episodes, 0.0 before the first episode
    pub fn overall_rate(&self, kind: OutcomeKind) -> f64 {
        if self.total_episodes == 0 {
            0.0
        } else {
            self.total(kind) as f64 / self.total_episodes as f64
        }
    }

    /// Fraction of `kind` among the most recent episodes in the window
    pub fn window_rate(&self, kind: OutcomeKind) -> f64 {
        self.kinds[kind.index()].window.rate()
    }

    pub fn window(&self, kind: OutcomeKind) -> &RollingWindow {
        &self.kinds[kind.index()].window
    }

    pub fn window_capacity(&self) -> usize {
        self.window_capacity
    }

    /// Named samples for an external metrics collector
    pub fn metrics(&self) -> Vec<MetricSample> {
        let mut samples = Vec::with_capacity(OutcomeKind::ALL.len() * 2);
        for kind in OutcomeKind::ALL {
            let prefix = kind.metric_prefix();
            samples.push(MetricSample::new(
                format!("{}_rate_overall", prefix),
                self.overall_rate(kind),
            ));
            samples.push(MetricSample::new(
                format!("{}_rate_last_{}", prefix, self.window_capacity),
                self.window_rate(kind),
            ));
        }
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tracker: &mut OutcomeTracker, episode: u32, outcome: EpisodeOutcome) -> OutcomeReport {
        let mut guard = EpisodeGuard::default();
        guard.begin(episode);
        tracker.record_outcome(&mut guard, outcome).unwrap()
    }

    #[test]
    fn test_empty_tracker_rates_are_zero() {
        let tracker = OutcomeTracker::new(10);
        for kind in OutcomeKind::ALL {
            assert_eq!(tracker.overall_rate(kind), 0.0);
            assert_eq!(tracker.window_rate(kind), 0.0);
        }
        assert_eq!(tracker.total_episodes(), 0);
    }

    #[test]
    fn test_first_episode_rates_are_zero_or_one() {
        let mut tracker = OutcomeTracker::new(10);
        let report = record(&mut tracker, 1, EpisodeOutcome::Death);
        assert_eq!(report.total_episodes, 1);
        assert_eq!(report.death.overall, 1.0);
        assert_eq!(report.goal.overall, 0.0);
        assert_eq!(report.trigger.overall, 0.0);
        for kind in OutcomeKind::ALL {
            let rates = report.get(kind);
            assert!(rates.overall == 0.0 || rates.overall == 1.0);
            assert!(!rates.window.is_nan());
        }
    }

    #[test]
    fn test_window_of_three_scenario() {
        let mut tracker = OutcomeTracker::new(3);
        let sequence = [
            EpisodeOutcome::Goal,
            EpisodeOutcome::Death,
            EpisodeOutcome::Goal,
            EpisodeOutcome::Other,
        ];
        let expected_goal_totals = [1, 1, 2, 2];
        let expected_death_totals = [0, 1, 1, 1];
        let expected_sums = [1, 1, 2, 2];
        let expected_lens = [1, 2, 3, 3];
        let expected_rates = [1.0, 0.5, 2.0 / 3.0, 2.0 / 3.0];

        for (i, outcome) in sequence.iter().enumerate() {
            let report = record(&mut tracker, i as u32 + 1, *outcome);
            assert_eq!(tracker.total(OutcomeKind::Goal), expected_goal_totals[i]);
            assert_eq!(tracker.total(OutcomeKind::Death), expected_death_totals[i]);

            let window = tracker.window(OutcomeKind::Goal);
            assert_eq!(window.sum(), expected_sums[i]);
            assert_eq!(window.len(), expected_lens[i]);
            assert!((report.goal.window - expected_rates[i]).abs() < 1e-9);
        }

        assert_eq!(tracker.total_episodes(), 4);
        assert_eq!(tracker.total_other(), 1);
        assert!((tracker.overall_rate(OutcomeKind::Goal) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_record_is_ignored() {
        let mut tracker = OutcomeTracker::new(5);
        let mut guard = EpisodeGuard::default();
        guard.begin(1);

        assert!(tracker.record_outcome(&mut guard, EpisodeOutcome::Goal).is_some());
        assert!(guard.is_ended());
        assert!(tracker.record_outcome(&mut guard, EpisodeOutcome::Death).is_none());

        assert_eq!(tracker.total_episodes(), 1);
        assert_eq!(tracker.total(OutcomeKind::Goal), 1);
        assert_eq!(tracker.total(OutcomeKind::Death), 0);
        assert_eq!(tracker.window(OutcomeKind::Death).len(), 1);

        // Next episode opens the guard again
        guard.begin(2);
        assert!(tracker.record_outcome(&mut guard, EpisodeOutcome::Death).is_some());
        assert_eq!(tracker.total_episodes(), 2);
    }

    #[test]
    fn test_invariants_hold_over_long_sequence() {
        let mut tracker = OutcomeTracker::new(7);
        let outcomes = [
            EpisodeOutcome::Goal,
            EpisodeOutcome::Trigger,
            EpisodeOutcome::Death,
            EpisodeOutcome::Other,
        ];
        for i in 0..200u32 {
            // Deterministic but uneven mix
            let outcome = outcomes[((i * 7 + i / 3) % 4) as usize];
            record(&mut tracker, i + 1, outcome);

            let mut tracked_total = 0;
            for kind in OutcomeKind::ALL {
                let total = tracker.total(kind);
                assert!(total <= tracker.total_episodes());
                tracked_total += total;

                let window = tracker.window(kind);
                assert!(window.len() <= 7);
                let ones = window.iter().filter(|v| *v == 1).count() as u32;
                assert_eq!(window.sum(), ones);

                let expected = total as f64 / tracker.total_episodes() as f64;
                assert!((tracker.overall_rate(kind) - expected).abs() < 1e-12);
            }
            assert!(tracked_total <= tracker.total_episodes());
        }
        assert_eq!(tracker.total_episodes(), 200);
    }

    #[test]
    fn test_other_outcome_skips_windows() {
        let mut tracker = OutcomeTracker::new(2);
        record(&mut tracker, 1, EpisodeOutcome::Goal);
        let report = record(&mut tracker, 2, EpisodeOutcome::Other);

        assert_eq!(report.total_episodes, 2);
        assert_eq!(report.goal.overall, 0.5);
        assert_eq!(report.goal.window, 1.0);
        for kind in OutcomeKind::ALL {
            assert_eq!(tracker.window(kind).len(), 1);
        }

        let mut only_other = OutcomeTracker::new(2);
        let report = record(&mut only_other, 1, EpisodeOutcome::Other);
        assert_eq!(report.death.overall, 0.0);
        assert_eq!(report.death.window, 0.0);
        assert!(only_other.window(OutcomeKind::Death).is_empty());
    }

    #[test]
    fn test_metric_names() {
        let mut tracker = OutcomeTracker::new(50);
        record(&mut tracker, 1, EpisodeOutcome::Trigger);
        let names: Vec<String> = tracker.metrics().into_iter().map(|m| m.name).collect();
        assert_eq!(
            names,
            vec![
                "goal_rate_overall",
                "goal_rate_last_50",
                "trigger_rate_overall",
                "trigger_rate_last_50",
                "death_rate_overall",
                "death_rate_last_50",
            ]
        );
    }

    #[test]
    fn test_outcome_labels_round_trip() {
        for outcome in [
            EpisodeOutcome::Goal,
            EpisodeOutcome::Trigger,
            EpisodeOutcome::Death,
            EpisodeOutcome::Other,
        ] {
            assert_eq!(EpisodeOutcome::from_label(&outcome.to_string()), Some(outcome));
        }
        assert_eq!(EpisodeOutcome::from_label("win"), None);
    }
}
