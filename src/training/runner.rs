//! Training run driver
//!
//! Builds one headless app, steps it until the episode target or the step
//! cap is reached, then pulls the results out of the world.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use super::app_builder::TrainingAppBuilder;
use super::settings::TrainingSettings;
use super::systems::{StepClock, TrainingControl};
use crate::episode::{EpisodeLedger, EpisodeRecord};
use crate::events::{EventBus, RunLogConfig, RunLogger};
use crate::level::CourseDef;
use crate::outcome::{MetricsHistory, MetricsRow, OutcomeKind, OutcomeReport, OutcomeTracker};

/// Seed distance between consecutive runs; agents within a run use `seed + i`
pub const SEED_STRIDE: u64 = 1000;

/// Which run of a session this is
#[derive(Debug, Clone, Copy)]
pub struct RunSpec {
    /// 0-based run index
    pub index: u32,
    pub seed: u64,
    /// Tag the run log file with the run index
    pub tag_log: bool,
    /// Install Bevy's log plugin in this app
    pub log_plugin: bool,
    pub minimal_threads: bool,
}

impl RunSpec {
    pub fn single(seed: u64) -> Self {
        Self {
            index: 0,
            seed,
            tag_log: false,
            log_plugin: false,
            minimal_threads: false,
        }
    }
}

/// Lifetime outcome counts of one or more runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTotals {
    pub episodes: u64,
    pub goal: u64,
    pub trigger: u64,
    pub death: u64,
    pub other: u64,
}

impl OutcomeTotals {
    pub fn from_tracker(tracker: &OutcomeTracker) -> Self {
        Self {
            episodes: tracker.total_episodes(),
            goal: tracker.total(OutcomeKind::Goal),
            trigger: tracker.total(OutcomeKind::Trigger),
            death: tracker.total(OutcomeKind::Death),
            other: tracker.total_other(),
        }
    }

    /// Sum of several runs' totals
    pub fn merge<'a>(totals: impl IntoIterator<Item = &'a OutcomeTotals>) -> Self {
        totals.into_iter().fold(Self::default(), |acc, t| Self {
            episodes: acc.episodes + t.episodes,
            goal: acc.goal + t.goal,
            trigger: acc.trigger + t.trigger,
            death: acc.death + t.death,
            other: acc.other + t.other,
        })
    }

    pub fn rate(&self, kind: OutcomeKind) -> f64 {
        if self.episodes == 0 {
            return 0.0;
        }
        let count = match kind {
            OutcomeKind::Goal => self.goal,
            OutcomeKind::Trigger => self.trigger,
            OutcomeKind::Death => self.death,
        };
        count as f64 / self.episodes as f64
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingResult {
    pub run: u32,
    pub seed: u64,
    pub policy: String,
    pub course: String,
    pub agents: u32,
    /// Simulation steps executed
    pub steps: u64,
    /// Simulated seconds
    pub elapsed: f32,
    /// Episode target reached (false = step cap hit first)
    pub completed: bool,
    pub totals: OutcomeTotals,
    /// Rates after the last recorded episode
    pub report: OutcomeReport,
    pub records: Vec<EpisodeRecord>,
    pub metrics: Vec<MetricsRow>,
    /// Level events seen, by label
    pub event_counts: HashMap<String, u64>,
    pub run_log: Option<PathBuf>,
}

impl TrainingResult {
    pub fn episodes(&self) -> u64 {
        self.totals.episodes
    }
}

/// Run log configuration for one run
fn run_log_config(settings: &TrainingSettings, spec: &RunSpec) -> RunLogConfig {
    RunLogConfig {
        log_dir: PathBuf::from(&settings.log_dir),
        enabled: settings.log_runs,
        tracked_agent: settings.tracked_agent,
        file_tag: spec.tag_log.then(|| format!("run{}", spec.index)),
        ..Default::default()
    }
}

/// Run a single training run with a resolved seed
pub fn run_training(settings: &TrainingSettings, course: &CourseDef, spec: RunSpec) -> TrainingResult {
    let mut builder = TrainingAppBuilder::new()
        .with_settings(settings.clone())
        .with_course(course.clone())
        .with_seed(spec.seed)
        .with_run_log(run_log_config(settings, &spec));
    if spec.minimal_threads {
        builder = builder.with_minimal_threads();
    }
    if spec.log_plugin {
        builder = builder.with_log_plugin();
    }
    let mut app = builder.build();

    let timestamp = chrono::Local::now().format("%m%d_%H%M%S").to_string();
    app.world_mut()
        .resource_mut::<RunLogger>()
        .start_session(&timestamp);

    loop {
        app.update();

        if app.world().resource::<TrainingControl>().done {
            break;
        }
    }

    let world = app.world_mut();
    let run_log = {
        let mut logger = world.resource_mut::<RunLogger>();
        logger.end_session();
        logger.path().map(|p| p.to_path_buf())
    };

    let (steps, elapsed) = {
        let clock = world.resource::<StepClock>();
        (clock.step, clock.elapsed)
    };
    let (totals, report) = {
        let tracker = world.resource::<OutcomeTracker>();
        (OutcomeTotals::from_tracker(tracker), tracker.report())
    };
    let completed = totals.episodes >= u64::from(settings.episodes);
    let event_counts = world.resource::<EventBus>().counts_by_label();
    let records = world
        .remove_resource::<EpisodeLedger>()
        .map(EpisodeLedger::into_records)
        .unwrap_or_default();
    let metrics = world
        .remove_resource::<MetricsHistory>()
        .map(|history| history.rows().to_vec())
        .unwrap_or_default();

    TrainingResult {
        run: spec.index,
        seed: spec.seed,
        policy: settings.policy.to_string(),
        course: course.name.clone(),
        agents: settings.agents.max(1),
        steps,
        elapsed,
        completed,
        totals,
        report,
        records,
        metrics,
        event_counts,
        run_log,
    }
}

/// Run `settings.runs` runs one after another
pub fn run_sequential(settings: &TrainingSettings, course: &CourseDef, base_seed: u64) -> Vec<TrainingResult> {
    let runs = settings.runs.max(1);
    (0..runs)
        .map(|i| {
            let spec = RunSpec {
                index: i,
                seed: base_seed.wrapping_add(u64::from(i) * SEED_STRIDE),
                tag_log: runs > 1,
                log_plugin: i == 0 && !settings.quiet,
                minimal_threads: false,
            };
            run_training(settings, course, spec)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::PolicyKind;
    use crate::episode::EndReason;
    use crate::level::{AreaDef, HazardDef};
    use crate::outcome::EpisodeOutcome;

    fn quiet_settings(policy: PolicyKind, episodes: u32) -> TrainingSettings {
        TrainingSettings {
            episodes,
            policy,
            max_steps: 200,
            max_total_steps: 20_000,
            log_runs: false,
            quiet: true,
            ..Default::default()
        }
    }

    /// Flat floor from x = -10 to 10 with its top at y = -3.8
    fn flat_course() -> CourseDef {
        CourseDef {
            name: "Flat".to_string(),
            spawn: [-8.0, -3.35],
            goal: AreaDef::new(50.0, -3.0, 1.0, 2.0),
            ground: vec![AreaDef::new(0.0, -4.3, 20.0, 1.0)],
            walls: vec![],
            hazards: vec![],
            checkpoints: vec![],
            triggers: vec![],
        }
    }

    fn run(settings: &TrainingSettings, course: &CourseDef) -> TrainingResult {
        run_training(settings, course, RunSpec::single(1))
    }

    #[test]
    fn test_idle_agent_hits_step_limit() {
        let result = run(&quiet_settings(PolicyKind::Idle, 2), &flat_course());
        assert!(result.completed);
        assert_eq!(result.totals.episodes, 2);
        assert_eq!(result.totals.other, 2);
        assert_eq!(result.report.goal.overall, 0.0);
        for record in &result.records {
            assert_eq!(record.reason, EndReason::StepLimit);
            assert_eq!(record.outcome, EpisodeOutcome::Other);
            assert_eq!(record.steps, 200);
        }
    }

    #[test]
    fn test_running_into_hazard_is_death() {
        let mut course = flat_course();
        course.hazards.push(HazardDef {
            x: -6.0,
            y: -3.4,
            width: 0.4,
            height: 0.8,
            is_bug: false,
        });
        let result = run(&quiet_settings(PolicyKind::RunRight, 3), &course);
        assert_eq!(result.totals.death, 3);
        assert_eq!(result.report.death.overall, 1.0);
        assert_eq!(result.report.death.window, 1.0);
        assert!(result.records.iter().all(|r| r.reason == EndReason::Hazard));
        assert_eq!(result.event_counts.get("hazard"), Some(&3));
    }

    #[test]
    fn test_bugged_hazard_only_logs() {
        let mut course = flat_course();
        course.goal = AreaDef::new(-4.0, -3.0, 1.0, 2.0);
        course.hazards.push(HazardDef {
            x: -6.0,
            y: -3.4,
            width: 0.4,
            height: 0.8,
            is_bug: true,
        });
        let result = run(&quiet_settings(PolicyKind::RunRight, 1), &course);
        assert_eq!(result.totals.goal, 1);
        assert_eq!(result.event_counts.get("bugged hazard"), Some(&1));
    }

    #[test]
    fn test_no_ground_falls_off() {
        let mut course = flat_course();
        course.ground.clear();
        let result = run(&quiet_settings(PolicyKind::Idle, 2), &course);
        assert_eq!(result.totals.death, 2);
        for record in &result.records {
            assert_eq!(record.reason, EndReason::FellOff);
            assert!(record.reward <= -1.0);
        }
    }

    #[test]
    fn test_reaching_goal() {
        let mut course = flat_course();
        course.goal = AreaDef::new(-4.0, -3.0, 1.0, 2.0);
        let result = run(&quiet_settings(PolicyKind::Scripted, 4), &course);
        assert_eq!(result.totals.goal, 4);
        assert_eq!(result.report.goal.window, 1.0);
        for record in &result.records {
            assert_eq!(record.reason, EndReason::Goal);
            // Goal reward plus a positive progress term
            assert!(record.reward > 1.0);
        }
        assert_eq!(result.metrics.len(), 4);
    }

    #[test]
    fn test_scripted_policy_clears_default_course() {
        let settings = TrainingSettings {
            max_steps: 600,
            ..quiet_settings(PolicyKind::Scripted, 2)
        };
        let result = run(&settings, &CourseDef::default_course());
        assert_eq!(result.totals.goal, 2);
        assert_eq!(result.event_counts.get("checkpoint"), Some(&2));
        assert_eq!(result.event_counts.get("hazard"), None);
    }

    #[test]
    fn test_agents_pool_outcomes() {
        let settings = TrainingSettings {
            agents: 2,
            ..quiet_settings(PolicyKind::Idle, 4)
        };
        let result = run(&settings, &flat_course());
        // Both agents hit the step limit on the same step, so the last
        // update may record one episode past the target
        assert!(result.totals.episodes >= 4);
        let agents: std::collections::HashSet<u32> = result.records.iter().map(|r| r.agent).collect();
        assert_eq!(agents.len(), 2);
        assert_eq!(result.totals.episodes as usize, result.records.len());
    }

    #[test]
    fn test_step_cap_stops_run() {
        let settings = TrainingSettings {
            max_steps: 0,
            max_total_steps: 50,
            ..quiet_settings(PolicyKind::Idle, 5)
        };
        let result = run(&settings, &flat_course());
        assert!(!result.completed);
        assert_eq!(result.steps, 50);
        assert_eq!(result.totals.episodes, 0);
    }

    #[test]
    fn test_merge_totals() {
        let a = OutcomeTotals {
            episodes: 4,
            goal: 1,
            trigger: 0,
            death: 2,
            other: 1,
        };
        let b = OutcomeTotals {
            episodes: 6,
            goal: 3,
            trigger: 1,
            death: 1,
            other: 1,
        };
        let merged = OutcomeTotals::merge([&a, &b]);
        assert_eq!(merged.episodes, 10);
        assert_eq!(merged.goal, 4);
        assert_eq!(merged.rate(OutcomeKind::Goal), 0.4);
        assert_eq!(OutcomeTotals::default().rate(OutcomeKind::Death), 0.0);
    }
}
