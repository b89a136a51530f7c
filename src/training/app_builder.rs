//! Headless Training App Builder
//!
//! Builds the Bevy app one training run lives in: minimal plugins, the
//! course, the agents and every shared resource. Used by the runner, the
//! parallel executor and tests.

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use std::time::Duration;

use super::settings::TrainingSettings;
use super::systems::{
    AgentPhysics, Decision, StepClock, TrainingControl, apply_actions, begin_pending_episodes,
    check_episode_limits, check_training_complete, decide, move_and_collide, sense, tick_clock,
    write_run_log,
};
use crate::agent::{AgentId, Body, Brain, Contacts, Player, Sensors};
use crate::episode::{EpisodeLedger, EpisodeState};
use crate::events::{EventBus, RunLogConfig, RunLogger};
use crate::level::{ActiveCourse, CheckpointLatch, CourseDef, RespawnPoint, spawn_course};
use crate::outcome::{MetricsHistory, OutcomeTracker};

/// Builder for creating headless training apps
pub struct TrainingAppBuilder {
    settings: TrainingSettings,
    course: CourseDef,
    seed: u64,
    log_config: Option<RunLogConfig>,
    minimal_threads: bool,
    with_log_plugin: bool,
}

impl TrainingAppBuilder {
    /// Create a new builder with default settings on the built-in course
    pub fn new() -> Self {
        Self {
            settings: TrainingSettings::default(),
            course: CourseDef::default_course(),
            seed: 0,
            log_config: None,
            minimal_threads: false,
            with_log_plugin: false,
        }
    }

    pub fn with_settings(mut self, settings: TrainingSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_course(mut self, course: CourseDef) -> Self {
        self.course = course;
        self
    }

    /// Base seed; agent `i` gets `seed + i`
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Write a CSV run log with this configuration
    pub fn with_run_log(mut self, config: RunLogConfig) -> Self {
        self.log_config = Some(config);
        self
    }

    /// Enable minimal thread mode (task pools = 1)
    ///
    /// Use this when running many apps in parallel to avoid hitting OS thread limits.
    pub fn with_minimal_threads(mut self) -> Self {
        self.minimal_threads = true;
        self
    }

    /// Route `info!`/`warn!` output through Bevy's log plugin
    pub fn with_log_plugin(mut self) -> Self {
        self.with_log_plugin = true;
        self
    }

    /// Build the app with minimal plugins and all training resources
    ///
    /// The returned app has:
    /// - MinimalPlugins (optionally single-threaded)
    /// - The course spawned at startup
    /// - `settings.agents` agents, each with its own policy
    /// - One OutcomeTracker shared by all agents
    /// - The chained per-step systems in `Update`
    pub fn build(self) -> App {
        let mut app = App::new();

        let step = Duration::from_secs_f32(self.settings.fixed_dt);
        if self.minimal_threads {
            app.add_plugins(
                MinimalPlugins
                    .set(ScheduleRunnerPlugin::run_loop(step))
                    .set(TaskPoolPlugin {
                        task_pool_options: TaskPoolOptions::with_num_threads(1),
                    }),
            );
        } else {
            app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(step)));
        }
        if self.with_log_plugin {
            app.add_plugins(LogPlugin::default());
        }

        let settings = self.settings;

        // Outcome bookkeeping
        app.insert_resource(OutcomeTracker::new(settings.outcome_window));
        app.init_resource::<MetricsHistory>();
        app.init_resource::<EpisodeLedger>();

        // Level
        app.insert_resource(RespawnPoint::new(self.course.spawn_position()));
        app.init_resource::<CheckpointLatch>();
        app.insert_resource(ActiveCourse(self.course.clone()));

        // Events
        app.insert_resource(EventBus::new());
        app.insert_resource(match self.log_config {
            Some(config) => RunLogger::new(config),
            None => RunLogger::disabled(),
        });

        // Stepping
        app.insert_resource(StepClock::new(settings.fixed_dt));
        app.insert_resource(AgentPhysics {
            gravity: settings.gravity,
            move_speed: settings.move_speed,
            jump_power: settings.jump_power,
        });
        app.insert_resource(settings.rewards.clone());
        app.insert_resource(TrainingControl {
            target_episodes: u64::from(settings.episodes),
            max_episode_steps: settings.max_steps,
            max_total_steps: settings.max_total_steps,
            progress_every: if settings.quiet { 0 } else { settings.progress_every },
            done: false,
        });

        let spawn = self.course.spawn_position();
        for i in 0..settings.agents.max(1) {
            let policy = settings
                .policy
                .build(self.seed.wrapping_add(u64::from(i)), settings.jump_chance);
            app.world_mut().spawn((
                Player,
                AgentId(i),
                Body::at(spawn),
                Sensors::default(),
                Contacts::default(),
                EpisodeState::new(),
                Decision::default(),
                Brain::new(policy),
            ));
        }
        app.insert_resource(settings);

        app.add_systems(Startup, spawn_course);
        app.add_systems(
            Update,
            (
                tick_clock,
                begin_pending_episodes,
                sense,
                decide,
                apply_actions,
                move_and_collide,
                check_episode_limits,
                write_run_log,
                check_training_complete,
            )
                .chain(),
        );

        app
    }
}

impl Default for TrainingAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creates_app() {
        let mut app = TrainingAppBuilder::new().build();
        assert!(app.world().contains_resource::<OutcomeTracker>());
        assert!(app.world().contains_resource::<RunLogger>());

        let mut agents = app.world_mut().query::<&AgentId>();
        assert_eq!(agents.iter(app.world()).count(), 1);
    }

    #[test]
    fn test_agents_share_one_tracker() {
        let settings = TrainingSettings {
            agents: 3,
            outcome_window: 7,
            ..Default::default()
        };
        let mut app = TrainingAppBuilder::new()
            .with_settings(settings)
            .with_minimal_threads()
            .build();

        let mut agents = app.world_mut().query::<&AgentId>();
        let mut ids: Vec<u32> = agents.iter(app.world()).map(|id| id.0).collect();
        ids.sort();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(app.world().resource::<OutcomeTracker>().window_capacity(), 7);
    }

    #[test]
    fn test_first_update_begins_episodes_and_spawns_course() {
        let mut app = TrainingAppBuilder::new().build();
        app.update();

        let mut states = app.world_mut().query::<&EpisodeState>();
        for state in states.iter(app.world()) {
            assert_eq!(state.current_episode, 1);
            assert_eq!(state.steps, 1);
        }
        let mut zones = app.world_mut().query::<&crate::level::Zone>();
        // goal + 2 hazards + 2 checkpoints + 1 trigger
        assert_eq!(zones.iter(app.world()).count(), 6);
        assert_eq!(app.world().resource::<StepClock>().step, 1);
    }
}
