//! Per-step training systems
//!
//! One update of the training app is one simulation step. The systems run as
//! a single chain, in this order:
//!
//! 1. `tick_clock` - advance the fixed-step clock
//! 2. `begin_pending_episodes` - reset latch and respawn, place agents
//! 3. `sense` - velocity estimate and ray sensors
//! 4. `decide` - observation -> policy -> action
//! 5. `apply_actions` - movement and shaping rewards
//! 6. `move_and_collide` - integrate, resolve solids, dispatch contacts
//! 7. `check_episode_limits` - fall threshold and step limit
//! 8. `write_run_log` - position row and drained bus events
//! 9. `check_training_complete`

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::agent::kinematics::{
    diff_contacts, estimate_velocity, integrate, overlapping, ray_down, ray_right, resolve_solids,
};
use crate::agent::{AgentId, Body, Brain, Contacts, Player, Sensors};
use crate::constants::{DOWN_RAY_DIST, FORWARD_RAY_DIST};
use crate::episode::{
    AgentAction, EndReason, EpisodeLedger, EpisodeSinks, EpisodeState, Observation, RewardConfig,
    end_episode,
};
use crate::events::{EventBus, LevelEvent, RunLogger};
use crate::level::{
    ActiveCourse, CheckpointLatch, Collider, ContactResponse, RespawnPoint, Solid, Zone,
    on_wall_contact, on_zone_enter,
};
use crate::outcome::{MetricsHistory, OutcomeKind, OutcomeTracker};

/// Fixed-step simulation clock
#[derive(Resource, Debug, Clone)]
pub struct StepClock {
    pub dt: f32,
    pub step: u64,
    pub elapsed: f32,
}

impl StepClock {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            step: 0,
            elapsed: 0.0,
        }
    }

    pub fn advance(&mut self) {
        self.step += 1;
        self.elapsed = self.step as f32 * self.dt;
    }
}

/// Movement tuning shared by every agent
#[derive(Resource, Debug, Clone, Copy)]
pub struct AgentPhysics {
    pub gravity: f32,
    pub move_speed: f32,
    pub jump_power: f32,
}

/// Stop conditions for the run
#[derive(Resource, Debug, Clone)]
pub struct TrainingControl {
    /// Stop once this many episodes are recorded
    pub target_episodes: u64,
    /// Per-episode step limit (0 = unlimited)
    pub max_episode_steps: u32,
    /// Stop after this many steps regardless of episodes
    pub max_total_steps: u64,
    /// Progress line every N recorded episodes (0 = never)
    pub progress_every: u64,
    pub done: bool,
}

/// Last observation and the action chosen from it
#[derive(Component, Debug, Clone, Copy)]
pub struct Decision {
    pub observation: Observation,
    pub action: AgentAction,
}

impl Default for Decision {
    fn default() -> Self {
        Self {
            observation: Observation([0.0; crate::constants::OBSERVATION_SIZE]),
            action: AgentAction::IDLE,
        }
    }
}

/// Everything an episode end is reported to
#[derive(SystemParam)]
pub struct OutcomeSinks<'w> {
    tracker: ResMut<'w, OutcomeTracker>,
    history: ResMut<'w, MetricsHistory>,
    ledger: ResMut<'w, EpisodeLedger>,
}

impl OutcomeSinks<'_> {
    fn episode_sinks(&mut self) -> EpisodeSinks<'_> {
        EpisodeSinks {
            tracker: &mut *self.tracker,
            history: &mut *self.history,
            ledger: &mut *self.ledger,
        }
    }

    fn end(&mut self, agent: u32, state: &mut EpisodeState, reason: EndReason, time: f32) {
        end_episode(agent, state, reason, time, self.episode_sinks());
    }
}

pub fn tick_clock(mut clock: ResMut<StepClock>, mut bus: ResMut<EventBus>) {
    clock.advance();
    bus.update_time(clock.elapsed);
}

/// Start a new episode for every agent whose previous one ended.
///
/// Beginning an episode clears the checkpoint latch and moves the respawn
/// point back to the initial spawn before placing the agent.
pub fn begin_pending_episodes(
    mut agents: Query<(&mut EpisodeState, &mut Body, &mut Contacts), With<Player>>,
    mut respawn: ResMut<RespawnPoint>,
    mut latch: ResMut<CheckpointLatch>,
) {
    for (mut state, mut body, mut contacts) in &mut agents {
        if !state.needs_reset() {
            continue;
        }
        latch.activated = false;
        respawn.reset();
        respawn.respawn(&mut body, &mut contacts);
        state.begin();
    }
}

/// Refresh the velocity estimate and both ray sensors
pub fn sense(
    mut agents: Query<(&mut Body, &mut Sensors), With<Player>>,
    solids: Query<&Collider, With<Solid>>,
    zones: Query<(&Zone, &Collider)>,
    clock: Res<StepClock>,
) {
    let ground: Vec<Rect> = solids.iter().map(|c| c.0).collect();
    let hazards: Vec<Rect> = zones
        .iter()
        .filter(|(zone, _)| zone.is_hazard())
        .map(|(_, c)| c.0)
        .collect();

    for (mut body, mut sensors) in &mut agents {
        estimate_velocity(&mut body, clock.dt);
        sensors.ground_below = ray_down(body.position, DOWN_RAY_DIST, &ground);
        sensors.hazard_ahead = ray_right(body.position, FORWARD_RAY_DIST, &hazards);
        body.grounded = sensors.ground_below;
    }
}

pub fn decide(
    mut agents: Query<(&Body, &Sensors, &EpisodeState, &mut Brain, &mut Decision), With<Player>>,
    course: Res<ActiveCourse>,
) {
    let goal_x = course.0.goal_x();
    for (body, sensors, state, mut brain, mut decision) in &mut agents {
        if state.is_ended() {
            continue;
        }
        let observation = Observation::collect(goal_x, body, sensors);
        decision.action = brain.0.act(&observation);
        decision.observation = observation;
    }
}

/// Apply the chosen action and add the per-step shaping reward.
///
/// The progress term reads the commanded velocity, not the sensed estimate.
pub fn apply_actions(
    mut agents: Query<(&mut Body, &Sensors, &Decision, &mut EpisodeState), With<Player>>,
    physics: Res<AgentPhysics>,
    rewards: Res<RewardConfig>,
) {
    for (mut body, sensors, decision, mut state) in &mut agents {
        if state.is_ended() {
            continue;
        }
        decision
            .action
            .apply(&mut body, physics.move_speed, physics.jump_power);

        let reward = rewards.step_reward(
            decision.action,
            decision.observation.goal_direction(),
            body.velocity.x,
            sensors.hazard_ahead,
        );
        state.add_reward(reward);
        state.steps += 1;
    }
}

/// Integrate bodies, resolve solids and react to new contacts
#[allow(clippy::too_many_arguments)]
pub fn move_and_collide(
    mut agents: Query<(&AgentId, &mut Body, &mut Contacts, &mut EpisodeState), With<Player>>,
    solids: Query<(Entity, &Solid, &Collider)>,
    zones: Query<(Entity, &Zone, &Collider)>,
    mut respawn: ResMut<RespawnPoint>,
    mut latch: ResMut<CheckpointLatch>,
    mut bus: ResMut<EventBus>,
    mut sinks: OutcomeSinks,
    physics: Res<AgentPhysics>,
    rewards: Res<RewardConfig>,
    clock: Res<StepClock>,
) {
    let solid_list: Vec<(Entity, Solid, Rect)> =
        solids.iter().map(|(e, s, c)| (e, *s, c.0)).collect();
    let zone_list: Vec<(Entity, Zone, Rect)> = zones.iter().map(|(e, z, c)| (e, *z, c.0)).collect();

    for (id, mut body, mut contacts, mut state) in &mut agents {
        if state.is_ended() {
            continue;
        }

        integrate(&mut body, physics.gravity, clock.dt);
        let walls_now = resolve_solids(&mut body, &solid_list);
        let zones_now = overlapping(&body, &zone_list);
        let changes = diff_contacts(&mut contacts, walls_now, zones_now);

        let wall_responses = changes
            .walls
            .iter()
            .map(|(_, phase)| on_wall_contact(*phase, &rewards, clock.dt));
        let mut responses: Vec<ContactResponse> = wall_responses.collect();

        for entered in &changes.entered_zones {
            let Some((_, zone, rect)) = zone_list.iter().find(|(e, _, _)| e == entered) else {
                continue;
            };
            let response = on_zone_enter(*zone, rect.center(), &mut latch, &mut respawn, &rewards);
            let ends = response.end.is_some();
            responses.push(response);
            if ends {
                break;
            }
        }

        for response in responses {
            if state.is_ended() {
                break;
            }
            if let Some(event) = response.event {
                bus.emit(id.0, event);
            }
            state.add_reward(response.reward);
            if let Some(reason) = response.end {
                sinks.end(id.0, &mut state, reason, clock.elapsed);
            }
        }
    }
}

/// End episodes that fell off the course or ran out of steps
pub fn check_episode_limits(
    mut agents: Query<(&AgentId, &Body, &mut EpisodeState), With<Player>>,
    mut sinks: OutcomeSinks,
    control: Res<TrainingControl>,
    rewards: Res<RewardConfig>,
    clock: Res<StepClock>,
) {
    for (id, body, mut state) in &mut agents {
        if state.is_ended() {
            continue;
        }
        if rewards.fell_off(body.position.y) {
            state.add_reward(rewards.fall);
            sinks.end(id.0, &mut state, EndReason::FellOff, clock.elapsed);
        } else if control.max_episode_steps > 0 && state.steps >= control.max_episode_steps {
            sinks.end(id.0, &mut state, EndReason::StepLimit, clock.elapsed);
        }
    }
}

/// Write the tracked agent's position, then every event it raised this step
pub fn write_run_log(
    agents: Query<(&AgentId, &Body), With<Player>>,
    mut bus: ResMut<EventBus>,
    mut logger: ResMut<RunLogger>,
    clock: Res<StepClock>,
) {
    let events = bus.drain();
    let Some(tracked) = logger.tracked_agent() else {
        return;
    };
    let Some((_, body)) = agents.iter().find(|(id, _)| id.0 == tracked) else {
        return;
    };

    logger.log(clock.elapsed, tracked, body.position, LevelEvent::Position);
    for e in events {
        logger.log(e.time, e.agent, body.position, e.event);
    }
}

/// Stop once enough episodes are recorded or the step cap is hit
pub fn check_training_complete(
    mut control: ResMut<TrainingControl>,
    tracker: Res<OutcomeTracker>,
    clock: Res<StepClock>,
    mut last_progress: Local<u64>,
) {
    let recorded = tracker.total_episodes();

    if control.progress_every > 0 && recorded >= *last_progress + control.progress_every {
        *last_progress = recorded - recorded % control.progress_every;
        info!(
            "Episodes {}: goal {:.2} ({:.2} last {}) trigger {:.2} death {:.2}",
            recorded,
            tracker.overall_rate(OutcomeKind::Goal),
            tracker.window_rate(OutcomeKind::Goal),
            tracker.window_capacity(),
            tracker.overall_rate(OutcomeKind::Trigger),
            tracker.overall_rate(OutcomeKind::Death),
        );
    }

    if recorded >= control.target_episodes {
        control.done = true;
    } else if clock.step >= control.max_total_steps {
        warn!(
            "Step cap {} reached with {}/{} episodes recorded",
            control.max_total_steps, recorded, control.target_episodes
        );
        control.done = true;
    }
}
