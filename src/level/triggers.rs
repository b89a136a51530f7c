//! Contact handlers for level elements
//!
//! Each handler turns a contact into a [`ContactResponse`]: what to log, what
//! reward to add and whether the episode ends. The dispatch system applies
//! the response to the agent.

use bevy::prelude::*;

use super::components::Zone;
use super::respawn::{CheckpointLatch, RespawnPoint};
use crate::episode::{EndReason, RewardConfig};
use crate::events::LevelEvent;

/// Phase of a contact with solid geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    Enter,
    Stay,
    Exit,
}

/// Effects of one contact on the agent
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactResponse {
    pub event: Option<LevelEvent>,
    pub reward: f32,
    pub end: Option<EndReason>,
}

impl ContactResponse {
    pub const NONE: ContactResponse = ContactResponse {
        event: None,
        reward: 0.0,
        end: None,
    };

    fn log(event: LevelEvent) -> Self {
        Self {
            event: Some(event),
            ..Self::NONE
        }
    }
}

/// Agent entered a trigger zone
pub fn on_zone_enter(
    zone: Zone,
    zone_center: Vec2,
    latch: &mut CheckpointLatch,
    respawn: &mut RespawnPoint,
    rewards: &RewardConfig,
) -> ContactResponse {
    match zone {
        Zone::Goal => ContactResponse {
            event: Some(LevelEvent::Goal),
            reward: rewards.goal,
            end: Some(EndReason::Goal),
        },
        Zone::Hazard { is_bug: true } => ContactResponse::log(LevelEvent::BuggedHazard),
        Zone::Hazard { is_bug: false } => ContactResponse {
            event: Some(LevelEvent::Hazard),
            reward: rewards.death,
            end: Some(EndReason::Hazard),
        },
        Zone::Checkpoint { one_time, is_bug } => {
            if latch.activated && one_time {
                return ContactResponse::NONE;
            }
            if is_bug {
                return ContactResponse::log(LevelEvent::BuggedCheckpoint);
            }
            respawn.set_checkpoint(zone_center);
            latch.activated = true;
            ContactResponse::log(LevelEvent::Checkpoint)
        }
        Zone::Trigger { ends_episode } => ContactResponse {
            event: Some(LevelEvent::Trigger),
            reward: 0.0,
            end: ends_episode.then_some(EndReason::Trigger),
        },
    }
}

/// Agent touched, kept touching, or left a wall
pub fn on_wall_contact(phase: ContactPhase, rewards: &RewardConfig, dt: f32) -> ContactResponse {
    match phase {
        ContactPhase::Enter => ContactResponse {
            event: Some(LevelEvent::Wall),
            reward: rewards.wall_hit,
            end: None,
        },
        ContactPhase::Stay => ContactResponse {
            event: Some(LevelEvent::WallStay),
            reward: rewards.wall_stay(dt),
            end: None,
        },
        ContactPhase::Exit => ContactResponse::NONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (CheckpointLatch, RespawnPoint, RewardConfig) {
        (
            CheckpointLatch::default(),
            RespawnPoint::new(Vec2::new(-8.0, -3.35)),
            RewardConfig::default(),
        )
    }

    #[test]
    fn test_goal_ends_with_reward() {
        let (mut latch, mut respawn, rewards) = setup();
        let response = on_zone_enter(Zone::Goal, Vec2::ZERO, &mut latch, &mut respawn, &rewards);
        assert_eq!(response.event, Some(LevelEvent::Goal));
        assert_eq!(response.reward, 1.0);
        assert_eq!(response.end, Some(EndReason::Goal));
    }

    #[test]
    fn test_hazard_kills_unless_bugged() {
        let (mut latch, mut respawn, rewards) = setup();
        let real = on_zone_enter(
            Zone::Hazard { is_bug: false },
            Vec2::ZERO,
            &mut latch,
            &mut respawn,
            &rewards,
        );
        assert_eq!(real.end, Some(EndReason::Hazard));
        assert_eq!(real.reward, -1.0);

        let bugged = on_zone_enter(
            Zone::Hazard { is_bug: true },
            Vec2::ZERO,
            &mut latch,
            &mut respawn,
            &rewards,
        );
        assert_eq!(bugged.event, Some(LevelEvent::BuggedHazard));
        assert_eq!(bugged.end, None);
        assert_eq!(bugged.reward, 0.0);
    }

    #[test]
    fn test_one_time_checkpoint_latches() {
        let (mut latch, mut respawn, rewards) = setup();
        let zone = Zone::Checkpoint {
            one_time: true,
            is_bug: false,
        };
        let first = on_zone_enter(zone, Vec2::new(4.0, -3.0), &mut latch, &mut respawn, &rewards);
        assert_eq!(first.event, Some(LevelEvent::Checkpoint));
        assert!(latch.activated);
        assert_eq!(respawn.current(), Vec2::new(4.0, -3.0));

        // A second one-time checkpoint is silent while latched
        let second = on_zone_enter(zone, Vec2::new(7.0, -3.0), &mut latch, &mut respawn, &rewards);
        assert_eq!(second, ContactResponse::NONE);
        assert_eq!(respawn.current(), Vec2::new(4.0, -3.0));
    }

    #[test]
    fn test_repeatable_checkpoint_ignores_latch() {
        let (mut latch, mut respawn, rewards) = setup();
        latch.activated = true;
        let zone = Zone::Checkpoint {
            one_time: false,
            is_bug: false,
        };
        let response = on_zone_enter(zone, Vec2::new(7.0, -3.0), &mut latch, &mut respawn, &rewards);
        assert_eq!(response.event, Some(LevelEvent::Checkpoint));
        assert_eq!(respawn.current(), Vec2::new(7.0, -3.0));
    }

    #[test]
    fn test_bugged_checkpoint_only_logs() {
        let (mut latch, mut respawn, rewards) = setup();
        let zone = Zone::Checkpoint {
            one_time: true,
            is_bug: true,
        };
        let response = on_zone_enter(zone, Vec2::new(8.0, -3.0), &mut latch, &mut respawn, &rewards);
        assert_eq!(response.event, Some(LevelEvent::BuggedCheckpoint));
        assert!(!latch.activated);
        assert_eq!(respawn.current(), respawn.initial());
    }

    #[test]
    fn test_trigger_zone() {
        let (mut latch, mut respawn, rewards) = setup();
        let ending = on_zone_enter(
            Zone::Trigger { ends_episode: true },
            Vec2::ZERO,
            &mut latch,
            &mut respawn,
            &rewards,
        );
        assert_eq!(ending.end, Some(EndReason::Trigger));

        let passive = on_zone_enter(
            Zone::Trigger { ends_episode: false },
            Vec2::ZERO,
            &mut latch,
            &mut respawn,
            &rewards,
        );
        assert_eq!(passive.event, Some(LevelEvent::Trigger));
        assert_eq!(passive.end, None);
    }

    #[test]
    fn test_wall_phases() {
        let rewards = RewardConfig::default();
        let enter = on_wall_contact(ContactPhase::Enter, &rewards, 0.02);
        assert_eq!(enter.event, Some(LevelEvent::Wall));
        assert_eq!(enter.reward, -0.05);

        let stay = on_wall_contact(ContactPhase::Stay, &rewards, 0.02);
        assert_eq!(stay.event, Some(LevelEvent::WallStay));
        assert!((stay.reward + 0.0002).abs() < 1e-7);

        assert_eq!(on_wall_contact(ContactPhase::Exit, &rewards, 0.02), ContactResponse::NONE);
    }
}
