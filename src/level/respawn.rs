//! Respawn point and the shared checkpoint latch

use bevy::prelude::*;

use crate::agent::{Body, Contacts};

/// Where agents are placed when an episode begins
#[derive(Resource, Debug, Clone)]
pub struct RespawnPoint {
    initial: Vec2,
    current: Vec2,
}

impl RespawnPoint {
    pub fn new(initial: Vec2) -> Self {
        Self {
            initial,
            current: initial,
        }
    }

    pub fn set_checkpoint(&mut self, position: Vec2) {
        self.current = position;
    }

    /// Back to the initial spawn
    pub fn reset(&mut self) {
        self.current = self.initial;
    }

    pub fn current(&self) -> Vec2 {
        self.current
    }

    pub fn initial(&self) -> Vec2 {
        self.initial
    }

    /// Stop the body and move it to the current respawn position
    pub fn respawn(&self, body: &mut Body, contacts: &mut Contacts) {
        body.teleport(self.current);
        contacts.clear();
    }
}

/// Set once any one-time checkpoint fires; shared by every checkpoint and
/// every agent, cleared when an episode begins.
#[derive(Resource, Debug, Default)]
pub struct CheckpointLatch {
    pub activated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_then_reset() {
        let mut respawn = RespawnPoint::new(Vec2::new(-8.0, -3.35));
        respawn.set_checkpoint(Vec2::new(4.0, -3.0));
        assert_eq!(respawn.current(), Vec2::new(4.0, -3.0));
        respawn.reset();
        assert_eq!(respawn.current(), respawn.initial());
    }

    #[test]
    fn test_respawn_stops_body() {
        let respawn = RespawnPoint::new(Vec2::new(1.0, 2.0));
        let mut body = Body::at(Vec2::new(9.0, -4.0));
        body.velocity = Vec2::new(4.0, -7.0);
        let mut contacts = Contacts::default();
        respawn.respawn(&mut body, &mut contacts);
        assert_eq!(body.position, Vec2::new(1.0, 2.0));
        assert_eq!(body.velocity, Vec2::ZERO);
    }
}
