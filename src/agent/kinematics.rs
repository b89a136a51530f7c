//! Minimal kinematic stand-in for the host physics
//!
//! Gravity, an Euler step, push-out against solid rectangles along the axis
//! of least penetration, axis-aligned rays and overlap tracking. Just enough
//! to produce the contacts the level reacts to.

use bevy::prelude::*;

use super::components::{Body, Contacts};
use crate::level::{ContactPhase, Solid};

/// Apply gravity and advance the position by one step
pub fn integrate(body: &mut Body, gravity: f32, dt: f32) {
    body.velocity.y -= gravity * dt;
    body.position += body.velocity * dt;
}

/// Push the body out of every solid it penetrates.
///
/// Returns the walls that were penetrated this step.
pub fn resolve_solids(body: &mut Body, solids: &[(Entity, Solid, Rect)]) -> Vec<Entity> {
    let mut walls = Vec::new();

    for (entity, solid, rect) in solids {
        let aabb = body.aabb();
        let overlap_x = aabb.max.x.min(rect.max.x) - aabb.min.x.max(rect.min.x);
        let overlap_y = aabb.max.y.min(rect.max.y) - aabb.min.y.max(rect.min.y);
        if overlap_x <= 0.0 || overlap_y <= 0.0 {
            continue;
        }

        let center = rect.center();
        if overlap_y <= overlap_x {
            if body.position.y >= center.y {
                body.position.y += overlap_y;
                body.velocity.y = body.velocity.y.max(0.0);
            } else {
                body.position.y -= overlap_y;
                body.velocity.y = body.velocity.y.min(0.0);
            }
        } else if body.position.x >= center.x {
            body.position.x += overlap_x;
            body.velocity.x = body.velocity.x.max(0.0);
        } else {
            body.position.x -= overlap_x;
            body.velocity.x = body.velocity.x.min(0.0);
        }

        if *solid == Solid::Wall {
            walls.push(*entity);
        }
    }

    walls
}

/// Zones the body overlaps
pub fn overlapping<T>(body: &Body, zones: &[(Entity, T, Rect)]) -> Vec<Entity> {
    let aabb = body.aabb();
    zones
        .iter()
        .filter(|(_, _, rect)| !aabb.intersect(*rect).is_empty())
        .map(|(entity, _, _)| *entity)
        .collect()
}

/// Downward ray from `origin` hits any rect within `dist`
pub fn ray_down<'a>(origin: Vec2, dist: f32, rects: impl IntoIterator<Item = &'a Rect>) -> bool {
    rects.into_iter().any(|r| {
        r.min.x <= origin.x && origin.x <= r.max.x && r.max.y >= origin.y - dist && r.min.y <= origin.y
    })
}

/// Rightward ray from `origin` hits any rect within `dist`
pub fn ray_right<'a>(origin: Vec2, dist: f32, rects: impl IntoIterator<Item = &'a Rect>) -> bool {
    rects.into_iter().any(|r| {
        r.min.y <= origin.y && origin.y <= r.max.y && r.max.x >= origin.x && r.min.x <= origin.x + dist
    })
}

/// Refresh the velocity estimate from the position delta since last call
pub fn estimate_velocity(body: &mut Body, dt: f32) {
    body.velocity_x = (body.position.x - body.last_position.x) / dt;
    body.last_position = body.position;
}

/// Contact transitions found in one step
#[derive(Debug, Default)]
pub struct ContactChanges {
    pub walls: Vec<(Entity, ContactPhase)>,
    pub entered_zones: Vec<Entity>,
}

/// Compare current overlaps with the previous step and update `contacts`
pub fn diff_contacts(contacts: &mut Contacts, walls_now: Vec<Entity>, zones_now: Vec<Entity>) -> ContactChanges {
    let mut changes = ContactChanges::default();

    for wall in &walls_now {
        let phase = if contacts.walls.contains(wall) {
            ContactPhase::Stay
        } else {
            ContactPhase::Enter
        };
        changes.walls.push((*wall, phase));
    }
    for wall in &contacts.walls {
        if !walls_now.contains(wall) {
            changes.walls.push((*wall, ContactPhase::Exit));
        }
    }

    changes.entered_zones = zones_now
        .iter()
        .filter(|z| !contacts.zones.contains(z))
        .copied()
        .collect();

    contacts.walls = walls_now;
    contacts.zones = zones_now;
    changes
}
