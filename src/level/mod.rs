//! Level elements: course layout, goal, hazards, checkpoints, walls, triggers

mod components;
mod course;
mod respawn;
mod triggers;

pub use components::{Collider, Solid, Zone};
pub use course::{
    ActiveCourse, AreaDef, CheckpointDef, CourseDef, DEFAULT_COURSE_FILE, HazardDef, TriggerDef,
    spawn_course,
};
pub use respawn::{CheckpointLatch, RespawnPoint};
pub use triggers::{ContactPhase, ContactResponse, on_wall_contact, on_zone_enter};
