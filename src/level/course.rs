//! Course layouts
//!
//! Courses are TOML files describing the spawn point and every level element.
//! Rectangles are given by centre and size.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::components::{Collider, Solid, Zone};
use crate::constants::DEFAULT_SPAWN;

/// Path to the default course file
pub const DEFAULT_COURSE_FILE: &str = "assets/courses/level1.toml";

/// Plain rectangle
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AreaDef {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl AreaDef {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn collider(&self) -> Collider {
        Collider::from_center_size(Vec2::new(self.x, self.y), Vec2::new(self.width, self.height))
    }
}

/// Hazard placement
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HazardDef {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub is_bug: bool,
}

/// Checkpoint placement
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CheckpointDef {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_true")]
    pub one_time: bool,
    #[serde(default)]
    pub is_bug: bool,
}

/// Special trigger zone placement
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TriggerDef {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_true")]
    pub ends_episode: bool,
}

fn default_true() -> bool {
    true
}

fn area(x: f32, y: f32, width: f32, height: f32) -> Collider {
    AreaDef::new(x, y, width, height).collider()
}

/// Complete course definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDef {
    pub name: String,
    pub spawn: [f32; 2],
    pub goal: AreaDef,
    #[serde(default)]
    pub ground: Vec<AreaDef>,
    #[serde(default)]
    pub walls: Vec<AreaDef>,
    #[serde(default)]
    pub hazards: Vec<HazardDef>,
    #[serde(default)]
    pub checkpoints: Vec<CheckpointDef>,
    #[serde(default)]
    pub triggers: Vec<TriggerDef>,
}

impl Default for CourseDef {
    fn default() -> Self {
        Self::default_course()
    }
}

impl CourseDef {
    /// Built-in course: flat run with a spike, a checkpoint, two bugged
    /// elements, an exploit trigger above the start and the goal at the end.
    pub fn default_course() -> Self {
        Self {
            name: "Level 1".to_string(),
            spawn: [DEFAULT_SPAWN.x, DEFAULT_SPAWN.y],
            goal: AreaDef::new(10.0, -3.0, 1.0, 2.0),
            ground: vec![AreaDef::new(0.5, -4.3, 23.0, 1.0)],
            walls: vec![AreaDef::new(-11.5, 0.0, 1.0, 10.0)],
            hazards: vec![
                HazardDef {
                    x: -3.0,
                    y: -3.4,
                    width: 0.4,
                    height: 0.8,
                    is_bug: false,
                },
                HazardDef {
                    x: 6.0,
                    y: -3.4,
                    width: 0.4,
                    height: 0.8,
                    is_bug: true,
                },
            ],
            checkpoints: vec![
                CheckpointDef {
                    x: 4.0,
                    y: -3.0,
                    width: 0.5,
                    height: 2.0,
                    one_time: true,
                    is_bug: false,
                },
                CheckpointDef {
                    x: 8.0,
                    y: -3.0,
                    width: 0.5,
                    height: 2.0,
                    one_time: true,
                    is_bug: true,
                },
            ],
            triggers: vec![TriggerDef {
                x: -6.5,
                y: -1.6,
                width: 0.6,
                height: 0.6,
                ends_episode: true,
            }],
        }
    }

    /// Parse a course from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        let course: Self =
            toml::from_str(content).map_err(|e| format!("Failed to parse course: {}", e))?;
        course.validate()?;
        Ok(course)
    }

    /// Load a course from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::parse(&content).map_err(|e| format!("{} ({})", e, path.display()))
    }

    /// Load a course, falling back to the built-in one on error
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from_file(path) {
            Ok(course) => {
                info!("Loaded course '{}' from {}", course.name, path.display());
                course
            }
            Err(e) => {
                warn!("{}, using built-in course", e);
                Self::default_course()
            }
        }
    }

    fn validate(&self) -> Result<(), String> {
        let all_areas = std::iter::once((self.goal.width, self.goal.height))
            .chain(self.ground.iter().map(|a| (a.width, a.height)))
            .chain(self.walls.iter().map(|a| (a.width, a.height)))
            .chain(self.hazards.iter().map(|a| (a.width, a.height)))
            .chain(self.checkpoints.iter().map(|a| (a.width, a.height)))
            .chain(self.triggers.iter().map(|a| (a.width, a.height)));

        for (width, height) in all_areas {
            if width <= 0.0 || height <= 0.0 {
                return Err(format!(
                    "Course '{}' has an area with non-positive size {}x{}",
                    self.name, width, height
                ));
            }
        }
        Ok(())
    }

    pub fn spawn_position(&self) -> Vec2 {
        Vec2::new(self.spawn[0], self.spawn[1])
    }

    pub fn goal_x(&self) -> f32 {
        self.goal.x
    }

    /// Spawn every level element as an entity
    pub fn spawn(&self, commands: &mut Commands) {
        for ground in &self.ground {
            commands.spawn((Solid::Ground, ground.collider()));
        }
        for wall in &self.walls {
            commands.spawn((Solid::Wall, wall.collider()));
        }
        commands.spawn((Zone::Goal, self.goal.collider()));
        for h in &self.hazards {
            commands.spawn((
                Zone::Hazard { is_bug: h.is_bug },
                area(h.x, h.y, h.width, h.height),
            ));
        }
        for c in &self.checkpoints {
            commands.spawn((
                Zone::Checkpoint {
                    one_time: c.one_time,
                    is_bug: c.is_bug,
                },
                area(c.x, c.y, c.width, c.height),
            ));
        }
        for t in &self.triggers {
            commands.spawn((
                Zone::Trigger {
                    ends_episode: t.ends_episode,
                },
                area(t.x, t.y, t.width, t.height),
            ));
        }
    }
}

/// Course the training app was built with
#[derive(Resource, Debug, Clone)]
pub struct ActiveCourse(pub CourseDef);

/// Startup system spawning the active course
pub fn spawn_course(mut commands: Commands, course: Res<ActiveCourse>) {
    course.0.spawn(&mut commands);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_course() {
        let toml = r#"
name = "Flat"
spawn = [0.0, 0.45]
goal = { x = 5.0, y = 1.0, width = 1.0, height = 2.0 }

[[ground]]
x = 0.0
y = -0.5
width = 20.0
height = 1.0

[[hazards]]
x = 2.0
y = 0.4
width = 0.4
height = 0.8
is_bug = true

[[checkpoints]]
x = 3.0
y = 1.0
width = 0.5
height = 2.0
"#;
        let course = CourseDef::parse(toml).unwrap();
        assert_eq!(course.name, "Flat");
        assert_eq!(course.spawn_position(), Vec2::new(0.0, 0.45));
        assert_eq!(course.ground.len(), 1);
        assert!(course.hazards[0].is_bug);
        // one_time defaults on, is_bug off
        assert!(course.checkpoints[0].one_time);
        assert!(!course.checkpoints[0].is_bug);
        assert!(course.triggers.is_empty());
    }

    #[test]
    fn test_rejects_degenerate_area() {
        let toml = r#"
name = "Broken"
spawn = [0.0, 0.0]
goal = { x = 5.0, y = 1.0, width = 0.0, height = 2.0 }
"#;
        let err = CourseDef::parse(toml).unwrap_err();
        assert!(err.contains("non-positive"));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let course = CourseDef::load_or_default(Path::new("does/not/exist.toml"));
        assert_eq!(course.name, "Level 1");
    }

    #[test]
    fn test_shipped_course_matches_builtin() {
        let shipped = CourseDef::load_from_file(Path::new(DEFAULT_COURSE_FILE)).unwrap();
        let builtin = CourseDef::default_course();
        assert_eq!(shipped.name, builtin.name);
        assert_eq!(shipped.spawn, builtin.spawn);
        assert_eq!(shipped.goal_x(), builtin.goal_x());
        assert_eq!(shipped.hazards.len(), 2);
        assert!(shipped.hazards[1].is_bug);
        assert!(shipped.checkpoints[1].is_bug);
        assert!(shipped.triggers[0].ends_episode);
    }

    #[test]
    fn test_default_course_spawn_rests_on_ground() {
        let course = CourseDef::default_course();
        let ground_top = course.ground[0].y + course.ground[0].height / 2.0;
        let feet = course.spawn[1] - crate::constants::PLAYER_SIZE.y / 2.0;
        assert!((feet - ground_top).abs() < 1e-4);
    }
}
