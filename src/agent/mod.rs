//! Agent body, sensing, kinematics and policies

mod components;
pub mod kinematics;
mod policy;

pub use components::{AgentId, Body, Contacts, Player, Sensors};
pub use policy::{Brain, ConstantPolicy, Policy, PolicyKind, RandomPolicy, ScriptedPolicy};
