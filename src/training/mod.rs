//! Headless training: settings, the per-step systems, run drivers and
//! session summaries

mod app_builder;
mod parallel;
mod runner;
mod session;
mod settings;
mod systems;

pub use app_builder::TrainingAppBuilder;
pub use parallel::{init_parallel, parallel_specs, run_parallel};
pub use runner::{OutcomeTotals, RunSpec, SEED_STRIDE, TrainingResult, run_sequential, run_training};
pub use session::{
    RunSummary, SessionSummary, print_session_summary, session_dir, write_session_summary,
};
pub use settings::{SETTINGS_FILE, TEMPLATE_FILE, TrainingSettings};
pub use systems::{AgentPhysics, Decision, StepClock, TrainingControl};
