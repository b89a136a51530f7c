//! Parallel training runs
//!
//! Uses Rayon to run several independent training runs concurrently.
//! Each run lives in its own Bevy app with minimal threading and its own
//! outcome tracker; results are only combined for reporting.

use bevy::prelude::*;
use rayon::prelude::*;

use super::runner::{RunSpec, SEED_STRIDE, TrainingResult, run_training};
use super::settings::TrainingSettings;
use crate::level::CourseDef;

/// Initialize parallel execution with the given thread count.
/// Call this once at startup before running parallel runs.
pub fn init_parallel(threads: usize) {
    if threads == 0 {
        // Rayon's default (auto-detect)
        return;
    }
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        warn!("Failed to initialize Rayon thread pool: {}", e);
    }
}

/// Run specs for `settings.runs` parallel runs
pub fn parallel_specs(settings: &TrainingSettings, base_seed: u64) -> Vec<RunSpec> {
    let runs = settings.runs.max(1);
    (0..runs)
        .map(|i| RunSpec {
            index: i,
            seed: base_seed.wrapping_add(u64::from(i) * SEED_STRIDE),
            tag_log: runs > 1,
            log_plugin: false,
            minimal_threads: true,
        })
        .collect()
}

/// Run `settings.runs` runs in parallel
///
/// Returns results in run order.
pub fn run_parallel(settings: &TrainingSettings, course: &CourseDef, base_seed: u64) -> Vec<TrainingResult> {
    parallel_specs(settings, base_seed)
        .into_par_iter()
        .map(|spec| run_training(settings, course, spec))
        .collect()
}
