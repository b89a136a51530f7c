//! Episode outcome statistics
//!
//! Counts goal / trigger / death endings over the whole run and over a
//! trailing window, and exposes them as named metrics.

mod metrics;
mod tracker;
mod window;

pub use metrics::{MetricSample, MetricsHistory, MetricsRow, MetricsSink};
pub use tracker::{EpisodeGuard, EpisodeOutcome, KindRates, OutcomeKind, OutcomeReport, OutcomeTracker};
pub use window::RollingWindow;
