//! Level event logging
//!
//! Contact handlers emit [`LevelEvent`]s to the [`EventBus`]; the run log
//! system writes them, together with a position row every step, to a CSV
//! file through the [`RunLogger`].

mod bus;
mod run_log;
mod types;

pub use bus::{BusEvent, EventBus};
pub use run_log::{RUN_LOG_HEADER, RunLogConfig, RunLogger, format_row};
pub use types::LevelEvent;
