//! CSV run log
//!
//! One file per session, one row per step for the tracked agent plus one
//! row per level event it triggers:
//!
//! ```text
//! time,px,py,event
//! 0.020,-8.000,-3.350,pos
//! 4.180,4.012,-3.350,checkpoint
//! ```

use bevy::prelude::*;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::types::LevelEvent;

pub const RUN_LOG_HEADER: &str = "time,px,py,event";

/// Configuration for run logging
#[derive(Resource, Debug, Clone)]
pub struct RunLogConfig {
    /// Directory for log files
    pub log_dir: PathBuf,
    /// File name prefix
    pub base_name: String,
    /// Whether logging is enabled
    pub enabled: bool,
    /// Agent whose rows are written (None = nothing is logged)
    pub tracked_agent: Option<u32>,
    /// Extra file name suffix, keeps parallel runs from sharing a file
    pub file_tag: Option<String>,
}

impl Default for RunLogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("run_logs"),
            base_name: "run_log".to_string(),
            enabled: true,
            tracked_agent: Some(0),
            file_tag: None,
        }
    }
}

/// Format one CSV row
pub fn format_row(time: f32, position: Vec2, event: LevelEvent) -> String {
    format!("{:.3},{:.3},{:.3},{}", time, position.x, position.y, event.label())
}

/// Active run logger with file handle
#[derive(Resource)]
pub struct RunLogger {
    writer: Option<BufWriter<File>>,
    path: Option<PathBuf>,
    rows: u64,
    config: RunLogConfig,
}

impl RunLogger {
    /// Create a new logger (but don't open file yet)
    pub fn new(config: RunLogConfig) -> Self {
        Self {
            writer: None,
            path: None,
            rows: 0,
            config,
        }
    }

    /// Logger that never opens a file
    pub fn disabled() -> Self {
        Self::new(RunLogConfig {
            enabled: false,
            ..Default::default()
        })
    }

    /// Open `<log_dir>/<base_name>_<timestamp>[_<tag>].csv` and write the header.
    ///
    /// `timestamp` is expected in `%m%d_%H%M%S` form.
    pub fn start_session(&mut self, timestamp: &str) {
        if !self.config.enabled {
            return;
        }

        if let Err(e) = std::fs::create_dir_all(&self.config.log_dir) {
            warn!("Failed to create run log directory: {}", e);
            return;
        }

        let filename = match &self.config.file_tag {
            Some(tag) => format!("{}_{}_{}.csv", self.config.base_name, timestamp, tag),
            None => format!("{}_{}.csv", self.config.base_name, timestamp),
        };
        let path = self.config.log_dir.join(filename);

        match OpenOptions::new().create(true).write(true).truncate(true).open(&path) {
            Ok(file) => {
                let mut writer = BufWriter::new(file);
                if let Err(e) = writeln!(writer, "{}", RUN_LOG_HEADER) {
                    warn!("Failed to write run log header: {}", e);
                    return;
                }
                info!("Run logging started: {}", path.display());
                self.writer = Some(writer);
                self.path = Some(path);
                self.rows = 0;
            }
            Err(e) => {
                warn!("Failed to open run log: {}", e);
            }
        }
    }

    /// Flush and close the current file
    pub fn end_session(&mut self) {
        if let Some(mut writer) = self.writer.take()
            && let Err(e) = writer.flush()
        {
            warn!("Failed to flush run log: {}", e);
        }
    }

    /// Write a row if `agent` is the tracked agent
    pub fn log(&mut self, time: f32, agent: u32, position: Vec2, event: LevelEvent) {
        if self.config.tracked_agent != Some(agent) {
            return;
        }
        let Some(writer) = &mut self.writer else {
            return;
        };

        match writeln!(writer, "{}", format_row(time, position, event)) {
            Ok(()) => self.rows += 1,
            Err(e) => warn!("Failed to write run log row: {}", e),
        }
    }

    pub fn tracked_agent(&self) -> Option<u32> {
        self.config.tracked_agent
    }

    /// Path of the open (or last opened) file
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// Check if logging is active
    pub fn is_active(&self) -> bool {
        self.writer.is_some()
    }
}

impl Default for RunLogger {
    fn default() -> Self {
        Self::new(RunLogConfig::default())
    }
}
