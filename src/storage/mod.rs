//! Persistent storage for training sessions

mod db;

pub use db::{
    DbMetricsSink, NewSession, OutcomeCounts, RunDatabase, SessionRow, ensure_parent_dir,
};
