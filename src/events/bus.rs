//! Event Bus - level events raised during the current step
//!
//! Contact handlers emit here; `write_run_log` drains the bus at the end of
//! every step. Per-event totals outlive the drain and end up in the session
//! summary.

use bevy::prelude::*;
use std::collections::HashMap;

use super::types::LevelEvent;

/// Level event stamped with the step time and the agent that raised it
#[derive(Debug, Clone)]
pub struct BusEvent {
    /// Simulation time in seconds
    pub time: f32,
    pub agent: u32,
    pub event: LevelEvent,
}

#[derive(Resource, Default)]
pub struct EventBus {
    pending: Vec<BusEvent>,
    counts: HashMap<LevelEvent, u64>,
    /// Stamp for the next emitted event
    now: f32,
    /// Disabled buses drop everything, counts included
    enabled: bool,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    /// Bus that drops every event
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Set the timestamp used for events emitted from now on
    pub fn update_time(&mut self, elapsed_secs: f32) {
        self.now = elapsed_secs;
    }

    pub fn emit(&mut self, agent: u32, event: LevelEvent) {
        if !self.enabled {
            return;
        }
        *self.counts.entry(event).or_insert(0) += 1;
        self.pending.push(BusEvent {
            time: self.now,
            agent,
            event,
        });
    }

    /// Take everything emitted since the last drain, oldest first
    pub fn drain(&mut self) -> Vec<BusEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// How many times `event` was emitted over the bus lifetime
    pub fn count(&self, event: LevelEvent) -> u64 {
        self.counts.get(&event).copied().unwrap_or(0)
    }

    /// Lifetime totals keyed by run log label
    pub fn counts_by_label(&self) -> HashMap<String, u64> {
        self.counts
            .iter()
            .map(|(event, count)| (event.label().to_string(), *count))
            .collect()
    }
}
