//! Named metric samples and the sink boundary they are pushed through

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Single named numeric metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub name: String,
    pub value: f64,
}

impl MetricSample {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Destination for outcome metrics (time-series store, database, ...)
pub trait MetricsSink {
    /// Push all samples computed after the `episode`-th recorded episode
    fn push(&mut self, episode: u64, samples: &[MetricSample]) -> Result<(), String>;
}

/// One row of the metrics history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsRow {
    pub episode: u64,
    pub samples: Vec<MetricSample>,
}

/// In-memory metrics history kept by the training app
#[derive(Resource, Debug, Clone, Default)]
pub struct MetricsHistory {
    rows: Vec<MetricsRow>,
}

impl MetricsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[MetricsRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Most recent value of a named metric
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.rows
            .last()?
            .samples
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.value)
    }

    /// Replay the whole history into another sink
    pub fn forward_to(&self, sink: &mut dyn MetricsSink) -> Result<(), String> {
        for row in &self.rows {
            sink.push(row.episode, &row.samples)?;
        }
        Ok(())
    }
}

impl MetricsSink for MetricsHistory {
    fn push(&mut self, episode: u64, samples: &[MetricSample]) -> Result<(), String> {
        self.rows.push(MetricsRow {
            episode,
            samples: samples.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_latest() {
        let mut history = MetricsHistory::new();
        assert_eq!(history.latest("goal_rate_overall"), None);

        history
            .push(1, &[MetricSample::new("goal_rate_overall", 1.0)])
            .unwrap();
        history
            .push(2, &[MetricSample::new("goal_rate_overall", 0.5)])
            .unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.latest("goal_rate_overall"), Some(0.5));
        assert_eq!(history.latest("death_rate_overall"), None);
    }

    #[test]
    fn test_forward_to_copies_rows() {
        let mut history = MetricsHistory::new();
        history.push(1, &[MetricSample::new("a", 1.0)]).unwrap();
        history.push(2, &[MetricSample::new("a", 2.0)]).unwrap();

        let mut copy = MetricsHistory::new();
        history.forward_to(&mut copy).unwrap();
        assert_eq!(copy.len(), 2);
        assert_eq!(copy.rows()[1].episode, 2);
    }
}
