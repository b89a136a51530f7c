//! Training session summary generation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::runner::{OutcomeTotals, TrainingResult};
use super::settings::TrainingSettings;
use crate::episode::EpisodeRecord;
use crate::outcome::{OutcomeKind, OutcomeReport};

/// Session summary for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: String,
    pub policy: String,
    pub course: String,
    pub agents: u32,
    pub outcome_window: usize,
    pub base_seed: u64,
    /// Totals summed over every run
    pub totals: OutcomeTotals,
    pub runs: Vec<RunSummary>,
}

/// Summary of a single run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run: u32,
    pub seed: u64,
    pub steps: u64,
    pub elapsed_secs: f32,
    pub completed: bool,
    pub totals: OutcomeTotals,
    pub final_rates: OutcomeReport,
    pub mean_reward: f32,
    pub event_counts: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_log: Option<String>,
    pub episodes: Vec<EpisodeRecord>,
}

impl RunSummary {
    pub fn from_result(result: &TrainingResult) -> Self {
        let mean_reward = if result.records.is_empty() {
            0.0
        } else {
            result.records.iter().map(|r| r.reward).sum::<f32>() / result.records.len() as f32
        };

        Self {
            run: result.run,
            seed: result.seed,
            steps: result.steps,
            elapsed_secs: result.elapsed,
            completed: result.completed,
            totals: result.totals,
            final_rates: result.report,
            mean_reward,
            event_counts: result.event_counts.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            run_log: result
                .run_log
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string()),
            episodes: result.records.clone(),
        }
    }
}

impl SessionSummary {
    /// Create summary from finished runs
    pub fn from_results(
        session_id: &str,
        settings: &TrainingSettings,
        course: &str,
        base_seed: u64,
        results: &[TrainingResult],
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            started_at: chrono::Local::now().to_rfc3339(),
            policy: settings.policy.to_string(),
            course: course.to_string(),
            agents: settings.agents.max(1),
            outcome_window: settings.outcome_window.max(1),
            base_seed,
            totals: OutcomeTotals::merge(results.iter().map(|r| &r.totals)),
            runs: results.iter().map(RunSummary::from_result).collect(),
        }
    }

    /// Write summary to JSON file
    pub fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Read a summary written by [`write_to_file`](Self::write_to_file)
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
    }
}

/// `<root>/session_<YYYYmmdd_HHMMSS>`
pub fn session_dir(root: &Path, timestamp: &str) -> PathBuf {
    root.join(format!("session_{}", timestamp))
}

/// Write `summary.json` into the session directory, creating it if needed
pub fn write_session_summary(summary: &SessionSummary, dir: &Path) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join("summary.json");
    summary.write_to_file(&path)?;
    Ok(path)
}

/// Print session summary to console
pub fn print_session_summary(summary: &SessionSummary) {
    let totals = &summary.totals;

    println!("\n========================================");
    println!("       TRAINING SESSION COMPLETE");
    println!("========================================");
    println!();
    println!("  Course: {}", summary.course);
    println!("  Policy: {} ({} agent(s))", summary.policy, summary.agents);
    println!("  Episodes: {} over {} run(s)", totals.episodes, summary.runs.len());
    println!();
    println!(
        "  OUTCOMES: goal {} | trigger {} | death {} | other {}",
        totals.goal, totals.trigger, totals.death, totals.other
    );
    println!(
        "  RATES:    goal {:.3} | trigger {:.3} | death {:.3}",
        totals.rate(OutcomeKind::Goal),
        totals.rate(OutcomeKind::Trigger),
        totals.rate(OutcomeKind::Death)
    );
    println!();

    for run in &summary.runs {
        let marker = if run.completed { "[DONE]" } else { "[CAPPED]" };
        println!(
            "  Run {}: {} seed {} - {} episodes in {} steps, goal {:.2} (last {} {:.2}), mean reward {:.3}",
            run.run,
            marker,
            run.seed,
            run.totals.episodes,
            run.steps,
            run.final_rates.goal.overall,
            summary.outcome_window,
            run.final_rates.goal.window,
            run.mean_reward,
        );
        if !run.event_counts.is_empty() {
            let events: Vec<String> = run
                .event_counts
                .iter()
                .filter(|(label, _)| label.as_str() != "pos")
                .map(|(label, count)| format!("{} x{}", label, count))
                .collect();
            println!("         events: {}", events.join(", "));
        }
    }

    println!("========================================");
    println!();
}
