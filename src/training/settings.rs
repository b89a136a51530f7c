//! Training run settings
//!
//! Resolution order: `config/training_settings.json` (untracked), then the
//! tracked template next to it, then built-in defaults. Command line flags
//! are applied on top of whichever file won.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::agent::PolicyKind;
use crate::constants::*;
use crate::episode::RewardConfig;
use crate::level::DEFAULT_COURSE_FILE;

/// Path to local settings file (gitignored)
pub const SETTINGS_FILE: &str = "config/training_settings.json";
/// Path to template file (tracked in git)
pub const TEMPLATE_FILE: &str = "config/training_settings.template.json";

/// Training run settings
#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSettings {
    /// Episodes to record per run (pooled across agents)
    pub episodes: u32,
    /// Agents sharing one course and one outcome tracker
    pub agents: u32,
    /// Per-episode step limit (0 = unlimited)
    pub max_steps: u32,
    /// Hard cap on simulation steps per run
    pub max_total_steps: u64,
    /// Trailing window size for outcome rates
    pub outcome_window: usize,

    /// Action source for every agent
    pub policy: PolicyKind,
    /// Jump probability per step for the random policy
    pub jump_chance: f64,
    /// RNG seed for determinism (null = random)
    pub seed: Option<u64>,

    /// Simulation step in seconds
    pub fixed_dt: f32,
    pub gravity: f32,
    pub move_speed: f32,
    pub jump_power: f32,
    pub rewards: RewardConfig,

    /// Course layout file (TOML)
    pub course: String,

    /// Write the CSV run log
    pub log_runs: bool,
    pub log_dir: String,
    /// Agent whose position and events are logged (null = none)
    pub tracked_agent: Option<u32>,
    /// Directory for session summaries
    pub session_dir: String,

    /// SQLite database for results (null = don't persist)
    pub db_path: Option<String>,

    /// Independent runs (different seeds, separate trackers)
    pub runs: u32,
    /// Execute runs concurrently
    pub parallel: bool,
    /// Rayon threads (0 = auto-detect)
    pub threads: usize,

    /// Suppress per-episode progress output
    pub quiet: bool,
    /// Print a progress line every N recorded episodes (0 = never)
    pub progress_every: u64,

    /// Write the effective settings back to the local file (`--save`)
    #[serde(skip)]
    pub save_requested: bool,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            episodes: 100,
            agents: 1,
            max_steps: 1500,
            max_total_steps: 1_000_000,
            outcome_window: DEFAULT_OUTCOME_WINDOW,
            policy: PolicyKind::Scripted,
            jump_chance: 0.1,
            seed: None,
            fixed_dt: FIXED_DT,
            gravity: GRAVITY,
            move_speed: MOVE_SPEED,
            jump_power: JUMP_POWER,
            rewards: RewardConfig::default(),
            course: DEFAULT_COURSE_FILE.to_string(),
            log_runs: true,
            log_dir: "run_logs".to_string(),
            tracked_agent: Some(0),
            session_dir: "training_logs".to_string(),
            db_path: None,
            runs: 1,
            parallel: false,
            threads: 0,
            quiet: false,
            progress_every: 25,
            save_requested: false,
        }
    }
}

impl TrainingSettings {
    /// Parse settings JSON; missing fields take their defaults
    pub fn parse(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| format!("Failed to parse settings: {}", e))
    }

    /// Load settings with priority: local file > template > defaults
    pub fn load() -> Self {
        Self::load_from(Path::new(SETTINGS_FILE), Path::new(TEMPLATE_FILE))
    }

    /// Same as [`load`](Self::load) with explicit file locations
    pub fn load_from(local_path: &Path, template_path: &Path) -> Self {
        for path in [local_path, template_path] {
            if !path.exists() {
                continue;
            }
            match fs::read_to_string(path) {
                Ok(content) => match Self::parse(&content) {
                    Ok(settings) => {
                        info!("Loaded training settings from {}", path.display());
                        return settings;
                    }
                    Err(e) => warn!("{} ({})", e, path.display()),
                },
                Err(e) => warn!("Failed to read {}: {}", path.display(), e),
            }
        }

        info!("No training settings found, using defaults");
        Self::default()
    }

    /// Persist to the local settings file
    pub fn save(&self) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = Path::new(SETTINGS_FILE).parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(SETTINGS_FILE, json)?;
        info!("Saved training settings to {}", SETTINGS_FILE);
        Ok(())
    }

    /// Apply CLI argument overrides (`args[0]` is the program name)
    pub fn apply_cli_overrides(&mut self, args: &[String]) {
        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--episodes" | "-n" => {
                    if let Some(val) = args.get(i + 1) {
                        if let Ok(n) = val.parse() {
                            self.episodes = n;
                        }
                        i += 1;
                    }
                }
                "--agents" | "-a" => {
                    if let Some(val) = args.get(i + 1) {
                        if let Ok(n) = val.parse() {
                            self.agents = n;
                        }
                        i += 1;
                    }
                }
                "--max-steps" => {
                    if let Some(val) = args.get(i + 1) {
                        if let Ok(n) = val.parse() {
                            self.max_steps = n;
                        }
                        i += 1;
                    }
                }
                "--window" | "-w" => {
                    if let Some(val) = args.get(i + 1) {
                        if let Ok(n) = val.parse() {
                            self.outcome_window = n;
                        }
                        i += 1;
                    }
                }
                "--policy" | "-p" => {
                    if let Some(val) = args.get(i + 1) {
                        match PolicyKind::parse(val) {
                            Some(kind) => self.policy = kind,
                            None => eprintln!("Unknown policy '{}', keeping {}", val, self.policy),
                        }
                        i += 1;
                    }
                }
                "--seed" | "-s" => {
                    if let Some(val) = args.get(i + 1) {
                        if let Ok(n) = val.parse() {
                            self.seed = Some(n);
                        }
                        i += 1;
                    }
                }
                "--course" | "-c" => {
                    if let Some(val) = args.get(i + 1) {
                        self.course = val.clone();
                        i += 1;
                    }
                }
                "--db" => {
                    if let Some(val) = args.get(i + 1) {
                        self.db_path = Some(val.clone());
                        i += 1;
                    }
                }
                "--runs" | "-r" => {
                    if let Some(val) = args.get(i + 1) {
                        if let Ok(n) = val.parse() {
                            self.runs = n;
                        }
                        i += 1;
                    }
                }
                "--threads" => {
                    if let Some(val) = args.get(i + 1) {
                        if let Ok(n) = val.parse() {
                            self.threads = n;
                        }
                        i += 1;
                    }
                }
                "--parallel" => self.parallel = true,
                "--no-log" => self.log_runs = false,
                "--quiet" | "-q" => self.quiet = true,
                "--save" => self.save_requested = true,
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                other => eprintln!("Ignoring unknown argument: {}", other),
            }
            i += 1;
        }
    }

    /// Load settings and apply CLI overrides
    pub fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut settings = Self::load();
        settings.apply_cli_overrides(&args);
        settings
    }

    /// Seed from settings, or a fresh random one
    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    pub fn course_path(&self) -> PathBuf {
        PathBuf::from(&self.course)
    }
}

fn print_help() {
    println!(
        r#"Ledge Jump Training - Headless episodes with outcome tracking

USAGE:
    cargo run --bin ledgejump [OPTIONS]

OPTIONS:
    -n, --episodes N      Episodes to record per run (default: 100)
    -a, --agents N        Agents sharing one course and tracker (default: 1)
    --max-steps N         Per-episode step limit, 0 = unlimited (default: 1500)
    -w, --window N        Trailing window for outcome rates (default: 100)
    -p, --policy NAME     scripted, random, idle or run_right (default: scripted)
    -s, --seed N          RNG seed for determinism (default: random)
    -c, --course PATH     Course layout file (default: assets/courses/level1.toml)
    --db PATH             Store results in a SQLite database
    -r, --runs N          Independent runs with consecutive seeds (default: 1)
    --parallel            Execute runs concurrently
    --threads N           Worker threads for --parallel, 0 = auto (default: 0)
    --no-log              Don't write CSV run logs
    -q, --quiet           Only print the final summary
    --save                Write the effective settings to the local file
    -h, --help            Show this help

SETTINGS FILES:
    config/training_settings.json          Local settings (gitignored)
    config/training_settings.template.json Template with defaults (tracked)

    CLI arguments override file settings.
"#
    );
}
