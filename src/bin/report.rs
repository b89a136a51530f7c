//! Report Tool - Summarize training sessions stored in SQLite
//!
//! Prints per-session outcome counts and the latest outcome metrics.
//!
//! Usage:
//!   cargo run --bin report -- db/training.db
//!   cargo run --bin report -- db/training.db --session 3f2a
//!   cargo run --bin report -- db/training.db --limit 5

use std::path::PathBuf;

use ledgejump::storage::{RunDatabase, SessionRow};

struct ReportConfig {
    db_path: PathBuf,
    /// Session id prefix to show (None = all)
    session: Option<String>,
    limit: Option<usize>,
    show_help: bool,
}

impl ReportConfig {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut config = Self {
            db_path: PathBuf::from("db/training.db"),
            session: None,
            limit: None,
            show_help: false,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--session" | "-s" => {
                    if let Some(val) = args.get(i + 1) {
                        config.session = Some(val.clone());
                        i += 1;
                    }
                }
                "--limit" | "-n" => {
                    if let Some(val) = args.get(i + 1) {
                        config.limit = val.parse().ok();
                        i += 1;
                    }
                }
                "--help" | "-h" => config.show_help = true,
                path if !path.starts_with('-') => config.db_path = PathBuf::from(path),
                other => eprintln!("Ignoring unknown argument: {}", other),
            }
            i += 1;
        }
        config
    }
}

fn print_help() {
    println!(
        r#"Ledge Jump Report - Outcome counts and metrics per training session

USAGE:
    cargo run --bin report -- [DB_PATH] [OPTIONS]

OPTIONS:
    -s, --session ID   Only sessions whose id starts with ID
    -n, --limit N      Show at most N sessions (newest first)
    -h, --help         Show this help

DB_PATH defaults to db/training.db
"#
    );
}

fn print_session(db: &RunDatabase, session: &SessionRow) -> rusqlite::Result<()> {
    let counts = db.outcome_counts(&session.id)?;
    let total = counts.total();
    let pct = |n: u64| {
        if total == 0 {
            0.0
        } else {
            100.0 * n as f64 / total as f64
        }
    };

    println!("------------------------------------------------------------");
    println!(
        "Session {}  {}  policy={} course={} seed={}",
        &session.id[..8.min(session.id.len())],
        session.created_at,
        session.policy,
        session.course,
        session.seed
    );
    println!("  Episodes: {}", total);
    println!(
        "  goal {:>5} ({:>5.1}%)  trigger {:>5} ({:>5.1}%)  death {:>5} ({:>5.1}%)  other {:>5}",
        counts.goal,
        pct(counts.goal),
        counts.trigger,
        pct(counts.trigger),
        counts.death,
        pct(counts.death),
        counts.other
    );

    let metrics = db.latest_metrics(&session.id)?;
    if !metrics.is_empty() {
        println!("  Latest metrics:");
        for (name, value) in metrics {
            println!("    {:<24} {:.4}", name, value);
        }
    }
    Ok(())
}

fn main() {
    let config = ReportConfig::from_args();
    if config.show_help {
        print_help();
        return;
    }

    let db = match RunDatabase::open(&config.db_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open {}: {}", config.db_path.display(), e);
            std::process::exit(1);
        }
    };

    let sessions = match db.sessions() {
        Ok(sessions) => sessions,
        Err(e) => {
            eprintln!("Failed to list sessions: {}", e);
            std::process::exit(1);
        }
    };

    let selected: Vec<&SessionRow> = sessions
        .iter()
        .filter(|s| config.session.as_ref().is_none_or(|prefix| s.id.starts_with(prefix.as_str())))
        .take(config.limit.unwrap_or(usize::MAX))
        .collect();

    if selected.is_empty() {
        println!("No training sessions found in {}", config.db_path.display());
        println!("\nTo record sessions, run training with --db:");
        println!("  cargo run --bin ledgejump -- --episodes 100 --db {}", config.db_path.display());
        return;
    }

    println!("{} session(s) in {}", selected.len(), config.db_path.display());
    for session in selected {
        if let Err(e) = print_session(&db, session) {
            eprintln!("Failed to read session {}: {}", session.id, e);
        }
    }
    println!("------------------------------------------------------------");
}
