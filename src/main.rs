//! Ledge Jump training runner
//!
//! Runs headless training episodes on a course, tracks how they end, writes
//! CSV run logs, a JSON session summary and optionally a SQLite database.
//!
//! Usage:
//!   cargo run --bin ledgejump -- --help
//!   cargo run --bin ledgejump -- --episodes 200 --policy random --seed 7
//!   cargo run --bin ledgejump -- --runs 8 --parallel --no-log --db db/training.db

use std::path::Path;

use ledgejump::MetricsSink;
use ledgejump::level::CourseDef;
use ledgejump::storage::{NewSession, RunDatabase, ensure_parent_dir};
use ledgejump::training::{
    SessionSummary, TrainingResult, TrainingSettings, init_parallel, print_session_summary,
    run_parallel, run_sequential, session_dir, write_session_summary,
};

fn store_results(
    db_path: &str,
    summary: &SessionSummary,
    settings: &TrainingSettings,
    results: &[TrainingResult],
) -> rusqlite::Result<()> {
    if let Err(e) = ensure_parent_dir(Path::new(db_path)) {
        eprintln!("Failed to create the directory for {}: {}", db_path, e);
    }
    let db = RunDatabase::open(Path::new(db_path))?;
    let config_json = serde_json::to_string(settings).ok();
    db.create_session_with_id(&summary.session_id, &NewSession {
        policy: &summary.policy,
        course: &summary.course,
        seed: summary.base_seed,
        outcome_window: summary.outcome_window,
        config_json: config_json.as_deref(),
    })?;

    for result in results {
        db.insert_episodes(&summary.session_id, result.run, &result.records)?;
        let mut sink = db.metrics_sink(&summary.session_id, result.run);
        for row in &result.metrics {
            if let Err(e) = sink.push(row.episode, &row.samples) {
                eprintln!("{}", e);
            }
        }
    }
    Ok(())
}

fn main() {
    let settings = TrainingSettings::from_args();
    if settings.save_requested
        && let Err(e) = settings.save()
    {
        eprintln!("Failed to save settings: {}", e);
    }
    let course = CourseDef::load_or_default(&settings.course_path());
    let base_seed = settings.resolved_seed();
    let session_id = uuid::Uuid::new_v4().to_string();

    println!(
        "Training '{}' with {} policy: {} episode(s) x {} run(s), {} agent(s), seed {}",
        course.name,
        settings.policy,
        settings.episodes,
        settings.runs.max(1),
        settings.agents.max(1),
        base_seed
    );

    let results = if settings.parallel && settings.runs > 1 {
        init_parallel(settings.threads);
        run_parallel(&settings, &course, base_seed)
    } else {
        run_sequential(&settings, &course, base_seed)
    };

    let summary = SessionSummary::from_results(&session_id, &settings, &course.name, base_seed, &results);

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let dir = session_dir(Path::new(&settings.session_dir), &timestamp);
    match write_session_summary(&summary, &dir) {
        Ok(path) => println!("\nSession summary written to: {}", path.display()),
        Err(e) => eprintln!("Failed to write session summary: {}", e),
    }

    if let Some(db_path) = &settings.db_path {
        match store_results(db_path, &summary, &settings, &results) {
            Ok(()) => println!("Results stored in {} (session {})", db_path, &session_id[..8]),
            Err(e) => eprintln!("Failed to store results in {}: {}", db_path, e),
        }
    }

    print_session_summary(&summary);
}
