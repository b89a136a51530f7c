//! SQLite database for training results
//!
//! Stores sessions, every recorded episode and the outcome metric history.
//! Uses WAL mode for concurrent reads during writes.

use rusqlite::{Connection, Result, params};
use std::path::Path;

use crate::episode::EpisodeRecord;
use crate::outcome::{EpisodeOutcome, MetricSample, MetricsSink};

/// Create the directory a database file will live in
pub fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Database wrapper for training results
pub struct RunDatabase {
    conn: Connection,
}

/// Parameters stored with a session
#[derive(Debug, Clone, Default)]
pub struct NewSession<'a> {
    pub policy: &'a str,
    pub course: &'a str,
    pub seed: u64,
    pub outcome_window: usize,
    pub config_json: Option<&'a str>,
}

impl RunDatabase {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for concurrent reads during writes
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                policy TEXT NOT NULL,
                course TEXT NOT NULL,
                seed INTEGER NOT NULL,
                outcome_window INTEGER NOT NULL,
                config_json TEXT
            );

            CREATE TABLE IF NOT EXISTS episodes (
                id INTEGER PRIMARY KEY,
                session_id TEXT REFERENCES sessions(id),
                run INTEGER NOT NULL,
                agent INTEGER NOT NULL,
                episode INTEGER NOT NULL,
                reason TEXT NOT NULL,
                outcome TEXT NOT NULL,
                reward REAL NOT NULL,
                steps INTEGER NOT NULL,
                ended_at REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS metrics (
                id INTEGER PRIMARY KEY,
                session_id TEXT REFERENCES sessions(id),
                run INTEGER NOT NULL,
                episode_index INTEGER NOT NULL,
                name TEXT NOT NULL,
                value REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_episodes_session ON episodes(session_id);
            CREATE INDEX IF NOT EXISTS idx_episodes_outcome ON episodes(session_id, outcome);
            CREATE INDEX IF NOT EXISTS idx_metrics_session ON metrics(session_id, name);
            "#,
        )?;
        Ok(())
    }

    /// Create a new session and return its ID
    pub fn create_session(&self, session: &NewSession<'_>) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.create_session_with_id(&id, session)?;
        Ok(id)
    }

    /// Create a session under an existing ID (e.g. the summary's)
    pub fn create_session_with_id(&self, id: &str, session: &NewSession<'_>) -> Result<()> {
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            r#"INSERT INTO sessions (id, created_at, policy, course, seed, outcome_window, config_json)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            params![
                id,
                created_at,
                session.policy,
                session.course,
                session.seed as i64,
                session.outcome_window as i64,
                session.config_json,
            ],
        )?;
        Ok(())
    }

    /// Insert one episode and return its row ID
    pub fn insert_episode(&self, session_id: &str, run: u32, record: &EpisodeRecord) -> Result<i64> {
        self.conn.execute(
            r#"INSERT INTO episodes
               (session_id, run, agent, episode, reason, outcome, reward, steps, ended_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                session_id,
                run,
                record.agent,
                record.episode,
                record.reason.to_string(),
                record.outcome.to_string(),
                record.reward,
                record.steps,
                record.ended_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert every episode of a run in one transaction
    pub fn insert_episodes(&self, session_id: &str, run: u32, records: &[EpisodeRecord]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for record in records {
            self.insert_episode(session_id, run, record)?;
        }
        tx.commit()
    }

    /// Insert metric samples recorded after the `episode_index`-th episode
    pub fn insert_metrics(
        &self,
        session_id: &str,
        run: u32,
        episode_index: u64,
        samples: &[MetricSample],
    ) -> Result<()> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO metrics (session_id, run, episode_index, name, value) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for sample in samples {
            stmt.execute(params![
                session_id,
                run,
                episode_index as i64,
                sample.name,
                sample.value
            ])?;
        }
        Ok(())
    }

    /// Metrics sink writing into `session_id`/`run`
    pub fn metrics_sink<'a>(&'a self, session_id: &'a str, run: u32) -> DbMetricsSink<'a> {
        DbMetricsSink {
            db: self,
            session_id,
            run,
        }
    }

    /// Get episode count
    pub fn episode_count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM episodes", [], |row| row.get(0))
    }

    /// Get session count
    pub fn session_count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
    }

    /// Episode counts per outcome for a session
    pub fn outcome_counts(&self, session_id: &str) -> Result<OutcomeCounts> {
        let mut stmt = self.conn.prepare(
            "SELECT outcome, COUNT(*) FROM episodes WHERE session_id = ?1 GROUP BY outcome",
        )?;
        let rows = stmt.query_map(params![session_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;

        let mut counts = OutcomeCounts::default();
        for row in rows {
            let (label, count) = row?;
            match EpisodeOutcome::from_label(&label) {
                Some(EpisodeOutcome::Goal) => counts.goal += count,
                Some(EpisodeOutcome::Trigger) => counts.trigger += count,
                Some(EpisodeOutcome::Death) => counts.death += count,
                Some(EpisodeOutcome::Other) | None => counts.other += count,
            }
        }
        Ok(counts)
    }

    /// Most recent value of every metric in a session, sorted by name
    pub fn latest_metrics(&self, session_id: &str) -> Result<Vec<(String, f64)>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT name, value FROM metrics
               WHERE id IN (SELECT MAX(id) FROM metrics WHERE session_id = ?1 GROUP BY name)
               ORDER BY name"#,
        )?;
        let rows = stmt.query_map(params![session_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect()
    }

    /// All sessions, newest first
    pub fn sessions(&self) -> Result<Vec<SessionRow>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT s.id, s.created_at, s.policy, s.course, s.seed,
                      (SELECT COUNT(*) FROM episodes e WHERE e.session_id = s.id)
               FROM sessions s
               ORDER BY s.created_at DESC"#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SessionRow {
                id: row.get(0)?,
                created_at: row.get(1)?,
                policy: row.get(2)?,
                course: row.get(3)?,
                seed: row.get::<_, i64>(4)? as u64,
                episodes: row.get(5)?,
            })
        })?;
        rows.collect()
    }
}

/// [`MetricsSink`] bound to one session and run
pub struct DbMetricsSink<'a> {
    db: &'a RunDatabase,
    session_id: &'a str,
    run: u32,
}

impl MetricsSink for DbMetricsSink<'_> {
    fn push(&mut self, episode: u64, samples: &[MetricSample]) -> std::result::Result<(), String> {
        self.db
            .insert_metrics(self.session_id, self.run, episode, samples)
            .map_err(|e| format!("Failed to store metrics: {}", e))
    }
}

/// Episode counts by outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub goal: u64,
    pub trigger: u64,
    pub death: u64,
    pub other: u64,
}

impl OutcomeCounts {
    pub fn total(&self) -> u64 {
        self.goal + self.trigger + self.death + self.other
    }
}

/// A row of the sessions listing
#[derive(Debug, Clone)]
pub struct SessionRow {
    pub id: String,
    pub created_at: String,
    pub policy: String,
    pub course: String,
    pub seed: u64,
    pub episodes: u64,
}
