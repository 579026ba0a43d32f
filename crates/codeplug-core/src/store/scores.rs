//! SQLite-backed compliance score series.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use tracing::debug;

use crate::errors::{CodeplugError, CodeplugResult};
use crate::models::{ScoreRecord, SeverityBreakdown};
use crate::store::schema;

pub const SCORES_FILE: &str = "scores.db";

/// Score history store. Every call opens its own connection.
pub struct ScoreStore {
    db_path: PathBuf,
}

impl ScoreStore {
    /// Open (creating if needed) the database at `db_path` and migrate it.
    pub fn open(db_path: impl Into<PathBuf>) -> CodeplugResult<Self> {
        let store = Self {
            db_path: db_path.into(),
        };
        if let Some(parent) = store.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = store.connect()?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        schema::init_schema(&conn)?;
        Ok(store)
    }

    /// The store under `<project>/.codeplug/`.
    pub fn for_project(project_root: &Path) -> CodeplugResult<Self> {
        Self::open(super::codeplug_dir(project_root).join(SCORES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> CodeplugResult<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }

    pub fn insert(&self, record: &ScoreRecord) -> CodeplugResult<()> {
        if record.score > 100 {
            return Err(CodeplugError::schema(
                SCORES_FILE,
                format!("score {} out of range", record.score),
            ));
        }
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO scores(id, project_hash, score, critical, high, medium, low, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                record.id,
                record.project_hash,
                record.score,
                record.breakdown.critical,
                record.breakdown.high,
                record.breakdown.medium,
                record.breakdown.low,
                record.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;
        debug!(project = %record.project_hash, score = record.score, "score recorded");
        Ok(())
    }

    /// The most recent `limit` records of a project, oldest first.
    pub fn history(&self, project_hash: &str, limit: usize) -> CodeplugResult<Vec<ScoreRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_hash, score, critical, high, medium, low, created_at \
             FROM scores WHERE project_hash = ?1 \
             ORDER BY created_at DESC, rowid DESC LIMIT ?2;",
        )?;
        let rows = stmt.query_map(params![project_hash, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                SeverityBreakdown {
                    critical: row.get(3)?,
                    high: row.get(4)?,
                    medium: row.get(5)?,
                    low: row.get(6)?,
                },
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, project_hash, score, breakdown, created_at) = row?;
            records.push(validate_row(id, project_hash, score, breakdown, &created_at)?);
        }
        records.reverse();
        Ok(records)
    }
}

fn validate_row(
    id: String,
    project_hash: String,
    score: i64,
    breakdown: SeverityBreakdown,
    created_at: &str,
) -> CodeplugResult<ScoreRecord> {
    if !(0..=100).contains(&score) {
        return Err(CodeplugError::schema(
            SCORES_FILE,
            format!("record {id}: score {score} out of range"),
        ));
    }
    let created_at = DateTime::parse_from_rfc3339(created_at)
        .map_err(|e| CodeplugError::schema(SCORES_FILE, format!("record {id}: {e}")))?
        .with_timezone(&Utc);
    Ok(ScoreRecord {
        id,
        project_hash,
        score: score as u32,
        breakdown,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(id: &str, project: &str, score: u32, days: i64) -> ScoreRecord {
        let base = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        ScoreRecord {
            id: id.into(),
            project_hash: project.into(),
            score,
            breakdown: SeverityBreakdown {
                critical: 0,
                high: 1,
                medium: 0,
                low: 2,
            },
            created_at: base + Duration::days(days),
        }
    }

    #[test]
    fn test_insert_and_history_order() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ScoreStore::for_project(tmp.path()).unwrap();
        assert!(store.path().ends_with(".codeplug/scores.db"));
        for i in 0..5 {
            store.insert(&record(&format!("r{i}"), "abc", 60 + i as u32, i)).unwrap();
        }
        store.insert(&record("other", "def", 10, 9)).unwrap();

        let history = store.history("abc", 3).unwrap();
        let ids: Vec<&str> = history.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r3", "r4"]);
        assert_eq!(history[2].breakdown.low, 2);
        assert!(store.history("zzz", 3).unwrap().is_empty());
    }

    #[test]
    fn test_reopen_keeps_records() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/scores.db");
        ScoreStore::open(&path).unwrap().insert(&record("a", "p", 90, 0)).unwrap();
        let history = ScoreStore::open(&path).unwrap().history("p", 8).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].score, 90);
    }

    #[test]
    fn test_corrupt_timestamp_is_schema_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ScoreStore::for_project(tmp.path()).unwrap();
        let conn = Connection::open(store.path()).unwrap();
        conn.execute(
            "INSERT INTO scores(id, project_hash, score, created_at) VALUES ('x', 'p', 50, 'yesterday');",
            [],
        )
        .unwrap();
        assert!(matches!(
            store.history("p", 8),
            Err(CodeplugError::Schema { .. })
        ));
    }
}
