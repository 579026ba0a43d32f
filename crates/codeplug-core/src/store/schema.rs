//! SQLite schema for the score store.
//!
//! The schema version lives in `PRAGMA user_version`. Every table beyond the
//! migration ledger is created by a numbered migration, so a fresh database
//! and an old one converge through the same steps.

use rusqlite::{params, Connection};
use tracing::{debug, warn};

use crate::errors::CodeplugResult;

/// Always present; records every migration attempt.
pub const SCHEMA_STATEMENTS: &[&str] = &["CREATE TABLE IF NOT EXISTS migration_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        version INTEGER NOT NULL,
        description TEXT NOT NULL,
        status TEXT NOT NULL,
        error_message TEXT,
        applied_at TEXT DEFAULT CURRENT_TIMESTAMP
    );"];

pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "scores table",
        sql: "CREATE TABLE IF NOT EXISTS scores (
            id TEXT PRIMARY KEY,
            project_hash TEXT NOT NULL,
            score INTEGER NOT NULL CHECK (score BETWEEN 0 AND 100),
            critical INTEGER NOT NULL DEFAULT 0,
            high INTEGER NOT NULL DEFAULT 0,
            medium INTEGER NOT NULL DEFAULT 0,
            low INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );",
    },
    Migration {
        version: 2,
        description: "per-project history index",
        sql: "CREATE INDEX IF NOT EXISTS idx_scores_project_created \
              ON scores(project_hash, created_at);",
    },
];

/// Version reached once every migration has run.
pub const SCHEMA_VERSION: i32 = MIGRATIONS[MIGRATIONS.len() - 1].version;

pub fn init_schema(conn: &Connection) -> CodeplugResult<()> {
    for stmt in SCHEMA_STATEMENTS {
        conn.execute_batch(stmt)?;
    }
    migrate_schema(conn)
}

/// Apply the migrations newer than the stored version, in order.
pub fn migrate_schema(conn: &Connection) -> CodeplugResult<()> {
    let current = schema_version(conn)?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply(conn, migration)?;
    }
    Ok(())
}

pub fn schema_version(conn: &Connection) -> CodeplugResult<i32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// One migration inside its own savepoint. On failure the step is rolled
/// back, the failure recorded, and the error returned.
fn apply(conn: &Connection, migration: &Migration) -> CodeplugResult<()> {
    conn.execute_batch("SAVEPOINT codeplug_migration;")?;
    let step = conn
        .execute_batch(migration.sql)
        .and_then(|_| conn.pragma_update(None, "user_version", migration.version))
        .and_then(|_| log_attempt(conn, migration, "applied", None));

    match step {
        Ok(()) => {
            conn.execute_batch("RELEASE SAVEPOINT codeplug_migration;")?;
            debug!(version = migration.version, migration = migration.description, "schema migrated");
            Ok(())
        }
        Err(e) => {
            conn.execute_batch("ROLLBACK TO SAVEPOINT codeplug_migration; RELEASE SAVEPOINT codeplug_migration;")?;
            warn!(version = migration.version, error = %e, "schema migration failed");
            log_attempt(conn, migration, "failed", Some(&e.to_string()))?;
            Err(e.into())
        }
    }
}

fn log_attempt(
    conn: &Connection,
    migration: &Migration,
    status: &str,
    error: Option<&str>,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO migration_history(version, description, status, error_message) \
         VALUES (?1, ?2, ?3, ?4);",
        params![migration.version, migration.description, status, error],
    )?;
    Ok(())
}
