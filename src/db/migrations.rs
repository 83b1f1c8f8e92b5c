// src/db/migrations.rs
//
// Schema initialization
//
// The schema lives in schema.sql, embedded at compile time. Versions
// are tracked explicitly; nothing migrates automatically.

use crate::error::{AppError, AppResult};
use rusqlite::Connection;

/// Version this build expects. Bump together with schema.sql and a new
/// arm in initialize_database.
const SCHEMA_VERSION: i32 = 1;

/// Bring the database up to the current schema. Idempotent.
pub fn initialize_database(conn: &Connection) -> AppResult<()> {
    match stored_version(conn)? {
        0 => {
            conn.execute_batch(include_str!("../../schema.sql"))
                .map_err(|e| AppError::Other(format!("initial schema failed: {}", e)))?;
            record_version(conn, SCHEMA_VERSION)
        }
        v if v == SCHEMA_VERSION => Ok(()),
        v if v < SCHEMA_VERSION => Err(AppError::Other(format!(
            "database schema {} predates this build (wants {}); no migration path",
            v, SCHEMA_VERSION
        ))),
        v => Err(AppError::Other(format!(
            "database schema {} is newer than this build (wants {})",
            v, SCHEMA_VERSION
        ))),
    }
}

/// 0 when the version table does not exist yet (fresh file)
fn stored_version(conn: &Connection) -> AppResult<i32> {
    let have_table: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'
         )",
        [],
        |row| row.get(0),
    )?;
    if !have_table {
        return Ok(0);
    }

    let version: Option<i32> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

fn record_version(conn: &Connection, version: i32) -> AppResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Run SQLite's own integrity check
pub fn verify_database_integrity(conn: &Connection) -> AppResult<()> {
    let verdict: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
    if verdict != "ok" {
        return Err(AppError::Other(format!("integrity check: {}", verdict)));
    }
    Ok(())
}

/// Row counts and file size, for diagnostics
#[derive(Debug)]
pub struct DatabaseStats {
    pub size_bytes: i64,
    pub work_count: i64,
    pub mirror_count: i64,
    pub chapter_count: i64,
}

pub fn get_database_stats(conn: &Connection) -> AppResult<DatabaseStats> {
    let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
    let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;

    let count = |table: &str| -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .unwrap_or(0)
    };

    Ok(DatabaseStats {
        size_bytes: page_count * page_size,
        work_count: count("works"),
        mirror_count: count("mirrors"),
        chapter_count: count("chapters"),
    })
}
