//! Directory-driven schema migrations.
//!
//! RULES:
//!   - Files apply in ascending file-name order, one at a time.
//!   - A file name is recorded in `_migrations` exactly once, in the same
//!     transaction as its statements. A failed file leaves no trace.
//!   - Files committed before a failure stay applied; the next run skips
//!     them and retries from the failed file.
//!
//! Statements are found by splitting the file on `;`. A `;` inside a string
//! literal or a trigger body therefore splits the statement, and a fragment
//! that begins with a `--` line is dropped whole, including any SQL after
//! the comment. Keep migration files free of both.

use crate::{
    error::{SimError, SimResult},
    types::utc_timestamp,
};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};

const BOOKKEEPING_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS _migrations \
     (id INTEGER PRIMARY KEY, name TEXT UNIQUE NOT NULL, appliedAt TEXT NOT NULL)";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRecord {
    pub id:         i64,
    pub name:       String,
    pub applied_at: String,
}

/// Split a migration file into executable statements.
pub fn split_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with("--"))
        .collect()
}

/// `*.sql` files in `dir`, sorted by file name.
pub fn sql_files(dir: &Path) -> SimResult<Vec<(String, PathBuf)>> {
    let entries = std::fs::read_dir(dir).map_err(|e| SimError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SimError::io(dir, e))?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if name.ends_with(".sql") {
            files.push((name, entry.path()));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

fn is_applied(conn: &Connection, name: &str) -> SimResult<bool> {
    let found = conn
        .query_row(
            "SELECT name FROM _migrations WHERE name = ?1",
            params![name],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn apply_one(conn: &Connection, name: &str, sql: &str) -> rusqlite::Result<()> {
    // Dropping the transaction on an early return rolls it back.
    let tx = conn.unchecked_transaction()?;
    for statement in split_statements(sql) {
        tx.execute_batch(statement)?;
    }
    tx.execute(
        "INSERT INTO _migrations (name, appliedAt) VALUES (?1, ?2)",
        params![name, utc_timestamp()],
    )?;
    tx.commit()
}

/// Bring the database up to date with the migrations in `dir`.
pub fn apply_migrations(conn: &Connection, dir: &Path) -> SimResult<MigrationReport> {
    conn.execute_batch(BOOKKEEPING_TABLE_SQL)?;

    let mut report = MigrationReport::default();
    for (name, path) in sql_files(dir)? {
        if is_applied(conn, &name)? {
            log::info!("Migration already applied: {name}");
            report.skipped.push(name);
            continue;
        }

        let sql = std::fs::read_to_string(&path).map_err(|e| SimError::io(&path, e))?;
        log::info!("Applying migration: {name}");
        if let Err(source) = apply_one(conn, &name, &sql) {
            log::error!("Migration failed: {name}: {source}");
            return Err(SimError::Migration { name, source });
        }
        log::info!("Migration applied successfully: {name}");
        report.applied.push(name);
    }
    Ok(report)
}

/// Bookkeeping rows in application order.
pub fn applied_migrations(conn: &Connection) -> SimResult<Vec<MigrationRecord>> {
    let mut stmt = conn.prepare("SELECT id, name, appliedAt FROM _migrations ORDER BY id ASC")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MigrationRecord {
                id:         row.get(0)?,
                name:       row.get(1)?,
                applied_at: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Run every seed file in `dir` as one batch. Seeds are not tracked, so
/// seed SQL has to tolerate running on every start.
pub fn apply_seeds(conn: &Connection, dir: &Path) -> SimResult<Vec<String>> {
    let mut applied = Vec::new();
    for (name, path) in sql_files(dir)? {
        log::info!("Applying seed: {name}");
        let sql = std::fs::read_to_string(&path).map_err(|e| SimError::io(&path, e))?;
        conn.execute_batch(&sql)?;
        applied.push(name);
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_semicolons_and_drops_empty_fragments() {
        let sql = "CREATE TABLE a (x INTEGER);\n\n  CREATE TABLE b (y TEXT) ;\n;";
        assert_eq!(
            split_statements(sql),
            vec!["CREATE TABLE a (x INTEGER)", "CREATE TABLE b (y TEXT)"]
        );
    }

    #[test]
    fn fragment_starting_with_comment_is_dropped() {
        let sql = "-- only a comment;\nCREATE TABLE a (x INTEGER);";
        assert_eq!(split_statements(sql), vec!["CREATE TABLE a (x INTEGER)"]);
        // The comment swallows the statement that follows it in the same fragment.
        let sql = "-- header\nCREATE TABLE a (x INTEGER);";
        assert!(split_statements(sql).is_empty());
    }

    #[test]
    fn semicolon_inside_literal_is_mis_split() {
        let sql = "INSERT INTO t VALUES ('a;b');";
        assert_eq!(split_statements(sql), vec!["INSERT INTO t VALUES ('a", "b')"]);
    }
}
