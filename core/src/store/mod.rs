//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Callers use store methods; they never execute SQL directly.
//!
//! Isolation comes from SQLite alone: multi-row writes run inside one
//! transaction, nothing else is locked, and nothing is retried.

use crate::{
    error::{SimError, SimResult},
    migrate::{self, MigrationRecord, MigrationReport},
    types::{JsonMap, SimulationId},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod simulation;
mod spin;
mod user;

pub struct SimStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl SimStore {
    /// Open (or create) the database file at `path`, creating its directory.
    pub fn open(path: &str) -> SimResult<Self> {
        if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| SimError::io(dir, e))?;
            }
        }
        log::info!("[DB] Using database file: {path}");

        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply every pending migration in `dir`.
    pub fn migrate(&self, dir: &Path) -> SimResult<MigrationReport> {
        migrate::apply_migrations(&self.conn, dir)
    }

    pub fn applied_migrations(&self) -> SimResult<Vec<MigrationRecord>> {
        migrate::applied_migrations(&self.conn)
    }

    pub fn apply_seeds(&self, dir: &Path) -> SimResult<Vec<String>> {
        migrate::apply_seeds(&self.conn, dir)
    }

    pub fn table_names(&self) -> SimResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }
}

/// Decode a JSON object column.
pub(crate) fn json_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<JsonMap> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

// ── Rows ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct NewSimulation {
    pub user_id:             Option<String>,
    pub strategy:            String,
    pub starting_investment: f64,
    pub final_earnings:      f64,
    pub final_portfolio:     f64,
    pub total_spins:         i64,
    pub settings:            JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRecord {
    pub id:                  SimulationId,
    pub user_id:             Option<String>,
    pub strategy:            String,
    pub starting_investment: f64,
    pub final_earnings:      f64,
    pub final_portfolio:     f64,
    pub total_spins:         i64,
    pub settings:            JsonMap,
    pub timestamp:           String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSpin {
    pub simulation_id:       SimulationId,
    pub spin_number:         i64,
    pub drawn_number:        i64,
    pub spin_net_result:     f64,
    pub cumulative_earnings: f64,
    pub raw:                 JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinRecord {
    pub id:                  i64,
    pub simulation_id:       SimulationId,
    pub spin_number:         i64,
    pub drawn_number:        i64,
    pub spin_net_result:     f64,
    pub cumulative_earnings: f64,
    pub raw:                 JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationWithSpins {
    pub simulation: SimulationRecord,
    pub spins:      Vec<SpinRecord>,
}

/// Aggregates over one simulation's spins. Every field but the count is
/// null when the simulation has no spins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinStats {
    pub total_spins:    i64,
    pub first_spin:     Option<i64>,
    pub last_spin:      Option<i64>,
    pub min_earnings:   Option<f64>,
    pub max_earnings:   Option<f64>,
    pub avg_net_result: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub uid:          String,
    pub email:        Option<String>,
    pub display_name: Option<String>,
    pub created_at:   String,
}
