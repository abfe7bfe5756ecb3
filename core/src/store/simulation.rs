use super::{
    json_column, spin::insert_spin_rows, NewSimulation, NewSpin, SimStore, SimulationRecord,
    SimulationWithSpins,
};
use crate::{
    error::SimResult,
    types::{utc_timestamp, SimulationId},
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const SIMULATION_COLUMNS: &str = "id, userId, strategy, startingInvestment, finalEarnings, \
     finalPortfolio, totalSpins, settings, timestamp";

fn simulation_from_row(row: &Row<'_>) -> rusqlite::Result<SimulationRecord> {
    Ok(SimulationRecord {
        id:                  row.get(0)?,
        user_id:             row.get(1)?,
        strategy:            row.get(2)?,
        starting_investment: row.get(3)?,
        final_earnings:      row.get(4)?,
        final_portfolio:     row.get(5)?,
        total_spins:         row.get(6)?,
        settings:            json_column(row, 7)?,
        timestamp:           row.get(8)?,
    })
}

fn insert_simulation(conn: &Connection, sim: &NewSimulation) -> SimResult<SimulationId> {
    let settings = serde_json::to_string(&sim.settings)?;
    conn.execute(
        "INSERT INTO simulations (userId, strategy, startingInvestment, finalEarnings,
                                  finalPortfolio, totalSpins, settings, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            sim.user_id.as_deref().filter(|u| !u.is_empty()),
            sim.strategy,
            sim.starting_investment,
            sim.final_earnings,
            sim.final_portfolio,
            sim.total_spins,
            settings,
            utc_timestamp(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    log::debug!("simulation {id} created (strategy={})", sim.strategy);
    Ok(id)
}

impl SimStore {
    // ── Simulation ─────────────────────────────────────────────

    /// Insert a simulation and return its generated id.
    pub fn create_simulation(&self, sim: &NewSimulation) -> SimResult<SimulationId> {
        insert_simulation(&self.conn, sim)
    }

    /// Insert a simulation and the spins built for its id in one
    /// transaction. If any spin is rejected, the simulation is not kept.
    pub fn create_simulation_with_spins<F>(
        &self,
        sim: &NewSimulation,
        build_spins: F,
    ) -> SimResult<SimulationId>
    where
        F: FnOnce(SimulationId) -> SimResult<Vec<NewSpin>>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let id = insert_simulation(&tx, sim)?;
        let spins = build_spins(id)?;
        insert_spin_rows(&tx, &spins)?;
        tx.commit()?;
        log::debug!("simulation {id} stored with {} spins", spins.len());
        Ok(id)
    }

    /// All simulations, newest first, optionally for one user.
    pub fn list_simulations(&self, user_id: Option<&str>) -> SimResult<Vec<SimulationRecord>> {
        let rows = match user_id {
            Some(uid) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {SIMULATION_COLUMNS} FROM simulations
                     WHERE userId = ?1 ORDER BY timestamp DESC, id DESC"
                ))?;
                let rows = stmt
                    .query_map(params![uid], simulation_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {SIMULATION_COLUMNS} FROM simulations ORDER BY timestamp DESC, id DESC"
                ))?;
                let rows = stmt
                    .query_map([], simulation_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(rows)
    }

    pub fn simulation(&self, id: SimulationId) -> SimResult<Option<SimulationRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {SIMULATION_COLUMNS} FROM simulations WHERE id = ?1"),
                params![id],
                simulation_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// A simulation joined with all of its spins in spin order.
    pub fn simulation_with_spins(&self, id: SimulationId) -> SimResult<Option<SimulationWithSpins>> {
        let Some(simulation) = self.simulation(id)? else {
            return Ok(None);
        };
        let spins = self.list_spins(id, None, None)?;
        Ok(Some(SimulationWithSpins { simulation, spins }))
    }
}
