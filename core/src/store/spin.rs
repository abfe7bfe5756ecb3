use super::{json_column, NewSpin, SimStore, SpinRecord, SpinStats};
use crate::{error::SimResult, types::SimulationId};
use rusqlite::{params, Connection};

/// Write spin rows on `conn`; the caller owns the transaction.
pub(super) fn insert_spin_rows(conn: &Connection, spins: &[NewSpin]) -> SimResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO simulation_spins (simulationId, spinNumber, drawnNumber,
                                       spinNetResult, cumulativeEarnings, raw)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for s in spins {
        stmt.execute(params![
            s.simulation_id,
            s.spin_number,
            s.drawn_number,
            s.spin_net_result,
            s.cumulative_earnings,
            serde_json::to_string(&s.raw)?,
        ])?;
    }
    Ok(())
}

impl SimStore {
    // ── Spins ──────────────────────────────────────────────────

    /// Insert a batch of spins. All rows commit together or none do.
    pub fn insert_spins(&self, spins: &[NewSpin]) -> SimResult<()> {
        if spins.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        insert_spin_rows(&tx, spins)?;
        tx.commit()?;
        log::debug!("inserted {} spins", spins.len());
        Ok(())
    }

    /// Spins of one simulation in spin order.
    ///
    /// `limit` applies only when non-zero; `offset` only together with a
    /// limit. A negative limit means no limit.
    pub fn list_spins(
        &self,
        simulation_id: SimulationId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> SimResult<Vec<SpinRecord>> {
        let limit = limit.filter(|l| *l != 0);
        let offset = limit.and(offset).unwrap_or(0);

        let mut stmt = self.conn.prepare(
            "SELECT id, simulationId, spinNumber, drawnNumber, spinNetResult,
                    cumulativeEarnings, raw
             FROM simulation_spins WHERE simulationId = ?1
             ORDER BY spinNumber ASC, id ASC
             LIMIT ?2 OFFSET ?3",
        )?;
        let spins = stmt
            .query_map(params![simulation_id, limit.unwrap_or(-1), offset], |row| {
                Ok(SpinRecord {
                    id:                  row.get(0)?,
                    simulation_id:       row.get(1)?,
                    spin_number:         row.get(2)?,
                    drawn_number:        row.get(3)?,
                    spin_net_result:     row.get(4)?,
                    cumulative_earnings: row.get(5)?,
                    raw:                 json_column(row, 6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(spins)
    }

    /// Count, spin range, earnings range and mean net result in one query.
    pub fn spin_stats(&self, simulation_id: SimulationId) -> SimResult<SpinStats> {
        let stats = self.conn.query_row(
            "SELECT COUNT(*), MIN(spinNumber), MAX(spinNumber),
                    MIN(cumulativeEarnings), MAX(cumulativeEarnings), AVG(spinNetResult)
             FROM simulation_spins WHERE simulationId = ?1",
            params![simulation_id],
            |row| {
                Ok(SpinStats {
                    total_spins:    row.get(0)?,
                    first_spin:     row.get(1)?,
                    last_spin:      row.get(2)?,
                    min_earnings:   row.get(3)?,
                    max_earnings:   row.get(4)?,
                    avg_net_result: row.get(5)?,
                })
            },
        )?;
        Ok(stats)
    }
}
