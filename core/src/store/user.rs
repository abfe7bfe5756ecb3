use super::{SimStore, UserRecord};
use crate::error::SimResult;
use rusqlite::{params, OptionalExtension};

impl SimStore {
    // ── Users ──────────────────────────────────────────────────

    pub fn user(&self, uid: &str) -> SimResult<Option<UserRecord>> {
        let user = self
            .conn
            .query_row(
                "SELECT uid, email, displayName, createdAt FROM users WHERE uid = ?1",
                params![uid],
                |row| {
                    Ok(UserRecord {
                        uid:          row.get(0)?,
                        email:        row.get(1)?,
                        display_name: row.get(2)?,
                        created_at:   row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }
}
