use crate::Database;
use crate::models::GoalRow;
use crate::queries::OptionalExt;
use anyhow::Result;

impl Database {
    pub fn insert_goal(&self, id: &str, owner_id: &str, name: &str, target_value: f64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO goals (id, owner_id, name, target_value) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, owner_id, name, target_value],
            )?;
            Ok(())
        })
    }

    pub fn get_goal(&self, id: &str) -> Result<Option<GoalRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, name, current_value, target_value, created_at
                 FROM goals WHERE id = ?1",
            )?;
            let row = stmt
                .query_row([id], |row| {
                    Ok(GoalRow {
                        id: row.get(0)?,
                        owner_id: row.get(1)?,
                        name: row.get(2)?,
                        current_value: row.get(3)?,
                        target_value: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_goals(&self, owner_id: &str) -> Result<Vec<GoalRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, name, current_value, target_value, created_at
                 FROM goals WHERE owner_id = ?1 ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([owner_id], |row| {
                    Ok(GoalRow {
                        id: row.get(0)?,
                        owner_id: row.get(1)?,
                        name: row.get(2)?,
                        current_value: row.get(3)?,
                        target_value: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
