use crate::Database;
use crate::models::{InfluencerRow, UserRow};
use crate::queries::OptionalExt;
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    /// Returns false when the username is already taken. The UNIQUE
    /// constraint is the source of truth here, so two racing
    /// registrations can both rely on it.
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        role: &str,
        profile_json: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, password, role, profile) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, username, password_hash, role, profile_json),
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Influencer directory: projected fields only, never the full row.
    pub fn list_influencers(&self) -> Result<Vec<InfluencerRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, profile FROM users
                 WHERE role = 'influencer'
                 ORDER BY username",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(InfluencerRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        profile: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Saved-jobs set --

    pub fn save_job(&self, user_id: &str, job_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO saved_jobs (user_id, job_id) VALUES (?1, ?2)",
                (user_id, job_id),
            )?;
            Ok(())
        })
    }

    /// Returns false when the job was not in the saved set.
    pub fn unsave_job(&self, user_id: &str, job_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "DELETE FROM saved_jobs WHERE user_id = ?1 AND job_id = ?2",
                (user_id, job_id),
            )?;
            Ok(n > 0)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is a compile-time constant from the callers above, never input.
    let sql = format!(
        "SELECT id, username, password, role, profile, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                role: row.get(3)?,
                profile: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}
