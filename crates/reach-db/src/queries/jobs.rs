use crate::Database;
use crate::models::JobRow;
use crate::queries::OptionalExt;
use anyhow::Result;
use rusqlite::Connection;

const JOB_COLUMNS: &str = "id, owner_id, title, description, price, status, \
     status_in_percent, goal_id, goal_contribution_percent, created_at";

impl Database {
    #[allow(clippy::too_many_arguments)]
    pub fn insert_job(
        &self,
        id: &str,
        owner_id: &str,
        title: &str,
        description: &str,
        price: f64,
        goal_id: Option<&str>,
        goal_contribution_percent: Option<f64>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO jobs (id, owner_id, title, description, price, goal_id, goal_contribution_percent)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![id, owner_id, title, description, price, goal_id, goal_contribution_percent],
            )?;
            Ok(())
        })
    }

    pub fn get_job(&self, id: &str) -> Result<Option<JobRow>> {
        self.with_conn(|conn| query_job(conn, id))
    }

    /// Delete a job, returning the deleted row. Children (saved entries,
    /// hires, proposals, contracts) go with it via CASCADE.
    pub fn delete_job(&self, id: &str) -> Result<Option<JobRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            let Some(job) = query_job(&tx, id)? else {
                return Ok(None);
            };
            tx.execute("DELETE FROM jobs WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(Some(job))
        })
    }

    /// Open jobs the influencer can still apply to: excludes any job they
    /// are already hired on and any job they have a proposal against,
    /// whatever that proposal's status.
    pub fn list_new_jobs(&self, influencer_id: &str) -> Result<Vec<JobRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {JOB_COLUMNS} FROM jobs
                 WHERE status = 'open'
                   AND id NOT IN (SELECT job_id FROM hired_influencers WHERE influencer_id = ?1)
                   AND id NOT IN (SELECT job_id FROM proposals WHERE influencer_id = ?1)
                 ORDER BY created_at DESC"
            );
            collect_jobs(conn, &sql, [influencer_id])
        })
    }

    /// Jobs in the user's saved set, newest first.
    pub fn list_saved_jobs(&self, user_id: &str) -> Result<Vec<JobRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {JOB_COLUMNS} FROM jobs
                 WHERE id IN (SELECT job_id FROM saved_jobs WHERE user_id = ?1)
                 ORDER BY created_at DESC"
            );
            collect_jobs(conn, &sql, [user_id])
        })
    }

    pub fn hired_influencer_ids(&self, job_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT influencer_id FROM hired_influencers WHERE job_id = ?1")?;
            let ids = stmt
                .query_map([job_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(ids)
        })
    }
}

fn collect_jobs<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<JobRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map_job_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn query_job(conn: &Connection, id: &str) -> Result<Option<JobRow>> {
    let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([id], map_job_row).optional()?;
    Ok(row)
}

pub(crate) fn map_job_row(row: &rusqlite::Row<'_>) -> std::result::Result<JobRow, rusqlite::Error> {
    Ok(JobRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
        status: row.get(5)?,
        status_in_percent: row.get(6)?,
        goal_id: row.get(7)?,
        goal_contribution_percent: row.get(8)?,
        created_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::Database;
    use crate::testutil::{insert_job_with, register_user};

    #[test]
    fn new_jobs_excludes_hired_and_proposed() {
        let db = Database::open_in_memory().unwrap();
        let business = register_user(&db, "acme", "business");
        let influencer = register_user(&db, "nova", "influencer");

        let plain = insert_job_with(&db, &business, "plain", 100.0, None, None);
        let hired = insert_job_with(&db, &business, "hired", 100.0, None, None);
        let proposed = insert_job_with(&db, &business, "proposed", 100.0, None, None);

        db.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO hired_influencers (job_id, influencer_id) VALUES (?1, ?2)",
                (&hired, &influencer),
            )?;
            conn.execute(
                "INSERT INTO proposals (id, job_id, influencer_id, message) VALUES ('p1', ?1, ?2, 'hi')",
                (&proposed, &influencer),
            )?;
            Ok(())
        })
        .unwrap();

        let jobs = db.list_new_jobs(&influencer).unwrap();
        let ids: Vec<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec![plain.as_str()]);
    }

    #[test]
    fn saved_jobs_tracks_set_membership() {
        let db = Database::open_in_memory().unwrap();
        let business = register_user(&db, "acme", "business");
        let influencer = register_user(&db, "nova", "influencer");
        let job = insert_job_with(&db, &business, "gig", 50.0, None, None);

        assert!(db.list_saved_jobs(&influencer).unwrap().is_empty());

        db.save_job(&influencer, &job).unwrap();
        // Saving twice is a no-op, not an error.
        db.save_job(&influencer, &job).unwrap();
        assert_eq!(db.list_saved_jobs(&influencer).unwrap().len(), 1);

        assert!(db.unsave_job(&influencer, &job).unwrap());
        assert!(!db.unsave_job(&influencer, &job).unwrap());
        assert!(db.list_saved_jobs(&influencer).unwrap().is_empty());
    }

    #[test]
    fn delete_job_returns_row_and_cascades() {
        let db = Database::open_in_memory().unwrap();
        let business = register_user(&db, "acme", "business");
        let influencer = register_user(&db, "nova", "influencer");
        let job = insert_job_with(&db, &business, "gig", 50.0, None, None);
        db.save_job(&influencer, &job).unwrap();

        let deleted = db.delete_job(&job).unwrap().unwrap();
        assert_eq!(deleted.title, "gig");
        assert!(db.get_job(&job).unwrap().is_none());
        assert!(db.list_saved_jobs(&influencer).unwrap().is_empty());

        assert!(db.delete_job(&job).unwrap().is_none());
    }
}
