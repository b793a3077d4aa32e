use crate::Database;
use crate::models::ProposalRow;
use crate::queries::OptionalExt;
use anyhow::Result;
use rusqlite::Connection;

/// Outcome of resolving a proposal to a terminal status.
pub enum ProposalResolution {
    Resolved(ProposalRow),
    /// Proposal already carries a terminal status; nothing changed.
    AlreadyResolved(ProposalRow),
    NotFound,
}

impl Database {
    /// Returns false when the influencer already has a proposal on this job.
    pub fn insert_proposal(
        &self,
        id: &str,
        job_id: &str,
        influencer_id: &str,
        message: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM proposals WHERE job_id = ?1 AND influencer_id = ?2",
                    (job_id, influencer_id),
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Ok(false);
            }

            conn.execute(
                "INSERT INTO proposals (id, job_id, influencer_id, message) VALUES (?1, ?2, ?3, ?4)",
                (id, job_id, influencer_id, message),
            )?;
            Ok(true)
        })
    }

    pub fn get_proposal(&self, id: &str) -> Result<Option<ProposalRow>> {
        self.with_conn(|conn| query_proposal(conn, id))
    }

    pub fn list_proposals_for_job(&self, job_id: &str) -> Result<Vec<ProposalRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, job_id, influencer_id, message, status, created_at
                 FROM proposals WHERE job_id = ?1 ORDER BY created_at",
            )?;
            let rows = stmt
                .query_map([job_id], map_proposal_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Move a pending proposal to `accepted` or `rejected`. The transition
    /// is conditional on the current status, so a proposal can reach a
    /// terminal status at most once. Accepting also records the influencer
    /// in the job's hired set, in the same transaction.
    pub fn resolve_proposal(&self, id: &str, accept: bool) -> Result<ProposalResolution> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;

            let Some(proposal) = query_proposal(&tx, id)? else {
                return Ok(ProposalResolution::NotFound);
            };

            let new_status = if accept { "accepted" } else { "rejected" };
            let changed = tx.execute(
                "UPDATE proposals SET status = ?1 WHERE id = ?2 AND status = 'pending'",
                (new_status, id),
            )?;
            if changed == 0 {
                return Ok(ProposalResolution::AlreadyResolved(proposal));
            }

            if accept {
                tx.execute(
                    "INSERT OR IGNORE INTO hired_influencers (job_id, influencer_id) VALUES (?1, ?2)",
                    (&proposal.job_id, &proposal.influencer_id),
                )?;
            }
            tx.commit()?;

            Ok(ProposalResolution::Resolved(ProposalRow {
                status: new_status.to_string(),
                ..proposal
            }))
        })
    }
}

fn query_proposal(conn: &Connection, id: &str) -> Result<Option<ProposalRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, job_id, influencer_id, message, status, created_at
         FROM proposals WHERE id = ?1",
    )?;
    let row = stmt.query_row([id], map_proposal_row).optional()?;
    Ok(row)
}

fn map_proposal_row(row: &rusqlite::Row<'_>) -> std::result::Result<ProposalRow, rusqlite::Error> {
    Ok(ProposalRow {
        id: row.get(0)?,
        job_id: row.get(1)?,
        influencer_id: row.get(2)?,
        message: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
    })
}
