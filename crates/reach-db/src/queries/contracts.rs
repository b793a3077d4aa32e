use crate::Database;
use crate::models::ContractRow;
use crate::queries::OptionalExt;
use anyhow::Result;
use rusqlite::Connection;

/// Outcome of resolving a contract to a terminal status.
pub enum ContractResolution {
    Resolved(ContractRow),
    AlreadyResolved(ContractRow),
    NotFound,
}

impl Database {
    pub fn insert_contract(
        &self,
        id: &str,
        job_id: &str,
        influencer_id: &str,
        client_id: &str,
        terms: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO contracts (id, job_id, influencer_id, client_id, terms)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, job_id, influencer_id, client_id, terms),
            )?;
            Ok(())
        })
    }

    pub fn get_contract(&self, id: &str) -> Result<Option<ContractRow>> {
        self.with_conn(|conn| query_contract(conn, id))
    }

    /// All contracts the user is party to, on either side.
    pub fn list_contracts_for_user(&self, user_id: &str) -> Result<Vec<ContractRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, job_id, influencer_id, client_id, terms, status, created_at
                 FROM contracts
                 WHERE client_id = ?1 OR influencer_id = ?1
                 ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([user_id], map_contract_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Move a pending contract to `accepted` or `declined`, conditional on
    /// its current status. Acceptance books an unpaid earnings transaction
    /// for the influencer over the job's price, in the same transaction as
    /// the status write.
    pub fn resolve_contract(
        &self,
        id: &str,
        accept: bool,
        earning_id: &str,
    ) -> Result<ContractResolution> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;

            let Some(contract) = query_contract(&tx, id)? else {
                return Ok(ContractResolution::NotFound);
            };

            let new_status = if accept { "accepted" } else { "declined" };
            let changed = tx.execute(
                "UPDATE contracts SET status = ?1 WHERE id = ?2 AND status = 'pending'",
                (new_status, id),
            )?;
            if changed == 0 {
                return Ok(ContractResolution::AlreadyResolved(contract));
            }

            if accept {
                let price: f64 = tx.query_row(
                    "SELECT price FROM jobs WHERE id = ?1",
                    [&contract.job_id],
                    |r| r.get(0),
                )?;
                let metadata = serde_json::json!({
                    "contract_id": &contract.id,
                    "job_id": &contract.job_id,
                })
                .to_string();
                tx.execute(
                    "INSERT INTO transactions (id, user_id, amount, source, metadata)
                     VALUES (?1, ?2, ?3, 'contract', ?4)",
                    rusqlite::params![earning_id, &contract.influencer_id, price, metadata],
                )?;
            }
            tx.commit()?;

            Ok(ContractResolution::Resolved(ContractRow {
                status: new_status.to_string(),
                ..contract
            }))
        })
    }
}

fn query_contract(conn: &Connection, id: &str) -> Result<Option<ContractRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, job_id, influencer_id, client_id, terms, status, created_at
         FROM contracts WHERE id = ?1",
    )?;
    let row = stmt.query_row([id], map_contract_row).optional()?;
    Ok(row)
}

fn map_contract_row(row: &rusqlite::Row<'_>) -> std::result::Result<ContractRow, rusqlite::Error> {
    Ok(ContractRow {
        id: row.get(0)?,
        job_id: row.get(1)?,
        influencer_id: row.get(2)?,
        client_id: row.get(3)?,
        terms: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
    })
}
