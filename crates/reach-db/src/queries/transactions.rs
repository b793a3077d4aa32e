use crate::Database;
use crate::models::TransactionRow;
use crate::queries::OptionalExt;
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    pub fn insert_transaction(
        &self,
        id: &str,
        user_id: &str,
        amount: f64,
        source: &str,
        metadata_json: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO transactions (id, user_id, amount, source, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, user_id, amount, source, metadata_json],
            )?;
            Ok(())
        })
    }

    pub fn get_transaction(&self, id: &str) -> Result<Option<TransactionRow>> {
        self.with_conn(|conn| query_transaction(conn, id))
    }

    pub fn list_transactions(&self, user_id: &str) -> Result<Vec<TransactionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, amount, status, payment_date, source, metadata, created_at
                 FROM transactions WHERE user_id = ?1 ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([user_id], map_transaction_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Mark a transaction paid, stamping the payment date. Idempotent: an
    /// already-paid transaction keeps its original date. Returns the row
    /// after the attempt, or None if the id is unknown.
    pub fn mark_transaction_paid(
        &self,
        id: &str,
        payment_date: &str,
    ) -> Result<Option<TransactionRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            if query_transaction(&tx, id)?.is_none() {
                return Ok(None);
            }
            tx.execute(
                "UPDATE transactions SET status = 'paid', payment_date = ?2
                 WHERE id = ?1 AND status = 'unpaid'",
                (id, payment_date),
            )?;
            let row = query_transaction(&tx, id)?;
            tx.commit()?;
            Ok(row)
        })
    }
}

fn query_transaction(conn: &Connection, id: &str) -> Result<Option<TransactionRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, amount, status, payment_date, source, metadata, created_at
         FROM transactions WHERE id = ?1",
    )?;
    let row = stmt.query_row([id], map_transaction_row).optional()?;
    Ok(row)
}

fn map_transaction_row(
    row: &rusqlite::Row<'_>,
) -> std::result::Result<TransactionRow, rusqlite::Error> {
    Ok(TransactionRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: row.get(2)?,
        status: row.get(3)?,
        payment_date: row.get(4)?,
        source: row.get(5)?,
        metadata: row.get(6)?,
        created_at: row.get(7)?,
    })
}
