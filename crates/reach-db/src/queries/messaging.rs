use crate::Database;
use crate::models::{ConversationRow, MessageRow};
use crate::queries::OptionalExt;
use anyhow::Result;
use rusqlite::Connection;

/// One page of a conversation's history, newest first.
pub struct MessagePage {
    pub messages: Vec<MessageRow>,
}

impl Database {
    /// Look up the conversation between two users, creating it if absent.
    /// The pair is unordered: (a, b) and (b, a) resolve to the same row.
    pub fn find_or_create_conversation(
        &self,
        new_id: &str,
        user_a: &str,
        user_b: &str,
    ) -> Result<ConversationRow> {
        self.with_conn_mut(|conn| {
            let existing = conn
                .query_row(
                    "SELECT id, participant_a, participant_b, last_message, created_at
                     FROM conversations
                     WHERE (participant_a = ?1 AND participant_b = ?2)
                        OR (participant_a = ?2 AND participant_b = ?1)",
                    (user_a, user_b),
                    map_conversation_row,
                )
                .optional()?;
            if let Some(row) = existing {
                return Ok(row);
            }

            conn.execute(
                "INSERT INTO conversations (id, participant_a, participant_b) VALUES (?1, ?2, ?3)",
                (new_id, user_a, user_b),
            )?;
            query_conversation(conn, new_id)?
                .ok_or_else(|| anyhow::anyhow!("conversation vanished after insert"))
        })
    }

    pub fn get_conversation(&self, id: &str) -> Result<Option<ConversationRow>> {
        self.with_conn(|conn| query_conversation(conn, id))
    }

    pub fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, participant_a, participant_b, last_message, created_at
                 FROM conversations
                 WHERE participant_a = ?1 OR participant_b = ?1
                 ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([user_id], map_conversation_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Insert a message and refresh the conversation preview in one
    /// transaction, so `last_message` can never drift from the log.
    pub fn insert_message(
        &self,
        id: &str,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO messages (id, conversation_id, sender_id, content) VALUES (?1, ?2, ?3, ?4)",
                (id, conversation_id, sender_id, content),
            )?;
            tx.execute(
                "UPDATE conversations SET last_message = ?1 WHERE id = ?2",
                (content, conversation_id),
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Cursor-based pagination: pass the id of the oldest message from the
    /// previous page to fetch older messages. Pages are keyed on
    /// `(created_at, id)` so messages sharing a timestamp second neither
    /// get skipped at the boundary nor reshuffle between pages. An unknown
    /// cursor yields an empty page.
    pub fn get_messages(
        &self,
        conversation_id: &str,
        limit: u32,
        before: Option<&str>,
    ) -> Result<MessagePage> {
        self.with_conn(|conn| {
            let mut messages = Vec::new();
            let map = |row: &rusqlite::Row<'_>| map_message_row(row);
            match before {
                Some(cursor) => {
                    let anchor: Option<String> = conn
                        .query_row(
                            "SELECT created_at FROM messages
                             WHERE id = ?1 AND conversation_id = ?2",
                            (cursor, conversation_id),
                            |r| r.get(0),
                        )
                        .optional()?;
                    let Some(anchor) = anchor else {
                        return Ok(MessagePage { messages });
                    };

                    let mut stmt = conn.prepare(
                        "SELECT id, conversation_id, sender_id, content, status, created_at
                         FROM messages
                         WHERE conversation_id = ?1
                           AND (created_at < ?2 OR (created_at = ?2 AND id < ?3))
                         ORDER BY created_at DESC, id DESC LIMIT ?4",
                    )?;
                    let rows = stmt.query_map(
                        rusqlite::params![conversation_id, anchor, cursor, limit],
                        map,
                    )?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, conversation_id, sender_id, content, status, created_at
                         FROM messages
                         WHERE conversation_id = ?1
                         ORDER BY created_at DESC, id DESC LIMIT ?2",
                    )?;
                    let rows = stmt.query_map(rusqlite::params![conversation_id, limit], map)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
            }
            Ok(MessagePage { messages })
        })
    }

    /// Mark every delivered message sent *to* the reader as read.
    /// Returns the number of messages affected.
    pub fn mark_conversation_read(&self, conversation_id: &str, reader_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE messages SET status = 'read'
                 WHERE conversation_id = ?1 AND sender_id != ?2 AND status = 'delivered'",
                (conversation_id, reader_id),
            )?;
            Ok(n)
        })
    }
}

fn query_conversation(conn: &Connection, id: &str) -> Result<Option<ConversationRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, participant_a, participant_b, last_message, created_at
         FROM conversations WHERE id = ?1",
    )?;
    let row = stmt.query_row([id], map_conversation_row).optional()?;
    Ok(row)
}

fn map_conversation_row(
    row: &rusqlite::Row<'_>,
) -> std::result::Result<ConversationRow, rusqlite::Error> {
    Ok(ConversationRow {
        id: row.get(0)?,
        participant_a: row.get(1)?,
        participant_b: row.get(2)?,
        last_message: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_message_row(row: &rusqlite::Row<'_>) -> std::result::Result<MessageRow, rusqlite::Error> {
    Ok(MessageRow {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender_id: row.get(2)?,
        content: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
    })
}
