use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                role        TEXT NOT NULL,
                profile     TEXT NOT NULL DEFAULT '{}',
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE goals (
                id            TEXT PRIMARY KEY,
                owner_id      TEXT NOT NULL REFERENCES users(id),
                name          TEXT NOT NULL,
                current_value REAL NOT NULL DEFAULT 0,
                target_value  REAL NOT NULL,
                created_at    TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- goal_id carries no foreign key: goals may be deleted
            -- independently of jobs that still reference them, and the
            -- lifecycle service surfaces the dangling reference.
            CREATE TABLE jobs (
                id                        TEXT PRIMARY KEY,
                owner_id                  TEXT NOT NULL REFERENCES users(id),
                title                     TEXT NOT NULL,
                description               TEXT NOT NULL,
                price                     REAL NOT NULL CHECK (price >= 0),
                status                    TEXT NOT NULL DEFAULT 'open',
                status_in_percent         REAL NOT NULL DEFAULT 0,
                goal_id                   TEXT,
                goal_contribution_percent REAL
                    CHECK (goal_contribution_percent IS NULL
                           OR (goal_contribution_percent >= 0
                               AND goal_contribution_percent <= 100)),
                created_at                TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_jobs_status ON jobs(status);
            CREATE INDEX idx_jobs_owner ON jobs(owner_id);

            CREATE TABLE saved_jobs (
                user_id TEXT NOT NULL REFERENCES users(id),
                job_id  TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
                PRIMARY KEY (user_id, job_id)
            );

            CREATE TABLE hired_influencers (
                job_id        TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
                influencer_id TEXT NOT NULL REFERENCES users(id),
                PRIMARY KEY (job_id, influencer_id)
            );

            CREATE TABLE proposals (
                id            TEXT PRIMARY KEY,
                job_id        TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
                influencer_id TEXT NOT NULL REFERENCES users(id),
                message       TEXT NOT NULL,
                status        TEXT NOT NULL DEFAULT 'pending',
                created_at    TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE (job_id, influencer_id)
            );

            CREATE INDEX idx_proposals_influencer ON proposals(influencer_id);

            CREATE TABLE contracts (
                id            TEXT PRIMARY KEY,
                job_id        TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
                influencer_id TEXT NOT NULL REFERENCES users(id),
                client_id     TEXT NOT NULL REFERENCES users(id),
                terms         TEXT NOT NULL,
                status        TEXT NOT NULL DEFAULT 'pending',
                created_at    TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_contracts_influencer ON contracts(influencer_id);
            CREATE INDEX idx_contracts_client ON contracts(client_id);

            CREATE TABLE conversations (
                id            TEXT PRIMARY KEY,
                participant_a TEXT NOT NULL REFERENCES users(id),
                participant_b TEXT NOT NULL REFERENCES users(id),
                last_message  TEXT,
                created_at    TEXT NOT NULL DEFAULT (datetime('now')),
                CHECK (participant_a != participant_b)
            );

            CREATE TABLE messages (
                id              TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                sender_id       TEXT NOT NULL REFERENCES users(id),
                content         TEXT NOT NULL,
                status          TEXT NOT NULL DEFAULT 'delivered',
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_messages_conversation
                ON messages(conversation_id, created_at);

            CREATE TABLE transactions (
                id           TEXT PRIMARY KEY,
                user_id      TEXT NOT NULL REFERENCES users(id),
                amount       REAL NOT NULL CHECK (amount >= 0),
                status       TEXT NOT NULL DEFAULT 'unpaid',
                payment_date TEXT,
                source       TEXT NOT NULL,
                metadata     TEXT NOT NULL DEFAULT '{}',
                created_at   TEXT NOT NULL DEFAULT (datetime('now')),
                CHECK ((status = 'paid') = (payment_date IS NOT NULL))
            );

            CREATE INDEX idx_transactions_user ON transactions(user_id);

            -- One ledger row per completed job; the primary key makes a
            -- second credit for the same job impossible.
            CREATE TABLE goal_contributions (
                job_id     TEXT PRIMARY KEY REFERENCES jobs(id),
                goal_id    TEXT NOT NULL,
                amount     REAL NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
