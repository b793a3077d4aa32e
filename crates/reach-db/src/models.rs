//! Database row types — these map directly to SQLite rows.
//! Distinct from reach-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub role: String,
    pub profile: String,
    pub created_at: String,
}

/// Projection used by the influencer directory: no password, no timestamps.
pub struct InfluencerRow {
    pub id: String,
    pub username: String,
    pub profile: String,
}

#[derive(Clone)]
pub struct JobRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub status: String,
    pub status_in_percent: f64,
    pub goal_id: Option<String>,
    pub goal_contribution_percent: Option<f64>,
    pub created_at: String,
}

pub struct GoalRow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub current_value: f64,
    pub target_value: f64,
    pub created_at: String,
}

pub struct ProposalRow {
    pub id: String,
    pub job_id: String,
    pub influencer_id: String,
    pub message: String,
    pub status: String,
    pub created_at: String,
}

pub struct ContractRow {
    pub id: String,
    pub job_id: String,
    pub influencer_id: String,
    pub client_id: String,
    pub terms: String,
    pub status: String,
    pub created_at: String,
}

pub struct ConversationRow {
    pub id: String,
    pub participant_a: String,
    pub participant_b: String,
    pub last_message: Option<String>,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub status: String,
    pub created_at: String,
}

pub struct TransactionRow {
    pub id: String,
    pub user_id: String,
    pub amount: f64,
    pub status: String,
    pub payment_date: Option<String>,
    pub source: String,
    pub metadata: String,
    pub created_at: String,
}
