//! Row-to-response conversions. SQLite hands back strings; corrupt values
//! are logged and defaulted rather than failing the whole response.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use reach_db::models::{
    ContractRow, ConversationRow, GoalRow, InfluencerRow, JobRow, MessageRow, ProposalRow,
    TransactionRow,
};
use reach_types::api::{
    ContractResponse, ConversationResponse, GoalResponse, InfluencerResponse, JobResponse,
    MessageResponse, ProposalResponse, TransactionResponse,
};
use reach_types::models::{
    ContractStatus, JobStatus, MessageStatus, PaymentStatus, ProposalStatus, UserProfile,
};

pub(crate) fn parse_id(value: &str, what: &str) -> Uuid {
    value.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, value, e);
        Uuid::default()
    })
}

pub(crate) fn parse_timestamp(value: &str, what: &str) -> DateTime<Utc> {
    value
        .parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without
            // timezone. Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt {} timestamp '{}': {}", what, value, e);
            DateTime::default()
        })
}

pub(crate) fn job_response(row: JobRow, hired: Vec<String>) -> JobResponse {
    JobResponse {
        id: parse_id(&row.id, "job"),
        owner_id: parse_id(&row.owner_id, "job owner"),
        title: row.title,
        description: row.description,
        price: row.price,
        status: JobStatus::parse(&row.status).unwrap_or_else(|| {
            warn!("Corrupt job status '{}' on job '{}'", row.status, row.id);
            JobStatus::Open
        }),
        status_in_percent: row.status_in_percent,
        goal_id: row.goal_id.as_deref().map(|g| parse_id(g, "goal")),
        goal_contribution_percent: row.goal_contribution_percent,
        hired_influencers: hired.iter().map(|id| parse_id(id, "influencer")).collect(),
        created_at: parse_timestamp(&row.created_at, "job"),
    }
}

pub(crate) fn proposal_response(row: ProposalRow) -> ProposalResponse {
    ProposalResponse {
        id: parse_id(&row.id, "proposal"),
        job_id: parse_id(&row.job_id, "job"),
        influencer_id: parse_id(&row.influencer_id, "influencer"),
        message: row.message,
        status: ProposalStatus::parse(&row.status).unwrap_or_else(|| {
            warn!("Corrupt proposal status '{}' on '{}'", row.status, row.id);
            ProposalStatus::Pending
        }),
        created_at: parse_timestamp(&row.created_at, "proposal"),
    }
}

pub(crate) fn contract_response(row: ContractRow) -> ContractResponse {
    ContractResponse {
        id: parse_id(&row.id, "contract"),
        job_id: parse_id(&row.job_id, "job"),
        influencer_id: parse_id(&row.influencer_id, "influencer"),
        client_id: parse_id(&row.client_id, "client"),
        terms: row.terms,
        status: ContractStatus::parse(&row.status).unwrap_or_else(|| {
            warn!("Corrupt contract status '{}' on '{}'", row.status, row.id);
            ContractStatus::Pending
        }),
        created_at: parse_timestamp(&row.created_at, "contract"),
    }
}

pub(crate) fn conversation_response(row: ConversationRow) -> ConversationResponse {
    ConversationResponse {
        id: parse_id(&row.id, "conversation"),
        participants: [
            parse_id(&row.participant_a, "participant"),
            parse_id(&row.participant_b, "participant"),
        ],
        last_message: row.last_message,
        created_at: parse_timestamp(&row.created_at, "conversation"),
    }
}

pub(crate) fn message_response(row: MessageRow) -> MessageResponse {
    MessageResponse {
        id: parse_id(&row.id, "message"),
        conversation_id: parse_id(&row.conversation_id, "conversation"),
        sender_id: parse_id(&row.sender_id, "sender"),
        content: row.content,
        status: MessageStatus::parse(&row.status).unwrap_or_else(|| {
            warn!("Corrupt message status '{}' on '{}'", row.status, row.id);
            MessageStatus::Delivered
        }),
        created_at: parse_timestamp(&row.created_at, "message"),
    }
}

pub(crate) fn transaction_response(row: TransactionRow) -> TransactionResponse {
    TransactionResponse {
        id: parse_id(&row.id, "transaction"),
        user_id: parse_id(&row.user_id, "user"),
        amount: row.amount,
        status: PaymentStatus::parse(&row.status).unwrap_or_else(|| {
            warn!("Corrupt payment status '{}' on '{}'", row.status, row.id);
            PaymentStatus::Unpaid
        }),
        payment_date: row
            .payment_date
            .as_deref()
            .map(|d| parse_timestamp(d, "payment")),
        source: row.source,
        created_at: parse_timestamp(&row.created_at, "transaction"),
    }
}

pub(crate) fn goal_response(row: GoalRow) -> GoalResponse {
    GoalResponse {
        id: parse_id(&row.id, "goal"),
        owner_id: parse_id(&row.owner_id, "goal owner"),
        name: row.name,
        current_value: row.current_value,
        target_value: row.target_value,
        created_at: parse_timestamp(&row.created_at, "goal"),
    }
}

pub(crate) fn influencer_response(row: InfluencerRow) -> InfluencerResponse {
    let profile: UserProfile = serde_json::from_str(&row.profile).unwrap_or_else(|e| {
        warn!("Corrupt profile on user '{}': {}", row.id, e);
        UserProfile::default()
    });
    InfluencerResponse::from_profile(parse_id(&row.id, "user"), row.username, profile)
}
