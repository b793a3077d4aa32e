use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    ContractStatus, JobStatus, MessageStatus, PaymentStatus, ProposalStatus, Role, UserProfile,
};

// -- JWT Claims --

/// JWT claims shared between the REST middleware and token issuance.
/// Canonical definition lives here in reach-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

// -- Generic envelope --

/// `{ data, message }` envelope used by list endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
    pub message: String,
}

impl<T> DataResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self { data, message: message.into() }
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub token: String,
}

// -- Jobs --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub goal_id: Option<Uuid>,
    pub goal_contribution_percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub status: JobStatus,
    pub status_in_percent: f64,
    pub goal_id: Option<Uuid>,
    pub goal_contribution_percent: Option<f64>,
    pub hired_influencers: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteJobResponse {
    pub job: JobResponse,
    /// Amount credited to the linked goal by this call. Zero when the job
    /// has no goal, no contribution percent, or was already completed.
    pub credited: f64,
    pub already_completed: bool,
}

// -- Proposals --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProposalRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub id: Uuid,
    pub job_id: Uuid,
    pub influencer_id: Uuid,
    pub message: String,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
}

// -- Contracts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateContractRequest {
    pub job_id: Uuid,
    pub influencer_id: Uuid,
    pub terms: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContractResponse {
    pub id: Uuid,
    pub job_id: Uuid,
    pub influencer_id: Uuid,
    pub client_id: Uuid,
    pub terms: String,
    pub status: ContractStatus,
    pub created_at: DateTime<Utc>,
}

// -- Conversations & messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateConversationRequest {
    pub participant_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub participants: [Uuid; 2],
    pub last_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

// -- Earnings --

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub status: PaymentStatus,
    pub payment_date: Option<DateTime<Utc>>,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

// -- Goals --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGoalRequest {
    pub name: String,
    pub target_value: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GoalResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub current_value: f64,
    pub target_value: f64,
    pub created_at: DateTime<Utc>,
}

// -- Influencer directory --

/// Projected public view of an influencer account. Password and the raw
/// profile sidecar never leave the server.
#[derive(Debug, Serialize, Deserialize)]
pub struct InfluencerResponse {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

impl InfluencerResponse {
    pub fn from_profile(id: Uuid, username: String, profile: UserProfile) -> Self {
        Self {
            id,
            username,
            display_name: profile.display_name,
            avatar_url: profile.avatar_url,
            bio: profile.bio,
        }
    }
}

// -- Media --

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    pub public_id: String,
}
