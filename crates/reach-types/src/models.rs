use serde::{Deserialize, Serialize};

/// Upper bound on message content length, in characters.
pub const MESSAGE_MAX_LEN: usize = 2000;

/// Current version of the [`UserProfile`] sidecar schema.
pub const PROFILE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Business,
    Influencer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Business => "business",
            Role::Influencer => "influencer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "business" => Some(Role::Business),
            "influencer" => Some(Role::Influencer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::InProgress => "in-progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(JobStatus::Open),
            "in-progress" => Some(JobStatus::InProgress),
            "completed" => Some(JobStatus::Completed),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ProposalStatus::Pending),
            "accepted" => Some(ProposalStatus::Accepted),
            "rejected" => Some(ProposalStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Pending,
    Accepted,
    Declined,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Pending => "pending",
            ContractStatus::Accepted => "accepted",
            ContractStatus::Declined => "declined",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ContractStatus::Pending),
            "accepted" => Some(ContractStatus::Accepted),
            "declined" => Some(ContractStatus::Declined),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Delivered,
    Read,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Delivered => "delivered",
            MessageStatus::Read => "read",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "delivered" => Some(MessageStatus::Delivered),
            "read" => Some(MessageStatus::Read),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Unpaid => "unpaid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "paid" => Some(PaymentStatus::Paid),
            "unpaid" => Some(PaymentStatus::Unpaid),
            _ => None,
        }
    }
}

/// Versioned profile sidecar stored as a JSON column on the user row.
///
/// Named optional fields cover the attributes the app itself reads; anything
/// the identity provider attaches beyond those lands in `extra` instead of
/// relying on ad hoc structural typing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub version: u32,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            version: PROFILE_VERSION,
            display_name: None,
            avatar_url: None,
            bio: None,
            extra: serde_json::Map::new(),
        }
    }
}
