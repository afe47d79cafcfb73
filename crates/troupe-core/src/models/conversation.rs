use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Running,
    Terminated,
    Failed,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Terminated => "terminated",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "terminated" => Self::Terminated,
            "failed" => Self::Failed,
            _ => Self::Running,
        }
    }
}

/// One run of the execution engine against a use case's roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub use_case_id: String,
    pub status: ConversationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(id: String, use_case_id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            use_case_id,
            status: ConversationStatus::Running,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A persisted transcript row. `position` preserves transcript order;
/// senders are role names, "user", or "supervisor".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub id: String,
    pub conversation_id: String,
    pub sender: String,
    pub content: String,
    pub position: u32,
    pub created_at: DateTime<Utc>,
}
