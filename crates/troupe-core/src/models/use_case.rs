use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A use case: the natural-language description a roster was designed for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseCase {
    pub id: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UseCase {
    pub fn new(id: String, description: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            description,
            created_at: now,
            updated_at: now,
        }
    }
}
