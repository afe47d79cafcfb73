use serde::{Deserialize, Serialize};

/// A specialist agent definition: a role plus the responsibilities it owns.
///
/// The role doubles as the routing key in the workflow graph, so it must be
/// unique within a roster. Specs are immutable once a roster is fixed; they
/// are owned by their use case and have no independent lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSpec {
    pub role: String,
    pub responsibilities: String,
}

impl AgentSpec {
    pub fn new(role: impl Into<String>, responsibilities: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            responsibilities: responsibilities.into(),
        }
    }
}
