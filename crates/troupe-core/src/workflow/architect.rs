//! Architect — proposes a specialist roster from a use-case description.
//!
//! Runs once per use case, before the graph builder. The model is asked for
//! a JSON array of `{role, responsibilities}` objects; anything that does
//! not parse into a usable roster is a design error.

use std::sync::Arc;

use crate::models::AgentSpec;
use crate::workflow::error::WorkflowError;
use crate::workflow::generator::{generate_with_retry, TextGenerator};
use crate::workflow::state::{ConversationState, Message};

const ARCHITECT_INSTRUCTION: &str = "You are an architect of multi-agent systems. Analyze the \
     use-case description and decompose the problem into a team of \
     specialist agents. For each agent, define its \"role\" (title/specialty) \
     and its \"responsibilities\". The last agent must be a finalizer or \
     consolidator that delivers the final answer to the user.\n\n\
     Reply with ONLY a JSON array of objects, each with exactly the fields \
     \"role\" and \"responsibilities\". No prose, no code fences.";

#[derive(Clone)]
pub struct Architect {
    generator: Arc<dyn TextGenerator>,
}

impl Architect {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Propose an ordered roster for a use-case description.
    ///
    /// Transport failures surface as `Generation`; a proposal that parses
    /// but is unusable (empty, duplicate roles) is `Design`.
    pub async fn propose(&self, description: &str) -> Result<Vec<AgentSpec>, WorkflowError> {
        let context = ConversationState::new(Message::user(description));
        let raw =
            generate_with_retry(self.generator.as_ref(), ARCHITECT_INSTRUCTION, &context).await?;

        let roster = parse_roster(&raw)?;
        tracing::info!(
            "architect proposed {} agents: {}",
            roster.len(),
            roster
                .iter()
                .map(|s| s.role.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(roster)
    }
}

fn parse_roster(raw: &str) -> Result<Vec<AgentSpec>, WorkflowError> {
    let body = strip_code_fences(raw);
    let roster: Vec<AgentSpec> = serde_json::from_str(body)
        .map_err(|e| WorkflowError::Design(format!("unparsable roster proposal: {}", e)))?;

    if roster.is_empty() {
        return Err(WorkflowError::Design(
            "architect proposed an empty roster".to_string(),
        ));
    }

    let mut seen = std::collections::HashSet::new();
    for spec in &roster {
        if spec.role.trim().is_empty() {
            return Err(WorkflowError::Design(
                "architect proposed an agent with an empty role".to_string(),
            ));
        }
        if !seen.insert(spec.role.as_str()) {
            return Err(WorkflowError::Design(format!(
                "architect proposed duplicate role '{}'",
                spec.role
            )));
        }
    }

    Ok(roster)
}

/// Models often wrap JSON in Markdown fences despite instructions.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip an optional language tag on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::generator::testing::ScriptedGenerator;

    const PROPOSAL: &str = r#"[
        {"role": "Intake", "responsibilities": "collect customer name and desired service"},
        {"role": "Scheduler", "responsibilities": "propose an appointment slot"}
    ]"#;

    #[tokio::test]
    async fn test_propose_parses_a_bare_json_roster() {
        let generator = Arc::new(ScriptedGenerator::replies([PROPOSAL]));
        let architect = Architect::new(generator);

        let roster = architect
            .propose("I want a chatbot for barbershop scheduling")
            .await
            .unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].role, "Intake");
        assert_eq!(roster[1].role, "Scheduler");
    }

    #[tokio::test]
    async fn test_propose_strips_markdown_fences() {
        let fenced = format!("```json\n{}\n```", PROPOSAL);
        let generator = Arc::new(ScriptedGenerator::replies([fenced]));
        let architect = Architect::new(generator);

        let roster = architect.propose("scheduling bot").await.unwrap();
        assert_eq!(roster.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_proposal_is_a_design_error() {
        let generator = Arc::new(ScriptedGenerator::replies(["[]"]));
        let architect = Architect::new(generator);

        let err = architect.propose("anything").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Design(_)));
    }

    #[tokio::test]
    async fn test_duplicate_roles_are_a_design_error() {
        let generator = Arc::new(ScriptedGenerator::replies([r#"[
            {"role": "Intake", "responsibilities": "a"},
            {"role": "Intake", "responsibilities": "b"}
        ]"#]));
        let architect = Architect::new(generator);

        let err = architect.propose("anything").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Design(_)));
    }

    #[tokio::test]
    async fn test_prose_proposal_is_a_design_error() {
        let generator = Arc::new(ScriptedGenerator::replies([
            "I would suggest a team of three agents.",
        ]));
        let architect = Architect::new(generator);

        let err = architect.propose("anything").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Design(_)));
    }
}
