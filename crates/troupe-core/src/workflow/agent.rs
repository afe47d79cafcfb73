//! Agent node executor — produces exactly one specialist turn.
//!
//! The executor is side-effect-free with respect to shared state: it returns
//! the new message and the execution engine appends it. That keeps it
//! independently testable.

use std::sync::Arc;

use crate::models::AgentSpec;
use crate::workflow::error::WorkflowError;
use crate::workflow::generator::{generate_with_retry, TextGenerator};
use crate::workflow::state::{ConversationState, Message};

pub struct AgentNodeExecutor {
    generator: Arc<dyn TextGenerator>,
}

impl AgentNodeExecutor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Run one specialist turn against the full conversation history.
    ///
    /// The specialist sees every prior user, supervisor, and specialist
    /// message; isolation of attention is a prompt concern, not a structural
    /// one. Returns one message tagged with the specialist's role.
    pub async fn execute(
        &self,
        spec: &AgentSpec,
        state: &ConversationState,
    ) -> Result<Message, WorkflowError> {
        let instruction = specialist_instruction(spec);
        let content = generate_with_retry(self.generator.as_ref(), &instruction, state).await?;
        Ok(Message::specialist(&spec.role, content))
    }
}

fn specialist_instruction(spec: &AgentSpec) -> String {
    format!(
        "You are a {role}. Your responsibilities are: {responsibilities}. \
         Based on the conversation history, carry out your task. Respond \
         concisely, act only within your specialty, and hand control back \
         when your part is done.",
        role = spec.role,
        responsibilities = spec.responsibilities,
    )
}
