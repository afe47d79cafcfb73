//! Supervisor router — decides, turn by turn, which specialist acts next.
//!
//! The actual choice is delegated to the text-generation capability,
//! constrained to answer with exactly one token from the roster roles plus
//! the completion token. The allowed token set is a closed enumeration
//! validated by exact match after trimming: a mismatch is a hard routing
//! error, never fuzzy-recovered into a default node or a silent
//! termination.

use std::sync::Arc;

use crate::workflow::error::WorkflowError;
use crate::workflow::generator::{
    GenerationFailure, TextGenerator, GENERATION_ATTEMPTS,
};
use crate::workflow::graph::{RouteTarget, WorkflowGraph, FINISH_TOKEN};
use crate::workflow::state::ConversationState;

/// The supervisor's validated decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Dispatch to the named specialist.
    Act(String),
    /// No further turns; the last response stands.
    Terminate,
}

pub struct SupervisorRouter {
    generator: Arc<dyn TextGenerator>,
}

impl SupervisorRouter {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Decide the next node to run, or signal completion.
    ///
    /// Up to `GENERATION_ATTEMPTS` calls with identical input cover both
    /// transient generation failures and invalid tokens; rejected replies
    /// never reach conversation state. Exhaustion surfaces as `Routing`;
    /// a permanent generation failure surfaces as `Generation` immediately.
    pub async fn decide(
        &self,
        graph: &WorkflowGraph,
        state: &ConversationState,
    ) -> Result<RouteDecision, WorkflowError> {
        let instruction = supervisor_instruction(graph);
        let mut last_failure = String::new();

        for attempt in 1..=GENERATION_ATTEMPTS {
            match self.generator.generate(&instruction, state).await {
                Ok(raw) => {
                    let token = raw.trim();
                    match graph.dispatch(token) {
                        Some(RouteTarget::Terminate) => return Ok(RouteDecision::Terminate),
                        Some(RouteTarget::Agent(_)) => {
                            return Ok(RouteDecision::Act(token.to_string()));
                        }
                        None => {
                            tracing::warn!(
                                "supervisor attempt {}/{} returned invalid token '{}'",
                                attempt,
                                GENERATION_ATTEMPTS,
                                token
                            );
                            last_failure = format!("invalid decision token '{}'", token);
                        }
                    }
                }
                Err(GenerationFailure::Transient(msg)) => {
                    tracing::warn!(
                        "supervisor attempt {}/{} failed transiently: {}",
                        attempt,
                        GENERATION_ATTEMPTS,
                        msg
                    );
                    last_failure = msg;
                }
                Err(GenerationFailure::Permanent(msg)) => {
                    return Err(WorkflowError::Generation(msg));
                }
            }
        }

        Err(WorkflowError::Routing(format!(
            "no valid decision after {} attempts: {}",
            GENERATION_ATTEMPTS, last_failure
        )))
    }
}

fn supervisor_instruction(graph: &WorkflowGraph) -> String {
    let roles: Vec<&str> = graph.roles().collect();
    let mut options: Vec<&str> = roles.clone();
    options.push(FINISH_TOKEN);

    format!(
        "You are the supervisor of a team of AI agents. Analyze the \
         conversation and decide which agent should act next.\n\n\
         Available agents: {roles}\n\n\
         If the task is complete and the final answer has been given, reply \
         with the word '{finish}'. Otherwise reply with the exact name of one \
         agent from the list.\n\n\
         Your reply MUST BE EXACTLY ONE of the following options: {options}\n\
         Do NOT add any other word, punctuation, or explanation.",
        roles = roles.join(", "),
        finish = FINISH_TOKEN,
        options = options.join(", "),
    )
}
