//! Execution engine — drives a workflow graph from the initial user message
//! to termination.
//!
//! One run is strictly sequential: supervisor, specialist, supervisor,
//! specialist, … Each turn's input is the full ordered history of all prior
//! turns, so no two nodes of the same run ever execute concurrently.
//! Independent runs may run concurrently; each owns its conversation state
//! exclusively and shares the graph read-only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::workflow::agent::AgentNodeExecutor;
use crate::workflow::error::WorkflowError;
use crate::workflow::generator::TextGenerator;
use crate::workflow::graph::WorkflowGraph;
use crate::workflow::state::{ConversationState, Message};
use crate::workflow::supervisor::{RouteDecision, SupervisorRouter};

/// Receives every message the engine appends, for persistence.
///
/// A sink failure is a persistence failure: it is logged and surfaced on the
/// run report, but it never invalidates the turn that produced the message.
#[async_trait]
pub trait TranscriptSink: Send + Sync {
    async fn append(&self, position: usize, message: &Message) -> Result<(), WorkflowError>;
}

/// Cooperative cancellation for a run, checked between transitions only.
/// An in-flight generation call is never interrupted in a way that could
/// leave a partial append behind.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on supervisor↔specialist round trips. A supervisor that
    /// never emits the completion token would otherwise loop forever.
    pub max_turns: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_turns: 20 }
    }
}

/// Terminal status of a run.
#[derive(Debug, Clone)]
pub enum RunStatus {
    /// The supervisor signalled completion; the last appended message is the
    /// user-visible final response.
    Terminated { final_response: String },
    /// A component failed after exhausting its retries, or the turn limit
    /// was exceeded.
    Failed { error: WorkflowError },
    /// The run was cancelled between transitions.
    Cancelled,
}

/// The result of one run. Whatever was appended before a failure or
/// cancellation stays in `state` for audit and persistence; nothing is
/// silently discarded.
#[derive(Debug)]
pub struct RunReport {
    pub status: RunStatus,
    pub state: ConversationState,
    /// Sink failures observed during the run, distinct from run failure.
    pub persistence_failures: Vec<String>,
}

impl RunReport {
    pub fn is_terminated(&self) -> bool {
        matches!(self.status, RunStatus::Terminated { .. })
    }
}

/// Drives the star graph: supervisor decision, specialist turn, repeat.
pub struct ExecutionEngine {
    supervisor: SupervisorRouter,
    executor: AgentNodeExecutor,
    config: EngineConfig,
}

impl ExecutionEngine {
    pub fn new(generator: Arc<dyn TextGenerator>, config: EngineConfig) -> Self {
        Self {
            supervisor: SupervisorRouter::new(generator.clone()),
            executor: AgentNodeExecutor::new(generator),
            config,
        }
    }

    /// Run one conversation from its initial user message to termination.
    ///
    /// State machine: AWAITING_SUPERVISOR → RUNNING_AGENT(role) →
    /// AWAITING_SUPERVISOR → … → TERMINATED, or FAILED(reason) from any
    /// state. The supervisor's `Act` decision is appended before dispatch;
    /// the terminal decision is not appended, so the last message at
    /// termination is the final response.
    pub async fn run(
        &self,
        graph: &WorkflowGraph,
        user_input: &str,
        sink: Option<&dyn TranscriptSink>,
        cancel: Option<&CancelHandle>,
    ) -> RunReport {
        let mut state = ConversationState::new(Message::user(user_input));
        let mut persistence_failures = Vec::new();

        self.offer(sink, &state, &mut persistence_failures).await;

        for _round in 0..self.config.max_turns {
            if is_cancelled(cancel) {
                return RunReport {
                    status: RunStatus::Cancelled,
                    state,
                    persistence_failures,
                };
            }

            // AWAITING_SUPERVISOR
            let decision = match self.supervisor.decide(graph, &state).await {
                Ok(decision) => decision,
                Err(error) => return failed(error, state, persistence_failures),
            };

            let role = match decision {
                RouteDecision::Terminate => {
                    // TERMINATED: no further transitions; the last message
                    // appended is the final response.
                    let final_response = state
                        .last()
                        .map(|m| m.content.clone())
                        .unwrap_or_default();
                    return RunReport {
                        status: RunStatus::Terminated { final_response },
                        state,
                        persistence_failures,
                    };
                }
                RouteDecision::Act(role) => role,
            };

            // The decision itself stays visible to later turns and to the
            // persisted transcript.
            state.push(Message::supervisor(&role));
            self.offer(sink, &state, &mut persistence_failures).await;

            if is_cancelled(cancel) {
                return RunReport {
                    status: RunStatus::Cancelled,
                    state,
                    persistence_failures,
                };
            }

            // RUNNING_AGENT(role). The role came out of the dispatch table,
            // so the roster lookup cannot miss.
            let spec = match graph.spec_for(&role) {
                Some(spec) => spec,
                None => {
                    return failed(
                        WorkflowError::Routing(format!("role '{}' missing from graph", role)),
                        state,
                        persistence_failures,
                    );
                }
            };

            let message = match self.executor.execute(spec, &state).await {
                Ok(message) => message,
                Err(error) => return failed(error, state, persistence_failures),
            };

            state.push(message);
            self.offer(sink, &state, &mut persistence_failures).await;
            // Control returns to the supervisor (the star's return edge).
        }

        tracing::warn!(
            "run exceeded the turn limit of {} round trips",
            self.config.max_turns
        );
        failed(
            WorkflowError::TurnLimit(self.config.max_turns),
            state,
            persistence_failures,
        )
    }

    /// Offer the most recent append to the sink. Failure to persist is not a
    /// failure to execute the turn.
    async fn offer(
        &self,
        sink: Option<&dyn TranscriptSink>,
        state: &ConversationState,
        persistence_failures: &mut Vec<String>,
    ) {
        let Some(sink) = sink else { return };
        let position = state.len() - 1;
        let Some(message) = state.last() else { return };

        if let Err(err) = sink.append(position, message).await {
            tracing::warn!("failed to persist message at position {}: {}", position, err);
            persistence_failures.push(err.to_string());
        }
    }
}

fn is_cancelled(cancel: Option<&CancelHandle>) -> bool {
    cancel.map(CancelHandle::is_cancelled).unwrap_or(false)
}

fn failed(
    error: WorkflowError,
    state: ConversationState,
    persistence_failures: Vec<String>,
) -> RunReport {
    RunReport {
        status: RunStatus::Failed { error },
        state,
        persistence_failures,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::models::AgentSpec;
    use crate::workflow::generator::testing::ScriptedGenerator;

    fn haircut_graph() -> WorkflowGraph {
        WorkflowGraph::build(vec![
            AgentSpec::new("Intake", "collect customer name and desired service"),
            AgentSpec::new("Scheduler", "propose an appointment slot"),
        ])
        .unwrap()
    }

    fn engine(generator: Arc<dyn TextGenerator>) -> ExecutionEngine {
        ExecutionEngine::new(generator, EngineConfig::default())
    }

    #[tokio::test]
    async fn test_end_to_end_haircut_scenario() {
        // Supervisor and specialist turns interleave off one scripted queue:
        // decision, reply, decision, reply, terminal decision.
        let generator = Arc::new(ScriptedGenerator::replies([
            "Intake",
            "Got it, name please?",
            "Scheduler",
            "Tuesday 3pm works.",
            "FINISH",
        ]));

        let report = engine(generator)
            .run(&haircut_graph(), "I want a haircut next Tuesday", None, None)
            .await;

        let RunStatus::Terminated { final_response } = &report.status else {
            panic!("expected termination, got {:?}", report.status);
        };
        assert_eq!(final_response, "Tuesday 3pm works.");

        // Pinned transcript: user, supervisor, Intake, supervisor,
        // Scheduler. The terminal FINISH decision is not appended.
        let senders: Vec<&str> = report.state.iter().map(|m| m.sender.as_str()).collect();
        assert_eq!(
            senders,
            vec!["user", "supervisor", "Intake", "supervisor", "Scheduler"]
        );
        assert_eq!(report.state.len(), 5);

        // Termination idempotence: the final response equals the last
        // appended message.
        assert_eq!(report.state.last().unwrap().content, *final_response);
        assert!(report.persistence_failures.is_empty());
    }

    #[tokio::test]
    async fn test_turn_limit_bounds_a_looping_supervisor() {
        // A supervisor that always picks a valid, non-terminal role: every
        // odd call is a decision, every even call a specialist reply.
        let replies = std::iter::repeat(["Intake", "still collecting"])
            .take(64)
            .flatten();
        let generator = Arc::new(ScriptedGenerator::replies(replies));

        let config = EngineConfig { max_turns: 4 };
        let engine = ExecutionEngine::new(generator, config);

        let report = engine
            .run(&haircut_graph(), "I want a haircut", None, None)
            .await;

        let RunStatus::Failed { error } = &report.status else {
            panic!("expected turn-limit failure, got {:?}", report.status);
        };
        assert!(matches!(error, WorkflowError::TurnLimit(4)));

        // 4 round trips happened before the bound tripped: seed + 4 ×
        // (decision + reply).
        assert_eq!(report.state.len(), 1 + 4 * 2);
    }

    #[tokio::test]
    async fn test_routing_failure_keeps_partial_transcript() {
        let generator = Arc::new(ScriptedGenerator::replies([
            "Intake",
            "Got it, name please?",
            "Concierge",
            "Concierge",
            "Concierge",
        ]));

        let report = engine(generator)
            .run(&haircut_graph(), "I want a haircut", None, None)
            .await;

        let RunStatus::Failed { error } = &report.status else {
            panic!("expected failure, got {:?}", report.status);
        };
        assert!(matches!(error, WorkflowError::Routing(_)));

        // Everything appended before the failure is retained.
        let senders: Vec<&str> = report.state.iter().map(|m| m.sender.as_str()).collect();
        assert_eq!(senders, vec!["user", "supervisor", "Intake"]);
    }

    #[tokio::test]
    async fn test_cancellation_between_transitions() {
        let generator = Arc::new(ScriptedGenerator::replies(["Intake", "noted"]));
        let cancel = CancelHandle::new();
        cancel.cancel();

        let report = engine(generator.clone())
            .run(&haircut_graph(), "I want a haircut", None, Some(&cancel))
            .await;

        assert!(matches!(report.status, RunStatus::Cancelled));
        // Cancelled before the first decision: only the seed message, and no
        // generation call was made.
        assert_eq!(report.state.len(), 1);
        assert_eq!(generator.call_count(), 0);
    }

    /// Sink that accepts appends until a scripted failure position.
    struct FlakySink {
        appended: Mutex<Vec<(usize, Message)>>,
        fail_at: usize,
    }

    #[async_trait]
    impl TranscriptSink for FlakySink {
        async fn append(&self, position: usize, message: &Message) -> Result<(), WorkflowError> {
            if position == self.fail_at {
                return Err(WorkflowError::Persistence("disk full".to_string()));
            }
            self.appended.lock().unwrap().push((position, message.clone()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_fail_the_run() {
        let generator = Arc::new(ScriptedGenerator::replies([
            "Intake",
            "Got it, name please?",
            "FINISH",
        ]));
        let sink = FlakySink {
            appended: Mutex::new(Vec::new()),
            fail_at: 1,
        };

        let report = engine(generator)
            .run(&haircut_graph(), "I want a haircut", Some(&sink), None)
            .await;

        // The run still terminated; the write failure is surfaced
        // separately, and the turn it belonged to stands.
        assert!(report.is_terminated());
        assert_eq!(report.persistence_failures.len(), 1);
        assert!(report.persistence_failures[0].contains("disk full"));
        assert_eq!(report.state.len(), 3);

        let appended = sink.appended.lock().unwrap();
        let positions: Vec<usize> = appended.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![0, 2]);
    }

    #[tokio::test]
    async fn test_sink_receives_every_append_in_order() {
        let generator = Arc::new(ScriptedGenerator::replies([
            "Intake",
            "Got it, name please?",
            "Scheduler",
            "Tuesday 3pm works.",
            "FINISH",
        ]));
        let sink = FlakySink {
            appended: Mutex::new(Vec::new()),
            fail_at: usize::MAX,
        };

        let report = engine(generator)
            .run(&haircut_graph(), "I want a haircut next Tuesday", Some(&sink), None)
            .await;
        assert!(report.is_terminated());

        let appended = sink.appended.lock().unwrap();
        let rows: Vec<(usize, &str)> = appended
            .iter()
            .map(|(p, m)| (*p, m.sender.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![
                (0, "user"),
                (1, "supervisor"),
                (2, "Intake"),
                (3, "supervisor"),
                (4, "Scheduler"),
            ]
        );
    }
}
