//! Workflow engine — supervisor-routed multi-agent conversations.
//!
//! A roster of specialists is compiled into a star-shaped graph with a
//! supervisor at the hub; the execution engine then drives turn-taking from
//! the initial user message until the supervisor signals completion.
//!
//! # Architecture
//!
//! ```text
//! use case ──► Architect ──► roster ──► WorkflowGraph (built once, cached)
//!                                            │
//!                                      ExecutionEngine
//!                                       │          │
//!                              SupervisorRouter  AgentNodeExecutor
//!                                       │          │
//!                                     TextGenerator (HTTP)
//! ```
//!
//! Each turn appends exactly one message to the run's `ConversationState`;
//! every appended message is offered to a `TranscriptSink` for persistence.

pub mod agent;
pub mod architect;
pub mod cache;
pub mod engine;
pub mod error;
pub mod generator;
pub mod graph;
pub mod state;
pub mod supervisor;

pub use agent::AgentNodeExecutor;
pub use architect::Architect;
pub use cache::WorkflowCache;
pub use engine::{
    CancelHandle, EngineConfig, ExecutionEngine, RunReport, RunStatus, TranscriptSink,
};
pub use error::WorkflowError;
pub use generator::{GenerationFailure, GeneratorConfig, HttpGenerator, TextGenerator};
pub use graph::{RouteTarget, WorkflowGraph, FINISH_TOKEN, SUPERVISOR_NODE};
pub use state::{ConversationState, Message};
pub use supervisor::{RouteDecision, SupervisorRouter};
