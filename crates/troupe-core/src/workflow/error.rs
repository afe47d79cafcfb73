//! Error taxonomy for the workflow engine.
//!
//! Every failure mode of a run maps onto exactly one of these variants, and
//! none of them is ever silently swallowed: the engine preserves whatever
//! conversation state existed at the failure point and surfaces the reason.

#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkflowError {
    /// Bad or empty roster — the caller must not proceed to execution.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The supervisor's decision text did not match any allowed token after
    /// retry exhaustion. Fatal to the run.
    #[error("routing error: {0}")]
    Routing(String),

    /// Unrecoverable failure of the text-generation capability. Fatal to the
    /// run once bounded retries are exhausted.
    #[error("generation error: {0}")]
    Generation(String),

    /// The architect produced an unusable roster — fatal before a workflow
    /// graph even exists.
    #[error("design error: {0}")]
    Design(String),

    /// A transcript write failed. Surfaced but never retroactively
    /// invalidates a turn that already executed.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The supervisor never emitted the completion token within the
    /// configured bound.
    #[error("turn limit exceeded ({0} turns)")]
    TurnLimit(u32),
}
