//! Shared application state for the HTTP server and CLI.

use std::sync::Arc;

use crate::db::Database;
use crate::store::{ConversationStore, UseCaseStore};
use crate::workflow::{
    Architect, EngineConfig, ExecutionEngine, TextGenerator, WorkflowCache,
};

/// Shared state accessible by all API handlers.
pub struct AppStateInner {
    pub db: Database,
    pub use_case_store: UseCaseStore,
    pub conversation_store: ConversationStore,
    pub workflow_cache: WorkflowCache,
    pub architect: Architect,
    pub engine: ExecutionEngine,
}

pub type AppState = Arc<AppStateInner>;

impl AppStateInner {
    pub fn new(
        db: Database,
        generator: Arc<dyn TextGenerator>,
        engine_config: EngineConfig,
    ) -> Self {
        Self {
            use_case_store: UseCaseStore::new(db.clone()),
            conversation_store: ConversationStore::new(db.clone()),
            workflow_cache: WorkflowCache::new(),
            architect: Architect::new(generator.clone()),
            engine: ExecutionEngine::new(generator, engine_config),
            db,
        }
    }
}
