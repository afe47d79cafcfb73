//! Workflow cache — compiled graphs keyed by use case.
//!
//! A graph is immutable for the lifetime of the conversations that use it,
//! so concurrent runs of the same roster share one `Arc<WorkflowGraph>`.
//! The cache is an explicit component with a defined lifecycle: entries are
//! evicted when their use case is deleted, not ambient global state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::AgentSpec;
use crate::workflow::error::WorkflowError;
use crate::workflow::graph::WorkflowGraph;

#[derive(Default)]
pub struct WorkflowCache {
    graphs: RwLock<HashMap<String, Arc<WorkflowGraph>>>,
}

impl WorkflowCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, use_case_id: &str) -> Option<Arc<WorkflowGraph>> {
        self.graphs.read().await.get(use_case_id).cloned()
    }

    /// Return the cached graph for a use case, building it from the roster
    /// on a miss.
    pub async fn get_or_build(
        &self,
        use_case_id: &str,
        roster: Vec<AgentSpec>,
    ) -> Result<Arc<WorkflowGraph>, WorkflowError> {
        if let Some(graph) = self.get(use_case_id).await {
            return Ok(graph);
        }

        let graph = Arc::new(WorkflowGraph::build(roster)?);
        let mut graphs = self.graphs.write().await;
        // A concurrent builder may have won the race; both built from the
        // same immutable roster, so either graph is fine.
        let entry = graphs
            .entry(use_case_id.to_string())
            .or_insert_with(|| graph.clone());
        Ok(entry.clone())
    }

    /// Drop the compiled graph for a use case. Called on use-case deletion.
    pub async fn invalidate(&self, use_case_id: &str) {
        if self.graphs.write().await.remove(use_case_id).is_some() {
            tracing::debug!("evicted workflow graph for use case {}", use_case_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<AgentSpec> {
        vec![AgentSpec::new("Solo", "do everything")]
    }

    #[tokio::test]
    async fn test_get_or_build_caches_the_graph() {
        let cache = WorkflowCache::new();
        assert!(cache.get("case-1").await.is_none());

        let first = cache.get_or_build("case-1", roster()).await.unwrap();
        let second = cache.get_or_build("case-1", Vec::new()).await.unwrap();

        // The second call hit the cache: the empty roster never reached the
        // builder.
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_invalidate_evicts_the_entry() {
        let cache = WorkflowCache::new();
        cache.get_or_build("case-1", roster()).await.unwrap();

        cache.invalidate("case-1").await;
        assert!(cache.get("case-1").await.is_none());

        // A later build on the empty roster now fails configuration, proving
        // the eviction.
        let err = cache.get_or_build("case-1", Vec::new()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Configuration(_)));
    }
}
