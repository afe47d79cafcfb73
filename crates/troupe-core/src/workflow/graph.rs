//! Workflow graph — the star topology built once per roster.
//!
//! One node per specialist plus a fixed supervisor node. Specialists never
//! invoke each other directly; every specialist edge returns to the
//! supervisor, which is the sole routing authority. The topology is
//! data-driven: roles are arena slots keyed by name, and the supervisor's
//! textual decision is resolved through a closed dispatch table.

use std::collections::HashMap;

use crate::models::AgentSpec;
use crate::workflow::error::WorkflowError;

/// Name of the fixed supervisor node. Always the entry point.
pub const SUPERVISOR_NODE: &str = "supervisor";

/// The reserved completion token: "no further turns; return the last
/// response."
pub const FINISH_TOKEN: &str = "FINISH";

/// Where a validated supervisor decision dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    /// Run the specialist in this arena slot.
    Agent(usize),
    /// End the run.
    Terminate,
}

/// The immutable routing structure for one roster.
///
/// Built once per roster and shared read-only across all conversations that
/// use it.
#[derive(Debug)]
pub struct WorkflowGraph {
    specs: Vec<AgentSpec>,
    dispatch: HashMap<String, RouteTarget>,
}

impl WorkflowGraph {
    /// Build the graph for an ordered roster.
    ///
    /// Fails with `Configuration` if the roster is empty, contains duplicate
    /// role names, or uses a reserved name (roles double as routing keys).
    pub fn build(roster: Vec<AgentSpec>) -> Result<Self, WorkflowError> {
        if roster.is_empty() {
            return Err(WorkflowError::Configuration(
                "roster must contain at least one agent".to_string(),
            ));
        }

        let mut dispatch: HashMap<String, RouteTarget> = HashMap::with_capacity(roster.len() + 1);
        for (slot, spec) in roster.iter().enumerate() {
            if spec.role == SUPERVISOR_NODE || spec.role == FINISH_TOKEN {
                return Err(WorkflowError::Configuration(format!(
                    "role name '{}' is reserved",
                    spec.role
                )));
            }
            if dispatch
                .insert(spec.role.clone(), RouteTarget::Agent(slot))
                .is_some()
            {
                return Err(WorkflowError::Configuration(format!(
                    "duplicate role name '{}' in roster",
                    spec.role
                )));
            }
        }
        dispatch.insert(FINISH_TOKEN.to_string(), RouteTarget::Terminate);

        Ok(Self {
            specs: roster,
            dispatch,
        })
    }

    /// Entry point: every conversation starts by letting the supervisor
    /// choose the first actor.
    pub fn entry(&self) -> &'static str {
        SUPERVISOR_NODE
    }

    /// The ordered roster this graph was built from.
    pub fn specs(&self) -> &[AgentSpec] {
        &self.specs
    }

    /// Role names, in roster order.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.role.as_str())
    }

    /// All node names: the roster roles plus the supervisor.
    pub fn nodes(&self) -> Vec<&str> {
        let mut nodes: Vec<&str> = self.roles().collect();
        nodes.push(SUPERVISOR_NODE);
        nodes
    }

    /// The return edges of the star: every specialist routes back to the
    /// supervisor.
    pub fn return_edges(&self) -> impl Iterator<Item = (&str, &'static str)> {
        self.roles().map(|role| (role, SUPERVISOR_NODE))
    }

    /// Resolve a decision token through the dispatch table. `None` means the
    /// token is outside the closed set — a routing error, never a default.
    pub fn dispatch(&self, token: &str) -> Option<RouteTarget> {
        self.dispatch.get(token).copied()
    }

    /// Look up a specialist's spec by role name.
    pub fn spec_for(&self, role: &str) -> Option<&AgentSpec> {
        match self.dispatch.get(role) {
            Some(RouteTarget::Agent(slot)) => self.specs.get(*slot),
            _ => None,
        }
    }

    pub fn agent_count(&self) -> usize {
        self.specs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<AgentSpec> {
        vec![
            AgentSpec::new("Intake", "collect customer name and desired service"),
            AgentSpec::new("Scheduler", "propose an appointment slot"),
        ]
    }

    #[test]
    fn test_build_dispatch_range() {
        let graph = WorkflowGraph::build(roster()).unwrap();

        // The dispatch range is exactly the roster roles plus the terminal
        // marker.
        assert_eq!(graph.dispatch("Intake"), Some(RouteTarget::Agent(0)));
        assert_eq!(graph.dispatch("Scheduler"), Some(RouteTarget::Agent(1)));
        assert_eq!(graph.dispatch(FINISH_TOKEN), Some(RouteTarget::Terminate));
        assert_eq!(graph.dispatch("Closer"), None);

        assert_eq!(graph.entry(), SUPERVISOR_NODE);
        assert_eq!(graph.agent_count(), 2);
        assert!(graph.nodes().contains(&SUPERVISOR_NODE));
    }

    #[test]
    fn test_every_specialist_returns_to_supervisor() {
        let graph = WorkflowGraph::build(roster()).unwrap();
        let edges: Vec<_> = graph.return_edges().collect();
        assert_eq!(
            edges,
            vec![("Intake", SUPERVISOR_NODE), ("Scheduler", SUPERVISOR_NODE)]
        );
    }

    #[test]
    fn test_empty_roster_is_rejected() {
        let err = WorkflowGraph::build(Vec::new()).unwrap_err();
        assert!(matches!(err, WorkflowError::Configuration(_)));
    }

    #[test]
    fn test_duplicate_roles_are_rejected() {
        let err = WorkflowGraph::build(vec![
            AgentSpec::new("Intake", "first"),
            AgentSpec::new("Intake", "second"),
        ])
        .unwrap_err();
        assert!(matches!(err, WorkflowError::Configuration(_)));
    }

    #[test]
    fn test_reserved_role_names_are_rejected() {
        for reserved in [SUPERVISOR_NODE, FINISH_TOKEN] {
            let err = WorkflowGraph::build(vec![AgentSpec::new(reserved, "anything")]).unwrap_err();
            assert!(matches!(err, WorkflowError::Configuration(_)));
        }
    }

    #[test]
    fn test_spec_lookup_by_role() {
        let graph = WorkflowGraph::build(roster()).unwrap();
        let spec = graph.spec_for("Scheduler").unwrap();
        assert_eq!(spec.responsibilities, "propose an appointment slot");
        assert!(graph.spec_for(SUPERVISOR_NODE).is_none());
        assert!(graph.spec_for(FINISH_TOKEN).is_none());
    }
}
