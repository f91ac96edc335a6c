//! RDG nodes.

use serde::Serialize;

use reliant_model::StateModel;

use crate::error::GraphError;

/// Identifier of a node in the dependency graph.
pub type NodeId = String;

/// Presence condition of a node that is part of every product.
pub const UNCONDITIONAL: &str = "true";

/// Prefix of the presence-condition class symbols that share a variable
/// namespace with node ids during analysis.
pub const RESERVED_ID_PREFIX: &str = "_pc";

/// Check that `id` can stand for the node's reliability inside a formula:
/// a single identifier token that is neither a Boolean literal nor in the
/// reserved `_pc` namespace.
pub fn validate_node_id(id: &str) -> Result<(), GraphError> {
    let invalid = |reason: &str| GraphError::InvalidNodeId {
        id: id.to_string(),
        reason: reason.to_string(),
    };

    let mut chars = id.chars();
    match chars.next() {
        None => return Err(invalid("ids must not be empty")),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            return Err(invalid("ids must start with a letter or '_'"))
        }
        Some(_) => {}
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid("ids may only contain letters, digits and '_'"));
    }
    if id == "true" || id == "false" {
        return Err(invalid("Boolean literals are not ids"));
    }
    if id.starts_with(RESERVED_ID_PREFIX) {
        return Err(invalid("the '_pc' prefix is reserved for presence-condition classes"));
    }
    Ok(())
}

/// One component of the dependency graph: a state model guarded by a
/// presence condition, plus the ids of the nodes it calls.
#[derive(Debug, Clone, Serialize)]
pub struct RdgNode {
    pub id: NodeId,
    /// Boolean formula over feature names; `"true"` when unconditional.
    pub presence_condition: String,
    pub model: StateModel,
    /// Direct dependencies in discovery order, without duplicates.
    pub dependencies: Vec<NodeId>,
}

impl RdgNode {
    /// Create a node. A blank presence condition means unconditional.
    pub fn new(id: impl Into<NodeId>, presence_condition: &str, model: StateModel) -> Self {
        let presence_condition = if presence_condition.trim().is_empty() {
            UNCONDITIONAL.to_string()
        } else {
            presence_condition.trim().to_string()
        };
        Self {
            id: id.into(),
            presence_condition,
            model,
            dependencies: Vec::new(),
        }
    }

    /// Builder-style dependency addition.
    pub fn depends_on(mut self, dependency: impl Into<NodeId>) -> Self {
        self.add_dependency(dependency);
        self
    }

    /// Record a direct dependency. Repeated ids are kept once.
    pub fn add_dependency(&mut self, dependency: impl Into<NodeId>) {
        let dependency = dependency.into();
        if !self.dependencies.contains(&dependency) {
            self.dependencies.push(dependency);
        }
    }

    /// Whether the node is present in every product.
    pub fn is_unconditional(&self) -> bool {
        self.presence_condition == UNCONDITIONAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_condition_is_unconditional() {
        let node = RdgNode::new("A", "  ", StateModel::new("a"));
        assert_eq!(node.presence_condition, UNCONDITIONAL);
        assert!(node.is_unconditional());

        let node = RdgNode::new("B", " Memory ", StateModel::new("b"));
        assert_eq!(node.presence_condition, "Memory");
        assert!(!node.is_unconditional());
    }

    #[test]
    fn dependencies_are_deduplicated() {
        let node = RdgNode::new("A", "true", StateModel::new("a"))
            .depends_on("B")
            .depends_on("C")
            .depends_on("B");
        assert_eq!(node.dependencies, vec!["B", "C"]);
    }

    #[test]
    fn node_ids_are_single_identifiers() {
        for id in ["BSN", "Oxygen_Sensor", "_private", "n0", "d499", "truth", "_p"] {
            assert_eq!(validate_node_id(id), Ok(()), "{id}");
        }
        for id in [
            "",
            "true",
            "false",
            "Oxygen-Sensor",
            "Oxygen Sensor",
            "1abc",
            "a.b",
            "Sensör",
            "_pc0",
            "_pcache",
        ] {
            assert!(
                matches!(validate_node_id(id), Err(GraphError::InvalidNodeId { .. })),
                "{id:?} should be rejected"
            );
        }
    }
}
