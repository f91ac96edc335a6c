//! Error types for the dependency graph and diagram transformation.

use reliant_model::ModelError;

/// Errors from building or traversing the dependency graph.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("cyclic dependency detected involving node {0}")]
    CyclicDependency(String),

    #[error("node {0} not found")]
    UnknownNode(String),

    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("invalid node id '{id}': {reason}")]
    InvalidNodeId { id: String, reason: String },

    #[error("{kind} fragment in diagram '{diagram}' has no embedded diagrams")]
    EmptyFragment { diagram: String, kind: String },

    #[error("message '{message}' has probability {value}, expected a value in [0, 1]")]
    InvalidProbability { message: String, value: f64 },

    #[error("model construction failed: {0}")]
    Model(#[from] ModelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = GraphError::CyclicDependency("A".into());
        assert!(err.to_string().contains("cyclic"));

        let err: GraphError = ModelError::UnknownState {
            model: "s".into(),
            state: 7,
        }
        .into();
        assert!(err.to_string().contains("model construction failed"));

        let err = GraphError::InvalidNodeId {
            id: "Oxygen-Sensor".into(),
            reason: "ids may only contain letters, digits and '_'".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid node id 'Oxygen-Sensor': ids may only contain letters, digits and '_'"
        );
    }
}
