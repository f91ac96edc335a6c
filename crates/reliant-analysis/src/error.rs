//! Error types for reliability analysis.

use reliant_expr::ExprError;
use reliant_graph::GraphError;
use reliant_model::CheckerError;

/// Errors that abort the analysis of a root node.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("model checking failed for node {node}: {source}")]
    ModelChecking {
        node: String,
        #[source]
        source: CheckerError,
    },

    #[error("invalid reliability formula for node {node}: {source}")]
    Formula {
        node: String,
        #[source]
        source: ExprError,
    },

    #[error("invalid presence condition '{condition}': {source}")]
    PresenceCondition {
        condition: String,
        #[source]
        source: ExprError,
    },

    #[error("no equivalence class for presence condition '{0}'")]
    UnknownFeature(String),

    #[error("invalid reliability expression: {0}")]
    Expression(#[source] ExprError),

    #[error("invalid feature model: {0}")]
    FeatureModel(#[source] ExprError),

    #[error("unknown analysis strategy '{0}', expected feature, product or family")]
    UnknownStrategy(String),

    #[error("unknown concurrency '{0}', expected sequential or parallel")]
    UnknownConcurrency(String),
}

/// Failure to evaluate a single configuration. Stored per configuration in
/// the results; it never affects other configurations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("configuration enables unknown feature '{0}'")]
    UnknownFeature(String),

    #[error(transparent)]
    Solver(#[from] ExprError),

    #[error("reliability evaluated to {0}, which is not a finite number")]
    NotFinite(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err: AnalysisError = GraphError::CyclicDependency("A".into()).into();
        assert!(err.to_string().contains("cyclic"));

        let err = AnalysisError::ModelChecking {
            node: "BSN".into(),
            source: CheckerError::NoSuccessState("BSN_s".into()),
        };
        assert!(err.to_string().contains("BSN"));
        assert!(err.to_string().contains("no success state"));

        let err = AnalysisError::UnknownConcurrency("eventually".into());
        assert_eq!(
            err.to_string(),
            "unknown concurrency 'eventually', expected sequential or parallel"
        );

        let err: EvaluationError = ExprError::UnresolvedVariable("x".into()).into();
        assert_eq!(err.to_string(), "no interpretation for variable <x>");
    }
}
