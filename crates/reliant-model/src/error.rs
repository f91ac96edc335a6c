//! Error types for model construction and model checking.

use crate::state::StateId;

/// Errors raised while building a state model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("model '{model}' already has an initial state ({existing})")]
    InitialStateExists { model: String, existing: StateId },

    #[error("model '{model}' already has a success state ({existing})")]
    SuccessStateExists { model: String, existing: StateId },

    #[error("model '{model}' already has an error state ({existing})")]
    ErrorStateExists { model: String, existing: StateId },

    #[error("state {state} does not belong to model '{model}'")]
    UnknownState { model: String, state: StateId },
}

/// Errors raised by a parametric model checker.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckerError {
    #[error("model '{0}' has no initial state")]
    NoInitialState(String),

    #[error("model '{0}' has no success state")]
    NoSuccessState(String),

    #[error("model '{model}' contains a cycle through state {state}")]
    CyclicModel { model: String, state: StateId },

    #[error("invalid probability '{probability}' in model '{model}': {reason}")]
    InvalidProbability {
        model: String,
        probability: String,
        reason: String,
    },

    #[error("model checker failed: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ModelError::InitialStateExists {
            model: "s".into(),
            existing: 0,
        };
        assert!(err.to_string().contains("initial state"));

        let err = CheckerError::CyclicModel {
            model: "s".into(),
            state: 3,
        };
        assert!(err.to_string().contains("cycle"));
    }
}
