//! States of a probabilistic state model.

use std::fmt;

use serde::Serialize;

/// Index of a state within its model (creation order, zero-based).
pub type StateId = usize;

/// Label given to the initial state.
pub const INITIAL_LABEL: &str = "init";
/// Label given to the success state.
pub const SUCCESS_LABEL: &str = "success";
/// Label given to the error state.
pub const ERROR_LABEL: &str = "fail";

/// A state in a [`StateModel`](crate::StateModel).
///
/// Equality compares the structural position (index) and the label only. The
/// owning model's variable name is a rendering prefix and does not take part,
/// so states of two models that differ only in their variable names compare
/// equal.
#[derive(Debug, Clone, Serialize)]
pub struct State {
    pub index: StateId,
    pub label: Option<String>,
    pub variable_name: String,
}

impl State {
    pub(crate) fn new(index: StateId, label: Option<String>, variable_name: &str) -> Self {
        Self {
            index,
            label,
            variable_name: variable_name.to_string(),
        }
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.label == other.label
    }
}

impl Eq for State {}

impl fmt::Display for State {
    /// `<var>=<index>` followed by `(<label>)` when labeled.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.variable_name, self.index)?;
        if let Some(label) = &self.label {
            write!(f, "({label})")?;
        }
        Ok(())
    }
}
