//! Transitions between states.

use serde::Serialize;

use crate::state::StateId;

/// Index of a transition within its model (creation order).
pub type TransitionId = usize;

/// What a transition stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// An ordinary probabilistic step.
    Plain,
    /// The callee of an interface finished successfully.
    InterfaceSuccess,
    /// The callee of an interface failed.
    InterfaceFailure,
}

/// A probabilistic transition.
///
/// `probability` is either a numeric literal (`"0.95"`) or a symbolic
/// expression over parameters (`"rAlpha"`, `"1-D"`).
///
/// Equality is structural: endpoints and kind always count, the probability
/// counts for plain transitions, and the action name never counts. Interface
/// transitions carry the callee id as their probability, so they compare by
/// kind alone.
#[derive(Debug, Clone, Serialize)]
pub struct Transition {
    pub id: TransitionId,
    pub source: StateId,
    pub target: StateId,
    pub action: String,
    pub probability: String,
    pub kind: TransitionKind,
}

impl PartialEq for Transition {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
            && self.target == other.target
            && self.kind == other.kind
            && (self.kind != TransitionKind::Plain || self.probability == other.probability)
    }
}

impl Eq for Transition {}
