//! Components and the model-checking phase.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use reliant_expr::identifiers;
use reliant_graph::{NodeId, RdgNode, UNCONDITIONAL};
use reliant_model::ParametricModelChecker;

use crate::equivalence::is_unconditional;
use crate::error::AnalysisError;
use crate::evaluator::ConcurrencyStrategy;

/// A dependency-graph node as seen by an analysis strategy: its presence
/// condition and dependencies, plus an asset of type `T` (a raw formula,
/// a parsed expression, a value...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component<T> {
    pub id: NodeId,
    pub presence_condition: String,
    pub asset: T,
    pub dependencies: Vec<NodeId>,
}

impl<T> Component<T> {
    pub fn new(
        id: impl Into<NodeId>,
        presence_condition: impl Into<String>,
        asset: T,
        dependencies: Vec<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            presence_condition: presence_condition.into(),
            asset,
            dependencies,
        }
    }

    /// Project a graph node, attaching `asset`.
    pub fn from_node(node: &RdgNode, asset: T) -> Self {
        Self::new(
            node.id.clone(),
            node.presence_condition.clone(),
            asset,
            node.dependencies.clone(),
        )
    }

    pub fn is_unconditional(&self) -> bool {
        is_unconditional(&self.presence_condition)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Component<U> {
        Component {
            id: self.id,
            presence_condition: self.presence_condition,
            asset: f(self.asset),
            dependencies: self.dependencies,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Component<U>, E> {
        Ok(Component {
            asset: f(self.asset)?,
            id: self.id,
            presence_condition: self.presence_condition,
            dependencies: self.dependencies,
        })
    }
}

impl Component<String> {
    /// An unconditional component with no dependencies.
    pub fn leaf(id: impl Into<NodeId>, formula: impl Into<String>) -> Self {
        Self::new(id, UNCONDITIONAL, formula.into(), Vec::new())
    }
}

/// Model check every node of a leaves-first closure, keeping the order.
///
/// Bracket characters some checkers wrap their output in (`[]{}`) are
/// stripped from the formulas. Variables that are not dependencies of the
/// node are reported but kept.
pub fn first_phase(
    closure: &[&RdgNode],
    checker: &dyn ParametricModelChecker,
    concurrency: ConcurrencyStrategy,
) -> Result<Vec<Component<String>>, AnalysisError> {
    info!(nodes = closure.len(), ?concurrency, "model checking dependency closure");
    let components = match concurrency {
        ConcurrencyStrategy::Sequential => closure
            .iter()
            .map(|node| check(node, checker))
            .collect::<Result<Vec<_>, _>>()?,
        ConcurrencyStrategy::Parallel => closure
            .par_iter()
            .map(|node| check(node, checker))
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(components)
}

fn check(
    node: &RdgNode,
    checker: &dyn ParametricModelChecker,
) -> Result<Component<String>, AnalysisError> {
    let raw = checker
        .reliability_formula(&node.model)
        .map_err(|source| AnalysisError::ModelChecking {
            node: node.id.clone(),
            source,
        })?;
    let formula = strip_brackets(&raw);
    debug!(node = %node.id, %formula, "reliability formula");

    let variables = identifiers(&formula).map_err(|source| AnalysisError::Formula {
        node: node.id.clone(),
        source,
    })?;
    for variable in variables {
        if !node.dependencies.contains(&variable) {
            warn!(
                node = %node.id,
                variable = %variable,
                "formula references a variable that is not a dependency"
            );
        }
    }
    Ok(Component::from_node(node, formula))
}

fn strip_brackets(formula: &str) -> String {
    formula
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '{' | '}'))
        .collect::<String>()
        .trim()
        .to_string()
}
