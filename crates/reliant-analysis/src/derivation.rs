//! Composition of per-component formulas into one family expression.
//!
//! Components are processed leaves first. In the formula of each component,
//! every dependency id is replaced by that dependency's already composed
//! formula, guarded by the class symbol `p` of its presence condition:
//!
//! ```text
//! ((p * (dependency)) + (1 - p))
//! ```
//!
//! which is the dependency's reliability when `p` is 1 and 1 otherwise: an
//! absent component cannot fail. Unconditional dependencies are substituted
//! as `(dependency)` with no symbol.

use std::collections::HashMap;

use tracing::debug;

use reliant_expr::substitute;
use reliant_graph::GraphError;

use crate::component::Component;
use crate::equivalence::PresenceConditionClasses;
use crate::error::AnalysisError;

/// Guard `formula` by presence symbol `symbol`, or just parenthesize it when
/// the component is always present.
pub fn if_present(symbol: Option<&str>, formula: &str) -> String {
    match symbol {
        Some(p) => format!("(({p} * ({formula})) + (1 - {p}))"),
        None => format!("({formula})"),
    }
}

/// Compose the formulas of a leaves-first component list into the
/// expression of `root`, in terms of the class symbols of `classes`.
pub fn derive_expression(
    components: &[Component<String>],
    classes: &PresenceConditionClasses,
    root: &str,
) -> Result<String, AnalysisError> {
    let mut derived: HashMap<&str, String> = HashMap::new();
    let mut conditions: HashMap<&str, &str> = HashMap::new();

    for component in components {
        let mut replacements = HashMap::new();
        for dependency in &component.dependencies {
            let (Some(formula), Some(condition)) = (
                derived.get(dependency.as_str()),
                conditions.get(dependency.as_str()),
            ) else {
                return Err(GraphError::UnknownNode(dependency.clone()).into());
            };
            let symbol = classes.symbol_for(condition)?;
            replacements.insert(dependency.clone(), if_present(symbol, formula));
        }

        let formula = substitute(&component.asset, &replacements).map_err(|source| {
            AnalysisError::Formula {
                node: component.id.clone(),
                source,
            }
        })?;
        debug!(node = %component.id, %formula, "composed formula");
        derived.insert(component.id.as_str(), formula);
        conditions.insert(component.id.as_str(), component.presence_condition.as_str());
    }

    derived
        .remove(root)
        .ok_or_else(|| GraphError::UnknownNode(root.to_string()).into())
}

/// Replace each dependency id of `component` by its guarded form, keeping
/// the ids themselves as variables.
pub(crate) fn lift(
    component: &Component<String>,
    presence: &HashMap<&str, &str>,
    classes: &PresenceConditionClasses,
) -> Result<String, AnalysisError> {
    let mut replacements = HashMap::new();
    for dependency in &component.dependencies {
        let condition = presence
            .get(dependency.as_str())
            .ok_or_else(|| GraphError::UnknownNode(dependency.clone()))?;
        let symbol = classes.symbol_for(condition)?;
        if symbol.is_some() {
            replacements.insert(dependency.clone(), if_present(symbol, dependency));
        }
    }
    substitute(&component.asset, &replacements).map_err(|source| AnalysisError::Formula {
        node: component.id.clone(),
        source,
    })
}
