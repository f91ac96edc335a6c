//! Parametric model checking boundary.
//!
//! A parametric model checker turns a [`StateModel`] into a rational function
//! giving the probability of eventually reaching the success state. The free
//! variables of that function are the symbolic transition parameters, in
//! particular the callee ids of the model's interfaces.

use std::collections::{HashMap, HashSet};

use reliant_expr::{tokenize, TokenKind};
use tracing::debug;

use crate::error::CheckerError;
use crate::model::StateModel;
use crate::state::StateId;

/// Computes the reliability formula of a state model.
pub trait ParametricModelChecker: Send + Sync {
    /// Probability of reaching the success state from the initial state, as
    /// algebraic text over the model's symbolic parameters.
    fn reliability_formula(&self, model: &StateModel) -> Result<String, CheckerError>;
}

/// Model checker for models whose only cycles are self-loops on the success
/// or error state.
///
/// Reliability is accumulated backwards from the absorbing states:
/// `R(success) = 1`, `R(error) = 0` and, for every other state,
/// `R(s) = Σ p(s→t)·R(t)`. States without outgoing transitions are dead ends
/// with reliability 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcyclicModelChecker;

impl AcyclicModelChecker {
    pub fn new() -> Self {
        Self
    }
}

impl ParametricModelChecker for AcyclicModelChecker {
    fn reliability_formula(&self, model: &StateModel) -> Result<String, CheckerError> {
        let name = model.variable_name().to_string();
        let initial = model
            .initial_state()
            .ok_or_else(|| CheckerError::NoInitialState(name.clone()))?;
        let success = model
            .success_state()
            .ok_or_else(|| CheckerError::NoSuccessState(name.clone()))?;
        let error = model.error_state();

        for t in model.transitions() {
            validate_probability(&name, &t.probability)?;
        }

        let mut memo: HashMap<StateId, String> = HashMap::new();
        let mut on_path: HashSet<StateId> = HashSet::new();
        let mut stack: Vec<(StateId, bool)> = vec![(initial, false)];

        while let Some((state, expanded)) = stack.pop() {
            if memo.contains_key(&state) {
                continue;
            }
            if state == success {
                memo.insert(state, "1".to_string());
                continue;
            }
            if Some(state) == error {
                memo.insert(state, "0".to_string());
                continue;
            }

            if expanded {
                let mut terms = Vec::new();
                for t in model.outgoing(state) {
                    let reach = memo.get(&t.target).map(String::as_str).unwrap_or("0");
                    if let Some(term) = product(&t.probability, reach) {
                        terms.push(term);
                    }
                }
                on_path.remove(&state);
                let formula = if terms.is_empty() {
                    "0".to_string()
                } else {
                    terms.join(" + ")
                };
                memo.insert(state, formula);
                continue;
            }

            if !on_path.insert(state) {
                return Err(CheckerError::CyclicModel { model: name, state });
            }
            stack.push((state, true));
            for t in model.outgoing(state) {
                if memo.contains_key(&t.target) {
                    continue;
                }
                if on_path.contains(&t.target) {
                    return Err(CheckerError::CyclicModel {
                        model: name,
                        state: t.target,
                    });
                }
                stack.push((t.target, false));
            }
        }

        let formula = memo.remove(&initial).unwrap_or_else(|| "0".to_string());
        debug!(model = %name, %formula, "computed reliability formula");
        Ok(formula)
    }
}

fn validate_probability(model: &str, probability: &str) -> Result<(), CheckerError> {
    let tokens = tokenize(probability).map_err(|e| CheckerError::InvalidProbability {
        model: model.to_string(),
        probability: probability.to_string(),
        reason: e.to_string(),
    })?;
    if tokens.is_empty() {
        return Err(CheckerError::InvalidProbability {
            model: model.to_string(),
            probability: probability.to_string(),
            reason: "empty probability".into(),
        });
    }
    Ok(())
}

/// `p·r` with the trivial factors folded away. `None` when the product is 0.
fn product(probability: &str, reach: &str) -> Option<String> {
    if is_constant(probability, 0.0) || is_constant(reach, 0.0) {
        return None;
    }
    if is_constant(reach, 1.0) {
        return Some(factor(probability));
    }
    if is_constant(probability, 1.0) {
        return Some(reach.to_string());
    }
    Some(format!("{}*{}", factor(probability), factor(reach)))
}

fn is_constant(text: &str, value: f64) -> bool {
    text.trim().parse::<f64>().is_ok_and(|v| v == value)
}

/// Parenthesize anything that is not a single number or identifier or a
/// plain product, so it can sit inside a product.
fn factor(text: &str) -> String {
    let text = text.trim();
    let needs_parens = match tokenize(text) {
        Ok(tokens) => tokens.iter().any(|t| {
            !matches!(
                t.kind,
                TokenKind::Number(_) | TokenKind::Ident(_) | TokenKind::Star
            )
        }),
        Err(_) => true,
    };
    if needs_parens {
        format!("({text})")
    } else {
        text.to_string()
    }
}
