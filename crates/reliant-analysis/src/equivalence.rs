//! Presence-condition equivalence classes.
//!
//! Every distinct presence condition of a dependency closure gets one class
//! symbol, `_pc0`, `_pc1`, ..., in order of first appearance. The composed
//! reliability expression refers to presence only through these symbols, so
//! a condition shared by several components costs a single variable.
//!
//! Two conditions are equivalent when they are the same text once whitespace
//! is removed. Logically equivalent but differently written conditions
//! (`A && B` and `B && A`) stay in separate classes.

use std::collections::HashMap;

use reliant_expr::Expression;
use reliant_graph::{RESERVED_ID_PREFIX, UNCONDITIONAL};

use crate::configuration::Configuration;
use crate::error::AnalysisError;

/// Node ids may not use this prefix, so symbols never shadow a component.
const SYMBOL_PREFIX: &str = RESERVED_ID_PREFIX;

/// Mapping between distinct presence conditions and their class symbols.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceConditionClasses {
    /// `(symbol, normalized condition)` in class order.
    classes: Vec<(String, String)>,
    by_condition: HashMap<String, usize>,
}

impl PresenceConditionClasses {
    /// Partition `conditions` into classes. Unconditional entries (`"true"`
    /// or blank) get no class.
    pub fn from_conditions<I, S>(conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classes = Self::default();
        for condition in conditions {
            let normalized = normalize(condition.as_ref());
            if normalized == UNCONDITIONAL || classes.by_condition.contains_key(&normalized) {
                continue;
            }
            let symbol = format!("{SYMBOL_PREFIX}{}", classes.classes.len());
            classes
                .by_condition
                .insert(normalized.clone(), classes.classes.len());
            classes.classes.push((symbol, normalized));
        }
        classes
    }

    /// Class symbol of `condition`, or `None` when it is unconditional or
    /// was never classified.
    pub fn representative(&self, condition: &str) -> Option<&str> {
        self.by_condition
            .get(&normalize(condition))
            .map(|&i| self.classes[i].0.as_str())
    }

    /// The class symbol to use for `condition` in a composed expression:
    /// `None` for unconditional presence, an error if the condition has no
    /// class.
    pub fn symbol_for(&self, condition: &str) -> Result<Option<&str>, AnalysisError> {
        if is_unconditional(condition) {
            return Ok(None);
        }
        self.representative(condition)
            .map(Some)
            .ok_or_else(|| AnalysisError::UnknownFeature(condition.to_string()))
    }

    /// The normalized condition a symbol stands for.
    pub fn condition(&self, symbol: &str) -> Option<&str> {
        self.classes
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, c)| c.as_str())
    }

    /// `(symbol, condition)` pairs in class order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.classes.iter().map(|(s, c)| (s.as_str(), c.as_str()))
    }

    /// The distinct normalized conditions, in class order.
    pub fn conditions(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|(_, c)| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Parse every class condition once, for repeated evaluation.
    pub fn compile(&self) -> Result<ClassIndicators, AnalysisError> {
        let classes: Vec<(String, Expression)> = self
            .classes
            .iter()
            .map(|(symbol, condition)| {
                Expression::parse(condition)
                    .map(|expr| (symbol.clone(), expr))
                    .map_err(|source| AnalysisError::PresenceCondition {
                        condition: condition.clone(),
                        source,
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(ClassIndicators { classes })
    }
}

/// Parsed class conditions, evaluated against configurations.
#[derive(Debug, Clone)]
pub struct ClassIndicators {
    classes: Vec<(String, Expression)>,
}

impl ClassIndicators {
    /// `1.0` for every class whose condition holds in `configuration`,
    /// `0.0` for the others.
    pub fn interpretation(&self, configuration: &Configuration) -> HashMap<String, f64> {
        self.classes
            .iter()
            .map(|(symbol, condition)| {
                let value = if condition.holds(configuration.enabled()) {
                    1.0
                } else {
                    0.0
                };
                (symbol.clone(), value)
            })
            .collect()
    }
}

/// Strip all whitespace; a blank condition is unconditional.
pub fn normalize(condition: &str) -> String {
    let normalized: String = condition.chars().filter(|c| !c.is_whitespace()).collect();
    if normalized.is_empty() {
        UNCONDITIONAL.to_string()
    } else {
        normalized
    }
}

pub fn is_unconditional(condition: &str) -> bool {
    normalize(condition) == UNCONDITIONAL
}
