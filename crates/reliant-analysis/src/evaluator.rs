//! Evaluation of a reliability function over many configurations.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use reliant_expr::{format_decimal, substitute_reporting, Expression};

use crate::configuration::Configuration;
use crate::equivalence::{ClassIndicators, PresenceConditionClasses};
use crate::error::{AnalysisError, EvaluationError};
use crate::pruning::{NoPruning, PruningStrategy};
use crate::results::AnalysisResults;

/// Where configurations are evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcurrencyStrategy {
    /// On the calling thread, in input order.
    Sequential,
    /// On the rayon worker pool, in no particular order.
    #[default]
    Parallel,
}

impl fmt::Display for ConcurrencyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcurrencyStrategy::Sequential => write!(f, "sequential"),
            ConcurrencyStrategy::Parallel => write!(f, "parallel"),
        }
    }
}

impl FromStr for ConcurrencyStrategy {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" => Ok(ConcurrencyStrategy::Sequential),
            "parallel" => Ok(ConcurrencyStrategy::Parallel),
            other => Err(AnalysisError::UnknownConcurrency(other.to_string())),
        }
    }
}

/// Reliability as a function of the feature configuration.
pub trait ReliabilityFunction: Send + Sync {
    fn reliability(&self, configuration: &Configuration) -> Result<f64, EvaluationError>;
}

/// A closed-form expression over presence class symbols.
///
/// For each configuration, every class symbol is replaced in the text by
/// `1.0` or `0.0` and the result is solved. Identifiers that are not class
/// symbols are reported and left in place; solving then fails for that
/// configuration.
#[derive(Debug, Clone)]
pub struct SymbolicReliability {
    formula: String,
    indicators: ClassIndicators,
}

impl SymbolicReliability {
    pub fn new(formula: &str, classes: &PresenceConditionClasses) -> Result<Self, AnalysisError> {
        Expression::parse(formula).map_err(AnalysisError::Expression)?;
        Ok(Self {
            formula: formula.to_string(),
            indicators: classes.compile()?,
        })
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }
}

impl ReliabilityFunction for SymbolicReliability {
    fn reliability(&self, configuration: &Configuration) -> Result<f64, EvaluationError> {
        let replacements: HashMap<String, String> = self
            .indicators
            .interpretation(configuration)
            .into_iter()
            .map(|(symbol, value)| (symbol, format_decimal(value)))
            .collect();
        let concrete = substitute_reporting(&self.formula, &replacements)?;
        let value = Expression::parse(&concrete)?.eval_with(|_| None)?;
        Ok(value)
    }
}

/// Applies a [`ReliabilityFunction`] to a stream of configurations.
///
/// Evaluations share nothing mutable, so parallel and sequential runs give
/// the same results. A failing configuration is recorded as such and does
/// not affect the others.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationEvaluator {
    concurrency: ConcurrencyStrategy,
    features: Option<BTreeSet<String>>,
}

impl ConfigurationEvaluator {
    pub fn new(concurrency: ConcurrencyStrategy) -> Self {
        Self {
            concurrency,
            features: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: ConcurrencyStrategy) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Restrict configurations to the given features. A configuration
    /// enabling anything else fails with [`EvaluationError::UnknownFeature`].
    pub fn with_feature_universe<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = Some(features.into_iter().map(Into::into).collect());
        self
    }

    pub fn concurrency(&self) -> ConcurrencyStrategy {
        self.concurrency
    }

    /// Evaluate `function` for every configuration, then apply `pruning`.
    pub fn evaluate<I>(
        &self,
        function: &dyn ReliabilityFunction,
        pruning: &dyn PruningStrategy,
        configurations: I,
    ) -> AnalysisResults
    where
        I: IntoIterator<Item = Configuration>,
    {
        let configurations: Vec<Configuration> = configurations.into_iter().collect();
        info!(
            configurations = configurations.len(),
            concurrency = %self.concurrency,
            "evaluating configurations"
        );

        let outcomes: Vec<(Configuration, Result<f64, EvaluationError>)> = match self.concurrency {
            ConcurrencyStrategy::Sequential => configurations
                .into_iter()
                .map(|c| {
                    let outcome = self.evaluate_one(function, pruning, &c);
                    (c, outcome)
                })
                .collect(),
            ConcurrencyStrategy::Parallel => configurations
                .into_par_iter()
                .map(|c| {
                    let outcome = self.evaluate_one(function, pruning, &c);
                    (c, outcome)
                })
                .collect(),
        };

        let results: AnalysisResults = outcomes.into_iter().collect();
        let failures = results.failures().count();
        if failures > 0 {
            warn!(failures, "some configurations could not be evaluated");
        }
        results
    }

    /// Evaluate a family expression over class symbols, without pruning.
    pub fn evaluate_formula<I>(
        &self,
        formula: &str,
        classes: &PresenceConditionClasses,
        configurations: I,
    ) -> Result<AnalysisResults, AnalysisError>
    where
        I: IntoIterator<Item = Configuration>,
    {
        let function = SymbolicReliability::new(formula, classes)?;
        Ok(self.evaluate(&function, &NoPruning, configurations))
    }

    fn evaluate_one(
        &self,
        function: &dyn ReliabilityFunction,
        pruning: &dyn PruningStrategy,
        configuration: &Configuration,
    ) -> Result<f64, EvaluationError> {
        if let Some(features) = &self.features {
            if let Some(unknown) = configuration.iter().find(|f| !features.contains(*f)) {
                return Err(EvaluationError::UnknownFeature(unknown.to_string()));
            }
        }
        let reliability = function.reliability(configuration)?;
        if !reliability.is_finite() {
            return Err(EvaluationError::NotFinite(reliability));
        }
        let pruned = pruning.prune(configuration, reliability);
        debug!(%configuration, reliability = pruned, "evaluated configuration");
        Ok(pruned)
    }
}
