//! End-to-end analysis of a root node.

use tracing::info;

use reliant_graph::DependencyGraph;
use reliant_model::ParametricModelChecker;

use crate::component::{first_phase, Component};
use crate::configuration::Configuration;
use crate::error::AnalysisError;
use crate::evaluator::{ConcurrencyStrategy, ConfigurationEvaluator};
use crate::pruning::{NoPruning, PruningStrategy};
use crate::results::AnalysisResults;
use crate::strategy::{AnalysisStrategy, FamilyBased, FamilyExpression, StrategyKind};

/// Runs closure, model checking, derivation and evaluation for a root node.
///
/// Defaults: family-based strategy, parallel evaluation, no pruning.
pub struct ReliabilityAnalyzer {
    checker: Box<dyn ParametricModelChecker>,
    strategy: Box<dyn AnalysisStrategy>,
    pruning: Box<dyn PruningStrategy>,
    evaluator: ConfigurationEvaluator,
}

impl ReliabilityAnalyzer {
    pub fn new(checker: impl ParametricModelChecker + 'static) -> Self {
        Self {
            checker: Box::new(checker),
            strategy: StrategyKind::default().strategy(),
            pruning: Box::new(NoPruning),
            evaluator: ConfigurationEvaluator::new(ConcurrencyStrategy::default()),
        }
    }

    pub fn with_strategy(mut self, strategy: impl AnalysisStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    pub fn with_strategy_kind(mut self, kind: StrategyKind) -> Self {
        self.strategy = kind.strategy();
        self
    }

    pub fn with_pruning(mut self, pruning: impl PruningStrategy + 'static) -> Self {
        self.pruning = Box::new(pruning);
        self
    }

    /// Applies to both model checking and configuration evaluation.
    pub fn with_concurrency(mut self, concurrency: ConcurrencyStrategy) -> Self {
        self.evaluator = self.evaluator.with_concurrency(concurrency);
        self
    }

    /// Restrict configurations to the given feature names.
    pub fn with_feature_universe<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.evaluator = self.evaluator.with_feature_universe(features);
        self
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn concurrency(&self) -> ConcurrencyStrategy {
        self.evaluator.concurrency()
    }

    /// Model check the dependency closure of `root`, leaves first.
    pub fn components(
        &self,
        graph: &DependencyGraph,
        root: &str,
    ) -> Result<Vec<Component<String>>, AnalysisError> {
        let closure = graph.transitive_closure(root)?;
        first_phase(&closure, self.checker.as_ref(), self.evaluator.concurrency())
    }

    /// Reliability of `root` for every configuration.
    ///
    /// Graph and derivation errors abort the analysis; errors evaluating a
    /// single configuration are recorded in the results.
    pub fn analyze<I>(
        &self,
        graph: &DependencyGraph,
        root: &str,
        configurations: I,
    ) -> Result<AnalysisResults, AnalysisError>
    where
        I: IntoIterator<Item = Configuration>,
    {
        info!(root, strategy = %self.strategy.kind(), "starting reliability analysis");
        let components = self.components(graph, root)?;
        let function = self.strategy.prepare(&components, root)?;
        let results = self
            .evaluator
            .evaluate(function.as_ref(), self.pruning.as_ref(), configurations);
        info!(
            root,
            evaluated = results.len(),
            failed = results.failures().count(),
            "analysis finished"
        );
        Ok(results)
    }

    /// The family expression of `root`, regardless of the configured
    /// strategy.
    pub fn family_expression(
        &self,
        graph: &DependencyGraph,
        root: &str,
    ) -> Result<FamilyExpression, AnalysisError> {
        let components = self.components(graph, root)?;
        FamilyBased.derive(&components, root)
    }
}
