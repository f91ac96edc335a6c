//! Reliability analysis of software product lines.
//!
//! Starting from a [`DependencyGraph`](reliant_graph::DependencyGraph) and a
//! root node, the analysis runs in three phases:
//!
//! 1. the dependency closure of the root is model checked node by node,
//!    giving one raw reliability formula per [`Component`];
//! 2. an [`AnalysisStrategy`] turns those formulas into a
//!    [`ReliabilityFunction`] of feature configurations;
//! 3. the [`ConfigurationEvaluator`] applies that function to every
//!    [`Configuration`] of interest, sequentially or on a worker pool.
//!
//! The family-based strategy composes all formulas into a single expression
//! over presence-condition class symbols (see [`PresenceConditionClasses`]).
//! The feature-based and product-based strategies reach the same values
//! with concrete presence values substituted earlier.

pub mod analyzer;
pub mod component;
pub mod configuration;
pub mod derivation;
pub mod equivalence;
pub mod error;
pub mod evaluator;
pub mod pruning;
pub mod results;
pub mod strategy;

pub use analyzer::ReliabilityAnalyzer;
pub use component::{first_phase, Component};
pub use configuration::Configuration;
pub use derivation::{derive_expression, if_present};
pub use equivalence::{ClassIndicators, PresenceConditionClasses};
pub use error::{AnalysisError, EvaluationError};
pub use evaluator::{
    ConcurrencyStrategy, ConfigurationEvaluator, ReliabilityFunction, SymbolicReliability,
};
pub use pruning::{FeatureModelPruning, NoPruning, PruningStrategy};
pub use results::AnalysisResults;
pub use strategy::{
    AnalysisStrategy, FamilyBased, FamilyExpression, FeatureBased, ProductBased, StrategyKind,
};
