//! Pruning of configurations the feature model rules out.

use reliant_expr::Expression;

use crate::configuration::Configuration;
use crate::error::AnalysisError;

/// Adjusts the reliability of a configuration once it has been computed.
pub trait PruningStrategy: Send + Sync {
    fn prune(&self, configuration: &Configuration, reliability: f64) -> f64;
}

/// Keeps every value as computed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPruning;

impl PruningStrategy for NoPruning {
    fn prune(&self, _configuration: &Configuration, reliability: f64) -> f64 {
        reliability
    }
}

/// Multiplies the reliability by the 0/1 indicator of a Boolean feature
/// model, so configurations it rejects score exactly 0.
#[derive(Debug, Clone)]
pub struct FeatureModelPruning {
    feature_model: Expression,
}

impl FeatureModelPruning {
    pub fn new(feature_model: &str) -> Result<Self, AnalysisError> {
        let feature_model = Expression::parse(feature_model).map_err(AnalysisError::FeatureModel)?;
        Ok(Self { feature_model })
    }

    /// Whether the feature model admits `configuration`.
    pub fn is_valid(&self, configuration: &Configuration) -> bool {
        self.feature_model.holds(configuration.enabled())
    }

    pub fn feature_model(&self) -> &Expression {
        &self.feature_model
    }
}

impl PruningStrategy for FeatureModelPruning {
    fn prune(&self, configuration: &Configuration, reliability: f64) -> f64 {
        if self.is_valid(configuration) {
            reliability
        } else {
            0.0
        }
    }
}
