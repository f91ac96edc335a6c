//! The three analysis strategies.
//!
//! All of them read the same leaves-first component list and yield the same
//! reliability for every configuration. They differ in when presence is
//! decided:
//!
//! - family-based composes one symbolic expression for the whole product
//!   line up front and only substitutes class indicators per configuration;
//! - feature-based keeps one lifted expression per component and evaluates
//!   them bottom-up per configuration;
//! - product-based builds a concrete expression for each product, with
//!   absent components replaced by `1`, and evaluates that.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use reliant_expr::{substitute, ExprError, Expression};
use reliant_graph::{GraphError, NodeId};

use crate::component::Component;
use crate::configuration::Configuration;
use crate::derivation::{derive_expression, lift};
use crate::equivalence::{ClassIndicators, PresenceConditionClasses};
use crate::error::{AnalysisError, EvaluationError};
use crate::evaluator::{ReliabilityFunction, SymbolicReliability};

/// Turns model-checked components into a reliability function.
pub trait AnalysisStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Prepare the reliability function of `root` from a leaves-first
    /// component list.
    fn prepare(
        &self,
        components: &[Component<String>],
        root: &str,
    ) -> Result<Box<dyn ReliabilityFunction>, AnalysisError>;
}

/// Strategy selector, as named in manifests and on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Feature,
    Product,
    #[default]
    Family,
}

impl StrategyKind {
    pub fn strategy(&self) -> Box<dyn AnalysisStrategy> {
        match self {
            StrategyKind::Feature => Box::new(FeatureBased),
            StrategyKind::Product => Box::new(ProductBased),
            StrategyKind::Family => Box::new(FamilyBased),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Feature => "feature",
            StrategyKind::Product => "product",
            StrategyKind::Family => "family",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feature" => Ok(StrategyKind::Feature),
            "product" => Ok(StrategyKind::Product),
            "family" => Ok(StrategyKind::Family),
            other => Err(AnalysisError::UnknownStrategy(other.to_string())),
        }
    }
}

/// The components up to and including `root`, with every dependency
/// appearing before its dependents.
fn up_to_root<'a>(
    components: &'a [Component<String>],
    root: &str,
) -> Result<&'a [Component<String>], AnalysisError> {
    let position = components
        .iter()
        .position(|c| c.id == root)
        .ok_or_else(|| GraphError::UnknownNode(root.to_string()))?;
    let prefix = &components[..=position];

    let mut seen: Vec<&str> = Vec::with_capacity(prefix.len());
    for component in prefix {
        if let Some(missing) = component
            .dependencies
            .iter()
            .find(|d| !seen.contains(&d.as_str()))
        {
            return Err(GraphError::UnknownNode(missing.clone()).into());
        }
        seen.push(&component.id);
    }
    Ok(prefix)
}

fn classes_of(components: &[Component<String>]) -> PresenceConditionClasses {
    PresenceConditionClasses::from_conditions(
        components.iter().map(|c| c.presence_condition.as_str()),
    )
}

// --- Family-based ---

/// One symbolic expression for the whole product line.
#[derive(Debug, Clone, Copy, Default)]
pub struct FamilyBased;

impl FamilyBased {
    /// Compose the family expression of `root`.
    pub fn derive(
        &self,
        components: &[Component<String>],
        root: &str,
    ) -> Result<FamilyExpression, AnalysisError> {
        let components = up_to_root(components, root)?;
        let classes = classes_of(components);
        let formula = derive_expression(components, &classes, root)?;
        info!(root, classes = classes.len(), "derived family expression");
        debug!(root, %formula, "family expression");
        let function = SymbolicReliability::new(&formula, &classes)?;
        Ok(FamilyExpression {
            formula,
            classes,
            function,
        })
    }
}

impl AnalysisStrategy for FamilyBased {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Family
    }

    fn prepare(
        &self,
        components: &[Component<String>],
        root: &str,
    ) -> Result<Box<dyn ReliabilityFunction>, AnalysisError> {
        Ok(Box::new(self.derive(components, root)?))
    }
}

/// The composed expression of a root node and its presence classes.
#[derive(Debug, Clone)]
pub struct FamilyExpression {
    formula: String,
    classes: PresenceConditionClasses,
    function: SymbolicReliability,
}

impl FamilyExpression {
    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn classes(&self) -> &PresenceConditionClasses {
        &self.classes
    }
}

impl ReliabilityFunction for FamilyExpression {
    fn reliability(&self, configuration: &Configuration) -> Result<f64, EvaluationError> {
        self.function.reliability(configuration)
    }
}

// --- Feature-based ---

/// Per-component lifted expressions, evaluated bottom-up.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureBased;

impl AnalysisStrategy for FeatureBased {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Feature
    }

    fn prepare(
        &self,
        components: &[Component<String>],
        root: &str,
    ) -> Result<Box<dyn ReliabilityFunction>, AnalysisError> {
        let components = up_to_root(components, root)?;
        let classes = classes_of(components);
        let presence: HashMap<&str, &str> = components
            .iter()
            .map(|c| (c.id.as_str(), c.presence_condition.as_str()))
            .collect();

        let mut nodes = Vec::with_capacity(components.len());
        for component in components {
            let lifted = lift(component, &presence, &classes)?;
            let expression =
                Expression::parse(&lifted).map_err(|source| AnalysisError::Formula {
                    node: component.id.clone(),
                    source,
                })?;
            debug!(node = %component.id, formula = %lifted, "lifted formula");
            nodes.push((component.id.clone(), expression));
        }
        info!(root, nodes = nodes.len(), "lifted component formulas");

        Ok(Box::new(LiftedComponents {
            nodes,
            indicators: classes.compile()?,
        }))
    }
}

struct LiftedComponents {
    /// Leaves first, root last.
    nodes: Vec<(NodeId, Expression)>,
    indicators: ClassIndicators,
}

impl ReliabilityFunction for LiftedComponents {
    fn reliability(&self, configuration: &Configuration) -> Result<f64, EvaluationError> {
        let mut values = self.indicators.interpretation(configuration);
        let mut reliability = 1.0;
        for (id, expression) in &self.nodes {
            reliability = expression.solve(&values)?;
            values.insert(id.clone(), reliability);
        }
        Ok(reliability)
    }
}

// --- Product-based ---

/// A concrete expression per product.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductBased;

impl AnalysisStrategy for ProductBased {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Product
    }

    fn prepare(
        &self,
        components: &[Component<String>],
        root: &str,
    ) -> Result<Box<dyn ReliabilityFunction>, AnalysisError> {
        let components = up_to_root(components, root)?;
        let presence = components
            .iter()
            .map(|c| {
                Expression::parse(&c.presence_condition).map_err(|source| {
                    AnalysisError::PresenceCondition {
                        condition: c.presence_condition.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!(root, nodes = components.len(), "prepared product derivation");
        Ok(Box::new(ProductDerivation {
            components: components.to_vec(),
            presence,
        }))
    }
}

struct ProductDerivation {
    components: Vec<Component<String>>,
    /// Parsed presence condition of each component, same order.
    presence: Vec<Expression>,
}

impl ProductDerivation {
    /// The product expression of the root for `configuration`.
    fn product_formula(&self, configuration: &Configuration) -> Result<String, EvaluationError> {
        let mut derived: HashMap<&str, (String, bool)> = HashMap::new();
        let mut formula = String::new();

        for (component, condition) in self.components.iter().zip(&self.presence) {
            let mut replacements = HashMap::new();
            for dependency in &component.dependencies {
                let Some((text, present)) = derived.get(dependency.as_str()) else {
                    return Err(ExprError::UnresolvedVariable(dependency.clone()).into());
                };
                let replacement = if *present {
                    format!("({text})")
                } else {
                    "1".to_string()
                };
                replacements.insert(dependency.clone(), replacement);
            }
            formula = substitute(&component.asset, &replacements)?;
            let present = condition.holds(configuration.enabled());
            derived.insert(component.id.as_str(), (formula.clone(), present));
        }
        Ok(formula)
    }
}

impl ReliabilityFunction for ProductDerivation {
    fn reliability(&self, configuration: &Configuration) -> Result<f64, EvaluationError> {
        let formula = self.product_formula(configuration)?;
        Ok(Expression::parse(&formula)?.solve(&HashMap::new())?)
    }
}
