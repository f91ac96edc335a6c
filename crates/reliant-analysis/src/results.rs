//! Per-configuration analysis results.

use std::collections::BTreeMap;

use crate::configuration::Configuration;
use crate::error::EvaluationError;

/// Reliability of every evaluated configuration, or the reason it could not
/// be evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResults {
    values: BTreeMap<Configuration, Result<f64, EvaluationError>>,
}

impl AnalysisResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, configuration: Configuration, outcome: Result<f64, EvaluationError>) {
        self.values.insert(configuration, outcome);
    }

    pub fn get(&self, configuration: &Configuration) -> Option<&Result<f64, EvaluationError>> {
        self.values.get(configuration)
    }

    /// Reliability of `configuration`, if it was evaluated successfully.
    pub fn reliability(&self, configuration: &Configuration) -> Option<f64> {
        self.get(configuration).and_then(|r| r.as_ref().ok().copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Configuration, &Result<f64, EvaluationError>)> {
        self.values.iter()
    }

    pub fn successes(&self) -> impl Iterator<Item = (&Configuration, f64)> {
        self.values
            .iter()
            .filter_map(|(c, r)| r.as_ref().ok().map(|v| (c, *v)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Configuration, &EvaluationError)> {
        self.values
            .iter()
            .filter_map(|(c, r)| r.as_ref().err().map(|e| (c, e)))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(Configuration, Result<f64, EvaluationError>)> for AnalysisResults {
    fn from_iter<I: IntoIterator<Item = (Configuration, Result<f64, EvaluationError>)>>(
        iter: I,
    ) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_successes_and_failures() {
        let a: Configuration = ["A"].into_iter().collect();
        let b: Configuration = ["B"].into_iter().collect();
        let results: AnalysisResults = [
            (a.clone(), Ok(0.9)),
            (b.clone(), Err(EvaluationError::UnknownFeature("B".into()))),
        ]
        .into_iter()
        .collect();

        assert_eq!(results.len(), 2);
        assert_eq!(results.reliability(&a), Some(0.9));
        assert_eq!(results.reliability(&b), None);
        assert_eq!(results.successes().count(), 1);
        assert_eq!(results.failures().next().map(|(c, _)| c), Some(&b));
        assert!(results.get(&Configuration::new()).is_none());
    }
}
