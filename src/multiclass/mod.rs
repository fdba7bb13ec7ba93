//! Multiclass decomposition into binary problems
//!
//! Classes are always handled in ascending order; a class index is the
//! position of the class in that order.

pub mod decomposer;

pub use self::decomposer::*;

use crate::core::{ClassLabel, HoldoutEstimator, Result, SVMError, SolverConfig};
use crate::kernel::KernelMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How a multiclass problem is split into binary classifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Strategy {
    /// Exactly two classes, one classifier
    #[serde(rename = "binary")]
    Binary,
    /// One classifier per pair of classes, majority vote
    #[serde(rename = "ovo")]
    OneVsOne,
    /// One classifier per class against the rest, highest score wins
    #[default]
    #[serde(rename = "ovr")]
    OneVsRest,
}

impl Strategy {
    /// Number of binary classifiers trained for `n_classes` classes
    pub fn n_classifiers(&self, n_classes: usize) -> usize {
        match self {
            Self::Binary => 1,
            Self::OneVsOne => n_classes * n_classes.saturating_sub(1) / 2,
            Self::OneVsRest => n_classes,
        }
    }

    /// Reject class counts the strategy cannot handle
    pub fn check_classes(&self, n_classes: usize) -> Result<()> {
        if n_classes < 2 {
            return Err(SVMError::InvalidInput(format!(
                "At least 2 classes are required, got {n_classes}"
            )));
        }
        if *self == Self::Binary && n_classes != 2 {
            return Err(SVMError::InvalidConfiguration(format!(
                "Binary strategy requires exactly 2 classes, got {n_classes}"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Binary => "binary",
            Self::OneVsOne => "ovo",
            Self::OneVsRest => "ovr",
        };
        f.write_str(name)
    }
}

/// Cross-validation unit for a full decomposition
///
/// Each fold fits every sub-classifier on the training rows, so a single λ is
/// scored for the whole multiclass model.
#[derive(Debug, Clone)]
pub struct MulticlassTask {
    strategy: Strategy,
    context: Arc<KernelMatrix>,
    labels: Vec<ClassLabel>,
    classes: Vec<ClassLabel>,
    config: SolverConfig,
}

impl MulticlassTask {
    /// `labels` holds one class label per context row; `classes` is sorted
    pub fn new(
        strategy: Strategy,
        context: Arc<KernelMatrix>,
        labels: Vec<ClassLabel>,
        classes: Vec<ClassLabel>,
        config: SolverConfig,
    ) -> Result<Self> {
        if labels.len() != context.len() {
            return Err(SVMError::InvalidInput(format!(
                "{} labels for {} samples",
                labels.len(),
                context.len()
            )));
        }
        strategy.check_classes(classes.len())?;
        Ok(Self {
            strategy,
            context,
            labels,
            classes,
            config,
        })
    }
}

impl HoldoutEstimator for MulticlassTask {
    fn n_samples(&self) -> usize {
        self.labels.len()
    }

    fn holdout_error(&self, train: &[usize], test: &[usize], lambda: f64) -> Result<f64> {
        let train_labels: Vec<ClassLabel> = train.iter().map(|&i| self.labels[i]).collect();
        let decomposer = MulticlassDecomposer::fit(
            self.strategy,
            Arc::clone(&self.context),
            train,
            &train_labels,
            &self.classes,
            lambda,
            &self.config,
        )?;
        let predicted = decomposer.predict_rows(test)?;
        let actual: Vec<ClassLabel> = test.iter().map(|&i| self.labels[i]).collect();
        Ok(label_error(&predicted, &actual))
    }
}

/// Fraction of positions where `predicted` and `actual` differ
pub fn label_error(predicted: &[ClassLabel], actual: &[ClassLabel]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let wrong = predicted
        .iter()
        .zip(actual)
        .filter(|(p, a)| p != a)
        .count();
    wrong as f64 / actual.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_counts() {
        assert_eq!(Strategy::Binary.n_classifiers(2), 1);
        assert_eq!(Strategy::OneVsRest.n_classifiers(4), 4);
        assert_eq!(Strategy::OneVsOne.n_classifiers(4), 6);
        assert_eq!(Strategy::OneVsOne.n_classifiers(2), 1);
    }

    #[test]
    fn test_check_classes() {
        assert!(Strategy::Binary.check_classes(2).is_ok());
        assert!(matches!(
            Strategy::Binary.check_classes(3),
            Err(SVMError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            Strategy::OneVsRest.check_classes(1),
            Err(SVMError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_strategy_serde_names() {
        assert_eq!(serde_json::to_string(&Strategy::OneVsOne).unwrap(), "\"ovo\"");
        let parsed: Strategy = serde_json::from_str("\"ovr\"").unwrap();
        assert_eq!(parsed, Strategy::OneVsRest);
        assert_eq!(Strategy::Binary.to_string(), "binary");
    }

    #[test]
    fn test_label_error() {
        assert_eq!(label_error(&[1, 2, 3, 4], &[1, 2, 0, 0]), 0.5);
        assert_eq!(label_error(&[], &[]), 0.0);
    }
}
