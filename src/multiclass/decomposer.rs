//! Construction and aggregation of binary sub-classifiers

use crate::binary::BinaryClassifier;
use crate::core::{ClassLabel, Result, SVMError, SolverConfig, SolverReport};
use crate::kernel::KernelMatrix;
use crate::multiclass::Strategy;
use log::debug;
use ndarray::{Array1, ArrayView2};
use std::sync::Arc;

/// One binary classifier and the classes it separates
///
/// `positive` is the class index labelled +1. `negative` is the class index
/// labelled -1, or `None` when every other class is negative (one-vs-rest).
#[derive(Debug, Clone)]
pub struct SubClassifier {
    positive: usize,
    negative: Option<usize>,
    classifier: BinaryClassifier,
}

impl SubClassifier {
    pub fn new(positive: usize, negative: Option<usize>, classifier: BinaryClassifier) -> Self {
        Self {
            positive,
            negative,
            classifier,
        }
    }

    pub fn positive(&self) -> usize {
        self.positive
    }

    pub fn negative(&self) -> Option<usize> {
        self.negative
    }

    pub fn classifier(&self) -> &BinaryClassifier {
        &self.classifier
    }
}

/// Fitted set of binary classifiers over one shared kernel matrix
#[derive(Debug, Clone)]
pub struct MulticlassDecomposer {
    strategy: Strategy,
    context: Arc<KernelMatrix>,
    classes: Vec<ClassLabel>,
    members: Vec<SubClassifier>,
}

impl MulticlassDecomposer {
    /// Fit every sub-classifier on the context rows `rows`
    ///
    /// `labels` is aligned with `rows`; `classes` lists every class in
    /// ascending order, including classes absent from `rows`.
    ///
    /// # Errors
    /// `InvalidConfiguration` for the binary strategy with other than two
    /// classes, `InvalidInput` for labels outside `classes`, and any solver
    /// error of a sub-fit.
    pub fn fit(
        strategy: Strategy,
        context: Arc<KernelMatrix>,
        rows: &[usize],
        labels: &[ClassLabel],
        classes: &[ClassLabel],
        lambda: f64,
        config: &SolverConfig,
    ) -> Result<Self> {
        strategy.check_classes(classes.len())?;
        if rows.len() != labels.len() {
            return Err(SVMError::InvalidInput(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        let class_index = labels
            .iter()
            .map(|label| {
                classes.binary_search(label).map_err(|_| {
                    SVMError::InvalidInput(format!("Label {label} is not a known class"))
                })
            })
            .collect::<Result<Vec<usize>>>()?;

        let problems = binary_problems(strategy, classes.len(), rows, &class_index);
        let mut members = Vec::with_capacity(problems.len());
        for (positive, negative, indices, signs) in problems {
            let mut classifier = BinaryClassifier::new(
                Arc::clone(&context),
                indices,
                signs,
                lambda,
                config.clone(),
            )?;
            classifier.fit()?;
            debug!(
                "Fitted {strategy} sub-classifier {} vs {}",
                classes[positive],
                negative.map_or_else(|| "rest".to_string(), |c| classes[c].to_string())
            );
            members.push(SubClassifier::new(positive, negative, classifier));
        }

        Ok(Self {
            strategy,
            context,
            classes: classes.to_vec(),
            members,
        })
    }

    /// Rebuild from already fitted sub-classifiers
    pub fn from_parts(
        strategy: Strategy,
        context: Arc<KernelMatrix>,
        classes: Vec<ClassLabel>,
        members: Vec<SubClassifier>,
    ) -> Result<Self> {
        strategy.check_classes(classes.len())?;
        if members.len() != strategy.n_classifiers(classes.len()) {
            return Err(SVMError::InvalidInput(format!(
                "{strategy} with {} classes needs {} classifiers, got {}",
                classes.len(),
                strategy.n_classifiers(classes.len()),
                members.len()
            )));
        }
        let out_of_range = members.iter().any(|m| {
            m.positive >= classes.len() || m.negative.map_or(false, |c| c >= classes.len())
        });
        if out_of_range || members.iter().any(|m| !m.classifier.is_fitted()) {
            return Err(SVMError::InvalidInput(
                "Sub-classifiers must be fitted and refer to known classes".to_string(),
            ));
        }
        Ok(Self {
            strategy,
            context,
            classes,
            members,
        })
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn classes(&self) -> &[ClassLabel] {
        &self.classes
    }

    pub fn members(&self) -> &[SubClassifier] {
        &self.members
    }

    pub fn n_classifiers(&self) -> usize {
        self.members.len()
    }

    pub fn context(&self) -> &Arc<KernelMatrix> {
        &self.context
    }

    /// Solver diagnostics of every sub-classifier that has them
    pub fn reports(&self) -> Vec<&SolverReport> {
        self.members
            .iter()
            .filter_map(|m| m.classifier.report())
            .collect()
    }

    /// Predict class labels for the rows of `z`
    pub fn predict(&self, z: ArrayView2<'_, f64>) -> Result<Vec<ClassLabel>> {
        let cross = self.context.cross(z)?;
        self.predict_from_cross(cross.view())
    }

    /// Predict from a cross kernel of the whole context against the samples
    pub fn predict_from_cross(&self, cross: ArrayView2<'_, f64>) -> Result<Vec<ClassLabel>> {
        let scores = self
            .members
            .iter()
            .map(|m| m.classifier.decision_scores_from_cross(cross))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.aggregate(&scores, cross.ncols()))
    }

    /// Predict context rows from the shared Gram matrix
    pub fn predict_rows(&self, rows: &[usize]) -> Result<Vec<ClassLabel>> {
        let scores = self
            .members
            .iter()
            .map(|m| m.classifier.decision_scores_for_rows(rows))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.aggregate(&scores, rows.len()))
    }

    /// Turn per-member scores into class labels
    ///
    /// Pairwise members vote (score ≥ 0 for the positive class); one-vs-rest
    /// takes the highest score. Ties go to the lowest class index.
    fn aggregate(&self, scores: &[Array1<f64>], n_samples: usize) -> Vec<ClassLabel> {
        let n_classes = self.classes.len();
        (0..n_samples)
            .map(|s| {
                let mut tally = vec![f64::NEG_INFINITY; n_classes];
                match self.strategy {
                    Strategy::OneVsRest => {
                        for (member, score) in self.members.iter().zip(scores) {
                            tally[member.positive] = score[s];
                        }
                    }
                    Strategy::Binary | Strategy::OneVsOne => {
                        tally.iter_mut().for_each(|t| *t = 0.0);
                        for (member, score) in self.members.iter().zip(scores) {
                            let winner = match member.negative {
                                Some(negative) if score[s] < 0.0 => negative,
                                _ => member.positive,
                            };
                            tally[winner] += 1.0;
                        }
                    }
                }
                self.classes[first_max(&tally)]
            })
            .collect()
    }
}

/// Index of the first maximal entry
fn first_max(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// (positive class, negative class, context rows, ±1 labels) per sub-problem
fn binary_problems(
    strategy: Strategy,
    n_classes: usize,
    rows: &[usize],
    class_index: &[usize],
) -> Vec<(usize, Option<usize>, Vec<usize>, Array1<f64>)> {
    let one_against = |positive: usize| -> Array1<f64> {
        class_index
            .iter()
            .map(|&c| if c == positive { 1.0 } else { -1.0 })
            .collect()
    };

    match strategy {
        Strategy::Binary => vec![(1, Some(0), rows.to_vec(), one_against(1))],
        Strategy::OneVsRest => (0..n_classes)
            .map(|c| (c, None, rows.to_vec(), one_against(c)))
            .collect(),
        Strategy::OneVsOne => {
            let mut problems = Vec::with_capacity(strategy.n_classifiers(n_classes));
            for i in 0..n_classes {
                for j in (i + 1)..n_classes {
                    let (indices, signs): (Vec<usize>, Vec<f64>) = rows
                        .iter()
                        .zip(class_index)
                        .filter(|(_, &c)| c == i || c == j)
                        .map(|(&r, &c)| (r, if c == j { 1.0 } else { -1.0 }))
                        .unzip();
                    problems.push((j, Some(i), indices, Array1::from(signs)));
                }
            }
            problems
        }
    }
}
