//! Binary kernel classifier
//!
//! A `BinaryClassifier` owns one solver run: it addresses its training rows
//! inside a shared `KernelMatrix` by index, fits coefficients β against ±1
//! labels, and scores new samples with f(z) = Σᵢ βᵢ k(xᵢ, z).

use crate::core::{HoldoutEstimator, Result, SVMError, SolverConfig, SolverReport};
use crate::kernel::KernelMatrix;
use crate::solver::{FastGradientSolver, SquaredHingeObjective};
use log::debug;
use ndarray::{Array1, ArrayView1, ArrayView2};
use std::sync::Arc;

/// Kernel classifier for labels in {-1, +1}
#[derive(Debug, Clone)]
pub struct BinaryClassifier {
    context: Arc<KernelMatrix>,
    indices: Vec<usize>,
    labels: Array1<f64>,
    lambda: f64,
    config: SolverConfig,
    beta: Option<Array1<f64>>,
    report: Option<SolverReport>,
}

impl BinaryClassifier {
    /// Create an unfitted classifier over the rows `indices` of `context`
    ///
    /// # Errors
    /// `InvalidInput` for labels outside {-1, +1}, a label count different
    /// from the index count or out-of-range indices; `InvalidParameter` for a
    /// non-positive `lambda`.
    pub fn new(
        context: Arc<KernelMatrix>,
        indices: Vec<usize>,
        labels: Array1<f64>,
        lambda: f64,
        config: SolverConfig,
    ) -> Result<Self> {
        if indices.len() != labels.len() {
            return Err(SVMError::InvalidInput(format!(
                "{} training rows but {} labels",
                indices.len(),
                labels.len()
            )));
        }
        validate_signs(labels.view())?;
        context.check_indices(&indices)?;
        validate_lambda(lambda)?;

        Ok(Self {
            context,
            indices,
            labels,
            lambda,
            config,
            beta: None,
            report: None,
        })
    }

    /// Rebuild a fitted classifier from stored coefficients
    pub fn from_parts(
        context: Arc<KernelMatrix>,
        indices: Vec<usize>,
        labels: Array1<f64>,
        lambda: f64,
        config: SolverConfig,
        beta: Array1<f64>,
    ) -> Result<Self> {
        if beta.len() != indices.len() {
            return Err(SVMError::InvalidInput(format!(
                "{} coefficients for {} training rows",
                beta.len(),
                indices.len()
            )));
        }
        let mut classifier = Self::new(context, indices, labels, lambda, config)?;
        classifier.beta = Some(beta);
        Ok(classifier)
    }

    /// Run the solver on the indexed kernel block, replacing any previous fit
    pub fn fit(&mut self) -> Result<&SolverReport> {
        self.beta = None;
        self.report = None;

        let objective = SquaredHingeObjective::new(
            self.context.block(&self.indices),
            self.labels.view(),
            self.lambda,
            self.config.penalty,
        )?
        .with_power_iterations(self.config.power_iterations);

        let report = FastGradientSolver::new(self.config.clone()).minimize(&objective)?;
        debug!(
            "Binary fit on {} rows (lambda={}): {:?} after {} iterations, F={:.6e}",
            self.indices.len(),
            self.lambda,
            report.termination,
            report.iterations,
            report.final_objective()
        );

        self.beta = Some(report.beta.clone());
        Ok(self.report.insert(report))
    }

    pub fn is_fitted(&self) -> bool {
        self.beta.is_some()
    }

    /// Fitted coefficients, one per training row
    pub fn beta(&self) -> Result<ArrayView1<'_, f64>> {
        self.beta
            .as_ref()
            .map(|b| b.view())
            .ok_or(SVMError::ModelNotTrained)
    }

    /// Diagnostics of the last solver run; `None` for unfitted or restored
    /// classifiers
    pub fn report(&self) -> Option<&SolverReport> {
        self.report.as_ref()
    }

    /// Training rows within the shared context
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn labels(&self) -> ArrayView1<'_, f64> {
        self.labels.view()
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Decision scores of the rows of `z`
    pub fn decision_scores(&self, z: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        let beta = self.beta()?;
        let cross = self.context.cross_subset(&self.indices, z)?;
        Ok(cross.t().dot(&beta))
    }

    /// Decision scores from a precomputed cross kernel of the whole context
    ///
    /// `cross` has one row per context sample and one column per scored
    /// sample, as returned by `KernelMatrix::cross`.
    pub fn decision_scores_from_cross(&self, cross: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        let beta = self.beta()?;
        if cross.nrows() != self.context.len() {
            return Err(SVMError::InvalidInput(format!(
                "Cross kernel has {} rows, expected {}",
                cross.nrows(),
                self.context.len()
            )));
        }
        let mut scores = Array1::zeros(cross.ncols());
        for (&i, &b) in self.indices.iter().zip(beta.iter()) {
            scores.scaled_add(b, &cross.row(i));
        }
        Ok(scores)
    }

    /// Decision scores of context rows, read from the shared Gram matrix
    pub fn decision_scores_for_rows(&self, rows: &[usize]) -> Result<Array1<f64>> {
        let beta = self.beta()?;
        self.context.check_indices(rows)?;
        let gram = self.context.gram();
        Ok(rows
            .iter()
            .map(|&r| {
                self.indices
                    .iter()
                    .zip(beta.iter())
                    .map(|(&i, &b)| gram[[i, r]] * b)
                    .sum::<f64>()
            })
            .collect())
    }

    /// Predicted labels in {-1, +1}
    pub fn predict(&self, z: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        Ok(self.decision_scores(z)?.mapv(sign))
    }

    /// Fraction of rows of `z` whose predicted sign differs from `y`
    pub fn misclassification_error(
        &self,
        z: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> Result<f64> {
        if z.nrows() != y.len() {
            return Err(SVMError::InvalidInput(format!(
                "{} samples but {} labels",
                z.nrows(),
                y.len()
            )));
        }
        let predicted = self.predict(z)?;
        Ok(sign_error(predicted.view(), y))
    }
}

/// Cross-validation unit for a single binary problem
///
/// Every fold fits a fresh `BinaryClassifier` on the training rows and scores
/// the held-out rows straight from the shared Gram matrix.
#[derive(Debug, Clone)]
pub struct BinaryTask {
    context: Arc<KernelMatrix>,
    labels: Array1<f64>,
    config: SolverConfig,
}

impl BinaryTask {
    /// `labels` holds one ±1 label per context row
    pub fn new(context: Arc<KernelMatrix>, labels: Array1<f64>, config: SolverConfig) -> Result<Self> {
        if labels.len() != context.len() {
            return Err(SVMError::InvalidInput(format!(
                "{} labels for {} samples",
                labels.len(),
                context.len()
            )));
        }
        validate_signs(labels.view())?;
        Ok(Self {
            context,
            labels,
            config,
        })
    }
}

impl HoldoutEstimator for BinaryTask {
    fn n_samples(&self) -> usize {
        self.context.len()
    }

    fn holdout_error(&self, train: &[usize], test: &[usize], lambda: f64) -> Result<f64> {
        let train_labels: Array1<f64> = train.iter().map(|&i| self.labels[i]).collect();
        let mut classifier = BinaryClassifier::new(
            Arc::clone(&self.context),
            train.to_vec(),
            train_labels,
            lambda,
            self.config.clone(),
        )?;
        classifier.fit()?;

        let predicted = classifier.decision_scores_for_rows(test)?.mapv(sign);
        let actual: Array1<f64> = test.iter().map(|&i| self.labels[i]).collect();
        Ok(sign_error(predicted.view(), actual.view()))
    }
}

/// Score to label; zero maps to +1
pub(crate) fn sign(score: f64) -> f64 {
    if score >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

pub(crate) fn validate_lambda(lambda: f64) -> Result<()> {
    if lambda.is_finite() && lambda > 0.0 {
        Ok(())
    } else {
        Err(SVMError::InvalidParameter(format!(
            "Regularization lambda must be positive, got: {lambda}"
        )))
    }
}

fn validate_signs(labels: ArrayView1<'_, f64>) -> Result<()> {
    match labels.iter().find(|&&y| y != 1.0 && y != -1.0) {
        Some(y) => Err(SVMError::InvalidInput(format!(
            "Binary labels must be -1 or +1, got: {y}"
        ))),
        None => Ok(()),
    }
}

fn sign_error(predicted: ArrayView1<'_, f64>, actual: ArrayView1<'_, f64>) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let wrong = predicted
        .iter()
        .zip(actual.iter())
        .filter(|(p, a)| p != a)
        .count();
    wrong as f64 / actual.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::KernelFunction;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    fn context() -> Arc<KernelMatrix> {
        let x = array![
            [2.0, 1.0],
            [1.5, 2.0],
            [2.5, 2.5],
            [-2.0, -1.0],
            [-1.0, -2.5],
            [-2.0, -2.0]
        ];
        Arc::new(KernelMatrix::new(KernelFunction::linear(), x))
    }

    fn labels() -> Array1<f64> {
        array![1.0, 1.0, 1.0, -1.0, -1.0, -1.0]
    }

    fn fitted() -> BinaryClassifier {
        let mut classifier = BinaryClassifier::new(
            context(),
            (0..6).collect(),
            labels(),
            0.01,
            SolverConfig::default(),
        )
        .unwrap();
        classifier.fit().unwrap();
        classifier
    }

    #[test]
    fn test_fit_separates_training_data() {
        let classifier = fitted();
        let x = context().samples().to_owned();
        assert_eq!(classifier.predict(x.view()).unwrap(), labels());
        assert_eq!(
            classifier
                .misclassification_error(x.view(), labels().view())
                .unwrap(),
            0.0
        );
        assert!(classifier.report().is_some());
    }

    #[test]
    fn test_calls_before_fit_fail() {
        let classifier =
            BinaryClassifier::new(context(), vec![0, 3], array![1.0, -1.0], 1.0, SolverConfig::default())
                .unwrap();
        let z = array![[0.0, 0.0]];
        assert!(matches!(classifier.beta(), Err(SVMError::ModelNotTrained)));
        assert!(matches!(
            classifier.predict(z.view()),
            Err(SVMError::ModelNotTrained)
        ));
        assert!(matches!(
            classifier.decision_scores_for_rows(&[0]),
            Err(SVMError::ModelNotTrained)
        ));
    }

    #[test]
    fn test_new_validates_inputs() {
        let config = SolverConfig::default();
        assert!(matches!(
            BinaryClassifier::new(context(), vec![0, 1], array![1.0, 0.0], 1.0, config.clone()),
            Err(SVMError::InvalidInput(_))
        ));
        assert!(matches!(
            BinaryClassifier::new(context(), vec![0, 1], array![1.0], 1.0, config.clone()),
            Err(SVMError::InvalidInput(_))
        ));
        assert!(matches!(
            BinaryClassifier::new(context(), vec![0, 9], array![1.0, -1.0], 1.0, config.clone()),
            Err(SVMError::InvalidInput(_))
        ));
        assert!(matches!(
            BinaryClassifier::new(context(), vec![0, 1], array![1.0, -1.0], -1.0, config),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_score_paths_agree() {
        let classifier = fitted();
        let ctx = context();
        let z = array![[1.0, 0.5], [-0.5, -3.0], [0.0, 0.1]];

        let direct = classifier.decision_scores(z.view()).unwrap();
        let cross = ctx.cross(z.view()).unwrap();
        let shared = classifier.decision_scores_from_cross(cross.view()).unwrap();
        for (a, b) in direct.iter().zip(shared.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-10);
        }

        let rows = [4, 0];
        let from_gram = classifier.decision_scores_for_rows(&rows).unwrap();
        let train_rows = ctx.samples().select(ndarray::Axis(0), &rows);
        let recomputed = classifier.decision_scores(train_rows.view()).unwrap();
        for (a, b) in from_gram.iter().zip(recomputed.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_refit_replaces_beta() {
        let mut classifier = fitted();
        let first = classifier.beta().unwrap().to_owned();
        classifier.fit().unwrap();
        assert_eq!(classifier.beta().unwrap(), first);
    }

    #[test]
    fn test_empty_training_set_scores_zero() {
        let mut classifier =
            BinaryClassifier::new(context(), Vec::new(), Array1::zeros(0), 1.0, SolverConfig::default())
                .unwrap();
        classifier.fit().unwrap();
        let z = Array2::<f64>::ones((2, 2));
        assert_eq!(classifier.decision_scores(z.view()).unwrap(), array![0.0, 0.0]);
        assert_eq!(classifier.predict(z.view()).unwrap(), array![1.0, 1.0]);
    }

    #[test]
    fn test_binary_task_holdout_on_training_rows() {
        let task = BinaryTask::new(context(), labels(), SolverConfig::default()).unwrap();
        let all: Vec<usize> = (0..6).collect();
        let error = task.holdout_error(&all, &all, 0.01).unwrap();
        assert_eq!(error, 0.0);
        assert_eq!(task.n_samples(), 6);
    }

    #[test]
    fn test_sign_maps_zero_to_positive() {
        assert_eq!(sign(0.0), 1.0);
        assert_eq!(sign(-1e-12), -1.0);
        assert_eq!(sign(3.0), 1.0);
    }
}
