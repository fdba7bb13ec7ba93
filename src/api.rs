//! High-level API for multiclass SVM training and prediction
//!
//! This module wires kernel, solver, cross-validation and multiclass
//! decomposition behind a single `SVM` type.
//!
//! # Quick Start
//!
//! ```rust
//! use fastsvm::api::SVM;
//! use fastsvm::kernel::KernelFunction;
//! use ndarray::array;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let x = array![[-2.0, -1.5], [-1.5, -2.0], [2.0, 1.5], [1.5, 2.5]];
//! let y = vec![0, 0, 1, 1];
//!
//! let mut svm = SVM::builder(KernelFunction::linear())
//!     .with_lambda(0.01)
//!     .build()?;
//! svm.fit(x.view(), &y)?;
//!
//! assert_eq!(svm.predict(x.view())?, y);
//! # Ok(())
//! # }
//! ```

use crate::core::{ClassLabel, Dataset, Penalty, Result, SVMError, SolverConfig, SolverReport};
use crate::data::CSVDataset;
use crate::kernel::{KernelFunction, KernelMatrix};
use crate::multiclass::{label_error, MulticlassDecomposer, MulticlassTask, Strategy};
use crate::validation::{CrossValidation, CrossValidator, FoldPolicy};
use log::info;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Default λ grid searched by cross-validation
pub const DEFAULT_LAMBDA_VALS: [f64; 7] = [0.001, 0.01, 0.1, 1.0, 10.0, 100.0, 1000.0];

/// Complete model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SVMConfig {
    /// Kernel and its parameters
    pub kernel: KernelFunction,
    /// Fixed regularization strength, unused with `use_optimal_lambda`
    pub lambduh: f64,
    pub classification_strategy: Strategy,
    /// Folds used when selecting λ
    pub n_folds: usize,
    /// Candidate λ values for cross-validation
    pub lambda_vals: Vec<f64>,
    /// Select λ by cross-validation instead of using `lambduh`
    pub use_optimal_lambda: bool,
    pub fold_policy: FoldPolicy,
    pub solver: SolverConfig,
}

impl SVMConfig {
    /// Defaults for everything but the kernel
    pub fn new(kernel: KernelFunction) -> Self {
        Self {
            kernel,
            lambduh: 3.0,
            classification_strategy: Strategy::default(),
            n_folds: 4,
            lambda_vals: DEFAULT_LAMBDA_VALS.to_vec(),
            use_optimal_lambda: false,
            fold_policy: FoldPolicy::default(),
            solver: SolverConfig {
                penalty: kernel.default_penalty(),
                ..SolverConfig::default()
            },
        }
    }

    /// Check every parameter
    ///
    /// # Errors
    /// `InvalidParameter` for bad kernel, λ or solver values;
    /// `InvalidConfiguration` for zero folds. `lambduh` is only checked
    /// when it is used, i.e. without `use_optimal_lambda`.
    pub fn validate(&self) -> Result<()> {
        self.kernel.validate()?;
        if !self.use_optimal_lambda && !(self.lambduh.is_finite() && self.lambduh > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "lambduh must be positive, got: {}",
                self.lambduh
            )));
        }
        self.solver.validate()?;
        CrossValidator::new(self.n_folds, self.lambda_vals.clone(), self.fold_policy)?;
        Ok(())
    }
}

/// Builder for `SVM`, validated by `build`
#[derive(Debug, Clone)]
pub struct SVMBuilder {
    config: SVMConfig,
}

impl SVMBuilder {
    /// Set the fixed regularization strength
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.lambduh = lambda;
        self
    }

    /// Set the maximum number of solver iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.solver.max_iterations = max_iterations;
        self
    }

    /// Set the gradient norm tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.config.solver.tolerance = tolerance;
        self
    }

    pub fn with_penalty(mut self, penalty: Penalty) -> Self {
        self.config.solver.penalty = penalty;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.config.classification_strategy = strategy;
        self
    }

    /// Set the number of cross-validation folds
    pub fn with_folds(mut self, n_folds: usize) -> Self {
        self.config.n_folds = n_folds;
        self
    }

    /// Set the λ grid searched by cross-validation
    pub fn with_lambda_vals(mut self, lambda_vals: Vec<f64>) -> Self {
        self.config.lambda_vals = lambda_vals;
        self
    }

    /// Select λ by cross-validation
    pub fn with_optimal_lambda(mut self, enabled: bool) -> Self {
        self.config.use_optimal_lambda = enabled;
        self
    }

    pub fn with_fold_policy(mut self, policy: FoldPolicy) -> Self {
        self.config.fold_policy = policy;
        self
    }

    /// Replace the whole solver configuration
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.config.solver = solver;
        self
    }

    pub fn build(self) -> Result<SVM> {
        SVM::new(self.config)
    }
}

#[derive(Debug, Clone)]
struct FittedModel {
    decomposer: MulticlassDecomposer,
    lambda: f64,
    lambda_from_cv: bool,
    cross_validation: Option<CrossValidation>,
}

/// Multiclass kernel SVM
#[derive(Debug, Clone)]
pub struct SVM {
    config: SVMConfig,
    fitted: Option<FittedModel>,
}

impl SVM {
    /// Start a builder with default settings for `kernel`
    pub fn builder(kernel: KernelFunction) -> SVMBuilder {
        SVMBuilder {
            config: SVMConfig::new(kernel),
        }
    }

    /// Create an unfitted model from a validated configuration
    pub fn new(config: SVMConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            fitted: None,
        })
    }

    /// Fit on the rows of `x` with class labels `y`
    ///
    /// Discards any previous fit. With `use_optimal_lambda`, λ is chosen by
    /// cross-validating the whole decomposition before the final fit on all
    /// rows. A failed fit leaves the model unfitted.
    ///
    /// # Errors
    /// `InvalidInput` for mismatched lengths, non-finite features or fewer
    /// than two classes; `InvalidConfiguration` for a strategy/class-count
    /// mismatch or more folds than samples; solver errors of any sub-fit.
    pub fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[ClassLabel]) -> Result<&mut Self> {
        self.fitted = None;

        if x.nrows() == 0 {
            return Err(SVMError::EmptyDataset);
        }
        if x.nrows() != y.len() {
            return Err(SVMError::InvalidInput(format!(
                "{} samples but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        check_finite(x)?;

        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        let strategy = self.config.classification_strategy;
        strategy.check_classes(classes.len())?;

        let context = Arc::new(KernelMatrix::new(self.config.kernel, x.to_owned()));

        let cross_validation = if self.config.use_optimal_lambda {
            let validator = CrossValidator::new(
                self.config.n_folds,
                self.config.lambda_vals.clone(),
                self.config.fold_policy,
            )?;
            let task = MulticlassTask::new(
                strategy,
                Arc::clone(&context),
                y.to_vec(),
                classes.clone(),
                self.config.solver.clone(),
            )?;
            Some(validator.run(&task)?)
        } else {
            None
        };
        let lambda = cross_validation
            .as_ref()
            .map_or(self.config.lambduh, |cv| cv.best_lambda);

        let rows: Vec<usize> = (0..y.len()).collect();
        let decomposer = MulticlassDecomposer::fit(
            strategy,
            context,
            &rows,
            y,
            &classes,
            lambda,
            &self.config.solver,
        )?;

        info!(
            "Trained {} {strategy} model: {} samples, {} classes, {} classifiers, lambda={lambda}",
            self.config.kernel,
            y.len(),
            classes.len(),
            decomposer.n_classifiers()
        );

        self.fitted = Some(FittedModel {
            decomposer,
            lambda,
            lambda_from_cv: cross_validation.is_some(),
            cross_validation,
        });
        Ok(self)
    }

    /// Fit on a labelled dataset
    pub fn fit_dataset<D: Dataset>(&mut self, dataset: &D) -> Result<&mut Self> {
        self.fit(dataset.features(), dataset.labels())
    }

    /// Fit on a labelled CSV file
    pub fn fit_csv<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Self> {
        let dataset = CSVDataset::from_file(path)?;
        self.fit_dataset(&dataset)
    }

    /// Predict a class label for every row of `x`
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<ClassLabel>> {
        let fitted = self.fitted()?;
        check_finite(x)?;
        fitted.decomposer.predict(x)
    }

    /// Fraction of rows of `x` whose predicted label differs from `y`
    pub fn compute_misclassification_error(
        &self,
        x: ArrayView2<'_, f64>,
        y: &[ClassLabel],
    ) -> Result<f64> {
        if x.nrows() != y.len() {
            return Err(SVMError::InvalidInput(format!(
                "{} samples but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        let predicted = self.predict(x)?;
        Ok(label_error(&predicted, y))
    }

    /// Misclassification error on a labelled dataset
    pub fn evaluate<D: Dataset>(&self, dataset: &D) -> Result<f64> {
        self.compute_misclassification_error(dataset.features(), dataset.labels())
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// λ used by the fitted model
    pub fn lambduh(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.lambda)
    }

    /// Sorted class labels seen during fit; empty before fit
    pub fn classes(&self) -> &[ClassLabel] {
        match &self.fitted {
            Some(f) => f.decomposer.classes(),
            None => &[],
        }
    }

    pub fn n_classifiers(&self) -> usize {
        self.fitted
            .as_ref()
            .map_or(0, |f| f.decomposer.n_classifiers())
    }

    /// Result of the λ sweep, when one ran
    pub fn cross_validation(&self) -> Option<&CrossValidation> {
        self.fitted
            .as_ref()
            .and_then(|f| f.cross_validation.as_ref())
    }

    /// Solver diagnostics of every sub-classifier fitted in this process
    pub fn solver_reports(&self) -> Vec<&SolverReport> {
        self.fitted
            .as_ref()
            .map(|f| f.decomposer.reports())
            .unwrap_or_default()
    }

    pub fn config(&self) -> &SVMConfig {
        &self.config
    }

    pub(crate) fn decomposer(&self) -> Result<&MulticlassDecomposer> {
        self.fitted().map(|f| &f.decomposer)
    }

    /// Whether the fitted λ was selected by cross-validation
    pub fn lambda_from_cv(&self) -> bool {
        self.fitted.as_ref().map_or(false, |f| f.lambda_from_cv)
    }

    /// Assemble a fitted model from restored parts
    pub(crate) fn from_parts(
        config: SVMConfig,
        decomposer: MulticlassDecomposer,
        lambda: f64,
        lambda_from_cv: bool,
    ) -> Result<Self> {
        let mut svm = Self::new(config)?;
        svm.fitted = Some(FittedModel {
            decomposer,
            lambda,
            lambda_from_cv,
            cross_validation: None,
        });
        Ok(svm)
    }

    fn fitted(&self) -> Result<&FittedModel> {
        self.fitted.as_ref().ok_or(SVMError::ModelNotTrained)
    }
}

fn check_finite(x: ArrayView2<'_, f64>) -> Result<()> {
    match x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((row, col), v)) => Err(SVMError::InvalidInput(format!(
            "Non-finite feature value {v} at row {row}, column {col}"
        ))),
        None => Ok(()),
    }
}

/// Convenience functions for quick operations
pub mod quick {
    use super::*;
    use crate::data::DenseDataset;

    /// Fit a one-vs-rest model with default settings on a CSV file
    pub fn train_csv<P: AsRef<Path>>(path: P, kernel: KernelFunction) -> Result<SVM> {
        let mut svm = SVM::builder(kernel).build()?;
        svm.fit_csv(path)?;
        Ok(svm)
    }

    /// Held-out error of `config` on a seeded random split of `dataset`
    pub fn holdout_error(
        dataset: &DenseDataset,
        train_ratio: f64,
        seed: u64,
        config: SVMConfig,
    ) -> Result<(SVM, f64)> {
        let (train, test) = dataset.train_test_split(train_ratio, seed)?;
        let mut svm = SVM::new(config)?;
        svm.fit_dataset(&train)?;
        let error = svm.evaluate(&test)?;
        Ok((svm, error))
    }
}
