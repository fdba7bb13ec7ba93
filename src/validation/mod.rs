//! k-fold cross-validation over a grid of regularization strengths

pub mod folds;

pub use self::folds::*;

use crate::binary::validate_lambda;
use crate::core::{HoldoutEstimator, Result, SVMError};
use log::info;

/// Held-out error of one (λ, fold) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldError {
    pub lambda: f64,
    pub fold: usize,
    pub error: f64,
}

/// Outcome of a cross-validation sweep
#[derive(Debug, Clone)]
pub struct CrossValidation {
    /// λ with the lowest mean held-out error
    pub best_lambda: f64,
    /// (λ, mean error) in grid order
    pub mean_errors: Vec<(f64, f64)>,
    /// Every (λ, fold, error) evaluated
    pub table: Vec<FoldError>,
}

impl CrossValidation {
    /// Mean held-out error of the selected λ
    pub fn best_error(&self) -> f64 {
        self.mean_errors
            .iter()
            .find(|(lambda, _)| *lambda == self.best_lambda)
            .map(|&(_, error)| error)
            .unwrap_or(f64::NAN)
    }
}

/// Selects λ by minimizing mean k-fold misclassification
#[derive(Debug, Clone)]
pub struct CrossValidator {
    n_folds: usize,
    lambda_vals: Vec<f64>,
    policy: FoldPolicy,
}

impl CrossValidator {
    /// # Errors
    /// `InvalidConfiguration` for zero folds; `InvalidParameter` for an
    /// empty grid or a non-positive λ.
    pub fn new(n_folds: usize, lambda_vals: Vec<f64>, policy: FoldPolicy) -> Result<Self> {
        if n_folds == 0 {
            return Err(SVMError::InvalidConfiguration(
                "Number of folds must be at least 1".to_string(),
            ));
        }
        if lambda_vals.is_empty() {
            return Err(SVMError::InvalidParameter(
                "Lambda grid must not be empty".to_string(),
            ));
        }
        for &lambda in &lambda_vals {
            validate_lambda(lambda)?;
        }
        Ok(Self {
            n_folds,
            lambda_vals,
            policy,
        })
    }

    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    pub fn lambda_vals(&self) -> &[f64] {
        &self.lambda_vals
    }

    /// Sweep every λ over every fold of `estimator`
    ///
    /// Exact ties in mean error go to the smaller λ. The first failing fold
    /// aborts the sweep.
    pub fn run<E: HoldoutEstimator>(&self, estimator: &E) -> Result<CrossValidation> {
        let folds = FoldAssignment::new(estimator.n_samples(), self.n_folds, self.policy)?;
        let splits: Vec<(Vec<usize>, Vec<usize>)> =
            (0..folds.n_folds()).map(|f| folds.split(f)).collect();

        let mut table = Vec::with_capacity(self.lambda_vals.len() * splits.len());
        let mut mean_errors = Vec::with_capacity(self.lambda_vals.len());

        for &lambda in &self.lambda_vals {
            let mut total = 0.0;
            for (fold, (train, test)) in splits.iter().enumerate() {
                let error = estimator.holdout_error(train, test, lambda)?;
                table.push(FoldError {
                    lambda,
                    fold,
                    error,
                });
                total += error;
            }
            let mean = total / splits.len() as f64;
            info!("CV lambda={lambda}: mean error {mean:.4}");
            mean_errors.push((lambda, mean));
        }

        let (best_lambda, best_error) = mean_errors
            .iter()
            .copied()
            .reduce(|best, candidate| {
                let better = candidate.1 < best.1 || (candidate.1 == best.1 && candidate.0 < best.0);
                if better {
                    candidate
                } else {
                    best
                }
            })
            .ok_or_else(|| SVMError::InvalidParameter("Lambda grid must not be empty".to_string()))?;

        info!(
            "Selected lambda={best_lambda} with mean error {best_error:.4} over {} folds",
            splits.len()
        );

        Ok(CrossValidation {
            best_lambda,
            mean_errors,
            table,
        })
    }
}
