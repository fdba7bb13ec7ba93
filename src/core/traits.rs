//! Core traits for SVM implementation

use crate::core::{ClassLabel, Result};
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Labelled dense dataset abstraction
pub trait Dataset {
    /// Sample matrix, one row per sample
    fn features(&self) -> ArrayView2<'_, f64>;

    /// Class labels aligned with the rows of `features`
    fn labels(&self) -> &[ClassLabel];

    /// Number of samples in the dataset
    fn len(&self) -> usize {
        self.labels().len()
    }

    /// Number of features (dimensionality)
    fn dim(&self) -> usize {
        self.features().ncols()
    }

    /// Check if the dataset is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Smooth objective minimized by the gradient solver
///
/// Implementations must be free of side effects: the solver evaluates the
/// same objective at many points, including several trial points per line
/// search.
pub trait Objective {
    /// Number of optimization variables
    fn dim(&self) -> usize;

    /// Objective value at `beta`
    fn value(&self, beta: ArrayView1<'_, f64>) -> f64;

    /// Objective value and gradient at `beta`
    fn value_and_gradient(&self, beta: ArrayView1<'_, f64>) -> (f64, Array1<f64>);

    /// Upper estimate of the gradient's Lipschitz constant, if one is known
    fn lipschitz_estimate(&self) -> Option<f64> {
        None
    }
}

/// One train/evaluate unit of cross-validation
///
/// `train` and `test` are row indices into the data the estimator was built
/// on. Returns the misclassification rate on `test` of a model fitted on
/// `train` with regularization `lambda`.
pub trait HoldoutEstimator {
    /// Number of rows available for folding
    fn n_samples(&self) -> usize;

    fn holdout_error(&self, train: &[usize], test: &[usize], lambda: f64) -> Result<f64>;
}
