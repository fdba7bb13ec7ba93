//! Smoothed hinge objective
//!
//! For a kernel block K, labels y ∈ {-1, +1} and coefficients β, with
//! margins m = Kβ and residuals rᵢ = max(0, 1 - yᵢmᵢ):
//!
//! F(β) = (1/n) Σ rᵢ² + λ βᵀKβ     (`Penalty::Kernel`)
//! F(β) = (1/n) Σ rᵢ² + λ ‖β‖²     (`Penalty::Ridge`)
//!
//! The squared hinge is continuously differentiable, which is what the
//! accelerated gradient solver needs.

use crate::core::{Objective, Penalty, Result, SVMError};
use crate::kernel::KernelBlock;
use ndarray::{Array1, ArrayView1, Zip};

/// Squared-hinge loss plus regularization over one kernel block
#[derive(Debug, Clone, Copy)]
pub struct SquaredHingeObjective<'a> {
    kernel: KernelBlock<'a>,
    labels: ArrayView1<'a, f64>,
    lambda: f64,
    penalty: Penalty,
    power_iterations: usize,
}

impl<'a> SquaredHingeObjective<'a> {
    /// Create the objective
    ///
    /// # Errors
    /// `InvalidInput` if the block is not square or does not match the
    /// number of labels; `InvalidParameter` if `lambda` is not positive.
    pub fn new(
        kernel: KernelBlock<'a>,
        labels: ArrayView1<'a, f64>,
        lambda: f64,
        penalty: Penalty,
    ) -> Result<Self> {
        let (rows, cols) = kernel.shape();
        if rows != cols {
            return Err(SVMError::InvalidInput(format!(
                "Kernel matrix must be square, got {rows}x{cols}"
            )));
        }
        if rows != labels.len() {
            return Err(SVMError::InvalidInput(format!(
                "Kernel matrix has {rows} rows but {} labels were given",
                labels.len()
            )));
        }
        if !(lambda.is_finite() && lambda > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "Regularization lambda must be positive, got: {lambda}"
            )));
        }
        Ok(Self {
            kernel,
            labels,
            lambda,
            penalty,
            power_iterations: 50,
        })
    }

    /// Number of power iterations behind `lipschitz_estimate`
    pub fn with_power_iterations(mut self, iterations: usize) -> Self {
        self.power_iterations = iterations;
        self
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Residuals max(0, 1 - yᵢmᵢ)
    fn residuals(&self, margins: &Array1<f64>) -> Array1<f64> {
        Zip::from(margins)
            .and(&self.labels)
            .map_collect(|&m, &y| (1.0 - y * m).max(0.0))
    }

    fn loss_and_penalty(&self, beta: ArrayView1<'_, f64>, margins: &Array1<f64>) -> f64 {
        let n = self.labels.len();
        if n == 0 {
            return 0.0;
        }
        let residuals = self.residuals(margins);
        let loss = residuals.dot(&residuals) / n as f64;
        let penalty = match self.penalty {
            Penalty::Kernel => beta.dot(margins),
            Penalty::Ridge => beta.dot(&beta),
        };
        loss + self.lambda * penalty
    }
}

impl Objective for SquaredHingeObjective<'_> {
    fn dim(&self) -> usize {
        self.labels.len()
    }

    fn value(&self, beta: ArrayView1<'_, f64>) -> f64 {
        let margins = self.kernel.dot(beta);
        self.loss_and_penalty(beta, &margins)
    }

    fn value_and_gradient(&self, beta: ArrayView1<'_, f64>) -> (f64, Array1<f64>) {
        let n = self.labels.len();
        if n == 0 {
            return (0.0, Array1::zeros(0));
        }
        let margins = self.kernel.dot(beta);
        let value = self.loss_and_penalty(beta, &margins);

        // d/dβ (1/n) Σ rᵢ² = -(2/n) K (y ∘ r), K symmetric
        let scale = -2.0 / n as f64;
        let mut direction = self.residuals(&margins) * &self.labels * scale;

        let gradient = match self.penalty {
            Penalty::Kernel => {
                direction.scaled_add(2.0 * self.lambda, &beta);
                self.kernel.dot(direction.view())
            }
            Penalty::Ridge => {
                let mut gradient = self.kernel.dot(direction.view());
                gradient.scaled_add(2.0 * self.lambda, &beta);
                gradient
            }
        };
        (value, gradient)
    }

    fn lipschitz_estimate(&self) -> Option<f64> {
        let n = self.labels.len();
        if n == 0 {
            return None;
        }
        let mu = self.kernel.dominant_eigenvalue(self.power_iterations);
        let loss_term = 2.0 * mu * mu / n as f64;
        let estimate = match self.penalty {
            Penalty::Kernel => loss_term + 2.0 * self.lambda * mu,
            Penalty::Ridge => loss_term + 2.0 * self.lambda,
        };
        (estimate.is_finite() && estimate > 0.0).then_some(estimate)
    }
}
