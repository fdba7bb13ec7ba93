//! RBF (Radial Basis Function) kernel implementation
//!
//! The RBF kernel is defined as: K(x, y) = exp(-||x - y||² / (2σ²))
//!
//! σ (sigma) is the canonical parameter. The equivalent gamma form
//! K(x, y) = exp(-γ ||x - y||²) is accepted through [`RBFKernel::from_gamma`]
//! and converted with γ = 1 / (2σ²).

use crate::core::{Result, SVMError};
use crate::kernel::Kernel;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Gaussian RBF kernel parameterized by its bandwidth σ
///
/// - Large sigma: smooth decision functions, close to linear behavior
/// - Small sigma: every training point only influences its neighborhood
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RBFKernel {
    sigma: f64,
}

impl RBFKernel {
    /// Create a new RBF kernel with bandwidth `sigma`
    ///
    /// # Errors
    /// Returns `InvalidParameter` if sigma is not positive and finite
    pub fn new(sigma: f64) -> Result<Self> {
        let kernel = Self { sigma };
        kernel.validate()?;
        Ok(kernel)
    }

    /// Create an RBF kernel from the gamma parameterization
    ///
    /// # Errors
    /// Returns `InvalidParameter` if gamma is not positive and finite
    pub fn from_gamma(gamma: f64) -> Result<Self> {
        if !(gamma.is_finite() && gamma > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "RBF gamma must be positive, got: {gamma}"
            )));
        }
        Self::new((1.0 / (2.0 * gamma)).sqrt())
    }

    /// Get the sigma parameter
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Equivalent gamma = 1 / (2σ²)
    pub fn gamma(&self) -> f64 {
        1.0 / (2.0 * self.sigma * self.sigma)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "RBF sigma must be positive, got: {}",
                self.sigma
            )));
        }
        Ok(())
    }
}

impl Kernel for RBFKernel {
    fn compute(&self, x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
        let squared_distance = (&x - &y).mapv(|v| v * v).sum();
        (-self.gamma() * squared_distance).exp()
    }

    fn matrix(&self, x: ArrayView2<'_, f64>, z: ArrayView2<'_, f64>) -> Array2<f64> {
        // ||x - z||² = ||x||² + ||z||² - 2 x^T z
        let x_norms = x.map_axis(Axis(1), |row| row.dot(&row));
        let z_norms = z.map_axis(Axis(1), |row| row.dot(&row));

        let mut distances = x.dot(&z.t()) * -2.0;
        distances += &x_norms.insert_axis(Axis(1));
        distances += &z_norms.insert_axis(Axis(0));

        let gamma = self.gamma();
        // Clamp: cancellation can leave tiny negative distances
        distances.mapv_into(|d| (-gamma * d.max(0.0)).exp())
    }

    fn gram(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut k = self.matrix(x, x);
        k.diag_mut().fill(1.0);
        k
    }
}
