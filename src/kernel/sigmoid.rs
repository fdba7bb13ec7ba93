//! Sigmoid (Tanh) Kernel Implementation
//!
//! The Sigmoid kernel is defined as:
//! K(x, y) = tanh(α * <x, y> + β)
//!
//! Values are bounded in [-1, 1]. The kernel is not positive semi-definite
//! for every (α, β), so the solver's Lipschitz estimate can be loose; the
//! line search absorbs that.

use crate::core::{Result, SVMError};
use crate::kernel::traits::Kernel;
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Hyperbolic tangent kernel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmoidKernel {
    alpha: f64,
    beta: f64,
}

impl SigmoidKernel {
    /// Creates a new Sigmoid kernel
    ///
    /// # Errors
    /// Returns `InvalidParameter` if either parameter is not finite
    ///
    /// # Examples
    /// ```
    /// use fastsvm::kernel::SigmoidKernel;
    ///
    /// let kernel = SigmoidKernel::new(0.1, -1.0).unwrap();
    /// assert_eq!(kernel.alpha(), 0.1);
    /// assert_eq!(kernel.beta(), -1.0);
    /// ```
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        let kernel = Self { alpha, beta };
        kernel.validate()?;
        Ok(kernel)
    }

    /// Scaling applied to the dot product
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Offset added before the tanh
    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.alpha.is_finite() || !self.beta.is_finite() {
            return Err(SVMError::InvalidParameter(format!(
                "Sigmoid parameters must be finite, got alpha={}, beta={}",
                self.alpha, self.beta
            )));
        }
        Ok(())
    }
}

impl Kernel for SigmoidKernel {
    fn compute(&self, x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
        (self.alpha * x.dot(&y) + self.beta).tanh()
    }

    fn matrix(&self, x: ArrayView2<'_, f64>, z: ArrayView2<'_, f64>) -> Array2<f64> {
        let (alpha, beta) = (self.alpha, self.beta);
        x.dot(&z.t()).mapv_into(|v| (alpha * v + beta).tanh())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_sigmoid_kernel_computation() {
        let kernel = SigmoidKernel::new(0.5, -1.0).unwrap();
        let x = array![1.0, 2.0];
        let y = array![3.0, 1.0];

        // <x, y> = 5, tanh(0.5 * 5 - 1) = tanh(1.5)
        assert_relative_eq!(
            kernel.compute(x.view(), y.view()),
            1.5_f64.tanh(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_sigmoid_kernel_bounded() {
        let kernel = SigmoidKernel::new(10.0, 5.0).unwrap();
        let x = array![[100.0, -3.0], [-50.0, 20.0], [0.0, 0.0]];
        let k = kernel.gram(x.view());
        assert!(k.iter().all(|&v| (-1.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_sigmoid_gram_symmetric() {
        let kernel = SigmoidKernel::new(0.2, 0.1).unwrap();
        let x = array![[1.0, -0.5], [0.3, 2.0], [-1.5, 0.7]];
        let k = kernel.gram(x.view());
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(k[[i, j]], k[[j, i]], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_sigmoid_kernel_invalid_params() {
        assert!(matches!(
            SigmoidKernel::new(f64::INFINITY, 0.0),
            Err(SVMError::InvalidParameter(_))
        ));
        assert!(matches!(
            SigmoidKernel::new(1.0, f64::NAN),
            Err(SVMError::InvalidParameter(_))
        ));
    }
}
