//! Polynomial Kernel Implementation
//!
//! The polynomial kernel is defined as:
//! K(x, y) = <x, y>^d
//!
//! Where d (degree) is a positive integer. Degree 1 reproduces the linear
//! kernel; degree 2 spans all pairwise feature products.

use crate::core::{Result, SVMError};
use crate::kernel::traits::Kernel;
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Homogeneous polynomial kernel of configurable degree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolynomialKernel {
    degree: u32,
}

impl PolynomialKernel {
    /// Creates a new polynomial kernel
    ///
    /// # Errors
    /// Returns `InvalidParameter` if `degree` is zero
    ///
    /// # Examples
    /// ```
    /// use fastsvm::kernel::PolynomialKernel;
    ///
    /// let quad_kernel = PolynomialKernel::new(2).unwrap();
    /// assert_eq!(quad_kernel.degree(), 2);
    /// assert!(PolynomialKernel::new(0).is_err());
    /// ```
    pub fn new(degree: u32) -> Result<Self> {
        let kernel = Self { degree };
        kernel.validate()?;
        Ok(kernel)
    }

    /// Creates a quadratic kernel: <x,y>²
    pub fn quadratic() -> Self {
        Self { degree: 2 }
    }

    /// Get the polynomial degree
    pub fn degree(&self) -> u32 {
        self.degree
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.degree < 1 {
            return Err(SVMError::InvalidParameter(format!(
                "Polynomial degree must be at least 1, got: {}",
                self.degree
            )));
        }
        if self.degree > i32::MAX as u32 {
            return Err(SVMError::InvalidParameter(format!(
                "Polynomial degree too large: {}",
                self.degree
            )));
        }
        Ok(())
    }

    fn exponent(&self) -> i32 {
        self.degree as i32
    }
}

impl Kernel for PolynomialKernel {
    fn compute(&self, x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
        x.dot(&y).powi(self.exponent())
    }

    fn matrix(&self, x: ArrayView2<'_, f64>, z: ArrayView2<'_, f64>) -> Array2<f64> {
        let exponent = self.exponent();
        x.dot(&z.t()).mapv_into(|v| v.powi(exponent))
    }
}
