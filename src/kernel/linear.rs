//! Linear kernel implementation

use crate::kernel::Kernel;
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Linear kernel: K(x, y) = x^T * y
///
/// With this kernel the fitted decision function is an ordinary hyperplane
/// through the origin, w = Xᵀβ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearKernel;

impl LinearKernel {
    /// Create a new linear kernel
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for LinearKernel {
    fn compute(&self, x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
        x.dot(&y)
    }

    fn matrix(&self, x: ArrayView2<'_, f64>, z: ArrayView2<'_, f64>) -> Array2<f64> {
        x.dot(&z.t())
    }
}
