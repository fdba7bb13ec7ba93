//! Kernel trait definition

use ndarray::{Array2, ArrayView1, ArrayView2};

/// Kernel function trait
///
/// `matrix` is the hot path and must be expressed with whole-matrix
/// operations (matrix products, broadcasting, element-wise maps), never
/// with a loop over sample pairs.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y) for a single pair
    fn compute(&self, x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64;

    /// Compute K[i, j] = K(x_i, z_j) for every row of `x` and `z`
    ///
    /// # Panics
    /// Panics if `x` and `z` have a different number of columns
    fn matrix(&self, x: ArrayView2<'_, f64>, z: ArrayView2<'_, f64>) -> Array2<f64>;

    /// Compute the square Gram matrix K(x, x)
    ///
    /// Kernels with a known diagonal may override this to pin it exactly.
    fn gram(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        self.matrix(x, x)
    }
}
