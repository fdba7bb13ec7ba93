//! Shared training kernel matrix and index-addressed views into it
//!
//! The Gram matrix of a training set is computed once per fit and then shared
//! (behind `Arc`) by every sub-classifier and every cross-validation fold.
//! Subsets are addressed through index lists, so no sub-problem ever copies or
//! recomputes kernel values.

use crate::core::{Result, SVMError};
use crate::kernel::{Kernel, KernelFunction};
use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Training samples together with their Gram matrix
#[derive(Debug, Clone)]
pub struct KernelMatrix {
    kernel: KernelFunction,
    samples: Array2<f64>,
    gram: Array2<f64>,
}

impl KernelMatrix {
    /// Compute the Gram matrix of `samples` under `kernel`
    pub fn new(kernel: KernelFunction, samples: Array2<f64>) -> Self {
        let mut gram = kernel.gram(samples.view());
        // Matrix products are not bitwise symmetric
        let transposed = gram.t().to_owned();
        gram += &transposed;
        gram *= 0.5;

        debug!(
            "Computed {kernel} Gram matrix for {} samples of dimension {}",
            samples.nrows(),
            samples.ncols()
        );

        Self {
            kernel,
            samples,
            gram,
        }
    }

    /// Number of training samples
    pub fn len(&self) -> usize {
        self.samples.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Feature dimension of the training samples
    pub fn dim(&self) -> usize {
        self.samples.ncols()
    }

    pub fn kernel(&self) -> &KernelFunction {
        &self.kernel
    }

    pub fn samples(&self) -> ArrayView2<'_, f64> {
        self.samples.view()
    }

    pub fn gram(&self) -> ArrayView2<'_, f64> {
        self.gram.view()
    }

    /// Kernel between every training sample and every row of `z`
    ///
    /// The result has one row per training sample and one column per row of
    /// `z`; it is computed once per predict call and shared by all
    /// sub-classifiers.
    pub fn cross(&self, z: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.check_dim(z)?;
        Ok(self.kernel.matrix(self.samples.view(), z))
    }

    /// Kernel between the training rows `rows` and every row of `z`
    pub fn cross_subset(&self, rows: &[usize], z: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.check_dim(z)?;
        self.check_indices(rows)?;
        let subset = self.samples.select(Axis(0), rows);
        Ok(self.kernel.matrix(subset.view(), z))
    }

    /// Square view of the Gram matrix restricted to `indices`
    pub fn block<'a>(&'a self, indices: &'a [usize]) -> KernelBlock<'a> {
        KernelBlock::with_indices(self.gram.view(), indices)
    }

    /// Verify every index addresses a training sample
    pub fn check_indices(&self, indices: &[usize]) -> Result<()> {
        match indices.iter().find(|&&i| i >= self.len()) {
            Some(&i) => Err(SVMError::InvalidInput(format!(
                "Sample index {i} out of range for {} training samples",
                self.len()
            ))),
            None => Ok(()),
        }
    }

    fn check_dim(&self, z: ArrayView2<'_, f64>) -> Result<()> {
        if z.ncols() != self.dim() {
            return Err(SVMError::InvalidInput(format!(
                "Feature dimension mismatch: model was trained on {} features, got {}",
                self.dim(),
                z.ncols()
            )));
        }
        Ok(())
    }
}

/// Read-only view of a kernel matrix, optionally restricted to an index set
///
/// With indices, entry (i, j) of the block is entry
/// (indices[i], indices[j]) of the underlying matrix.
#[derive(Debug, Clone, Copy)]
pub struct KernelBlock<'a> {
    matrix: ArrayView2<'a, f64>,
    indices: Option<&'a [usize]>,
}

impl<'a> KernelBlock<'a> {
    /// View over a whole matrix
    pub fn new(matrix: ArrayView2<'a, f64>) -> Self {
        Self {
            matrix,
            indices: None,
        }
    }

    /// View over the rows and columns `indices` of `matrix`
    ///
    /// # Panics
    /// Products panic if an index is out of bounds for `matrix`
    pub fn with_indices(matrix: ArrayView2<'a, f64>, indices: &'a [usize]) -> Self {
        Self {
            matrix,
            indices: Some(indices),
        }
    }

    /// (rows, columns) of the block
    pub fn shape(&self) -> (usize, usize) {
        match self.indices {
            Some(idx) => (idx.len(), idx.len()),
            None => self.matrix.dim(),
        }
    }

    /// Side length; only meaningful for square blocks
    pub fn size(&self) -> usize {
        self.shape().0
    }

    pub fn is_square(&self) -> bool {
        let (rows, cols) = self.shape();
        rows == cols
    }

    /// Entry (i, j) of the block
    pub fn get(&self, i: usize, j: usize) -> f64 {
        match self.indices {
            Some(idx) => self.matrix[[idx[i], idx[j]]],
            None => self.matrix[[i, j]],
        }
    }

    /// Matrix-vector product of the block with `v`
    pub fn dot(&self, v: ArrayView1<'_, f64>) -> Array1<f64> {
        match self.indices {
            None => self.matrix.dot(&v),
            Some(idx) => idx
                .iter()
                .map(|&r| {
                    let row = self.matrix.row(r);
                    idx.iter().zip(v.iter()).map(|(&c, &b)| row[c] * b).sum::<f64>()
                })
                .collect(),
        }
    }

    /// Magnitude of the dominant eigenvalue, by power iteration
    ///
    /// Starts from the normalized all-ones vector, so the estimate is
    /// deterministic. Returns NaN if the block holds non-finite values.
    pub fn dominant_eigenvalue(&self, iterations: usize) -> f64 {
        let n = self.size();
        if n == 0 {
            return 0.0;
        }

        let mut v = Array1::from_elem(n, 1.0 / (n as f64).sqrt());
        let mut estimate = 0.0_f64;
        for _ in 0..iterations.max(1) {
            let w = self.dot(v.view());
            let norm = w.dot(&w).sqrt();
            if !norm.is_finite() {
                return f64::NAN;
            }
            if norm == 0.0 {
                return 0.0;
            }
            estimate = v.dot(&w);
            v = w / norm;
        }
        estimate.abs()
    }
}
