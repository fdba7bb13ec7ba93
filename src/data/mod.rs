//! Data loading and dataset implementations
//!
//! Dense in-memory datasets, CSV loading and synthetic data generation.

pub mod csv;
pub mod synthetic;

pub use self::csv::*;
pub use self::synthetic::*;

use crate::core::{ClassLabel, Dataset, Result, SVMError};
use ndarray::{Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Owned feature matrix with one class label per row
#[derive(Debug, Clone, PartialEq)]
pub struct DenseDataset {
    features: Array2<f64>,
    labels: Vec<ClassLabel>,
}

impl DenseDataset {
    pub fn new(features: Array2<f64>, labels: Vec<ClassLabel>) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(SVMError::InvalidInput(format!(
                "{} samples but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        Ok(Self { features, labels })
    }

    pub(crate) fn from_parts_unchecked(features: Array2<f64>, labels: Vec<ClassLabel>) -> Self {
        Self { features, labels }
    }

    /// Rows `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Seeded random split into (train, test)
    ///
    /// `train_ratio` of the rows (rounded down, at least one) go to the
    /// training set.
    pub fn train_test_split(&self, train_ratio: f64, seed: u64) -> Result<(Self, Self)> {
        if !(train_ratio > 0.0 && train_ratio < 1.0) {
            return Err(SVMError::InvalidParameter(format!(
                "Train ratio must be between 0 and 1, got: {train_ratio}"
            )));
        }
        let n = self.len();
        if n < 2 {
            return Err(SVMError::InvalidInput(format!(
                "Cannot split {n} samples into train and test sets"
            )));
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));
        let n_train = ((n as f64 * train_ratio) as usize).clamp(1, n - 1);
        let (train, test) = order.split_at(n_train);
        Ok((self.select(train), self.select(test)))
    }

    /// Write as CSV with a header row, label in the last column
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        let header: Vec<String> = (0..self.dim()).map(|j| format!("x{j}")).collect();
        writeln!(writer, "{},label", header.join(","))?;
        for (row, label) in self.features.outer_iter().zip(&self.labels) {
            let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(writer, "{},{label}", values.join(","))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn into_parts(self) -> (Array2<f64>, Vec<ClassLabel>) {
        (self.features, self.labels)
    }
}

impl Dataset for DenseDataset {
    fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    fn labels(&self) -> &[ClassLabel] {
        &self.labels
    }
}
