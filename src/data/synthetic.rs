//! Synthetic Gaussian blob datasets

use crate::core::{ClassLabel, Result, SVMError};
use crate::data::DenseDataset;
use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Isotropic Gaussian clusters, one class per center
///
/// Row `c` of `centers` produces `per_blob` samples labelled `c`, drawn from
/// N(center, std_dev²·I). Rows are ordered blob by blob.
pub fn gaussian_blobs(
    centers: ArrayView2<'_, f64>,
    per_blob: usize,
    std_dev: f64,
    seed: u64,
) -> Result<DenseDataset> {
    let noise = Normal::new(0.0, std_dev).map_err(|e| {
        SVMError::InvalidParameter(format!("Invalid blob standard deviation {std_dev}: {e}"))
    })?;
    let mut rng = StdRng::seed_from_u64(seed);

    let (n_blobs, dim) = centers.dim();
    let mut features = Array2::zeros((n_blobs * per_blob, dim));
    let mut labels = Vec::with_capacity(n_blobs * per_blob);

    for (c, center) in centers.outer_iter().enumerate() {
        for k in 0..per_blob {
            let mut row = features.row_mut(c * per_blob + k);
            for (value, &mean) in row.iter_mut().zip(center.iter()) {
                *value = mean + noise.sample(&mut rng);
            }
            labels.push(c as ClassLabel);
        }
    }

    DenseDataset::new(features, labels)
}

/// `n_classes` centers drawn uniformly from [-spread, spread]^dims
pub fn random_centers(n_classes: usize, dims: usize, spread: f64, seed: u64) -> Result<Array2<f64>> {
    if !(spread.is_finite() && spread > 0.0) {
        return Err(SVMError::InvalidParameter(format!(
            "Center spread must be positive, got: {spread}"
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(Array2::from_shape_fn((n_classes, dims), |_| {
        rng.gen_range(-spread..=spread)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Dataset;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Axis};

    #[test]
    fn test_blob_shapes_and_labels() {
        let centers = array![[-5.0, -5.0], [5.0, 5.0]];
        let data = gaussian_blobs(centers.view(), 50, 1.0, 0).unwrap();
        assert_eq!(data.len(), 100);
        assert_eq!(data.dim(), 2);
        assert_eq!(data.labels()[0], 0);
        assert_eq!(data.labels()[99], 1);
    }

    #[test]
    fn test_blobs_center_on_means() {
        let centers = array![[3.0, -1.0, 0.5]];
        let data = gaussian_blobs(centers.view(), 2000, 0.5, 11).unwrap();
        let mean = data.features().mean_axis(Axis(0)).unwrap();
        for (m, c) in mean.iter().zip(centers.row(0).iter()) {
            assert_abs_diff_eq!(m, c, epsilon = 0.05);
        }
    }

    #[test]
    fn test_blobs_reproducible() {
        let centers = array![[0.0, 0.0], [1.0, 1.0]];
        let a = gaussian_blobs(centers.view(), 5, 1.0, 9).unwrap();
        let b = gaussian_blobs(centers.view(), 5, 1.0, 9).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_std() {
        let centers = array![[0.0]];
        assert!(matches!(
            gaussian_blobs(centers.view(), 3, -1.0, 0),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_random_centers_within_spread() {
        let centers = random_centers(4, 60, 2.0, 1).unwrap();
        assert_eq!(centers.dim(), (4, 60));
        assert!(centers.iter().all(|v| v.abs() <= 2.0));
    }
}
