//! Partitioning of sample indices into cross-validation folds

use crate::core::{Result, SVMError};
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// How sample indices are ordered before being cut into folds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoldPolicy {
    /// Seeded permutation of the indices
    Shuffled { seed: u64 },
    /// Indices in their natural order
    Sequential,
}

impl Default for FoldPolicy {
    fn default() -> Self {
        Self::Shuffled { seed: 0 }
    }
}

/// k disjoint folds covering 0..n
///
/// Fold sizes differ by at most one; the first `n % k` folds hold the extra
/// index.
#[derive(Debug, Clone)]
pub struct FoldAssignment {
    folds: Vec<Vec<usize>>,
    n_samples: usize,
}

impl FoldAssignment {
    /// # Errors
    /// `InvalidConfiguration` if `n_folds` is 0 or exceeds `n_samples`.
    pub fn new(n_samples: usize, n_folds: usize, policy: FoldPolicy) -> Result<Self> {
        if n_folds == 0 {
            return Err(SVMError::InvalidConfiguration(
                "Number of folds must be at least 1".to_string(),
            ));
        }
        if n_folds > n_samples {
            return Err(SVMError::InvalidConfiguration(format!(
                "Cannot split {n_samples} samples into {n_folds} folds"
            )));
        }

        let mut order: Vec<usize> = (0..n_samples).collect();
        if let FoldPolicy::Shuffled { seed } = policy {
            let mut rng = StdRng::seed_from_u64(seed);
            order.shuffle(&mut rng);
        }

        let base = n_samples / n_folds;
        let extra = n_samples % n_folds;
        let mut folds = Vec::with_capacity(n_folds);
        let mut start = 0;
        for fold in 0..n_folds {
            let size = base + usize::from(fold < extra);
            folds.push(order[start..start + size].to_vec());
            start += size;
        }

        debug!("Assigned {n_samples} samples to {n_folds} folds ({policy:?})");
        Ok(Self { folds, n_samples })
    }

    pub fn n_folds(&self) -> usize {
        self.folds.len()
    }

    /// Held-out indices of `fold`
    pub fn fold(&self, fold: usize) -> &[usize] {
        &self.folds[fold]
    }

    /// (train, test) indices for `fold`
    ///
    /// With a single fold there is no complement, so training and test sets
    /// are both the full index range.
    pub fn split(&self, fold: usize) -> (Vec<usize>, Vec<usize>) {
        if self.folds.len() == 1 {
            let all: Vec<usize> = (0..self.n_samples).collect();
            return (all.clone(), all);
        }
        let train = self
            .folds
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != fold)
            .flat_map(|(_, f)| f.iter().copied())
            .collect();
        (train, self.folds[fold].clone())
    }
}
