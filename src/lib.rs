//! Multiclass kernel Support Vector Machine (SVM)
//!
//! Binary classifiers minimize a squared-hinge objective over kernel
//! coefficients with accelerated gradient descent. Regularization strength
//! can be selected by k-fold cross-validation, and multiclass problems are
//! decomposed one-vs-one or one-vs-rest.

pub mod api;
pub mod binary;
pub mod core;
pub mod data;
pub mod kernel;
pub mod multiclass;
pub mod persistence;
pub mod solver;
pub mod validation;

// Re-export main types for convenience
pub use crate::api::{SVMBuilder, SVMConfig, SVM};
pub use crate::binary::{BinaryClassifier, BinaryTask};
pub use crate::core::error::*;
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::{CSVDataset, DenseDataset};
pub use crate::kernel::{Kernel, KernelFunction, KernelMatrix};
pub use crate::multiclass::{MulticlassDecomposer, Strategy};
pub use crate::solver::{FastGradientSolver, SquaredHingeObjective};
pub use crate::validation::{CrossValidation, CrossValidator, FoldPolicy};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
