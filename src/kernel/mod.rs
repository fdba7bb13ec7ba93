//! Kernel functions for SVM

pub mod linear;
pub mod matrix;
pub mod polynomial;
pub mod rbf;
pub mod sigmoid;
pub mod traits;

pub use self::linear::*;
pub use self::matrix::*;
pub use self::polynomial::*;
pub use self::rbf::*;
pub use self::sigmoid::*;
pub use self::traits::*;

use crate::core::{Penalty, Result, SVMError};
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Closed set of supported kernels, each carrying its parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum KernelFunction {
    Linear,
    #[serde(rename = "poly")]
    Polynomial(PolynomialKernel),
    Rbf(RBFKernel),
    Sigmoid(SigmoidKernel),
}

impl KernelFunction {
    /// Linear kernel
    pub fn linear() -> Self {
        Self::Linear
    }

    /// Polynomial kernel of the given degree
    pub fn polynomial(degree: u32) -> Result<Self> {
        PolynomialKernel::new(degree).map(Self::Polynomial)
    }

    /// RBF kernel with bandwidth sigma
    pub fn rbf(sigma: f64) -> Result<Self> {
        RBFKernel::new(sigma).map(Self::Rbf)
    }

    /// Sigmoid kernel tanh(alpha * <x, z> + beta)
    pub fn sigmoid(alpha: f64, beta: f64) -> Result<Self> {
        SigmoidKernel::new(alpha, beta).map(Self::Sigmoid)
    }

    /// Build a kernel from its name and a parameter map
    ///
    /// Recognized names and parameters:
    /// - `linear`: none
    /// - `poly`: `degree`
    /// - `rbf`: `sigma` or `gamma` (exactly one)
    /// - `sigmoid`: `alpha`, `beta`
    ///
    /// # Errors
    /// Returns `InvalidParameter` for unknown kernels, missing or unexpected
    /// parameters, and values violating the kernel's contract.
    pub fn from_params(name: &str, params: &BTreeMap<String, f64>) -> Result<Self> {
        let allowed: &[&str] = match name {
            "linear" => &[],
            "poly" | "polynomial" => &["degree"],
            "rbf" => &["sigma", "gamma"],
            "sigmoid" => &["alpha", "beta"],
            other => {
                return Err(SVMError::InvalidParameter(format!(
                    "Unknown kernel: {other}. Use linear, poly, rbf or sigmoid"
                )))
            }
        };
        if let Some(key) = params.keys().find(|k| !allowed.contains(&k.as_str())) {
            return Err(SVMError::InvalidParameter(format!(
                "Unexpected parameter '{key}' for {name} kernel"
            )));
        }

        let require = |key: &str| {
            params.get(key).copied().ok_or_else(|| {
                SVMError::InvalidParameter(format!("{name} kernel requires parameter '{key}'"))
            })
        };

        match name {
            "linear" => Ok(Self::linear()),
            "poly" | "polynomial" => {
                let degree = require("degree")?;
                if degree.fract() != 0.0 || degree < 1.0 || degree > u32::MAX as f64 {
                    return Err(SVMError::InvalidParameter(format!(
                        "Polynomial degree must be a positive integer, got: {degree}"
                    )));
                }
                Self::polynomial(degree as u32)
            }
            "rbf" => match (params.get("sigma"), params.get("gamma")) {
                (Some(&sigma), None) => Self::rbf(sigma),
                (None, Some(&gamma)) => RBFKernel::from_gamma(gamma).map(Self::Rbf),
                (Some(_), Some(_)) => Err(SVMError::InvalidParameter(
                    "rbf kernel takes either 'sigma' or 'gamma', not both".to_string(),
                )),
                (None, None) => Err(SVMError::InvalidParameter(
                    "rbf kernel requires parameter 'sigma' or 'gamma'".to_string(),
                )),
            },
            _ => Self::sigmoid(require("alpha")?, require("beta")?),
        }
    }

    /// Short kernel name as used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Polynomial(_) => "poly",
            Self::Rbf(_) => "rbf",
            Self::Sigmoid(_) => "sigmoid",
        }
    }

    /// Regularization used unless configured otherwise
    ///
    /// The sigmoid Gram matrix is indefinite, so λ·βᵀKβ is unbounded below
    /// and sigmoid models use the ridge penalty.
    pub fn default_penalty(&self) -> Penalty {
        match self {
            Self::Sigmoid(_) => Penalty::Ridge,
            _ => Penalty::Kernel,
        }
    }

    /// Re-check parameters, e.g. after deserialization
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Linear => Ok(()),
            Self::Polynomial(k) => k.validate(),
            Self::Rbf(k) => k.validate(),
            Self::Sigmoid(k) => k.validate(),
        }
    }

    fn inner(&self) -> &dyn Kernel {
        match self {
            Self::Linear => &LinearKernel,
            Self::Polynomial(k) => k,
            Self::Rbf(k) => k,
            Self::Sigmoid(k) => k,
        }
    }
}

impl Kernel for KernelFunction {
    fn compute(&self, x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
        self.inner().compute(x, y)
    }

    fn matrix(&self, x: ArrayView2<'_, f64>, z: ArrayView2<'_, f64>) -> Array2<f64> {
        self.inner().matrix(x, z)
    }

    fn gram(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        self.inner().gram(x)
    }
}

impl fmt::Display for KernelFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Polynomial(k) => write!(f, "poly(degree={})", k.degree()),
            Self::Rbf(k) => write!(f, "rbf(sigma={})", k.sigma()),
            Self::Sigmoid(k) => write!(f, "sigmoid(alpha={}, beta={})", k.alpha(), k.beta()),
        }
    }
}
