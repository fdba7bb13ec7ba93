//! Core type definitions for SVM

use crate::core::{Result, SVMError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Class identifier as seen by the caller
pub type ClassLabel = i64;

/// Regularization term added to the smoothed hinge loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Penalty {
    /// λ·βᵀKβ, the RKHS norm of the decision function
    #[default]
    Kernel,
    /// λ·‖β‖², plain ridge on the coefficients
    Ridge,
}

/// Configuration for the fast gradient solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Maximum number of accelerated gradient iterations
    pub max_iterations: usize,
    /// Stop once the gradient norm drops below this value
    pub tolerance: f64,
    /// Maximum number of step halvings per line search
    pub max_backtracking: usize,
    /// Step size used when no Lipschitz estimate is available
    pub fallback_step: f64,
    /// Power iterations used to estimate the dominant kernel eigenvalue
    pub power_iterations: usize,
    /// Regularization form
    pub penalty: Penalty,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-3,
            max_backtracking: 50,
            fallback_step: 1.0,
            power_iterations: 50,
            penalty: Penalty::Kernel,
        }
    }
}

impl SolverConfig {
    /// Check every field is usable by the solver
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(SVMError::InvalidParameter(
                "max_iterations must be positive".to_string(),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "Tolerance must be positive, got: {}",
                self.tolerance
            )));
        }
        if !(self.fallback_step.is_finite() && self.fallback_step > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "Fallback step must be positive, got: {}",
                self.fallback_step
            )));
        }
        Ok(())
    }
}

/// Why the solver stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// Gradient norm fell below tolerance
    Converged,
    /// Iteration budget exhausted before reaching tolerance
    MaxIterations,
    /// No step along the gradient decreased the objective
    Stalled,
}

/// Result of one solver run
#[derive(Debug, Clone)]
pub struct SolverReport {
    /// Fitted coefficients, one per training sample of the sub-problem
    pub beta: Array1<f64>,
    /// Number of completed iterations
    pub iterations: usize,
    pub termination: TerminationReason,
    /// Objective value at β₀, β₁, ... (non-increasing)
    pub objective_history: Vec<f64>,
    /// Gradient norm at the returned β
    pub gradient_norm: f64,
    /// Step size in effect when the solver stopped
    pub final_step: f64,
}

impl SolverReport {
    /// Whether the tolerance was reached
    pub fn converged(&self) -> bool {
        self.termination == TerminationReason::Converged
    }

    /// Objective value at the returned β
    pub fn final_objective(&self) -> f64 {
        self.objective_history.last().copied().unwrap_or(0.0)
    }
}
