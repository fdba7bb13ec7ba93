//! Accelerated (fast) gradient descent with backtracking line search
//!
//! Iteration t extrapolates θ = βₜ + k/(k+3)·(βₜ - βₜ₋₁), takes a gradient
//! step from θ whose size is found by halving until
//! F(θ - ηg) ≤ F(θ) - η/2·‖g‖², and sets βₜ₊₁ = θ - ηg. The step size carries
//! over between iterations.
//!
//! Whenever the extrapolated step would increase the objective, momentum is
//! reset (k = 0) and a plain gradient step from βₜ is taken instead, so the
//! sequence F(β₀), F(β₁), ... is non-increasing.

use crate::core::{Objective, Result, SVMError, SolverConfig, SolverReport, TerminationReason};
use log::{debug, trace, warn};
use ndarray::{Array1, ArrayView1};

/// Accelerated gradient solver for smooth objectives
#[derive(Debug, Clone)]
pub struct FastGradientSolver {
    config: SolverConfig,
}

/// Accepted (or last attempted) point of one line search
struct LineSearch {
    step: f64,
    point: Array1<f64>,
    value: f64,
}

impl FastGradientSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Minimize `objective` starting from β₀ = 0
    ///
    /// Reaching `max_iterations` without meeting the tolerance is not an
    /// error: the best β found is returned with
    /// `TerminationReason::MaxIterations`.
    ///
    /// # Errors
    /// `NumericalDivergence` if the objective or its gradient becomes
    /// non-finite at an iterate or extrapolated point.
    pub fn minimize<O: Objective>(&self, objective: &O) -> Result<SolverReport> {
        let n = objective.dim();
        let tolerance = self.config.tolerance;

        let mut beta = Array1::zeros(n);
        let (mut value, mut gradient) = objective.value_and_gradient(beta.view());
        ensure_finite(value, &gradient, 0, "initial point")?;
        let mut gradient_norm = norm(&gradient);
        let mut history = vec![value];

        if n == 0 || gradient_norm < tolerance {
            return Ok(SolverReport {
                beta,
                iterations: 0,
                termination: TerminationReason::Converged,
                objective_history: history,
                gradient_norm,
                final_step: self.config.fallback_step,
            });
        }

        let mut step = self.initial_step(objective);
        step = self
            .backtrack(objective, beta.view(), value, &gradient, step, 0)?
            .step;
        debug!("Fast gradient: n={n}, initial step {step:.3e}");

        let mut previous = beta.clone();
        let mut momentum = 0usize;
        let mut iterations = 0;
        let mut termination = TerminationReason::MaxIterations;

        for t in 0..self.config.max_iterations {
            let mut trial = if momentum == 0 {
                self.backtrack(objective, beta.view(), value, &gradient, step, t)?
            } else {
                let coefficient = momentum as f64 / (momentum as f64 + 3.0);
                let theta = &beta + &((&beta - &previous) * coefficient);
                let (theta_value, theta_gradient) = objective.value_and_gradient(theta.view());
                ensure_finite(theta_value, &theta_gradient, t, "extrapolated point")?;
                self.backtrack(objective, theta.view(), theta_value, &theta_gradient, step, t)?
            };

            if trial.value > value && momentum > 0 {
                trace!("iter {t}: objective increased, restarting momentum");
                momentum = 0;
                trial = self.backtrack(objective, beta.view(), value, &gradient, step, t)?;
            }
            step = trial.step;

            if trial.value > value {
                termination = TerminationReason::Stalled;
                break;
            }

            previous = std::mem::replace(&mut beta, trial.point);
            let (next_value, next_gradient) = objective.value_and_gradient(beta.view());
            ensure_finite(next_value, &next_gradient, t + 1, "iterate")?;
            value = next_value;
            gradient = next_gradient;
            gradient_norm = norm(&gradient);
            history.push(value);
            iterations = t + 1;
            momentum += 1;

            trace!("iter {t}: F={value:.6e} |g|={gradient_norm:.3e} step={step:.3e}");

            if gradient_norm < tolerance {
                termination = TerminationReason::Converged;
                break;
            }
        }

        match termination {
            TerminationReason::Converged => debug!(
                "Fast gradient converged after {iterations} iterations (F={value:.6e})"
            ),
            TerminationReason::MaxIterations => warn!(
                "Fast gradient stopped at max_iter={} with gradient norm {gradient_norm:.3e}",
                self.config.max_iterations
            ),
            TerminationReason::Stalled => warn!(
                "Fast gradient stalled after {iterations} iterations with gradient norm {gradient_norm:.3e}"
            ),
        }

        Ok(SolverReport {
            beta,
            iterations,
            termination,
            objective_history: history,
            gradient_norm,
            final_step: step,
        })
    }

    /// 1/L from the objective's Lipschitz estimate, else the fallback step
    fn initial_step<O: Objective>(&self, objective: &O) -> f64 {
        objective
            .lipschitz_estimate()
            .map(|l| 1.0 / l)
            .filter(|step| step.is_finite() && *step > 0.0)
            .unwrap_or(self.config.fallback_step)
    }

    /// Halve `step` until the sufficient decrease condition holds at `point`
    ///
    /// After `max_backtracking` halvings the last trial is returned even if
    /// the condition failed; callers compare its value against the current
    /// objective. Non-finite trial values count as failed trials.
    fn backtrack<O: Objective>(
        &self,
        objective: &O,
        point: ArrayView1<'_, f64>,
        value: f64,
        gradient: &Array1<f64>,
        step: f64,
        iteration: usize,
    ) -> Result<LineSearch> {
        let squared_norm = gradient.dot(gradient);
        let mut step = step;
        let mut last = None;

        for _ in 0..=self.config.max_backtracking {
            let candidate = &point - &(gradient * step);
            let candidate_value = objective.value(candidate.view());
            if candidate_value.is_finite() && candidate_value <= value - 0.5 * step * squared_norm
            {
                return Ok(LineSearch {
                    step,
                    point: candidate,
                    value: candidate_value,
                });
            }
            last = Some(LineSearch {
                step,
                point: candidate,
                value: candidate_value,
            });
            step *= 0.5;
        }

        match last {
            Some(search) if search.value.is_finite() => Ok(search),
            _ => Err(SVMError::NumericalDivergence {
                iteration,
                detail: "line search produced only non-finite objective values".to_string(),
            }),
        }
    }
}

fn norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}

fn ensure_finite(value: f64, gradient: &Array1<f64>, iteration: usize, what: &str) -> Result<()> {
    if !value.is_finite() {
        return Err(SVMError::NumericalDivergence {
            iteration,
            detail: format!("objective is {value} at the {what}"),
        });
    }
    if gradient.iter().any(|g| !g.is_finite()) {
        return Err(SVMError::NumericalDivergence {
            iteration,
            detail: format!("gradient has non-finite entries at the {what}"),
        });
    }
    Ok(())
}
