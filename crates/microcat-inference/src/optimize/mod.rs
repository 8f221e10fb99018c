//! Unconstrained minimizers used by the maximum-likelihood estimator.
//!
//! - [`Bfgs`]: quasi-Newton with central finite-difference gradients and
//!   optional box bounds (projected steps).
//! - [`Powell`]: derivative-free direction-set method with Brent line
//!   searches; tolerates kinks and flat ridges in the objective.
//!
//! Both minimizers evaluate the objective through an [`Objective`] guard
//! that lives exactly as long as one `minimize` call. Inside that scope a
//! `NaN` or infinite value at a trial point is treated as `+inf` (the point
//! is simply rejected) and counted. Only the starting value is required to
//! be finite. Running out of iterations or ending on a non-finite point is a
//! [`ConvergenceError`].

mod bfgs;
mod powell;

pub use self::{
    bfgs::{Bfgs, BfgsOptions},
    powell::{Powell, PowellOptions},
};

/// The optimizer could not produce a trustworthy minimum.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("{method} did not converge after {iterations} iterations: {message}")]
pub struct ConvergenceError {
    /// Name of the optimization method that failed.
    pub method: &'static str,
    /// Diagnostic reported by the optimizer.
    pub message: String,
    /// Iterations completed before giving up.
    pub iterations: usize,
}

/// Outcome of a successful minimization.
#[derive(Debug, Clone)]
pub struct OptimizeReport {
    /// Location of the minimum.
    pub x: Vec<f64>,
    /// Objective value at `x`.
    pub value: f64,
    /// Outer iterations performed.
    pub iterations: usize,
    /// Total objective evaluations, including gradient and line-search trial points.
    pub evaluations: usize,
    /// Trial evaluations that returned a non-finite value and were rejected.
    pub suppressed: usize,
    /// Termination reason.
    pub message: &'static str,
}

/// A method that minimizes a scalar function of a real vector.
pub trait Minimizer {
    /// Method name reported in errors and logs.
    const METHOD: &'static str;

    /// Minimizes `objective` starting from `x0`.
    fn minimize<F>(&self, objective: F, x0: &[f64]) -> Result<OptimizeReport, ConvergenceError>
    where
        F: FnMut(&[f64]) -> f64;
}

/// Counting wrapper around an objective for the duration of one
/// minimization.
pub(crate) struct Objective<F> {
    f: F,
    evaluations: usize,
    suppressed: usize,
}

impl<F> Objective<F>
where
    F: FnMut(&[f64]) -> f64,
{
    pub(crate) fn new(f: F) -> Self {
        Self {
            f,
            evaluations: 0,
            suppressed: 0,
        }
    }

    /// Evaluates without suppression.
    pub(crate) fn eval_raw(&mut self, x: &[f64]) -> f64 {
        self.evaluations += 1;
        (self.f)(x)
    }

    /// Evaluates a trial point, mapping non-finite values to `+inf`.
    pub(crate) fn eval(&mut self, x: &[f64]) -> f64 {
        let value = self.eval_raw(x);
        if value.is_finite() {
            value
        } else {
            self.suppressed += 1;
            tracing::trace!(?x, value, "suppressed non-finite objective value");
            f64::INFINITY
        }
    }

    pub(crate) fn finish(
        self,
        method: &'static str,
        x: Vec<f64>,
        value: f64,
        iterations: usize,
        message: &'static str,
    ) -> Result<OptimizeReport, ConvergenceError> {
        if self.suppressed > 0 {
            tracing::debug!(
                method,
                suppressed = self.suppressed,
                evaluations = self.evaluations,
                "ignored non-finite objective values during search"
            );
        }
        if !value.is_finite() || x.iter().any(|v| !v.is_finite()) {
            return Err(ConvergenceError {
                method,
                message: format!("terminated at a non-finite point ({message})"),
                iterations,
            });
        }
        Ok(OptimizeReport {
            x,
            value,
            iterations,
            evaluations: self.evaluations,
            suppressed: self.suppressed,
            message,
        })
    }

    pub(crate) fn fail(
        self,
        method: &'static str,
        message: impl Into<String>,
        iterations: usize,
    ) -> ConvergenceError {
        let message = message.into();
        tracing::debug!(
            method,
            iterations,
            evaluations = self.evaluations,
            suppressed = self.suppressed,
            %message,
            "minimization failed"
        );
        ConvergenceError {
            method,
            message,
            iterations,
        }
    }
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub(crate) fn norm_inf(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}
