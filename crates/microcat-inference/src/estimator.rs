//! Maximum-likelihood fits of the catastrophe-time models.
//!
//! A fit minimizes the mean negative log-likelihood `−ℓ(θ) / n` over the
//! log-space parameter vector. The minimizer is the MLE, positivity of the
//! parameters is automatic, and optimizer tolerances do not depend on the
//! sample size. An empty sample makes the objective `0 / 0 = NaN` at the
//! starting point, so fitting it fails with a [`ConvergenceError`].
//!
//! | model              | optimizer  | initial guess                |
//! |--------------------|------------|------------------------------|
//! | Gamma              | BFGS       | `α = 2`, `β = 1/300`         |
//! | double exponential | Powell     | `β1 = 1/200`, `β2 = 1/300`   |
//!
//! The double-exponential likelihood is symmetric in `β1` and `β2` and has
//! a ridge along `β1 = β2`, which the derivative-free Powell method handles
//! without finite-difference gradients straddling the collapse branch.

use serde::Serialize;

use crate::{
    likelihood::{
        DoubleExponentialModel, DoubleExponentialParams, GammaModel, GammaParams, Model,
    },
    optimize::{Bfgs, BfgsOptions, ConvergenceError, Minimizer, Powell, PowellOptions},
};

/// Initial guesses and optimizer settings for [`Estimator`].
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub gamma_initial: GammaParams,
    pub double_exponential_initial: DoubleExponentialParams,
    pub bfgs: BfgsOptions,
    pub powell: PowellOptions,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            gamma_initial: GammaParams {
                alpha: 2.0,
                beta: 1.0 / 300.0,
            },
            double_exponential_initial: DoubleExponentialParams {
                beta1: 1.0 / 200.0,
                beta2: 1.0 / 300.0,
            },
            bfgs: BfgsOptions::default(),
            powell: PowellOptions::default(),
        }
    }
}

/// A converged maximum-likelihood fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult<P> {
    /// Fitted natural-scale parameters.
    pub params: P,
    /// Log-likelihood of the data at [`Self::params`].
    pub log_likelihood: f64,
    pub iterations: usize,
    pub evaluations: usize,
    /// Optimizer's termination reason.
    pub message: &'static str,
}

/// Fits the Gamma and double-exponential models to catastrophe times.
///
/// # Example
///
/// ```
/// use microcat_inference::{estimator::Estimator, likelihood::GammaParams, sampler::Sampler, simulate};
///
/// let mut sampler = Sampler::seed_from_u64(12);
/// let truth = GammaParams { alpha: 2.5, beta: 0.006 };
/// let times = simulate::draw_gamma(&mut sampler, truth, 2000).unwrap();
///
/// let fit = Estimator::default().fit_gamma(&times).unwrap();
/// assert!((fit.params.alpha - truth.alpha).abs() < 0.5);
/// assert!((fit.params.beta - truth.beta).abs() < 0.0015);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Estimator {
    pub config: EstimatorConfig,
}

impl Estimator {
    #[must_use]
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Gamma MLE by BFGS.
    pub fn fit_gamma(&self, data: &[f64]) -> Result<FitResult<GammaParams>, ConvergenceError> {
        fit::<GammaModel, _>(
            &Bfgs::new(self.config.bfgs.clone()),
            data,
            self.config.gamma_initial,
        )
    }

    /// Double-exponential MLE by Powell's method.
    pub fn fit_double_exponential(
        &self,
        data: &[f64],
    ) -> Result<FitResult<DoubleExponentialParams>, ConvergenceError> {
        fit::<DoubleExponentialModel, _>(
            &Powell::new(self.config.powell.clone()),
            data,
            self.config.double_exponential_initial,
        )
    }
}

/// Maximizes the likelihood of model `M` with `minimizer`, starting at
/// `initial`.
#[expect(clippy::cast_precision_loss)]
pub fn fit<M, O>(
    minimizer: &O,
    data: &[f64],
    initial: M::Params,
) -> Result<FitResult<M::Params>, ConvergenceError>
where
    M: Model,
    O: Minimizer,
{
    let n = data.len() as f64;
    let x0 = M::to_log_params(initial);
    let report = minimizer
        .minimize(|x| -M::log_likelihood([x[0], x[1]], data) / n, &x0)
        .inspect_err(|err| {
            tracing::debug!(model = M::NAME, size = data.len(), %err, "maximum-likelihood fit failed");
        })?;

    let log_params = [report.x[0], report.x[1]];
    let params = M::from_log_params(log_params);
    let log_likelihood = M::log_likelihood(log_params, data);
    tracing::debug!(
        model = M::NAME,
        method = O::METHOD,
        size = data.len(),
        ?params,
        log_likelihood,
        iterations = report.iterations,
        evaluations = report.evaluations,
        suppressed = report.suppressed,
        "maximum-likelihood fit converged"
    );
    Ok(FitResult {
        params,
        log_likelihood,
        iterations: report.iterations,
        evaluations: report.evaluations,
        message: report.message,
    })
}

/// Fits `Gamma(α, β)` with the default [`Estimator`].
pub fn fit_gamma_mle(data: &[f64]) -> Result<FitResult<GammaParams>, ConvergenceError> {
    Estimator::default().fit_gamma(data)
}

/// Fits the double-exponential model with the default [`Estimator`].
pub fn fit_double_exponential_mle(
    data: &[f64],
) -> Result<FitResult<DoubleExponentialParams>, ConvergenceError> {
    Estimator::default().fit_double_exponential(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        likelihood::{double_exponential_log_likelihood, gamma_log_likelihood},
        sampler::Sampler,
        simulate::{draw_double_exponential, draw_gamma},
    };

    fn relative_error(estimate: f64, truth: f64) -> f64 {
        (estimate - truth).abs() / truth
    }

    #[test]
    fn test_gamma_fit_recovers_parameters() {
        let truth = GammaParams {
            alpha: 3.0,
            beta: 0.01,
        };
        let mut sampler = Sampler::seed_from_u64(2019);
        let times = draw_gamma(&mut sampler, truth, 5000).unwrap();

        let fit = fit_gamma_mle(&times).unwrap();
        assert!(relative_error(fit.params.alpha, truth.alpha) < 0.1, "{fit:?}");
        assert!(relative_error(fit.params.beta, truth.beta) < 0.1, "{fit:?}");
        assert!(fit.iterations > 0);
        assert!(fit.evaluations >= fit.iterations);
    }

    #[test]
    fn test_gamma_fit_maximizes_likelihood() {
        let mut sampler = Sampler::seed_from_u64(5);
        let times = draw_gamma(
            &mut sampler,
            GammaParams {
                alpha: 1.7,
                beta: 0.004,
            },
            800,
        )
        .unwrap();
        let fit = fit_gamma_mle(&times).unwrap();
        let best = GammaModel::to_log_params(fit.params);
        assert!((fit.log_likelihood - gamma_log_likelihood(best, &times)).abs() < 1e-9);
        for (da, db) in [(0.01, 0.0), (-0.01, 0.0), (0.0, 0.01), (0.0, -0.01)] {
            let nearby = gamma_log_likelihood([best[0] + da, best[1] + db], &times);
            assert!(nearby <= fit.log_likelihood, "({da}, {db})");
        }
    }

    #[test]
    fn test_empty_sample_fails_to_converge() {
        let err = fit_gamma_mle(&[]).unwrap_err();
        assert_eq!(err.method, "BFGS");
        assert_eq!(err.iterations, 0);
        assert!(err.message.contains("initial point"), "{err}");

        let err = fit_double_exponential_mle(&[]).unwrap_err();
        assert_eq!(err.method, "Powell");
        assert!(err.message.contains("initial point"), "{err}");
    }

    #[test]
    fn test_iteration_limit_surfaces_as_error() {
        let mut sampler = Sampler::seed_from_u64(1);
        let times = draw_gamma(&mut sampler, GammaParams { alpha: 4.0, beta: 0.02 }, 200).unwrap();
        let estimator = Estimator::new(EstimatorConfig {
            bfgs: BfgsOptions {
                max_iterations: 1,
                ..BfgsOptions::default()
            },
            ..EstimatorConfig::default()
        });
        let err = estimator.fit_gamma(&times).unwrap_err();
        assert!(err.to_string().contains("maximum number of iterations"));
    }

    #[test]
    fn test_double_exponential_recovers_separated_rates() {
        let truth = DoubleExponentialParams {
            beta1: 0.005,
            beta2: 0.05,
        };
        let mut sampler = Sampler::seed_from_u64(77);
        let times = draw_double_exponential(&mut sampler, truth, 10_000).unwrap();

        let fit = fit_double_exponential_mle(&times).unwrap();
        let slow = fit.params.beta1.min(fit.params.beta2);
        let fast = fit.params.beta1.max(fit.params.beta2);
        assert!(relative_error(slow, truth.beta1) < 0.1, "{fit:?}");
        assert!(relative_error(fast, truth.beta2) < 0.25, "{fit:?}");

        let at_truth = double_exponential_log_likelihood(
            DoubleExponentialModel::to_log_params(truth),
            &times,
        );
        assert!(fit.log_likelihood >= at_truth - 1e-6);
    }

    #[test]
    fn test_double_exponential_fit_of_erlang_data_matches_erlang_likelihood() {
        let beta = 0.01;
        let mut sampler = Sampler::seed_from_u64(31);
        let times = draw_gamma(&mut sampler, GammaParams { alpha: 2.0, beta }, 2000).unwrap();

        // Erlang-2 MLE of the rate has the closed form 2 / mean.
        let erlang_rate = 2.0 / microcat_stats::descriptive::mean(&times);
        let erlang_ll = gamma_log_likelihood([2.0_f64.ln(), erlang_rate.ln()], &times);
        let collapsed_ll = double_exponential_log_likelihood(
            [erlang_rate.ln(), erlang_rate.ln()],
            &times,
        );
        assert_eq!(collapsed_ll, erlang_ll);

        let fit = fit_double_exponential_mle(&times).unwrap();
        // The collapsed model is in the family, and one extra rate parameter
        // cannot buy much on Erlang data.
        assert!(fit.log_likelihood >= erlang_ll - 1e-3, "{fit:?} vs {erlang_ll}");
        assert!(fit.log_likelihood <= erlang_ll + 0.1, "{fit:?} vs {erlang_ll}");
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: EstimatorConfig = serde_json::from_str(
            r#"{"gamma_initial": {"alpha": 3.0, "beta": 0.01}, "powell": {"max_iterations": 50}}"#,
        )
        .unwrap();
        assert_eq!(config.gamma_initial.alpha, 3.0);
        assert_eq!(config.powell.max_iterations, 50);
        assert_eq!(config.powell.line_tolerance, PowellOptions::default().line_tolerance);
        assert_eq!(config.bfgs, BfgsOptions::default());
        assert_eq!(
            config.double_exponential_initial,
            EstimatorConfig::default().double_exponential_initial
        );
    }

    #[test]
    fn test_fit_result_serializes() {
        let fit = FitResult {
            params: GammaParams {
                alpha: 2.0,
                beta: 0.5,
            },
            log_likelihood: -10.0,
            iterations: 3,
            evaluations: 20,
            message: "done",
        };
        let json = serde_json::to_value(&fit).unwrap();
        assert_eq!(json["params"]["alpha"], 2.0);
        assert_eq!(json["message"], "done");
    }
}
