//! Synthetic catastrophe times from the two generative models.
//!
//! Draws use the [`Sampler`]'s generator, so a seeded sampler reproduces the
//! same synthetic data set.

use microcat_stats::ecdf::Ecdf;
use rand_distr::{Distribution as _, Exp, ExpError, Gamma, GammaError};

use crate::{
    likelihood::{DoubleExponentialParams, GammaParams},
    sampler::Sampler,
    summary::Curve,
};

/// Model parameters that `rand_distr` refuses to sample from.
#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error)]
pub enum SimulationError {
    #[display("invalid gamma parameters: {_0}")]
    Gamma(GammaError),
    #[display("invalid exponential rate: {_0}")]
    Exponential(ExpError),
}

/// Draws `size` times from `Gamma(α, β)` (shape, rate).
///
/// ```
/// use microcat_inference::{likelihood::GammaParams, sampler::Sampler, simulate::draw_gamma};
///
/// let mut sampler = Sampler::seed_from_u64(1);
/// let times = draw_gamma(&mut sampler, GammaParams { alpha: 2.5, beta: 0.005 }, 100).unwrap();
/// assert_eq!(times.len(), 100);
/// assert!(times.iter().all(|&t| t > 0.0));
/// ```
pub fn draw_gamma(
    sampler: &mut Sampler,
    params: GammaParams,
    size: usize,
) -> Result<Vec<f64>, SimulationError> {
    let gamma = Gamma::new(params.alpha, 1.0 / params.beta).map_err(SimulationError::Gamma)?;
    Ok(gamma.sample_iter(sampler.rng_mut()).take(size).collect())
}

/// Draws `size` times as the sum of an `Exp(β1)` and an `Exp(β2)` wait.
pub fn draw_double_exponential(
    sampler: &mut Sampler,
    params: DoubleExponentialParams,
    size: usize,
) -> Result<Vec<f64>, SimulationError> {
    let first = Exp::new(params.beta1).map_err(SimulationError::Exponential)?;
    let second = Exp::new(params.beta2).map_err(SimulationError::Exponential)?;
    let rng = sampler.rng_mut();
    Ok((0..size)
        .map(|_| first.sample(rng) + second.sample(rng))
        .collect())
}

/// Settings for [`double_exponential_ecdf_curves`].
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct DoubleExponentialEcdfConfig {
    /// Rate of the first process.
    pub beta1: f64,
    /// Values of `β2 / β1` to simulate, one curve each.
    pub ratios: Vec<f64>,
    /// Number of simulated catastrophe times per curve.
    pub n_trials: usize,
    /// Times at which each ECDF is evaluated.
    pub time_grid: Vec<f64>,
}

impl Default for DoubleExponentialEcdfConfig {
    fn default() -> Self {
        Self {
            beta1: 1.0,
            ratios: vec![0.1, 0.3, 1.0, 3.0, 10.0],
            n_trials: 150,
            time_grid: (0..=400).map(|i| f64::from(i) * 0.05).collect(),
        }
    }
}

/// Simulates the double-exponential model for each rate ratio and returns
/// the ECDF of every simulated set on the configured time grid.
///
/// Curves come back in the order of [`DoubleExponentialEcdfConfig::ratios`],
/// labeled `β2/β1 = <ratio>`.
pub fn double_exponential_ecdf_curves(
    sampler: &mut Sampler,
    config: &DoubleExponentialEcdfConfig,
) -> Result<Vec<Curve>, SimulationError> {
    config
        .ratios
        .iter()
        .map(|&ratio| {
            let params = DoubleExponentialParams {
                beta1: config.beta1,
                beta2: ratio * config.beta1,
            };
            let times = draw_double_exponential(sampler, params, config.n_trials)?;
            tracing::trace!(ratio, n_trials = config.n_trials, "simulated ECDF");
            let ecdf = Ecdf::new(&times);
            Ok(Curve::new(
                format!("β2/β1 = {ratio}"),
                config.time_grid.clone(),
                ecdf.eval_many(&config.time_grid),
            ))
        })
        .collect()
}

/// Evaluates a model CDF on `time_grid`.
///
/// ```
/// use microcat_inference::{likelihood::GammaParams, simulate::theoretical_cdf_curve};
///
/// let params = GammaParams { alpha: 1.0, beta: 1.0 };
/// let curve = theoretical_cdf_curve(|t| params.cdf(t), &[0.0, 1.0], "gamma");
/// assert_eq!(curve.y[0], 0.0);
/// assert!((curve.y[1] - (1.0 - (-1.0_f64).exp())).abs() < 1e-12);
/// ```
#[must_use]
pub fn theoretical_cdf_curve<F>(cdf: F, time_grid: &[f64], label: impl Into<String>) -> Curve
where
    F: Fn(f64) -> f64,
{
    let y = time_grid.iter().map(|&t| cdf(t)).collect();
    Curve::new(label, time_grid.to_vec(), y)
}

#[cfg(test)]
mod tests {
    use microcat_stats::descriptive::mean;

    use super::*;

    #[test]
    fn test_gamma_draws_have_model_mean() {
        let params = GammaParams {
            alpha: 3.0,
            beta: 0.01,
        };
        let mut sampler = Sampler::seed_from_u64(17);
        let times = draw_gamma(&mut sampler, params, 20_000).unwrap();
        // standard error of the mean is sqrt(α)/β/sqrt(n) ≈ 1.2
        assert!((mean(&times) - params.mean()).abs() < 6.0);
    }

    #[test]
    fn test_double_exponential_draws_have_model_mean() {
        let params = DoubleExponentialParams {
            beta1: 0.004,
            beta2: 0.01,
        };
        let mut sampler = Sampler::seed_from_u64(23);
        let times = draw_double_exponential(&mut sampler, params, 20_000).unwrap();
        // mean 350, standard deviation ≈ 269, standard error ≈ 1.9
        assert!((mean(&times) - params.mean()).abs() < 10.0);
    }

    #[test]
    fn test_invalid_parameters_are_errors() {
        let mut sampler = Sampler::seed_from_u64(0);
        let err = draw_gamma(&mut sampler, GammaParams { alpha: -1.0, beta: 1.0 }, 3).unwrap_err();
        assert!(matches!(err, SimulationError::Gamma(_)));
        assert!(err.to_string().starts_with("invalid gamma parameters"));

        let params = DoubleExponentialParams {
            beta1: 1.0,
            beta2: -2.0,
        };
        let err = draw_double_exponential(&mut sampler, params, 3).unwrap_err();
        assert!(matches!(err, SimulationError::Exponential(_)));
    }

    #[test]
    fn test_seeded_draws_are_reproducible() {
        let params = DoubleExponentialParams {
            beta1: 1.0,
            beta2: 2.0,
        };
        let a = draw_double_exponential(&mut Sampler::seed_from_u64(8), params, 50).unwrap();
        let b = draw_double_exponential(&mut Sampler::seed_from_u64(8), params, 50).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_simulated_ecdf_tracks_closed_form_cdf() {
        let config = DoubleExponentialEcdfConfig {
            beta1: 1.0,
            ratios: vec![0.5, 1.0, 4.0],
            n_trials: 20_000,
            time_grid: vec![0.5, 1.0, 2.0, 4.0, 8.0],
        };
        let mut sampler = Sampler::seed_from_u64(99);
        let curves = double_exponential_ecdf_curves(&mut sampler, &config).unwrap();
        assert_eq!(curves.len(), 3);
        for (curve, &ratio) in curves.iter().zip(&config.ratios) {
            assert_eq!(curve.label, format!("β2/β1 = {ratio}"));
            assert_eq!(curve.x, config.time_grid);
            let params = DoubleExponentialParams {
                beta1: 1.0,
                beta2: ratio,
            };
            for (t, ecdf) in curve.points() {
                // Dvoretzky–Kiefer–Wolfowitz: deviation > 0.02 has probability < 1e-6
                assert!((ecdf - params.cdf(t)).abs() < 0.02, "ratio {ratio}, t {t}");
            }
        }
    }

    #[test]
    fn test_default_config_deserializes_from_partial_json() {
        let config: DoubleExponentialEcdfConfig =
            serde_json::from_str(r#"{"beta1": 0.5, "n_trials": 10}"#).unwrap();
        assert_eq!(config.beta1, 0.5);
        assert_eq!(config.n_trials, 10);
        assert_eq!(config.ratios, DoubleExponentialEcdfConfig::default().ratios);

        let mut sampler = Sampler::seed_from_u64(4);
        let curves = double_exponential_ecdf_curves(&mut sampler, &config).unwrap();
        assert_eq!(curves.len(), config.ratios.len());
        for curve in &curves {
            assert_eq!(curve.y.len(), config.time_grid.len());
            assert!(curve.y.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_theoretical_curve_matches_cdf() {
        let params = DoubleExponentialParams {
            beta1: 0.01,
            beta2: 0.02,
        };
        let grid = [0.0, 100.0, 1000.0];
        let curve = theoretical_cdf_curve(|t| params.cdf(t), &grid, "model");
        assert_eq!(curve.label, "model");
        assert_eq!(curve.y, grid.iter().map(|&t| params.cdf(t)).collect::<Vec<_>>());
    }
}
