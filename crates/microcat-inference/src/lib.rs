//! Statistical inference on microtubule catastrophe times.
//!
//! This crate answers two questions about measured times to catastrophe:
//! how uncertain are summary statistics of the data, and which generative
//! model explains the data better. It does so with resampling (bootstrap
//! and permutation replicates) and with maximum-likelihood fits of two
//! competing models:
//!
//! - **Gamma**: catastrophe times are i.i.d. `Gamma(α, β)`.
//! - **Double exponential**: a catastrophe needs two sequential Poisson
//!   processes with rates `β1` and `β2` to fire, so each time is the sum of
//!   an `Exp(β1)` and an `Exp(β2)` wait.
//!
//! # How an Analysis Flows
//!
//! ```text
//! Sampler (seeded PCG generator)
//!     ↓ resamples
//! Replicates ─────────→ plain statistic (mean, diff_of_means_scaled, ...)
//!     ↓ or
//! Estimator ──→ Optimizer (BFGS / Powell) ──→ Likelihood models
//!     ↓ produce
//! replicate sets / fitted parameters
//!     ↓ summarized as
//! ErrorBarSummary, Curve (for an external plotting layer)
//! ```
//!
//! # Modules
//!
//! - [`sampler`]: Owned, seedable random source for resampling
//! - [`replicates`]: Bootstrap, permutation and bootstrap-MLE replicate loops
//! - [`likelihood`]: Log-likelihoods, densities and CDFs of both models
//! - [`optimize`]: BFGS and Powell minimizers with scoped handling of
//!   non-finite trial values
//! - [`estimator`]: Maximum-likelihood fits
//! - [`simulate`]: Synthetic data from both models and simulated ECDF curves
//! - [`summary`]: Serializable plot-ready records
//!
//! # Example
//!
//! ```
//! use microcat_inference::{
//!     estimator, likelihood::GammaParams, replicates, sampler::Sampler, simulate,
//!     summary::ErrorBarSummary,
//! };
//! use microcat_stats::descriptive::mean;
//!
//! let mut sampler = Sampler::seed_from_u64(2019);
//! let times = simulate::draw_gamma(&mut sampler, GammaParams { alpha: 3.0, beta: 0.008 }, 300)?;
//!
//! // Bootstrap confidence interval of the mean catastrophe time.
//! let reps = replicates::bootstrap_mean_replicates(&mut sampler, &times, 500);
//! let summary = ErrorBarSummary::from_replicates("tubulin 12 uM", mean(&times), &reps, 0.95).unwrap();
//! assert!(summary.interval.contains(summary.mean));
//!
//! // Compare both models by their maximized log-likelihoods.
//! let gamma = estimator::fit_gamma_mle(&times)?;
//! let double = estimator::fit_double_exponential_mle(&times)?;
//! assert!(gamma.log_likelihood.is_finite() && double.log_likelihood.is_finite());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod estimator;
pub mod likelihood;
pub mod optimize;
pub mod replicates;
pub mod sampler;
pub mod simulate;
pub mod summary;

pub use self::{
    estimator::{FitResult, fit_double_exponential_mle, fit_gamma_mle},
    optimize::ConvergenceError,
    replicates::ReplicateError,
    simulate::SimulationError,
};
