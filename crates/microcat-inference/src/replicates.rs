//! Bootstrap and permutation replicate sets.
//!
//! Every function here draws from a caller-owned [`Sampler`], so the same
//! seed and call order reproduce the same replicates. Replicates are
//! returned in draw order.
//!
//! # Example
//!
//! ```
//! use microcat_inference::{replicates, sampler::Sampler};
//! use microcat_stats::percentiles::ConfidenceInterval;
//!
//! let labeled = [310.0, 455.0, 120.0, 980.0, 640.0, 275.0];
//! let unlabeled = [290.0, 515.0, 180.0, 760.0, 405.0];
//! let mut sampler = Sampler::seed_from_u64(29);
//!
//! let means = replicates::bootstrap_mean_replicates(&mut sampler, &labeled, 1000);
//! let ci = ConfidenceInterval::from_replicates(&means, 0.95).unwrap();
//! assert!(ci.lower < ci.upper);
//!
//! let observed = replicates::diff_of_means_scaled(&labeled, &unlabeled);
//! let perm = replicates::permutation_replicates(
//!     &mut sampler,
//!     &labeled,
//!     &unlabeled,
//!     replicates::diff_of_means_scaled,
//!     1000,
//! );
//! let p = replicates::permutation_p_value(observed, &perm);
//! assert!((0.0..=1.0).contains(&p));
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use microcat_stats::descriptive::{mean, std_dev};

use crate::{optimize::ConvergenceError, sampler::Sampler};

/// A bootstrap maximum-likelihood fit failed.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("bootstrap replicate {index} failed: {source}")]
pub struct ReplicateError {
    /// Zero-based position of the failing replicate.
    pub index: usize,
    pub source: ConvergenceError,
}

/// Applies `statistic` to `count` bootstrap resamples of `data`.
pub fn bootstrap_replicates<F>(
    sampler: &mut Sampler,
    data: &[f64],
    mut statistic: F,
    count: usize,
) -> Vec<f64>
where
    F: FnMut(&[f64]) -> f64,
{
    (0..count)
        .map(|_| statistic(&sampler.bootstrap_sample(data)))
        .collect()
}

/// Bootstrap replicates of the sample mean.
pub fn bootstrap_mean_replicates(sampler: &mut Sampler, data: &[f64], count: usize) -> Vec<f64> {
    bootstrap_replicates(sampler, data, mean, count)
}

/// Applies `statistic` to `count` label permutations of `x` and `y`.
///
/// Each permutation pools the two samples, shuffles the pool and splits it
/// back into groups of the original sizes.
pub fn permutation_replicates<F>(
    sampler: &mut Sampler,
    x: &[f64],
    y: &[f64],
    mut statistic: F,
    count: usize,
) -> Vec<f64>
where
    F: FnMut(&[f64], &[f64]) -> f64,
{
    (0..count)
        .map(|_| {
            let (x_perm, y_perm) = sampler.permutation_split(x, y);
            statistic(&x_perm, &y_perm)
        })
        .collect()
}

/// Fits each of `count` bootstrap resamples of `data` with `mle_fit`.
///
/// Stops at the first failed fit and reports its index. With `progress`
/// set, a progress bar is drawn on stderr; the results do not depend on it.
///
/// ```
/// use microcat_inference::{estimator, replicates, sampler::Sampler};
///
/// let times = [120.0, 250.0, 340.0, 410.0, 505.0, 620.0, 780.0, 900.0, 1150.0, 1400.0];
/// let mut sampler = Sampler::seed_from_u64(3);
/// let fits = replicates::bootstrap_mle_replicates(
///     &mut sampler,
///     |sample| estimator::fit_gamma_mle(sample).map(|fit| fit.params),
///     &times,
///     5,
///     false,
/// )
/// .unwrap();
/// assert_eq!(fits.len(), 5);
/// ```
pub fn bootstrap_mle_replicates<P, F>(
    sampler: &mut Sampler,
    mut mle_fit: F,
    data: &[f64],
    count: usize,
    progress: bool,
) -> Result<Vec<P>, ReplicateError>
where
    F: FnMut(&[f64]) -> Result<P, ConvergenceError>,
{
    let progress_bar = if progress {
        let bar = ProgressBar::new(count as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) | {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        bar.set_message("bootstrap fits");
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut replicates = Vec::with_capacity(count);
    for index in 0..count {
        let sample = sampler.bootstrap_sample(data);
        match mle_fit(&sample) {
            Ok(params) => replicates.push(params),
            Err(source) => {
                progress_bar.abandon_with_message(format!("replicate {index} failed"));
                tracing::warn!(index, %source, "bootstrap fit failed");
                return Err(ReplicateError { index, source });
            }
        }
        progress_bar.inc(1);
    }
    progress_bar.finish_with_message("done");
    tracing::debug!(count, "bootstrap fits complete");
    Ok(replicates)
}

/// Squared difference of means scaled by the difference of the population
/// standard deviations:
///
/// ```text
/// (mean(x) − mean(y))² / (std(x) − std(y))
/// ```
///
/// The denominator is signed and vanishes when the samples have equal
/// spread. The result is then `±inf`, or `NaN` if the means also agree, and
/// is returned as is.
///
/// ```
/// use microcat_inference::replicates::diff_of_means_scaled;
///
/// let x = [1.0, 2.0, 3.0];
/// assert!(diff_of_means_scaled(&x, &[11.0, 12.0, 13.0]).is_infinite());
/// assert!(diff_of_means_scaled(&x, &x).is_nan());
/// ```
#[must_use]
pub fn diff_of_means_scaled(x: &[f64], y: &[f64]) -> f64 {
    (mean(x) - mean(y)).powi(2) / (std_dev(x) - std_dev(y))
}

/// Fraction of `replicates` at least as large as `observed`.
///
/// `NaN` replicates never count. Returns `NaN` for an empty replicate set.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn permutation_p_value(observed: f64, replicates: &[f64]) -> f64 {
    let extreme = replicates.iter().filter(|&&r| r >= observed).count();
    extreme as f64 / replicates.len() as f64
}
