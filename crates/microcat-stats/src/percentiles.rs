//! Percentiles and percentile confidence intervals.

/// Computes a single percentile value from sorted data.
///
/// Uses linear interpolation between closest ranks: the k-th percentile
/// of n values sits at fractional position `(n - 1) * k / 100`.
///
/// Returns `f64::NAN` if the input is empty.
///
/// # Examples
///
/// ```
/// use microcat_stats::percentiles::compute_percentile;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0];
/// assert_eq!(compute_percentile(&values, 50.0), 2.5);
/// assert_eq!(compute_percentile(&values, 0.0), 1.0);
/// assert_eq!(compute_percentile(&values, 100.0), 4.0);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn compute_percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }
    let last = sorted_values.len() - 1;
    let pos = (last as f64 * percentile.clamp(0.0, 100.0) / 100.0).max(0.0);
    let lo = (pos.floor() as usize).min(last);
    let hi = (lo + 1).min(last);
    let frac = pos - lo as f64;
    sorted_values[lo] + (sorted_values[hi] - sorted_values[lo]) * frac
}

/// A two-sided percentile confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ConfidenceInterval {
    /// Lower bound (the `(1 - level) / 2` percentile).
    pub lower: f64,
    /// Upper bound (the `(1 + level) / 2` percentile).
    pub upper: f64,
    /// Confidence level in `(0, 1)`, e.g. `0.95`.
    pub level: f64,
}

impl ConfidenceInterval {
    /// Computes the percentile confidence interval of a set of replicates.
    ///
    /// Replicates are ordered with [`f64::total_cmp`], so `NaN` sorts above
    /// `+inf` and a bound whose interpolation touches a `NaN` replicate is
    /// itself `NaN`. Returns `None` if `replicates` is empty.
    ///
    /// # Panics
    ///
    /// Panics if `level` is not strictly between 0 and 1.
    ///
    /// ```
    /// use microcat_stats::percentiles::ConfidenceInterval;
    ///
    /// let reps: Vec<f64> = (0..=100).map(f64::from).collect();
    /// let ci = ConfidenceInterval::from_replicates(&reps, 0.95).unwrap();
    /// assert!((ci.lower - 2.5).abs() < 1e-9);
    /// assert!((ci.upper - 97.5).abs() < 1e-9);
    /// ```
    #[must_use]
    pub fn from_replicates(replicates: &[f64], level: f64) -> Option<Self> {
        assert!(
            level > 0.0 && level < 1.0,
            "confidence level must be in (0, 1), got {level}"
        );
        if replicates.is_empty() {
            return None;
        }
        let mut sorted = replicates.to_vec();
        sorted.sort_by(f64::total_cmp);
        let tail = (1.0 - level) / 2.0 * 100.0;
        Some(Self {
            lower: compute_percentile(&sorted, tail),
            upper: compute_percentile(&sorted, 100.0 - tail),
            level,
        })
    }

    /// Returns `true` if `value` lies within the closed interval.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    /// Width of the interval.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}
