//! Plot-ready records for downstream visualization.
//!
//! Nothing in this crate draws figures. Instead, analyses end in these
//! small serializable records, which a plotting layer can consume directly
//! or after a round-trip through JSON.

use microcat_stats::percentiles::ConfidenceInterval;
use serde::Serialize;

/// A point estimate with a confidence interval, one error bar in a plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBarSummary {
    /// Label of the quantity, e.g. the experimental condition.
    pub name: String,
    /// Point estimate computed from the original data.
    pub mean: f64,
    /// Percentile interval of the replicates.
    pub interval: ConfidenceInterval,
}

impl ErrorBarSummary {
    /// Pairs the point estimate with the percentile interval of its
    /// replicates.
    ///
    /// Returns `None` if `replicates` is empty.
    ///
    /// # Panics
    ///
    /// Panics if `level` is not strictly between 0 and 1.
    ///
    /// ```
    /// use microcat_inference::summary::ErrorBarSummary;
    ///
    /// let reps: Vec<f64> = (0..=100).map(|i| 400.0 + f64::from(i)).collect();
    /// let summary = ErrorBarSummary::from_replicates("labeled", 450.0, &reps, 0.95).unwrap();
    /// assert_eq!(summary.name, "labeled");
    /// assert!(summary.interval.contains(summary.mean));
    /// ```
    #[must_use]
    pub fn from_replicates(
        name: impl Into<String>,
        data_mean: f64,
        replicates: &[f64],
        level: f64,
    ) -> Option<Self> {
        let interval = ConfidenceInterval::from_replicates(replicates, level)?;
        Some(Self {
            name: name.into(),
            mean: data_mean,
            interval,
        })
    }
}

/// A labeled sequence of `(x, y)` points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curve {
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Curve {
    /// # Panics
    ///
    /// Panics if `x` and `y` differ in length.
    #[must_use]
    pub fn new(label: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Self {
        assert_eq!(x.len(), y.len(), "curve coordinates must pair up");
        Self {
            label: label.into(),
            x,
            y,
        }
    }

    /// Iterates over the `(x, y)` points.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_bar_of_empty_replicates_is_none() {
        assert!(ErrorBarSummary::from_replicates("x", 1.0, &[], 0.95).is_none());
    }

    #[test]
    fn test_error_bar_of_nan_replicates_is_kept() {
        let summary = ErrorBarSummary::from_replicates("x", 1.0, &[1.0, f64::NAN, 2.0], 0.95).unwrap();
        assert_eq!(summary.mean, 1.0);
        assert!((summary.interval.lower - 1.05).abs() < 1e-12);
        assert!(summary.interval.upper.is_nan());
    }

    #[test]
    #[should_panic(expected = "confidence level")]
    fn test_error_bar_rejects_bad_level() {
        let _ = ErrorBarSummary::from_replicates("x", 1.0, &[1.0, 2.0], 1.5);
    }

    #[test]
    fn test_error_bar_serializes_for_plotting() {
        let reps = [1.0, 2.0, 3.0, 4.0, 5.0];
        let summary = ErrorBarSummary::from_replicates("unlabeled", 3.0, &reps, 0.5).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["name"], "unlabeled");
        assert_eq!(json["mean"], 3.0);
        assert_eq!(json["interval"]["lower"], 2.0);
        assert_eq!(json["interval"]["upper"], 4.0);
        assert_eq!(json["interval"]["level"], 0.5);
    }

    #[test]
    fn test_curve_points_pair_coordinates() {
        let curve = Curve::new("cdf", vec![0.0, 1.0], vec![0.0, 0.5]);
        assert_eq!(curve.points().collect::<Vec<_>>(), vec![(0.0, 0.0), (1.0, 0.5)]);
        let json = serde_json::to_string(&curve).unwrap();
        assert_eq!(json, r#"{"label":"cdf","x":[0.0,1.0],"y":[0.0,0.5]}"#);
    }

    #[test]
    #[should_panic(expected = "pair up")]
    fn test_curve_rejects_mismatched_lengths() {
        let _ = Curve::new("bad", vec![0.0], vec![]);
    }
}
