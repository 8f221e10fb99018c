//! Empirical cumulative distribution function.
//!
//! The ECDF of a sample `d` of size `n` is the right-continuous step function
//!
//! ```text
//! F_n(x) = #{ d_i <= x } / n
//! ```
//!
//! It is 0 strictly below the smallest observation, jumps by `k / n` at a
//! value observed `k` times, and is 1 at and above the largest observation.
//!
//! # Examples
//!
//! ```
//! use microcat_stats::ecdf::{Ecdf, ecdf_at};
//!
//! let data = [1.0, 2.0, 2.0, 3.0];
//! assert_eq!(ecdf_at(&[0.5, 2.0, 3.0], &data), vec![0.0, 0.75, 1.0]);
//!
//! let ecdf = Ecdf::new(&data);
//! assert_eq!(ecdf.steps(), vec![(1.0, 0.25), (2.0, 0.75), (3.0, 1.0)]);
//! ```

/// ECDF of a reference sample, kept in sorted order for repeated queries.
#[derive(Debug, Clone)]
pub struct Ecdf {
    sorted: Vec<f64>,
}

impl Ecdf {
    /// Builds the ECDF of `data`.
    ///
    /// The data are copied and sorted with [`f64::total_cmp`], so `NaN`
    /// values sort above every number and never count as `<= x` for a
    /// finite query.
    #[must_use]
    pub fn new(data: &[f64]) -> Self {
        let mut sorted = data.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self { sorted }
    }

    /// Number of observations in the reference sample.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    /// Returns `true` if the reference sample is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Evaluates the ECDF at `x`.
    ///
    /// Returns `NaN` for an empty reference sample.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn eval(&self, x: f64) -> f64 {
        let count = self.sorted.partition_point(|&v| v <= x);
        count as f64 / self.sorted.len() as f64
    }

    /// Evaluates the ECDF at every query point, preserving query order.
    #[must_use]
    pub fn eval_many(&self, query: &[f64]) -> Vec<f64> {
        query.iter().map(|&x| self.eval(x)).collect()
    }

    /// Returns the jump points of the step function.
    ///
    /// Each pair is a distinct observed value and the ECDF at that value.
    #[expect(clippy::cast_precision_loss, clippy::float_cmp)]
    #[must_use]
    pub fn steps(&self) -> Vec<(f64, f64)> {
        let n = self.sorted.len() as f64;
        let mut steps: Vec<(f64, f64)> = Vec::new();
        for (i, &value) in self.sorted.iter().enumerate() {
            let height = (i + 1) as f64 / n;
            match steps.last_mut() {
                Some(last) if last.0 == value => last.1 = height,
                _ => steps.push((value, height)),
            }
        }
        steps
    }

    /// Returns one point per observation: the sorted value and `i / n`
    /// for `i = 1..=n`.
    ///
    /// This is the dot-style rendering of an ECDF, where tied values appear
    /// as a vertical run of points.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn curve_points(&self) -> (Vec<f64>, Vec<f64>) {
        let n = self.sorted.len() as f64;
        let y = (1..=self.sorted.len()).map(|i| i as f64 / n).collect();
        (self.sorted.clone(), y)
    }
}

/// Evaluates the ECDF of `data` at each of `query`.
///
/// Convenience wrapper around [`Ecdf::new`] and [`Ecdf::eval_many`].
#[must_use]
pub fn ecdf_at(query: &[f64], data: &[f64]) -> Vec<f64> {
    Ecdf::new(data).eval_many(query)
}
