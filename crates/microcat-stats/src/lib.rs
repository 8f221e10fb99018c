//! Sample statistics for catastrophe-time analysis.
//!
//! This crate holds the deterministic building blocks that the inference
//! crate and external plotting code consume:
//!
//! - **Descriptive statistics**: mean and population standard deviation
//! - **Percentiles**: interpolated percentiles and percentile confidence intervals
//! - **Empirical CDF**: right-continuous ECDF evaluation at arbitrary query points
//!
//! # Modules
//!
//! - [`descriptive`]: Mean and spread of a sample
//! - [`percentiles`]: Percentile computation and confidence intervals of replicate sets
//! - [`ecdf`]: Empirical cumulative distribution functions
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use microcat_stats::descriptive::{mean, std_dev};
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! assert_eq!(mean(&values), 3.0);
//! assert!((std_dev(&values) - 2.0_f64.sqrt()).abs() < 1e-12);
//! ```
//!
//! ## Confidence interval of replicates
//!
//! ```
//! use microcat_stats::percentiles::ConfidenceInterval;
//!
//! let replicates = [9.8, 10.1, 10.0, 9.9, 10.2, 10.0, 9.7, 10.3];
//! let ci = ConfidenceInterval::from_replicates(&replicates, 0.95).unwrap();
//! assert!(ci.contains(10.0));
//! ```
//!
//! ## Evaluating an ECDF
//!
//! ```
//! use microcat_stats::ecdf::ecdf_at;
//!
//! let times = [120.0, 340.0, 340.0, 505.0];
//! assert_eq!(ecdf_at(&[340.0], &times), vec![0.75]);
//! ```

pub mod descriptive;
pub mod ecdf;
pub mod percentiles;
