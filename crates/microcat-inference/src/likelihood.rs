//! Log-likelihoods of the two catastrophe-time models.
//!
//! # Gamma model
//!
//! Catastrophe times are i.i.d. `Gamma(α, β)` with shape `α` and rate `β`:
//!
//! ```text
//! ln f(t) = α ln β + (α − 1) ln t − β t − ln Γ(α)
//! ```
//!
//! # Double-exponential (two-step race) model
//!
//! A catastrophe happens after two sequential Poisson processes with rates
//! `β1` and `β2` have each fired, so `t = t1 + t2` with `t1 ~ Exp(β1)` and
//! `t2 ~ Exp(β2)`. For `β1 ≠ β2`:
//!
//! ```text
//! f(t) = β1 β2 / (β2 − β1) · (e^{−β1 t} − e^{−β2 t})
//! F(t) = β1 β2 / (β2 − β1) · [ (1 − e^{−β1 t}) / β1 − (1 − e^{−β2 t}) / β2 ]
//! ```
//!
//! Both expressions are `0 / 0` at `β1 = β2`, where the distribution is
//! `Gamma(2, β1)` (Erlang-2). Rates that agree to a relative tolerance of
//! [`RATE_COLLAPSE_TOLERANCE`] are routed to that closed form before any
//! division happens.
//!
//! Away from the singularity, with `m = max(β1, β2)` and `x = min(β1, β2)`,
//! the log-density is evaluated as
//!
//! ```text
//! ln f(t) = ln β1 + ln β2 − ln(m − x) + ln(e^{−x t} − e^{−m t})
//! ln(m − x)                 = ln m + ln(1 − x / m)             (log_diff)
//! ln(e^{−x t} − e^{−m t})   = −x t + ln(1 − e^{(x − m) t})     (log_diff_exp)
//! ```
//!
//! which never forms the small differences `m − x` or
//! `e^{−x t} − e^{−m t}` directly.
//!
//! All log-likelihoods take their parameters in log-space (`[ln a, ln b]`),
//! the representation the optimizers work in.

use std::fmt;

/// Relative difference below which `β1` and `β2` are treated as equal.
pub const RATE_COLLAPSE_TOLERANCE: f64 = 1e-8;

/// Parameters of the Gamma model.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GammaParams {
    /// Shape parameter `α > 0`.
    pub alpha: f64,
    /// Rate parameter `β > 0` (inverse scale).
    pub beta: f64,
}

impl GammaParams {
    /// Log-density at `t`.
    #[must_use]
    pub fn log_pdf(&self, t: f64) -> f64 {
        gamma_log_pdf(t, self.alpha, self.beta)
    }

    /// Cumulative distribution function at `t`.
    #[must_use]
    pub fn cdf(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        regularized_lower_gamma(self.alpha, self.beta * t)
    }

    /// Mean `α / β`.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.alpha / self.beta
    }
}

/// Parameters of the double-exponential race model.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DoubleExponentialParams {
    /// Rate of the first Poisson process, `β1 > 0`.
    pub beta1: f64,
    /// Rate of the second Poisson process, `β2 > 0`.
    pub beta2: f64,
}

impl DoubleExponentialParams {
    /// Returns `true` if the two rates are close enough that the model is
    /// evaluated as `Gamma(2, β1)`.
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        rates_coincide(self.beta1, self.beta2)
    }

    /// Log-density at `t`.
    #[must_use]
    pub fn log_pdf(&self, t: f64) -> f64 {
        let Self { beta1, beta2 } = *self;
        if self.is_collapsed() {
            return gamma_log_pdf(t, 2.0, beta1);
        }
        if t < 0.0 {
            return f64::NEG_INFINITY;
        }
        let betas = [beta1, beta2];
        beta1.ln() + beta2.ln() - log_diff(betas) + log_diff_exp(betas, t)
    }

    /// Cumulative distribution function at `t`.
    ///
    /// Evaluated through the survival function
    /// `S(t) = e^{−x t} · (1 + x (1 − e^{−(m − x) t}) / (m − x))`, which is
    /// algebraically the closed form in the module docs but stays accurate
    /// as the rates approach each other.
    ///
    /// ```
    /// use microcat_inference::likelihood::DoubleExponentialParams;
    ///
    /// let params = DoubleExponentialParams { beta1: 0.01, beta2: 0.02 };
    /// assert_eq!(params.cdf(0.0), 0.0);
    /// assert!((params.cdf(1e6) - 1.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn cdf(&self, t: f64) -> f64 {
        let Self { beta1, beta2 } = *self;
        if t <= 0.0 {
            return 0.0;
        }
        if self.is_collapsed() {
            // Erlang-2: 1 − e^{−βt}(1 + βt)
            let bt = beta1 * t;
            return -(-bt).exp_m1() - bt * (-bt).exp();
        }
        let (m, x) = max_min([beta1, beta2]);
        let d = m - x;
        let survival = (-x * t).exp() * (1.0 + x * -(-d * t).exp_m1() / d);
        (1.0 - survival).clamp(0.0, 1.0)
    }

    /// Mean `1 / β1 + 1 / β2`.
    #[must_use]
    pub fn mean(&self) -> f64 {
        1.0 / self.beta1 + 1.0 / self.beta2
    }
}

fn rates_coincide(beta1: f64, beta2: f64) -> bool {
    (beta1 - beta2).abs() <= RATE_COLLAPSE_TOLERANCE * beta1.max(beta2)
}

/// A two-parameter model whose log-likelihood can be maximized in log-space.
pub trait Model {
    /// Natural-scale parameters.
    type Params: Copy + fmt::Debug;

    /// Human-readable model name used in diagnostics.
    const NAME: &'static str;

    /// Log-likelihood of `data` at `exp(log_params)`.
    fn log_likelihood(log_params: [f64; 2], data: &[f64]) -> f64;

    /// Maps natural parameters to the log-space optimization vector.
    fn to_log_params(params: Self::Params) -> [f64; 2];

    /// Maps an optimization vector back to natural parameters.
    fn from_log_params(log_params: [f64; 2]) -> Self::Params;
}

/// The i.i.d. Gamma model.
#[derive(Debug, Clone, Copy, Default)]
pub struct GammaModel;

impl Model for GammaModel {
    type Params = GammaParams;
    const NAME: &'static str = "gamma";

    fn log_likelihood(log_params: [f64; 2], data: &[f64]) -> f64 {
        gamma_log_likelihood(log_params, data)
    }

    fn to_log_params(params: GammaParams) -> [f64; 2] {
        [params.alpha.ln(), params.beta.ln()]
    }

    fn from_log_params([log_alpha, log_beta]: [f64; 2]) -> GammaParams {
        GammaParams {
            alpha: log_alpha.exp(),
            beta: log_beta.exp(),
        }
    }
}

/// The double-exponential race model.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleExponentialModel;

impl Model for DoubleExponentialModel {
    type Params = DoubleExponentialParams;
    const NAME: &'static str = "double exponential";

    fn log_likelihood(log_params: [f64; 2], data: &[f64]) -> f64 {
        double_exponential_log_likelihood(log_params, data)
    }

    fn to_log_params(params: DoubleExponentialParams) -> [f64; 2] {
        [params.beta1.ln(), params.beta2.ln()]
    }

    fn from_log_params([log_beta1, log_beta2]: [f64; 2]) -> DoubleExponentialParams {
        DoubleExponentialParams {
            beta1: log_beta1.exp(),
            beta2: log_beta2.exp(),
        }
    }
}

/// Gamma CDF at `t`; shorthand for [`GammaParams::cdf`].
#[must_use]
pub fn gamma_cdf(t: f64, params: GammaParams) -> f64 {
    params.cdf(t)
}

/// Double-exponential CDF at `t`; shorthand for
/// [`DoubleExponentialParams::cdf`].
#[must_use]
pub fn double_exponential_cdf(t: f64, params: DoubleExponentialParams) -> f64 {
    params.cdf(t)
}

/// Gamma log-density with shape `alpha` and rate `beta`, location 0.
///
/// Returns `-inf` outside the support (`t < 0`). At `t = 0` the density is
/// `β` for `α = 1`, zero for `α > 1` and unbounded for `α < 1`.
#[expect(clippy::float_cmp)]
#[must_use]
pub fn gamma_log_pdf(t: f64, alpha: f64, beta: f64) -> f64 {
    if t < 0.0 {
        return f64::NEG_INFINITY;
    }
    let shape_term = if alpha == 1.0 {
        0.0
    } else {
        (alpha - 1.0) * t.ln()
    };
    alpha * beta.ln() + shape_term - beta * t - ln_gamma(alpha)
}

/// Log-likelihood of i.i.d. `data` under `Gamma(α, β)`.
///
/// `log_params` is `[ln α, ln β]`.
///
/// ```
/// use microcat_inference::likelihood::gamma_log_likelihood;
///
/// // Gamma(1, β) is Exp(β): ln L = n ln β − β Σt
/// let data = [1.0, 2.0, 3.0];
/// let ll = gamma_log_likelihood([0.0, 0.5_f64.ln()], &data);
/// assert!((ll - (3.0 * 0.5_f64.ln() - 0.5 * 6.0)).abs() < 1e-10);
/// ```
#[must_use]
pub fn gamma_log_likelihood(log_params: [f64; 2], data: &[f64]) -> f64 {
    let [alpha, beta] = log_params.map(f64::exp);
    data.iter().map(|&t| gamma_log_pdf(t, alpha, beta)).sum()
}

/// Log-likelihood of i.i.d. `data` under the double-exponential race model.
///
/// `log_params` is `[ln β1, ln β2]`. When the rates coincide (see
/// [`RATE_COLLAPSE_TOLERANCE`]) this is exactly the `Gamma(2, β1)`
/// log-likelihood.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn double_exponential_log_likelihood(log_params: [f64; 2], data: &[f64]) -> f64 {
    let [log_beta1, log_beta2] = log_params;
    let betas @ [beta1, beta2] = log_params.map(f64::exp);

    if rates_coincide(beta1, beta2) {
        return gamma_log_likelihood([2.0_f64.ln(), log_beta1], data);
    }

    let n = data.len() as f64;
    let per_point = data
        .iter()
        .map(|&t| {
            if t < 0.0 {
                f64::NEG_INFINITY
            } else {
                log_diff_exp(betas, t)
            }
        })
        .sum::<f64>();
    n * (log_beta1 + log_beta2 - log_diff(betas)) + per_point
}

/// Stable `ln(m − x)` for a pair of rates, where `m` is the larger and `x`
/// the smaller.
///
/// Computed as `ln m + ln(1 − x / m)`. Equal rates give `-inf`.
///
/// ```
/// use microcat_inference::likelihood::log_diff;
///
/// assert!((log_diff([3.0, 5.0]) - 2.0_f64.ln()).abs() < 1e-12);
/// assert!((log_diff([5.0, 3.0]) - 2.0_f64.ln()).abs() < 1e-12);
/// ```
#[must_use]
pub fn log_diff(betas: [f64; 2]) -> f64 {
    let (m, x) = max_min(betas);
    m.ln() + (-x / m).ln_1p()
}

/// Stable `ln(e^{−x t} − e^{−m t})` for a pair of rates, where `m` is the
/// larger and `x` the smaller.
///
/// Computed as `−x t + ln(1 − e^{(x − m) t})`, using `expm1` for the
/// inner difference so that nearly equal rates or small `t` keep full
/// precision.
///
/// ```
/// use microcat_inference::likelihood::log_diff_exp;
///
/// let t = 4.0_f64;
/// let naive = ((-0.1_f64 * t).exp() - (-0.3_f64 * t).exp()).ln();
/// assert!((log_diff_exp([0.3, 0.1], t) - naive).abs() < 1e-12);
/// ```
#[must_use]
pub fn log_diff_exp(betas: [f64; 2], t: f64) -> f64 {
    let (m, x) = max_min(betas);
    -x * t + (-((x - m) * t).exp_m1()).ln()
}

fn max_min([a, b]: [f64; 2]) -> (f64, f64) {
    if a >= b { (a, b) } else { (b, a) }
}

/// Lanczos approximation of `ln Γ(x)` (g = 7, n = 9).
///
/// Relative error below `2e-10` for `x > 0`. Uses the reflection formula
/// for `x < 0.5`.
///
/// Reference: Lanczos (1964), "A Precision Approximation of the Gamma
/// Function", *SIAM Journal on Numerical Analysis* 1(1).
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn ln_gamma(x: f64) -> f64 {
    #[allow(clippy::excessive_precision, clippy::unreadable_literal)]
    const COEFFICIENTS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    const G: f64 = 7.0;

    if x < 0.5 {
        // Γ(x)·Γ(1−x) = π/sin(πx)
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut sum = COEFFICIENTS[0];
    for (i, &c) in COEFFICIENTS[1..].iter().enumerate() {
        sum += c / (x + i as f64 + 1.0);
    }

    let t = x + G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

/// Regularized lower incomplete gamma function `P(a, x)`.
///
/// Series expansion for `x < a + 1`, Lentz continued fraction for the
/// complement otherwise.
///
/// Reference: Press et al. (2007), *Numerical Recipes*, 3rd ed., §6.2.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn regularized_lower_gamma(a: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 500;
    const EPS: f64 = 1e-15;
    const TINY: f64 = 1e-300;

    if x <= 0.0 {
        return 0.0;
    }
    if x.is_infinite() {
        return 1.0;
    }
    let log_prefix = -x + a * x.ln() - ln_gamma(a);

    if x < a + 1.0 {
        let mut ap = a;
        let mut del = 1.0 / a;
        let mut sum = del;
        for _ in 0..MAX_ITER {
            ap += 1.0;
            del *= x / ap;
            sum += del;
            if del.abs() < sum.abs() * EPS {
                break;
            }
        }
        return (sum * log_prefix.exp()).min(1.0);
    }

    let mut b = x + 1.0 - a;
    let mut c = 1.0 / TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..MAX_ITER {
        let i = i as f64;
        let an = -i * (i - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < TINY {
            d = TINY;
        }
        c = b + an / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    (1.0 - log_prefix.exp() * h).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn catastrophe_times() -> Vec<f64> {
        vec![
            205.0, 310.0, 355.0, 400.0, 445.0, 475.0, 520.0, 590.0, 620.0, 700.0, 765.0, 845.0,
            910.0, 1015.0, 1200.0, 1430.0,
        ]
    }

    #[test]
    fn test_ln_gamma_known_values() {
        assert!(ln_gamma(1.0).abs() < 1e-10);
        assert!(ln_gamma(2.0).abs() < 1e-10);
        assert!((ln_gamma(3.0) - 2.0_f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-10);
    }

    #[test]
    fn test_gamma_log_pdf_matches_exponential() {
        // Gamma(1, β) is Exp(β)
        for &t in &[0.0, 0.5, 3.0, 40.0] {
            let expected = 0.25_f64.ln() - 0.25 * t;
            assert!((gamma_log_pdf(t, 1.0, 0.25) - expected).abs() < TOL);
        }
    }

    #[test]
    fn test_gamma_log_pdf_known_value() {
        // Gamma(3, 2) at t = 1.5: 2^3 · 1.5^2 · e^{-3} / 2!
        let expected = (8.0 * 2.25 * (-3.0_f64).exp() / 2.0).ln();
        assert!((gamma_log_pdf(1.5, 3.0, 2.0) - expected).abs() < TOL);
    }

    #[test]
    fn test_gamma_log_pdf_outside_support() {
        assert_eq!(gamma_log_pdf(-1.0, 2.0, 1.0), f64::NEG_INFINITY);
        assert_eq!(gamma_log_pdf(0.0, 2.0, 1.0), f64::NEG_INFINITY);
        assert_eq!(gamma_log_pdf(0.0, 0.5, 1.0), f64::INFINITY);
    }

    #[test]
    fn test_gamma_log_likelihood_is_sum_of_log_pdfs() {
        let data = catastrophe_times();
        let (alpha, beta): (f64, f64) = (2.4, 1.0 / 290.0);
        let expected: f64 = data.iter().map(|&t| gamma_log_pdf(t, alpha, beta)).sum();
        let ll = gamma_log_likelihood([alpha.ln(), beta.ln()], &data);
        assert!((ll - expected).abs() < 1e-8);
    }

    #[test]
    fn test_double_exponential_matches_naive_density() {
        let data = catastrophe_times();
        let (b1, b2): (f64, f64) = (1.0 / 250.0, 1.0 / 420.0);
        let naive: f64 = data
            .iter()
            .map(|&t| (b1 * b2 / (b2 - b1) * ((-b1 * t).exp() - (-b2 * t).exp())).ln())
            .sum();
        let ll = double_exponential_log_likelihood([b1.ln(), b2.ln()], &data);
        assert!((ll - naive).abs() < 1e-8, "{ll} vs {naive}");
    }

    #[test]
    fn test_double_exponential_is_symmetric_in_rates() {
        let data = catastrophe_times();
        let a = double_exponential_log_likelihood([(0.004_f64).ln(), (0.0025_f64).ln()], &data);
        let b = double_exponential_log_likelihood([(0.0025_f64).ln(), (0.004_f64).ln()], &data);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_double_exponential_collapses_to_erlang() {
        let data = catastrophe_times();
        let beta: f64 = 1.0 / 330.0;
        let de = double_exponential_log_likelihood([beta.ln(), beta.ln()], &data);
        let gamma = gamma_log_likelihood([2.0_f64.ln(), beta.ln()], &data);
        assert_eq!(de, gamma);
        assert!(de.is_finite());
    }

    #[test]
    fn test_double_exponential_is_continuous_across_collapse() {
        let data = catastrophe_times();
        let beta: f64 = 1.0 / 330.0;
        let erlang = gamma_log_likelihood([2.0_f64.ln(), beta.ln()], &data);
        // Just outside the collapse tolerance the general formula is used.
        let nearby = double_exponential_log_likelihood([beta.ln(), (beta * (1.0 + 1e-6)).ln()], &data);
        assert!(nearby.is_finite());
        assert!((nearby - erlang).abs() < 1e-3, "{nearby} vs {erlang}");
    }

    #[test]
    fn test_double_exponential_cdf_collapse_is_continuous() {
        let beta = 0.01;
        let erlang = DoubleExponentialParams { beta1: beta, beta2: beta };
        let nearby = DoubleExponentialParams {
            beta1: beta,
            beta2: beta * (1.0 + 1e-5),
        };
        assert!(erlang.is_collapsed());
        assert!(!nearby.is_collapsed());
        for &t in &[10.0, 100.0, 250.0, 1000.0] {
            assert!((erlang.cdf(t) - nearby.cdf(t)).abs() < 1e-4);
        }
    }

    #[test]
    fn test_double_exponential_cdf_matches_closed_form() {
        let (b1, b2): (f64, f64) = (1.0 / 180.0, 1.0 / 520.0);
        let params = DoubleExponentialParams { beta1: b1, beta2: b2 };
        for &t in &[5.0, 120.0, 480.0, 3000.0] {
            let closed = b1 * b2 / (b2 - b1)
                * ((1.0 - (-b1 * t).exp()) / b1 - (1.0 - (-b2 * t).exp()) / b2);
            assert!((params.cdf(t) - closed).abs() < 1e-12, "t = {t}");
        }
    }

    #[test]
    fn test_erlang_cdf_matches_gamma_cdf() {
        let beta = 0.004;
        let erlang = DoubleExponentialParams { beta1: beta, beta2: beta };
        let gamma = GammaParams { alpha: 2.0, beta };
        for &t in &[1.0, 50.0, 400.0, 2000.0] {
            assert!((erlang.cdf(t) - gamma.cdf(t)).abs() < 1e-10);
        }
    }

    #[test]
    fn test_gamma_cdf_known_values() {
        // Exponential: P(1, x) = 1 − e^{−x}
        let exp = GammaParams { alpha: 1.0, beta: 1.0 };
        assert!((exp.cdf(2.0) - (1.0 - (-2.0_f64).exp())).abs() < 1e-12);
        // Large-x branch
        assert!((exp.cdf(30.0) - 1.0).abs() < 1e-12);
        assert_eq!(exp.cdf(-1.0), 0.0);
        // Erlang-3: 1 − e^{−x}(1 + x + x²/2)
        let erlang3 = GammaParams { alpha: 3.0, beta: 1.0 };
        for &x in &[0.5_f64, 2.0, 4.5, 9.0] {
            let expected = 1.0 - (-x).exp() * (1.0 + x + x * x / 2.0);
            assert!((erlang3.cdf(x) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_cdf_is_integral_of_density() {
        let params = DoubleExponentialParams {
            beta1: 1.0 / 150.0,
            beta2: 1.0 / 400.0,
        };
        // trapezoid rule on [0, 600]
        let steps = 60_000;
        let h = 600.0 / f64::from(steps);
        let mut integral = 0.0_f64;
        for i in 0..steps {
            let a = f64::from(i) * h;
            let b = a + h;
            integral += 0.5 * h * (params.log_pdf(a).exp() + params.log_pdf(b).exp());
        }
        assert!((integral - params.cdf(600.0)).abs() < 1e-6);
    }

    #[test]
    fn test_model_log_params_roundtrip() {
        let params = GammaParams { alpha: 2.5, beta: 0.004 };
        let back = GammaModel::from_log_params(GammaModel::to_log_params(params));
        assert!((back.alpha - params.alpha).abs() < 1e-12);
        assert!((back.beta - params.beta).abs() < 1e-15);
    }
}
