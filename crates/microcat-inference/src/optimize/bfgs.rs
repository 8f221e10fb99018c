use super::{ConvergenceError, Minimizer, Objective, OptimizeReport, dot, norm_inf};

/// Settings for [`Bfgs`].
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct BfgsOptions {
    /// Maximum number of quasi-Newton iterations.
    pub max_iterations: usize,
    /// Converged once the (projected) gradient's largest component is below this.
    pub gradient_tolerance: f64,
    /// Converged once a step reduces the objective by less than this
    /// fraction of its magnitude.
    pub relative_tolerance: f64,
    /// Relative step for central finite differences.
    pub difference_step: f64,
    /// Optional `(lower, upper)` box for each coordinate.
    pub bounds: Option<Vec<(f64, f64)>>,
}

impl Default for BfgsOptions {
    fn default() -> Self {
        Self {
            max_iterations: 400,
            gradient_tolerance: 1e-7,
            relative_tolerance: 1e-14,
            difference_step: 1e-6,
            bounds: None,
        }
    }
}

/// Quasi-Newton (BFGS) minimizer with finite-difference gradients.
///
/// Each iteration takes a step along `−H g`, where `H` is the running
/// inverse-Hessian approximation, with a backtracking Armijo line search.
/// When [`BfgsOptions::bounds`] is set, trial points are projected onto the
/// box, and coordinates pinned to a bound by the gradient are held fixed
/// for the step and ignored by the convergence test.
///
/// ```
/// use microcat_inference::optimize::{Bfgs, Minimizer};
///
/// let report = Bfgs::default()
///     .minimize(|x| (x[0] - 1.0).powi(2) + (x[1] + 2.0).powi(2), &[0.0, 0.0])
///     .unwrap();
/// assert!((report.x[0] - 1.0).abs() < 1e-6);
/// assert!((report.x[1] + 2.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Bfgs {
    pub options: BfgsOptions,
}

impl Bfgs {
    #[must_use]
    pub fn new(options: BfgsOptions) -> Self {
        Self { options }
    }

    fn project(&self, x: &mut [f64]) {
        if let Some(bounds) = &self.options.bounds {
            for (v, &(lo, hi)) in x.iter_mut().zip(bounds) {
                *v = v.clamp(lo, hi);
            }
        }
    }

    /// Marks coordinates sitting on a bound with the gradient pushing outward.
    fn active_set(&self, x: &[f64], g: &[f64]) -> Vec<bool> {
        let Some(bounds) = &self.options.bounds else {
            return vec![false; x.len()];
        };
        x.iter()
            .zip(g)
            .zip(bounds)
            .map(|((&xi, &gi), &(lo, hi))| (xi <= lo && gi > 0.0) || (xi >= hi && gi < 0.0))
            .collect()
    }

    fn gradient<F>(&self, objective: &mut Objective<F>, x: &[f64]) -> Vec<f64>
    where
        F: FnMut(&[f64]) -> f64,
    {
        let mut shifted = x.to_vec();
        (0..x.len())
            .map(|i| {
                let h = self.options.difference_step * x[i].abs().max(1.0);
                shifted[i] = x[i] + h;
                let forward = objective.eval(&shifted);
                shifted[i] = x[i] - h;
                let backward = objective.eval(&shifted);
                shifted[i] = x[i];
                (forward - backward) / (2.0 * h)
            })
            .collect()
    }
}

impl Minimizer for Bfgs {
    const METHOD: &'static str = "BFGS";

    #[expect(clippy::many_single_char_names)]
    fn minimize<F>(&self, f: F, x0: &[f64]) -> Result<OptimizeReport, ConvergenceError>
    where
        F: FnMut(&[f64]) -> f64,
    {
        const ARMIJO: f64 = 1e-4;
        const MAX_BACKTRACKS: usize = 60;

        let n = x0.len();
        let mut objective = Objective::new(f);
        let mut x = x0.to_vec();
        self.project(&mut x);

        let mut fx = objective.eval_raw(&x);
        if !fx.is_finite() {
            return Err(objective.fail(
                Self::METHOD,
                format!("objective is not finite at the initial point (value {fx})"),
                0,
            ));
        }
        let mut g = self.gradient(&mut objective, &x);
        if g.iter().any(|v| !v.is_finite()) {
            return Err(objective.fail(
                Self::METHOD,
                "gradient is not finite at the initial point",
                0,
            ));
        }
        let mut h = identity(n);
        let mut reset_once = false;

        for iteration in 0..self.options.max_iterations {
            let active = self.active_set(&x, &g);
            let free_g = g
                .iter()
                .zip(&active)
                .map(|(&gi, &fixed)| if fixed { 0.0 } else { gi })
                .collect::<Vec<_>>();
            if norm_inf(&free_g) <= self.options.gradient_tolerance {
                return objective.finish(
                    Self::METHOD,
                    x,
                    fx,
                    iteration,
                    "gradient norm below tolerance",
                );
            }

            // Search only over coordinates not pinned to a bound.
            let mut p = mat_vec(&h, &free_g)
                .into_iter()
                .zip(&active)
                .map(|(v, &fixed)| if fixed { 0.0 } else { -v })
                .collect::<Vec<_>>();
            if dot(&free_g, &p) >= 0.0 {
                h = identity(n);
                p = free_g.iter().map(|v| -v).collect();
            }

            let mut alpha: f64 = 1.0;
            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                let mut trial = x.iter().zip(&p).map(|(xi, pi)| xi + alpha * pi).collect::<Vec<_>>();
                self.project(&mut trial);
                let step = trial.iter().zip(&x).map(|(t, xi)| t - xi).collect::<Vec<_>>();
                let f_trial = objective.eval(&trial);
                if f_trial <= fx + ARMIJO * dot(&g, &step) {
                    accepted = Some((trial, step, f_trial));
                    break;
                }
                alpha *= 0.5;
            }

            let Some((x_new, s, f_new)) = accepted else {
                if !reset_once {
                    // Retry once from steepest descent before giving up.
                    tracing::trace!(iteration, "line search failed, resetting inverse Hessian");
                    h = identity(n);
                    reset_once = true;
                    continue;
                }
                return Err(objective.fail(
                    Self::METHOD,
                    "line search failed to reduce the objective; desired precision not achieved",
                    iteration,
                ));
            };
            reset_once = false;

            let g_new = self.gradient(&mut objective, &x_new);
            let reduction = fx - f_new;
            let scale = fx.abs().max(f_new.abs()).max(1.0);

            let y = g_new.iter().zip(&g).map(|(a, b)| a - b).collect::<Vec<_>>();
            let sy = dot(&s, &y);
            if sy > 1e-12 * dot(&s, &s).sqrt() * dot(&y, &y).sqrt() {
                bfgs_update(&mut h, &s, &y, sy);
            }

            x = x_new;
            fx = f_new;
            g = g_new;

            if reduction <= self.options.relative_tolerance * scale {
                return objective.finish(
                    Self::METHOD,
                    x,
                    fx,
                    iteration + 1,
                    "relative reduction of the objective below tolerance",
                );
            }
        }

        Err(objective.fail(
            Self::METHOD,
            "maximum number of iterations exceeded",
            self.options.max_iterations,
        ))
    }
}

fn identity(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}

fn mat_vec(m: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    m.iter().map(|row| dot(row, v)).collect()
}

/// `H ← (I − ρ s yᵀ) H (I − ρ y sᵀ) + ρ s sᵀ` with `ρ = 1 / (yᵀ s)`.
fn bfgs_update(h: &mut [Vec<f64>], s: &[f64], y: &[f64], sy: f64) {
    let rho = 1.0 / sy;
    let hy = mat_vec(h, y);
    let yhy = dot(y, &hy);
    let n = s.len();
    for i in 0..n {
        for j in 0..n {
            h[i][j] += rho * ((1.0 + rho * yhy) * s[i] * s[j] - hy[i] * s[j] - s[i] * hy[j]);
        }
    }
}
