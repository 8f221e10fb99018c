use super::{ConvergenceError, Minimizer, Objective, OptimizeReport};

/// Settings for [`Powell`].
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct PowellOptions {
    /// Maximum number of sweeps through the direction set.
    pub max_iterations: usize,
    /// Converged once a full sweep reduces the objective by less than this
    /// fraction of its magnitude.
    pub relative_tolerance: f64,
    /// Fractional precision of each line minimization.
    pub line_tolerance: f64,
}

impl Default for PowellOptions {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            relative_tolerance: 1e-10,
            line_tolerance: 1.5e-8,
        }
    }
}

/// Derivative-free minimizer using Powell's conjugate direction method.
///
/// Each sweep runs a Brent line minimization along every direction of the
/// current set (initially the coordinate axes), then replaces the direction
/// of largest decrease with the net displacement of the sweep when that
/// displacement still looks promising.
///
/// ```
/// use microcat_inference::optimize::{Minimizer, Powell};
///
/// let report = Powell::default()
///     .minimize(|x| (x[0] - 1.0).abs() + (x[1] + 2.0).powi(2), &[0.0, 0.0])
///     .unwrap();
/// assert!((report.x[0] - 1.0).abs() < 1e-6);
/// assert!((report.x[1] + 2.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Powell {
    pub options: PowellOptions,
}

const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;
const GOLDEN_SECTION: f64 = 0.381_966_011_250_105;
const MAX_EXPANSIONS: usize = 40;
const MAX_LINE_ITERATIONS: usize = 500;
const TINY: f64 = 1e-20;
const ZEPS: f64 = 1e-10;

impl Powell {
    #[must_use]
    pub fn new(options: PowellOptions) -> Self {
        Self { options }
    }

    /// Minimizes along `x + α d`, returning the new point and its value.
    fn line_minimize<F>(
        &self,
        objective: &mut Objective<F>,
        x: &[f64],
        fx: f64,
        direction: &[f64],
    ) -> (Vec<f64>, f64)
    where
        F: FnMut(&[f64]) -> f64,
    {
        let at = |alpha: f64| -> Vec<f64> {
            x.iter()
                .zip(direction)
                .map(|(xi, di)| xi + alpha * di)
                .collect()
        };
        let mut phi = |alpha: f64| objective.eval(&at(alpha));

        let (alpha, value) = match bracket(&mut phi, fx) {
            Bracket::Found { lo, mid, hi, f_mid } => {
                brent(&mut phi, lo, mid, hi, f_mid, self.options.line_tolerance)
            }
            Bracket::Unbounded { alpha, value } => (alpha, value),
        };
        if value < fx { (at(alpha), value) } else { (x.to_vec(), fx) }
    }
}

impl Minimizer for Powell {
    const METHOD: &'static str = "Powell";

    fn minimize<F>(&self, f: F, x0: &[f64]) -> Result<OptimizeReport, ConvergenceError>
    where
        F: FnMut(&[f64]) -> f64,
    {
        let n = x0.len();
        let mut objective = Objective::new(f);
        let mut x = x0.to_vec();

        let mut fx = objective.eval_raw(&x);
        if !fx.is_finite() {
            return Err(objective.fail(
                Self::METHOD,
                format!("objective is not finite at the initial point (value {fx})"),
                0,
            ));
        }

        let mut directions = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect::<Vec<Vec<f64>>>();

        for iteration in 0..self.options.max_iterations {
            let x_start = x.clone();
            let f_start = fx;
            let mut biggest_drop = 0.0;
            let mut biggest_index = 0;

            for (i, direction) in directions.iter().enumerate() {
                let f_before = fx;
                (x, fx) = self.line_minimize(&mut objective, &x, fx, direction);
                if f_before - fx > biggest_drop {
                    biggest_drop = f_before - fx;
                    biggest_index = i;
                }
            }

            if 2.0 * (f_start - fx)
                <= self.options.relative_tolerance * (f_start.abs() + fx.abs()) + TINY
            {
                return objective.finish(
                    Self::METHOD,
                    x,
                    fx,
                    iteration + 1,
                    "relative reduction of the objective below tolerance",
                );
            }

            let displacement = x
                .iter()
                .zip(&x_start)
                .map(|(a, b)| a - b)
                .collect::<Vec<_>>();
            let extrapolated = x
                .iter()
                .zip(&displacement)
                .map(|(a, d)| a + d)
                .collect::<Vec<_>>();
            let f_extrapolated = objective.eval(&extrapolated);

            if f_extrapolated < f_start {
                let t = 2.0 * (f_start - 2.0 * fx + f_extrapolated)
                    * (f_start - fx - biggest_drop).powi(2)
                    - biggest_drop * (f_start - f_extrapolated).powi(2);
                if t < 0.0 {
                    (x, fx) = self.line_minimize(&mut objective, &x, fx, &displacement);
                    directions.swap_remove(biggest_index);
                    directions.push(displacement);
                }
            }
        }

        Err(objective.fail(
            Self::METHOD,
            "maximum number of iterations exceeded",
            self.options.max_iterations,
        ))
    }
}

enum Bracket {
    Found {
        lo: f64,
        mid: f64,
        hi: f64,
        f_mid: f64,
    },
    /// Values kept decreasing through every expansion.
    Unbounded { alpha: f64, value: f64 },
}

/// Finds `lo < mid < hi` (in either order) with `φ(mid)` below both ends,
/// given `φ(0) = f0`.
fn bracket(phi: &mut impl FnMut(f64) -> f64, f0: f64) -> Bracket {
    let f_plus = phi(1.0);
    let f_minus = phi(-1.0);
    if f_plus >= f0 && f_minus >= f0 {
        return Bracket::Found {
            lo: -1.0,
            mid: 0.0,
            hi: 1.0,
            f_mid: f0,
        };
    }

    let (mut a, mut b, mut fb) = if f_plus <= f_minus {
        (0.0, 1.0, f_plus)
    } else {
        (0.0, -1.0, f_minus)
    };
    for _ in 0..MAX_EXPANSIONS {
        let c = b + GOLDEN_RATIO * (b - a);
        let fc = phi(c);
        if fc >= fb {
            return Bracket::Found {
                lo: a,
                mid: b,
                hi: c,
                f_mid: fb,
            };
        }
        (a, b, fb) = (b, c, fc);
    }
    Bracket::Unbounded {
        alpha: b,
        value: fb,
    }
}

/// Brent's parabolic-interpolation line search inside a bracket.
#[expect(clippy::float_cmp, clippy::many_single_char_names)]
fn brent(
    phi: &mut impl FnMut(f64) -> f64,
    a: f64,
    b: f64,
    c: f64,
    fb: f64,
    tolerance: f64,
) -> (f64, f64) {
    let (mut lo, mut hi) = if a < c { (a, c) } else { (c, a) };
    let (mut x, mut w, mut v) = (b, b, b);
    let (mut fx, mut fw, mut fv) = (fb, fb, fb);
    let mut d: f64 = 0.0;
    let mut e: f64 = 0.0;

    for _ in 0..MAX_LINE_ITERATIONS {
        let xm = 0.5 * (lo + hi);
        let tol1 = tolerance * x.abs() + ZEPS;
        let tol2 = 2.0 * tol1;
        if (x - xm).abs() <= tol2 - 0.5 * (hi - lo) {
            break;
        }

        let mut parabolic = false;
        if e.abs() > tol1 {
            let r = (x - w) * (fx - fv);
            let mut q = (x - v) * (fx - fw);
            let mut p = (x - v) * q - (x - w) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            } else {
                q = -q;
            }
            // Infinite values from rejected points make the fit meaningless.
            if p.is_finite()
                && q.is_finite()
                && p.abs() < (0.5 * q * e).abs()
                && p > q * (lo - x)
                && p < q * (hi - x)
            {
                e = d;
                d = p / q;
                let u = x + d;
                if u - lo < tol2 || hi - u < tol2 {
                    d = tol1.copysign(xm - x);
                }
                parabolic = true;
            }
        }
        if !parabolic {
            e = if x >= xm { lo - x } else { hi - x };
            d = GOLDEN_SECTION * e;
        }

        let u = if d.abs() >= tol1 {
            x + d
        } else {
            x + tol1.copysign(d)
        };
        let fu = phi(u);

        if fu <= fx {
            if u >= x {
                lo = x;
            } else {
                hi = x;
            }
            (v, fv) = (w, fw);
            (w, fw) = (x, fx);
            (x, fx) = (u, fu);
        } else {
            if u < x {
                lo = u;
            } else {
                hi = u;
            }
            if fu <= fw || w == x {
                (v, fv) = (w, fw);
                (w, fw) = (u, fu);
            } else if fu <= fv || v == x || v == w {
                (v, fv) = (u, fu);
            }
        }
    }
    (x, fx)
}
