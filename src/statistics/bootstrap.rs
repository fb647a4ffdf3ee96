//! Kernel-weighted bootstrap regression.
//!
//! Converts a scatter of (age, value) or (age, numerator, denominator)
//! observations into a best-fit [`PiecewiseCurve`] plus a matching
//! standard-error curve:
//!
//! 1. A fixed grid of [`GRID_RESOLUTION`] steps spans the observed age
//!    range. At each grid point the point statistic is evaluated with
//!    Gaussian-kernel weights centred on that point.
//! 2. The best fit uses the full, unperturbed dataset; non-finite grid
//!    values are skipped (no point stored).
//! 3. Uncertainty comes from resampling: each bootstrap iteration draws the
//!    same number of observations with replacement (ratio mode resamples
//!    (age, A, B) triples jointly) and refits the grid curve. The sample
//!    standard deviation of the finite per-grid-point values across
//!    iterations becomes the standard-error curve.
//!
//! The two point statistics share this skeleton:
//! - elemental: ΣwᵢAᵢ / Σwᵢ (a kernel-weighted local mean)
//! - ratio: ΣwᵢAᵢ / ΣwᵢBᵢ (numerator and denominator smoothed jointly, so
//!   the curve is not the biased quotient of two independent smooths)
//!
//! Inputs must already be stripped of non-finite entries (see
//! `SampleSet::extract_pairs` / `extract_triples`); the resampler does not
//! tolerate NaN.

use rand::Rng;
use tracing::debug;

use crate::curve::PiecewiseCurve;
use crate::statistics::moments::{gaussian_weight, sample_std_dev};

/// Number of grid steps across the observed age range.
pub const GRID_RESOLUTION: usize = 250;

/// Default bootstrap iteration count for standard-error estimation.
pub const DEFAULT_BOOTSTRAP_ITERATIONS: usize = 10_000;

/// Output of a bootstrap run: the best-fit curve and its standard error.
///
/// Either curve may be empty when every grid point was non-finite (e.g. a
/// degenerate denominator everywhere); callers must treat an empty curve as
/// "no data" and skip dependent computation.
#[derive(Debug, Clone, Default)]
pub struct BootstrapCurves {
    /// Kernel-weighted fit through the full dataset.
    pub best_fit: PiecewiseCurve,
    /// Per-grid-point sample standard deviation across bootstrap refits.
    pub std_error: PiecewiseCurve,
}

impl BootstrapCurves {
    /// Upper 95% bound: best fit plus two standard errors (normal
    /// approximation, not an empirical percentile).
    pub fn percentile_975(&self, x: f64) -> f64 {
        self.best_fit.evaluate(x) + 2.0 * self.std_error.evaluate(x)
    }

    /// Lower 95% bound: best fit minus two standard errors.
    pub fn percentile_025(&self, x: f64) -> f64 {
        self.best_fit.evaluate(x) - 2.0 * self.std_error.evaluate(x)
    }
}

#[derive(Clone, Copy)]
enum Mode {
    Elemental,
    Ratio,
}

fn point_statistic(mode: Mode, weights: &[f64], a: &[f64], b: &[f64]) -> f64 {
    match mode {
        Mode::Elemental => {
            let mut sum_a = 0.0;
            let mut sum_w = 0.0;
            for (i, &w) in weights.iter().enumerate() {
                sum_a += w * a[i];
                sum_w += w;
            }
            sum_a / sum_w
        }
        Mode::Ratio => {
            let mut sum_a = 0.0;
            let mut sum_b = 0.0;
            for (i, &w) in weights.iter().enumerate() {
                sum_a += w * a[i];
                sum_b += w * b[i];
            }
            sum_a / sum_b
        }
    }
}

/// Grid points across [min, max): the same walk is used for the best fit,
/// every bootstrap refit, and the standard-error curve.
fn grid_points(ages: &[f64]) -> Vec<f64> {
    let mut points = Vec::with_capacity(GRID_RESOLUTION + 1);
    let Some(&first) = ages.first() else {
        return points;
    };
    let (mut age_min, mut age_max) = (first, first);
    for &age in ages {
        age_min = age_min.min(age);
        age_max = age_max.max(age);
    }
    let step = (age_max - age_min) / GRID_RESOLUTION as f64;
    if !step.is_finite() || step <= 0.0 {
        return points;
    }
    let mut t = age_min;
    while t < age_max {
        points.push(t);
        t += step;
    }
    points
}

fn fit_curve(
    mode: Mode,
    grid: &[f64],
    ages: &[f64],
    a: &[f64],
    b: &[f64],
    kernel_width: f64,
    weights: &mut Vec<f64>,
) -> PiecewiseCurve {
    let mut curve = PiecewiseCurve::with_capacity(grid.len());
    weights.clear();
    weights.resize(ages.len(), 0.0);
    for &t in grid {
        for (w, &age) in weights.iter_mut().zip(ages) {
            *w = gaussian_weight(age, t, kernel_width);
        }
        let y = point_statistic(mode, weights, a, b);
        if y.is_finite() {
            curve.add_point(t, y);
        }
    }
    curve.finalize();
    curve
}

#[allow(clippy::too_many_arguments)]
fn resample_into<R: Rng + ?Sized>(
    rng: &mut R,
    ages: &[f64],
    a: &[f64],
    b: &[f64],
    ages_out: &mut [f64],
    a_out: &mut [f64],
    b_out: &mut [f64],
    joint_b: bool,
) {
    let n = ages.len();
    for s in 0..n {
        let idx = rng.random_range(0..n);
        ages_out[s] = ages[idx];
        a_out[s] = a[idx];
        if joint_b {
            b_out[s] = b[idx];
        }
    }
}

fn bootstrap_impl<R: Rng + ?Sized>(
    mode: Mode,
    ages: &[f64],
    a: &[f64],
    b: &[f64],
    kernel_width: f64,
    iterations: usize,
    rng: &mut R,
) -> BootstrapCurves {
    let grid = grid_points(ages);
    let mut weights = Vec::new();
    let mut result = BootstrapCurves {
        best_fit: fit_curve(mode, &grid, ages, a, b, kernel_width, &mut weights),
        std_error: PiecewiseCurve::with_capacity(grid.len()),
    };
    debug!(points = result.best_fit.len(), "bootstrap best fit computed");

    if iterations > 1 && !ages.is_empty() && !grid.is_empty() {
        let joint_b = matches!(mode, Mode::Ratio);
        let mut ages_rs = ages.to_vec();
        let mut a_rs = a.to_vec();
        let mut b_rs = b.to_vec();
        let mut per_point: Vec<Vec<f64>> = vec![Vec::with_capacity(iterations); grid.len()];

        for i in 0..iterations {
            resample_into(
                rng, ages, a, b, &mut ages_rs, &mut a_rs, &mut b_rs, joint_b,
            );
            let refit = fit_curve(
                mode,
                &grid,
                &ages_rs,
                &a_rs,
                &b_rs,
                kernel_width,
                &mut weights,
            );
            for (values, &t) in per_point.iter_mut().zip(&grid) {
                let v = refit.evaluate(t);
                if v.is_finite() {
                    values.push(v);
                }
            }
            if i % 2500 == 0 {
                debug!(iteration = i, total = iterations, "bootstrap resampling");
            }
        }

        // The point is recorded even when the deviation is non-finite (0 or
        // 1 usable refits): downstream skip-checks handle it.
        for (values, &t) in per_point.iter().zip(&grid) {
            result.std_error.add_point(t, sample_std_dev(values));
        }
        result.std_error.finalize();
    }

    result
}

/// Bootstrap a kernel-smoothed elemental curve from (age, value) pairs.
///
/// With `iterations <= 1` only the best fit is computed and the
/// standard-error curve stays empty.
pub fn elemental_bootstrap<R: Rng + ?Sized>(
    ages: &[f64],
    values: &[f64],
    kernel_width: f64,
    iterations: usize,
    rng: &mut R,
) -> BootstrapCurves {
    debug_assert_eq!(ages.len(), values.len());
    bootstrap_impl(Mode::Elemental, ages, values, &[], kernel_width, iterations, rng)
}

/// Bootstrap a kernel-smoothed ratio curve from (age, numerator,
/// denominator) triples, resampled jointly.
pub fn ratio_bootstrap<R: Rng + ?Sized>(
    ages: &[f64],
    numerators: &[f64],
    denominators: &[f64],
    kernel_width: f64,
    iterations: usize,
    rng: &mut R,
) -> BootstrapCurves {
    debug_assert_eq!(ages.len(), numerators.len());
    debug_assert_eq!(ages.len(), denominators.len());
    bootstrap_impl(
        Mode::Ratio,
        ages,
        numerators,
        denominators,
        kernel_width,
        iterations,
        rng,
    )
}
