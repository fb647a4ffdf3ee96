//! Basic moments, percentiles, and the Gaussian weight kernel.

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 divisor).
///
/// Returns 0.0 for an empty slice and NaN for a single value (0/0); the
/// NaN propagates into the standard-error curves and trips the
/// reconstruction skip-check, which is the intended treatment of a grid
/// point with too few bootstrap observations.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let acc: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (acc / (values.len() as f64 - 1.0)).sqrt()
}

/// Percentile of a sorted slice by linear interpolation between the two
/// samples flanking the percentile rank. No extrapolation: ranks at or
/// beyond the ends clamp to the end values.
///
/// `percentile` is in [0, 100].
///
/// # Panics
///
/// Panics if the slice is empty.
pub fn percentile_interpolated(sorted: &[f64], percentile: f64) -> f64 {
    assert!(
        !sorted.is_empty(),
        "cannot take a percentile of an empty slice"
    );
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = (percentile / 100.0) * (n as f64 - 1.0);
    if rank <= 0.0 {
        return sorted[0];
    }
    if rank >= (n - 1) as f64 {
        return sorted[n - 1];
    }
    let lo = rank.floor() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
}

/// Gaussian probability density of `x` under N(center, width²), used as the
/// smoothing weight of a sample at distance |x − center| from the
/// evaluation point.
pub fn gaussian_weight(x: f64, center: f64, width: f64) -> f64 {
    let delta = x - center;
    let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * width);
    norm * (-(delta * delta) / (2.0 * width * width)).exp()
}
