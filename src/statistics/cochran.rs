//! Variance of a weighted ratio of means.
//!
//! Implements the weighted-average variance estimator from Cochran (1977),
//! as presented by Endlich et al. (1988) and Gatz & Smith (1995): for a
//! ratio estimated as Xbar = ΣWᵢXᵢ / ΣWᵢ, with Wbar = ΣWᵢ/N,
//!
//! ```text
//! var(Xbar) = N / ((N − 1) (ΣW)²) · Σₖ [ (WₖXₖ − Wbar·Xbar)²
//!             − 2·Xbar·(Wₖ − Wbar)(WₖXₖ − Wbar·Xbar)
//!             + Xbar²·(Wₖ − Wbar)² ]
//! ```
//!
//! In the geochemical setting the denominators Bᵢ play the role of the
//! weights Wᵢ and the numerators Aᵢ are the weight-value products WᵢXᵢ, so
//! Xbar is exactly the ratio of mixed concentrations ΣA/ΣB.
//!
//! The N − 1 divisor is kept as published: fewer than two usable pairs
//! yields a non-finite variance, which propagates as "no estimate" rather
//! than crashing.
//!
//! # References
//!
//! Cochran, W. G. (1977). Sampling Techniques, 3rd ed. Wiley.
//! Gatz, D. F. & Smith, L. (1995). "The standard error of a weighted mean
//! concentration — I." Atmospheric Environment 29(11):1185–1193.

/// Pairs whose effective weight is at or below this bound are excluded to
/// avoid divisions by (near-)zero denominators.
const WEIGHT_EPSILON: f64 = 1e-8;

/// Compute the Cochran variance of a weighted ratio of means.
///
/// `pairs` yields `(numerator, effective_weight)` per sample, i.e.
/// (WₖXₖ, Wₖ). Pairs with a non-finite entry or an effective weight at or
/// below a small epsilon (1e-8) are skipped. Returns NaN when no pair
/// survives and a non-finite value when exactly one does.
pub fn weighted_ratio_variance<I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut wx = Vec::new();
    let mut w = Vec::new();
    let mut sum_wx = 0.0;
    let mut sum_w = 0.0;
    for (a, b) in pairs {
        if a.is_finite() && b.is_finite() && b > WEIGHT_EPSILON {
            sum_wx += a;
            sum_w += b;
            wx.push(a);
            w.push(b);
        }
    }

    let n = wx.len() as f64;
    let w_bar = sum_w / n;
    let x_bar = sum_wx / sum_w;
    let wb_xb = w_bar * x_bar;
    let mut sum = 0.0;
    for k in 0..wx.len() {
        sum += (wx[k] - wb_xb) * (wx[k] - wb_xb);
        sum -= 2.0 * x_bar * (w[k] - w_bar) * (wx[k] - wb_xb);
        sum += x_bar * x_bar * (w[k] - w_bar) * (w[k] - w_bar);
    }
    (n * sum) / ((n - 1.0) * sum_w * sum_w)
}
