//! Statistical infrastructure for the reconstruction engine:
//! - basic moments and percentile interpolation over f64 slices
//! - the Cochran weighted-ratio-of-means variance estimator
//! - the Gaussian-kernel-weighted bootstrap regression

mod bootstrap;
mod cochran;
mod moments;

pub use bootstrap::{
    elemental_bootstrap, ratio_bootstrap, BootstrapCurves, DEFAULT_BOOTSTRAP_ITERATIONS,
    GRID_RESOLUTION,
};
pub use cochran::weighted_ratio_variance;
pub use moments::{gaussian_weight, mean, percentile_interpolated, sample_std_dev};
