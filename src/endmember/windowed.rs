//! Windowed end-member policies: the member populations are re-weighted at
//! every recalculation and fed through the shared weighted-mean estimator.
//!
//! Three weighting kinds share the machinery:
//! - `Trailing`: samples inside [t, t + window] keep their base weight
//!   (samples more than 1000 age units older than t are down-weighted to
//!   20%); everything else is excluded. A non-finite window length means
//!   "every older sample", the cumulative variant.
//! - `Gaussian`: the base weight is replaced by a Gaussian kernel of the
//!   sample's age distance from t.
//! - `Symmetric`: samples inside [t − width, t + width] keep their base
//!   weight.
//!
//! Base weights are age-uniform normalized at construction so that densely
//! sampled epochs do not dominate the estimates.

use crate::samples::{age_uniform_weights, RatioSpec, SampleSet};
use crate::statistics::gaussian_weight;

use super::estimator::estimate_reference;
use super::{Composition, EndmemberModel, MemberSpec, ModelCore};

/// Age distance beyond which trailing-window samples are down-weighted.
const TRAILING_DAMP_DISTANCE: f64 = 1000.0;
/// Down-weighting factor for distant trailing-window samples.
const TRAILING_DAMP_FACTOR: f64 = 0.2;

/// Temporal weighting kind of a [`WindowedModel`].
#[derive(Debug, Clone, Copy)]
pub enum WindowKind {
    /// Hard window [t, t + window] with distant-sample damping; a
    /// non-finite window takes every older sample.
    Trailing {
        /// Window length in age units.
        window: f64,
    },
    /// Gaussian age-kernel weighting centred on t.
    Gaussian {
        /// Kernel standard deviation in age units.
        width: f64,
    },
    /// Hard symmetric window [t − width, t + width].
    Symmetric {
        /// Half-width in age units.
        width: f64,
    },
}

/// End-member model that re-selects its sample sub-populations per time step.
pub struct WindowedModel {
    core: ModelCore,
    sets: Vec<SampleSet>,
    kind: WindowKind,
    scratch: Vec<f64>,
    invariant_loaded: bool,
}

impl WindowedModel {
    /// Build the model; base weights are age-uniform normalized with
    /// `age_bin_width`.
    pub fn new(
        specs: &[MemberSpec],
        mut sets: Vec<SampleSet>,
        kind: WindowKind,
        age_bin_width: f64,
        field_count: usize,
    ) -> Self {
        for set in &mut sets {
            let weights = age_uniform_weights(set, age_bin_width);
            set.set_weights(weights);
        }
        Self {
            core: ModelCore::new(specs, field_count),
            sets,
            kind,
            scratch: Vec::new(),
            invariant_loaded: false,
        }
    }

    fn window_weights(&mut self, member: usize, t: f64) {
        let set = &self.sets[member];
        self.scratch.clear();
        self.scratch.reserve(set.len());
        let base = set.weights();
        match self.kind {
            WindowKind::Trailing { window } => {
                let upper = if window.is_finite() { t + window } else { f64::INFINITY };
                for (i, &age) in set.ages().iter().enumerate() {
                    let w = if age.is_finite() && age >= t && age <= upper {
                        if age >= t + TRAILING_DAMP_DISTANCE {
                            base[i] * TRAILING_DAMP_FACTOR
                        } else {
                            base[i]
                        }
                    } else {
                        0.0
                    };
                    self.scratch.push(w);
                }
            }
            WindowKind::Gaussian { width } => {
                for &age in set.ages() {
                    let w = if age.is_finite() {
                        gaussian_weight(age, t, width)
                    } else {
                        0.0
                    };
                    self.scratch.push(w);
                }
            }
            WindowKind::Symmetric { width } => {
                for (i, &age) in set.ages().iter().enumerate() {
                    let w = if age.is_finite() && age >= t - width && age <= t + width {
                        base[i]
                    } else {
                        0.0
                    };
                    self.scratch.push(w);
                }
            }
        }
    }
}

impl EndmemberModel for WindowedModel {
    fn member_count(&self) -> usize {
        self.core.member_count()
    }

    fn member_name(&self, member: usize) -> &str {
        &self.core.names[member]
    }

    fn register_ratio_error(&mut self, ratio: RatioSpec) {
        self.core.register_ratio(ratio);
    }

    fn ratios(&self) -> &[RatioSpec] {
        &self.core.ratios
    }

    fn recalculate_for_time(&mut self, t: f64) {
        for j in 0..self.core.member_count() {
            if self.core.invariant[j] {
                continue;
            }
            self.window_weights(j, t);
            let scratch = std::mem::take(&mut self.scratch);
            estimate_reference(
                &self.sets[j],
                &scratch,
                &self.core.ratios,
                &mut self.core.references[j],
                &mut self.core.ratio_err[j],
            );
            self.scratch = scratch;
        }

        // Invariant members are estimated once, over their full population
        // with base weights.
        if !self.invariant_loaded {
            for j in 0..self.core.member_count() {
                if self.core.invariant[j] {
                    let weights = self.sets[j].weights().to_vec();
                    estimate_reference(
                        &self.sets[j],
                        &weights,
                        &self.core.ratios,
                        &mut self.core.references[j],
                        &mut self.core.ratio_err[j],
                    );
                }
            }
            self.invariant_loaded = true;
        }
    }

    fn reference(&self, member: usize) -> &Composition {
        &self.core.references[member]
    }

    fn ratio_err(&self, member: usize, ratio: usize) -> f64 {
        self.core.ratio_err[member][ratio]
    }
}
