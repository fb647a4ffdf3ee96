//! Bootstrap end-member policy.
//!
//! The expensive work happens exactly once, on the first recalculation:
//! every registered field of every time-varying member gets a
//! kernel-smoothed best-fit curve (single iteration, no resampling), and
//! every tracked ratio gets a full ratio bootstrap whose standard-error
//! curve supplies the per-time ratio uncertainty. Subsequent
//! recalculations only evaluate the cached curves at t.
//!
//! Time-invariant members skip the curves and are estimated once with the
//! shared weighted-mean estimator over their full population.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::info;

use crate::samples::{age_uniform_weights, FieldId, RatioSpec, SampleSet};
use crate::statistics::{elemental_bootstrap, ratio_bootstrap, BootstrapCurves};

use super::estimator::estimate_reference;
use super::{Composition, EndmemberModel, MemberSpec, ModelCore};

/// End-member model backed by precomputed bootstrap curves.
pub struct BootstrapModel {
    core: ModelCore,
    sets: Vec<SampleSet>,
    kernel_width: f64,
    iterations: usize,
    rng: Xoshiro256PlusPlus,
    /// `[member][field]` best-fit curves; empty until the first recalculation.
    element_curves: Vec<Vec<BootstrapCurves>>,
    /// `[member][ratio]` bootstrap curves.
    ratio_curves: Vec<Vec<BootstrapCurves>>,
    loaded: bool,
}

impl BootstrapModel {
    /// Build the model. The heavy bootstraps are deferred to the first
    /// recalculation so that ratios can still be registered.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        specs: &[MemberSpec],
        mut sets: Vec<SampleSet>,
        kernel_width: f64,
        iterations: usize,
        age_bin_width: f64,
        seed: u64,
        field_count: usize,
    ) -> Self {
        for set in &mut sets {
            let weights = age_uniform_weights(set, age_bin_width);
            set.set_weights(weights);
        }
        Self {
            core: ModelCore::new(specs, field_count),
            sets,
            kernel_width,
            iterations,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            element_curves: Vec::new(),
            ratio_curves: Vec::new(),
            loaded: false,
        }
    }

    fn generate_bootstraps(&mut self) {
        let n = self.core.member_count();
        self.element_curves = Vec::with_capacity(n);
        self.ratio_curves = Vec::with_capacity(n);
        for j in 0..n {
            let mut per_field = Vec::new();
            let mut per_ratio = Vec::new();
            if !self.core.invariant[j] {
                info!(member = %self.core.names[j], "bootstrapping end-member curves");
                for field in 0..self.core.field_count {
                    let (ages, values) = self.sets[j].extract_pairs(FieldId(field));
                    // Only the best fit is needed for elements, so a single
                    // iteration suffices.
                    per_field.push(elemental_bootstrap(
                        &ages,
                        &values,
                        self.kernel_width,
                        1,
                        &mut self.rng,
                    ));
                }
                for spec in &self.core.ratios {
                    let (ages, a, b) =
                        self.sets[j].extract_triples(spec.numerator, spec.denominator);
                    per_ratio.push(ratio_bootstrap(
                        &ages,
                        &a,
                        &b,
                        self.kernel_width,
                        self.iterations,
                        &mut self.rng,
                    ));
                }
            }
            self.element_curves.push(per_field);
            self.ratio_curves.push(per_ratio);
        }

        // Invariant members: classic estimate over the full population.
        for j in 0..n {
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
    }
}

impl EndmemberModel for BootstrapModel {
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
        if !self.loaded {
            self.generate_bootstraps();
            self.loaded = true;
        }
        for j in 0..self.core.member_count() {
            if self.core.invariant[j] {
                continue;
            }
            for field in 0..self.core.field_count {
                self.core.references[j].values[field] =
                    self.element_curves[j][field].best_fit.evaluate(t);
            }
            for r in 0..self.core.ratios.len() {
                self.core.ratio_err[j][r] = self.ratio_curves[j][r].std_error.evaluate(t);
            }
        }
    }

    fn reference(&self, member: usize) -> &Composition {
        &self.core.references[member]
    }

    fn ratio_err(&self, member: usize, ratio: usize) -> f64 {
        self.core.ratio_err[member][ratio]
    }
}
