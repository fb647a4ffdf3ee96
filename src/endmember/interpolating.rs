//! Interpolating end-member policy: two fixed regimes blended over a
//! transition window.
//!
//! Each member carries an "old" and a "young" sample population. Both are
//! reduced to reference compositions once, lazily, on the first
//! recalculation (unit weights: the plain mean / unweighted Cochran
//! estimator). For a requested time t the blend parameter f runs from 0
//! (old regime, early times) to 1 (young regime, recent times) linearly
//! across a window of configurable centre and width.
//!
//! Element values blend linearly. Ratio standard errors combine in
//! quadrature, each regime weighted by its share of the blended denominator
//! mass: w_old = B_old·(1−f), w_young = B_young·f.
//!
//! A time-invariant member is pinned to its old-regime reference.

use crate::samples::RatioSpec;
use crate::samples::SampleSet;

use super::estimator::estimate_reference;
use super::{Composition, EndmemberModel, MemberSpec, ModelCore};

/// End-member model blending two fixed regimes across a transition window.
pub struct InterpolatingModel {
    core: ModelCore,
    old_sets: Vec<SampleSet>,
    young_sets: Vec<SampleSet>,
    old_refs: Vec<Composition>,
    young_refs: Vec<Composition>,
    old_err: Vec<Vec<f64>>,
    young_err: Vec<Vec<f64>>,
    transition_centre: f64,
    transition_width: f64,
    loaded: bool,
}

impl InterpolatingModel {
    /// Build the model from per-member regime populations.
    pub fn new(
        specs: &[MemberSpec],
        old_sets: Vec<SampleSet>,
        young_sets: Vec<SampleSet>,
        transition_centre: f64,
        transition_width: f64,
        field_count: usize,
    ) -> Self {
        let n = specs.len();
        Self {
            core: ModelCore::new(specs, field_count),
            old_sets,
            young_sets,
            old_refs: vec![Composition::nan(field_count); n],
            young_refs: vec![Composition::nan(field_count); n],
            old_err: vec![Vec::new(); n],
            young_err: vec![Vec::new(); n],
            transition_centre,
            transition_width,
            loaded: false,
        }
    }

    /// Fraction of the young regime present at time `t`: 0 above the
    /// transition window, 1 below it, a linear ramp inside.
    pub fn transition_parameter(&self, t: f64) -> f64 {
        let start = self.transition_centre + self.transition_width / 2.0;
        let end = self.transition_centre - self.transition_width / 2.0;
        if t < start {
            if t < end {
                1.0
            } else {
                let f = (start - t) / (start - end);
                f.min(1.0)
            }
        } else {
            0.0
        }
    }

    fn load_regimes(&mut self) {
        let n = self.core.member_count();
        for j in 0..n {
            self.old_err[j].resize(self.core.ratios.len(), 0.0);
            self.young_err[j].resize(self.core.ratios.len(), 0.0);
            let unit_old = vec![1.0; self.old_sets[j].len()];
            estimate_reference(
                &self.old_sets[j],
                &unit_old,
                &self.core.ratios,
                &mut self.old_refs[j],
                &mut self.old_err[j],
            );
            let unit_young = vec![1.0; self.young_sets[j].len()];
            estimate_reference(
                &self.young_sets[j],
                &unit_young,
                &self.core.ratios,
                &mut self.young_refs[j],
                &mut self.young_err[j],
            );
        }
    }
}

impl EndmemberModel for InterpolatingModel {
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
            self.load_regimes();
            self.loaded = true;
        }

        let f = self.transition_parameter(t);
        for j in 0..self.core.member_count() {
            if self.core.invariant[j] {
                self.core.references[j]
                    .values
                    .copy_from_slice(&self.old_refs[j].values);
                self.core.ratio_err[j].copy_from_slice(&self.old_err[j]);
                continue;
            }

            for field in 0..self.core.field_count {
                let old = self.old_refs[j].values[field];
                let young = self.young_refs[j].values[field];
                self.core.references[j].values[field] = (1.0 - f) * old + f * young;
            }

            for (i, spec) in self.core.ratios.iter().enumerate() {
                let err_old = self.old_err[j][i];
                let err_young = self.young_err[j][i];
                let b_old = self.old_refs[j].get(spec.denominator);
                let b_young = self.young_refs[j].get(spec.denominator);
                let w_old = b_old * (1.0 - f);
                let w_young = b_young * f;
                let w_sum = w_old + w_young;
                let share_old = w_old / w_sum;
                let share_young = w_young / w_sum;
                self.core.ratio_err[j][i] = (share_old * share_old * err_old * err_old
                    + share_young * share_young * err_young * err_young)
                    .sqrt();
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::{FieldRegistry, RatioSpec};

    fn registry() -> FieldRegistry {
        let mut r = FieldRegistry::new();
        r.register("Th");
        r.register("Sc");
        r
    }

    /// One member whose old regime has Th = 10 and young regime Th = 20,
    /// constant Sc = 1.
    fn model(registry: &FieldRegistry, invariant: bool) -> InterpolatingModel {
        let mut old = SampleSet::for_registry(registry);
        old.push(3500.0, &[9.0, 1.0]);
        old.push(3600.0, &[11.0, 1.0]);
        let mut young = SampleSet::for_registry(registry);
        young.push(100.0, &[19.0, 1.0]);
        young.push(200.0, &[21.0, 1.0]);

        let spec = if invariant {
            MemberSpec::invariant("M")
        } else {
            MemberSpec::new("M")
        };
        let mut m = InterpolatingModel::new(
            &[spec.clone(), MemberSpec::new("F")],
            vec![old.clone(), old],
            vec![young.clone(), young],
            2500.0,
            500.0,
            registry.len(),
        );
        m.register_ratio_error(RatioSpec::parse("Th/Sc", registry).unwrap());
        m
    }

    #[test]
    fn test_transition_parameter_clamps() {
        let r = registry();
        let m = model(&r, false);
        // Window is [2250, 2750].
        assert_eq!(m.transition_parameter(4000.0), 0.0);
        assert_eq!(m.transition_parameter(2750.0), 0.0);
        assert_eq!(m.transition_parameter(2000.0), 1.0);
        assert!((m.transition_parameter(2500.0) - 0.5).abs() < 1e-12);
        assert!((m.transition_parameter(2625.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_pure_regimes_outside_window() {
        let r = registry();
        let th = r.resolve("Th").unwrap();
        let mut m = model(&r, false);

        m.recalculate_for_time(4000.0);
        assert!((m.reference(0).get(th) - 10.0).abs() < 1e-12, "old regime");

        m.recalculate_for_time(100.0);
        assert!((m.reference(0).get(th) - 20.0).abs() < 1e-12, "young regime");
    }

    #[test]
    fn test_midpoint_blend() {
        let r = registry();
        let th = r.resolve("Th").unwrap();
        let mut m = model(&r, false);
        m.recalculate_for_time(2500.0);
        assert!((m.reference(0).get(th) - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_invariant_member_never_changes() {
        let r = registry();
        let th = r.resolve("Th").unwrap();
        let mut m = model(&r, true);
        m.recalculate_for_time(100.0);
        assert!(
            (m.reference(0).get(th) - 10.0).abs() < 1e-12,
            "invariant member stays in its old regime"
        );
        // The companion member still blends.
        assert!((m.reference(1).get(th) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_error_quadrature_at_pure_regimes() {
        let r = registry();
        let mut m = model(&r, false);
        m.recalculate_for_time(4000.0);
        let old_err = m.ratio_err(0, 0);
        m.recalculate_for_time(100.0);
        let young_err = m.ratio_err(0, 0);
        // Both regimes have two samples with unit denominators and values
        // spread by 2, so the Cochran error is the same on both sides.
        assert!(old_err.is_finite() && young_err.is_finite());
        assert!((old_err - young_err).abs() < 1e-9);
    }
}
