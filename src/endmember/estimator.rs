//! Shared weighted-mean reference estimator.
//!
//! Given one member's sample population and a parallel vector of applied
//! weights, element means are weight-averaged ignoring missing values
//! per-element, and each registered ratio's variance comes from the Cochran
//! weighted-ratio-of-means estimator with the sample's numerator as the
//! weight-value product and `weight × denominator` as the effective weight.
//!
//! With all-unit weights this reduces to the plain per-element mean and the
//! unweighted Cochran estimator, which is how the interpolating policy uses
//! it. A field (or ratio) with no usable observations yields NaN, which
//! propagates through the misfit into a skipped time step.

use crate::samples::{FieldId, RatioSpec, SampleSet};
use crate::statistics::weighted_ratio_variance;

use super::Composition;

pub(crate) fn estimate_reference(
    set: &SampleSet,
    weights: &[f64],
    ratios: &[RatioSpec],
    reference: &mut Composition,
    ratio_err: &mut [f64],
) {
    debug_assert_eq!(weights.len(), set.len());
    debug_assert_eq!(ratio_err.len(), ratios.len());

    for field in 0..set.field_count() {
        let column = set.column(FieldId(field));
        let mut sum = 0.0;
        let mut norm = 0.0;
        for (i, &value) in column.iter().enumerate() {
            if value.is_finite() {
                sum += weights[i] * value;
                norm += weights[i];
            }
        }
        reference.values[field] = sum / norm;
    }

    for (r, spec) in ratios.iter().enumerate() {
        let numerators = set.column(spec.numerator);
        let denominators = set.column(spec.denominator);
        let var = weighted_ratio_variance(
            numerators
                .iter()
                .zip(denominators)
                .zip(weights)
                .map(|((&a, &b), &w)| (a, w * b)),
        );
        ratio_err[r] = var.sqrt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::FieldRegistry;

    fn setup() -> (FieldRegistry, SampleSet) {
        let mut r = FieldRegistry::new();
        r.register("Th");
        r.register("Sc");
        let set = SampleSet::for_registry(&r);
        (r, set)
    }

    #[test]
    fn test_unit_weights_give_plain_means() {
        let (r, mut set) = setup();
        set.push(100.0, &[10.0, 1.0]);
        set.push(200.0, &[20.0, 1.0]);
        set.push(300.0, &[f64::NAN, 4.0]);

        let ratios = vec![RatioSpec::parse("Th/Sc", &r).unwrap()];
        let mut reference = Composition::nan(2);
        let mut errs = vec![0.0];
        estimate_reference(&set, &[1.0; 3], &ratios, &mut reference, &mut errs);

        let th = r.resolve("Th").unwrap();
        let sc = r.resolve("Sc").unwrap();
        // Th ignores its missing entry; Sc averages all three.
        assert!((reference.get(th) - 15.0).abs() < 1e-12);
        assert!((reference.get(sc) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_cochran_error_matches_hand_worked_case() {
        let (r, mut set) = setup();
        // Ratio values 10 and 20 with unit denominators: the hand-worked
        // Cochran case with variance 25, standard error 5.
        set.push(100.0, &[10.0, 1.0]);
        set.push(200.0, &[20.0, 1.0]);

        let ratios = vec![RatioSpec::parse("Th/Sc", &r).unwrap()];
        let mut reference = Composition::nan(2);
        let mut errs = vec![0.0];
        estimate_reference(&set, &[1.0, 1.0], &ratios, &mut reference, &mut errs);
        assert!((errs[0] - 5.0).abs() < 1e-12, "expected 5, got {}", errs[0]);
    }

    #[test]
    fn test_zero_weights_exclude_samples() {
        let (r, mut set) = setup();
        set.push(100.0, &[10.0, 1.0]);
        set.push(200.0, &[20.0, 1.0]);
        set.push(300.0, &[999.0, 1.0]);

        let ratios = vec![RatioSpec::parse("Th/Sc", &r).unwrap()];
        let mut reference = Composition::nan(2);
        let mut errs = vec![0.0];
        estimate_reference(&set, &[1.0, 1.0, 0.0], &ratios, &mut reference, &mut errs);

        let th = r.resolve("Th").unwrap();
        assert!((reference.get(th) - 15.0).abs() < 1e-12);
        assert!((errs[0] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_window_propagates_nan() {
        let (r, mut set) = setup();
        set.push(100.0, &[10.0, 1.0]);

        let ratios = vec![RatioSpec::parse("Th/Sc", &r).unwrap()];
        let mut reference = Composition::nan(2);
        let mut errs = vec![0.0];
        estimate_reference(&set, &[0.0], &ratios, &mut reference, &mut errs);

        let th = r.resolve("Th").unwrap();
        assert!(reference.get(th).is_nan(), "no weight mass means no estimate");
        assert!(errs[0].is_nan());
    }
}
