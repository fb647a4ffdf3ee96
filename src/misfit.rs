//! Effective-variance chi-square misfit.
//!
//! For a candidate mixture and one time step's reference data, each tracked
//! ratio contributes `(model − observed)² / var` where the variance folds in
//! both the reference-curve uncertainty and every end-member's own ratio
//! uncertainty, the latter weighted by that member's fractional share of the
//! mixture's denominator mass:
//!
//! ```text
//! wSum    = Σⱼ mixⱼ·denᵢⱼ
//! modelᵢ  = Σⱼ mixⱼ·numᵢⱼ / wSum
//! varᵢ    = sErrᵢ² + Σⱼ (mixⱼ·denᵢⱼ / wSum)² · errᵢⱼ²
//! chi²    = Σᵢ (modelᵢ − obsᵢ)² / varᵢ
//! ```
//!
//! This is a generalized chi-square with error in both axes folded into the
//! denominator, not ordinary weighted least squares. All inputs must be
//! finite; the reconstruction loop skips a time step before ever calling
//! this with missing reference data.

use nalgebra::SVector;

/// Chi-square of a mixture against one time step's reference ratios.
///
/// `obs` and `obs_err` hold one entry per ratio; `num`, `den` and `err` are
/// row-major `[ratio][member]` flats of the end-member numerator and
/// denominator concentrations and ratio standard errors.
pub fn chi_square<const N: usize>(
    mix: &SVector<f64, N>,
    obs: &[f64],
    obs_err: &[f64],
    num: &[f64],
    den: &[f64],
    err: &[f64],
) -> f64 {
    let n_ratios = obs.len();
    let mut acc = 0.0;
    for i in 0..n_ratios {
        let row = i * N;
        let mut weighted_den = [0.0; N];
        let mut w_sum = 0.0;
        let mut model = 0.0;
        for j in 0..N {
            model += mix[j] * num[row + j];
            weighted_den[j] = mix[j] * den[row + j];
            w_sum += weighted_den[j];
        }
        model /= w_sum;

        // All errors are standard deviations, hence the squares.
        let misfit = (model - obs[i]) * (model - obs[i]);
        let mut var = obs_err[i] * obs_err[i];
        for j in 0..N {
            let share = weighted_den[j] / w_sum;
            var += share * share * err[row + j] * err[row + j];
        }
        acc += misfit / var;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::SVector;

    #[test]
    fn test_pure_endmember_reduces_to_its_ratio() {
        // 100% weight on member 1: model must be num/den of that member
        // exactly, and the variance collapses to sErr² + err².
        let mix = SVector::<f64, 2>::from([0.0, 1.0]);
        let obs = [2.0];
        let obs_err = [0.5];
        let num = [10.0, 6.0];
        let den = [2.0, 3.0];
        let err = [0.1, 0.2];

        let chi2 = chi_square(&mix, &obs, &obs_err, &num, &den, &err);

        let model = 6.0 / 3.0;
        let var = 0.5 * 0.5 + 0.2 * 0.2;
        let expected = (model - 2.0) * (model - 2.0) / var;
        assert!((chi2 - expected).abs() < 1e-12);
        // model == obs here, so the misfit vanishes entirely.
        assert!(chi2.abs() < 1e-12);
    }

    #[test]
    fn test_pure_endmember_nonzero_misfit() {
        let mix = SVector::<f64, 2>::from([1.0, 0.0]);
        let obs = [3.0];
        let obs_err = [1.0];
        let num = [10.0, 6.0];
        let den = [2.0, 3.0];
        let err = [0.5, 0.2];

        let chi2 = chi_square(&mix, &obs, &obs_err, &num, &den, &err);
        let model = 10.0 / 2.0; // 5.0
        let var = 1.0 + 0.25;
        assert!((chi2 - (model - 3.0) * (model - 3.0) / var).abs() < 1e-12);
    }

    #[test]
    fn test_even_blend_of_identical_members() {
        // Two identical members: any mixture gives the same model value.
        let obs = [4.0];
        let obs_err = [1.0];
        let num = [8.0, 8.0];
        let den = [2.0, 2.0];
        let err = [0.0, 0.0];

        let even = SVector::<f64, 2>::from([0.5, 0.5]);
        let skew = SVector::<f64, 2>::from([0.9, 0.1]);
        let c1 = chi_square(&even, &obs, &obs_err, &num, &den, &err);
        let c2 = chi_square(&skew, &obs, &obs_err, &num, &den, &err);
        assert!((c1 - c2).abs() < 1e-12);
        assert!((c1 - 0.0).abs() < 1e-12, "model 4.0 matches obs 4.0");
    }

    #[test]
    fn test_multiple_ratios_accumulate() {
        let mix = SVector::<f64, 2>::from([0.5, 0.5]);
        let obs = [1.0, 2.0];
        let obs_err = [1.0, 1.0];
        // Ratio 0: members (2/1) and (2/1); ratio 1: (4/1) and (4/1).
        let num = [2.0, 2.0, 4.0, 4.0];
        let den = [1.0, 1.0, 1.0, 1.0];
        let err = [0.0; 4];

        let chi2 = chi_square(&mix, &obs, &obs_err, &num, &den, &err);
        // Ratio 0: model 2, misfit 1; ratio 1: model 4, misfit 4.
        assert!((chi2 - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_denominator_share_weighting() {
        // Member 0 carries 4x the denominator mass of member 1 at equal
        // proportions, so its ratio error dominates the variance.
        let mix = SVector::<f64, 2>::from([0.5, 0.5]);
        let obs = [1.0];
        let obs_err = [0.0];
        let num = [4.0, 1.0];
        let den = [4.0, 1.0];
        let err = [1.0, 1.0];

        let chi2 = chi_square(&mix, &obs, &obs_err, &num, &den, &err);
        // wSum = 2.5; shares 0.8 and 0.2; var = 0.64 + 0.04 = 0.68.
        // model = 2.5/2.5 = 1.0 -> misfit 0.
        assert!(chi2.abs() < 1e-12);

        let obs = [2.0];
        let chi2 = chi_square(&mix, &obs, &[0.0], &num, &den, &err);
        assert!((chi2 - 1.0 / 0.68).abs() < 1e-12);
    }
}
