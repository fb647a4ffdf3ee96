//! Metropolis-Hastings reconstruction of mixture proportions through time.
//!
//! [`Reconstruction`] owns the reference curves (kernel-bootstrapped from
//! the supplied reference population), the end-member model, and the run's
//! random generator stream. [`Reconstruction::run`] walks the configured
//! time range from oldest to youngest; at each step it
//!
//! 1. evaluates every tracked ratio's best-fit and standard-error curve and
//!    skips the step entirely if any value is non-finite,
//! 2. refreshes the end-member model and flattens its concentrations and
//!    ratio errors into the working matrices,
//! 3. runs a fixed-length Markov chain over the mixture simplex with the
//!    effective-variance chi-square as the likelihood kernel,
//! 4. summarizes the post-burn-in chain into posterior percentiles and
//!    emits one report record.
//!
//! Each time step restarts its chain from the uniform mixture; no chain
//! state is carried across steps.

use nalgebra::SVector;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::{debug, info};

use crate::config::{ReconConfig, ReportMode};
use crate::endmember::{build_model, EndmemberModel, MemberDefinition};
use crate::error::{ConfigError, ReconError};
use crate::misfit::chi_square;
use crate::report::{RatioStepRecord, ReconReport, StepRecord};
use crate::samples::{FieldRegistry, RatioSpec, SampleSet};
use crate::statistics::{percentile_interpolated, ratio_bootstrap, BootstrapCurves};

/// Upper bound on redraws of one simplex proposal. Exhaustion signals a
/// pathological jump size, reported as [`ReconError::DegenerateProposal`].
pub const MAX_PROPOSAL_RETRIES: usize = 1_000_000;

/// Emit a progress event at least every this many time units.
const PROGRESS_INTERVAL: f64 = 100.0;

/// Fraction of the chain discarded as burn-in (one fifth).
const BURN_IN_DIVISOR: usize = 5;

struct ChainRun<const N: usize> {
    best: SVector<f64, N>,
    acceptances: usize,
}

/// A fully assembled reconstruction: reference curves, end-member model,
/// and generator stream.
pub struct Reconstruction {
    config: ReconConfig,
    registry: FieldRegistry,
    ratios: Vec<RatioSpec>,
    report_ratios: Vec<RatioSpec>,
    reference: Vec<BootstrapCurves>,
    model: Box<dyn EndmemberModel>,
    rng: Xoshiro256PlusPlus,
}

impl Reconstruction {
    /// Validate the configuration, build the end-member model, and
    /// bootstrap one reference curve pair per tracked ratio from the
    /// reference population.
    ///
    /// This is the expensive construction step: with the default 10,000
    /// bootstrap iterations each ratio is refitted that many times.
    pub fn new(
        config: ReconConfig,
        registry: FieldRegistry,
        reference_samples: &SampleSet,
        members: Vec<MemberDefinition>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let ratios = config
            .ratios
            .iter()
            .map(|name| RatioSpec::parse(name, &registry))
            .collect::<Result<Vec<_>, _>>()?;
        let report_ratios = match config.report_mode {
            ReportMode::Endmembers => Vec::new(),
            ReportMode::Ratios => config
                .report_ratios
                .iter()
                .map(|name| RatioSpec::parse(name, &registry))
                .collect::<Result<Vec<_>, _>>()?,
        };

        let mut model = build_model(&config, members, registry.len())?;
        for spec in &ratios {
            model.register_ratio_error(spec.clone());
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
        let mut reference = Vec::with_capacity(ratios.len());
        for spec in &ratios {
            let (ages, a, b) =
                reference_samples.extract_triples(spec.numerator, spec.denominator);
            info!(
                ratio = %spec.name,
                samples = ages.len(),
                "bootstrapping reference curve"
            );
            reference.push(ratio_bootstrap(
                &ages,
                &a,
                &b,
                config.bootstrap_kernel_width,
                config.bootstrap_iterations,
                &mut rng,
            ));
        }

        Ok(Self {
            config,
            registry,
            ratios,
            report_ratios,
            reference,
            model,
            rng,
        })
    }

    /// The configuration this reconstruction was built with.
    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    /// Number of end-member categories.
    pub fn member_count(&self) -> usize {
        self.model.member_count()
    }

    /// The bootstrapped reference curves, one pair per tracked ratio.
    pub fn reference_curves(&self) -> &[BootstrapCurves] {
        &self.reference
    }

    /// Tracked ratios in configuration order.
    pub fn ratios(&self) -> &[RatioSpec] {
        &self.ratios
    }

    /// Forward mixing calculation: the value of every tracked ratio for the
    /// given mixture proportions at time `t`.
    pub fn forward_model(&mut self, t: f64, proportions: &[f64]) -> Vec<f64> {
        self.model.recalculate_for_time(t);
        self.ratios
            .iter()
            .map(|spec| {
                let mut sum_a = 0.0;
                let mut sum_b = 0.0;
                for (j, &p) in proportions.iter().enumerate() {
                    let reference = self.model.reference(j);
                    sum_a += p * reference.get(spec.numerator);
                    sum_b += p * reference.get(spec.denominator);
                }
                sum_a / sum_b
            })
            .collect()
    }

    /// Run the full reconstruction, oldest time step first.
    pub fn run(&mut self) -> Result<ReconReport, ReconError> {
        match self.model.member_count() {
            2 => self.run_impl::<2>(),
            3 => self.run_impl::<3>(),
            4 => self.run_impl::<4>(),
            5 => self.run_impl::<5>(),
            n => Err(ConfigError::UnsupportedMemberCount(n).into()),
        }
    }

    fn run_impl<const N: usize>(&mut self) -> Result<ReconReport, ReconError> {
        let n_ratios = self.ratios.len();
        let iterations = self.config.chain_iterations;
        let burn = iterations / BURN_IN_DIVISOR;
        let log_acceptance = self.config.log_acceptance;

        // Per-step working arrays, allocated once and reused; the chain
        // record is the dominant memory cost and is pre-sized.
        let mut obs = vec![0.0; n_ratios];
        let mut obs_err = vec![0.0; n_ratios];
        let mut num = vec![0.0; N * n_ratios];
        let mut den = vec![0.0; N * n_ratios];
        let mut err = vec![0.0; N * n_ratios];
        let mut chain: Vec<SVector<f64, N>> = vec![SVector::zeros(); iterations];
        let mut sorted: Vec<f64> = Vec::with_capacity(iterations - burn);

        let mut member_steps: Vec<StepRecord> = Vec::new();
        let mut ratio_steps: Vec<RatioStepRecord> = Vec::new();

        info!(
            members = N,
            ratios = n_ratios,
            iterations,
            "reconstruction started"
        );

        let mut last_report = f64::INFINITY;
        let mut t = self.config.time_start;
        while t > self.config.time_end {
            // Missing reference data at this time: skip the step entirely.
            let mut usable = true;
            for (i, curves) in self.reference.iter().enumerate() {
                obs[i] = curves.best_fit.evaluate(t);
                obs_err[i] = curves.std_error.evaluate(t);
                if !(obs[i].is_finite() && obs_err[i].is_finite()) {
                    usable = false;
                    break;
                }
            }
            if !usable {
                t -= self.config.time_step;
                continue;
            }

            if last_report - t > PROGRESS_INTERVAL - 0.001 {
                info!(time = t, "reconstructing");
                last_report = t;
            }

            self.model.recalculate_for_time(t);
            for (i, spec) in self.ratios.iter().enumerate() {
                for j in 0..N {
                    let reference = self.model.reference(j);
                    num[i * N + j] = reference.get(spec.numerator);
                    den[i * N + j] = reference.get(spec.denominator);
                    err[i * N + j] = self.model.ratio_err(j, i);
                }
            }

            let run = run_chain::<N, _>(
                &mut chain,
                &obs,
                &obs_err,
                &num,
                &den,
                &err,
                self.config.jump_size,
                t,
                &mut self.rng,
            )?;
            let acceptance_ratio = run.acceptances as f64 / iterations as f64;
            debug!(time = t, acceptance = acceptance_ratio, "chain finished");

            // With acceptance logging on, a chain that never moved is
            // dropped from the report.
            if log_acceptance && acceptance_ratio == 0.0 {
                t -= self.config.time_step;
                continue;
            }

            match self.config.report_mode {
                ReportMode::Endmembers => {
                    let mut p025 = Vec::with_capacity(N);
                    let mut p975 = Vec::with_capacity(N);
                    for idx in 0..N {
                        sorted.clear();
                        sorted.extend(chain[burn..].iter().map(|state| state[idx]));
                        sorted.sort_by(|a, b| a.total_cmp(b));
                        p025.push(percentile_interpolated(&sorted, 2.5));
                        p975.push(percentile_interpolated(&sorted, 97.5));
                    }
                    let mixed = (0..self.registry.len())
                        .map(|field| {
                            (0..N)
                                .map(|j| run.best[j] * self.model.reference(j).values()[field])
                                .sum::<f64>()
                        })
                        .collect();
                    member_steps.push(StepRecord {
                        time: t,
                        acceptance_ratio,
                        best: run.best.iter().copied().collect(),
                        p025,
                        p975,
                        mixed,
                    });
                }
                ReportMode::Ratios => {
                    let mut best = Vec::with_capacity(self.report_ratios.len());
                    let mut p025 = Vec::with_capacity(self.report_ratios.len());
                    let mut p975 = Vec::with_capacity(self.report_ratios.len());
                    for spec in &self.report_ratios {
                        let mut cnum = [0.0; N];
                        let mut cden = [0.0; N];
                        for j in 0..N {
                            let reference = self.model.reference(j);
                            cnum[j] = reference.get(spec.numerator);
                            cden[j] = reference.get(spec.denominator);
                        }
                        let ratio_value = |state: &SVector<f64, N>| {
                            let mut sum_a = 0.0;
                            let mut sum_b = 0.0;
                            for j in 0..N {
                                sum_a += state[j] * cnum[j];
                                sum_b += state[j] * cden[j];
                            }
                            sum_a / sum_b
                        };
                        sorted.clear();
                        sorted.extend(chain[burn..].iter().map(|state| ratio_value(state)));
                        sorted.sort_by(|a, b| a.total_cmp(b));
                        p025.push(percentile_interpolated(&sorted, 2.5));
                        p975.push(percentile_interpolated(&sorted, 97.5));
                        best.push(ratio_value(&run.best));
                    }
                    ratio_steps.push(RatioStepRecord {
                        time: t,
                        acceptance_ratio,
                        best,
                        p025,
                        p975,
                    });
                }
            }

            t -= self.config.time_step;
        }

        let report = match self.config.report_mode {
            ReportMode::Endmembers => ReconReport::Endmembers {
                members: (0..N).map(|j| self.model.member_name(j).to_string()).collect(),
                fields: self.registry.names().to_vec(),
                log_acceptance,
                steps: member_steps,
            },
            ReportMode::Ratios => ReconReport::Ratios {
                ratios: self.report_ratios.iter().map(|r| r.name.clone()).collect(),
                log_acceptance,
                steps: ratio_steps,
            },
        };
        info!(steps = report.len(), "reconstruction finished");
        Ok(report)
    }
}

/// Draw one simplex proposal around `cur`: components 1..N−1 move by a
/// Gaussian jump, component 0 takes the remainder. Redraws until every
/// component lies in [0, 1], bounded by [`MAX_PROPOSAL_RETRIES`].
fn propose<const N: usize, R: Rng + ?Sized>(
    cur: &SVector<f64, N>,
    jump: f64,
    time: f64,
    rng: &mut R,
) -> Result<SVector<f64, N>, ReconError> {
    'retry: for _ in 0..MAX_PROPOSAL_RETRIES {
        let mut next = SVector::<f64, N>::zeros();
        let mut sum = 0.0;
        for k in 1..N {
            let z: f64 = rng.sample(StandardNormal);
            next[k] = cur[k] + jump * z;
            sum += next[k];
        }
        next[0] = 1.0 - sum;
        for k in 0..N {
            if !(0.0..=1.0).contains(&next[k]) {
                continue 'retry;
            }
        }
        return Ok(next);
    }
    Err(ReconError::DegenerateProposal { time })
}

/// One fixed-length Markov chain from the uniform mixture. The current
/// state is recorded every iteration, accepted or not.
#[allow(clippy::too_many_arguments)]
fn run_chain<const N: usize, R: Rng + ?Sized>(
    chain: &mut [SVector<f64, N>],
    obs: &[f64],
    obs_err: &[f64],
    num: &[f64],
    den: &[f64],
    err: &[f64],
    jump: f64,
    time: f64,
    rng: &mut R,
) -> Result<ChainRun<N>, ReconError> {
    let initial = SVector::<f64, N>::repeat(1.0 / N as f64);
    let mut best = initial;
    let mut best_chi2 = chi_square(&initial, obs, obs_err, num, den, err);
    let mut cur = initial;
    let mut cur_chi2 = best_chi2;
    let mut acceptances = 0usize;

    for state in chain.iter_mut() {
        let proposal = propose(&cur, jump, time, rng)?;
        let new_chi2 = chi_square(&proposal, obs, obs_err, num, den, err);
        // Metropolis criterion on the raw chi-square difference; the
        // exponent is deliberately not halved.
        let ratio = (cur_chi2 - new_chi2).exp();
        if ratio > rng.random::<f64>() {
            cur = proposal;
            cur_chi2 = new_chi2;
            acceptances += 1;
            if cur_chi2 < best_chi2 {
                best_chi2 = cur_chi2;
                best = cur;
            }
        }
        *state = cur;
    }

    Ok(ChainRun { best, acceptances })
}
