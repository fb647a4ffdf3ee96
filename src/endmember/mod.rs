//! Time-varying end-member composition models.
//!
//! An [`EndmemberModel`] supplies, for any requested time t, one reference
//! composition per end-member category plus the standard error of every
//! registered ratio. Several temporal-weighting policies share the one
//! contract and are selected at construction through a configuration enum;
//! an unrecognized policy or an unsupported member count is a hard
//! configuration error, never a silent default.
//!
//! Policies:
//! - [`InterpolatingModel`]: blends two fixed regimes ("old" and "young")
//!   across a transition window.
//! - [`WindowedModel`]: re-weights each member's full sample population at
//!   every recalculation (trailing window, Gaussian age kernel, or
//!   symmetric hard window).
//! - [`BootstrapModel`]: precomputes kernel-bootstrap curves per element and
//!   ratio once, then merely interpolates them.

mod bootstrap;
mod estimator;
mod interpolating;
mod windowed;

pub use bootstrap::BootstrapModel;
pub use interpolating::InterpolatingModel;
pub use windowed::{WindowKind, WindowedModel};

use crate::config::{PolicyKind, ReconConfig};
use crate::error::ConfigError;
use crate::samples::{RatioSpec, SampleSet};

/// Smallest supported end-member count.
pub const MIN_MEMBERS: usize = 2;
/// Largest supported end-member count.
pub const MAX_MEMBERS: usize = 5;

/// Transition centre used by the modern-only policy: far enough in the
/// future that every reconstructed time sits in the young regime.
const MODERN_ONLY_CENTRE: f64 = 99_999.9;
const MODERN_ONLY_WIDTH: f64 = 0.1;

/// A reference composition: one value per registered field, NaN where no
/// finite observation was available. Shares the field shape of a sample row.
#[derive(Debug, Clone)]
pub struct Composition {
    pub(crate) values: Vec<f64>,
}

impl Composition {
    /// All-NaN composition for `field_count` fields.
    pub fn nan(field_count: usize) -> Self {
        Self {
            values: vec![f64::NAN; field_count],
        }
    }

    /// Value of one field.
    pub fn get(&self, field: crate::samples::FieldId) -> f64 {
        self.values[field.index()]
    }

    /// All values in field order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Identity of one end-member category.
#[derive(Debug, Clone)]
pub struct MemberSpec {
    /// Display name used in report headers (e.g. "K", "M", "F").
    pub name: String,
    /// Whether this category is held time-invariant (estimated once from
    /// its full/old population and never recalculated).
    pub time_invariant: bool,
}

impl MemberSpec {
    /// Convenience constructor for a time-varying member.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time_invariant: false,
        }
    }

    /// Convenience constructor for a time-invariant member.
    pub fn invariant(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time_invariant: true,
        }
    }
}

/// The sample populations backing one end-member category.
#[derive(Debug, Clone)]
pub enum MemberSamples {
    /// One full population; used by the windowed and bootstrap policies.
    Population(SampleSet),
    /// Two fixed regime populations; used by the interpolating policies.
    Regimes {
        /// Samples defining the old (early) regime.
        old: SampleSet,
        /// Samples defining the young (recent) regime.
        young: SampleSet,
    },
}

/// One end-member category: identity plus backing samples.
#[derive(Debug, Clone)]
pub struct MemberDefinition {
    /// Name and invariance flag.
    pub spec: MemberSpec,
    /// Backing sample populations.
    pub samples: MemberSamples,
}

/// Abstract contract shared by every temporal policy.
pub trait EndmemberModel {
    /// Number of end-member categories.
    fn member_count(&self) -> usize;

    /// Display name of one category.
    fn member_name(&self, member: usize) -> &str;

    /// Add a tracked ratio. Must be called before the first recalculation.
    fn register_ratio_error(&mut self, ratio: RatioSpec);

    /// Registered ratios, in registration order.
    fn ratios(&self) -> &[RatioSpec];

    /// Recompute the per-member reference state for time `t`.
    fn recalculate_for_time(&mut self, t: f64);

    /// Reference composition of one member at the last recalculated time.
    fn reference(&self, member: usize) -> &Composition;

    /// Standard error of ratio `ratio` for member `member` at the last
    /// recalculated time.
    fn ratio_err(&self, member: usize, ratio: usize) -> f64;
}

/// State shared by every policy implementation: names, invariance flags,
/// the current references, and the registered-ratio error matrix.
#[derive(Debug, Clone)]
pub(crate) struct ModelCore {
    pub names: Vec<String>,
    pub invariant: Vec<bool>,
    pub references: Vec<Composition>,
    pub ratios: Vec<RatioSpec>,
    /// `[member][ratio]` standard errors.
    pub ratio_err: Vec<Vec<f64>>,
    pub field_count: usize,
}

impl ModelCore {
    pub fn new(specs: &[MemberSpec], field_count: usize) -> Self {
        let n = specs.len();
        Self {
            names: specs.iter().map(|s| s.name.clone()).collect(),
            invariant: specs.iter().map(|s| s.time_invariant).collect(),
            references: vec![Composition::nan(field_count); n],
            ratios: Vec::new(),
            ratio_err: vec![Vec::new(); n],
            field_count,
        }
    }

    pub fn register_ratio(&mut self, ratio: RatioSpec) {
        self.ratios.push(ratio);
        for errs in &mut self.ratio_err {
            errs.push(0.0);
        }
    }

    pub fn member_count(&self) -> usize {
        self.names.len()
    }
}

fn validate_member_count(n: usize) -> Result<(), ConfigError> {
    if !(MIN_MEMBERS..=MAX_MEMBERS).contains(&n) {
        return Err(ConfigError::UnsupportedMemberCount(n));
    }
    Ok(())
}

fn split_regimes(
    members: Vec<MemberDefinition>,
) -> Result<(Vec<MemberSpec>, Vec<SampleSet>, Vec<SampleSet>), ConfigError> {
    let mut specs = Vec::with_capacity(members.len());
    let mut old_sets = Vec::with_capacity(members.len());
    let mut young_sets = Vec::with_capacity(members.len());
    for member in members {
        match member.samples {
            MemberSamples::Regimes { old, young } => {
                specs.push(member.spec);
                old_sets.push(old);
                young_sets.push(young);
            }
            MemberSamples::Population(_) => {
                return Err(ConfigError::MemberSamplesMismatch {
                    member: member.spec.name,
                    expected: "old/young regime populations",
                });
            }
        }
    }
    Ok((specs, old_sets, young_sets))
}

fn split_populations(
    members: Vec<MemberDefinition>,
) -> Result<(Vec<MemberSpec>, Vec<SampleSet>), ConfigError> {
    let mut specs = Vec::with_capacity(members.len());
    let mut sets = Vec::with_capacity(members.len());
    for member in members {
        match member.samples {
            MemberSamples::Population(set) => {
                specs.push(member.spec);
                sets.push(set);
            }
            MemberSamples::Regimes { .. } => {
                return Err(ConfigError::MemberSamplesMismatch {
                    member: member.spec.name,
                    expected: "a single full population",
                });
            }
        }
    }
    Ok((specs, sets))
}

/// Build the end-member model selected by the configuration.
///
/// Fails with a [`ConfigError`] for unsupported member counts, mismatched
/// sample populations, or field-count disagreements between populations.
pub fn build_model(
    config: &ReconConfig,
    members: Vec<MemberDefinition>,
    field_count: usize,
) -> Result<Box<dyn EndmemberModel>, ConfigError> {
    validate_member_count(members.len())?;
    for member in &members {
        let counts_ok = match &member.samples {
            MemberSamples::Population(set) => set.field_count() == field_count,
            MemberSamples::Regimes { old, young } => {
                old.field_count() == field_count && young.field_count() == field_count
            }
        };
        if !counts_ok {
            return Err(ConfigError::InvalidParameter {
                name: "members",
                message: format!(
                    "member '{}' has sample sets whose field count differs from the registry ({})",
                    member.spec.name, field_count
                ),
            });
        }
    }

    let model: Box<dyn EndmemberModel> = match config.policy {
        PolicyKind::Dual => {
            let (specs, old, young) = split_regimes(members)?;
            Box::new(InterpolatingModel::new(
                &specs,
                old,
                young,
                config.transition_centre,
                config.transition_width,
                field_count,
            ))
        }
        PolicyKind::ModernOnly => {
            let (specs, old, young) = split_regimes(members)?;
            Box::new(InterpolatingModel::new(
                &specs,
                old,
                young,
                MODERN_ONLY_CENTRE,
                MODERN_ONLY_WIDTH,
                field_count,
            ))
        }
        PolicyKind::Continuous => {
            let (specs, sets) = split_populations(members)?;
            Box::new(WindowedModel::new(
                &specs,
                sets,
                WindowKind::Trailing {
                    window: config.endmember_window,
                },
                config.age_bin_width,
                field_count,
            ))
        }
        PolicyKind::Exponential => {
            let (specs, sets) = split_populations(members)?;
            Box::new(WindowedModel::new(
                &specs,
                sets,
                WindowKind::Gaussian {
                    width: config.endmember_kernel_width,
                },
                config.age_bin_width,
                field_count,
            ))
        }
        PolicyKind::FuturePast => {
            let (specs, sets) = split_populations(members)?;
            Box::new(WindowedModel::new(
                &specs,
                sets,
                WindowKind::Symmetric {
                    width: config.endmember_kernel_width,
                },
                config.age_bin_width,
                field_count,
            ))
        }
        PolicyKind::Bootstrap => {
            let (specs, sets) = split_populations(members)?;
            Box::new(BootstrapModel::new(
                &specs,
                sets,
                config.endmember_kernel_width,
                config.bootstrap_iterations,
                config.age_bin_width,
                config.seed,
                field_count,
            ))
        }
    };
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::FieldRegistry;

    fn registry() -> FieldRegistry {
        let mut r = FieldRegistry::new();
        r.register("Th");
        r.register("Sc");
        r
    }

    fn population_member(name: &str, registry: &FieldRegistry) -> MemberDefinition {
        let mut set = SampleSet::for_registry(registry);
        set.push(1000.0, &[1.0, 2.0]);
        set.push(2000.0, &[2.0, 3.0]);
        MemberDefinition {
            spec: MemberSpec::new(name),
            samples: MemberSamples::Population(set),
        }
    }

    #[test]
    fn test_member_count_bounds() {
        let r = registry();
        let config = ReconConfig::default();
        let one = vec![population_member("A", &r)];
        assert!(matches!(
            build_model(&config, one, r.len()),
            Err(ConfigError::UnsupportedMemberCount(1))
        ));

        let six: Vec<_> = (0..6).map(|i| population_member(&format!("M{}", i), &r)).collect();
        assert!(matches!(
            build_model(&config, six, r.len()),
            Err(ConfigError::UnsupportedMemberCount(6))
        ));
    }

    #[test]
    fn test_policy_sample_mismatch() {
        let r = registry();
        let config = ReconConfig::default().policy(PolicyKind::Dual);
        let members = vec![population_member("A", &r), population_member("B", &r)];
        assert!(matches!(
            build_model(&config, members, r.len()),
            Err(ConfigError::MemberSamplesMismatch { .. })
        ));
    }

    #[test]
    fn test_field_count_mismatch() {
        let r = registry();
        let config = ReconConfig::default();
        let mut bad = SampleSet::new(3);
        bad.push(1000.0, &[1.0, 2.0, 3.0]);
        let members = vec![
            population_member("A", &r),
            MemberDefinition {
                spec: MemberSpec::new("B"),
                samples: MemberSamples::Population(bad),
            },
        ];
        assert!(matches!(
            build_model(&config, members, r.len()),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_builds_windowed_model() {
        let r = registry();
        let config = ReconConfig::default().policy(PolicyKind::Continuous);
        let members = vec![population_member("A", &r), population_member("B", &r)];
        let model = build_model(&config, members, r.len()).unwrap();
        assert_eq!(model.member_count(), 2);
        assert_eq!(model.member_name(0), "A");
    }
}
