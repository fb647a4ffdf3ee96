//! # crustmix
//!
//! Reconstruct the time-evolution of a multi-component geochemical mixture
//! (e.g. the proportions of mafic, felsic and komatiitic crustal
//! end-members through Earth history) by fitting a mixing model against
//! noisy, sparse, irregularly-sampled proxy measurements.
//!
//! The engine combines four pieces:
//! - a Gaussian-kernel-weighted **bootstrap regression** that turns raw
//!   (age, value) scatters into smooth reference curves with standard
//!   errors ([`statistics`]),
//! - a time-varying **end-member model** supplying reference compositions
//!   and their ratio uncertainties under interchangeable temporal policies
//!   ([`endmember`]),
//! - an effective-variance **chi-square misfit** that propagates both
//!   reference-curve and end-member uncertainty ([`misfit`]),
//! - a per-time-step **Metropolis-Hastings sampler** over the mixture
//!   simplex ([`sampler`]).
//!
//! Sample ingestion and parsing stay outside this crate: callers hand over
//! ready-made [`SampleSet`]s and receive summary records plus a delimited
//! report.
//!
//! ## Quick start
//!
//! ```no_run
//! use crustmix::{
//!     MemberDefinition, MemberSamples, MemberSpec, PolicyKind, ReconConfig,
//!     Reconstruction, FieldRegistry, SampleSet,
//! };
//!
//! let mut registry = FieldRegistry::new();
//! registry.register("Th");
//! registry.register("Sc");
//!
//! // Reference (shale) population and per-member populations come from
//! // the caller's ingestion layer.
//! let shales = SampleSet::for_registry(&registry);
//! let mafic = SampleSet::for_registry(&registry);
//! let felsic = SampleSet::for_registry(&registry);
//!
//! let config = ReconConfig::new()
//!     .ratio("Th/Sc")
//!     .policy(PolicyKind::Continuous)
//!     .seed(42);
//!
//! let members = vec![
//!     MemberDefinition {
//!         spec: MemberSpec::new("M"),
//!         samples: MemberSamples::Population(mafic),
//!     },
//!     MemberDefinition {
//!         spec: MemberSpec::new("F"),
//!         samples: MemberSamples::Population(felsic),
//!     },
//! ];
//!
//! let mut recon = Reconstruction::new(config, registry, &shales, members)?;
//! let report = recon.run()?;
//! println!("{}", report.to_csv());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod curve;
pub mod endmember;
pub mod error;
pub mod misfit;
pub mod report;
pub mod samples;
pub mod sampler;
pub mod statistics;

pub use config::{PolicyKind, ReconConfig, ReportMode};
pub use curve::PiecewiseCurve;
pub use endmember::{
    build_model, Composition, EndmemberModel, MemberDefinition, MemberSamples, MemberSpec,
};
pub use error::{ConfigError, ReconError};
pub use report::{RatioStepRecord, ReconReport, StepRecord};
pub use samples::{age_uniform_weights, FieldId, FieldRegistry, RatioSpec, SampleSet};
pub use sampler::Reconstruction;
pub use statistics::BootstrapCurves;
