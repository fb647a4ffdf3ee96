//! Configuration for the mixture reconstruction.

use std::str::FromStr;

use crate::error::ConfigError;
use crate::statistics::DEFAULT_BOOTSTRAP_ITERATIONS;

// =============================================================================
// Default reconstruction constants
// =============================================================================

/// Default oldest reconstructed time (Myr before present).
pub const DEFAULT_TIME_START: f64 = 4000.0;

/// Default youngest reconstructed time, exclusive.
pub const DEFAULT_TIME_END: f64 = 0.0;

/// Default reconstruction step (Myr).
pub const DEFAULT_TIME_STEP: f64 = 10.0;

/// Default Markov-chain length per time step.
pub const DEFAULT_CHAIN_ITERATIONS: usize = 1_500_000;

/// Default standard deviation of the Gaussian proposal jump.
pub const DEFAULT_JUMP_SIZE: f64 = 0.03;

/// Default Gaussian kernel width of the reference-curve bootstrap (Myr).
pub const DEFAULT_BOOTSTRAP_KERNEL_WIDTH: f64 = 400.0;

/// Default age-bin width for age-uniform sample weighting (Myr).
pub const DEFAULT_AGE_BIN_WIDTH: f64 = 500.0;

/// Default centre of the old/young regime transition (Myr).
pub const DEFAULT_TRANSITION_CENTRE: f64 = 2500.0;

/// Default width of the old/young regime transition (Myr).
pub const DEFAULT_TRANSITION_WIDTH: f64 = 500.0;

/// Default trailing-window length of the continuous policy (Myr).
pub const DEFAULT_ENDMEMBER_WINDOW: f64 = 500.0;

/// Default kernel/half-width of the exponential, future-past and bootstrap
/// policies (Myr).
pub const DEFAULT_ENDMEMBER_KERNEL_WIDTH: f64 = 400.0;

// =============================================================================
// Enumerations
// =============================================================================

/// Temporal policy of the end-member model.
///
/// Parsed from configuration strings; an unrecognized name is a hard
/// [`ConfigError::UnknownPolicy`], never a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// Blend two fixed regimes across a transition window.
    Dual,
    /// Pin every member to its young regime.
    ModernOnly,
    /// Trailing age window, re-estimated per time step.
    Continuous,
    /// Gaussian age-kernel weighting, re-estimated per time step.
    Exponential,
    /// Symmetric hard age window, re-estimated per time step.
    FuturePast,
    /// Precomputed kernel-bootstrap curves, interpolated per time step.
    Bootstrap,
}

impl FromStr for PolicyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Dual" => Ok(PolicyKind::Dual),
            "ModernOnly" => Ok(PolicyKind::ModernOnly),
            "Continuous" => Ok(PolicyKind::Continuous),
            "Exponential" => Ok(PolicyKind::Exponential),
            "FuturePast" => Ok(PolicyKind::FuturePast),
            "Bootstrap" => Ok(PolicyKind::Bootstrap),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Reporting granularity of the reconstruction output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// Per-end-member proportions with confidence bounds, plus the mixed
    /// reference composition.
    Endmembers,
    /// Per-ratio percentile triples under the recovered mixtures.
    Ratios,
}

impl FromStr for ReportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Endmembers" => Ok(ReportMode::Endmembers),
            "Ratios" => Ok(ReportMode::Ratios),
            other => Err(ConfigError::UnknownReportMode(other.to_string())),
        }
    }
}

// =============================================================================
// Configuration object
// =============================================================================

/// Named parameters of a reconstruction run.
///
/// Built with chained setters from `ReconConfig::new()`; numeric constraints
/// are checked by [`ReconConfig::validate`], which the reconstruction
/// constructor always calls.
#[derive(Debug, Clone)]
pub struct ReconConfig {
    /// Oldest reconstructed time; the outer loop starts here.
    pub time_start: f64,
    /// Youngest time, exclusive.
    pub time_end: f64,
    /// Step between reconstructed times.
    pub time_step: f64,

    /// Markov-chain length per time step.
    pub chain_iterations: usize,
    /// Standard deviation of the Gaussian proposal jump.
    pub jump_size: f64,

    /// Bootstrap resample count for reference and end-member error curves.
    pub bootstrap_iterations: usize,
    /// Gaussian kernel width of the reference-curve bootstrap.
    pub bootstrap_kernel_width: f64,

    /// Bin width of the age-uniform sample weighting.
    pub age_bin_width: f64,

    /// End-member temporal policy.
    pub policy: PolicyKind,
    /// Centre of the old/young transition (interpolating policy).
    pub transition_centre: f64,
    /// Width of the old/young transition (interpolating policy).
    pub transition_width: f64,
    /// Trailing-window length (continuous policy); non-finite means
    /// cumulative.
    pub endmember_window: f64,
    /// Kernel width / half-width of the exponential, future-past and
    /// bootstrap policies.
    pub endmember_kernel_width: f64,

    /// Tracked ratio names ("A/B"), fitted against the reference curves.
    pub ratios: Vec<String>,

    /// Reporting granularity.
    pub report_mode: ReportMode,
    /// Ratio names reported in ratio mode.
    pub report_ratios: Vec<String>,
    /// Whether the acceptance-ratio column is emitted. When enabled, time
    /// steps with zero acceptance are dropped from the report.
    pub log_acceptance: bool,

    /// Seed of the run's random generator stream.
    pub seed: u64,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            time_start: DEFAULT_TIME_START,
            time_end: DEFAULT_TIME_END,
            time_step: DEFAULT_TIME_STEP,
            chain_iterations: DEFAULT_CHAIN_ITERATIONS,
            jump_size: DEFAULT_JUMP_SIZE,
            bootstrap_iterations: DEFAULT_BOOTSTRAP_ITERATIONS,
            bootstrap_kernel_width: DEFAULT_BOOTSTRAP_KERNEL_WIDTH,
            age_bin_width: DEFAULT_AGE_BIN_WIDTH,
            policy: PolicyKind::Continuous,
            transition_centre: DEFAULT_TRANSITION_CENTRE,
            transition_width: DEFAULT_TRANSITION_WIDTH,
            endmember_window: DEFAULT_ENDMEMBER_WINDOW,
            endmember_kernel_width: DEFAULT_ENDMEMBER_KERNEL_WIDTH,
            ratios: Vec::new(),
            report_mode: ReportMode::Endmembers,
            report_ratios: Vec::new(),
            log_acceptance: true,
            seed: 0,
        }
    }
}

impl ReconConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a quick configuration for tests and exploration: short
    /// chains, few bootstrap iterations.
    pub fn quick() -> Self {
        Self {
            chain_iterations: 20_000,
            bootstrap_iterations: 200,
            ..Default::default()
        }
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Set the reconstructed time range (oldest, youngest-exclusive).
    pub fn time_range(mut self, start: f64, end: f64) -> Self {
        self.time_start = start;
        self.time_end = end;
        self
    }

    /// Set the reconstruction step.
    pub fn time_step(mut self, step: f64) -> Self {
        self.time_step = step;
        self
    }

    /// Set the Markov-chain length per time step.
    pub fn chain_iterations(mut self, n: usize) -> Self {
        self.chain_iterations = n;
        self
    }

    /// Set the proposal jump size.
    pub fn jump_size(mut self, jump: f64) -> Self {
        self.jump_size = jump;
        self
    }

    /// Set the bootstrap iteration count.
    pub fn bootstrap_iterations(mut self, n: usize) -> Self {
        self.bootstrap_iterations = n;
        self
    }

    /// Set the bootstrap kernel width.
    pub fn bootstrap_kernel_width(mut self, width: f64) -> Self {
        self.bootstrap_kernel_width = width;
        self
    }

    /// Set the age-bin width for age-uniform weighting.
    pub fn age_bin_width(mut self, width: f64) -> Self {
        self.age_bin_width = width;
        self
    }

    /// Select the end-member temporal policy.
    pub fn policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    /// Set the old/young transition window.
    pub fn transition(mut self, centre: f64, width: f64) -> Self {
        self.transition_centre = centre;
        self.transition_width = width;
        self
    }

    /// Set the trailing-window length of the continuous policy.
    pub fn endmember_window(mut self, window: f64) -> Self {
        self.endmember_window = window;
        self
    }

    /// Set the end-member kernel width / half-width.
    pub fn endmember_kernel_width(mut self, width: f64) -> Self {
        self.endmember_kernel_width = width;
        self
    }

    /// Add a tracked ratio by name ("A/B").
    pub fn ratio(mut self, name: impl Into<String>) -> Self {
        self.ratios.push(name.into());
        self
    }

    /// Select the reporting granularity.
    pub fn report_mode(mut self, mode: ReportMode) -> Self {
        self.report_mode = mode;
        self
    }

    /// Add a ratio reported in ratio mode.
    pub fn report_ratio(mut self, name: impl Into<String>) -> Self {
        self.report_ratios.push(name.into());
        self
    }

    /// Enable or disable the acceptance-ratio column.
    pub fn log_acceptance(mut self, enabled: bool) -> Self {
        self.log_acceptance = enabled;
        self
    }

    /// Seed the run's generator stream.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check every numeric constraint, failing with the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name,
                    message: format!("must be finite and positive, got {}", value),
                });
            }
            Ok(())
        }

        if !(self.time_start.is_finite()
            && self.time_end.is_finite()
            && self.time_start > self.time_end)
        {
            return Err(ConfigError::InvalidParameter {
                name: "time_range",
                message: format!(
                    "time_start ({}) must exceed time_end ({})",
                    self.time_start, self.time_end
                ),
            });
        }
        positive("time_step", self.time_step)?;
        positive("jump_size", self.jump_size)?;
        positive("bootstrap_kernel_width", self.bootstrap_kernel_width)?;
        positive("age_bin_width", self.age_bin_width)?;
        positive("endmember_kernel_width", self.endmember_kernel_width)?;
        if self.chain_iterations == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "chain_iterations",
                message: "must be positive".to_string(),
            });
        }
        if self.bootstrap_iterations == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "bootstrap_iterations",
                message: "must be positive".to_string(),
            });
        }
        if self.ratios.is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "ratios",
                message: "at least one tracked ratio is required".to_string(),
            });
        }
        if self.report_mode == ReportMode::Ratios && self.report_ratios.is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "report_ratios",
                message: "ratio reporting requires at least one reported ratio".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        let config = ReconConfig::default();
        assert_eq!(config.time_start, 4000.0);
        assert_eq!(config.time_step, 10.0);
        assert_eq!(config.chain_iterations, 1_500_000);
        assert_eq!(config.jump_size, 0.03);
        assert_eq!(config.bootstrap_iterations, 10_000);
        assert!(config.log_acceptance);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("Dual".parse::<PolicyKind>().unwrap(), PolicyKind::Dual);
        assert_eq!(
            "Bootstrap".parse::<PolicyKind>().unwrap(),
            PolicyKind::Bootstrap
        );
        assert!(matches!(
            "Quadratic".parse::<PolicyKind>(),
            Err(ConfigError::UnknownPolicy(_))
        ));
        // Case matters: these are exact configuration tokens.
        assert!("dual".parse::<PolicyKind>().is_err());
    }

    #[test]
    fn test_report_mode_parsing() {
        assert_eq!(
            "Endmembers".parse::<ReportMode>().unwrap(),
            ReportMode::Endmembers
        );
        assert!(matches!(
            "Everything".parse::<ReportMode>(),
            Err(ConfigError::UnknownReportMode(_))
        ));
    }

    #[test]
    fn test_validation_requires_ratios() {
        let config = ReconConfig::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter { name: "ratios", .. })
        ));
        assert!(ReconConfig::new().ratio("Th/Sc").validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_numbers() {
        let config = ReconConfig::new().ratio("Th/Sc").jump_size(0.0);
        assert!(config.validate().is_err());

        let config = ReconConfig::new().ratio("Th/Sc").time_step(-5.0);
        assert!(config.validate().is_err());

        let config = ReconConfig::new().ratio("Th/Sc").time_range(0.0, 4000.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ratio_report_mode_needs_report_ratios() {
        let config = ReconConfig::new()
            .ratio("Th/Sc")
            .report_mode(ReportMode::Ratios);
        assert!(config.validate().is_err());
        let config = config.report_ratio("Th/Sc");
        assert!(config.validate().is_ok());
    }
}
