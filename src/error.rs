//! Error types for reconstruction configuration and execution.

use std::fmt;

/// Error raised while validating configuration or assembling a reconstruction.
///
/// Configuration errors are always fatal and surface at construction time;
/// the engine never falls back to a default policy or member count silently.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The end-member temporal policy name was not recognized.
    UnknownPolicy(String),

    /// The report mode name was not recognized.
    UnknownReportMode(String),

    /// The end-member count is outside the supported set {2, 3, 4, 5}.
    UnsupportedMemberCount(usize),

    /// A ratio or report field references an element name that was never
    /// registered.
    UnknownField(String),

    /// A ratio name could not be split into numerator and denominator.
    MalformedRatio(String),

    /// A numeric parameter failed validation.
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Description of the violated constraint.
        message: String,
    },

    /// A member definition does not carry the sample populations its policy
    /// requires (e.g. regime sets for the interpolating policy).
    MemberSamplesMismatch {
        /// Name of the offending member.
        member: String,
        /// What the selected policy expected.
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownPolicy(name) => {
                write!(f, "unrecognized end-member policy '{}'", name)
            }
            ConfigError::UnknownReportMode(name) => {
                write!(f, "unrecognized report mode '{}'", name)
            }
            ConfigError::UnsupportedMemberCount(n) => {
                write!(f, "unsupported end-member count {} (supported: 2-5)", n)
            }
            ConfigError::UnknownField(name) => {
                write!(f, "unknown element field '{}'", name)
            }
            ConfigError::MalformedRatio(name) => {
                write!(f, "malformed ratio name '{}' (expected 'A/B')", name)
            }
            ConfigError::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{}': {}", name, message)
            }
            ConfigError::MemberSamplesMismatch { member, expected } => {
                write!(
                    f,
                    "member '{}' does not provide the samples its policy requires ({})",
                    member, expected
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Error raised while running a reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconError {
    /// Configuration was invalid (also returned by the run loop if the
    /// end-member count dispatch cannot be satisfied).
    Config(ConfigError),

    /// The simplex proposal loop exhausted its retry budget at the given
    /// time step. This indicates a pathological jump size relative to the
    /// current chain state, not missing data.
    DegenerateProposal {
        /// Time step at which the proposal loop failed.
        time: f64,
    },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconError::Config(e) => write!(f, "configuration error: {}", e),
            ReconError::DegenerateProposal { time } => {
                write!(
                    f,
                    "proposal retry budget exhausted at t = {} (degenerate jump size)",
                    time
                )
            }
        }
    }
}

impl std::error::Error for ReconError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReconError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for ReconError {
    fn from(e: ConfigError) -> Self {
        ReconError::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = ConfigError::UnknownPolicy("Quadratic".to_string());
        assert!(e.to_string().contains("Quadratic"));

        let e = ConfigError::UnsupportedMemberCount(7);
        assert!(e.to_string().contains('7'));

        let e = ReconError::DegenerateProposal { time: 2500.0 };
        assert!(e.to_string().contains("2500"));
    }

    #[test]
    fn test_config_error_converts() {
        let e: ReconError = ConfigError::UnsupportedMemberCount(1).into();
        assert!(matches!(
            e,
            ReconError::Config(ConfigError::UnsupportedMemberCount(1))
        ));
    }
}
