//! Error types for episim.
//!
//! All fallible operations return `Result<T, EpiError>` instead of
//! panicking. Parameter problems are rejected before integration starts;
//! numerical problems stop the run rather than producing a partial or
//! NaN-filled trajectory.

use thiserror::Error;

/// Result type alias for episim operations.
pub type EpiResult<T> = Result<T, EpiError>;

/// Unified error type for all episim operations.
#[derive(Debug, Error)]
pub enum EpiError {
    /// A rate or population value outside its documented domain.
    ///
    /// Raised at model construction, never inside the solver.
    #[error("invalid parameter {name}={value} (domain [{min}, {max}])")]
    InvalidParameter {
        /// Parameter name (model notation, e.g. "beta").
        name: &'static str,
        /// Offending value.
        value: f64,
        /// Lower bound of the documented domain.
        min: f64,
        /// Upper bound of the documented domain.
        max: f64,
    },

    /// The numerical method could not produce a stable trajectory.
    #[error("integration failure at t={time}: {reason}")]
    IntegrationFailure {
        /// Simulation time (days) at which the failure was detected.
        time: f64,
        /// What the stability guard observed.
        reason: String,
    },

    /// Semantic configuration error (beyond schema validation).
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Schema validation error.
    #[error("validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EpiError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an integration failure at a given time.
    #[must_use]
    pub fn integration(time: f64, reason: impl Into<String>) -> Self {
        Self::IntegrationFailure {
            time,
            reason: reason.into(),
        }
    }

    /// Create an invalid-parameter error.
    #[must_use]
    pub const fn parameter(name: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self::InvalidParameter {
            name,
            value,
            min,
            max,
        }
    }

    /// Check whether this error came from the numerical stability guard.
    #[must_use]
    pub const fn is_integration_failure(&self) -> bool {
        matches!(self, Self::IntegrationFailure { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_display() {
        let err = EpiError::parameter("beta", 1.5, 0.0, 1.0);
        let msg = err.to_string();
        assert!(msg.contains("beta"));
        assert!(msg.contains("1.5"));
        assert!(msg.contains("[0, 1]"));
    }

    #[test]
    fn test_integration_failure_display() {
        let err = EpiError::integration(12.5, "non-finite value in compartment E");
        assert!(err.is_integration_failure());
        let msg = err.to_string();
        assert!(msg.contains("t=12.5"));
        assert!(msg.contains("non-finite"));
    }

    #[test]
    fn test_config_error_display() {
        let err = EpiError::config("initial fractions exceed 1");
        assert!(!err.is_integration_failure());
        let msg = err.to_string();
        assert!(msg.contains("configuration error"));
        assert!(msg.contains("exceed 1"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such scenario");
        let err: EpiError = io.into();
        assert!(err.to_string().contains("no such scenario"));
    }
}
