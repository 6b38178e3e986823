//! Error handling for the mood detection pipeline
//!
//! One error type shared by every crate in the workspace. Tick-level code
//! decides from the variant whether a failure is fatal or only aborts the
//! current emission.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type MoodResult<T> = Result<T, MoodError>;

/// Error type for all pipeline operations
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum MoodError {
    /// Filter or estimator input too short to be processed
    #[error("Insufficient samples: {required} required, {actual} provided")]
    InsufficientSamples {
        /// Minimum number of samples accepted
        required: usize,
        /// Number of samples actually provided
        actual: usize,
    },

    /// Baseline finalized before any band power was accumulated
    #[error("Cannot finalize baseline: no band power samples were accumulated")]
    EmptyBaseline,

    /// Acquisition collaborator could not supply a window
    #[error("Acquisition failure: {reason}")]
    AcquisitionFailure {
        /// Description of the acquisition problem
        reason: String,
    },

    /// Actuator sink unavailable or broken
    #[error("Actuator write failure: {reason}")]
    ActuatorWriteFailure {
        /// Description of the write problem
        reason: String,
    },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error
        reason: String,
    },

    /// Window data inconsistent with its metadata
    #[error("Invalid signal data: {reason}")]
    InvalidSignalData {
        /// Description of the data problem
        reason: String,
    },

    /// Aggregation requested over zero channel labels
    #[error("Cannot aggregate an empty window: no channel labels")]
    EmptyWindow,

    /// Calibrator received data after the baseline was fixed
    #[error("Calibration already finalized, baseline is immutable")]
    CalibrationFinalized,

    /// FFT backend failure
    #[error("Spectral estimation failed: {reason}")]
    Spectral {
        /// Backend error description
        reason: String,
    },
}

impl MoodError {
    /// Errors raised by the acquisition collaborator
    pub fn is_acquisition(&self) -> bool {
        matches!(self, MoodError::AcquisitionFailure { .. })
    }

    /// Short machine-friendly kind name, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            MoodError::InsufficientSamples { .. } => "insufficient_samples",
            MoodError::EmptyBaseline => "empty_baseline",
            MoodError::AcquisitionFailure { .. } => "acquisition_failure",
            MoodError::ActuatorWriteFailure { .. } => "actuator_write_failure",
            MoodError::InvalidConfig { .. } => "invalid_config",
            MoodError::InvalidSignalData { .. } => "invalid_signal_data",
            MoodError::EmptyWindow => "empty_window",
            MoodError::CalibrationFinalized => "calibration_finalized",
            MoodError::Spectral { .. } => "spectral",
        }
    }
}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::error::MoodError::InvalidConfig {
            reason: format!($($arg)*),
        }
    };
}

/// Convenience macro for creating acquisition errors
#[macro_export]
macro_rules! acquisition_error {
    ($($arg:tt)*) => {
        $crate::error::MoodError::AcquisitionFailure {
            reason: format!($($arg)*),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = MoodError::InsufficientSamples {
            required: 28,
            actual: 10,
        };
        let display = format!("{}", error);
        assert!(display.contains("Insufficient samples"));
        assert!(display.contains("28"));
        assert!(display.contains("10"));
    }

    #[test]
    fn test_error_equality() {
        let error1 = MoodError::InvalidConfig {
            reason: "test".to_string(),
        };
        let error2 = config_error!("{}", "test");
        assert_eq!(error1, error2);
    }

    #[test]
    fn test_error_kinds() {
        assert!(acquisition_error!("board offline").is_acquisition());
        assert!(!MoodError::EmptyBaseline.is_acquisition());
        assert_eq!(MoodError::EmptyWindow.kind(), "empty_window");
    }
}
