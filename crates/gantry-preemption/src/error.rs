//! Error types for preemption planning.

use thiserror::Error;

/// Result type for preemption operations.
pub type Result<T> = std::result::Result<T, PreemptionError>;

/// Errors that can occur while building preemption inputs.
///
/// Planning itself never fails: an infeasible request is reported through
/// the planner's `Option` return, and malformed runtime inputs (missing
/// jobs, empty network lists) are skipped rather than rejected. These
/// errors only surface when constructing validated values up front.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreemptionError {
    /// Invalid planner configuration.
    #[error("invalid planner config: {reason}")]
    InvalidConfig {
        /// Description of why the configuration is invalid.
        reason: String,
    },

    /// Invalid network reservation.
    #[error("invalid network reservation: {reason}")]
    InvalidReservation {
        /// Description of why the reservation is invalid.
        reason: String,
    },

    /// Invalid network device declaration.
    #[error("invalid network device: {reason}")]
    InvalidDevice {
        /// Description of why the device declaration is invalid.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_config() {
        let err = PreemptionError::InvalidConfig {
            reason: "priority gap must be at least 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid planner config: priority gap must be at least 1"
        );
    }

    #[test]
    fn error_display_invalid_reservation() {
        let err = PreemptionError::InvalidReservation {
            reason: "device name is empty".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid network reservation: device name is empty"
        );
    }

    #[test]
    fn error_display_invalid_device() {
        let err = PreemptionError::InvalidDevice {
            reason: "device name is empty".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid network device: device name is empty"
        );
    }

    #[test]
    fn error_clone_and_eq() {
        let err1 = PreemptionError::InvalidConfig {
            reason: "priority gap must be at least 1".into(),
        };
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }

    #[test]
    fn error_debug_format() {
        let err = PreemptionError::InvalidReservation {
            reason: "device name is empty".into(),
        };
        let debug = format!("{err:?}");
        assert!(debug.contains("InvalidReservation"));
        assert!(debug.contains("device name is empty"));
    }
}
