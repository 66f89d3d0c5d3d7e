//! Error types for the onset picker

use std::fmt;

/// Errors that can occur while picking an event
#[derive(Debug, Clone, PartialEq)]
pub enum PickerError {
    /// Configuration error (malformed ladder, bands, offsets, phase labels...)
    InvalidConfig(String),

    /// Malformed caller input (empty trace set, zero sampling rate, ...)
    InvalidInput(String),

    /// No station contributed kurtosis extrema to the global window estimate
    NoGlobalExtrema,

    /// No pick survived association, so no origin time can be estimated
    NoSurvivingPicks,

    /// A single station cannot be used (flat-lined, too short, inconsistent).
    ///
    /// Never escapes [`crate::pick_event`]: the station picker converts it
    /// into a zero contribution.
    UnusableStation(String),

    /// Numerical error (NaN, degenerate statistics, etc.)
    NumericalError(String),
}

impl PickerError {
    /// True for the "not enough data for this event" failures
    ///
    /// Batch callers use this to tell "skip this event" apart from a
    /// configuration problem that will fail every event.
    pub fn is_data_insufficiency(&self) -> bool {
        matches!(self, PickerError::NoGlobalExtrema | PickerError::NoSurvivingPicks)
    }
}

impl fmt::Display for PickerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickerError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            PickerError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            PickerError::NoGlobalExtrema => {
                write!(f, "No station contributed kurtosis extrema to the global window")
            }
            PickerError::NoSurvivingPicks => write!(f, "No picks survived association"),
            PickerError::UnusableStation(msg) => write!(f, "Unusable station: {}", msg),
            PickerError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
        }
    }
}

impl std::error::Error for PickerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_insufficiency_grouping() {
        assert!(PickerError::NoGlobalExtrema.is_data_insufficiency());
        assert!(PickerError::NoSurvivingPicks.is_data_insufficiency());
        assert!(!PickerError::InvalidConfig("x".to_string()).is_data_insufficiency());
        assert!(!PickerError::UnusableStation("x".to_string()).is_data_insufficiency());
    }

    #[test]
    fn test_display_mentions_detail() {
        let err = PickerError::InvalidConfig("n_follow must be 1 or 2".to_string());
        assert!(err.to_string().contains("n_follow"));
    }
}
