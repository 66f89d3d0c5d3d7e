//! Signal quality analysis
//!
//! Decides whether a station's S-channel signal can be trusted for picking:
//! the smoothed SNR must rise above an adaptive threshold inside the global
//! window at least once, and at most `snr_max_threshold_crossings` times.
//! Zero crossings means the signal never emerges from the noise; too many
//! means the window is noisy or holds several events.

pub mod snr;
pub mod threshold;

pub use snr::{energy, snr};
pub use threshold::{count_upward_crossings, snr_threshold, time_uncertainty, uncertainty_samples};

use crate::analysis::result::GlobalWindow;
use crate::config::PickerParameters;
use crate::error::PickerError;
use crate::io::Trace;
use crate::preprocessing::boxcar;

/// Outcome of the trustworthiness test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnrAssessment {
    /// Adaptive threshold used
    pub threshold: f64,
    /// Upward crossings inside the window
    pub crossings: usize,
    /// `0 < crossings <= max_threshold_crossings`
    pub trustworthy: bool,
}

/// Test whether an SNR trace is trustworthy inside the global window
///
/// # Errors
///
/// `InvalidConfig` for an illegal threshold parameter, `UnusableStation`
/// if the window holds no SNR samples.
pub fn assess(
    snr: &Trace,
    window: &GlobalWindow,
    params: &PickerParameters,
) -> Result<SnrAssessment, PickerError> {
    let smoothed = snr.with_data(boxcar(&snr.data, params.snr_smoothing_samples));
    let windowed = smoothed.slice(window.first_time, window.last_time);
    if windowed.is_empty() {
        return Err(PickerError::UnusableStation(format!(
            "{}: no SNR samples inside the global window",
            snr.station
        )));
    }

    let threshold = snr_threshold(
        &windowed.data,
        params.snr_threshold_parameter,
        &params.snr_quality_thresholds,
    )?;
    let crossings = count_upward_crossings(&windowed.data, threshold);
    let trustworthy = crossings > 0 && crossings <= params.snr_max_threshold_crossings;

    log::debug!(
        "{}: SNR threshold={:.3}, crossings={}, trustworthy={}",
        snr.station,
        threshold,
        crossings,
        trustworthy
    );

    Ok(SnrAssessment {
        threshold,
        crossings,
        trustworthy,
    })
}
