//! Adaptive SNR thresholding and quality mapping
//!
//! The adaptive threshold follows the trace it is applied to:
//! `threshold = 1 + p * (max(SNR) - 1)` for `p` in (0, 1], or the explicit
//! floor `|p|` for negative `p`. Either way it never drops below the lowest
//! pick quality of the ladder.

use crate::analysis::result::Phase;
use crate::config::{validate_threshold_parameter, QualityThresholds};
use crate::error::PickerError;

/// Time uncertainty, in samples, for each quality level (best first)
const UNCERTAINTY_SAMPLES: [f64; 4] = [2.0, 8.0, 32.0, 128.0];

/// Uncertainty for SNRs below the whole ladder, in samples
const UNQUALIFIED_SAMPLES: f64 = 2000.0;

/// Compute the adaptive SNR threshold
///
/// # Arguments
///
/// * `snr_smooth` - Smoothed SNR values (restricted to the analysis window)
/// * `parameter` - Threshold parameter, in (0, 1] or negative
/// * `ladder` - Quality ladder; its minimum floors the result
///
/// # Errors
///
/// - `InvalidConfig` if `parameter` is 0 or greater than 1
/// - `UnusableStation` if a fractional threshold is requested on an empty
///   or all-NaN trace
pub fn snr_threshold(
    snr_smooth: &[f64],
    parameter: f64,
    ladder: &QualityThresholds,
) -> Result<f64, PickerError> {
    validate_threshold_parameter(parameter)?;

    let threshold = if parameter > 0.0 {
        let max = snr_smooth
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return Err(PickerError::UnusableStation(
                "no finite SNR values in window".to_string(),
            ));
        }
        1.0 + parameter * (max - 1.0)
    } else {
        -parameter
    };

    Ok(threshold.max(ladder.min()))
}

/// Count upward crossings of `threshold`
///
/// A crossing is a transition of `value - threshold` from `<= 0` to `> 0`
/// between consecutive samples.
pub fn count_upward_crossings(values: &[f64], threshold: f64) -> usize {
    values
        .windows(2)
        .filter(|w| w[0] - threshold <= 0.0 && w[1] - threshold > 0.0)
        .count()
}

/// Time uncertainty of a pick, in samples
///
/// `{>= thr[3]: 2, >= thr[2]: 8, >= thr[1]: 32, >= thr[0]: 128, else 2000}`,
/// doubled for S picks.
pub fn uncertainty_samples(snr: f64, phase: Phase, ladder: &QualityThresholds) -> f64 {
    let base = ladder
        .0
        .iter()
        .rev()
        .zip(UNCERTAINTY_SAMPLES.iter())
        .find(|(thr, _)| snr >= **thr)
        .map(|(_, &samples)| samples)
        .unwrap_or(UNQUALIFIED_SAMPLES);

    match phase {
        Phase::P => base,
        Phase::S => 2.0 * base,
    }
}

/// Time uncertainty of a pick, in seconds
pub fn time_uncertainty(
    snr: f64,
    phase: Phase,
    ladder: &QualityThresholds,
    sampling_rate: f64,
) -> f64 {
    uncertainty_samples(snr, phase, ladder) / sampling_rate
}
