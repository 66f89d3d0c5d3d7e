//! Polarity-based P/S discrimination
//!
//! P arrivals carry more vertically coherent, rectilinear motion than S
//! arrivals. The directionality signal
//!
//! ```text
//! DR = smooth200(rect * sign(1.3 * smooth100(sin|dip|) - smooth100(rect)))
//! ```
//!
//! (zeroed wherever rect is zero) is positive for steep rectilinear motion
//! and negative for flat motion, and is read around each candidate onset.

pub mod polarization;

pub use polarization::{polarization, symmetric_eigen, Polarization};

use crate::config::DipRectThresholds;
use crate::io::Trace;
use crate::preprocessing::boxcar;

/// Half-width of the DR window read around each candidate, samples
pub const DR_HALF_WINDOW: usize = 200;

/// Smoothing applied to dip and rectilinearity, samples
const ATTRIBUTE_SMOOTHING: usize = 100;

/// Smoothing applied to DR, samples
const DR_SMOOTHING: usize = 200;

/// Weight of sin|dip| against rectilinearity
const DIP_WEIGHT: f64 = 1.3;

/// P and S onsets assigned from candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseAssignment {
    /// P onset sample
    pub p: Option<usize>,
    /// S onset sample
    pub s: Option<usize>,
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Directionality signal from rectilinearity and dip (degrees)
pub fn directionality(rectilinearity: &[f64], dip: &[f64]) -> Vec<f64> {
    let len = rectilinearity.len().min(dip.len());
    let sin_dip: Vec<f64> = dip[..len].iter().map(|d| d.abs().to_radians().sin()).collect();
    let smooth_dip = boxcar(&sin_dip, ATTRIBUTE_SMOOTHING);
    let smooth_rect = boxcar(&rectilinearity[..len], ATTRIBUTE_SMOOTHING);

    let signed: Vec<f64> = (0..len)
        .map(|i| rectilinearity[i] * sign(DIP_WEIGHT * smooth_dip[i] - smooth_rect[i]))
        .collect();

    let mut dr = boxcar(&signed, DR_SMOOTHING);
    for (v, &r) in dr.iter_mut().zip(rectilinearity) {
        if r == 0.0 {
            *v = 0.0;
        }
    }
    dr
}

/// DR values in the explicit index range `[c - 200, c + 200)`, clipped
fn dr_window(dr: &[f64], center: usize) -> &[f64] {
    let lo = center.saturating_sub(DR_HALF_WINDOW).min(dr.len());
    let hi = (center + DR_HALF_WINDOW).min(dr.len());
    &dr[lo..hi]
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Assign P and S to up to two candidates from the DR signal
///
/// - no candidate: nothing assigned
/// - one candidate: `peak = max|DR| * sign(mean DR)` in its window;
///   `peak >= thresholds.p` makes it P, else `peak <= thresholds.s` makes it
///   S, else it stays unclassified
/// - two candidates: the one with the larger mean DR is P, the other S
///   (a tie keeps the first candidate as P)
pub fn classify(dr: &[f64], candidates: &[usize], thresholds: &DipRectThresholds) -> PhaseAssignment {
    match candidates {
        [] => PhaseAssignment::default(),
        [only] => {
            let window = dr_window(dr, *only);
            let peak = window.iter().map(|v| v.abs()).fold(0.0f64, f64::max) * sign(mean(window));
            log::debug!("Polarity: single candidate {} with DR peak {:.3}", only, peak);
            if peak >= thresholds.p {
                PhaseAssignment {
                    p: Some(*only),
                    s: None,
                }
            } else if peak <= thresholds.s {
                PhaseAssignment {
                    p: None,
                    s: Some(*only),
                }
            } else {
                PhaseAssignment::default()
            }
        }
        [first, second, ..] => {
            let m1 = mean(dr_window(dr, *first));
            let m2 = mean(dr_window(dr, *second));
            log::debug!(
                "Polarity: mean DR {:.3} at {}, {:.3} at {}",
                m1,
                first,
                m2,
                second
            );
            if m1 >= m2 {
                PhaseAssignment {
                    p: Some(*first),
                    s: Some(*second),
                }
            } else {
                PhaseAssignment {
                    p: Some(*second),
                    s: Some(*first),
                }
            }
        }
    }
}

/// Run the full polarity discrimination on filtered Z, N, E traces
///
/// # Arguments
///
/// * `zne` - Filtered vertical, north and east traces
/// * `candidates` - Candidate onset samples (at most two are used)
/// * `window_seconds` - Polarization covariance window
/// * `thresholds` - DR thresholds
pub fn discriminate(
    zne: [&Trace; 3],
    candidates: &[usize],
    window_seconds: f64,
    thresholds: &DipRectThresholds,
) -> PhaseAssignment {
    let candidates = &candidates[..candidates.len().min(2)];
    if candidates.is_empty() {
        return PhaseAssignment::default();
    }
    let [z, n, e] = zne;
    let window = ((window_seconds * z.sampling_rate).round() as usize).max(3);
    let margin = DR_HALF_WINDOW + DR_SMOOTHING / 2 + ATTRIBUTE_SMOOTHING / 2 + 1;

    let pol = polarization(&z.data, &n.data, &e.data, candidates, window, margin);
    let dr = directionality(&pol.rectilinearity, &pol.dip);
    classify(&dr, candidates, thresholds)
}
