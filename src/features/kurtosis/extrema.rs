//! Extremum following on kurtosis traces
//!
//! Finds the N most prominent extrema of a trace and follows them from
//! coarse to fine smoothing:
//!
//! 1. Smooth the raw trace with the next width of the sequence (the last
//!    width is reused once the sequence runs out)
//! 2. Take the most extreme unmasked sample and record it
//! 3. Mask its whole basin (the neighbourhood where the trace keeps moving
//!    away from the extremum, at least ± the coarsest width) and repeat until
//!    N are found or nothing is left unmasked
//!
//! The strongest onset is therefore found first at coarse resolution and is
//! never moved by later stages; sub-peaks of the same onset are never reported
//! as separate candidates.

use crate::error::PickerError;
use crate::preprocessing::boxcar;

/// Which kind of extremum to follow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremumKind {
    /// Minima (onsets on cumulative kurtosis)
    Minimum,
    /// Maxima
    Maximum,
}

impl ExtremumKind {
    /// Value oriented so that larger is "more extreme"
    fn score(self, value: f64) -> f64 {
        match self {
            ExtremumKind::Minimum => -value,
            ExtremumKind::Maximum => value,
        }
    }
}

/// One extremum of a trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceExtremum {
    /// Sample index
    pub index: usize,
    /// Value of the smoothed trace of the stage that found it
    pub value: f64,
}

/// Result of extremum following
#[derive(Debug, Clone)]
pub struct FollowedExtrema {
    /// Extrema in strength order (strongest first)
    pub extrema: Vec<TraceExtremum>,
    /// Smoothed trace of every stage; `stages[k]` found `extrema[k]`
    pub stages: Vec<Vec<f64>>,
}

impl FollowedExtrema {
    /// Indices in strength order
    pub fn indices(&self) -> Vec<usize> {
        self.extrema.iter().map(|e| e.index).collect()
    }
}

/// Index of the highest-scoring unmasked sample in `lo..hi`
fn best_in(scores: &[f64], lo: usize, hi: usize) -> Option<usize> {
    let mut best: Option<usize> = None;
    for i in lo..hi {
        let s = scores[i];
        if s.is_nan() {
            continue;
        }
        match best {
            Some(b) if scores[b] >= s => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Mask the basin around `center` in-place
fn mask_basin(scores: &mut [f64], center: usize, min_half_width: usize) {
    let len = scores.len();

    let mut left = center;
    while left > 0 {
        let next = left - 1;
        let within = center - next <= min_half_width;
        let descending = !scores[next].is_nan() && scores[next] <= scores[left];
        if within || descending {
            left = next;
        } else {
            break;
        }
    }

    let mut right = center;
    while right + 1 < len {
        let next = right + 1;
        let within = next - center <= min_half_width;
        let descending = !scores[next].is_nan() && scores[next] <= scores[right];
        if within || descending {
            right = next;
        } else {
            break;
        }
    }

    for s in &mut scores[left..=right] {
        *s = f64::NAN;
    }
}

/// Follow up to `n_max` extrema through a smoothing sequence
///
/// # Arguments
///
/// * `trace` - Raw (unsmoothed) trace, e.g. a mean cumulative kurtosis
/// * `kind` - Minima or maxima
/// * `n_max` - Maximum number of extrema
/// * `smoothing_sequence` - Boxcar widths in samples, coarse to fine
///
/// # Returns
///
/// Extrema in strength order and the smoothed trace of each stage
///
/// # Errors
///
/// - `InvalidConfig` if the smoothing sequence is empty
/// - `UnusableStation` if the trace is empty
///
/// # Example
///
/// ```
/// use ps_picker::features::kurtosis::{follow_extrema, ExtremumKind};
///
/// let trace = vec![0.0, -1.0, 0.0, 0.0, 0.0, -3.0, 0.0, 0.0];
/// let found = follow_extrema(&trace, ExtremumKind::Minimum, 1, &[1])?;
/// assert_eq!(found.extrema[0].index, 5);
/// # Ok::<(), ps_picker::PickerError>(())
/// ```
pub fn follow_extrema(
    trace: &[f64],
    kind: ExtremumKind,
    n_max: usize,
    smoothing_sequence: &[usize],
) -> Result<FollowedExtrema, PickerError> {
    let Some(&coarsest) = smoothing_sequence.first() else {
        return Err(PickerError::InvalidConfig(
            "empty kurtosis smoothing sequence".to_string(),
        ));
    };
    if trace.is_empty() {
        return Err(PickerError::UnusableStation(
            "cannot follow extrema on an empty trace".to_string(),
        ));
    }

    let mut stages: Vec<Vec<f64>> = Vec::with_capacity(n_max);
    let mut extrema: Vec<TraceExtremum> = Vec::with_capacity(n_max);
    let mut masked = vec![false; trace.len()];

    // One extremum per stage; widths past the end of the sequence reuse the last
    while extrema.len() < n_max {
        let k = extrema.len();
        let width = smoothing_sequence[k.min(smoothing_sequence.len() - 1)];
        let smoothed = boxcar(trace, width);
        let mut scores: Vec<f64> = smoothed
            .iter()
            .zip(&masked)
            .map(|(&v, &m)| if m { f64::NAN } else { kind.score(v) })
            .collect();

        let Some(best) = best_in(&scores, 0, scores.len()) else {
            break;
        };
        mask_basin(&mut scores, best, coarsest.max(1));
        for (m, s) in masked.iter_mut().zip(&scores) {
            *m = *m || s.is_nan();
        }

        extrema.push(TraceExtremum {
            index: best,
            value: smoothed[best],
        });
        stages.push(smoothed);
    }

    log::debug!(
        "Followed {} {:?} extrema through {} smoothing stages: {:?}",
        extrema.len(),
        kind,
        stages.len(),
        extrema.iter().map(|e| e.index).collect::<Vec<_>>()
    );

    Ok(FollowedExtrema { extrema, stages })
}
