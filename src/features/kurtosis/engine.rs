//! Sliding and cumulative kurtosis
//!
//! Algorithm:
//! 1. Band-pass the trace
//! 2. Sliding kurtosis over a trailing window: K = m4 / m2²
//! 3. First difference, negative steps dropped, cumulative sum
//! 4. Subtract the line joining the first and last cumulative values
//! 5. Boxcar smoothing
//!
//! An onset makes the kurtosis climb steeply, so the cumulative curve rises
//! faster than its end-to-end trend right after it; relative to the trend the
//! onset sits at a minimum.
//!
//! # Reference
//!
//! Baillard, C., Crawford, W. C., Ballu, V., Hibert, C., & Mangeney, A. (2014).
//! An Automatic Kurtosis-Based P- and S-Phase Picker Designed for Local Seismic
//! Networks. *Bulletin of the Seismological Society of America*, 104(1), 394-409.

use rayon::prelude::*;

use crate::config::FrequencyBand;
use crate::error::PickerError;
use crate::io::Trace;
use crate::preprocessing::{bandpass, boxcar};

/// Variance below which a window counts as flat
const EPSILON: f64 = 1e-20;

/// Sliding kurtosis over a trailing window of `window` samples
///
/// Values before the first complete window repeat the first complete value.
/// Flat windows give 0. Returns an empty vector when the data is shorter
/// than the window.
pub fn sliding_kurtosis(data: &[f64], window: usize) -> Vec<f64> {
    if window < 2 || data.len() < window {
        return Vec::new();
    }
    let n = window as f64;

    // Running power sums over the window
    let (mut s1, mut s2, mut s3, mut s4) = (0.0, 0.0, 0.0, 0.0);
    let mut out = vec![0.0; data.len()];

    for i in 0..data.len() {
        let x = data[i];
        s1 += x;
        s2 += x * x;
        s3 += x * x * x;
        s4 += x * x * x * x;
        if i >= window {
            let y = data[i - window];
            s1 -= y;
            s2 -= y * y;
            s3 -= y * y * y;
            s4 -= y * y * y * y;
        }
        if i + 1 >= window {
            let mean = s1 / n;
            let m2 = s2 / n - mean * mean;
            let m4 = s4 / n - 4.0 * mean * s3 / n + 6.0 * mean * mean * s2 / n
                - 3.0 * mean.powi(4);
            out[i] = if m2 > EPSILON { m4 / (m2 * m2) } else { 0.0 };
        }
    }

    let first = out[window - 1];
    for v in out.iter_mut().take(window - 1) {
        *v = first;
    }
    out
}

/// Cumulative positive kurtosis increments minus their end-to-end trend
pub fn cumulative_kurtosis(kurtosis: &[f64]) -> Vec<f64> {
    if kurtosis.is_empty() {
        return Vec::new();
    }

    let mut cumulative = Vec::with_capacity(kurtosis.len());
    let mut acc = 0.0;
    cumulative.push(0.0);
    for w in kurtosis.windows(2) {
        acc += (w[1] - w[0]).max(0.0);
        cumulative.push(acc);
    }

    let last = cumulative.len() - 1;
    if last == 0 {
        return cumulative;
    }
    let slope = cumulative[last] / last as f64;
    cumulative
        .iter()
        .enumerate()
        .map(|(i, &c)| c - slope * i as f64)
        .collect()
}

/// Kurtosis trace for one (band, window) pair
///
/// # Arguments
///
/// * `trace` - Input trace
/// * `band` - Band-pass corners
/// * `window_seconds` - Sliding kurtosis window
/// * `smoothing` - Boxcar width applied to the result (samples)
/// * `range` - Optional `[first, last)` sample range; the kurtosis is computed
///   on the whole filtered trace and accumulated only inside the range
/// * `corners` - Butterworth sections per band edge
///
/// # Returns
///
/// The cumulative kurtosis, covering `range` (or the whole trace). Empty when
/// the trace is shorter than the window or the range is empty.
pub fn trace_to_kurtosis(
    trace: &Trace,
    band: FrequencyBand,
    window_seconds: f64,
    smoothing: usize,
    range: Option<(usize, usize)>,
    corners: usize,
) -> Result<Vec<f64>, PickerError> {
    let window = (window_seconds * trace.sampling_rate).round() as usize;
    let filtered = bandpass(&trace.data, trace.sampling_rate, band.low, band.high, corners)?;
    let kurtosis = sliding_kurtosis(&filtered, window);
    if kurtosis.is_empty() {
        return Ok(Vec::new());
    }

    let (first, last) = range.unwrap_or((0, kurtosis.len()));
    let last = last.min(kurtosis.len());
    if first >= last {
        return Ok(Vec::new());
    }

    let cumulative = cumulative_kurtosis(&kurtosis[first..last]);
    Ok(boxcar(&cumulative, smoothing))
}

/// Element-wise mean of the kurtosis traces of every (band, window) pair
///
/// Each pair is computed independently in parallel, then averaged.
///
/// # Errors
///
/// `UnusableStation` if any pair yields an empty kurtosis (trace too short
/// for the window, empty range).
pub fn mean_kurtosis(
    trace: &Trace,
    bands: &[FrequencyBand],
    windows: &[f64],
    smoothing: usize,
    range: Option<(usize, usize)>,
    corners: usize,
) -> Result<Vec<f64>, PickerError> {
    let pairs: Vec<(FrequencyBand, f64)> = bands
        .iter()
        .flat_map(|&band| windows.iter().map(move |&w| (band, w)))
        .collect();
    if pairs.is_empty() {
        return Err(PickerError::InvalidConfig(
            "no kurtosis bands or windows configured".to_string(),
        ));
    }

    let traces: Vec<Vec<f64>> = pairs
        .par_iter()
        .map(|&(band, w)| trace_to_kurtosis(trace, band, w, smoothing, range, corners))
        .collect::<Result<_, _>>()?;

    if traces.iter().any(|k| k.is_empty()) {
        return Err(PickerError::UnusableStation(format!(
            "{}: empty kurtosis (trace of {} samples too short for the window?)",
            trace.id(),
            trace.len()
        )));
    }

    let len = traces.iter().map(Vec::len).min().unwrap_or(0);
    let count = traces.len() as f64;
    let mean = (0..len)
        .map(|i| traces.iter().map(|k| k[i]).sum::<f64>() / count)
        .collect();

    log::debug!(
        "Mean kurtosis of {} over {} (band, window) pairs, {} samples",
        trace.id(),
        traces.len(),
        len
    );
    Ok(mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-noise in [-1, 1]
    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                2.0 * ((state >> 33) as f64 / (1u64 << 31) as f64) - 1.0
            })
            .collect()
    }

    #[test]
    fn test_sliding_kurtosis_gaussian_like() {
        // Uniform noise has kurtosis 1.8
        let x = noise(20000, 7);
        let k = sliding_kurtosis(&x, 2000);
        assert_eq!(k.len(), x.len());
        let tail_mean = k[5000..].iter().sum::<f64>() / (k.len() - 5000) as f64;
        assert!((tail_mean - 1.8).abs() < 0.15, "got {}", tail_mean);
    }

    #[test]
    fn test_sliding_kurtosis_short_and_flat() {
        assert!(sliding_kurtosis(&[1.0; 10], 20).is_empty());
        let flat = sliding_kurtosis(&[1.0; 100], 10);
        assert!(flat.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_sliding_kurtosis_prefix_filled() {
        let x = noise(100, 3);
        let k = sliding_kurtosis(&x, 10);
        assert!(k[..9].iter().all(|&v| v == k[9]));
    }

    #[test]
    fn test_cumulative_kurtosis_endpoints_zero() {
        let k: Vec<f64> = (0..50).map(|i| (i as f64 * 0.3).sin()).collect();
        let c = cumulative_kurtosis(&k);
        assert_eq!(c.len(), 50);
        assert!(c[0].abs() < 1e-12);
        assert!(c[49].abs() < 1e-9);
    }

    #[test]
    fn test_cumulative_kurtosis_step_gives_minimum() {
        // Flat, then a single jump at 60, then flat again
        let mut k = vec![1.0; 100];
        for v in k.iter_mut().skip(60) {
            *v = 5.0;
        }
        let c = cumulative_kurtosis(&k);
        let (imin, _) = c
            .iter()
            .enumerate()
            .fold((0, f64::INFINITY), |acc, (i, &v)| if v < acc.1 { (i, v) } else { acc });
        assert_eq!(imin, 59, "minimum just before the jump");
    }

    #[test]
    fn test_mean_kurtosis_too_short_is_unusable() {
        let tr = Trace::new("STA", "HHZ", 0.0, 100.0, noise(50, 1));
        let err = mean_kurtosis(&tr, &[FrequencyBand::new(2.0, 10.0)], &[1.0], 1, None, 2)
            .unwrap_err();
        assert!(matches!(err, PickerError::UnusableStation(_)));
    }

    #[test]
    fn test_mean_kurtosis_range_length() {
        let tr = Trace::new("STA", "HHZ", 0.0, 100.0, noise(3000, 11));
        let bands = [FrequencyBand::new(2.0, 10.0), FrequencyBand::new(5.0, 20.0)];
        let k = mean_kurtosis(&tr, &bands, &[0.5, 1.0], 1, Some((500, 1500)), 2).unwrap();
        assert_eq!(k.len(), 1000);
    }
}
