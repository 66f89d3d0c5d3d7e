//! Energy envelope and signal-to-noise ratio
//!
//! Energy is the L2 norm across the components of a filtered station:
//! E[i] = sqrt(Σ_c x_c[i]²).
//!
//! The SNR at sample i compares the RMS energy of the signal window that
//! starts at i with the RMS energy of the noise window that ends just
//! before i:
//!
//! ```text
//!   noise: [i - n_noise, i)      signal: [i, i + n_signal)
//!   SNR[i] = rms(signal) / rms(noise)
//! ```
//!
//! so an arrival produces its SNR peak at the onset sample itself.

use crate::error::PickerError;
use crate::io::Trace;

/// Energy envelope of component traces
///
/// Traces are truncated to the shortest one.
///
/// # Errors
///
/// `UnusableStation` if no trace is given or they are empty.
pub fn energy(traces: &[&Trace]) -> Result<Trace, PickerError> {
    let Some(first) = traces.first() else {
        return Err(PickerError::UnusableStation(
            "no components for energy".to_string(),
        ));
    };
    let len = traces.iter().map(|t| t.len()).min().unwrap_or(0);
    if len == 0 {
        return Err(PickerError::UnusableStation(format!(
            "{}: empty component",
            first.station
        )));
    }

    let data = (0..len)
        .map(|i| traces.iter().map(|t| t.data[i] * t.data[i]).sum::<f64>().sqrt())
        .collect();

    let mut out = first.with_data(data);
    out.channel = "NRG".to_string();
    Ok(out)
}

/// Signal-to-noise ratio of an energy trace
///
/// # Arguments
///
/// * `energy` - Energy envelope
/// * `noise_window` - Noise window length, seconds
/// * `signal_window` - Signal window length, seconds
///
/// # Returns
///
/// SNR trace of the same length. Windows are truncated at the edges; an
/// empty window, or silence in both windows, gives 1.0.
pub fn snr(energy: &Trace, noise_window: f64, signal_window: f64) -> Trace {
    let n = energy.len();
    let n_noise = ((noise_window * energy.sampling_rate).round() as usize).max(1);
    let n_signal = ((signal_window * energy.sampling_rate).round() as usize).max(1);

    // Prefix sums of squared energy
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    let mut acc = 0.0;
    for &e in &energy.data {
        acc += e * e;
        prefix.push(acc);
    }
    let mean_square = |lo: usize, hi: usize| -> Option<f64> {
        if hi > lo {
            Some(((prefix[hi] - prefix[lo]) / (hi - lo) as f64).max(0.0))
        } else {
            None
        }
    };

    let data = (0..n)
        .map(|i| {
            let noise = mean_square(i.saturating_sub(n_noise), i);
            let signal = mean_square(i, (i + n_signal).min(n));
            match (noise, signal) {
                (Some(noise), Some(signal)) => {
                    if noise > 0.0 {
                        (signal / noise).sqrt()
                    } else if signal > 0.0 {
                        (signal / f64::EPSILON).sqrt()
                    } else {
                        1.0
                    }
                }
                _ => 1.0,
            }
        })
        .collect();

    let mut out = energy.with_data(data);
    out.channel = "SNR".to_string();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_is_l2_norm() {
        let a = Trace::new("S", "Z", 0.0, 10.0, vec![3.0, 0.0, 1.0]);
        let b = Trace::new("S", "N", 0.0, 10.0, vec![4.0, 2.0]);
        let e = energy(&[&a, &b]).unwrap();
        assert_eq!(e.data, vec![5.0, 2.0]);
        assert!(energy(&[]).is_err());
    }

    #[test]
    fn test_snr_peaks_at_step() {
        // Quiet then loud from sample 500
        let data: Vec<f64> = (0..1000).map(|i| if i < 500 { 1.0 } else { 10.0 }).collect();
        let e = Trace::new("S", "NRG", 0.0, 100.0, data);
        let s = snr(&e, 2.0, 1.0);
        assert_eq!(s.len(), 1000);
        assert!((s.data[500] - 10.0).abs() < 1e-9, "got {}", s.data[500]);
        assert!((s.data[200] - 1.0).abs() < 1e-9);
        // Signal window partially over the step
        assert!(s.data[450] > 1.0 && s.data[450] < 10.0);
    }

    #[test]
    fn test_snr_flat_zero_is_one() {
        let e = Trace::new("S", "NRG", 0.0, 100.0, vec![0.0; 300]);
        let s = snr(&e, 1.0, 0.5);
        assert!(s.data.iter().all(|&v| v == 1.0));
    }
}
