//! Butterworth band-pass filtering
//!
//! The band-pass is a cascade of second-order sections: `corners` high-pass
//! biquads at the low corner followed by `corners` low-pass biquads at the
//! high corner, each with the Q of the matching Butterworth pole pair, so
//! every edge rolls off like an order-`2 * corners` Butterworth filter.
//!
//! # Reference
//!
//! Bristow-Johnson, R. Cookbook formulae for audio EQ biquad filter coefficients.

use std::f64::consts::PI;

use crate::error::PickerError;
use crate::io::Trace;

/// Second-order IIR section (Direct Form II transposed)
#[derive(Debug, Clone)]
struct Biquad {
    s1: f64,
    s2: f64,
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

#[derive(Debug, Clone, Copy)]
enum Edge {
    HighPass,
    LowPass,
}

impl Biquad {
    fn new(edge: Edge, corner_hz: f64, q: f64, sampling_rate: f64) -> Self {
        let w0 = 2.0 * PI * corner_hz / sampling_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let (b0, b1, b2) = match edge {
            Edge::HighPass => ((1.0 + cos_w0) / 2.0, -(1.0 + cos_w0), (1.0 + cos_w0) / 2.0),
            Edge::LowPass => ((1.0 - cos_w0) / 2.0, 1.0 - cos_w0, (1.0 - cos_w0) / 2.0),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Self {
            s1: 0.0,
            s2: 0.0,
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    fn process(&mut self, sample: f64) -> f64 {
        let output = self.b0 * sample + self.s1;
        self.s1 = self.b1 * sample + self.s2 - self.a1 * output;
        self.s2 = self.b2 * sample - self.a2 * output;
        output
    }
}

/// Q factors of the pole pairs of an order-`2 * sections` Butterworth filter
fn butterworth_q(sections: usize) -> Vec<f64> {
    let order = 2 * sections;
    (0..sections)
        .map(|k| {
            let theta = PI * (2 * k + 1) as f64 / (2 * order) as f64;
            1.0 / (2.0 * theta.cos())
        })
        .collect()
}

/// Band-pass filter samples
///
/// # Arguments
///
/// * `data` - Samples
/// * `sampling_rate` - Sampling rate in Hz
/// * `freq_min` - Lower corner in Hz
/// * `freq_max` - Upper corner in Hz; at or above Nyquist only the high-pass
///   part is applied
/// * `corners` - Biquad sections per edge
///
/// # Errors
///
/// `InvalidConfig` if the corners are not `0 < freq_min < freq_max` or
/// `freq_min` is above Nyquist.
pub fn bandpass(
    data: &[f64],
    sampling_rate: f64,
    freq_min: f64,
    freq_max: f64,
    corners: usize,
) -> Result<Vec<f64>, PickerError> {
    if !(freq_min > 0.0 && freq_max > freq_min) {
        return Err(PickerError::InvalidConfig(format!(
            "band-pass corners must satisfy 0 < low < high, got [{}, {}]",
            freq_min, freq_max
        )));
    }
    let nyquist = sampling_rate / 2.0;
    if freq_min >= nyquist {
        return Err(PickerError::InvalidConfig(format!(
            "band-pass low corner {} Hz is above Nyquist ({} Hz)",
            freq_min, nyquist
        )));
    }

    let qs = butterworth_q(corners.max(1));
    let mut sections: Vec<Biquad> = qs
        .iter()
        .map(|&q| Biquad::new(Edge::HighPass, freq_min, q, sampling_rate))
        .collect();

    if freq_max < nyquist {
        sections.extend(
            qs.iter()
                .map(|&q| Biquad::new(Edge::LowPass, freq_max, q, sampling_rate)),
        );
    } else {
        log::warn!(
            "Upper corner {} Hz >= Nyquist ({} Hz), applying high-pass only",
            freq_max,
            nyquist
        );
    }

    Ok(data
        .iter()
        .map(|&x| sections.iter_mut().fold(x, |acc, s| s.process(acc)))
        .collect())
}

/// Band-pass filter a trace, returning a new trace
pub fn bandpass_trace(
    trace: &Trace,
    freq_min: f64,
    freq_max: f64,
    corners: usize,
) -> Result<Trace, PickerError> {
    let data = bandpass(&trace.data, trace.sampling_rate, freq_min, freq_max, corners)?;
    Ok(trace.with_data(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sr: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * freq * i as f64 / sr).sin()).collect()
    }

    fn rms(x: &[f64]) -> f64 {
        (x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64).sqrt()
    }

    #[test]
    fn test_butterworth_q_values() {
        let q = butterworth_q(1);
        assert!((q[0] - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
        let q = butterworth_q(2);
        assert!((q[0] - 0.5412).abs() < 1e-3);
        assert!((q[1] - 1.3066).abs() < 1e-3);
    }

    #[test]
    fn test_passband_and_stopband() {
        let sr = 100.0;
        let n = 4000;
        let pass = bandpass(&sine(8.0, sr, n), sr, 3.0, 20.0, 2).unwrap();
        let low = bandpass(&sine(0.3, sr, n), sr, 3.0, 20.0, 2).unwrap();
        let high = bandpass(&sine(45.0, sr, n), sr, 3.0, 20.0, 2).unwrap();

        // Skip the transient
        let pass_rms = rms(&pass[1000..]);
        assert!(pass_rms > 0.6, "passband should survive, rms={}", pass_rms);
        assert!(rms(&low[1000..]) < 0.05 * pass_rms);
        assert!(rms(&high[1000..]) < 0.05 * pass_rms);
    }

    #[test]
    fn test_upper_corner_above_nyquist() {
        let sr = 20.0;
        let out = bandpass(&sine(8.0, sr, 2000), sr, 1.0, 15.0, 2).unwrap();
        assert_eq!(out.len(), 2000);
        assert!(rms(&out[500..]) > 0.5);
    }

    #[test]
    fn test_invalid_corners() {
        assert!(bandpass(&[0.0; 10], 100.0, 10.0, 5.0, 2).is_err());
        assert!(bandpass(&[0.0; 10], 100.0, 60.0, 70.0, 2).is_err());
    }
}
