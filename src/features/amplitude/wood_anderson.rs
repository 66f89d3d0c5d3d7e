//! Wood-Anderson seismograph simulation
//!
//! The instrument response is removed and the Wood-Anderson response applied
//! in the frequency domain:
//!
//! ```text
//! Y(f) = X(f) * H_wa(f) / H_inst(f)
//! ```
//!
//! Near the zeros of `H_inst` the division is stabilised with a water level:
//! any spectral value whose magnitude is below `max|H_inst| * 10^(-wl/20)` is
//! raised to that magnitude, keeping its phase.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::error::PickerError;
use crate::io::{PolesZeros, Trace};
use crate::preprocessing::demean;

/// Default water level in dB
pub const WATER_LEVEL_DB: f64 = 60.0;

/// Signed frequency of FFT bin `k`
fn bin_frequency(k: usize, n: usize, sampling_rate: f64) -> f64 {
    let k = if k <= n / 2 {
        k as f64
    } else {
        k as f64 - n as f64
    };
    k * sampling_rate / n as f64
}

/// Apply the water level to an instrument spectrum in place
fn apply_water_level(spectrum: &mut [Complex<f64>], water_level_db: f64) -> Result<(), PickerError> {
    let peak = spectrum.iter().map(|h| h.norm()).fold(0.0f64, f64::max);
    if peak <= 0.0 || !peak.is_finite() {
        return Err(PickerError::NumericalError(format!(
            "instrument response has no usable gain (peak {})",
            peak
        )));
    }
    let level = peak * 10f64.powf(-water_level_db / 20.0);
    for h in spectrum.iter_mut() {
        let magnitude = h.norm();
        if magnitude < level {
            *h = if magnitude > 0.0 {
                *h * (level / magnitude)
            } else {
                Complex::new(level, 0.0)
            };
        }
    }
    Ok(())
}

/// Replace the instrument response of a trace by another one
///
/// # Arguments
///
/// * `trace` - Raw trace (counts)
/// * `remove` - Instrument response to remove
/// * `simulate` - Response to simulate (usually [`PolesZeros::wood_anderson`])
/// * `water_level_db` - Water level for the spectral division
///
/// # Returns
///
/// Simulated trace, same length and metadata as the input
///
/// # Errors
///
/// `NumericalError` if the instrument response is zero everywhere
pub fn simulate(
    trace: &Trace,
    remove: &PolesZeros,
    simulate: &PolesZeros,
    water_level_db: f64,
) -> Result<Trace, PickerError> {
    let n = trace.len();
    if n == 0 {
        return Ok(trace.clone());
    }
    let fft_size = n.next_power_of_two();

    let mut spectrum: Vec<Complex<f64>> = demean(&trace.data)
        .into_iter()
        .map(|x| Complex::new(x, 0.0))
        .collect();
    spectrum.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut spectrum);

    let mut instrument: Vec<Complex<f64>> = (0..fft_size)
        .map(|k| remove.evaluate(bin_frequency(k, fft_size, trace.sampling_rate)))
        .collect();
    apply_water_level(&mut instrument, water_level_db)?;

    for (k, (x, h)) in spectrum.iter_mut().zip(&instrument).enumerate() {
        let target = simulate.evaluate(bin_frequency(k, fft_size, trace.sampling_rate));
        *x = *x / *h * target;
    }

    let ifft = planner.plan_fft_inverse(fft_size);
    ifft.process(&mut spectrum);

    let scale = 1.0 / fft_size as f64;
    let data = spectrum[..n].iter().map(|x| x.re * scale).collect();
    Ok(trace.with_data(data))
}
