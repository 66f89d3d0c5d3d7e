//! Wood-Anderson amplitude measurement
//!
//! A station's traces are converted to simulated Wood-Anderson records and the
//! largest peak-to-peak amplitude is measured in a window anchored to the S
//! pick when there is one, else to the P pick.

pub mod peak_to_peak;
pub mod wood_anderson;

pub use peak_to_peak::{peak_to_peak, PeakToPeak};
pub use wood_anderson::{simulate, WATER_LEVEL_DB};

use crate::analysis::result::{Amplitude, Phase, Pick};
use crate::config::{PickerParameters, StationParameters};
use crate::error::PickerError;
use crate::io::{PolesZeros, ResponseProvider, StationWaveforms, Trace};

/// Window around an S pick: (before, after) in seconds
const S_WINDOW: (f64, f64) = (20.0, 10.0);

/// Window around a P pick: (before, after) in seconds
const P_WINDOW: (f64, f64) = (5.0, 30.0);

/// Measure the Wood-Anderson amplitude of one station
///
/// # Arguments
///
/// * `waveforms` - The station's demeaned raw traces
/// * `picks` - The station's picks
/// * `station_params` - Station parameters (response file, components)
/// * `params` - Global parameters (response file format)
/// * `responses` - Response source
///
/// # Returns
///
/// `None` when the station has no pick, no response file, or the provider
/// does not know the response
///
/// # Errors
///
/// `UnusableStation` if a measured component is missing, `NumericalError`
/// for a degenerate response
pub fn measure_amplitude(
    waveforms: &StationWaveforms,
    picks: &[Pick],
    station_params: &StationParameters,
    params: &PickerParameters,
    responses: &dyn ResponseProvider,
) -> Result<Option<Amplitude>, PickerError> {
    let anchor = picks
        .iter()
        .find(|p| p.phase == Phase::S)
        .or_else(|| picks.iter().find(|p| p.phase == Phase::P));
    let Some(anchor) = anchor else {
        return Ok(None);
    };
    let Some(file) = station_params.response_file.as_deref() else {
        return Ok(None);
    };
    let Some(instrument) = responses.poles_zeros(file, params.response_file_type) else {
        log::debug!("{}: no response for '{}', amplitude skipped", anchor.station, file);
        return Ok(None);
    };

    let roles = if station_params.use_polarity {
        &station_params.s_components
    } else {
        &station_params.p_components
    };
    let wood_anderson = PolesZeros::wood_anderson();
    let simulated: Vec<Trace> = waveforms
        .components(roles)?
        .into_iter()
        .map(|t| simulate(t, &instrument, &wood_anderson, WATER_LEVEL_DB))
        .collect::<Result<_, _>>()?;

    let (before, after) = match anchor.phase {
        Phase::S => S_WINDOW,
        Phase::P => P_WINDOW,
    };
    let Some(measured) = peak_to_peak(&simulated, anchor.time, before, after) else {
        return Ok(None);
    };

    log::debug!(
        "{}: Wood-Anderson amplitude {:.4e}, period {:.3}s around {} pick",
        anchor.station,
        measured.value,
        measured.period,
        anchor.phase
    );

    Ok(Some(Amplitude {
        station: anchor.station.clone(),
        value: measured.value,
        period: measured.period,
        pick_phase: anchor.phase,
        pick_time: anchor.time,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{Component, StaticResponses};

    fn pick(phase: Phase, time: f64) -> Pick {
        Pick {
            station: "STA".to_string(),
            channel: "HHZ".to_string(),
            phase,
            phase_hint: phase.name().to_string(),
            time,
            time_uncertainty: 0.02,
            snr: 10.0,
        }
    }

    fn waveforms() -> StationWaveforms {
        let data: Vec<f64> = (0..8192)
            .map(|i| {
                let t = i as f64 / 100.0;
                if (40.0..44.0).contains(&t) {
                    (2.0 * std::f64::consts::PI * 2.0 * t).sin()
                } else {
                    0.0
                }
            })
            .collect();
        let mut w = StationWaveforms::default();
        w.insert(Component::Z, Trace::new("STA", "HHZ", 0.0, 100.0, data));
        w
    }

    fn responses() -> StaticResponses {
        let mut r = StaticResponses::new();
        r.insert(
            "STA.pz",
            PolesZeros {
                poles: Vec::new(),
                zeros: Vec::new(),
                gain: 1.0,
                sensitivity: 1.0,
            },
        );
        r
    }

    fn station_params() -> StationParameters {
        StationParameters {
            response_file: Some("STA.pz".to_string()),
            ..StationParameters::default()
        }
    }

    #[test]
    fn test_measures_around_p_pick() {
        let picks = vec![pick(Phase::P, 39.0)];
        let amp = measure_amplitude(
            &waveforms(),
            &picks,
            &station_params(),
            &PickerParameters::default(),
            &responses(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(amp.pick_phase, Phase::P);
        assert_eq!(amp.pick_time, 39.0);
        assert!(amp.value > 0.0);
        assert!(amp.period > 0.0 && amp.period < 10.0, "period {}", amp.period);
    }

    #[test]
    fn test_prefers_s_pick() {
        let picks = vec![pick(Phase::P, 39.0), pick(Phase::S, 41.0)];
        let amp = measure_amplitude(
            &waveforms(),
            &picks,
            &station_params(),
            &PickerParameters::default(),
            &responses(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(amp.pick_phase, Phase::S);
        assert_eq!(amp.pick_time, 41.0);
    }

    #[test]
    fn test_skipped_without_response_or_pick() {
        let params = PickerParameters::default();
        let picks = vec![pick(Phase::P, 39.0)];
        let none = StationParameters::default();
        assert!(measure_amplitude(&waveforms(), &picks, &none, &params, &responses())
            .unwrap()
            .is_none());
        assert!(
            measure_amplitude(&waveforms(), &picks, &station_params(), &params, &crate::io::NoResponses)
                .unwrap()
                .is_none()
        );
        assert!(measure_amplitude(&waveforms(), &[], &station_params(), &params, &responses())
            .unwrap()
            .is_none());
    }
}
