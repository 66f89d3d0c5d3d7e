//! Per-station onset picking
//!
//! For one station inside the shared global window:
//!
//! 1. Energy and SNR from the band-passed S components
//! 2. Trustworthiness test on the smoothed SNR; untrustworthy stations are
//!    not picked
//! 3. Optional refinement of the search interval to the stretch preceding
//!    the energy maximum
//! 4. Multi-band, multi-window kurtosis on the first P component and
//!    extremum following
//! 5. SNR gating of the extrema, then P/S assignment by polarity or by order
//! 6. Picks with SNR-derived time uncertainties, and the Wood-Anderson
//!    amplitude
//!
//! Data problems confined to the station end here as an empty result; only
//! configuration and numerical errors propagate.

use super::diagnostics::{DiagnosticSink, LogSink};
use super::result::{Amplitude, GlobalWindow, Phase, Pick};
use crate::config::{PickerParameters, StationParameters};
use crate::error::PickerError;
use crate::features::amplitude::measure_amplitude;
use crate::features::kurtosis::{follow_extrema, mean_kurtosis, ExtremumKind, KurtosisExtremum};
use crate::features::polarity::{discriminate, PhaseAssignment};
use crate::features::quality::{assess, energy, snr, time_uncertainty};
use crate::io::{ChannelMap, Component, NoResponses, ResponseProvider, StationWaveforms, Trace};
use crate::preprocessing::{bandpass_trace, boxcar};

/// External collaborators used while picking
#[derive(Clone, Copy)]
pub struct PickerHooks<'a> {
    /// Instrument responses for amplitude measurement
    pub responses: &'a dyn ResponseProvider,
    /// Receiver of diagnostic messages
    pub diagnostics: &'a dyn DiagnosticSink,
}

impl Default for PickerHooks<'static> {
    fn default() -> Self {
        Self {
            responses: &NoResponses,
            diagnostics: &LogSink,
        }
    }
}

/// Everything known about one station before picking
#[derive(Debug, Clone, Copy)]
pub struct StationInput<'a> {
    /// Station code
    pub name: &'a str,
    /// The station's demeaned traces
    pub waveforms: &'a StationWaveforms,
    /// Channel roles and output labels
    pub channel_map: &'a ChannelMap,
    /// Station tunables
    pub parameters: &'a StationParameters,
}

/// Picks and amplitude of one station
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationResult {
    /// Zero, one or two picks (P first)
    pub picks: Vec<Pick>,
    /// Wood-Anderson amplitude, if measurable
    pub amplitude: Option<Amplitude>,
}

/// Pick one station
///
/// # Errors
///
/// Configuration and numerical errors. Station-level data problems (missing
/// components, inconsistent sampling, untrustworthy SNR, no usable extrema)
/// give an empty [`StationResult`] and a diagnostic message instead.
pub fn pick_station(
    station: &StationInput<'_>,
    window: &GlobalWindow,
    params: &PickerParameters,
    hooks: &PickerHooks<'_>,
) -> Result<StationResult, PickerError> {
    match pick_station_inner(station, window, params, hooks) {
        Err(PickerError::UnusableStation(reason)) => {
            hooks.diagnostics.emit(
                log::Level::Warn,
                &format!("Station {} skipped: {}", station.name, reason),
            );
            Ok(StationResult::default())
        }
        other => other,
    }
}

fn pick_station_inner(
    station: &StationInput<'_>,
    window: &GlobalWindow,
    params: &PickerParameters,
    hooks: &PickerHooks<'_>,
) -> Result<StationResult, PickerError> {
    let sp = station.parameters;
    let sink = hooks.diagnostics;
    let sampling_rate = station.waveforms.sampling_rate()?;

    // Energy and SNR on the band-passed S components
    let band = sp.energy_band;
    let filtered: Vec<(Component, Trace)> = sp
        .s_components
        .iter()
        .zip(station.waveforms.components(&sp.s_components)?)
        .map(|(&role, trace)| {
            bandpass_trace(trace, band.low, band.high, params.filter_corners).map(|f| (role, f))
        })
        .collect::<Result<_, _>>()?;
    let filtered_refs: Vec<&Trace> = filtered.iter().map(|(_, t)| t).collect();
    let energy_trace = energy(&filtered_refs)?;
    let snr_trace = snr(&energy_trace, params.snr_noise_window, params.snr_signal_window);

    let assessment = assess(&snr_trace, window, params)?;
    if !assessment.trustworthy {
        sink.emit(
            log::Level::Info,
            &format!(
                "{}: SNR not trustworthy ({} crossings of {:.2}), not picking",
                station.name, assessment.crossings, assessment.threshold
            ),
        );
        return Ok(StationResult::default());
    }

    // Kurtosis extrema on the first P component
    let p_trace = station
        .waveforms
        .components(&sp.p_components)?
        .into_iter()
        .next()
        .ok_or_else(|| PickerError::UnusableStation("no P component".to_string()))?;
    let (first_time, last_time) = refine_window(&energy_trace, window, sp, params);
    sink.emit(
        log::Level::Debug,
        &format!(
            "{}: refined pick window {:.3} to {:.3}",
            station.name, first_time, last_time
        ),
    );

    let range = p_trace.index_range(first_time, last_time);
    let kurtosis = mean_kurtosis(
        p_trace,
        &sp.kurtosis_bands,
        &sp.kurtosis_window_lengths,
        1,
        Some(range),
        params.filter_corners,
    )?;
    let followed = follow_extrema(
        &kurtosis,
        ExtremumKind::Minimum,
        sp.n_follow,
        &sp.kurtosis_smoothing_sequence,
    )?;

    let ladder = &params.snr_quality_thresholds;
    let extrema: Vec<KurtosisExtremum> = followed
        .extrema
        .iter()
        .map(|e| {
            let index = range.0 + e.index;
            let snr_value = snr_trace.data[snr_trace.index_of(p_trace.time_of(index))];
            KurtosisExtremum {
                index,
                snr: snr_value,
            }
        })
        .filter(|e| e.snr >= ladder.min())
        .collect();
    sink.emit(
        log::Level::Debug,
        &format!("{}: extrema {:?}", station.name, extrema),
    );
    if extrema.is_empty() {
        return Err(PickerError::UnusableStation(format!(
            "no extremum reaches SNR {}",
            ladder.min()
        )));
    }

    // Phase assignment
    let (onset_p, onset_s) = if sp.use_polarity {
        match polarity_assignment(&extrema, &filtered, p_trace, params) {
            Some(assignment) => assignment,
            None => {
                sink.emit(
                    log::Level::Debug,
                    &format!("{}: polarity needs Z, N and E; assigning by order", station.name),
                );
                order_assignment(&extrema, sp.n_follow)
            }
        }
    } else {
        order_assignment(&extrema, sp.n_follow)
    };

    // Picks
    let mut picks = Vec::with_capacity(2);
    for (onset, phase) in [(onset_p, Phase::P), (onset_s, Phase::S)] {
        let Some(extremum) = onset else { continue };
        let (channel, hint) = match phase {
            Phase::P => (&station.channel_map.p_write_channel, &station.channel_map.p_write_phase),
            Phase::S => (&station.channel_map.s_write_channel, &station.channel_map.s_write_phase),
        };
        picks.push(Pick {
            station: station.name.to_string(),
            channel: channel.clone(),
            phase,
            phase_hint: hint.clone(),
            time: p_trace.time_of(extremum.index),
            time_uncertainty: time_uncertainty(extremum.snr, phase, ladder, sampling_rate),
            snr: extremum.snr,
        });
    }

    let amplitude = match measure_amplitude(station.waveforms, &picks, sp, params, hooks.responses) {
        Ok(amplitude) => amplitude,
        Err(e) => {
            sink.emit(
                log::Level::Warn,
                &format!("{}: amplitude not measured: {}", station.name, e),
            );
            None
        }
    };

    Ok(StationResult { picks, amplitude })
}

/// Search interval for the kurtosis, as absolute times
///
/// With a zero energy window this is the global window. Otherwise it is the
/// stretch of `floor(sr * (energy_window + longest kurtosis window))` samples
/// ending at the smoothed-energy maximum inside the global window, moved to
/// start at the first sample if it would begin before it.
pub fn refine_window(
    energy: &Trace,
    window: &GlobalWindow,
    station_params: &StationParameters,
    params: &PickerParameters,
) -> (f64, f64) {
    if station_params.energy_window == 0.0 || energy.is_empty() {
        return (window.first_time, window.last_time);
    }

    let smoothed = boxcar(&energy.data, params.energy_smoothing_samples);
    let (first, last) = energy.index_range(window.first_time, window.last_time);
    let Some(i_max) = (first..last)
        .filter(|&i| !smoothed[i].is_nan())
        .reduce(|best, i| if smoothed[i] > smoothed[best] { i } else { best })
    else {
        return (window.first_time, window.last_time);
    };

    let precursor = (energy.sampling_rate
        * (station_params.energy_window + station_params.max_kurtosis_window()))
    .floor() as usize;
    let (first_sample, last_sample) = if i_max >= precursor {
        (i_max - precursor, i_max)
    } else {
        (0, precursor)
    };
    (energy.time_of(first_sample), energy.time_of(last_sample))
}

/// P/S assignment by extremum order
///
/// One followed onset: the strongest extremum is P. Two: the earlier one is
/// P and the later one S; a lone survivor is P.
fn order_assignment(
    extrema: &[KurtosisExtremum],
    n_follow: usize,
) -> (Option<KurtosisExtremum>, Option<KurtosisExtremum>) {
    if n_follow == 1 {
        return (extrema.first().copied(), None);
    }
    let mut sorted = extrema.to_vec();
    sorted.sort_by_key(|e| e.index);
    (sorted.first().copied(), sorted.get(1).copied())
}

/// P/S assignment by polarity; `None` if Z, N and E are not all filtered
fn polarity_assignment(
    extrema: &[KurtosisExtremum],
    filtered: &[(Component, Trace)],
    p_trace: &Trace,
    params: &PickerParameters,
) -> Option<(Option<KurtosisExtremum>, Option<KurtosisExtremum>)> {
    let role = |c: Component| filtered.iter().find(|(r, _)| *r == c).map(|(_, t)| t);
    let (z, n, e) = (role(Component::Z)?, role(Component::N)?, role(Component::E)?);

    // Candidates in the filtered traces' sample frame
    let candidates: Vec<usize> = extrema
        .iter()
        .take(2)
        .map(|x| z.index_of(p_trace.time_of(x.index)))
        .collect();
    let PhaseAssignment { p, s } = discriminate(
        [z, n, e],
        &candidates,
        params.polarization_window,
        &params.dip_rect_thresholds,
    );

    let back = |idx: Option<usize>| {
        idx.and_then(|i| candidates.iter().position(|&c| c == i))
            .map(|k| extrema[k])
    };
    Some((back(p), back(s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::diagnostics::CollectingSink;
    use crate::config::FrequencyBand;

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

    const SR: f64 = 100.0;
    const N: usize = 6000;

    /// Weak noise, a P burst at `p` seconds and a stronger S burst at `s`
    fn vertical(p: f64, s: f64, seed: u64) -> Trace {
        let base = noise(N, seed);
        let burst = noise(N, seed + 7);
        let data = (0..N)
            .map(|i| {
                let t = i as f64 / SR;
                let mut v = 0.01 * base[i];
                if t >= p {
                    v += 0.2 * burst[i] * (-(t - p) / 4.0).exp();
                }
                if t >= s {
                    v += 3.0 * burst[(i * 7) % N] * (-(t - s) / 6.0).exp();
                }
                v
            })
            .collect();
        Trace::new("STA", "HHZ", 0.0, SR, data)
    }

    fn station_params() -> StationParameters {
        StationParameters {
            s_components: vec![Component::Z],
            kurtosis_bands: vec![FrequencyBand::new(2.0, 20.0)],
            kurtosis_window_lengths: vec![1.0],
            kurtosis_smoothing_sequence: vec![100, 20],
            ..StationParameters::default()
        }
    }

    fn window() -> GlobalWindow {
        GlobalWindow {
            first_time: 5.0,
            last_time: 50.0,
        }
    }

    #[test]
    fn test_picks_p_and_s_by_order() {
        let mut waveforms = StationWaveforms::default();
        waveforms.insert(Component::Z, vertical(20.0, 30.0, 11));
        let map = ChannelMap::new("HHZ", None, None);
        let sp = station_params();
        let input = StationInput {
            name: "STA",
            waveforms: &waveforms,
            channel_map: &map,
            parameters: &sp,
        };
        let sink = CollectingSink::new();
        let hooks = PickerHooks {
            responses: &NoResponses,
            diagnostics: &sink,
        };

        let params = PickerParameters {
            snr_max_threshold_crossings: 10,
            ..PickerParameters::default()
        };
        let result = pick_station(&input, &window(), &params, &hooks).unwrap();
        assert_eq!(result.picks.len(), 2, "{:?}", sink.messages());
        let p = &result.picks[0];
        let s = &result.picks[1];
        assert_eq!(p.phase, Phase::P);
        assert_eq!(s.phase, Phase::S);
        assert!((p.time - 20.0).abs() < 1.0, "P at {}", p.time);
        assert!((s.time - 30.0).abs() < 1.0, "S at {}", s.time);
        let ladder = &params.snr_quality_thresholds;
        assert_eq!(s.time_uncertainty, time_uncertainty(s.snr, Phase::S, ladder, SR));
        assert_eq!(p.phase_hint, "P");
        assert!(result.amplitude.is_none());
    }

    #[test]
    fn test_untrustworthy_station_is_empty() {
        let mut waveforms = StationWaveforms::default();
        let quiet: Vec<f64> = noise(N, 5).into_iter().map(|v| 0.01 * v).collect();
        waveforms.insert(Component::Z, Trace::new("STA", "HHZ", 0.0, SR, quiet));
        let map = ChannelMap::new("HHZ", None, None);
        let sp = station_params();
        let input = StationInput {
            name: "STA",
            waveforms: &waveforms,
            channel_map: &map,
            parameters: &sp,
        };
        let sink = CollectingSink::new();
        let hooks = PickerHooks {
            responses: &NoResponses,
            diagnostics: &sink,
        };
        let result = pick_station(&input, &window(), &PickerParameters::default(), &hooks).unwrap();
        assert!(result.picks.is_empty());
        assert!(sink.contains("not trustworthy"));
    }

    #[test]
    fn test_missing_component_is_skipped() {
        let mut waveforms = StationWaveforms::default();
        waveforms.insert(Component::Z, vertical(20.0, 30.0, 3));
        let map = ChannelMap::new("HHZ", None, None);
        // Default S components need N and E
        let sp = StationParameters::default();
        let input = StationInput {
            name: "STA",
            waveforms: &waveforms,
            channel_map: &map,
            parameters: &sp,
        };
        let sink = CollectingSink::new();
        let hooks = PickerHooks {
            responses: &NoResponses,
            diagnostics: &sink,
        };
        let result = pick_station(&input, &window(), &PickerParameters::default(), &hooks).unwrap();
        assert_eq!(result, StationResult::default());
        assert!(sink.contains("skipped"));
    }

    #[test]
    fn test_refine_window() {
        let mut data = vec![0.0; 3000];
        for v in data.iter_mut().skip(2000).take(100) {
            *v = 10.0;
        }
        let energy = Trace::new("STA", "NRG", 100.0, 100.0, data);
        let params = PickerParameters::default();
        let w = GlobalWindow {
            first_time: 100.0,
            last_time: 129.99,
        };

        let mut sp = StationParameters::default();
        assert_eq!(refine_window(&energy, &w, &sp, &params), (100.0, 129.99));

        sp.energy_window = 4.0;
        sp.kurtosis_window_lengths = vec![1.0];
        let (first, last) = refine_window(&energy, &w, &sp, &params);
        assert!((last - first - 5.0).abs() < 1e-9);
        assert!(last > 120.0 && last < 121.0, "last {}", last);

        // Maximum too early for the full precursor: [0, precursor]
        let mut early = vec![0.0; 3000];
        early[100] = 10.0;
        let energy = energy.with_data(early);
        let (first, last) = refine_window(&energy, &w, &sp, &params);
        assert_eq!(first, 100.0);
        assert!((last - 105.0).abs() < 1e-9);
    }

    #[test]
    fn test_order_assignment() {
        let a = KurtosisExtremum { index: 500, snr: 3.0 };
        let b = KurtosisExtremum { index: 200, snr: 8.0 };
        assert_eq!(order_assignment(&[a, b], 1), (Some(a), None));
        assert_eq!(order_assignment(&[a, b], 2), (Some(b), Some(a)));
        assert_eq!(order_assignment(&[a], 2), (Some(a), None));
    }
}
