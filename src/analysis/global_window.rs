//! Event-wide analysis window
//!
//! Every station's vertical trace is turned into a kurtosis trace and its
//! strongest minima are collected as offsets (seconds) from the earliest
//! trace start. The densest cluster of offsets marks the event; the window is
//! that center widened by the configured left/right offsets.
//!
//! Flat-lined stations and stations whose kurtosis is empty are reported and
//! left out of all later picking.

use std::collections::BTreeMap;

use rayon::prelude::*;

use super::diagnostics::DiagnosticSink;
use super::result::GlobalWindow;
use super::statistics::densest_window_center;
use crate::config::PickerParameters;
use crate::error::PickerError;
use crate::features::kurtosis::{follow_extrema, mean_kurtosis, ExtremumKind};
use crate::io::{Component, StationWaveforms};

/// Result of the global window estimation
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalWindowEstimate {
    /// Shared analysis window
    pub window: GlobalWindow,

    /// Stations that contributed extrema (the only ones picked afterwards)
    pub stations: Vec<String>,

    /// Extremum offsets from the earliest trace start that survived the
    /// end cutoff, seconds
    pub offsets: Vec<f64>,
}

/// Kurtosis extremum offsets of one station
///
/// # Arguments
///
/// * `waveforms` - The station's traces (the vertical one is used)
/// * `reference_time` - Time the offsets are measured from
/// * `params` - Global parameters
///
/// # Errors
///
/// `UnusableStation` for a missing or flat-lined vertical trace and for an
/// empty kurtosis
pub fn station_offsets(
    waveforms: &StationWaveforms,
    reference_time: f64,
    params: &PickerParameters,
) -> Result<Vec<f64>, PickerError> {
    let trace = waveforms
        .get(Component::Z)
        .ok_or_else(|| PickerError::UnusableStation("no vertical trace".to_string()))?;
    if trace.is_flat() {
        return Err(PickerError::UnusableStation(format!(
            "{} flat-lined",
            trace.id()
        )));
    }

    let kurtosis = mean_kurtosis(
        trace,
        &[params.gw_frequency_band],
        &[params.gw_sliding_length],
        params.gw_smoothing_samples,
        None,
        params.filter_corners,
    )?;
    let extrema = follow_extrema(
        &kurtosis,
        ExtremumKind::Minimum,
        params.gw_n_extrema,
        &[params.gw_extrema_samples],
    )?;

    let trace_offset = trace.start_time - reference_time;
    Ok(extrema
        .indices()
        .into_iter()
        .map(|i| trace_offset + i as f64 / trace.sampling_rate)
        .collect())
}

/// Estimate the event-wide analysis window
///
/// # Arguments
///
/// * `stations` - Traces grouped by station
/// * `params` - Global parameters
/// * `sink` - Diagnostics receiver
///
/// # Errors
///
/// - `NoGlobalExtrema` if no station contributed an extremum before the cutoff
/// - any non-station error raised while computing kurtosis
pub fn estimate_global_window(
    stations: &BTreeMap<String, StationWaveforms>,
    params: &PickerParameters,
    sink: &dyn DiagnosticSink,
) -> Result<GlobalWindowEstimate, PickerError> {
    let traces = stations.values().flat_map(|w| w.iter().map(|(_, t)| t));
    let (t_begin, t_end) = traces.fold((f64::INFINITY, f64::NEG_INFINITY), |(b, e), t| {
        (b.min(t.start_time), e.max(t.end_time()))
    });
    if !t_begin.is_finite() || !t_end.is_finite() {
        return Err(PickerError::NoGlobalExtrema);
    }

    let names: Vec<&String> = stations.keys().collect();
    let per_station: Vec<Result<Vec<f64>, PickerError>> = names
        .par_iter()
        .map(|&name| station_offsets(&stations[name], t_begin, params))
        .collect();

    let mut contributing = Vec::new();
    let mut all_offsets = Vec::new();
    for (name, result) in names.into_iter().zip(per_station) {
        match result {
            Ok(offsets) => {
                sink.emit(
                    log::Level::Debug,
                    &format!("{}: global extrema at {:?} s", name, offsets),
                );
                contributing.push(name.clone());
                all_offsets.extend(offsets);
            }
            Err(PickerError::UnusableStation(reason)) => {
                sink.emit(
                    log::Level::Warn,
                    &format!("Station {} ignored for global window: {}", name, reason),
                );
            }
            Err(e) => return Err(e),
        }
    }

    let max_offset = params.gw_end_cutoff * (t_end - t_begin);
    all_offsets.retain(|&o| o <= max_offset);

    let center = densest_window_center(&all_offsets, params.gw_distri_secs, params.gw_scan_steps)
        .ok_or(PickerError::NoGlobalExtrema)?;

    let [left, right] = params.gw_offsets;
    let first_offset = (center + left).max(0.0);
    let last_offset = (center + right).min(max_offset);
    let window = GlobalWindow {
        first_time: t_begin + first_offset,
        last_time: t_begin + last_offset,
    };

    sink.emit(
        log::Level::Info,
        &format!(
            "Global window bounds: {:.3} to {:.3} (center offset {:.3} s, {} extrema from {} stations)",
            window.first_time,
            window.last_time,
            center,
            all_offsets.len(),
            contributing.len()
        ),
    );

    Ok(GlobalWindowEstimate {
        window,
        stations: contributing,
        offsets: all_offsets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::diagnostics::CollectingSink;
    use crate::io::Trace;

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

    /// Weak noise with a strong burst starting at `onset` seconds
    fn station(name: &str, onset: f64, seed: u64) -> StationWaveforms {
        let sr = 100.0;
        let n = 12000;
        let mut data: Vec<f64> = noise(n, seed).into_iter().map(|v| 0.01 * v).collect();
        let burst = noise(n, seed + 100);
        let start = (onset * sr) as usize;
        for i in start..(start + 800).min(n) {
            data[i] += burst[i];
        }
        let mut w = StationWaveforms::default();
        w.insert(Component::Z, Trace::new(name, "HHZ", 1000.0, sr, data));
        w
    }

    fn params() -> PickerParameters {
        PickerParameters {
            gw_sliding_length: 1.0,
            gw_n_extrema: 2,
            ..PickerParameters::default()
        }
    }

    #[test]
    fn test_window_brackets_common_onset() {
        let mut stations = BTreeMap::new();
        stations.insert("A".to_string(), station("A", 40.0, 1));
        stations.insert("B".to_string(), station("B", 42.0, 2));
        stations.insert("C".to_string(), station("C", 41.0, 3));

        let sink = CollectingSink::new();
        let est = estimate_global_window(&stations, &params(), &sink).unwrap();
        assert_eq!(est.stations.len(), 3);
        assert!(est.window.first_time >= 1000.0);
        assert!(est.window.first_time < 1040.0, "{:?}", est.window);
        assert!(est.window.last_time > 1042.0, "{:?}", est.window);
        assert!(est.window.last_time <= 1000.0 + 0.9 * 119.99 + 1e-9);
        assert!(sink.contains("Global window bounds"));
    }

    #[test]
    fn test_flat_station_is_dropped() {
        let mut stations = BTreeMap::new();
        stations.insert("A".to_string(), station("A", 40.0, 1));
        let mut flat = StationWaveforms::default();
        flat.insert(Component::Z, Trace::new("F", "HHZ", 1000.0, 100.0, vec![3.0; 12000]));
        stations.insert("F".to_string(), flat);

        let sink = CollectingSink::new();
        let est = estimate_global_window(&stations, &params(), &sink).unwrap();
        assert_eq!(est.stations, vec!["A".to_string()]);
        assert!(sink.contains("flat-lined"));
    }

    #[test]
    fn test_no_extrema_is_an_error() {
        let mut stations = BTreeMap::new();
        let mut flat = StationWaveforms::default();
        flat.insert(Component::Z, Trace::new("F", "HHZ", 0.0, 100.0, vec![0.0; 1000]));
        stations.insert("F".to_string(), flat);

        let result = estimate_global_window(&stations, &params(), &CollectingSink::new());
        assert_eq!(result, Err(PickerError::NoGlobalExtrema));
        assert!(estimate_global_window(&BTreeMap::new(), &params(), &CollectingSink::new()).is_err());
    }
}
