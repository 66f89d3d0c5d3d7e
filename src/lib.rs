//! # PS Picker
//!
//! Kurtosis-based P and S onset picking for local earthquakes, with a simple
//! cross-station association and an origin time estimate.
//!
//! ## Features
//!
//! - **Global window**: the densest cluster of kurtosis minima over all
//!   stations bounds where arrivals are searched
//! - **Station picking**: multi-band, multi-window kurtosis with
//!   coarse-to-fine extremum following, gated by an adaptive SNR test
//! - **Phase assignment**: by arrival order, or by 3-component polarization
//!   (dip and rectilinearity)
//! - **Association**: clustering, pick-time and P-S delay outlier rejection
//! - **Origin time** from P-S delays under a constant Vp/Vs
//! - **Amplitude**: optional Wood-Anderson peak-to-peak amplitude when an
//!   instrument response is available
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use ps_picker::{pick_event, ChannelMap, PickerParameters, StationParameters, Trace};
//!
//! // One vertical trace per station (POSIX start time, 100 Hz)
//! let traces = vec![Trace::new("ANTF", "HHZ", 1_600_000_000.0, 100.0, vec![0.0; 12_000])];
//!
//! let mut channel_maps = BTreeMap::new();
//! channel_maps.insert("ANTF".to_string(), ChannelMap::new("HHZ", None, None));
//! let mut station_parameters = BTreeMap::new();
//! station_parameters.insert("ANTF".to_string(), StationParameters::default());
//!
//! let event = pick_event(&traces, &channel_maps, &station_parameters, &PickerParameters::default())?;
//! for pick in &event.picks {
//!     println!("{} {} at {:.2} (±{:.2} s)", pick.station, pick.phase, pick.time, pick.time_uncertainty);
//! }
//! # Ok::<(), ps_picker::PickerError>(())
//! ```
//!
//! ## Architecture
//!
//! The picking pipeline follows this flow:
//!
//! ```text
//! Traces → Demean → Global window → Station picking (parallel) → Association → Origin time → Event
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::collections::BTreeMap;

use rayon::prelude::*;

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;

// Re-export main types
pub use analysis::batch::{pick_events, BatchReport, EventFailure, EventRecord};
pub use analysis::diagnostics::{CollectingSink, DiagnosticSink, LogSink};
pub use analysis::result::{Amplitude, Event, GlobalWindow, Phase, Pick};
pub use analysis::station::PickerHooks;
pub use config::{DipRectThresholds, FrequencyBand, PickerParameters, QualityThresholds, StationParameters};
pub use error::PickerError;
pub use io::{ChannelMap, Component, NoResponses, PolesZeros, ResponseProvider, StaticResponses, Trace};

use analysis::association::associate;
use analysis::global_window::estimate_global_window;
use analysis::origin::estimate_origin_time;
use analysis::result::retain_anchored;
use analysis::station::{pick_station, StationInput, StationResult};
use io::group_by_station;
use preprocessing::demean;

/// Main picking function
///
/// Picks P and S onsets on every usable station of one event and estimates
/// its origin time. Amplitudes are skipped and diagnostics go to the `log`
/// facade; use [`pick_event_with`] to supply instrument responses or another
/// diagnostics sink.
///
/// # Arguments
///
/// * `traces` - Every trace of the event
/// * `channel_maps` - Channel map per station
/// * `station_parameters` - Tunables per station
/// * `params` - Global parameters
///
/// # Returns
///
/// The picked `Event`
///
/// # Errors
///
/// - `InvalidConfig` for bad parameters or channel maps
/// - `InvalidInput` for an empty trace set or malformed traces
/// - `NoGlobalExtrema` if no station yields kurtosis extrema
/// - `NoSurvivingPicks` if association leaves nothing to date the event with
pub fn pick_event(
    traces: &[Trace],
    channel_maps: &BTreeMap<String, ChannelMap>,
    station_parameters: &BTreeMap<String, StationParameters>,
    params: &PickerParameters,
) -> Result<Event, PickerError> {
    pick_event_with(
        traces,
        channel_maps,
        station_parameters,
        params,
        &PickerHooks::default(),
    )
}

/// [`pick_event`] with explicit response provider and diagnostics sink
///
/// Only stations present in both `channel_maps` and `station_parameters` are
/// considered. Stations whose data cannot be used are reported through
/// `hooks.diagnostics` and contribute nothing.
///
/// # Errors
///
/// Same as [`pick_event`]
pub fn pick_event_with(
    traces: &[Trace],
    channel_maps: &BTreeMap<String, ChannelMap>,
    station_parameters: &BTreeMap<String, StationParameters>,
    params: &PickerParameters,
    hooks: &PickerHooks<'_>,
) -> Result<Event, PickerError> {
    use std::time::Instant;
    let start_time = Instant::now();

    log::debug!("Starting event picking: {} traces", traces.len());

    params.validate()?;
    for map in channel_maps.values() {
        map.validate()?;
    }
    for (name, sp) in station_parameters {
        sp.validate(name)?;
    }

    if traces.is_empty() {
        return Err(PickerError::InvalidInput("Empty trace set".to_string()));
    }
    for trace in traces {
        trace.validate()?;
    }

    let demeaned: Vec<Trace> = traces.iter().map(|t| t.with_data(demean(&t.data))).collect();

    let maps: BTreeMap<String, ChannelMap> = channel_maps
        .iter()
        .filter(|(name, _)| station_parameters.contains_key(*name))
        .map(|(name, map)| (name.clone(), map.clone()))
        .collect();
    let stations = group_by_station(&demeaned, &maps);
    log::debug!("{} stations with channel map and parameters", stations.len());

    // Global window
    let estimate = estimate_global_window(&stations, params, hooks.diagnostics)?;

    // Station picking
    let results: Vec<Result<StationResult, PickerError>> = estimate
        .stations
        .par_iter()
        .filter_map(|name| {
            let input = StationInput {
                name,
                waveforms: stations.get(name)?,
                channel_map: maps.get(name)?,
                parameters: station_parameters.get(name)?,
            };
            Some(pick_station(&input, &estimate.window, params, hooks))
        })
        .collect();

    let mut picks = Vec::new();
    let mut amplitudes = Vec::new();
    for result in results {
        let result = result?;
        picks.extend(result.picks);
        amplitudes.extend(result.amplitude);
    }
    log::debug!("{} picks before association", picks.len());

    // Association
    let (picks, _report) = associate(picks, stations.len(), params, hooks.diagnostics);
    retain_anchored(&mut amplitudes, &picks);

    // Origin time
    let origin_time = estimate_origin_time(&picks, params.vp_over_vs)?;

    log::debug!(
        "Event picked in {:.1} ms: {} picks, {} amplitudes, origin {:.3}",
        start_time.elapsed().as_secs_f64() * 1000.0,
        picks.len(),
        amplitudes.len(),
        origin_time
    );

    Ok(Event {
        origin_time,
        picks,
        amplitudes,
    })
}
