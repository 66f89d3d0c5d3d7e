//! Picking many events at once
//!
//! Events are independent, so they are picked in parallel. A failing event is
//! reported with its id and never stops the others.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::result::Event;
use super::station::PickerHooks;
use crate::config::{PickerParameters, StationParameters};
use crate::error::PickerError;
use crate::io::{ChannelMap, Trace};

/// Traces of one event, with the id used to report it
#[derive(Debug, Clone)]
pub struct EventRecord {
    /// Caller-chosen identifier (file name, catalog id...)
    pub id: String,

    /// Every trace of the event
    pub traces: Vec<Trace>,
}

/// An event that could not be picked
#[derive(Debug, Clone, PartialEq)]
pub struct EventFailure {
    /// Identifier of the failed event
    pub id: String,

    /// Why it failed
    pub error: PickerError,
}

/// Outcome of a batch run, in input order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Picked events with their ids
    pub events: Vec<(String, Event)>,

    /// Events that failed
    pub failures: Vec<EventFailure>,
}

/// Compact per-event summary, suitable for a run log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Event identifier
    pub id: String,
    /// Origin time (POSIX seconds)
    pub origin_time: f64,
    /// Number of P picks
    pub n_p: usize,
    /// Number of S picks
    pub n_s: usize,
}

impl BatchReport {
    /// Number of events handled (picked or failed)
    pub fn len(&self) -> usize {
        self.events.len() + self.failures.len()
    }

    /// True if no event was handled
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One summary per picked event
    pub fn summaries(&self) -> Vec<EventSummary> {
        use super::result::Phase;

        self.events
            .iter()
            .map(|(id, event)| EventSummary {
                id: id.clone(),
                origin_time: event.origin_time,
                n_p: event.picks_of(Phase::P).count(),
                n_s: event.picks_of(Phase::S).count(),
            })
            .collect()
    }
}

/// Pick every event in `events`
///
/// # Arguments
///
/// * `events` - Events to pick
/// * `channel_maps` - Channel map per station
/// * `station_parameters` - Tunables per station
/// * `params` - Global parameters
/// * `hooks` - Response provider and diagnostics sink shared by all events
///
/// # Returns
///
/// A `BatchReport` listing picked and failed events in input order
pub fn pick_events(
    events: &[EventRecord],
    channel_maps: &BTreeMap<String, ChannelMap>,
    station_parameters: &BTreeMap<String, StationParameters>,
    params: &PickerParameters,
    hooks: &PickerHooks<'_>,
) -> BatchReport {
    log::info!("Picking {} events", events.len());

    let outcomes: Vec<Result<Event, PickerError>> = events
        .par_iter()
        .map(|record| {
            crate::pick_event_with(
                &record.traces,
                channel_maps,
                station_parameters,
                params,
                hooks,
            )
        })
        .collect();

    let mut report = BatchReport::default();
    for (record, outcome) in events.iter().zip(outcomes) {
        match outcome {
            Ok(event) => {
                log::info!(
                    "{}: {} picks, origin {:.3}",
                    record.id,
                    event.picks.len(),
                    event.origin_time
                );
                report.events.push((record.id.clone(), event));
            }
            Err(error) => {
                if error.is_data_insufficiency() {
                    log::warn!("{}: {}", record.id, error);
                } else {
                    log::error!("{} failed: {}", record.id, error);
                }
                report.failures.push(EventFailure {
                    id: record.id.clone(),
                    error,
                });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::diagnostics::CollectingSink;
    use crate::analysis::result::{Phase, Pick};
    use crate::io::NoResponses;

    #[test]
    fn test_failures_do_not_stop_other_events() {
        let mut maps = BTreeMap::new();
        maps.insert("A".to_string(), ChannelMap::new("HHZ", None, None));
        let mut station_params = BTreeMap::new();
        station_params.insert("A".to_string(), StationParameters::default());

        let events = vec![
            EventRecord {
                id: "empty".to_string(),
                traces: Vec::new(),
            },
            EventRecord {
                id: "flat".to_string(),
                traces: vec![Trace::new("A", "HHZ", 0.0, 100.0, vec![0.0; 2000])],
            },
        ];
        let sink = CollectingSink::new();
        let hooks = PickerHooks {
            responses: &NoResponses,
            diagnostics: &sink,
        };
        let report = pick_events(
            &events,
            &maps,
            &station_params,
            &PickerParameters::default(),
            &hooks,
        );
        assert_eq!(report.len(), 2);
        assert!(report.events.is_empty());
        assert_eq!(report.failures[0].id, "empty");
        assert!(matches!(report.failures[0].error, PickerError::InvalidInput(_)));
        assert_eq!(report.failures[1].id, "flat");
        assert_eq!(report.failures[1].error, PickerError::NoGlobalExtrema);
    }

    #[test]
    fn test_summaries_count_phases() {
        let pick = |phase: Phase| Pick {
            station: "A".to_string(),
            channel: "HHZ".to_string(),
            phase,
            phase_hint: phase.name().to_string(),
            time: 1.0,
            time_uncertainty: 0.1,
            snr: 5.0,
        };
        let report = BatchReport {
            events: vec![(
                "ev1".to_string(),
                Event {
                    origin_time: 0.5,
                    picks: vec![pick(Phase::P), pick(Phase::S), pick(Phase::P)],
                    amplitudes: Vec::new(),
                },
            )],
            failures: Vec::new(),
        };
        let summaries = report.summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!((summaries[0].n_p, summaries[0].n_s), (2, 1));
        assert!(!report.is_empty());
    }
}
