//! Picking result types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Seismic phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    /// Compressional wave
    P,
    /// Shear wave
    S,
}

impl Phase {
    /// Phase name
    ///
    /// # Example
    ///
    /// ```
    /// use ps_picker::analysis::result::Phase;
    ///
    /// assert_eq!(Phase::P.name(), "P");
    /// assert_eq!(Phase::S.to_string(), "S");
    /// ```
    pub fn name(&self) -> &'static str {
        match self {
            Phase::P => "P",
            Phase::S => "S",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A phase arrival on one station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    /// Station code
    pub station: String,

    /// Channel the pick is written on (from the channel map)
    pub channel: String,

    /// Phase used for association and origin time
    pub phase: Phase,

    /// Phase label to write (from the channel map, e.g. "Pg")
    pub phase_hint: String,

    /// Arrival time (POSIX seconds)
    pub time: f64,

    /// Time uncertainty in seconds
    pub time_uncertainty: f64,

    /// SNR at the pick
    pub snr: f64,
}

/// Wood-Anderson amplitude measured on one station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amplitude {
    /// Station code
    pub station: String,

    /// Peak-to-peak amplitude on the simulated Wood-Anderson record
    pub value: f64,

    /// Period in seconds (twice the time between maximum and minimum)
    pub period: f64,

    /// Phase of the pick the measurement window is anchored to
    pub pick_phase: Phase,

    /// Time of that pick
    pub pick_time: f64,
}

/// Time interval in which the event's arrivals are expected
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalWindow {
    /// Window start (POSIX seconds)
    pub first_time: f64,

    /// Window end (POSIX seconds)
    pub last_time: f64,
}

impl GlobalWindow {
    /// Window length in seconds
    pub fn duration(&self) -> f64 {
        self.last_time - self.first_time
    }

    /// True if `time` lies inside the window (inclusive)
    pub fn contains(&self, time: f64) -> bool {
        time >= self.first_time && time <= self.last_time
    }
}

/// Picked event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Estimated origin time (POSIX seconds)
    pub origin_time: f64,

    /// Surviving picks, grouped by station in station order
    pub picks: Vec<Pick>,

    /// Amplitudes whose anchor pick survived association
    pub amplitudes: Vec<Amplitude>,
}

impl Event {
    /// Picks of one phase
    pub fn picks_of(&self, phase: Phase) -> impl Iterator<Item = &Pick> {
        self.picks.iter().filter(move |p| p.phase == phase)
    }

    /// Stations that kept at least one pick
    pub fn stations(&self) -> Vec<&str> {
        let mut stations: Vec<&str> = self.picks.iter().map(|p| p.station.as_str()).collect();
        stations.dedup();
        stations
    }
}

/// Keep the amplitudes whose anchor pick is still in `picks`
///
/// An amplitude is measured around one pick; once association drops that
/// pick the measurement window no longer belongs to the event.
pub(crate) fn retain_anchored(amplitudes: &mut Vec<Amplitude>, picks: &[Pick]) {
    amplitudes.retain(|a| {
        picks
            .iter()
            .any(|p| p.station == a.station && p.phase == a.pick_phase && p.time == a.pick_time)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pick(station: &str, phase: Phase, time: f64) -> Pick {
        Pick {
            station: station.to_string(),
            channel: "HHZ".to_string(),
            phase,
            phase_hint: phase.name().to_string(),
            time,
            time_uncertainty: 0.02,
            snr: 12.0,
        }
    }

    #[test]
    fn test_global_window() {
        let w = GlobalWindow {
            first_time: 10.0,
            last_time: 25.0,
        };
        assert_eq!(w.duration(), 15.0);
        assert!(w.contains(10.0) && w.contains(25.0));
        assert!(!w.contains(25.5));
    }

    #[test]
    fn test_event_queries() {
        let event = Event {
            origin_time: 0.0,
            picks: vec![
                pick("A", Phase::P, 1.0),
                pick("A", Phase::S, 2.0),
                pick("B", Phase::P, 1.5),
            ],
            amplitudes: Vec::new(),
        };
        assert_eq!(event.picks_of(Phase::P).count(), 2);
        assert_eq!(event.picks_of(Phase::S).count(), 1);
        assert_eq!(event.stations(), vec!["A", "B"]);
    }

    #[test]
    fn test_amplitude_follows_its_anchor_pick() {
        let amplitude = |phase: Phase, time: f64| Amplitude {
            station: "A".to_string(),
            value: 1e-3,
            period: 0.4,
            pick_phase: phase,
            pick_time: time,
        };

        // S anchor dropped by association, P of the same station kept
        let mut amplitudes = vec![amplitude(Phase::S, 2.0)];
        retain_anchored(&mut amplitudes, &[pick("A", Phase::P, 1.0)]);
        assert!(amplitudes.is_empty());

        let mut amplitudes = vec![amplitude(Phase::S, 2.0), amplitude(Phase::P, 1.0)];
        retain_anchored(
            &mut amplitudes,
            &[pick("A", Phase::P, 1.0), pick("A", Phase::S, 2.0), pick("B", Phase::S, 2.0)],
        );
        assert_eq!(amplitudes.len(), 2);

        let mut amplitudes = vec![amplitude(Phase::S, 2.0)];
        retain_anchored(&mut amplitudes, &[pick("B", Phase::S, 2.0)]);
        assert!(amplitudes.is_empty());
    }

    #[test]
    fn test_pick_serializes() {
        let json = serde_json::to_string(&pick("A", Phase::S, 3.0)).unwrap();
        assert!(json.contains("\"phase\":\"S\""));
    }
}
