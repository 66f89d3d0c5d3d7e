//! Channel roles and per-station grouping of traces

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::trace::Trace;
use crate::error::PickerError;

/// Semantic role of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Component {
    /// Vertical
    Z,
    /// North
    N,
    /// East
    E,
    /// Hydrophone / generic horizontal
    H,
}

impl Component {
    /// All roles, in canonical order
    pub const ALL: [Component; 4] = [Component::Z, Component::N, Component::E, Component::H];

    /// Parse a role letter ('Z', 'N', 'E', 'H')
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'Z' => Some(Component::Z),
            'N' => Some(Component::N),
            'E' => Some(Component::E),
            'H' => Some(Component::H),
            _ => None,
        }
    }

    /// Parse a component string such as "ZNE" into roles
    pub fn parse_list(s: &str) -> Result<Vec<Self>, PickerError> {
        s.chars()
            .map(|c| {
                Self::from_char(c).ok_or_else(|| {
                    PickerError::InvalidConfig(format!("unknown component '{}' in \"{}\"", c, s))
                })
            })
            .collect()
    }
}

/// Mapping of one station's raw channel codes to roles, plus output labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMap {
    /// Vertical channel code
    pub z: String,
    /// North channel code
    pub n: Option<String>,
    /// East channel code
    pub e: Option<String>,
    /// Hydrophone channel code
    pub h: Option<String>,
    /// Channel code written on P picks
    pub p_write_channel: String,
    /// Channel code written on S picks
    pub s_write_channel: String,
    /// Phase label written on P picks (must start with 'P')
    pub p_write_phase: String,
    /// Phase label written on S picks (must start with 'S')
    pub s_write_phase: String,
}

impl ChannelMap {
    /// Map with a vertical channel and optional horizontals, writing "P"/"S"
    pub fn new(z: impl Into<String>, n: Option<String>, e: Option<String>) -> Self {
        let z = z.into();
        Self {
            p_write_channel: z.clone(),
            s_write_channel: e.clone().unwrap_or_else(|| z.clone()),
            z,
            n,
            e,
            h: None,
            p_write_phase: "P".to_string(),
            s_write_phase: "S".to_string(),
        }
    }

    /// Channel code playing `role`, if any
    pub fn channel(&self, role: Component) -> Option<&str> {
        match role {
            Component::Z => Some(self.z.as_str()),
            Component::N => self.n.as_deref(),
            Component::E => self.e.as_deref(),
            Component::H => self.h.as_deref(),
        }
    }

    /// Reject phase labels the picker cannot write
    pub fn validate(&self) -> Result<(), PickerError> {
        if !self.p_write_phase.starts_with('P') {
            return Err(PickerError::InvalidConfig(format!(
                "unsupported P phase label \"{}\"",
                self.p_write_phase
            )));
        }
        if !self.s_write_phase.starts_with('S') {
            return Err(PickerError::InvalidConfig(format!(
                "unsupported S phase label \"{}\"",
                self.s_write_phase
            )));
        }
        Ok(())
    }
}

/// The traces of one station, keyed by role
#[derive(Debug, Clone, Default)]
pub struct StationWaveforms {
    traces: BTreeMap<Component, Trace>,
}

impl StationWaveforms {
    /// Trace playing `role`
    pub fn get(&self, role: Component) -> Option<&Trace> {
        self.traces.get(&role)
    }

    /// Insert (or replace) a role
    pub fn insert(&mut self, role: Component, trace: Trace) {
        self.traces.insert(role, trace);
    }

    /// Traces for `roles`, in that order
    ///
    /// # Errors
    ///
    /// `UnusableStation` if a requested role has no trace.
    pub fn components(&self, roles: &[Component]) -> Result<Vec<&Trace>, PickerError> {
        roles
            .iter()
            .map(|role| {
                self.traces.get(role).ok_or_else(|| {
                    PickerError::UnusableStation(format!("missing {:?} component", role))
                })
            })
            .collect()
    }

    /// Common sampling rate of all roles, or an error if they differ
    pub fn sampling_rate(&self) -> Result<f64, PickerError> {
        let mut rates = self.traces.values().map(|t| t.sampling_rate);
        let first = rates
            .next()
            .ok_or_else(|| PickerError::UnusableStation("no traces".to_string()))?;
        if rates.any(|r| (r - first).abs() > 1e-9 * first) {
            return Err(PickerError::UnusableStation(
                "components do not share a sampling rate".to_string(),
            ));
        }
        Ok(first)
    }

    /// Roles and their traces, in role order
    pub fn iter(&self) -> impl Iterator<Item = (Component, &Trace)> {
        self.traces.iter().map(|(&role, trace)| (role, trace))
    }

    /// Number of roles present
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// True if no role is present
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }
}

/// Group traces by station according to the channel maps
///
/// Stations without a channel map, and traces whose channel is not mapped,
/// are ignored. A station is kept only if its vertical channel is present.
pub fn group_by_station(
    traces: &[Trace],
    channel_maps: &BTreeMap<String, ChannelMap>,
) -> BTreeMap<String, StationWaveforms> {
    let mut grouped: BTreeMap<String, StationWaveforms> = BTreeMap::new();

    for trace in traces {
        let Some(map) = channel_maps.get(&trace.station) else {
            continue;
        };
        let role = Component::ALL
            .iter()
            .copied()
            .find(|&role| map.channel(role) == Some(trace.channel.as_str()));
        if let Some(role) = role {
            grouped
                .entry(trace.station.clone())
                .or_default()
                .insert(role, trace.clone());
        }
    }

    grouped.retain(|station, waveforms| {
        let keep = waveforms.get(Component::Z).is_some();
        if !keep {
            log::warn!("Station {} has no vertical channel, ignoring", station);
        }
        keep
    });
    grouped
}
