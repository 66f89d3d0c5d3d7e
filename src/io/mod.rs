//! Waveform and response interfaces
//!
//! The data structures the picker exchanges with its environment:
//! traces, channel roles, per-station grouping and instrument responses.

pub mod channel_map;
pub mod response;
pub mod trace;

pub use channel_map::{group_by_station, ChannelMap, Component, StationWaveforms};
pub use response::{NoResponses, PolesZeros, ResponseFormat, ResponseProvider, StaticResponses};
pub use trace::Trace;
