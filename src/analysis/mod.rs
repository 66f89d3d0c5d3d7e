//! Event-level analysis
//!
//! Turns per-station features into an event:
//! - Global window estimation over all stations
//! - Per-station picking
//! - Cross-station association
//! - Origin time estimation
//! - Result types, diagnostics hook and batch driver

pub mod association;
pub mod batch;
pub mod diagnostics;
pub mod global_window;
pub mod origin;
pub mod result;
pub mod station;
pub mod statistics;

pub use association::{associate, AssociationReport};
pub use batch::{pick_events, BatchReport, EventFailure, EventRecord};
pub use diagnostics::{CollectingSink, DiagnosticSink, LogSink};
pub use global_window::{estimate_global_window, GlobalWindowEstimate};
pub use origin::{estimate_origin_time, matched_pairs};
pub use result::{Amplitude, Event, GlobalWindow, Phase, Pick};
pub use station::{pick_station, PickerHooks, StationInput, StationResult};
