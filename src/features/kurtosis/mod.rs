//! Kurtosis onset engine
//!
//! - Sliding and cumulative kurtosis
//! - Multi-band / multi-window averaging
//! - Extremum following through a smoothing sequence

pub mod engine;
pub mod extrema;

pub use engine::{cumulative_kurtosis, mean_kurtosis, sliding_kurtosis, trace_to_kurtosis};
pub use extrema::{follow_extrema, ExtremumKind, FollowedExtrema, TraceExtremum};

use serde::{Deserialize, Serialize};

/// Onset candidate on a station's kurtosis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KurtosisExtremum {
    /// Sample index from the start of the station's P trace
    pub index: usize,

    /// Signal-to-noise ratio at the index
    pub snr: f64,
}
