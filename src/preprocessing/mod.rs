//! Waveform preprocessing
//!
//! - Mean removal
//! - Butterworth band-pass filtering
//! - Boxcar smoothing

pub mod filter;
pub mod smoothing;

pub use filter::{bandpass, bandpass_trace};
pub use smoothing::{boxcar, demean};
