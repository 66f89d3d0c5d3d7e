//! Feature extraction modules
//!
//! This module contains the per-station signal features:
//! - Kurtosis onset engine (sliding/cumulative kurtosis, extremum following)
//! - Signal quality (energy, SNR, adaptive threshold, uncertainty)
//! - Polarity discrimination (3-C polarization, P/S classification)
//! - Wood-Anderson amplitude

pub mod amplitude;
pub mod kurtosis;
pub mod polarity;
pub mod quality;
