//! Configuration parameters for onset picking
//!
//! Loading these from YAML (or anything else) is up to the caller; every
//! struct derives serde so any format can populate it. Call
//! [`PickerParameters::validate`] / [`StationParameters::validate`] before
//! picking: configuration errors are never silently coerced.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PickerError;
use crate::io::{Component, ResponseFormat};

/// Frequency band in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    /// Lower corner (Hz)
    pub low: f64,
    /// Upper corner (Hz)
    pub high: f64,
}

impl FrequencyBand {
    /// Create a band
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Require `0 < low < high`
    pub fn validate(&self, what: &str) -> Result<(), PickerError> {
        if !(self.low > 0.0 && self.high > self.low && self.high.is_finite()) {
            return Err(PickerError::InvalidConfig(format!(
                "{} must satisfy 0 < low < high, got [{}, {}]",
                what, self.low, self.high
            )));
        }
        Ok(())
    }
}

impl fmt::Display for FrequencyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}] Hz", self.low, self.high)
    }
}

/// SNR quality ladder, ascending: thresholds for qualities '3', '2', '1', '0'
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds(pub [f64; 4]);

impl QualityThresholds {
    /// Lowest acceptable pick quality
    pub fn min(&self) -> f64 {
        self.0[0]
    }

    /// Require a finite, strictly ascending ladder
    pub fn validate(&self) -> Result<(), PickerError> {
        if self.0.iter().any(|v| !v.is_finite()) {
            return Err(PickerError::InvalidConfig(format!(
                "snr_quality_thresholds must be finite, got {:?}",
                self.0
            )));
        }
        if self.0.windows(2).any(|w| w[1] <= w[0]) {
            return Err(PickerError::InvalidConfig(format!(
                "snr_quality_thresholds not strictly increasing: {:?}",
                self.0
            )));
        }
        Ok(())
    }
}

impl TryFrom<Vec<f64>> for QualityThresholds {
    type Error = PickerError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        let ladder: [f64; 4] = values.as_slice().try_into().map_err(|_| {
            PickerError::InvalidConfig(format!(
                "need 4 snr_quality_thresholds, found {}",
                values.len()
            ))
        })?;
        let ladder = QualityThresholds(ladder);
        ladder.validate()?;
        Ok(ladder)
    }
}

/// Directionality (DR) thresholds for polarity-based phase assignment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DipRectThresholds {
    /// Signed DR peak at or above which a lone candidate is P
    pub p: f64,
    /// Signed DR peak at or below which a lone candidate is S
    pub s: f64,
}

impl Default for DipRectThresholds {
    fn default() -> Self {
        Self { p: -0.4, s: -0.4 }
    }
}

/// Event-wide picker parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerParameters {
    // Global window
    /// Kurtosis band for global rewindowing (default: [3, 20] Hz)
    pub gw_frequency_band: FrequencyBand,

    /// Kurtosis sliding window for global rewindowing, seconds (default: 5.0)
    pub gw_sliding_length: f64,

    /// Window used to find the densest extremum time over all stations,
    /// seconds (default: 20.0)
    pub gw_distri_secs: f64,

    /// Extrema taken from each station's kurtosis (default: 5)
    pub gw_n_extrema: usize,

    /// Smoothing width for the global extremum search, samples (default: 40)
    pub gw_extrema_samples: usize,

    /// Smoothing applied to the global kurtosis, samples (default: 15)
    pub gw_smoothing_samples: usize,

    /// Offsets from the densest time, seconds [left, right] (default: [-20, 60])
    pub gw_offsets: [f64; 2],

    /// Fraction of the record (from its start) searched for the global
    /// window; 1.0 searches everywhere (default: 0.9)
    pub gw_end_cutoff: f64,

    /// Candidate centers scanned by the densest-window estimator (default: 1000)
    pub gw_scan_steps: usize,

    // SNR
    /// Signal window length, seconds (default: 1.0)
    pub snr_signal_window: f64,

    /// Noise window length, seconds (default: 10.0)
    pub snr_noise_window: f64,

    /// Quality ladder for qualities '3', '2', '1', '0' (default: [1.5, 2.5, 5, 10])
    ///
    /// The minimum is also the floor for the adaptive SNR threshold.
    pub snr_quality_thresholds: QualityThresholds,

    /// Adaptive threshold parameter (default: 0.2)
    ///
    /// In (0, 1]: threshold = 1 + p * (max(SNR) - 1).
    /// Negative: threshold = |p|.
    pub snr_threshold_parameter: f64,

    /// Maximum upward threshold crossings for a trustworthy station (default: 2)
    pub snr_max_threshold_crossings: usize,

    /// Boxcar applied to SNR before the trust test, samples (default: 100)
    pub snr_smoothing_samples: usize,

    /// Boxcar applied to energy before pick-window refinement, samples (default: 50)
    pub energy_smoothing_samples: usize,

    // Polarity
    /// DR thresholds (default: P = -0.4, S = -0.4)
    pub dip_rect_thresholds: DipRectThresholds,

    /// Polarization analysis window, seconds (default: 2.0)
    pub polarization_window: f64,

    // Association
    /// Cluster window for P-pick rejection, seconds (default: 5.0)
    pub assoc_cluster_window_p: f64,

    /// Cluster window for S-pick rejection, seconds (default: 10.0)
    pub assoc_cluster_window_s: f64,

    /// Minimum number of values (picks, delays, stations) for
    /// distribution-based rejection (default: 4)
    pub assoc_distri_min_values: usize,

    /// Standard deviations accepted around the median pick time (default: 3.2)
    pub assoc_distri_nstd_picks: f64,

    /// Standard deviations accepted around the median P-S delay (default: 4.0)
    pub assoc_distri_nstd_delays: f64,

    // Origin
    /// Assumed Vp/Vs ratio (default: 1.7)
    pub vp_over_vs: f64,

    // Filtering / responses
    /// Butterworth sections per band edge (default: 2)
    pub filter_corners: usize,

    /// Format tag passed to the response provider (default: PolesZeros)
    pub response_file_type: ResponseFormat,
}

impl Default for PickerParameters {
    fn default() -> Self {
        Self {
            gw_frequency_band: FrequencyBand::new(3.0, 20.0),
            gw_sliding_length: 5.0,
            gw_distri_secs: 20.0,
            gw_n_extrema: 5,
            gw_extrema_samples: 40,
            gw_smoothing_samples: 15,
            gw_offsets: [-20.0, 60.0],
            gw_end_cutoff: 0.9,
            gw_scan_steps: 1000,
            snr_signal_window: 1.0,
            snr_noise_window: 10.0,
            snr_quality_thresholds: QualityThresholds([1.5, 2.5, 5.0, 10.0]),
            snr_threshold_parameter: 0.2,
            snr_max_threshold_crossings: 2,
            snr_smoothing_samples: 100,
            energy_smoothing_samples: 50,
            dip_rect_thresholds: DipRectThresholds::default(),
            polarization_window: 2.0,
            assoc_cluster_window_p: 5.0,
            assoc_cluster_window_s: 10.0,
            assoc_distri_min_values: 4,
            assoc_distri_nstd_picks: 3.2,
            assoc_distri_nstd_delays: 4.0,
            vp_over_vs: 1.7,
            filter_corners: 2,
            response_file_type: ResponseFormat::PolesZeros,
        }
    }
}

fn require_positive(value: f64, what: &str) -> Result<(), PickerError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(PickerError::InvalidConfig(format!(
            "{} must be positive, got {}",
            what, value
        )))
    }
}

/// Check the adaptive SNR threshold parameter: (0, 1] or strictly negative
pub fn validate_threshold_parameter(parameter: f64) -> Result<(), PickerError> {
    if (parameter > 0.0 && parameter <= 1.0) || parameter < 0.0 {
        Ok(())
    } else {
        Err(PickerError::InvalidConfig(format!(
            "Illegal snr_threshold_parameter value: {}",
            parameter
        )))
    }
}

impl PickerParameters {
    /// Validate every event-wide tunable
    pub fn validate(&self) -> Result<(), PickerError> {
        self.gw_frequency_band.validate("gw_frequency_band")?;
        require_positive(self.gw_sliding_length, "gw_sliding_length")?;
        require_positive(self.gw_distri_secs, "gw_distri_secs")?;
        if self.gw_n_extrema == 0 {
            return Err(PickerError::InvalidConfig("gw_n_extrema must be >= 1".to_string()));
        }
        if self.gw_scan_steps == 0 {
            return Err(PickerError::InvalidConfig("gw_scan_steps must be >= 1".to_string()));
        }
        if !(self.gw_offsets[0] < self.gw_offsets[1]) {
            return Err(PickerError::InvalidConfig(format!(
                "gw_offsets must satisfy left < right, got {:?}",
                self.gw_offsets
            )));
        }
        if !(self.gw_end_cutoff > 0.0 && self.gw_end_cutoff <= 1.0) {
            return Err(PickerError::InvalidConfig(format!(
                "gw_end_cutoff must be in (0, 1], got {}",
                self.gw_end_cutoff
            )));
        }
        require_positive(self.snr_signal_window, "snr_signal_window")?;
        require_positive(self.snr_noise_window, "snr_noise_window")?;
        self.snr_quality_thresholds.validate()?;
        validate_threshold_parameter(self.snr_threshold_parameter)?;
        require_positive(self.polarization_window, "polarization_window")?;
        require_positive(self.assoc_cluster_window_p, "assoc_cluster_window_p")?;
        require_positive(self.assoc_cluster_window_s, "assoc_cluster_window_s")?;
        require_positive(self.assoc_distri_nstd_picks, "assoc_distri_nstd_picks")?;
        require_positive(self.assoc_distri_nstd_delays, "assoc_distri_nstd_delays")?;
        if !(self.vp_over_vs > 1.0) {
            return Err(PickerError::InvalidConfig(format!(
                "vp_over_vs must be > 1, got {}",
                self.vp_over_vs
            )));
        }
        if self.filter_corners == 0 {
            return Err(PickerError::InvalidConfig("filter_corners must be >= 1".to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for PickerParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PickerParameters:")?;
        writeln!(f, "    gw_frequency_band = {}", self.gw_frequency_band)?;
        writeln!(f, "    gw_sliding_length = {}", self.gw_sliding_length)?;
        writeln!(f, "    gw_distri_secs = {}", self.gw_distri_secs)?;
        writeln!(f, "    gw_offsets = {:?}", self.gw_offsets)?;
        writeln!(f, "    gw_end_cutoff = {}", self.gw_end_cutoff)?;
        writeln!(f, "    gw_n_extrema = {}", self.gw_n_extrema)?;
        writeln!(f, "    gw_extrema_samples = {}", self.gw_extrema_samples)?;
        writeln!(f, "    snr_signal_window = {}", self.snr_signal_window)?;
        writeln!(f, "    snr_noise_window = {}", self.snr_noise_window)?;
        writeln!(f, "    snr_quality_thresholds = {:?}", self.snr_quality_thresholds.0)?;
        writeln!(f, "    snr_threshold_parameter = {}", self.snr_threshold_parameter)?;
        writeln!(
            f,
            "    snr_max_threshold_crossings = {}",
            self.snr_max_threshold_crossings
        )?;
        writeln!(
            f,
            "    dip_rect_thresholds = P: {}, S: {}",
            self.dip_rect_thresholds.p, self.dip_rect_thresholds.s
        )?;
        writeln!(f, "    assoc_cluster_window_p = {}", self.assoc_cluster_window_p)?;
        writeln!(f, "    assoc_cluster_window_s = {}", self.assoc_cluster_window_s)?;
        writeln!(f, "    assoc_distri_min_values = {}", self.assoc_distri_min_values)?;
        writeln!(f, "    assoc_distri_nstd_picks = {}", self.assoc_distri_nstd_picks)?;
        writeln!(f, "    assoc_distri_nstd_delays = {}", self.assoc_distri_nstd_delays)?;
        writeln!(f, "    vp_over_vs = {}", self.vp_over_vs)?;
        write!(f, "    response_file_type = {:?}", self.response_file_type)
    }
}

/// Per-station tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationParameters {
    /// Components used for P picking; the first one carries the kurtosis
    /// (default: Z)
    pub p_components: Vec<Component>,

    /// Components used for energy/SNR and polarity (default: Z, N, E)
    pub s_components: Vec<Component>,

    /// Band for the energy/SNR computation (default: [3, 20] Hz)
    pub energy_band: FrequencyBand,

    /// Kurtosis bands; one kurtosis trace per (band, window) pair is averaged
    pub kurtosis_bands: Vec<FrequencyBand>,

    /// Kurtosis sliding windows, seconds
    pub kurtosis_window_lengths: Vec<f64>,

    /// Smoothing widths for extremum following, coarse to fine, samples
    pub kurtosis_smoothing_sequence: Vec<usize>,

    /// Energy window in seconds; 0 keeps the global window unrefined
    /// (default: 0.0)
    pub energy_window: f64,

    /// Use 3-component polarity to assign P and S (default: false)
    pub use_polarity: bool,

    /// Number of onsets to follow, 1 or 2 (default: 2)
    pub n_follow: usize,

    /// Response file handed to the response provider (default: none)
    pub response_file: Option<String>,
}

impl Default for StationParameters {
    fn default() -> Self {
        Self {
            p_components: vec![Component::Z],
            s_components: vec![Component::Z, Component::N, Component::E],
            energy_band: FrequencyBand::new(3.0, 20.0),
            kurtosis_bands: vec![FrequencyBand::new(4.0, 15.0), FrequencyBand::new(8.0, 30.0)],
            kurtosis_window_lengths: vec![0.5, 1.0],
            kurtosis_smoothing_sequence: vec![50, 20, 5],
            energy_window: 0.0,
            use_polarity: false,
            n_follow: 2,
            response_file: None,
        }
    }
}

impl StationParameters {
    /// Validate one station's tunables
    pub fn validate(&self, station: &str) -> Result<(), PickerError> {
        let ctx = |msg: String| PickerError::InvalidConfig(format!("{}: {}", station, msg));

        if self.p_components.is_empty() {
            return Err(ctx("p_components is empty".to_string()));
        }
        if self.s_components.is_empty() {
            return Err(ctx("s_components is empty".to_string()));
        }
        self.energy_band
            .validate("energy_band")
            .map_err(|e| ctx(e.to_string()))?;
        if self.kurtosis_bands.is_empty() {
            return Err(ctx("kurtosis_bands is empty".to_string()));
        }
        for band in &self.kurtosis_bands {
            band.validate("kurtosis band").map_err(|e| ctx(e.to_string()))?;
        }
        if self.kurtosis_window_lengths.is_empty() {
            return Err(ctx("kurtosis_window_lengths is empty".to_string()));
        }
        for &w in &self.kurtosis_window_lengths {
            require_positive(w, "kurtosis window length").map_err(|e| ctx(e.to_string()))?;
        }
        if self.kurtosis_smoothing_sequence.is_empty() {
            return Err(ctx("kurtosis_smoothing_sequence is empty".to_string()));
        }
        if self.kurtosis_smoothing_sequence.contains(&0) {
            return Err(ctx("kurtosis smoothing widths must be >= 1".to_string()));
        }
        if !(self.energy_window >= 0.0 && self.energy_window.is_finite()) {
            return Err(ctx(format!(
                "energy_window must be >= 0, got {}",
                self.energy_window
            )));
        }
        if !matches!(self.n_follow, 1 | 2) {
            return Err(ctx(format!("n_follow must be 1 or 2, got {}", self.n_follow)));
        }
        Ok(())
    }

    /// Largest configured kurtosis window, seconds
    pub fn max_kurtosis_window(&self) -> f64 {
        self.kurtosis_window_lengths
            .iter()
            .copied()
            .fold(0.0f64, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PickerParameters::default().validate().is_ok());
        assert!(StationParameters::default().validate("STA").is_ok());
    }

    #[test]
    fn test_quality_ladder_checks() {
        assert!(QualityThresholds::try_from(vec![1.0, 2.0, 3.0]).is_err());
        assert!(QualityThresholds::try_from(vec![1.0, 3.0, 2.0, 4.0]).is_err());
        let ok = QualityThresholds::try_from(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(ok.min(), 1.0);
    }

    #[test]
    fn test_quality_ladder_rejects_flat_steps() {
        // Equal steps leave a quality that can never be selected
        assert!(QualityThresholds::try_from(vec![3.0, 3.0, 3.0, 3.0]).is_err());
        assert!(QualityThresholds::try_from(vec![1.0, 2.0, 2.0, 4.0]).is_err());
        assert!(PickerParameters::default().snr_quality_thresholds.validate().is_ok());
    }

    #[test]
    fn test_threshold_parameter_domain() {
        assert!(validate_threshold_parameter(0.2).is_ok());
        assert!(validate_threshold_parameter(1.0).is_ok());
        assert!(validate_threshold_parameter(-3.0).is_ok());
        assert!(validate_threshold_parameter(0.0).is_err());
        assert!(validate_threshold_parameter(1.5).is_err());
    }

    #[test]
    fn test_bad_offsets_and_bands() {
        let mut p = PickerParameters::default();
        p.gw_offsets = [10.0, -10.0];
        assert!(p.validate().is_err());

        let mut p = PickerParameters::default();
        p.gw_frequency_band = FrequencyBand::new(20.0, 3.0);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_n_follow_domain() {
        let mut s = StationParameters::default();
        s.n_follow = 3;
        let err = s.validate("XYZ").unwrap_err();
        assert!(err.to_string().contains("XYZ"));
        s.n_follow = 0;
        assert!(s.validate("XYZ").is_err());
    }

    #[test]
    fn test_max_kurtosis_window() {
        let s = StationParameters {
            kurtosis_window_lengths: vec![0.3, 2.0, 1.0],
            ..StationParameters::default()
        };
        assert_eq!(s.max_kurtosis_window(), 2.0);
    }

    #[test]
    fn test_display_summary() {
        let text = PickerParameters::default().to_string();
        assert!(text.contains("assoc_distri_nstd_delays = 4"));
    }
}
