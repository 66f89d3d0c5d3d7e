//! Single-channel waveform traces

use serde::{Deserialize, Serialize};

use crate::error::PickerError;

/// A single-channel time series
///
/// Processing stages never mutate a trace in place; they return a new one
/// through [`Trace::with_data`] or [`Trace::slice`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Station code (e.g. "ANTF")
    pub station: String,
    /// Channel code (e.g. "HHZ")
    pub channel: String,
    /// Absolute start time of the first sample (POSIX seconds)
    pub start_time: f64,
    /// Sampling rate in Hz
    pub sampling_rate: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl Trace {
    /// Create a new trace
    pub fn new(
        station: impl Into<String>,
        channel: impl Into<String>,
        start_time: f64,
        sampling_rate: f64,
        data: Vec<f64>,
    ) -> Self {
        Self {
            station: station.into(),
            channel: channel.into(),
            start_time,
            sampling_rate,
            data,
        }
    }

    /// Check the invariants a trace must satisfy before picking
    pub fn validate(&self) -> Result<(), PickerError> {
        if self.data.is_empty() {
            return Err(PickerError::InvalidInput(format!(
                "trace {}.{} has no samples",
                self.station, self.channel
            )));
        }
        if self.sampling_rate <= 0.0 || !self.sampling_rate.is_finite() {
            return Err(PickerError::InvalidInput(format!(
                "trace {}.{} has invalid sampling rate {}",
                self.station, self.channel, self.sampling_rate
            )));
        }
        Ok(())
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the trace holds no samples
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample interval in seconds
    pub fn delta(&self) -> f64 {
        1.0 / self.sampling_rate
    }

    /// Time of the last sample
    pub fn end_time(&self) -> f64 {
        if self.data.is_empty() {
            return self.start_time;
        }
        self.time_of(self.data.len() - 1)
    }

    /// Absolute time of sample `index`
    pub fn time_of(&self, index: usize) -> f64 {
        self.start_time + index as f64 / self.sampling_rate
    }

    /// Index of the sample nearest to `time`, clamped to the trace
    pub fn index_of(&self, time: f64) -> usize {
        if self.data.is_empty() {
            return 0;
        }
        let raw = ((time - self.start_time) * self.sampling_rate).round();
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(self.data.len() - 1)
        }
    }

    /// Half-open index range `[first, last)` covering `[first_time, last_time]`
    pub fn index_range(&self, first_time: f64, last_time: f64) -> (usize, usize) {
        let first = self.index_of(first_time);
        let last = (self.index_of(last_time) + 1).min(self.data.len());
        (first, last.max(first))
    }

    /// True if every first difference is zero
    pub fn is_flat(&self) -> bool {
        self.data.windows(2).all(|w| w[1] == w[0])
    }

    /// New trace with the same metadata and different samples
    pub fn with_data(&self, data: Vec<f64>) -> Self {
        Self {
            station: self.station.clone(),
            channel: self.channel.clone(),
            start_time: self.start_time,
            sampling_rate: self.sampling_rate,
            data,
        }
    }

    /// New trace holding the samples between two absolute times
    pub fn slice(&self, first_time: f64, last_time: f64) -> Self {
        let (first, last) = self.index_range(first_time, last_time);
        Self {
            station: self.station.clone(),
            channel: self.channel.clone(),
            start_time: self.time_of(first),
            sampling_rate: self.sampling_rate,
            data: self.data[first..last].to_vec(),
        }
    }

    /// Waveform identifier "STATION.CHANNEL"
    pub fn id(&self) -> String {
        format!("{}.{}", self.station, self.channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Trace {
        Trace::new("STA", "HHZ", 100.0, 10.0, (0..n).map(|i| i as f64).collect())
    }

    #[test]
    fn test_time_index_conversion() {
        let tr = ramp(100);
        assert_eq!(tr.index_of(100.0), 0);
        assert_eq!(tr.index_of(101.0), 10);
        assert_eq!(tr.index_of(50.0), 0, "before start clamps to 0");
        assert_eq!(tr.index_of(1000.0), 99, "after end clamps to last sample");
        assert!((tr.time_of(25) - 102.5).abs() < 1e-12);
        assert!((tr.end_time() - 109.9).abs() < 1e-9);
    }

    #[test]
    fn test_slice_keeps_metadata() {
        let tr = ramp(100);
        let sl = tr.slice(101.0, 102.0);
        assert_eq!(sl.len(), 11);
        assert_eq!(sl.data[0], 10.0);
        assert!((sl.start_time - 101.0).abs() < 1e-12);
        assert_eq!(sl.station, "STA");
        assert_eq!(tr.len(), 100, "source trace is untouched");
    }

    #[test]
    fn test_flat_detection() {
        let flat = Trace::new("STA", "HHZ", 0.0, 100.0, vec![3.0; 50]);
        assert!(flat.is_flat());
        assert!(!ramp(10).is_flat());
    }

    #[test]
    fn test_validate() {
        assert!(ramp(10).validate().is_ok());
        assert!(Trace::new("STA", "HHZ", 0.0, 100.0, vec![]).validate().is_err());
        assert!(Trace::new("STA", "HHZ", 0.0, 0.0, vec![1.0]).validate().is_err());
    }
}
