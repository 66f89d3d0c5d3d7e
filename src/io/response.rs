//! Instrument responses supplied by the caller
//!
//! Parsing response files is not the picker's job: a [`ResponseProvider`]
//! hands over already-parsed poles and zeros for a named response file.

use std::collections::HashMap;
use std::f64::consts::PI;

use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

/// Declared format of the response files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResponseFormat {
    /// GSE2 calibration files
    Gse,
    /// Plain poles-and-zeros files
    #[default]
    PolesZeros,
}

/// Laplace-domain (radians) poles-and-zeros response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolesZeros {
    /// Poles as (re, im)
    pub poles: Vec<(f64, f64)>,
    /// Zeros as (re, im)
    pub zeros: Vec<(f64, f64)>,
    /// Normalization factor A0
    pub gain: f64,
    /// Overall sensitivity
    pub sensitivity: f64,
}

impl PolesZeros {
    /// Standard Wood-Anderson torsion seismometer
    pub fn wood_anderson() -> Self {
        Self {
            poles: vec![(-6.283, -4.7124), (-6.283, 4.7124)],
            zeros: vec![(0.0, 0.0)],
            gain: 1.0,
            sensitivity: 2080.0,
        }
    }

    /// Complex response at `frequency` Hz
    pub fn evaluate(&self, frequency: f64) -> Complex<f64> {
        let s = Complex::new(0.0, 2.0 * PI * frequency);
        let num = self
            .zeros
            .iter()
            .fold(Complex::new(1.0, 0.0), |acc, &(re, im)| acc * (s - Complex::new(re, im)));
        let den = self
            .poles
            .iter()
            .fold(Complex::new(1.0, 0.0), |acc, &(re, im)| acc * (s - Complex::new(re, im)));
        num / den * (self.gain * self.sensitivity)
    }
}

/// Source of instrument responses
pub trait ResponseProvider: Sync {
    /// Poles and zeros for response file `name`, or `None` if unavailable
    fn poles_zeros(&self, name: &str, format: ResponseFormat) -> Option<PolesZeros>;
}

/// Provider with no responses; every amplitude measurement is skipped
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResponses;

impl ResponseProvider for NoResponses {
    fn poles_zeros(&self, _name: &str, _format: ResponseFormat) -> Option<PolesZeros> {
        None
    }
}

/// In-memory responses keyed by file name
#[derive(Debug, Clone, Default)]
pub struct StaticResponses {
    responses: HashMap<String, PolesZeros>,
}

impl StaticResponses {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a response under `name`
    pub fn insert(&mut self, name: impl Into<String>, response: PolesZeros) {
        self.responses.insert(name.into(), response);
    }
}

impl ResponseProvider for StaticResponses {
    fn poles_zeros(&self, name: &str, _format: ResponseFormat) -> Option<PolesZeros> {
        self.responses.get(name).cloned()
    }
}
