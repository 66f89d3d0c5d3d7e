//! Origin time from P-S delays
//!
//! For a station with both phases, a constant Vp/Vs ratio gives
//! `o = tP - (tS - tP) / (vp_over_vs - 1)`. The per-station estimates are
//! averaged after dropping those 3 or more standard deviations from their
//! mean. Without any P-S pair the earliest pick is the best available bound.

use super::result::{Phase, Pick};
use super::statistics::{mean, population_std};
use crate::error::PickerError;

/// Z-score at or above which a station's origin estimate is ignored
const MAX_ZSCORE: f64 = 3.0;

/// The first P and first S pick of one station
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedPair<'a> {
    /// Station code
    pub station: &'a str,
    /// First P pick of the station
    pub p: &'a Pick,
    /// First S pick of the station
    pub s: &'a Pick,
}

impl MatchedPair<'_> {
    /// S minus P time, seconds
    pub fn delay(&self) -> f64 {
        self.s.time - self.p.time
    }
}

/// Stations holding both a P and an S pick, in order of first appearance
pub fn matched_pairs(picks: &[Pick]) -> Vec<MatchedPair<'_>> {
    let mut stations: Vec<&str> = Vec::new();
    for pick in picks {
        if !stations.contains(&pick.station.as_str()) {
            stations.push(&pick.station);
        }
    }

    stations
        .into_iter()
        .filter_map(|station| {
            let first = |phase: Phase| {
                picks
                    .iter()
                    .find(|p| p.station == station && p.phase == phase)
            };
            Some(MatchedPair {
                station,
                p: first(Phase::P)?,
                s: first(Phase::S)?,
            })
        })
        .collect()
}

/// Estimate the event origin time
///
/// # Arguments
///
/// * `picks` - Associated picks
/// * `vp_over_vs` - Assumed P to S velocity ratio (> 1)
///
/// # Returns
///
/// Mean of the per-station origin estimates with `|z| < 3` (all of them when
/// the estimates coincide), or the earliest pick time when no station has
/// both phases
///
/// # Errors
///
/// - `NoSurvivingPicks` if `picks` is empty
/// - `InvalidConfig` if `vp_over_vs <= 1`
pub fn estimate_origin_time(picks: &[Pick], vp_over_vs: f64) -> Result<f64, PickerError> {
    if picks.is_empty() {
        return Err(PickerError::NoSurvivingPicks);
    }
    if !(vp_over_vs > 1.0) {
        return Err(PickerError::InvalidConfig(format!(
            "vp_over_vs must be > 1, got {}",
            vp_over_vs
        )));
    }

    let estimates: Vec<f64> = matched_pairs(picks)
        .iter()
        .map(|pair| pair.p.time - pair.delay() / (vp_over_vs - 1.0))
        .collect();

    let (Some(center), Some(sigma)) = (mean(&estimates), population_std(&estimates)) else {
        let earliest = picks.iter().map(|p| p.time).fold(f64::INFINITY, f64::min);
        log::debug!("No P-S pair, origin time set to earliest pick {:.3}", earliest);
        return Ok(earliest);
    };

    if sigma <= 0.0 {
        return Ok(center);
    }
    let kept: Vec<f64> = estimates
        .iter()
        .copied()
        .filter(|o| ((o - center) / sigma).abs() < MAX_ZSCORE)
        .collect();
    if kept.len() < estimates.len() {
        log::debug!(
            "Origin time: {} of {} station estimates beyond {} sigma",
            estimates.len() - kept.len(),
            estimates.len(),
            MAX_ZSCORE
        );
    }
    mean(&kept).ok_or_else(|| {
        PickerError::NumericalError("every origin estimate was an outlier".to_string())
    })
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
            time_uncertainty: 0.1,
            snr: 10.0,
        }
    }

    #[test]
    fn test_matched_pairs_use_first_of_each_phase() {
        let picks = vec![
            pick("A", Phase::S, 15.0),
            pick("B", Phase::P, 11.0),
            pick("A", Phase::P, 10.0),
            pick("A", Phase::P, 12.0),
        ];
        let pairs = matched_pairs(&picks);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].station, "A");
        assert_eq!(pairs[0].p.time, 10.0);
        assert!((pairs[0].delay() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_exact_origin_for_consistent_pairs() {
        // o = 100, vp/vs = 1.75: tS - tP = 0.75 (tP - o)
        let vpvs = 1.75;
        let mut picks = Vec::new();
        for (i, travel) in [4.0, 8.0, 12.0, 20.0].iter().enumerate() {
            let name = format!("S{}", i);
            picks.push(pick(&name, Phase::P, 100.0 + travel));
            picks.push(pick(&name, Phase::S, 100.0 + travel * vpvs));
        }
        let origin = estimate_origin_time(&picks, vpvs).unwrap();
        assert!((origin - 100.0).abs() < 1e-9, "got {}", origin);
    }

    #[test]
    fn test_outlier_estimate_is_ignored() {
        // Twenty stations agree on o = 0; one gives o = -70 (P-S delay too long)
        let vpvs = 1.7;
        let mut picks = Vec::new();
        for i in 0..20 {
            let name = format!("S{:02}", i);
            let travel = 5.0 + i as f64;
            picks.push(pick(&name, Phase::P, travel));
            picks.push(pick(&name, Phase::S, travel * vpvs));
        }
        picks.push(pick("BAD", Phase::P, 10.0));
        picks.push(pick("BAD", Phase::S, 10.0 + 0.7 * 80.0));

        let origin = estimate_origin_time(&picks, vpvs).unwrap();
        assert!(origin.abs() < 1e-9, "got {}", origin);
    }

    #[test]
    fn test_without_pairs_earliest_pick_wins() {
        let picks = vec![pick("A", Phase::P, 12.0), pick("B", Phase::S, 9.0)];
        assert_eq!(estimate_origin_time(&picks, 1.7), Ok(9.0));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(estimate_origin_time(&[], 1.7), Err(PickerError::NoSurvivingPicks));
        let picks = vec![pick("A", Phase::P, 1.0)];
        assert!(estimate_origin_time(&picks, 1.0).is_err());
    }
}
