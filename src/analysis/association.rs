//! Cross-station association by rejection
//!
//! Picks from all stations are filtered in three stages, none of which ever
//! adds or relabels a pick:
//!
//! 1. **Clustering** - per phase, only picks inside the densest
//!    `assoc_cluster_window_{p,s}` window survive
//! 2. **Distribution** - per phase, pick times far from the median are dropped
//! 3. **Delays** - stations whose S-P delay is far from the median delay lose
//!    both picks
//!
//! Stages 2 and 3 run only when enough stations take part in the event.
//! Every stage leaves phases with fewer than `assoc_distri_min_values` picks
//! untouched. Survivors keep their input order.

use super::diagnostics::DiagnosticSink;
use super::origin::matched_pairs;
use super::result::{Phase, Pick};
use super::statistics::{clean_distribution, densest_window_center};
use crate::config::PickerParameters;

/// Candidate window centers scanned in the clustering stage
const CLUSTER_SCAN_STEPS: usize = 1000;

/// Pick counts after each association stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssociationReport {
    /// Picks handed to association
    pub input: usize,

    /// Picks left after clustering
    pub after_clustering: usize,

    /// Picks left after distribution cleaning (`None` if the stage was gated off)
    pub after_distribution: Option<usize>,

    /// Picks left after delay cleaning (`None` if the stage was gated off)
    pub after_delays: Option<usize>,
}

impl AssociationReport {
    /// Picks that survived every stage that ran
    pub fn output(&self) -> usize {
        self.after_delays
            .or(self.after_distribution)
            .unwrap_or(self.after_clustering)
    }
}

fn apply_mask(picks: Vec<Pick>, keep: &[bool]) -> Vec<Pick> {
    picks
        .into_iter()
        .zip(keep)
        .filter_map(|(pick, &k)| k.then_some(pick))
        .collect()
}

fn phase_indices(picks: &[Pick], phase: Phase) -> Vec<usize> {
    picks
        .iter()
        .enumerate()
        .filter(|(_, p)| p.phase == phase)
        .map(|(i, _)| i)
        .collect()
}

/// Keep, per phase, only the picks inside the densest cluster
///
/// A phase with fewer than `assoc_distri_min_values` picks is left alone.
/// Inclusion is strict: a pick exactly on the window edge is rejected.
pub fn remove_unclustered(
    picks: Vec<Pick>,
    params: &PickerParameters,
    sink: &dyn DiagnosticSink,
) -> Vec<Pick> {
    let mut keep = vec![true; picks.len()];

    for (phase, window) in [
        (Phase::P, params.assoc_cluster_window_p),
        (Phase::S, params.assoc_cluster_window_s),
    ] {
        let indices = phase_indices(&picks, phase);
        if indices.len() < params.assoc_distri_min_values {
            continue;
        }
        let times: Vec<f64> = indices.iter().map(|&i| picks[i].time).collect();
        let Some(center) = densest_window_center(&times, window, CLUSTER_SCAN_STEPS) else {
            continue;
        };
        let (a, b) = (center - window / 2.0, center + window / 2.0);

        for &i in &indices {
            let t = picks[i].time;
            if !(a < t && t < b) {
                keep[i] = false;
                sink.emit(
                    log::Level::Info,
                    &format!(
                        "Rejected {} pick on {} at {:.3}: outside {} s cluster centered on {:.3}",
                        phase, picks[i].station, t, window, center
                    ),
                );
            }
        }
    }

    apply_mask(picks, &keep)
}

/// Drop, per phase, pick times too far from the phase's median
pub fn remove_badly_distributed(
    picks: Vec<Pick>,
    params: &PickerParameters,
    sink: &dyn DiagnosticSink,
) -> Vec<Pick> {
    let mut keep = vec![true; picks.len()];

    for phase in [Phase::P, Phase::S] {
        let indices = phase_indices(&picks, phase);
        let times: Vec<f64> = indices.iter().map(|&i| picks[i].time).collect();
        let mask = clean_distribution(
            &times,
            params.assoc_distri_nstd_picks,
            params.assoc_distri_min_values,
        );
        for (&i, &k) in indices.iter().zip(&mask) {
            if !k {
                keep[i] = false;
                sink.emit(
                    log::Level::Info,
                    &format!(
                        "Rejected {} pick on {} at {:.3}: outside the {} pick distribution",
                        phase, picks[i].station, picks[i].time, phase
                    ),
                );
            }
        }
    }

    apply_mask(picks, &keep)
}

/// Drop every pick of the stations whose S-P delay is an outlier
///
/// Stations without both phases are kept.
pub fn remove_bad_delays(
    picks: Vec<Pick>,
    params: &PickerParameters,
    sink: &dyn DiagnosticSink,
) -> Vec<Pick> {
    let bad_stations: Vec<String> = {
        let pairs = matched_pairs(&picks);
        let delays: Vec<f64> = pairs.iter().map(|pair| pair.delay()).collect();
        let mask = clean_distribution(
            &delays,
            params.assoc_distri_nstd_delays,
            params.assoc_distri_min_values,
        );
        pairs
            .iter()
            .zip(&mask)
            .filter(|(_, &k)| !k)
            .map(|(pair, _)| {
                sink.emit(
                    log::Level::Info,
                    &format!(
                        "Rejected station {}: S-P delay {:.3} s outside the delay distribution",
                        pair.station,
                        pair.delay()
                    ),
                );
                pair.station.to_string()
            })
            .collect()
    };

    if bad_stations.is_empty() {
        return picks;
    }
    picks
        .into_iter()
        .filter(|p| !bad_stations.contains(&p.station))
        .collect()
}

/// Run all association stages
///
/// # Arguments
///
/// * `picks` - Picks of every station
/// * `n_stations` - Stations taking part in the event; gates stages 2 and 3
/// * `params` - Global parameters
/// * `sink` - Diagnostics receiver
///
/// # Returns
///
/// The surviving picks and the per-stage counts
pub fn associate(
    picks: Vec<Pick>,
    n_stations: usize,
    params: &PickerParameters,
    sink: &dyn DiagnosticSink,
) -> (Vec<Pick>, AssociationReport) {
    let mut report = AssociationReport {
        input: picks.len(),
        ..AssociationReport::default()
    };

    let mut picks = remove_unclustered(picks, params, sink);
    report.after_clustering = picks.len();

    if params.assoc_distri_min_values <= n_stations {
        picks = remove_badly_distributed(picks, params, sink);
        report.after_distribution = Some(picks.len());
        picks = remove_bad_delays(picks, params, sink);
        report.after_delays = Some(picks.len());
    }

    sink.emit(
        log::Level::Debug,
        &format!("Association: {:?}", report),
    );
    (picks, report)
}
