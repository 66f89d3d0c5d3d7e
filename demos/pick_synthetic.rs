//! Example: Pick a synthetic three-station event
//!
//! Builds noise records with P and S bursts, picks them and prints the
//! event as JSON. Run with `RUST_LOG=debug` to follow the pipeline.

use std::collections::BTreeMap;

use ps_picker::{
    pick_event_with, ChannelMap, Component, LogSink, NoResponses, PickerHooks, PickerParameters,
    StationParameters, Trace,
};

const SR: f64 = 100.0;
const N: usize = 12_000;

/// Deterministic pseudo-noise in [-1, 1]
fn noise(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            2.0 * ((state >> 33) as f64 / (1u64 << 31) as f64) - 1.0
        })
        .collect()
}

fn synthetic_trace(station: &str, start: f64, p: f64, s: f64, seed: u64) -> Trace {
    let base = noise(N, seed);
    let burst = noise(N, seed + 7);
    let data = (0..N)
        .map(|i| {
            let t = i as f64 / SR;
            let mut v = 0.01 * base[i];
            if t >= p {
                v += 0.2 * burst[i] * (-(t - p) / 4.0).exp();
            }
            if t >= s {
                v += 3.0 * burst[(i * 7) % N] * (-(t - s) / 6.0).exp();
            }
            v
        })
        .collect();
    Trace::new(station, "HHZ", start, SR, data)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    let start = 1_600_000_000.0;
    let origin_offset = 30.0;
    let params = PickerParameters {
        snr_max_threshold_crossings: 10,
        ..PickerParameters::default()
    };

    let mut traces = Vec::new();
    let mut channel_maps = BTreeMap::new();
    let mut station_parameters = BTreeMap::new();
    for (i, (name, travel)) in [("ANTF", 8.0), ("BRVO", 11.0), ("CHRL", 14.5)].iter().enumerate() {
        let p = origin_offset + travel;
        let s = origin_offset + travel * params.vp_over_vs;
        traces.push(synthetic_trace(name, start, p, s, i as u64 + 1));
        channel_maps.insert(name.to_string(), ChannelMap::new("HHZ", None, None));
        station_parameters.insert(
            name.to_string(),
            StationParameters {
                s_components: vec![Component::Z],
                kurtosis_smoothing_sequence: vec![100, 20],
                ..StationParameters::default()
            },
        );
    }

    println!("{}", params);

    let hooks = PickerHooks {
        responses: &NoResponses,
        diagnostics: &LogSink,
    };
    let event = pick_event_with(&traces, &channel_maps, &station_parameters, &params, &hooks)?;

    println!("Picked event:");
    println!("  Origin time: {:.3} (true {:.3})", event.origin_time, start + origin_offset);
    for pick in &event.picks {
        println!(
            "  {:5} {} {} at {:.3} ± {:.2} s (SNR {:.1})",
            pick.station,
            pick.channel,
            pick.phase_hint,
            pick.time - start,
            pick.time_uncertainty,
            pick.snr
        );
    }
    println!("{}", serde_json::to_string_pretty(&event)?);

    Ok(())
}
