//! Peak-to-peak amplitude measurement

use crate::io::Trace;

/// Largest peak-to-peak amplitude over several components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakToPeak {
    /// `max - min` inside the window
    pub value: f64,
    /// Twice the time between the maximum and the minimum, seconds
    pub period: f64,
}

/// Measure the largest peak-to-peak amplitude around a pick
///
/// Every trace is cut to `[pick_time - before, pick_time + after]`; the
/// component with the largest `max - min` wins.
///
/// # Returns
///
/// `None` if no component has samples inside the window
pub fn peak_to_peak(traces: &[Trace], pick_time: f64, before: f64, after: f64) -> Option<PeakToPeak> {
    let mut best: Option<PeakToPeak> = None;

    for trace in traces {
        let window = trace.slice(pick_time - before, pick_time + after);
        if window.is_empty() {
            continue;
        }

        let (mut i_max, mut i_min) = (0, 0);
        for (i, &v) in window.data.iter().enumerate() {
            if v > window.data[i_max] {
                i_max = i;
            }
            if v < window.data[i_min] {
                i_min = i;
            }
        }

        let value = window.data[i_max] - window.data[i_min];
        let period = 2.0 * (i_max as f64 - i_min as f64).abs() / window.sampling_rate;
        if best.map_or(true, |b| value > b.value) {
            best = Some(PeakToPeak { value, period });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_largest_component_wins() {
        let mut small = vec![0.0; 100];
        small[40] = 1.0;
        small[45] = -1.0;
        let mut large = vec![0.0; 100];
        large[50] = 3.0;
        large[60] = -2.0;

        let traces = vec![
            Trace::new("STA", "HHN", 0.0, 10.0, small),
            Trace::new("STA", "HHE", 0.0, 10.0, large),
        ];
        let p = peak_to_peak(&traces, 5.0, 2.0, 2.0).unwrap();
        assert_eq!(p.value, 5.0);
        assert!((p.period - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_window_excludes_outside_samples() {
        let mut data = vec![0.0; 100];
        data[5] = 100.0;
        data[60] = 1.0;
        let traces = vec![Trace::new("STA", "HHZ", 0.0, 10.0, data)];
        let p = peak_to_peak(&traces, 6.0, 1.0, 1.0).unwrap();
        assert_eq!(p.value, 1.0);
    }

    #[test]
    fn test_window_outside_trace() {
        let traces = vec![Trace::new("STA", "HHZ", 0.0, 10.0, vec![1.0; 10])];
        // Slicing clamps to the trace, so a fully flat window measures zero
        let p = peak_to_peak(&traces, 0.5, 0.2, 0.2).unwrap();
        assert_eq!(p.value, 0.0);
        assert!(peak_to_peak(&[], 0.5, 0.2, 0.2).is_none());
    }
}
