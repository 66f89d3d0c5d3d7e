//! Robust statistics shared by the window estimator and the association stages
//!
//! - Densest window: the position of a fixed-width window that covers the
//!   most values, scanned on a regular grid between the extreme values
//! - Median and population standard deviation
//! - Distribution cleaning: drop values further than `nstd` robust standard
//!   deviations from the median
//!
//! # Reference
//!
//! Rousseeuw, P. J., & Croux, C. (1993). Alternatives to the Median Absolute
//! Deviation. *Journal of the American Statistical Association*, 88(424),
//! 1273-1283.

/// Center of the densest window of width `window` over `values`
///
/// `n_steps` candidate centers are linearly spaced between the smallest and
/// the largest value. A value counts for a candidate `c` if it lies strictly
/// inside `(c - window/2, c + window/2)`. The first candidate reaching the
/// maximum count wins.
///
/// # Returns
///
/// `None` for empty input
///
/// # Example
///
/// ```
/// use ps_picker::analysis::statistics::densest_window_center;
///
/// let values = [1.0, 10.0, 10.5, 11.0, 30.0];
/// let center = densest_window_center(&values, 3.0, 1000).unwrap();
/// assert!((center - 10.5).abs() < 1.5);
/// ```
pub fn densest_window_center(values: &[f64], window: f64, n_steps: usize) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let first = *finite.first()?;
    let (min, max) = finite
        .iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    let n_steps = n_steps.max(1);
    let half = window / 2.0;
    let step = if n_steps > 1 {
        (max - min) / (n_steps - 1) as f64
    } else {
        0.0
    };

    let mut best_center = min;
    let mut best_count = 0usize;
    for k in 0..n_steps {
        let center = min + step * k as f64;
        let (a, b) = (center - half, center + half);
        let count = finite.iter().filter(|&&v| a < v && v < b).count();
        if count > best_count {
            best_count = count;
            best_center = center;
        }
    }
    Some(best_center)
}

/// Median of `values`
///
/// # Returns
///
/// `None` for empty input
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) * 0.5
    } else {
        sorted[mid]
    })
}

/// Arithmetic mean; `None` for empty input
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation (divides by n); `None` for empty input
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Scale factor making the MAD a consistent estimator of σ for normal data
const MAD_TO_SIGMA: f64 = 1.4826;

/// Robust standard deviation `1.4826 * MAD`
///
/// Falls back to the population standard deviation when more than half of
/// the values coincide (MAD of zero). `None` for empty input.
pub fn robust_std(values: &[f64]) -> Option<f64> {
    let center = median(values)?;
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    let mad = median(&deviations)?;
    if mad > 0.0 {
        Some(MAD_TO_SIGMA * mad)
    } else {
        population_std(values)
    }
}

/// Mask of the values to keep after removing outliers
///
/// A value is kept when `|v - median| <= nstd * σ`, σ being the robust
/// standard deviation. With fewer than `min_values` values everything is
/// kept.
pub fn clean_distribution(values: &[f64], nstd: f64, min_values: usize) -> Vec<bool> {
    if values.len() < min_values {
        return vec![true; values.len()];
    }
    let (Some(center), Some(sigma)) = (median(values), robust_std(values)) else {
        return vec![true; values.len()];
    };
    values
        .iter()
        .map(|v| (v - center).abs() <= nstd * sigma)
        .collect()
}
