//! Boxcar smoothing and mean removal

/// Remove the mean from samples
pub fn demean(data: &[f64]) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let mean = data.iter().sum::<f64>() / data.len() as f64;
    data.iter().map(|&x| x - mean).collect()
}

/// Centered moving average
///
/// Output has the same length as the input. Near the edges the average is
/// taken over the part of the window inside the data. Even widths are
/// rounded up to the next odd width so the window stays centered; a width of
/// 0 or 1 returns the input unchanged.
pub fn boxcar(data: &[f64], width: usize) -> Vec<f64> {
    if width <= 1 || data.is_empty() {
        return data.to_vec();
    }
    let half = width / 2;

    // Prefix sums keep this O(n) for the wide kernels used on kurtosis
    let mut prefix = Vec::with_capacity(data.len() + 1);
    prefix.push(0.0);
    let mut acc = 0.0;
    for &x in data {
        acc += x;
        prefix.push(acc);
    }

    (0..data.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(data.len());
            (prefix[hi] - prefix[lo]) / (hi - lo) as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demean() {
        let out = demean(&[1.0, 2.0, 3.0]);
        assert_eq!(out, vec![-1.0, 0.0, 1.0]);
        assert!(demean(&[]).is_empty());
    }

    #[test]
    fn test_boxcar_identity_widths() {
        let x = vec![1.0, 5.0, 2.0];
        assert_eq!(boxcar(&x, 0), x);
        assert_eq!(boxcar(&x, 1), x);
    }

    #[test]
    fn test_boxcar_centered() {
        let x = vec![0.0, 0.0, 3.0, 0.0, 0.0];
        let y = boxcar(&x, 3);
        assert_eq!(y.len(), 5);
        assert!((y[1] - 1.0).abs() < 1e-12);
        assert!((y[2] - 1.0).abs() < 1e-12);
        assert!((y[3] - 1.0).abs() < 1e-12);
        assert!(y[0].abs() < 1e-12);
    }

    #[test]
    fn test_boxcar_preserves_constant() {
        let y = boxcar(&[2.0; 20], 7);
        assert!(y.iter().all(|v| (v - 2.0).abs() < 1e-12));
    }
}
