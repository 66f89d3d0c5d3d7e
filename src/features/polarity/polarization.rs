//! Sliding three-component polarization analysis
//!
//! For each sample near a candidate onset, the covariance matrix of (Z, N, E)
//! over a centered window is diagonalised. With eigenvalues λ1 ≥ λ2 ≥ λ3 and
//! principal eigenvector u:
//!
//! - rectilinearity = 1 - (λ2 + λ3) / (2 λ1)
//! - azimuth = atan2(u_E, u_N)
//! - dip = atan(|u_Z| / sqrt(u_N² + u_E²))
//!
//! # Reference
//!
//! Vidale, J. E. (1986). Complex polarization analysis of particle motion.
//! *Bulletin of the Seismological Society of America*, 76(5), 1393-1405.

use nalgebra::Matrix3;

/// Eigenvalues below this are treated as zero motion
const EPSILON: f64 = 1e-30;

/// Polarization attributes, one value per sample (zero where not computed)
#[derive(Debug, Clone, Default)]
pub struct Polarization {
    /// Rectilinearity in [0, 1]
    pub rectilinearity: Vec<f64>,
    /// Azimuth of the principal axis, degrees
    pub azimuth: Vec<f64>,
    /// Dip of the principal axis, degrees in [0, 90]
    pub dip: Vec<f64>,
}

/// Eigen-decomposition of a symmetric 3×3 matrix
///
/// Returns eigenvalues in descending order and the matching unit
/// eigenvectors as columns.
pub fn symmetric_eigen(a: [[f64; 3]; 3]) -> ([f64; 3], [[f64; 3]; 3]) {
    let eigen = Matrix3::from_fn(|r, c| a[r][c]).symmetric_eigen();

    let mut order = [0usize, 1, 2];
    order.sort_by(|&i, &j| {
        eigen.eigenvalues[j]
            .partial_cmp(&eigen.eigenvalues[i])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let values = order.map(|i| eigen.eigenvalues[i]);
    let mut vectors = [[0.0; 3]; 3];
    for (col, &src) in order.iter().enumerate() {
        for (row, line) in vectors.iter_mut().enumerate() {
            line[col] = eigen.eigenvectors[(row, src)];
        }
    }
    (values, vectors)
}

/// Polarization attributes of one covariance matrix
fn attributes(cov: [[f64; 3]; 3]) -> (f64, f64, f64) {
    let (values, vectors) = symmetric_eigen(cov);
    if values[0] <= EPSILON {
        return (0.0, 0.0, 0.0);
    }
    let rect = (1.0 - (values[1].max(0.0) + values[2].max(0.0)) / (2.0 * values[0])).clamp(0.0, 1.0);
    let (uz, un, ue) = (vectors[0][0], vectors[1][0], vectors[2][0]);
    let azimuth = ue.atan2(un).to_degrees();
    let dip = uz.abs().atan2((un * un + ue * ue).sqrt()).to_degrees();
    (rect, azimuth, dip)
}

/// Sliding polarization around candidate samples
///
/// # Arguments
///
/// * `z`, `n`, `e` - Filtered components (truncated to the shortest)
/// * `centers` - Candidate sample indices
/// * `window` - Covariance window length in samples (centered)
/// * `margin` - Attributes are computed within ± `margin` of each center
///
/// # Returns
///
/// Full-length attribute traces, zero away from the candidates
pub fn polarization(
    z: &[f64],
    n: &[f64],
    e: &[f64],
    centers: &[usize],
    window: usize,
    margin: usize,
) -> Polarization {
    let len = z.len().min(n.len()).min(e.len());
    let mut out = Polarization {
        rectilinearity: vec![0.0; len],
        azimuth: vec![0.0; len],
        dip: vec![0.0; len],
    };
    if len == 0 {
        return out;
    }

    let comps = [&z[..len], &n[..len], &e[..len]];

    // Prefix sums of components and their pairwise products
    let mut sums: Vec<[f64; 3]> = Vec::with_capacity(len + 1);
    let mut prods: Vec<[f64; 6]> = Vec::with_capacity(len + 1);
    sums.push([0.0; 3]);
    prods.push([0.0; 6]);
    let pairs = [(0, 0), (0, 1), (0, 2), (1, 1), (1, 2), (2, 2)];
    for i in 0..len {
        let mut s = sums[i];
        let mut p = prods[i];
        for c in 0..3 {
            s[c] += comps[c][i];
        }
        for (k, &(a, b)) in pairs.iter().enumerate() {
            p[k] += comps[a][i] * comps[b][i];
        }
        sums.push(s);
        prods.push(p);
    }

    let half = (window / 2).max(1);
    let mut done = vec![false; len];
    for &center in centers {
        let lo = center.saturating_sub(margin);
        let hi = (center + margin + 1).min(len);
        for i in lo..hi {
            if done[i] {
                continue;
            }
            done[i] = true;

            let a = i.saturating_sub(half);
            let b = (i + half + 1).min(len);
            let count = (b - a) as f64;
            let mean: [f64; 3] = std::array::from_fn(|c| (sums[b][c] - sums[a][c]) / count);
            let mut cov = [[0.0; 3]; 3];
            for (k, &(x, y)) in pairs.iter().enumerate() {
                let v = (prods[b][k] - prods[a][k]) / count - mean[x] * mean[y];
                cov[x][y] = v;
                cov[y][x] = v;
            }

            let (rect, azimuth, dip) = attributes(cov);
            out.rectilinearity[i] = rect;
            out.azimuth[i] = azimuth;
            out.dip[i] = dip;
        }
    }
    out
}
