//! Per-channel min–max normalisation.
//!
//! `signal`: [T, C]  →  `signal[:, c] = (signal[:, c] - min_c) / (max_c - min_c)`
//!
//! Every non-constant channel spans exactly `[0, 1]` afterwards.  A constant
//! channel has no dynamic range and is set to 0, which the matrix builder and
//! spline treat as "no data".
use ndarray::{Array2, Axis};

/// Min–max normalise each column of `signal` ([T, C]) in place.
/// Returns the `(min, max)` of every column before normalisation.
pub fn minmax_columns_inplace(signal: &mut Array2<f64>) -> Vec<(f64, f64)> {
    let mut ranges = Vec::with_capacity(signal.ncols());
    for mut col in signal.axis_iter_mut(Axis(1)) {
        let (min, max) = col
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        if col.is_empty() {
            ranges.push((0.0, 0.0));
            continue;
        }
        let span = max - min;
        if span > 0.0 {
            col.mapv_inplace(|v| (v - min) / span);
        } else {
            col.fill(0.0);
        }
        ranges.push((min, max));
    }
    ranges
}

/// Allocating variant of [`minmax_columns_inplace`].
pub fn normalize_signal(signal: &Array2<f64>) -> Array2<f64> {
    let mut out = signal.clone();
    minmax_columns_inplace(&mut out);
    out
}
