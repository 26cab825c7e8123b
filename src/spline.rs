//! Row-wise cubic spline fill of a sparse raster.
//!
//! For every raster row the non-zero cells are the control points.  Rows with
//! fewer than four samples get zero-valued anchors so a cubic can still be
//! fitted:
//!
//! ```text
//! samples  control set
//!   0      row stays zero
//!   1      0 @ col 0,  0 @ col 1,  sample,      0 @ last col
//!   2      0 @ col 0,  samples,    0 @ last col
//!   3      0 @ col 0,  samples
//!  >=4     samples only
//! ```
//!
//! An anchor that falls on the column of a real sample (or of another anchor,
//! on rasters 3 columns wide or less) is dropped.  When fewer than four
//! distinct columns remain the spline degree drops to `points - 1`.
//!
//! Parameters are columns scaled to `[0, 1]` (`u = col / (cols - 1)`), the
//! knot vector is clamped and averaged (Piegl & Tiller, eq. 9.8) and the
//! spline is solved to pass through every control point.  It is then
//! evaluated at every column; outside the first/last control point the end
//! polynomial pieces are extended.
use std::collections::BTreeMap;

use log::warn;
use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::error::{Result, TopoError};

/// Interpolating B-spline `y(u)` of a scalar function.
#[derive(Debug, Clone)]
pub struct BSpline {
    degree: usize,
    knots: Vec<f64>,
    coeffs: Vec<f64>,
}

impl BSpline {
    /// Fit the spline of `degree` through `(params[k], values[k])`.
    ///
    /// `params` must be strictly increasing and `degree < params.len()`.
    pub fn interpolate(params: &[f64], values: &[f64], degree: usize) -> Result<Self> {
        let n_pts = params.len();
        if n_pts == 0 || n_pts != values.len() {
            return Err(TopoError::DegenerateSpline(format!(
                "{} parameters for {} values",
                n_pts,
                values.len()
            )));
        }
        if degree >= n_pts {
            return Err(TopoError::DegenerateSpline(format!(
                "degree {degree} needs more than {n_pts} points"
            )));
        }
        if params.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(TopoError::DegenerateSpline(
                "parameters are not strictly increasing".into(),
            ));
        }

        let knots = averaged_knots(params, degree);
        let mut spline = Self { degree, knots, coeffs: vec![0.0; n_pts] };

        // Collocation matrix A[k, j] = N_j(u_k).
        let mut a = Array2::<f64>::zeros((n_pts, n_pts));
        for (k, &u) in params.iter().enumerate() {
            let span = spline.find_span(u);
            for (r, b) in spline.basis(span, u).into_iter().enumerate() {
                a[[k, span - degree + r]] = b;
            }
        }
        spline.coeffs = solve_dense(a, values.to_vec())?;
        Ok(spline)
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Evaluate at `u`.  Outside the knot range the end pieces are extended.
    pub fn eval(&self, u: f64) -> f64 {
        let span = self.find_span(u);
        self.basis(span, u)
            .into_iter()
            .enumerate()
            .map(|(r, b)| b * self.coeffs[span - self.degree + r])
            .sum()
    }

    /// Knot span index `i` with `U[i] <= u < U[i+1]`, clamped to `[p, n]`.
    fn find_span(&self, u: f64) -> usize {
        let n = self.coeffs.len() - 1;
        let p = self.degree;
        let u_knots = &self.knots;
        if u >= u_knots[n + 1] {
            return n;
        }
        if u <= u_knots[p] {
            return p;
        }
        let (mut low, mut high) = (p, n + 1);
        let mut mid = (low + high) / 2;
        while u < u_knots[mid] || u >= u_knots[mid + 1] {
            if u < u_knots[mid] {
                high = mid;
            } else {
                low = mid;
            }
            mid = (low + high) / 2;
        }
        mid
    }

    /// The `p + 1` basis functions that are non-zero on `span`, evaluated at `u`.
    fn basis(&self, span: usize, u: f64) -> Vec<f64> {
        let p = self.degree;
        let u_knots = &self.knots;
        let mut n = vec![0.0; p + 1];
        let mut left = vec![0.0; p + 1];
        let mut right = vec![0.0; p + 1];
        n[0] = 1.0;
        for j in 1..=p {
            left[j] = u - u_knots[span + 1 - j];
            right[j] = u_knots[span + j] - u;
            let mut saved = 0.0;
            for r in 0..j {
                let tmp = n[r] / (right[r + 1] + left[j - r]);
                n[r] = saved + right[r + 1] * tmp;
                saved = left[j - r] * tmp;
            }
            n[j] = saved;
        }
        n
    }
}

/// Clamped knot vector with interior knots averaged over `degree` parameters.
fn averaged_knots(params: &[f64], degree: usize) -> Vec<f64> {
    let n = params.len() - 1;
    let (first, last) = (params[0], params[n]);
    let mut knots = Vec::with_capacity(n + degree + 2);
    knots.extend(std::iter::repeat(first).take(degree + 1));
    for j in 1..=n.saturating_sub(degree) {
        let avg = params[j..j + degree].iter().sum::<f64>() / degree as f64;
        knots.push(avg);
    }
    knots.extend(std::iter::repeat(last).take(degree + 1));
    knots
}

/// Solve `a · x = b` by Gaussian elimination with partial pivoting.
fn solve_dense(mut a: Array2<f64>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        if a[[pivot, col]].abs() < 1e-14 {
            return Err(TopoError::DegenerateSpline("singular collocation matrix".into()));
        }
        if pivot != col {
            for k in 0..n {
                a.swap([pivot, k], [col, k]);
            }
            b.swap(pivot, col);
        }
        for row in col + 1..n {
            let f = a[[row, col]] / a[[col, col]];
            if f == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= f * a[[col, k]];
            }
            b[row] -= f * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    Ok(x)
}

/// Control points `(column, value)` of one raster row, anchors included,
/// sorted by column.
pub fn control_points(row: ArrayView1<f64>) -> Vec<(usize, f64)> {
    let mut pts: BTreeMap<usize, f64> = row
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v != 0.0)
        .map(|(c, &v)| (c, v))
        .collect();

    let last = row.len().saturating_sub(1);
    let anchors = match pts.len() {
        0 => return Vec::new(),
        1 => vec![0, 1, last],
        2 => vec![0, last],
        3 => vec![0],
        _ => vec![],
    };
    for col in anchors {
        if col <= last {
            pts.entry(col).or_insert(0.0);
        }
    }
    pts.into_iter().collect()
}

/// Spline-fill one row.  A row without samples comes back all zero.
pub fn interpolate_row(row: ArrayView1<f64>) -> Result<Array1<f64>> {
    let cols = row.len();
    if cols <= 1 {
        return Ok(row.to_owned());
    }
    let pts = control_points(row);
    if pts.is_empty() {
        return Ok(Array1::zeros(cols));
    }

    let scale = (cols - 1) as f64;
    let params: Vec<f64> = pts.iter().map(|&(c, _)| c as f64 / scale).collect();
    let values: Vec<f64> = pts.iter().map(|&(_, v)| v).collect();
    let degree = 3.min(pts.len() - 1);

    let spline = BSpline::interpolate(&params, &values, degree)?;
    Ok(Array1::from_shape_fn(cols, |k| spline.eval(k as f64 / scale)))
}

/// Spline-fill every row of `raster` ([H, W]) along its columns.
///
/// A row whose fit fails is copied through unchanged with a warning.
pub fn interpolate_rows(raster: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros(raster.dim());
    for (y, (src, mut dst)) in raster
        .axis_iter(Axis(0))
        .zip(out.axis_iter_mut(Axis(0)))
        .enumerate()
    {
        match interpolate_row(src) {
            Ok(filled) => dst.assign(&filled),
            Err(e) => {
                warn!("row {y}: {e}; row left uninterpolated");
                dst.assign(&src);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn single_sample_anchors() {
        let row = array![0.0, 0.0, 0.0, 0.0, 2.5, 0.0, 0.0, 0.0];
        let pts = control_points(row.view());
        assert_eq!(pts, vec![(0, 0.0), (1, 0.0), (4, 2.5), (7, 0.0)]);
    }

    #[test]
    fn two_and_three_sample_anchors() {
        let two = array![0.0, 0.0, 1.0, 0.0, 3.0, 0.0];
        assert_eq!(control_points(two.view()), vec![(0, 0.0), (2, 1.0), (4, 3.0), (5, 0.0)]);

        let three = array![0.0, 1.0, 2.0, 0.0, 3.0, 0.0];
        assert_eq!(
            control_points(three.view()),
            vec![(0, 0.0), (1, 1.0), (2, 2.0), (4, 3.0)]
        );
    }

    #[test]
    fn anchor_on_real_sample_keeps_sample() {
        let row = array![0.0, 4.0, 0.0];
        // Anchors 0, 1 (taken by the sample), 2.
        assert_eq!(control_points(row.view()), vec![(0, 0.0), (1, 4.0), (2, 0.0)]);
    }

    #[test]
    fn single_sample_passes_through() {
        for c in 0..9 {
            let mut row = Array1::<f64>::zeros(9);
            row[c] = -1.75;
            let out = interpolate_row(row.view()).unwrap();
            approx::assert_abs_diff_eq!(out[c], -1.75, epsilon = 1e-9);
        }
    }

    #[test]
    fn cubic_is_reproduced_everywhere() {
        // Four or more samples of a cubic: the spline is that cubic, including
        // the extrapolated ends.
        let f = |x: f64| 1.0 + 0.5 * x - 0.1 * x * x + 0.01 * x * x * x;
        let mut row = Array1::<f64>::zeros(10);
        for c in [1, 3, 4, 6, 8] {
            row[c] = f(c as f64);
        }
        let out = interpolate_row(row.view()).unwrap();
        for c in 0..10 {
            approx::assert_abs_diff_eq!(out[c], f(c as f64), epsilon = 1e-9);
        }
    }

    #[test]
    fn empty_row_stays_zero() {
        let out = interpolate_row(Array1::<f64>::zeros(6).view()).unwrap();
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn narrow_rows_do_not_fail() {
        let two = interpolate_row(array![3.0, 0.0].view()).unwrap();
        approx::assert_abs_diff_eq!(two[0], 3.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(two[1], 0.0, epsilon = 1e-12);

        let one = interpolate_row(array![5.0].view()).unwrap();
        assert_eq!(one[0], 5.0);

        let three = interpolate_row(array![0.0, 0.0, 2.0].view()).unwrap();
        approx::assert_abs_diff_eq!(three[2], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn duplicate_parameters_are_rejected() {
        assert!(BSpline::interpolate(&[0.0, 0.5, 0.5, 1.0], &[0.0; 4], 3).is_err());
        assert!(BSpline::interpolate(&[0.0, 1.0], &[1.0, 2.0], 2).is_err());
    }

    #[test]
    fn linear_spline_is_linear() {
        let s = BSpline::interpolate(&[0.0, 1.0], &[1.0, 3.0], 1).unwrap();
        approx::assert_abs_diff_eq!(s.eval(0.25), 1.5, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(s.eval(2.0), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn rows_are_independent() {
        let raster = array![
            [0.0, 0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0, 0.0, 2.0],
        ];
        let out = interpolate_rows(&raster);
        assert_eq!(out.dim(), (3, 5));
        approx::assert_abs_diff_eq!(out[[0, 2]], 1.0, epsilon = 1e-9);
        assert!(out.row(1).iter().all(|&v| v == 0.0));
        approx::assert_abs_diff_eq!(out[[2, 0]], 2.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(out[[2, 4]], 2.0, epsilon = 1e-9);
    }
}
