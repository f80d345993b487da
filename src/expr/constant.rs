//! Constant data matrices.
//!
//! Constant matrices are plain `nalgebra::DMatrix<f64>` values. These helpers
//! build the symmetric matrices that are dotted against PSD blocks.

use nalgebra::DMatrix;

use crate::error::{CvxError, Result};

/// Build a symmetric `d x d` matrix from a generator of its lower triangle.
///
/// `f(s1, s2)` is called once for each `s2 <= s1` and mirrored above the
/// diagonal.
pub fn symmetric_matrix(d: usize, mut f: impl FnMut(usize, usize) -> f64) -> DMatrix<f64> {
    let mut m = DMatrix::zeros(d, d);
    for s1 in 0..d {
        for s2 in 0..=s1 {
            let v = f(s1, s2);
            m[(s1, s2)] = v;
            m[(s2, s1)] = v;
        }
    }
    m
}

/// Create a matrix from row-major data.
pub fn matrix_from_rows(values: &[f64], rows: usize, cols: usize) -> Result<DMatrix<f64>> {
    if values.len() != rows * cols {
        return Err(CvxError::shape_mismatch(
            format!("{} values for ({}, {})", rows * cols, rows, cols),
            values.len(),
        ));
    }
    Ok(DMatrix::from_row_slice(rows, cols, values))
}

/// Create a diagonal matrix.
pub fn diag_matrix(values: &[f64]) -> DMatrix<f64> {
    let n = values.len();
    DMatrix::from_fn(n, n, |i, j| if i == j { values[i] } else { 0.0 })
}

/// Create a `d x d` identity matrix.
pub fn eye(d: usize) -> DMatrix<f64> {
    DMatrix::identity(d, d)
}

/// Check if a matrix is square and symmetric within `tol`.
pub fn is_symmetric(m: &DMatrix<f64>, tol: f64) -> bool {
    if m.nrows() != m.ncols() {
        return false;
    }
    let n = m.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            if (m[(i, j)] - m[(j, i)]).abs() > tol {
                return false;
            }
        }
    }
    true
}

/// Check if a symmetric matrix is positive semidefinite within `tol`.
///
/// Returns `None` for non-symmetric input.
pub fn is_psd(m: &DMatrix<f64>, tol: f64) -> Option<bool> {
    if !is_symmetric(m, tol.max(1e-10)) {
        return None;
    }
    let eig = m.clone().symmetric_eigen();
    Some(eig.eigenvalues.iter().all(|&v| v >= -tol))
}
