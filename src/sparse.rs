//! Sparse helpers over nalgebra-sparse.
//!
//! Linear rows are kept as `1 x n` CSC matrices and the stuffed constraint
//! matrix is assembled from triplets.

use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Assemble a CSC matrix from parallel row, column and value vectors.
///
/// Duplicates are summed together. Every triplet must lie inside
/// `nrows x ncols`.
pub fn csc_from_triplets(
    nrows: usize,
    ncols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    vals: Vec<f64>,
) -> CscMatrix<f64> {
    let mut triplets = CooMatrix::new(nrows, ncols);
    for ((&r, &c), val) in rows.iter().zip(&cols).zip(vals) {
        debug_assert!(r < nrows && c < ncols, "triplet ({r}, {c}) out of bounds");
        triplets.push(r, c, val);
    }
    CscMatrix::from(&triplets)
}

/// Entrywise sum of two CSC matrices of equal shape.
pub fn csc_add(lhs: &CscMatrix<f64>, rhs: &CscMatrix<f64>) -> CscMatrix<f64> {
    let mut sum = CooMatrix::new(lhs.nrows(), lhs.ncols());
    for (r, c, v) in lhs.triplet_iter().chain(rhs.triplet_iter()) {
        sum.push(r, c, *v);
    }
    CscMatrix::from(&sum)
}

/// Stored entries of a `1 x n` row matrix as (column, value) pairs.
pub fn csc_row_entries(row: &CscMatrix<f64>) -> Vec<(usize, f64)> {
    row.triplet_iter().map(|(_, c, v)| (c, *v)).collect()
}

/// Dense copy, for inspection in tests and dumps.
pub fn csc_to_dense(m: &CscMatrix<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(m.nrows(), m.ncols(), |r, c| {
        m.get_entry(r, c).map_or(0.0, |e| e.into_value())
    })
}
