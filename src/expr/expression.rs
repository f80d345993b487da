//! Core expression types for sdpmodel.
//!
//! An [`Expr`] is an immutable, scalar-valued linear expression over slices of
//! block variables. Nodes are shared with `Arc`, so expressions form a DAG
//! that can be reused across several constraints without copying.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use nalgebra::DMatrix;

use super::variable::{ConeBlockVariable, Slice};
use crate::error::{CvxError, Result};

/// Unique identifier for problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProblemId(u64);

impl ProblemId {
    /// Generate a new unique ID.
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        ProblemId(NEXT_ID.fetch_add(1, Ordering::SeqCst))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ProblemId {
    fn default() -> Self {
        Self::new()
    }
}

/// Frobenius inner product of a constant matrix with a slice.
///
/// The matrix shape is checked against the slice's logical shape when the
/// term is built, so every `DotTerm` in existence is well formed.
#[derive(Debug, Clone)]
pub struct DotTerm {
    matrix: Arc<DMatrix<f64>>,
    slice: Slice,
}

impl DotTerm {
    /// Pair a constant matrix with a slice of the same shape.
    pub fn new(matrix: Arc<DMatrix<f64>>, slice: Slice) -> Result<Self> {
        if !slice.shape().matches_matrix(matrix.nrows(), matrix.ncols()) {
            return Err(CvxError::shape_mismatch(
                slice.shape(),
                format!("({}, {}) constant", matrix.nrows(), matrix.ncols()),
            ));
        }
        Ok(DotTerm { matrix, slice })
    }

    /// The constant matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// The slice being weighted.
    pub fn slice(&self) -> &Slice {
        &self.slice
    }

    /// Pairs of (flat offset within the variable, coefficient).
    ///
    /// The k-th entry of the slice in row-major order meets the matrix entry
    /// at `(k / cols, k % cols)`.
    pub fn coefficients(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        let cols = self.matrix.ncols();
        self.slice
            .flat_indices()
            .enumerate()
            .map(move |(k, idx)| (idx, self.matrix[(k / cols, k % cols)]))
    }
}

/// A scalar linear expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// `<A, S>` for a constant matrix `A` and a slice `S`.
    Dot(DotTerm),
    /// Arithmetic sum of sub-expressions.
    Sum(Vec<Arc<Expr>>),
    /// Constant offset.
    Constant(f64),
}

impl Expr {
    /// All distinct variables referenced by this expression, in first-use order.
    pub fn variables(&self) -> Vec<ConeBlockVariable> {
        let mut vars: Vec<ConeBlockVariable> = Vec::new();
        self.visit_terms(&mut |term| {
            let v = term.slice().variable();
            if !vars.iter().any(|seen| seen.same_as(v)) {
                vars.push(v.clone());
            }
        });
        vars
    }

    /// Number of `Dot` leaves, counting shared nodes once per use.
    pub fn num_terms(&self) -> usize {
        let mut count = 0;
        self.visit_terms(&mut |_| count += 1);
        count
    }

    /// Check if this expression has no variable terms.
    pub fn is_constant(&self) -> bool {
        self.num_terms() == 0
    }

    pub(crate) fn visit_terms(&self, f: &mut impl FnMut(&DotTerm)) {
        match self {
            Expr::Dot(term) => f(term),
            Expr::Sum(children) => {
                for child in children {
                    child.visit_terms(f);
                }
            }
            Expr::Constant(_) => {}
        }
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Expr::Constant(v)
    }
}

impl From<DotTerm> for Expr {
    fn from(term: DotTerm) -> Self {
        Expr::Dot(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(n: usize, d: usize) -> ConeBlockVariable {
        ConeBlockVariable::new(ProblemId::new(), 0, 0, None, n, d)
    }

    #[test]
    fn test_problem_ids_unique() {
        assert_ne!(ProblemId::new(), ProblemId::new());
    }

    #[test]
    fn test_dot_term_shape_check() {
        let x = var(2, 2);
        let ok = DotTerm::new(Arc::new(DMatrix::identity(2, 2)), x.block(0).unwrap());
        assert!(ok.is_ok());

        let bad = DotTerm::new(Arc::new(DMatrix::identity(3, 3)), x.block(0).unwrap());
        assert!(matches!(bad, Err(CvxError::ShapeMismatch { .. })));

        // Unreshaped [1, 2, 2] slice does not line up with a matrix
        let raw = x.slice(&[0, 0, 0], &[1, 2, 2]).unwrap();
        let bad = DotTerm::new(Arc::new(DMatrix::identity(2, 2)), raw);
        assert!(bad.is_err());
    }

    #[test]
    fn test_dot_term_coefficients() {
        let x = var(2, 2);
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let term = DotTerm::new(Arc::new(a), x.block(1).unwrap()).unwrap();
        let coeffs: Vec<_> = term.coefficients().collect();
        assert_eq!(coeffs, vec![(4, 1.0), (5, 2.0), (6, 3.0), (7, 4.0)]);
    }

    #[test]
    fn test_variables_dedup() {
        let x = var(2, 1);
        let y = var(1, 1);
        let one = Arc::new(DMatrix::from_element(1, 1, 1.0));
        let leaf = |s: Slice| Arc::new(Expr::Dot(DotTerm::new(one.clone(), s).unwrap()));
        let e = Expr::Sum(vec![
            leaf(x.block(0).unwrap()),
            leaf(y.block(0).unwrap()),
            leaf(x.block(1).unwrap()),
            Arc::new(Expr::Constant(3.0)),
        ]);
        let vars = e.variables();
        assert_eq!(vars.len(), 2);
        assert!(vars[0].same_as(&x));
        assert!(vars[1].same_as(&y));
        assert_eq!(e.num_terms(), 3);
        assert!(!e.is_constant());
    }
}
