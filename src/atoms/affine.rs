//! Linear atoms and operator overloading.

use std::ops::Add;
use std::sync::Arc;

use nalgebra::DMatrix;

use crate::error::Result;
use crate::expr::{ConeBlockVariable, DotTerm, Expr, Slice};

/// Frobenius inner product `<A, S>` of a constant matrix and a slice.
///
/// Fails with `ShapeMismatch` unless `A` has exactly the slice's logical
/// shape. Pass an `Arc` to share one matrix between many terms.
///
/// # Example
///
/// ```
/// use sdpmodel::prelude::*;
///
/// let mut problem = Problem::new("dot");
/// let x = problem.cone_block_variable(2, 2).unwrap();
/// let e = dot(eye(2), &x.block(0).unwrap()).unwrap();
/// assert_eq!(e.num_terms(), 1);
/// assert!(dot(eye(3), &x.block(0).unwrap()).is_err());
/// ```
pub fn dot(matrix: impl Into<Arc<DMatrix<f64>>>, slice: &Slice) -> Result<Expr> {
    Ok(Expr::Dot(DotTerm::new(matrix.into(), slice.clone())?))
}

/// Sum of expressions. The empty sum is the constant 0.
pub fn sum(exprs: impl IntoIterator<Item = Expr>) -> Expr {
    let children: Vec<Arc<Expr>> = exprs.into_iter().map(Arc::new).collect();
    if children.is_empty() {
        Expr::Constant(0.0)
    } else {
        Expr::Sum(children)
    }
}

/// Sum of two expressions.
pub fn add(a: &Expr, b: &Expr) -> Expr {
    Expr::Sum(vec![Arc::new(a.clone()), Arc::new(b.clone())])
}

/// Constant expression.
pub fn constant(value: f64) -> Expr {
    Expr::Constant(value)
}

/// Sum of the entries of `var` at the given `(j, s1, s2)` coordinates.
///
/// Every coordinate is validated up front; a single bad one fails the whole
/// call with `IndexOutOfRange`. Used with
/// [`ConeBlockVariable::pick_diagonal`] for trace objectives.
pub fn sum_over_indices(var: &ConeBlockVariable, indices: &[[usize; 3]]) -> Result<Expr> {
    let one = Arc::new(DMatrix::from_element(1, 1, 1.0));
    let terms = indices
        .iter()
        .map(|&[j, s1, s2]| {
            let entry = var.element(j, s1, s2)?;
            Ok(Expr::Dot(DotTerm::new(one.clone(), entry)?))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(sum(terms))
}

// ============================================================================
// Operator overloading for Expr
// ============================================================================

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::Sum(vec![Arc::new(self), Arc::new(rhs)])
    }
}

impl Add for &Expr {
    type Output = Expr;

    fn add(self, rhs: &Expr) -> Expr {
        add(self, rhs)
    }
}

impl Add<f64> for Expr {
    type Output = Expr;

    fn add(self, rhs: f64) -> Expr {
        Expr::Sum(vec![Arc::new(self), Arc::new(Expr::Constant(rhs))])
    }
}
