//! Canonicalization of expressions into standard linear form.
//!
//! Every expression in this crate is linear, so canonicalization is a single
//! fold of the DAG into a [`LinExpr`] over the flat variable space.

pub mod lin_expr;

pub use lin_expr::LinExpr;

use std::collections::BTreeMap;

use crate::expr::Expr;
use crate::sparse::csc_from_triplets;

/// Triplets gathered for one variable before its row is assembled.
struct RowBuilder {
    size: usize,
    cols: Vec<usize>,
    vals: Vec<f64>,
}

/// Fold an expression into `sum_i(a_i' x_i) + c`.
///
/// The DAG is walked once with an explicit stack and each variable's row is
/// assembled a single time, so the cost is linear in the number of leaf
/// entries. Shared nodes contribute once per use.
pub fn linearize(expr: &Expr) -> LinExpr {
    let mut rows: BTreeMap<usize, RowBuilder> = BTreeMap::new();
    let mut constant = 0.0;
    let mut stack = vec![expr];

    while let Some(node) = stack.pop() {
        match node {
            Expr::Dot(term) => {
                let var = term.slice().variable();
                let row = rows.entry(var.offset()).or_insert_with(|| RowBuilder {
                    size: var.size(),
                    cols: Vec::new(),
                    vals: Vec::new(),
                });
                for (col, val) in term.coefficients() {
                    row.cols.push(col);
                    row.vals.push(val);
                }
            }
            Expr::Sum(children) => stack.extend(children.iter().map(|c| c.as_ref())),
            Expr::Constant(v) => constant += v,
        }
    }

    let coeffs = rows
        .into_iter()
        .map(|(offset, row)| {
            let zeros = vec![0; row.cols.len()];
            (offset, csc_from_triplets(1, row.size, zeros, row.cols, row.vals))
        })
        .collect();
    LinExpr { coeffs, constant }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{constant, dot, sum, sum_over_indices};
    use crate::expr::{eye, ConeBlockVariable, ProblemId};

    #[test]
    fn test_linearize_trace() {
        let x = ConeBlockVariable::new(ProblemId::new(), 0, 0, None, 2, 2);
        let e = sum_over_indices(&x, &x.pick_diagonal()).unwrap();
        let lin = linearize(&e);
        assert_eq!(
            lin.columns(),
            vec![(0, 1.0), (3, 1.0), (4, 1.0), (7, 1.0)]
        );
    }

    #[test]
    fn test_linearize_uses_variable_offset() {
        let pid = ProblemId::new();
        let x = ConeBlockVariable::new(pid, 0, 0, None, 1, 1);
        let y = ConeBlockVariable::new(pid, 1, 1, None, 2, 2);
        let e = sum([
            dot(eye(1), &x.block(0).unwrap()).unwrap(),
            dot(eye(2), &y.block(1).unwrap()).unwrap(),
            constant(-2.0),
        ]);
        let lin = linearize(&e);
        assert_eq!(lin.columns(), vec![(0, 1.0), (5, 1.0), (8, 1.0)]);
        assert_eq!(lin.constant, -2.0);
    }

    #[test]
    fn test_linearize_large_sums() {
        // Trace of 3000 blocks gives 6000 distinct leaves
        let x = ConeBlockVariable::new(ProblemId::new(), 0, 0, None, 3000, 2);
        let trace = sum_over_indices(&x, &x.pick_diagonal()).unwrap();
        let cols = linearize(&trace).columns();
        assert_eq!(cols.len(), 6000);
        assert_eq!(cols[0], (0, 1.0));
        assert_eq!(cols[5999], (3000 * 4 - 1, 1.0));
        assert!(cols.iter().all(|&(_, v)| v == 1.0));

        // A deep left-leaning chain hitting one entry repeatedly
        let corner = dot(eye(1), &x.element(7, 1, 0).unwrap()).unwrap();
        let mut chain = constant(0.5);
        for _ in 0..2000 {
            chain = chain + corner.clone();
        }
        let lin = linearize(&chain);
        assert_eq!(lin.columns(), vec![(7 * 4 + 2, 2000.0)]);
        assert_eq!(lin.constant, 0.5);
    }
}
