//! Linear expression representation for canonicalization.
//!
//! After canonicalization, a scalar expression is in standard form
//! `sum_i(a_i' x_i) + c`, where each `a_i` is a sparse row over the entries
//! of one block variable.

use std::collections::BTreeMap;

use nalgebra_sparse::CscMatrix;

use crate::sparse::{csc_add, csc_from_triplets, csc_row_entries};

/// A scalar linear expression in standard form: `sum_i(a_i' x_i) + c`.
#[derive(Debug, Clone)]
pub struct LinExpr {
    /// Coefficient rows keyed by the variable's column offset in the flat
    /// solution vector. Each row is `1 x var_size`.
    pub coeffs: BTreeMap<usize, CscMatrix<f64>>,
    /// Constant term.
    pub constant: f64,
}

impl LinExpr {
    /// The zero expression.
    pub fn zero() -> Self {
        LinExpr {
            coeffs: BTreeMap::new(),
            constant: 0.0,
        }
    }

    /// A constant expression.
    pub fn scalar(value: f64) -> Self {
        LinExpr {
            coeffs: BTreeMap::new(),
            constant: value,
        }
    }

    /// A single coefficient row for the variable at `offset` with `size` entries.
    ///
    /// Repeated local indices are summed.
    pub fn term(offset: usize, size: usize, entries: impl IntoIterator<Item = (usize, f64)>) -> Self {
        let (cols, vals): (Vec<usize>, Vec<f64>) = entries.into_iter().unzip();
        let rows = vec![0; cols.len()];
        let mut coeffs = BTreeMap::new();
        coeffs.insert(offset, csc_from_triplets(1, size, rows, cols, vals));
        LinExpr {
            coeffs,
            constant: 0.0,
        }
    }

    /// Check if this is a constant (no variables).
    pub fn is_constant(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Add two linear expressions.
    pub fn add(&self, other: &LinExpr) -> LinExpr {
        let mut coeffs = self.coeffs.clone();
        for (offset, coeff) in &other.coeffs {
            coeffs
                .entry(*offset)
                .and_modify(|c| *c = csc_add(c, coeff))
                .or_insert_with(|| coeff.clone());
        }
        LinExpr {
            coeffs,
            constant: self.constant + other.constant,
        }
    }

    /// Coefficients over global columns, sorted by column, zeros dropped.
    pub fn columns(&self) -> Vec<(usize, f64)> {
        let mut cols: Vec<(usize, f64)> = self
            .coeffs
            .iter()
            .flat_map(|(offset, row)| {
                csc_row_entries(row)
                    .into_iter()
                    .map(move |(col, val)| (offset + col, val))
            })
            .filter(|(_, val)| *val != 0.0)
            .collect();
        cols.sort_by_key(|(col, _)| *col);
        cols
    }

    /// Value at a point of the flat variable space.
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        self.columns()
            .into_iter()
            .map(|(col, val)| val * x[col])
            .sum::<f64>()
            + self.constant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        let e = LinExpr::zero();
        assert!(e.is_constant());
        assert_eq!(e.evaluate(&[]), 0.0);
    }

    #[test]
    fn test_term_sums_duplicates() {
        let e = LinExpr::term(4, 3, [(0, 1.0), (2, 2.0), (0, 0.5)]);
        assert_eq!(e.columns(), vec![(4, 1.5), (6, 2.0)]);
    }

    #[test]
    fn test_add_merges_rows() {
        let a = LinExpr::term(0, 2, [(0, 1.0)]);
        let b = LinExpr::term(0, 2, [(0, 2.0), (1, 1.0)]);
        let c = LinExpr::term(2, 1, [(0, -1.0)]).add(&LinExpr::scalar(3.0));
        let e = a.add(&b).add(&c);
        assert_eq!(e.columns(), vec![(0, 3.0), (1, 1.0), (2, -1.0)]);
        assert_eq!(e.constant, 3.0);
        assert_eq!(e.evaluate(&[1.0, 2.0, 4.0]), 3.0 + 2.0 - 4.0 + 3.0);
    }

    #[test]
    fn test_cancelled_terms_dropped() {
        let a = LinExpr::term(0, 1, [(0, 1.0)]);
        let b = LinExpr::term(0, 1, [(0, -1.0)]);
        assert!(a.add(&b).columns().is_empty());
    }
}
