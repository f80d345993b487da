//! Registered constraints.

use std::sync::Arc;

use super::domain::Relation;
use crate::expr::Expr;

/// A scalar constraint `expr REL bound` registered on a problem.
///
/// Constraints are immutable once registered; `index` is the position in
/// registration order and stays stable for the life of the problem.
#[derive(Debug, Clone)]
pub struct Constraint {
    index: usize,
    expr: Arc<Expr>,
    relation: Relation,
    bound: f64,
}

impl Constraint {
    pub(crate) fn new(index: usize, expr: Arc<Expr>, relation: Relation, bound: f64) -> Self {
        Constraint {
            index,
            expr,
            relation,
            bound,
        }
    }

    /// Registration index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Constrained expression.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Relation to the bound.
    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Right-hand side.
    pub fn bound(&self) -> f64 {
        self.bound
    }

    /// Check whether `value` (the expression's value) satisfies the
    /// constraint within `tol`.
    pub fn is_satisfied_by(&self, value: f64, tol: f64) -> bool {
        match self.relation {
            Relation::GreaterThan => value >= self.bound - tol,
            Relation::LessThan => value <= self.bound + tol,
            Relation::EqualTo => (value - self.bound).abs() <= tol,
        }
    }
}
