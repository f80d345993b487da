//! The contract between a problem and a solving backend.
//!
//! A [`Problem`](crate::Problem) flattens itself into a [`ConicProblem`]:
//! cone declarations for each block variable plus linear rows over the
//! concatenated variable space. A [`Solver`] turns that into a
//! [`SolverOutput`]. Backends are passed to `Problem::solve` explicitly, so no
//! solver state is shared between problems.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constraints::Relation;
use crate::problem::Sense;

/// Kind of cone a block of the variable space is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConeKind {
    /// Stacked symmetric PSD matrices.
    Psd,
}

/// Cone declaration for one block variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConeDeclaration {
    /// Cone kind.
    pub kind: ConeKind,
    /// Block dimension `d`.
    pub dim: usize,
    /// Number of blocks `n`.
    pub count: usize,
    /// First column of the variable in the flat variable space.
    pub offset: usize,
}

impl ConeDeclaration {
    /// Number of columns covered, `n * d * d`.
    pub fn size(&self) -> usize {
        self.count * self.dim * self.dim
    }

    /// First column of block `j`.
    pub fn block_offset(&self, j: usize) -> usize {
        self.offset + j * self.dim * self.dim
    }
}

/// Linear objective `sense c'x + c0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearObjective {
    /// Optimization sense.
    pub sense: Sense,
    /// Sparse coefficients as (column, value), sorted by column.
    pub coeffs: Vec<(usize, f64)>,
    /// Constant offset.
    pub constant: f64,
}

impl LinearObjective {
    /// Objective with no terms; every feasible point is optimal.
    pub fn feasibility() -> Self {
        LinearObjective {
            sense: Sense::Minimize,
            coeffs: Vec::new(),
            constant: 0.0,
        }
    }
}

/// Linear constraint `a'x REL bound`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    /// Sparse coefficients as (column, value), sorted by column.
    pub coeffs: Vec<(usize, f64)>,
    /// Relation to the bound.
    pub relation: Relation,
    /// Right-hand side, with the expression's constant already moved over.
    pub bound: f64,
}

/// A fully specified conic problem in flat form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConicProblem {
    /// Length of the flat variable vector.
    pub num_vars: usize,
    /// Cone declarations, in variable declaration order.
    pub cones: Vec<ConeDeclaration>,
    /// Objective.
    pub objective: LinearObjective,
    /// Constraints, in registration order.
    pub constraints: Vec<LinearConstraint>,
}

impl ConicProblem {
    /// Objective value `c'x + c0` at `x`.
    pub fn objective_value(&self, x: &[f64]) -> f64 {
        dot_sparse(&self.objective.coeffs, x) + self.objective.constant
    }

    /// Left-hand side `a'x` of constraint `i` at `x`.
    pub fn constraint_lhs(&self, i: usize, x: &[f64]) -> Option<f64> {
        self.constraints.get(i).map(|c| dot_sparse(&c.coeffs, x))
    }
}

fn dot_sparse(coeffs: &[(usize, f64)], x: &[f64]) -> f64 {
    coeffs.iter().map(|&(col, val)| val * x[col]).sum()
}

/// Terminal outcome of a solve.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    /// Optimal solution found.
    Optimal,
    /// Problem is infeasible.
    Infeasible,
    /// Problem is unbounded.
    Unbounded,
    /// The backend failed; carries its diagnostic message.
    SolverError(String),
}

impl SolveStatus {
    /// Check if a primal solution is available.
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::Unbounded => write!(f, "unbounded"),
            SolveStatus::SolverError(msg) => write!(f, "solver error: {}", msg),
        }
    }
}

/// What a backend returns.
#[derive(Debug, Clone)]
pub struct SolverOutput {
    /// Solve status.
    pub status: SolveStatus,
    /// Flat primal vector, present iff `status` is `Optimal`.
    pub primal: Option<Vec<f64>>,
    /// Solve time in seconds.
    pub solve_time: f64,
    /// Number of iterations.
    pub iterations: u32,
}

impl SolverOutput {
    /// A failed solve that never produced iterates.
    pub fn failed(message: impl Into<String>) -> Self {
        SolverOutput {
            status: SolveStatus::SolverError(message.into()),
            primal: None,
            solve_time: 0.0,
            iterations: 0,
        }
    }
}

/// A solving backend.
///
/// `solve` is a blocking call. Implementations may parallelize internally but
/// must not keep state between calls that affects the result.
pub trait Solver {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Solve a conic problem.
    fn solve(&self, problem: &ConicProblem) -> SolverOutput;
}

impl<S: Solver + ?Sized> Solver for &S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(&self, problem: &ConicProblem) -> SolverOutput {
        (**self).solve(problem)
    }
}

/// Solution of a problem, read-only after creation.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution status.
    pub status: SolveStatus,
    /// Objective value (if optimal).
    pub value: Option<f64>,
    /// Flat primal vector (if optimal).
    pub primal: Option<Vec<f64>>,
    /// Solve time in seconds.
    pub solve_time: f64,
    /// Number of iterations.
    pub iterations: u32,
}

impl Solution {
    /// Flat primal vector, if available.
    pub fn primal(&self) -> Option<&[f64]> {
        self.primal.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> ConicProblem {
        ConicProblem {
            num_vars: 4,
            cones: vec![ConeDeclaration {
                kind: ConeKind::Psd,
                dim: 1,
                count: 4,
                offset: 0,
            }],
            objective: LinearObjective {
                sense: Sense::Minimize,
                coeffs: vec![(0, 1.0), (3, 2.0)],
                constant: 0.5,
            },
            constraints: vec![LinearConstraint {
                coeffs: vec![(1, 1.0), (2, -1.0)],
                relation: Relation::GreaterThan,
                bound: 0.0,
            }],
        }
    }

    #[test]
    fn test_objective_value() {
        let p = tiny();
        assert_eq!(p.objective_value(&[1.0, 0.0, 0.0, 2.0]), 5.5);
        assert_eq!(p.constraint_lhs(0, &[0.0, 3.0, 1.0, 0.0]), Some(2.0));
        assert_eq!(p.constraint_lhs(1, &[0.0; 4]), None);
    }

    #[test]
    fn test_cone_declaration() {
        let c = ConeDeclaration {
            kind: ConeKind::Psd,
            dim: 3,
            count: 2,
            offset: 5,
        };
        assert_eq!(c.size(), 18);
        assert_eq!(c.block_offset(1), 14);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SolveStatus::Optimal.to_string(), "optimal");
        assert!(SolveStatus::SolverError("boom".into()).to_string().contains("boom"));
        assert!(!SolveStatus::Infeasible.is_optimal());
    }

    #[test]
    fn test_failed_output() {
        let out = SolverOutput::failed("no backend");
        assert!(out.primal.is_none());
        assert_eq!(out.status, SolveStatus::SolverError("no backend".into()));
    }
}
