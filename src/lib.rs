//! # sdpmodel
//!
//! A modeling layer for semidefinite programs over stacked PSD block
//! variables.
//!
//! sdpmodel lets you declare `n` stacked `d x d` matrix variables in the PSD
//! cone, take slices of them, build linear expressions from Frobenius inner
//! products with constant matrices, and solve the resulting problem with an
//! injected backend ([`ClarabelSolver`] by default).
//!
//! ## Quick Start
//!
//! ```
//! use sdpmodel::prelude::*;
//!
//! // min tr(X0) + tr(X1)  s.t.  <I, X0> + <diag(0, 1), X1> >= 1,  X0, X1 PSD
//! let mut problem = Problem::new("sdo");
//! let x = problem.cone_block_variable(2, 2)?;
//!
//! problem.minimize(sum_over_indices(&x, &x.pick_diagonal())?)?;
//! problem.add_constraint(
//!     dot(eye(2), &x.block(0)?)? + dot(diag_matrix(&[0.0, 1.0]), &x.block(1)?)?,
//!     greater_than(1.0),
//! )?;
//!
//! let status = problem.solve(&ClarabelSolver::default())?;
//! assert_eq!(status, SolveStatus::Optimal);
//! assert!((problem.objective_value()? - 1.0).abs() < 1e-5);
//!
//! let x0 = problem.level_matrix(&x.block(0)?)?;
//! assert_eq!(x0.shape(), (2, 2));
//! # Ok::<(), CvxError>(())
//! ```
//!
//! ## Layout
//!
//! Block `j` of a variable with `n` blocks of size `d x d` lives at flat
//! offsets `j*d*d .. (j+1)*d*d` (row-major within the block), and variables
//! are concatenated in declaration order in the solver's flat vector.
//!
//! ## Architecture
//!
//! - **Index algebra** over row-major arenas (`Shape`, `SliceSpec`)
//! - **Expression DAG** of `Dot` leaves and `Sum` nodes shared with `Arc`
//! - **Canonicalization** folds expressions into sparse linear rows
//! - **Solver contract** (`ConicProblem`, `Solver`) with a Clarabel backend

pub mod atoms;
pub mod canon;
pub mod constraints;
pub mod dump;
pub mod error;
pub mod expr;
pub mod problem;
pub mod report;
pub mod solver;
pub mod sparse;

/// Prelude module for convenient imports.
///
/// ```
/// use sdpmodel::prelude::*;
/// ```
pub mod prelude {
    // Expression types
    pub use crate::expr::{
        diag_matrix, eye, is_psd, is_symmetric, matrix_from_rows, symmetric_matrix,
        ConeBlockVariable, Expr, Shape, Slice, SliceSpec,
    };

    // Atoms
    pub use crate::atoms::{add, constant, dot, sum, sum_over_indices};

    // Constraints
    pub use crate::constraints::{
        equal_to, greater_than, in_psd_cone, less_than, Constraint, Domain, Relation,
    };

    // Problem
    pub use crate::problem::{Objective, Problem, ProblemState, Sense};

    // Solver
    pub use crate::solver::{ClarabelSolver, Settings, Solution, SolveStatus, Solver};

    // Reporting
    pub use crate::report::{contributing_blocks, BlockReport, ReportOptions};

    // Errors
    pub use crate::error::{CvxError, Result};
}

// Re-export main types at crate root
pub use error::{CvxError, Result};
pub use problem::Problem;
pub use solver::{ClarabelSolver, Solution, SolveStatus, Solver};
