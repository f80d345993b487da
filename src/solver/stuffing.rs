//! Matrix stuffing: converts a conic problem to Clarabel's standard form.
//!
//! Clarabel solves
//!
//! ```text
//! minimize    (1/2) x' P x + q' x
//! subject to  A x + s = b,  s in K
//! ```
//!
//! Rows are emitted cone by cone, in the order zero, nonnegative,
//! second-order, PSD. Each `d x d` block is stored in full (row-major), so
//! symmetry `X[i,j] = X[j,i]` is enforced by zero-cone rows and the cone rows
//! read the upper triangle:
//!
//! - `d = 1`: `X >= 0` (nonnegative cone)
//! - `d = 2`: `(a + c, a - c, 2b)` in the 3-dim second-order cone, which is
//!   exactly `a >= 0, c >= 0, ac >= b^2`
//! - `d >= 3`: the scaled upper triangle in Clarabel's PSD triangle cone
//!   (requires the `sdp` feature)

use nalgebra_sparse::CscMatrix;

use super::contract::{ConeDeclaration, ConicProblem};
use crate::constraints::Relation;
use crate::error::{CvxError, Result};
use crate::problem::Sense;
use crate::sparse::csc_from_triplets;

/// Cone dimensions for Clarabel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConeDims {
    /// Number of zero cone (equality) rows.
    pub zero: usize,
    /// Number of nonnegative cone rows.
    pub nonneg: usize,
    /// Second-order cone dimensions (each entry is the cone dimension).
    pub soc: Vec<usize>,
    /// PSD triangle cones (each entry is the matrix dimension).
    pub psd: Vec<usize>,
}

impl ConeDims {
    /// Total number of constraint rows.
    pub fn total(&self) -> usize {
        self.zero
            + self.nonneg
            + self.soc.iter().sum::<usize>()
            + self.psd.iter().map(|n| n * (n + 1) / 2).sum::<usize>()
    }
}

/// Stuffed problem ready for Clarabel.
#[derive(Debug)]
pub struct StuffedProblem {
    /// Quadratic cost matrix P (n x n). Always zero here.
    pub p: CscMatrix<f64>,
    /// Linear cost vector q (n), negated for maximization.
    pub q: Vec<f64>,
    /// Constraint matrix A (m x n).
    pub a: CscMatrix<f64>,
    /// Constraint vector b (m).
    pub b: Vec<f64>,
    /// Cone dimensions.
    pub cone_dims: ConeDims,
}

/// Whether PSD blocks larger than 2x2 can be handed to Clarabel.
pub fn native_psd_available() -> bool {
    cfg!(feature = "sdp")
}

/// Row accumulator for `A` and `b`.
#[derive(Default)]
struct Rows {
    rows: Vec<usize>,
    cols: Vec<usize>,
    vals: Vec<f64>,
    b: Vec<f64>,
}

impl Rows {
    fn push(&mut self, entries: impl IntoIterator<Item = (usize, f64)>, rhs: f64) {
        let row = self.b.len();
        for (col, val) in entries {
            self.rows.push(row);
            self.cols.push(col);
            self.vals.push(val);
        }
        self.b.push(rhs);
    }

    fn len(&self) -> usize {
        self.b.len()
    }
}

/// Build the stuffed problem.
///
/// Fails with `InvalidProblem` when a block needs the native PSD cone and the
/// `sdp` feature is disabled, or when a coefficient column is out of range.
pub fn stuff_problem(problem: &ConicProblem) -> Result<StuffedProblem> {
    let n = problem.num_vars;
    check_columns(problem)?;

    if !native_psd_available() {
        if let Some(cone) = problem.cones.iter().find(|c| c.dim > 2) {
            return Err(CvxError::InvalidProblem(format!(
                "PSD blocks of dimension {} need the `sdp` feature",
                cone.dim
            )));
        }
    }

    let q = stuff_objective(problem);

    let mut rows = Rows::default();
    let mut cone_dims = ConeDims::default();

    // Zero cone: equalities, then block symmetry
    // a'x + s = b with s = 0
    for c in problem.constraints.iter().filter(|c| c.relation == Relation::EqualTo) {
        rows.push(c.coeffs.iter().copied(), c.bound);
    }
    for cone in &problem.cones {
        push_symmetry_rows(cone, &mut rows);
    }
    cone_dims.zero = rows.len();

    // Nonnegative cone
    // a'x >= b  <=>  -a'x + s = -b
    // a'x <= b  <=>   a'x + s =  b
    for c in &problem.constraints {
        match c.relation {
            Relation::GreaterThan => {
                rows.push(c.coeffs.iter().map(|&(col, v)| (col, -v)), -c.bound)
            }
            Relation::LessThan => rows.push(c.coeffs.iter().copied(), c.bound),
            Relation::EqualTo => {}
        }
    }
    for cone in problem.cones.iter().filter(|c| c.dim == 1) {
        for j in 0..cone.count {
            rows.push([(cone.block_offset(j), -1.0)], 0.0);
        }
    }
    cone_dims.nonneg = rows.len() - cone_dims.zero;

    // Second-order cone: 2x2 blocks as s = (a + c, a - c, 2b)
    for cone in problem.cones.iter().filter(|c| c.dim == 2) {
        for j in 0..cone.count {
            let o = cone.block_offset(j);
            let (a, b, c) = (o, o + 1, o + 3);
            rows.push([(a, -1.0), (c, -1.0)], 0.0);
            rows.push([(a, -1.0), (c, 1.0)], 0.0);
            rows.push([(b, -2.0)], 0.0);
            cone_dims.soc.push(3);
        }
    }

    // PSD triangle cone: upper triangle stacked by column, off-diagonals
    // scaled by sqrt(2)
    for cone in problem.cones.iter().filter(|c| c.dim > 2) {
        let d = cone.dim;
        for j in 0..cone.count {
            let o = cone.block_offset(j);
            for col in 0..d {
                for row in 0..=col {
                    let scale = if row == col { 1.0 } else { std::f64::consts::SQRT_2 };
                    rows.push([(o + row * d + col, -scale)], 0.0);
                }
            }
            cone_dims.psd.push(d);
        }
    }

    debug_assert_eq!(rows.len(), cone_dims.total());

    let a = csc_from_triplets(rows.len(), n, rows.rows, rows.cols, rows.vals);

    Ok(StuffedProblem {
        p: CscMatrix::zeros(n, n),
        q,
        a,
        b: rows.b,
        cone_dims,
    })
}

/// Dense cost vector; Clarabel always minimizes, so maximization negates.
fn stuff_objective(problem: &ConicProblem) -> Vec<f64> {
    let sign = match problem.objective.sense {
        Sense::Minimize => 1.0,
        Sense::Maximize => -1.0,
    };
    let mut q = vec![0.0; problem.num_vars];
    for &(col, val) in &problem.objective.coeffs {
        q[col] += sign * val;
    }
    q
}

/// `X[i,j] - X[j,i] = 0` for every `i < j` of every block.
fn push_symmetry_rows(cone: &ConeDeclaration, rows: &mut Rows) {
    let d = cone.dim;
    for j in 0..cone.count {
        let o = cone.block_offset(j);
        for i in 0..d {
            for k in (i + 1)..d {
                rows.push([(o + i * d + k, 1.0), (o + k * d + i, -1.0)], 0.0);
            }
        }
    }
}

fn check_columns(problem: &ConicProblem) -> Result<()> {
    let n = problem.num_vars;
    let declared: usize = problem.cones.iter().map(|c| c.size()).sum();
    if declared != n {
        return Err(CvxError::InvalidProblem(format!(
            "cone declarations cover {} columns but the problem has {}",
            declared, n
        )));
    }
    let rows = std::iter::once(&problem.objective.coeffs)
        .chain(problem.constraints.iter().map(|c| &c.coeffs));
    for coeffs in rows {
        if let Some(&(col, _)) = coeffs.iter().find(|(col, _)| *col >= n) {
            return Err(CvxError::out_of_range(format!("column {}", col), n));
        }
    }
    Ok(())
}
