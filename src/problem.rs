//! Problem definition, solving and solution extraction.
//!
//! A [`Problem`] owns its block variables, an optional objective and an
//! ordered list of constraints. It is a builder until it is solved:
//!
//! ```text
//! Building --solve, optimal--> Solved
//! Building --solve, otherwise--> Failed
//! ```
//!
//! Both terminal states reject further modification with
//! `ProblemFinalized`; extraction through [`Problem::level`] only works in
//! `Solved`.
//!
//! ```ignore
//! let mut problem = Problem::new("sdo");
//! let x = problem.cone_block_variable(n, d)?;
//! problem.minimize(sum_over_indices(&x, &x.pick_diagonal())?)?;
//! problem.add_constraint(dot(a, &x.block(0)?)?, greater_than(1.0))?;
//! let status = problem.solve(&ClarabelSolver::default())?;
//! let x0 = problem.level_matrix(&x.block(0)?)?;
//! ```

use std::sync::Arc;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::canon::linearize;
use crate::constraints::{Constraint, Domain};
use crate::error::{CvxError, Result};
use crate::expr::{ConeBlockVariable, Expr, ProblemId, Slice};
use crate::solver::{
    ConeDeclaration, ConeKind, ConicProblem, LinearConstraint, LinearObjective, Solution,
    SolveStatus, Solver,
};

/// Optimization sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sense {
    /// Minimize the objective.
    Minimize,
    /// Maximize the objective.
    Maximize,
}

/// Objective of a problem.
#[derive(Debug, Clone)]
pub struct Objective {
    /// Optimization sense.
    pub sense: Sense,
    /// The expression being optimized.
    pub expr: Arc<Expr>,
}

/// Lifecycle state of a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemState {
    /// Accepting variables, objective and constraints.
    Building,
    /// Solved to optimality; extraction is available.
    Solved,
    /// Solve ended without an optimal solution.
    Failed,
}

/// An optimization problem over stacked PSD block variables.
#[derive(Debug)]
pub struct Problem {
    id: ProblemId,
    name: Option<String>,
    variables: Vec<ConeBlockVariable>,
    num_columns: usize,
    objective: Option<Objective>,
    constraints: Vec<Constraint>,
    solution: Option<Solution>,
}

impl Problem {
    /// Create an empty problem.
    pub fn new(name: impl Into<String>) -> Self {
        Problem {
            name: Some(name.into()),
            ..Self::unnamed()
        }
    }

    /// Create an empty problem without a name.
    pub fn unnamed() -> Self {
        Problem {
            id: ProblemId::new(),
            name: None,
            variables: Vec::new(),
            num_columns: 0,
            objective: None,
            constraints: Vec::new(),
            solution: None,
        }
    }

    /// Unique identifier of this problem.
    pub fn id(&self) -> ProblemId {
        self.id
    }

    /// Problem name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProblemState {
        match &self.solution {
            None => ProblemState::Building,
            Some(s) if s.status.is_optimal() => ProblemState::Solved,
            Some(_) => ProblemState::Failed,
        }
    }

    /// Check if the problem has been solved (successfully or not).
    pub fn is_finalized(&self) -> bool {
        self.solution.is_some()
    }

    fn ensure_building(&self) -> Result<()> {
        if self.is_finalized() {
            Err(CvxError::ProblemFinalized)
        } else {
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    /// Declare `n` stacked `d x d` matrices jointly in the PSD cone.
    pub fn cone_block_variable(&mut self, n: usize, d: usize) -> Result<ConeBlockVariable> {
        self.declare(None, n, d)
    }

    /// Declare a named block variable.
    pub fn named_cone_block_variable(
        &mut self,
        name: impl Into<String>,
        n: usize,
        d: usize,
    ) -> Result<ConeBlockVariable> {
        self.declare(Some(name.into()), n, d)
    }

    /// Declare a variable in a cone domain.
    ///
    /// Only `Domain::InPsdCone` can be used for variables.
    pub fn variable(&mut self, name: Option<&str>, domain: Domain) -> Result<ConeBlockVariable> {
        match domain {
            Domain::InPsdCone { dim, count } => self.declare(name.map(String::from), count, dim),
            other => Err(CvxError::InvalidProblem(format!(
                "variables must be declared in a cone domain, got {}",
                other
            ))),
        }
    }

    fn declare(&mut self, name: Option<String>, n: usize, d: usize) -> Result<ConeBlockVariable> {
        self.ensure_building()?;
        if n == 0 || d == 0 {
            return Err(CvxError::InvalidProblem(format!(
                "block variable needs positive block count and dimension, got n={}, d={}",
                n, d
            )));
        }

        let end = n
            .checked_mul(d)
            .and_then(|nd| nd.checked_mul(d))
            .and_then(|size| self.num_columns.checked_add(size))
            .ok_or_else(|| {
                CvxError::InvalidProblem(format!(
                    "block variable with n={}, d={} overflows the column space",
                    n, d
                ))
            })?;

        let var = ConeBlockVariable::new(
            self.id,
            self.variables.len(),
            self.num_columns,
            name,
            n,
            d,
        );
        self.num_columns = end;
        debug!(
            variable = %var.label(),
            blocks = n,
            dim = d,
            offset = var.offset(),
            "declared PSD block variable"
        );
        self.variables.push(var.clone());
        Ok(var)
    }

    /// Declared variables, in declaration order.
    pub fn variables(&self) -> &[ConeBlockVariable] {
        &self.variables
    }

    /// Length of the flat solution vector.
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    fn check_owned(&self, var: &ConeBlockVariable) -> Result<()> {
        let owned = var.owner() == self.id
            && self
                .variables
                .get(var.index())
                .is_some_and(|v| v.same_as(var));
        if owned {
            Ok(())
        } else {
            Err(CvxError::ForeignVariable {
                variable: var.label(),
            })
        }
    }

    fn check_expr_owned(&self, expr: &Expr) -> Result<()> {
        expr.variables().iter().try_for_each(|v| self.check_owned(v))
    }

    // ------------------------------------------------------------------
    // Objective and constraints
    // ------------------------------------------------------------------

    /// Set the objective, replacing any previous one.
    pub fn set_objective(&mut self, sense: Sense, expr: Expr) -> Result<()> {
        self.ensure_building()?;
        self.check_expr_owned(&expr)?;
        self.objective = Some(Objective {
            sense,
            expr: Arc::new(expr),
        });
        Ok(())
    }

    /// Set a minimization objective.
    pub fn minimize(&mut self, expr: Expr) -> Result<()> {
        self.set_objective(Sense::Minimize, expr)
    }

    /// Set a maximization objective.
    pub fn maximize(&mut self, expr: Expr) -> Result<()> {
        self.set_objective(Sense::Maximize, expr)
    }

    /// The objective, if set.
    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// Add the constraint `expr in domain` and return its index.
    ///
    /// Indices count up from 0 in registration order. Only scalar domains
    /// apply to expressions; PSD domains are given at variable declaration.
    pub fn add_constraint(&mut self, expr: Expr, domain: Domain) -> Result<usize> {
        self.ensure_building()?;
        self.check_expr_owned(&expr)?;
        let (relation, bound) = domain.relation().ok_or_else(|| {
            CvxError::InvalidProblem(format!(
                "{} applies to variables, not scalar constraints",
                domain
            ))
        })?;

        let index = self.constraints.len();
        self.constraints
            .push(Constraint::new(index, Arc::new(expr), relation, bound));
        debug!(index, %relation, bound, "added constraint");
        Ok(index)
    }

    /// Registered constraints, in order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Constraint by index.
    pub fn constraint(&self, index: usize) -> Option<&Constraint> {
        self.constraints.get(index)
    }

    // ------------------------------------------------------------------
    // Solving
    // ------------------------------------------------------------------

    /// Flatten the problem into the solver contract.
    pub fn conic_form(&self) -> ConicProblem {
        let cones = self
            .variables
            .iter()
            .map(|v| ConeDeclaration {
                kind: ConeKind::Psd,
                dim: v.dim(),
                count: v.blocks(),
                offset: v.offset(),
            })
            .collect();

        let objective = match &self.objective {
            Some(obj) => {
                let lin = linearize(&obj.expr);
                LinearObjective {
                    sense: obj.sense,
                    coeffs: lin.columns(),
                    constant: lin.constant,
                }
            }
            None => LinearObjective::feasibility(),
        };

        let constraints = self
            .constraints
            .iter()
            .map(|c| {
                let lin = linearize(c.expr());
                LinearConstraint {
                    coeffs: lin.columns(),
                    relation: c.relation(),
                    bound: c.bound() - lin.constant,
                }
            })
            .collect();

        ConicProblem {
            num_vars: self.num_columns,
            cones,
            objective,
            constraints,
        }
    }

    /// Solve with the given backend.
    ///
    /// Returns the terminal status; infeasible, unbounded and failed solves
    /// are `Ok`. Errors with `ProblemFinalized` if already solved.
    pub fn solve(&mut self, solver: &dyn Solver) -> Result<SolveStatus> {
        self.ensure_building()?;
        if self.objective.is_none() {
            warn!(problem = ?self.name, "no objective set, solving as a feasibility problem");
        }

        let conic = self.conic_form();
        info!(
            problem = ?self.name,
            solver = solver.name(),
            columns = conic.num_vars,
            constraints = conic.constraints.len(),
            "solving"
        );

        let output = solver.solve(&conic);

        let (status, primal) = match (output.status, output.primal) {
            (SolveStatus::Optimal, Some(x)) if x.len() == conic.num_vars => {
                (SolveStatus::Optimal, Some(x))
            }
            (SolveStatus::Optimal, Some(x)) => (
                SolveStatus::SolverError(format!(
                    "solution has {} entries, expected {}",
                    x.len(),
                    conic.num_vars
                )),
                None,
            ),
            (SolveStatus::Optimal, None) => (
                SolveStatus::SolverError("optimal status without a solution vector".into()),
                None,
            ),
            (status, _) => (status, None),
        };

        let value = primal.as_deref().map(|x| conic.objective_value(x));
        info!(
            %status,
            objective = ?value,
            iterations = output.iterations,
            solve_time = output.solve_time,
            "solve finished"
        );

        self.solution = Some(Solution {
            status: status.clone(),
            value,
            primal,
            solve_time: output.solve_time,
            iterations: output.iterations,
        });
        Ok(status)
    }

    /// Terminal status, or `None` while building.
    pub fn status(&self) -> Option<&SolveStatus> {
        self.solution.as_ref().map(|s| &s.status)
    }

    /// The solution record, present once solved (successfully or not).
    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    fn primal(&self) -> Result<&[f64]> {
        self.solution
            .as_ref()
            .and_then(|s| s.primal())
            .ok_or(CvxError::NotSolved)
    }

    // ------------------------------------------------------------------
    // Extraction
    // ------------------------------------------------------------------

    /// Values of a slice, flat in the slice's row-major order.
    ///
    /// For block `j` of an `n x d x d` variable, entry `(s1, s2)` is read from
    /// `offset + j*d*d + s1*d + s2` of the flat solution vector.
    pub fn level(&self, slice: &Slice) -> Result<Vec<f64>> {
        self.check_owned(slice.variable())?;
        let x = self.primal()?;
        let base = slice.variable().offset();
        Ok(slice.flat_indices().map(|i| x[base + i]).collect())
    }

    /// Values of a slice with at most two dimensions, as a matrix.
    pub fn level_matrix(&self, slice: &Slice) -> Result<DMatrix<f64>> {
        let shape = slice.shape();
        if shape.ndim() > 2 {
            return Err(CvxError::shape_mismatch(
                "at most 2 dimensions",
                shape,
            ));
        }
        let values = self.level(slice)?;
        Ok(DMatrix::from_row_slice(shape.rows(), shape.cols(), &values))
    }

    /// Objective value at the solution.
    pub fn objective_value(&self) -> Result<f64> {
        self.solution
            .as_ref()
            .and_then(|s| s.value)
            .ok_or(CvxError::NotSolved)
    }

    /// Value of an expression at the solution.
    pub fn evaluate(&self, expr: &Expr) -> Result<f64> {
        self.check_expr_owned(expr)?;
        let x = self.primal()?;
        Ok(linearize(expr).evaluate(x))
    }
}

impl Default for Problem {
    fn default() -> Self {
        Self::unnamed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{dot, sum, sum_over_indices};
    use crate::constraints::{greater_than, in_psd_cone, less_than};
    use crate::expr::{diag_matrix, eye};
    use crate::solver::SolverOutput;

    /// Returns a fixed outcome regardless of the problem.
    struct FixedSolver {
        status: SolveStatus,
        primal: Option<Vec<f64>>,
    }

    impl FixedSolver {
        fn optimal(primal: Vec<f64>) -> Self {
            FixedSolver {
                status: SolveStatus::Optimal,
                primal: Some(primal),
            }
        }
    }

    impl Solver for FixedSolver {
        fn name(&self) -> &str {
            "fixed"
        }

        fn solve(&self, _problem: &ConicProblem) -> SolverOutput {
            SolverOutput {
                status: self.status.clone(),
                primal: self.primal.clone(),
                solve_time: 0.0,
                iterations: 0,
            }
        }
    }

    fn two_block_problem() -> (Problem, ConeBlockVariable) {
        let mut problem = Problem::new("test");
        let x = problem.cone_block_variable(2, 2).unwrap();
        let trace = sum_over_indices(&x, &x.pick_diagonal()).unwrap();
        problem.minimize(trace).unwrap();
        let lhs = sum([
            dot(eye(2), &x.block(0).unwrap()).unwrap(),
            dot(diag_matrix(&[0.0, 1.0]), &x.block(1).unwrap()).unwrap(),
        ]);
        problem.add_constraint(lhs, greater_than(1.0)).unwrap();
        (problem, x)
    }

    #[test]
    fn test_variable_offsets_follow_declaration_order() {
        let mut problem = Problem::new("offsets");
        let x = problem.cone_block_variable(2, 2).unwrap();
        let y = problem.named_cone_block_variable("Y", 3, 1).unwrap();
        let z = problem.variable(Some("Z"), in_psd_cone(3, 1)).unwrap();
        assert_eq!(x.offset(), 0);
        assert_eq!(y.offset(), 8);
        assert_eq!(z.offset(), 11);
        assert_eq!(problem.num_columns(), 20);
        assert_eq!(y.name(), Some("Y"));
        assert_eq!(problem.variables().len(), 3);
    }

    #[test]
    fn test_invalid_declarations() {
        let mut problem = Problem::unnamed();
        assert!(problem.cone_block_variable(0, 2).is_err());
        assert!(problem.cone_block_variable(2, 0).is_err());
        assert!(problem.variable(None, greater_than(0.0)).is_err());
        assert!(matches!(
            problem.cone_block_variable(usize::MAX, 2),
            Err(CvxError::InvalidProblem(_))
        ));
        assert!(matches!(
            problem.cone_block_variable(2, usize::MAX),
            Err(CvxError::InvalidProblem(_))
        ));
        assert_eq!(problem.num_columns(), 0);
        assert!(problem.variables().is_empty());
    }

    #[test]
    fn test_constraint_indices() {
        let mut problem = Problem::unnamed();
        let x = problem.cone_block_variable(1, 1).unwrap();
        let e = dot(eye(1), &x.block(0).unwrap()).unwrap();
        assert_eq!(problem.add_constraint(e.clone(), greater_than(0.0)).unwrap(), 0);
        assert_eq!(problem.add_constraint(e.clone(), less_than(5.0)).unwrap(), 1);
        assert_eq!(problem.constraint(1).unwrap().bound(), 5.0);
        assert!(matches!(
            problem.add_constraint(e, in_psd_cone(1, 1)),
            Err(CvxError::InvalidProblem(_))
        ));
        assert_eq!(problem.constraints().len(), 2);
    }

    #[test]
    fn test_foreign_variable() {
        let mut p1 = Problem::new("one");
        let mut p2 = Problem::new("two");
        let x = p1.cone_block_variable(1, 2).unwrap();
        let _y = p2.cone_block_variable(1, 2).unwrap();
        let e = dot(eye(2), &x.block(0).unwrap()).unwrap();
        assert!(matches!(
            p2.add_constraint(e.clone(), greater_than(1.0)),
            Err(CvxError::ForeignVariable { .. })
        ));
        assert!(matches!(
            p2.minimize(e),
            Err(CvxError::ForeignVariable { .. })
        ));
        assert!(p2.constraints().is_empty());
    }

    #[test]
    fn test_conic_form() {
        let (problem, _x) = two_block_problem();
        let conic = problem.conic_form();
        assert_eq!(conic.num_vars, 8);
        assert_eq!(conic.cones.len(), 1);
        assert_eq!(
            conic.objective.coeffs,
            vec![(0, 1.0), (3, 1.0), (4, 1.0), (7, 1.0)]
        );
        assert_eq!(conic.constraints[0].coeffs, vec![(0, 1.0), (3, 1.0), (7, 1.0)]);
        assert_eq!(conic.constraints[0].bound, 1.0);
    }

    #[test]
    fn test_constant_moves_to_bound() {
        let mut problem = Problem::unnamed();
        let x = problem.cone_block_variable(1, 1).unwrap();
        let e = dot(eye(1), &x.block(0).unwrap()).unwrap() + 2.0;
        problem.add_constraint(e, greater_than(5.0)).unwrap();
        assert_eq!(problem.conic_form().constraints[0].bound, 3.0);
    }

    #[test]
    fn test_level_before_solve() {
        let (problem, x) = two_block_problem();
        assert_eq!(problem.state(), ProblemState::Building);
        assert!(matches!(
            problem.level(&x.block(0).unwrap()),
            Err(CvxError::NotSolved)
        ));
        assert!(matches!(problem.objective_value(), Err(CvxError::NotSolved)));
    }

    #[test]
    fn test_level_layout() {
        let (mut problem, x) = two_block_problem();
        let values: Vec<f64> = (0..8u32).map(f64::from).collect();
        let status = problem.solve(&FixedSolver::optimal(values)).unwrap();
        assert_eq!(status, SolveStatus::Optimal);
        assert_eq!(problem.state(), ProblemState::Solved);

        assert_eq!(problem.level(&x.block(1).unwrap()).unwrap(), vec![4.0, 5.0, 6.0, 7.0]);
        let x1 = problem.level_matrix(&x.block(1).unwrap()).unwrap();
        assert_eq!(x1[(0, 1)], 5.0);
        assert_eq!(x1[(1, 0)], 6.0);
        assert_eq!(problem.level(&x.element(0, 1, 1).unwrap()).unwrap(), vec![3.0]);
        assert!(problem.level_matrix(&x.all()).is_err());

        // trace = 0 + 3 + 4 + 7
        assert_eq!(problem.objective_value().unwrap(), 14.0);
        let lhs = problem.constraint(0).unwrap().expr().clone();
        assert_eq!(problem.evaluate(&lhs).unwrap(), 0.0 + 3.0 + 7.0);
    }

    #[test]
    fn test_finalized_after_solve() {
        let (mut problem, x) = two_block_problem();
        problem
            .solve(&FixedSolver::optimal(vec![0.0; 8]))
            .unwrap();
        let e = dot(eye(2), &x.block(0).unwrap()).unwrap();
        assert!(matches!(
            problem.add_constraint(e.clone(), greater_than(0.0)),
            Err(CvxError::ProblemFinalized)
        ));
        assert!(matches!(problem.maximize(e), Err(CvxError::ProblemFinalized)));
        assert!(matches!(
            problem.cone_block_variable(1, 1),
            Err(CvxError::ProblemFinalized)
        ));
        assert!(matches!(
            problem.solve(&FixedSolver::optimal(vec![0.0; 8])),
            Err(CvxError::ProblemFinalized)
        ));
    }

    #[test]
    fn test_failed_solve() {
        let (mut problem, x) = two_block_problem();
        let solver = FixedSolver {
            status: SolveStatus::Infeasible,
            primal: None,
        };
        assert_eq!(problem.solve(&solver).unwrap(), SolveStatus::Infeasible);
        assert_eq!(problem.state(), ProblemState::Failed);
        assert!(matches!(
            problem.level(&x.block(0).unwrap()),
            Err(CvxError::NotSolved)
        ));
        assert!(matches!(
            problem.add_constraint(Expr::Constant(0.0), greater_than(0.0)),
            Err(CvxError::ProblemFinalized)
        ));
    }

    #[test]
    fn test_wrong_length_solution_is_solver_error() {
        let (mut problem, _x) = two_block_problem();
        let status = problem.solve(&FixedSolver::optimal(vec![0.0; 3])).unwrap();
        assert!(matches!(status, SolveStatus::SolverError(_)));
        assert_eq!(problem.state(), ProblemState::Failed);
    }

    #[test]
    fn test_level_foreign_slice() {
        let (mut problem, _x) = two_block_problem();
        problem.solve(&FixedSolver::optimal(vec![0.0; 8])).unwrap();
        let mut other = Problem::unnamed();
        let y = other.cone_block_variable(2, 2).unwrap();
        assert!(matches!(
            problem.level(&y.block(0).unwrap()),
            Err(CvxError::ForeignVariable { .. })
        ));
    }
}
