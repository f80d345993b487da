//! Shared test doubles.

use sdpmodel::solver::{ConicProblem, SolveStatus, Solver, SolverOutput};

/// A backend that returns a preset outcome and ignores the problem.
pub struct MockSolver {
    pub status: SolveStatus,
    pub primal: Option<Vec<f64>>,
}

impl MockSolver {
    pub fn optimal(primal: Vec<f64>) -> Self {
        MockSolver {
            status: SolveStatus::Optimal,
            primal: Some(primal),
        }
    }

    pub fn failing(status: SolveStatus) -> Self {
        MockSolver {
            status,
            primal: None,
        }
    }
}

impl Solver for MockSolver {
    fn name(&self) -> &str {
        "mock"
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
