//! The Clarabel interior-point backend.
//!
//! [`ClarabelSolver`] stuffs a [`ConicProblem`] into Clarabel's `Ax + s = b`
//! form, runs the solver and maps its status back.

use clarabel::algebra::CscMatrix as ClarabelCsc;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::contract::{ConicProblem, SolveStatus, Solver, SolverOutput};
use super::stuffing::{stuff_problem, ConeDims};
use crate::error::Result;

/// Map a Clarabel status onto the terminal outcomes of this crate.
///
/// Reduced-accuracy results are accepted as their full-accuracy
/// counterparts.
fn map_status(status: SolverStatus) -> SolveStatus {
    match status {
        SolverStatus::Solved => SolveStatus::Optimal,
        SolverStatus::AlmostSolved => {
            warn!("Clarabel returned a reduced-accuracy solution");
            SolveStatus::Optimal
        }
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            SolveStatus::Infeasible
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            SolveStatus::Unbounded
        }
        SolverStatus::MaxIterations => {
            SolveStatus::SolverError("Maximum iterations reached".into())
        }
        SolverStatus::MaxTime => SolveStatus::SolverError("Time limit reached".into()),
        other => SolveStatus::SolverError(format!("Clarabel stopped with status {:?}", other)),
    }
}

/// Settings forwarded to Clarabel.
///
/// Deserializes from partial JSON; absent fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Let Clarabel print its iteration log.
    pub verbose: bool,
    /// Iteration cap; reaching it is reported as a solver error.
    pub max_iter: u32,
    /// Wall-clock limit in seconds.
    pub time_limit: f64,
    /// Absolute duality gap tolerance.
    pub tol_gap_abs: f64,
    /// Relative duality gap tolerance.
    pub tol_gap_rel: f64,
    /// Primal and dual feasibility tolerance.
    pub tol_feas: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            verbose: false,
            max_iter: 200,
            time_limit: f64::INFINITY,
            tol_gap_abs: 1e-8,
            tol_gap_rel: 1e-8,
            tol_feas: 1e-8,
        }
    }
}

impl Settings {
    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The Clarabel interior-point backend.
#[derive(Debug, Clone, Default)]
pub struct ClarabelSolver {
    settings: Settings,
}

impl ClarabelSolver {
    /// Create a backend with custom settings.
    pub fn new(settings: Settings) -> Self {
        ClarabelSolver { settings }
    }

    /// The settings in use.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl Solver for ClarabelSolver {
    fn name(&self) -> &str {
        "clarabel"
    }

    fn solve(&self, problem: &ConicProblem) -> SolverOutput {
        let stuffed = match stuff_problem(problem) {
            Ok(s) => s,
            Err(e) => return SolverOutput::failed(e.to_string()),
        };
        debug!(
            rows = stuffed.b.len(),
            cols = stuffed.q.len(),
            nnz = stuffed.a.nnz(),
            "stuffed problem for Clarabel"
        );

        let p = to_clarabel_csc(&stuffed.p);
        let a = to_clarabel_csc(&stuffed.a);
        let cones = to_clarabel_cones(&stuffed.cone_dims);

        let clarabel_settings = match DefaultSettingsBuilder::default()
            .verbose(self.settings.verbose)
            .max_iter(self.settings.max_iter)
            .time_limit(self.settings.time_limit)
            .tol_gap_abs(self.settings.tol_gap_abs)
            .tol_gap_rel(self.settings.tol_gap_rel)
            .tol_feas(self.settings.tol_feas)
            .build()
        {
            Ok(s) => s,
            Err(e) => return SolverOutput::failed(format!("invalid Clarabel settings: {}", e)),
        };

        let mut solver =
            DefaultSolver::new(&p, &stuffed.q, &a, &stuffed.b, &cones, clarabel_settings);
        solver.solve();

        let status = map_status(solver.solution.status);
        let primal = if status.is_optimal() {
            Some(solver.solution.x.clone())
        } else {
            None
        };

        SolverOutput {
            status,
            primal,
            solve_time: solver.solution.solve_time,
            iterations: solver.info.iterations,
        }
    }
}

/// Clarabel has its own CSC type; the arrays carry over unchanged.
fn to_clarabel_csc(m: &nalgebra_sparse::CscMatrix<f64>) -> ClarabelCsc<f64> {
    ClarabelCsc::new(
        m.nrows(),
        m.ncols(),
        m.col_offsets().to_vec(),
        m.row_indices().to_vec(),
        m.values().to_vec(),
    )
}

fn to_clarabel_cones(dims: &ConeDims) -> Vec<SupportedConeT<f64>> {
    let mut cones = Vec::new();

    if dims.zero > 0 {
        cones.push(SupportedConeT::ZeroConeT(dims.zero));
    }

    if dims.nonneg > 0 {
        cones.push(SupportedConeT::NonnegativeConeT(dims.nonneg));
    }

    for &soc_dim in &dims.soc {
        cones.push(SupportedConeT::SecondOrderConeT(soc_dim));
    }

    #[cfg(feature = "sdp")]
    for &n in &dims.psd {
        cones.push(SupportedConeT::PSDTriangleConeT(n));
    }

    cones
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_quiet() {
        let defaults = ClarabelSolver::default();
        assert!(!defaults.settings().verbose);
        assert_eq!(defaults.settings().max_iter, 200);
        assert!(defaults.settings().time_limit.is_infinite());
        assert_eq!(defaults.settings().tol_feas, 1e-8);
    }

    #[test]
    fn test_settings_from_json() {
        let settings = Settings::from_json_str(r#"{ "verbose": true, "max_iter": 50 }"#).unwrap();
        assert!(settings.verbose);
        assert_eq!(settings.max_iter, 50);
        assert_eq!(settings.tol_feas, Settings::default().tol_feas);
        assert!(Settings::from_json_str("not json").is_err());
    }

    #[test]
    fn test_to_clarabel_cones() {
        let dims = ConeDims {
            zero: 2,
            nonneg: 3,
            soc: vec![3, 3],
            psd: vec![],
        };
        let cones = to_clarabel_cones(&dims);
        assert_eq!(cones.len(), 4);
    }

    #[test]
    fn test_map_status() {
        assert_eq!(map_status(SolverStatus::Solved), SolveStatus::Optimal);
        assert_eq!(
            map_status(SolverStatus::PrimalInfeasible),
            SolveStatus::Infeasible
        );
        assert_eq!(
            map_status(SolverStatus::DualInfeasible),
            SolveStatus::Unbounded
        );
        assert!(matches!(
            map_status(SolverStatus::MaxIterations),
            SolveStatus::SolverError(_)
        ));
    }
}
