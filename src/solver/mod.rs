//! Solver interface for sdpmodel.
//!
//! This module provides:
//! - The `Solver` trait and the flat conic problem it consumes
//! - Matrix stuffing into Clarabel's standard form
//! - The Clarabel backend

pub mod clarabel;
pub mod contract;
pub mod stuffing;

pub use self::clarabel::{ClarabelSolver, Settings};
pub use contract::{
    ConeDeclaration, ConeKind, ConicProblem, LinearConstraint, LinearObjective, Solution,
    SolveStatus, Solver, SolverOutput,
};
pub use stuffing::{native_psd_available, stuff_problem, ConeDims, StuffedProblem};
