//! Error types for sdpmodel.
//!
//! These are local contract violations raised at the call that commits them.
//! Terminal solve outcomes (infeasible, unbounded, solver failure) are not
//! errors; they are reported through [`crate::solver::SolveStatus`].

use thiserror::Error;

/// Error type for sdpmodel operations.
#[derive(Debug, Error)]
pub enum CvxError {
    /// Argument sizes disagree (reshape, dot, arity of index tuples).
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// A slice or pick coordinate lies outside the declared extent.
    #[error("Index out of range: {index} not within {bound}")]
    IndexOutOfRange { index: String, bound: String },

    /// An expression or slice references a variable owned by another problem.
    #[error("Variable {variable} is not owned by this problem")]
    ForeignVariable { variable: String },

    /// The problem was already solved and can no longer be modified.
    #[error("Problem is finalized: no modification is allowed after solve")]
    ProblemFinalized,

    /// No primal solution is available.
    #[error("No solution available: problem has not been solved to optimality")]
    NotSolved,

    /// The problem cannot be handed to a backend as declared.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// I/O failure while writing a problem dump.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure while (de)serializing a problem dump or settings.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CvxError {
    pub(crate) fn shape_mismatch(expected: impl ToString, got: impl ToString) -> Self {
        CvxError::ShapeMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    pub(crate) fn out_of_range(index: impl ToString, bound: impl ToString) -> Self {
        CvxError::IndexOutOfRange {
            index: index.to_string(),
            bound: bound.to_string(),
        }
    }
}

/// Result type for sdpmodel operations.
pub type Result<T> = std::result::Result<T, CvxError>;
