//! Variables, slices and expressions.
//!
//! This module provides the core types for building problems:
//! - `Shape` and `SliceSpec` - the index algebra over row-major arenas
//! - `ConeBlockVariable` and `Slice` - stacked PSD variables and views into them
//! - `Expr` - the scalar linear expression DAG
//! - constant matrix helpers

pub mod constant;
pub mod expression;
pub mod shape;
pub mod variable;

// Re-export main types
pub use constant::{diag_matrix, eye, is_psd, is_symmetric, matrix_from_rows, symmetric_matrix};
pub use expression::{DotTerm, Expr, ProblemId};
pub use shape::{FlatIndices, Shape, SliceSpec};
pub use variable::{ConeBlockVariable, Slice};
