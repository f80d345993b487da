//! Expression builder functions.
//!
//! All atoms here are linear and purely structural: they allocate nodes and
//! check shapes, but nothing is evaluated until the problem is solved.

pub mod affine;

pub use affine::{add, constant, dot, sum, sum_over_indices};
