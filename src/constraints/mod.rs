//! Constraint domains and registered constraints.
//!
//! Scalar domains map to cones in the solver:
//! - `EqualsTo`: zero cone
//! - `GreaterThan` / `LessThan`: nonnegative orthant
//! - `InPsdCone`: PSD cone, attached to block variables at declaration

pub mod constraint;
pub mod domain;

pub use constraint::Constraint;
pub use domain::{equal_to, greater_than, in_psd_cone, less_than, Domain, Relation};
