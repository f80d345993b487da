//! Domains that expressions and variables are constrained to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Relation of a scalar constraint `expr REL bound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// `expr >= bound`
    GreaterThan,
    /// `expr <= bound`
    LessThan,
    /// `expr == bound`
    EqualTo,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::GreaterThan => write!(f, ">="),
            Relation::LessThan => write!(f, "<="),
            Relation::EqualTo => write!(f, "=="),
        }
    }
}

/// A constraint domain. Purely descriptive; carries no storage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Values `>= b`.
    GreaterThan(f64),
    /// Values `<= b`.
    LessThan(f64),
    /// Values `== b`.
    EqualsTo(f64),
    /// `count` stacked `dim x dim` matrices, each symmetric PSD.
    InPsdCone {
        /// Block dimension.
        dim: usize,
        /// Number of blocks.
        count: usize,
    },
}

impl Domain {
    /// Scalar relation and bound, or `None` for cone domains.
    pub fn relation(&self) -> Option<(Relation, f64)> {
        match *self {
            Domain::GreaterThan(b) => Some((Relation::GreaterThan, b)),
            Domain::LessThan(b) => Some((Relation::LessThan, b)),
            Domain::EqualsTo(b) => Some((Relation::EqualTo, b)),
            Domain::InPsdCone { .. } => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::InPsdCone { dim, count } => write!(f, "PSD({}x{}) x {}", dim, dim, count),
            other => match other.relation() {
                Some((rel, b)) => write!(f, "{} {}", rel, b),
                None => Ok(()),
            },
        }
    }
}

/// Domain `>= b`.
pub fn greater_than(b: f64) -> Domain {
    Domain::GreaterThan(b)
}

/// Domain `<= b`.
pub fn less_than(b: f64) -> Domain {
    Domain::LessThan(b)
}

/// Domain `== b`.
pub fn equal_to(b: f64) -> Domain {
    Domain::EqualsTo(b)
}

/// Domain of `n` stacked `d x d` PSD matrices.
pub fn in_psd_cone(d: usize, n: usize) -> Domain {
    Domain::InPsdCone { dim: d, count: n }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation() {
        assert_eq!(greater_than(1.0).relation(), Some((Relation::GreaterThan, 1.0)));
        assert_eq!(less_than(2.0).relation(), Some((Relation::LessThan, 2.0)));
        assert_eq!(equal_to(0.0).relation(), Some((Relation::EqualTo, 0.0)));
        assert_eq!(in_psd_cone(3, 4).relation(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(greater_than(1.5).to_string(), ">= 1.5");
        assert_eq!(in_psd_cone(2, 5).to_string(), "PSD(2x2) x 5");
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&in_psd_cone(2, 3)).unwrap();
        let back: Domain = serde_json::from_str(&json).unwrap();
        assert_eq!(back, in_psd_cone(2, 3));
    }
}
