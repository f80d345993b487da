//! Reporting of solved block variables.
//!
//! A presentation layer on top of [`Problem::level`]: it picks out the blocks
//! of a variable whose values are above an activity threshold and formats
//! them.

use std::fmt;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::expr::ConeBlockVariable;
use crate::problem::Problem;

/// Options for [`contributing_blocks`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// A block is reported if any entry exceeds this value.
    pub activity_threshold: f64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            activity_threshold: 1e-6,
        }
    }
}

/// Solved values of one block.
#[derive(Debug, Clone)]
pub struct BlockReport {
    /// Variable label used when printing.
    pub label: String,
    /// Block index `j`.
    pub block: usize,
    /// The `d x d` values.
    pub values: DMatrix<f64>,
}

impl fmt::Display for BlockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}[{}] =", self.label, self.block)?;
        for row in self.values.row_iter() {
            let cells: Vec<String> = row.iter().map(|v| format!("{:>12.6}", v)).collect();
            writeln!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}

/// Blocks of `var` with at least one entry above the activity threshold.
///
/// Fails with `NotSolved` unless the problem was solved to optimality.
pub fn contributing_blocks(
    problem: &Problem,
    var: &ConeBlockVariable,
    options: &ReportOptions,
) -> Result<Vec<BlockReport>> {
    let label = var.label();
    let mut reports = Vec::new();
    for j in 0..var.blocks() {
        let values = problem.level_matrix(&var.block(j)?)?;
        if values.iter().any(|&v| v > options.activity_threshold) {
            reports.push(BlockReport {
                label: label.clone(),
                block: j,
                values,
            });
        }
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CvxError;
    use crate::solver::{ConicProblem, SolveStatus, Solver, SolverOutput};

    struct Fixed(Vec<f64>);

    impl Solver for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn solve(&self, _problem: &ConicProblem) -> SolverOutput {
            SolverOutput {
                status: SolveStatus::Optimal,
                primal: Some(self.0.clone()),
                solve_time: 0.0,
                iterations: 0,
            }
        }
    }

    #[test]
    fn test_contributing_blocks() {
        let mut problem = Problem::new("report");
        let x = problem.named_cone_block_variable("X", 3, 1).unwrap();
        problem.solve(&Fixed(vec![0.0, 2.0, 1e-9])).unwrap();

        let reports = contributing_blocks(&problem, &x, &ReportOptions::default()).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].block, 1);
        assert_eq!(reports[0].values[(0, 0)], 2.0);
        assert!(reports[0].to_string().starts_with("X[1] ="));

        let loose = ReportOptions {
            activity_threshold: 1e-12,
        };
        assert_eq!(contributing_blocks(&problem, &x, &loose).unwrap().len(), 2);
    }

    #[test]
    fn test_report_requires_solution() {
        let mut problem = Problem::new("report");
        let x = problem.cone_block_variable(1, 2).unwrap();
        assert!(matches!(
            contributing_blocks(&problem, &x, &ReportOptions::default()),
            Err(CvxError::NotSolved)
        ));
    }
}
