//! Solves the semidefinite problem
//!
//! ```text
//! min   tr(X_0) + ... + tr(X_{n-1})
//! st.   <A_i0, X_0> + ... + <A_i(n-1), X_{n-1}> >= b_i,   i = 0..k
//! ```
//!
//! where the `X_j` are `d x d` PSD matrices stored as one stacked block
//! variable and the `A_ij` are random symmetric matrices.
//!
//! Run with `cargo run --example sdo3`. Set `RUST_LOG=debug` for modeling
//! logs and `SDO3_DUMP=<path>` to write the problem as JSON. Blocks larger
//! than 2x2 need `--features sdp`.

use std::sync::Arc;

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sdpmodel::prelude::*;
use tracing_subscriber::EnvFilter;

const N: usize = 100;
const D: usize = if cfg!(feature = "sdp") { 4 } else { 2 };
const B: [f64; 3] = [9.0, 10.0, 11.0];

/// Symmetric matrix with entries drawn from U(0, 1).
fn random_symmetric(rng: &mut impl Rng, d: usize) -> DMatrix<f64> {
    symmetric_matrix(d, |_, _| rng.gen::<f64>())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut rng = StdRng::seed_from_u64(3);
    let a: Vec<Vec<Arc<DMatrix<f64>>>> = B
        .iter()
        .map(|_| (0..N).map(|_| Arc::new(random_symmetric(&mut rng, D))).collect())
        .collect();

    let mut problem = Problem::new("sdo3");
    let x = problem.named_cone_block_variable("X", N, D)?;

    problem.minimize(sum_over_indices(&x, &x.pick_diagonal())?)?;

    // One inner product per block, summed per constraint
    for (row, &bi) in a.iter().zip(&B) {
        let terms = row
            .iter()
            .enumerate()
            .map(|(j, aij)| dot(aij.clone(), &x.block(j)?))
            .collect::<Result<Vec<_>>>()?;
        problem.add_constraint(sum(terms), greater_than(bi))?;
    }

    if let Ok(path) = std::env::var("SDO3_DUMP") {
        problem.write_dump(path)?;
    }

    let status = problem.solve(&ClarabelSolver::default())?;
    println!("Status: {}", status);
    if !status.is_optimal() {
        return Ok(());
    }
    println!("Objective: {:.6}", problem.objective_value()?);

    println!("Contributing blocks:");
    for report in contributing_blocks(&problem, &x, &ReportOptions::default())? {
        print!("{}", report);
    }
    Ok(())
}
