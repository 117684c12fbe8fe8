//! PEM electrolyzer membrane and catalyst-layer design optimization.
//!
//! The [`model`] functions map a design vector to objectives and constraint
//! residuals. [`problem`] packages them as fixed-shape optimization problems,
//! [`scalarize`] reduces those to a single objective and [`driver`] runs a
//! [`solver`] against either form. [`results`] turns the outcome into a named
//! table.
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

pub mod driver;
pub mod error;
pub mod model;
pub mod problem;
pub mod results;
pub mod scalarize;
pub mod solver;

#[cfg(test)]
mod tests;

pub use driver::{encode, run_optimization, run_optimization_with, solve, EncodedProblem, Method, OptimizationRequest};
pub use error::{Error, Result};
pub use model::{Evaluation, ModelParams, PENALTY};
pub use problem::{evaluate, make_problem, Bounds, DesignProblem, Problem};
pub use results::ResultTable;
pub use scalarize::{make_scalarized, ScalarMode, ScalarParams, Scalarized};
pub use solver::{Algorithm, OptimizationResult, SolverConfig};
