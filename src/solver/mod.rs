//! Population-based search engine.
//!
//! Every algorithm minimizes all objectives of a [`Problem`], treats
//! `g_i <= 0` as satisfied and draws its randomness from one `ChaCha8Rng`
//! seeded from [`SolverConfig::seed`], so a run is fully determined by its
//! inputs.
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

pub mod ga;
pub mod moead;
pub mod nsga2;
pub mod operators;
pub mod population;
pub mod spea2;

use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::problem::Problem;
use population::Individual;

/// Search algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Nsga2,
    Moead,
    Spea2,
    /// Single-objective genetic algorithm.
    Ga,
}

impl Algorithm {
    /// Whether the algorithm returns a set of trade-offs rather than one point.
    pub fn is_pareto(self) -> bool {
        !matches!(self, Algorithm::Ga)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Nsga2 => "NSGA-II",
            Algorithm::Moead => "MOEA/D",
            Algorithm::Spea2 => "SPEA2",
            Algorithm::Ga => "GA",
        };
        f.write_str(name)
    }
}

/// Solver settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub pop_size: usize,
    /// Generation count; the only termination rule.
    pub generations: usize,
    pub seed: u64,
    /// Crossover probability
    pub crossover_prob: f64,
    /// Distribution index for SBX crossover
    pub eta_c: f64,
    /// Distribution index for polynomial mutation
    pub eta_m: f64,
    /// Per-gene mutation probability; `None` means `1 / n_variables`.
    pub mutation_prob: Option<f64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            pop_size: 100,
            generations: 100,
            seed: 1,
            crossover_prob: 0.9,
            eta_c: 20.0,
            eta_m: 20.0,
            mutation_prob: None,
        }
    }
}

/// Members retained by a run, as row-aligned matrices.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptimizationResult {
    /// Decision matrix, one row per retained member.
    pub x: Vec<Vec<f64>>,
    /// Objective matrix.
    pub f: Vec<Vec<f64>>,
    /// Constraint matrix, when the solver kept residuals.
    pub g: Option<Vec<Vec<f64>>>,
    pub algorithm: Algorithm,
    pub generations: usize,
    pub evaluations: usize,
}

impl OptimizationResult {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Number of rows whose constraint residuals are all satisfied. Unknown
    /// when no constraint matrix is attached.
    pub fn n_feasible(&self) -> Option<usize> {
        self.g
            .as_ref()
            .map(|g| g.iter().filter(|row| row.iter().all(|&v| v <= 0.0)).count())
    }
}

/// Final members of one algorithm run, with the number of evaluations spent.
pub(crate) struct Outcome {
    pub members: Vec<Individual>,
    pub evaluations: usize,
}

/// Run `algorithm` on `problem`.
pub fn minimize<P: Problem + ?Sized>(
    problem: &P,
    algorithm: Algorithm,
    config: &SolverConfig,
) -> OptimizationResult {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    info!(
        %algorithm,
        pop_size = config.pop_size,
        generations = config.generations,
        seed = config.seed,
        n_var = problem.n_variables(),
        n_obj = problem.n_objectives(),
        n_constr = problem.n_constraints(),
        "starting search"
    );

    let outcome = match algorithm {
        Algorithm::Nsga2 => nsga2::run(problem, config, &mut rng),
        Algorithm::Moead => moead::run(problem, config, &mut rng),
        Algorithm::Spea2 => spea2::run(problem, config, &mut rng),
        Algorithm::Ga => ga::run(problem, config, &mut rng),
    };

    let n_feasible = outcome.members.iter().filter(|m| m.is_feasible()).count();
    info!(
        %algorithm,
        retained = outcome.members.len(),
        feasible = n_feasible,
        evaluations = outcome.evaluations,
        "search finished"
    );

    let mut x = Vec::with_capacity(outcome.members.len());
    let mut f = Vec::with_capacity(outcome.members.len());
    let mut g = Vec::with_capacity(outcome.members.len());
    for member in outcome.members {
        x.push(member.x);
        f.push(member.f);
        g.push(member.g);
    }

    OptimizationResult {
        x,
        f,
        g: Some(g),
        algorithm,
        generations: config.generations,
        evaluations: outcome.evaluations,
    }
}
