//! Optimization driver: method dispatch over the encoders and adapters.
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::model::{Evaluation, ModelParams};
use crate::problem::{make_problem, Bounds, DesignProblem, Problem};
use crate::scalarize::{make_scalarized, normalize_name, ScalarMode, ScalarParams, Scalarized};
use crate::solver::{self, Algorithm, OptimizationResult, SolverConfig};

/// Optimization method requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Nsga2,
    Moead,
    Spea2,
    WeightedSum,
    GoalSeeking,
}

impl Method {
    /// Algorithm that runs this method. Scalarizations always use the GA.
    pub fn algorithm(self) -> Algorithm {
        match self {
            Method::Nsga2 => Algorithm::Nsga2,
            Method::Moead => Algorithm::Moead,
            Method::Spea2 => Algorithm::Spea2,
            Method::WeightedSum | Method::GoalSeeking => Algorithm::Ga,
        }
    }

    pub fn scalar_mode(self) -> Option<ScalarMode> {
        match self {
            Method::WeightedSum => Some(ScalarMode::WeightedSum),
            Method::GoalSeeking => Some(ScalarMode::GoalSeeking),
            _ => None,
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_name(s).as_str() {
            "nsga2" | "nsgaii" => Ok(Method::Nsga2),
            "moead" => Ok(Method::Moead),
            "spea2" => Ok(Method::Spea2),
            "weightedsum" => Ok(Method::WeightedSum),
            "goalseeking" => Ok(Method::GoalSeeking),
            _ => Err(Error::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Nsga2 => "NSGA2",
            Method::Moead => "MOEA/D",
            Method::Spea2 => "SPEA2",
            Method::WeightedSum => "Weighted Sum",
            Method::GoalSeeking => "Goal Seeking",
        };
        f.write_str(name)
    }
}

/// Everything needed to run one optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationRequest {
    pub method: Method,
    pub params: ModelParams,
    /// `None` selects the design level's default bounds.
    pub bounds: Option<Bounds>,
    pub scalar: ScalarParams,
    pub pop_size: usize,
    pub generations: usize,
    pub seed: u64,
}

impl OptimizationRequest {
    pub fn new(method: Method, params: ModelParams) -> Self {
        let defaults = SolverConfig::default();
        Self {
            method,
            params,
            bounds: None,
            scalar: ScalarParams::default(),
            pop_size: defaults.pop_size,
            generations: defaults.generations,
            seed: defaults.seed,
        }
    }

    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            pop_size: self.pop_size,
            generations: self.generations,
            seed: self.seed,
            ..SolverConfig::default()
        }
    }
}

/// The problem a request is solved against: the encoder itself, or the
/// encoder behind a scalarization adapter.
#[derive(Debug, Clone)]
pub enum EncodedProblem {
    Design(DesignProblem),
    Scalarized(Scalarized<DesignProblem>),
}

impl EncodedProblem {
    fn inner(&self) -> &dyn Problem {
        match self {
            EncodedProblem::Design(p) => p,
            EncodedProblem::Scalarized(p) => p,
        }
    }
}

impl Problem for EncodedProblem {
    fn n_variables(&self) -> usize {
        self.inner().n_variables()
    }
    fn n_objectives(&self) -> usize {
        self.inner().n_objectives()
    }
    fn n_constraints(&self) -> usize {
        self.inner().n_constraints()
    }
    fn bounds(&self) -> &Bounds {
        self.inner().bounds()
    }
    fn evaluate(&self, x: &[f64]) -> Evaluation {
        self.inner().evaluate(x)
    }
    fn variable_names(&self) -> Vec<String> {
        self.inner().variable_names()
    }
    fn objective_names(&self) -> Vec<String> {
        self.inner().objective_names()
    }
}

/// Validate the run settings and build the problem the request's method
/// optimizes. Scalarization methods get the adapter, the others the encoder.
pub fn encode(request: &OptimizationRequest) -> Result<EncodedProblem> {
    if request.pop_size == 0 {
        return Err(Error::InvalidSetting {
            what: "population size must be at least 1".to_string(),
        });
    }
    if request.generations == 0 {
        return Err(Error::InvalidSetting {
            what: "generation count must be at least 1".to_string(),
        });
    }

    let problem = make_problem(&request.params, request.bounds.clone())?;
    Ok(match request.method.scalar_mode() {
        Some(mode) => EncodedProblem::Scalarized(make_scalarized(problem, mode, &request.scalar)?),
        None => EncodedProblem::Design(problem),
    })
}

/// Run the request's algorithm on an already encoded problem.
pub fn solve(problem: &EncodedProblem, request: &OptimizationRequest) -> OptimizationResult {
    let config = request.solver_config();
    let algorithm = request.method.algorithm();

    info!(
        method = %request.method,
        %algorithm,
        pop_size = config.pop_size,
        generations = config.generations,
        seed = config.seed,
        "running optimization"
    );

    solver::minimize(problem, algorithm, &config)
}

/// Build the encoder, wrap it for scalarization methods and run the solver.
///
/// The solver result is returned unchanged.
pub fn run_optimization(request: &OptimizationRequest) -> Result<OptimizationResult> {
    let problem = encode(request)?;
    Ok(solve(&problem, request))
}

/// Positional form of [`run_optimization`]. `method` is parsed by name.
#[allow(clippy::too_many_arguments)]
pub fn run_optimization_with(
    method: &str,
    params: ModelParams,
    bounds: Option<Bounds>,
    scalar: ScalarParams,
    pop_size: usize,
    generations: usize,
    seed: u64,
) -> Result<OptimizationResult> {
    let request = OptimizationRequest {
        method: method.parse()?,
        params,
        bounds,
        scalar,
        pop_size,
        generations,
        seed,
    };
    run_optimization(&request)
}
