//! Optimization-problem encoding of the objective models.
//!
//! A [`Problem`] fixes its shape (variables, objectives, constraints, bounds)
//! at construction and evaluates design vectors by delegating to the model.
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{self, catalyst, membrane, CatalystParams, Evaluation, MembraneParams, ModelParams};

/// Per-variable lower/upper bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        let bounds = Self { lower, upper };
        bounds.check(bounds.lower.len())?;
        Ok(bounds)
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// `(lo, hi)` pairs, one per variable.
    pub fn pairs(&self) -> Vec<(f64, f64)> {
        self.lower.iter().copied().zip(self.upper.iter().copied()).collect()
    }

    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.len()
            && x.iter()
                .zip(self.pairs())
                .all(|(v, (lo, hi))| (lo..=hi).contains(v))
    }

    /// Validate against a declared variable count.
    pub fn check(&self, n_variables: usize) -> Result<()> {
        for found in [self.lower.len(), self.upper.len()] {
            if found != n_variables {
                return Err(Error::BoundsLength {
                    expected: n_variables,
                    found,
                });
            }
        }
        for (index, (&lower, &upper)) in self.lower.iter().zip(&self.upper).enumerate() {
            if !lower.is_finite() || !upper.is_finite() {
                return Err(Error::NonFiniteBound { index });
            }
            if lower > upper {
                return Err(Error::InvertedBounds { index, lower, upper });
            }
        }
        Ok(())
    }
}

/// Evaluation contract shared by the encoders, the scalarization adapters and
/// the solver engine.
pub trait Problem: Sync {
    fn n_variables(&self) -> usize;
    fn n_objectives(&self) -> usize;
    fn n_constraints(&self) -> usize;
    fn bounds(&self) -> &Bounds;

    /// Objectives and constraint residuals of one design vector.
    fn evaluate(&self, x: &[f64]) -> Evaluation;

    /// Evaluate many design vectors.
    ///
    /// Rows are independent and evaluated in parallel; the output order matches
    /// the input order and each row is bit-identical to [`Problem::evaluate`].
    fn evaluate_batch(&self, xs: &[Vec<f64>]) -> Vec<Evaluation> {
        xs.par_iter().map(|x| self.evaluate(x)).collect()
    }

    fn variable_names(&self) -> Vec<String> {
        (1..=self.n_variables()).map(|i| format!("Var_{i}")).collect()
    }

    fn objective_names(&self) -> Vec<String> {
        (1..=self.n_objectives()).map(|i| format!("Obj_{i}")).collect()
    }
}

impl<P: Problem + ?Sized> Problem for &P {
    fn n_variables(&self) -> usize {
        (**self).n_variables()
    }
    fn n_objectives(&self) -> usize {
        (**self).n_objectives()
    }
    fn n_constraints(&self) -> usize {
        (**self).n_constraints()
    }
    fn bounds(&self) -> &Bounds {
        (**self).bounds()
    }
    fn evaluate(&self, x: &[f64]) -> Evaluation {
        (**self).evaluate(x)
    }
    fn variable_names(&self) -> Vec<String> {
        (**self).variable_names()
    }
    fn objective_names(&self) -> Vec<String> {
        (**self).objective_names()
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Membrane design: 2 variables, 4 objectives, 1 constraint.
#[derive(Debug, Clone)]
pub struct MembraneProblem {
    params: MembraneParams,
    bounds: Bounds,
}

impl MembraneProblem {
    /// Both variables appear as divisors in the model, so their lower bounds
    /// must be strictly positive.
    pub fn new(params: MembraneParams, bounds: Bounds) -> Result<Self> {
        bounds.check(membrane::N_VARIABLES)?;
        for (index, &lower) in bounds.lower.iter().enumerate() {
            if lower <= 0.0 {
                return Err(Error::NonPositiveBound { index, lower });
            }
        }
        Ok(Self { params, bounds })
    }

    pub fn with_default_bounds(params: MembraneParams) -> Result<Self> {
        let bounds = Bounds::new(membrane::DEFAULT_LOWER.to_vec(), membrane::DEFAULT_UPPER.to_vec())?;
        Self::new(params, bounds)
    }

    pub fn params(&self) -> &MembraneParams {
        &self.params
    }
}

impl Problem for MembraneProblem {
    fn n_variables(&self) -> usize {
        membrane::N_VARIABLES
    }
    fn n_objectives(&self) -> usize {
        membrane::N_OBJECTIVES
    }
    fn n_constraints(&self) -> usize {
        membrane::N_CONSTRAINTS
    }
    fn bounds(&self) -> &Bounds {
        &self.bounds
    }
    fn evaluate(&self, x: &[f64]) -> Evaluation {
        membrane::evaluate(x, &self.params)
    }
    fn variable_names(&self) -> Vec<String> {
        names(&membrane::VARIABLE_NAMES)
    }
    fn objective_names(&self) -> Vec<String> {
        names(&membrane::OBJECTIVE_NAMES)
    }
}

/// Catalyst-layer design: 6 variables, 2 objectives, 22 constraints.
#[derive(Debug, Clone)]
pub struct CatalystProblem {
    params: CatalystParams,
    bounds: Bounds,
}

impl CatalystProblem {
    /// Layer thickness divides the limiting current, so both thickness lower
    /// bounds must be strictly positive.
    pub fn new(params: CatalystParams, bounds: Bounds) -> Result<Self> {
        bounds.check(catalyst::N_VARIABLES)?;
        for index in catalyst::THICKNESS_INDICES {
            let lower = bounds.lower[index];
            if lower <= 0.0 {
                return Err(Error::NonPositiveBound { index, lower });
            }
        }
        Ok(Self { params, bounds })
    }

    /// Bounds taken from the electrode thickness, porosity and surface-area limits.
    pub fn with_default_bounds(params: CatalystParams) -> Result<Self> {
        let (lower, upper) = params.default_bounds();
        let bounds = Bounds::new(lower, upper)?;
        Self::new(params, bounds)
    }

    pub fn params(&self) -> &CatalystParams {
        &self.params
    }
}

impl Problem for CatalystProblem {
    fn n_variables(&self) -> usize {
        catalyst::N_VARIABLES
    }
    fn n_objectives(&self) -> usize {
        catalyst::N_OBJECTIVES
    }
    fn n_constraints(&self) -> usize {
        catalyst::N_CONSTRAINTS
    }
    fn bounds(&self) -> &Bounds {
        &self.bounds
    }
    fn evaluate(&self, x: &[f64]) -> Evaluation {
        catalyst::evaluate(x, &self.params)
    }
    fn variable_names(&self) -> Vec<String> {
        names(&catalyst::VARIABLE_NAMES)
    }
    fn objective_names(&self) -> Vec<String> {
        names(&catalyst::OBJECTIVE_NAMES)
    }
}

/// Either design level behind one concrete type.
#[derive(Debug, Clone)]
pub enum DesignProblem {
    Membrane(MembraneProblem),
    CatalystLayer(CatalystProblem),
}

impl DesignProblem {
    fn inner(&self) -> &dyn Problem {
        match self {
            DesignProblem::Membrane(p) => p,
            DesignProblem::CatalystLayer(p) => p,
        }
    }

    pub fn model_params(&self) -> ModelParams {
        match self {
            DesignProblem::Membrane(p) => ModelParams::Membrane(p.params.clone()),
            DesignProblem::CatalystLayer(p) => ModelParams::CatalystLayer(p.params.clone()),
        }
    }
}

impl Problem for DesignProblem {
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

/// Build the encoder for a design level. `None` bounds selects the level's
/// defaults.
pub fn make_problem(params: &ModelParams, bounds: Option<Bounds>) -> Result<DesignProblem> {
    match params {
        ModelParams::Membrane(p) => {
            let problem = match bounds {
                Some(b) => MembraneProblem::new(p.clone(), b)?,
                None => MembraneProblem::with_default_bounds(p.clone())?,
            };
            Ok(DesignProblem::Membrane(problem))
        }
        ModelParams::CatalystLayer(p) => {
            let problem = match bounds {
                Some(b) => CatalystProblem::new(p.clone(), b)?,
                None => CatalystProblem::with_default_bounds(p.clone())?,
            };
            Ok(DesignProblem::CatalystLayer(problem))
        }
    }
}

/// Evaluate a single design vector directly against the model. The vector
/// length must match the design level.
pub fn evaluate(x: &[f64], params: &ModelParams) -> Result<Evaluation> {
    let expected = params.n_variables();
    if x.len() != expected {
        return Err(Error::DesignLength { expected, found: x.len() });
    }
    Ok(model::evaluate(x, params))
}
