//! Electrochemical objective models.
//!
//! Every function here is pure: given a design vector and a shared parameter
//! record it returns objectives and constraint residuals without touching any
//! other state, so populations can be evaluated concurrently.
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

pub mod catalyst;
pub mod membrane;

use serde::{Deserialize, Serialize};

pub use catalyst::{CatalystParams, ElectrodeParams};
pub use membrane::MembraneParams;

/// Value substituted for an overpotential term whose closed form is undefined
/// (log of a non-positive argument, limiting current at or below the operating
/// current). Values near this magnitude carry no physical meaning.
pub const PENALTY: f64 = 1e6;

/// Objectives and constraint residuals for one design vector.
///
/// Objectives are all minimized. A residual `g <= 0` is satisfied, `g > 0` is a
/// violation of magnitude `g`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub objectives: Vec<f64>,
    pub constraints: Vec<f64>,
}

/// Model parameters for one of the two design levels.
///
/// The variant selects the design level, so it also decides the shape of the
/// design vector and of the resulting [`Evaluation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelParams {
    Membrane(MembraneParams),
    CatalystLayer(CatalystParams),
}

impl ModelParams {
    pub fn n_variables(&self) -> usize {
        match self {
            ModelParams::Membrane(_) => membrane::N_VARIABLES,
            ModelParams::CatalystLayer(_) => catalyst::N_VARIABLES,
        }
    }

    pub fn n_objectives(&self) -> usize {
        match self {
            ModelParams::Membrane(_) => membrane::N_OBJECTIVES,
            ModelParams::CatalystLayer(_) => catalyst::N_OBJECTIVES,
        }
    }

    pub fn n_constraints(&self) -> usize {
        match self {
            ModelParams::Membrane(_) => membrane::N_CONSTRAINTS,
            ModelParams::CatalystLayer(_) => catalyst::N_CONSTRAINTS,
        }
    }
}

/// Evaluate a design vector against either model.
///
/// The caller guarantees `x.len()` matches the model's variable count; problem
/// encoders enforce this through their bounds.
pub fn evaluate(x: &[f64], params: &ModelParams) -> Evaluation {
    match params {
        ModelParams::Membrane(p) => membrane::evaluate(x, p),
        ModelParams::CatalystLayer(p) => catalyst::evaluate(x, p),
    }
}
