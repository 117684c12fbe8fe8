//! Configuration errors reported at construction or dispatch time.
//!
//! Infeasible designs are never errors: they are reported through constraint
//! residuals. Numerically degenerate evaluations are never errors either: they
//! substitute [`crate::model::PENALTY`] into the affected objective term.
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("bounds have {found} entries, expected {expected}")]
    BoundsLength { expected: usize, found: usize },

    #[error("lower bound {lower} exceeds upper bound {upper} for variable {index}")]
    InvertedBounds { index: usize, lower: f64, upper: f64 },

    #[error("bound for variable {index} is not finite")]
    NonFiniteBound { index: usize },

    #[error("lower bound {lower} for variable {index} must be strictly positive")]
    NonPositiveBound { index: usize, lower: f64 },

    #[error("design vector has {found} entries, expected {expected}")]
    DesignLength { expected: usize, found: usize },

    #[error("unknown optimization method: {0}")]
    UnknownMethod(String),

    #[error("unknown scalarization mode: {0}")]
    UnknownScalarization(String),

    #[error("{what} has {found} entries, expected one per objective ({expected})")]
    ScalarLength {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid setting: {what}")]
    InvalidSetting { what: String },
}

pub type Result<T> = std::result::Result<T, Error>;
