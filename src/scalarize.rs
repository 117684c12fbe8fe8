//! Single-objective views of a multi-objective [`Problem`].
//!
//! Both transforms forward the wrapped problem's bounds and constraint vector
//! unchanged, so feasibility is judged exactly as in the Pareto formulation.
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::model::{catalyst, membrane, Evaluation};
use crate::problem::{Bounds, DesignProblem, Problem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarMode {
    /// `Σ w_i f_i`. Objective scales are not normalized; commensurable weights
    /// are the caller's responsibility.
    WeightedSum,
    /// `Σ (f_i - goal_i)²`. An aspiration-point distance, not a feasibility
    /// guarantee: unreachable goals can pull the search to infeasible designs.
    GoalSeeking,
}

impl FromStr for ScalarMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_name(s).as_str() {
            "weightedsum" => Ok(ScalarMode::WeightedSum),
            "goalseeking" => Ok(ScalarMode::GoalSeeking),
            _ => Err(Error::UnknownScalarization(s.to_string())),
        }
    }
}

/// Lowercase and strip separators so "Weighted Sum", "weighted_sum" and
/// "WeightedSum" are the same name.
pub(crate) fn normalize_name(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Default weights or goals for a design level.
pub fn default_coefficients(problem: &DesignProblem, mode: ScalarMode) -> Vec<f64> {
    match (problem, mode) {
        (DesignProblem::Membrane(_), ScalarMode::WeightedSum) => vec![0.25; membrane::N_OBJECTIVES],
        (DesignProblem::Membrane(_), ScalarMode::GoalSeeking) => vec![-0.1, -15_000.0, 15.0, 3.0],
        (DesignProblem::CatalystLayer(_), ScalarMode::WeightedSum) => vec![0.5; catalyst::N_OBJECTIVES],
        (DesignProblem::CatalystLayer(_), ScalarMode::GoalSeeking) => vec![10.0, 0.5],
    }
}

/// User-supplied scalarization coefficients.
///
/// Either field may be missing; [`ScalarParams::resolve`] fills in the
/// defaults of the design level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarParams {
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
    #[serde(default)]
    pub goals: Option<Vec<f64>>,
}

impl ScalarParams {
    /// Parse comma-separated weight and goal text. Text that does not parse
    /// as a list of numbers is dropped with a warning, which makes
    /// [`ScalarParams::resolve`] fall back to the defaults.
    pub fn parse(weights: Option<&str>, goals: Option<&str>) -> Self {
        Self {
            weights: weights.and_then(|t| parse_list("weights", t)),
            goals: goals.and_then(|t| parse_list("goals", t)),
        }
    }

    pub fn resolve(&self, problem: &DesignProblem, mode: ScalarMode) -> Vec<f64> {
        let given = match mode {
            ScalarMode::WeightedSum => self.weights.as_ref(),
            ScalarMode::GoalSeeking => self.goals.as_ref(),
        };
        given
            .cloned()
            .unwrap_or_else(|| default_coefficients(problem, mode))
    }
}

/// Parse `"0.25, 0.25, 0.5"`. Returns `None` (and logs) on any bad entry.
pub fn parse_list(what: &str, text: &str) -> Option<Vec<f64>> {
    let parsed: std::result::Result<Vec<f64>, _> =
        text.split(',').map(|v| v.trim().parse::<f64>()).collect();
    match parsed {
        Ok(values) if !values.is_empty() && values.iter().all(|v| v.is_finite()) => Some(values),
        _ => {
            warn!(what, text, "unparseable scalarization input, using defaults");
            None
        }
    }
}

/// A problem seen through a scalarization transform.
#[derive(Debug, Clone)]
pub struct Scalarized<P> {
    base: P,
    mode: ScalarMode,
    coefficients: Vec<f64>,
}

impl<P: Problem> Scalarized<P> {
    /// Wrap `base`. `coefficients` are the weights (weighted sum) or goals
    /// (goal seeking) and must have one entry per base objective.
    pub fn new(base: P, mode: ScalarMode, coefficients: Vec<f64>) -> Result<Self> {
        if coefficients.len() != base.n_objectives() {
            return Err(Error::ScalarLength {
                what: match mode {
                    ScalarMode::WeightedSum => "weights",
                    ScalarMode::GoalSeeking => "goals",
                },
                expected: base.n_objectives(),
                found: coefficients.len(),
            });
        }
        base.bounds().check(base.n_variables())?;
        Ok(Self {
            base,
            mode,
            coefficients,
        })
    }

    pub fn weighted_sum(base: P, weights: Vec<f64>) -> Result<Self> {
        Self::new(base, ScalarMode::WeightedSum, weights)
    }

    pub fn goal_seeking(base: P, goals: Vec<f64>) -> Result<Self> {
        Self::new(base, ScalarMode::GoalSeeking, goals)
    }

    pub fn base(&self) -> &P {
        &self.base
    }

    pub fn mode(&self) -> ScalarMode {
        self.mode
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Reduce a base objective vector to the scalar value.
    pub fn scalarize(&self, objectives: &[f64]) -> f64 {
        let pairs = objectives.iter().zip(&self.coefficients);
        match self.mode {
            ScalarMode::WeightedSum => pairs.map(|(f, w)| w * f).sum(),
            ScalarMode::GoalSeeking => pairs.map(|(f, g)| (f - g).powi(2)).sum(),
        }
    }
}

impl<P: Problem> Problem for Scalarized<P> {
    fn n_variables(&self) -> usize {
        self.base.n_variables()
    }
    fn n_objectives(&self) -> usize {
        1
    }
    fn n_constraints(&self) -> usize {
        self.base.n_constraints()
    }
    fn bounds(&self) -> &Bounds {
        self.base.bounds()
    }
    fn evaluate(&self, x: &[f64]) -> Evaluation {
        let base = self.base.evaluate(x);
        Evaluation {
            objectives: vec![self.scalarize(&base.objectives)],
            constraints: base.constraints,
        }
    }
    fn variable_names(&self) -> Vec<String> {
        self.base.variable_names()
    }
    fn objective_names(&self) -> Vec<String> {
        let name = match self.mode {
            ScalarMode::WeightedSum => "weighted_sum",
            ScalarMode::GoalSeeking => "goal_distance",
        };
        vec![name.to_string()]
    }
}

/// Wrap a design problem, taking weights or goals from `params` and the
/// design level's defaults for whatever is missing.
pub fn make_scalarized(
    problem: DesignProblem,
    mode: ScalarMode,
    params: &ScalarParams,
) -> Result<Scalarized<DesignProblem>> {
    let coefficients = params.resolve(&problem, mode);
    Scalarized::new(problem, mode, coefficients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CatalystParams, MembraneParams, ModelParams};
    use crate::problem::make_problem;

    fn membrane() -> DesignProblem {
        make_problem(&ModelParams::Membrane(MembraneParams::default()), None).unwrap()
    }

    fn catalyst() -> DesignProblem {
        make_problem(&ModelParams::CatalystLayer(CatalystParams::default()), None).unwrap()
    }

    #[test]
    fn weighted_sum_is_dot_product() {
        let w = vec![0.1, 0.2, 0.3, 0.4];
        let s = Scalarized::weighted_sum(membrane(), w.clone()).unwrap();
        let x = [120e-6, 1.7];

        let f = membrane().evaluate(&x).objectives;
        let expected: f64 = w.iter().zip(&f).map(|(w, f)| w * f).sum();
        let e = s.evaluate(&x);
        assert_eq!(e.objectives, vec![expected]);
        assert_eq!(e.constraints, membrane().evaluate(&x).constraints);
    }

    #[test]
    fn goal_seeking_is_squared_distance() {
        let goals = vec![10.0, 0.5];
        let s = Scalarized::goal_seeking(catalyst(), goals.clone()).unwrap();
        let x = [1e-3, 0.5, 1e6, 2e-3, 0.4, 2e6];

        let base = catalyst().evaluate(&x);
        let expected: f64 = base.objectives.iter().zip(&goals).map(|(f, g)| (f - g).powi(2)).sum();
        let e = s.evaluate(&x);
        assert_eq!(e.objectives, vec![expected]);
        assert_eq!(e.constraints, base.constraints);
    }

    #[test]
    fn adapter_rederives_shape_from_base() {
        let s = make_scalarized(catalyst(), ScalarMode::WeightedSum, &ScalarParams::default()).unwrap();
        assert_eq!(s.n_objectives(), 1);
        assert_eq!(s.n_variables(), 6);
        assert_eq!(s.n_constraints(), 22);
        assert_eq!(s.bounds(), catalyst().bounds());
        assert_eq!(s.coefficients(), &[0.5, 0.5]);
    }

    #[test]
    fn coefficient_length_must_match() {
        let err = Scalarized::weighted_sum(membrane(), vec![0.5, 0.5]).unwrap_err();
        assert_eq!(
            err,
            Error::ScalarLength {
                what: "weights",
                expected: 4,
                found: 2
            }
        );
    }

    #[test]
    fn unparseable_text_falls_back_to_defaults() {
        let params = ScalarParams::parse(Some("0.2, abc, 0.3"), Some("-0.1,, 3"));
        assert_eq!(params, ScalarParams::default());

        let problem = membrane();
        assert_eq!(params.resolve(&problem, ScalarMode::WeightedSum), vec![0.25; 4]);
        assert_eq!(
            params.resolve(&problem, ScalarMode::GoalSeeking),
            vec![-0.1, -15_000.0, 15.0, 3.0]
        );
    }

    #[test]
    fn parsed_text_is_used() {
        let params = ScalarParams::parse(Some(" 0.7 , 0.3 "), None);
        assert_eq!(params.resolve(&catalyst(), ScalarMode::WeightedSum), vec![0.7, 0.3]);
        assert_eq!(params.resolve(&catalyst(), ScalarMode::GoalSeeking), vec![10.0, 0.5]);
    }

    #[test]
    fn mode_names_parse_loosely() {
        assert_eq!("Weighted Sum".parse::<ScalarMode>().unwrap(), ScalarMode::WeightedSum);
        assert_eq!("goal_seeking".parse::<ScalarMode>().unwrap(), ScalarMode::GoalSeeking);
        assert!(matches!(
            "pareto".parse::<ScalarMode>(),
            Err(Error::UnknownScalarization(_))
        ));
    }
}
