//! TOML run configuration for the command-line interface.
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use pemopt::driver::{Method, OptimizationRequest};
use pemopt::model::{CatalystParams, MembraneParams, ModelParams};
use pemopt::problem::Bounds;
use pemopt::scalarize::{parse_list, ScalarParams};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Root {
    pub run: Run,
    pub membrane: Option<MembraneParams>,
    pub catalyst: Option<CatalystParams>,
    pub bounds: Option<BoundsSection>,
    pub scalar: Option<Scalar>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Run {
    /// Design level: "membrane" or "catalyst_layer"
    #[serde(default = "default_problem")]
    pub problem: String,
    /// "NSGA2", "MOEA/D", "SPEA2", "Weighted Sum" or "Goal Seeking"
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_pop_size")]
    pub pop_size: usize,
    #[serde(default = "default_generations")]
    pub generations: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_problem() -> String {
    "membrane".to_string()
}
fn default_method() -> String {
    "NSGA2".to_string()
}
fn default_pop_size() -> usize { 100 }
fn default_generations() -> usize { 100 }
fn default_seed() -> u64 { 1 }

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoundsSection {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Weights or goals, given either as `"0.5, 0.5"` or as `[0.5, 0.5]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ScalarEntry {
    Values(Vec<f64>),
    Text(String),
}

impl ScalarEntry {
    fn resolve(&self, what: &str) -> Option<Vec<f64>> {
        match self {
            ScalarEntry::Values(v) => Some(v.clone()),
            ScalarEntry::Text(t) => parse_list(what, t),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Scalar {
    pub weights: Option<ScalarEntry>,
    pub goals: Option<ScalarEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    Membrane,
    CatalystLayer,
}

impl Root {
    pub fn load(path: &str) -> Result<(Self, String)> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path))?;
        let cfg: Root = toml::from_str(&text)
            .with_context(|| format!("failed to parse config: {}", path))?;
        cfg.validate()
            .with_context(|| format!("invalid config: {}", path))?;
        Ok((cfg, text))
    }

    pub fn problem_kind(&self) -> Result<ProblemKind> {
        match self.run.problem.to_ascii_lowercase().replace('-', "_").as_str() {
            "membrane" => Ok(ProblemKind::Membrane),
            "catalyst" | "catalyst_layer" => Ok(ProblemKind::CatalystLayer),
            other => bail!("run.problem must be 'membrane' or 'catalyst_layer', got '{}'", other),
        }
    }

    pub fn method(&self) -> Result<Method> {
        self.run
            .method
            .parse::<Method>()
            .with_context(|| "run.method")
    }

    pub fn model_params(&self) -> Result<ModelParams> {
        Ok(match self.problem_kind()? {
            ProblemKind::Membrane => ModelParams::Membrane(self.membrane.clone().unwrap_or_default()),
            ProblemKind::CatalystLayer => {
                ModelParams::CatalystLayer(self.catalyst.clone().unwrap_or_default())
            }
        })
    }

    pub fn bounds(&self) -> Result<Option<Bounds>> {
        match &self.bounds {
            Some(b) => Ok(Some(Bounds::new(b.lower.clone(), b.upper.clone()).context("[bounds]")?)),
            None => Ok(None),
        }
    }

    pub fn scalar_params(&self) -> ScalarParams {
        let scalar = self.scalar.clone().unwrap_or_default();
        ScalarParams {
            weights: scalar.weights.as_ref().and_then(|w| w.resolve("weights")),
            goals: scalar.goals.as_ref().and_then(|g| g.resolve("goals")),
        }
    }

    pub fn request(&self) -> Result<OptimizationRequest> {
        Ok(OptimizationRequest {
            method: self.method()?,
            params: self.model_params()?,
            bounds: self.bounds()?,
            scalar: self.scalar_params(),
            pop_size: self.run.pop_size,
            generations: self.run.generations,
            seed: self.run.seed,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let kind = self.problem_kind()?;
        self.method()?;

        if self.run.pop_size == 0 || self.run.pop_size > 100_000 {
            bail!("run.pop_size must be in [1, 100000]");
        }
        if self.run.generations == 0 || self.run.generations > 1_000_000 {
            bail!("run.generations must be in [1, 1000000]");
        }

        match kind {
            ProblemKind::Membrane if self.catalyst.is_some() => {
                bail!("[catalyst] section given but run.problem is membrane");
            }
            ProblemKind::CatalystLayer if self.membrane.is_some() => {
                bail!("[membrane] section given but run.problem is catalyst_layer");
            }
            _ => {}
        }

        if let Some(ref m) = self.membrane {
            if m.t_mech_min <= 0.0 {
                bail!("membrane.t_mech_min must be positive");
            }
            if m.hhv_h2 <= 0.0 || m.rho <= 0.0 {
                bail!("membrane.hhv_h2 and membrane.rho must be positive");
            }
        }

        if let Some(ref c) = self.catalyst {
            if c.t <= 0.0 {
                bail!("catalyst.t must be positive (kelvin)");
            }
            if c.alpha <= 0.0 || c.n <= 0.0 || c.f <= 0.0 {
                bail!("catalyst.alpha, catalyst.n and catalyst.f must be positive");
            }
            if c.j_min > c.j_max {
                bail!("catalyst.j_min must be <= catalyst.j_max");
            }
            if c.a_cell <= 0.0 {
                bail!("catalyst.a_cell must be positive");
            }
        }

        // Bounds and encoder shape are checked by building the problem.
        let params = self.model_params()?;
        pemopt::make_problem(&params, self.bounds()?)?;

        // Lengths of explicit weights/goals are checked against the objective count.
        let scalar = self.scalar_params();
        for (what, values) in [("scalar.weights", &scalar.weights), ("scalar.goals", &scalar.goals)] {
            if let Some(v) = values {
                if v.len() != params.n_objectives() {
                    bail!(
                        "{} has {} entries, expected {} for {}",
                        what,
                        v.len(),
                        params.n_objectives(),
                        self.run.problem
                    );
                }
            }
        }

        Ok(())
    }
}
