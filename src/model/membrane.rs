//! Membrane-level model.
//!
//! Design vector: `[t, j]` with `t` the membrane thickness (m) and `j` the
//! operating current density (A/cm²).
//!
//! Objectives (per unit area, minimized):
//! - `f1 = -eta` negative energy efficiency
//! - `f2 = -L` negative lifetime (h)
//! - `f3` capital cost ($/m²)
//! - `f4` environmental impact (kg CO₂-eq/m²)
//!
//! Constraint: `g1 = t_mech_min - t` (mechanical durability).
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

use serde::{Deserialize, Serialize};

use super::Evaluation;

pub const N_VARIABLES: usize = 2;
pub const N_OBJECTIVES: usize = 4;
pub const N_CONSTRAINTS: usize = 1;

pub const VARIABLE_NAMES: [&str; N_VARIABLES] = ["thickness_m", "current_density_A_cm2"];
pub const OBJECTIVE_NAMES: [&str; N_OBJECTIVES] =
    ["neg_efficiency", "neg_lifetime_h", "capital_cost", "environmental_impact"];

/// Default decision bounds: `t` in [50, 300] µm, `j` in [0.5, 3.0] A/cm².
pub const DEFAULT_LOWER: [f64; N_VARIABLES] = [50e-6, 0.5];
pub const DEFAULT_UPPER: [f64; N_VARIABLES] = [300e-6, 3.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MembraneParams {
    /// Higher heating value of H₂ (J/mol)
    pub hhv_h2: f64,
    /// Production rate scale (mol/(s·(A/cm²)))
    pub alpha: f64,
    /// Thickness attenuation of the production rate (1/m)
    pub beta: f64,
    /// Base cell voltage (V)
    pub v_base: f64,
    /// Current density voltage coefficient (V per A/cm²)
    pub k1: f64,
    /// Inverse thickness voltage coefficient (V·m)
    pub k2: f64,
    /// Baseline lifetime (h)
    pub l_base: f64,
    /// Lifetime gain per micron of thickness (h/µm)
    pub k3: f64,
    /// Ionomer cost ($/kg)
    pub c_ionomer: f64,
    /// Membrane density (kg/m³)
    pub rho: f64,
    /// Manufacturing cost ($/m²)
    pub c_manuf: f64,
    /// Environmental impact factor (kg CO₂-eq/kg)
    pub c_e: f64,
    /// Minimum thickness for mechanical durability (m)
    pub t_mech_min: f64,
}

impl Default for MembraneParams {
    fn default() -> Self {
        Self {
            hhv_h2: 285_000.0,
            alpha: 1e-6,
            beta: 100.0,
            v_base: 1.3,
            k1: 0.005,
            k2: 0.1,
            l_base: 10_000.0,
            k3: 10.0,
            c_ionomer: 300.0,
            rho: 2000.0,
            c_manuf: 20.0,
            c_e: 10.0,
            t_mech_min: 158e-6,
        }
    }
}

/// Intermediate physical quantities of a membrane design.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MembraneState {
    /// Cell voltage (V)
    pub voltage: f64,
    /// Hydrogen production rate (mol/s)
    pub production_rate: f64,
    /// Energy efficiency (-)
    pub efficiency: f64,
    /// Lifetime (h)
    pub lifetime: f64,
    /// Capital cost ($/m²)
    pub capital_cost: f64,
    /// Environmental impact (kg CO₂-eq/m²)
    pub environmental_impact: f64,
}

impl MembraneState {
    /// Compute the physical state at thickness `t` (m) and current density `j` (A/cm²).
    ///
    /// `t` and `j` must be non-zero; bounds keep both away from zero.
    pub fn compute(t: f64, j: f64, p: &MembraneParams) -> Self {
        let voltage = p.v_base + p.k1 * j + p.k2 / t;
        let production_rate = p.alpha * j / (1.0 + p.beta * t);
        let efficiency = (p.hhv_h2 * production_rate) / (voltage * j);
        let lifetime = p.l_base + p.k3 * (t * 1e6);
        let capital_cost = p.c_ionomer * p.rho * t + p.c_manuf;
        let environmental_impact = p.c_e * p.rho * t;

        Self {
            voltage,
            production_rate,
            efficiency,
            lifetime,
            capital_cost,
            environmental_impact,
        }
    }

    pub fn objectives(&self) -> Vec<f64> {
        vec![
            -self.efficiency,
            -self.lifetime,
            self.capital_cost,
            self.environmental_impact,
        ]
    }
}

/// Mechanical durability residual: feasible iff `t >= t_mech_min`.
pub fn mechanical_constraint(t: f64, p: &MembraneParams) -> f64 {
    p.t_mech_min - t
}

pub fn evaluate(x: &[f64], p: &MembraneParams) -> Evaluation {
    let (t, j) = (x[0], x[1]);
    let state = MembraneState::compute(t, j, p);
    Evaluation {
        objectives: state.objectives(),
        constraints: vec![mechanical_constraint(t, p)],
    }
}
