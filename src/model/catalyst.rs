//! Catalyst-layer model.
//!
//! Design vector: `[delta_a, eps_a, s_cat_a, delta_c, eps_c, s_cat_c]`, the
//! anode and cathode layer thickness (cm), porosity (-) and specific surface
//! area (cm²/g).
//!
//! Objectives: `[total_cost, total_overpotential]`. Constraints: 9 per
//! electrode, 3 global, and 1 hard mass-transport limit (22 in total).
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use super::{Evaluation, PENALTY};

pub const N_VARIABLES: usize = 6;
pub const N_OBJECTIVES: usize = 2;
pub const N_CONSTRAINTS: usize = 22;

pub const VARIABLE_NAMES: [&str; N_VARIABLES] =
    ["delta_a", "eps_a", "S_cat_a", "delta_c", "eps_c", "S_cat_c"];
pub const OBJECTIVE_NAMES: [&str; N_OBJECTIVES] = ["cost", "overpotential"];
/// Positions of `delta_a` and `delta_c` in the design vector.
pub const THICKNESS_INDICES: [usize; 2] = [0, 3];

/// Smallest geometric exchange current density the Tafel term accepts.
const J0_GEO_FLOOR: f64 = 1e-15;
/// Smallest `1 - j/j_lim` the concentration term accepts.
const TRANSPORT_FLOOR: f64 = 1e-15;
/// Regularizes the thickness in the hard limiting-current constraint.
const DELTA_EPS: f64 = 1e-15;

/// Material, transport and design limits of a single electrode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectrodeParams {
    /// Catalyst density in the layer (g/cm³)
    pub rho_cat: f64,
    /// Catalyst cost ($/g)
    pub c_cat: f64,
    /// Exchange current density per active area (A/cm²)
    pub j0: f64,
    /// Bulk reactant concentration (mol/cm³)
    pub c_bulk: f64,
    /// Free-medium diffusivity (cm²/s)
    pub d: f64,
    /// Tortuosity (-)
    pub tau: f64,
    pub eps_min: f64,
    pub eps_max: f64,
    /// Layer thickness limits (cm)
    pub delta_min: f64,
    pub delta_max: f64,
    /// Specific surface area limits (cm²/g)
    pub s_cat_min: f64,
    pub s_cat_max: f64,
    /// Catalyst loading limits (g/cm²)
    pub loading_min: f64,
    pub loading_max: f64,
    /// Minimum effective active area `S_cat * (1 - eps) * delta`
    pub active_area_min: f64,
}

impl ElectrodeParams {
    /// Iridium-oxide anode.
    pub fn anode() -> Self {
        Self {
            rho_cat: 1.2,
            c_cat: 150.0,
            j0: 1e-6,
            c_bulk: 0.0555,
            d: 2e-5,
            tau: 1.5,
            eps_min: 0.3,
            eps_max: 0.7,
            delta_min: 5e-4,
            delta_max: 3e-3,
            s_cat_min: 5e5,
            s_cat_max: 8e6,
            loading_min: 1e-4,
            loading_max: 2e-3,
            active_area_min: 100.0,
        }
    }

    /// Platinum cathode.
    pub fn cathode() -> Self {
        Self {
            rho_cat: 0.4,
            c_cat: 30.0,
            j0: 1e-4,
            c_bulk: 1e-3,
            d: 4.5e-5,
            tau: 1.5,
            eps_min: 0.3,
            eps_max: 0.7,
            delta_min: 5e-4,
            delta_max: 3e-3,
            s_cat_min: 5e5,
            s_cat_max: 8e6,
            loading_min: 5e-5,
            loading_max: 4e-4,
            active_area_min: 100.0,
        }
    }

    /// Catalyst loading `rho_cat * delta * (1 - eps)` (g/cm²).
    pub fn loading(&self, delta: f64, eps: f64) -> f64 {
        self.rho_cat * delta * (1.0 - eps)
    }

    /// Catalyst cost of the layer over the cell area ($).
    pub fn cost(&self, delta: f64, eps: f64, a_cell: f64) -> f64 {
        self.loading(delta, eps) * a_cell * self.c_cat
    }

    /// Design-variable bounds `[delta, eps, s_cat]` implied by the limits.
    pub fn variable_bounds(&self) -> ([f64; 3], [f64; 3]) {
        (
            [self.delta_min, self.eps_min, self.s_cat_min],
            [self.delta_max, self.eps_max, self.s_cat_max],
        )
    }
}

/// Merge a partial electrode table onto `base`, so an override only needs to
/// name the fields it changes.
fn merge_electrode<'de, D>(deserializer: D, base: ElectrodeParams) -> Result<ElectrodeParams, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = toml::Table::deserialize(deserializer)?;
    let mut merged = toml::Table::try_from(base).map_err(D::Error::custom)?;
    merged.extend(overrides);
    merged.try_into().map_err(D::Error::custom)
}

fn anode_overrides<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ElectrodeParams, D::Error> {
    merge_electrode(deserializer, ElectrodeParams::anode())
}

fn cathode_overrides<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ElectrodeParams, D::Error> {
    merge_electrode(deserializer, ElectrodeParams::cathode())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalystParams {
    /// Active cell area (cm²)
    pub a_cell: f64,
    /// Operating current density (A/cm²)
    pub j: f64,
    /// Gas constant (J/(mol·K))
    pub r: f64,
    /// Temperature (K)
    pub t: f64,
    /// Charge transfer coefficient (-)
    pub alpha: f64,
    /// Electrons per reaction
    pub n: f64,
    /// Faraday constant (C/mol)
    pub f: f64,
    /// Maximum total overpotential (V)
    pub eta_max: f64,
    pub j_min: f64,
    pub j_max: f64,
    #[serde(deserialize_with = "anode_overrides")]
    pub anode: ElectrodeParams,
    #[serde(deserialize_with = "cathode_overrides")]
    pub cathode: ElectrodeParams,
}

impl Default for CatalystParams {
    fn default() -> Self {
        Self {
            a_cell: 25.0,
            j: 1.5,
            r: 8.314,
            t: 353.15,
            alpha: 0.5,
            n: 2.0,
            f: 96_485.0,
            eta_max: 0.6,
            j_min: 0.5,
            j_max: 2.0,
            anode: ElectrodeParams::anode(),
            cathode: ElectrodeParams::cathode(),
        }
    }
}

impl CatalystParams {
    /// Decision bounds derived from the electrode design limits.
    pub fn default_bounds(&self) -> (Vec<f64>, Vec<f64>) {
        let (al, au) = self.anode.variable_bounds();
        let (cl, cu) = self.cathode.variable_bounds();
        (
            al.iter().chain(cl.iter()).copied().collect(),
            au.iter().chain(cu.iter()).copied().collect(),
        )
    }
}

/// Tafel term of one electrode, or `None` when `j0_geo` or the log argument
/// falls at or below its floor.
fn tafel(
    j: f64,
    electrode: &ElectrodeParams,
    s_cat: f64,
    eps: f64,
    delta: f64,
    p: &CatalystParams,
) -> Option<f64> {
    let loading = electrode.loading(delta, eps);
    let j0_geo = electrode.j0 * s_cat * loading * (1.0 - eps);
    if !(j0_geo > J0_GEO_FLOOR) {
        return None;
    }

    let ratio = j / j0_geo;
    if !(ratio > 0.0) {
        return None;
    }
    Some((p.r * p.t / (p.alpha * p.n * p.f)) * ratio.ln())
}

/// Tafel activation overpotential (V), or [`PENALTY`] when the log argument
/// is undefined.
pub fn activation_overpotential(
    j: f64,
    electrode: &ElectrodeParams,
    s_cat: f64,
    eps: f64,
    delta: f64,
    p: &CatalystParams,
) -> f64 {
    tafel(j, electrode, s_cat, eps, delta, p).unwrap_or(PENALTY)
}

/// Limiting current density `n F D_eff C_bulk / delta` (A/cm²).
pub fn limiting_current(electrode: &ElectrodeParams, eps: f64, delta: f64, p: &CatalystParams) -> f64 {
    let d_eff = electrode.d * (eps / electrode.tau);
    p.n * p.f * d_eff * electrode.c_bulk / delta
}

/// Concentration overpotential (V), or [`PENALTY`] when the operating current
/// reaches the limiting current. An undefined limit (zero porosity over zero
/// thickness) is penalized the same way.
pub fn concentration_overpotential(
    j: f64,
    electrode: &ElectrodeParams,
    eps: f64,
    delta: f64,
    p: &CatalystParams,
) -> f64 {
    let j_lim = limiting_current(electrode, eps, delta, p);
    if !(j_lim > j) || !(j_lim > 0.0) {
        return PENALTY;
    }

    let part = 1.0 - j / j_lim;
    if !(part > TRANSPORT_FLOOR) {
        return PENALTY;
    }
    (p.r * p.t / (p.n * p.f)) * part.ln()
}

/// Activation plus concentration overpotential of one electrode (V). A
/// degenerate activation term makes the whole electrode [`PENALTY`]; the
/// concentration term is not added on top.
pub fn electrode_overpotential(
    j: f64,
    electrode: &ElectrodeParams,
    s_cat: f64,
    eps: f64,
    delta: f64,
    p: &CatalystParams,
) -> f64 {
    match tafel(j, electrode, s_cat, eps, delta, p) {
        Some(eta_act) => eta_act + concentration_overpotential(j, electrode, eps, delta, p),
        None => PENALTY,
    }
}

/// The nine design-limit residuals of one electrode, in the order porosity,
/// thickness, specific surface area, effective active area, loading.
fn electrode_constraints(e: &ElectrodeParams, delta: f64, eps: f64, s_cat: f64) -> [f64; 9] {
    let active_area = s_cat * (1.0 - eps) * delta;
    let loading = e.loading(delta, eps);
    [
        e.eps_min - eps,
        eps - e.eps_max,
        e.delta_min - delta,
        delta - e.delta_max,
        e.s_cat_min - s_cat,
        s_cat - e.s_cat_max,
        e.active_area_min - active_area,
        e.loading_min - loading,
        loading - e.loading_max,
    ]
}

/// Limiting current used by the hard transport constraint. The thickness is
/// regularized so a zero-thickness layer yields a huge limit instead of a
/// division by zero.
fn transport_limit(e: &ElectrodeParams, eps: f64, delta: f64, p: &CatalystParams) -> f64 {
    p.n * p.f * (eps / e.tau) * e.d * e.c_bulk / (delta + DELTA_EPS)
}

pub fn evaluate(x: &[f64], p: &CatalystParams) -> Evaluation {
    let (delta_a, eps_a, s_cat_a) = (x[0], x[1], x[2]);
    let (delta_c, eps_c, s_cat_c) = (x[3], x[4], x[5]);

    let cost = p.anode.cost(delta_a, eps_a, p.a_cell) + p.cathode.cost(delta_c, eps_c, p.a_cell);
    let eta = electrode_overpotential(p.j, &p.anode, s_cat_a, eps_a, delta_a, p)
        + electrode_overpotential(p.j, &p.cathode, s_cat_c, eps_c, delta_c, p);

    let mut constraints = Vec::with_capacity(N_CONSTRAINTS);
    constraints.extend(electrode_constraints(&p.anode, delta_a, eps_a, s_cat_a));
    constraints.extend(electrode_constraints(&p.cathode, delta_c, eps_c, s_cat_c));
    constraints.push(p.j_min - p.j);
    constraints.push(p.j - p.j_max);
    constraints.push(eta - p.eta_max);

    let j_lim = transport_limit(&p.anode, eps_a, delta_a, p)
        .min(transport_limit(&p.cathode, eps_c, delta_c, p));
    constraints.push(p.j - j_lim);

    Evaluation {
        objectives: vec![cost, eta],
        constraints,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn nominal() -> [f64; 6] {
        [1e-3, 0.5, 1e6, 1e-3, 0.5, 1e6]
    }

    #[test]
    fn nominal_design_is_feasible() {
        let p = CatalystParams::default();
        let e = evaluate(&nominal(), &p);

        assert_eq!(e.objectives.len(), N_OBJECTIVES);
        assert_eq!(e.constraints.len(), N_CONSTRAINTS);
        for (i, g) in e.constraints.iter().enumerate() {
            assert!(*g <= 0.0, "constraint G{} violated: {}", i + 1, g);
        }
        assert!(e.objectives[1] > 0.0 && e.objectives[1] < p.eta_max);
    }

    #[test]
    fn cost_sums_both_electrodes() {
        let p = CatalystParams::default();
        let e = evaluate(&nominal(), &p);

        let anode = 1.2 * 1e-3 * 0.5 * 25.0 * 150.0;
        let cathode = 0.4 * 1e-3 * 0.5 * 25.0 * 30.0;
        assert_relative_eq!(e.objectives[0], anode + cathode, max_relative = 1e-12);
    }

    #[test]
    fn activation_matches_tafel_form() {
        let p = CatalystParams::default();
        let (s, eps, delta) = (1e6, 0.5, 1e-3);
        let j0_geo = p.anode.j0 * s * (1.2 * delta * (1.0 - eps)) * (1.0 - eps);
        let expected = p.r * p.t / (p.alpha * p.n * p.f) * (p.j / j0_geo).ln();

        let got = activation_overpotential(p.j, &p.anode, s, eps, delta, &p);
        assert_relative_eq!(got, expected, max_relative = 1e-12);
    }

    #[test]
    fn degenerate_exchange_current_is_penalized() {
        let p = CatalystParams::default();
        // Fully porous layer: no active area, j0_geo = 0.
        assert_eq!(activation_overpotential(p.j, &p.anode, 1e6, 1.0, 1e-3, &p), PENALTY);
        // Zero specific surface area.
        assert_eq!(activation_overpotential(p.j, &p.anode, 0.0, 0.5, 1e-3, &p), PENALTY);
        // Non-positive operating current makes the log argument non-positive.
        assert_eq!(activation_overpotential(0.0, &p.anode, 1e6, 0.5, 1e-3, &p), PENALTY);
    }

    #[test]
    fn transport_limit_is_penalized() {
        let p = CatalystParams::default();
        let j_lim = limiting_current(&p.cathode, 0.5, 1e-3, &p);

        assert_eq!(concentration_overpotential(j_lim, &p.cathode, 0.5, 1e-3, &p), PENALTY);
        assert_eq!(concentration_overpotential(2.0 * j_lim, &p.cathode, 0.5, 1e-3, &p), PENALTY);
        // Zero porosity: no effective diffusivity.
        assert_eq!(concentration_overpotential(p.j, &p.cathode, 0.0, 1e-3, &p), PENALTY);

        let below = concentration_overpotential(0.5 * j_lim, &p.cathode, 0.5, 1e-3, &p);
        assert_relative_eq!(below, p.r * p.t / (p.n * p.f) * 0.5_f64.ln(), max_relative = 1e-12);
    }

    #[test]
    fn degenerate_activation_penalizes_whole_electrode() {
        let p = CatalystParams::default();
        assert_eq!(electrode_overpotential(p.j, &p.anode, 0.0, 0.5, 1e-3, &p), PENALTY);
        // Concentration term is degenerate as well: still a single penalty.
        assert_eq!(electrode_overpotential(p.j, &p.anode, 0.0, 0.0, 1e-3, &p), PENALTY);

        let act = activation_overpotential(p.j, &p.anode, 1e6, 0.5, 1e-3, &p);
        let conc = concentration_overpotential(p.j, &p.anode, 0.5, 1e-3, &p);
        assert_eq!(electrode_overpotential(p.j, &p.anode, 1e6, 0.5, 1e-3, &p), act + conc);
    }

    #[test]
    fn zero_thickness_and_porosity_stay_finite() {
        let p = CatalystParams::default();
        assert!(limiting_current(&p.anode, 0.0, 0.0, &p).is_nan());
        assert_eq!(concentration_overpotential(p.j, &p.anode, 0.0, 0.0, &p), PENALTY);

        let e = evaluate(&[0.0, 0.0, 1e6, 1e-3, 0.5, 1e6], &p);
        assert!(e.objectives.iter().all(|v| v.is_finite()), "{:?}", e.objectives);
        assert!(e.objectives[1] >= PENALTY);
    }

    #[test]
    fn constraint_layout() {
        let p = CatalystParams::default();
        // Anode porosity above its limit, cathode thickness below its limit.
        let x = [1e-3, 0.8, 1e6, 1e-4, 0.5, 1e6];
        let g = evaluate(&x, &p).constraints;

        assert_relative_eq!(g[1], 0.8 - 0.7, max_relative = 1e-12);
        assert!(g[0] < 0.0);
        assert_relative_eq!(g[9 + 2], 5e-4 - 1e-4, max_relative = 1e-12);
        assert_relative_eq!(g[18], p.j_min - p.j);
        assert_relative_eq!(g[19], p.j - p.j_max);
    }

    #[test]
    fn hard_transport_uses_weaker_electrode() {
        let p = CatalystParams::default();
        let x = nominal();
        let g = evaluate(&x, &p).constraints;

        let lim_a = p.n * p.f * (0.5 / 1.5) * p.anode.d * p.anode.c_bulk / (1e-3 + 1e-15);
        let lim_c = p.n * p.f * (0.5 / 1.5) * p.cathode.d * p.cathode.c_bulk / (1e-3 + 1e-15);
        assert!(lim_c < lim_a);
        assert_relative_eq!(g[21], p.j - lim_c, max_relative = 1e-12);
    }

    #[test]
    fn electrode_overrides_merge_onto_their_own_defaults() {
        let p: CatalystParams = toml::from_str(
            "j = 1.2\n[cathode]\nc_cat = 45.0\n",
        )
        .unwrap();

        assert_eq!(p.j, 1.2);
        assert_eq!(p.cathode.c_cat, 45.0);
        assert_eq!(p.cathode.rho_cat, ElectrodeParams::cathode().rho_cat);
        assert_eq!(p.anode, ElectrodeParams::anode());
    }

    #[test]
    fn default_bounds_follow_limits() {
        let p = CatalystParams::default();
        let (lower, upper) = p.default_bounds();
        assert_eq!(lower, vec![5e-4, 0.3, 5e5, 5e-4, 0.3, 5e5]);
        assert_eq!(upper, vec![3e-3, 0.7, 8e6, 3e-3, 0.7, 8e6]);
    }
}
