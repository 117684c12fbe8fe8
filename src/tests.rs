//! Crate-level test suite.
//!
//! Includes:
//! - Regression tests for the default membrane scenario
//! - Property tests on the objective models
//! - End-to-end optimization runs for every method

use approx::assert_relative_eq;
use proptest::prelude::*;

use crate::driver::{run_optimization, run_optimization_with, Method, OptimizationRequest};
use crate::error::Error;
use crate::model::catalyst::{self, activation_overpotential, concentration_overpotential};
use crate::model::{membrane, CatalystParams, MembraneParams, ModelParams, PENALTY};
use crate::problem::{evaluate, make_problem, Bounds, Problem};
use crate::results::ResultTable;
use crate::scalarize::{make_scalarized, ScalarMode, ScalarParams};

fn membrane_params() -> ModelParams {
    ModelParams::Membrane(MembraneParams::default())
}

fn catalyst_params() -> ModelParams {
    ModelParams::CatalystLayer(CatalystParams::default())
}

fn request(method: Method, params: ModelParams) -> OptimizationRequest {
    OptimizationRequest {
        pop_size: 20,
        generations: 8,
        seed: 17,
        ..OptimizationRequest::new(method, params)
    }
}

const ALL_METHODS: [Method; 5] = [
    Method::Nsga2,
    Method::Moead,
    Method::Spea2,
    Method::WeightedSum,
    Method::GoalSeeking,
];

// =============================================================================
// Regression Tests
// =============================================================================

#[test]
fn test_default_membrane_scenario() {
    let e = evaluate(&[158e-6, 1.0], &membrane_params()).unwrap();

    assert_eq!(e.constraints, vec![0.0]);
    assert_relative_eq!(e.objectives[2], 114.8, max_relative = 1e-12);
    assert_relative_eq!(e.objectives[3], 3.16, max_relative = 1e-12);
}

#[test]
fn test_mechanical_constraint_examples() {
    let p = membrane_params();

    let thin = evaluate(&[100e-6, 1.0], &p).unwrap();
    assert!(thin.constraints[0] > 0.0);
    assert_relative_eq!(thin.constraints[0], 58e-6, max_relative = 1e-9);

    let thick = evaluate(&[200e-6, 1.0], &p).unwrap();
    assert!(thick.constraints[0] <= 0.0);
    assert_relative_eq!(thick.constraints[0], -42e-6, max_relative = 1e-9);
}

#[test]
fn test_wrong_design_length_is_reported() {
    let err = evaluate(&[1e-3, 0.5], &catalyst_params()).unwrap_err();
    assert_eq!(err, Error::DesignLength { expected: 6, found: 2 });
    assert!(evaluate(&[158e-6, 1.0, 0.0], &membrane_params()).is_err());
}

#[test]
fn test_catalyst_shape() {
    let p = make_problem(&catalyst_params(), None).unwrap();
    let (lower, _) = CatalystParams::default().default_bounds();
    let e = p.evaluate(&lower);
    assert_eq!(e.objectives.len(), catalyst::N_OBJECTIVES);
    assert_eq!(e.constraints.len(), catalyst::N_CONSTRAINTS);
}

// =============================================================================
// Penalty Containment
// =============================================================================

#[test]
fn test_zero_surface_area_substitutes_penalty() {
    let p = CatalystParams::default();
    let eta = activation_overpotential(p.j, &p.anode, 0.0, 0.5, 1e-3, &p);
    assert_eq!(eta, PENALTY);

    // full model still returns a complete evaluation
    let e = catalyst::evaluate(&[1e-3, 0.5, 0.0, 1e-3, 0.5, 1e6], &p);
    assert_eq!(e.constraints.len(), catalyst::N_CONSTRAINTS);
    assert!(e.objectives[1] >= PENALTY);
    assert!(e.objectives.iter().all(|v| v.is_finite()));
}

#[test]
fn test_degenerate_layer_is_penalized_once_per_electrode() {
    let p = CatalystParams::default();
    let anode = catalyst::electrode_overpotential(p.j, &p.anode, 0.0, 0.5, 1e-3, &p);
    assert_eq!(anode, PENALTY);

    // Zero-thickness, zero-porosity anode: no NaN reaches the objectives.
    let e = evaluate(&[0.0, 0.0, 1e6, 1e-3, 0.5, 1e6], &catalyst_params()).unwrap();
    assert!(e.objectives.iter().all(|v| v.is_finite()));
    assert!(e.objectives[1] >= PENALTY && e.objectives[1] < 2.0 * PENALTY);
}

#[test]
fn test_zero_thickness_bounds_are_rejected() {
    let (mut lower, upper) = CatalystParams::default().default_bounds();
    lower[0] = 0.0;
    let bounds = Bounds::new(lower, upper).unwrap();
    let err = make_problem(&catalyst_params(), Some(bounds)).unwrap_err();
    assert_eq!(err, Error::NonPositiveBound { index: 0, lower: 0.0 });
}

#[test]
fn test_transport_limit_substitutes_penalty() {
    let p = CatalystParams {
        j: 50.0,
        ..CatalystParams::default()
    };
    let eta = concentration_overpotential(p.j, &p.cathode, 0.3, 3e-3, &p);
    assert_eq!(eta, PENALTY);
}

proptest! {
    #[test]
    fn test_catalyst_evaluation_is_total(
        delta_a in 0.0_f64..1e-2,
        eps_a in 0.0_f64..1.0,
        s_a in 0.0_f64..1e7,
        delta_c in 0.0_f64..1e-2,
        eps_c in 0.0_f64..1.0,
        s_c in 0.0_f64..1e7,
    ) {
        let e = catalyst::evaluate(&[delta_a, eps_a, s_a, delta_c, eps_c, s_c], &CatalystParams::default());
        prop_assert_eq!(e.constraints.len(), catalyst::N_CONSTRAINTS);
        prop_assert!(!e.objectives[0].is_nan());
        prop_assert!(!e.objectives[1].is_nan());
    }

    #[test]
    fn test_lifetime_improves_with_thickness(
        t in 50e-6_f64..299e-6,
        dt in 1e-7_f64..1e-6,
        j in 0.5_f64..3.0,
    ) {
        let p = membrane_params();
        let thin = evaluate(&[t, j], &p).unwrap();
        let thick = evaluate(&[t + dt, j], &p).unwrap();
        prop_assert!(thick.objectives[1] < thin.objectives[1]);
    }

    #[test]
    fn test_scalarization_consistency(
        t in 50e-6_f64..300e-6,
        j in 0.5_f64..3.0,
        w in proptest::collection::vec(0.0_f64..1.0, membrane::N_OBJECTIVES),
        goals in proptest::collection::vec(-1e4_f64..1e4, membrane::N_OBJECTIVES),
    ) {
        let base = make_problem(&membrane_params(), None).unwrap();
        let x = [t, j];
        let f = base.evaluate(&x);

        let ws = make_scalarized(base.clone(), ScalarMode::WeightedSum, &ScalarParams {
            weights: Some(w.clone()),
            goals: None,
        }).unwrap();
        let dot: f64 = w.iter().zip(&f.objectives).map(|(w, f)| w * f).sum();
        let e = ws.evaluate(&x);
        prop_assert_eq!(e.objectives[0], dot);
        prop_assert_eq!(&e.constraints, &f.constraints);

        let gs = make_scalarized(base, ScalarMode::GoalSeeking, &ScalarParams {
            weights: None,
            goals: Some(goals.clone()),
        }).unwrap();
        let dist: f64 = f.objectives.iter().zip(&goals).map(|(f, g)| (f - g).powi(2)).sum();
        let e = gs.evaluate(&x);
        prop_assert_eq!(e.objectives[0], dist);
        prop_assert_eq!(&e.constraints, &f.constraints);
    }
}

// =============================================================================
// Optimization Runs
// =============================================================================

#[test]
fn test_determinism() {
    for method in ALL_METHODS {
        let a = run_optimization(&request(method, membrane_params())).unwrap();
        let b = run_optimization(&request(method, membrane_params())).unwrap();
        assert_eq!(a.x, b.x, "{method}");
        assert_eq!(a.f, b.f, "{method}");
        assert_eq!(a.g, b.g, "{method}");
    }
}

#[test]
fn test_seed_changes_the_run() {
    let a = run_optimization(&request(Method::Nsga2, membrane_params())).unwrap();
    let b = run_optimization(&OptimizationRequest {
        seed: 18,
        ..request(Method::Nsga2, membrane_params())
    })
    .unwrap();
    assert_ne!(a.x, b.x);
}

#[test]
fn test_results_respect_bounds() {
    for params in [membrane_params(), catalyst_params()] {
        let problem = make_problem(&params, None).unwrap();
        for method in ALL_METHODS {
            let result = run_optimization(&request(method, params.clone())).unwrap();
            assert!(!result.is_empty(), "{method}");
            for x in &result.x {
                assert!(problem.bounds().contains(x), "{method}: {x:?} outside bounds");
            }
        }
    }
}

#[test]
fn test_custom_bounds_are_honoured() {
    let bounds = Bounds::new(vec![160e-6, 1.0], vec![180e-6, 1.5]).unwrap();
    let result = run_optimization_with(
        "SPEA2",
        membrane_params(),
        Some(bounds.clone()),
        ScalarParams::default(),
        12,
        4,
        2,
    )
    .unwrap();
    assert!(result.x.iter().all(|x| bounds.contains(x)));
    // every point in this box satisfies the mechanical limit
    assert_eq!(result.n_feasible(), Some(result.len()));
}

#[test]
fn test_pareto_front_is_feasible_for_membrane() {
    let result = run_optimization(&request(Method::Nsga2, membrane_params())).unwrap();
    assert_eq!(result.n_feasible(), Some(result.len()));
    assert!(result.x.iter().all(|x| x[0] >= 158e-6));
}

#[test]
fn test_result_table_layout() {
    let params = catalyst_params();
    let problem = make_problem(&params, None).unwrap();
    let result = run_optimization(&request(Method::Moead, params)).unwrap();
    let table = ResultTable::assemble(&problem, &result);

    assert_eq!(table.columns.len(), 6 + 2 + 22);
    assert_eq!(table.columns[6], "cost");
    assert_eq!(table.columns[8], "G1");
    assert_eq!(table.columns[29], "G22");
    assert_eq!(table.rows.len(), result.len());
    assert!(table.rows.iter().all(|r| r.len() == table.columns.len()));
}

#[test]
fn test_scalarized_table_uses_adapter_names() {
    let base = make_problem(&membrane_params(), None).unwrap();
    let problem = make_scalarized(base, ScalarMode::WeightedSum, &ScalarParams::default()).unwrap();
    let result = run_optimization(&request(Method::WeightedSum, membrane_params())).unwrap();
    let table = ResultTable::assemble(&problem, &result);

    assert_eq!(table.columns, vec!["thickness_m", "current_density_A_cm2", "weighted_sum", "G1"]);
    assert_eq!(table.rows.len(), 1);

    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(json["columns"][2], "weighted_sum");
}
