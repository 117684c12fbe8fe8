//! MOEA/D with penalty-based boundary intersection (PBI).
//!
//! Each member owns one weight vector. Children are bred from a member's
//! neighbourhood and may replace neighbours whose subproblem they solve
//! better. Subproblem values are computed in objective space normalized by the
//! ideal point and the population's current nadir.
//!
//! References:
//! - Zhang, Q., Li, H. "MOEA/D: A Multiobjective Evolutionary Algorithm Based on
//!   Decomposition" (2007)
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

use std::cmp::Ordering;

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::operators::{evaluate_all, latin_hypercube, offspring_pair};
use super::population::{pareto_set, Individual};
use super::{Outcome, SolverConfig};
use crate::problem::Problem;

pub const N_NEIGHBORS: usize = 15;
pub const PBI_THETA: f64 = 5.0;
/// Probability of mating inside the neighbourhood rather than the whole population.
pub const NEIGHBOR_MATING_PROB: f64 = 0.9;
/// Upper limit on neighbours one child may replace.
const MAX_REPLACEMENTS: usize = 2;

fn binomial(n: usize, k: usize) -> usize {
    (0..k).fold(1usize, |acc, i| acc * (n - i) / (i + 1))
}

/// Das–Dennis simplex lattice with `h` partitions in `m` dimensions.
pub fn das_dennis(h: usize, m: usize) -> Vec<Vec<f64>> {
    fn fill(h: usize, left: usize, m: usize, prefix: &mut Vec<usize>, out: &mut Vec<Vec<f64>>) {
        if prefix.len() == m - 1 {
            prefix.push(left);
            out.push(prefix.iter().map(|&v| v as f64 / h as f64).collect());
            prefix.pop();
            return;
        }
        for v in 0..=left {
            prefix.push(v);
            fill(h, left - v, m, prefix, out);
            prefix.pop();
        }
    }

    if m == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(binomial(h + m - 1, m - 1));
    fill(h, h, m, &mut Vec::with_capacity(m), &mut out);
    out
}

/// Exactly `n` weight vectors: the densest Das–Dennis lattice that fits,
/// topped up with random points on the simplex.
pub fn weight_vectors(n: usize, m: usize, rng: &mut ChaCha8Rng) -> Vec<Vec<f64>> {
    if m <= 1 {
        return vec![vec![1.0; m]; n];
    }

    let mut h = 1;
    while binomial(h + 1 + m - 1, m - 1) <= n {
        h += 1;
    }
    let mut weights = if binomial(h + m - 1, m - 1) <= n {
        das_dennis(h, m)
    } else {
        Vec::new()
    };

    while weights.len() < n {
        let raw: Vec<f64> = (0..m).map(|_| rng.gen::<f64>() + 1e-9).collect();
        let total: f64 = raw.iter().sum();
        weights.push(raw.into_iter().map(|v| v / total).collect());
    }
    weights
}

/// Indices of the `t` closest weight vectors (self included) for each weight.
fn neighborhoods(weights: &[Vec<f64>], t: usize) -> Vec<Vec<usize>> {
    weights
        .iter()
        .map(|w| {
            let mut order: Vec<(f64, usize)> = weights
                .iter()
                .enumerate()
                .map(|(j, v)| {
                    let d: f64 = w.iter().zip(v).map(|(a, b)| (a - b).powi(2)).sum();
                    (d, j)
                })
                .collect();
            order.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal).then(a.1.cmp(&b.1)));
            order.into_iter().take(t).map(|(_, j)| j).collect()
        })
        .collect()
}

/// PBI value `d1 + θ d2` of objective vector `f` for weight `w`.
pub fn pbi(f: &[f64], w: &[f64], ideal: &[f64], scale: &[f64], theta: f64) -> f64 {
    let norm_w = w.iter().map(|v| v * v).sum::<f64>().sqrt().max(1e-12);
    let diff: Vec<f64> = f
        .iter()
        .zip(ideal)
        .zip(scale)
        .map(|((f, z), s)| (f - z) / s)
        .collect();

    let d1 = diff.iter().zip(w).map(|(d, w)| d * w).sum::<f64>() / norm_w;
    let d2 = diff
        .iter()
        .zip(w)
        .map(|(d, w)| (d - d1 * w / norm_w).powi(2))
        .sum::<f64>()
        .sqrt();
    d1 + theta * d2
}

/// Ideal point and per-objective normalization span of a population.
fn reference_points(population: &[Individual], ideal: &mut [f64]) -> Vec<f64> {
    ideal
        .iter_mut()
        .enumerate()
        .map(|(m, z)| {
            let lo = population.iter().map(|i| i.f[m]).fold(f64::INFINITY, f64::min);
            let hi = population.iter().map(|i| i.f[m]).fold(f64::NEG_INFINITY, f64::max);
            *z = z.min(lo);
            let span = hi - *z;
            if span > 1e-12 {
                span
            } else {
                1.0
            }
        })
        .collect()
}

pub(crate) fn run<P: Problem + ?Sized>(
    problem: &P,
    config: &SolverConfig,
    rng: &mut ChaCha8Rng,
) -> Outcome {
    let bounds = problem.bounds().pairs();
    let n = config.pop_size;
    let n_obj = problem.n_objectives();

    let weights = weight_vectors(n, n_obj, rng);
    let neighbors = neighborhoods(&weights, N_NEIGHBORS.min(n));

    let mut population = evaluate_all(problem, latin_hypercube(rng, n, &bounds));
    let mut evaluations = population.len();
    let mut ideal = vec![f64::INFINITY; n_obj];
    let mut scale = reference_points(&population, &mut ideal);

    for gen in 0..config.generations {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        let mut pools = Vec::with_capacity(n);
        let mut children = Vec::with_capacity(n);
        for &i in &order {
            let local = rng.gen::<f64>() < NEIGHBOR_MATING_PROB;
            let (a, b) = if local {
                let pool = &neighbors[i];
                (pool[rng.gen_range(0..pool.len())], pool[rng.gen_range(0..pool.len())])
            } else {
                (rng.gen_range(0..n), rng.gen_range(0..n))
            };
            let (child, _) = offspring_pair(rng, &population[a].x, &population[b].x, &bounds, config);
            children.push(child);
            pools.push((i, local));
        }

        let offspring = evaluate_all(problem, children);
        evaluations += offspring.len();

        for (child, (i, local)) in offspring.into_iter().zip(pools) {
            for (z, f) in ideal.iter_mut().zip(&child.f) {
                *z = z.min(*f);
            }

            let mut candidates: Vec<usize> = if local { neighbors[i].clone() } else { (0..n).collect() };
            candidates.shuffle(rng);

            let mut replaced = 0;
            for j in candidates {
                if replaced >= MAX_REPLACEMENTS {
                    break;
                }
                let better = match child.violation.compare(&population[j].violation) {
                    Ordering::Less => true,
                    Ordering::Greater => false,
                    Ordering::Equal => {
                        pbi(&child.f, &weights[j], &ideal, &scale, PBI_THETA)
                            <= pbi(&population[j].f, &weights[j], &ideal, &scale, PBI_THETA)
                    }
                };
                if better {
                    population[j] = child.clone();
                    replaced += 1;
                }
            }
        }

        scale = reference_points(&population, &mut ideal);

        debug!(
            generation = gen + 1,
            feasible = population.iter().filter(|m| m.is_feasible()).count(),
            "moead generation"
        );
    }

    Outcome {
        members: pareto_set(&population),
        evaluations,
    }
}
