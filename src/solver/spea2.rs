//! SPEA2: strength Pareto evolutionary algorithm with a fixed-size archive.
//!
//! References:
//! - Zitzler, E., Laumanns, M., Thiele, L. "SPEA2: Improving the Strength Pareto
//!   Evolutionary Algorithm" (2001)
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

use std::cmp::Ordering;

use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::operators::{evaluate_all, latin_hypercube, offspring_pair, tournament};
use super::population::{pareto_set, Individual};
use super::{Outcome, SolverConfig};
use crate::problem::Problem;

/// Pairwise Euclidean distances in min-max normalized objective space.
fn objective_distances(members: &[Individual]) -> Vec<Vec<f64>> {
    let n = members.len();
    let n_obj = members.first().map_or(0, |m| m.f.len());

    let ranges: Vec<(f64, f64)> = (0..n_obj)
        .map(|m| {
            let lo = members.iter().map(|i| i.f[m]).fold(f64::INFINITY, f64::min);
            let hi = members.iter().map(|i| i.f[m]).fold(f64::NEG_INFINITY, f64::max);
            let span = if hi - lo > 1e-12 { hi - lo } else { 1.0 };
            (lo, span)
        })
        .collect();

    let mut dist = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = ranges
                .iter()
                .enumerate()
                .map(|(m, &(_, span))| ((members[i].f[m] - members[j].f[m]) / span).powi(2))
                .sum::<f64>()
                .sqrt();
            dist[i][j] = d;
            dist[j][i] = d;
        }
    }
    dist
}

/// Assign SPEA2 fitness (raw + density) to every member; lower is better and
/// values below 1 mark non-dominated members.
fn assign_fitness(members: &mut [Individual], dist: &[Vec<f64>]) {
    let n = members.len();
    let mut strength = vec![0usize; n];
    let mut dominators: Vec<Vec<usize>> = vec![Vec::new(); n];

    for i in 0..n {
        for j in 0..n {
            if i != j && members[i].dominates(&members[j]) {
                strength[i] += 1;
                dominators[j].push(i);
            }
        }
    }

    let k = (n as f64).sqrt() as usize;
    for i in 0..n {
        let raw: usize = dominators[i].iter().map(|&d| strength[d]).sum();

        let mut row: Vec<f64> = (0..n).filter(|&j| j != i).map(|j| dist[i][j]).collect();
        row.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        // k-th nearest neighbour, self excluded
        let idx = k.saturating_sub(1).min(row.len().saturating_sub(1));
        let sigma_k = row.get(idx).copied().unwrap_or(0.0);

        members[i].fitness = raw as f64 + 1.0 / (sigma_k + 2.0);
    }
}

/// Remove members one at a time until `n` remain. The removed member is the
/// one whose sorted distances to the others are lexicographically smallest.
fn truncate(members: Vec<Individual>, n: usize) -> Vec<Individual> {
    let dist = objective_distances(&members);
    let mut alive: Vec<usize> = (0..members.len()).collect();

    while alive.len() > n {
        let sorted_rows: Vec<Vec<f64>> = alive
            .iter()
            .map(|&i| {
                let mut row: Vec<f64> = alive.iter().filter(|&&j| j != i).map(|&j| dist[i][j]).collect();
                row.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
                row
            })
            .collect();

        let mut victim = 0;
        for pos in 1..alive.len() {
            let closer = sorted_rows[pos]
                .iter()
                .zip(&sorted_rows[victim])
                .map(|(a, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
                .find(|o| *o != Ordering::Equal)
                == Some(Ordering::Less);
            if closer {
                victim = pos;
            }
        }
        alive.remove(victim);
    }

    let mut slots: Vec<Option<Individual>> = members.into_iter().map(Some).collect();
    alive.into_iter().filter_map(|i| slots[i].take()).collect()
}

/// Next archive from the union of population and archive.
fn environmental_selection(mut union: Vec<Individual>, n: usize) -> Vec<Individual> {
    let dist = objective_distances(&union);
    assign_fitness(&mut union, &dist);

    let (mut front, mut rest): (Vec<Individual>, Vec<Individual>) =
        union.into_iter().partition(|m| m.fitness < 1.0);

    if front.len() > n {
        return truncate(front, n);
    }

    rest.sort_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap_or(Ordering::Equal));
    let missing = n - front.len();
    front.extend(rest.into_iter().take(missing));
    front
}

pub(crate) fn run<P: Problem + ?Sized>(
    problem: &P,
    config: &SolverConfig,
    rng: &mut ChaCha8Rng,
) -> Outcome {
    let bounds = problem.bounds().pairs();
    let n = config.pop_size;

    let initial = evaluate_all(problem, latin_hypercube(rng, n, &bounds));
    let mut evaluations = initial.len();
    let mut archive = environmental_selection(initial, n);

    for gen in 0..config.generations {
        let mut children = Vec::with_capacity(n + 1);
        while children.len() < n {
            let better = |a: usize, b: usize| archive[a].fitness < archive[b].fitness;
            let p1 = tournament(rng, archive.len(), better);
            let p2 = tournament(rng, archive.len(), better);
            let (c1, c2) = offspring_pair(rng, &archive[p1].x, &archive[p2].x, &bounds, config);
            children.push(c1);
            children.push(c2);
        }
        children.truncate(n);

        let population = evaluate_all(problem, children);
        evaluations += population.len();

        let mut union = archive;
        union.extend(population);
        archive = environmental_selection(union, n);

        debug!(
            generation = gen + 1,
            non_dominated = archive.iter().filter(|m| m.fitness < 1.0).count(),
            feasible = archive.iter().filter(|m| m.is_feasible()).count(),
            "spea2 generation"
        );
    }

    Outcome {
        members: pareto_set(&archive),
        evaluations,
    }
}
