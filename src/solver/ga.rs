//! Single-objective genetic algorithm with elitist (μ+λ) survival.
//!
//! Only the first objective is optimized; feasibility decides first.
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::operators::{evaluate_all, latin_hypercube, offspring_pair, tournament};
use super::population::Individual;
use super::{Outcome, SolverConfig};
use crate::problem::Problem;

fn survive(mut combined: Vec<Individual>, n: usize) -> Vec<Individual> {
    combined.sort_by(Individual::cmp_scalar);
    combined.truncate(n);
    combined
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
    let mut population = survive(initial, n);

    for gen in 0..config.generations {
        let mut children = Vec::with_capacity(n + 1);
        while children.len() < n {
            let better = |a: usize, b: usize| population[a].cmp_scalar(&population[b]).is_lt();
            let p1 = tournament(rng, population.len(), better);
            let p2 = tournament(rng, population.len(), better);
            let (c1, c2) = offspring_pair(rng, &population[p1].x, &population[p2].x, &bounds, config);
            children.push(c1);
            children.push(c2);
        }
        children.truncate(n);

        let offspring = evaluate_all(problem, children);
        evaluations += offspring.len();
        population.extend(offspring);
        population = survive(population, n);

        if let Some(best) = population.first() {
            debug!(
                generation = gen + 1,
                best = best.f.first().copied().unwrap_or(f64::NAN),
                violation = best.violation.total,
                "ga generation"
            );
        }
    }

    Outcome {
        members: population.into_iter().take(1).collect(),
        evaluations,
    }
}
