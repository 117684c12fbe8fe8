//! NSGA-II Multi-Objective Optimization Algorithm
//!
//! Non-dominated sorting with crowding distance and elitist (μ+λ) survival.
//! Dominance is the constrained variant of [`Individual::dominates`].
//!
//! References:
//! - Deb, K., et al. "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II" (2002)
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

use std::cmp::Ordering;

use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::operators::{evaluate_all, latin_hypercube, offspring_pair, tournament};
use super::population::{crowding_distance, non_dominated_sort, pareto_set, Individual};
use super::{Outcome, SolverConfig};
use crate::problem::Problem;

/// Rank first, then larger crowding distance.
fn crowded_better(a: &Individual, b: &Individual) -> bool {
    match a.rank.cmp(&b.rank) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => a.crowding_distance > b.crowding_distance,
    }
}

/// Sort, assign crowding distance and keep the best `n` by crowded comparison.
fn environmental_selection(mut combined: Vec<Individual>, n: usize) -> Vec<Individual> {
    let fronts = non_dominated_sort(&mut combined);
    crowding_distance(&mut combined, &fronts);

    let mut indices: Vec<usize> = (0..combined.len()).collect();
    indices.sort_by(|&a, &b| {
        combined[a].rank.cmp(&combined[b].rank).then_with(|| {
            // Higher crowding distance is better
            combined[b]
                .crowding_distance
                .partial_cmp(&combined[a].crowding_distance)
                .unwrap_or(Ordering::Equal)
        })
    });
    indices.truncate(n);

    let mut slots: Vec<Option<Individual>> = combined.into_iter().map(Some).collect();
    indices.into_iter().filter_map(|i| slots[i].take()).collect()
}

fn create_offspring<P: Problem + ?Sized>(
    problem: &P,
    population: &[Individual],
    bounds: &[(f64, f64)],
    config: &SolverConfig,
    rng: &mut ChaCha8Rng,
) -> Vec<Individual> {
    let n = config.pop_size;
    let mut children = Vec::with_capacity(n + 1);

    while children.len() < n {
        let p1 = tournament(rng, population.len(), |a, b| crowded_better(&population[a], &population[b]));
        let p2 = tournament(rng, population.len(), |a, b| crowded_better(&population[a], &population[b]));
        let (c1, c2) = offspring_pair(rng, &population[p1].x, &population[p2].x, bounds, config);
        children.push(c1);
        children.push(c2);
    }
    children.truncate(n);

    evaluate_all(problem, children)
}

pub(crate) fn run<P: Problem + ?Sized>(
    problem: &P,
    config: &SolverConfig,
    rng: &mut ChaCha8Rng,
) -> Outcome {
    let bounds = problem.bounds().pairs();
    let n = config.pop_size;

    let mut population = evaluate_all(problem, latin_hypercube(rng, n, &bounds));
    let mut evaluations = population.len();
    population = environmental_selection(population, n);

    for gen in 0..config.generations {
        let offspring = create_offspring(problem, &population, &bounds, config, rng);
        evaluations += offspring.len();

        population.extend(offspring);
        population = environmental_selection(population, n);

        debug!(
            generation = gen + 1,
            first_front = population.iter().filter(|ind| ind.rank == 0).count(),
            feasible = population.iter().filter(|ind| ind.is_feasible()).count(),
            "nsga2 generation"
        );
    }

    Outcome {
        members: pareto_set(&population),
        evaluations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Evaluation;
    use crate::problem::Bounds;
    use rand::SeedableRng;

    struct Zdt1 {
        bounds: Bounds,
    }

    impl Problem for Zdt1 {
        fn n_variables(&self) -> usize {
            2
        }
        fn n_objectives(&self) -> usize {
            2
        }
        fn n_constraints(&self) -> usize {
            0
        }
        fn bounds(&self) -> &Bounds {
            &self.bounds
        }
        fn evaluate(&self, x: &[f64]) -> Evaluation {
            let g = 1.0 + x[1];
            Evaluation {
                objectives: vec![x[0], g * (1.0 - (x[0] / g).sqrt())],
                constraints: vec![],
            }
        }
    }

    #[test]
    fn test_nsga2_simple() {
        let problem = Zdt1 {
            bounds: Bounds::new(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap(),
        };
        let config = SolverConfig {
            pop_size: 20,
            generations: 5,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let outcome = run(&problem, &config, &mut rng);
        assert!(!outcome.members.is_empty());
        assert_eq!(outcome.evaluations, 20 * 6);
        for a in &outcome.members {
            assert!(outcome.members.iter().all(|b| !b.dominates(a)));
        }
    }

    #[test]
    fn odd_population_is_kept_at_size() {
        let problem = Zdt1 {
            bounds: Bounds::new(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap(),
        };
        let config = SolverConfig {
            pop_size: 7,
            generations: 3,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let outcome = run(&problem, &config, &mut rng);
        assert_eq!(outcome.evaluations, 7 * 4);
        assert!(outcome.members.len() <= 7);
    }
}
